use anyhow::Result;
use colored::Colorize;
use reconcile::{Catalog, Category, Selection, id};

use crate::Context;
use crate::catalog;
use crate::ui;

/// One printed row of the category tree
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    depth: usize,
    id: String,
    label: String,
    selected: bool,
    covered: bool,
    default: bool,
}

pub fn run(ctx: &Context) -> Result<()> {
    let settings = super::try_load_settings(ctx)?;
    let catalog = catalog::unraid()?;
    let selection = super::resolve_selection(&catalog, ctx, settings.as_ref());

    ui::header("Categories");
    for row in rows(&catalog, &selection) {
        let marker = if row.selected {
            "●".green()
        } else if row.covered {
            "◐".green()
        } else {
            "○".dimmed()
        };
        let default = if row.default { " (default)".dimmed().to_string() } else { String::new() };
        println!(
            "{}{marker} {:<20} {}{default}",
            ui::indent(row.depth),
            row.id.bold(),
            row.label
        );
    }
    println!();
    ui::dim("● selected  ◐ selected via parent  ○ not selected");
    Ok(())
}

fn rows(catalog: &Catalog, selection: &Selection) -> Vec<Row> {
    let mut rows = Vec::new();
    for root in catalog.categories() {
        collect(root, selection, &mut rows);
    }
    rows
}

fn collect(category: &Category, selection: &Selection, rows: &mut Vec<Row>) {
    rows.push(Row {
        depth: id::depth(&category.id),
        id: category.id.clone(),
        label: category.label.clone(),
        selected: selection.contains(&category.id),
        covered: selection.covers(&category.id),
        default: category.default_selected,
    });
    for child in &category.children {
        collect(child, selection, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_tree_order() {
        let catalog = catalog::unraid().unwrap();
        let selection = catalog.resolve_selection(["docker"]);
        let rows = rows(&catalog, &selection);

        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        let docker = ids.iter().position(|id| *id == "docker").unwrap();
        assert_eq!(ids[docker + 1], "docker.containers");
        assert_eq!(rows.len(), catalog.all_categories().len());

        let containers = &rows[docker + 1];
        assert_eq!(containers.depth, 2);
        assert!(!containers.selected);
        assert!(containers.covered);
        assert!(rows[docker].selected);
    }

    #[test]
    fn test_default_flags() {
        let catalog = catalog::unraid().unwrap();
        let rows = rows(&catalog, &catalog.default_selection());
        let info = rows.iter().find(|r| r.id == "info").unwrap();
        let docker = rows.iter().find(|r| r.id == "docker").unwrap();
        assert!(info.default && info.selected);
        assert!(!docker.default && !docker.covered);
    }
}
