//! Category catalog
//!
//! A [`Catalog`] is the static description of what can be mirrored: a tree
//! of selectable [`Category`]s and, per fetchable category, a [`Domain`]
//! holding its selection fragment and static mappings. Catalogs are
//! validated once at construction and immutable afterwards.

use crate::coerce::{self, Coercion};
use crate::error::{Error, Result};
use crate::id;
use crate::query::{QueryComposer, SelectionFragment};
use crate::store::DisplayMetadata;
use std::collections::{BTreeMap, BTreeSet};

/// A selectable unit of tracked functionality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub default_selected: bool,
    pub children: Vec<Category>,
}

impl Category {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            default_selected: false,
            children: Vec::new(),
        }
    }

    /// Mark the category as selected when no explicit selection is given.
    pub fn selected_by_default(mut self) -> Self {
        self.default_selected = true;
        self
    }

    pub fn with_children(mut self, children: Vec<Category>) -> Self {
        self.children = children;
        self
    }

    /// This category and all descendants, pre-order.
    pub fn walk(&self) -> Vec<&Category> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// A fixed rule mapping one remote field path to one local value
#[derive(Debug, Clone)]
pub struct StaticMapping {
    pub local_id: String,
    pub remote_path: Vec<String>,
    pub meta: DisplayMetadata,
    pub coerce: Coercion,
}

impl StaticMapping {
    pub fn new(local_id: impl Into<String>, remote_path: &[&str], meta: DisplayMetadata) -> Self {
        Self {
            local_id: local_id.into(),
            remote_path: remote_path.iter().map(|s| (*s).to_string()).collect(),
            meta,
            coerce: coerce::identity,
        }
    }

    pub fn coerce(mut self, coerce: Coercion) -> Self {
        self.coerce = coerce;
        self
    }
}

/// What one fetchable category requests and how it maps
#[derive(Debug, Clone)]
pub struct Domain {
    pub category_id: String,
    pub fragment: Option<SelectionFragment>,
    pub mappings: Vec<StaticMapping>,
}

impl Domain {
    pub fn new(category_id: impl Into<String>, fragment: SelectionFragment) -> Self {
        Self {
            category_id: category_id.into(),
            fragment: Some(fragment),
            mappings: Vec::new(),
        }
    }

    pub fn with_mappings(mut self, mappings: Vec<StaticMapping>) -> Self {
        self.mappings = mappings;
        self
    }

    /// Root response field this domain reads from.
    pub fn root(&self) -> Option<&str> {
        self.fragment.as_ref().map(|f| f.root.as_str())
    }
}

/// A resolved set of selected category ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether exactly this id was selected.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Whether `id` is a selected category or lies below one.
    ///
    /// Selecting `array` covers `array.disks` and `array.disks.0.name`.
    pub fn covers(&self, id: &str) -> bool {
        id::prefixes(id).any(|prefix| self.ids.contains(prefix))
    }

    /// Whether `id` is a strict ancestor of a selected category.
    pub fn is_ancestor_of_selected(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| id::is_strictly_within(selected, id))
    }

    /// Whether a node at `id` may exist under this selection.
    pub fn allows(&self, id: &str) -> bool {
        self.covers(id) || self.is_ancestor_of_selected(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Immutable registry of categories and domains
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    domains: Vec<Domain>,
    labels: BTreeMap<String, String>,
}

impl Catalog {
    /// Build and validate a catalog.
    ///
    /// Rejects duplicate category ids, children whose id is not the parent id
    /// plus one segment, domains for unknown categories, duplicate mapping ids,
    /// and mappings that lie outside their category.
    pub fn new(categories: Vec<Category>, domains: Vec<Domain>) -> Result<Self> {
        let mut labels = BTreeMap::new();
        for root in &categories {
            if id::depth(&root.id) != 1 {
                return Err(Error::Catalog(format!(
                    "root category '{}' must have a single segment",
                    root.id
                )));
            }
            validate_category(root, &mut labels)?;
        }

        let mut mapping_ids = BTreeSet::new();
        for domain in &domains {
            if !labels.contains_key(&domain.category_id) {
                return Err(Error::Catalog(format!(
                    "domain for unknown category '{}'",
                    domain.category_id
                )));
            }
            for mapping in &domain.mappings {
                if !id::is_valid(&mapping.local_id) {
                    return Err(Error::InvalidId(mapping.local_id.clone()));
                }
                if !id::is_strictly_within(&mapping.local_id, &domain.category_id) {
                    return Err(Error::Catalog(format!(
                        "mapping '{}' lies outside category '{}'",
                        mapping.local_id, domain.category_id
                    )));
                }
                if !mapping_ids.insert(mapping.local_id.clone()) {
                    return Err(Error::Catalog(format!(
                        "duplicate mapping '{}'",
                        mapping.local_id
                    )));
                }
            }
        }

        for domain in &domains {
            for mapping in &domain.mappings {
                labels
                    .entry(mapping.local_id.clone())
                    .or_insert_with(|| mapping.meta.name.clone());
            }
        }

        Ok(Self {
            categories,
            domains,
            labels,
        })
    }

    /// Root categories, in declaration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Every category, pre-order.
    pub fn all_categories(&self) -> Vec<&Category> {
        self.categories.iter().flat_map(Category::walk).collect()
    }

    pub fn find_category(&self, id: &str) -> Option<&Category> {
        self.all_categories().into_iter().find(|c| c.id == id)
    }

    /// Human label for a category or mapping id.
    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Categories flagged as selected by default.
    pub fn default_selection(&self) -> Selection {
        Selection::new(
            self.all_categories()
                .into_iter()
                .filter(|c| c.default_selected)
                .map(|c| c.id.clone()),
        )
    }

    /// Turn an externally supplied id list into a selection.
    ///
    /// Unknown ids are dropped. If nothing valid remains, the default
    /// selection is used.
    pub fn resolve_selection<I, S>(&self, requested: I) -> Selection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut known = BTreeSet::new();
        for raw in requested {
            let raw = raw.as_ref().trim();
            if self.find_category(raw).is_some() {
                known.insert(raw.to_string());
            } else if !raw.is_empty() {
                log::debug!("Ignoring unknown category '{raw}'");
            }
        }
        if known.is_empty() {
            return self.default_selection();
        }
        Selection { ids: known }
    }

    /// Domains whose category is covered by the selection.
    pub fn selected_domains(&self, selection: &Selection) -> Vec<&Domain> {
        self.domains
            .iter()
            .filter(|d| selection.covers(&d.category_id))
            .collect()
    }

    /// The composite query for a selection, `None` when nothing is fetchable.
    pub fn compose_query(&self, selection: &Selection) -> Option<String> {
        let mut composer = QueryComposer::new();
        for domain in self.selected_domains(selection) {
            if let Some(fragment) = &domain.fragment {
                composer.add_fragment(fragment);
            }
        }
        composer.build()
    }

    /// Every id implied by the catalog: all dot prefixes of every category
    /// id and every mapping id.
    pub fn static_ids(&self) -> BTreeSet<String> {
        let mut ids = BTreeSet::new();
        for category in self.all_categories() {
            ids.extend(id::prefixes(&category.id).map(str::to_string));
        }
        for domain in &self.domains {
            for mapping in &domain.mappings {
                ids.extend(id::prefixes(&mapping.local_id).map(str::to_string));
            }
        }
        ids
    }
}

fn validate_category(category: &Category, labels: &mut BTreeMap<String, String>) -> Result<()> {
    if !id::is_valid(&category.id) {
        return Err(Error::InvalidId(category.id.clone()));
    }
    if labels
        .insert(category.id.clone(), category.label.clone())
        .is_some()
    {
        return Err(Error::Catalog(format!(
            "duplicate category '{}'",
            category.id
        )));
    }
    for child in &category.children {
        if id::parent(&child.id) != Some(category.id.as_str()) {
            return Err(Error::Catalog(format!(
                "category '{}' is not a direct child of '{}'",
                child.id, category.id
            )));
        }
        validate_category(child, labels)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{field, fields};

    fn sample() -> Catalog {
        let categories = vec![
            Category::new("info", "Info").selected_by_default(),
            Category::new("metrics", "Metrics")
                .selected_by_default()
                .with_children(vec![
                    Category::new("metrics.cpu", "CPU").selected_by_default(),
                    Category::new("metrics.memory", "Memory"),
                ]),
        ];
        let domains = vec![
            Domain::new("info", SelectionFragment::new("info", vec![field("time")])).with_mappings(
                vec![StaticMapping::new(
                    "info.time",
                    &["info", "time"],
                    DisplayMetadata::text("Time", "date"),
                )],
            ),
            Domain::new(
                "metrics.cpu",
                SelectionFragment::new("metrics", vec![fields("cpu", &["percentTotal"])]),
            )
            .with_mappings(vec![
                StaticMapping::new(
                    "metrics.cpu.percentTotal",
                    &["metrics", "cpu", "percentTotal"],
                    DisplayMetadata::number("CPU load", "value"),
                )
                .coerce(coerce::number),
            ]),
            Domain::new(
                "metrics.memory",
                SelectionFragment::new("metrics", vec![fields("memory", &["total"])]),
            ),
        ];
        Catalog::new(categories, domains).unwrap()
    }

    #[test]
    fn test_default_selection() {
        let catalog = sample();
        let selection = catalog.default_selection();
        assert!(selection.contains("info"));
        assert!(selection.contains("metrics.cpu"));
        assert!(!selection.contains("metrics.memory"));
    }

    #[test]
    fn test_resolve_selection_drops_unknown_ids() {
        let catalog = sample();
        let selection = catalog.resolve_selection(["metrics.memory", "bogus"]);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["metrics.memory"]);
    }

    #[test]
    fn test_resolve_selection_falls_back_to_defaults() {
        let catalog = sample();
        assert_eq!(
            catalog.resolve_selection(["nope", "also.nope"]),
            catalog.default_selection()
        );
        assert_eq!(
            catalog.resolve_selection(Vec::<String>::new()),
            catalog.default_selection()
        );
    }

    #[test]
    fn test_selection_covers_descendants() {
        let selection = Selection::new(["metrics"]);
        assert!(selection.covers("metrics.cpu"));
        assert!(selection.covers("metrics.cpu.percentTotal"));
        assert!(!selection.covers("info.time"));

        let narrow = Selection::new(["docker.containers"]);
        assert!(narrow.allows("docker"));
        assert!(narrow.allows("docker.containers.nginx.state"));
        assert!(!narrow.allows("docker.info"));
    }

    #[test]
    fn test_compose_query_merges_selected_domains() {
        let catalog = sample();
        let selection = catalog.resolve_selection(["metrics"]);
        let query = catalog.compose_query(&selection).unwrap();
        assert_eq!(query.matches("metrics {").count(), 1);
        assert!(query.contains("memory {"));
        assert!(query.contains("percentTotal"));
        assert!(!query.contains("info"));
    }

    #[test]
    fn test_static_ids_include_prefixes() {
        let ids = sample().static_ids();
        for expected in ["info", "info.time", "metrics", "metrics.cpu", "metrics.cpu.percentTotal"] {
            assert!(ids.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn test_labels() {
        let catalog = sample();
        assert_eq!(catalog.label_for("metrics.cpu"), Some("CPU"));
        assert_eq!(catalog.label_for("info.time"), Some("Time"));
        assert_eq!(catalog.label_for("metrics.cpu.cores"), None);
    }

    #[test]
    fn test_rejects_bad_nesting() {
        let categories = vec![
            Category::new("array", "Array").with_children(vec![Category::new("docker.x", "X")]),
        ];
        let err = Catalog::new(categories, vec![]).unwrap_err();
        assert!(err.to_string().contains("not a direct child"));
    }

    #[test]
    fn test_rejects_duplicate_mapping() {
        let meta = DisplayMetadata::text("Time", "date");
        let domains = vec![
            Domain::new("info", SelectionFragment::new("info", vec![field("time")])).with_mappings(
                vec![
                    StaticMapping::new("info.time", &["info", "time"], meta.clone()),
                    StaticMapping::new("info.time", &["info", "time"], meta),
                ],
            ),
        ];
        let err = Catalog::new(vec![Category::new("info", "Info")], domains).unwrap_err();
        assert!(err.to_string().contains("duplicate mapping"));
    }

    #[test]
    fn test_rejects_mapping_outside_category() {
        let domains = vec![
            Domain::new("info", SelectionFragment::new("info", vec![field("time")])).with_mappings(
                vec![StaticMapping::new(
                    "server.time",
                    &["info", "time"],
                    DisplayMetadata::text("Time", "date"),
                )],
            ),
        ];
        let err = Catalog::new(vec![Category::new("info", "Info")], domains).unwrap_err();
        assert!(err.to_string().contains("outside category"));
    }
}
