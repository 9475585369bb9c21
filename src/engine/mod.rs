//! Sync engine for unraid-mirror
//!
//! The engine owns everything one mirror needs:
//! 1. Selection - Which categories are mirrored
//! 2. Polling - Compose the query, fetch, write static values, reconcile families
//! 3. Pruning - Remove nodes of categories that are no longer selected
//!
//! The [`driver::PollingDriver`] runs [`Engine::poll_once`] on a schedule.

pub mod cycle;
pub mod driver;

pub use cycle::{CycleReport, describe_prune};
pub use driver::PollingDriver;

use anyhow::{Context as AnyhowContext, Result};
use graphql::Transport;
use reconcile::{
    Catalog, InitReport, ObjectStore, ObjectTree, Reconciler, RemovalReport, ResourceFamily,
    Selection, apply_static_mappings,
};

use crate::control::ControlRequest;

/// One mirror of one server
pub struct Engine {
    catalog: Catalog,
    families: Vec<Box<dyn ResourceFamily>>,
    transport: Box<dyn Transport>,
    store: Box<dyn ObjectStore>,
    tree: ObjectTree,
    reconciler: Reconciler,
    selection: Selection,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("selection", &self.selection)
            .field("families", &self.families)
            .field("tracked", &self.tree.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(
        catalog: Catalog,
        families: Vec<Box<dyn ResourceFamily>>,
        transport: Box<dyn Transport>,
        store: Box<dyn ObjectStore>,
        selection: Selection,
    ) -> Self {
        Self {
            catalog,
            families,
            transport,
            store,
            tree: ObjectTree::new(),
            reconciler: Reconciler::new(),
            selection,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    /// The query the current selection composes to
    pub fn query(&self) -> Option<String> {
        self.catalog.compose_query(&self.selection)
    }

    /// Import the store's existing nodes and prune anything outside the
    /// selection. Run once before the first poll.
    pub fn initialize(&mut self) -> Result<(InitReport, RemovalReport)> {
        let init = self
            .tree
            .initialize(&self.catalog, &self.families, self.store.as_ref())
            .context("Failed to import existing objects")?;

        let pruned = self.prune();
        Ok((init, pruned))
    }

    /// Replace the selection and prune what fell out of it.
    pub fn set_selection(&mut self, selection: Selection) -> RemovalReport {
        self.selection = selection;
        self.prune()
    }

    fn prune(&mut self) -> RemovalReport {
        let report = self.tree.prune_deselected(&self.selection, self.store.as_ref());
        if !report.is_empty() {
            log::info!("Deselected categories: {}", describe_prune(&report));
        }
        self.flush();
        report
    }

    /// Run one poll cycle.
    ///
    /// A transport failure aborts the cycle before anything is written.
    pub fn poll_once(&mut self) -> Result<CycleReport> {
        let started = self.tree.begin_cycle();
        let mut report = CycleReport::new(started);

        let Some(query) = self.query() else {
            log::debug!("Nothing selected, skipping poll");
            return Ok(report);
        };
        report.queried = true;

        let payload = match self.transport.query(&query) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Poll failed ({}): {e}", e.category().description());
                return Err(e).context("Failed to fetch server state");
            }
        };

        let domains = self.catalog.selected_domains(&self.selection);
        report.statics = apply_static_mappings(
            &payload,
            &domains,
            &self.catalog,
            self.store.as_ref(),
            &mut self.tree,
        );
        report.families = self.reconciler.reconcile(
            &payload,
            &self.families,
            &self.selection,
            &self.catalog,
            self.store.as_ref(),
            &mut self.tree,
        );
        report.flush_error = self.flush();

        log::info!("Cycle complete: {report}");
        Ok(report)
    }

    /// Send a control mutation, then re-poll so the mirror reflects it.
    pub fn control(&mut self, request: &ControlRequest) -> Result<CycleReport> {
        log::info!("Sending {} {} for '{}'", request.target, request.action, request.id);
        let data = self
            .transport
            .mutate(&request.mutation(), &request.variables())
            .with_context(|| format!("Failed to {} {} '{}'", request.action, request.target, request.id))?;
        request.check_response(&data)?;
        self.poll_once()
    }

    fn flush(&self) -> Option<String> {
        self.store.flush().err().map(|e| {
            log::warn!("Failed to persist objects: {e}");
            e.to_string()
        })
    }
}
