//! # Reconcile
//!
//! Query composition and object-tree reconciliation for mirroring a remote
//! API into a hierarchical object store.
//!
//! The crate knows nothing about a particular server. Callers describe what
//! can be mirrored with a [`Catalog`] and a set of [`ResourceFamily`]
//! implementations; the crate turns a selection into one composite query and
//! applies each response to an [`ObjectStore`].
//!
//! ## Core Concepts
//!
//! - **Catalog**: Selectable categories, their query fragments and static mappings
//! - **QueryComposer**: Merges fragments sharing a root into a single query
//! - **ObjectTree**: Bookkeeping of every node the mirror created or imported
//! - **ResourceFamily**: A response list whose members get their own sub-trees
//! - **Reconciler**: Detects membership changes and removes vanished members
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{Catalog, MemoryStore, ObjectTree, Reconciler, apply_static_mappings};
//!
//! let selection = catalog.resolve_selection(["info", "docker"]);
//! let query = catalog.compose_query(&selection);
//!
//! // ... execute the query, get `payload` ...
//!
//! tree.begin_cycle();
//! let domains = catalog.selected_domains(&selection);
//! apply_static_mappings(&payload, &domains, &catalog, &store, &mut tree);
//! reconciler.reconcile(&payload, &families, &selection, &catalog, &store, &mut tree);
//! ```
//!
//! ## Seams
//!
//! - [`ObjectStore`]: Where nodes live ([`MemoryStore`] for tests and embedding)
//! - [`ResourceFamily`]: How one kind of dynamic resource is identified and laid out
//! - [`Coercion`]: How a raw response value becomes a stored value

pub mod catalog;
pub mod coerce;
pub mod error;
pub mod family;
pub mod id;
pub mod query;
pub mod store;
pub mod tree;
pub mod writer;

pub use catalog::{Catalog, Category, Domain, Selection, StaticMapping};
pub use coerce::Coercion;
pub use error::{Error, Result};
pub use family::{FamilyReport, LeafSpec, MembershipSnapshots, Reconciler, ResourceFamily};
pub use query::{FieldSelection, FieldTree, QueryComposer, SelectionFragment, field, fields};
pub use store::{
    DisplayMetadata, MemoryStore, NodeInfo, NodeKind, ObjectStore, StoreOp, StoredNode, ValueKind,
};
pub use tree::{InitReport, ObjectTree, RemovalReport, TrackedObject};
pub use writer::{StaticWriteReport, apply_static_mappings, ensure_ancestors, resolve_path};
