//! Project file tree state
//!
//! [`TreeStore`] keeps a partially expanded, path-addressed view of a
//! project's remote files. Mutations patch the local tree first, call the
//! filesystem, then reload the whole listing; the listing is always the
//! source of truth.

mod expansion;
mod nodes;
mod pending;
mod store;

pub use expansion::ExpansionSet;
pub use pending::OperationKind;
pub use store::{Confirm, DeleteOutcome, Selection, TreeRow, TreeStore};
