//! Table engine: schema enforcement, CRUD and index maintenance.

mod query;
#[allow(clippy::module_inception)]
mod table;
pub(crate) mod validation;

pub use query::SelectOptions;
pub use table::Table;
