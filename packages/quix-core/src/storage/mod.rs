//! On-disk layout of a table directory.
//!
//! ```text
//! <data_dir>/<table>/meta
//! <data_dir>/<table>/rows/<id>
//! <data_dir>/<table>/index_<column>/<fingerprint>
//! <data_dir>/<table>/<table>.lock
//! ```

pub mod index;
pub mod io_utils;
pub mod metadata;
pub mod rows;

pub use index::IndexManager;
pub use io_utils::IoPolicy;
pub use metadata::MetadataStore;
pub use rows::{RowScan, RowStore};
