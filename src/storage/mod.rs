//! Virtual filesystem storage
//!
//! The node tree, its metadata table, the forbidden-character policy and
//! the [`Storage`] handle composing them.

pub mod filesystem;
pub mod flags;
pub mod folders;
pub mod operations;
pub mod path;
pub mod permissions;
pub mod results;
pub mod table;
pub mod validation;

pub use filesystem::{Directory, Node, NodeKind};
pub use operations::Storage;
pub use path::{VirtualPath, normalize};
pub use results::{ExportedFolder, TableEntry};
pub use table::Flag;
pub use validation::ForbidPolicy;
