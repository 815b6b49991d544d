//! Small shared helpers

pub mod csv;
pub mod hashing;

pub use csv::{join_list, split_list};
pub use hashing::document_digest;
