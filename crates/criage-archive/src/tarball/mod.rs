//! Plain tar stream handling shared by every codec
//!
//! Compression is applied by the codec around these functions.

pub mod create;
pub mod extract;

// Re-export main functions
pub use create::write_tree;
pub use extract::unpack_tree;
