//! Dataset assembly toolkit: class indexing, mask synthesis, batch loading,
//! and mask extraction to disk.

mod classes;
mod extract;
mod loader;
mod mask;

pub use classes::*;
pub use extract::*;
pub use loader::*;
pub use mask::*;
