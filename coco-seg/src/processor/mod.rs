//! Batch processing steps applied after loading.

mod augment;

pub use augment::*;
