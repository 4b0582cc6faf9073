//! COCO annotation store.

mod coco_;
mod rasterize;
mod store_;

#[cfg(test)]
pub(crate) mod testing;

pub use coco_::*;
pub use rasterize::*;
pub use store_::*;
