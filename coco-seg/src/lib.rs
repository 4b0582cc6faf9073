//! COCO instance annotations to per-pixel segmentation masks.

mod common;
pub mod dataset;
pub mod processor;
pub mod stats;
pub mod store;
pub mod viz;
