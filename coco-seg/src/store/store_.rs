use crate::common::*;

/// An image known to the annotation store, at its native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: u32,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

/// A semantic category. Id 0 is reserved for the synthetic background class
/// and never appears in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: u32,
    pub name: String,
}

/// One instance annotation, tied to exactly one image and one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub id: u64,
    pub image_id: u32,
    pub category_id: u32,
}

/// The annotation query interface consumed by the mask synthesizer and the
/// dataset loader.
///
/// Lookup failures (unknown name or id) surface as errors and are never
/// swallowed by the callers.
pub trait AnnotationStore {
    /// Resolve category names to ids. An empty slice selects every category
    /// in store order.
    fn category_ids(&self, names: &[String]) -> Result<Vec<u32>>;

    fn load_categories(&self, ids: &[u32]) -> Result<Vec<CategoryRecord>>;

    /// Ids of images carrying at least one annotation of the category, in
    /// store order.
    fn image_ids(&self, category_id: u32) -> Result<Vec<u32>>;

    fn load_images(&self, ids: &[u32]) -> Result<Vec<ImageRecord>>;

    /// Every image id known to the store, in store order.
    fn all_image_ids(&self) -> Vec<u32>;

    fn annotation_ids(&self, image_id: u32) -> Result<Vec<u64>>;

    fn load_annotations(&self, ids: &[u64]) -> Result<Vec<AnnotationRecord>>;

    /// Rasterize one annotation into a binary (row, col) mask at the native
    /// resolution of its image.
    fn rasterize(&self, annotation_id: u64) -> Result<Array2<u8>>;
}
