//! Class distribution statistics over a dataset selection.

use crate::{
    common::*,
    store::{AnnotationStore, BACKGROUND_ID},
};

/// Count the annotated images per selected category. An empty `class_names`
/// selects every category.
///
/// Key 0 holds the background count: the number of distinct images touched
/// by any selected category. The remaining keys follow category resolution
/// order.
pub fn class_distribution<S>(store: &S, class_names: &[String]) -> Result<IndexMap<u32, usize>>
where
    S: AnnotationStore + ?Sized,
{
    let category_ids = store.category_ids(class_names)?;

    let mut selected: IndexSet<u32> = IndexSet::new();
    let mut per_category: IndexMap<u32, usize> = IndexMap::new();
    for &category_id in &category_ids {
        let image_ids = store.image_ids(category_id)?;
        selected.extend(image_ids.iter().copied());
        per_category.insert(category_id, image_ids.len());
    }

    let mut distribution = IndexMap::new();
    distribution.insert(BACKGROUND_ID, selected.len());
    distribution.extend(per_category);
    Ok(distribution)
}

/// Inverse-frequency class weights, `n_samples / (n_classes * count)` per
/// class, aligned with the distribution's key order.
pub fn class_weights(distribution: &IndexMap<u32, usize>) -> Vec<f64> {
    let n_samples = distribution
        .get(&BACKGROUND_ID)
        .copied()
        .unwrap_or_default() as f64;
    let n_classes = distribution.len() as f64;

    distribution
        .values()
        .map(|&count| n_samples / (n_classes * count as f64))
        .collect()
}
