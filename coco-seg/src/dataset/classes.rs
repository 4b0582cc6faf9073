use crate::{
    common::*,
    store::{AnnotationStore, BACKGROUND_ID},
};

/// Name of the synthetic class prepended to every class list.
pub const BACKGROUND_NAME: &str = "background";

/// Class list and category-to-channel assignment for a selection of
/// categories, with the synthetic background class at channel 0.
///
/// Immutable once built; every mask channel produced from it stays aligned
/// with `class_names` by position.
#[derive(Debug, Clone)]
pub struct ClassMap {
    /// "background" first, then the resolved categories in resolution order.
    pub class_names: IndexSet<String>,
    /// Category id → channel index. Key 0 always maps to 0; insertion order
    /// matches `class_names`.
    pub channel_index: IndexMap<u32, usize>,
    /// Images touching any selected category, first-seen order.
    pub image_ids: Vec<u32>,
    /// File names aligned with `image_ids`.
    pub image_names: Vec<String>,
}

impl ClassMap {
    /// Resolve the requested class names against the store. An empty slice
    /// selects every category.
    ///
    /// The image-id union is deduplicated in first-seen order, so the result
    /// is deterministic: category resolution order, then store order within
    /// a category.
    pub fn build<S>(store: &S, class_names: &[String]) -> Result<Self>
    where
        S: AnnotationStore + ?Sized,
    {
        let category_ids = store.category_ids(class_names)?;
        let categories = store.load_categories(&category_ids)?;

        let class_names: IndexSet<String> = iter::once(BACKGROUND_NAME.to_owned())
            .chain(categories.iter().map(|cat| cat.name.clone()))
            .collect();

        let channel_index: IndexMap<u32, usize> = iter::once(BACKGROUND_ID)
            .chain(category_ids.iter().copied())
            .enumerate()
            .map(|(channel, category_id)| (category_id, channel))
            .collect();

        let image_ids: IndexSet<u32> = {
            let mut image_ids = IndexSet::new();
            for &category_id in &category_ids {
                image_ids.extend(store.image_ids(category_id)?);
            }
            image_ids
        };
        let image_ids: Vec<u32> = image_ids.into_iter().collect();

        let image_names: Vec<String> = store
            .load_images(&image_ids)?
            .into_iter()
            .map(|image| image.file_name)
            .collect();

        Ok(Self {
            class_names,
            channel_index,
            image_ids,
            image_names,
        })
    }

    /// Number of channels, background included.
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Channel assigned to a raw category id, if the category is in scope.
    pub fn channel_of(&self, category_id: u32) -> Option<usize> {
        self.channel_index.get(&category_id).copied()
    }

    /// Class name shown at a channel position.
    pub fn name_of(&self, channel: usize) -> Option<&str> {
        self.class_names.get_index(channel).map(String::as_str)
    }
}
