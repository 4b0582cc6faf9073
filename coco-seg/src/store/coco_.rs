use super::{
    decode_rle, polygon_mask, AnnotationRecord, AnnotationStore, CategoryRecord, ImageRecord,
};
use crate::common::*;

/// Category id reserved for the synthetic background class.
pub const BACKGROUND_ID: u32 = 0;

/// An image entry of a COCO annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u32,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
}

/// A category entry of a COCO annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,
}

/// The segmentation geometry of one annotation: polygon rings or an
/// uncompressed column-major RLE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    Polygons(Vec<Vec<f64>>),
    Rle {
        /// (height, width) of the mask the counts describe.
        size: [u32; 2],
        counts: Vec<u32>,
    },
}

/// An annotation entry of a COCO annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u32,
    pub category_id: u32,
    pub segmentation: Segmentation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iscrowd: Option<u8>,
}

/// The top-level layout of a COCO `annotations.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoDataset {
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

/// Annotation store backed by a parsed COCO annotation file.
///
/// Builds id and relation indices once at load; all queries are pure lookups
/// afterwards.
#[derive(Debug, Clone)]
pub struct CocoStore {
    dataset: CocoDataset,
    images: HashMap<u32, usize>,
    categories: HashMap<u32, usize>,
    annotations: HashMap<u64, usize>,
    image_to_anns: IndexMap<u32, Vec<u64>>,
    category_to_images: IndexMap<u32, Vec<u32>>,
}

impl CocoStore {
    /// Read and index a COCO annotation file.
    pub fn open(annotation_file: impl AsRef<Path>) -> Result<Self> {
        let annotation_file = annotation_file.as_ref();
        let reader = BufReader::new(File::open(annotation_file).with_context(|| {
            format!(
                "failed to open annotation file '{}'",
                annotation_file.display()
            )
        })?);
        let dataset: CocoDataset = serde_json::from_reader(reader).with_context(|| {
            format!(
                "failed to parse annotation file '{}'",
                annotation_file.display()
            )
        })?;
        Self::from_dataset(dataset)
    }

    /// Index an already-loaded dataset.
    pub fn from_dataset(dataset: CocoDataset) -> Result<Self> {
        let mut images = HashMap::new();
        let mut categories = HashMap::new();
        let mut annotations = HashMap::new();
        let mut image_to_anns: IndexMap<u32, Vec<u64>> = IndexMap::new();
        let mut category_to_images: IndexMap<u32, Vec<u32>> = IndexMap::new();

        for (index, image) in dataset.images.iter().enumerate() {
            ensure!(
                images.insert(image.id, index).is_none(),
                "duplicate image id {}",
                image.id
            );
            image_to_anns.entry(image.id).or_default();
        }

        for (index, category) in dataset.categories.iter().enumerate() {
            ensure!(
                category.id != BACKGROUND_ID,
                "category id {} is reserved for the background class",
                BACKGROUND_ID
            );
            ensure!(
                categories.insert(category.id, index).is_none(),
                "duplicate category id {}",
                category.id
            );
        }

        for (index, ann) in dataset.annotations.iter().enumerate() {
            ensure!(
                images.contains_key(&ann.image_id),
                "annotation {} refers to unknown image id {}",
                ann.id,
                ann.image_id
            );
            ensure!(
                categories.contains_key(&ann.category_id),
                "annotation {} refers to unknown category id {}",
                ann.id,
                ann.category_id
            );
            ensure!(
                annotations.insert(ann.id, index).is_none(),
                "duplicate annotation id {}",
                ann.id
            );

            image_to_anns.entry(ann.image_id).or_default().push(ann.id);
            let images_of_cat = category_to_images.entry(ann.category_id).or_default();
            if !images_of_cat.contains(&ann.image_id) {
                images_of_cat.push(ann.image_id);
            }
        }

        debug!(
            "indexed {} images, {} categories, {} annotations",
            dataset.images.len(),
            dataset.categories.len(),
            dataset.annotations.len()
        );

        Ok(Self {
            dataset,
            images,
            categories,
            annotations,
            image_to_anns,
            category_to_images,
        })
    }

    pub fn dataset(&self) -> &CocoDataset {
        &self.dataset
    }

    fn image(&self, id: u32) -> Result<&CocoImage> {
        let index = *self
            .images
            .get(&id)
            .ok_or_else(|| format_err!("unknown image id {}", id))?;
        Ok(&self.dataset.images[index])
    }

    fn category(&self, id: u32) -> Result<&CocoCategory> {
        let index = *self
            .categories
            .get(&id)
            .ok_or_else(|| format_err!("unknown category id {}", id))?;
        Ok(&self.dataset.categories[index])
    }

    fn annotation(&self, id: u64) -> Result<&CocoAnnotation> {
        let index = *self
            .annotations
            .get(&id)
            .ok_or_else(|| format_err!("unknown annotation id {}", id))?;
        Ok(&self.dataset.annotations[index])
    }
}

impl AnnotationStore for CocoStore {
    fn category_ids(&self, names: &[String]) -> Result<Vec<u32>> {
        if names.is_empty() {
            return Ok(self.dataset.categories.iter().map(|cat| cat.id).collect());
        }

        let ids: Vec<u32> = names
            .iter()
            .map(|name| {
                self.dataset
                    .categories
                    .iter()
                    .find(|cat| &cat.name == name)
                    .map(|cat| cat.id)
                    .ok_or_else(|| format_err!("unknown category name '{}'", name))
            })
            .collect::<Result<Vec<_>>>()?;

        // repeated names resolve to one id each, first mention wins
        Ok(ids.into_iter().unique().collect())
    }

    fn load_categories(&self, ids: &[u32]) -> Result<Vec<CategoryRecord>> {
        ids.iter()
            .map(|&id| {
                let category = self.category(id)?;
                Ok(CategoryRecord {
                    id: category.id,
                    name: category.name.clone(),
                })
            })
            .collect()
    }

    fn image_ids(&self, category_id: u32) -> Result<Vec<u32>> {
        self.category(category_id)?;
        Ok(self
            .category_to_images
            .get(&category_id)
            .cloned()
            .unwrap_or_default())
    }

    fn load_images(&self, ids: &[u32]) -> Result<Vec<ImageRecord>> {
        ids.iter()
            .map(|&id| {
                let image = self.image(id)?;
                Ok(ImageRecord {
                    id: image.id,
                    file_name: image.file_name.clone(),
                    height: image.height,
                    width: image.width,
                })
            })
            .collect()
    }

    fn all_image_ids(&self) -> Vec<u32> {
        self.dataset.images.iter().map(|image| image.id).collect()
    }

    fn annotation_ids(&self, image_id: u32) -> Result<Vec<u64>> {
        self.image(image_id)?;
        Ok(self
            .image_to_anns
            .get(&image_id)
            .cloned()
            .unwrap_or_default())
    }

    fn load_annotations(&self, ids: &[u64]) -> Result<Vec<AnnotationRecord>> {
        ids.iter()
            .map(|&id| {
                let ann = self.annotation(id)?;
                Ok(AnnotationRecord {
                    id: ann.id,
                    image_id: ann.image_id,
                    category_id: ann.category_id,
                })
            })
            .collect()
    }

    fn rasterize(&self, annotation_id: u64) -> Result<Array2<u8>> {
        let ann = self.annotation(annotation_id)?;
        let image = self.image(ann.image_id)?;
        let (height, width) = (image.height, image.width);

        let mask = match &ann.segmentation {
            Segmentation::Polygons(polygons) => {
                let mut mask = Array2::<u8>::zeros((height as usize, width as usize));
                for polygon in polygons {
                    let part = polygon_mask(polygon, height, width);
                    Zip::from(&mut mask).and(&part).for_each(|m, &p| *m |= p);
                }
                mask
            }
            Segmentation::Rle { size, counts } => {
                ensure!(
                    *size == [height, width],
                    "annotation {} RLE size {:?} does not match image size {:?}",
                    ann.id,
                    size,
                    [height, width]
                );
                decode_rle(counts, height, width)
            }
        };

        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;

    #[test]
    fn parse_annotation_json() {
        let json = r#"{
            "images": [
                {"id": 1, "file_name": "a.png", "height": 4, "width": 4}
            ],
            "categories": [
                {"id": 5, "name": "cat", "supercategory": "animal"}
            ],
            "annotations": [
                {
                    "id": 10, "image_id": 1, "category_id": 5,
                    "segmentation": [[0.0, 0.0, 2.0, 0.0, 2.0, 2.0, 0.0, 2.0]],
                    "area": 4.0, "bbox": [0.0, 0.0, 2.0, 2.0], "iscrowd": 0
                },
                {
                    "id": 11, "image_id": 1, "category_id": 5,
                    "segmentation": {"size": [4, 4], "counts": [0, 2, 14]}
                }
            ]
        }"#;

        let dataset: CocoDataset = serde_json::from_str(json).unwrap();
        assert!(matches!(
            dataset.annotations[0].segmentation,
            Segmentation::Polygons(_)
        ));
        assert!(matches!(
            dataset.annotations[1].segmentation,
            Segmentation::Rle { .. }
        ));

        let store = CocoStore::from_dataset(dataset).unwrap();
        assert_eq!(store.annotation_ids(1).unwrap(), vec![10, 11]);
    }

    #[test]
    fn reserved_background_id_rejected() {
        let dataset = CocoDataset {
            images: vec![],
            annotations: vec![],
            categories: vec![CocoCategory {
                id: 0,
                name: "void".into(),
                supercategory: None,
            }],
        };
        assert!(CocoStore::from_dataset(dataset).is_err());
    }

    #[test]
    fn unknown_lookups_error() {
        let store = testing::two_category_store();
        assert!(store.annotation_ids(999).is_err());
        assert!(store.load_images(&[999]).is_err());
        assert!(store.load_categories(&[999]).is_err());
        assert!(store.rasterize(999).is_err());
        assert!(store
            .category_ids(&["no-such-class".to_owned()])
            .is_err());
    }

    #[test]
    fn category_resolution_follows_request_order() {
        let store = testing::two_category_store();
        let ids = store
            .category_ids(&["dog".to_owned(), "cat".to_owned()])
            .unwrap();
        assert_eq!(ids, vec![7, 5]);

        // empty request selects everything, store order
        assert_eq!(store.category_ids(&[]).unwrap(), vec![5, 7]);
    }

    #[test]
    fn repeated_names_resolve_to_unique_ids() {
        let store = testing::two_category_store();
        let ids = store
            .category_ids(&["cat".to_owned(), "dog".to_owned(), "cat".to_owned()])
            .unwrap();
        assert_eq!(ids, vec![5, 7]);
    }

    #[test]
    fn rle_rasterization_is_exact() {
        let store = testing::two_category_store();
        // annotation 10: category 5 covering the top-left quadrant of 8x8
        let mask = store.rasterize(10).unwrap();
        assert_eq!(mask.dim(), (8, 8));
        for row in 0..8 {
            for col in 0..8 {
                let expect = (row < 4 && col < 4) as u8;
                assert_eq!(mask[(row, col)], expect, "pixel ({}, {})", row, col);
            }
        }
    }
}
