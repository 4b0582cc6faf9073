//! Synthetic in-memory dataset fixtures shared across unit tests.

use super::{CocoAnnotation, CocoCategory, CocoDataset, CocoImage, CocoStore, Segmentation};

/// Uncompressed RLE covering an axis-aligned rectangle, with exact pixel
/// coverage: rows `top..top + rect_h`, cols `left..left + rect_w`.
pub fn rect_rle(
    (height, width): (u32, u32),
    (top, left): (u32, u32),
    (rect_h, rect_w): (u32, u32),
) -> Segmentation {
    let (h, w) = (height as usize, width as usize);
    let mut flat = vec![0u8; h * w];
    for col in left..left + rect_w {
        for row in top..top + rect_h {
            flat[col as usize * h + row as usize] = 1;
        }
    }

    let mut counts = Vec::new();
    let mut previous = 0u8;
    let mut run = 0u32;
    for &value in &flat {
        if value != previous {
            counts.push(run);
            run = 0;
            previous = value;
        }
        run += 1;
    }
    counts.push(run);

    Segmentation::Rle {
        size: [height, width],
        counts,
    }
}

pub fn image(id: u32, file_name: &str, height: u32, width: u32) -> CocoImage {
    CocoImage {
        id,
        file_name: file_name.to_owned(),
        height,
        width,
    }
}

pub fn category(id: u32, name: &str) -> CocoCategory {
    CocoCategory {
        id,
        name: name.to_owned(),
        supercategory: None,
    }
}

pub fn annotation(
    id: u64,
    image_id: u32,
    category_id: u32,
    segmentation: Segmentation,
) -> CocoAnnotation {
    CocoAnnotation {
        id,
        image_id,
        category_id,
        segmentation,
        area: None,
        bbox: None,
        iscrowd: None,
    }
}

/// Two 8x8 images, categories "cat" (id 5) and "dog" (id 7).
///
/// - annotation 10: image 1, cat, top-left quadrant;
/// - annotation 11: image 2, dog, bottom-right quadrant.
pub fn two_category_store() -> CocoStore {
    let dataset = CocoDataset {
        images: vec![image(1, "img1.png", 8, 8), image(2, "img2.png", 8, 8)],
        categories: vec![category(5, "cat"), category(7, "dog")],
        annotations: vec![
            annotation(10, 1, 5, rect_rle((8, 8), (0, 0), (4, 4))),
            annotation(11, 2, 7, rect_rle((8, 8), (4, 4), (4, 4))),
        ],
    };
    CocoStore::from_dataset(dataset).unwrap()
}
