use super::{binary_union_mask, label_mask};
use crate::{common::*, store::AnnotationStore};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Subdirectory holding the source images of a dataset.
pub const IMAGES_DIR: &str = "images";
/// Subdirectory receiving the written mask files.
pub const MASKS_DIR: &str = "masks";

/// Write the flattened label mask of every image in the store to
/// `<base_dir>/masks/<file_name>` as a 16-bit single-channel image, and
/// return the masks in store order.
///
/// The file name matches the source image, so its format must support 16-bit
/// depth (PNG does).
pub fn extract_label_masks<S>(store: &S, base_dir: impl AsRef<Path>) -> Result<Vec<Array2<u16>>>
where
    S: AnnotationStore + ?Sized,
{
    let masks_dir = base_dir.as_ref().join(MASKS_DIR);
    fs::create_dir_all(&masks_dir)
        .with_context(|| format!("failed to create '{}'", masks_dir.display()))?;

    let images = store.load_images(&store.all_image_ids())?;
    info!("extracting {} label masks to '{}'", images.len(), masks_dir.display());

    let mut masks = Vec::with_capacity(images.len());
    for image in &images {
        let mask = label_mask(store, image.id)?;
        let path = masks_dir.join(&image.file_name);
        save_luma16(&mask, &path)?;
        debug!("wrote label mask '{}'", path.display());
        masks.push(mask);
    }

    Ok(masks)
}

/// Write the binary union mask of every image in the store to
/// `<base_dir>/masks/<file_name>` as an 8-bit single-channel image with
/// pixel values in {0, 1}, and return the masks in store order.
pub fn extract_binary_masks<S>(store: &S, base_dir: impl AsRef<Path>) -> Result<Vec<Array2<u8>>>
where
    S: AnnotationStore + ?Sized,
{
    let masks_dir = base_dir.as_ref().join(MASKS_DIR);
    fs::create_dir_all(&masks_dir)
        .with_context(|| format!("failed to create '{}'", masks_dir.display()))?;

    let images = store.load_images(&store.all_image_ids())?;
    info!("extracting {} binary masks to '{}'", images.len(), masks_dir.display());

    let mut masks = Vec::with_capacity(images.len());
    for image in &images {
        let mask = binary_union_mask(store, image.id)?;
        let path = masks_dir.join(&image.file_name);
        save_luma8(&mask, &path)?;
        debug!("wrote binary mask '{}'", path.display());
        masks.push(mask);
    }

    Ok(masks)
}

fn save_luma16(mask: &Array2<u16>, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();
    let buffer = ImageBuffer::<Luma<u16>, Vec<u16>>::from_fn(w as u32, h as u32, |col, row| {
        Luma([mask[(row as usize, col as usize)]])
    });
    DynamicImage::ImageLuma16(buffer)
        .save(path)
        .with_context(|| format!("failed to write mask '{}'", path.display()))
}

fn save_luma8(mask: &Array2<u8>, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();
    let buffer = GrayImage::from_fn(w as u32, h as u32, |col, row| {
        Luma([mask[(row as usize, col as usize)]])
    });
    buffer
        .save(path)
        .with_context(|| format!("failed to write mask '{}'", path.display()))
}
