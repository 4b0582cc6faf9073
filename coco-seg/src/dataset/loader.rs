use super::{categorical_mask, ClassMap};
use crate::{common::*, store::AnnotationStore};
use image::{imageops, imageops::FilterType, GrayImage, Luma};
use indicatif::ProgressBar;

/// Load the whole dataset in one shot, filtered to the given class names.
///
/// Returns `(x, y)`: images of shape (n, height, width, 3) and categorical
/// masks of shape (n, height, width, n_classes), rows aligned with the
/// class map's image order. Masks are synthesized at native resolution, then
/// every channel is resized independently with nearest-neighbor sampling so
/// values stay in {0.0, 1.0}.
///
/// The whole dataset is materialized in memory at once; callers chunk
/// externally if that is too large. Any missing or unreadable image file is
/// fatal, there is no skip-and-continue.
pub fn load_data<S>(
    store: &S,
    img_dir: impl AsRef<Path>,
    size: (u32, u32),
    class_names: &[String],
    show_progress: bool,
) -> Result<(Array4<f32>, Array4<f32>)>
where
    S: AnnotationStore + ?Sized,
{
    let img_dir = img_dir.as_ref();
    let (target_h, target_w) = size;
    let (th, tw) = (target_h as usize, target_w as usize);

    let classes = ClassMap::build(store, class_names)?;
    let num_images = classes.image_ids.len();
    info!(
        "loading {} images for {} classes",
        num_images,
        classes.num_classes()
    );

    let mut x = Array4::<f32>::zeros((num_images, th, tw, 3));
    {
        let progress = show_progress.then(|| ProgressBar::new(num_images as u64));
        for (index, file_name) in classes.image_names.iter().enumerate() {
            let path = img_dir.join(file_name);
            let decoded = image::open(&path)
                .with_context(|| format!("failed to read image '{}'", path.display()))?;
            let resized = decoded
                .resize_exact(target_w, target_h, FilterType::Triangle)
                .to_rgb8();

            for (col, row, pixel) in resized.enumerate_pixels() {
                for channel in 0..3 {
                    x[(index, row as usize, col as usize, channel)] = pixel[channel] as f32;
                }
            }

            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }
        if let Some(bar) = progress {
            bar.finish();
        }
    }

    let mut y = Array4::<f32>::zeros((num_images, th, tw, classes.num_classes()));
    {
        let progress = show_progress.then(|| ProgressBar::new(num_images as u64));
        for (index, &image_id) in classes.image_ids.iter().enumerate() {
            let mask = categorical_mask(store, image_id, &classes)?;
            let (native_h, native_w, _) = mask.dim();

            for channel in 0..classes.num_classes() {
                let mut plane = GrayImage::new(native_w as u32, native_h as u32);
                for ((row, col), &value) in mask.slice(s![.., .., channel]).indexed_iter() {
                    plane.put_pixel(col as u32, row as u32, Luma([value as u8]));
                }

                let resized = imageops::resize(&plane, target_w, target_h, FilterType::Nearest);
                for (col, row, pixel) in resized.enumerate_pixels() {
                    y[(index, row as usize, col as usize, channel)] = pixel[0] as f32;
                }
            }

            if let Some(bar) = &progress {
                bar.inc(1);
            }
        }
        if let Some(bar) = progress {
            bar.finish();
        }
    }

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{testing, CocoDataset, CocoStore};
    use image::RgbImage;

    fn write_fixture_images(dir: &Path, names_and_sizes: &[(&str, u32, u32)]) {
        for &(name, height, width) in names_and_sizes {
            let img = RgbImage::from_pixel(width, height, image::Rgb([80, 120, 160]));
            img.save(dir.join(name)).unwrap();
        }
    }

    #[test]
    fn end_to_end_quadrant_dataset() {
        let store = testing::two_category_store();
        let tmp = tempfile::tempdir().unwrap();
        write_fixture_images(tmp.path(), &[("img1.png", 8, 8), ("img2.png", 8, 8)]);

        let class_names = vec!["cat".to_owned(), "dog".to_owned()];
        let (x, y) = load_data(&store, tmp.path(), (8, 8), &class_names, false).unwrap();

        assert_eq!(x.dim(), (2, 8, 8, 3));
        assert_eq!(y.dim(), (2, 8, 8, 3));

        // selection order: cat images first, so row 0 is image 1
        for row in 0..8 {
            for col in 0..8 {
                let covered = row < 4 && col < 4;
                assert_eq!(y[(0, row, col, 1)], covered as u8 as f32);
                assert_eq!(y[(0, row, col, 0)], (!covered) as u8 as f32);
            }
        }

        // decoded pixels survive into x
        assert_eq!(x[(0, 0, 0, 0)], 80.0);
        assert_eq!(x[(0, 0, 0, 2)], 160.0);
    }

    #[test]
    fn nearest_resize_keeps_masks_binary() {
        let dataset = CocoDataset {
            images: vec![testing::image(1, "odd.png", 10, 10)],
            categories: vec![testing::category(5, "cat")],
            annotations: vec![testing::annotation(
                10,
                1,
                5,
                testing::rect_rle((10, 10), (0, 0), (5, 5)),
            )],
        };
        let store = CocoStore::from_dataset(dataset).unwrap();

        let tmp = tempfile::tempdir().unwrap();
        write_fixture_images(tmp.path(), &[("odd.png", 10, 10)]);

        let (_, y) = load_data(&store, tmp.path(), (4, 4), &[], false).unwrap();
        assert_eq!(y.dim(), (1, 4, 4, 2));
        assert!(y.iter().all(|&v| v == 0.0 || v == 1.0));
        assert!(y.slice(s![0, .., .., 1]).iter().any(|&v| v == 1.0));
    }

    #[test]
    fn missing_image_file_is_fatal() {
        let store = testing::two_category_store();
        let tmp = tempfile::tempdir().unwrap();
        // no fixture images written
        assert!(load_data(&store, tmp.path(), (8, 8), &[], false).is_err());
    }
}
