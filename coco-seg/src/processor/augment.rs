use crate::common::*;

/// Configuration of [`Augment`].
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentInit {
    pub horizontal_flip: bool,
    pub vertical_flip: bool,
    /// Maximum translation per axis, as a fraction of the dimension.
    pub translation: Option<f64>,
}

impl AugmentInit {
    pub fn build(self) -> Result<Augment> {
        let Self {
            horizontal_flip,
            vertical_flip,
            translation,
        } = self;

        let translation = translation
            .map(|val| {
                ensure!(
                    (0.0..=1.0).contains(&val),
                    "translation must be in [0, 1], got {}",
                    val
                );
                Ok(val)
            })
            .transpose()?;

        Ok(Augment {
            horizontal_flip,
            vertical_flip,
            translation,
        })
    }
}

impl Default for AugmentInit {
    fn default() -> Self {
        Self {
            horizontal_flip: false,
            vertical_flip: false,
            translation: None,
        }
    }
}

/// Joint geometric augmentation over an image batch and its mask batch.
///
/// One seed drives the whole batch; per sample, the identical transform is
/// applied to the image and to every mask channel, so masks never drift from
/// their images. Mask channels are re-thresholded to {0.0, 1.0} afterwards.
#[derive(Debug, Clone)]
pub struct Augment {
    horizontal_flip: bool,
    vertical_flip: bool,
    translation: Option<f64>,
}

impl Augment {
    /// Transform `x` of shape (n, h, w, 3) and `y` of shape (n, h, w, c)
    /// into fresh augmented arrays of the same shapes.
    pub fn forward(
        &self,
        x: &Array4<f32>,
        y: &Array4<f32>,
        seed: u64,
    ) -> Result<(Array4<f32>, Array4<f32>)> {
        let (n, h, w, image_channels) = x.dim();
        let (n_y, h_y, w_y, mask_channels) = y.dim();
        ensure!(
            n == n_y && h == h_y && w == w_y,
            "image batch {:?} and mask batch {:?} must agree on batch size and spatial shape",
            x.dim(),
            y.dim()
        );

        let mut rng = StdRng::seed_from_u64(seed);
        let mut x_aug = Array4::<f32>::zeros(x.dim());
        let mut y_aug = Array4::<f32>::zeros(y.dim());

        for sample in 0..n {
            let draw = self.draw(&mut rng, h, w);

            for channel in 0..image_channels {
                apply(
                    draw,
                    x.slice(s![sample, .., .., channel]),
                    x_aug.slice_mut(s![sample, .., .., channel]),
                );
            }
            for channel in 0..mask_channels {
                apply(
                    draw,
                    y.slice(s![sample, .., .., channel]),
                    y_aug.slice_mut(s![sample, .., .., channel]),
                );
            }
        }

        y_aug.mapv_inplace(|value| if value >= 0.5 { 1.0 } else { 0.0 });

        Ok((x_aug, y_aug))
    }

    fn draw(&self, rng: &mut StdRng, h: usize, w: usize) -> Draw {
        let flip_h = self.horizontal_flip && rng.gen::<bool>();
        let flip_v = self.vertical_flip && rng.gen::<bool>();
        let (shift_rows, shift_cols) = match self.translation {
            Some(fraction) => {
                let max_rows = (fraction * h as f64) as i64;
                let max_cols = (fraction * w as f64) as i64;
                (
                    rng.gen_range(-max_rows..=max_rows),
                    rng.gen_range(-max_cols..=max_cols),
                )
            }
            None => (0, 0),
        };

        Draw {
            flip_h,
            flip_v,
            shift_rows,
            shift_cols,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Draw {
    flip_h: bool,
    flip_v: bool,
    shift_rows: i64,
    shift_cols: i64,
}

fn apply(draw: Draw, src: ArrayView2<f32>, mut dst: ArrayViewMut2<f32>) {
    let (h, w) = src.dim();
    for ((row, col), &value) in src.indexed_iter() {
        let row = if draw.flip_v { h - 1 - row } else { row } as i64 + draw.shift_rows;
        let col = if draw.flip_h { w - 1 - col } else { col } as i64 + draw.shift_cols;
        if (0..h as i64).contains(&row) && (0..w as i64).contains(&col) {
            dst[(row as usize, col as usize)] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> (Array4<f32>, Array4<f32>) {
        let mut x = Array4::<f32>::zeros((1, 4, 4, 3));
        let mut y = Array4::<f32>::zeros((1, 4, 4, 2));
        // an asymmetric pattern, duplicated into a mask channel
        for &(row, col) in &[(0, 0), (0, 1), (1, 0), (2, 3)] {
            for channel in 0..3 {
                x[(0, row, col, channel)] = 1.0;
            }
            y[(0, row, col, 1)] = 1.0;
        }
        (x, y)
    }

    #[test]
    fn disabled_augmentation_is_identity() {
        let augment = AugmentInit::default().build().unwrap();
        let (x, y) = batch();
        let (x_aug, y_aug) = augment.forward(&x, &y, 7).unwrap();
        assert_eq!(x_aug, x);
        assert_eq!(y_aug, y);
    }

    #[test]
    fn same_seed_same_output() {
        let augment = AugmentInit {
            horizontal_flip: true,
            vertical_flip: true,
            translation: Some(0.5),
        }
        .build()
        .unwrap();
        let (x, y) = batch();

        let (x_a, y_a) = augment.forward(&x, &y, 42).unwrap();
        let (x_b, y_b) = augment.forward(&x, &y, 42).unwrap();
        assert_eq!(x_a, x_b);
        assert_eq!(y_a, y_b);
    }

    #[test]
    fn image_and_mask_receive_identical_transform() {
        let augment = AugmentInit {
            horizontal_flip: true,
            vertical_flip: true,
            translation: Some(0.5),
        }
        .build()
        .unwrap();
        let (x, y) = batch();

        for seed in 0..16 {
            let (x_aug, y_aug) = augment.forward(&x, &y, seed).unwrap();
            // mask channel 1 mirrors image channel 0 before the transform,
            // so they must still match afterwards
            assert_eq!(
                x_aug.slice(s![0, .., .., 0]),
                y_aug.slice(s![0, .., .., 1]),
                "seed {}",
                seed
            );
        }
    }

    #[test]
    fn masks_stay_binary() {
        let augment = AugmentInit {
            horizontal_flip: true,
            vertical_flip: false,
            translation: Some(0.25),
        }
        .build()
        .unwrap();
        let (x, y) = batch();

        for seed in 0..8 {
            let (_, y_aug) = augment.forward(&x, &y, seed).unwrap();
            assert!(y_aug.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn pure_flips_preserve_mass() {
        let augment = AugmentInit {
            horizontal_flip: true,
            vertical_flip: true,
            translation: None,
        }
        .build()
        .unwrap();
        let (x, y) = batch();

        let (x_aug, y_aug) = augment.forward(&x, &y, 3).unwrap();
        assert_eq!(x_aug.sum(), x.sum());
        assert_eq!(y_aug.sum(), y.sum());
    }

    #[test]
    fn invalid_translation_rejected() {
        let init = AugmentInit {
            horizontal_flip: false,
            vertical_flip: false,
            translation: Some(1.5),
        };
        assert!(init.build().is_err());
    }

    #[test]
    fn mismatched_batches_rejected() {
        let augment = AugmentInit::default().build().unwrap();
        let x = Array4::<f32>::zeros((1, 4, 4, 3));
        let y = Array4::<f32>::zeros((2, 4, 4, 2));
        assert!(augment.forward(&x, &y, 0).is_err());
    }
}
