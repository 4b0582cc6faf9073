use anyhow::{Context, Result};
use clap::Parser;
use coco_seg::{
    dataset::{categorical_mask, extract_binary_masks, extract_label_masks, ClassMap, IMAGES_DIR},
    stats::{class_distribution, class_weights},
    store::{AnnotationStore, CocoStore, BACKGROUND_ID},
    viz::overlay_mask,
};
use log::info;
use prettytable::{cell, row, Table};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
enum Opts {
    /// Write per-image mask files under `<dataset_dir>/masks/`
    Extract {
        /// dataset directory containing the annotation file and `images/`
        dataset_dir: PathBuf,
        #[clap(long, default_value = "annotations.json")]
        annotation_file: String,
        /// write 8-bit binary union masks instead of 16-bit label masks
        #[clap(long)]
        binary: bool,
    },
    /// Print the class distribution and class weights of a dataset
    Stats {
        dataset_dir: PathBuf,
        #[clap(long, default_value = "annotations.json")]
        annotation_file: String,
        /// restrict to these class names (repeatable); default is all
        #[clap(long)]
        class: Vec<String>,
    },
    /// Write mask overlays of the selected classes
    Overlay {
        dataset_dir: PathBuf,
        output_dir: PathBuf,
        #[clap(long, default_value = "annotations.json")]
        annotation_file: String,
        /// restrict to these class names (repeatable); default is all
        #[clap(long)]
        class: Vec<String>,
        /// overlay opacity
        #[clap(long, default_value = "0.5")]
        alpha: f32,
    },
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Opts::parse() {
        Opts::Extract {
            dataset_dir,
            annotation_file,
            binary,
        } => {
            extract(dataset_dir, annotation_file, binary)?;
        }
        Opts::Stats {
            dataset_dir,
            annotation_file,
            class,
        } => {
            stats(dataset_dir, annotation_file, class)?;
        }
        Opts::Overlay {
            dataset_dir,
            output_dir,
            annotation_file,
            class,
            alpha,
        } => {
            overlay(dataset_dir, output_dir, annotation_file, class, alpha)?;
        }
    }

    Ok(())
}

fn open_store(dataset_dir: &Path, annotation_file: &str) -> Result<CocoStore> {
    CocoStore::open(dataset_dir.join(annotation_file))
}

fn extract(dataset_dir: PathBuf, annotation_file: String, binary: bool) -> Result<()> {
    let store = open_store(&dataset_dir, &annotation_file)?;
    let count = if binary {
        extract_binary_masks(&store, &dataset_dir)?.len()
    } else {
        extract_label_masks(&store, &dataset_dir)?.len()
    };
    info!("wrote {} masks", count);
    Ok(())
}

fn stats(dataset_dir: PathBuf, annotation_file: String, class: Vec<String>) -> Result<()> {
    let store = open_store(&dataset_dir, &annotation_file)?;
    let distribution = class_distribution(&store, &class)?;
    let weights = class_weights(&distribution);

    let mut table = Table::new();
    table.add_row(row!["category id", "name", "images", "weight"]);

    for ((&category_id, &count), weight) in distribution.iter().zip(weights) {
        let name = if category_id == BACKGROUND_ID {
            "background".to_owned()
        } else {
            store.load_categories(&[category_id])?.remove(0).name
        };
        table.add_row(row![category_id, name, count, format!("{:.4}", weight)]);
    }

    table.printstd();
    Ok(())
}

fn overlay(
    dataset_dir: PathBuf,
    output_dir: PathBuf,
    annotation_file: String,
    class: Vec<String>,
    alpha: f32,
) -> Result<()> {
    let store = open_store(&dataset_dir, &annotation_file)?;
    let classes = ClassMap::build(&store, &class)?;

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create '{}'", output_dir.display()))?;

    for (&image_id, file_name) in classes.image_ids.iter().zip(&classes.image_names) {
        let image_path = dataset_dir.join(IMAGES_DIR).join(file_name);
        let image = image::open(&image_path)
            .with_context(|| format!("failed to read image '{}'", image_path.display()))?
            .to_rgb8();

        let mask = categorical_mask(&store, image_id, &classes)?;
        let composed = overlay_mask(&image, &mask, alpha)?;

        let out_path = output_dir.join(file_name);
        composed
            .save(&out_path)
            .with_context(|| format!("failed to write overlay '{}'", out_path.display()))?;
        info!("wrote overlay '{}'", out_path.display());
    }

    Ok(())
}
