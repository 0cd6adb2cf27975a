// 💾 Model Persistence - Four independent artifacts under one directory
//
//   similarity_matrix.json   N×N cosine scores
//   prediction_model.json    random forest
//   price_scaler.json        mean / std_dev
//   category_features.csv    one-hot column order
//
// Reloading is only valid for the catalog the models were trained on.

use crate::catalog::Catalog;
use crate::features::{CategoryEncoder, FeatureBuilder, PriceScaler};
use crate::predictor::{RandomForest, SatisfactionPredictor};
use crate::recommender::Recommender;
use crate::similarity::SimilarityIndex;
use anyhow::{bail, ensure, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const SIMILARITY_MATRIX_FILE: &str = "similarity_matrix.json";
pub const PREDICTION_MODEL_FILE: &str = "prediction_model.json";
pub const PRICE_SCALER_FILE: &str = "price_scaler.json";
pub const CATEGORY_FEATURES_FILE: &str = "category_features.csv";

/// Models restored from disk, ready for `Recommender::with_models`
pub struct SavedModels {
    pub features: FeatureBuilder,
    pub index: SimilarityIndex,
    pub predictor: SatisfactionPredictor,
}

// ============================================================================
// SAVE
// ============================================================================

pub fn save_models(recommender: &Recommender, dir: &Path) -> Result<()> {
    let (Some(index), Some(predictor)) = (recommender.index(), recommender.predictor()) else {
        bail!("Models are not trained. Train them before saving.");
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    write_json(&dir.join(SIMILARITY_MATRIX_FILE), &index.matrix())?;
    write_json(&dir.join(PREDICTION_MODEL_FILE), predictor.forest())?;
    write_json(&dir.join(PRICE_SCALER_FILE), recommender.features().scaler())?;
    write_categories(
        &dir.join(CATEGORY_FEATURES_FILE),
        recommender.features().encoder().categories(),
    )?;

    tracing::info!(path = %dir.display(), "models saved");
    Ok(())
}

/// Write through a temp file in the same directory, then rename into place
fn persist_atomically(path: &Path, write: impl FnOnce(&mut BufWriter<&NamedTempFile>) -> Result<()>) -> Result<()> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_file = NamedTempFile::new_in(parent_dir)?;

    {
        let mut writer = BufWriter::new(&temp_file);
        write(&mut writer)?;
        writer.flush()?;
    }

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    persist_atomically(path, |writer| {
        serde_json::to_writer(writer, value).context("Failed to serialize model artifact")
    })
}

fn write_categories(path: &Path, categories: &[String]) -> Result<()> {
    persist_atomically(path, |writer| {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["category"])?;
        for category in categories {
            csv_writer.write_record([category])?;
        }
        csv_writer.flush()?;
        Ok(())
    })
}

// ============================================================================
// LOAD
// ============================================================================

/// Load all four artifacts. `Ok(None)` when the directory does not exist.
pub fn load_models(catalog: &Catalog, dir: &Path) -> Result<Option<SavedModels>> {
    if !dir.exists() {
        tracing::warn!(path = %dir.display(), "model path does not exist; models need to be trained first");
        return Ok(None);
    }

    let matrix: Vec<Vec<f64>> = read_json(&dir.join(SIMILARITY_MATRIX_FILE))?;
    let forest: RandomForest = read_json(&dir.join(PREDICTION_MODEL_FILE))?;
    let scaler: PriceScaler = read_json(&dir.join(PRICE_SCALER_FILE))?;
    let categories = read_categories(&dir.join(CATEGORY_FEATURES_FILE))?;

    let expected = CategoryEncoder::fit(catalog);
    ensure!(
        expected.categories() == categories.as_slice(),
        "Saved category features do not match the catalog; retrain the models"
    );

    let index = SimilarityIndex::from_matrix(matrix, catalog)?;

    tracing::info!(path = %dir.display(), "models loaded");
    Ok(Some(SavedModels {
        features: FeatureBuilder::from_parts(CategoryEncoder::from_categories(categories), scaler),
        index,
        predictor: SatisfactionPredictor::from_forest(forest),
    }))
}

/// Load saved models into a ready recommender, or `None` if nothing was saved
pub fn load_recommender(catalog: Catalog, dir: &Path) -> Result<Option<Recommender>> {
    Ok(load_models(&catalog, dir)?
        .map(|saved| Recommender::with_models(catalog, saved.features, saved.index, saved.predictor)))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_categories(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut categories = Vec::new();
    for record in rdr.records() {
        let record = record.context("Failed to read category feature")?;
        categories.push(record.get(0).unwrap_or("").to_string());
    }
    Ok(categories)
}

// ============================================================================
// TESTS
// ============================================================================
