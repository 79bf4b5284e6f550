//! Food vision and upload command handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fooddeals_core::api::FoodDealsApi;
use fooddeals_core::http::UploadFile;
use fooddeals_types::PredictionResult;

pub async fn predict(api: &FoodDealsApi, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path)?;
    let result = api.classify_image(file).await.context("classify image")?;
    print_result(&result, path);
    Ok(())
}

pub async fn batch(api: &FoodDealsApi, paths: &[PathBuf]) -> Result<()> {
    let files = paths
        .iter()
        .map(|path| UploadFile::from_path(path))
        .collect::<Result<Vec<_>>>()?;
    let batch = api
        .classify_images_batch(files)
        .await
        .context("classify images")?;
    for (result, path) in batch.results.iter().zip(paths) {
        print_result(result, path);
    }
    Ok(())
}

pub async fn zip(api: &FoodDealsApi, path: &Path) -> Result<()> {
    let archive = UploadFile::from_path(path)?;
    let batch = api
        .classify_images_zip(archive)
        .await
        .context("classify archive")?;
    if batch.results.is_empty() {
        println!("No images found in {}", path.display());
    }
    for result in &batch.results {
        print_result(result, path);
    }
    Ok(())
}

pub async fn upload(api: &FoodDealsApi, path: &Path) -> Result<()> {
    let file = UploadFile::from_path(path)?;
    let receipt = api.upload_file(file).await.context("upload file")?;
    let url = match (receipt.file_url, receipt.filename) {
        (Some(url), _) => url,
        (None, Some(filename)) => api.static_file_url(&filename),
        (None, None) => anyhow::bail!("Upload succeeded but no filename was returned"),
    };
    println!("{url}");
    Ok(())
}

fn print_result(result: &PredictionResult, fallback: &Path) {
    let name = result
        .filename
        .clone()
        .unwrap_or_else(|| fallback.display().to_string());
    if let Some(error) = result.error.as_deref() {
        println!("{name}: error: {error}");
        return;
    }
    match result.top() {
        Some(top) => {
            // Fractions and percentages both appear on the wire.
            let percent = if top.score <= 1.0 { top.score * 100.0 } else { top.score };
            println!("{name}: {} ({percent:.1}%)", top.label);
        }
        None => println!("{name}: no prediction"),
    }
}
