/// Model file auto-download from HuggingFace.
///
/// Fetches the ONNX export and tokenizer files of the sentence embedding
/// model when they are not already present locally.
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Base URL for HuggingFace model files.
const HF_BASE: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Files required for the embedder, with their relative URL paths.
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Check whether all required model files exist in `model_dir`.
#[must_use]
pub fn all_files_present(model_dir: &Path) -> bool {
    missing_files(model_dir).is_empty()
}

/// Names of the required files not yet present in `model_dir`.
#[must_use]
pub fn missing_files(model_dir: &Path) -> Vec<&'static str> {
    MODEL_FILES
        .iter()
        .filter(|(name, _)| !model_dir.join(name).exists())
        .map(|(name, _)| *name)
        .collect()
}

/// Download model files from HuggingFace if any are missing.
///
/// Creates the model directory if it doesn't exist and skips individual
/// files that are already present.
pub fn download_model_files(model_dir: &Path) -> Result<()> {
    info!("Checking model files in {}", model_dir.display());

    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create models directory: {}", model_dir.display()))?;

    let missing = missing_files(model_dir);
    if missing.is_empty() {
        info!("All model files found, skipping download");
        return Ok(());
    }

    info!("Downloading {} model file(s) from HuggingFace...", missing.len());

    for &(filename, url_path) in MODEL_FILES {
        if !missing.contains(&filename) {
            continue;
        }

        let url = format!("{HF_BASE}/{url_path}");
        info!("Downloading {filename}...");
        download_file(&model_dir.join(filename), &url)
            .with_context(|| format!("failed to download {filename}"))?;
    }

    info!("Model download complete");
    Ok(())
}

/// Download a single file with a progress bar.
fn download_file(dest: &Path, url: &str) -> Result<()> {
    let mut resp =
        reqwest::blocking::get(url).with_context(|| format!("HTTP request failed: {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("bad status: {} for {url}", resp.status());
    }

    let pb = match resp.content_length() {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes}) {msg}")
                    .context("invalid progress template")?
                    .progress_chars("█▓░"),
            );
            pb
        }
        _ => ProgressBar::new_spinner(),
    };

    // Write to a temp name so an interrupted download is not mistaken for a complete file
    let partial = dest.with_extension("part");
    let file = fs::File::create(&partial)
        .with_context(|| format!("failed to create file: {}", partial.display()))?;
    let mut writer = pb.wrap_write(file);

    resp.copy_to(&mut writer).context("failed to stream response body")?;
    writer.flush().context("failed to flush file")?;
    drop(writer);
    pb.finish_and_clear();

    fs::rename(&partial, dest)
        .with_context(|| format!("failed to move {} into place", partial.display()))?;

    Ok(())
}
