//! Artifact writer
//!
//! Output goes to a temporary file next to the destination and is renamed
//! into place once fully written, so a failed export leaves nothing behind.

use crate::error::{PipelineError, Result};
use crate::export::dataset::ExportDataset;
use crate::export::html::render_html;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Output format, chosen from the destination's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Html,
        }
    }
}

/// Serialize the dataset in the format the path asks for
pub fn render(dataset: &ExportDataset, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Html => render_html(dataset),
        OutputFormat::Json => serde_json::to_string_pretty(dataset)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| {
                PipelineError::Export {
                    message: format!("failed to serialize dataset: {}", e),
                }
                .into()
            }),
    }
}

/// Render and write the dataset to `path`
pub fn write_dataset(dataset: &ExportDataset, path: &Path) -> Result<()> {
    let format = OutputFormat::from_path(path);
    let content = render(dataset, format)?;
    write_atomically(path, content.as_bytes())?;

    info!(
        "Wrote {:?} export to {} ({} bytes)",
        format,
        path.display(),
        content.len()
    );
    Ok(())
}

/// Write `content` to `path` via a temporary file in the same directory
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let export_error = |what: &str, e: std::io::Error| PipelineError::Export {
        message: format!("{} {}: {}", what, path.display(), e),
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| export_error("cannot create directory for", e))?;

    let mut file =
        NamedTempFile::new_in(dir).map_err(|e| export_error("cannot create temporary file for", e))?;
    file.write_all(content)
        .and_then(|_| file.flush())
        .map_err(|e| export_error("cannot write", e))?;
    file.persist(path)
        .map_err(|e| export_error("cannot move output into place at", e.error))?;

    Ok(())
}
