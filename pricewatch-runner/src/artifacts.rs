//! Raw report artifact: the aggregated table as CSV.
//!
//! Header is the table's column list. Numbers are written in full
//! precision, flags as `true`/`false`, and cells with no data as `None`.
//! The file is written next to its final path and renamed into place, so a
//! failed run never leaves a half-written artifact behind.

use pricewatch_core::ReportTable;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to write artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Render the table as CSV bytes.
pub fn encode_raw_csv(table: &ReportTable) -> Result<Vec<u8>, ArtifactError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(table.columns())?;
    for record in table.records() {
        wtr.write_record(record.iter().map(|cell| cell.to_string()))?;
    }
    wtr.into_inner().map_err(|e| ArtifactError::Io {
        path: PathBuf::from("<memory>"),
        source: e.into_error(),
    })
}

/// Write the raw artifact to `path`, replacing any previous run's file.
pub fn write_raw_csv(table: &ReportTable, path: &Path) -> Result<(), ArtifactError> {
    let bytes = encode_raw_csv(table)?;
    write_atomic(path, &bytes).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), rows = table.len(), "wrote raw report");
    Ok(())
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let result = File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        })
        .and_then(|()| std::fs::rename(&tmp, path));

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
