//! CSV export
//!
//! Files start with a UTF-8 byte-order mark so spreadsheet tools pick the
//! right encoding for non-ASCII text.

use super::{MergedRow, OutputError};
use chrono::Local;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row, in column order
pub const EXPORT_COLUMNS: [&str; 16] = [
    "keyword",
    "title",
    "author",
    "customerTag",
    "content",
    "likes",
    "collects",
    "comments",
    "noteUrl",
    "collectTime",
    "noteTime",
    "noteLocation",
    "noteType",
    "commentLocation",
    "commentId",
    "commenterNickname",
];

/// Writes the BOM, the header row and one line per row to `writer`
pub fn write_csv<W: Write>(mut writer: W, rows: &[MergedRow]) -> Result<(), OutputError> {
    writer.write_all(UTF8_BOM)?;

    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(EXPORT_COLUMNS)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes `rows` to `path`, creating parent directories as needed
pub fn export_rows(rows: &[MergedRow], path: &Path) -> Result<PathBuf, OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    write_csv(BufWriter::new(file), rows)?;

    tracing::info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(path.to_path_buf())
}

/// `<export_dir>/xhs_comments_YYYYmmdd_HHMMSS.csv` for the current local time
pub fn default_export_path(export_dir: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    Path::new(export_dir).join(format!("xhs_comments_{}.csv", stamp))
}
