//! Sheet backends and the grid-to-record conversion shared by all of them.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SourceError;
use crate::record::Record;

pub mod file;
#[cfg(feature = "web")]
pub mod google;
pub mod memory;

pub use file::FileSheetSource;
#[cfg(feature = "web")]
pub use google::{GoogleEndpoints, GoogleSheetsSource};
pub use memory::MemorySheetSource;

/// A worksheet that can be read as a grid of formatted cell strings.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Read every row of the worksheet, header row first.
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SourceError>;

    /// Human-readable location of the worksheet, used in logs.
    fn describe(&self) -> String;
}

/// Fetch the worksheet behind `source` and convert it into records.
pub async fn fetch_records(source: &dyn SheetSource) -> Result<Vec<Record>, SourceError> {
    let grid = source.fetch_grid().await.map_err(|err| {
        log::warn!("failed to read {}: {}", source.describe(), err);
        err
    })?;
    let records = records_from_grid(grid);
    log::debug!("read {} records from {}", records.len(), source.describe());
    Ok(records)
}

/// Turn a raw grid into records keyed by the trimmed header row.
///
/// An empty grid yields no records. Each row is paired with the headers up to
/// the shorter of the two lengths.
pub fn records_from_grid(grid: Vec<Vec<String>>) -> Vec<Record> {
    let mut rows = grid.into_iter();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };

    let headers: Arc<[String]> = header_row
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>()
        .into();

    rows.map(|row| Record::new(Arc::clone(&headers), row)).collect()
}
