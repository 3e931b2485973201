use async_trait::async_trait;
use calamine::{Data, Reader, open_workbook_auto};
use std::path::{Path, PathBuf};

use super::SheetSource;
use crate::error::SourceError;

/// A worksheet read from a local export of the order sheet.
///
/// `.csv` files hold a single sheet, so the worksheet name is ignored for
/// them. Workbook formats (`.xlsx`, `.xlsm`, `.xls`, `.ods`) select the
/// worksheet by name.
#[derive(Clone, Debug)]
pub struct FileSheetSource {
    path: PathBuf,
    worksheet: String,
}

impl FileSheetSource {
    pub fn new(path: impl Into<PathBuf>, worksheet: impl Into<String>) -> Self {
        FileSheetSource {
            path: path.into(),
            worksheet: worksheet.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SheetSource for FileSheetSource {
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SourceError> {
        let path = self.path.clone();
        let worksheet = self.worksheet.clone();
        tokio::task::spawn_blocking(move || load_grid(&path, &worksheet))
            .await
            .map_err(|e| SourceError::Unexpected(e.to_string()))?
    }

    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.worksheet)
    }
}

/// Detect the file type from its extension and read the grid.
pub fn load_grid(path: &Path, worksheet: &str) -> Result<Vec<Vec<String>>, SourceError> {
    if !path.is_file() {
        return Err(SourceError::DocumentNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => grid_from_csv(path),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => {
            grid_from_workbook(path, worksheet)
        }
        Some(ext) => Err(SourceError::Configuration(format!(
            "unsupported file extension: {}",
            ext
        ))),
        None => Err(SourceError::Configuration(format!(
            "{} has no extension",
            path.display()
        ))),
    }
}

fn grid_from_csv(path: &Path) -> Result<Vec<Vec<String>>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut grid = Vec::new();
    for row in reader.records() {
        let row = row?;
        grid.push(row.iter().map(str::to_string).collect());
    }
    Ok(grid)
}

fn grid_from_workbook(path: &Path, worksheet: &str) -> Result<Vec<Vec<String>>, SourceError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SourceError::Unexpected(e.to_string()))?;

    if !workbook.sheet_names().iter().any(|name| name == worksheet) {
        return Err(SourceError::SheetNotFound(worksheet.to_string()));
    }

    let range = workbook
        .worksheet_range(worksheet)
        .map_err(|e| SourceError::Unexpected(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a workbook cell the way the sheet displays it.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(when) if when.time() == chrono::NaiveTime::MIN => {
                when.format("%Y-%m-%d").to_string()
            }
            Some(when) => when.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string(),
    }
}
