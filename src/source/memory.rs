use async_trait::async_trait;

use super::SheetSource;
use crate::error::SourceError;

/// A fixed grid held in memory. Handy for demos and tests.
#[derive(Clone, Debug)]
pub struct MemorySheetSource {
    grid: Result<Vec<Vec<String>>, SourceError>,
}

impl MemorySheetSource {
    pub fn new(grid: Vec<Vec<String>>) -> Self {
        MemorySheetSource { grid: Ok(grid) }
    }

    /// A source whose every fetch fails with `err`.
    pub fn failing(err: SourceError) -> Self {
        MemorySheetSource { grid: Err(err) }
    }
}

#[async_trait]
impl SheetSource for MemorySheetSource {
    async fn fetch_grid(&self) -> Result<Vec<Vec<String>>, SourceError> {
        self.grid.clone()
    }

    fn describe(&self) -> String {
        "in-memory sheet".to_string()
    }
}
