use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// One spreadsheet row keyed by the sheet's header names.
///
/// All records built from the same grid share one header list. A record only
/// holds values for the columns its row actually reached: when a row is
/// shorter than the header, the trailing columns are absent rather than empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Build a record from a shared header list and a row of cell values.
    ///
    /// Cells past the last header are dropped.
    pub fn new(headers: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.truncate(headers.len());
        Record { headers, values }
    }

    /// Build a standalone record from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let (headers, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Record::new(headers.into(), values)
    }

    /// Value of `column`, or `None` when the row did not reach that column.
    ///
    /// A repeated header resolves to its rightmost occurrence.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns()
            .filter(|(name, _)| *name == column)
            .last()
            .map(|(_, value)| value)
    }

    /// Like [`Record::get`], treating an empty cell the same as a missing one.
    pub fn get_non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|value| !value.is_empty())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// `(column, value)` pairs in sheet order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Serialized as a map in sheet order so templates can walk the columns.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.columns() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
