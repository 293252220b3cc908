//! Pretrained item embeddings.
//!
//! A plain-text table with one row per memorandum. Values may be separated
//! by commas, whitespace, or both, so both CSV exports and whitespace-aligned
//! PCA dumps load unchanged. Blank lines and lines starting with `#` are
//! skipped.

use std::path::Path;

use crate::error::{Result, TbrsError};

/// Rows of item embeddings, loaded once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    rows: Vec<Vec<f64>>,
}

impl EmbeddingTable {
    /// Build a table from in-memory rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Parse the textual table format.
    ///
    /// # Errors
    /// Returns `TbrsError::Embedding` on an unparseable or non-finite value.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let row = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|tok| !tok.is_empty())
                .map(|tok| {
                    tok.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| {
                            TbrsError::Embedding(format!(
                                "line {}: cannot read {tok:?} as a finite number",
                                line_no + 1
                            ))
                        })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// Read and parse a table file.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read, or
    /// `TbrsError::Embedding` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let table = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), rows = table.len(), "loaded embedding table");
        Ok(table)
    }

    /// Check there are at least `memoranda` rows of exactly `units` values.
    ///
    /// # Errors
    /// Returns `TbrsError::Embedding` describing the first mismatch.
    pub fn validate_shape(&self, memoranda: usize, units: usize) -> Result<()> {
        if self.rows.len() < memoranda {
            return Err(TbrsError::Embedding(format!(
                "{} rows, but {memoranda} memoranda need a row each",
                self.rows.len()
            )));
        }
        if let Some((i, row)) = self
            .rows
            .iter()
            .take(memoranda)
            .enumerate()
            .find(|(_, row)| row.len() != units)
        {
            return Err(TbrsError::Embedding(format!(
                "row {} has {} values, expected {units}",
                i + 1,
                row.len()
            )));
        }
        Ok(())
    }

    /// Row `index` (zero-based).
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_separators() {
        let table = EmbeddingTable::parse("0.1, 0.2 0.3\n\n# comment\n1,2,3\n").expect("parse");
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(0), Some(&[0.1, 0.2, 0.3][..]));
        assert_eq!(table.row(1), Some(&[1.0, 2.0, 3.0][..]));
        assert!(table.row(2).is_none());
    }

    #[test]
    fn rejects_garbage() {
        let err = EmbeddingTable::parse("0.1 zebra").expect_err("must fail");
        assert!(matches!(err, TbrsError::Embedding(msg) if msg.contains("line 1")));
        assert!(EmbeddingTable::parse("NaN").is_err());
    }

    #[test]
    fn shape_checks() {
        let table = EmbeddingTable::from_rows(vec![vec![0.0; 3], vec![0.0; 2]]);
        assert!(table.validate_shape(1, 3).is_ok());
        assert!(table.validate_shape(2, 3).is_err());
        assert!(table.validate_shape(3, 3).is_err());
    }
}
