use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Column-major table of `f64` series, one labelled column per ticker,
/// every column aligned 1:1 with the session timeline.
///
/// The label order is the column order. Missing observations are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    rows: usize,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Frame {
    /// An empty frame for a timeline of `rows` entries.
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            labels: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.position(label).map(|idx| self.columns[idx].as_slice())
    }

    pub fn column_mut(&mut self, label: &str) -> Option<&mut Vec<f64>> {
        let idx = self.position(label)?;
        Some(&mut self.columns[idx])
    }

    /// Value at (`row`, `label`), if both exist.
    pub fn value(&self, row: usize, label: &str) -> Option<f64> {
        self.column(label).and_then(|c| c.get(row).copied())
    }

    /// Iterate `(label, values)` in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }

    /// Append a column. Fails on a duplicate label or a length mismatch.
    pub fn push_column(
        &mut self,
        label: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), CoreError> {
        let at = self.columns.len();
        self.insert_column(at, label, values)
    }

    /// Insert a column at position `at` (clamped to the current width).
    pub fn insert_column(
        &mut self,
        at: usize,
        label: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), CoreError> {
        let label = label.into();
        if values.len() != self.rows {
            return Err(CoreError::ValidationError(format!(
                "column {label} has {} values, expected {}",
                values.len(),
                self.rows
            )));
        }
        if self.contains(&label) {
            return Err(CoreError::ValidationError(format!(
                "column {label} already exists"
            )));
        }
        let at = at.min(self.columns.len());
        self.labels.insert(at, label);
        self.columns.insert(at, values);
        Ok(())
    }

    /// Insert or overwrite the column for `label` (appended when new).
    pub fn set_column(&mut self, label: &str, values: Vec<f64>) -> Result<(), CoreError> {
        match self.position(label) {
            Some(idx) if values.len() == self.rows => {
                self.columns[idx] = values;
                Ok(())
            }
            Some(_) => Err(CoreError::ValidationError(format!(
                "column {label} has {} values, expected {}",
                values.len(),
                self.rows
            ))),
            None => self.push_column(label, values),
        }
    }

    /// Drop the column for `label`, returning its values.
    pub fn remove_column(&mut self, label: &str) -> Option<Vec<f64>> {
        let idx = self.position(label)?;
        self.labels.remove(idx);
        Some(self.columns.remove(idx))
    }

    /// Rearrange columns to follow `order`. Pure relabeling: values are moved,
    /// never recomputed. `order` must be a permutation of the current labels.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), CoreError> {
        if order.len() != self.labels.len() {
            return Err(CoreError::ValidationError(format!(
                "reorder expects {} labels, got {}",
                self.labels.len(),
                order.len()
            )));
        }

        let mut indices = Vec::with_capacity(order.len());
        for label in order {
            let idx = self.position(label).ok_or_else(|| {
                CoreError::ValidationError(format!("reorder label {label} is not a column"))
            })?;
            if indices.contains(&idx) {
                return Err(CoreError::ValidationError(format!(
                    "reorder label {label} appears twice"
                )));
            }
            indices.push(idx);
        }

        let mut columns: Vec<Option<Vec<f64>>> =
            std::mem::take(&mut self.columns).into_iter().map(Some).collect();
        let new_columns = indices
            .iter()
            .map(|&idx| columns[idx].take().unwrap_or_default())
            .collect();

        self.labels = order.to_vec();
        self.columns = new_columns;
        Ok(())
    }
}
