// ============================================================
// TABLE
// ============================================================
// Column-ordered row table shared by both export formats

use std::collections::{HashMap, HashSet};

use super::CellValue;

/// Header given to a blank column name at `position`
pub fn unnamed_header(position: usize) -> String {
    format!("Unnamed: {}", position)
}

/// An in-memory export table.
///
/// Column names are unique; every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table from raw header cells
    pub fn with_headers<I>(headers: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            columns: Self::normalize_headers(headers),
            rows: Vec::new(),
        }
    }

    /// Blank headers become `Unnamed: <position>`, repeats get `.1`, `.2`, ...
    pub fn normalize_headers<I>(headers: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut columns = Vec::new();

        for (position, raw) in headers.into_iter().enumerate() {
            let base = if raw.is_empty() {
                unnamed_header(position)
            } else {
                raw
            };

            let mut name = base.clone();
            while seen.contains(&name) {
                let count = counts.entry(base.clone()).or_insert(0);
                *count += 1;
                name = format!("{}.{}", base, count);
            }

            seen.insert(name.clone());
            columns.push(name);
        }

        columns
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row, padding missing trailing cells with empty values.
    /// Returns the row back if it has more cells than there are columns.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) -> Result<(), Vec<CellValue>> {
        if row.len() > self.columns.len() {
            return Err(row);
        }
        row.resize(self.columns.len(), CellValue::empty());
        self.rows.push(row);
        Ok(())
    }

    /// Remove a column and return its name and cells
    pub fn remove_column(&mut self, index: usize) -> (String, Vec<CellValue>) {
        let name = self.columns.remove(index);
        let cells = self.rows.iter_mut().map(|row| row.remove(index)).collect();
        (name, cells)
    }

    /// Append a column. `cells` must be aligned with the existing rows.
    pub fn push_column(&mut self, name: String, cells: Vec<CellValue>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        self.columns.push(name);
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }

    /// Replace every row with `f(row)`, keeping column layout
    pub fn map_rows<F>(mut self, f: F) -> Self
    where
        F: FnMut(Vec<CellValue>) -> Vec<CellValue>,
    {
        self.rows = self.rows.into_iter().map(f).collect();
        self
    }

    /// Drop a leading unnamed column holding exactly the row ordinals 0..n,
    /// which is how a previously written row index reads back in.
    pub fn drop_ordinal_index(&mut self) -> bool {
        if self.columns.first().map(String::as_str) != Some(unnamed_header(0).as_str()) {
            return false;
        }

        let is_index = self.rows.iter().enumerate().all(|(ordinal, row)| {
            row.first()
                .and_then(CellValue::as_scalar)
                .map(|scalar| scalar.is_ordinal(ordinal))
                .unwrap_or(false)
        });

        if is_index {
            self.remove_column(0);
        }
        is_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::export::Scalar;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_headers() {
        let columns = Table::normalize_headers(strings(&["", "A", "A", "B", "A", ""]));
        assert_eq!(columns, strings(&["Unnamed: 0", "A", "A.1", "B", "A.2", "Unnamed: 5"]));
    }

    #[test]
    fn test_push_row_pads_and_rejects() {
        let mut table = Table::with_headers(strings(&["A", "B"]));
        assert!(table.push_row(vec![CellValue::text("1")]).is_ok());
        assert_eq!(table.rows()[0], vec![CellValue::text("1"), CellValue::empty()]);

        let too_long = vec![CellValue::text("1"), CellValue::text("2"), CellValue::text("3")];
        assert!(table.push_row(too_long).is_err());
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_remove_and_push_column() {
        let mut table = Table::with_headers(strings(&["A", "B"]));
        table.push_row(vec![CellValue::text("a0"), CellValue::text("b0")]).unwrap();
        table.push_row(vec![CellValue::text("a1"), CellValue::text("b1")]).unwrap();

        let (name, cells) = table.remove_column(0);
        assert_eq!(name, "A");
        assert_eq!(cells, vec![CellValue::text("a0"), CellValue::text("a1")]);
        assert_eq!(table.columns(), &["B".to_string()]);

        table.push_column("A".to_string(), cells);
        assert_eq!(table.columns(), &strings(&["B", "A"])[..]);
        assert_eq!(table.rows()[1], vec![CellValue::text("b1"), CellValue::text("a1")]);
    }

    #[test]
    fn test_drop_ordinal_index() {
        let mut table = Table::with_headers(strings(&["", "A"]));
        table.push_row(vec![CellValue::text("0"), CellValue::text("x")]).unwrap();
        table
            .push_row(vec![CellValue::Plain(Scalar::Int(1)), CellValue::text("y")])
            .unwrap();

        assert!(table.drop_ordinal_index());
        assert_eq!(table.columns(), &["A".to_string()]);
    }

    #[test]
    fn test_keep_unnamed_column_that_is_not_an_index() {
        let mut table = Table::with_headers(strings(&["", "A"]));
        table.push_row(vec![CellValue::text("5"), CellValue::text("x")]).unwrap();

        assert!(!table.drop_ordinal_index());
        assert_eq!(table.column_count(), 2);
    }
}
