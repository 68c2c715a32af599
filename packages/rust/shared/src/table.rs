//! Header-keyed row table model for spreadsheet data.
//!
//! The first logical row of a fetched range defines the field names for every
//! subsequent row. Rows shorter than the header row simply lack the trailing
//! fields; lookups on them return `""`.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// RowTable
// ---------------------------------------------------------------------------

/// An ordered set of data rows keyed by a header row.
#[derive(Debug, Clone, Default)]
pub struct RowTable {
    headers: Vec<String>,
    /// Header name → column position. Duplicate headers resolve to the
    /// rightmost column, matching spreadsheet-dict semantics.
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl RowTable {
    /// Build a table from raw cell values, treating the first row as headers.
    pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let headers = values.remove(0);
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        Self {
            headers,
            index,
            rows: values,
        }
    }

    /// True when the fetched range held no cells at all (not even headers).
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Number of data rows (excluding the header row).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Header names in column order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterate data rows in source order.
    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(move |cells| RawRow {
            table: self,
            cells,
        })
    }
}

// ---------------------------------------------------------------------------
// RawRow
// ---------------------------------------------------------------------------

/// A borrowed view of one data row, keyed by the table's headers.
///
/// Ephemeral: exists only while iterating a [`RowTable`] and is never
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    table: &'a RowTable,
    cells: &'a [String],
}

impl RawRow<'_> {
    /// Get the cell under `header`, or `""` when the header is unknown or
    /// this row is too short to reach it.
    pub fn get(&self, header: &str) -> &str {
        self.table
            .index
            .get(header)
            .and_then(|&i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[&[&str]]) -> RowTable {
        RowTable::from_values(
            values
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn first_row_becomes_headers() {
        let t = table(&[&["Email", "Gender"], &["a@x.com", "F"]]);
        assert_eq!(t.headers(), ["Email", "Gender"]);
        assert_eq!(t.row_count(), 1);

        let row = t.rows().next().unwrap();
        assert_eq!(row.get("Email"), "a@x.com");
        assert_eq!(row.get("Gender"), "F");
    }

    #[test]
    fn short_rows_yield_empty_trailing_fields() {
        let t = table(&[&["Email", "Gender", "DOB"], &["a@x.com"]]);
        let row = t.rows().next().unwrap();
        assert_eq!(row.get("Email"), "a@x.com");
        assert_eq!(row.get("Gender"), "");
        assert_eq!(row.get("DOB"), "");
    }

    #[test]
    fn unknown_header_yields_empty() {
        let t = table(&[&["Email"], &["a@x.com"]]);
        let row = t.rows().next().unwrap();
        assert_eq!(row.get("Nope"), "");
    }

    #[test]
    fn empty_values_is_empty_table() {
        let t = RowTable::from_values(vec![]);
        assert!(t.is_empty());
        assert_eq!(t.row_count(), 0);
        assert_eq!(t.rows().count(), 0);
    }

    #[test]
    fn header_only_table_is_not_empty() {
        let t = table(&[&["Email"]]);
        assert!(!t.is_empty());
        assert_eq!(t.row_count(), 0);
    }

    #[test]
    fn rows_iterate_in_source_order() {
        let t = table(&[&["Email"], &["a@x.com"], &["b@x.com"], &["c@x.com"]]);
        let emails: Vec<_> = t.rows().map(|r| r.get("Email").to_string()).collect();
        assert_eq!(emails, ["a@x.com", "b@x.com", "c@x.com"]);
    }
}
