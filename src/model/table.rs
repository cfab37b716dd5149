use crate::error::ShapeError;
use crate::query::Scalar;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Column name -> values, all columns the same length. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularResult {
    columns: Vec<Column>,
    len: usize,
}

impl TabularResult {
    /// Build a result, rejecting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self, ShapeError> {
        let len = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|prev| prev.name == col.name) {
                return Err(ShapeError::DuplicateColumn(col.name.clone()));
            }
            if col.values.len() != len {
                return Err(ShapeError::Ragged {
                    column: col.name.clone(),
                    expected: len,
                    got: col.values.len(),
                });
            }
        }
        Ok(Self { columns, len })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[Scalar]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Column values, or an empty slice if the column is absent.
    pub fn column_or_empty(&self, name: &str) -> &[Scalar] {
        self.column(name).unwrap_or(&[])
    }
}

impl Serialize for TabularResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for col in &self.columns {
            map.serialize_entry(&col.name, &col.values)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_ragged_columns() {
        let err = TabularResult::new(vec![
            Column::new("a", vec![Scalar::Number(1.0), Scalar::Number(2.0)]),
            Column::new("b", vec![Scalar::Number(1.0)]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::Ragged {
                column: "b".to_string(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = TabularResult::new(vec![
            Column::new("a", vec![]),
            Column::new("a", vec![]),
        ])
        .unwrap_err();
        assert_eq!(err, ShapeError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let t = TabularResult::new(vec![
            Column::new("TYPE", vec![Scalar::text("Figure")]),
            Column::new("totalQuantity", vec![Scalar::Number(4.0)]),
        ])
        .unwrap();
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"{"TYPE":["Figure"],"totalQuantity":[4.0]}"#
        );
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["TYPE", "totalQuantity"]);
        assert_eq!(t.column_or_empty("missing"), &[] as &[Scalar]);
    }
}
