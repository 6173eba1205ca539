use std::sync::Arc;

use crate::value::Value;

/// One decoded row, with the column names of its result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// First column named `name`, compared case-insensitively.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let index = self
            .columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))?;
        self.values.get(index)
    }

    #[must_use]
    pub fn get_int(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Value::as_int)
    }

    #[must_use]
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(Value::as_float)
    }

    #[must_use]
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_text)
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new(
            vec!["id".to_owned(), "Name".to_owned(), "score".to_owned()].into(),
            vec![Value::Int(7), Value::from("ada"), Value::Float(9.5)],
        )
    }

    #[test]
    fn typed_accessors() {
        let row = sample();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get_int(0), Some(7));
        assert_eq!(row.get_string(1), Some("ada"));
        assert_eq!(row.get_float(2), Some(9.5));
        assert_eq!(row.get_int(1), None);
        assert_eq!(row.get(3), None);
        assert_eq!(row[0], Value::Int(7));
    }

    #[test]
    fn lookup_by_name_ignores_case() {
        let row = sample();
        assert_eq!(row.get_by_name("NAME"), Some(&Value::from("ada")));
        assert_eq!(row.get_by_name("missing"), None);
    }
}
