use std::collections::{HashMap, HashSet};
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CompareError, Result};

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A raw cell value as handed over by the extraction step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    /// Booleans, arrays and objects. Kept as JSON so a measure can be
    /// reported as not comparable instead of failing the load.
    Other(serde_json::Value),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A dimension value. Compared exactly, never with tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DimValue {
    Int(i64),
    Number(OrderedFloat<f64>),
    Text(String),
}

impl Serialize for DimValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DimValue::Int(v) => serializer.serialize_i64(*v),
            DimValue::Number(v) => crate::float::serialize(&v.0, serializer),
            DimValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Int(v) => write!(f, "{v}"),
            DimValue::Number(v) => write!(f, "{}", v.0),
            DimValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A measure cell. `Text` is kept so the differ can flag it as not comparable.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureValue {
    Null,
    Number(f64),
    Text(String),
}

impl Serialize for MeasureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MeasureValue::Null => serializer.serialize_none(),
            MeasureValue::Number(v) => crate::float::serialize(v, serializer),
            MeasureValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl MeasureValue {
    pub fn is_null(&self) -> bool {
        matches!(self, MeasureValue::Null)
    }
}

impl From<&Value> for MeasureValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => MeasureValue::Null,
            Value::Integer(i) => MeasureValue::Number(*i as f64),
            Value::Float(f) => MeasureValue::Number(*f),
            Value::Text(s) => MeasureValue::Text(s.clone()),
            Value::Other(v) => MeasureValue::Text(v.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Row key + rows
// ---------------------------------------------------------------------------

/// Tuple of dimension values under a table's declared dimension order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RowKey(pub Vec<DimValue>);

impl RowKey {
    /// Reorder this key: position `i` of the result is `self[perm[i]]`.
    pub fn permuted(&self, perm: &[usize]) -> RowKey {
        RowKey(perm.iter().map(|&i| self.0[i].clone()).collect())
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub key: RowKey,
    /// One entry per declared measure, in declaration order.
    pub measures: Vec<MeasureValue>,
}

/// Column name → raw value, as produced by extraction.
pub type Record = HashMap<String, Value>;

// ---------------------------------------------------------------------------
// Table model
// ---------------------------------------------------------------------------

/// One output table from one run. Read-only once built.
#[derive(Debug, Clone)]
pub struct TableModel {
    name: String,
    dimensions: Vec<String>,
    measures: Vec<String>,
    rows: Vec<Row>,
    index: HashMap<RowKey, usize>,
}

impl TableModel {
    /// Validate the declared schema against `records` and build the key index.
    ///
    /// Fails when a declared dimension is missing or null in a record, when two
    /// records share a row key, or when a column name is declared twice.
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<String>,
        measures: Vec<String>,
        records: Vec<Record>,
    ) -> Result<Self> {
        let name = name.into();

        let mut seen = HashSet::new();
        for col in dimensions.iter().chain(measures.iter()) {
            if !seen.insert(col.as_str()) {
                return Err(CompareError::malformed(
                    &name,
                    format!("column '{col}' declared more than once"),
                ));
            }
        }

        let mut rows = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for (i, record) in records.iter().enumerate() {
            let mut key = Vec::with_capacity(dimensions.len());
            for dim in &dimensions {
                let value = match record.get(dim) {
                    None => {
                        return Err(CompareError::malformed(
                            &name,
                            format!("row {i}: missing dimension '{dim}'"),
                        ))
                    }
                    Some(Value::Null) => {
                        return Err(CompareError::malformed(
                            &name,
                            format!("row {i}: null value for dimension '{dim}'"),
                        ))
                    }
                    Some(Value::Integer(v)) => DimValue::Int(*v),
                    Some(Value::Float(v)) => DimValue::Number(OrderedFloat(*v)),
                    Some(Value::Text(s)) => DimValue::Text(s.clone()),
                    Some(Value::Other(v)) => {
                        return Err(CompareError::malformed(
                            &name,
                            format!("row {i}: unsupported value {v} for dimension '{dim}'"),
                        ))
                    }
                };
                key.push(value);
            }
            let key = RowKey(key);

            let values = measures
                .iter()
                .map(|m| record.get(m).map(MeasureValue::from).unwrap_or(MeasureValue::Null))
                .collect();

            if let Some(prev) = index.insert(key.clone(), i) {
                return Err(CompareError::malformed(
                    &name,
                    format!("duplicate row key {key} (rows {prev} and {i})"),
                ));
            }
            rows.push(Row { key, measures: values });
        }

        Ok(Self {
            name,
            dimensions,
            measures,
            rows,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    /// Rows in extraction order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by its key in declared dimension order.
    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn dimension_position(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    pub fn measure_position(&self, name: &str) -> Option<usize> {
        self.measures.iter().position(|m| m == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn builds_index_and_keeps_order() {
        let table = TableModel::new(
            "T01",
            cols(&["age", "sex"]),
            cols(&["value"]),
            vec![
                record(&[("age", Value::Integer(30)), ("sex", "F".into()), ("value", Value::Float(1.5))]),
                record(&[("age", Value::Integer(10)), ("sex", "M".into()), ("value", Value::Integer(2))]),
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].key.0[0], DimValue::Int(30));
        let key = RowKey(vec![DimValue::Int(10), DimValue::Text("M".into())]);
        let row = table.get(&key).unwrap();
        assert_eq!(row.measures[0], MeasureValue::Number(2.0));
    }

    #[test]
    fn missing_measure_is_null() {
        let table = TableModel::new(
            "T01",
            cols(&["age"]),
            cols(&["value", "count"]),
            vec![record(&[("age", Value::Integer(1)), ("value", Value::Float(3.0))])],
        )
        .unwrap();
        assert!(table.rows()[0].measures[1].is_null());
    }

    #[test]
    fn missing_dimension_is_malformed() {
        let err = TableModel::new(
            "T01",
            cols(&["age", "sex"]),
            cols(&["value"]),
            vec![record(&[("age", Value::Integer(1)), ("value", Value::Float(3.0))])],
        )
        .unwrap_err();
        match err {
            CompareError::MalformedTable { table, reason } => {
                assert_eq!(table, "T01");
                assert!(reason.contains("missing dimension 'sex'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_dimension_is_malformed() {
        let err = TableModel::new(
            "T01",
            cols(&["age"]),
            cols(&["value"]),
            vec![record(&[("age", Value::Null), ("value", Value::Float(3.0))])],
        )
        .unwrap_err();
        assert!(matches!(err, CompareError::MalformedTable { .. }));
    }

    #[test]
    fn duplicate_key_is_malformed() {
        let err = TableModel::new(
            "T01",
            cols(&["age"]),
            cols(&["value"]),
            vec![
                record(&[("age", Value::Integer(1)), ("value", Value::Float(3.0))]),
                record(&[("age", Value::Integer(1)), ("value", Value::Float(4.0))]),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate row key (1)"));
    }

    #[test]
    fn repeated_column_is_malformed() {
        let err = TableModel::new("T01", cols(&["age"]), cols(&["age"]), vec![]).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn integer_and_float_dimensions_are_distinct() {
        let table = TableModel::new(
            "T01",
            cols(&["x"]),
            cols(&["v"]),
            vec![
                record(&[("x", Value::Integer(1)), ("v", Value::Float(1.0))]),
                record(&[("x", Value::Float(1.0)), ("v", Value::Float(2.0))]),
            ],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn row_key_serializes_as_array() {
        let key = RowKey(vec![DimValue::Int(3), DimValue::Text("F".into()), DimValue::Number(OrderedFloat(0.5))]);
        assert_eq!(serde_json::to_string(&key).unwrap(), r#"[3,"F",0.5]"#);
        assert_eq!(key.to_string(), "(3, F, 0.5)");
    }
}
