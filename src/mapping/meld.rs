//! Meld filter expressions
//!
//! Funnel describes export filters as nested boolean expressions where every
//! key starts with `=`:
//!
//! ```text
//! {"=and": [
//!     {"brand": {"=or": [{"=contains": "burger king"}, {"=notcontains": "wendys"}]}},
//!     {"date": {"=after": "2025"}}
//! ]}
//! ```
//!
//! The declarative side keeps a flat list of [`ExportFilter`]s instead. [`encode`]
//! and [`decode`] convert between the two; [`FilterExpr`] is the typed form of
//! the tree and owns the JSON parsing.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::wire::{ExportFilter, ExportFilterOr};
use super::ConversionError;

const AND_KEY: &str = "=and";
const OR_KEY: &str = "=or";
const OPERATOR_PREFIX: char = '=';

/// Top level of a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    And(Vec<FieldExpr>),
    /// A single condition sent without the `=and` wrapper
    Field(FieldExpr),
}

/// Condition on one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpr {
    pub field_id: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Or(Vec<LeafOp>),
    Leaf(LeafOp),
}

/// `{"=<operator>": value}`
#[derive(Debug, Clone, PartialEq)]
pub struct LeafOp {
    pub operator: String,
    pub value: String,
}

impl LeafOp {
    pub fn new(operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            value: value.into(),
        }
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            format!("{}{}", OPERATOR_PREFIX, self.operator),
            Value::String(self.value.clone()),
        );
        Value::Object(map)
    }
}

/// Convert a flat filter list into a Meld expression.
///
/// An empty list means "no filter" and yields `None`, never an empty `=and`.
pub fn encode(filters: &[ExportFilter]) -> Option<FilterExpr> {
    if filters.is_empty() {
        return None;
    }

    let fields = filters
        .iter()
        .map(|filter| FieldExpr {
            field_id: filter.field_id.clone(),
            condition: encode_condition(filter),
        })
        .collect();

    Some(FilterExpr::And(fields))
}

// A non-empty OR group wins over operation/value
fn encode_condition(filter: &ExportFilter) -> Condition {
    if !filter.or.is_empty() {
        return Condition::Or(
            filter
                .or
                .iter()
                .map(|branch| LeafOp::new(&branch.operation, &branch.value))
                .collect(),
        );
    }

    Condition::Leaf(LeafOp::new(&filter.operation, &filter.value))
}

/// Convert a Meld expression back into the flat filter list.
pub fn decode(expr: &FilterExpr) -> Vec<ExportFilter> {
    let fields = match expr {
        FilterExpr::And(fields) => fields.as_slice(),
        FilterExpr::Field(field) => std::slice::from_ref(field),
    };

    fields.iter().map(decode_field).collect()
}

fn decode_field(field: &FieldExpr) -> ExportFilter {
    let mut filter = ExportFilter {
        field_id: field.field_id.clone(),
        ..Default::default()
    };

    match &field.condition {
        Condition::Or(branches) => {
            filter.or = branches
                .iter()
                .map(|leaf| ExportFilterOr {
                    operation: leaf.operator.clone(),
                    value: leaf.value.clone(),
                })
                .collect();
        }
        Condition::Leaf(leaf) => {
            filter.operation = leaf.operator.clone();
            filter.value = leaf.value.clone();
        }
    }

    filter
}

impl FilterExpr {
    /// Render the expression in the JSON shape the API expects
    pub fn to_json(&self) -> Value {
        match self {
            FilterExpr::And(fields) => {
                let entries = fields.iter().map(FieldExpr::to_json).collect();
                let mut map = Map::new();
                map.insert(AND_KEY.to_string(), Value::Array(entries));
                Value::Object(map)
            }
            FilterExpr::Field(field) => field.to_json(),
        }
    }

    /// Parse the JSON shape returned by the API.
    ///
    /// Without an `=and` key the whole object is read as field conditions. When
    /// a leaf carries several operator keys the first one in document order wins.
    ///
    /// Entries that are not objects are skipped, and a leaf with no operator key
    /// reads as an empty condition. Only a non-object expression, a non-list
    /// `=and`/`=or` or a non-string value is an error.
    pub fn from_json(value: &Value) -> Result<Self, ConversionError> {
        let map = value
            .as_object()
            .ok_or_else(|| ConversionError::new("filter expression must be an object"))?;

        if let Some(and) = map.get(AND_KEY) {
            let entries = and
                .as_array()
                .ok_or_else(|| ConversionError::new("'=and' must hold a list"))?;

            let mut fields = Vec::with_capacity(entries.len());
            for entry in entries.iter().filter_map(Value::as_object) {
                fields.extend(parse_fields(entry)?);
            }
            return Ok(FilterExpr::And(fields));
        }

        let mut fields = parse_fields(map)?;
        if fields.len() == 1 {
            return Ok(FilterExpr::Field(fields.remove(0)));
        }
        Ok(FilterExpr::And(fields))
    }
}

impl FieldExpr {
    fn to_json(&self) -> Value {
        let condition = match &self.condition {
            Condition::Or(branches) => {
                let mut map = Map::new();
                map.insert(
                    OR_KEY.to_string(),
                    Value::Array(branches.iter().map(LeafOp::to_json).collect()),
                );
                Value::Object(map)
            }
            Condition::Leaf(leaf) => leaf.to_json(),
        };

        let mut map = Map::new();
        map.insert(self.field_id.clone(), condition);
        Value::Object(map)
    }
}

// Fields whose condition is not an object are skipped, so a stray top-level
// `=or` list yields nothing
fn parse_fields(map: &Map<String, Value>) -> Result<Vec<FieldExpr>, ConversionError> {
    map.iter()
        .filter_map(|(field_id, condition)| {
            condition.as_object().map(|condition| (field_id, condition))
        })
        .map(|(field_id, condition)| {
            Ok(FieldExpr {
                field_id: field_id.clone(),
                condition: parse_condition(field_id, condition)?,
            })
        })
        .collect()
}

fn parse_condition(
    field_id: &str,
    map: &Map<String, Value>,
) -> Result<Condition, ConversionError> {
    if let Some(or) = map.get(OR_KEY) {
        let items = or.as_array().ok_or_else(|| {
            ConversionError::new(format!("'=or' for field '{}' must hold a list", field_id))
        })?;

        let mut branches = Vec::with_capacity(items.len());
        for item in items.iter().filter_map(Value::as_object) {
            for (key, value) in item {
                let operator = key.strip_prefix(OPERATOR_PREFIX).unwrap_or(key);
                branches.push(LeafOp::new(operator, leaf_value(field_id, value)?));
            }
        }
        return Ok(Condition::Or(branches));
    }

    for (key, value) in map {
        if let Some(operator) = key.strip_prefix(OPERATOR_PREFIX) {
            return Ok(Condition::Leaf(LeafOp::new(
                operator,
                leaf_value(field_id, value)?,
            )));
        }
    }

    Ok(Condition::Leaf(LeafOp::new("", "")))
}

fn leaf_value(field_id: &str, value: &Value) -> Result<String, ConversionError> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        ConversionError::new(format!(
            "filter value for field '{}' must be a string, got {}",
            field_id, value
        ))
    })
}

impl Serialize for FilterExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FilterExpr::from_json(&value).map_err(D::Error::custom)
    }
}
