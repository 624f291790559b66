use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::FrameError;

// ---------------------------------------------------------------------------
// Value – a single cell in an attribute column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Categorical counting keys on `Value`, so it must be `Eq + Hash` as well as `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Epoch milliseconds together with the rendered calendar date.
    Date { millis: i64, text: String },
    Null,
}

// -- Manual Eq/Ord so Value can key BTreeMap / HashMap --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date { .. } => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date { millis: ma, text: ta }, Date { millis: mb, text: tb }) => {
                ma.cmp(mb).then_with(|| ta.cmp(tb))
            }
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date { millis, text } => {
                millis.hash(state);
                text.hash(state);
            }
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date { text, .. } => write!(f, "{text}"),
            Value::Null => write!(f, "null"),
        }
    }
}

/// Rows are emitted as plain JSON scalars; dates serialize as their rendered text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Date { text, .. } => serializer.serialize_str(text),
            Value::Null => serializer.serialize_unit(),
        }
    }
}

impl Value {
    /// Numeric reading used by the histogram path. Dates bin on their timestamp.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Date { millis, .. } => Some(*millis as f64),
            Value::String(_) | Value::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Bucket label in categorical summaries.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// DataType / EntityKind
// ---------------------------------------------------------------------------

/// Declared column type, supplied with each loaded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Number,
    String,
    Date,
    Boolean,
}

impl FromStr for DataType {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "number" | "integer" | "float" | "double" => Ok(DataType::Number),
            "string" | "text" => Ok(DataType::String),
            "date" | "datetime" => Ok(DataType::Date),
            "boolean" | "bool" => Ok(DataType::Boolean),
            _ => Err(FrameError::UnknownDataType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Point,
    Edge,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Point, EntityKind::Edge];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Point => "point",
            EntityKind::Edge => "edge",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(EntityKind::Point),
            "edge" => Ok(EntityKind::Edge),
            other => Err(FrameError::UnknownEntityKind(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Attribute – one typed column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub values: Vec<Value>,
}

impl Attribute {
    pub fn new(data_type: DataType, values: Vec<Value>) -> Self {
        Self { data_type, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A batch of columns handed to `load`, keyed by attribute name.
pub type ColumnBatch = BTreeMap<String, Attribute>;

// ---------------------------------------------------------------------------
// AttributeSet – all columns of one entity kind
// ---------------------------------------------------------------------------

/// Columnar storage for one entity kind. Every column holds `num_elements` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    pub(crate) attributes: BTreeMap<String, Attribute>,
    pub(crate) num_elements: usize,
}

impl AttributeSet {
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    /// Attribute names in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Store – one AttributeSet per entity kind
// ---------------------------------------------------------------------------

/// Both attribute sets. Cloning is cheap: sets are shared until written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    point: Arc<AttributeSet>,
    edge: Arc<AttributeSet>,
}

impl Store {
    pub fn set(&self, kind: EntityKind) -> &AttributeSet {
        match kind {
            EntityKind::Point => &self.point,
            EntityKind::Edge => &self.edge,
        }
    }

    /// Mutable access; copies the set first if a snapshot still shares it.
    pub fn set_mut(&mut self, kind: EntityKind) -> &mut AttributeSet {
        match kind {
            EntityKind::Point => Arc::make_mut(&mut self.point),
            EntityKind::Edge => Arc::make_mut(&mut self.edge),
        }
    }

    pub fn replace_set(&mut self, kind: EntityKind, set: AttributeSet) {
        match kind {
            EntityKind::Point => self.point = Arc::new(set),
            EntityKind::Edge => self.edge = Arc::new(set),
        }
    }

    pub fn num_elements(&self, kind: EntityKind) -> usize {
        self.set(kind).num_elements
    }

    /// Whether both stores share the same set for `kind` without a copy.
    pub fn shares_set(&self, other: &Store, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Point => Arc::ptr_eq(&self.point, &other.point),
            EntityKind::Edge => Arc::ptr_eq(&self.edge, &other.edge),
        }
    }
}
