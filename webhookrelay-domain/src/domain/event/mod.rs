use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::{
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

/// A lifecycle event emitted by the host application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "type")]
    pub event_type: String,
    #[serde(alias = "data", default)]
    pub event_data: EventData,
}

impl Event {
    pub fn new(event_type: impl Into<String>, event_data: impl Into<EventData>) -> Self {
        Self {
            event_type: event_type.into(),
            event_data: event_data.into(),
        }
    }
}

/// Adapter implemented by host record types that travel inside event data.
///
/// A record may describe itself as a mapping (`to_dict`), enumerate its
/// fields, or neither, in which case only its string representation is used.
/// `to_dict` takes precedence over `fields`.
pub trait EventRecord: Debug + Send + Sync {
    fn to_dict(&self) -> Option<EventData> {
        None
    }

    fn fields(&self) -> Option<Vec<(String, EventData)>> {
        None
    }

    fn describe(&self) -> String;
}

/// The object graph carried by an [`Event`].
///
/// Owned variants form a tree; the only way to share (or loop back to) a node
/// is through a [`EventData::Record`], whose identity is the `Arc` allocation.
#[derive(Debug, Clone, Default)]
pub enum EventData {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<EventData>),
    Tuple(Vec<EventData>),
    Set(Vec<EventData>),
    Mapping(IndexMap<String, EventData>),
    Record(Arc<dyn EventRecord>),
}

impl EventData {
    pub fn record<R: EventRecord + 'static>(record: R) -> Self {
        EventData::Record(Arc::new(record))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EventData::Null)
    }

    fn write_nested(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EventData::Null => f.write_str("null"),
            EventData::Bool(b) => write!(f, "{b}"),
            EventData::Number(n) => write!(f, "{n}"),
            EventData::String(s) => write_quoted(f, s),
            EventData::Sequence(items) | EventData::Tuple(items) | EventData::Set(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    item.write_nested(f)?;
                }
                f.write_str("]")
            }
            EventData::Mapping(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_quoted(f, key)?;
                    f.write_str(":")?;
                    value.write_nested(f)?;
                }
                f.write_str("}")
            }
            EventData::Record(record) => write_quoted(f, &record.describe()),
        }
    }
}

fn write_quoted(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

/// Textual rendering used when event data is spliced into a body template.
///
/// A top-level string is written verbatim; anything else is written as compact
/// JSON text. Records are written as the quoted string of `describe()` and are
/// never expanded, so rendering terminates on any graph.
impl Display for EventData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EventData::String(s) => f.write_str(s),
            other => other.write_nested(f),
        }
    }
}

impl PartialEq for EventData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EventData::Null, EventData::Null) => true,
            (EventData::Bool(a), EventData::Bool(b)) => a == b,
            (EventData::Number(a), EventData::Number(b)) => a == b,
            (EventData::String(a), EventData::String(b)) => a == b,
            (EventData::Sequence(a), EventData::Sequence(b))
            | (EventData::Tuple(a), EventData::Tuple(b))
            | (EventData::Set(a), EventData::Set(b)) => a == b,
            (EventData::Mapping(a), EventData::Mapping(b)) => a == b,
            (EventData::Record(a), EventData::Record(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for EventData {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => EventData::Null,
            Value::Bool(b) => EventData::Bool(b),
            Value::Number(n) => EventData::Number(n),
            Value::String(s) => EventData::String(s),
            Value::Array(items) => {
                EventData::Sequence(items.into_iter().map(EventData::from).collect())
            }
            Value::Object(map) => EventData::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, EventData::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for EventData {
    fn from(value: &str) -> Self {
        EventData::String(value.to_owned())
    }
}

impl From<String> for EventData {
    fn from(value: String) -> Self {
        EventData::String(value)
    }
}

impl From<bool> for EventData {
    fn from(value: bool) -> Self {
        EventData::Bool(value)
    }
}

impl From<i64> for EventData {
    fn from(value: i64) -> Self {
        EventData::Number(value.into())
    }
}

impl From<u64> for EventData {
    fn from(value: u64) -> Self {
        EventData::Number(value.into())
    }
}

impl From<f64> for EventData {
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => EventData::Number(n),
            None => EventData::String(value.to_string()),
        }
    }
}

impl<T: Into<EventData>> From<Option<T>> for EventData {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<Vec<EventData>> for EventData {
    fn from(value: Vec<EventData>) -> Self {
        EventData::Sequence(value)
    }
}

impl From<IndexMap<String, EventData>> for EventData {
    fn from(value: IndexMap<String, EventData>) -> Self {
        EventData::Mapping(value)
    }
}

impl FromIterator<(String, EventData)> for EventData {
    fn from_iter<I: IntoIterator<Item = (String, EventData)>>(iter: I) -> Self {
        EventData::Mapping(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for EventData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(EventData::from)
    }
}
