use crate::{EventData, EventRecord, InternalError, RelayError};
use serde_json::{Map, Value};
use std::{collections::HashSet, sync::Arc};

pub trait NormalizeExt {
    /// Converts the value into a structure any JSON encoder accepts.
    fn normalize(&self) -> Result<Value, RelayError>;
}

impl NormalizeExt for EventData {
    fn normalize(&self) -> Result<Value, RelayError> {
        Normalizer::default().visit(self)
    }
}

pub fn normalize(value: &EventData) -> Result<Value, RelayError> {
    value.normalize()
}

/// Single-use visitor over an event graph.
///
/// `path` holds the identities of the records between the root and the node
/// being visited. A record met again while it is still on the path is a cycle;
/// the same record reached through two sibling branches is not.
#[derive(Debug, Default)]
struct Normalizer {
    path: HashSet<usize>,
}

impl Normalizer {
    fn visit(&mut self, value: &EventData) -> Result<Value, RelayError> {
        match value {
            EventData::Null => Ok(Value::Null),
            EventData::Bool(b) => Ok(Value::Bool(*b)),
            EventData::Number(n) => Ok(Value::Number(n.clone())),
            EventData::String(s) => Ok(Value::String(s.clone())),
            EventData::Sequence(items) | EventData::Tuple(items) => items
                .iter()
                .map(|item| self.visit(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            EventData::Set(items) => {
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.visit(item)?;
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                Ok(Value::Array(unique))
            }
            EventData::Mapping(map) => map
                .iter()
                .map(|(key, value)| Ok((key.clone(), self.visit(value)?)))
                .collect::<Result<Map<String, Value>, RelayError>>()
                .map(Value::Object),
            EventData::Record(record) => self.visit_record(record),
        }
    }

    fn visit_record(&mut self, record: &Arc<dyn EventRecord>) -> Result<Value, RelayError> {
        let identity = Arc::as_ptr(record) as *const () as usize;
        if !self.path.insert(identity) {
            return Err(InternalError::cycle_detected(
                &format!("{} is reachable from itself", record.describe()),
                Some("normalize"),
            ));
        }

        let result = if let Some(dict) = record.to_dict() {
            self.visit(&dict)
        } else if let Some(fields) = record.fields() {
            let mapping: EventData = fields.into_iter().collect();
            self.visit(&mapping)
        } else {
            Ok(Value::String(record.describe()))
        };

        self.path.remove(&identity);
        result
    }
}
