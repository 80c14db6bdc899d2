use crate::error::{ExamError, Result};
use crate::model::Partition;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Payload field names seen across partitions. Older envelopes are read
/// leniently: the partition's own field wins, the others are fallbacks.
const PAYLOAD_FIELDS: [&str; 3] = ["value", "data", "content"];

/// A typed record. The envelope field that carries `payload` on disk
/// (`value`, `data` or `content`) is decided by the partition, never by the
/// caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    pub id: String,
    pub payload: T,
}

impl<T> Record<T> {
    pub fn new(id: impl Into<String>, payload: T) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

impl<T: Serialize> Record<T> {
    pub fn to_envelope(&self, partition: Partition) -> Result<Value> {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert(
            partition.payload_field().to_string(),
            serde_json::to_value(&self.payload)?,
        );
        Ok(Value::Object(map))
    }
}

impl<T: DeserializeOwned> Record<T> {
    pub fn from_envelope(partition: Partition, envelope: Value) -> Result<Self> {
        let corrupt = |reason: String| ExamError::CorruptRecord { partition, reason };

        let Value::Object(mut map) = envelope else {
            return Err(corrupt("envelope is not an object".to_string()));
        };

        let id = match map.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(corrupt("envelope has no string id".to_string())),
        };

        let raw = map
            .remove(partition.payload_field())
            .or_else(|| PAYLOAD_FIELDS.iter().find_map(|f| map.remove(*f)))
            .unwrap_or(Value::Null);

        let payload = serde_json::from_value(raw)
            .map_err(|e| corrupt(format!("payload of '{}': {}", id, e)))?;

        Ok(Self { id, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_uses_partition_field() {
        let record = Record::new("darkMode", true);
        assert_eq!(
            record.to_envelope(Partition::UserSettings).unwrap(),
            json!({"id": "darkMode", "value": true})
        );
        assert_eq!(
            record.to_envelope(Partition::ExamData).unwrap(),
            json!({"id": "darkMode", "data": true})
        );
        assert_eq!(
            record.to_envelope(Partition::Images).unwrap(),
            json!({"id": "darkMode", "content": true})
        );
    }

    #[test]
    fn reads_legacy_field_names() {
        let record: Record<String> = Record::from_envelope(
            Partition::Images,
            json!({"id": "img1", "data": "data:image/png;base64,AAA"}),
        )
        .unwrap();
        assert_eq!(record.payload, "data:image/png;base64,AAA");
    }

    #[test]
    fn stored_null_is_kept_as_payload() {
        let record: Record<Value> =
            Record::from_envelope(Partition::ExamData, json!({"id": "x", "data": null})).unwrap();
        assert_eq!(record.payload, Value::Null);
    }

    #[test]
    fn rejects_envelope_without_id() {
        let err = Record::<Value>::from_envelope(Partition::ExamData, json!({"data": 1}))
            .unwrap_err();
        assert!(matches!(err, ExamError::CorruptRecord { .. }));
    }
}
