//! Observations: the producer-side [`Update`] and the six-field wire shape
//! [`IncomingUpdate`] accepted by the reconciliation engine.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityType, Target};
use crate::error::CoreError;
use crate::types::Timestamp;
use crate::validate::{
    validate_identifier, validate_label, validate_source, validate_value, Label, Source,
};

/// Number of fields an [`IncomingUpdate`] payload must carry.
pub const INCOMING_UPDATE_FIELDS: usize = 6;

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// One `(metric, value)` observation made by a producer, stamped at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    metric: Label,
    value: Label,
    timestamp: Timestamp,
}

impl Update {
    /// Build an update stamped with the current time.
    pub fn new(metric: &str, value: &str) -> Result<Self, CoreError> {
        Self::at(metric, value, Utc::now())
    }

    /// Build an update with an explicit timestamp.
    pub fn at(metric: &str, value: &str, timestamp: Timestamp) -> Result<Self, CoreError> {
        Ok(Self {
            metric: validate_label(metric)?,
            value: validate_value(value)?,
            timestamp,
        })
    }

    pub fn metric(&self) -> &str {
        self.metric.as_str()
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Render as the wire shape submitted to the ingestion endpoint.
    pub fn to_incoming(&self, target: &Target, source: &Source) -> IncomingUpdate {
        IncomingUpdate {
            entity: target.identifier.to_string(),
            entity_type: target.entity_type.as_str().to_string(),
            source: source.to_string(),
            metric: self.metric.to_string(),
            value: self.value.to_string(),
            timestamp: self.timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// IncomingUpdate
// ---------------------------------------------------------------------------

/// Raw observation as received over the wire. Nothing here is trusted until
/// [`IncomingUpdate::validate`] succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomingUpdate {
    pub entity: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub source: String,
    pub metric: String,
    pub value: String,
    pub timestamp: Timestamp,
}

impl IncomingUpdate {
    /// Decode a raw JSON body, rejecting anything that is not an object with
    /// exactly [`INCOMING_UPDATE_FIELDS`] distinct fields.
    ///
    /// The struct is decoded from the bytes themselves, not from an
    /// intermediate `serde_json::Value`, so a repeated key is an error rather
    /// than silently overwriting the earlier value.
    pub fn from_slice(body: &[u8]) -> Result<Self, CoreError> {
        let invalid = |e: serde_json::Error| CoreError::InvalidUpdate(e.to_string());

        let payload: serde_json::Value = serde_json::from_slice(body).map_err(invalid)?;
        let field_count = match &payload {
            serde_json::Value::Object(map) => map.len(),
            _ => {
                return Err(CoreError::InvalidUpdate(
                    "Update must be a JSON object".to_string(),
                ))
            }
        };

        if field_count != INCOMING_UPDATE_FIELDS {
            return Err(CoreError::InvalidUpdate(format!(
                "Update must have exactly {INCOMING_UPDATE_FIELDS} fields, got {field_count}"
            )));
        }

        serde_json::from_slice(body).map_err(invalid)
    }

    /// Run every field through the validator.
    ///
    /// Any failure is reported as [`CoreError::InvalidUpdate`] naming the
    /// offending field.
    pub fn validate(&self) -> Result<ValidatedUpdate, CoreError> {
        let field = |name: &str, err: CoreError| CoreError::InvalidUpdate(format!("{name}: {err}"));

        let identifier = validate_identifier(&self.entity).map_err(|e| field("entity", e))?;
        let entity_type = validate_label(&self.entity_type)
            .and_then(|t| EntityType::parse(t.as_str()))
            .map_err(|e| field("type", e))?;
        let source = validate_source(&self.source).map_err(|e| field("source", e))?;
        let metric = validate_label(&self.metric).map_err(|e| field("metric", e))?;
        let value = validate_value(&self.value).map_err(|e| field("value", e))?;

        Ok(ValidatedUpdate {
            target: Target {
                identifier,
                entity_type,
            },
            source,
            metric,
            value,
            timestamp: self.timestamp,
        })
    }
}

/// An [`IncomingUpdate`] whose fields have all passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpdate {
    pub target: Target,
    pub source: Source,
    pub metric: Label,
    pub value: Label,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn decode(body: &serde_json::Value) -> Result<IncomingUpdate, CoreError> {
        IncomingUpdate::from_slice(&serde_json::to_vec(body).unwrap())
    }

    fn payload() -> serde_json::Value {
        json!({
            "entity": " 10.0.0.1 ",
            "type": "Host",
            "source": "Scanner",
            "metric": "Open Ports",
            "value": "22,80",
            "timestamp": "2026-01-01T00:00:00Z",
        })
    }

    #[test]
    fn from_slice_accepts_six_fields() {
        let update = decode(&payload()).unwrap();
        assert_eq!(update.entity, " 10.0.0.1 ");
        assert_eq!(update.entity_type, "Host");
    }

    #[test]
    fn from_slice_rejects_extra_field() {
        let mut body = payload();
        body["extra"] = json!("nope");
        assert_matches!(
            decode(&body),
            Err(CoreError::InvalidUpdate(msg)) if msg.contains("exactly 6 fields, got 7")
        );
    }

    #[test]
    fn from_slice_rejects_missing_field() {
        let mut body = payload();
        body.as_object_mut().unwrap().remove("timestamp");
        assert_matches!(
            decode(&body),
            Err(CoreError::InvalidUpdate(_))
        );
    }

    #[test]
    fn from_slice_rejects_renamed_field_with_same_count() {
        let mut body = payload();
        let map = body.as_object_mut().unwrap();
        let value = map.remove("metric").unwrap();
        map.insert("metrics".to_string(), value);
        assert_matches!(
            decode(&body),
            Err(CoreError::InvalidUpdate(_))
        );
    }

    #[test]
    fn from_slice_rejects_non_object() {
        assert_matches!(
            decode(&json!(["a", "b"])),
            Err(CoreError::InvalidUpdate(_))
        );
    }

    #[test]
    fn from_slice_rejects_duplicated_key() {
        // Seven keys on the wire, six once the repeated `metric` collapses.
        let body = br#"{
            "entity": "10.0.0.1",
            "type": "host",
            "source": "Scanner",
            "metric": "A1",
            "metric": "Open Ports",
            "value": "22,80",
            "timestamp": "2026-01-01T00:00:00Z"
        }"#;
        assert_matches!(
            IncomingUpdate::from_slice(body),
            Err(CoreError::InvalidUpdate(msg)) if msg.contains("duplicate field `metric`")
        );
    }

    #[test]
    fn from_slice_rejects_non_json() {
        assert_matches!(
            IncomingUpdate::from_slice(b"entity=10.0.0.1"),
            Err(CoreError::InvalidUpdate(_))
        );
    }

    #[test]
    fn validate_normalizes_fields() {
        let validated = decode(&payload())
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(validated.target.identifier.as_str(), "10.0.0.1");
        assert_eq!(validated.target.entity_type, EntityType::Host);
        assert_eq!(validated.source.as_str(), "Scanner");
        assert_eq!(validated.metric.as_str(), "Open Ports");
        assert_eq!(validated.value.as_str(), "22,80");
    }

    #[test]
    fn validate_names_the_failing_field() {
        let mut update = decode(&payload()).unwrap();
        update.source = "abc".to_string();
        assert_matches!(
            update.validate(),
            Err(CoreError::InvalidUpdate(msg)) if msg.starts_with("source:")
        );

        let mut update = decode(&payload()).unwrap();
        update.entity_type = "router".to_string();
        assert_matches!(
            update.validate(),
            Err(CoreError::InvalidUpdate(msg)) if msg.starts_with("type:")
        );
    }

    #[test]
    fn update_renders_wire_shape() {
        let target = Target::new("10.0.0.1", "host").unwrap();
        let source = validate_source("Scanner").unwrap();
        let update = Update::new("Open Port Count", "2").unwrap();

        let incoming = update.to_incoming(&target, &source);
        assert_eq!(incoming.entity, "10.0.0.1");
        assert_eq!(incoming.entity_type, "host");
        assert_eq!(incoming.source, "Scanner");
        assert_eq!(incoming.metric, "Open Port Count");
        assert_eq!(incoming.value, "2");
        assert_eq!(incoming.timestamp, update.timestamp());

        let json = serde_json::to_value(&incoming).unwrap();
        assert_eq!(json.as_object().unwrap().len(), INCOMING_UPDATE_FIELDS);
        assert_eq!(json["type"], "host");
    }

    #[test]
    fn update_rejects_invalid_metric_name() {
        assert_matches!(Update::new("x", "value"), Err(CoreError::InvalidInput(_)));
    }
}
