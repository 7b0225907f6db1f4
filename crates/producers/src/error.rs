use paranoia_core::entity::EntityType;
use paranoia_core::error::CoreError;

/// Why a producer could not be built for a target.
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{producer} does not support {entity_type} '{identifier}': {reason}")]
    UnsupportedTarget {
        producer: &'static str,
        identifier: String,
        entity_type: EntityType,
        reason: &'static str,
    },

    #[error("{producer} is missing configuration: {setting}")]
    MissingConfiguration {
        producer: &'static str,
        setting: &'static str,
    },

    #[error("Unknown producer kind '{0}'")]
    UnknownKind(String),
}

/// A scan that produced no usable data.
///
/// Never crosses the crate boundary: [`crate::Producer::scan`] logs it and
/// returns an empty sequence.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    ExitStatus {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Malformed scan report: {0}")]
    Report(#[from] quick_xml::DeError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Reputation API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected reputation response: {0}")]
    Body(#[from] serde_json::Error),
}
