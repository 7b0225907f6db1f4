//! Input normalization and bounds checking.
//!
//! Every raw string that enters the system (entity identifiers, metric
//! names and values, producer source names) passes through one of these
//! functions. They are pure: no I/O, no logging. Each returns a newtype that
//! can only be built by validation, so downstream code never re-checks.

use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use unicode_general_category::{get_general_category, GeneralCategory};
use validator::{ValidateIp, ValidateUrl};

use crate::error::CoreError;

/// Minimum length of a label, in characters.
pub const MIN_LABEL_LEN: usize = 2;

/// Maximum length of a label or value, in characters.
pub const MAX_LABEL_LEN: usize = 1000;

/// Minimum length of a metric value, in characters.
pub const MIN_VALUE_LEN: usize = 1;

/// A source name must be strictly longer than this many characters.
pub const MIN_SOURCE_EXCLUSIVE_LEN: usize = 4;

/// DNS hostname: dot-separated labels ending in an alphabetic TLD.
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}\.?$")
        .expect("hostname regex is valid")
});

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Canonical (trimmed, lowercase) entity address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

/// Shape of an [`Identifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Ipv4,
    Ipv6,
    /// A DNS hostname or URL.
    Hostname,
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> IdentifierKind {
        match self.0.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => IdentifierKind::Ipv4,
            Ok(IpAddr::V6(_)) => IdentifierKind::Ipv6,
            Err(_) => IdentifierKind::Hostname,
        }
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trimmed, printable, length-bounded text (metric names and values).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Name of the producer that originated an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    )*};
}

impl_display!(Identifier, Label, Source);

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Validate and canonicalize an entity identifier.
///
/// Accepts IPv4, IPv6, a syntactically valid URL, or a DNS hostname after
/// trimming and lowercasing.
pub fn validate_identifier(raw: &str) -> Result<Identifier, CoreError> {
    let candidate = raw.trim().to_lowercase();

    if candidate.is_empty() {
        return Err(CoreError::InvalidEntity(
            "Entity identifier must not be empty".to_string(),
        ));
    }

    let valid = candidate.validate_ipv4()
        || candidate.validate_ipv6()
        || candidate.validate_url()
        || HOSTNAME_RE.is_match(&candidate);

    if !valid {
        return Err(CoreError::InvalidEntity(format!(
            "'{candidate}' is not an IPv4 address, IPv6 address, URL, or hostname"
        )));
    }

    Ok(Identifier(candidate))
}

/// Validate a free-text label (metric name, entity type).
///
/// Rules:
/// - Surrounding whitespace is trimmed.
/// - Length must be within `MIN_LABEL_LEN..=MAX_LABEL_LEN` characters.
/// - Every character must be printable.
pub fn validate_label(raw: &str) -> Result<Label, CoreError> {
    bounded_text(raw, MIN_LABEL_LEN).map(Label)
}

/// Validate a metric value.
///
/// Same rules as [`validate_label`] except a single character is allowed,
/// so counts such as `"3"` survive.
pub fn validate_value(raw: &str) -> Result<Label, CoreError> {
    bounded_text(raw, MIN_VALUE_LEN).map(Label)
}

/// Validate a producer source name. Must be longer than four characters.
pub fn validate_source(raw: &str) -> Result<Source, CoreError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MIN_SOURCE_EXCLUSIVE_LEN {
        return Err(CoreError::InvalidSource(format!(
            "Source '{trimmed}' must be longer than {MIN_SOURCE_EXCLUSIVE_LEN} characters"
        )));
    }
    Ok(Source(trimmed.to_string()))
}

fn bounded_text(raw: &str, min_len: usize) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();

    if len < min_len {
        return Err(CoreError::InvalidInput(format!(
            "Input must be at least {min_len} characters"
        )));
    }
    if len > MAX_LABEL_LEN {
        return Err(CoreError::InvalidInput(format!(
            "Input must not exceed {MAX_LABEL_LEN} characters"
        )));
    }
    if !trimmed.chars().all(is_printable) {
        return Err(CoreError::InvalidInput(
            "Input contains non-printable characters".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Printable means not in an "Other" or "Separator" general category, with
/// plain ASCII space the one exception. Zero-width and other format
/// characters are therefore rejected, so two names that render the same
/// cannot name different metrics.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
