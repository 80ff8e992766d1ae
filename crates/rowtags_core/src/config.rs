//! Engine configuration and validation.
//!
//! # Responsibility
//! - Hold the palette size, persisted attribute keys and marker names.
//! - Reject configurations that would break dual-write or color hashing.
//!
//! # Invariants
//! - `palette_size` is at least 1.
//! - Every key and marker name is non-blank and unique.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default number of color slots.
pub const DEFAULT_PALETTE_SIZE: u32 = 8;
/// Current attribute key holding the JSON tag set.
pub const TAGS_ATTRIBUTE: &str = "tags";
/// Legacy-prefixed tag-set key, dual-written for older consumers.
pub const LEGACY_TAGS_ATTRIBUTE: &str = "data-tags";
/// Current attribute key marking rows selected by a tag filter.
pub const FILTER_ATTRIBUTE: &str = "tag-filter";
/// Legacy-prefixed filter key.
pub const LEGACY_FILTER_ATTRIBUTE: &str = "data-tag-filter";
/// Value written to filter attributes on matching rows.
pub const FILTER_MARK_VALUE: &str = "1";
/// Marker name for the tag chip range.
pub const TAG_MARKER: &str = "tag";
/// Marker name for the chip color slot.
pub const COLOR_MARKER: &str = "tag-color";

/// Runtime configuration for the tag engine.
///
/// Deserializes from partial JSON; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of color slots chips are hashed into.
    pub palette_size: u32,
    pub tags_attribute: String,
    pub legacy_tags_attribute: String,
    pub filter_attribute: String,
    pub legacy_filter_attribute: String,
    pub tag_marker: String,
    pub color_marker: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            palette_size: DEFAULT_PALETTE_SIZE,
            tags_attribute: TAGS_ATTRIBUTE.to_string(),
            legacy_tags_attribute: LEGACY_TAGS_ATTRIBUTE.to_string(),
            filter_attribute: FILTER_ATTRIBUTE.to_string(),
            legacy_filter_attribute: LEGACY_FILTER_ATTRIBUTE.to_string(),
            tag_marker: TAG_MARKER.to_string(),
            color_marker: COLOR_MARKER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.palette_size == 0 {
            return Err(ConfigError::InvalidPaletteSize(self.palette_size));
        }

        let mut seen = BTreeSet::new();
        for (field, value) in self.named_keys() {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::BlankKey(field));
            }
            if !seen.insert(trimmed) {
                return Err(ConfigError::DuplicateKey(trimmed.to_string()));
            }
        }
        Ok(())
    }

    /// Tag-set keys in write order: current first, then legacy.
    pub fn tag_set_keys(&self) -> [&str; 2] {
        [
            self.tags_attribute.as_str(),
            self.legacy_tags_attribute.as_str(),
        ]
    }

    /// Filter keys in write order: current first, then legacy.
    pub fn filter_keys(&self) -> [&str; 2] {
        [
            self.filter_attribute.as_str(),
            self.legacy_filter_attribute.as_str(),
        ]
    }

    fn named_keys(&self) -> [(&'static str, &str); 6] {
        [
            ("tags_attribute", self.tags_attribute.as_str()),
            ("legacy_tags_attribute", self.legacy_tags_attribute.as_str()),
            ("filter_attribute", self.filter_attribute.as_str()),
            (
                "legacy_filter_attribute",
                self.legacy_filter_attribute.as_str(),
            ),
            ("tag_marker", self.tag_marker.as_str()),
            ("color_marker", self.color_marker.as_str()),
        ]
    }
}

/// Configuration parse/validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Palette must contain at least one slot.
    InvalidPaletteSize(u32),
    /// Named field is blank after trim.
    BlankKey(&'static str),
    /// Two fields resolve to the same key or marker name.
    DuplicateKey(String),
    /// JSON payload could not be decoded.
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPaletteSize(value) => {
                write!(f, "palette_size must be at least 1, got {value}")
            }
            Self::BlankKey(field) => write!(f, "`{field}` must not be blank"),
            Self::DuplicateKey(value) => write!(f, "key `{value}` is configured twice"),
            Self::Parse(message) => write!(f, "invalid engine config: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig, DEFAULT_PALETTE_SIZE};

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.palette_size, DEFAULT_PALETTE_SIZE);
        assert_eq!(config.tag_set_keys(), ["tags", "data-tags"]);
        assert_eq!(config.filter_keys(), ["tag-filter", "data-tag-filter"]);
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"palette_size": 12}"#).expect("valid config");
        assert_eq!(config.palette_size, 12);
        assert_eq!(config.tags_attribute, "tags");
    }

    #[test]
    fn rejects_zero_palette_and_colliding_keys() {
        let err = EngineConfig::from_json(r#"{"palette_size": 0}"#).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPaletteSize(0));

        let err =
            EngineConfig::from_json(r#"{"legacy_tags_attribute": "tags"}"#).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKey("tags".to_string()));

        let err = EngineConfig::from_json(r#"{"tag_marker": "  "}"#).unwrap_err();
        assert_eq!(err, ConfigError::BlankKey("tag_marker"));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json("{palette_size").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
