/*!
 * Loading and validation of the conversion rules file.
 *
 * The file is a JSON object with exactly two keys:
 *
 * ```json
 * {
 *   "offset": 1500,
 *   "conversions": [
 *     { "key": "colour", "replacement": "color" },
 *     { "key": "Hello", "replacement": "Welcome!", "directConversion": true },
 *     { "key": "it", "replacement": "the cat", "previous": "cat" }
 *   ]
 * }
 * ```
 *
 * The top-level shape is checked strictly; individual rule records are
 * read permissively and incomplete ones are dropped later at compile time.
 */

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CaptionError;
use crate::file_utils::FileManager;

const OFFSET_KEY: &str = "offset";
const CONVERSIONS_KEY: &str = "conversions";

/// One rule record as written in the rules file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub replacement: Option<String>,

    #[serde(default)]
    pub case_sensitive: Option<bool>,

    #[serde(default)]
    pub direct_conversion: Option<bool>,

    #[serde(default)]
    pub previous: Option<String>,
}

impl RawRule {
    /// Complete simple rule, mostly for tests and programmatic use
    pub fn simple(key: &str, replacement: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            replacement: Some(replacement.to_string()),
            ..Self::default()
        }
    }

    pub fn direct(key: &str, replacement: &str) -> Self {
        Self { direct_conversion: Some(true), ..Self::simple(key, replacement) }
    }

    pub fn contextual(key: &str, replacement: &str, previous: &str) -> Self {
        Self { previous: Some(previous.to_string()), ..Self::simple(key, replacement) }
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = Some(true);
        self
    }
}

/// Validated contents of a rules file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSetConfig {
    /// Timing offset in milliseconds
    pub offset: i64,

    /// Rule records in file order
    pub conversions: Vec<RawRule>,
}

impl RuleSetConfig {
    /// Load and validate a rules file; the path must exist and end in `.json`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CaptionError> {
        let path = path.as_ref();
        if !Self::is_rule_source(path) {
            return Err(CaptionError::RuleSourceNotFound);
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        debug!(
            "Loaded {} conversion record(s) with offset {} ms from {:?}",
            config.conversions.len(),
            config.offset,
            path
        );
        Ok(config)
    }

    /// Whether `path` is an existing `.json` file
    pub fn is_rule_source(path: &Path) -> bool {
        FileManager::file_exists(path)
            && path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
    }

    /// Parse and validate rules from JSON text
    pub fn from_json_str(content: &str) -> Result<Self, CaptionError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, CaptionError> {
        let Value::Object(object) = value else {
            return Err(CaptionError::InvalidRuleSchema);
        };
        Self::check_schema(&object)?;

        let offset_value = object.get(OFFSET_KEY);
        let offset = match offset_value.and_then(Value::as_i64) {
            Some(offset) => offset,
            // Integers above i64::MAX are still integers
            None if offset_value.is_some_and(Value::is_u64) => return Err(CaptionError::OffsetOutOfRange),
            None => return Err(CaptionError::InvalidOffsetType),
        };

        let records = match object.get(CONVERSIONS_KEY) {
            Some(Value::Array(records)) => records,
            _ => return Err(CaptionError::InvalidConversionsType),
        };

        let conversions = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match RawRule::deserialize(record) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!("Skipping malformed conversion record {}: {}", index, e);
                    None
                }
            })
            .collect();

        Ok(Self { offset, conversions })
    }

    fn check_schema(object: &Map<String, Value>) -> Result<(), CaptionError> {
        let has_exact_keys = object.len() == 2
            && object.contains_key(OFFSET_KEY)
            && object.contains_key(CONVERSIONS_KEY);

        if has_exact_keys {
            Ok(())
        } else {
            Err(CaptionError::InvalidRuleSchema)
        }
    }
}
