//! The canonical lock key: `(entity_type, entity_id)`.
//!
//! Every lockable record, whatever table or schema it lives in, is addressed
//! through a [`LockTarget`]. The engine never looks past this pair.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of an entity type tag.
pub const MAX_ENTITY_TYPE_LEN: usize = 64;

fn entity_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static regex is valid"))
}

/// Identifies the record being protected by a lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockTarget {
    pub entity_type: String,
    pub entity_id: DbId,
}

impl LockTarget {
    /// Build a target, validating both halves of the key.
    pub fn new(entity_type: impl Into<String>, entity_id: DbId) -> Result<Self, CoreError> {
        let entity_type = entity_type.into();
        validate_entity_ref(&entity_type, entity_id).map_err(CoreError::Validation)?;
        Ok(Self {
            entity_type,
            entity_id,
        })
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity_type, self.entity_id)
    }
}

/// Validate that both entity_type and entity_id are acceptable.
pub fn validate_entity_ref(entity_type: &str, entity_id: DbId) -> Result<(), String> {
    if entity_type.is_empty() || entity_type.len() > MAX_ENTITY_TYPE_LEN {
        return Err(format!(
            "entity_type must be 1-{MAX_ENTITY_TYPE_LEN} characters, got {}",
            entity_type.len()
        ));
    }
    if !entity_type_pattern().is_match(entity_type) {
        return Err(format!(
            "Invalid entity_type '{entity_type}'. Must be lowercase letters, digits and underscores"
        ));
    }
    if entity_id <= 0 {
        return Err(format!("entity_id must be positive, got {entity_id}"));
    }
    Ok(())
}
