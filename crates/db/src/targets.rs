//! Existence checks for lockable records living in ordinary tables.
//!
//! Entity type tags are mapped to table names by configuration, e.g.
//! `LOCKABLE_ENTITIES=article:articles,page:cms.pages`. Every mapped table
//! must have a `BIGINT` primary key column named `id`.

use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use editlock_core::error::{CoreError, StoreError};
use editlock_core::store::TargetResolver;
use editlock_core::target::{validate_entity_ref, LockTarget};
use regex::Regex;

use crate::DbPool;

fn table_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)?$").expect("static regex is valid")
    })
}

/// Parse `type:table` pairs separated by commas.
///
/// Table names are interpolated into SQL, so only plain (optionally
/// schema-qualified) lowercase identifiers are accepted.
pub fn parse_lockable_entities(raw: &str) -> Result<HashMap<String, String>, CoreError> {
    let mut tables = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (entity_type, table) = pair.split_once(':').ok_or_else(|| {
            CoreError::InvalidConfiguration(format!(
                "LOCKABLE_ENTITIES entry '{pair}' must look like type:table"
            ))
        })?;
        let (entity_type, table) = (entity_type.trim(), table.trim());

        validate_entity_ref(entity_type, 1).map_err(CoreError::InvalidConfiguration)?;
        if !table_name_pattern().is_match(table) {
            return Err(CoreError::InvalidConfiguration(format!(
                "LOCKABLE_ENTITIES table '{table}' is not a valid identifier"
            )));
        }
        if tables
            .insert(entity_type.to_string(), table.to_string())
            .is_some()
        {
            return Err(CoreError::InvalidConfiguration(format!(
                "LOCKABLE_ENTITIES lists '{entity_type}' more than once"
            )));
        }
    }
    Ok(tables)
}

/// Resolves targets against the configured tables. Unmapped types never exist.
#[derive(Debug, Clone)]
pub struct PgTargetResolver {
    pool: DbPool,
    tables: HashMap<String, String>,
}

impl PgTargetResolver {
    pub fn new(pool: DbPool, tables: HashMap<String, String>) -> Self {
        Self { pool, tables }
    }

    /// Lockable entity types, sorted.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

#[async_trait]
impl TargetResolver for PgTargetResolver {
    async fn exists(&self, target: &LockTarget) -> Result<bool, StoreError> {
        let Some(table) = self.tables.get(&target.entity_type) else {
            tracing::debug!(entity_type = %target.entity_type, "Entity type is not lockable");
            return Ok(false);
        };
        let query = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)");
        sqlx::query_scalar::<_, bool>(&query)
            .bind(target.entity_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| StoreError::backend(format!("existence check on {table}"), err))
    }
}
