//! Database schemas
//!
//! Built once from the `get_schema` reply when a connection comes up.
//! After that the only mutation is `populate_internally_generated_columns`.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{OvsdbSchemaError, Result};
use crate::table::TableSchema;
use crate::typed::TableFactoryRegistry;
use crate::version::Version;

/// An OVSDB database schema: a name, a version and a set of tables
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSchema {
    name: String,
    version: Version,
    tables: HashMap<String, Arc<TableSchema>>,
}

impl DatabaseSchema {
    pub fn new(name: impl Into<String>, version: Version, tables: Vec<TableSchema>) -> Self {
        Self {
            name: name.into(),
            version,
            tables: tables
                .into_iter()
                .map(|t| (t.name.clone(), Arc::new(t)))
                .collect(),
        }
    }

    /// Parse a schema document. `tables` and `version` are required; any
    /// error in any table fails the whole build.
    pub fn from_json(db_name: &str, json: &Value) -> Result<DatabaseSchema> {
        let tables_json = match json {
            Value::Object(obj) if obj.contains_key("tables") => &obj["tables"],
            _ => {
                return Err(OvsdbSchemaError::schema_parsing(
                    "bad DatabaseSchema root, expected \"tables\" as child but was not found",
                ))
            }
        };
        let version_json = json.get("version").ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(
                "bad DatabaseSchema root, expected \"version\" as child but was not found",
            )
        })?;

        let version: Version = version_json
            .as_str()
            .ok_or_else(|| {
                OvsdbSchemaError::schema_parsing(format!(
                    "bad DatabaseSchema version {}, expected a string",
                    version_json
                ))
            })?
            .parse()?;

        let tables_obj = tables_json.as_object().ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!(
                "bad DatabaseSchema tables, expected an object but got {}",
                tables_json
            ))
        })?;

        let mut tables = HashMap::with_capacity(tables_obj.len());
        for (table_name, table_json) in tables_obj {
            trace!("Read schema for table[{}]:{}", table_name, table_json);
            let table = TableSchema::from_json(table_name, table_json)?;
            tables.insert(table_name.clone(), Arc::new(table));
        }

        debug!(
            "Parsed schema {} version {} with {} tables",
            db_name,
            version,
            tables.len()
        );

        Ok(DatabaseSchema {
            name: db_name.to_string(),
            version,
            tables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Table names (unordered)
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_schema(&self, table: &str) -> Option<&Arc<TableSchema>> {
        self.tables.get(table)
    }

    /// Look up `table_name` and adapt it to `E`.
    ///
    /// `None` means the table does not exist in this schema, which is an
    /// expected outcome for a runtime-discovered schema. `Some(Err(_))` means
    /// the table exists but `E` could not be built from it.
    pub fn table<E: 'static>(
        &self,
        table_name: &str,
        registry: &TableFactoryRegistry,
    ) -> Option<Result<E>> {
        let table = self.tables.get(table_name)?;
        Some(registry.build::<E>(Arc::clone(table)))
    }

    /// Add the `_uuid` and `_version` columns to every table
    pub fn populate_internally_generated_columns(&mut self) {
        for table in self.tables.values_mut() {
            Arc::make_mut(table).populate_internally_generated_columns();
        }
    }

    /// Schema document form
    pub fn to_json(&self) -> Value {
        let mut tables = Map::new();
        for (name, table) in &self.tables {
            tables.insert(name.clone(), table.to_json());
        }
        json!({
            "name": self.name,
            "version": self.version.to_string(),
            "tables": tables,
        })
    }
}
