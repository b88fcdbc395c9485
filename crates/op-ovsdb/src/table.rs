//! Table schemas

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::base_type::{BaseType, UuidBaseType};
use crate::column::{ColumnSchema, ColumnType};
use crate::error::{OvsdbSchemaError, Result};
use crate::row::Row;

/// Row UUID column every OVSDB table carries
pub const UUID_COLUMN: &str = "_uuid";
/// Row version column every OVSDB table carries
pub const VERSION_COLUMN: &str = "_version";

/// One table of a database schema
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: HashMap<String, ColumnSchema>,
    pub indexes: Vec<Vec<String>>,
    pub max_rows: Option<u64>,
    pub is_root: bool,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: HashMap<String, ColumnSchema>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
            max_rows: None,
            is_root: false,
        }
    }

    /// Parse `{"columns": {...}, "indexes": [[...]], "maxRows": n, "isRoot": bool}`
    pub fn from_json(table_name: &str, json: &Value) -> Result<TableSchema> {
        let obj = json.as_object().ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!(
                "bad table schema root for '{}', expected an object",
                table_name
            ))
        })?;
        let columns_json = obj.get("columns").and_then(Value::as_object).ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!(
                "bad table schema root for '{}', expected \"columns\" as child but was not found",
                table_name
            ))
        })?;

        let mut columns = HashMap::with_capacity(columns_json.len());
        for (name, column_json) in columns_json {
            columns.insert(name.clone(), ColumnSchema::from_json(name, column_json)?);
        }

        let indexes = match obj.get("indexes") {
            None => Vec::new(),
            Some(v) => parse_indexes(table_name, v)?,
        };

        let max_rows = match obj.get("maxRows") {
            None => None,
            Some(v) => Some(v.as_u64().filter(|n| *n >= 1).ok_or_else(|| {
                OvsdbSchemaError::schema_parsing(format!(
                    "table '{}': maxRows must be a positive integer, got {}",
                    table_name, v
                ))
            })?),
        };

        let is_root = match obj.get("isRoot") {
            None => false,
            Some(v) => v.as_bool().ok_or_else(|| {
                OvsdbSchemaError::schema_parsing(format!(
                    "table '{}': isRoot must be a boolean, got {}",
                    table_name, v
                ))
            })?,
        };

        Ok(TableSchema {
            name: table_name.to_string(),
            columns,
            indexes,
            max_rows,
            is_root,
        })
    }

    /// Column names (unordered)
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.get(name)
    }

    /// Add `_uuid` and `_version` if they are not there yet
    pub fn populate_internally_generated_columns(&mut self) {
        for name in [UUID_COLUMN, VERSION_COLUMN] {
            if !self.columns.contains_key(name) {
                debug!("Adding internal column {} to table {}", name, self.name);
                let mut column = ColumnSchema::new(
                    name,
                    ColumnType::atomic(BaseType::Uuid(UuidBaseType::default())),
                );
                column.mutable = false;
                self.columns.insert(name.to_string(), column);
            }
        }
    }

    /// Build a row from a JSON row object (`{"<column>": <wire value>, ...}`).
    ///
    /// Columns unknown to this table are skipped.
    pub fn create_row(&self, json: &Value) -> Result<Row> {
        let obj = json.as_object().ok_or_else(|| {
            OvsdbSchemaError::value_parsing(format!(
                "row for table '{}' must be an object, got {}",
                self.name, json
            ))
        })?;

        let mut row = Row::new(self.name.clone());
        for (name, value) in obj {
            match self.columns.get(name) {
                Some(column) => {
                    let datum = column.value_from_json(value).map_err(|e| {
                        OvsdbSchemaError::value_parsing(format!(
                            "{}.{}: {}",
                            self.name, name, e
                        ))
                    })?;
                    row.insert(name.clone(), datum);
                }
                None => warn!("Skipping unknown column {}.{}", self.name, name),
            }
        }
        Ok(row)
    }

    pub fn to_json(&self) -> Value {
        let mut columns = Map::new();
        for (name, column) in &self.columns {
            columns.insert(name.clone(), column.to_json());
        }

        let mut obj = Map::new();
        obj.insert("columns".into(), Value::Object(columns));
        if !self.indexes.is_empty() {
            obj.insert("indexes".into(), json!(self.indexes));
        }
        if let Some(max_rows) = self.max_rows {
            obj.insert("maxRows".into(), json!(max_rows));
        }
        if self.is_root {
            obj.insert("isRoot".into(), json!(true));
        }
        Value::Object(obj)
    }
}

fn parse_indexes(table_name: &str, json: &Value) -> Result<Vec<Vec<String>>> {
    let bad = || {
        OvsdbSchemaError::schema_parsing(format!(
            "table '{}': indexes must be an array of column name arrays, got {}",
            table_name, json
        ))
    };

    json.as_array()
        .ok_or_else(bad)?
        .iter()
        .map(|index| -> Result<Vec<String>> {
            index
                .as_array()
                .ok_or_else(bad)?
                .iter()
                .map(|col| col.as_str().map(str::to_string).ok_or_else(bad))
                .collect()
        })
        .collect()
}
