//! Generic rows built against a table schema

use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::table::{UUID_COLUMN, VERSION_COLUMN};
use crate::value::Datum;

/// A row of one table, column name to datum
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    table: String,
    columns: HashMap<String, Datum>,
}

impl Row {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: HashMap::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn insert(&mut self, column: impl Into<String>, datum: Datum) {
        self.columns.insert(column.into(), datum);
    }

    pub fn get(&self, column: &str) -> Option<&Datum> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value of `_uuid`, if the row carries it
    pub fn uuid(&self) -> Option<&Uuid> {
        self.get(UUID_COLUMN)?.as_atom()?.as_uuid()
    }

    /// Value of `_version`, if the row carries it
    pub fn version(&self) -> Option<&Uuid> {
        self.get(VERSION_COLUMN)?.as_atom()?.as_uuid()
    }

    /// Wire form of the row
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        for (name, datum) in &self.columns {
            obj.insert(name.clone(), datum.to_json());
        }
        Value::Object(obj)
    }
}
