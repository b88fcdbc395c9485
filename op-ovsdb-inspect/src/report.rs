//! Schema summary reports

use op_ovsdb::{BaseType, ColumnSchema, DatabaseSchema, TableSchema, UNLIMITED};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchemaReport {
    pub name: String,
    pub version: String,
    pub tables: Vec<TableReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableReport {
    pub name: String,
    pub is_root: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
    pub indexes: Vec<Vec<String>>,
    pub columns: Vec<ColumnReport>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnReport {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub min: u64,
    pub max: String,
    pub mutable: bool,
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl SchemaReport {
    /// Summarize `schema`; with `only_table`, just that table
    pub fn build(schema: &DatabaseSchema, only_table: Option<&str>) -> Self {
        let mut names: Vec<&str> = schema
            .tables()
            .filter(|name| only_table.map_or(true, |t| t == *name))
            .collect();
        names.sort_unstable();

        Self {
            name: schema.name().to_string(),
            version: schema.version().to_string(),
            tables: names
                .into_iter()
                .filter_map(|name| schema.table_schema(name))
                .map(|table| TableReport::build(table))
                .collect(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {} ({} tables)", self.name, self.version, self.tables.len());
        for table in &self.tables {
            let mut flags = Vec::new();
            if table.is_root {
                flags.push("root".to_string());
            }
            if let Some(max_rows) = table.max_rows {
                flags.push(format!("maxRows={}", max_rows));
            }
            let _ = writeln!(
                out,
                "\n{}{}",
                table.name,
                if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                }
            );
            for index in &table.indexes {
                let _ = writeln!(out, "  index ({})", index.join(", "));
            }
            for column in &table.columns {
                let mut line = format!(
                    "  {:<24} {} [{}..{}]",
                    column.name, column.type_tag, column.min, column.max
                );
                if !column.references.is_empty() {
                    let _ = write!(line, " -> {}", column.references.join(", "));
                }
                if !column.mutable {
                    line.push_str(" immutable");
                }
                if column.ephemeral {
                    line.push_str(" ephemeral");
                }
                let _ = writeln!(out, "{}", line);
            }
        }
        out
    }
}

impl TableReport {
    fn build(table: &TableSchema) -> Self {
        let mut columns: Vec<ColumnReport> = table.columns.values().map(ColumnReport::build).collect();
        columns.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            name: table.name.clone(),
            is_root: table.is_root,
            max_rows: table.max_rows,
            indexes: table.indexes.clone(),
            columns,
        }
    }
}

impl ColumnReport {
    fn build(column: &ColumnSchema) -> Self {
        let column_type = &column.column_type;
        let references = std::iter::once(column_type.base_type())
            .chain(column_type.value_type())
            .filter_map(BaseType::as_uuid)
            .filter_map(|u| {
                u.ref_table
                    .as_ref()
                    .map(|table| format!("{} ({})", table, u.ref_type))
            })
            .collect();

        Self {
            name: column.name.clone(),
            type_tag: column_type.tag(),
            min: column_type.min(),
            max: if column_type.max() == UNLIMITED {
                "*".to_string()
            } else {
                column_type.max().to_string()
            },
            mutable: column.mutable,
            ephemeral: column.ephemeral,
            references,
        }
    }
}
