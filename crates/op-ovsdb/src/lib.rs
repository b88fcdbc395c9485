//! op-ovsdb: OVSDB schema model and typed values
//!
//! This crate provides:
//! - Parsing of OVSDB schema documents into `DatabaseSchema` / `TableSchema` / `ColumnSchema`
//! - The base type system (string, integer, real, boolean, uuid references)
//! - Coercion of OVSDB wire values (`["set", ...]`, `["map", ...]`, `["uuid", ...]`) into `Datum`s
//! - Row construction against a table schema
//! - A factory registry for typed table wrappers
//!
//! Fetching the schema from a switch is up to the caller:
//!
//! ```no_run
//! use op_ovsdb::DatabaseSchema;
//!
//! # fn fetch() -> serde_json::Value { serde_json::json!({}) }
//! let reply: serde_json::Value = fetch(); // result of `get_schema`
//! let mut schema = DatabaseSchema::from_json("Open_vSwitch", &reply)?;
//! schema.populate_internally_generated_columns();
//! assert!(schema.has_table("Bridge"));
//! # Ok::<(), op_ovsdb::OvsdbSchemaError>(())
//! ```

pub mod base_type;
pub mod column;
pub mod database;
pub mod error;
pub mod row;
pub mod table;
pub mod typed;
pub mod value;
pub mod version;

pub use base_type::{
    BaseType, IntegerBaseType, RealBaseType, RefType, StringBaseType, UuidBaseType,
};
pub use column::{ColumnSchema, ColumnType, Multiplicity, UNLIMITED};
pub use database::DatabaseSchema;
pub use error::{OvsdbSchemaError, Result};
pub use row::Row;
pub use table::{TableSchema, UUID_COLUMN, VERSION_COLUMN};
pub use typed::{required_column, TableFactoryRegistry, TypedTable};
pub use value::{Atom, Datum, ReferencedRow};
pub use version::Version;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::base_type::{BaseType, RefType};
    pub use super::column::{ColumnSchema, ColumnType, Multiplicity};
    pub use super::database::DatabaseSchema;
    pub use super::error::OvsdbSchemaError;
    pub use super::table::TableSchema;
    pub use super::typed::{TableFactoryRegistry, TypedTable};
    pub use super::value::{Atom, Datum};
}
