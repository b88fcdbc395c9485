//! Typed table factory registry
//!
//! Callers that want a strongly typed facade over a generic table schema
//! (say a `Bridge` type exposing `name_column()` and `ports_column()`)
//! register a factory for it here. `DatabaseSchema::table` then looks the
//! factory up by type identity and hands it the table's schema.
//!
//! A missing factory, or a factory that fails, is a broken wrapper type and
//! is reported as `FactoryConstruction`. Nothing is retried.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::column::ColumnSchema;
use crate::error::{OvsdbSchemaError, Result};
use crate::table::TableSchema;

/// A typed wrapper that can be built from a table schema
pub trait TypedTable: Sized + 'static {
    fn from_table_schema(table: Arc<TableSchema>) -> Result<Self>;
}

type Factory = Box<dyn Fn(Arc<TableSchema>) -> Result<Box<dyn Any>> + Send + Sync>;

struct Entry {
    type_name: &'static str,
    factory: Factory,
}

/// Factories for typed wrappers, keyed by the wrapper's `TypeId`
#[derive(Default)]
pub struct TableFactoryRegistry {
    factories: HashMap<TypeId, Entry>,
}

impl TableFactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `TypedTable` implementation
    pub fn register<E: TypedTable>(&mut self) -> &mut Self {
        self.register_fn::<E, _>(E::from_table_schema)
    }

    /// Register an arbitrary factory function for `E`
    pub fn register_fn<E, F>(&mut self, factory: F) -> &mut Self
    where
        E: 'static,
        F: Fn(Arc<TableSchema>) -> Result<E> + Send + Sync + 'static,
    {
        debug!("Registering typed table factory for {}", type_name::<E>());
        self.factories.insert(
            TypeId::of::<E>(),
            Entry {
                type_name: type_name::<E>(),
                factory: Box::new(move |table| factory(table).map(|e| Box::new(e) as Box<dyn Any>)),
            },
        );
        self
    }

    pub fn is_registered<E: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Adapt `table` to `E`.
    ///
    /// Asking for `Arc<TableSchema>` itself returns the same allocation
    /// without going through a factory.
    pub fn build<E: 'static>(&self, table: Arc<TableSchema>) -> Result<E> {
        let wanted = type_name::<E>();

        if TypeId::of::<E>() == TypeId::of::<Arc<TableSchema>>() {
            let generic: Box<dyn Any> = Box::new(table);
            return generic
                .downcast::<E>()
                .map(|e| *e)
                .map_err(|_| OvsdbSchemaError::factory(wanted, "generic table downcast failed"));
        }

        let entry = self.factories.get(&TypeId::of::<E>()).ok_or_else(|| {
            OvsdbSchemaError::factory(wanted, "no factory registered for this type")
        })?;

        let table_name = table.name.clone();
        let built = (entry.factory)(table).map_err(|e| {
            OvsdbSchemaError::factory(
                entry.type_name,
                format!("factory failed for table '{}': {}", table_name, e),
            )
        })?;

        built
            .downcast::<E>()
            .map(|e| *e)
            .map_err(|_| OvsdbSchemaError::factory(wanted, "factory produced a different type"))
    }
}

impl fmt::Debug for TableFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        f.debug_struct("TableFactoryRegistry")
            .field("types", &names)
            .finish()
    }
}

/// Column lookup for typed wrappers: a missing column is an error rather
/// than `None`
pub fn required_column(table: &TableSchema, name: &str) -> Result<ColumnSchema> {
    table.column(name).cloned().ok_or_else(|| {
        OvsdbSchemaError::schema_parsing(format!(
            "table '{}' has no column '{}'",
            table.name, name
        ))
    })
}
