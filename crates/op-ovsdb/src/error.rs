//! Error types for OVSDB schema parsing and value coercion
//!
//! Every failure raised while building a schema is fatal to that build:
//! there is no partially parsed `DatabaseSchema`. Lookup misses are not
//! errors and never show up here.

use thiserror::Error;

/// OVSDB schema errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OvsdbSchemaError {
    // ========================================================================
    // Schema Document Errors
    // ========================================================================
    #[error("Schema parsing error: {0}")]
    SchemaParsing(String),

    // ========================================================================
    // Type Descriptor Errors
    // ========================================================================
    #[error("Type resolution error: {0}")]
    TypeResolution(String),

    #[error("Invalid value '{value}' for enumerated field '{field}'")]
    InvalidEnumValue { field: String, value: String },

    // ========================================================================
    // Value Errors
    // ========================================================================
    #[error("Value parsing error: {0}")]
    ValueParsing(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    // ========================================================================
    // Typed Table Errors
    // ========================================================================
    #[error("Cannot build typed table {type_name}: {reason}")]
    FactoryConstruction { type_name: String, reason: String },
}

/// Result type alias using OvsdbSchemaError
pub type Result<T> = std::result::Result<T, OvsdbSchemaError>;

impl OvsdbSchemaError {
    /// Create a schema parsing error
    pub fn schema_parsing(msg: impl Into<String>) -> Self {
        OvsdbSchemaError::SchemaParsing(msg.into())
    }

    /// Create a type resolution error
    pub fn type_resolution(msg: impl Into<String>) -> Self {
        OvsdbSchemaError::TypeResolution(msg.into())
    }

    /// Create an invalid enum value error
    pub fn invalid_enum(field: impl Into<String>, value: impl Into<String>) -> Self {
        OvsdbSchemaError::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a value parsing error
    pub fn value_parsing(msg: impl Into<String>) -> Self {
        OvsdbSchemaError::ValueParsing(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        OvsdbSchemaError::ConstraintViolation(msg.into())
    }

    /// Create a factory construction error
    pub fn factory(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        OvsdbSchemaError::FactoryConstruction {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error comes from a malformed schema document
    /// (as opposed to a bad value or a broken typed wrapper)
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            OvsdbSchemaError::SchemaParsing(_)
                | OvsdbSchemaError::TypeResolution(_)
                | OvsdbSchemaError::InvalidEnumValue { .. }
        )
    }

    /// Returns true if this error indicates a programming defect in a typed
    /// wrapper rather than bad input
    pub fn is_programming_error(&self) -> bool {
        matches!(self, OvsdbSchemaError::FactoryConstruction { .. })
    }
}
