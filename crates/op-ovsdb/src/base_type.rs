//! OVSDB base types
//!
//! A base type is the atomic type of a column (or of a map column's key or
//! value): `string`, `integer`, `real`, `boolean` or `uuid`. In a schema it
//! appears either as the bare type name or as a constrained object:
//!
//! ```json
//! "string"
//! {"type": "string", "enum": ["set", ["access", "native-tagged"]]}
//! {"type": "integer", "minInteger": 0, "maxInteger": 4095}
//! {"type": "uuid", "refTable": "Port", "refType": "weak"}
//! ```
//!
//! Type names are matched by exact dispatch, so resolution does not depend
//! on the order in which variants are tried.

use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{OvsdbSchemaError, Result};
use crate::value::{Atom, ReferencedRow};

/// Reference semantics of a `uuid` column pointing into another table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefType {
    /// Referenced rows are kept alive by the reference
    #[default]
    Strong,
    /// The reference is dropped when the referenced row is deleted
    Weak,
}

impl RefType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefType::Strong => "strong",
            RefType::Weak => "weak",
        }
    }
}

impl FromStr for RefType {
    type Err = OvsdbSchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strong" => Ok(RefType::Strong),
            "weak" => Ok(RefType::Weak),
            other => Err(OvsdbSchemaError::invalid_enum("refType", other)),
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `integer` constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerBaseType {
    pub min: i64,
    pub max: i64,
    pub enums: Option<BTreeSet<i64>>,
}

impl Default for IntegerBaseType {
    fn default() -> Self {
        Self {
            min: i64::MIN,
            max: i64::MAX,
            enums: None,
        }
    }
}

/// `real` constraints
#[derive(Debug, Clone, PartialEq)]
pub struct RealBaseType {
    pub min: f64,
    pub max: f64,
    pub enums: Option<Vec<f64>>,
}

impl Default for RealBaseType {
    fn default() -> Self {
        Self {
            min: f64::MIN,
            max: f64::MAX,
            enums: None,
        }
    }
}

/// `string` constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringBaseType {
    pub min_length: i32,
    pub max_length: i32,
    pub enums: Option<BTreeSet<String>>,
}

impl Default for StringBaseType {
    fn default() -> Self {
        Self {
            min_length: i32::MIN,
            max_length: i32::MAX,
            enums: None,
        }
    }
}

/// `uuid` constraints
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UuidBaseType {
    pub ref_table: Option<String>,
    pub ref_type: RefType,
}

impl UuidBaseType {
    /// A reference into `table`
    pub fn reference(table: impl Into<String>, ref_type: RefType) -> Self {
        Self {
            ref_table: Some(table.into()),
            ref_type,
        }
    }
}

/// An OVSDB base type with its constraints
#[derive(Debug, Clone, PartialEq)]
pub enum BaseType {
    String(StringBaseType),
    Integer(IntegerBaseType),
    Real(RealBaseType),
    Boolean,
    Uuid(UuidBaseType),
}

impl BaseType {
    /// Resolve a type descriptor.
    ///
    /// A value node is read as a bare type name. Anything else must carry
    /// `key_or_val` (`"key"` or `"value"`), whose content is either a type
    /// name or a `{"type": ..., <constraints>}` object.
    pub fn from_json(json: &Value, key_or_val: &str) -> Result<BaseType> {
        match json {
            Value::Object(obj) => {
                let node = obj.get(key_or_val).ok_or_else(|| {
                    OvsdbSchemaError::type_resolution(format!(
                        "not a type: expected '{}' in {}",
                        key_or_val, json
                    ))
                })?;
                Self::from_json_node(node)
            }
            Value::Array(_) => Err(OvsdbSchemaError::type_resolution(format!(
                "not a type: expected '{}' in {}",
                key_or_val, json
            ))),
            Value::String(s) => Self::from_name(s.trim()),
            other => Self::from_name(other.to_string().trim()),
        }
    }

    /// Unconstrained base type for a type name
    pub fn from_name(name: &str) -> Result<BaseType> {
        match name {
            "string" => Ok(BaseType::String(StringBaseType::default())),
            "integer" => Ok(BaseType::Integer(IntegerBaseType::default())),
            "real" => Ok(BaseType::Real(RealBaseType::default())),
            "boolean" => Ok(BaseType::Boolean),
            "uuid" => Ok(BaseType::Uuid(UuidBaseType::default())),
            other => Err(OvsdbSchemaError::type_resolution(format!(
                "unknown base type '{}'",
                other
            ))),
        }
    }

    fn from_json_node(node: &Value) -> Result<BaseType> {
        match node {
            Value::String(name) => Self::from_name(name),
            Value::Object(obj) => {
                let name = obj.get("type").and_then(Value::as_str).ok_or_else(|| {
                    OvsdbSchemaError::type_resolution(format!(
                        "base type object without a 'type' name: {}",
                        node
                    ))
                })?;
                Self::from_name(name)?.with_constraints(obj)
            }
            other => Err(OvsdbSchemaError::type_resolution(format!(
                "not a base type: {}",
                other
            ))),
        }
    }

    /// Build the constrained descriptor from the fields of a base type object
    fn with_constraints(self, obj: &Map<String, Value>) -> Result<BaseType> {
        Ok(match self {
            BaseType::Integer(default) => BaseType::Integer(IntegerBaseType {
                min: opt_i64(obj, "minInteger")?.unwrap_or(default.min),
                max: opt_i64(obj, "maxInteger")?.unwrap_or(default.max),
                enums: match obj.get("enum") {
                    Some(node) => Some(
                        enum_members(node)?
                            .into_iter()
                            .map(|v| {
                                v.as_i64().ok_or_else(|| {
                                    OvsdbSchemaError::schema_parsing(format!(
                                        "integer enum member is not an integer: {}",
                                        v
                                    ))
                                })
                            })
                            .collect::<Result<BTreeSet<i64>>>()?,
                    ),
                    None => None,
                },
            }),
            BaseType::Real(default) => BaseType::Real(RealBaseType {
                min: opt_f64(obj, "minReal")?.unwrap_or(default.min),
                max: opt_f64(obj, "maxReal")?.unwrap_or(default.max),
                enums: match obj.get("enum") {
                    Some(node) => {
                        let mut values = Vec::new();
                        for v in enum_members(node)? {
                            let r = v.as_f64().ok_or_else(|| {
                                OvsdbSchemaError::schema_parsing(format!(
                                    "real enum member is not a number: {}",
                                    v
                                ))
                            })?;
                            if !values.contains(&r) {
                                values.push(r);
                            }
                        }
                        Some(values)
                    }
                    None => None,
                },
            }),
            BaseType::String(default) => BaseType::String(StringBaseType {
                min_length: opt_i32(obj, "minLength")?.unwrap_or(default.min_length),
                max_length: opt_i32(obj, "maxLength")?.unwrap_or(default.max_length),
                enums: match obj.get("enum") {
                    Some(node) => Some(
                        enum_members(node)?
                            .into_iter()
                            .map(|v| {
                                v.as_str().map(str::to_string).ok_or_else(|| {
                                    OvsdbSchemaError::schema_parsing(format!(
                                        "string enum member is not a string: {}",
                                        v
                                    ))
                                })
                            })
                            .collect::<Result<BTreeSet<String>>>()?,
                    ),
                    None => None,
                },
            }),
            BaseType::Boolean => BaseType::Boolean,
            BaseType::Uuid(_) => {
                let ref_table = match obj.get("refTable") {
                    Some(Value::String(t)) => Some(t.clone()),
                    Some(other) => {
                        return Err(OvsdbSchemaError::schema_parsing(format!(
                            "refTable must be a string, got {}",
                            other
                        )))
                    }
                    None => None,
                };
                let ref_type = match obj.get("refType") {
                    Some(Value::String(t)) => t.parse()?,
                    Some(other) => {
                        return Err(OvsdbSchemaError::invalid_enum(
                            "refType",
                            other.to_string(),
                        ))
                    }
                    None => RefType::Strong,
                };
                BaseType::Uuid(UuidBaseType {
                    ref_table,
                    ref_type,
                })
            }
        })
    }

    /// The OVSDB name of this type
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::String(_) => "string",
            BaseType::Integer(_) => "integer",
            BaseType::Real(_) => "real",
            BaseType::Boolean => "boolean",
            BaseType::Uuid(_) => "uuid",
        }
    }

    /// Coerce a JSON wire value into an atom of this type.
    ///
    /// For `uuid`, `["uuid", "<id>"]` yields a UUID, while any non-array value
    /// is kept as a referenced row tagged with the configured `refTable`.
    pub fn to_value(&self, value: &Value) -> Result<Atom> {
        match self {
            BaseType::Integer(_) => value.as_i64().map(Atom::Integer).ok_or_else(|| {
                OvsdbSchemaError::value_parsing(format!("expected integer, got {}", value))
            }),
            BaseType::Real(_) => value.as_f64().map(Atom::Real).ok_or_else(|| {
                OvsdbSchemaError::value_parsing(format!("expected real, got {}", value))
            }),
            BaseType::Boolean => value.as_bool().map(Atom::Boolean).ok_or_else(|| {
                OvsdbSchemaError::value_parsing(format!("expected boolean, got {}", value))
            }),
            BaseType::String(_) => value
                .as_str()
                .map(|s| Atom::String(s.to_string()))
                .ok_or_else(|| {
                    OvsdbSchemaError::value_parsing(format!("expected string, got {}", value))
                }),
            BaseType::Uuid(uuid_type) => match value {
                Value::Array(items) => {
                    if items.len() == 2 && items[0].as_str() == Some("uuid") {
                        let id = items[1].as_str().ok_or_else(|| {
                            OvsdbSchemaError::value_parsing(format!(
                                "uuid must be a string, got {}",
                                items[1]
                            ))
                        })?;
                        Uuid::parse_str(id).map(Atom::Uuid).map_err(|e| {
                            OvsdbSchemaError::value_parsing(format!("bad uuid '{}': {}", id, e))
                        })
                    } else {
                        Err(OvsdbSchemaError::value_parsing(format!(
                            "expected [\"uuid\", <id>], got {}",
                            value
                        )))
                    }
                }
                other => Ok(Atom::ReferencedRow(ReferencedRow::new(
                    uuid_type.ref_table.clone(),
                    other.clone(),
                ))),
            },
        }
    }

    /// Check an atom against this type's constraints.
    ///
    /// `to_value` does not call this; callers opt in.
    pub fn validate(&self, atom: &Atom) -> Result<()> {
        match (self, atom) {
            (BaseType::Integer(t), Atom::Integer(i)) => {
                if *i < t.min || *i > t.max {
                    return Err(OvsdbSchemaError::constraint(format!(
                        "{} is outside [{}, {}]",
                        i, t.min, t.max
                    )));
                }
                if let Some(enums) = &t.enums {
                    if !enums.contains(i) {
                        return Err(OvsdbSchemaError::constraint(format!(
                            "{} is not one of {:?}",
                            i, enums
                        )));
                    }
                }
                Ok(())
            }
            (BaseType::Real(t), Atom::Real(r)) => {
                if *r < t.min || *r > t.max {
                    return Err(OvsdbSchemaError::constraint(format!(
                        "{} is outside [{}, {}]",
                        r, t.min, t.max
                    )));
                }
                if let Some(enums) = &t.enums {
                    if !enums.contains(r) {
                        return Err(OvsdbSchemaError::constraint(format!(
                            "{} is not one of {:?}",
                            r, enums
                        )));
                    }
                }
                Ok(())
            }
            (BaseType::String(t), Atom::String(s)) => {
                let len = s.chars().count() as i64;
                if len < i64::from(t.min_length) || len > i64::from(t.max_length) {
                    return Err(OvsdbSchemaError::constraint(format!(
                        "length of \"{}\" is outside [{}, {}]",
                        s, t.min_length, t.max_length
                    )));
                }
                if let Some(enums) = &t.enums {
                    if !enums.contains(s) {
                        return Err(OvsdbSchemaError::constraint(format!(
                            "\"{}\" is not one of {:?}",
                            s, enums
                        )));
                    }
                }
                Ok(())
            }
            (BaseType::Boolean, Atom::Boolean(_)) => Ok(()),
            (BaseType::Uuid(_), Atom::Uuid(_) | Atom::ReferencedRow(_)) => Ok(()),
            (t, a) => Err(OvsdbSchemaError::constraint(format!(
                "{} value {} does not match {} column",
                a.kind(),
                a,
                t.name()
            ))),
        }
    }

    /// Schema form of this type: the bare name when unconstrained, the
    /// object form otherwise
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match self {
            BaseType::Integer(t) => {
                if t.min != i64::MIN {
                    obj.insert("minInteger".into(), json!(t.min));
                }
                if t.max != i64::MAX {
                    obj.insert("maxInteger".into(), json!(t.max));
                }
                if let Some(enums) = &t.enums {
                    obj.insert("enum".into(), json!(["set", enums]));
                }
            }
            BaseType::Real(t) => {
                if t.min != f64::MIN {
                    obj.insert("minReal".into(), json!(t.min));
                }
                if t.max != f64::MAX {
                    obj.insert("maxReal".into(), json!(t.max));
                }
                if let Some(enums) = &t.enums {
                    obj.insert("enum".into(), json!(["set", enums]));
                }
            }
            BaseType::String(t) => {
                if t.min_length != i32::MIN {
                    obj.insert("minLength".into(), json!(t.min_length));
                }
                if t.max_length != i32::MAX {
                    obj.insert("maxLength".into(), json!(t.max_length));
                }
                if let Some(enums) = &t.enums {
                    obj.insert("enum".into(), json!(["set", enums]));
                }
            }
            BaseType::Boolean => {}
            BaseType::Uuid(t) => {
                if let Some(table) = &t.ref_table {
                    obj.insert("refTable".into(), json!(table));
                }
                if t.ref_type != RefType::Strong {
                    obj.insert("refType".into(), json!(t.ref_type.as_str()));
                }
            }
        }

        if obj.is_empty() {
            json!(self.name())
        } else {
            obj.insert("type".into(), json!(self.name()));
            Value::Object(obj)
        }
    }

    pub fn as_uuid(&self) -> Option<&UuidBaseType> {
        match self {
            BaseType::Uuid(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Members of an `enum` constraint: `["set", [v, ...]]` or a single atom
fn enum_members(node: &Value) -> Result<Vec<&Value>> {
    match node {
        Value::Array(items) => match (items.first().and_then(Value::as_str), items.get(1)) {
            (Some("set"), Some(Value::Array(members))) if items.len() == 2 => {
                Ok(members.iter().collect())
            }
            _ => Err(OvsdbSchemaError::schema_parsing(format!(
                "enum must be [\"set\", [...]] or a single value, got {}",
                node
            ))),
        },
        Value::Object(_) | Value::Null => Err(OvsdbSchemaError::schema_parsing(format!(
            "enum must be [\"set\", [...]] or a single value, got {}",
            node
        ))),
        single => Ok(vec![single]),
    }
}

fn opt_i64(obj: &Map<String, Value>, field: &str) -> Result<Option<i64>> {
    match obj.get(field) {
        None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!("{} must be an integer, got {}", field, v))
        }),
    }
}

fn opt_i32(obj: &Map<String, Value>, field: &str) -> Result<Option<i32>> {
    match opt_i64(obj, field)? {
        None => Ok(None),
        Some(v) => i32::try_from(v).map(Some).map_err(|_| {
            OvsdbSchemaError::schema_parsing(format!("{} out of range: {}", field, v))
        }),
    }
}

fn opt_f64(obj: &Map<String, Value>, field: &str) -> Result<Option<f64>> {
    match obj.get(field) {
        None => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!("{} must be a number, got {}", field, v))
        }),
    }
}
