//! Column types and column schemas
//!
//! A column's `type` in an OVSDB schema is either a bare base type name
//! (exactly one value) or an object:
//!
//! ```json
//! {"key": <base-type>, "value": <base-type>, "min": 0, "max": "unlimited"}
//! ```
//!
//! Without `value` the column holds a set of `key` atoms; with `value` it
//! holds a map. `min`/`max` give the cardinality and both default to 1.

use serde_json::{json, Map, Value};

use crate::base_type::BaseType;
use crate::error::{OvsdbSchemaError, Result};
use crate::value::{Atom, Datum};

/// Upper bound used for `"max": "unlimited"`
pub const UNLIMITED: u64 = u64::MAX;

/// How many values a column holds, derived from its cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// `min = 1, max = 1`
    Single,
    /// `min = 0, max = 1`
    Optional,
    /// Anything with `max > 1`
    Multi,
}

/// Resolved type of a column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// A single atom, an optional atom or a set of atoms
    Atomic { base: BaseType, min: u64, max: u64 },
    /// A map from `key` atoms to `value` atoms
    KeyValued {
        key: BaseType,
        value: BaseType,
        min: u64,
        max: u64,
    },
}

impl ColumnType {
    /// Exactly one atom of `base`
    pub fn atomic(base: BaseType) -> Self {
        ColumnType::Atomic {
            base,
            min: 1,
            max: 1,
        }
    }

    /// Parse the `type` field of a column
    pub fn from_json(json: &Value) -> Result<ColumnType> {
        let obj = match json {
            Value::Object(obj) => obj,
            other => return Ok(ColumnType::atomic(BaseType::from_json(other, "key")?)),
        };

        let key = BaseType::from_json(json, "key")?;
        let value = if obj.contains_key("value") {
            Some(BaseType::from_json(json, "value")?)
        } else {
            None
        };
        let min = parse_min(obj)?;
        let max = parse_max(obj)?;
        if min > max {
            return Err(OvsdbSchemaError::schema_parsing(format!(
                "column type min {} exceeds max {}",
                min, max
            )));
        }

        Ok(match value {
            Some(value) => ColumnType::KeyValued {
                key,
                value,
                min,
                max,
            },
            None => ColumnType::Atomic {
                base: key,
                min,
                max,
            },
        })
    }

    /// Key base type (the only base type for atomic columns)
    pub fn base_type(&self) -> &BaseType {
        match self {
            ColumnType::Atomic { base, .. } => base,
            ColumnType::KeyValued { key, .. } => key,
        }
    }

    /// Value base type of a map column
    pub fn value_type(&self) -> Option<&BaseType> {
        match self {
            ColumnType::Atomic { .. } => None,
            ColumnType::KeyValued { value, .. } => Some(value),
        }
    }

    pub fn min(&self) -> u64 {
        match self {
            ColumnType::Atomic { min, .. } | ColumnType::KeyValued { min, .. } => *min,
        }
    }

    pub fn max(&self) -> u64 {
        match self {
            ColumnType::Atomic { max, .. } | ColumnType::KeyValued { max, .. } => *max,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ColumnType::KeyValued { .. })
    }

    pub fn multiplicity(&self) -> Multiplicity {
        match (self.min(), self.max()) {
            (1, 1) => Multiplicity::Single,
            (0, 1) => Multiplicity::Optional,
            _ => Multiplicity::Multi,
        }
    }

    /// True for sets and maps holding more than one value
    pub fn is_multi_valued(&self) -> bool {
        self.multiplicity() == Multiplicity::Multi
    }

    /// Short type tag: the base type name, `set<name>` or `map<key,value>`
    pub fn tag(&self) -> String {
        match self {
            ColumnType::KeyValued { key, value, .. } => format!("map<{},{}>", key, value),
            ColumnType::Atomic { base, .. } if self.multiplicity() == Multiplicity::Single => {
                base.name().to_string()
            }
            ColumnType::Atomic { base, .. } => format!("set<{}>", base),
        }
    }

    /// Coerce a wire value into a datum of this type.
    ///
    /// Atomic columns take `["set", [...]]` or a bare atom; a bare atom in a
    /// set-typed column becomes a one-element set. Map columns require
    /// `["map", [[k, v], ...]]`.
    pub fn value_from_json(&self, json: &Value) -> Result<Datum> {
        match self {
            ColumnType::Atomic { base, .. } => match tagged(json, "set") {
                Some(items) => items
                    .iter()
                    .map(|item| base.to_value(item))
                    .collect::<Result<Vec<Atom>>>()
                    .map(Datum::Set),
                None => {
                    let atom = base.to_value(json)?;
                    if self.multiplicity() == Multiplicity::Single {
                        Ok(Datum::Atom(atom))
                    } else {
                        Ok(Datum::Set(vec![atom]))
                    }
                }
            },
            ColumnType::KeyValued { key, value, .. } => {
                let pairs = tagged(json, "map").ok_or_else(|| {
                    OvsdbSchemaError::value_parsing(format!(
                        "expected [\"map\", [...]], got {}",
                        json
                    ))
                })?;
                pairs
                    .iter()
                    .map(|pair| match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => Ok((key.to_value(k)?, value.to_value(v)?)),
                        _ => Err(OvsdbSchemaError::value_parsing(format!(
                            "map entry must be [key, value], got {}",
                            pair
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Datum::Map)
            }
        }
    }

    /// Check cardinality and every atom against the base type constraints
    pub fn validate(&self, datum: &Datum) -> Result<()> {
        let count = datum.len() as u64;
        if count < self.min() || count > self.max() {
            return Err(OvsdbSchemaError::constraint(format!(
                "{} values where {} expects between {} and {}",
                count,
                self.tag(),
                self.min(),
                if self.max() == UNLIMITED {
                    "unlimited".to_string()
                } else {
                    self.max().to_string()
                }
            )));
        }

        match (self, datum) {
            (ColumnType::Atomic { base, .. }, Datum::Atom(atom)) => base.validate(atom),
            (ColumnType::Atomic { base, .. }, Datum::Set(atoms)) => {
                atoms.iter().try_for_each(|atom| base.validate(atom))
            }
            (ColumnType::KeyValued { key, value, .. }, Datum::Map(pairs)) => {
                pairs.iter().try_for_each(|(k, v)| {
                    key.validate(k)?;
                    value.validate(v)
                })
            }
            _ => Err(OvsdbSchemaError::constraint(format!(
                "datum shape does not match {}",
                self.tag()
            ))),
        }
    }

    /// Schema form of this type
    pub fn to_json(&self) -> Value {
        if let ColumnType::Atomic { base, min: 1, max: 1 } = self {
            let base = base.to_json();
            if base.is_string() {
                return base;
            }
            return json!({ "key": base });
        }

        let mut obj = Map::new();
        obj.insert("key".into(), self.base_type().to_json());
        if let Some(value) = self.value_type() {
            obj.insert("value".into(), value.to_json());
        }
        if self.min() != 1 {
            obj.insert("min".into(), json!(self.min()));
        }
        if self.max() == UNLIMITED {
            obj.insert("max".into(), json!("unlimited"));
        } else if self.max() != 1 {
            obj.insert("max".into(), json!(self.max()));
        }
        Value::Object(obj)
    }
}

/// Payload of a `["<tag>", [...]]` wire value
fn tagged<'a>(json: &'a Value, tag: &str) -> Option<&'a Vec<Value>> {
    match json.as_array().map(Vec::as_slice) {
        Some([Value::String(t), Value::Array(items)]) if t == tag => Some(items),
        _ => None,
    }
}

fn parse_min(obj: &Map<String, Value>) -> Result<u64> {
    match obj.get("min") {
        None => Ok(1),
        Some(v) => v.as_u64().ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!("min must be a non-negative integer, got {}", v))
        }),
    }
}

fn parse_max(obj: &Map<String, Value>) -> Result<u64> {
    match obj.get("max") {
        None => Ok(1),
        Some(Value::String(s)) if s == "unlimited" => Ok(UNLIMITED),
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 => Ok(n),
            _ => Err(OvsdbSchemaError::schema_parsing(format!(
                "max must be a positive integer or \"unlimited\", got {}",
                v
            ))),
        },
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub mutable: bool,
    pub ephemeral: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            mutable: true,
            ephemeral: false,
        }
    }

    /// Parse a column definition: `{"type": ..., "mutable": bool, "ephemeral": bool}`
    pub fn from_json(name: &str, json: &Value) -> Result<ColumnSchema> {
        let type_json = json.get("type").ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!("column '{}' has no type", name))
        })?;
        let column_type = ColumnType::from_json(type_json).map_err(|e| match e {
            OvsdbSchemaError::TypeResolution(msg) => {
                OvsdbSchemaError::type_resolution(format!("column '{}': {}", name, msg))
            }
            other => other,
        })?;

        Ok(ColumnSchema {
            name: name.to_string(),
            column_type,
            mutable: opt_bool(json, "mutable")?.unwrap_or(true),
            ephemeral: opt_bool(json, "ephemeral")?.unwrap_or(false),
        })
    }

    /// Coerce a wire value for this column
    pub fn value_from_json(&self, json: &Value) -> Result<Datum> {
        self.column_type.value_from_json(json)
    }

    pub fn validate(&self, datum: &Datum) -> Result<()> {
        self.column_type
            .validate(datum)
            .map_err(|e| OvsdbSchemaError::constraint(format!("column '{}': {}", self.name, e)))
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), self.column_type.to_json());
        if !self.mutable {
            obj.insert("mutable".into(), json!(false));
        }
        if self.ephemeral {
            obj.insert("ephemeral".into(), json!(true));
        }
        Value::Object(obj)
    }
}

fn opt_bool(json: &Value, field: &str) -> Result<Option<bool>> {
    match json.get(field) {
        None => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| {
            OvsdbSchemaError::schema_parsing(format!("{} must be a boolean, got {}", field, v))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_type::RefType;

    #[test]
    fn test_bare_type_is_single_valued() {
        let t = ColumnType::from_json(&json!("string")).unwrap();
        assert_eq!(t.multiplicity(), Multiplicity::Single);
        assert_eq!(t.tag(), "string");
    }

    #[test]
    fn test_set_and_optional_cardinality() {
        let t = ColumnType::from_json(&json!({"key": "string", "min": 0, "max": "unlimited"}))
            .unwrap();
        assert_eq!(t.multiplicity(), Multiplicity::Multi);
        assert_eq!(t.max(), UNLIMITED);
        assert_eq!(t.tag(), "set<string>");

        let t = ColumnType::from_json(&json!({"key": "integer", "min": 0, "max": 1})).unwrap();
        assert_eq!(t.multiplicity(), Multiplicity::Optional);
    }

    #[test]
    fn test_map_type() {
        let t = ColumnType::from_json(&json!({
            "key": "string",
            "value": {"type": "uuid", "refTable": "Queue"},
            "min": 0,
            "max": "unlimited"
        }))
        .unwrap();
        assert!(t.is_map());
        assert_eq!(t.tag(), "map<string,uuid>");
        assert_eq!(
            t.value_type().and_then(BaseType::as_uuid).map(|u| u.ref_type),
            Some(RefType::Strong)
        );
    }

    #[test]
    fn test_bad_cardinality() {
        assert!(ColumnType::from_json(&json!({"key": "string", "max": 0})).is_err());
        assert!(ColumnType::from_json(&json!({"key": "string", "min": 2, "max": 1})).is_err());
        assert!(ColumnType::from_json(&json!({"key": "string", "max": "lots"})).is_err());
    }

    #[test]
    fn test_missing_key_fails() {
        let err = ColumnType::from_json(&json!({"min": 0, "max": 1})).unwrap_err();
        assert!(matches!(err, OvsdbSchemaError::TypeResolution(_)));
    }

    #[test]
    fn test_value_from_json_set_and_bare_atom() {
        let t = ColumnType::from_json(&json!({"key": "string", "min": 0, "max": "unlimited"}))
            .unwrap();
        let datum = t
            .value_from_json(&json!(["set", ["OpenFlow10", "OpenFlow13"]]))
            .unwrap();
        assert_eq!(datum.len(), 2);

        let datum = t.value_from_json(&json!("OpenFlow13")).unwrap();
        assert_eq!(datum, Datum::Set(vec![Atom::String("OpenFlow13".into())]));

        let single = ColumnType::from_json(&json!("integer")).unwrap();
        assert_eq!(single.value_from_json(&json!(7)).unwrap(), Datum::Atom(Atom::Integer(7)));
    }

    #[test]
    fn test_value_from_json_uuid_set() {
        let t = ColumnType::from_json(&json!({
            "key": {"type": "uuid", "refTable": "Port"},
            "min": 0,
            "max": "unlimited"
        }))
        .unwrap();
        let datum = t
            .value_from_json(&json!(["set", [
                ["uuid", "11111111-2222-3333-4444-555555555555"],
                ["uuid", "66666666-7777-8888-9999-000000000000"]
            ]]))
            .unwrap();
        let atoms = datum.as_set().unwrap();
        assert_eq!(atoms.len(), 2);
        assert!(atoms.iter().all(|a| a.as_uuid().is_some()));

        let datum = t
            .value_from_json(&json!(["uuid", "11111111-2222-3333-4444-555555555555"]))
            .unwrap();
        assert_eq!(datum.len(), 1);
    }

    #[test]
    fn test_value_from_json_map() {
        let t = ColumnType::from_json(&json!({
            "key": "string",
            "value": "string",
            "min": 0,
            "max": "unlimited"
        }))
        .unwrap();
        let datum = t
            .value_from_json(&json!(["map", [["stp-enable", "true"]]]))
            .unwrap();
        assert_eq!(
            datum.map_get(&Atom::String("stp-enable".into())),
            Some(&Atom::String("true".into()))
        );

        assert!(t.value_from_json(&json!(["set", []])).is_err());
        assert!(t.value_from_json(&json!(["map", [["only-key"]]])).is_err());
    }

    #[test]
    fn test_validate_cardinality() {
        let t = ColumnType::from_json(&json!({"key": "integer", "min": 1, "max": 2})).unwrap();
        assert!(t.validate(&Datum::Set(vec![Atom::Integer(1)])).is_ok());
        assert!(t.validate(&Datum::Set(vec![])).is_err());
        assert!(t
            .validate(&Datum::Set(vec![Atom::Integer(1), Atom::Integer(2), Atom::Integer(3)]))
            .is_err());
    }

    #[test]
    fn test_column_schema_flags() {
        let col = ColumnSchema::from_json(
            "name",
            &json!({"type": "string", "mutable": false}),
        )
        .unwrap();
        assert_eq!(col.name, "name");
        assert!(!col.mutable);
        assert!(!col.ephemeral);

        let err = ColumnSchema::from_json("name", &json!({"mutable": false})).unwrap_err();
        assert!(matches!(err, OvsdbSchemaError::SchemaParsing(_)));
    }

    #[test]
    fn test_column_type_to_json_reparses() {
        let descriptors = [
            json!("string"),
            json!({"key": "string", "min": 0, "max": "unlimited"}),
            json!({"key": {"type": "integer", "minInteger": 0, "maxInteger": 4095}, "min": 0, "max": 4096}),
            json!({"key": "string", "value": {"type": "uuid", "refTable": "Queue", "refType": "weak"}, "min": 0, "max": "unlimited"}),
            json!({"key": {"type": "uuid", "refTable": "Bridge"}}),
            json!({"key": {"type": "integer", "minInteger": 1, "maxInteger": 4294967295u64}}),
        ];
        for descriptor in descriptors {
            let t = ColumnType::from_json(&descriptor).unwrap();
            assert_eq!(ColumnType::from_json(&t.to_json()).unwrap(), t);
        }
    }

    #[test]
    fn test_constrained_single_column_keeps_key() {
        let t = ColumnType::from_json(&json!({"key": {"type": "uuid", "refTable": "Bridge"}})).unwrap();
        assert_eq!(t.multiplicity(), Multiplicity::Single);
        assert_eq!(
            t.to_json(),
            json!({"key": {"type": "uuid", "refTable": "Bridge"}})
        );
        assert_eq!(ColumnType::atomic(BaseType::Boolean).to_json(), json!("boolean"));
    }
}
