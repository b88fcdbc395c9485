//! Runtime values produced by coercing OVSDB JSON against a column type
//!
//! - `Atom`: a single scalar (or a reference)
//! - `Datum`: what a column holds, an atom, a set or a map

use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

/// An expanded reference: a row embedded in place of a `["uuid", id]` pair.
///
/// Southbound traffic always sends the compact form. Northbound callers (and
/// tests) sometimes inline the referenced row; the raw JSON is kept so the
/// caller can resolve it against `ref_table` later.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedRow {
    pub ref_table: Option<String>,
    pub json: Value,
}

impl ReferencedRow {
    pub fn new(ref_table: Option<String>, json: Value) -> Self {
        Self { ref_table, json }
    }
}

/// A single OVSDB scalar
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
    Uuid(Uuid),
    ReferencedRow(ReferencedRow),
}

impl Atom {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Atom::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Atom::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Atom::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Atom::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Atom::Uuid(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_referenced_row(&self) -> Option<&ReferencedRow> {
        match self {
            Atom::ReferencedRow(r) => Some(r),
            _ => None,
        }
    }

    /// Short name of the atom's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Atom::Integer(_) => "integer",
            Atom::Real(_) => "real",
            Atom::Boolean(_) => "boolean",
            Atom::String(_) => "string",
            Atom::Uuid(_) => "uuid",
            Atom::ReferencedRow(_) => "referenced row",
        }
    }

    /// Wire form of the atom
    pub fn to_json(&self) -> Value {
        match self {
            Atom::Integer(i) => json!(i),
            Atom::Real(r) => json!(r),
            Atom::Boolean(b) => json!(b),
            Atom::String(s) => json!(s),
            Atom::Uuid(u) => json!(["uuid", u.to_string()]),
            Atom::ReferencedRow(r) => r.json.clone(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Integer(i) => write!(f, "{}", i),
            Atom::Real(r) => write!(f, "{}", r),
            Atom::Boolean(b) => write!(f, "{}", b),
            Atom::String(s) => write!(f, "\"{}\"", s),
            Atom::Uuid(u) => write!(f, "{}", u),
            Atom::ReferencedRow(r) => write!(
                f,
                "<row in {}>",
                r.ref_table.as_deref().unwrap_or("unknown table")
            ),
        }
    }
}

/// The value held by one column of one row
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Atom(Atom),
    Set(Vec<Atom>),
    Map(Vec<(Atom, Atom)>),
}

impl Datum {
    /// Number of atoms (or pairs) in the datum
    pub fn len(&self) -> usize {
        match self {
            Datum::Atom(_) => 1,
            Datum::Set(items) => items.len(),
            Datum::Map(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Datum::Atom(a) => Some(a),
            Datum::Set(items) if items.len() == 1 => items.first(),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[Atom]> {
        match self {
            Datum::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Atom, Atom)]> {
        match self {
            Datum::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Look up a map entry by key
    pub fn map_get(&self, key: &Atom) -> Option<&Atom> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Wire form of the datum
    pub fn to_json(&self) -> Value {
        match self {
            Datum::Atom(a) => a.to_json(),
            Datum::Set(items) => {
                json!(["set", items.iter().map(Atom::to_json).collect::<Vec<_>>()])
            }
            Datum::Map(pairs) => json!([
                "map",
                pairs
                    .iter()
                    .map(|(k, v)| json!([k.to_json(), v.to_json()]))
                    .collect::<Vec<_>>()
            ]),
        }
    }
}
