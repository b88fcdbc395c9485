//! OVSDB schema version (`major.minor.patch`)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::OvsdbSchemaError;

/// Schema version, ordered by major, then minor, then patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// `0.0.0`, used where a schema does not declare a version
    pub const NULL: Version = Version::new(0, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// True if `self` falls within `[from, to]`; either bound may be open
    pub fn is_in_range(&self, from: Option<Version>, to: Option<Version>) -> bool {
        from.map_or(true, |f| *self >= f) && to.map_or(true, |t| *self <= t)
    }
}

impl FromStr for Version {
    type Err = OvsdbSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 3 {
            return Err(OvsdbSchemaError::schema_parsing(format!(
                "bad version '{}', expected major.minor.patch",
                s
            )));
        }

        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                OvsdbSchemaError::schema_parsing(format!(
                    "bad version '{}': '{}' is not a number",
                    s, part
                ))
            })?;
        }

        Ok(Version::new(nums[0], nums[1], nums[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
