use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid guid {0:?}: expected four '-'-separated hex parts")]
pub struct GuidParseError(String);

/// 128-bit identifier of a cluster object (transactions, nodes, operations).
///
/// Rendered as four 32-bit lowercase hex parts separated by dashes, e.g.
/// `1-2-3-4`, most significant part first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Guid([u32; 4]);

impl Guid {
    pub const fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self([a, b, c, d])
    }

    /// Generates a random identifier.
    pub fn create() -> Self {
        let bits = Uuid::new_v4().as_u128();
        Self::from_u128(bits)
    }

    pub const fn from_u128(bits: u128) -> Self {
        Self([
            (bits >> 96) as u32,
            (bits >> 64) as u32,
            (bits >> 32) as u32,
            bits as u32,
        ])
    }

    pub const fn as_u128(&self) -> u128 {
        ((self.0[0] as u128) << 96)
            | ((self.0[1] as u128) << 64)
            | ((self.0[2] as u128) << 32)
            | self.0[3] as u128
    }

    /// Returns true for the all-zero identifier.
    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }

    pub fn parts(&self) -> [u32; 4] {
        self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:x}-{b:x}-{c:x}-{d:x}")
    }
}

impl FromStr for Guid {
    type Err = GuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u32; 4];
        let mut iter = s.split('-');
        for part in parts.iter_mut() {
            let chunk = iter.next().ok_or_else(|| GuidParseError(s.to_owned()))?;
            if chunk.is_empty() || chunk.len() > 8 {
                return Err(GuidParseError(s.to_owned()));
            }
            *part = u32::from_str_radix(chunk, 16).map_err(|_| GuidParseError(s.to_owned()))?;
        }
        if iter.next().is_some() {
            return Err(GuidParseError(s.to_owned()));
        }
        Ok(Self(parts))
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GuidVisitor;

        impl Visitor<'_> for GuidVisitor {
            type Value = Guid;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a guid string such as \"1-2-3-4\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Guid, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(GuidVisitor)
    }
}
