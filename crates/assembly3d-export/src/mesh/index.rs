//! Index element width selection

use std::fmt;
use std::str::FromStr;

use assembly3d_core::Error;
use serde::{Serialize, Serializer};

/// Unsigned integer width of the triangle index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    /// The narrowest width that can address `count` vertices
    pub fn for_vertex_count(count: usize) -> Self {
        if count < 1 << 8 {
            IndexType::UnsignedByte
        } else if count < 1 << 16 {
            IndexType::UnsignedShort
        } else {
            IndexType::UnsignedInt
        }
    }

    /// Size of one index in bytes
    pub fn bytes(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }

    /// Number of distinct index values (`2^bits`)
    pub fn capacity(self) -> u64 {
        1u64 << (self.bytes() * 8)
    }

    /// Descriptor name
    pub fn name(self) -> &'static str {
        match self {
            IndexType::UnsignedByte => "UNSIGNED_BYTE",
            IndexType::UnsignedShort => "UNSIGNED_SHORT",
            IndexType::UnsignedInt => "UNSIGNED_INT",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for IndexType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl FromStr for IndexType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNSIGNED_BYTE" => Ok(IndexType::UnsignedByte),
            "UNSIGNED_SHORT" => Ok(IndexType::UnsignedShort),
            "UNSIGNED_INT" => Ok(IndexType::UnsignedInt),
            other => Err(Error::xml(format!("unknown index type '{other}'"))),
        }
    }
}
