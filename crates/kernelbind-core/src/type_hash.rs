//! Deterministic hash-based identity for schema entities.
//!
//! [`TypeHash`] is a 64-bit hash computed from names, so the same class or
//! function always gets the same identity no matter in which order the schema
//! was registered. This lets plans refer to classes that are declared later
//! in a document and keeps lookups to a single map probe.
//!
//! # Examples
//!
//! ```
//! use kernelbind_core::TypeHash;
//!
//! let solid = TypeHash::from_name("Solid");
//! assert_eq!(solid, TypeHash::from_name("Solid"));
//!
//! let get_edges = TypeHash::from_method(solid, "GetEdges");
//! assert_ne!(get_edges, TypeHash::from_method(solid, "GetFaces"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
///
/// Classes, methods, overloads and initializers hash into different domains
/// so a method called `Solid` never collides with the class `Solid`.
pub mod hash_constants {
    /// Separator constant used when chaining components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for class hashes.
    pub const CLASS: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method/function hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for a single overload of a function.
    pub const OVERLOAD: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for initializer (constructor) overloads.
    pub const INITIALIZER: u64 = 0x9a7f3d5e2b8c4601;
}

/// A deterministic 64-bit identity for a class, function or overload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a class by its managed name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::CLASS ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a function owned by a class (or module).
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::METHOD ^ owner.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of the `index`-th overload of a function.
    ///
    /// Overloads are identified by declaration order, which is also the
    /// order in which their guards are tested.
    #[inline]
    pub fn from_overload(function: TypeHash, index: usize) -> Self {
        TypeHash(
            (hash_constants::OVERLOAD ^ function.0)
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(index as u64),
        )
    }

    /// Hash of the `index`-th initializer of a class.
    #[inline]
    pub fn from_initializer(owner: TypeHash, index: usize) -> Self {
        TypeHash(
            (hash_constants::INITIALIZER ^ owner.0)
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(index as u64),
        )
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
