//! Interned identifiers for symbol and package names.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name: a simple name, package segment, or qualified name.
///
/// Names are interned strings represented as a `u32` index into the session's
/// string interner. Annotation matching and class lookup intern the query
/// string once and then compare identifiers, so per-node comparison never
/// touches the underlying string data.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

// SAFETY: `Ident` wraps a `u32`, which is always a valid `usize` on 32-bit
// and 64-bit platforms. `try_from_usize` rejects values that don't fit.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe string interner backed by [`lasso::ThreadedRodeo`].
///
/// Every name in a compilation session — declaration names, package names,
/// annotation names — is interned here. The interner is owned by the session
/// and dropped with it, so identifiers never leak across compilations.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a string, returning its [`Ident`]. Re-interning an existing
    /// string returns the same identifier without allocating.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Resolves an [`Ident`] back to its string value.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was not created by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
