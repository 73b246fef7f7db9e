//! Algebraic description of what a statement reads or writes.
//!
//! An [`Access`] abstracts over the address computations in the IR and keeps
//! only the *shape* of a variable access: a plain variable, a field selected
//! from a composite, or an element addressed through a pointer or array. The
//! chain always bottoms out in a scalar — the allocation, call result or
//! global that identifies the variable itself.
//!
//! Accesses are plain values: equality and hashing are structural, and the
//! same scalar may appear both as a base and as an index of the same access
//! without any sharing machinery.

use crate::ir::ValueRef;

/// A read or write target, as seen from the source program.
///
/// # Invariants
///
/// Recursively unwrapping `base` always reaches [`Access::Scalar`]; the
/// constructors cannot build anything else. Two accesses are equal iff they
/// have the same shape and all scalar leaves refer to the same IR values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Access {
    /// A variable accessed as a whole: local allocation, call result or
    /// non-constant global. Also used for constant field indices inside
    /// [`Access::Structural`].
    Scalar(ValueRef),
    /// Field selection within a composite value.
    Structural {
        /// The composite being selected from.
        base: Box<Access>,
        /// The selected field, usually a scalar of a constant field index.
        field: Box<Access>,
    },
    /// Subscript through a pointer or array.
    ArrayLike {
        /// The array or pointer being indexed.
        base: Box<Access>,
        /// The driving index accesses. Empty for a bare dereference, where
        /// no index information exists.
        indices: Vec<Access>,
    },
}

impl Access {
    /// Creates a scalar access.
    #[must_use]
    pub fn scalar(value: ValueRef) -> Self {
        Access::Scalar(value)
    }

    /// Creates a field selection.
    #[must_use]
    pub fn structural(base: Access, field: Access) -> Self {
        Access::Structural {
            base: Box::new(base),
            field: Box::new(field),
        }
    }

    /// Creates a subscript access. `indices` may be empty (bare dereference).
    #[must_use]
    pub fn array_like(base: Access, indices: Vec<Access>) -> Self {
        Access::ArrayLike {
            base: Box::new(base),
            indices,
        }
    }

    /// `true` for [`Access::Scalar`].
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Access::Scalar(_))
    }

    /// The scalar value, or `None` for composite accesses.
    #[must_use]
    pub fn value(&self) -> Option<ValueRef> {
        match self {
            Access::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// The base of a composite access, or `None` for scalars.
    #[must_use]
    pub fn base(&self) -> Option<&Access> {
        match self {
            Access::Scalar(_) => None,
            Access::Structural { base, .. } | Access::ArrayLike { base, .. } => Some(base),
        }
    }

    /// The accessor list: the field for structural accesses, the indices for
    /// array-like ones, empty for scalars.
    #[must_use]
    pub fn accessors(&self) -> &[Access] {
        match self {
            Access::Scalar(_) => &[],
            Access::Structural { field, .. } => std::slice::from_ref(&**field),
            Access::ArrayLike { indices, .. } => indices,
        }
    }

    /// The scalar value at the root of the access chain.
    ///
    /// Every access bottoms out in a scalar; this unwraps `base` links until
    /// it reaches it. The root identifies the variable for value-ID
    /// assignment, while the full shape is kept for serialization.
    #[must_use]
    pub fn root_value(&self) -> ValueRef {
        match self {
            Access::Scalar(value) => *value,
            Access::Structural { base, .. } | Access::ArrayLike { base, .. } => base.root_value(),
        }
    }

    /// All scalar leaves of the access tree, root first, then accessors in
    /// order, recursively.
    pub(crate) fn scalar_leaves(&self) -> Vec<ValueRef> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, leaves: &mut Vec<ValueRef>) {
        match self {
            Access::Scalar(value) => leaves.push(*value),
            Access::Structural { base, field } => {
                base.collect_leaves(leaves);
                field.collect_leaves(leaves);
            }
            Access::ArrayLike { base, indices } => {
                base.collect_leaves(leaves);
                for index in indices {
                    index.collect_leaves(leaves);
                }
            }
        }
    }
}
