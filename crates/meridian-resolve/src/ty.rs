//! Opaque type handles and the assignability seam.
//!
//! The model never inspects type structure. Types are interned by the
//! subtyping engine and referenced here only through [`TypeId`] handles;
//! every subtyping question the resolver needs is asked through the
//! [`TypeOracle`] trait.

/// Opaque handle to a type interned by the subtyping engine.
///
/// The model stores and compares these handles but never looks inside
/// them. Equal handles denote the same interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

/// Answers assignability questions on behalf of the subtyping engine.
///
/// Signature matching calls into this trait during applicability filtering
/// and specificity ranking. The resolver treats equal handles as assignable
/// without consulting the oracle.
pub trait TypeOracle {
    /// Returns `true` if a value of type `from` may be passed where `to`
    /// is declared.
    fn is_assignable(&self, from: TypeId, to: TypeId) -> bool;

    /// Renders a readable name for `ty`, used when listing overload
    /// candidates in diagnostics. The default rendering is the raw handle.
    fn describe(&self, ty: TypeId) -> String {
        format!("#{}", ty.0)
    }
}

/// Oracle that treats every type as assignable only to itself.
///
/// A stand-in for contexts where no subtyping engine is wired up, such as
/// resolving in a freshly loaded module graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOracle;

impl TypeOracle for IdentityOracle {
    fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        from == to
    }
}
