//! Declarations: the named program elements owned by scopes.

use miette::SourceSpan;

use crate::scope::ScopeId;
use crate::ty::TypeId;

/// Identifies a [`Declaration`] within the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub u32);

/// The kind of program element a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// A value or attribute. Parameters and locals are values too.
    Value,
    /// A function or method.
    Function,
    /// A class or interface.
    Type,
}

/// Parameter list of a callable declaration.
///
/// A variadic signature treats its final parameter type as the element
/// type of a trailing sequence: `log(String, Object...)` accepts a
/// `String` followed by zero or more `Object` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    params: Vec<TypeId>,
    variadic: bool,
}

impl Signature {
    /// Signature accepting exactly the given parameter types.
    pub fn fixed(params: Vec<TypeId>) -> Self {
        Signature { params, variadic: false }
    }

    /// Variadic signature: the `prefix` parameters followed by zero or
    /// more trailing arguments of type `element`.
    pub fn variadic(prefix: Vec<TypeId>, element: TypeId) -> Self {
        let mut params = prefix;
        params.push(element);
        Signature { params, variadic: true }
    }

    /// Declared parameter types. For a variadic signature the final entry
    /// is the trailing element type.
    pub fn params(&self) -> &[TypeId] {
        &self.params
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Parameters before the trailing element of a variadic signature, or
    /// every parameter of a fixed-arity one.
    pub fn fixed_prefix(&self) -> &[TypeId] {
        if self.variadic {
            &self.params[..self.params.len() - 1]
        } else {
            &self.params
        }
    }

    /// Element type of the trailing sequence, if variadic.
    pub fn variadic_element(&self) -> Option<TypeId> {
        if self.variadic {
            self.params.last().copied()
        } else {
            None
        }
    }

    /// Effective parameter type at argument position `i`, extending the
    /// trailing element of a variadic signature past its declared arity.
    pub(crate) fn param_at(&self, i: usize) -> Option<TypeId> {
        if i < self.params.len() {
            Some(self.params[i])
        } else if self.variadic {
            self.params.last().copied()
        } else {
            None
        }
    }
}

/// A named program element: a value, function, or type.
///
/// Declarations are created through [`ModelBuilder`](crate::ModelBuilder)
/// and owned by exactly one scope. Type declarations introduce a member
/// scope of their own, and functions may introduce a body scope.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub(crate) name: String,
    pub(crate) kind: DeclKind,
    pub(crate) signature: Option<Signature>,
    pub(crate) owner: ScopeId,
    pub(crate) body: Option<ScopeId>,
    pub(crate) span: SourceSpan,
}

impl Declaration {
    /// Simple (unqualified) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    /// Parameter list, present for callable declarations.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// The scope this declaration belongs to.
    pub fn owner(&self) -> ScopeId {
        self.owner
    }

    /// The scope this declaration introduces: the member scope of a type,
    /// or the body scope of a function once one has been added.
    pub fn body(&self) -> Option<ScopeId> {
        self.body
    }

    /// Source location of the declaring construct.
    pub fn span(&self) -> SourceSpan {
        self.span
    }
}
