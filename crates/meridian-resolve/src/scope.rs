//! Scopes: the lexical regions that own declarations.
//!
//! Every scope lives in the arena of its [`Model`](crate::Model) and is
//! addressed by [`ScopeId`]. The container link is navigational only; it
//! never owns the container, so the chain can be walked freely in either
//! construction or query phase.

use fxhash::FxHashMap;

use crate::decl::DeclId;
use crate::package::PackageId;

/// Identifies a scope within the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u32);

/// What kind of lexical region a scope is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Root scope of a package; container chains end here.
    Package(PackageId),
    /// Member scope of a class declaration.
    Class,
    /// Member scope of an interface declaration.
    Interface,
    /// Body scope of a function.
    Function,
    /// An anonymous nested block.
    Block,
}

impl ScopeKind {
    /// True for scopes that participate in inheritance, i.e. class and
    /// interface member scopes.
    pub fn is_type(self) -> bool {
        matches!(self, ScopeKind::Class | ScopeKind::Interface)
    }
}

/// Arena payload of one scope.
///
/// Members are kept in declaration order next to a by-name index: lookup
/// goes through the index, completion and diagnostics iterate the ordered
/// list so output stays deterministic.
#[derive(Debug, Clone)]
pub(crate) struct ScopeData {
    pub(crate) kind: ScopeKind,
    pub(crate) container: Option<ScopeId>,
    pub(crate) depth: u32,
    /// The declaration that introduced this scope, absent for package roots.
    pub(crate) owner_decl: Option<DeclId>,
    /// Directly declared members, in declaration order.
    pub(crate) members: Vec<DeclId>,
    pub(crate) by_name: FxHashMap<String, Vec<DeclId>>,
    /// Type declarations this scope's type directly inherits from. Empty
    /// for non-type scopes.
    pub(crate) supertypes: Vec<DeclId>,
}

impl ScopeData {
    pub(crate) fn new(
        kind: ScopeKind,
        container: Option<ScopeId>,
        depth: u32,
        owner_decl: Option<DeclId>,
    ) -> Self {
        ScopeData {
            kind,
            container,
            depth,
            owner_decl,
            members: Vec::new(),
            by_name: FxHashMap::default(),
            supertypes: Vec::new(),
        }
    }

    pub(crate) fn push_member(&mut self, name: &str, decl: DeclId) {
        self.members.push(decl);
        self.by_name.entry(name.to_string()).or_default().push(decl);
    }

    /// Directly declared members sharing `name`, in declaration order.
    pub(crate) fn named(&self, name: &str) -> &[DeclId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
