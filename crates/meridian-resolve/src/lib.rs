#![doc = include_str!("../README.md")]

pub mod decl;
pub mod error;
pub mod model;
pub mod package;
pub mod proximity;
pub mod scope;
pub mod ty;
pub mod unit;

mod member;

pub use decl::{DeclId, DeclKind, Declaration, Signature};
pub use error::{ResolveError, ResolveResult, ResolveWarning};
pub use model::{Model, ModelBuilder};
pub use package::{Module, ModuleId, Package, PackageId};
pub use proximity::{DeclarationWithProximity, MatchCase, MatchOptions};
pub use scope::{ScopeId, ScopeKind};
pub use ty::{IdentityOracle, TypeId, TypeOracle};
pub use unit::{Import, Unit};
