//! Modules and packages: the two-level global namespace.
//!
//! A session holds an ordered set of modules; each module owns an ordered
//! set of packages, and each package roots a scope holding its toplevel
//! declarations. Package names are dotted segment sequences, unique within
//! their module.

use std::fmt;

use crate::scope::ScopeId;

/// Identifies a [`Module`] within the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub u32);

/// Identifies a [`Package`] within the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(pub u32);

/// A distribution unit grouping packages under one versioned name.
///
/// Lives for one full compilation session.
#[derive(Clone)]
pub struct Module {
    pub(crate) name: Vec<String>,
    pub(crate) version: Option<String>,
    pub(crate) packages: Vec<PackageId>,
}

impl Module {
    /// Name segments, e.g. `["meridian", "collections"]`.
    pub fn name_parts(&self) -> &[String] {
        &self.name
    }

    /// Dotted name, e.g. `meridian.collections`.
    pub fn name_as_string(&self) -> String {
        self.name.join(".")
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Packages of this module, in the order they were added.
    pub fn packages(&self) -> &[PackageId] {
        &self.packages
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "Module[{}/{}]", self.name_as_string(), version),
            None => write!(f, "Module[{}]", self.name_as_string()),
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A namespace within a module, rooted at its own scope.
#[derive(Clone)]
pub struct Package {
    pub(crate) name: Vec<String>,
    pub(crate) module: ModuleId,
    pub(crate) scope: ScopeId,
}

impl Package {
    /// Name segments, e.g. `["meridian", "collections", "list"]`.
    pub fn name_parts(&self) -> &[String] {
        &self.name
    }

    /// Dotted name, e.g. `meridian.collections.list`.
    pub fn name_as_string(&self) -> String {
        self.name.join(".")
    }

    /// The module this package belongs to.
    pub fn module(&self) -> ModuleId {
        self.module
    }

    /// Root scope holding the package's toplevel declarations.
    pub fn scope(&self) -> ScopeId {
        self.scope
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Package[{}]", self.name_as_string())
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
