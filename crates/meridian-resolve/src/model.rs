//! Model construction and the immutable query surface.
//!
//! Construction and querying are separated by a hard barrier:
//! [`ModelBuilder`] is the append-only mutation side driven by the
//! AST-to-model lowering pass, and [`ModelBuilder::build`] checks the
//! structural invariants (most importantly that the inheritance graph is
//! acyclic) before freezing everything into a [`Model`]. All queries live
//! on the frozen side, take `&self`, and never mutate, so one model can
//! serve any number of concurrent readers without locking.

use fxhash::{FxHashMap, FxHashSet};
use miette::SourceSpan;

use crate::decl::{DeclId, DeclKind, Declaration, Signature};
use crate::error::{ResolveError, ResolveResult};
use crate::package::{Module, ModuleId, Package, PackageId};
use crate::scope::{ScopeData, ScopeId, ScopeKind};

/// Append-only construction side of the model.
///
/// Scope, declaration, package, and module ids handed out by a builder are
/// indices into its arenas and are only meaningful for this builder and
/// the model it freezes into.
///
/// The builder requires exclusive access for every mutation. Lowering
/// passes for independent files therefore serialize their appends through
/// the borrow checker; once [`ModelBuilder::build`] has run, the resulting
/// model is free of that restriction.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    modules: Vec<Module>,
    packages: Vec<Package>,
    scopes: Vec<ScopeData>,
    decls: Vec<Declaration>,
    package_index: FxHashMap<ModuleId, FxHashMap<String, PackageId>>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module to the session.
    pub fn add_module(
        &mut self,
        name_parts: &[&str],
        version: Option<&str>,
        span: SourceSpan,
    ) -> ResolveResult<ModuleId> {
        let name = valid_name_parts(name_parts, span)?;
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name,
            version: version.map(str::to_string),
            packages: Vec::new(),
        });
        self.package_index.insert(id, FxHashMap::default());
        Ok(id)
    }

    /// Adds a package to `module` and creates its root scope.
    ///
    /// Package names must be unique within their module.
    pub fn add_package(
        &mut self,
        module: ModuleId,
        name_parts: &[&str],
        span: SourceSpan,
    ) -> ResolveResult<PackageId> {
        let name = valid_name_parts(name_parts, span)?;
        let dotted = name.join(".");
        let index = match self.package_index.get_mut(&module) {
            Some(index) => index,
            None => {
                return Err(ResolveError::InternalError {
                    message: format!("unknown module id {:?}", module),
                    span: Some(span),
                })
            }
        };
        if index.contains_key(&dotted) {
            return Err(ResolveError::DuplicatePackage { name: dotted, span });
        }
        let id = PackageId(self.packages.len() as u32);
        let scope = ScopeId(self.scopes.len() as u32);
        index.insert(dotted, id);
        self.scopes
            .push(ScopeData::new(ScopeKind::Package(id), None, 0, None));
        self.packages.push(Package { name, module, scope });
        self.modules[module.0 as usize].packages.push(id);
        Ok(id)
    }

    /// Root scope of a previously added package.
    pub fn package_scope(&self, package: PackageId) -> ScopeId {
        self.packages[package.0 as usize].scope
    }

    /// The scope a declaration introduces, or its owner for declarations
    /// that do not hold one. Mirrors [`Model::scope_of`] during lowering.
    pub fn scope_of(&self, decl: DeclId) -> ScopeId {
        let d = &self.decls[decl.0 as usize];
        d.body.unwrap_or(d.owner)
    }

    /// Declares a value member of `owner`.
    pub fn declare_value(
        &mut self,
        owner: ScopeId,
        name: &str,
        span: SourceSpan,
    ) -> ResolveResult<DeclId> {
        self.insert_decl(owner, name, DeclKind::Value, None, span)
    }

    /// Declares a function member of `owner` with the given parameter
    /// list. Overloads are legal as long as their signatures differ.
    pub fn declare_function(
        &mut self,
        owner: ScopeId,
        name: &str,
        signature: Signature,
        span: SourceSpan,
    ) -> ResolveResult<DeclId> {
        self.insert_decl(owner, name, DeclKind::Function, Some(signature), span)
    }

    /// Declares a class member of `owner` together with its member scope.
    pub fn declare_class(
        &mut self,
        owner: ScopeId,
        name: &str,
        span: SourceSpan,
    ) -> ResolveResult<DeclId> {
        self.declare_type(owner, name, ScopeKind::Class, span)
    }

    /// Declares an interface member of `owner` together with its member
    /// scope.
    pub fn declare_interface(
        &mut self,
        owner: ScopeId,
        name: &str,
        span: SourceSpan,
    ) -> ResolveResult<DeclId> {
        self.declare_type(owner, name, ScopeKind::Interface, span)
    }

    fn declare_type(
        &mut self,
        owner: ScopeId,
        name: &str,
        kind: ScopeKind,
        span: SourceSpan,
    ) -> ResolveResult<DeclId> {
        let decl = self.insert_decl(owner, name, DeclKind::Type, None, span)?;
        let scope = ScopeId(self.scopes.len() as u32);
        let depth = self.scopes[owner.0 as usize].depth + 1;
        self.scopes
            .push(ScopeData::new(kind, Some(owner), depth, Some(decl)));
        self.decls[decl.0 as usize].body = Some(scope);
        Ok(decl)
    }

    /// Creates the body scope of a function declaration, for lowering its
    /// locals. A function has at most one body.
    pub fn add_function_body(&mut self, function: DeclId) -> ResolveResult<ScopeId> {
        let owner = match self.decls.get(function.0 as usize) {
            Some(d) if d.kind == DeclKind::Function && d.body.is_none() => d.owner,
            Some(d) => {
                return Err(ResolveError::InternalError {
                    message: format!("`{}` cannot take a body scope here", d.name),
                    span: Some(d.span),
                })
            }
            None => {
                return Err(ResolveError::InternalError {
                    message: format!("unknown declaration id {:?}", function),
                    span: None,
                })
            }
        };
        let scope = ScopeId(self.scopes.len() as u32);
        let depth = self.scopes[owner.0 as usize].depth + 1;
        self.scopes
            .push(ScopeData::new(ScopeKind::Function, Some(owner), depth, Some(function)));
        self.decls[function.0 as usize].body = Some(scope);
        Ok(scope)
    }

    /// Creates an anonymous block scope nested in `container`.
    pub fn add_block(&mut self, container: ScopeId) -> ResolveResult<ScopeId> {
        if self.scopes.get(container.0 as usize).is_none() {
            return Err(ResolveError::InternalError {
                message: format!("unknown scope id {:?}", container),
                span: None,
            });
        }
        let scope = ScopeId(self.scopes.len() as u32);
        let depth = self.scopes[container.0 as usize].depth + 1;
        self.scopes
            .push(ScopeData::new(ScopeKind::Block, Some(container), depth, None));
        Ok(scope)
    }

    /// Records that type `ty` directly inherits `supertype`. Edges are
    /// kept in the order they are added; acyclicity is checked at
    /// [`ModelBuilder::build`].
    pub fn add_supertype(&mut self, ty: DeclId, supertype: DeclId) -> ResolveResult<()> {
        let sup_is_type = self
            .decls
            .get(supertype.0 as usize)
            .map_or(false, |d| d.kind == DeclKind::Type);
        if !sup_is_type {
            return Err(ResolveError::InternalError {
                message: format!("supertype {:?} is not a type declaration", supertype),
                span: self.decls.get(supertype.0 as usize).map(|d| d.span),
            });
        }
        let scope = match self.decls.get(ty.0 as usize) {
            Some(d) if d.kind == DeclKind::Type => d.body,
            _ => None,
        };
        match scope {
            Some(scope) => {
                self.scopes[scope.0 as usize].supertypes.push(supertype);
                Ok(())
            }
            None => Err(ResolveError::InternalError {
                message: format!("{:?} is not a type declaration", ty),
                span: self.decls.get(ty.0 as usize).map(|d| d.span),
            }),
        }
    }

    fn insert_decl(
        &mut self,
        owner: ScopeId,
        name: &str,
        kind: DeclKind,
        signature: Option<Signature>,
        span: SourceSpan,
    ) -> ResolveResult<DeclId> {
        if name.is_empty() {
            return Err(ResolveError::InternalError {
                message: "declaration with an empty name".to_string(),
                span: Some(span),
            });
        }
        if self.scopes.get(owner.0 as usize).is_none() {
            return Err(ResolveError::InternalError {
                message: format!("unknown scope id {:?}", owner),
                span: Some(span),
            });
        }
        let previous = self.scopes[owner.0 as usize]
            .named(name)
            .iter()
            .copied()
            .find(|&d| self.decls[d.0 as usize].signature == signature);
        if let Some(previous) = previous {
            return Err(ResolveError::DuplicateDeclaration {
                name: name.to_string(),
                span,
                previous_span: self.decls[previous.0 as usize].span,
            });
        }
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Declaration {
            name: name.to_string(),
            kind,
            signature,
            owner,
            body: None,
            span,
        });
        self.scopes[owner.0 as usize].push_member(name, id);
        Ok(id)
    }

    /// Checks the structural invariants and freezes the model.
    ///
    /// Inheritance cycles are detected here, once per session, before any
    /// inheritance-aware query is possible. Everything else (duplicate
    /// members, duplicate packages, malformed names) is rejected eagerly
    /// by the mutation methods.
    pub fn build(self) -> ResolveResult<Model> {
        self.check_inheritance_cycles()?;
        log::debug!(
            "model frozen: {} modules, {} packages, {} scopes, {} declarations",
            self.modules.len(),
            self.packages.len(),
            self.scopes.len(),
            self.decls.len(),
        );
        Ok(Model {
            modules: self.modules,
            packages: self.packages,
            scopes: self.scopes,
            decls: self.decls,
            package_index: self.package_index,
        })
    }

    fn check_inheritance_cycles(&self) -> ResolveResult<()> {
        let mut state = vec![VisitState::Unvisited; self.decls.len()];
        let mut trail = Vec::new();
        for id in 0..self.decls.len() {
            if self.decls[id].kind == DeclKind::Type && state[id] == VisitState::Unvisited {
                self.visit_supertypes(DeclId(id as u32), &mut state, &mut trail)?;
            }
        }
        Ok(())
    }

    fn visit_supertypes(
        &self,
        decl: DeclId,
        state: &mut [VisitState],
        trail: &mut Vec<DeclId>,
    ) -> ResolveResult<()> {
        let idx = decl.0 as usize;
        match state[idx] {
            VisitState::Done => return Ok(()),
            VisitState::Active => {
                let start = trail.iter().position(|&d| d == decl).unwrap_or(0);
                let mut cycle: Vec<String> = trail[start..]
                    .iter()
                    .map(|&d| self.decls[d.0 as usize].name.clone())
                    .collect();
                cycle.push(self.decls[idx].name.clone());
                return Err(ResolveError::InheritanceCycle {
                    name: self.decls[idx].name.clone(),
                    span: self.decls[idx].span,
                    cycle,
                });
            }
            VisitState::Unvisited => {}
        }
        state[idx] = VisitState::Active;
        trail.push(decl);
        if let Some(scope) = self.decls[idx].body {
            for i in 0..self.scopes[scope.0 as usize].supertypes.len() {
                let sup = self.scopes[scope.0 as usize].supertypes[i];
                self.visit_supertypes(sup, state, trail)?;
            }
        }
        trail.pop();
        state[idx] = VisitState::Done;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Active,
    Done,
}

fn valid_name_parts(parts: &[&str], span: SourceSpan) -> ResolveResult<Vec<String>> {
    if parts.is_empty() || parts.iter().any(|part| part.is_empty()) {
        return Err(ResolveError::MalformedQualifiedName { span });
    }
    Ok(parts.iter().map(|part| part.to_string()).collect())
}

/// Immutable scope model of one analysis session.
///
/// Produced by [`ModelBuilder::build`]. Every query takes `&self` and only
/// allocates transient results, so a frozen model is safe for unrestricted
/// concurrent reads.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) modules: Vec<Module>,
    pub(crate) packages: Vec<Package>,
    pub(crate) scopes: Vec<ScopeData>,
    pub(crate) decls: Vec<Declaration>,
    pub(crate) package_index: FxHashMap<ModuleId, FxHashMap<String, PackageId>>,
}

impl Model {
    /// The declaration behind `id`. Ids must originate from the builder
    /// that produced this model.
    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0 as usize]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    /// Modules in the order they were added to the session.
    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, module)| (ModuleId(i as u32), module))
    }

    /// Packages of the whole session, in creation order.
    pub fn packages(&self) -> impl Iterator<Item = (PackageId, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .map(|(i, package)| (PackageId(i as u32), package))
    }

    /// Looks up a package by dotted name within one module.
    pub fn package_by_name(&self, module: ModuleId, name: &str) -> Option<PackageId> {
        self.package_index.get(&module)?.get(name).copied()
    }

    pub fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0 as usize].kind
    }

    /// The scope lexically containing `scope`, absent at package roots.
    pub fn container(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].container
    }

    /// Nesting depth of `scope`; package roots are at depth 0.
    pub fn depth(&self, scope: ScopeId) -> u32 {
        self.scopes[scope.0 as usize].depth
    }

    /// Directly declared members of `scope`, in declaration order.
    pub fn members(&self, scope: ScopeId) -> &[DeclId] {
        &self.scopes[scope.0 as usize].members
    }

    /// Distinct member names of `scope` in first-declaration order,
    /// ignoring signatures. A derived projection; overloads collapse to
    /// one entry.
    pub fn declared_names(&self, scope: ScopeId) -> Vec<&str> {
        let data = &self.scopes[scope.0 as usize];
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut names = Vec::new();
        for &decl in &data.members {
            let name = self.decls[decl.0 as usize].name.as_str();
            if seen.insert(name) {
                names.push(name);
            }
        }
        names
    }

    /// The scope a declaration introduces, or its owner for declarations
    /// that do not hold one.
    pub fn scope_of(&self, decl: DeclId) -> ScopeId {
        let d = &self.decls[decl.0 as usize];
        d.body.unwrap_or(d.owner)
    }

    /// The declaration that introduced `scope`, absent for package roots
    /// and anonymous blocks.
    pub fn owner_declaration(&self, scope: ScopeId) -> Option<DeclId> {
        self.scopes[scope.0 as usize].owner_decl
    }

    /// Type declarations `scope`'s type directly inherits from, in the
    /// order their edges were added.
    pub fn supertypes(&self, scope: ScopeId) -> &[DeclId] {
        &self.scopes[scope.0 as usize].supertypes
    }

    /// Fully qualified name of `scope`: the package's dotted name, then
    /// `::`, then the dot-joined path of named scopes, root first. A
    /// package root renders as just its dotted name; anonymous blocks add
    /// no segment.
    ///
    /// `meridian.collections::List.iterator` names the body scope of
    /// `iterator` inside class `List` of package `meridian.collections`.
    pub fn qualified_name(&self, scope: ScopeId) -> String {
        let mut path: Vec<&str> = Vec::new();
        let mut current = scope;
        loop {
            let data = &self.scopes[current.0 as usize];
            if let ScopeKind::Package(package) = data.kind {
                let root = self.packages[package.0 as usize].name_as_string();
                if path.is_empty() {
                    return root;
                }
                path.reverse();
                return format!("{}::{}", root, path.join("."));
            }
            if let Some(decl) = data.owner_decl {
                path.push(self.decls[decl.0 as usize].name.as_str());
            }
            match data.container {
                Some(container) => current = container,
                None => {
                    // Every scope is rooted in a package; reaching here
                    // means the id came from a different model.
                    path.reverse();
                    return path.join(".");
                }
            }
        }
    }

    /// Fully qualified name of a declaration, e.g.
    /// `meridian.collections::List.size`.
    pub fn qualified_decl_name(&self, decl: DeclId) -> String {
        let d = &self.decls[decl.0 as usize];
        let owner = self.qualified_name(d.owner);
        if matches!(self.scopes[d.owner.0 as usize].kind, ScopeKind::Package(_)) {
            format!("{}::{}", owner, d.name)
        } else {
            format!("{}.{}", owner, d.name)
        }
    }
}
