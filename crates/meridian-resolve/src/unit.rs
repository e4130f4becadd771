//! Per-file analysis state: import aliases and transient binding frames.

use fxhash::FxHashMap;
use miette::SourceSpan;

use crate::decl::DeclId;
use crate::error::{ResolveError, ResolveResult, ResolveWarning};
use crate::package::PackageId;

/// One alias brought into a unit by an import statement.
///
/// Tracks usage so that imports never referenced during the file's
/// analysis can be reported.
#[derive(Debug, Clone)]
pub struct Import {
    /// Name the declaration is visible under in this unit: the declared
    /// name, or the alias if the import renames it.
    pub alias: String,
    /// The imported declaration.
    pub target: DeclId,
    /// Span of the importing statement item.
    pub span: SourceSpan,
    used: bool,
}

impl Import {
    /// Whether the lowering pass has marked this alias as referenced.
    pub fn is_used(&self) -> bool {
        self.used
    }
}

#[derive(Debug, Clone, Copy)]
struct LocalBinding {
    decl: DeclId,
    span: SourceSpan,
}

/// Analysis context of a single source file.
///
/// A unit belongs to one package and carries the file's imports plus a
/// stack of binding frames for parameters and locals. The frames make
/// names visible while the file's bodies are still being lowered, before
/// their scopes are queryable through the model, and they give parameter
/// bindings precedence over members during lookup.
///
/// Units are transient: created for one file's analysis pass and discarded
/// afterwards.
#[derive(Debug, Clone)]
pub struct Unit {
    filename: String,
    package: PackageId,
    imports: Vec<Import>,
    import_index: FxHashMap<String, usize>,
    frames: Vec<FxHashMap<String, LocalBinding>>,
}

impl Unit {
    pub fn new(filename: impl Into<String>, package: PackageId) -> Self {
        Unit {
            filename: filename.into(),
            package,
            imports: Vec::new(),
            import_index: FxHashMap::default(),
            frames: Vec::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The package this unit's declarations belong to.
    pub fn package(&self) -> PackageId {
        self.package
    }

    /// Registers an import alias. Two imports in one unit may not share
    /// an alias.
    pub fn add_import(
        &mut self,
        alias: impl Into<String>,
        target: DeclId,
        span: SourceSpan,
    ) -> ResolveResult<()> {
        let alias = alias.into();
        if let Some(&slot) = self.import_index.get(&alias) {
            return Err(ResolveError::DuplicateImport {
                alias,
                span,
                previous_span: self.imports[slot].span,
            });
        }
        self.import_index.insert(alias.clone(), self.imports.len());
        self.imports.push(Import {
            alias,
            target,
            span,
            used: false,
        });
        Ok(())
    }

    /// The declaration imported under `name`, if any.
    pub fn imported(&self, name: &str) -> Option<DeclId> {
        self.import_index
            .get(name)
            .map(|&slot| self.imports[slot].target)
    }

    /// Imports in declaration order.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.imports.iter()
    }

    /// Marks the alias as referenced so it is not reported unused.
    pub fn mark_import_used(&mut self, name: &str) {
        if let Some(&slot) = self.import_index.get(name) {
            self.imports[slot].used = true;
        }
    }

    /// One warning per alias never marked as used.
    pub fn unused_imports(&self) -> Vec<ResolveWarning> {
        self.imports
            .iter()
            .filter(|import| !import.used)
            .map(|import| ResolveWarning::UnusedImport {
                alias: import.alias.clone(),
                span: import.span,
            })
            .collect()
    }

    /// Opens a binding frame, on entry to a parameter list or block.
    pub fn push_frame(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    /// Closes the innermost binding frame, dropping its bindings.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Binds `name` to a parameter or local declaration in the innermost
    /// frame.
    ///
    /// Rebinding a name within the same frame is an error; hiding a
    /// binding of an enclosing frame is legal and reported through
    /// `warnings`.
    pub fn bind(
        &mut self,
        name: impl Into<String>,
        decl: DeclId,
        span: SourceSpan,
        warnings: &mut Vec<ResolveWarning>,
    ) -> ResolveResult<()> {
        let name = name.into();
        let top = match self.frames.len().checked_sub(1) {
            Some(top) => top,
            None => {
                return Err(ResolveError::InternalError {
                    message: format!("binding `{}` outside any frame", name),
                    span: Some(span),
                })
            }
        };
        if let Some(existing) = self.frames[top].get(&name) {
            return Err(ResolveError::DuplicateDeclaration {
                name,
                span,
                previous_span: existing.span,
            });
        }
        if let Some(outer) = self.frames[..top].iter().rev().find_map(|f| f.get(&name)) {
            warnings.push(ResolveWarning::ShadowedBinding {
                name: name.clone(),
                original_span: outer.span,
                shadow_span: span,
            });
        }
        self.frames[top].insert(name, LocalBinding { decl, span });
        Ok(())
    }

    /// Innermost binding for `name`, if any frame holds one.
    pub fn binding(&self, name: &str) -> Option<DeclId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).map(|binding| binding.decl))
    }

    /// Bindings of every frame, innermost frame first. Used by completion.
    pub(crate) fn bindings(&self) -> impl Iterator<Item = (&str, DeclId)> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().map(|(name, b)| (name.as_str(), b.decl)))
    }
}
