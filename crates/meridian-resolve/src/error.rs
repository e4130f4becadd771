use thiserror::Error;
use miette::{Diagnostic, SourceSpan};

/// Convenience alias for fallible model operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while constructing the model or resolving references
/// against it.
///
/// Plain "not found" is not an error: lookups report it as `Ok(None)` so
/// that callers can distinguish a recoverable unresolved reference from an
/// actual failure.
#[derive(Debug, Error, Diagnostic, Clone, Hash, PartialEq, Eq)]
pub enum ResolveError {
    /// Indicates that a name matched two or more declarations that are
    /// equally applicable, with none strictly more specific than the rest.
    #[error("Ambiguous reference: `{name}` could refer to multiple declarations")]
    #[diagnostic(code(meridian_resolve::ambiguous_reference))]
    AmbiguousReference {
        /// The ambiguous name.
        name: String,
        #[label("referenced here")]
        span: SourceSpan,
        /// Qualified renderings of every surviving candidate.
        candidates: Vec<String>,
    },

    /// Indicates that a type declaration inherits from itself, directly or
    /// through a chain of supertypes. Fatal for the module: inheritance-aware
    /// queries are not permitted until the graph is acyclic.
    #[error("Inheritance cycle detected involving `{name}`")]
    #[diagnostic(code(meridian_resolve::inheritance_cycle))]
    InheritanceCycle {
        /// The declaration at which the cycle was detected.
        name: String,
        #[label("declared here")]
        span: SourceSpan,
        /// Declaration names along the cycle, repeating the closing name last.
        cycle: Vec<String>,
    },

    /// Indicates a module or package name with no segments, or with an
    /// empty segment. A construction-time invariant violation.
    #[error("Malformed qualified name: expected one or more non-empty dot-separated segments")]
    #[diagnostic(code(meridian_resolve::malformed_qualified_name))]
    MalformedQualifiedName {
        #[label("declared here")]
        span: SourceSpan,
    },

    /// Indicates that a scope already holds a declaration with the same
    /// name and an identical signature, or that a binding frame already
    /// binds the name.
    #[error("Duplicate declaration: `{name}` is declared more than once with the same signature")]
    #[diagnostic(code(meridian_resolve::duplicate_declaration))]
    DuplicateDeclaration {
        /// The redeclared name.
        name: String,
        #[label("current declaration here")]
        span: SourceSpan,
        #[label("previously declared here")]
        previous_span: SourceSpan,
    },

    /// Indicates that a module already contains a package with the same
    /// qualified name.
    #[error("Duplicate package: `{name}` is already present in this module")]
    #[diagnostic(code(meridian_resolve::duplicate_package))]
    DuplicatePackage {
        /// The dotted package name.
        name: String,
        #[label("declared here")]
        span: SourceSpan,
    },

    /// Indicates that two imports in the same unit introduce the same
    /// visible alias.
    #[error("Duplicate import: `{alias}` is already imported in this unit")]
    #[diagnostic(code(meridian_resolve::duplicate_import))]
    DuplicateImport {
        /// The clashing alias.
        alias: String,
        #[label("imported again here")]
        span: SourceSpan,
        #[label("previously imported here")]
        previous_span: SourceSpan,
    },

    /// A catch-all for misuse of the model API, indicating a bug in the
    /// calling lowering pass rather than a problem in user source.
    #[error("Internal model error: {message}")]
    #[diagnostic(code(meridian_resolve::internal_error))]
    InternalError {
        /// The detailed error message.
        message: String,
        /// Optional source span for context, if available.
        span: Option<SourceSpan>,
    },
}

/// Non-fatal findings reported alongside successful analysis.
#[derive(Debug, Error, Diagnostic, Clone, Hash, PartialEq, Eq)]
pub enum ResolveWarning {
    /// Indicates that a parameter or local binding hides a binding with
    /// the same name in an enclosing frame of the same unit.
    #[error("Shadowed binding: `{name}` shadows an earlier binding")]
    #[diagnostic(code(meridian_resolve::shadowed_binding))]
    ShadowedBinding {
        /// The shadowed name.
        name: String,
        #[label("original binding")]
        original_span: SourceSpan,
        #[label("shadowing binding")]
        shadow_span: SourceSpan,
    },

    /// Indicates an import alias that the lowering pass never marked as
    /// referenced.
    #[error("Unused import: `{alias}` is imported but never used")]
    #[diagnostic(code(meridian_resolve::unused_import))]
    UnusedImport {
        /// The unused alias.
        alias: String,
        #[label("unused import")]
        span: SourceSpan,
    },
}
