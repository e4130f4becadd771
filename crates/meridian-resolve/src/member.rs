//! Member lookup and overload resolution over a frozen model.
//!
//! Lookup follows the declared shape of the program. Candidates come from
//! the queried scope's own members and, for class and interface scopes,
//! from inherited members at a lower priority; the escalating variants
//! then walk the lexical container chain and finally consult the calling
//! unit's imports. Signature matching runs in two passes: filter by
//! applicability, then rank the survivors by specificity, reporting an
//! explicit ambiguity when no candidate wins.

use std::collections::VecDeque;

use fxhash::FxHashSet;
use miette::SourceSpan;

use crate::decl::{DeclId, Signature};
use crate::error::{ResolveError, ResolveResult};
use crate::model::Model;
use crate::scope::ScopeId;
use crate::ty::{TypeId, TypeOracle};
use crate::unit::Unit;

/// A declaration found during candidate collection, with its inheritance
/// distance from the queried scope. Zero hops means declared directly in
/// it.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    decl: DeclId,
    hops: u32,
}

impl Model {
    /// Resolves `name` among the members of `scope` itself plus, for type
    /// scopes, its inherited members. Never escapes to the container.
    ///
    /// `signature` carries the argument types of a call site, or `None`
    /// for a plain name reference. `allows_variadic` must be set when the
    /// call shape may spread across a variadic parameter list; a variadic
    /// declaration still matches its own declared parameter list exactly
    /// without the flag.
    ///
    /// Returns `Ok(None)` when nothing matches. Two or more equally good
    /// matches are an [`ResolveError::AmbiguousReference`].
    pub fn direct_member(
        &self,
        scope: ScopeId,
        name: &str,
        signature: Option<&[TypeId]>,
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        let candidates = self.collect_candidates(scope, name);
        self.decide(name, &candidates, signature, allows_variadic, oracle, site)
    }

    /// Resolves `name` starting at `scope` and escalating outward through
    /// lexical containers until some scope yields a conclusive answer.
    ///
    /// A unique match and an ambiguity are both conclusive: an ambiguous
    /// scope stops the walk and reports, rather than letting an outer
    /// declaration win over a broken inner one.
    pub fn member(
        &self,
        scope: ScopeId,
        name: &str,
        signature: Option<&[TypeId]>,
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        log::trace!("member lookup `{}` from scope {:?}", name, scope);
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(found) =
                self.direct_member(s, name, signature, allows_variadic, oracle, site)?
            {
                return Ok(Some(found));
            }
            current = self.container(s);
        }
        Ok(None)
    }

    /// [`Model::member`] in the context of a unit: the unit's parameter
    /// and local bindings are consulted before any scope, and its import
    /// aliases after the package root is exhausted.
    ///
    /// Bindings and imports match by name alone; validating the call
    /// shape against whatever they denote is the checker's concern.
    pub fn member_or_parameter(
        &self,
        unit: &Unit,
        scope: ScopeId,
        name: &str,
        signature: Option<&[TypeId]>,
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        if let Some(bound) = unit.binding(name) {
            return Ok(Some(bound));
        }
        if let Some(found) = self.member(scope, name, signature, allows_variadic, oracle, site)? {
            return Ok(Some(found));
        }
        Ok(unit.imported(name))
    }

    /// [`Model::direct_member`] with the unit's bindings consulted first.
    /// Imports are not consulted; they only participate in the escalating
    /// [`Model::member_or_parameter`], being a package-level concern.
    pub fn direct_member_or_parameter(
        &self,
        unit: &Unit,
        scope: ScopeId,
        name: &str,
        signature: Option<&[TypeId]>,
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        if let Some(bound) = unit.binding(name) {
            return Ok(Some(bound));
        }
        self.direct_member(scope, name, signature, allows_variadic, oracle, site)
    }

    /// Resolves `package::name` from the unit's viewpoint: the unit's own
    /// module is searched for the package first, then the remaining
    /// modules in session order. The member lookup itself is direct;
    /// qualified references never escalate through containers.
    pub fn qualified_member(
        &self,
        unit: &Unit,
        package: &str,
        name: &str,
        signature: Option<&[TypeId]>,
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        let home = self.package(unit.package()).module();
        let target = self.package_by_name(home, package).or_else(|| {
            self.modules()
                .filter(|&(id, _)| id != home)
                .find_map(|(id, _)| self.package_by_name(id, package))
        });
        match target {
            Some(found) => {
                let root = self.package(found).scope();
                self.direct_member(root, name, signature, allows_variadic, oracle, site)
            }
            None => Ok(None),
        }
    }

    /// True if `decl` is visible in `scope` only through inheritance,
    /// i.e. its owner is a strict supertype of `scope`'s type. Always
    /// false for `scope`'s own members and for non-type scopes.
    pub fn is_inherited(&self, scope: ScopeId, decl: DeclId) -> bool {
        let owner = self.declaration(decl).owner();
        owner != scope
            && self
                .inherited_scopes(scope)
                .iter()
                .any(|&(inherited, _)| inherited == owner)
    }

    /// The type declaration, among `scope`'s own type and its supertypes,
    /// that actually declares `decl`. `None` when `decl` is not visible
    /// here or `scope` is not a type scope. Backs diagnostics of the form
    /// "member `size` inherited from `Collection`".
    pub fn inheriting_declaration(&self, scope: ScopeId, decl: DeclId) -> Option<DeclId> {
        if !self.scope_kind(scope).is_type() {
            return None;
        }
        let owner = self.declaration(decl).owner();
        if owner == scope {
            return self.owner_declaration(scope);
        }
        self.inherited_scopes(scope)
            .into_iter()
            .find(|&(inherited, _)| inherited == owner)
            .and_then(|(inherited, _)| self.owner_declaration(inherited))
    }

    /// Qualified rendering of a declaration for diagnostics, with its
    /// parameter list when it has one, e.g. `demo.core::Job.log(Object...)`.
    pub fn describe_declaration(&self, decl: DeclId, oracle: &dyn TypeOracle) -> String {
        let d = self.declaration(decl);
        let qualified = self.qualified_decl_name(decl);
        match d.signature() {
            None => qualified,
            Some(sig) => {
                let mut parts: Vec<String> =
                    sig.params().iter().map(|&ty| oracle.describe(ty)).collect();
                if sig.is_variadic() {
                    if let Some(last) = parts.last_mut() {
                        last.push_str("...");
                    }
                }
                format!("{}({})", qualified, parts.join(", "))
            }
        }
    }

    /// Supertype member scopes of `scope` in breadth-first order with
    /// their hop distance, deduplicated on the first (nearest) visit.
    /// Empty for non-type scopes.
    pub(crate) fn inherited_scopes(&self, scope: ScopeId) -> Vec<(ScopeId, u32)> {
        if !self.scope_kind(scope).is_type() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut seen: FxHashSet<ScopeId> = FxHashSet::default();
        seen.insert(scope);
        let mut queue: VecDeque<(ScopeId, u32)> = self
            .supertypes(scope)
            .iter()
            .filter_map(|&sup| self.declaration(sup).body().map(|body| (body, 1)))
            .collect();
        while let Some((current, hops)) = queue.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            out.push((current, hops));
            for &sup in self.supertypes(current) {
                if let Some(body) = self.declaration(sup).body() {
                    queue.push_back((body, hops + 1));
                }
            }
        }
        out
    }

    fn collect_candidates(&self, scope: ScopeId, name: &str) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = self.scopes[scope.0 as usize]
            .named(name)
            .iter()
            .map(|&decl| Candidate { decl, hops: 0 })
            .collect();
        for (inherited, hops) in self.inherited_scopes(scope) {
            for &decl in self.scopes[inherited.0 as usize].named(name) {
                out.push(Candidate { decl, hops });
            }
        }
        out
    }

    fn decide(
        &self,
        name: &str,
        candidates: &[Candidate],
        signature: Option<&[TypeId]>,
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        match signature {
            None => self.decide_by_name(name, candidates, oracle, site),
            Some(args) => {
                self.decide_by_signature(name, candidates, args, allows_variadic, oracle, site)
            }
        }
    }

    /// Plain name reference: a unique candidate in the nearest populated
    /// tier wins, anything wider is ambiguous. Overloads can only be told
    /// apart by signature, so a bare name over several of them must not
    /// pick one arbitrarily.
    fn decide_by_name(
        &self,
        name: &str,
        candidates: &[Candidate],
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        let mut tier: Vec<DeclId> = candidates
            .iter()
            .filter(|c| c.hops == 0)
            .map(|c| c.decl)
            .collect();
        if tier.is_empty() {
            if let Some(nearest) = candidates.iter().map(|c| c.hops).min() {
                tier = candidates
                    .iter()
                    .filter(|c| c.hops == nearest)
                    .map(|c| c.decl)
                    .collect();
            }
        }
        match tier.len() {
            0 => Ok(None),
            1 => Ok(Some(tier[0])),
            _ => Err(self.ambiguous(name, &tier, oracle, site)),
        }
    }

    /// Call-shaped reference: filter by applicability, then rank the
    /// survivors by specificity. Directly declared members form their own
    /// tier, so an applicable direct member hides every inherited one
    /// even when the inherited signature would match better.
    fn decide_by_signature(
        &self,
        name: &str,
        candidates: &[Candidate],
        args: &[TypeId],
        allows_variadic: bool,
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveResult<Option<DeclId>> {
        let applicable = |c: &Candidate| {
            self.declaration(c.decl)
                .signature()
                .map_or(false, |sig| is_applicable(sig, args, allows_variadic, oracle))
        };
        let mut pool: Vec<Candidate> = candidates
            .iter()
            .copied()
            .filter(|c| c.hops == 0 && applicable(c))
            .collect();
        if pool.is_empty() {
            pool = candidates
                .iter()
                .copied()
                .filter(|c| c.hops > 0 && applicable(c))
                .collect();
        }
        if pool.is_empty() {
            return Ok(None);
        }
        let maximal = self.most_specific(&pool, oracle);
        if maximal.len() == 1 {
            return Ok(Some(maximal[0].decl));
        }
        // Equally specific survivors: a strictly nearer supertype still
        // wins, otherwise the tie is reported.
        let nearest = maximal.iter().map(|c| c.hops).min().unwrap_or(0);
        let at_nearest: Vec<&Candidate> =
            maximal.iter().filter(|c| c.hops == nearest).collect();
        if at_nearest.len() == 1 {
            return Ok(Some(at_nearest[0].decl));
        }
        let listed: Vec<DeclId> = maximal.iter().map(|c| c.decl).collect();
        Err(self.ambiguous(name, &listed, oracle, site))
    }

    /// The applicable candidates that no other candidate strictly beats.
    fn most_specific(&self, pool: &[Candidate], oracle: &dyn TypeOracle) -> Vec<Candidate> {
        pool.iter()
            .copied()
            .filter(|&c| {
                pool.iter()
                    .all(|&other| other.decl == c.decl || !self.beats(other.decl, c.decl, oracle))
            })
            .collect()
    }

    /// Whether `a`'s signature is strictly more specific than `b`'s.
    fn beats(&self, a: DeclId, b: DeclId, oracle: &dyn TypeOracle) -> bool {
        match (
            self.declaration(a).signature(),
            self.declaration(b).signature(),
        ) {
            (Some(sig_a), Some(sig_b)) => more_specific(sig_a, sig_b, oracle),
            _ => false,
        }
    }

    fn ambiguous(
        &self,
        name: &str,
        candidates: &[DeclId],
        oracle: &dyn TypeOracle,
        site: SourceSpan,
    ) -> ResolveError {
        log::trace!(
            "ambiguous reference `{}`: {} candidates",
            name,
            candidates.len()
        );
        ResolveError::AmbiguousReference {
            name: name.to_string(),
            span: site,
            candidates: candidates
                .iter()
                .map(|&decl| self.describe_declaration(decl, oracle))
                .collect(),
        }
    }
}

/// Whether `sig` accepts a call with the given argument types.
///
/// A fixed-arity signature requires the exact declared arity, positionally
/// assignable. A variadic signature additionally accepts, when
/// `allows_variadic` is set, any argument count from its prefix length
/// upward with the trailing arguments assignable to its element type.
fn is_applicable(
    sig: &Signature,
    args: &[TypeId],
    allows_variadic: bool,
    oracle: &dyn TypeOracle,
) -> bool {
    if sig.is_variadic() && allows_variadic {
        let prefix = sig.fixed_prefix();
        let element = match sig.variadic_element() {
            Some(element) => element,
            None => return false,
        };
        args.len() >= prefix.len()
            && prefix
                .iter()
                .zip(args)
                .all(|(&param, &arg)| assignable(arg, param, oracle))
            && args[prefix.len()..]
                .iter()
                .all(|&arg| assignable(arg, element, oracle))
    } else {
        args.len() == sig.params().len()
            && sig
                .params()
                .iter()
                .zip(args)
                .all(|(&param, &arg)| assignable(arg, param, oracle))
    }
}

/// Strict specificity ordering between two applicable signatures: a fixed
/// arity beats a variadic one, otherwise the parameters must be
/// assignable position by position one way and not the other.
fn more_specific(a: &Signature, b: &Signature, oracle: &dyn TypeOracle) -> bool {
    match (a.is_variadic(), b.is_variadic()) {
        (false, true) => true,
        (true, false) => false,
        _ => at_least_as_specific(a, b, oracle) && !at_least_as_specific(b, a, oracle),
    }
}

fn at_least_as_specific(a: &Signature, b: &Signature, oracle: &dyn TypeOracle) -> bool {
    let positions = a.params().len().max(b.params().len());
    (0..positions).all(|i| match (a.param_at(i), b.param_at(i)) {
        (Some(param_a), Some(param_b)) => assignable(param_a, param_b, oracle),
        _ => false,
    })
}

fn assignable(from: TypeId, to: TypeId, oracle: &dyn TypeOracle) -> bool {
    from == to || oracle.is_assignable(from, to)
}
