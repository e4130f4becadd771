//! Prefix completion over the model: visible declarations ranked by
//! distance from the query scope.
//!
//! Completion reuses the same traversal as member lookup (lexical
//! containers plus inheritance) but never fails: a name that matches
//! nothing is simply absent from the result map.

use std::collections::BTreeMap;

use crate::decl::{DeclId, DeclKind};
use crate::model::Model;
use crate::scope::{ScopeId, ScopeKind};
use crate::unit::Unit;

/// How completion compares a candidate name against the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchCase {
    /// Exact prefix match.
    #[default]
    Sensitive,
    /// ASCII case-insensitive prefix match.
    Insensitive,
}

/// Completion configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub case: MatchCase,
}

/// A completion candidate with its distance from the query scope.
///
/// Distance counts lexical containers walked plus inheritance hops taken;
/// members of the queried scope itself are at distance 0. Recomputed per
/// query, never stored in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationWithProximity {
    pub declaration: DeclId,
    pub proximity: u32,
}

impl Model {
    /// Collects every visible declaration whose name starts with
    /// `prefix`, keyed by the visible name and capped at `max_proximity`.
    ///
    /// For each name only the best entry survives: nearer wins, and on
    /// equal distance types beat functions beat values. The map iterates
    /// in name order, so output is deterministic for a given model.
    ///
    /// When `unit` is given, its binding frames participate at distance 0
    /// and its import aliases at the distance of the package root, keyed
    /// by alias rather than by the imported declaration's name.
    pub fn matching_declarations(
        &self,
        unit: Option<&Unit>,
        scope: ScopeId,
        prefix: &str,
        max_proximity: u32,
        options: &MatchOptions,
    ) -> BTreeMap<String, DeclarationWithProximity> {
        let mut results = BTreeMap::new();
        if let Some(unit) = unit {
            for (name, decl) in unit.bindings() {
                self.consider(&mut results, name, decl, 0, prefix, max_proximity, options);
            }
        }
        let mut distance = 0u32;
        let mut current = Some(scope);
        while let Some(s) = current {
            for &decl in self.members(s) {
                let name = self.declaration(decl).name();
                self.consider(&mut results, name, decl, distance, prefix, max_proximity, options);
            }
            for (inherited, hops) in self.inherited_scopes(s) {
                for &decl in self.members(inherited) {
                    let name = self.declaration(decl).name();
                    self.consider(
                        &mut results,
                        name,
                        decl,
                        distance + hops,
                        prefix,
                        max_proximity,
                        options,
                    );
                }
            }
            if let (ScopeKind::Package(_), Some(unit)) = (self.scope_kind(s), unit) {
                for import in unit.imports() {
                    self.consider(
                        &mut results,
                        &import.alias,
                        import.target,
                        distance,
                        prefix,
                        max_proximity,
                        options,
                    );
                }
            }
            current = self.container(s);
            distance += 1;
        }
        log::trace!(
            "completion `{}` from {:?}: {} names within {}",
            prefix,
            scope,
            results.len(),
            max_proximity,
        );
        results
    }

    #[allow(clippy::too_many_arguments)]
    fn consider(
        &self,
        results: &mut BTreeMap<String, DeclarationWithProximity>,
        name: &str,
        decl: DeclId,
        proximity: u32,
        prefix: &str,
        max_proximity: u32,
        options: &MatchOptions,
    ) {
        if proximity > max_proximity || !prefix_matches(name, prefix, options.case) {
            return;
        }
        let entry = DeclarationWithProximity {
            declaration: decl,
            proximity,
        };
        let replace = match results.get(name) {
            None => true,
            Some(&existing) => self.better(entry, existing),
        };
        if replace {
            results.insert(name.to_string(), entry);
        }
    }

    /// Whether `a` should replace `b` as the surviving entry for a name.
    fn better(&self, a: DeclarationWithProximity, b: DeclarationWithProximity) -> bool {
        if a.proximity != b.proximity {
            return a.proximity < b.proximity;
        }
        kind_rank(self.declaration(a.declaration).kind())
            < kind_rank(self.declaration(b.declaration).kind())
    }
}

fn kind_rank(kind: DeclKind) -> u8 {
    match kind {
        DeclKind::Type => 0,
        DeclKind::Function => 1,
        DeclKind::Value => 2,
    }
}

fn prefix_matches(name: &str, prefix: &str, case: MatchCase) -> bool {
    match case {
        MatchCase::Sensitive => name.starts_with(prefix),
        MatchCase::Insensitive => {
            let mut name_chars = name.chars();
            prefix.chars().all(|p| {
                name_chars
                    .next()
                    .map_or(false, |n| n.eq_ignore_ascii_case(&p))
            })
        }
    }
}
