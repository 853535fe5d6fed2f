//! Solution sets.
//!
//! A solution set is a functional, inverse-functional map from variables to
//! polynomials. The engine keeps two: the regular set `R` (non-slack
//! left-hand sides) and the tableau `T` (slack left-hand sides, slack-only
//! right-hand sides, nonnegative constant parts). Derived indices are
//! maintained incrementally on every install/remove:
//!
//! - `dep`: for each variable, the left-hand sides whose right-hand side
//!   mentions it;
//! - `consts`: left-hand sides bound to a rational constant;
//! - tableau only: `zeros` (bindings with zero constant part) and `negdep`
//!   (for each variable, the rows where it occurs negatively).

use std::collections::{BTreeSet, HashMap};

use crate::justify::Deps;
use crate::term::poly::Poly;
use crate::term::var::Var;

#[derive(Debug, Clone)]
pub struct SolutionSet {
    tableau: bool,
    find: HashMap<Var, (Poly, Deps)>,
    inv: HashMap<Poly, Var>,
    dep: HashMap<Var, BTreeSet<Var>>,
    consts: BTreeSet<Var>,
    zeros: BTreeSet<Var>,
    negdep: HashMap<Var, BTreeSet<Var>>,
}

impl SolutionSet {
    /// The regular solution set `R`.
    pub fn regular() -> Self {
        Self::new(false)
    }

    /// The tableau `T`, with the feasibility and restrictedness checks on.
    pub fn tableau() -> Self {
        Self::new(true)
    }

    fn new(tableau: bool) -> Self {
        SolutionSet {
            tableau,
            find: HashMap::new(),
            inv: HashMap::new(),
            dep: HashMap::new(),
            consts: BTreeSet::new(),
            zeros: BTreeSet::new(),
            negdep: HashMap::new(),
        }
    }

    pub fn get(&self, x: Var) -> Option<(&Poly, &Deps)> {
        self.find.get(&x).map(|(p, d)| (p, d))
    }

    pub fn is_dependent(&self, x: Var) -> bool {
        self.find.contains_key(&x)
    }

    /// The left-hand side bound to exactly `p`, if any.
    pub fn inv(&self, p: &Poly) -> Option<Var> {
        self.inv.get(p).copied()
    }

    /// Left-hand sides whose right-hand side mentions `y`.
    pub fn dependents_on(&self, y: Var) -> Vec<Var> {
        self.dep.get(&y).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    /// Rows of the tableau where `y` occurs with a negative coefficient.
    pub fn negdep(&self, y: Var) -> Vec<Var> {
        debug_assert!(self.tableau);
        self.negdep
            .get(&y)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn has_negdep(&self, y: Var) -> bool {
        self.negdep.get(&y).is_some_and(|s| !s.is_empty())
    }

    /// Tableau bindings with zero constant part, in variable order.
    pub fn zeros(&self) -> Vec<Var> {
        self.zeros.iter().copied().collect()
    }

    /// Left-hand sides bound to a rational constant.
    pub fn constants(&self) -> impl Iterator<Item = Var> + '_ {
        self.consts.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Var, &Poly, &Deps)> {
        self.find.iter().map(|(x, (p, d))| (*x, p, d))
    }

    pub fn len(&self) -> usize {
        self.find.len()
    }

    pub fn is_empty(&self) -> bool {
        self.find.is_empty()
    }

    /// Installs `x ↦ p`. The caller is responsible for the invariants: `x`
    /// must not be bound, `p` must not be a bare variable nor already a
    /// right-hand side, and tableau rows must be restricted and feasible.
    pub fn install(&mut self, x: Var, p: Poly, deps: Deps) {
        debug_assert!(!self.find.contains_key(&x));
        debug_assert!(p.as_var().is_none(), "bare-variable right-hand side");
        debug_assert!(!self.inv.contains_key(&p));
        if self.tableau {
            assert!(
                !p.const_part().is_negative(),
                "tableau binding with negative constant part"
            );
            debug_assert!(p.is_restricted());
            debug_assert!(x.is_slack());
        }
        for y in p.vars() {
            self.dep.entry(y).or_default().insert(x);
        }
        if p.is_constant() {
            self.consts.insert(x);
        }
        if self.tableau {
            if p.const_part().is_zero() {
                self.zeros.insert(x);
            }
            for (y, _) in p.neg_monos() {
                self.negdep.entry(y).or_default().insert(x);
            }
        }
        self.inv.insert(p.clone(), x);
        self.find.insert(x, (p, deps));
    }

    /// Removes the binding of `x`, returning it.
    pub fn remove(&mut self, x: Var) -> Option<(Poly, Deps)> {
        let (p, deps) = self.find.remove(&x)?;
        self.inv.remove(&p);
        for y in p.vars() {
            if let Some(s) = self.dep.get_mut(&y) {
                s.remove(&x);
            }
        }
        self.consts.remove(&x);
        if self.tableau {
            self.zeros.remove(&x);
            for (y, _) in p.neg_monos() {
                if let Some(s) = self.negdep.get_mut(&y) {
                    s.remove(&x);
                }
            }
        }
        Some((p, deps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;
    use crate::term::var::{Dom, VarStore};

    #[test]
    fn indices_track_installs_and_removes() {
        let mut vars = VarStore::new();
        let k1 = vars.fresh_slack(Dom::Real);
        let k2 = vars.fresh_slack(Dom::Real);
        let k3 = vars.fresh_slack(Dom::Real);
        let mut t = SolutionSet::tableau();

        let row = Poly::monomial(k1, Rat::from(-1)).add_constant(&Rat::from(2));
        t.install(k3, row, Deps::none());
        assert_eq!(t.negdep(k1), vec![k3]);
        assert!(t.zeros().is_empty());

        let zero_row = Poly::monomial(k1, Rat::from(-2));
        t.install(k2, zero_row, Deps::none());
        assert_eq!(t.zeros(), vec![k2]);
        assert_eq!(t.negdep(k1), vec![k2, k3]);
        assert_eq!(t.dependents_on(k1), vec![k2, k3]);

        t.remove(k2);
        assert!(t.zeros().is_empty());
        assert_eq!(t.negdep(k1), vec![k3]);
    }

    #[test]
    fn inverse_lookup() {
        let mut vars = VarStore::new();
        let x = vars.external("x");
        let mut r = SolutionSet::regular();
        let p = Poly::constant(Rat::from(5));
        r.install(x, p.clone(), Deps::none());
        assert_eq!(r.inv(&p), Some(x));
        assert_eq!(r.constants().collect::<Vec<_>>(), vec![x]);
    }
}
