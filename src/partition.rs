//! The shared variable partition.
//!
//! A union-find over variables with a justification on every edge, plus the
//! set of disequalities between canonical representatives. The partition is
//! the medium every theory communicates through: any component may merge or
//! dismerge variable classes, and all of them read equality through it.
//!
//! Union orients edges toward the smaller variable, so a class is always
//! represented by its most constrained member (slacks before externals, zero
//! slacks first). Paths are compacted lazily, during queries.

use std::collections::HashMap;

use tracing::trace;

use crate::justify::{Answer, Deps, Inconsistent};
use crate::term::var::{Var, VarStore};

#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// `x -> (y, rho)` with `rho |- x = y`; absent means `x` is a root.
    parent: HashMap<Var, (Var, Deps)>,
    /// Disequality edges between canonical representatives, symmetric.
    diseq: HashMap<Var, Vec<(Var, Deps)>>,
}

/// A union performed by [`Partition::merge`]: the surviving root and the
/// variable that was absorbed, with the justification of their equality.
#[derive(Debug)]
pub struct Union {
    pub root: Var,
    pub absorbed: Var,
    pub deps: Deps,
}

impl Partition {
    pub fn new() -> Self {
        Partition::default()
    }

    /// Canonical representative and the justification of `x = canon(x)`.
    pub fn find(&self, x: Var) -> (Var, Deps) {
        let mut cur = x;
        let mut deps = Deps::none();
        while let Some((next, rho)) = self.parent.get(&cur) {
            deps.extend(rho);
            cur = *next;
        }
        (cur, deps)
    }

    /// [`find`](Self::find) with path compression.
    pub fn canon(&mut self, x: Var) -> (Var, Deps) {
        let (root, deps) = self.find(x);
        if x != root {
            if let Some(entry) = self.parent.get_mut(&x) {
                *entry = (root, deps.clone());
            }
        }
        (root, deps)
    }

    pub fn is_equal(&self, x: Var, y: Var) -> Answer {
        let (rx, dx) = self.find(x);
        let (ry, dy) = self.find(y);
        if rx == ry {
            return Answer::Yes(dx.union(&dy));
        }
        match self.diseq_edge(rx, ry) {
            Some(tau) => Answer::No(dx.union(&dy).union(tau)),
            None => Answer::Unknown,
        }
    }

    pub fn is_diseq(&self, x: Var, y: Var) -> Answer {
        self.is_equal(x, y).flip()
    }

    fn diseq_edge(&self, rx: Var, ry: Var) -> Option<&Deps> {
        self.diseq
            .get(&rx)
            .and_then(|es| es.iter().find(|(z, _)| *z == ry))
            .map(|(_, tau)| tau)
    }

    /// Unions the classes of `x` and `y`. Returns `None` when they already
    /// coincide; fails when they are currently disequal. Domains intersect
    /// onto the surviving root.
    pub fn merge(
        &mut self,
        x: Var,
        y: Var,
        deps: &Deps,
        vars: &mut VarStore,
    ) -> Result<Option<Union>, Inconsistent> {
        let (rx, dx) = self.canon(x);
        let (ry, dy) = self.canon(y);
        if rx == ry {
            return Ok(None);
        }
        let combined = deps.union(&dx).union(&dy);
        if let Some(tau) = self.diseq_edge(rx, ry) {
            return Err(Inconsistent::new(combined.union(tau)));
        }
        let (root, absorbed) = if rx < ry { (rx, ry) } else { (ry, rx) };
        trace!(target: "satcore::partition", ?absorbed, ?root, "union");
        self.parent.insert(absorbed, (root, combined.clone()));
        if let Some(d) = vars.dom(absorbed) {
            vars.constrain(root, d);
        }
        self.rekey_diseqs(absorbed, root);
        Ok(Some(Union {
            root,
            absorbed,
            deps: combined,
        }))
    }

    /// Moves the disequality edges of an absorbed representative to the root.
    fn rekey_diseqs(&mut self, absorbed: Var, root: Var) {
        let Some(edges) = self.diseq.remove(&absorbed) else {
            return;
        };
        for (z, tau) in edges {
            if let Some(back) = self.diseq.get_mut(&z) {
                back.retain(|(w, _)| *w != absorbed);
            }
            self.add_diseq_edge(root, z, tau);
        }
    }

    fn add_diseq_edge(&mut self, a: Var, b: Var, tau: Deps) {
        if self.diseq_edge(a, b).is_none() {
            self.diseq.entry(a).or_default().push((b, tau.clone()));
            self.diseq.entry(b).or_default().push((a, tau));
        }
    }

    /// Asserts `x != y`. Fails when the classes already coincide.
    pub fn dismerge(&mut self, x: Var, y: Var, deps: &Deps) -> Result<(), Inconsistent> {
        let (rx, dx) = self.canon(x);
        let (ry, dy) = self.canon(y);
        let combined = deps.union(&dx).union(&dy);
        if rx == ry {
            return Err(Inconsistent::new(combined));
        }
        trace!(target: "satcore::partition", ?rx, ?ry, "dismerge");
        self.add_diseq_edge(rx, ry, combined);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::var::Dom;

    fn store() -> VarStore {
        VarStore::new()
    }

    #[test]
    fn merge_routes_to_minimum() {
        let mut vars = store();
        let mut p = Partition::new();
        let x = vars.external("x");
        let k = vars.fresh_slack(Dom::Real);
        let u = p
            .merge(x, k, &Deps::atom(0), &mut vars)
            .expect("consistent")
            .expect("distinct classes");
        assert_eq!(u.root, k, "slack representative wins");
        assert_eq!(p.find(x).0, k);
        assert!(p.is_equal(x, k).is_yes());
    }

    #[test]
    fn merge_after_dismerge_is_inconsistent() {
        let mut vars = store();
        let mut p = Partition::new();
        let x = vars.external("x");
        let y = vars.external("y");
        p.dismerge(x, y, &Deps::atom(0)).expect("fresh classes");
        let err = p
            .merge(x, y, &Deps::atom(1), &mut vars)
            .expect_err("contradicts the disequality");
        assert_eq!(err.deps.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn diseqs_follow_the_root() {
        let mut vars = store();
        let mut p = Partition::new();
        let x = vars.external("x");
        let y = vars.external("y");
        let z = vars.external("z");
        p.dismerge(y, z, &Deps::atom(0)).expect("fresh");
        p.merge(x, y, &Deps::atom(1), &mut vars).expect("fine");
        // x and y now share a class that is disequal to z.
        assert!(p.is_diseq(x, z).is_yes());
        assert!(p
            .merge(x, z, &Deps::atom(2), &mut vars)
            .is_err());
    }

    #[test]
    fn domains_meet_at_the_root() {
        let mut vars = store();
        let mut p = Partition::new();
        let x = vars.external("x");
        let y = vars.external("y");
        vars.constrain(y, Dom::Int);
        p.merge(x, y, &Deps::none(), &mut vars).expect("fine");
        let (root, _) = p.find(y);
        assert!(vars.is_int(root));
    }
}
