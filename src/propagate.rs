//! The propagator.
//!
//! A work queue of facts is drained one at a time: arithmetic facts go to
//! the simplex, variable facts to the partition, flat equalities to their
//! theory's solution set. Whatever a component derives is re-enqueued, and
//! the loop runs to an empty queue or to `Inconsistent`. Given the input
//! order, the processing order is deterministic.
//!
//! Speculative branches run through [`Core::probe`]: a logical snapshot of
//! the configuration, a private queue so derived facts cannot leak into the
//! outer one, and an unconditional restore on both exit paths.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::fact::Fact;
use crate::justify::{Deps, Inconsistent};
use crate::num::Rat;
use crate::partition::Partition;
use crate::simplex::Simplex;
use crate::term::poly::Poly;
use crate::term::var::{Var, VarSnapshot, VarStore};
use crate::term::{App, Application};
use crate::theory::{FlatSolutions, Normal, funarr, tuple};
use crate::Theory;

/// The combined configuration of the inference components.
pub struct Core {
    pub vars: VarStore,
    pub partition: Partition,
    pub simplex: Simplex,
    pub uninterp: FlatSolutions,
    pub tuples: FlatSolutions,
    pub arrays: FlatSolutions,
    queue: VecDeque<Fact>,
}

/// A logical snapshot of the configuration. The queue is not part of it;
/// snapshots are taken at quiescent points or around probes, which manage
/// the queue themselves.
#[derive(Clone)]
pub struct Snapshot {
    vars: VarSnapshot,
    partition: Partition,
    simplex: Simplex,
    uninterp: FlatSolutions,
    tuples: FlatSolutions,
    arrays: FlatSolutions,
}

impl Core {
    pub fn new() -> Self {
        Core {
            vars: VarStore::new(),
            partition: Partition::new(),
            simplex: Simplex::new(),
            uninterp: FlatSolutions::new(Theory::U),
            tuples: FlatSolutions::new(Theory::T),
            arrays: FlatSolutions::new(Theory::F),
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, fact: Fact) {
        self.queue.push_back(fact);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            vars: self.vars.snapshot(),
            partition: self.partition.clone(),
            simplex: self.simplex.clone(),
            uninterp: self.uninterp.clone(),
            tuples: self.tuples.clone(),
            arrays: self.arrays.clone(),
        }
    }

    /// Returns to a quiescent snapshot. Facts still queued belong to the
    /// abandoned line of reasoning and are dropped with it.
    pub fn restore(&mut self, snap: Snapshot) {
        self.vars.restore(snap.vars);
        self.partition = snap.partition;
        self.simplex = snap.simplex;
        self.uninterp = snap.uninterp;
        self.tuples = snap.tuples;
        self.arrays = snap.arrays;
        self.queue.clear();
    }

    /// Runs the queue to a fixed point or to a contradiction.
    pub fn propagate(&mut self) -> Result<(), Inconsistent> {
        while let Some(fact) = self.queue.pop_front() {
            self.dispatch(fact)?;
            let derived = self.simplex.take_derived();
            self.queue.extend(derived);
        }
        Ok(())
    }

    /// Tries `facts` against a snapshot of the configuration; the state and
    /// the outer queue are untouched on both outcomes.
    pub fn probe(&mut self, facts: Vec<Fact>) -> Result<(), Inconsistent> {
        let outer = std::mem::take(&mut self.queue);
        let snap = self.snapshot();
        self.queue.extend(facts);
        let result = self.propagate();
        self.restore(snap);
        self.queue = outer;
        result
    }

    fn dispatch(&mut self, fact: Fact) -> Result<(), Inconsistent> {
        trace!(target: "satcore::propagate", ?fact, "dispatch");
        match fact {
            Fact::VarEq(x, y, deps) => self.var_eq(x, y, deps),
            Fact::VarDiseq(x, y, deps) => self.partition.dismerge(x, y, &deps),
            Fact::Eq(a, b, deps) => {
                self.simplex
                    .merge(&a, &b, &deps, &self.partition, &mut self.vars)
            }
            Fact::Nonneg(a, deps) => {
                self.simplex
                    .process_nonneg(&a, &deps, &self.partition, &mut self.vars)
            }
            Fact::Diseq(a, b, deps) => self.diseq(a, b, deps),
            Fact::FlatEq(x, app, deps) => self.flat_eq(x, app, deps),
        }
    }

    /// Merges a variable equality and broadcasts the union to every theory.
    fn var_eq(&mut self, x: Var, y: Var, deps: Deps) -> Result<(), Inconsistent> {
        let Some(u) = self.partition.merge(x, y, &deps, &mut self.vars)? else {
            return Ok(());
        };
        debug!(target: "satcore::propagate", root = ?u.root, absorbed = ?u.absorbed, "class union");
        self.simplex
            .merge_vars(u.root, u.absorbed, &u.deps, &self.partition, &mut self.vars)?;
        let mut out = Vec::new();
        self.uninterp.rename(u.absorbed, u.root, &u.deps, &mut out);
        self.tuples.rename(u.absorbed, u.root, &u.deps, &mut out);
        self.arrays.rename(u.absorbed, u.root, &u.deps, &mut out);
        self.queue.extend(out);
        Ok(())
    }

    /// Sigma-normalises an application against the current configuration.
    pub fn sigma(&self, app: App) -> Normal {
        match app {
            App::Proj(p) => match tuple::sigma(&p, &self.tuples) {
                Some((v, d)) => Normal::Var(v, d),
                None => Normal::App(p.into(), Deps::none()),
            },
            App::Lookup(l) => funarr::sigma(&l, &self.arrays, &self.partition),
            other => Normal::App(other, Deps::none()),
        }
    }

    /// Routes `x = app` to the owning theory after canonicalising the
    /// arguments and sigma-normalising.
    fn flat_eq(&mut self, x: Var, app: App, deps: Deps) -> Result<(), Inconsistent> {
        let (x, dx) = self.partition.find(x);
        let mut deps = deps.union(&dx);
        for a in app.args() {
            deps.extend(&self.partition.find(a).1);
        }
        let canon_args = {
            let partition = &self.partition;
            app.rename(&|v| partition.find(v).0)
        };
        match self.sigma(canon_args) {
            Normal::Var(v, d) => {
                self.queue.push_back(Fact::VarEq(x, v, deps.union(&d)));
                Ok(())
            }
            Normal::App(app, d) => {
                deps.extend(&d);
                let mut out = Vec::new();
                match &app {
                    App::Apply(_) => self.uninterp.add(x, app, deps, &mut out),
                    App::Tuple(_) | App::Proj(_) => {
                        if let App::Proj(p) = &app {
                            if self.tuples.find(p.tuple).is_none() {
                                let inverted = tuple::invert_proj(x, p, &mut self.vars);
                                self.tuples.add(p.tuple, inverted, deps.clone(), &mut out);
                            }
                        }
                        self.tuples.add(x, app, deps, &mut out);
                    }
                    App::Lookup(_) | App::Update(_) => self.arrays.add(x, app, deps, &mut out),
                }
                self.queue.extend(out);
                Ok(())
            }
        }
    }

    /// Disequality dispatch: trivial decision, diophantine segment
    /// processing, or a partition edge between aliases of the two sides.
    fn diseq(&mut self, a: Poly, b: Poly, deps: Deps) -> Result<(), Inconsistent> {
        let (ca, d1) = self.simplex.canon(&a, &self.partition);
        let (cb, d2) = self.simplex.canon(&b, &self.partition);
        let deps = deps.union(&d1).union(&d2);
        let d = ca.sub(&cb);
        if let Some(c) = d.as_constant() {
            return if c.is_zero() {
                Err(Inconsistent::new(deps))
            } else {
                Ok(())
            };
        }
        if d.is_diophantine(|x| self.vars.is_int(x)) {
            self.diophantine_diseq(d, deps)
        } else {
            let (x, dx) = self.simplex.alias(&ca, &self.partition, &mut self.vars);
            let (y, dy) = self.simplex.alias(&cb, &self.partition, &mut self.vars);
            self.partition
                .dismerge(x, y, &deps.union(&dx).union(&dy))
        }
    }

    /// Integer disequality `e != n`: grow the maximal contiguous excluded
    /// segment `[lo, hi]` around `n`, then try `e <= lo-1` and `e >= hi+1`.
    /// Both branches refuted means the disequality is refuted; exactly one
    /// surviving branch is committed as a learned bound; with both alive the
    /// disequality lands on the partition.
    fn diophantine_diseq(&mut self, d: Poly, deps: Deps) -> Result<(), Inconsistent> {
        let d = d.reduce();
        let n = -d.const_part();
        let e = d.add_constant(&n); // d with its constant part dropped
        if !n.is_integer() {
            // An integral combination can never meet a fractional value.
            return Ok(());
        }
        debug!(target: "satcore::propagate", ?e, %n, "integer disequality");
        let one = Rat::one();
        let upper_cap = self.simplex.sup(&e, &self.partition).ok().map(|(q, _)| q.floor());
        let lower_cap = self.simplex.inf(&e, &self.partition).ok().map(|(q, _)| q.ceil());
        let mut seg = deps.clone();
        let mut hi = n.clone();
        loop {
            let next = &hi + &one;
            if upper_cap.as_ref().is_some_and(|cap| next > *cap) {
                break;
            }
            match self.probe(vec![Fact::Eq(
                e.clone(),
                Poly::constant(next.clone()),
                Deps::none(),
            )]) {
                Err(core) => {
                    seg.extend(&core.deps);
                    hi = next;
                }
                Ok(()) => break,
            }
        }
        let mut lo = n.clone();
        loop {
            let next = &lo - &one;
            if lower_cap.as_ref().is_some_and(|cap| next < *cap) {
                break;
            }
            match self.probe(vec![Fact::Eq(
                e.clone(),
                Poly::constant(next.clone()),
                Deps::none(),
            )]) {
                Err(core) => {
                    seg.extend(&core.deps);
                    lo = next;
                }
                Ok(()) => break,
            }
        }
        // e <= lo - 1, as a nonnegativity
        let below = Poly::constant(&lo - &one).sub(&e);
        // e >= hi + 1
        let above = e.sub(&Poly::constant(&hi + &one));
        match self.probe(vec![Fact::Nonneg(below.clone(), seg.clone())]) {
            Err(c1) => match self.probe(vec![Fact::Nonneg(above.clone(), seg.clone())]) {
                Err(c2) => Err(Inconsistent::new(c1.deps.union(&c2.deps))),
                Ok(()) => {
                    debug!(target: "satcore::propagate", "committing upper branch");
                    self.simplex.process_nonneg(
                        &above,
                        &seg.union(&c1.deps),
                        &self.partition,
                        &mut self.vars,
                    )
                }
            },
            Ok(()) => match self.probe(vec![Fact::Nonneg(above, seg.clone())]) {
                Err(c2) => {
                    debug!(target: "satcore::propagate", "committing lower branch");
                    self.simplex.process_nonneg(
                        &below,
                        &seg.union(&c2.deps),
                        &self.partition,
                        &mut self.vars,
                    )
                }
                Ok(()) => {
                    let (x, dx) = self.simplex.alias(&e, &self.partition, &mut self.vars);
                    let (y, dy) = self.simplex.alias(
                        &Poly::constant(n),
                        &self.partition,
                        &mut self.vars,
                    );
                    self.partition.dismerge(x, y, &seg.union(&dx).union(&dy))
                }
            },
        }
    }
}

impl Default for Core {
    fn default() -> Self {
        Core::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;
    use crate::term::var::Dom;

    fn q(n: i64) -> Rat {
        Rat::from(n)
    }

    #[test]
    fn probe_leaves_the_state_untouched() {
        let mut core = Core::new();
        let x = core.vars.external("x");
        core.push(Fact::Nonneg(Poly::var(x), Deps::atom(0)));
        core.propagate().expect("sat");
        let before = core.simplex.tableau().len();

        let bad = Fact::Nonneg(
            Poly::var(x).neg().add_constant(&q(-1)),
            Deps::atom(1),
        );
        assert!(core.probe(vec![bad]).is_err());
        assert_eq!(core.simplex.tableau().len(), before);
        core.push(Fact::Nonneg(Poly::var(x).neg().add_constant(&q(5)), Deps::atom(2)));
        core.propagate().expect("x <= 5 is consistent after the probe");
    }

    #[test]
    fn integer_segment_learns_a_bound() {
        let mut core = Core::new();
        let x = core.vars.external("x");
        core.vars.constrain(x, Dom::Int);
        // 0 <= x <= 2, x != 0, x != 1 forces x = 2.
        core.push(Fact::Nonneg(Poly::var(x), Deps::atom(0)));
        core.push(Fact::Nonneg(Poly::var(x).neg().add_constant(&q(2)), Deps::atom(1)));
        core.push(Fact::Diseq(Poly::var(x), Poly::constant(q(0)), Deps::atom(2)));
        core.push(Fact::Diseq(Poly::var(x), Poly::constant(q(1)), Deps::atom(3)));
        core.propagate().expect("x = 2 remains");

        let (root, _) = core.partition.find(x);
        let (hi, _) = core
            .simplex
            .sup(&Poly::var(root), &core.partition)
            .expect("bounded");
        let (lo, _) = core
            .simplex
            .inf(&Poly::var(root), &core.partition)
            .expect("bounded");
        assert_eq!(hi, q(2));
        assert_eq!(lo, q(2));
    }

    #[test]
    fn refuted_segment_reports_inconsistency() {
        let mut core = Core::new();
        let x = core.vars.external("x");
        core.vars.constrain(x, Dom::Int);
        // 0 <= x <= 1 with both values excluded.
        core.push(Fact::Nonneg(Poly::var(x), Deps::atom(0)));
        core.push(Fact::Nonneg(Poly::var(x).neg().add_constant(&q(1)), Deps::atom(1)));
        core.push(Fact::Diseq(Poly::var(x), Poly::constant(q(0)), Deps::atom(2)));
        core.push(Fact::Diseq(Poly::var(x), Poly::constant(q(1)), Deps::atom(3)));
        assert!(core.propagate().is_err());
    }
}
