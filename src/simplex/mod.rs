//! The linear arithmetic engine.
//!
//! State is a pair of solution sets: the regular set `R` binds non-slack
//! variables to arbitrary polynomials, the tableau `T` binds slacks to
//! restricted polynomials with nonnegative constant parts. Inequalities
//! enter through fresh slack variables, equalities through solved forms, and
//! every operation leaves the tableau feasible.
//!
//! Derived variable equalities surface in two ways: a right-hand side
//! collapsing to a bare variable, and two left-hand sides arriving at the
//! same right-hand side (the sets are inverse-functional). Both are queued
//! for the propagator rather than applied in place, which keeps each
//! operation local. Equalities involving a zero slack are queued as `v = 0`
//! instead, since zero slacks never enter the shared partition.

pub mod solution;

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::Theory;
use crate::fact::Fact;
use crate::justify::{Deps, Inconsistent, Unbounded};
use crate::num::Rat;
use crate::num::diophantine::DioSolution;
use crate::partition::Partition;
use crate::term::poly::{Poly, Solved};
use crate::term::var::{Dom, Var, VarStore};
use solution::SolutionSet;

#[derive(Debug, Clone)]
pub struct Simplex {
    r: SolutionSet,
    t: SolutionSet,
    derived: Vec<Fact>,
}

/// Where the content of a freshly introduced tableau binding ended up.
enum Placed {
    /// The variable owns a row.
    Row(Var),
    /// The binding collapsed onto another variable; the equality is queued.
    Alias(Var),
    /// Absorbed by substitution; no row exists under the variable.
    Gone,
}

impl Simplex {
    pub fn new() -> Self {
        Simplex {
            r: SolutionSet::regular(),
            t: SolutionSet::tableau(),
            derived: Vec::new(),
        }
    }

    pub fn regular(&self) -> &SolutionSet {
        &self.r
    }

    pub fn tableau(&self) -> &SolutionSet {
        &self.t
    }

    /// Drains the facts this engine derived since the last call.
    pub fn take_derived(&mut self) -> Vec<Fact> {
        std::mem::take(&mut self.derived)
    }

    fn binding(&self, x: Var) -> Option<(&Poly, &Deps)> {
        self.r.get(x).or_else(|| self.t.get(x))
    }

    /// The binding of `x` in `R` or `T`, if any.
    pub fn find(&self, x: Var) -> Option<(&Poly, &Deps)> {
        self.binding(x)
    }

    /// The left-hand side bound to exactly `p`, searching both sets.
    pub fn inv(&self, p: &Poly) -> Option<Var> {
        self.r.inv(p).or_else(|| self.t.inv(p))
    }

    /// Canonical form: variables through the partition, then one substitution
    /// pass through `R ∪ T`. Right-hand sides only mention independent
    /// variables, so a single pass suffices.
    pub fn canon(&self, p: &Poly, partition: &Partition) -> (Poly, Deps) {
        let mut deps = Deps::none();
        let mut flat = Poly::constant(p.const_part().clone());
        for (x, c) in p.monos() {
            let (root, d) = partition.find(x);
            deps.extend(&d);
            flat = flat.add(&Poly::monomial(root, c.clone()));
        }
        let mut out = Poly::constant(flat.const_part().clone());
        for (x, c) in flat.monos() {
            match self.binding(x) {
                Some((rhs, d)) => {
                    deps.extend(d);
                    out = out.add_scaled(c, rhs);
                }
                None => out = out.add(&Poly::monomial(x, c.clone())),
            }
        }
        (out, deps)
    }

    /// Queues a derived equality between two variables. Zero slacks never
    /// reach the partition; an equality touching one is queued as `v = 0`.
    fn note_eq(&mut self, a: Var, b: Var, deps: Deps) {
        if a.is_zero_slack() && b.is_zero_slack() {
            return;
        }
        if a.is_zero_slack() {
            self.derived.push(Fact::Eq(Poly::var(b), Poly::zero(), deps));
        } else if b.is_zero_slack() {
            self.derived.push(Fact::Eq(Poly::var(a), Poly::zero(), deps));
        } else {
            self.derived.push(Fact::VarEq(a, b, deps));
        }
    }

    /// Installs `x ↦ p`, detecting bare-variable and inverse-functional
    /// collapses. The binding of `x` must already have been removed.
    fn install_checked(&mut self, in_t: bool, x: Var, p: Poly, deps: Deps) -> Placed {
        if let Some(v) = p.as_var() {
            if v == x {
                return Placed::Gone;
            }
            self.note_eq(x, v, deps);
            return Placed::Alias(v);
        }
        if let Some(w) = self.inv(&p) {
            if w != x {
                let wdeps = self
                    .binding(w)
                    .map(|(_, d)| d.clone())
                    .unwrap_or_default();
                self.note_eq(x, w, deps.union(&wdeps));
                return Placed::Alias(w);
            }
        }
        if in_t {
            self.t.install(x, p, deps);
        } else {
            self.r.install(x, p, deps);
        }
        Placed::Row(x)
    }

    /// Substitutes `x := p` through every right-hand side of both sets.
    fn fuse(&mut self, x: Var, p: &Poly, deps: &Deps) {
        for w in self.r.dependents_on(x) {
            self.refresh(false, w, x, p, deps);
        }
        for w in self.t.dependents_on(x) {
            self.refresh(true, w, x, p, deps);
        }
    }

    fn refresh(&mut self, in_t: bool, w: Var, x: Var, p: &Poly, deps: &Deps) {
        let removed = if in_t {
            self.t.remove(w)
        } else {
            self.r.remove(w)
        };
        let Some((old, wdeps)) = removed else { return };
        let new = old.subst(x, p);
        self.install_checked(in_t, w, new, wdeps.union(deps));
    }

    /// Fuses `x := p` and installs the binding, replacing any prior one.
    fn compose(&mut self, in_t: bool, x: Var, p: Poly, deps: Deps) -> Placed {
        trace!(target: "satcore::simplex", ?x, ?p, in_t, "compose");
        self.r.remove(x);
        self.t.remove(x);
        self.fuse(x, &p, &deps);
        self.install_checked(in_t, x, p, deps)
    }

    /// Minimum gain of `y` over the rows bounding it.
    fn min_gain(&self, y: Var) -> Option<Rat> {
        self.t
            .negdep(y)
            .into_iter()
            .map(|k| {
                let (b, _) = self.t.get(k).expect("indexed row");
                let c = b.coeff(y).expect("indexed coefficient");
                b.const_part() / &-c
            })
            .min()
    }

    /// Pivots on `y`: the minimum-gain row bounding `y` (ties to the least
    /// row variable) is solved for `y` and composed into the tableau.
    pub fn pivot(&mut self, y: Var) -> Result<(), Unbounded> {
        let mut best: Option<(Var, Rat)> = None;
        for k in self.t.negdep(y) {
            let (b, _) = self.t.get(k).expect("indexed row");
            let c = b.coeff(y).expect("indexed coefficient");
            let gain = b.const_part() / &-c;
            let better = match &best {
                None => true,
                Some((_, g)) => gain < *g,
            };
            if better {
                best = Some((k, gain));
            }
        }
        let Some((k, gain)) = best else {
            return Err(Unbounded);
        };
        trace!(target: "satcore::simplex", ?y, row = ?k, %gain, "pivot");
        let (b, deps) = self.t.remove(k).expect("chosen row");
        let p = Poly::solve_for(y, &Poly::var(k), &b);
        self.compose(true, y, p, deps);
        Ok(())
    }

    /// Asserts the equality `lhs = rhs`.
    pub fn merge(
        &mut self,
        lhs: &Poly,
        rhs: &Poly,
        deps: &Deps,
        partition: &Partition,
        vars: &mut VarStore,
    ) -> Result<(), Inconsistent> {
        let (la, d1) = self.canon(lhs, partition);
        let (ra, d2) = self.canon(rhs, partition);
        let deps = deps.union(&d1).union(&d2);
        self.merge_diff(la.sub(&ra), deps, partition, vars)
    }

    /// Asserts `d = 0` for an already canonical difference.
    fn merge_diff(
        &mut self,
        d: Poly,
        deps: Deps,
        partition: &Partition,
        vars: &mut VarStore,
    ) -> Result<(), Inconsistent> {
        if let Some(c) = d.as_constant() {
            return if c.is_zero() {
                Ok(())
            } else {
                Err(Inconsistent::new(deps))
            };
        }
        let dio = d.is_diophantine(|x| vars.is_int(x));
        debug!(target: "satcore::simplex", ?d, dio, "merge");
        if dio {
            let unknowns: Vec<Var> = d.vars().collect();
            match d.zsolve(|| Poly::var(vars.fresh_theory(Theory::A, Some(Dom::Int)))) {
                DioSolution::Valid => Ok(()),
                DioSolution::Inconsistent => Err(Inconsistent::new(deps)),
                DioSolution::Solved(sols) => {
                    for (x, p) in unknowns.into_iter().zip(sols) {
                        self.merge_solved(x, p, deps.clone(), true, partition, vars)?;
                    }
                    Ok(())
                }
            }
        } else {
            match d.qsolve() {
                Solved::Valid => Ok(()),
                Solved::Inconsistent => Err(Inconsistent::new(deps)),
                Solved::Solution(x, p) => self.merge_solved(x, p, deps, false, partition, vars),
            }
        }
    }

    /// Dispatches a solved form `x = p` with `x` independent and absent
    /// from `p`: re-isolate a non-slack variable when the left-hand side is
    /// slack, then compose into `R`, hand a bare-variable equality to the
    /// partition, or enter the restricted branch.
    fn merge_solved(
        &mut self,
        x: Var,
        p: Poly,
        deps: Deps,
        dio: bool,
        partition: &Partition,
        vars: &mut VarStore,
    ) -> Result<(), Inconsistent> {
        let (p, dp) = self.canon(&p, partition);
        let deps = deps.union(&dp);
        if let Some(y) = p.as_var() {
            if y != x {
                self.note_eq(x, y, deps);
            }
            return Ok(());
        }
        if !x.is_slack() {
            self.compose(false, x, p, deps);
            return Ok(());
        }
        if let Some(y) = p.first_nonslack() {
            let q = Poly::solve_for(y, &Poly::var(x), &p);
            self.compose(false, y, q, deps);
            return Ok(());
        }
        self.restricted(x, p, deps, dio, vars)
    }

    /// Both sides restricted: record the difference under a fresh zero slack
    /// and force it to vanish.
    fn restricted(
        &mut self,
        x: Var,
        p: Poly,
        deps: Deps,
        dio: bool,
        vars: &mut VarStore,
    ) -> Result<(), Inconsistent> {
        let mut d = p.sub(&Poly::var(x));
        if d.const_part().is_positive() {
            d = d.neg();
        }
        let k = vars.fresh_zero_slack(if dio { Dom::Int } else { Dom::Real });
        let placed = self.add_to_t(k, d, deps.clone())?;
        self.infer();
        if dio {
            self.gomory(k, &deps);
        }
        match placed {
            Placed::Row(owner) => self.enforce_zero(owner, &deps),
            // An alias queued `v = 0`; a substitution already applied zero.
            Placed::Alias(_) | Placed::Gone => Ok(()),
        }
    }

    /// Adds `k = a` to the tableau, restoring feasibility first: compose
    /// directly when the constant part is nonnegative, otherwise absorb the
    /// binding into an unbounded positive variable or pivot the least
    /// positive variable and retry.
    fn add_to_t(&mut self, k: Var, a: Poly, deps: Deps) -> Result<Placed, Inconsistent> {
        let mut a = a;
        let mut deps = deps;
        loop {
            if !a.const_part().is_negative() {
                return Ok(self.compose(true, k, a, deps));
            }
            if a.least_pos().is_none() {
                return Err(Inconsistent::new(deps));
            }
            if let Some((y, _)) = a.pos().find(|(y, _)| !self.t.has_negdep(*y)) {
                let lhs = if k.is_zero_slack() {
                    Poly::zero()
                } else {
                    Poly::var(k)
                };
                let q = Poly::solve_for(y, &lhs, &a);
                self.compose(true, y, q, deps);
                return Ok(Placed::Gone);
            }
            let (y, _) = a.least_pos().expect("positive part is nonempty");
            self.pivot(y).expect("every positive variable is bounded here");
            let (rhs, rd) = self.t.get(y).expect("pivoted binding");
            let (rhs, rd) = (rhs.clone(), rd.clone());
            deps.extend(&rd);
            a = a.subst(y, &rhs);
        }
    }

    /// Forces the row of a zero slack to the constant zero, per the
    /// sign analysis of its constant part.
    fn enforce_zero(&mut self, k: Var, deps: &Deps) -> Result<(), Inconsistent> {
        loop {
            let Some((b, bdeps)) = self.t.get(k) else {
                // The row was pivoted away; k survives in other rows.
                self.compose(true, k, Poly::zero(), deps.clone());
                return Ok(());
            };
            let (b, bdeps) = (b.clone(), bdeps.clone());
            let sigma = deps.union(&bdeps);
            match b.const_part().sign() {
                Ordering::Less => return Err(Inconsistent::new(sigma)),
                Ordering::Equal => {
                    if let Some((y, _)) = b.monos().next() {
                        let q = b.isolate(y);
                        self.compose(true, y, q, sigma.clone());
                    }
                    self.compose(true, k, Poly::zero(), sigma);
                    return Ok(());
                }
                Ordering::Greater => {
                    if b.least_neg().is_none() {
                        // Bounded below by a positive constant yet forced to zero.
                        return Err(Inconsistent::new(sigma));
                    }
                    let mut candidate = None;
                    for (y, c) in b.neg_monos() {
                        let here = b.const_part() / &-c;
                        if self.min_gain(y).is_some_and(|g| g >= here) {
                            candidate = Some(y);
                            break;
                        }
                    }
                    let y = candidate
                        .or_else(|| b.least_neg().map(|(y, _)| y))
                        .expect("negative part is nonempty");
                    self.pivot(y).expect("bounded through this row");
                }
            }
        }
    }

    /// Asserts `a >= 0`.
    pub fn process_nonneg(
        &mut self,
        a: &Poly,
        deps: &Deps,
        partition: &Partition,
        vars: &mut VarStore,
    ) -> Result<(), Inconsistent> {
        let (a, d0) = self.canon(a, partition);
        let deps = deps.union(&d0);
        if let Some(c) = a.as_constant() {
            return if c.is_negative() {
                Err(Inconsistent::new(deps))
            } else {
                Ok(())
            };
        }
        if a.is_restricted() {
            if !a.const_part().is_negative() && a.least_neg().is_none() {
                return Ok(());
            }
            if a.const_part().is_negative() && a.least_pos().is_none() {
                return Err(Inconsistent::new(deps));
            }
        }
        let dio = a.is_diophantine(|x| vars.is_int(x));
        let k = vars.fresh_slack(if dio { Dom::Int } else { Dom::Real });
        debug!(target: "satcore::simplex", ?a, slack = ?k, "nonneg");
        if let Some(y) = a.first_nonslack() {
            let q = Poly::solve_for(y, &Poly::var(k), &a);
            self.compose(false, y, q, deps);
            return Ok(());
        }
        if !a.const_part().is_positive() {
            if let Some((y, _)) = a.pos().find(|(y, _)| !self.t.has_negdep(*y)) {
                let q = Poly::solve_for(y, &Poly::var(k), &a);
                self.compose(true, y, q, deps);
                return Ok(());
            }
        }
        self.add_to_t(k, a, deps.clone())?;
        self.infer();
        if dio {
            self.gomory(k, &deps);
        }
        Ok(())
    }

    /// Emits the Gomory cut of the row of `k` when the row is fractional:
    /// for an integer binding `k = c0 + Σ ci·xi`, the nonnegativity
    /// `-def(c0) + Σ frac(ci)·xi >= 0`.
    fn gomory(&mut self, k: Var, deps: &Deps) {
        let Some((b, bdeps)) = self.t.get(k) else {
            return;
        };
        if b.is_integral() {
            return;
        }
        let mut cut = Poly::constant(-b.const_part().def());
        for (y, c) in b.monos() {
            cut = cut.add(&Poly::monomial(y, c.frac()));
        }
        let deps = deps.union(bdeps);
        debug!(target: "satcore::simplex", ?cut, "gomory cut");
        self.derived.push(Fact::Nonneg(cut, deps));
    }

    /// Variables that cannot move off zero, by the two-phase analysis over
    /// the zero rows.
    fn zero_set(&self) -> BTreeSet<Var> {
        let mut z: BTreeSet<Var> = BTreeSet::new();
        for k in self.t.zeros() {
            let (b, _) = self.t.get(k).expect("indexed row");
            for (y, _) in b.neg_monos() {
                z.insert(y);
            }
        }
        loop {
            let removable: Vec<Var> = z
                .iter()
                .copied()
                .filter(|y| {
                    self.t.negdep(*y).into_iter().any(|k| {
                        let (b, _) = self.t.get(k).expect("indexed row");
                        b.pos().any(|(u, _)| !z.contains(&u))
                    })
                })
                .collect();
            if removable.is_empty() {
                break;
            }
            for y in removable {
                z.remove(&y);
            }
        }
        let dependents: Vec<Var> = self
            .t
            .iter()
            .filter(|(_, b, _)| b.pos().all(|(u, _)| z.contains(&u)))
            .map(|(k, _, _)| k)
            .collect();
        z.extend(dependents);
        z
    }

    /// Zero-analysis fixpoint: maximise each zero row; rows whose positive
    /// part is exhausted force their negative variables to zero, and the
    /// resulting constant collisions surface the entailed variable
    /// equalities.
    pub fn infer(&mut self) {
        loop {
            let z = self.zero_set();
            let mut progressed = false;
            'rows: for k in self.t.zeros() {
                loop {
                    let Some((b, bdeps)) = self.t.get(k) else {
                        continue 'rows;
                    };
                    let (b, bdeps) = (b.clone(), bdeps.clone());
                    if !b.const_part().is_zero() {
                        continue 'rows;
                    }
                    if b.least_pos().is_none() {
                        let negs: Vec<Var> = b.neg_monos().map(|(y, _)| y).collect();
                        if negs.is_empty() {
                            continue 'rows;
                        }
                        for y in negs {
                            self.compose(true, y, Poly::zero(), bdeps.clone());
                        }
                        progressed = true;
                        continue 'rows;
                    }
                    if b
                        .pos()
                        .any(|(y, _)| !self.t.has_negdep(y) || !z.contains(&y))
                    {
                        continue 'rows;
                    }
                    let (y, _) = b.least_pos().expect("positive part is nonempty");
                    self.pivot(y).expect("bounded zero variable");
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    /// Reconciles the solution sets after the partition united `absorbed`
    /// into `root`. Bindings entangled with the union are pulled and
    /// re-asserted as equations through the regular merge machinery, which
    /// pivots rather than substitutes and so keeps the tableau feasible;
    /// remaining occurrences of the absorbed variable are renamed to the
    /// bare root, which leaves every constant part untouched.
    pub fn merge_vars(
        &mut self,
        root: Var,
        absorbed: Var,
        deps: &Deps,
        partition: &Partition,
        vars: &mut VarStore,
    ) -> Result<(), Inconsistent> {
        let mut equations: Vec<(Poly, Deps)> = Vec::new();
        if let Some((b, bd)) = self.r.remove(absorbed).or_else(|| self.t.remove(absorbed)) {
            equations.push((b.sub(&Poly::var(root)), deps.union(&bd)));
        }
        let referenced =
            !self.r.dependents_on(absorbed).is_empty() || !self.t.dependents_on(absorbed).is_empty();
        if referenced {
            // The root must be independent while it stands in for the
            // absorbed variable; its binding is re-asserted afterwards.
            if let Some((rb, rd)) = self.r.remove(root).or_else(|| self.t.remove(root)) {
                let rb = rb.subst(absorbed, &Poly::var(root));
                equations.push((rb.sub(&Poly::var(root)), deps.union(&rd)));
            }
            self.fuse(absorbed, &Poly::var(root), deps);
        }
        for (d, ddeps) in equations {
            // An earlier equation may have bound variables of this one.
            let (d, dd) = self.canon(&d, partition);
            self.merge_diff(d, ddeps.union(&dd), partition, vars)?;
        }
        Ok(())
    }

    /// A variable equal to `p`, introducing a rename binding into `R` when
    /// no existing left-hand side matches. Bare variables come back as-is.
    pub fn alias(
        &mut self,
        p: &Poly,
        partition: &Partition,
        vars: &mut VarStore,
    ) -> (Var, Deps) {
        let (p, deps) = self.canon(p, partition);
        if let Some(x) = p.as_var() {
            return (x, deps);
        }
        if let Some(x) = self.inv(&p) {
            return (x, deps);
        }
        let v = vars.fresh_rename();
        if p.is_diophantine(|x| vars.is_int(x)) && p.is_integral() {
            vars.constrain(v, Dom::Int);
        }
        self.r.install(v, p, Deps::none());
        (v, deps)
    }

    /// Least upper bound of `p`, pivoting until no positive monomial
    /// remains. Non-slack monomials make the objective unbounded outright.
    pub fn sup(&mut self, p: &Poly, partition: &Partition) -> Result<(Rat, Deps), Unbounded> {
        let (a, mut deps) = self.canon(p, partition);
        let (mut a, unrestricted) = a.split_restricted();
        if !unrestricted.is_constant() {
            return Err(Unbounded);
        }
        loop {
            let Some((x, _)) = a.least_pos() else {
                return Ok((a.const_part().clone(), deps));
            };
            if !self.t.has_negdep(x) {
                return Err(Unbounded);
            }
            self.pivot(x).expect("bounded objective variable");
            let (rhs, rd) = self.t.get(x).expect("pivoted binding");
            let (rhs, rd) = (rhs.clone(), rd.clone());
            deps.extend(&rd);
            a = a.subst(x, &rhs);
        }
    }

    /// Greatest lower bound, `-sup(-p)`.
    pub fn inf(&mut self, p: &Poly, partition: &Partition) -> Result<(Rat, Deps), Unbounded> {
        self.sup(&p.neg(), partition).map(|(q, d)| (-q, d))
    }
}

impl Default for Simplex {
    fn default() -> Self {
        Simplex::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64) -> Rat {
        Rat::from(n)
    }

    struct Fixture {
        vars: VarStore,
        partition: Partition,
        simplex: Simplex,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                vars: VarStore::new(),
                partition: Partition::new(),
                simplex: Simplex::new(),
            }
        }

        fn nonneg(&mut self, p: &Poly, atom: u32) -> Result<(), Inconsistent> {
            let r = self
                .simplex
                .process_nonneg(p, &Deps::atom(atom), &self.partition, &mut self.vars);
            self.drain();
            r
        }

        fn merge(&mut self, lhs: &Poly, rhs: &Poly, atom: u32) -> Result<(), Inconsistent> {
            let r = self
                .simplex
                .merge(lhs, rhs, &Deps::atom(atom), &self.partition, &mut self.vars);
            self.drain();
            r
        }

        /// Applies queued facts the way the propagator would, without the
        /// full queue machinery.
        fn drain(&mut self) {
            let mut pending = self.simplex.take_derived();
            while let Some(fact) = pending.pop() {
                match fact {
                    Fact::VarEq(x, y, deps) => {
                        if let Some(u) = self
                            .partition
                            .merge(x, y, &deps, &mut self.vars)
                            .expect("consistent in tests")
                        {
                            self.simplex
                                .merge_vars(u.root, u.absorbed, &u.deps, &self.partition, &mut self.vars)
                                .expect("consistent in tests");
                        }
                    }
                    Fact::Eq(a, b, deps) => {
                        self.simplex
                            .merge(&a, &b, &deps, &self.partition, &mut self.vars)
                            .expect("consistent in tests");
                    }
                    Fact::Nonneg(a, deps) => {
                        self.simplex
                            .process_nonneg(&a, &deps, &self.partition, &mut self.vars)
                            .expect("consistent in tests");
                    }
                    other => panic!("unexpected fact in simplex test: {other:?}"),
                }
                pending.extend(self.simplex.take_derived());
            }
        }

        fn value_of(&self, x: Var) -> Option<Rat> {
            let (root, _) = self.partition.find(x);
            let (p, _) = self.simplex.find(root)?;
            let (canon, _) = self.simplex.canon(p, &self.partition);
            canon.as_constant().cloned()
        }
    }

    #[test]
    fn equalities_and_bounds_determine_values() {
        let mut fx = Fixture::new();
        let x = fx.vars.external("x");
        let y = fx.vars.external("y");

        // x + y = 3, x >= 0, y >= 0, x - y = 1  ==>  x = 2, y = 1
        let xy = Poly::var(x).add(&Poly::var(y));
        fx.merge(&xy, &Poly::constant(q(3)), 0).expect("sat");
        fx.nonneg(&Poly::var(x), 1).expect("sat");
        fx.nonneg(&Poly::var(y), 2).expect("sat");
        let diff = Poly::var(x).sub(&Poly::var(y));
        fx.merge(&diff, &Poly::constant(q(1)), 3).expect("sat");

        assert_eq!(fx.value_of(x), Some(q(2)));
        assert_eq!(fx.value_of(y), Some(q(1)));
    }

    #[test]
    fn contradictory_bounds_report_their_core() {
        let mut fx = Fixture::new();
        let x = fx.vars.external("x");

        // x >= 5, then x <= 2.
        fx.nonneg(&Poly::var(x).add_constant(&q(-5)), 0).expect("sat");
        let err = fx
            .nonneg(&Poly::var(x).neg().add_constant(&q(2)), 1)
            .expect_err("5 <= x <= 2 is infeasible");
        assert_eq!(err.deps.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn zero_analysis_fixes_variables() {
        let mut fx = Fixture::new();
        let x = fx.vars.external("x");
        let y = fx.vars.external("y");

        // x >= 0, y >= 0, x + y <= 0  ==>  x = 0 and y = 0
        fx.nonneg(&Poly::var(x), 0).expect("sat");
        fx.nonneg(&Poly::var(y), 1).expect("sat");
        let sum = Poly::var(x).add(&Poly::var(y));
        fx.nonneg(&sum.neg(), 2).expect("sat");

        assert_eq!(fx.value_of(x), Some(q(0)));
        assert_eq!(fx.value_of(y), Some(q(0)));
    }

    #[test]
    fn sup_detects_unbounded_directions() {
        let mut fx = Fixture::new();
        let x = fx.vars.external("x");
        fx.nonneg(&Poly::var(x), 0).expect("sat");
        let (root, _) = fx.partition.find(x);
        assert!(
            fx.simplex
                .sup(&Poly::var(root), &fx.partition)
                .is_err(),
            "x >= 0 alone leaves x unbounded above"
        );
        let (lo, _) = fx
            .simplex
            .inf(&Poly::var(root), &fx.partition)
            .expect("bounded below");
        assert_eq!(lo, q(0));
    }

    #[test]
    fn sup_and_inf_respect_bounds() {
        let mut fx = Fixture::new();
        let x = fx.vars.external("x");
        fx.nonneg(&Poly::var(x), 0).expect("sat");
        fx.nonneg(&Poly::var(x).neg().add_constant(&q(2)), 1).expect("sat");
        let (root, _) = fx.partition.find(x);
        let (hi, _) = fx
            .simplex
            .sup(&Poly::var(root), &fx.partition)
            .expect("bounded");
        assert_eq!(hi, q(2));
        let (lo, _) = fx
            .simplex
            .inf(&Poly::var(root), &fx.partition)
            .expect("bounded");
        assert_eq!(lo, q(0));
    }
}
