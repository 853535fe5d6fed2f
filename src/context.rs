//! The stateful facade.
//!
//! A [`Context`] owns the current configuration, the logical context (the
//! sequence of asserted formulas, which unsat cores index into), a stack of
//! saved states, and the status flag. Term constructors canonicalise against
//! the configuration and may allocate rename variables while flattening.

use tracing::debug;

use crate::fact::{Atom, Fact, Formula};
use crate::justify::{AtomId, Deps, Inconsistent, Unbounded};
use crate::num::Rat;
use crate::propagate::{Core, Snapshot};
use crate::term::poly::Poly;
use crate::term::var::{Dom, Var};
use crate::term::{App, Application, Apply, Funsym, Lookup, Proj, Term, Tuple, Update};
use crate::{Options, Status, Theory};

pub struct Context {
    core: Core,
    options: Options,
    /// Asserted formulas; atom ids index into this.
    asserted: Vec<Formula>,
    /// Disjunctions awaiting `resolve`, with their originating atom.
    pending: Vec<(Vec<Formula>, AtomId)>,
    status: Status,
    saves: Vec<Saved>,
}

struct Saved {
    snap: Snapshot,
    asserted_len: usize,
    pending: Vec<(Vec<Formula>, AtomId)>,
    status: Status,
}

/// Outcome of the exhaustive case split.
enum SplitOutcome {
    Sat(Vec<Formula>),
    Unsat(Deps),
    Limit,
}

impl Context {
    pub fn new() -> Self {
        Context::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        Context {
            core: Core::new(),
            options,
            asserted: Vec::new(),
            pending: Vec::new(),
            status: Status::Unknown,
            saves: Vec::new(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Drops the whole logical context, keeping the options.
    pub fn reset(&mut self) {
        self.core = Core::new();
        self.asserted.clear();
        self.pending.clear();
        self.status = Status::Unknown;
        self.saves.clear();
    }

    // ------------------------------------------------------------------
    // Term constructors
    // ------------------------------------------------------------------

    pub fn var(&mut self, name: &str) -> Term {
        Term::Var(self.core.vars.external(name))
    }

    /// An external variable constrained to the integers.
    pub fn int_var(&mut self, name: &str) -> Term {
        let x = self.core.vars.external(name);
        self.core.vars.constrain(x, Dom::Int);
        Term::Var(x)
    }

    pub fn num(q: impl Into<Rat>) -> Term {
        Term::Arith(Poly::constant(q.into()))
    }

    pub fn add(&mut self, s: &Term, t: &Term) -> Term {
        let (a, b) = (self.poly_of(s), self.poly_of(t));
        Term::of_poly(a.add(&b))
    }

    pub fn sub(&mut self, s: &Term, t: &Term) -> Term {
        let (a, b) = (self.poly_of(s), self.poly_of(t));
        Term::of_poly(a.sub(&b))
    }

    pub fn neg(&mut self, t: &Term) -> Term {
        let a = self.poly_of(t);
        Term::of_poly(a.neg())
    }

    /// Multiplication by a rational constant.
    pub fn scale(&mut self, q: impl Into<Rat>, t: &Term) -> Term {
        let a = self.poly_of(t);
        Term::of_poly(a.scale(&q.into()))
    }

    pub fn apply(&mut self, f: &str, args: &[Term]) -> Term {
        let sym = Funsym(self.core.vars.symbol(f));
        let args = args.iter().map(|t| self.var_of(t)).collect();
        self.canon_app(Apply { sym, args }.into())
    }

    pub fn tuple(&mut self, elems: &[Term]) -> Term {
        let elems = elems.iter().map(|t| self.var_of(t)).collect();
        self.canon_app(Tuple { elems }.into())
    }

    /// The `i`th projection out of an `n`-tuple.
    pub fn proj(&mut self, i: usize, n: usize, t: &Term) -> Term {
        let tuple = self.var_of(t);
        self.canon_app(
            Proj {
                index: i,
                arity: n,
                tuple,
            }
            .into(),
        )
    }

    pub fn lookup(&mut self, array: &Term, index: &Term) -> Term {
        let array = self.var_of(array);
        let index = self.var_of(index);
        self.canon_app(Lookup { array, index }.into())
    }

    pub fn update(&mut self, array: &Term, index: &Term, value: &Term) -> Term {
        let array = self.var_of(array);
        let index = self.var_of(index);
        let value = self.var_of(value);
        self.canon_app(
            Update {
                array,
                index,
                value,
            }
            .into(),
        )
    }

    fn canon_app(&mut self, app: App) -> Term {
        match self.core.sigma(app) {
            crate::theory::Normal::Var(v, _) => Term::Var(v),
            crate::theory::Normal::App(app, _) => Term::App(app),
        }
    }

    /// The arithmetic reading of a term; applications are flattened through
    /// their name variable.
    fn poly_of(&mut self, t: &Term) -> Poly {
        match t {
            Term::Var(x) => Poly::var(*x),
            Term::Arith(p) => p.clone(),
            Term::App(app) => Poly::var(self.name_app(app.clone())),
        }
    }

    /// A variable standing for the term, aliasing when necessary.
    fn var_of(&mut self, t: &Term) -> Var {
        match t {
            Term::Var(x) => *x,
            Term::Arith(p) => {
                let (v, _) = self
                    .core
                    .simplex
                    .alias(p, &self.core.partition, &mut self.core.vars);
                v
            }
            Term::App(app) => self.name_app(app.clone()),
        }
    }

    /// The rename variable naming a flat application, creating the
    /// definitional binding on first use.
    fn name_app(&mut self, app: App) -> Var {
        let set = match &app {
            App::Apply(_) => &self.core.uninterp,
            App::Tuple(_) | App::Proj(_) => &self.core.tuples,
            App::Lookup(_) | App::Update(_) => &self.core.arrays,
        };
        if let Some((v, _)) = set.name_of(&app) {
            return v;
        }
        let v = self.core.vars.fresh_rename();
        self.core.push(Fact::FlatEq(v, app, Deps::none()));
        v
    }

    // ------------------------------------------------------------------
    // Assertion
    // ------------------------------------------------------------------

    /// Adds a formula to the logical context and reports the new status.
    pub fn process(&mut self, fml: Formula) -> Status {
        if matches!(self.status, Status::Unsat(_)) {
            return self.status.clone();
        }
        let id = self.asserted.len() as AtomId;
        self.asserted.push(fml.clone());
        debug!(target: "satcore::context", atom = id, "process");
        let outcome = self
            .assert_formula(&fml, id)
            .and_then(|()| self.core.propagate());
        match outcome {
            Ok(()) => {
                self.status = if self.pending.is_empty() {
                    Status::Sat(fml)
                } else {
                    Status::Unknown
                };
            }
            Err(e) => self.set_unsat(e),
        }
        self.status.clone()
    }

    fn assert_formula(&mut self, fml: &Formula, id: AtomId) -> Result<(), Inconsistent> {
        match fml {
            Formula::True => Ok(()),
            Formula::False => Err(Inconsistent::new(Deps::atom(id))),
            Formula::Atom(atom) => {
                self.push_atom(atom, Deps::atom(id));
                Ok(())
            }
            Formula::And(fs) => {
                for f in fs {
                    self.assert_formula(f, id)?;
                }
                Ok(())
            }
            Formula::Or(fs) => {
                self.pending.push((fs.clone(), id));
                Ok(())
            }
        }
    }

    fn push_atom(&mut self, atom: &Atom, deps: Deps) {
        match atom {
            Atom::Eq(s, t) => {
                if matches!(s, Term::App(_)) || matches!(t, Term::App(_)) {
                    let x = self.var_of(s);
                    let y = self.var_of(t);
                    self.core.push(Fact::VarEq(x, y, deps));
                } else {
                    let (a, b) = (self.poly_of(s), self.poly_of(t));
                    self.core.push(Fact::Eq(a, b, deps));
                }
            }
            Atom::Diseq(s, t) => {
                if matches!(s, Term::App(_)) || matches!(t, Term::App(_)) {
                    let x = self.var_of(s);
                    let y = self.var_of(t);
                    self.core.push(Fact::VarDiseq(x, y, deps));
                } else {
                    let (a, b) = (self.poly_of(s), self.poly_of(t));
                    self.core.push(Fact::Diseq(a, b, deps));
                }
            }
            Atom::Nonneg(t) => {
                let a = self.poly_of(t);
                self.core.push(Fact::Nonneg(a, deps));
            }
            Atom::Pos(t) => {
                let a = self.poly_of(t);
                self.core.push(Fact::Nonneg(a.clone(), deps.clone()));
                self.core.push(Fact::Diseq(a, Poly::zero(), deps));
            }
            Atom::InDom(t, d) => {
                let x = self.var_of(t);
                let (root, _) = self.core.partition.find(x);
                self.core.vars.constrain(x, *d);
                self.core.vars.constrain(root, *d);
            }
        }
    }

    fn set_unsat(&mut self, e: Inconsistent) {
        let core = if self.options.unsat_cores {
            e.deps
                .iter()
                .map(|id| self.asserted[id as usize].clone())
                .collect()
        } else {
            Vec::new()
        };
        self.status = Status::Unsat(core);
    }

    // ------------------------------------------------------------------
    // Case splitting
    // ------------------------------------------------------------------

    /// Forces a decision by exhaustively splitting the pending
    /// disjunctions. May be exponential; `Options::split_limit` bounds the
    /// number of branches explored, with `Unknown` on exhaustion.
    pub fn resolve(&mut self) -> Status {
        if matches!(self.status, Status::Unsat(_)) {
            return self.status.clone();
        }
        let mut budget = self.options.split_limit;
        match self.resolve_splits(0, &mut budget) {
            SplitOutcome::Sat(chosen) => {
                self.pending.clear();
                self.status = Status::Sat(Formula::and(chosen));
            }
            SplitOutcome::Unsat(core) => self.set_unsat(Inconsistent::new(core)),
            SplitOutcome::Limit => self.status = Status::Unknown,
        }
        self.status.clone()
    }

    fn resolve_splits(&mut self, i: usize, budget: &mut Option<usize>) -> SplitOutcome {
        if i >= self.pending.len() {
            return SplitOutcome::Sat(Vec::new());
        }
        let (branches, id) = self.pending[i].clone();
        let mut core = Deps::none();
        for branch in branches {
            if let Some(b) = budget {
                if *b == 0 {
                    return SplitOutcome::Limit;
                }
                *b -= 1;
            }
            let snap = self.core.snapshot();
            let pending_len = self.pending.len();
            let outcome = self
                .assert_formula(&branch, id)
                .and_then(|()| self.core.propagate());
            match outcome {
                Ok(()) => match self.resolve_splits(i + 1, budget) {
                    SplitOutcome::Sat(mut chosen) => {
                        chosen.push(branch);
                        return SplitOutcome::Sat(chosen);
                    }
                    SplitOutcome::Limit => {
                        self.core.restore(snap);
                        self.pending.truncate(pending_len);
                        return SplitOutcome::Limit;
                    }
                    SplitOutcome::Unsat(c) => {
                        core.extend(&c);
                        self.core.restore(snap);
                        self.pending.truncate(pending_len);
                    }
                },
                Err(e) => {
                    core.extend(&e.deps);
                    self.core.restore(snap);
                    self.pending.truncate(pending_len);
                }
            }
        }
        SplitOutcome::Unsat(core)
    }

    /// Sound validity test. Complete only when the negation splits into
    /// nothing, or when `Options::complete_tests` turns on the full case
    /// split inside the probe.
    pub fn valid(&mut self, fml: &Formula) -> bool {
        let Some(neg) = fml.negated() else {
            return false;
        };
        let saved = self.save_state();
        let id = self.asserted.len() as AtomId;
        self.asserted.push(neg.clone());
        let outcome = self
            .assert_formula(&neg, id)
            .and_then(|()| self.core.propagate());
        let refuted = match outcome {
            Err(_) => true,
            Ok(()) => {
                if !self.pending.is_empty() && self.options.complete_tests {
                    let mut budget = self.options.split_limit;
                    matches!(self.resolve_splits(0, &mut budget), SplitOutcome::Unsat(_))
                } else {
                    false
                }
            }
        };
        self.restore_state(saved);
        refuted
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The canonical term equal to `t`. No state change.
    pub fn can(&self, t: &Term) -> Term {
        match t {
            Term::Var(x) => {
                let (root, _) = self.core.partition.find(*x);
                match self.core.simplex.find(root) {
                    Some((p, _)) => Term::of_poly(p.clone()),
                    None => Term::Var(root),
                }
            }
            Term::Arith(p) => {
                let (q, _) = self.core.simplex.canon(p, &self.core.partition);
                Term::of_poly(q)
            }
            Term::App(app) => {
                let partition = &self.core.partition;
                let app = app.rename(&|v| partition.find(v).0);
                match self.core.sigma(app) {
                    crate::theory::Normal::Var(v, _) => self.can(&Term::Var(v)),
                    crate::theory::Normal::App(app, _) => {
                        let set = match &app {
                            App::Apply(_) => &self.core.uninterp,
                            App::Tuple(_) | App::Proj(_) => &self.core.tuples,
                            App::Lookup(_) | App::Update(_) => &self.core.arrays,
                        };
                        match set.name_of(&app) {
                            Some((v, _)) => self.can(&Term::Var(v)),
                            None => Term::App(app),
                        }
                    }
                }
            }
        }
    }

    /// The right-hand side assigned to `x` in theory `th`.
    pub fn find(&self, th: Theory, x: Var) -> Option<Term> {
        let (root, _) = self.core.partition.find(x);
        match th {
            Theory::A => self
                .core
                .simplex
                .find(root)
                .map(|(p, _)| Term::of_poly(p.clone())),
            Theory::U => self
                .core
                .uninterp
                .find(root)
                .map(|(a, _)| Term::App(a.clone())),
            Theory::T => self
                .core
                .tuples
                .find(root)
                .map(|(a, _)| Term::App(a.clone())),
            Theory::F => self
                .core
                .arrays
                .find(root)
                .map(|(a, _)| Term::App(a.clone())),
        }
    }

    /// The left-hand side whose right-hand side equals `t`.
    pub fn inv(&self, t: &Term) -> Option<Var> {
        match t {
            Term::Var(_) => None,
            Term::Arith(p) => {
                let (q, _) = self.core.simplex.canon(p, &self.core.partition);
                self.core.simplex.inv(&q)
            }
            Term::App(app) => {
                let partition = &self.core.partition;
                let app = app.rename(&|v| partition.find(v).0);
                let set = match &app {
                    App::Apply(_) => &self.core.uninterp,
                    App::Tuple(_) | App::Proj(_) => &self.core.tuples,
                    App::Lookup(_) | App::Update(_) => &self.core.arrays,
                };
                set.name_of(&app).map(|(v, _)| v)
            }
        }
    }

    /// Least upper bound of an arithmetic term in the current context.
    pub fn sup(&mut self, t: &Term) -> Result<Rat, Unbounded> {
        let p = self.poly_of(t);
        self.core
            .simplex
            .sup(&p, &self.core.partition)
            .map(|(q, _)| q)
    }

    /// Greatest lower bound, `-sup(-t)`.
    pub fn inf(&mut self, t: &Term) -> Result<Rat, Unbounded> {
        let p = self.poly_of(t);
        self.core
            .simplex
            .inf(&p, &self.core.partition)
            .map(|(q, _)| q)
    }

    // ------------------------------------------------------------------
    // Save and restore
    // ------------------------------------------------------------------

    fn save_state(&self) -> Saved {
        Saved {
            snap: self.core.snapshot(),
            asserted_len: self.asserted.len(),
            pending: self.pending.clone(),
            status: self.status.clone(),
        }
    }

    fn restore_state(&mut self, saved: Saved) {
        self.core.restore(saved.snap);
        self.asserted.truncate(saved.asserted_len);
        self.pending = saved.pending;
        self.status = saved.status;
    }

    /// Pushes a logical snapshot and returns its handle.
    pub fn save(&mut self) -> usize {
        self.saves.push(self.save_state());
        self.saves.len() - 1
    }

    /// Rolls back to the snapshot `n`, dropping it and everything above.
    /// Returns false for an unknown handle.
    pub fn restore(&mut self, n: usize) -> bool {
        if n >= self.saves.len() {
            return false;
        }
        self.saves.truncate(n + 1);
        let saved = self.saves.pop().expect("nonempty by the bounds check");
        self.restore_state(saved);
        true
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
