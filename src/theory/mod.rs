//! Theory solvers for uninterpreted applications, tuples, and arrays.
//!
//! Each sibling theory keeps a *flat* solution set: bindings `x ↦ app` where
//! the application's arguments are variables. Congruence propagation falls
//! out of inverse-functionality: every application ever named is remembered,
//! and a second variable arriving at the same application yields a variable
//! equality for the partition. Uninterpreted applications need nothing more;
//! tuples add injectivity (componentwise decomposition) and projection
//! inversion, arrays a sigma-normalisation that steps lookups through
//! updates using the partition's three-valued equality test.

pub mod funarr;
pub mod tuple;

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::Theory;
use crate::fact::Fact;
use crate::justify::Deps;
use crate::term::var::Var;
use crate::term::{App, Application};

/// Outcome of sigma-normalising an application.
pub enum Normal {
    /// The application collapsed to a variable.
    Var(Var, Deps),
    /// A (possibly rewritten) application remains.
    App(App, Deps),
}

/// A flat solution set for one theory.
#[derive(Debug, Clone)]
pub struct FlatSolutions {
    th: Theory,
    find: HashMap<Var, (App, Deps)>,
    /// Every application ever named, mapped to the variable naming it.
    names: HashMap<App, (Var, Deps)>,
    /// For each variable, the applications mentioning it as an argument.
    uses: HashMap<Var, HashSet<App>>,
}

impl FlatSolutions {
    pub fn new(th: Theory) -> Self {
        FlatSolutions {
            th,
            find: HashMap::new(),
            names: HashMap::new(),
            uses: HashMap::new(),
        }
    }

    /// The application bound to `x`, if any.
    pub fn find(&self, x: Var) -> Option<(&App, &Deps)> {
        self.find.get(&x).map(|(a, d)| (a, d))
    }

    /// The variable naming `app`, if any.
    pub fn name_of(&self, app: &App) -> Option<(Var, &Deps)> {
        self.names.get(app).map(|(x, d)| (*x, d))
    }

    pub fn is_empty(&self) -> bool {
        self.find.is_empty()
    }

    /// Records `x = app`. A second name for a known application becomes a
    /// variable equality; a second application under an already-bound tuple
    /// variable decomposes componentwise.
    pub fn add(&mut self, x: Var, app: App, deps: Deps, out: &mut Vec<Fact>) {
        if let Some((w, wdeps)) = self.names.get(&app) {
            if *w != x {
                out.push(Fact::VarEq(x, *w, deps.union(wdeps)));
            }
            return;
        }
        trace!(target: "satcore::theory", theory = ?self.th, ?x, ?app, "bind");
        for a in app.args() {
            self.uses.entry(a).or_default().insert(app.clone());
        }
        self.names.insert(app.clone(), (x, deps.clone()));
        match self.find.get(&x) {
            None => {
                self.find.insert(x, (app, deps));
            }
            Some((prior, pdeps)) => {
                if self.th == Theory::T {
                    tuple::decompose(prior, &app, &deps.union(pdeps), out);
                }
            }
        }
    }

    /// Rewrites the set after the partition united `old` into `new`:
    /// applications mentioning `old` are re-normalised under `new`, and the
    /// binding of `old` itself moves. Collisions surface as facts.
    pub fn rename(&mut self, old: Var, new: Var, deps: &Deps, out: &mut Vec<Fact>) {
        let mut stale: Vec<(Var, App, Deps)> = Vec::new();
        if let Some((app, d)) = self.find.remove(&old) {
            self.names.remove(&app);
            stale.push((new, app, d));
        }
        let apps: Vec<App> = self
            .uses
            .remove(&old)
            .map(|s| s.into_iter().collect())
            .unwrap_or_default();
        for app in apps {
            let Some((w, wdeps)) = self.names.remove(&app) else {
                continue;
            };
            let w = if w == old { new } else { w };
            if let Some((image, _)) = self.find.get(&w) {
                if *image == app {
                    self.find.remove(&w);
                }
            }
            stale.push((w, app, wdeps));
        }
        for (w, app, wdeps) in stale {
            let renamed = app.rename(&|v| if v == old { new } else { v });
            self.add(w, renamed, wdeps.union(deps), out);
        }
    }
}
