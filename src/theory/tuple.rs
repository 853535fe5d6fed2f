//! Tuples and projections.

use crate::Theory;
use crate::fact::Fact;
use crate::justify::Deps;
use crate::term::var::{Var, VarStore};
use crate::term::{App, Proj, Tuple};

use super::FlatSolutions;

/// Tuple formation is injective: two tuples naming the same variable equate
/// componentwise.
pub fn decompose(a: &App, b: &App, deps: &Deps, out: &mut Vec<Fact>) {
    if let (App::Tuple(s), App::Tuple(t)) = (a, b) {
        if s.elems.len() == t.elems.len() {
            for (x, y) in s.elems.iter().zip(&t.elems) {
                if x != y {
                    out.push(Fact::VarEq(*x, *y, deps.clone()));
                }
            }
        }
    }
}

/// `proj[i, n](<x1, ..., xn>) = xi`.
pub fn sigma(proj: &Proj, tuples: &FlatSolutions) -> Option<(Var, Deps)> {
    let (app, deps) = tuples.find(proj.tuple)?;
    match app {
        App::Tuple(t) if t.elems.len() == proj.arity && proj.index < t.elems.len() => {
            Some((t.elems[proj.index], deps.clone()))
        }
        _ => None,
    }
}

/// Solved form of `x = proj[i, n](y)`: `y` is a tuple carrying `x` at
/// position `i` and fresh components everywhere else.
pub fn invert_proj(x: Var, proj: &Proj, vars: &mut VarStore) -> App {
    let elems = (0..proj.arity)
        .map(|j| {
            if j == proj.index {
                x
            } else {
                vars.fresh_theory(Theory::T, None)
            }
        })
        .collect();
    Tuple { elems }.into()
}
