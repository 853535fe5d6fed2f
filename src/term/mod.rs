//! Terms.
//!
//! The engine only ever represents *flat* terms: an application's arguments
//! are variables, never nested terms. The facade introduces rename variables
//! when flattening client input, so everything below the facade works with
//! polynomials over variables and flat applications.

pub mod poly;
pub mod var;

use enum_dispatch::enum_dispatch;
use lasso::Spur;

use crate::Theory;
use poly::Poly;
use var::Var;

/// An uninterpreted function symbol, identified by its interned name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Funsym(pub Spur);

/// Operations every flat application supports.
#[enum_dispatch]
pub trait Application {
    /// The component theory that interprets the application.
    fn theory(&self) -> Theory;

    /// Argument variables, in position order.
    fn args(&self) -> Vec<Var>;

    /// The application with every argument replaced through `f`.
    fn rename(&self, f: &dyn Fn(Var) -> Var) -> App;
}

/// Uninterpreted application `f(x1, ..., xn)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Apply {
    pub sym: Funsym,
    pub args: Vec<Var>,
}

impl Application for Apply {
    fn theory(&self) -> Theory {
        Theory::U
    }

    fn args(&self) -> Vec<Var> {
        self.args.clone()
    }

    fn rename(&self, f: &dyn Fn(Var) -> Var) -> App {
        Apply {
            sym: self.sym,
            args: self.args.iter().map(|x| f(*x)).collect(),
        }
        .into()
    }
}

/// Tuple former `<x1, ..., xn>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tuple {
    pub elems: Vec<Var>,
}

impl Application for Tuple {
    fn theory(&self) -> Theory {
        Theory::T
    }

    fn args(&self) -> Vec<Var> {
        self.elems.clone()
    }

    fn rename(&self, f: &dyn Fn(Var) -> Var) -> App {
        Tuple {
            elems: self.elems.iter().map(|x| f(*x)).collect(),
        }
        .into()
    }
}

/// Projection `proj[i, n](x)` of the `i`th component of an `n`-tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proj {
    pub index: usize,
    pub arity: usize,
    pub tuple: Var,
}

impl Application for Proj {
    fn theory(&self) -> Theory {
        Theory::T
    }

    fn args(&self) -> Vec<Var> {
        vec![self.tuple]
    }

    fn rename(&self, f: &dyn Fn(Var) -> Var) -> App {
        Proj {
            index: self.index,
            arity: self.arity,
            tuple: f(self.tuple),
        }
        .into()
    }
}

/// Array read `a[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lookup {
    pub array: Var,
    pub index: Var,
}

impl Application for Lookup {
    fn theory(&self) -> Theory {
        Theory::F
    }

    fn args(&self) -> Vec<Var> {
        vec![self.array, self.index]
    }

    fn rename(&self, f: &dyn Fn(Var) -> Var) -> App {
        Lookup {
            array: f(self.array),
            index: f(self.index),
        }
        .into()
    }
}

/// Array write `a[i := x]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Update {
    pub array: Var,
    pub index: Var,
    pub value: Var,
}

impl Application for Update {
    fn theory(&self) -> Theory {
        Theory::F
    }

    fn args(&self) -> Vec<Var> {
        vec![self.array, self.index, self.value]
    }

    fn rename(&self, f: &dyn Fn(Var) -> Var) -> App {
        Update {
            array: f(self.array),
            index: f(self.index),
            value: f(self.value),
        }
        .into()
    }
}

/// A flat theory application.
#[enum_dispatch(Application)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum App {
    Apply,
    Tuple,
    Proj,
    Lookup,
    Update,
}

/// A canonical term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(Var),
    Arith(Poly),
    App(App),
}

impl Term {
    /// The arithmetic reading of the term, if it has one. Applications are
    /// opaque to the arithmetic theory.
    pub fn to_poly(&self) -> Option<Poly> {
        match self {
            Term::Var(x) => Some(Poly::var(*x)),
            Term::Arith(p) => Some(p.clone()),
            Term::App(_) => None,
        }
    }

    pub fn as_var(&self) -> Option<Var> {
        match self {
            Term::Var(x) => Some(*x),
            Term::Arith(p) => p.as_var(),
            Term::App(_) => None,
        }
    }

    /// Wraps a polynomial, collapsing bare variables.
    pub fn of_poly(p: Poly) -> Term {
        match p.as_var() {
            Some(x) => Term::Var(x),
            None => Term::Arith(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::var::VarStore;

    #[test]
    fn rename_reaches_every_argument() {
        let mut vars = VarStore::new();
        let a = vars.external("a");
        let i = vars.external("i");
        let x = vars.external("x");
        let app: App = Update {
            array: a,
            index: i,
            value: x,
        }
        .into();
        let renamed = app.rename(&|v| if v == i { x } else { v });
        assert_eq!(renamed.args(), vec![a, x, x]);
        assert_eq!(renamed.theory(), Theory::F);
    }
}
