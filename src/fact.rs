//! Atoms, formulas, and the facts exchanged by the inference components.

use crate::justify::Deps;
use crate::term::poly::Poly;
use crate::term::var::{Dom, Var};
use crate::term::{App, Term};

/// An atomic formula as asserted by the client. Unsat cores are reported in
/// terms of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Eq(Term, Term),
    Diseq(Term, Term),
    /// `t >= 0`.
    Nonneg(Term),
    /// `t > 0`, the conjunction of `t >= 0` and `t != 0`.
    Pos(Term),
    /// Domain constraint on a term.
    InDom(Term, Dom),
}

impl Atom {
    /// The negated atom, when the negation is itself atomic. Domain
    /// constraints have no atomic negation.
    pub fn negated(&self) -> Option<Atom> {
        match self {
            Atom::Eq(s, t) => Some(Atom::Diseq(s.clone(), t.clone())),
            Atom::Diseq(s, t) => Some(Atom::Eq(s.clone(), t.clone())),
            Atom::Nonneg(t) => {
                let p = t.to_poly()?;
                Some(Atom::Pos(Term::of_poly(p.neg())))
            }
            Atom::Pos(t) => {
                let p = t.to_poly()?;
                Some(Atom::Nonneg(Term::of_poly(p.neg())))
            }
            Atom::InDom(..) => None,
        }
    }
}

/// Formulas over atoms, kept in negation normal form. The propositional
/// layer proper (BDDs, case-split heuristics) lives outside the core; this
/// is the contract the core exposes to it: conjunctions are processed
/// eagerly, disjunctions become pending splits resolved by
/// [`resolve`](crate::context::Context::resolve).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    True,
    False,
    Atom(Atom),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

impl Formula {
    pub fn eq(s: Term, t: Term) -> Formula {
        Formula::Atom(Atom::Eq(s, t))
    }

    pub fn deq(s: Term, t: Term) -> Formula {
        Formula::Atom(Atom::Diseq(s, t))
    }

    /// `t >= 0`.
    pub fn nonneg(t: Term) -> Formula {
        Formula::Atom(Atom::Nonneg(t))
    }

    /// `t > 0`.
    pub fn pos(t: Term) -> Formula {
        Formula::Atom(Atom::Pos(t))
    }

    pub fn is_int(t: Term) -> Formula {
        Formula::Atom(Atom::InDom(t, Dom::Int))
    }

    pub fn is_real(t: Term) -> Formula {
        Formula::Atom(Atom::InDom(t, Dom::Real))
    }

    pub fn and(mut fmls: Vec<Formula>) -> Formula {
        match fmls.len() {
            0 => Formula::True,
            1 => fmls.pop().expect("nonempty"),
            _ => Formula::And(fmls),
        }
    }

    pub fn or(mut fmls: Vec<Formula>) -> Formula {
        match fmls.len() {
            0 => Formula::False,
            1 => fmls.pop().expect("nonempty"),
            _ => Formula::Or(fmls),
        }
    }

    /// The negation in negation normal form, when every atom involved has an
    /// atomic negation.
    pub fn negated(&self) -> Option<Formula> {
        match self {
            Formula::True => Some(Formula::False),
            Formula::False => Some(Formula::True),
            Formula::Atom(a) => a.negated().map(Formula::Atom),
            Formula::And(fs) => {
                let negs: Option<Vec<_>> = fs.iter().map(Formula::negated).collect();
                negs.map(Formula::Or)
            }
            Formula::Or(fs) => {
                let negs: Option<Vec<_>> = fs.iter().map(Formula::negated).collect();
                negs.map(Formula::And)
            }
        }
    }
}

/// A fact in flight between the inference components.
#[derive(Debug, Clone)]
pub enum Fact {
    /// Variable equality, destined for the partition.
    VarEq(Var, Var, Deps),
    /// Variable disequality, destined for the disequality set.
    VarDiseq(Var, Var, Deps),
    /// Arithmetic equality.
    Eq(Poly, Poly, Deps),
    /// Arithmetic disequality.
    Diseq(Poly, Poly, Deps),
    /// `p >= 0`.
    Nonneg(Poly, Deps),
    /// Flat application equality `x = app`, destined for a theory solver.
    FlatEq(Var, App, Deps),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Rat;

    #[test]
    fn negation_round_trips() {
        let t = Term::Arith(Poly::constant(Rat::from(1)));
        let f = Formula::nonneg(t);
        let n = f.negated().expect("arithmetic atoms negate");
        assert_eq!(n.negated(), Some(f));
    }

    #[test]
    fn dom_constraints_have_no_atomic_negation() {
        let t = Term::Arith(Poly::constant(Rat::from(1)));
        assert_eq!(Formula::is_int(t).negated(), None);
    }
}
