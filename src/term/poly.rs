//! Canonical linear polynomials `c0 + c1*x1 + ... + cn*xn`.
//!
//! Monomials are kept sorted by the variable order with nonzero coefficients,
//! so structural equality coincides with polynomial equality and the least
//! positive/negative monomial queries used by the pivoting rules are simple
//! scans.

use num_bigint::BigInt;
use num_traits::One;

use crate::num::Rat;
use crate::num::diophantine::{self, Combination};
use crate::term::var::Var;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Poly {
    constant: Rat,
    monos: Vec<(Var, Rat)>,
}

/// Result of solving a linear equation `p = 0` for one of its variables.
pub enum Solved {
    /// `0 = 0`.
    Valid,
    /// `c = 0` with `c` nonzero.
    Inconsistent,
    /// `x = p` with `x` not occurring in `p`.
    Solution(Var, Poly),
}

impl Poly {
    pub fn zero() -> Self {
        Poly::default()
    }

    pub fn constant(q: Rat) -> Self {
        Poly {
            constant: q,
            monos: Vec::new(),
        }
    }

    pub fn var(x: Var) -> Self {
        Poly {
            constant: Rat::zero(),
            monos: vec![(x, Rat::one())],
        }
    }

    pub fn monomial(x: Var, q: Rat) -> Self {
        if q.is_zero() {
            Poly::zero()
        } else {
            Poly {
                constant: Rat::zero(),
                monos: vec![(x, q)],
            }
        }
    }

    /// The constant part `c0`.
    pub fn const_part(&self) -> &Rat {
        &self.constant
    }

    pub fn is_constant(&self) -> bool {
        self.monos.is_empty()
    }

    pub fn as_constant(&self) -> Option<&Rat> {
        self.is_constant().then_some(&self.constant)
    }

    /// `Some(x)` iff the polynomial is the bare variable `x`.
    pub fn as_var(&self) -> Option<Var> {
        match self.monos.as_slice() {
            [(x, c)] if self.constant.is_zero() && c.is_one() => Some(*x),
            _ => None,
        }
    }

    pub fn coeff(&self, x: Var) -> Option<&Rat> {
        self.monos
            .binary_search_by(|(y, _)| y.cmp(&x))
            .ok()
            .map(|i| &self.monos[i].1)
    }

    pub fn monos(&self) -> impl Iterator<Item = (Var, &Rat)> {
        self.monos.iter().map(|(x, c)| (*x, c))
    }

    pub fn vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.monos.iter().map(|(x, _)| *x)
    }

    pub fn contains(&self, x: Var) -> bool {
        self.coeff(x).is_some()
    }

    /// Monomials with positive coefficient, in variable order.
    pub fn pos(&self) -> impl Iterator<Item = (Var, &Rat)> {
        self.monos().filter(|(_, c)| c.is_positive())
    }

    /// Monomials with negative coefficient, in variable order.
    pub fn neg_monos(&self) -> impl Iterator<Item = (Var, &Rat)> {
        self.monos().filter(|(_, c)| c.is_negative())
    }

    pub fn least_pos(&self) -> Option<(Var, &Rat)> {
        self.pos().next()
    }

    pub fn least_neg(&self) -> Option<(Var, &Rat)> {
        self.neg_monos().next()
    }

    /// The greatest variable of the polynomial, if any.
    pub fn max_var(&self) -> Option<Var> {
        self.monos.last().map(|(x, _)| *x)
    }

    /// All variables are slack.
    pub fn is_restricted(&self) -> bool {
        self.vars().all(Var::is_slack)
    }

    pub fn first_nonslack(&self) -> Option<Var> {
        self.vars().find(|x| !x.is_slack())
    }

    /// All variables satisfy the integer predicate.
    pub fn is_diophantine(&self, is_int: impl Fn(Var) -> bool) -> bool {
        self.vars().all(is_int)
    }

    /// All coefficients and the constant are integers.
    pub fn is_integral(&self) -> bool {
        self.constant.is_integer() && self.monos.iter().all(|(_, c)| c.is_integer())
    }

    fn push(&mut self, x: Var, c: Rat) {
        if !c.is_zero() {
            self.monos.push((x, c));
        }
    }

    /// Merges two sorted monomial lists, dropping cancelled coefficients.
    fn merge_with(&self, other: &Poly, f: impl Fn(&Rat) -> Rat) -> Poly {
        let mut out = Poly {
            constant: &self.constant + &f(&other.constant),
            monos: Vec::with_capacity(self.monos.len() + other.monos.len()),
        };
        let (mut i, mut j) = (0, 0);
        while i < self.monos.len() && j < other.monos.len() {
            let (x, cx) = &self.monos[i];
            let (y, cy) = &other.monos[j];
            match x.cmp(y) {
                std::cmp::Ordering::Less => {
                    out.push(*x, cx.clone());
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    out.push(*y, f(cy));
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    out.push(*x, cx + &f(cy));
                    i += 1;
                    j += 1;
                }
            }
        }
        for (x, c) in &self.monos[i..] {
            out.push(*x, c.clone());
        }
        for (y, c) in &other.monos[j..] {
            out.push(*y, f(c));
        }
        out
    }

    pub fn add(&self, other: &Poly) -> Poly {
        self.merge_with(other, Rat::clone)
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        self.merge_with(other, |c| -c)
    }

    pub fn neg(&self) -> Poly {
        self.scale(&-&Rat::one())
    }

    pub fn scale(&self, q: &Rat) -> Poly {
        if q.is_zero() {
            return Poly::zero();
        }
        Poly {
            constant: &self.constant * q,
            monos: self.monos.iter().map(|(x, c)| (*x, c * q)).collect(),
        }
    }

    /// `self + q * other`.
    pub fn add_scaled(&self, q: &Rat, other: &Poly) -> Poly {
        if q.is_zero() {
            return self.clone();
        }
        self.merge_with(other, |c| c * q)
    }

    pub fn add_constant(&self, q: &Rat) -> Poly {
        Poly {
            constant: &self.constant + q,
            monos: self.monos.clone(),
        }
    }

    /// `self` with `x` replaced by `p`. No-op when `x` does not occur.
    pub fn subst(&self, x: Var, p: &Poly) -> Poly {
        match self.coeff(x) {
            None => self.clone(),
            Some(c) => {
                let c = c.clone();
                let mut without = self.clone();
                without
                    .monos
                    .retain(|(y, _)| *y != x);
                without.merge_with(p, |d| d * &c)
            }
        }
    }

    /// Solves `lhs = rhs` for `x`, which must occur in `lhs - rhs`.
    pub fn solve_for(x: Var, lhs: &Poly, rhs: &Poly) -> Poly {
        lhs.sub(rhs).isolate(x)
    }

    /// Solves `self = 0` for `x`, which must occur in `self`.
    pub fn isolate(&self, x: Var) -> Poly {
        let c = self.coeff(x).expect("isolated variable must occur").clone();
        let mut rest = self.clone();
        rest.monos.retain(|(y, _)| *y != x);
        rest.scale(&-&c.recip())
    }

    /// Solves `self = 0` over the rationals, isolating the greatest variable.
    /// Under the variable order this prefers a non-slack variable whenever
    /// one occurs.
    pub fn qsolve(&self) -> Solved {
        match self.max_var() {
            None => {
                if self.constant.is_zero() {
                    Solved::Valid
                } else {
                    Solved::Inconsistent
                }
            }
            Some(x) => Solved::Solution(x, self.isolate(x)),
        }
    }

    /// Solves `self = 0` over the integers. Every solved form binds one
    /// original variable to a combination of fresh integer parameters drawn
    /// from `fresh`.
    pub fn zsolve(&self, fresh: impl FnMut() -> Poly) -> diophantine::DioSolution<Poly> {
        let p = self.clear_denominators();
        let coeffs: Vec<BigInt> = p.monos.iter().map(|(_, c)| c.to_bigint()).collect();
        let b = -p.constant.to_bigint();
        diophantine::zsolve(&coeffs, &b, fresh)
    }

    /// Scales so that every coefficient and the constant become integral.
    pub fn clear_denominators(&self) -> Poly {
        let mut l = BigInt::one();
        for (_, c) in &self.monos {
            l = diophantine::lcm(&l, c.denom());
        }
        l = diophantine::lcm(&l, self.constant.denom());
        self.scale(&Rat::from_bigint(l))
    }

    /// Scales so that the variable coefficients become integral with gcd one;
    /// the constant follows the same scaling and may stay fractional. Used to
    /// put diophantine disequalities `e != n` into their reduced form.
    pub fn reduce(&self) -> Poly {
        if self.monos.is_empty() {
            return self.clone();
        }
        let mut l = BigInt::one();
        for (_, c) in &self.monos {
            l = diophantine::lcm(&l, c.denom());
        }
        let scaled = self.scale(&Rat::from_bigint(l));
        let coeffs: Vec<BigInt> = scaled.monos.iter().map(|(_, c)| c.to_bigint()).collect();
        let g = diophantine::gcd_all(&coeffs);
        if g.is_one() {
            scaled
        } else {
            scaled.scale(&Rat::from_bigint(g).recip())
        }
    }

    /// Splits into the sub-polynomials over slack and non-slack variables.
    /// The constant stays with the restricted part.
    pub fn split_restricted(&self) -> (Poly, Poly) {
        let mut restricted = Poly::constant(self.constant.clone());
        let mut unrestricted = Poly::zero();
        for (x, c) in &self.monos {
            if x.is_slack() {
                restricted.monos.push((*x, c.clone()));
            } else {
                unrestricted.monos.push((*x, c.clone()));
            }
        }
        (restricted, unrestricted)
    }
}

impl Combination for Poly {
    fn of_int(n: BigInt) -> Self {
        Poly::constant(Rat::from_bigint(n))
    }

    fn add_scaled(&self, q: &Rat, other: &Self) -> Self {
        Poly::add_scaled(self, q, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::var::{Dom, VarStore};

    fn setup() -> (VarStore, Var, Var) {
        let mut vars = VarStore::new();
        let x = vars.external("x");
        let y = vars.external("y");
        (vars, x, y)
    }

    fn q(n: i64) -> Rat {
        Rat::from(n)
    }

    #[test]
    fn add_cancels() {
        let (_, x, y) = setup();
        let a = Poly::var(x).add(&Poly::monomial(y, q(2)));
        let b = Poly::var(x).neg().add_constant(&q(5));
        let sum = a.add(&b);
        assert_eq!(sum, Poly::monomial(y, q(2)).add_constant(&q(5)));
        assert!(!sum.contains(x));
    }

    #[test]
    fn subst_is_linear() {
        let (_, x, y) = setup();
        // (3x + 1)[x := 2y - 1] = 6y - 2
        let a = Poly::monomial(x, q(3)).add_constant(&q(1));
        let p = Poly::monomial(y, q(2)).add_constant(&q(-1));
        assert_eq!(
            a.subst(x, &p),
            Poly::monomial(y, q(6)).add_constant(&q(-2))
        );
    }

    #[test]
    fn isolate_inverts() {
        let (_, x, y) = setup();
        // 2x - 4y + 6 = 0  ==>  x = 2y - 3
        let d = Poly::monomial(x, q(2))
            .add(&Poly::monomial(y, q(-4)))
            .add_constant(&q(6));
        let p = d.isolate(x);
        assert_eq!(p, Poly::monomial(y, q(2)).add_constant(&q(-3)));
        assert_eq!(d.subst(x, &p), Poly::zero());
    }

    #[test]
    fn qsolve_prefers_nonslack() {
        let (mut vars, x, _) = setup();
        let k = vars.fresh_slack(Dom::Real);
        let d = Poly::var(k).sub(&Poly::var(x)).add_constant(&q(1));
        match d.qsolve() {
            Solved::Solution(v, p) => {
                assert_eq!(v, x);
                assert_eq!(p, Poly::var(k).add_constant(&q(1)));
            }
            _ => panic!("expected a solved form"),
        }
    }

    #[test]
    fn least_monomials_respect_var_order() {
        let (mut vars, x, _) = setup();
        let k = vars.fresh_slack(Dom::Real);
        let a = Poly::monomial(x, q(1)).add(&Poly::monomial(k, q(2)));
        assert_eq!(a.least_pos().map(|(v, _)| v), Some(k));
    }

    #[test]
    fn reduce_clears_and_divides() {
        let (_, x, y) = setup();
        // (2/3)x + 2y - 4/3  ~~>  x + 3y - 2
        let a = Poly::monomial(x, Rat::new(2, 3))
            .add(&Poly::monomial(y, q(2)))
            .add_constant(&Rat::new(-4, 3));
        let r = a.reduce();
        assert_eq!(
            r,
            Poly::var(x)
                .add(&Poly::monomial(y, q(3)))
                .add_constant(&q(-2))
        );
    }

    #[test]
    fn zsolve_parameterises() {
        let (_, x, y) = setup();
        // 2x + 3y = 7
        let d = Poly::monomial(x, q(2))
            .add(&Poly::monomial(y, q(3)))
            .add_constant(&q(-7));
        let mut next = 0u32;
        let sol = d.zsolve(|| {
            next += 1;
            Poly::var(Var::Rename(1000 + next))
        });
        match sol {
            crate::num::diophantine::DioSolution::Solved(sols) => {
                assert_eq!(sols.len(), 2);
                // Substituting the solved forms back must cancel the equation.
                let recombined = sols[0].scale(&q(2)).add(&sols[1].scale(&q(3)));
                assert_eq!(recombined, Poly::constant(q(7)));
            }
            _ => panic!("2x + 3y = 7 is solvable"),
        }
    }
}
