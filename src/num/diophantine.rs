//! Linear Diophantine equations.
//!
//! Solves `c1*x1 + ... + cn*xn = b` over the integers. A particular solution
//! is found with the extended Euclidean algorithm; the general solution is
//! the particular one shifted along the n-1 basis vectors
//! `(c2, -c1, 0, ...)`, `(0, c3, -c2, 0, ...)`, ..., each scaled by a fresh
//! integer parameter.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use super::Rat;

/// Extended Euclid: returns `(g, x, y)` with `a*x + b*y = g` and `g > 0` the
/// greatest common divisor of `a` and `b`. At most one of `a`, `b` may be zero.
pub fn euclid(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut r0, mut r1) = (a.clone(), b.clone());
    let (mut s0, mut s1) = (BigInt::one(), BigInt::zero());
    let (mut t0, mut t1) = (BigInt::zero(), BigInt::one());
    while !r1.is_zero() {
        let q = &r0 / &r1;
        let r = &r0 - &q * &r1;
        r0 = std::mem::replace(&mut r1, r);
        let s = &s0 - &q * &s1;
        s0 = std::mem::replace(&mut s1, s);
        let t = &t0 - &q * &t1;
        t0 = std::mem::replace(&mut t1, t);
    }
    if r0.is_negative() {
        (-r0, -s0, -t0)
    } else {
        (r0, s0, t0)
    }
}

pub fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    euclid(a, b).0
}

/// Gcd of a nonempty coefficient list.
pub fn gcd_all(cl: &[BigInt]) -> BigInt {
    let mut g = cl[0].abs();
    for c in &cl[1..] {
        g = gcd(&g, c);
    }
    g
}

pub fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
    (a * b / gcd(a, b)).abs()
}

/// What the general solver needs from its solution representation: a linear
/// combination of fresh parameters with rational coefficients.
pub trait Combination: Clone {
    fn of_int(n: BigInt) -> Self;
    /// `self + q * other`.
    fn add_scaled(&self, q: &Rat, other: &Self) -> Self;
}

/// Outcome of solving a linear Diophantine equation.
pub enum DioSolution<P> {
    /// `0 = 0` after normalisation.
    Valid,
    /// The gcd of the coefficients does not divide the right-hand side.
    Inconsistent,
    /// One solved combination per input coefficient, over the fresh
    /// parameters drawn from the supplied generator.
    Solved(Vec<P>),
}

/// Solves `cl . xs = b` over the integers. Coefficients must be nonzero.
pub fn zsolve<P, F>(cl: &[BigInt], b: &BigInt, mut fresh: F) -> DioSolution<P>
where
    P: Combination,
    F: FnMut() -> P,
{
    if cl.is_empty() {
        return if b.is_zero() {
            DioSolution::Valid
        } else {
            DioSolution::Inconsistent
        };
    }
    let d = gcd_all(cl);
    if !(b % &d).is_zero() {
        return DioSolution::Inconsistent;
    }
    let particular = particular(cl, b);
    let mut sol: Vec<P> = particular.into_iter().map(P::of_int).collect();
    for i in 0..cl.len() - 1 {
        let k = fresh();
        let up = Rat::from_bigint(&cl[i + 1] / &d);
        let down = Rat::from_bigint(-(&cl[i] / &d));
        sol[i] = sol[i].add_scaled(&up, &k);
        sol[i + 1] = sol[i + 1].add_scaled(&down, &k);
    }
    DioSolution::Solved(sol)
}

/// A particular integer solution of `cl . xs = b`, assuming `gcd(cl) | b`.
///
/// Recursion on the coefficient list: `(c0, c1, rest)` is reduced to
/// `(gcd(c0, c1), rest)` and the Bezout multipliers of `euclid(c0, c1)`
/// distribute the head solution back over `c0` and `c1`.
fn particular(cl: &[BigInt], b: &BigInt) -> Vec<BigInt> {
    match cl {
        [c0] => vec![b / c0],
        [c0, c1, rest @ ..] => {
            let (d, e1, e2) = euclid(c0, c1);
            let mut reduced = Vec::with_capacity(rest.len() + 1);
            reduced.push(d);
            reduced.extend_from_slice(rest);
            let tail = particular(&reduced, b);
            let mut out = Vec::with_capacity(cl.len());
            out.push(&e1 * &tail[0]);
            out.push(&e2 * &tail[0]);
            out.extend_from_slice(&tail[1..]);
            out
        }
        [] => unreachable!("empty coefficient list"),
    }
}
