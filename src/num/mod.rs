//! Exact rational arithmetic.
//!
//! Every quantity the engine manipulates is a [`Rat`]: an arbitrary-precision
//! rational kept in lowest terms. Equality is exact and the order is total,
//! which the pivoting rules and the variable order depend on.

pub mod diophantine;

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Exact rational scalar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rat(BigRational);

impl Rat {
    pub fn zero() -> Self {
        Rat(BigRational::zero())
    }

    pub fn one() -> Self {
        Rat(BigRational::one())
    }

    /// `n / d`. Panics if `d` is zero.
    pub fn new(n: i64, d: i64) -> Self {
        Rat(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    pub fn from_bigint(n: BigInt) -> Self {
        Rat(BigRational::from_integer(n))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.0.is_one()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// `true` iff the denominator is one.
    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn floor(&self) -> Rat {
        Rat(self.0.floor())
    }

    pub fn ceil(&self) -> Rat {
        Rat(self.0.ceil())
    }

    /// Fractional part `self - floor(self)`, in `[0, 1)`.
    pub fn frac(&self) -> Rat {
        Rat(&self.0 - self.0.floor())
    }

    /// Deficit `ceil(self) - self`, in `[0, 1)`.
    pub fn def(&self) -> Rat {
        Rat(self.0.ceil() - &self.0)
    }

    /// Multiplicative inverse. Panics on zero.
    pub fn recip(&self) -> Rat {
        Rat(self.0.recip())
    }

    pub fn abs(&self) -> Rat {
        Rat(self.0.abs())
    }

    /// The integer value of an integral rational. Panics if `!self.is_integer()`.
    pub fn to_bigint(&self) -> BigInt {
        assert!(self.is_integer());
        self.0.to_integer()
    }

    pub fn sign(&self) -> Ordering {
        if self.0.is_zero() {
            Ordering::Equal
        } else if self.0.is_positive() {
            Ordering::Greater
        } else {
            Ordering::Less
        }
    }
}

impl Default for Rat {
    fn default() -> Self {
        Rat::zero()
    }
}

impl From<i64> for Rat {
    fn from(n: i64) -> Self {
        Rat(BigRational::from_integer(BigInt::from(n)))
    }
}

impl fmt::Display for Rat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! binop {
    ($trait_:ident, $method:ident, $op:tt) => {
        impl $trait_ for Rat {
            type Output = Rat;
            fn $method(self, rhs: Rat) -> Rat {
                Rat(self.0 $op rhs.0)
            }
        }

        impl<'a> $trait_<&'a Rat> for &'a Rat {
            type Output = Rat;
            fn $method(self, rhs: &'a Rat) -> Rat {
                Rat(&self.0 $op &rhs.0)
            }
        }
    };
}

binop!(Add, add, +);
binop!(Sub, sub, -);
binop!(Mul, mul, *);
binop!(Div, div, /);

impl AddAssign<&Rat> for Rat {
    fn add_assign(&mut self, rhs: &Rat) {
        self.0 = &self.0 + &rhs.0;
    }
}

impl SubAssign<&Rat> for Rat {
    fn sub_assign(&mut self, rhs: &Rat) {
        self.0 = &self.0 - &rhs.0;
    }
}

impl Neg for Rat {
    type Output = Rat;
    fn neg(self) -> Rat {
        Rat(-self.0)
    }
}

impl Neg for &Rat {
    type Output = Rat;
    fn neg(self) -> Rat {
        Rat(-&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_ceil_frac_def() {
        let q = Rat::new(7, 3);
        assert_eq!(q.floor(), Rat::from(2));
        assert_eq!(q.ceil(), Rat::from(3));
        assert_eq!(q.frac(), Rat::new(1, 3));
        assert_eq!(q.def(), Rat::new(2, 3));

        let r = Rat::new(-7, 3);
        assert_eq!(r.floor(), Rat::from(-3));
        assert_eq!(r.ceil(), Rat::from(-2));
        assert_eq!(r.frac(), Rat::new(2, 3));
        assert_eq!(r.def(), Rat::new(1, 3));
    }

    #[test]
    fn integer_detection() {
        assert!(Rat::new(4, 2).is_integer());
        assert!(!Rat::new(1, 2).is_integer());
        assert_eq!(Rat::new(4, 2), Rat::from(2));
    }

    #[test]
    fn sign_and_order() {
        assert_eq!(Rat::new(-1, 2).sign(), Ordering::Less);
        assert_eq!(Rat::zero().sign(), Ordering::Equal);
        assert!(Rat::new(1, 3) < Rat::new(1, 2));
    }
}
