//! An online, incremental decision procedure for the quantifier-free
//! combination of linear rational arithmetic with uninterpreted function
//! symbols, tuples, and functional arrays.
//!
//! Clients submit a stream of formulas through a [`Context`]; after each
//! submission the engine reports [`Status::Sat`], [`Status::Unsat`] with an
//! unsat core, or [`Status::Unknown`] when propositional case splits are
//! still pending (forced by [`Context::resolve`]). Canonical forms, extremal
//! bounds, and inferred equalities are available through `can`, `sup`/`inf`,
//! and `find`/`inv`.
//!
//! ```
//! use satcore::{Context, Formula, Status};
//!
//! let mut ctx = Context::new();
//! let x = ctx.var("x");
//! let y = ctx.var("y");
//! let three = Context::num(3);
//! let sum = ctx.add(&x, &y);
//! assert!(matches!(ctx.process(Formula::eq(sum, three)), Status::Sat(_)));
//! ```

pub mod context;
pub mod fact;
pub mod justify;
pub mod num;
pub mod partition;
pub mod propagate;
pub mod simplex;
pub mod term;
pub mod theory;

#[cfg(test)]
pub mod tests;

use serde::{Deserialize, Serialize};

pub use context::Context;
pub use fact::{Atom, Formula};
pub use justify::{Answer, Inconsistent, Unbounded};
pub use num::Rat;
pub use term::Term;

/// Names of the component theories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Theory {
    /// Linear arithmetic.
    A,
    /// Uninterpreted function symbols.
    U,
    /// Tuples and projections.
    T,
    /// Functional arrays.
    F,
}

/// Status of the logical context after an assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The context is satisfiable; carries the processed formula.
    Sat(Formula),
    /// The context is unsatisfiable; carries the unsat core, a subset of
    /// the asserted formulas.
    Unsat(Vec<Formula>),
    /// Undecided: propagation ran to completion but case splits are
    /// pending, or a resource limit stopped `resolve`.
    Unknown,
}

impl Status {
    pub fn is_sat(&self) -> bool {
        matches!(self, Status::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, Status::Unsat(_))
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Make [`Context::valid`] complete by case-splitting inside the test.
    pub complete_tests: bool,
    /// Report unsat cores; when off, `Unsat` carries an empty core.
    pub unsat_cores: bool,
    /// Branch budget for [`Context::resolve`]; exhausting it yields
    /// `Unknown`.
    pub split_limit: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            complete_tests: false,
            unsat_cores: true,
            split_limit: None,
        }
    }
}
