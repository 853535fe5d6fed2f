//! Justifications.
//!
//! Every derived fact carries the set of asserted atoms it follows from, as a
//! sorted vector of atom indices. Combining facts unions the sets; when a
//! contradiction surfaces, the accumulated set is the unsat core.

use derive_more::{Display, Error};

/// Index of an asserted atom in the logical context.
pub type AtomId = u32;

/// A dependency set: the asserted atoms a derived fact follows from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deps {
    atoms: Vec<AtomId>,
}

impl Deps {
    pub fn none() -> Self {
        Deps::default()
    }

    pub fn atom(id: AtomId) -> Self {
        Deps { atoms: vec![id] }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.atoms.iter().copied()
    }

    pub fn union(&self, other: &Deps) -> Deps {
        let mut out = self.clone();
        out.extend(other);
        out
    }

    pub fn extend(&mut self, other: &Deps) {
        for id in &other.atoms {
            if let Err(i) = self.atoms.binary_search(id) {
                self.atoms.insert(i, *id);
            }
        }
    }
}

impl FromIterator<AtomId> for Deps {
    fn from_iter<I: IntoIterator<Item = AtomId>>(iter: I) -> Self {
        let mut out = Deps::none();
        for id in iter {
            out.extend(&Deps::atom(id));
        }
        out
    }
}

/// The current context refutes an asserted atom; `deps` is the unsat core.
#[derive(Debug, Clone, Display, Error, PartialEq, Eq)]
#[display("inconsistent context")]
pub struct Inconsistent {
    pub deps: Deps,
}

impl Inconsistent {
    pub fn new(deps: Deps) -> Self {
        Inconsistent { deps }
    }
}

/// A maximisation objective with no finite upper bound.
#[derive(Debug, Clone, Copy, Display, Error, PartialEq, Eq)]
#[display("unbounded objective")]
pub struct Unbounded;

/// Three-valued answer with justification on the decided cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes(Deps),
    No(Deps),
    Unknown,
}

impl Answer {
    /// Swaps the decided cases, keeping the justification.
    pub fn flip(self) -> Answer {
        match self {
            Answer::Yes(d) => Answer::No(d),
            Answer::No(d) => Answer::Yes(d),
            Answer::Unknown => Answer::Unknown,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Answer::Yes(_))
    }
}
