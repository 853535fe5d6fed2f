//! Functional arrays.

use crate::justify::{Answer, Deps};
use crate::partition::Partition;
use crate::term::{App, Lookup};

use super::{FlatSolutions, Normal};

/// Sigma-normalises `a[i]` by stepping through update chains:
/// `update(b, j, v)[i]` is `v` when `i = j` is known and `b[i]` when
/// `i != j` is known. The walk stops at the first undecided index pair.
pub fn sigma(lookup: &Lookup, arrays: &FlatSolutions, partition: &Partition) -> Normal {
    let mut deps = Deps::none();
    let mut array = lookup.array;
    loop {
        let Some((App::Update(u), d)) = arrays.find(array) else {
            break;
        };
        match partition.is_equal(lookup.index, u.index) {
            Answer::Yes(tau) => {
                return Normal::Var(u.value, deps.union(d).union(&tau));
            }
            Answer::No(tau) => {
                deps.extend(d);
                deps.extend(&tau);
                array = u.array;
            }
            Answer::Unknown => break,
        }
    }
    Normal::App(
        Lookup {
            array,
            index: lookup.index,
        }
        .into(),
        deps,
    )
}
