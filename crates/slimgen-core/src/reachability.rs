//! Transitive closure of the types an entry unit depends on
//!
//! Breadth-first over qualified names: each newly discovered type is mapped
//! back to the corpus unit(s) declaring it, and those units' own direct uses
//! feed the next frontier. The result is the fixed point of the
//! "referenced-by" relation, so traversal order never changes it.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::corpus::Corpus;
use crate::frontend::{Frontend, TreeId};
use crate::symbol::TypeSymbol;
use crate::usage::{direct_uses, UsageGraph, UsageNode};

/// Output of a reachability run
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    /// Every type reachable from the entry unit, by qualified name
    pub visited: BTreeSet<TypeSymbol>,
    /// Corpus units found to declare at least one visited type
    pub declaring_units: BTreeSet<usize>,
    pub graph: UsageGraph,
}

impl Reachability {
    pub fn contains(&self, ty: &TypeSymbol) -> bool {
        self.visited.contains(ty)
    }
}

/// Compute the reachable type set for the entry tree of `compilation`
///
/// `compilation` must have been bound from `corpus.compilation_trees(..)` so
/// corpus unit `i` is tree `i`. Declaring units are annotated in place.
pub fn reachable<F: Frontend>(
    frontend: &F,
    compilation: &F::Compilation,
    entry: TreeId,
    corpus: &mut Corpus<F::Tree>,
) -> Result<Reachability, F::Error> {
    let mut result = Reachability::default();
    let mut scanned: BTreeSet<usize> = BTreeSet::new();

    let mut frontier = direct_uses(frontend, compilation, entry)?;
    for ty in &frontier {
        result.graph.add_use(UsageNode::Entry, ty);
    }

    let mut pass = 0usize;
    while !frontier.is_empty() {
        pass += 1;
        let discovered: Vec<TypeSymbol> = frontier
            .into_iter()
            .filter(|ty| result.visited.insert(ty.clone()))
            .collect();
        trace!(pass, discovered = discovered.len(), "Reachability pass");

        let mut touched = BTreeSet::new();
        for ty in &discovered {
            let locations = frontend.declaring_locations_of(compilation, ty)?;
            if locations.is_empty() {
                trace!("{} is declared outside the corpus", ty);
                continue;
            }
            for location in locations {
                // Types declared in the entry tree itself need no further work
                let Some(index) = corpus.unit_index(location.tree) else {
                    continue;
                };
                corpus.units_mut()[index].declared.insert(ty.clone());
                result.graph.add_declaration(ty, index);
                result.declaring_units.insert(index);
                touched.insert(index);
            }
        }

        let mut next = BTreeSet::new();
        for index in touched {
            if !scanned.insert(index) {
                continue;
            }
            for used in direct_uses(frontend, compilation, TreeId(index))? {
                result.graph.add_use(UsageNode::Unit(index), &used);
                if !result.visited.contains(&used) {
                    next.insert(used);
                }
            }
        }
        frontier = next;
    }

    debug!(
        types = result.visited.len(),
        units = result.declaring_units.len(),
        passes = pass,
        "Reachability converged"
    );
    Ok(result)
}
