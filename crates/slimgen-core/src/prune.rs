//! File-granular pruning of the corpus
//!
//! A unit survives if it declares at least one reachable type. Kept units
//! are kept whole, including any unreachable types that share the file.

use std::collections::BTreeSet;

use tracing::trace;

use crate::corpus::Corpus;
use crate::frontend::{Frontend, TreeId};
use crate::symbol::TypeSymbol;

/// Result of pruning a corpus
#[derive(Debug, Clone)]
pub struct PruneOutcome<T> {
    pub corpus: Corpus<T>,
    /// Indices into the original corpus, in corpus order
    pub retained: Vec<usize>,
    pub dropped: Vec<usize>,
}

/// Filter `corpus` down to the units declaring a type in `reachable`
///
/// `compilation` is the one `corpus` was bound into (unit `i` is tree `i`).
pub fn prune<F: Frontend>(
    frontend: &F,
    compilation: &F::Compilation,
    corpus: &Corpus<F::Tree>,
    reachable: &BTreeSet<TypeSymbol>,
) -> Result<PruneOutcome<F::Tree>, F::Error> {
    let mut retained = Vec::new();
    let mut dropped = Vec::new();

    for index in 0..corpus.len() {
        if declares_reachable_type(frontend, compilation, TreeId(index), reachable)? {
            retained.push(index);
        } else {
            trace!("Dropping {}", corpus.units()[index].path().display());
            dropped.push(index);
        }
    }

    let keep: BTreeSet<usize> = retained.iter().copied().collect();
    Ok(PruneOutcome {
        corpus: corpus.retain_indices(|i| keep.contains(&i)),
        retained,
        dropped,
    })
}

fn declares_reachable_type<F: Frontend>(
    frontend: &F,
    compilation: &F::Compilation,
    tree: TreeId,
    reachable: &BTreeSet<TypeSymbol>,
) -> Result<bool, F::Error> {
    for node in frontend.nodes(compilation, tree)? {
        if let Some(declared) = frontend.declared_symbol_of(compilation, tree, node)? {
            if reachable.contains(&declared) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
