//! Removal of unused import directives from the entry unit
//!
//! Only the entry unit's *direct* uses count. A namespace reached through a
//! retained helper file still loses its import here if the entry code never
//! names one of its types itself.

use std::collections::BTreeSet;

use tracing::debug;

use crate::corpus::EntryUnit;
use crate::frontend::{Frontend, NodeId, TreeId};
use crate::usage::direct_uses;

/// The entry tree after trimming, with the namespaces whose imports were removed
#[derive(Debug, Clone)]
pub struct TrimOutcome<T> {
    pub entry: EntryUnit<T>,
    pub removed: Vec<String>,
}

/// Namespaces of the types the entry tree references directly
pub fn used_namespaces<F: Frontend>(
    frontend: &F,
    compilation: &F::Compilation,
    entry: TreeId,
) -> Result<BTreeSet<String>, F::Error> {
    Ok(direct_uses(frontend, compilation, entry)?
        .iter()
        .map(|ty| ty.containing_namespace().to_string())
        .collect())
}

/// Drop every import whose namespace the entry tree does not use directly
pub fn trim_imports<F: Frontend>(
    frontend: &F,
    compilation: &F::Compilation,
    entry_id: TreeId,
    entry: &EntryUnit<F::Tree>,
) -> Result<TrimOutcome<F::Tree>, F::Error> {
    let used = used_namespaces(frontend, compilation, entry_id)?;

    let mut unused: Vec<NodeId> = Vec::new();
    let mut removed = Vec::new();
    for directive in frontend.import_directives(&entry.tree) {
        if !used.contains(directive.namespace.trim()) {
            unused.push(directive.node);
            removed.push(directive.namespace);
        }
    }

    if unused.is_empty() {
        return Ok(TrimOutcome {
            entry: entry.clone(),
            removed,
        });
    }

    debug!(removed = ?removed, "Trimming unused imports from entry unit");
    Ok(TrimOutcome {
        entry: EntryUnit {
            tree: frontend.remove_nodes(&entry.tree, &unused),
        },
        removed,
    })
}
