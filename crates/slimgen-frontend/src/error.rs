use slimgen_core::frontend::{NodeId, TreeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Tree {0:?} is not part of this compilation")]
    UnknownTree(TreeId),

    #[error("Node {node:?} does not exist in tree {tree:?}")]
    UnknownNode { tree: TreeId, node: NodeId },

    #[error("Invalid artifact: {0}")]
    Artifact(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrontendError>;
