//! Type-reachability pruning and the two-pass compilation driver for slimgen

pub mod corpus;
pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod frontend;
pub mod imports;
pub mod loader;
pub mod prune;
pub mod reachability;
pub mod request;
pub mod symbol;
pub mod usage;

pub use driver::{BuildOutput, BuildReport, Builder};
pub use error::BuildError;
pub use frontend::{Diagnostic, Diagnostics, Frontend, NodeId, TreeId};
pub use request::{CompilationRequest, OutputKind, Platform, TargetVersion};
pub use symbol::{Symbol, TypeSymbol};
