//! Fully-qualified type identities shared by every pass of a build
//!
//! A frontend hands out symbols that belong to one compilation. Two
//! compilations of the same sources produce symbols that describe the same
//! type but cannot be compared directly, so every symbol is normalized to a
//! [`TypeSymbol`] keyed by its qualified name as soon as it is retrieved.
//!
//! ## Formats
//!
//! - Namespaced: `SharpSploit.Execution.Shell`
//! - Nested: `SharpSploit.Execution.Win32.Kernel32` (namespace `SharpSploit.Execution`, name `Win32.Kernel32`)
//! - Global: `Program`
//!
//! ## Usage
//!
//! ```
//! use slimgen_core::symbol::TypeSymbol;
//!
//! let sym = TypeSymbol::new("SharpSploit.Execution", "Shell");
//! assert_eq!(sym.qualified_name(), "SharpSploit.Execution.Shell");
//! assert_eq!(sym.containing_namespace(), "SharpSploit.Execution");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A named type, identified by namespace path plus type name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSymbol {
    /// Containing namespace (empty for the global namespace)
    namespace: String,
    /// Type name, including enclosing type names for nested types
    name: String,
    /// Cached `namespace.name`
    qualified: String,
}

/// Errors that can occur while parsing a qualified type name
#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolError {
    #[error("Empty qualified name")]
    Empty,

    #[error("Invalid qualified name: {0}")]
    InvalidFormat(String),
}

impl TypeSymbol {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        let qualified = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", namespace, name)
        };
        Self {
            namespace,
            name,
            qualified,
        }
    }

    /// Parse a qualified name, treating the last segment as the type name
    ///
    /// Nesting cannot be recovered from the text alone, so `A.B.C` always
    /// parses as namespace `A.B` and type `C`. The qualified name (and so
    /// equality) is unaffected.
    pub fn parse(qualified: &str) -> Result<Self, SymbolError> {
        let qualified = qualified.trim();
        if qualified.is_empty() {
            return Err(SymbolError::Empty);
        }
        if qualified.split('.').any(|part| part.is_empty()) {
            return Err(SymbolError::InvalidFormat(qualified.to_string()));
        }

        Ok(match qualified.rsplit_once('.') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::new("", qualified),
        })
    }

    /// The normalized key used for every set and map in a build
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace an import directive would have to name for this type
    pub fn containing_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Symbol for a type nested directly inside this one
    pub fn nested(&self, name: &str) -> Self {
        Self::new(self.namespace.clone(), format!("{}.{}", self.name, name))
    }
}

impl PartialEq for TypeSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.qualified == other.qualified
    }
}

impl Eq for TypeSymbol {}

impl Hash for TypeSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified.hash(state);
    }
}

impl PartialOrd for TypeSymbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeSymbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.qualified.cmp(&other.qualified)
    }
}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified)
    }
}

/// What a frontend resolves at a single syntax position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// A reference that names a type
    Type(TypeSymbol),
    /// A method, field, property or constructor of a type
    Member {
        containing_type: TypeSymbol,
        name: String,
    },
    Namespace(String),
    /// Locals, parameters and other symbols that belong to no type
    Local(String),
}

impl Symbol {
    /// The type whose declaration this reference depends on
    ///
    /// A type-name reference depends on the type itself. Namespaces and
    /// locals depend on nothing.
    pub fn containing_type(&self) -> Option<&TypeSymbol> {
        match self {
            Symbol::Type(ty) => Some(ty),
            Symbol::Member {
                containing_type, ..
            } => Some(containing_type),
            Symbol::Namespace(_) | Symbol::Local(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_qualified_name_namespaced() {
        let sym = TypeSymbol::new("SharpSploit.Execution", "Shell");
        assert_eq!(sym.qualified_name(), "SharpSploit.Execution.Shell");
        assert_eq!(sym.name(), "Shell");
        assert!(!sym.is_global());
    }

    #[test]
    fn test_qualified_name_global() {
        let sym = TypeSymbol::new("", "Program");
        assert_eq!(sym.qualified_name(), "Program");
        assert_eq!(sym.containing_namespace(), "");
        assert!(sym.is_global());
    }

    #[test]
    fn test_parse() {
        let sym = TypeSymbol::parse("System.Collections.Generic.List").unwrap();
        assert_eq!(sym.containing_namespace(), "System.Collections.Generic");
        assert_eq!(sym.name(), "List");

        let global = TypeSymbol::parse("Program").unwrap();
        assert!(global.is_global());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(TypeSymbol::parse(""), Err(SymbolError::Empty)));
        assert!(matches!(TypeSymbol::parse("  "), Err(SymbolError::Empty)));
        assert!(matches!(
            TypeSymbol::parse("A..B"),
            Err(SymbolError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_equality_is_by_qualified_name() {
        // Nested `Outer.Inner` in `N` and a parsed `N.Outer.Inner` are the same type
        let nested = TypeSymbol::new("N", "Outer").nested("Inner");
        let parsed = TypeSymbol::parse("N.Outer.Inner").unwrap();
        assert_eq!(nested, parsed);

        let mut set = HashSet::new();
        set.insert(nested);
        assert!(!set.insert(parsed));
    }

    #[test]
    fn test_containing_type() {
        let helper = TypeSymbol::new("Lib", "Helper");
        assert_eq!(
            Symbol::Type(helper.clone()).containing_type(),
            Some(&helper)
        );
        let member = Symbol::Member {
            containing_type: helper.clone(),
            name: "Run".to_string(),
        };
        assert_eq!(member.containing_type(), Some(&helper));
        assert_eq!(Symbol::Namespace("Lib".into()).containing_type(), None);
        assert_eq!(Symbol::Local("x".into()).containing_type(), None);
    }
}
