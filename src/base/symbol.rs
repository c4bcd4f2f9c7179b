//! Normalized, comparable identities for model elements.
//!
//! A [`Symbol`] is the dotted form of a name after normalization
//! (`Model.Customer.Id`), optionally tagged with a scope that keeps otherwise
//! identical names apart (designer properties live in their own section).
//! Equality is structural: two symbols built from the same text are equal no
//! matter which node produced them.

use smol_str::SmolStr;

/// Separator between the parts of a qualified symbol.
pub const SEPARATOR: char = '.';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    name: SmolStr,
    scope: Option<SmolStr>,
}

impl Symbol {
    /// The placeholder for a blank name. Never registered, never resolves.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: SmolStr::new(name.as_ref().trim()),
            scope: None,
        }
    }

    /// Build a symbol from its parts, skipping blank ones.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = String::new();
        for part in parts {
            let part = part.as_ref().trim();
            if part.is_empty() {
                continue;
            }
            if !joined.is_empty() {
                joined.push(SEPARATOR);
            }
            joined.push_str(part);
        }
        Self {
            name: SmolStr::from(joined),
            scope: None,
        }
    }

    pub fn scoped(name: impl AsRef<str>, scope: impl AsRef<str>) -> Self {
        let scope = scope.as_ref().trim();
        Self {
            name: SmolStr::new(name.as_ref().trim()),
            scope: (!scope.is_empty()).then(|| SmolStr::new(scope)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.name.split(SEPARATOR).filter(|p| !p.is_empty())
    }

    /// The unqualified tail (`Id` for `Model.Customer.Id`).
    pub fn last_part(&self) -> &str {
        self.name
            .rsplit(SEPARATOR)
            .next()
            .unwrap_or(self.name.as_str())
    }

    /// The enclosing symbol (`Model.Customer` for `Model.Customer.Id`).
    pub fn parent(&self) -> Option<Symbol> {
        let (head, _) = self.name.rsplit_once(SEPARATOR)?;
        Some(Self {
            name: SmolStr::new(head),
            scope: self.scope.clone(),
        })
    }

    /// Append one part, keeping the scope. An empty self yields just `part`;
    /// a blank `part` yields the empty symbol.
    pub fn child(&self, part: impl AsRef<str>) -> Symbol {
        let part = part.as_ref().trim();
        if part.is_empty() {
            return Symbol::empty();
        }
        let name = if self.name.is_empty() {
            SmolStr::new(part)
        } else {
            SmolStr::from(format!("{}{SEPARATOR}{part}", self.name))
        };
        Self {
            name,
            scope: self.scope.clone(),
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}::{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
