//! Engine options

/// Behaviour switches for a [`ResolutionEngine`](super::ResolutionEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "interchange",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EngineOptions {
    /// Report declared names that are not valid identifiers.
    pub validate_identifiers: bool,
    /// Re-resolve Undefined bindings when the symbol they looked up becomes
    /// declared (a type added after its users, a document loaded later).
    pub rebind_waiting_references: bool,
    /// Separator between entries of list references (`TypeName`).
    pub list_separator: char,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            validate_identifiers: true,
            rebind_waiting_references: true,
            list_separator: ';',
        }
    }
}

#[cfg(feature = "interchange")]
impl EngineOptions {
    /// Read options from JSON; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
