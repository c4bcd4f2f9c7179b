//! EDMX container handling.
//!
//! A designer `.edmx` file bundles the conceptual, storage and mapping
//! documents plus designer metadata under one root:
//!
//! ```text
//! Edmx
//! ├── Runtime
//! │   ├── StorageModels    → Schema   (storage artifact)
//! │   ├── ConceptualModels → Schema   (conceptual artifact)
//! │   └── Mappings         → Mapping  (mapping artifact)
//! └── Designer                        (designer artifact)
//! ```
//!
//! Each section becomes its own artifact in the resolution universe.

use super::fragment::Fragment;
use crate::base::ArtifactKind;

pub const EDMX_ROOT: &str = "Edmx";

/// Guess the artifact kind of a standalone document root.
///
/// Storage schemas are told apart from conceptual ones by their SSDL
/// namespace or by the `Provider` attribute only storage schemas carry.
pub fn detect_kind(root: &Fragment) -> Option<ArtifactKind> {
    match root.tag.as_str() {
        "Schema" => {
            let is_storage = root.attr("Provider").is_some()
                || root
                    .attributes
                    .iter()
                    .any(|(key, value)| key.starts_with("xmlns") && value.contains("/ssdl"));
            Some(if is_storage {
                ArtifactKind::Storage
            } else {
                ArtifactKind::Conceptual
            })
        }
        "Mapping" => Some(ArtifactKind::Mapping),
        "Designer" => Some(ArtifactKind::Designer),
        _ => None,
    }
}

/// Split a document into artifact roots.
///
/// An `Edmx` container yields one root per populated section in the order
/// storage, conceptual, mapping, designer as they appear. Any other
/// recognised root yields itself. Unrecognised roots yield nothing.
pub fn split_edmx(root: Fragment) -> Vec<(ArtifactKind, Fragment)> {
    if root.tag != EDMX_ROOT {
        return match detect_kind(&root) {
            Some(kind) => vec![(kind, root)],
            None => Vec::new(),
        };
    }

    let mut parts = Vec::new();
    for section in root.children {
        match section.tag.as_str() {
            "Runtime" => {
                for models in section.children {
                    let kind = match models.tag.as_str() {
                        "StorageModels" => ArtifactKind::Storage,
                        "ConceptualModels" => ArtifactKind::Conceptual,
                        "Mappings" => ArtifactKind::Mapping,
                        _ => continue,
                    };
                    for document in models.children {
                        parts.push((kind, document));
                    }
                }
            }
            "Designer" => parts.push((ArtifactKind::Designer, section)),
            _ => {}
        }
    }
    parts
}
