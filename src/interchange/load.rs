//! Loading documents into a [`ResolutionEngine`].

use std::path::Path;

use tracing::debug;

use super::InterchangeError;
use super::xml::{read_fragment, write_fragment};
use crate::base::{ArtifactId, ArtifactKind};
use crate::engine::ResolutionEngine;
use crate::syntax::split_edmx;

/// Read a document and load each artifact it holds.
///
/// A standalone schema, mapping or designer document yields one artifact
/// under `uri`. An `Edmx` container yields one artifact per section, named
/// `uri#conceptual`, `uri#storage` and so on. Nothing is parsed until the
/// caller commits, so several documents can be loaded in one transaction.
pub fn load_document(
    engine: &mut ResolutionEngine,
    uri: &str,
    input: &[u8],
) -> Result<Vec<ArtifactId>, InterchangeError> {
    let root = read_fragment(input)?;
    let root_tag = root.qualified_tag();
    let parts = split_edmx(root);
    if parts.is_empty() {
        return Err(InterchangeError::invalid_document(format!(
            "{uri}: <{root_tag}> is not a schema, mapping, designer or EDMX root"
        )));
    }

    let container = parts.len() > 1 || root_tag.ends_with("Edmx");
    let ids: Vec<ArtifactId> = parts
        .into_iter()
        .map(|(kind, fragment)| {
            let artifact_uri = if container {
                section_uri(uri, kind)
            } else {
                uri.to_string()
            };
            engine.load_artifact(artifact_uri, kind, fragment)
        })
        .collect();
    debug!("[INTERCHANGE] {uri}: {} artifacts", ids.len());
    Ok(ids)
}

/// Read a file from disk and load it with [`load_document`].
pub fn load_file(
    engine: &mut ResolutionEngine,
    path: impl AsRef<Path>,
) -> Result<Vec<ArtifactId>, InterchangeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    load_document(engine, &path.display().to_string(), &bytes)
}

/// Serialize an artifact as currently edited.
pub fn save_artifact(
    engine: &ResolutionEngine,
    artifact: ArtifactId,
) -> Result<Vec<u8>, InterchangeError> {
    let root = engine
        .artifacts()
        .artifact(artifact)
        .and_then(|a| a.root())
        .and_then(|root| engine.to_fragment(root))
        .ok_or_else(|| InterchangeError::missing_element(format!("root of {artifact}")))?;
    write_fragment(&root)
}

fn section_uri(uri: &str, kind: ArtifactKind) -> String {
    format!("{uri}#{}", kind.display())
}
