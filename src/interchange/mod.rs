//! Reading and writing EDMX documents.
//!
//! ```text
//! ┌──────────────┐   read_fragment    ┌──────────┐   load_document   ┌──────────────────┐
//! │  XML bytes   │ ─────────────────▶ │ Fragment │ ────────────────▶ │ ResolutionEngine │
//! └──────────────┘ ◀───────────────── └──────────┘ ◀──────────────── └──────────────────┘
//!                    write_fragment                    to_fragment
//! ```
//!
//! Findings can be exported for diagnostics tooling with
//! [`findings_to_json`].
//!
//! ## Usage
//!
//! ```ignore
//! use edmx::ResolutionEngine;
//! use edmx::interchange::load_file;
//!
//! let mut engine = ResolutionEngine::new();
//! load_file(&mut engine, "Model.edmx")?;
//! engine.commit_edit()?;
//! for finding in engine.validate() {
//!     println!("{}: {}", finding.code, finding.message);
//! }
//! ```

mod error;
mod load;
mod report;
mod xml;

pub use error::InterchangeError;
pub use load::{load_document, load_file, save_artifact};
pub use report::findings_to_json;
pub use xml::{read_fragment, write_fragment};
