//! IVTC Project - The editorial project model
//!
//! Implements the mutable project aggregate for inverse-telecine authoring:
//! - Per-frame matches and metrics, per-cycle decimation
//! - Sections, presets, custom lists, freeze frames, bookmarks
//! - Cadence inference from matches, mics, or dmetrics
//! - Snapshot-based undo/redo
//! - The versioned project document format

pub mod collections;
pub mod collector;
pub mod edit;
pub mod guess;
pub mod project;
pub mod serialization;
pub mod undo;

pub use collections::{CustomListsModel, SectionsModel};
pub use collector::FrameSample;
pub use project::{ModifiedObserver, Project, DEFAULT_UNDO_STEPS};
pub use serialization::{read_project, write_project, PROJECT_FORMAT_VERSION};
