//! IVTC Core - Foundation types for inverse-telecine authoring
//!
//! This crate provides the fundamental types used throughout the workspace:
//! - Match characters and their metric index mappings
//! - Frame ranges, sections, presets, custom lists
//! - Crop/resize/bit-depth settings
//! - Pattern-guessing configuration
//! - The shared error type

pub mod error;
pub mod match_char;
pub mod types;

pub use error::{ProjectError, Result};
pub use match_char::Match;
pub use types::{
    find_containing_range, is_valid_script_name, Bookmark, Crop, CustomList, DecimationPatternRange,
    DecimationRange, Depth, DropDuplicate, FailedPatternGuessing, FrameRange, FreezeFrame,
    ImportedThings, InterlacedFade, OrphanField, PatternGuessing, PatternGuessingFailureReason,
    PatternGuessingMethod, Patterns, PositionInFilterChain, Preset, Resize, Section,
    UseThirdNMatch,
};

/// Frames per decimation cycle. Decimation always operates on groups of
/// five consecutive source frames.
pub const CYCLE_LENGTH: i32 = 5;
