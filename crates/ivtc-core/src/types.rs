//! Primitive record types of the project model.

use std::collections::{BTreeMap, BTreeSet};

use crate::match_char::Match;

/// An inclusive range of source frames. Addressed by `first` when stored in
/// a range map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub first: i32,
    pub last: i32,
}

impl FrameRange {
    /// Create a range, swapping the endpoints if given in reverse order.
    pub fn new(first: i32, last: i32) -> Self {
        if first <= last {
            Self { first, last }
        } else {
            Self {
                first: last,
                last: first,
            }
        }
    }

    #[inline]
    pub fn contains(&self, frame: i32) -> bool {
        self.first <= frame && frame <= self.last
    }
}

/// Locate the range whose `[first, last]` interval contains `frame`.
///
/// The map is keyed by `FrameRange::first`; the candidate is the greatest
/// key not above `frame`.
pub fn find_containing_range(
    ranges: &BTreeMap<i32, FrameRange>,
    frame: i32,
) -> Option<&FrameRange> {
    let (_, range) = ranges.range(..=frame).next_back()?;
    range.contains(frame).then_some(range)
}

/// A range of frames replaced by a single frame's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeFrame {
    pub first: i32,
    pub last: i32,
    pub replacement: i32,
}

/// A named snippet of processing-engine code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    /// Must be usable as a function name in the generated script.
    pub name: String,
    pub contents: String,
}

/// A contiguous run of frames sharing a preset stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub start: i32,
    /// Preset names, in user-defined order. The same preset may appear
    /// more than once.
    pub presets: Vec<String>,
}

impl Section {
    pub fn new(start: i32) -> Self {
        Self {
            start,
            presets: Vec::new(),
        }
    }
}

/// Where in the filter chain a custom list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PositionInFilterChain {
    PostSource,
    PostFieldMatch,
    PostDecimate,
}

/// A named set of frame ranges to which one preset is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomList {
    pub name: String,
    /// Preset name; may be empty (no preset assigned yet).
    pub preset: String,
    pub position: PositionInFilterChain,
    /// Keyed by `FrameRange::first`. Ranges never overlap.
    pub ranges: BTreeMap<i32, FrameRange>,
}

impl CustomList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preset: String::new(),
            position: PositionInFilterChain::PostSource,
            ranges: BTreeMap::new(),
        }
    }
}

/// Output resize settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resize {
    pub enabled: bool,
    pub width: i32,
    pub height: i32,
    pub filter: String,
}

impl Default for Resize {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 0,
            height: 0,
            filter: "spline16".to_string(),
        }
    }
}

/// Crop settings. `early` moves the crop before field matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crop {
    pub enabled: bool,
    pub early: bool,
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Output bit depth settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depth {
    pub enabled: bool,
    pub bits: i32,
    pub float_samples: bool,
    pub dither: String,
}

impl Default for Depth {
    fn default() -> Self {
        Self {
            enabled: false,
            bits: 8,
            float_samples: false,
            dither: String::new(),
        }
    }
}

/// A run of cycles sharing the same number of dropped frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimationRange {
    pub start: i32,
    pub num_dropped: usize,
}

/// A run of cycles sharing the exact same set of dropped offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimationPatternRange {
    pub start: i32,
    pub dropped_offsets: BTreeSet<u8>,
}

/// A frame the user wants to come back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub frame: i32,
    pub description: String,
}

/// A frame whose two fields differ enough to suggest a field-level fade.
#[derive(Debug, Clone, PartialEq)]
pub struct InterlacedFade {
    pub frame: i32,
    pub field_difference: f64,
}

/// A section-boundary frame whose match pulls a field from the adjacent
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrphanField {
    pub field_match: Match,
    pub decimated: bool,
}

/// Third-n-match policy for the from-matches guesser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseThirdNMatch {
    Always,
    Never,
    IfPrettier,
}

/// Which of the two duplicates in a cycle gets dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropDuplicate {
    First,
    Second,
    UglierPerCycle,
    UglierPerSection,
}

/// Information source for pattern guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternGuessingMethod {
    Matches,
    Mics,
    DMetrics,
    MicsAndDMetrics,
}

/// Why pattern guessing failed for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternGuessingFailureReason {
    SectionTooShort,
    AmbiguousMatchPattern,
}

/// Record of a section the guesser could not handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedPatternGuessing {
    pub start: i32,
    pub reason: PatternGuessingFailureReason,
}

/// Bitmask of cadences the guesser is allowed to consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patterns(u8);

impl Patterns {
    pub const CCCNN: Patterns = Patterns(1 << 0);
    pub const CCNNN: Patterns = Patterns(1 << 1);
    pub const CCCCC: Patterns = Patterns(1 << 2);

    pub const fn empty() -> Self {
        Patterns(0)
    }

    pub const fn all() -> Self {
        Patterns(1 << 0 | 1 << 1 | 1 << 2)
    }

    #[inline]
    pub fn contains(self, other: Patterns) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Patterns) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Patterns {
    type Output = Patterns;

    fn bitor(self, rhs: Patterns) -> Patterns {
        Patterns(self.0 | rhs.0)
    }
}

/// Pattern-guessing configuration plus the per-section failure records.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternGuessing {
    pub method: PatternGuessingMethod,
    pub minimum_length: i32,
    pub third_n_match: UseThirdNMatch,
    pub decimation: DropDuplicate,
    pub use_patterns: Patterns,
    /// Keyed by `FailedPatternGuessing::start`.
    pub failures: BTreeMap<i32, FailedPatternGuessing>,
}

impl Default for PatternGuessing {
    fn default() -> Self {
        Self {
            method: PatternGuessingMethod::Mics,
            minimum_length: 10,
            third_n_match: UseThirdNMatch::Never,
            decimation: DropDuplicate::First,
            use_patterns: Patterns::all(),
            failures: BTreeMap::new(),
        }
    }
}

/// What to pull in when importing from another project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportedThings {
    pub geometry: bool,
    pub presets: bool,
    pub custom_lists: bool,
    pub crop: bool,
    pub resize: bool,
    pub bit_depth: bool,
    pub mic_search: bool,
    pub zoom: bool,
}

/// Check that a name can become a function name in the generated script:
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_script_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    name.chars().enumerate().all(|(i, c)| {
        c.is_ascii_alphabetic() || c == '_' || (i > 0 && c.is_ascii_digit())
    })
}
