//! The project aggregate.
//!
//! Owns every collection and per-frame array, and is the single entry point
//! for all edits. Operations validate first and mutate second, so a returned
//! error always leaves the project unchanged.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use ivtc_core::{
    DecimationPatternRange, DecimationRange, FrameRange, Match, PatternGuessing, ProjectError,
    Result, CYCLE_LENGTH,
};

use crate::collections::{CustomListsModel, SectionsModel};
use crate::undo::UndoStep;

/// Callback invoked whenever the modified flag flips.
pub type ModifiedObserver = Box<dyn Fn(bool) + Send>;

/// Default depth of the undo history.
pub const DEFAULT_UNDO_STEPS: usize = 100;

/// The editorial project: input description, per-frame arrays, collections,
/// and undo history.
pub struct Project {
    /// Full editorial project vs metrics-only collector output.
    pub(crate) wobbly: bool,

    pub(crate) input_file: String,
    pub(crate) source_filter: String,
    pub(crate) fps_num: i64,
    pub(crate) fps_den: i64,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) num_frames_source: i32,
    pub(crate) num_frames_decimated: i32,

    pub(crate) trims: BTreeMap<i32, FrameRange>,

    pub(crate) vfm_parameters_int: BTreeMap<String, i64>,
    pub(crate) vfm_parameters_double: BTreeMap<String, f64>,
    pub(crate) vfm_parameters_bool: BTreeMap<String, bool>,
    pub(crate) vdecimate_parameters_int: BTreeMap<String, i64>,
    pub(crate) vdecimate_parameters_double: BTreeMap<String, f64>,
    pub(crate) vdecimate_parameters_bool: BTreeMap<String, bool>,

    // Per-frame arrays. `None` means the metric was never collected;
    // getters answer with neutral values so a fresh project still works.
    pub(crate) matches: Option<Vec<Match>>,
    pub(crate) original_matches: Option<Vec<Match>>,
    pub(crate) mics: Option<Vec<[i16; 5]>>,
    pub(crate) mmetrics: Option<Vec<[i32; 2]>>,
    pub(crate) vmetrics: Option<Vec<[i32; 2]>>,
    pub(crate) decimate_metrics: Option<Vec<i32>>,

    /// One set of dropped offsets per five-frame cycle.
    pub(crate) decimated_frames: Vec<BTreeSet<u8>>,

    pub(crate) combed_frames: BTreeSet<i32>,
    pub(crate) orphan_fields: BTreeMap<i32, ivtc_core::OrphanField>,
    pub(crate) sections: SectionsModel,
    pub(crate) presets: BTreeMap<String, ivtc_core::Preset>,
    pub(crate) custom_lists: CustomListsModel,
    pub(crate) frozen_frames: BTreeMap<i32, ivtc_core::FreezeFrame>,
    pub(crate) bookmarks: BTreeMap<i32, ivtc_core::Bookmark>,
    pub(crate) interlaced_fades: BTreeMap<i32, ivtc_core::InterlacedFade>,

    pub(crate) pattern_guessing: PatternGuessing,

    pub(crate) resize: ivtc_core::Resize,
    pub(crate) crop: ivtc_core::Crop,
    pub(crate) depth: ivtc_core::Depth,

    // Editor state carried by the document format.
    pub(crate) zoom: i32,
    pub(crate) last_visited_frame: i32,
    pub(crate) ui_state: String,
    pub(crate) ui_geometry: String,
    /// Which of 30/24/18/12/6 fps are shown in the rate overview.
    pub(crate) shown_frame_rates: [bool; 5],
    pub(crate) mic_search_minimum: i32,
    pub(crate) dmetric_search_minimum: i32,
    pub(crate) c_match_sequences_minimum: i32,
    pub(crate) freeze_frames_wanted: bool,

    pub(crate) undo_stack: VecDeque<UndoStep>,
    pub(crate) redo_stack: VecDeque<UndoStep>,
    pub(crate) undo_steps: usize,

    pub(crate) modified: bool,
    pub(crate) on_modified: Option<ModifiedObserver>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("wobbly", &self.wobbly)
            .field("input_file", &self.input_file)
            .field("source_filter", &self.source_filter)
            .field("fps_num", &self.fps_num)
            .field("fps_den", &self.fps_den)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("num_frames_source", &self.num_frames_source)
            .field("num_frames_decimated", &self.num_frames_decimated)
            .field("trims", &self.trims)
            .field("matches", &self.matches)
            .field("original_matches", &self.original_matches)
            .field("mics", &self.mics)
            .field("mmetrics", &self.mmetrics)
            .field("vmetrics", &self.vmetrics)
            .field("decimate_metrics", &self.decimate_metrics)
            .field("decimated_frames", &self.decimated_frames)
            .field("combed_frames", &self.combed_frames)
            .field("orphan_fields", &self.orphan_fields)
            .field("sections", &self.sections)
            .field("presets", &self.presets)
            .field("custom_lists", &self.custom_lists)
            .field("frozen_frames", &self.frozen_frames)
            .field("bookmarks", &self.bookmarks)
            .field("interlaced_fades", &self.interlaced_fades)
            .field("pattern_guessing", &self.pattern_guessing)
            .field("resize", &self.resize)
            .field("crop", &self.crop)
            .field("depth", &self.depth)
            .field("zoom", &self.zoom)
            .field("last_visited_frame", &self.last_visited_frame)
            .field("ui_state", &self.ui_state)
            .field("ui_geometry", &self.ui_geometry)
            .field("shown_frame_rates", &self.shown_frame_rates)
            .field("mic_search_minimum", &self.mic_search_minimum)
            .field("dmetric_search_minimum", &self.dmetric_search_minimum)
            .field("c_match_sequences_minimum", &self.c_match_sequences_minimum)
            .field("freeze_frames_wanted", &self.freeze_frames_wanted)
            .field("undo_steps", &self.undo_steps)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

fn cycle_count(num_frames: i32) -> usize {
    if num_frames <= 0 {
        0
    } else {
        ((num_frames - 1) / CYCLE_LENGTH + 1) as usize
    }
}

impl Project {
    /// Create a project for a freshly opened clip.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wobbly: bool,
        input_file: impl Into<String>,
        source_filter: impl Into<String>,
        fps_num: i64,
        fps_den: i64,
        width: i32,
        height: i32,
        num_frames: i32,
    ) -> Self {
        let mut project = Self::empty(wobbly);
        project.input_file = input_file.into();
        project.source_filter = source_filter.into();
        project.fps_num = fps_num;
        project.fps_den = fps_den;
        project.width = width;
        project.height = height;
        project.num_frames_source = num_frames;
        project.num_frames_decimated = num_frames;
        project.decimated_frames = vec![BTreeSet::new(); cycle_count(num_frames)];

        // Field order defaults to top field first until the matcher says
        // otherwise.
        project
            .vfm_parameters_int
            .insert("order".to_string(), 1);
        project.sections.insert(ivtc_core::Section::new(0));
        project.resize.width = width;
        project.resize.height = height;

        project.modified = false;
        project
    }

    /// A bare project, used by the document reader before it fills in every
    /// field. Not published until fully populated.
    pub(crate) fn empty(wobbly: bool) -> Self {
        Self {
            wobbly,
            input_file: String::new(),
            source_filter: String::new(),
            fps_num: 0,
            fps_den: 0,
            width: 0,
            height: 0,
            num_frames_source: 0,
            num_frames_decimated: 0,
            trims: BTreeMap::new(),
            vfm_parameters_int: BTreeMap::new(),
            vfm_parameters_double: BTreeMap::new(),
            vfm_parameters_bool: BTreeMap::new(),
            vdecimate_parameters_int: BTreeMap::new(),
            vdecimate_parameters_double: BTreeMap::new(),
            vdecimate_parameters_bool: BTreeMap::new(),
            matches: None,
            original_matches: None,
            mics: None,
            mmetrics: None,
            vmetrics: None,
            decimate_metrics: None,
            decimated_frames: Vec::new(),
            combed_frames: BTreeSet::new(),
            orphan_fields: BTreeMap::new(),
            sections: SectionsModel::new(),
            presets: BTreeMap::new(),
            custom_lists: CustomListsModel::new(),
            frozen_frames: BTreeMap::new(),
            bookmarks: BTreeMap::new(),
            interlaced_fades: BTreeMap::new(),
            pattern_guessing: PatternGuessing::default(),
            resize: ivtc_core::Resize::default(),
            crop: ivtc_core::Crop::default(),
            depth: ivtc_core::Depth::default(),
            zoom: 1,
            last_visited_frame: 0,
            ui_state: String::new(),
            ui_geometry: String::new(),
            shown_frame_rates: [true, false, true, true, true],
            mic_search_minimum: 20,
            dmetric_search_minimum: 10,
            c_match_sequences_minimum: 20,
            freeze_frames_wanted: true,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            undo_steps: DEFAULT_UNDO_STEPS,
            modified: false,
            on_modified: None,
        }
    }

    // ── Basic accessors ─────────────────────────────────────────────

    pub fn is_wobbly(&self) -> bool {
        self.wobbly
    }

    pub fn input_file(&self) -> &str {
        &self.input_file
    }

    pub fn source_filter(&self) -> &str {
        &self.source_filter
    }

    pub fn set_source_filter(&mut self, filter: impl Into<String>) {
        self.source_filter = filter.into();
    }

    pub fn frame_rate(&self) -> (i64, i64) {
        (self.fps_num, self.fps_den)
    }

    pub fn resolution(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn num_frames_source(&self) -> i32 {
        self.num_frames_source
    }

    pub fn num_frames_decimated(&self) -> i32 {
        self.num_frames_decimated
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Flip the modified flag, notifying the registered observer on change.
    pub fn set_modified(&mut self, modified: bool) {
        if self.modified != modified {
            self.modified = modified;
            if let Some(observer) = &self.on_modified {
                observer(modified);
            }
        }
    }

    /// Register the observer notified when the modified flag changes.
    pub fn set_modified_observer(&mut self, observer: ModifiedObserver) {
        self.on_modified = Some(observer);
    }

    pub(crate) fn check_frame(&self, frame: i32) -> Result<()> {
        if frame < 0 || frame >= self.num_frames_source {
            return Err(ProjectError::OutOfRange(format!("frame {frame}")));
        }
        Ok(())
    }

    // ── Trims ───────────────────────────────────────────────────────

    /// Record a trim range; endpoints may come in either order.
    pub fn add_trim(&mut self, first: i32, last: i32) {
        let range = FrameRange::new(first, last);
        self.trims.insert(range.first, range);
    }

    pub fn trims(&self) -> &BTreeMap<i32, FrameRange> {
        &self.trims
    }

    // ── Matcher / decimator parameters ──────────────────────────────

    pub fn set_vfm_parameter_int(&mut self, name: impl Into<String>, value: i64) {
        self.vfm_parameters_int.insert(name.into(), value);
    }

    pub fn set_vfm_parameter_double(&mut self, name: impl Into<String>, value: f64) {
        self.vfm_parameters_double.insert(name.into(), value);
    }

    pub fn set_vfm_parameter_bool(&mut self, name: impl Into<String>, value: bool) {
        self.vfm_parameters_bool.insert(name.into(), value);
    }

    pub fn vfm_parameter_int(&self, name: &str) -> Option<i64> {
        self.vfm_parameters_int.get(name).copied()
    }

    pub fn vfm_parameter_double(&self, name: &str) -> Option<f64> {
        self.vfm_parameters_double.get(name).copied()
    }

    pub fn vfm_parameter_bool(&self, name: &str) -> Option<bool> {
        self.vfm_parameters_bool.get(name).copied()
    }

    pub fn set_vdecimate_parameter_int(&mut self, name: impl Into<String>, value: i64) {
        self.vdecimate_parameters_int.insert(name.into(), value);
    }

    pub fn set_vdecimate_parameter_double(&mut self, name: impl Into<String>, value: f64) {
        self.vdecimate_parameters_double.insert(name.into(), value);
    }

    pub fn set_vdecimate_parameter_bool(&mut self, name: impl Into<String>, value: bool) {
        self.vdecimate_parameters_bool.insert(name.into(), value);
    }

    pub fn vdecimate_parameter_int(&self, name: &str) -> Option<i64> {
        self.vdecimate_parameters_int.get(name).copied()
    }

    pub fn vdecimate_parameter_double(&self, name: &str) -> Option<f64> {
        self.vdecimate_parameters_double.get(name).copied()
    }

    pub fn vdecimate_parameter_bool(&self, name: &str) -> Option<bool> {
        self.vdecimate_parameters_bool.get(name).copied()
    }

    // ── Matches ─────────────────────────────────────────────────────

    /// The effective match: the edited array, falling back to the
    /// collector's original matches, falling back to `c`.
    pub fn get_match(&self, frame: i32) -> Result<Match> {
        self.check_frame(frame)?;
        Ok(self.match_at(frame))
    }

    pub(crate) fn match_at(&self, frame: i32) -> Match {
        if let Some(matches) = &self.matches {
            matches[frame as usize]
        } else if let Some(original) = &self.original_matches {
            original[frame as usize]
        } else {
            Match::C
        }
    }

    /// Store a match, coercing characters that are impossible at the clip
    /// boundaries: frame 0 has no previous field (`b → n`, `p → u`), the
    /// final frame has no next field (`n → b`, `u → p`).
    pub fn set_match(&mut self, frame: i32, mut m: Match) -> Result<()> {
        self.check_frame(frame)?;

        if frame == 0 {
            m = match m {
                Match::B => Match::N,
                Match::P => Match::U,
                other => other,
            };
        } else if frame == self.num_frames_source - 1 {
            m = match m {
                Match::N => Match::B,
                Match::U => Match::P,
                other => other,
            };
        }

        let n = self.num_frames_source as usize;
        let matches = self.matches.get_or_insert_with(|| vec![Match::C; n]);
        matches[frame as usize] = m;
        Ok(())
    }

    pub fn get_original_match(&self, frame: i32) -> Result<Match> {
        self.check_frame(frame)?;
        Ok(self
            .original_matches
            .as_ref()
            .map(|o| o[frame as usize])
            .unwrap_or(Match::C))
    }

    pub fn set_original_match(&mut self, frame: i32, m: Match) -> Result<()> {
        self.check_frame(frame)?;
        let n = self.num_frames_source as usize;
        let original = self
            .original_matches
            .get_or_insert_with(|| vec![Match::C; n]);
        original[frame as usize] = m;
        Ok(())
    }

    /// Rotate through `c → n → b → p → u`, skipping matches the frame's
    /// position forbids. Terminates within five steps.
    pub fn cycle_match(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;
        let last = self.num_frames_source - 1;
        let mut m = self.match_at(frame);

        loop {
            m = m.successor();
            if frame == 0 && (m == Match::B || m == Match::P) {
                continue;
            }
            if frame == last && (m == Match::N || m == Match::U) {
                continue;
            }
            break;
        }

        self.set_match(frame, m)?;
        self.set_modified(true);
        Ok(())
    }

    /// Rotate through the short cycle `c → n → b`.
    pub fn cycle_match_cnb(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;
        let last = self.num_frames_source - 1;
        let mut m = self.match_at(frame);

        loop {
            m = m.successor_cnb();
            if frame == 0 && m == Match::B {
                continue;
            }
            if frame == last && m == Match::N {
                continue;
            }
            break;
        }

        self.set_match(frame, m)?;
        self.set_modified(true);
        Ok(())
    }

    /// The match characters to feed the field-hint step, if any exist.
    pub fn matches_string(&self) -> Option<String> {
        self.matches
            .as_ref()
            .or(self.original_matches.as_ref())
            .map(|m| m.iter().map(|m| m.to_char()).collect())
    }

    pub fn has_matches(&self) -> bool {
        self.matches.is_some() || self.original_matches.is_some()
    }

    /// Apply a repeating match pattern across an inclusive frame range.
    ///
    /// The pattern is indexed by absolute frame number, so the cadence
    /// stays phase-locked no matter where the range starts. Boundary
    /// coercion: frame 0 skips `p`/`b` candidates, the final source frame
    /// turns `n` into `b` and skips `u`, and the last frame of the range
    /// turns `n` into `b` so the range does not reference a field beyond
    /// its end.
    pub fn set_range_matches_from_pattern(
        &mut self,
        start: i32,
        end: i32,
        pattern: &str,
    ) -> Result<()> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        if start < 0 || end >= self.num_frames_source {
            return Err(ProjectError::OutOfRange(format!("frames [{start},{end}]")));
        }

        let pattern: Vec<Match> = pattern
            .chars()
            .map(Match::from_char)
            .collect::<Result<_>>()?;
        if pattern.is_empty() {
            return Err(ProjectError::OutOfRange("empty match pattern".to_string()));
        }

        let last_frame = self.num_frames_source - 1;

        for i in start..=end {
            let candidate = pattern[i as usize % pattern.len()];

            if i == 0 && (candidate == Match::P || candidate == Match::B) {
                continue;
            }

            if i == last_frame && (candidate == Match::N || candidate == Match::U) {
                if candidate == Match::N {
                    self.set_match(i, Match::B)?;
                }
                continue;
            }

            if i == end && candidate == Match::N {
                self.set_match(i, Match::B)?;
            } else {
                self.set_match(i, candidate)?;
            }
        }

        self.set_modified(true);
        Ok(())
    }

    /// Apply a repeating decimation pattern (`d` drops the frame) across an
    /// inclusive frame range.
    pub fn set_range_decimation_from_pattern(
        &mut self,
        start: i32,
        end: i32,
        pattern: &str,
    ) -> Result<()> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        if start < 0 || end >= self.num_frames_source {
            return Err(ProjectError::OutOfRange(format!("frames [{start},{end}]")));
        }

        let pattern: Vec<char> = pattern.chars().collect();
        if pattern.is_empty() {
            return Err(ProjectError::OutOfRange(
                "empty decimation pattern".to_string(),
            ));
        }

        for i in start..=end {
            if pattern[i as usize % pattern.len()] == 'd' {
                self.add_decimated_frame(i)?;
            } else {
                self.delete_decimated_frame(i)?;
            }
        }

        self.set_modified(true);
        Ok(())
    }

    /// Restore the matches over an inclusive range from the collector's
    /// original matches, or to `c` when none were collected.
    pub fn reset_range_matches(&mut self, start: i32, end: i32) -> Result<()> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        if start < 0 || end >= self.num_frames_source {
            return Err(ProjectError::OutOfRange(format!("frames [{start},{end}]")));
        }

        let n = self.num_frames_source as usize;
        let original = self.original_matches.clone();
        let matches = self.matches.get_or_insert_with(|| vec![Match::C; n]);

        let (start, end) = (start as usize, end as usize);
        match &original {
            Some(original) => matches[start..=end].copy_from_slice(&original[start..=end]),
            None => matches[start..=end].fill(Match::C),
        }

        self.set_modified(true);
        Ok(())
    }

    /// All maximal runs of `c` matches at least `minimum` long, keyed by
    /// their start frame. Falls back to the original matches when nothing
    /// has been edited yet; with no match data at all the entire clip is
    /// one implicit `c` run.
    pub fn get_c_match_sequences(&self, minimum: i32) -> BTreeMap<i32, i32> {
        let mut sequences = BTreeMap::new();
        let minimum = minimum.max(0);

        let source = self.matches.as_ref().or(self.original_matches.as_ref());

        match source {
            Some(source) => {
                let mut start = 0i32;
                let mut length = 0i32;

                for (i, m) in source.iter().enumerate() {
                    if *m == Match::C {
                        if length == 0 {
                            start = i as i32;
                        }
                        length += 1;
                    } else {
                        if length >= minimum && length > 0 {
                            sequences.insert(start, length);
                        }
                        length = 0;
                    }
                }

                if length >= minimum && length > 0 {
                    sequences.insert(start, length);
                }
            }
            None => {
                if self.num_frames_source >= minimum && self.num_frames_source > 0 {
                    sequences.insert(0, self.num_frames_source);
                }
            }
        }

        sequences
    }

    // ── Metrics ─────────────────────────────────────────────────────

    pub fn get_mics(&self, frame: i32) -> Result<[i16; 5]> {
        self.check_frame(frame)?;
        Ok(self.mics_at(frame))
    }

    pub(crate) fn mics_at(&self, frame: i32) -> [i16; 5] {
        self.mics
            .as_ref()
            .map(|m| m[frame as usize])
            .unwrap_or([0; 5])
    }

    pub fn set_mics(&mut self, frame: i32, mics: [i16; 5]) -> Result<()> {
        self.check_frame(frame)?;
        let n = self.num_frames_source as usize;
        let array = self.mics.get_or_insert_with(|| vec![[0; 5]; n]);
        array[frame as usize] = mics;
        Ok(())
    }

    pub fn get_mmetrics(&self, frame: i32) -> Result<[i32; 2]> {
        self.check_frame(frame)?;
        Ok(self.mmetrics_at(frame))
    }

    pub(crate) fn mmetrics_at(&self, frame: i32) -> [i32; 2] {
        self.mmetrics
            .as_ref()
            .map(|m| m[frame as usize])
            .unwrap_or([0; 2])
    }

    pub fn get_vmetrics(&self, frame: i32) -> Result<[i32; 2]> {
        self.check_frame(frame)?;
        Ok(self.vmetrics_at(frame))
    }

    pub(crate) fn vmetrics_at(&self, frame: i32) -> [i32; 2] {
        self.vmetrics
            .as_ref()
            .map(|m| m[frame as usize])
            .unwrap_or([0; 2])
    }

    /// Store both dmetric pairs for a frame.
    pub fn set_dmetrics(
        &mut self,
        frame: i32,
        mmetric_p: i32,
        mmetric_c: i32,
        vmetric_p: i32,
        vmetric_c: i32,
    ) -> Result<()> {
        self.check_frame(frame)?;
        let n = self.num_frames_source as usize;

        let mmetrics = self.mmetrics.get_or_insert_with(|| vec![[0; 2]; n]);
        mmetrics[frame as usize] = [mmetric_p, mmetric_c];

        let vmetrics = self.vmetrics.get_or_insert_with(|| vec![[0; 2]; n]);
        vmetrics[frame as usize] = [vmetric_p, vmetric_c];
        Ok(())
    }

    pub fn get_decimate_metric(&self, frame: i32) -> Result<i32> {
        self.check_frame(frame)?;
        Ok(self
            .decimate_metrics
            .as_ref()
            .map(|m| m[frame as usize])
            .unwrap_or(0))
    }

    pub fn set_decimate_metric(&mut self, frame: i32, metric: i32) -> Result<()> {
        self.check_frame(frame)?;
        let n = self.num_frames_source as usize;
        let array = self.decimate_metrics.get_or_insert_with(|| vec![0; n]);
        array[frame as usize] = metric;
        Ok(())
    }

    /// Mic of the effective match at `frame`, relative to its neighbours:
    /// the minimum rise over the previous and next frames, or the absolute
    /// value at the clip edge.
    fn mic_prominence(&self, frame: i32) -> i32 {
        let n = self.num_frames_source;
        let prev_idx = (frame - 1).max(0);
        let next_idx = (frame + 1).min(n - 1);

        let mic = |f: i32| i32::from(self.mics_at(f)[self.match_at(f).mic_index()]);

        let curr = mic(frame);
        if frame == prev_idx || frame == next_idx {
            curr
        } else {
            (curr - mic(prev_idx)).min(curr - mic(next_idx))
        }
    }

    fn vmetric_prominence(&self, frame: i32) -> i32 {
        let n = self.num_frames_source;
        let prev_idx = (frame - 1).max(0);
        let next_idx = (frame + 1).min(n - 1);

        let vmet = |f: i32| self.vmetrics_at(f)[self.match_at(f).dmetric_index()];

        let curr = vmet(frame);
        if frame == prev_idx || frame == next_idx {
            curr
        } else {
            (curr - vmet(prev_idx)).min(curr - vmet(next_idx))
        }
    }

    /// The nearest earlier frame whose mic prominence reaches `minimum`.
    pub fn previous_frame_with_mic(&self, minimum: i32, start_frame: i32) -> Result<Option<i32>> {
        self.check_frame(start_frame)?;
        Ok((0..start_frame)
            .rev()
            .find(|&i| self.mic_prominence(i) >= minimum))
    }

    /// The nearest later frame whose mic prominence reaches `minimum`.
    pub fn next_frame_with_mic(&self, minimum: i32, start_frame: i32) -> Result<Option<i32>> {
        self.check_frame(start_frame)?;
        Ok((start_frame + 1..self.num_frames_source)
            .find(|&i| self.mic_prominence(i) >= minimum))
    }

    pub fn previous_frame_with_dmetric(
        &self,
        minimum: i32,
        start_frame: i32,
    ) -> Result<Option<i32>> {
        self.check_frame(start_frame)?;
        Ok((0..start_frame)
            .rev()
            .find(|&i| self.vmetric_prominence(i) >= minimum))
    }

    pub fn next_frame_with_dmetric(&self, minimum: i32, start_frame: i32) -> Result<Option<i32>> {
        self.check_frame(start_frame)?;
        Ok((start_frame + 1..self.num_frames_source)
            .find(|&i| self.vmetric_prominence(i) >= minimum))
    }

    // ── Decimation ──────────────────────────────────────────────────

    pub(crate) fn is_decimated(&self, frame: i32) -> bool {
        self.decimated_frames[(frame / CYCLE_LENGTH) as usize]
            .contains(&((frame % CYCLE_LENGTH) as u8))
    }

    pub fn is_decimated_frame(&self, frame: i32) -> Result<bool> {
        self.check_frame(frame)?;
        Ok(self.is_decimated(frame))
    }

    /// Mark a frame for decimation. Dropping all five frames of a cycle is
    /// forbidden; the fifth request is silently ignored.
    pub fn add_decimated_frame(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;

        let cycle = &mut self.decimated_frames[(frame / CYCLE_LENGTH) as usize];
        if cycle.len() == (CYCLE_LENGTH - 1) as usize {
            return Ok(());
        }

        if cycle.insert((frame % CYCLE_LENGTH) as u8) {
            self.num_frames_decimated -= 1;
            self.set_modified(true);
        }
        Ok(())
    }

    pub fn delete_decimated_frame(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;

        let cycle = &mut self.decimated_frames[(frame / CYCLE_LENGTH) as usize];
        if cycle.remove(&((frame % CYCLE_LENGTH) as u8)) {
            self.num_frames_decimated += 1;
            self.set_modified(true);
        }
        Ok(())
    }

    /// Remove every drop from the cycle containing `frame`.
    pub fn clear_decimated_frames_from_cycle(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;

        let cycle = &mut self.decimated_frames[(frame / CYCLE_LENGTH) as usize];
        let removed = cycle.len() as i32;
        cycle.clear();
        self.num_frames_decimated += removed;
        Ok(())
    }

    pub fn decimated_frames(&self) -> &[BTreeSet<u8>] {
        &self.decimated_frames
    }

    /// Runs of cycles with the same drop count. Starts advance whenever the
    /// per-cycle count changes; a project with no drops yields `[{0, 0}]`.
    pub fn get_decimation_ranges(&self) -> Vec<DecimationRange> {
        let mut ranges: Vec<DecimationRange> = Vec::new();

        for (i, cycle) in self.decimated_frames.iter().enumerate() {
            if ranges.last().map(|r| r.num_dropped) != Some(cycle.len()) {
                ranges.push(DecimationRange {
                    start: i as i32 * CYCLE_LENGTH,
                    num_dropped: cycle.len(),
                });
            }
        }

        ranges
    }

    /// Runs of cycles with the exact same drop offsets.
    pub fn get_decimation_pattern_ranges(&self) -> Vec<DecimationPatternRange> {
        let mut ranges: Vec<DecimationPatternRange> = Vec::new();

        for (i, cycle) in self.decimated_frames.iter().enumerate() {
            if ranges.last().map(|r| &r.dropped_offsets) != Some(cycle) {
                ranges.push(DecimationPatternRange {
                    start: i as i32 * CYCLE_LENGTH,
                    dropped_offsets: cycle.clone(),
                });
            }
        }

        ranges
    }

    /// Translate a source frame number into the numbering after decimation.
    ///
    /// Counts the surviving frames before `frame`. Inputs below zero clamp
    /// to 0, inputs past the end clamp to the decimated frame count; the
    /// final source frame maps to the last surviving frame even when it is
    /// itself dropped.
    pub fn frame_number_after_decimation(&self, frame: i32) -> i32 {
        if frame < 0 {
            return 0;
        }
        if frame >= self.num_frames_source {
            return self.num_frames_decimated;
        }

        let cycle = (frame / CYCLE_LENGTH) as usize;
        let position = (frame % CYCLE_LENGTH) as u8;

        let mut out = cycle as i32 * CYCLE_LENGTH;
        for earlier in &self.decimated_frames[..cycle] {
            out -= earlier.len() as i32;
        }
        for offset in 0..position {
            if !self.decimated_frames[cycle].contains(&offset) {
                out += 1;
            }
        }

        if frame == self.num_frames_source - 1 && self.is_decimated(frame) {
            out -= 1;
        }

        out
    }

    /// Inverse of [`frame_number_after_decimation`]: the source frame that
    /// becomes output frame `frame`. Out-of-range inputs clamp to the
    /// nearest valid output frame.
    ///
    /// [`frame_number_after_decimation`]: Project::frame_number_after_decimation
    pub fn frame_number_before_decimation(&self, frame: i32) -> i32 {
        let mut remaining = frame.clamp(0, self.num_frames_decimated - 1);

        for (cycle, dropped) in self.decimated_frames.iter().enumerate() {
            for offset in 0..CYCLE_LENGTH as u8 {
                if !dropped.contains(&offset) {
                    remaining -= 1;
                }
                if remaining == -1 {
                    return cycle as i32 * CYCLE_LENGTH + offset as i32;
                }
            }
        }

        unreachable!("decimated frame count out of sync with the drop sets");
    }

    // ── Time display ────────────────────────────────────────────────

    /// Format a source frame's timestamp as `HH:MM:SS.mmm`.
    pub fn frame_to_time(&self, frame: i32) -> Result<String> {
        self.check_frame(frame)?;

        let frame = frame as i64;
        let milliseconds = (frame * self.fps_den * 1000 / self.fps_num) % 1000;
        let seconds_total = frame * self.fps_den / self.fps_num;
        let seconds = seconds_total % 60;
        let minutes = (seconds_total / 60) % 60;
        let hours = seconds_total / 3600;

        Ok(format!(
            "{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}"
        ))
    }

    // ── Editor state carried by the document ────────────────────────

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, ratio: i32) -> Result<()> {
        if ratio < 1 {
            return Err(ProjectError::OutOfRange(format!("zoom ratio {ratio}")));
        }
        self.zoom = ratio;
        Ok(())
    }

    pub fn last_visited_frame(&self) -> i32 {
        self.last_visited_frame
    }

    pub fn set_last_visited_frame(&mut self, frame: i32) {
        self.last_visited_frame = frame;
    }

    pub fn ui_state(&self) -> &str {
        &self.ui_state
    }

    pub fn set_ui_state(&mut self, state: impl Into<String>) {
        self.ui_state = state.into();
    }

    pub fn ui_geometry(&self) -> &str {
        &self.ui_geometry
    }

    pub fn set_ui_geometry(&mut self, geometry: impl Into<String>) {
        self.ui_geometry = geometry.into();
    }

    pub fn shown_frame_rates(&self) -> [bool; 5] {
        self.shown_frame_rates
    }

    pub fn set_shown_frame_rates(&mut self, rates: [bool; 5]) {
        self.shown_frame_rates = rates;
    }

    pub fn mic_search_minimum(&self) -> i32 {
        self.mic_search_minimum
    }

    pub fn set_mic_search_minimum(&mut self, minimum: i32) {
        self.mic_search_minimum = minimum;
    }

    pub fn dmetric_search_minimum(&self) -> i32 {
        self.dmetric_search_minimum
    }

    pub fn set_dmetric_search_minimum(&mut self, minimum: i32) {
        self.dmetric_search_minimum = minimum;
    }

    pub fn c_match_sequences_minimum(&self) -> i32 {
        self.c_match_sequences_minimum
    }

    pub fn set_c_match_sequences_minimum(&mut self, minimum: i32) {
        self.c_match_sequences_minimum = minimum;
    }

    pub fn freeze_frames_wanted(&self) -> bool {
        self.freeze_frames_wanted
    }

    pub fn set_freeze_frames_wanted(&mut self, wanted: bool) {
        self.freeze_frames_wanted = wanted;
    }

    // ── Output settings ─────────────────────────────────────────────

    pub fn resize(&self) -> &ivtc_core::Resize {
        &self.resize
    }

    pub fn set_resize(&mut self, width: i32, height: i32, filter: impl Into<String>) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(ProjectError::OutOfRange(format!(
                "resize dimensions {width}x{height}"
            )));
        }
        self.resize.width = width;
        self.resize.height = height;
        self.resize.filter = filter.into();
        self.set_modified(true);
        Ok(())
    }

    pub fn set_resize_enabled(&mut self, enabled: bool) {
        self.resize.enabled = enabled;
        self.set_modified(true);
    }

    pub fn is_resize_enabled(&self) -> bool {
        self.resize.enabled
    }

    pub fn crop(&self) -> &ivtc_core::Crop {
        &self.crop
    }

    pub fn set_crop(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> Result<()> {
        if left < 0 || top < 0 || right < 0 || bottom < 0 {
            return Err(ProjectError::OutOfRange(format!(
                "crop ({left},{top},{right},{bottom})"
            )));
        }
        self.crop.left = left;
        self.crop.top = top;
        self.crop.right = right;
        self.crop.bottom = bottom;
        self.set_modified(true);
        Ok(())
    }

    pub fn set_crop_enabled(&mut self, enabled: bool) {
        self.crop.enabled = enabled;
        self.set_modified(true);
    }

    pub fn is_crop_enabled(&self) -> bool {
        self.crop.enabled
    }

    pub fn set_crop_early(&mut self, early: bool) {
        self.crop.early = early;
        self.set_modified(true);
    }

    pub fn is_crop_early(&self) -> bool {
        self.crop.early
    }

    pub fn bit_depth(&self) -> &ivtc_core::Depth {
        &self.depth
    }

    pub fn set_bit_depth(&mut self, bits: i32, float_samples: bool, dither: impl Into<String>) {
        self.depth.bits = bits;
        self.depth.float_samples = float_samples;
        self.depth.dither = dither.into();
        self.set_modified(true);
    }

    pub fn set_bit_depth_enabled(&mut self, enabled: bool) {
        self.depth.enabled = enabled;
        self.set_modified(true);
    }

    pub fn is_bit_depth_enabled(&self) -> bool {
        self.depth.enabled
    }

    // ── Pattern guessing state ──────────────────────────────────────

    pub fn pattern_guessing(&self) -> &PatternGuessing {
        &self.pattern_guessing
    }

    /// The next section start with a recorded guessing failure, or `frame`
    /// when there is none.
    pub fn find_next_ambiguous_pattern_section(&self, frame: i32) -> i32 {
        self.pattern_guessing
            .failures
            .range(frame + 1..)
            .next()
            .map(|(start, _)| *start)
            .unwrap_or(frame)
    }

    pub fn find_previous_ambiguous_pattern_section(&self, frame: i32) -> i32 {
        self.pattern_guessing
            .failures
            .range(..frame)
            .next_back()
            .map(|(start, _)| *start)
            .unwrap_or(frame)
    }
}
