//! Snapshot-based undo/redo.
//!
//! Every committed edit pushes a full snapshot of the mutable parts of the
//! project. The bottom of the undo stack is the baseline state and is never
//! popped, so `undo` requires at least two entries.

use std::collections::{BTreeMap, BTreeSet};

use ivtc_core::{Bookmark, FreezeFrame, Match, PatternGuessing, Preset};

use crate::collections::{CustomListsModel, SectionsModel};
use crate::project::Project;

/// One committed state of the project.
#[derive(Clone)]
pub(crate) struct UndoStep {
    pub(crate) description: String,
    pub(crate) matches: Option<Vec<Match>>,
    pub(crate) decimated_frames: Vec<BTreeSet<u8>>,
    pub(crate) pattern_guessing: PatternGuessing,
    pub(crate) presets: BTreeMap<String, Preset>,
    pub(crate) custom_lists: CustomListsModel,
    pub(crate) combed_frames: BTreeSet<i32>,
    pub(crate) frozen_frames: BTreeMap<i32, FreezeFrame>,
    pub(crate) sections: SectionsModel,
    pub(crate) bookmarks: BTreeMap<i32, Bookmark>,
}

impl Project {
    /// Snapshot the current state under a description. Clears the redo
    /// stack; the oldest snapshots are evicted beyond the configured depth.
    pub fn commit(&mut self, description: impl Into<String>) {
        let step = UndoStep {
            description: description.into(),
            matches: self.matches.clone(),
            decimated_frames: self.decimated_frames.clone(),
            pattern_guessing: self.pattern_guessing.clone(),
            presets: self.presets.clone(),
            custom_lists: self.custom_lists.clone(),
            combed_frames: self.combed_frames.clone(),
            frozen_frames: self.frozen_frames.clone(),
            sections: self.sections.clone(),
            bookmarks: self.bookmarks.clone(),
        };

        self.undo_stack.push_back(step);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.undo_steps {
            self.undo_stack.pop_front();
        }
    }

    /// Step back to the previous committed state. Returns false when only
    /// the baseline remains.
    pub fn undo(&mut self) -> bool {
        if self.undo_stack.len() <= 1 {
            return false;
        }

        let top = self.undo_stack.pop_back().expect("length checked");
        self.redo_stack.push_back(top);

        let state = self.undo_stack.back().expect("baseline remains").clone();
        self.restore_state(&state);
        true
    }

    /// Reapply the most recently undone commit.
    pub fn redo(&mut self) -> bool {
        let Some(state) = self.redo_stack.pop_back() else {
            return false;
        };

        self.restore_state(&state);
        self.undo_stack.push_back(state);
        true
    }

    /// Description of the commit `undo` would revert, if any.
    pub fn undo_description(&self) -> Option<&str> {
        if self.undo_stack.len() <= 1 {
            return None;
        }
        self.undo_stack.back().map(|s| s.description.as_str())
    }

    /// Description of the commit `redo` would reapply, if any.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|s| s.description.as_str())
    }

    /// Re-bound the history depth, evicting oldest entries first.
    pub fn set_undo_steps(&mut self, steps: usize) {
        self.undo_steps = steps;

        if self.undo_steps < self.redo_stack.len() {
            self.undo_stack.clear();
            while self.undo_steps < self.redo_stack.len() {
                self.redo_stack.pop_front();
            }
        }

        while self.undo_steps < self.undo_stack.len() + self.redo_stack.len() {
            if self.undo_stack.pop_front().is_none() {
                break;
            }
        }
    }

    /// Replace the mutable parts of the project with a snapshot.
    ///
    /// Collections are replaced wholesale so observers see one consistent
    /// reset rather than a stream of partial edits.
    fn restore_state(&mut self, state: &UndoStep) {
        self.matches = state.matches.clone();
        self.decimated_frames = state.decimated_frames.clone();
        self.pattern_guessing = state.pattern_guessing.clone();
        self.presets = state.presets.clone();
        self.custom_lists = state.custom_lists.clone();
        self.combed_frames = state.combed_frames.clone();
        self.frozen_frames = state.frozen_frames.clone();
        self.sections = state.sections.clone();
        self.bookmarks = state.bookmarks.clone();

        // The snapshot stores the drop sets, not the derived count.
        let dropped: i32 = self
            .decimated_frames
            .iter()
            .map(|cycle| cycle.len() as i32)
            .sum();
        self.num_frames_decimated = self.num_frames_source - dropped;
    }
}
