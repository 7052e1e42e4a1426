//! Edit operations on the project's collections.
//!
//! Everything here goes through the aggregate so that cross-collection
//! invariants hold: preset renames rewrite every reference, deletes clear
//! them, freeze frames and custom-list ranges stay non-overlapping.

use ivtc_core::{
    find_containing_range, is_valid_script_name, Bookmark, CustomList, FrameRange, FreezeFrame,
    ImportedThings, InterlacedFade, Match, OrphanField, PositionInFilterChain, Preset,
    ProjectError, Result, Section,
};

use crate::project::Project;

impl Project {
    // ── Sections ────────────────────────────────────────────────────

    /// Start a new section at `frame`. A section already starting there is
    /// left alone.
    pub fn add_section(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;
        self.sections.insert(Section::new(frame));
        self.set_modified(true);
        Ok(())
    }

    pub(crate) fn add_section_record(&mut self, section: Section) -> Result<()> {
        self.check_frame(section.start)?;
        self.sections.insert(section);
        self.set_modified(true);
        Ok(())
    }

    /// Delete a section boundary. The section at frame 0 always survives.
    pub fn delete_section(&mut self, section_start: i32) -> Result<()> {
        self.check_frame(section_start)?;
        if !self.sections.contains(section_start) {
            return Err(ProjectError::NoSuchSection(section_start));
        }

        if section_start > 0 {
            self.sections.remove(section_start);
        }

        self.set_modified(true);
        Ok(())
    }

    /// The section containing `frame`.
    pub fn find_section(&self, frame: i32) -> Result<&Section> {
        self.check_frame(frame)?;
        Ok(self
            .sections
            .find(frame)
            .expect("the section at frame 0 always exists"))
    }

    /// The section after the one containing `frame`, if any.
    pub fn find_next_section(&self, frame: i32) -> Result<Option<&Section>> {
        self.check_frame(frame)?;
        Ok(self.sections.find_next(frame))
    }

    /// One past the last frame of the section containing `frame`.
    pub fn section_end(&self, frame: i32) -> Result<i32> {
        self.check_frame(frame)?;
        Ok(self
            .sections
            .find_next(frame)
            .map(|s| s.start)
            .unwrap_or(self.num_frames_source))
    }

    /// Append a preset to a section's stack. The same preset may appear
    /// more than once.
    pub fn set_section_preset(&mut self, section_start: i32, preset_name: &str) -> Result<()> {
        self.check_frame(section_start)?;
        if !self.sections.contains(section_start) {
            return Err(ProjectError::NoSuchSection(section_start));
        }
        if !self.presets.contains_key(preset_name) {
            return Err(ProjectError::NoSuchPreset(preset_name.to_string()));
        }

        self.sections.append_preset(section_start, preset_name);
        self.set_modified(true);
        Ok(())
    }

    pub fn delete_section_preset(&mut self, section_start: i32, preset_index: usize) -> Result<()> {
        let len = self.section_preset_count(section_start)?;
        if preset_index >= len {
            return Err(ProjectError::OutOfRange(format!(
                "preset index {preset_index}"
            )));
        }

        self.sections.delete_preset(section_start, preset_index);
        self.set_modified(true);
        Ok(())
    }

    pub fn move_section_preset_up(&mut self, section_start: i32, preset_index: usize) -> Result<()> {
        let len = self.section_preset_count(section_start)?;
        if preset_index >= len {
            return Err(ProjectError::OutOfRange(format!(
                "preset index {preset_index}"
            )));
        }

        self.sections.move_preset_up(section_start, preset_index);
        self.set_modified(true);
        Ok(())
    }

    pub fn move_section_preset_down(
        &mut self,
        section_start: i32,
        preset_index: usize,
    ) -> Result<()> {
        let len = self.section_preset_count(section_start)?;
        if preset_index >= len {
            return Err(ProjectError::OutOfRange(format!(
                "preset index {preset_index}"
            )));
        }

        self.sections.move_preset_down(section_start, preset_index);
        self.set_modified(true);
        Ok(())
    }

    fn section_preset_count(&self, section_start: i32) -> Result<usize> {
        self.check_frame(section_start)?;
        self.sections
            .get(section_start)
            .map(|s| s.presets.len())
            .ok_or(ProjectError::NoSuchSection(section_start))
    }

    pub fn sections(&self) -> &crate::collections::SectionsModel {
        &self.sections
    }

    /// Apply a repeating match pattern across one section.
    pub fn set_section_matches_from_pattern(
        &mut self,
        section_start: i32,
        pattern: &str,
    ) -> Result<()> {
        self.check_frame(section_start)?;
        if !self.sections.contains(section_start) {
            return Err(ProjectError::NoSuchSection(section_start));
        }

        let section_end = self.section_end(section_start)?;
        self.set_range_matches_from_pattern(section_start, section_end - 1, pattern)
    }

    /// Apply a repeating decimation pattern across one section.
    pub fn set_section_decimation_from_pattern(
        &mut self,
        section_start: i32,
        pattern: &str,
    ) -> Result<()> {
        self.check_frame(section_start)?;
        if !self.sections.contains(section_start) {
            return Err(ProjectError::NoSuchSection(section_start));
        }

        let section_end = self.section_end(section_start)?;
        self.set_range_decimation_from_pattern(section_start, section_end - 1, pattern)
    }

    /// Restore one section's matches from the collector's originals.
    pub fn reset_section_matches(&mut self, section_start: i32) -> Result<()> {
        self.check_frame(section_start)?;
        if !self.sections.contains(section_start) {
            return Err(ProjectError::NoSuchSection(section_start));
        }

        let section_end = self.section_end(section_start)?;
        self.reset_range_matches(section_start, section_end - 1)
    }

    // ── Orphan fields ───────────────────────────────────────────────

    /// Refresh the orphan-field records for every section. Must run after
    /// any match or section edit that can move a section boundary.
    pub fn update_orphan_fields(&mut self) {
        let starts = self.sections.starts();
        for (i, &start) in starts.iter().enumerate() {
            let end = starts
                .get(i + 1)
                .copied()
                .unwrap_or(self.num_frames_source);
            self.update_section_orphan_fields(start, end);
        }
    }

    /// Refresh the orphan records for one section `[start, end)`.
    ///
    /// The first frame is orphaned when its match reaches back into the
    /// previous section (`n`), the last when it reaches forward (`b`).
    pub fn update_section_orphan_fields(&mut self, section_start: i32, section_end: i32) {
        self.orphan_fields.remove(&section_start);
        self.orphan_fields.remove(&(section_end - 1));

        if self.match_at(section_start) == Match::N {
            self.orphan_fields.insert(
                section_start,
                OrphanField {
                    field_match: Match::N,
                    decimated: self.is_decimated(section_start),
                },
            );
        }

        if self.match_at(section_end - 1) == Match::B {
            self.orphan_fields.insert(
                section_end - 1,
                OrphanField {
                    field_match: Match::B,
                    decimated: self.is_decimated(section_end - 1),
                },
            );
        }
    }

    pub fn is_orphan_field(&self, frame: i32) -> Result<bool> {
        self.check_frame(frame)?;
        Ok(self.orphan_fields.contains_key(&frame))
    }

    pub fn clear_orphan_fields(&mut self) {
        self.orphan_fields.clear();
    }

    pub fn orphan_fields(&self) -> &std::collections::BTreeMap<i32, OrphanField> {
        &self.orphan_fields
    }

    // ── Presets ─────────────────────────────────────────────────────

    pub fn add_preset(&mut self, name: &str, contents: &str) -> Result<()> {
        if !is_valid_script_name(name) {
            return Err(ProjectError::InvalidName(name.to_string()));
        }
        if self.presets.contains_key(name) {
            return Err(ProjectError::NameInUse(name.to_string()));
        }

        self.presets.insert(
            name.to_string(),
            Preset {
                name: name.to_string(),
                contents: contents.to_string(),
            },
        );
        self.set_modified(true);
        Ok(())
    }

    /// Rename a preset, rewriting every section entry and custom-list
    /// reference that points at it.
    pub fn rename_preset(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if !self.presets.contains_key(old_name) {
            return Err(ProjectError::NoSuchPreset(old_name.to_string()));
        }
        if !is_valid_script_name(new_name) {
            return Err(ProjectError::InvalidName(new_name.to_string()));
        }
        if self.presets.contains_key(new_name) {
            return Err(ProjectError::NameInUse(new_name.to_string()));
        }

        let mut preset = self.presets.remove(old_name).expect("checked above");
        preset.name = new_name.to_string();
        self.presets.insert(new_name.to_string(), preset);

        for start in self.sections.starts() {
            if let Some(section) = self.sections.get_mut(start) {
                for slot in &mut section.presets {
                    if slot == old_name {
                        *slot = new_name.to_string();
                    }
                }
            }
        }

        for list in self.custom_lists.iter_mut() {
            if list.preset == old_name {
                list.preset = new_name.to_string();
            }
        }

        self.set_modified(true);
        Ok(())
    }

    /// Delete a preset, erasing every section entry using it and clearing
    /// the preset reference of every custom list assigned to it.
    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        if self.presets.remove(name).is_none() {
            return Err(ProjectError::NoSuchPreset(name.to_string()));
        }

        for start in self.sections.starts() {
            if let Some(section) = self.sections.get_mut(start) {
                section.presets.retain(|p| p != name);
            }
        }

        for list in self.custom_lists.iter_mut() {
            if list.preset == name {
                list.preset.clear();
            }
        }

        self.set_modified(true);
        Ok(())
    }

    pub fn preset_contents(&self, name: &str) -> Result<&str> {
        self.presets
            .get(name)
            .map(|p| p.contents.as_str())
            .ok_or_else(|| ProjectError::NoSuchPreset(name.to_string()))
    }

    pub fn set_preset_contents(&mut self, name: &str, contents: &str) -> Result<()> {
        let preset = self
            .presets
            .get_mut(name)
            .ok_or_else(|| ProjectError::NoSuchPreset(name.to_string()))?;

        if preset.contents != contents {
            preset.contents = contents.to_string();
            self.set_modified(true);
        }
        Ok(())
    }

    pub fn is_preset_in_use(&self, name: &str) -> Result<bool> {
        if !self.presets.contains_key(name) {
            return Err(ProjectError::NoSuchPreset(name.to_string()));
        }

        let in_sections = self
            .sections
            .iter()
            .any(|(_, s)| s.presets.iter().any(|p| p == name));
        let in_lists = self.custom_lists.iter().any(|l| l.preset == name);

        Ok(in_sections || in_lists)
    }

    pub fn preset_exists(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn presets(&self) -> &std::collections::BTreeMap<String, Preset> {
        &self.presets
    }

    // ── Custom lists ────────────────────────────────────────────────

    pub fn add_custom_list(&mut self, list: CustomList) -> Result<()> {
        if !is_valid_script_name(&list.name) {
            return Err(ProjectError::InvalidName(list.name));
        }
        if !list.preset.is_empty() && !self.presets.contains_key(&list.preset) {
            return Err(ProjectError::NoSuchPreset(list.preset));
        }
        if self.custom_lists.index_of(&list.name).is_some() {
            return Err(ProjectError::NameInUse(list.name));
        }

        self.custom_lists.push(list);
        self.set_modified(true);
        Ok(())
    }

    pub fn rename_custom_list(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }

        let index = self
            .custom_lists
            .index_of(old_name)
            .ok_or_else(|| ProjectError::NoSuchCustomList(old_name.to_string()))?;

        if self.custom_lists.index_of(new_name).is_some() {
            return Err(ProjectError::NameInUse(new_name.to_string()));
        }
        if !is_valid_script_name(new_name) {
            return Err(ProjectError::InvalidName(new_name.to_string()));
        }

        self.custom_lists.set_name(index, new_name);
        self.set_modified(true);
        Ok(())
    }

    pub fn delete_custom_list(&mut self, name: &str) -> Result<()> {
        let index = self
            .custom_lists
            .index_of(name)
            .ok_or_else(|| ProjectError::NoSuchCustomList(name.to_string()))?;
        self.delete_custom_list_at(index)
    }

    pub fn delete_custom_list_at(&mut self, index: usize) -> Result<()> {
        self.check_custom_list_index(index)?;
        self.custom_lists.remove(index);
        self.set_modified(true);
        Ok(())
    }

    pub fn move_custom_list_up(&mut self, index: usize) -> Result<()> {
        self.check_custom_list_index(index)?;
        if index == 0 {
            return Ok(());
        }
        self.custom_lists.move_up(index);
        self.set_modified(true);
        Ok(())
    }

    pub fn move_custom_list_down(&mut self, index: usize) -> Result<()> {
        self.check_custom_list_index(index)?;
        if index == self.custom_lists.len() - 1 {
            return Ok(());
        }
        self.custom_lists.move_down(index);
        self.set_modified(true);
        Ok(())
    }

    pub fn custom_list_preset(&self, index: usize) -> Result<&str> {
        self.check_custom_list_index(index)?;
        Ok(self.custom_lists.get(index).expect("checked").preset.as_str())
    }

    pub fn set_custom_list_preset(&mut self, index: usize, preset_name: &str) -> Result<()> {
        self.check_custom_list_index(index)?;
        if !self.presets.contains_key(preset_name) {
            return Err(ProjectError::NoSuchPreset(preset_name.to_string()));
        }

        self.custom_lists.set_preset(index, preset_name);
        self.set_modified(true);
        Ok(())
    }

    pub fn custom_list_position(&self, index: usize) -> Result<PositionInFilterChain> {
        self.check_custom_list_index(index)?;
        Ok(self.custom_lists.get(index).expect("checked").position)
    }

    pub fn set_custom_list_position(
        &mut self,
        index: usize,
        position: PositionInFilterChain,
    ) -> Result<()> {
        self.check_custom_list_index(index)?;
        self.custom_lists.set_position(index, position);
        self.set_modified(true);
        Ok(())
    }

    pub fn add_custom_list_range(&mut self, index: usize, first: i32, last: i32) -> Result<()> {
        self.check_custom_list_index(index)?;
        self.check_frame(first)?;
        self.check_frame(last)?;

        let range = FrameRange::new(first, last);
        let (first, last) = (range.first, range.last);

        let list = self.custom_lists.get(index).expect("checked");
        let overlap = find_containing_range(&list.ranges, first)
            .or_else(|| find_containing_range(&list.ranges, last))
            .or_else(|| {
                list.ranges
                    .range(first + 1..)
                    .next()
                    .map(|(_, r)| r)
                    .filter(|r| r.first < last)
            });

        if let Some(overlap) = overlap {
            return Err(ProjectError::Overlap {
                first,
                last,
                other_first: overlap.first,
                other_last: overlap.last,
            });
        }

        self.custom_lists
            .get_mut(index)
            .expect("checked")
            .ranges
            .insert(first, range);
        self.set_modified(true);
        Ok(())
    }

    pub fn delete_custom_list_range(&mut self, index: usize, first: i32) -> Result<()> {
        self.check_custom_list_index(index)?;

        let list = self.custom_lists.get_mut(index).expect("checked");
        if list.ranges.remove(&first).is_none() {
            return Err(ProjectError::NoSuchRange(first));
        }

        self.set_modified(true);
        Ok(())
    }

    pub fn find_custom_list_range(&self, index: usize, frame: i32) -> Result<Option<&FrameRange>> {
        self.check_custom_list_index(index)?;
        let list = self.custom_lists.get(index).expect("checked");
        Ok(find_containing_range(&list.ranges, frame))
    }

    pub fn custom_list_exists(&self, name: &str) -> bool {
        self.custom_lists.index_of(name).is_some()
    }

    /// A custom list only affects the output when it has both a preset and
    /// at least one range.
    pub fn is_custom_list_in_use(&self, index: usize) -> Result<bool> {
        self.check_custom_list_index(index)?;
        let list = self.custom_lists.get(index).expect("checked");
        Ok(!list.preset.is_empty() && !list.ranges.is_empty())
    }

    pub fn custom_lists(&self) -> &crate::collections::CustomListsModel {
        &self.custom_lists
    }

    fn check_custom_list_index(&self, index: usize) -> Result<()> {
        if index >= self.custom_lists.len() {
            return Err(ProjectError::OutOfRange(format!(
                "custom list index {index}"
            )));
        }
        Ok(())
    }

    // ── Freeze frames ───────────────────────────────────────────────

    /// Freeze `[first, last]` to show `replacement`. Endpoints may come in
    /// either order; the range must not touch an existing freeze range.
    pub fn add_freeze_frame(&mut self, first: i32, last: i32, replacement: i32) -> Result<()> {
        let (first, last) = if first <= last { (first, last) } else { (last, first) };

        self.check_frame(first)?;
        self.check_frame(last)?;
        self.check_frame(replacement)?;

        let overlap = self
            .find_freeze_frame(first)
            .or_else(|| self.find_freeze_frame(last))
            .or_else(|| {
                self.frozen_frames
                    .range(first + 1..)
                    .next()
                    .map(|(_, ff)| ff)
                    .filter(|ff| ff.first < last)
            });

        if let Some(overlap) = overlap {
            return Err(ProjectError::Overlap {
                first,
                last,
                other_first: overlap.first,
                other_last: overlap.last,
            });
        }

        self.frozen_frames.insert(
            first,
            FreezeFrame {
                first,
                last,
                replacement,
            },
        );
        self.set_modified(true);
        Ok(())
    }

    pub fn delete_freeze_frame(&mut self, first: i32) {
        self.frozen_frames.remove(&first);
        self.set_modified(true);
    }

    /// The freeze range containing `frame`, if any.
    pub fn find_freeze_frame(&self, frame: i32) -> Option<&FreezeFrame> {
        let (_, ff) = self.frozen_frames.range(..=frame).next_back()?;
        (ff.first <= frame && frame <= ff.last).then_some(ff)
    }

    pub fn frozen_frames(&self) -> &std::collections::BTreeMap<i32, FreezeFrame> {
        &self.frozen_frames
    }

    // ── Combed frames ───────────────────────────────────────────────

    pub fn add_combed_frame(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;
        self.combed_frames.insert(frame);
        self.set_modified(true);
        Ok(())
    }

    pub fn delete_combed_frame(&mut self, frame: i32) -> Result<()> {
        self.check_frame(frame)?;
        self.combed_frames.remove(&frame);
        self.set_modified(true);
        Ok(())
    }

    pub fn is_combed_frame(&self, frame: i32) -> Result<bool> {
        self.check_frame(frame)?;
        Ok(self.combed_frames.contains(&frame))
    }

    pub fn clear_combed_frames(&mut self) {
        self.combed_frames.clear();
    }

    /// The next combed frame after `frame`, or `frame` when there is none.
    pub fn find_next_combed_frame(&self, frame: i32) -> i32 {
        self.combed_frames
            .range(frame + 1..)
            .next()
            .copied()
            .unwrap_or(frame)
    }

    pub fn find_previous_combed_frame(&self, frame: i32) -> i32 {
        self.combed_frames
            .range(..frame)
            .next_back()
            .copied()
            .unwrap_or(frame)
    }

    pub fn combed_frames(&self) -> &std::collections::BTreeSet<i32> {
        &self.combed_frames
    }

    // ── Interlaced fades ────────────────────────────────────────────

    pub fn add_interlaced_fade(&mut self, frame: i32, field_difference: f64) -> Result<()> {
        self.check_frame(frame)?;
        self.interlaced_fades.insert(
            frame,
            InterlacedFade {
                frame,
                field_difference,
            },
        );
        Ok(())
    }

    pub fn interlaced_fades(&self) -> &std::collections::BTreeMap<i32, InterlacedFade> {
        &self.interlaced_fades
    }

    // ── Bookmarks ───────────────────────────────────────────────────

    pub fn add_bookmark(&mut self, frame: i32, description: &str) -> Result<()> {
        self.check_frame(frame)?;
        self.bookmarks.insert(
            frame,
            Bookmark {
                frame,
                description: description.to_string(),
            },
        );
        self.set_modified(true);
        Ok(())
    }

    pub fn delete_bookmark(&mut self, frame: i32) -> Result<()> {
        if self.bookmarks.remove(&frame).is_none() {
            return Err(ProjectError::NoSuchBookmark(frame));
        }
        Ok(())
    }

    pub fn is_bookmark(&self, frame: i32) -> bool {
        self.bookmarks.contains_key(&frame)
    }

    pub fn get_bookmark(&self, frame: i32) -> Option<&Bookmark> {
        self.bookmarks.get(&frame)
    }

    /// The nearest bookmark before `frame`, or `frame` when there is none.
    pub fn find_previous_bookmark(&self, frame: i32) -> i32 {
        self.bookmarks
            .range(..frame)
            .next_back()
            .map(|(f, _)| *f)
            .unwrap_or(frame)
    }

    pub fn find_next_bookmark(&self, frame: i32) -> i32 {
        self.bookmarks
            .range(frame + 1..)
            .next()
            .map(|(f, _)| *f)
            .unwrap_or(frame)
    }

    pub fn bookmarks(&self) -> &std::collections::BTreeMap<i32, Bookmark> {
        &self.bookmarks
    }

    // ── Import from another project ─────────────────────────────────

    /// Pull selected parts of another parsed project into this one.
    ///
    /// Preset name collisions are resolved with an `_imported` suffix, and
    /// imported custom lists follow their presets across the rename.
    pub fn import_from_project(&mut self, other: &Project, imports: &ImportedThings) -> Result<()> {
        if imports.geometry {
            self.ui_state = other.ui_state.clone();
            self.ui_geometry = other.ui_geometry.clone();
        }

        let mut renamed: std::collections::BTreeMap<String, String> =
            std::collections::BTreeMap::new();

        if imports.presets || imports.custom_lists {
            for (name, preset) in &other.presets {
                let mut new_name = name.clone();
                while self.preset_exists(&new_name)
                    || renamed.values().any(|taken| taken == &new_name)
                {
                    new_name.push_str("_imported");
                }

                renamed.insert(name.clone(), new_name.clone());

                if imports.presets {
                    self.add_preset(&new_name, &preset.contents)?;
                }
            }
        }

        if imports.custom_lists {
            for list in other.custom_lists.iter() {
                let mut list = list.clone();

                if !list.preset.is_empty() {
                    let mapped = renamed
                        .get(&list.preset)
                        .cloned()
                        .unwrap_or_else(|| list.preset.clone());

                    if !self.preset_exists(&mapped) {
                        let contents = other.preset_contents(&list.preset)?.to_string();
                        self.add_preset(&mapped, &contents)?;
                    }
                    list.preset = mapped;
                }

                while self.custom_list_exists(&list.name) {
                    list.name.push_str("_imported");
                }

                for range in list.ranges.values() {
                    self.check_frame(range.first)?;
                    self.check_frame(range.last)?;
                }

                self.add_custom_list(list)?;
            }
        }

        if imports.crop {
            let crop = *other.crop();
            self.set_crop_enabled(crop.enabled);
            self.set_crop_early(crop.early);
            self.set_crop(crop.left, crop.top, crop.right, crop.bottom)?;
        }

        if imports.resize {
            let resize = other.resize().clone();
            self.set_resize_enabled(resize.enabled);
            self.set_resize(resize.width, resize.height, resize.filter)?;
        }

        if imports.bit_depth {
            let depth = other.bit_depth().clone();
            self.set_bit_depth_enabled(depth.enabled);
            self.set_bit_depth(depth.bits, depth.float_samples, depth.dither);
        }

        if imports.mic_search {
            self.set_mic_search_minimum(other.mic_search_minimum());
        }

        if imports.zoom {
            self.set_zoom(other.zoom())?;
        }

        self.set_modified(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_frames(n: i32) -> Project {
        let mut project = Project::new(true, "in.dgi", "dgdecodenv.DGSource", 30000, 1001, 720, 480, n);
        project.add_trim(0, n - 1);
        project
    }

    #[test]
    fn test_preset_rename_propagates() {
        let mut project = project_with_frames(100);
        project.add_preset("A", "clip = clip").unwrap();
        project.set_section_preset(0, "A").unwrap();
        project.set_section_preset(0, "A").unwrap();

        let mut list = CustomList::new("L");
        list.preset = "A".to_string();
        project.add_custom_list(list).unwrap();

        project.rename_preset("A", "B").unwrap();

        assert_eq!(project.sections().get(0).unwrap().presets, ["B", "B"]);
        assert_eq!(project.custom_list_preset(0).unwrap(), "B");
        assert!(!project.preset_exists("A"));
        assert!(project.preset_exists("B"));
    }

    #[test]
    fn test_preset_delete_clears_references() {
        let mut project = project_with_frames(100);
        project.add_preset("gone", "").unwrap();
        project.add_preset("kept", "").unwrap();
        project.set_section_preset(0, "kept").unwrap();
        project.set_section_preset(0, "gone").unwrap();
        project.set_section_preset(0, "kept").unwrap();

        let mut list = CustomList::new("L");
        list.preset = "gone".to_string();
        project.add_custom_list(list).unwrap();

        project.delete_preset("gone").unwrap();

        assert_eq!(project.sections().get(0).unwrap().presets, ["kept", "kept"]);
        assert_eq!(project.custom_list_preset(0).unwrap(), "");
        assert_eq!(
            project.is_preset_in_use("gone"),
            Err(ProjectError::NoSuchPreset("gone".to_string()))
        );
    }

    #[test]
    fn test_preset_name_validation() {
        let mut project = project_with_frames(10);
        assert_eq!(
            project.add_preset("2fast", ""),
            Err(ProjectError::InvalidName("2fast".to_string()))
        );
        project.add_preset("ok_name", "").unwrap();
        assert_eq!(
            project.add_preset("ok_name", ""),
            Err(ProjectError::NameInUse("ok_name".to_string()))
        );
    }

    #[test]
    fn test_freeze_frame_lookup_and_overlap() {
        let mut project = project_with_frames(100);
        project.add_freeze_frame(20, 10, 5).unwrap();

        // All three probes find the same record; endpoints were swapped.
        let ff = *project.find_freeze_frame(10).unwrap();
        assert_eq!(project.find_freeze_frame(20).unwrap(), &ff);
        assert_eq!(project.find_freeze_frame(15).unwrap(), &ff);
        assert_eq!(ff.replacement, 5);
        assert!(project.find_freeze_frame(9).is_none());
        assert!(project.find_freeze_frame(21).is_none());

        // Overlapping inserts are rejected in every direction.
        assert!(matches!(
            project.add_freeze_frame(15, 25, 0),
            Err(ProjectError::Overlap { .. })
        ));
        assert!(matches!(
            project.add_freeze_frame(5, 12, 0),
            Err(ProjectError::Overlap { .. })
        ));
        assert!(matches!(
            project.add_freeze_frame(5, 30, 0),
            Err(ProjectError::Overlap { .. })
        ));

        project.add_freeze_frame(21, 30, 21).unwrap();
    }

    #[test]
    fn test_custom_list_range_overlap() {
        let mut project = project_with_frames(100);
        project.add_custom_list(CustomList::new("L")).unwrap();
        project.add_custom_list_range(0, 10, 20).unwrap();

        assert!(matches!(
            project.add_custom_list_range(0, 20, 25),
            Err(ProjectError::Overlap { .. })
        ));
        assert!(matches!(
            project.add_custom_list_range(0, 5, 30),
            Err(ProjectError::Overlap { .. })
        ));

        project.add_custom_list_range(0, 21, 25).unwrap();
        assert_eq!(
            project.find_custom_list_range(0, 15).unwrap().unwrap().first,
            10
        );
        assert!(project.find_custom_list_range(0, 26).unwrap().is_none());

        project.delete_custom_list_range(0, 10).unwrap();
        assert_eq!(
            project.delete_custom_list_range(0, 10),
            Err(ProjectError::NoSuchRange(10))
        );
    }

    #[test]
    fn test_custom_list_in_use() {
        let mut project = project_with_frames(100);
        project.add_preset("p", "").unwrap();
        project.add_custom_list(CustomList::new("L")).unwrap();

        assert!(!project.is_custom_list_in_use(0).unwrap());
        project.set_custom_list_preset(0, "p").unwrap();
        assert!(!project.is_custom_list_in_use(0).unwrap());
        project.add_custom_list_range(0, 0, 10).unwrap();
        assert!(project.is_custom_list_in_use(0).unwrap());
    }

    #[test]
    fn test_section_zero_cannot_be_deleted() {
        let mut project = project_with_frames(100);
        project.add_section(50).unwrap();

        project.delete_section(0).unwrap();
        assert!(project.sections().contains(0));

        project.delete_section(50).unwrap();
        assert!(!project.sections().contains(50));
        assert_eq!(
            project.delete_section(50),
            Err(ProjectError::NoSuchSection(50))
        );
    }

    #[test]
    fn test_section_end() {
        let mut project = project_with_frames(100);
        project.add_section(40).unwrap();

        assert_eq!(project.section_end(0).unwrap(), 40);
        assert_eq!(project.section_end(39).unwrap(), 40);
        assert_eq!(project.section_end(40).unwrap(), 100);
        assert_eq!(project.section_end(99).unwrap(), 100);
    }

    #[test]
    fn test_orphan_fields() {
        let mut project = project_with_frames(20);
        project.add_section(10).unwrap();

        // Section [10, 20): first frame matches n, reaching back across
        // the boundary; frame 9 matches b, reaching forward.
        project.set_match(10, Match::N).unwrap();
        project.set_match(9, Match::B).unwrap();
        project.update_orphan_fields();

        assert!(project.is_orphan_field(10).unwrap());
        assert!(project.is_orphan_field(9).unwrap());
        assert!(!project.is_orphan_field(0).unwrap());

        project.set_match(10, Match::C).unwrap();
        project.update_orphan_fields();
        assert!(!project.is_orphan_field(10).unwrap());
    }

    #[test]
    fn test_bookmark_navigation() {
        let mut project = project_with_frames(100);
        project.add_bookmark(10, "a").unwrap();
        project.add_bookmark(50, "b").unwrap();

        assert_eq!(project.find_next_bookmark(10), 50);
        assert_eq!(project.find_previous_bookmark(50), 10);
        assert_eq!(project.find_previous_bookmark(10), 10);
        assert_eq!(project.find_next_bookmark(50), 50);

        assert_eq!(
            project.delete_bookmark(11),
            Err(ProjectError::NoSuchBookmark(11))
        );
        project.delete_bookmark(10).unwrap();
        assert!(!project.is_bookmark(10));
    }

    #[test]
    fn test_import_renames_colliding_presets() {
        let mut target = project_with_frames(100);
        target.add_preset("denoise", "clip = clip").unwrap();

        let mut source = project_with_frames(100);
        source.add_preset("denoise", "other contents").unwrap();
        let mut list = CustomList::new("fades");
        list.preset = "denoise".to_string();
        source.add_custom_list(list).unwrap();
        source.add_custom_list_range(0, 10, 20).unwrap();

        let imports = ImportedThings {
            presets: true,
            custom_lists: true,
            ..Default::default()
        };
        target.import_from_project(&source, &imports).unwrap();

        assert!(target.preset_exists("denoise"));
        assert!(target.preset_exists("denoise_imported"));
        assert_eq!(
            target.preset_contents("denoise_imported").unwrap(),
            "other contents"
        );
        assert_eq!(target.custom_list_preset(0).unwrap(), "denoise_imported");
    }
}
