//! Cadence inference.
//!
//! Guessers operate per section and return `Ok(true)` on success. Ambiguity
//! is not an error: the failure is recorded in the pattern-guessing state
//! and `Ok(false)` comes back. Errors are reserved for bad arguments and
//! missing metric arrays.

use tracing::debug;

use ivtc_core::{
    DropDuplicate, FailedPatternGuessing, Match, PatternGuessingFailureReason,
    PatternGuessingMethod, Patterns, ProjectError, Result, UseThirdNMatch,
};

use crate::project::Project;

/// The candidate cadences, with the bit that enables each. The single `c`
/// stands for the five-c pattern: every frame keeps its own fields.
const CANDIDATE_PATTERNS: [(&str, Patterns); 3] = [
    ("cccnn", Patterns::CCCNN),
    ("ccnnn", Patterns::CCNNN),
    ("c", Patterns::CCCCC),
];

fn pattern_matches(pattern: &str) -> Vec<Match> {
    pattern
        .chars()
        .map(|c| Match::from_char(c).expect("candidate patterns are valid"))
        .collect()
}

impl Project {
    fn original_match_at(&self, frame: i32) -> Match {
        self.original_matches
            .as_ref()
            .map(|o| o[frame as usize])
            .unwrap_or(Match::C)
    }

    fn guess_section_bounds(&self, section_start: i32) -> Result<(i32, i32)> {
        self.check_frame(section_start)?;
        if !self.sections.contains(section_start) {
            return Err(ProjectError::NoSuchSection(section_start));
        }
        Ok((section_start, self.section_end(section_start)?))
    }

    fn record_failure(&mut self, start: i32, reason: PatternGuessingFailureReason) {
        debug!(start, ?reason, "pattern guessing failed");
        self.pattern_guessing
            .failures
            .insert(start, FailedPatternGuessing { start, reason });
        self.set_modified(true);
    }

    /// Best candidate by mic deviation: for each allowed pattern and
    /// offset, sum how much the scheduled match's mic exceeds the
    /// alternative's. Returns `(pattern index, offset, mic_dev)`.
    fn best_pattern_by_mics(
        &self,
        section_start: i32,
        section_end: i32,
        use_patterns: Patterns,
    ) -> Option<(usize, i32, i64)> {
        let mut best: Option<(usize, i32, i64)> = None;

        for (p, (pattern, flag)) in CANDIDATE_PATTERNS.iter().enumerate() {
            if !use_patterns.contains(*flag) {
                continue;
            }

            let pattern = pattern_matches(pattern);
            let mut pattern_best: Option<(i32, i64)> = None;

            for offset in 0..pattern.len() as i32 {
                let mut mic_dev: i64 = 0;

                for frame in section_start..section_end - 1 {
                    let scheduled = pattern[(frame + offset) as usize % pattern.len()];
                    let other = if scheduled == Match::C { Match::N } else { Match::C };

                    let mics = self.mics_at(frame);
                    let dev = i64::from(mics[scheduled.mic_index()])
                        - i64::from(mics[other.mic_index()]);
                    mic_dev += dev.max(0);
                }

                if pattern_best.map_or(true, |(_, d)| mic_dev < d) {
                    pattern_best = Some((offset, mic_dev));
                }
            }

            if let Some((offset, dev)) = pattern_best {
                if best.map_or(true, |(_, _, d)| dev < d) {
                    best = Some((p, offset, dev));
                }
            }
        }

        best
    }

    /// Best candidate by dmetric deviation. Picked by motion deviation;
    /// the vertical deviation of the winner is used for acceptance.
    /// Returns `(pattern index, offset, mmet_dev, vmet_dev)`.
    fn best_pattern_by_dmetrics(
        &self,
        section_start: i32,
        section_end: i32,
        use_patterns: Patterns,
    ) -> Option<(usize, i32, i64, i64)> {
        let mut best: Option<(usize, i32, i64, i64)> = None;

        for (p, (pattern, flag)) in CANDIDATE_PATTERNS.iter().enumerate() {
            if !use_patterns.contains(*flag) {
                continue;
            }

            let pattern = pattern_matches(pattern);
            let mut pattern_best: Option<(i32, i64, i64)> = None;

            for offset in 0..pattern.len() as i32 {
                let mut mmet_dev: i64 = 0;
                let mut vmet_dev: i64 = 0;

                for frame in section_start..section_end - 1 {
                    let scheduled = pattern[(frame + offset) as usize % pattern.len()];
                    let other = if scheduled == Match::C { Match::N } else { Match::C };

                    let mmetrics = self.mmetrics_at(frame);
                    let vmetrics = self.vmetrics_at(frame);

                    let mmet = i64::from(mmetrics[scheduled.dmetric_index()])
                        - i64::from(mmetrics[other.dmetric_index()]);
                    let vmet = i64::from(vmetrics[scheduled.dmetric_index()])
                        - i64::from(vmetrics[other.dmetric_index()]);

                    mmet_dev += mmet.max(0);
                    vmet_dev += vmet.max(0);
                }

                if pattern_best.map_or(true, |(_, d, _)| mmet_dev < d) {
                    pattern_best = Some((offset, mmet_dev, vmet_dev));
                }
            }

            if let Some((offset, mmet_dev, vmet_dev)) = pattern_best {
                if best.map_or(true, |(_, _, d, _)| mmet_dev < d) {
                    best = Some((p, offset, mmet_dev, vmet_dev));
                }
            }
        }

        best
    }

    /// Write a chosen cadence across the section. The final source frame's
    /// scheduled `n` has no next field and becomes `b`.
    fn apply_section_pattern(
        &mut self,
        section_start: i32,
        section_end: i32,
        pattern: &str,
        offset: i32,
    ) -> Result<()> {
        let pattern = pattern_matches(pattern);

        for frame in section_start..section_end {
            self.set_match(frame, pattern[(frame + offset) as usize % pattern.len()])?;
        }

        if section_end == self.num_frames_source && self.match_at(section_end - 1) == Match::N {
            self.set_match(section_end - 1, Match::B)?;
        }

        Ok(())
    }

    /// Replace a section-end `n` with `b` when its mic is more than twice
    /// the b match's.
    fn fix_section_end_by_mics(&mut self, section_end: i32) -> Result<()> {
        if self.match_at(section_end - 1) == Match::N {
            let mics = self.mics_at(section_end - 1);
            let mic_n = i32::from(mics[Match::N.mic_index()]);
            let mic_b = i32::from(mics[Match::B.mic_index()]);
            if mic_n > mic_b * 2 {
                self.set_match(section_end - 1, Match::B)?;
            }
        }
        Ok(())
    }

    /// The dmetrics flavour of the section-end fix-up, with a 1.5x ratio.
    fn fix_section_end_by_dmetrics(&mut self, section_end: i32) -> Result<()> {
        if self.match_at(section_end - 1) == Match::N {
            let mmetrics = self.mmetrics_at(section_end - 1);
            let mmet_n = f64::from(mmetrics[Match::N.dmetric_index()]);
            let mmet_b = f64::from(mmetrics[Match::B.dmetric_index()]);
            if mmet_n > mmet_b * 1.5 {
                self.set_match(section_end - 1, Match::B)?;
            }
        }
        Ok(())
    }

    /// Drop or clear decimation for a freshly guessed cadence.
    fn apply_guessed_decimation(
        &mut self,
        section_start: i32,
        section_end: i32,
        pattern: &str,
        offset: i32,
        drop_duplicate: DropDuplicate,
    ) -> Result<()> {
        if pattern == "c" {
            // A five-c section is fully progressive; nothing gets dropped.
            for frame in section_start..section_end {
                self.delete_decimated_frame(frame)?;
            }
        } else {
            let first_duplicate = 4 - offset;
            self.apply_pattern_guessing_decimation(
                section_start,
                section_end,
                first_duplicate,
                drop_duplicate,
            )?;
        }
        Ok(())
    }

    /// Guess one section's cadence from the mic arrays.
    pub fn guess_section_patterns_from_mics(
        &mut self,
        section_start: i32,
        minimum_length: i32,
        use_patterns: Patterns,
        drop_duplicate: DropDuplicate,
    ) -> Result<bool> {
        if self.mics.is_none() {
            return Err(ProjectError::MissingMetrics("mics"));
        }

        let (section_start, section_end) = self.guess_section_bounds(section_start)?;

        if section_end - section_start - 1 < minimum_length {
            self.record_failure(section_start, PatternGuessingFailureReason::SectionTooShort);
            return Ok(false);
        }

        let best = self.best_pattern_by_mics(section_start, section_end, use_patterns);

        let Some((pattern_idx, offset, mic_dev)) = best else {
            self.record_failure(
                section_start,
                PatternGuessingFailureReason::AmbiguousMatchPattern,
            );
            return Ok(false);
        };

        // Accept only when the total deviation averages below one mic unit
        // per frame.
        if mic_dev > i64::from(section_end - section_start - 1) {
            self.record_failure(
                section_start,
                PatternGuessingFailureReason::AmbiguousMatchPattern,
            );
            return Ok(false);
        }

        let pattern = CANDIDATE_PATTERNS[pattern_idx].0;
        debug!(section_start, pattern, offset, mic_dev, "guessed cadence from mics");

        self.apply_section_pattern(section_start, section_end, pattern, offset)?;
        self.fix_section_end_by_mics(section_end)?;
        self.apply_guessed_decimation(section_start, section_end, pattern, offset, drop_duplicate)?;

        self.pattern_guessing.failures.remove(&section_start);
        self.set_modified(true);
        Ok(true)
    }

    /// Guess one section's cadence from the dmetric arrays.
    pub fn guess_section_patterns_from_dmetrics(
        &mut self,
        section_start: i32,
        minimum_length: i32,
        use_patterns: Patterns,
        drop_duplicate: DropDuplicate,
    ) -> Result<bool> {
        if self.mmetrics.is_none() || self.vmetrics.is_none() {
            return Err(ProjectError::MissingMetrics("dmetrics"));
        }

        let (section_start, section_end) = self.guess_section_bounds(section_start)?;

        if section_end - section_start - 1 < minimum_length {
            self.record_failure(section_start, PatternGuessingFailureReason::SectionTooShort);
            return Ok(false);
        }

        let best = self.best_pattern_by_dmetrics(section_start, section_end, use_patterns);

        let Some((pattern_idx, offset, mmet_dev, vmet_dev)) = best else {
            self.record_failure(
                section_start,
                PatternGuessingFailureReason::AmbiguousMatchPattern,
            );
            return Ok(false);
        };

        if vmet_dev > i64::from(section_end - section_start - 1) {
            self.record_failure(
                section_start,
                PatternGuessingFailureReason::AmbiguousMatchPattern,
            );
            return Ok(false);
        }

        let pattern = CANDIDATE_PATTERNS[pattern_idx].0;
        debug!(
            section_start,
            pattern, offset, mmet_dev, vmet_dev, "guessed cadence from dmetrics"
        );

        self.apply_section_pattern(section_start, section_end, pattern, offset)?;

        if section_start == 0 && self.match_at(0) == Match::B {
            self.set_match(0, Match::N)?;
        }

        self.fix_section_end_by_dmetrics(section_end)?;
        self.apply_guessed_decimation(section_start, section_end, pattern, offset, drop_duplicate)?;

        self.pattern_guessing.failures.remove(&section_start);
        self.set_modified(true);
        Ok(true)
    }

    /// Guess one section's cadence from mics and dmetrics combined: both
    /// sources rank the candidates, an acceptable mics answer is preferred,
    /// and the section fails only when both sources reject.
    pub fn guess_section_patterns_from_mics_and_dmetrics(
        &mut self,
        section_start: i32,
        minimum_length: i32,
        use_patterns: Patterns,
        drop_duplicate: DropDuplicate,
    ) -> Result<bool> {
        if self.mics.is_none() {
            return Err(ProjectError::MissingMetrics("mics"));
        }
        if self.mmetrics.is_none() || self.vmetrics.is_none() {
            return Err(ProjectError::MissingMetrics("dmetrics"));
        }

        let (section_start, section_end) = self.guess_section_bounds(section_start)?;

        if section_end - section_start - 1 < minimum_length {
            self.record_failure(section_start, PatternGuessingFailureReason::SectionTooShort);
            return Ok(false);
        }

        let mic_best = self.best_pattern_by_mics(section_start, section_end, use_patterns);
        let dmet_best = self.best_pattern_by_dmetrics(section_start, section_end, use_patterns);

        let threshold = i64::from(section_end - section_start - 1);
        let good_mics = mic_best.map_or(false, |(_, _, dev)| dev <= threshold);
        let good_dmet = dmet_best.map_or(false, |(_, _, _, vdev)| vdev <= threshold);

        if !good_mics && !good_dmet {
            self.record_failure(
                section_start,
                PatternGuessingFailureReason::AmbiguousMatchPattern,
            );
            return Ok(false);
        }

        let (pattern_idx, offset) = if good_mics {
            let (p, o, _) = mic_best.expect("good_mics implies a candidate");
            (p, o)
        } else {
            let (p, o, _, _) = dmet_best.expect("good_dmet implies a candidate");
            (p, o)
        };

        let pattern = CANDIDATE_PATTERNS[pattern_idx].0;
        debug!(
            section_start,
            pattern, offset, good_mics, "guessed cadence from mics+dmetrics"
        );

        self.apply_section_pattern(section_start, section_end, pattern, offset)?;

        if section_start == 0 && self.match_at(0) == Match::B {
            self.set_match(0, Match::N)?;
        }

        if good_mics {
            self.fix_section_end_by_mics(section_end)?;
        } else {
            self.fix_section_end_by_dmetrics(section_end)?;
        }

        self.apply_guessed_decimation(section_start, section_end, pattern, offset, drop_duplicate)?;

        self.pattern_guessing.failures.remove(&section_start);
        self.set_modified(true);
        Ok(true)
    }

    /// Guess one section's cadence from the distribution of `n`,`c` pairs
    /// in the collector's original matches.
    pub fn guess_section_patterns_from_matches(
        &mut self,
        section_start: i32,
        minimum_length: i32,
        use_third_n_match: UseThirdNMatch,
        drop_duplicate: DropDuplicate,
    ) -> Result<bool> {
        let (section_start, section_end) = self.guess_section_bounds(section_start)?;

        if section_end - section_start - 1 < minimum_length {
            self.record_failure(section_start, PatternGuessingFailureReason::SectionTooShort);
            return Ok(false);
        }

        // Count the "nc" pairs at each cycle position.
        let mut positions = [0i32; 5];
        let mut total = 0i32;

        let scan_end = section_end.min(self.num_frames_source - 1) - 1;
        for i in section_start..scan_end {
            if self.original_match_at(i) == Match::N && self.original_match_at(i + 1) == Match::C {
                positions[(i % 5) as usize] += 1;
                total += 1;
            }
        }

        // The two positions with the most pairs; the first index wins ties.
        let mut best = 0usize;
        let mut tmp = -1;
        for (i, &count) in positions.iter().enumerate() {
            if count > tmp {
                tmp = count;
                best = i;
            }
        }

        let mut next_best = 0usize;
        tmp = -1;
        for (i, &count) in positions.iter().enumerate() {
            if i == best {
                continue;
            }
            if count > tmp {
                tmp = count;
                next_best = i;
            }
        }

        let (best_percent, next_best_percent) = if total > 0 {
            (
                positions[best] as f32 * 100.0 / total as f32,
                positions[next_best] as f32 * 100.0 / total as f32,
            )
        } else {
            (0.0, 0.0)
        };

        // The pattern must clearly dominate the runner-up.
        if !(best_percent > 40.0 && best_percent - next_best_percent > 10.0) {
            self.record_failure(
                section_start,
                PatternGuessingFailureReason::AmbiguousMatchPattern,
            );
            return Ok(false);
        }

        debug!(section_start, best, best_percent, "guessed cadence from matches");

        self.apply_pattern_guessing_decimation(
            section_start,
            section_end - 1,
            best as i32,
            drop_duplicate,
        )?;

        // The cadence whose n falls at the dominant position.
        let mut patterns = ["ncccn", "nnccc", "cnncc", "ccnnc", "cccnn"].map(pattern_matches);
        if use_third_n_match == UseThirdNMatch::Always {
            for (i, pattern) in patterns.iter_mut().enumerate() {
                pattern[(i + 3) % 5] = Match::N;
            }
        }
        let pattern = &patterns[best];

        for i in section_start..section_end - 1 {
            let idx = (i % 5) as usize;

            if use_third_n_match == UseThirdNMatch::IfPrettier
                && pattern[idx] == Match::C
                && pattern[(idx + 1) % 5] == Match::N
            {
                let mics = self.mics_at(i);
                if mics[Match::N.mic_index()] < mics[Match::C.mic_index()] {
                    self.set_match(i, Match::N)?;
                } else {
                    self.set_match(i, Match::C)?;
                }
            } else {
                self.set_match(i, pattern[idx])?;
            }
        }

        self.fix_section_end_by_mics(section_end)?;

        self.pattern_guessing.failures.remove(&section_start);
        self.set_modified(true);
        Ok(true)
    }

    /// Guess every section from mics and record the configuration used.
    pub fn guess_project_patterns_from_mics(
        &mut self,
        minimum_length: i32,
        use_patterns: Patterns,
        drop_duplicate: DropDuplicate,
    ) -> Result<()> {
        self.pattern_guessing.failures.clear();

        for start in self.sections.starts() {
            self.guess_section_patterns_from_mics(
                start,
                minimum_length,
                use_patterns,
                drop_duplicate,
            )?;
        }

        self.update_orphan_fields();

        self.pattern_guessing.method = PatternGuessingMethod::Mics;
        self.pattern_guessing.minimum_length = minimum_length;
        self.pattern_guessing.use_patterns = use_patterns;
        self.pattern_guessing.decimation = drop_duplicate;
        self.set_modified(true);
        Ok(())
    }

    pub fn guess_project_patterns_from_dmetrics(
        &mut self,
        minimum_length: i32,
        use_patterns: Patterns,
        drop_duplicate: DropDuplicate,
    ) -> Result<()> {
        self.pattern_guessing.failures.clear();

        for start in self.sections.starts() {
            self.guess_section_patterns_from_dmetrics(
                start,
                minimum_length,
                use_patterns,
                drop_duplicate,
            )?;
        }

        self.update_orphan_fields();

        self.pattern_guessing.method = PatternGuessingMethod::DMetrics;
        self.pattern_guessing.minimum_length = minimum_length;
        self.pattern_guessing.use_patterns = use_patterns;
        self.pattern_guessing.decimation = drop_duplicate;
        self.set_modified(true);
        Ok(())
    }

    pub fn guess_project_patterns_from_mics_and_dmetrics(
        &mut self,
        minimum_length: i32,
        use_patterns: Patterns,
        drop_duplicate: DropDuplicate,
    ) -> Result<()> {
        self.pattern_guessing.failures.clear();

        for start in self.sections.starts() {
            self.guess_section_patterns_from_mics_and_dmetrics(
                start,
                minimum_length,
                use_patterns,
                drop_duplicate,
            )?;
        }

        self.update_orphan_fields();

        self.pattern_guessing.method = PatternGuessingMethod::MicsAndDMetrics;
        self.pattern_guessing.minimum_length = minimum_length;
        self.pattern_guessing.use_patterns = use_patterns;
        self.pattern_guessing.decimation = drop_duplicate;
        self.set_modified(true);
        Ok(())
    }

    pub fn guess_project_patterns_from_matches(
        &mut self,
        minimum_length: i32,
        use_third_n_match: UseThirdNMatch,
        drop_duplicate: DropDuplicate,
    ) -> Result<()> {
        self.pattern_guessing.failures.clear();

        for start in self.sections.starts() {
            self.guess_section_patterns_from_matches(
                start,
                minimum_length,
                use_third_n_match,
                drop_duplicate,
            )?;
        }

        self.update_orphan_fields();

        self.pattern_guessing.method = PatternGuessingMethod::Matches;
        self.pattern_guessing.minimum_length = minimum_length;
        self.pattern_guessing.third_n_match = use_third_n_match;
        self.pattern_guessing.decimation = drop_duplicate;
        self.set_modified(true);
        Ok(())
    }

    /// Apply the drop policy across the cycles of a freshly guessed
    /// section. `first_duplicate` is the in-cycle offset of the first of
    /// the two duplicate frames.
    pub(crate) fn apply_pattern_guessing_decimation(
        &mut self,
        section_start: i32,
        section_end: i32,
        first_duplicate: i32,
        mut drop_duplicate: DropDuplicate,
    ) -> Result<()> {
        // When the duplicate pair straddles the cycle boundary there is no
        // single cycle to decide in.
        if drop_duplicate == DropDuplicate::UglierPerCycle && first_duplicate == 4 {
            drop_duplicate = DropDuplicate::UglierPerSection;
        }

        let fixed_drop: Option<i32> = match drop_duplicate {
            DropDuplicate::First => Some(first_duplicate),
            DropDuplicate::Second => Some((first_duplicate + 1) % 5),
            DropDuplicate::UglierPerSection => {
                // Majority vote over the section's duplicate pairs.
                let mut drop_n = 0;
                let mut drop_c = 0;

                let limit = section_end.min(self.num_frames_source - 1);
                for i in section_start..limit {
                    if i % 5 == first_duplicate {
                        let mic_n = self.mics_at(i)[Match::N.mic_index()];
                        let mic_c = self.mics_at(i + 1)[Match::C.mic_index()];
                        if mic_n > mic_c {
                            drop_n += 1;
                        } else {
                            drop_c += 1;
                        }
                    }
                }

                Some(if drop_n > drop_c {
                    first_duplicate
                } else {
                    (first_duplicate + 1) % 5
                })
            }
            DropDuplicate::UglierPerCycle => None,
        };

        let first_cycle = section_start / 5;
        let last_cycle = (section_end - 1) / 5;

        for cycle in first_cycle..=last_cycle {
            let drop = match fixed_drop {
                Some(drop) => drop,
                None => {
                    // Boundary cycles may hold only one of the duplicates,
                    // or neither.
                    if cycle == first_cycle && section_start % 5 > first_duplicate + 1 {
                        continue;
                    }
                    if cycle == last_cycle && (section_end - 1) % 5 < first_duplicate {
                        continue;
                    }

                    if cycle == first_cycle && section_start % 5 > first_duplicate {
                        first_duplicate + 1
                    } else if cycle == last_cycle && (section_end - 1) % 5 < first_duplicate + 1 {
                        first_duplicate
                    } else {
                        let mic_n =
                            self.mics_at(cycle * 5 + first_duplicate)[Match::N.mic_index()];
                        let mic_c =
                            self.mics_at(cycle * 5 + first_duplicate + 1)[Match::C.mic_index()];
                        if mic_n > mic_c {
                            first_duplicate
                        } else {
                            (first_duplicate + 1) % 5
                        }
                    }
                }
            };

            // Clear the cycle's previous drops, touching only frames that
            // belong to this section in the boundary cycles.
            if cycle == first_cycle {
                let end = ((cycle + 1) * 5).min(self.num_frames_source);
                for frame in section_start..end {
                    if self.is_decimated(frame) {
                        self.delete_decimated_frame(frame)?;
                    }
                }
            } else if cycle == last_cycle {
                for frame in cycle * 5..section_end {
                    if self.is_decimated(frame) {
                        self.delete_decimated_frame(frame)?;
                    }
                }
            } else {
                self.clear_decimated_frames_from_cycle(cycle * 5)?;
            }

            let drop_frame = cycle * 5 + drop;
            if drop_frame >= section_start && drop_frame < section_end {
                self.add_decimated_frame(drop_frame)?;
            }
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

    /// Mics for a clean cccnn cadence at offset 0: positions 0..2 prefer c,
    /// positions 3..4 prefer n.
    fn telecined_mics(project: &mut Project) {
        for frame in 0..project.num_frames_source() {
            let mics = if frame % 5 < 3 {
                [0, 0, 100, 0, 0] // good c, bad n
            } else {
                [0, 100, 0, 0, 0] // bad c, good n
            };
            project.set_mics(frame, mics).unwrap();
        }
    }

    fn decimated(project: &Project) -> Vec<i32> {
        (0..project.num_frames_source())
            .filter(|&f| project.is_decimated_frame(f).unwrap())
            .collect()
    }

    #[test]
    fn test_guess_from_mics_cccnn() {
        let mut project = project_with_frames(25);
        telecined_mics(&mut project);

        let ok = project
            .guess_section_patterns_from_mics(0, 10, Patterns::all(), DropDuplicate::First)
            .unwrap();
        assert!(ok);

        assert_eq!(
            project.matches_string().unwrap(),
            "cccnncccnncccnncccnncccnb"
        );
        assert_eq!(decimated(&project), vec![4, 9, 14, 19, 24]);
        assert_eq!(project.num_frames_decimated(), 20);
        assert!(project.pattern_guessing().failures.is_empty());
    }

    #[test]
    fn test_guess_from_mics_zero_metrics_picks_first_candidate() {
        let mut project = project_with_frames(25);
        // All-zero mics: every candidate scores zero deviation, so the
        // first pattern and offset win deterministically.
        for frame in 0..25 {
            project.set_mics(frame, [0; 5]).unwrap();
        }

        let ok = project
            .guess_section_patterns_from_mics(0, 10, Patterns::all(), DropDuplicate::First)
            .unwrap();
        assert!(ok);
        assert!(project.matches_string().unwrap().starts_with("cccnn"));
        assert_eq!(decimated(&project).len(), 5);
    }

    #[test]
    fn test_guess_from_mics_noise_is_ambiguous() {
        let mut project = project_with_frames(25);
        // Strong alternating preference with period 2 never lines up with
        // a five-frame cadence, so every candidate accumulates deviation
        // far above the section length.
        for frame in 0..25 {
            let mics = if frame % 2 == 0 {
                [0, 0, 100, 0, 0]
            } else {
                [0, 100, 0, 0, 0]
            };
            project.set_mics(frame, mics).unwrap();
        }

        let ok = project
            .guess_section_patterns_from_mics(0, 10, Patterns::all(), DropDuplicate::First)
            .unwrap();
        assert!(!ok);

        let failure = project.pattern_guessing().failures.get(&0).unwrap();
        assert_eq!(
            failure.reason,
            PatternGuessingFailureReason::AmbiguousMatchPattern
        );
    }

    #[test]
    fn test_guess_section_too_short() {
        let mut project = project_with_frames(8);
        for frame in 0..8 {
            project.set_mics(frame, [0; 5]).unwrap();
        }

        let ok = project
            .guess_section_patterns_from_mics(0, 10, Patterns::all(), DropDuplicate::First)
            .unwrap();
        assert!(!ok);
        assert_eq!(
            project.pattern_guessing().failures.get(&0).unwrap().reason,
            PatternGuessingFailureReason::SectionTooShort
        );
    }

    #[test]
    fn test_guess_without_mics_is_an_error() {
        let mut project = project_with_frames(25);
        assert_eq!(
            project.guess_section_patterns_from_mics(
                0,
                10,
                Patterns::all(),
                DropDuplicate::First
            ),
            Err(ProjectError::MissingMetrics("mics"))
        );
        assert_eq!(
            project.guess_section_patterns_from_dmetrics(
                0,
                10,
                Patterns::all(),
                DropDuplicate::First
            ),
            Err(ProjectError::MissingMetrics("dmetrics"))
        );
    }

    #[test]
    fn test_guess_from_dmetrics_ccnnn() {
        let mut project = project_with_frames(25);
        // dmetric columns are [p-ish, c-ish]; n aliases to the p column.
        // Positions 0..1 prefer c, positions 2..4 prefer n.
        for frame in 0..25 {
            let (p_col, c_col) = if frame % 5 < 2 { (100, 0) } else { (0, 100) };
            project
                .set_dmetrics(frame, p_col, c_col, p_col, c_col)
                .unwrap();
        }

        let ok = project
            .guess_section_patterns_from_dmetrics(0, 10, Patterns::all(), DropDuplicate::First)
            .unwrap();
        assert!(ok);
        assert_eq!(
            project.matches_string().unwrap(),
            "ccnnnccnnnccnnnccnnnccnnb"
        );
        // ccnnn at offset 0: first duplicate is offset 4.
        assert_eq!(decimated(&project), vec![4, 9, 14, 19, 24]);
    }

    #[test]
    fn test_guess_combined_prefers_mics() {
        let mut project = project_with_frames(25);
        telecined_mics(&mut project);
        // Dmetrics vote for a different cadence; the acceptable mics
        // answer must win.
        for frame in 0..25 {
            let (p_col, c_col) = if frame % 5 < 2 { (100, 0) } else { (0, 100) };
            project
                .set_dmetrics(frame, p_col, c_col, p_col, c_col)
                .unwrap();
        }

        let ok = project
            .guess_section_patterns_from_mics_and_dmetrics(
                0,
                10,
                Patterns::all(),
                DropDuplicate::First,
            )
            .unwrap();
        assert!(ok);
        assert!(project.matches_string().unwrap().starts_with("cccnn"));
    }

    #[test]
    fn test_guess_from_matches() {
        let mut project = project_with_frames(30);
        // Original matches show the n,c pair at position 0 of every cycle.
        for (i, c) in "ncccc".chars().cycle().take(30).enumerate() {
            project
                .set_original_match(i as i32, Match::from_char(c).unwrap())
                .unwrap();
        }

        let ok = project
            .guess_section_patterns_from_matches(
                0,
                10,
                UseThirdNMatch::Never,
                DropDuplicate::First,
            )
            .unwrap();
        assert!(ok);

        let matches = project.matches_string().unwrap();
        assert!(matches.starts_with("ncccn"));
        // Decimation drops the dominant position in every cycle of
        // [start, end - 1).
        assert_eq!(decimated(&project), vec![0, 5, 10, 15, 20, 25]);
        assert!(project.pattern_guessing().failures.is_empty());
    }

    #[test]
    fn test_guess_from_matches_ambiguous_without_pairs() {
        let mut project = project_with_frames(30);
        for i in 0..30 {
            project.set_original_match(i, Match::C).unwrap();
        }

        let ok = project
            .guess_section_patterns_from_matches(
                0,
                10,
                UseThirdNMatch::Never,
                DropDuplicate::First,
            )
            .unwrap();
        assert!(!ok);
        assert_eq!(
            project.pattern_guessing().failures.get(&0).unwrap().reason,
            PatternGuessingFailureReason::AmbiguousMatchPattern
        );
    }

    #[test]
    fn test_five_c_section_clears_decimation() {
        let mut project = project_with_frames(25);
        // Everything prefers c: the five-c pattern wins with zero
        // deviation while cccnn and ccnnn pay for their n positions.
        for frame in 0..25 {
            project.set_mics(frame, [0, 0, 100, 0, 0]).unwrap();
        }
        for frame in [2, 7, 12] {
            project.add_decimated_frame(frame).unwrap();
        }

        let ok = project
            .guess_section_patterns_from_mics(0, 10, Patterns::all(), DropDuplicate::First)
            .unwrap();
        assert!(ok);
        assert!(decimated(&project).is_empty());
        assert_eq!(project.num_frames_decimated(), 25);
    }

    #[test]
    fn test_drop_uglier_per_section() {
        let mut project = project_with_frames(10);
        telecined_mics(&mut project);

        // Both duplicate pairs look equal, so the c side wins the vote and
        // the second duplicate (offset 0 of the following cycle) drops.
        let ok = project
            .guess_section_patterns_from_mics(
                0,
                5,
                Patterns::all(),
                DropDuplicate::UglierPerSection,
            )
            .unwrap();
        assert!(ok);
        assert_eq!(decimated(&project), vec![0, 5]);
    }

    #[test]
    fn test_guess_is_deterministic() {
        let build = || {
            let mut project = project_with_frames(25);
            telecined_mics(&mut project);
            project
                .guess_project_patterns_from_mics(10, Patterns::all(), DropDuplicate::First)
                .unwrap();
            (
                project.matches_string(),
                (0..25)
                    .filter(|&f| project.is_decimated_frame(f).unwrap())
                    .collect::<Vec<_>>(),
                project.pattern_guessing().failures.len(),
            )
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn test_project_guess_records_config_and_orphans() {
        let mut project = project_with_frames(25);
        telecined_mics(&mut project);

        project
            .guess_project_patterns_from_mics(10, Patterns::all(), DropDuplicate::Second)
            .unwrap();

        let config = project.pattern_guessing();
        assert_eq!(config.method, PatternGuessingMethod::Mics);
        assert_eq!(config.minimum_length, 10);
        assert_eq!(config.decimation, DropDuplicate::Second);
    }
}
