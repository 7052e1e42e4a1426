//! Metric ingest from the external collector.
//!
//! The collector analyzes frames asynchronously and out of order; each
//! completed frame's properties arrive here as one [`FrameSample`] and are
//! routed through the normal edit operations.

use ivtc_core::{Match, Result};

use crate::project::Project;

/// Everything the collector may report about one frame. Absent fields are
/// simply not applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSample {
    /// The match chosen by the field matcher.
    pub original_match: Option<Match>,
    /// The frame still shows combing after matching.
    pub combed: bool,
    /// Five mic values, one per candidate match.
    pub mics: Option<[i16; 5]>,
    /// Motion dmetrics `(p, c)`.
    pub mmetrics: Option<[i32; 2]>,
    /// Vertical dmetrics `(p, c)`.
    pub vmetrics: Option<[i32; 2]>,
    /// The frame starts a new scene.
    pub scene_change: bool,
    /// Block difference reported by the decimation metric pass.
    pub decimate_metric: Option<i32>,
    /// The decimator would drop this frame.
    pub decimate_drop: bool,
    /// Difference between the two fields, for interlaced-fade detection.
    pub field_difference: Option<f64>,
}

impl Project {
    /// Apply one collected frame. A field difference above
    /// `fades_threshold` records an interlaced fade; a scene change starts
    /// a new section.
    pub fn apply_frame_sample(
        &mut self,
        frame: i32,
        sample: &FrameSample,
        fades_threshold: f64,
    ) -> Result<()> {
        if let Some(m) = sample.original_match {
            self.set_original_match(frame, m)?;
        }

        if sample.combed {
            self.add_combed_frame(frame)?;
        }

        if let Some(mics) = sample.mics {
            self.set_mics(frame, mics)?;
        }

        if let (Some(mmetrics), Some(vmetrics)) = (sample.mmetrics, sample.vmetrics) {
            self.set_dmetrics(
                frame,
                mmetrics[0],
                mmetrics[1],
                vmetrics[0],
                vmetrics[1],
            )?;
        }

        if sample.scene_change {
            self.add_section(frame)?;
        }

        if let Some(metric) = sample.decimate_metric {
            self.set_decimate_metric(frame, metric)?;
        }

        if sample.decimate_drop {
            self.add_decimated_frame(frame)?;
        }

        if let Some(difference) = sample.field_difference {
            if difference > fades_threshold {
                self.add_interlaced_fade(frame, difference)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_frames(n: i32) -> Project {
        let mut project = Project::new(false, "in.dgi", "bs.VideoSource", 30000, 1001, 720, 480, n);
        project.add_trim(0, n - 1);
        project
    }

    #[test]
    fn test_full_sample_applies_everything() {
        let mut project = project_with_frames(20);

        let sample = FrameSample {
            original_match: Some(Match::N),
            combed: true,
            mics: Some([5, 4, 3, 2, 1]),
            mmetrics: Some([100, 200]),
            vmetrics: Some([300, 400]),
            scene_change: true,
            decimate_metric: Some(1234),
            decimate_drop: true,
            field_difference: Some(0.9),
        };

        project.apply_frame_sample(10, &sample, 0.4).unwrap();

        assert_eq!(project.get_original_match(10).unwrap(), Match::N);
        assert!(project.is_combed_frame(10).unwrap());
        assert_eq!(project.get_mics(10).unwrap(), [5, 4, 3, 2, 1]);
        assert_eq!(project.get_mmetrics(10).unwrap(), [100, 200]);
        assert_eq!(project.get_vmetrics(10).unwrap(), [300, 400]);
        assert!(project.sections().contains(10));
        assert_eq!(project.get_decimate_metric(10).unwrap(), 1234);
        assert!(project.is_decimated_frame(10).unwrap());
        assert!(project.interlaced_fades().contains_key(&10));
    }

    #[test]
    fn test_field_difference_below_threshold_is_not_a_fade() {
        let mut project = project_with_frames(20);

        let sample = FrameSample {
            field_difference: Some(0.2),
            ..Default::default()
        };
        project.apply_frame_sample(5, &sample, 0.4).unwrap();
        assert!(project.interlaced_fades().is_empty());
    }

    #[test]
    fn test_empty_sample_is_a_no_op() {
        let mut project = project_with_frames(20);
        project.apply_frame_sample(5, &FrameSample::default(), 0.4).unwrap();

        assert!(!project.is_combed_frame(5).unwrap());
        assert!(!project.sections().contains(5));
        assert_eq!(project.num_frames_decimated(), 20);
    }

    #[test]
    fn test_out_of_range_sample_fails() {
        let mut project = project_with_frames(20);
        let sample = FrameSample {
            combed: true,
            ..Default::default()
        };
        assert!(project.apply_frame_sample(20, &sample, 0.4).is_err());
    }

    #[test]
    fn test_collection_finish_resets_matches() {
        // The collector's final act: reset the editable matches from the
        // originals across the whole clip.
        let mut project = project_with_frames(10);
        for frame in 0..10 {
            let sample = FrameSample {
                original_match: Some(if frame % 5 == 0 { Match::N } else { Match::C }),
                ..Default::default()
            };
            project.apply_frame_sample(frame, &sample, 0.4).unwrap();
        }

        project.reset_range_matches(0, 9).unwrap();
        assert_eq!(project.matches_string().unwrap(), "nccccncccc");
    }
}
