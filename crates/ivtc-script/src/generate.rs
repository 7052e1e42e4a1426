//! The script generator.
//!
//! Stage order matters: source, early crop, trim, post-source lists, field
//! matching, post-field-match lists, per-section presets, freeze frames,
//! decimation, post-decimate lists, late crop, resize/depth, output.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tracing::debug;

use ivtc_core::{PositionInFilterChain, ProjectError, Result, Section};
use ivtc_project::Project;

/// Which decimation form to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecimationFunction {
    /// Generate both forms and keep the shorter one.
    #[default]
    Auto,
    DeleteFrames,
    SelectEvery,
}

/// Options for the final script.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalScriptFormat {
    pub decimation_function: DecimationFunction,
}

/// Compile the whole project into the final processing script.
pub fn generate_final_script(
    project: &Project,
    save_source_node: bool,
    format: &FinalScriptFormat,
) -> Result<String> {
    let mut script = String::new();

    header_to_script(&mut script);
    presets_to_script(project, &mut script);
    source_to_script(project, &mut script, save_source_node);

    if project.is_crop_enabled() && project.is_crop_early() {
        crop_to_script(project, &mut script);
    }

    trim_to_script(project, &mut script);
    custom_lists_to_script(project, &mut script, PositionInFilterChain::PostSource)?;
    field_hint_to_script(project, &mut script);
    custom_lists_to_script(project, &mut script, PositionInFilterChain::PostFieldMatch)?;
    sections_to_script(project, &mut script);

    if !project.frozen_frames().is_empty() {
        freeze_frames_to_script(project, &mut script);
    }

    let decimation_needed = project.decimated_frames().iter().any(|c| !c.is_empty());
    if decimation_needed {
        decimated_frames_to_script(project, &mut script, format.decimation_function);
    }

    custom_lists_to_script(project, &mut script, PositionInFilterChain::PostDecimate)?;

    if project.is_crop_enabled() && !project.is_crop_early() {
        crop_to_script(project, &mut script);
    }

    if project.is_resize_enabled() || project.is_bit_depth_enabled() {
        resize_and_bit_depth_to_script(project, &mut script);
    }

    output_to_script(&mut script);

    debug!(bytes = script.len(), "generated final script");
    Ok(script)
}

/// The preview script used while editing: matching and freezes applied, no
/// decimation or per-section processing.
pub fn generate_main_display_script(project: &Project) -> String {
    let mut script = String::new();

    header_to_script(&mut script);
    source_to_script(project, &mut script, true);
    trim_to_script(project, &mut script);
    field_hint_to_script(project, &mut script);

    if !project.frozen_frames().is_empty() && project.freeze_frames_wanted() {
        freeze_frames_to_script(project, &mut script);
    }

    output_to_script(&mut script);

    script
}

/// v1 timecodes: 24 fps assumed, explicit ranges for everything else.
pub fn generate_timecodes_v1(project: &Project) -> String {
    let mut tc = String::from("# timecode format v1\nAssume ");
    let _ = writeln!(tc, "{:.12}", 24000.0 / 1001.0);

    let ranges = project.get_decimation_ranges();
    let numerators = [30000, 24000, 18000, 12000, 6000];

    for (i, range) in ranges.iter().enumerate() {
        let numerator = numerators[range.num_dropped];
        if numerator == 24000 {
            continue;
        }

        let end = ranges
            .get(i + 1)
            .map(|r| r.start)
            .unwrap_or(project.num_frames_source());

        let _ = writeln!(
            tc,
            "{},{},{:.12}",
            project.frame_number_after_decimation(range.start),
            project.frame_number_after_decimation(end) - 1,
            f64::from(numerator) / 1001.0
        );
    }

    tc
}

/// v1 keyframes: the post-decimation frame number of every section start.
pub fn generate_keyframes_v1(project: &Project) -> String {
    let mut kf = String::from("# keyframe format v1\nfps 0\n");

    for (_, section) in project.sections().iter() {
        let _ = writeln!(kf, "{}", project.frame_number_after_decimation(section.start));
    }

    kf
}

// ── Stages ──────────────────────────────────────────────────────────

fn header_to_script(script: &mut String) {
    script.push_str(concat!(
        "# Generated by ivtc-studio v",
        env!("CARGO_PKG_VERSION"),
        "\n",
        "# https://github.com/ivtc-studio/ivtc-studio\n",
        "\n",
        "import vapoursynth as vs\n",
        "\n",
        "c = vs.core\n",
        "\n",
    ));
}

fn presets_to_script(project: &Project, script: &mut String) {
    for preset in project.presets().values() {
        if !project.is_preset_in_use(&preset.name).unwrap_or(false) {
            continue;
        }

        let _ = writeln!(script, "def preset_{}(clip):", preset.name);
        for line in preset.contents.split('\n') {
            let _ = writeln!(script, "    {line}");
        }
        script.push_str("    return clip\n\n\n");
    }
}

fn escape_single_quotes(path: &str) -> String {
    path.replace('\'', "\\'")
}

fn source_args(project: &Project) -> &'static str {
    // The RFF-capable source needs its repeated fields applied.
    if project.source_filter() == "bs.VideoSource" {
        ", rff=True, showprogress=False"
    } else {
        ""
    }
}

fn source_to_script(project: &Project, script: &mut String, save_node: bool) {
    let src = format!(
        "src = c.{}(r'{}'{})\n",
        project.source_filter(),
        escape_single_quotes(project.input_file()),
        source_args(project)
    );

    if save_node {
        script.push_str("try:\n");
        script.push_str("    src = vs.get_output(index=1)\n");
        script.push_str("    if isinstance(src, vs.VideoOutputTuple):\n");
        script.push_str("        src = src[0]\n");
        script.push_str("except KeyError:\n");
        script.push_str("    ");
        script.push_str(&src);
        script.push_str("    src.set_output(index=1)\n\n");
    } else {
        script.push_str(&src);
        script.push('\n');
    }
}

fn trim_to_script(project: &Project, script: &mut String) {
    script.push_str("src = c.std.Splice(clips=[");
    for trim in project.trims().values() {
        let _ = write!(script, "src[{}:{}],", trim.first, trim.last + 1);
    }
    script.push_str("])\n\n");
}

fn field_hint_to_script(project: &Project, script: &mut String) {
    let Some(matches) = project.matches_string() else {
        return;
    };

    let tff = project.vfm_parameter_int("order").unwrap_or(1);
    let _ = write!(
        script,
        "src = c.fh.FieldHint(clip=src, tff={tff}, matches='{matches}')\n\n"
    );
}

fn custom_lists_to_script(
    project: &Project,
    script: &mut String,
    position: PositionInFilterChain,
) -> Result<()> {
    let translate = |frame: i32, is_end: bool| -> i32 {
        if position != PositionInFilterChain::PostDecimate {
            return frame;
        }

        let mut frame = frame;
        if is_end {
            // An end index that was decimated steps back until it lands on
            // a surviving frame.
            while project
                .is_decimated_frame(frame)
                .expect("list ranges reference valid frames")
            {
                frame -= 1;
            }
        }
        project.frame_number_after_decimation(frame)
    };

    for list in project.custom_lists().iter() {
        if list.position != position || list.ranges.is_empty() {
            continue;
        }

        if list.preset.is_empty() {
            return Err(ProjectError::MissingPreset(list.name.clone()));
        }

        let list_name = format!("cl_{}", list.name);
        let _ = writeln!(script, "{list_name} = preset_{}(src)", list.preset);

        let mut splice = String::from("src = c.std.Splice(mismatch=True, clips=[");

        let ranges: Vec<_> = list.ranges.values().collect();

        if ranges[0].first > 0 {
            let _ = write!(splice, "src[0:{}],", translate(ranges[0].first, false));
        }

        let mut previous_last = 0;
        for (i, range) in ranges.iter().enumerate() {
            let current_first = translate(range.first, false);
            let current_last = translate(range.last, true);

            if i > 0 && current_first - previous_last > 1 {
                let _ = write!(splice, "src[{}:{}],", previous_last + 1, current_first);
            }

            let _ = write!(splice, "{list_name}[{}:{}],", current_first, current_last + 1);
            previous_last = current_last;
        }

        let clip_end = translate(project.num_frames_source() - 1, true);
        if previous_last < clip_end {
            let _ = write!(splice, "src[{}:]", previous_last + 1);
        }

        splice.push_str("])\n\n");
        script.push_str(&splice);
    }

    Ok(())
}

fn sections_to_script(project: &Project, script: &mut String) {
    // Adjacent sections with identical preset stacks share one slice.
    let mut merged: Vec<&Section> = Vec::new();
    for (_, section) in project.sections().iter() {
        if merged
            .last()
            .map(|prev| prev.presets != section.presets)
            .unwrap_or(true)
        {
            merged.push(section);
        }
    }

    let mut splice = String::from("src = c.std.Splice(mismatch=True, clips=[");

    for (i, section) in merged.iter().enumerate() {
        let section_name = format!("section{}", section.start);
        let _ = write!(script, "{section_name} = src");

        for preset in &section.presets {
            let _ = write!(script, "\n{section_name} = preset_{preset}({section_name})");
        }

        let _ = write!(script, "[{}:", section.start);
        if let Some(next) = merged.get(i + 1) {
            let _ = write!(script, "{}", next.start);
        }
        script.push_str("]\n");

        let _ = write!(splice, "{section_name},");
    }

    splice.push_str("])\n\n");
    script.push_str(&splice);
}

fn freeze_frames_to_script(project: &Project, script: &mut String) {
    let mut first = String::from(", first=[");
    let mut last = String::from(", last=[");
    let mut replacement = String::from(", replacement=[");

    for ff in project.frozen_frames().values() {
        let _ = write!(first, "{},", ff.first);
        let _ = write!(last, "{},", ff.last);
        let _ = write!(replacement, "{},", ff.replacement);
    }

    script.push_str("src = c.std.FreezeFrames(clip=src");
    script.push_str(&first);
    script.push(']');
    script.push_str(&last);
    script.push(']');
    script.push_str(&replacement);
    script.push_str("])\n\n");
}

fn decimated_frames_to_script(
    project: &Project,
    script: &mut String,
    function: DecimationFunction,
) {
    let num_frames = project.num_frames_source();

    // Form one: per-range frame rates, then delete the dropped frames.
    let mut delete_frames = String::new();

    let decimation_ranges = project.get_decimation_ranges();
    let frame_rates = ["30", "24", "18", "12", "6"];

    let mut frame_rate_counts = [0usize; 5];
    for range in &decimation_ranges {
        frame_rate_counts[range.num_dropped] += 1;
    }

    for (count, rate) in frame_rate_counts.iter().zip(frame_rates) {
        if *count > 0 {
            let _ = writeln!(
                delete_frames,
                "r{rate} = c.std.AssumeFPS(clip=src, fpsnum={rate}000, fpsden=1001)"
            );
        }
    }

    delete_frames.push_str("src = c.std.Splice(mismatch=True, clips=[");
    for (i, range) in decimation_ranges.iter().enumerate() {
        let range_end = decimation_ranges
            .get(i + 1)
            .map(|r| r.start)
            .unwrap_or(num_frames);
        let _ = write!(
            delete_frames,
            "r{}[{}:{}],",
            frame_rates[range.num_dropped], range.start, range_end
        );
    }
    delete_frames.push_str("])\n");

    delete_frames.push_str("src = c.std.DeleteFrames(clip=src, frames=[");
    for (cycle, dropped) in project.decimated_frames().iter().enumerate() {
        for &offset in dropped {
            let _ = write!(delete_frames, "{},", cycle as i32 * 5 + i32::from(offset));
        }
    }
    delete_frames.push_str("])\n\n");

    // Form two: SelectEvery per decimation-pattern range.
    let mut select_every = String::new();
    let mut splice = String::from("src = c.std.Splice(mismatch=True, clips=[");

    let pattern_ranges = project.get_decimation_pattern_ranges();
    for (i, range) in pattern_ranges.iter().enumerate() {
        let range_end = pattern_ranges
            .get(i + 1)
            .map(|r| r.start)
            .unwrap_or(num_frames);

        if range.dropped_offsets.is_empty() {
            let _ = write!(splice, "src[{}:{}],", range.start, range_end);
            continue;
        }

        // A short tail whose frames are all dropped would become an empty
        // clip; stop before emitting it.
        if range_end - range.start <= range.dropped_offsets.len() as i32 {
            break;
        }

        let offsets: BTreeSet<u8> = (0..5u8)
            .filter(|o| !range.dropped_offsets.contains(o))
            .collect();

        let range_name = format!("dec{}", range.start);
        let _ = write!(
            select_every,
            "{range_name} = c.std.SelectEvery(clip=src[{}:{}], cycle=5, offsets=[",
            range.start, range_end
        );
        for offset in offsets {
            let _ = write!(select_every, "{offset},");
        }
        select_every.push_str("])\n");

        let _ = write!(splice, "{range_name},");
    }

    select_every.push('\n');
    select_every.push_str(&splice);
    select_every.push_str("])\n\n");

    let use_delete_frames = match function {
        DecimationFunction::DeleteFrames => true,
        DecimationFunction::SelectEvery => false,
        DecimationFunction::Auto => delete_frames.len() < select_every.len(),
    };

    script.push_str(if use_delete_frames {
        &delete_frames
    } else {
        &select_every
    });
}

fn crop_to_script(project: &Project, script: &mut String) {
    let crop = project.crop();
    let _ = write!(
        script,
        "src = c.std.CropRel(clip=src, left={}, top={}, right={}, bottom={})\n\n",
        crop.left, crop.top, crop.right, crop.bottom
    );
}

fn capitalize_filter(filter: &str) -> String {
    let mut chars = filter.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn resize_and_bit_depth_to_script(project: &Project, script: &mut String) {
    let resize = project.resize();
    let depth = project.bit_depth();

    script.push_str("src = c.resize.");
    if resize.enabled {
        script.push_str(&capitalize_filter(&resize.filter));
    } else {
        script.push_str("Bicubic");
    }
    script.push_str("(clip=src");

    if resize.enabled {
        let _ = write!(script, ", width={}, height={}", resize.width, resize.height);
    }

    if depth.enabled {
        let _ = write!(
            script,
            ", format=c.query_video_format(src.format.color_family, {}, {}, src.format.subsampling_w, src.format.subsampling_h).id",
            if depth.float_samples { "vs.FLOAT" } else { "vs.INTEGER" },
            depth.bits
        );
    }

    script.push_str(")\n\n");
}

fn output_to_script(script: &mut String) {
    script.push_str("src.set_output()\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivtc_core::CustomList;

    fn base_project() -> Project {
        let mut project = Project::new(
            true,
            "clip.dgi",
            "dgdecodenv.DGSource",
            30000,
            1001,
            720,
            480,
            30,
        );
        project.add_trim(0, 29);
        project
    }

    fn drop_every_cycle(project: &mut Project) {
        for cycle in 0..6 {
            project.add_decimated_frame(cycle * 5 + 4).unwrap();
        }
    }

    fn generate(project: &Project) -> String {
        generate_final_script(project, false, &FinalScriptFormat::default()).unwrap()
    }

    #[test]
    fn test_basic_script_shape() {
        let project = base_project();
        let script = generate(&project);

        assert!(script.starts_with("# Generated by ivtc-studio"));
        assert!(script.contains("import vapoursynth as vs"));
        assert!(script.contains("src = c.dgdecodenv.DGSource(r'clip.dgi')"));
        assert!(script.contains("src = c.std.Splice(clips=[src[0:30],])"));
        assert!(script.contains("section0 = src[0:]"));
        assert!(script.ends_with("src.set_output()\n"));
        // No matches, no freezes, no decimation.
        assert!(!script.contains("FieldHint"));
        assert!(!script.contains("FreezeFrames"));
        assert!(!script.contains("DeleteFrames"));
        assert!(!script.contains("SelectEvery"));
    }

    #[test]
    fn test_rff_source_gets_extra_args() {
        let mut project = base_project();
        project.set_source_filter("bs.VideoSource");
        let script = generate(&project);
        assert!(script.contains("src = c.bs.VideoSource(r'clip.dgi', rff=True, showprogress=False)"));
    }

    #[test]
    fn test_single_quotes_in_path_are_escaped() {
        let mut project = Project::new(
            true,
            "it's a clip.dgi",
            "dgdecodenv.DGSource",
            30000,
            1001,
            720,
            480,
            30,
        );
        project.add_trim(0, 29);
        let script = generate(&project);
        assert!(script.contains(r"r'it\'s a clip.dgi'"));
    }

    #[test]
    fn test_field_hint_uses_matches_and_order() {
        let mut project = base_project();
        project
            .set_range_matches_from_pattern(0, 29, "cccnn")
            .unwrap();
        project.set_vfm_parameter_int("order", 0);

        let script = generate(&project);
        assert!(script.contains("src = c.fh.FieldHint(clip=src, tff=0, matches='"));
        assert!(script.contains("cccnn"));
    }

    #[test]
    fn test_preset_definitions_only_for_used_presets() {
        let mut project = base_project();
        project
            .add_preset("used", "clip = clip.std.Median()\nclip = clip.std.Crop()")
            .unwrap();
        project.add_preset("unused", "clip = clip").unwrap();
        project.set_section_preset(0, "used").unwrap();

        let script = generate(&project);
        assert!(script.contains("def preset_used(clip):"));
        assert!(script.contains("    clip = clip.std.Median()\n    clip = clip.std.Crop()\n    return clip"));
        assert!(!script.contains("def preset_unused"));
        assert!(script.contains("section0 = preset_used(section0)[0:]"));
    }

    #[test]
    fn test_sections_merge_identical_preset_stacks() {
        let mut project = base_project();
        project.add_preset("p", "").unwrap();
        project.add_section(10).unwrap();
        project.add_section(20).unwrap();
        project.set_section_preset(10, "p").unwrap();

        let script = generate(&project);
        // Section 20 has the same (empty) stack as... no: section 0 empty,
        // 10 has [p], 20 empty again: three slices.
        assert!(script.contains("section0 = src[0:10]"));
        assert!(script.contains("section10 = preset_p(section10)[10:20]"));
        assert!(script.contains("section20 = src[20:]"));
        assert!(script.contains("clips=[section0,section10,section20,])"));

        // Give section 20 the same stack as 10: they merge.
        project.set_section_preset(20, "p").unwrap();
        let script = generate(&project);
        assert!(script.contains("section10 = preset_p(section10)[10:]"));
        assert!(!script.contains("section20"));
    }

    #[test]
    fn test_freeze_frames() {
        let mut project = base_project();
        project.add_freeze_frame(5, 8, 5).unwrap();
        project.add_freeze_frame(20, 21, 22).unwrap();

        let script = generate(&project);
        assert!(script.contains(
            "src = c.std.FreezeFrames(clip=src, first=[5,20,], last=[8,21,], replacement=[5,22,])"
        ));
    }

    #[test]
    fn test_decimation_select_every_form() {
        let mut project = base_project();
        drop_every_cycle(&mut project);

        let format = FinalScriptFormat {
            decimation_function: DecimationFunction::SelectEvery,
        };
        let script = generate_final_script(&project, false, &format).unwrap();

        assert!(script.contains(
            "dec0 = c.std.SelectEvery(clip=src[0:30], cycle=5, offsets=[0,1,2,3,])"
        ));
        assert!(script.contains("clips=[dec0,])"));
    }

    #[test]
    fn test_decimation_delete_frames_form() {
        let mut project = base_project();
        drop_every_cycle(&mut project);

        let format = FinalScriptFormat {
            decimation_function: DecimationFunction::DeleteFrames,
        };
        let script = generate_final_script(&project, false, &format).unwrap();

        assert!(script.contains("r24 = c.std.AssumeFPS(clip=src, fpsnum=24000, fpsden=1001)"));
        assert!(script.contains("clips=[r24[0:30],])"));
        assert!(script.contains("src = c.std.DeleteFrames(clip=src, frames=[4,9,14,19,24,29,])"));
    }

    #[test]
    fn test_decimation_auto_picks_shorter_form() {
        let mut project = base_project();
        drop_every_cycle(&mut project);

        let auto = generate(&project);
        let select = generate_final_script(
            &project,
            false,
            &FinalScriptFormat {
                decimation_function: DecimationFunction::SelectEvery,
            },
        )
        .unwrap();
        let delete = generate_final_script(
            &project,
            false,
            &FinalScriptFormat {
                decimation_function: DecimationFunction::DeleteFrames,
            },
        )
        .unwrap();

        assert_eq!(auto, if delete.len() < select.len() { delete } else { select });
    }

    #[test]
    fn test_custom_list_post_source_with_gaps() {
        let mut project = base_project();
        project.add_preset("p", "").unwrap();
        let mut list = CustomList::new("fix");
        list.preset = "p".to_string();
        project.add_custom_list(list).unwrap();
        project.add_custom_list_range(0, 5, 9).unwrap();
        project.add_custom_list_range(0, 15, 19).unwrap();

        let script = generate(&project);
        assert!(script.contains("cl_fix = preset_p(src)"));
        assert!(script.contains(
            "src = c.std.Splice(mismatch=True, clips=[src[0:5],cl_fix[5:10],src[10:15],cl_fix[15:20],src[20:]])"
        ));
    }

    #[test]
    fn test_custom_list_post_decimate_translates_frames() {
        let mut project = base_project();
        drop_every_cycle(&mut project);
        project.add_preset("p", "").unwrap();

        let mut list = CustomList::new("credits");
        list.preset = "p".to_string();
        list.position = PositionInFilterChain::PostDecimate;
        project.add_custom_list(list).unwrap();
        project.add_custom_list_range(0, 20, 25).unwrap();

        let script = generate(&project);
        // Frames 20 and 25 survive; four drops precede frame 20, five
        // precede 25. The clip tail end steps back over decimated frame 29.
        assert!(script.contains("cl_credits[16:21],"));
        assert!(script.contains("src[21:]"));
    }

    #[test]
    fn test_custom_list_without_preset_fails() {
        let mut project = base_project();
        let list = CustomList::new("nopreset");
        project.add_custom_list(list).unwrap();
        project.add_custom_list_range(0, 5, 9).unwrap();

        let err = generate_final_script(&project, false, &FinalScriptFormat::default()).unwrap_err();
        assert_eq!(err, ProjectError::MissingPreset("nopreset".to_string()));
    }

    #[test]
    fn test_empty_custom_list_is_skipped() {
        let mut project = base_project();
        project.add_custom_list(CustomList::new("empty")).unwrap();
        // No ranges: no preset needed, nothing emitted.
        let script = generate(&project);
        assert!(!script.contains("cl_empty"));
    }

    #[test]
    fn test_crop_early_vs_late() {
        let mut project = base_project();
        project.set_crop_enabled(true);
        project.set_crop(8, 0, 8, 0).unwrap();
        project.set_crop_early(true);

        let script = generate(&project);
        let crop_pos = script.find("CropRel").unwrap();
        let trim_pos = script.find("c.std.Splice(clips=").unwrap();
        assert!(crop_pos < trim_pos);

        project.set_crop_early(false);
        let script = generate(&project);
        let crop_pos = script.find("CropRel").unwrap();
        let trim_pos = script.find("c.std.Splice(clips=").unwrap();
        assert!(crop_pos > trim_pos);
        assert!(script.contains("src = c.std.CropRel(clip=src, left=8, top=0, right=8, bottom=0)"));
    }

    #[test]
    fn test_resize_and_depth_node() {
        let mut project = base_project();
        project.set_resize_enabled(true);
        project.set_resize(640, 480, "spline36").unwrap();
        project.set_bit_depth_enabled(true);
        project.set_bit_depth(16, false, "error_diffusion");

        let script = generate(&project);
        assert!(script.contains(
            "src = c.resize.Spline36(clip=src, width=640, height=480, format=c.query_video_format(src.format.color_family, vs.INTEGER, 16, src.format.subsampling_w, src.format.subsampling_h).id)"
        ));
    }

    #[test]
    fn test_depth_without_resize_uses_bicubic() {
        let mut project = base_project();
        project.set_bit_depth_enabled(true);
        project.set_bit_depth(10, true, "");

        let script = generate(&project);
        assert!(script.contains("src = c.resize.Bicubic(clip=src, format=c.query_video_format(src.format.color_family, vs.FLOAT, 10,"));
    }

    #[test]
    fn test_main_display_script() {
        let mut project = base_project();
        project
            .set_range_matches_from_pattern(0, 29, "cccnn")
            .unwrap();
        project.add_freeze_frame(5, 6, 5).unwrap();
        project.set_freeze_frames_wanted(false);

        let script = generate_main_display_script(&project);
        assert!(script.contains("vs.get_output(index=1)"));
        assert!(script.contains("FieldHint"));
        assert!(!script.contains("FreezeFrames"));
        // No per-section or decimation stages in the preview.
        assert!(!script.contains("section0"));

        project.set_freeze_frames_wanted(true);
        let script = generate_main_display_script(&project);
        assert!(script.contains("FreezeFrames"));
    }

    #[test]
    fn test_timecodes_v1() {
        let mut project = base_project();
        // Cycles 0-2 drop one frame (24 fps), cycles 3-5 drop none (30 fps).
        for cycle in 0..3 {
            project.add_decimated_frame(cycle * 5 + 4).unwrap();
        }

        let tc = generate_timecodes_v1(&project);
        assert!(tc.starts_with("# timecode format v1\nAssume 23.976023976024\n"));
        // The 30 fps range starts at source frame 15 = output frame 12 and
        // runs through output frame 26.
        assert!(tc.contains("12,26,29.970029970030"));
        // The 24 fps range is covered by the assumed rate.
        assert!(!tc.contains("0,11,"));
    }

    #[test]
    fn test_keyframes_v1() {
        let mut project = base_project();
        drop_every_cycle(&mut project);
        project.add_section(10).unwrap();
        project.add_section(20).unwrap();

        let kf = generate_keyframes_v1(&project);
        assert_eq!(kf, "# keyframe format v1\nfps 0\n0\n8\n16\n");
    }
}
