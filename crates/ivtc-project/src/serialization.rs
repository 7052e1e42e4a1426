//! The project document format.
//!
//! A UTF-8 JSON object whose top-level key order is stable across saves.
//! The reader accepts format versions 1 through 3 and is fail-closed: it
//! fills a fresh project and publishes it only after the whole document
//! validated.

use serde_json::{Map, Value};
use tracing::debug;

use ivtc_core::{
    CustomList, DropDuplicate, FrameRange, Match, PatternGuessingFailureReason,
    PatternGuessingMethod, Patterns, PositionInFilterChain, ProjectError, Result, Section,
    UseThirdNMatch,
};

use crate::project::Project;

/// Current document format version. The reader accepts this and older.
pub const PROJECT_FORMAT_VERSION: i64 = 3;

/// Application generation stamp written into every document.
const WOBBLY_VERSION: i64 = 6;

const FRAME_RATES: [i32; 5] = [30, 24, 18, 12, 6];

#[derive(Clone, Copy, PartialEq)]
enum ParamType {
    Int,
    Double,
    Bool,
}

const VFM_PARAMETERS: [(&str, ParamType); 11] = [
    ("order", ParamType::Int),
    ("cthresh", ParamType::Int),
    ("mi", ParamType::Int),
    ("blockx", ParamType::Int),
    ("blocky", ParamType::Int),
    ("y0", ParamType::Int),
    ("y1", ParamType::Int),
    ("micmatch", ParamType::Int),
    ("scthresh", ParamType::Double),
    ("chroma", ParamType::Bool),
    ("mchroma", ParamType::Bool),
];

const VDECIMATE_PARAMETERS: [(&str, ParamType); 5] = [
    ("blockx", ParamType::Int),
    ("blocky", ParamType::Int),
    ("dupthresh", ParamType::Double),
    ("scthresh", ParamType::Double),
    ("chroma", ParamType::Bool),
];

fn method_to_str(method: PatternGuessingMethod) -> &'static str {
    match method {
        PatternGuessingMethod::Matches => "from matches",
        PatternGuessingMethod::Mics => "from mics",
        PatternGuessingMethod::DMetrics => "from dmetrics",
        PatternGuessingMethod::MicsAndDMetrics => "from mics+dmetrics",
    }
}

fn method_from_str(s: &str) -> Option<PatternGuessingMethod> {
    match s {
        "from matches" => Some(PatternGuessingMethod::Matches),
        "from mics" => Some(PatternGuessingMethod::Mics),
        "from dmetrics" => Some(PatternGuessingMethod::DMetrics),
        "from mics+dmetrics" => Some(PatternGuessingMethod::MicsAndDMetrics),
        _ => None,
    }
}

fn third_n_match_to_str(policy: UseThirdNMatch) -> &'static str {
    match policy {
        UseThirdNMatch::Always => "always",
        UseThirdNMatch::Never => "never",
        UseThirdNMatch::IfPrettier => "if it has lower mic",
    }
}

fn third_n_match_from_str(s: &str) -> Option<UseThirdNMatch> {
    match s {
        "always" => Some(UseThirdNMatch::Always),
        "never" => Some(UseThirdNMatch::Never),
        "if it has lower mic" => Some(UseThirdNMatch::IfPrettier),
        _ => None,
    }
}

fn decimation_to_str(policy: DropDuplicate) -> &'static str {
    match policy {
        DropDuplicate::First => "first duplicate",
        DropDuplicate::Second => "second duplicate",
        DropDuplicate::UglierPerCycle => "duplicate with higher mic per cycle",
        DropDuplicate::UglierPerSection => "duplicate with higher mic per section",
    }
}

fn decimation_from_str(s: &str) -> Option<DropDuplicate> {
    match s {
        "first duplicate" => Some(DropDuplicate::First),
        "second duplicate" => Some(DropDuplicate::Second),
        "duplicate with higher mic per cycle" => Some(DropDuplicate::UglierPerCycle),
        "duplicate with higher mic per section" => Some(DropDuplicate::UglierPerSection),
        _ => None,
    }
}

fn failure_reason_to_str(reason: PatternGuessingFailureReason) -> &'static str {
    match reason {
        PatternGuessingFailureReason::SectionTooShort => "section too short",
        PatternGuessingFailureReason::AmbiguousMatchPattern => "ambiguous pattern",
    }
}

fn position_to_str(position: PositionInFilterChain) -> &'static str {
    match position {
        PositionInFilterChain::PostSource => "post source",
        PositionInFilterChain::PostFieldMatch => "post field match",
        PositionInFilterChain::PostDecimate => "post decimate",
    }
}

fn position_from_str(s: &str) -> Option<PositionInFilterChain> {
    match s {
        "post source" => Some(PositionInFilterChain::PostSource),
        "post field match" => Some(PositionInFilterChain::PostFieldMatch),
        "post decimate" => Some(PositionInFilterChain::PostDecimate),
        _ => None,
    }
}

fn missing_err(key: &str) -> ProjectError {
    ProjectError::Parse(format!("JSON key '{key}' is missing"))
}

fn type_err(key: &str, expected: &str) -> ProjectError {
    ProjectError::Parse(format!("JSON key '{key}' must be {expected}"))
}

fn element_err(index: usize, key: &str, expected: &str) -> ProjectError {
    ProjectError::Parse(format!(
        "element number {index} of JSON key '{key}' must be {expected}"
    ))
}

// ── Writer ──────────────────────────────────────────────────────────

/// Serialize a project to document bytes. `compact` strips all optional
/// whitespace; the default form is pretty-printed.
pub fn write_project(project: &Project, compact: bool) -> Result<Vec<u8>> {
    let mut root = Map::new();

    root.insert("wobbly version".to_string(), WOBBLY_VERSION.into());
    root.insert(
        "project format version".to_string(),
        PROJECT_FORMAT_VERSION.into(),
    );
    root.insert("input file".to_string(), project.input_file.clone().into());
    root.insert(
        "input frame rate".to_string(),
        Value::Array(vec![project.fps_num.into(), project.fps_den.into()]),
    );
    root.insert(
        "input resolution".to_string(),
        Value::Array(vec![project.width.into(), project.height.into()]),
    );

    if project.wobbly {
        root.insert(
            "user interface".to_string(),
            Value::Object(write_user_interface(project)),
        );
    }

    let trims: Vec<Value> = project
        .trims
        .values()
        .map(|t| Value::Array(vec![t.first.into(), t.last.into()]))
        .collect();
    root.insert("trim".to_string(), Value::Array(trims));

    let vfm = write_parameters(
        &project.vfm_parameters_int,
        &project.vfm_parameters_double,
        &project.vfm_parameters_bool,
    );
    if !vfm.is_empty() {
        root.insert("vfm parameters".to_string(), Value::Object(vfm));
    }

    let vdecimate = write_parameters(
        &project.vdecimate_parameters_int,
        &project.vdecimate_parameters_double,
        &project.vdecimate_parameters_bool,
    );
    if !vdecimate.is_empty() {
        root.insert("vdecimate parameters".to_string(), Value::Object(vdecimate));
    }

    if let Some(mics) = &project.mics {
        let rows: Vec<Value> = mics
            .iter()
            .map(|row| Value::Array(row.iter().map(|&v| Value::from(v)).collect()))
            .collect();
        root.insert("mics".to_string(), Value::Array(rows));
    }

    if let Some(mmetrics) = &project.mmetrics {
        let rows: Vec<Value> = mmetrics
            .iter()
            .map(|row| Value::Array(row.iter().map(|&v| Value::from(v)).collect()))
            .collect();
        root.insert("mmetrics".to_string(), Value::Array(rows));
    }

    if let Some(vmetrics) = &project.vmetrics {
        let rows: Vec<Value> = vmetrics
            .iter()
            .map(|row| Value::Array(row.iter().map(|&v| Value::from(v)).collect()))
            .collect();
        root.insert("vmetrics".to_string(), Value::Array(rows));
    }

    if let Some(matches) = &project.matches {
        let chars: Vec<Value> = matches
            .iter()
            .map(|m| Value::from(m.to_char().to_string()))
            .collect();
        root.insert("matches".to_string(), Value::Array(chars));
    }

    if let Some(original) = &project.original_matches {
        let chars: Vec<Value> = original
            .iter()
            .map(|m| Value::from(m.to_char().to_string()))
            .collect();
        root.insert("original matches".to_string(), Value::Array(chars));
    }

    if !project.combed_frames.is_empty() {
        let frames: Vec<Value> = project.combed_frames.iter().map(|&f| f.into()).collect();
        root.insert("combed frames".to_string(), Value::Array(frames));
    }

    if !project.decimated_frames.is_empty() {
        let mut frames = Vec::new();
        for (cycle, dropped) in project.decimated_frames.iter().enumerate() {
            for &offset in dropped {
                frames.push(Value::from(cycle as i32 * 5 + i32::from(offset)));
            }
        }
        root.insert("decimated frames".to_string(), Value::Array(frames));
    }

    if let Some(metrics) = &project.decimate_metrics {
        let values: Vec<Value> = metrics.iter().map(|&v| v.into()).collect();
        root.insert("decimate metrics".to_string(), Value::Array(values));
    }

    let sections: Vec<Value> = project
        .sections
        .iter()
        .map(|(_, section)| {
            let mut obj = Map::new();
            obj.insert("start".to_string(), section.start.into());
            obj.insert(
                "presets".to_string(),
                Value::Array(section.presets.iter().map(|p| p.clone().into()).collect()),
            );
            Value::Object(obj)
        })
        .collect();
    root.insert("sections".to_string(), Value::Array(sections));

    root.insert(
        "source filter".to_string(),
        project.source_filter.clone().into(),
    );

    let fades: Vec<Value> = project
        .interlaced_fades
        .values()
        .map(|fade| {
            let mut obj = Map::new();
            obj.insert("frame".to_string(), fade.frame.into());
            obj.insert("field difference".to_string(), fade.field_difference.into());
            Value::Object(obj)
        })
        .collect();
    root.insert("interlaced fades".to_string(), Value::Array(fades));

    if project.wobbly {
        let presets: Vec<Value> = project
            .presets
            .values()
            .map(|preset| {
                let mut obj = Map::new();
                obj.insert("name".to_string(), preset.name.clone().into());
                obj.insert("contents".to_string(), preset.contents.clone().into());
                Value::Object(obj)
            })
            .collect();
        root.insert("presets".to_string(), Value::Array(presets));

        let frozen: Vec<Value> = project
            .frozen_frames
            .values()
            .map(|ff| {
                Value::Array(vec![
                    ff.first.into(),
                    ff.last.into(),
                    ff.replacement.into(),
                ])
            })
            .collect();
        root.insert("frozen frames".to_string(), Value::Array(frozen));

        let lists: Vec<Value> = project
            .custom_lists
            .iter()
            .map(|list| {
                let mut obj = Map::new();
                obj.insert("name".to_string(), list.name.clone().into());
                obj.insert("preset".to_string(), list.preset.clone().into());
                obj.insert(
                    "position".to_string(),
                    position_to_str(list.position).into(),
                );
                obj.insert(
                    "frames".to_string(),
                    Value::Array(
                        list.ranges
                            .values()
                            .map(|r| Value::Array(vec![r.first.into(), r.last.into()]))
                            .collect(),
                    ),
                );
                Value::Object(obj)
            })
            .collect();
        root.insert("custom lists".to_string(), Value::Array(lists));

        if project.resize.enabled {
            let mut obj = Map::new();
            obj.insert("width".to_string(), project.resize.width.into());
            obj.insert("height".to_string(), project.resize.height.into());
            obj.insert("filter".to_string(), project.resize.filter.clone().into());
            root.insert("resize".to_string(), Value::Object(obj));
        }

        if project.crop.enabled {
            let mut obj = Map::new();
            obj.insert("early".to_string(), project.crop.early.into());
            obj.insert("left".to_string(), project.crop.left.into());
            obj.insert("top".to_string(), project.crop.top.into());
            obj.insert("right".to_string(), project.crop.right.into());
            obj.insert("bottom".to_string(), project.crop.bottom.into());
            root.insert("crop".to_string(), Value::Object(obj));
        }

        if project.depth.enabled {
            let mut obj = Map::new();
            obj.insert("bits".to_string(), project.depth.bits.into());
            obj.insert(
                "float samples".to_string(),
                project.depth.float_samples.into(),
            );
            obj.insert("dither".to_string(), project.depth.dither.clone().into());
            root.insert("depth".to_string(), Value::Object(obj));
        }
    }

    let value = Value::Object(root);
    let bytes = if compact {
        serde_json::to_vec(&value)
    } else {
        serde_json::to_vec_pretty(&value)
    }
    .map_err(|e| ProjectError::Parse(format!("failed to serialize project: {e}")))?;

    debug!(bytes = bytes.len(), compact, "wrote project document");
    Ok(bytes)
}

fn write_parameters(
    ints: &std::collections::BTreeMap<String, i64>,
    doubles: &std::collections::BTreeMap<String, f64>,
    bools: &std::collections::BTreeMap<String, bool>,
) -> Map<String, Value> {
    let mut obj = Map::new();
    for (name, &value) in ints {
        obj.insert(name.clone(), value.into());
    }
    for (name, &value) in doubles {
        obj.insert(name.clone(), value.into());
    }
    for (name, &value) in bools {
        obj.insert(name.clone(), value.into());
    }
    obj
}

fn write_user_interface(project: &Project) -> Map<String, Value> {
    let mut ui = Map::new();

    ui.insert("zoom".to_string(), project.zoom.into());
    ui.insert(
        "last visited frame".to_string(),
        project.last_visited_frame.into(),
    );
    ui.insert("geometry".to_string(), project.ui_geometry.clone().into());
    ui.insert("state".to_string(), project.ui_state.clone().into());

    let rates: Vec<Value> = FRAME_RATES
        .iter()
        .zip(project.shown_frame_rates.iter())
        .filter(|(_, &shown)| shown)
        .map(|(&rate, _)| rate.into())
        .collect();
    ui.insert("show frame rates".to_string(), Value::Array(rates));

    ui.insert(
        "mic search minimum".to_string(),
        project.mic_search_minimum.into(),
    );
    ui.insert(
        "c match sequences minimum".to_string(),
        project.c_match_sequences_minimum.into(),
    );

    if !project.pattern_guessing.failures.is_empty() {
        let pg = &project.pattern_guessing;
        let mut obj = Map::new();

        obj.insert("method".to_string(), method_to_str(pg.method).into());
        obj.insert("minimum length".to_string(), pg.minimum_length.into());
        obj.insert(
            "use third n match".to_string(),
            third_n_match_to_str(pg.third_n_match).into(),
        );
        obj.insert(
            "decimate".to_string(),
            decimation_to_str(pg.decimation).into(),
        );

        let mut patterns = Vec::new();
        for (flag, name) in [
            (Patterns::CCCNN, "cccnn"),
            (Patterns::CCNNN, "ccnnn"),
            (Patterns::CCCCC, "ccccc"),
        ] {
            if pg.use_patterns.contains(flag) {
                patterns.push(Value::from(name));
            }
        }
        obj.insert("use patterns".to_string(), Value::Array(patterns));

        let failures: Vec<Value> = pg
            .failures
            .values()
            .map(|failure| {
                let mut f = Map::new();
                f.insert("start".to_string(), failure.start.into());
                f.insert(
                    "reason".to_string(),
                    failure_reason_to_str(failure.reason).into(),
                );
                Value::Object(f)
            })
            .collect();
        obj.insert("failures".to_string(), Value::Array(failures));

        ui.insert("pattern guessing".to_string(), Value::Object(obj));
    }

    if !project.bookmarks.is_empty() {
        let bookmarks: Vec<Value> = project
            .bookmarks
            .values()
            .map(|bookmark| {
                let mut b = Map::new();
                b.insert("frame".to_string(), bookmark.frame.into());
                b.insert(
                    "description".to_string(),
                    bookmark.description.clone().into(),
                );
                Value::Object(b)
            })
            .collect();
        ui.insert("bookmarks".to_string(), Value::Array(bookmarks));
    }

    ui
}

// ── Reader ──────────────────────────────────────────────────────────

/// Parse a project document. The returned project is fully populated or
/// the parse failed; partially-read state is never published.
pub fn read_project(bytes: &[u8], wobbly: bool) -> Result<Project> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| ProjectError::Parse(format!("invalid JSON: {e}")))?;
    let root = root
        .as_object()
        .ok_or_else(|| ProjectError::Parse("document root is not an object".to_string()))?;

    let version = match root.get("project format version") {
        None => 1,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| type_err("project format version", "an integer"))?,
    };

    if version > PROJECT_FORMAT_VERSION {
        return Err(ProjectError::Parse(format!(
            "the project's format version is {version}, but this software only understands format version {PROJECT_FORMAT_VERSION} and older"
        )));
    }

    let mut project = Project::empty(wobbly);

    project.input_file = root
        .get("input file")
        .ok_or_else(|| missing_err("input file"))?
        .as_str()
        .ok_or_else(|| type_err("input file", "a string"))?
        .to_string();

    let fps = read_i64_pair(root, "input frame rate")?;
    project.fps_num = fps.0;
    project.fps_den = fps.1;

    let resolution = read_i64_pair(root, "input resolution")?;
    project.width = resolution.0 as i32;
    project.height = resolution.1 as i32;

    let trims = root
        .get("trim")
        .ok_or_else(|| missing_err("trim"))?
        .as_array()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| type_err("trim", "an array with at least one element"))?;

    let mut num_frames = 0i32;
    for (i, trim) in trims.iter().enumerate() {
        let (first, last) = as_int_pair(trim)
            .ok_or_else(|| element_err(i, "trim", "an array of two integers"))?;
        project
            .trims
            .insert(first as i32, FrameRange::new(first as i32, last as i32));
        num_frames += (last - first + 1) as i32;
    }
    project.num_frames_source = num_frames;
    project.num_frames_decimated = num_frames;
    project.decimated_frames = vec![Default::default(); ((num_frames - 1) / 5 + 1).max(0) as usize];

    project.source_filter = root
        .get("source filter")
        .ok_or_else(|| missing_err("source filter"))?
        .as_str()
        .ok_or_else(|| type_err("source filter", "a string"))?
        .to_string();

    if let Some(ui) = root.get("user interface") {
        let ui = ui
            .as_object()
            .ok_or_else(|| type_err("user interface", "an object"))?;
        read_user_interface(&mut project, ui)?;
    }

    if let Some(params) = root.get("vfm parameters") {
        let params = params
            .as_object()
            .ok_or_else(|| type_err("vfm parameters", "an object"))?;
        let (ints, doubles, bools) =
            read_parameters(params, &VFM_PARAMETERS, version, "vfm parameters")?;
        project.vfm_parameters_int = ints;
        project.vfm_parameters_double = doubles;
        project.vfm_parameters_bool = bools;
    }

    if let Some(params) = root.get("vdecimate parameters") {
        let params = params
            .as_object()
            .ok_or_else(|| type_err("vdecimate parameters", "an object"))?;
        let (ints, doubles, bools) =
            read_parameters(params, &VDECIMATE_PARAMETERS, version, "vdecimate parameters")?;
        project.vdecimate_parameters_int = ints;
        project.vdecimate_parameters_double = doubles;
        project.vdecimate_parameters_bool = bools;
    }

    if let Some(rows) = root.get("mmetrics") {
        project.mmetrics = Some(read_metric_rows::<2>(rows, "mmetrics", num_frames)?);
    }

    if let Some(rows) = root.get("vmetrics") {
        project.vmetrics = Some(read_metric_rows::<2>(rows, "vmetrics", num_frames)?);
    }

    if let Some(rows) = root.get("mics") {
        let rows = read_metric_rows::<5>(rows, "mics", num_frames)?;
        project.mics = Some(
            rows.into_iter()
                .map(|row| row.map(|v| v as i16))
                .collect(),
        );
    }

    if let Some(value) = root.get("matches") {
        project.matches = Some(read_match_array(value, "matches", num_frames)?);
    }

    if let Some(value) = root.get("original matches") {
        project.original_matches = Some(read_match_array(value, "original matches", num_frames)?);
    }

    if let Some(value) = root.get("combed frames") {
        let frames = value
            .as_array()
            .filter(|a| a.len() <= num_frames as usize)
            .ok_or_else(|| {
                type_err(
                    "combed frames",
                    &format!("an array with at most {num_frames} elements"),
                )
            })?;
        for (i, frame) in frames.iter().enumerate() {
            let frame = frame
                .as_i64()
                .ok_or_else(|| element_err(i, "combed frames", "an integer"))?;
            project
                .add_combed_frame(frame as i32)
                .map_err(|e| ProjectError::Parse(format!("combed frames: {e}")))?;
        }
    }

    if let Some(value) = root.get("decimated frames") {
        let frames = value
            .as_array()
            .filter(|a| a.len() <= num_frames as usize)
            .ok_or_else(|| {
                type_err(
                    "decimated frames",
                    &format!("an array with at most {num_frames} elements"),
                )
            })?;
        for (i, frame) in frames.iter().enumerate() {
            let frame = frame
                .as_i64()
                .ok_or_else(|| element_err(i, "decimated frames", "an integer"))?;
            project
                .add_decimated_frame(frame as i32)
                .map_err(|e| ProjectError::Parse(format!("decimated frames: {e}")))?;
        }
    }

    if let Some(value) = root.get("decimate metrics") {
        let metrics = value
            .as_array()
            .filter(|a| a.len() == num_frames as usize)
            .ok_or_else(|| {
                type_err(
                    "decimate metrics",
                    &format!("an array with exactly {num_frames} elements"),
                )
            })?;
        let mut values = Vec::with_capacity(metrics.len());
        for (i, metric) in metrics.iter().enumerate() {
            let metric = metric
                .as_i64()
                .ok_or_else(|| element_err(i, "decimate metrics", "an integer"))?;
            values.push(metric as i32);
        }
        project.decimate_metrics = Some(values);
    }

    if let Some(value) = root.get("presets") {
        let presets = value
            .as_array()
            .ok_or_else(|| type_err("presets", "an array"))?;
        for (i, preset) in presets.iter().enumerate() {
            let preset = preset
                .as_object()
                .ok_or_else(|| element_err(i, "presets", "an object"))?;
            let name = preset
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| element_err(i, "presets", "an object with a string 'name'"))?;
            let contents = preset
                .get("contents")
                .and_then(Value::as_str)
                .ok_or_else(|| element_err(i, "presets", "an object with a string 'contents'"))?;
            project
                .add_preset(name, contents)
                .map_err(|e| ProjectError::Parse(format!("presets: {e}")))?;
        }
    }

    if let Some(value) = root.get("frozen frames") {
        let frozen = value
            .as_array()
            .ok_or_else(|| type_err("frozen frames", "an array"))?;
        for (i, ff) in frozen.iter().enumerate() {
            let ff = ff
                .as_array()
                .filter(|a| a.len() == 3)
                .ok_or_else(|| element_err(i, "frozen frames", "an array of three integers"))?;
            let values: Option<Vec<i64>> = ff.iter().map(Value::as_i64).collect();
            let values =
                values.ok_or_else(|| element_err(i, "frozen frames", "an array of three integers"))?;
            project
                .add_freeze_frame(values[0] as i32, values[1] as i32, values[2] as i32)
                .map_err(|e| ProjectError::Parse(format!("frozen frames: {e}")))?;
        }
    }

    if let Some(value) = root.get("sections") {
        let sections = value
            .as_array()
            .ok_or_else(|| type_err("sections", "an array"))?;
        for (i, section) in sections.iter().enumerate() {
            let section = section
                .as_object()
                .ok_or_else(|| element_err(i, "sections", "an object"))?;
            let start = section
                .get("start")
                .and_then(Value::as_i64)
                .ok_or_else(|| element_err(i, "sections", "an object with an integer 'start'"))?;

            let mut record = Section::new(start as i32);
            if let Some(presets) = section.get("presets") {
                let presets = presets
                    .as_array()
                    .ok_or_else(|| element_err(i, "sections", "an object whose 'presets' is an array"))?;
                for preset in presets {
                    let preset = preset.as_str().ok_or_else(|| {
                        element_err(i, "sections", "an object whose 'presets' contains strings")
                    })?;
                    record.presets.push(preset.to_string());
                }
            }

            project
                .add_section_record(record)
                .map_err(|e| ProjectError::Parse(format!("sections: {e}")))?;
        }
    }

    // The section at frame 0 must exist even when the document had no
    // sections at all.
    if project.sections.is_empty() {
        project.sections.insert(Section::new(0));
    }

    if let Some(value) = root.get("custom lists") {
        let lists = value
            .as_array()
            .ok_or_else(|| type_err("custom lists", "an array"))?;
        for (i, list) in lists.iter().enumerate() {
            let list_obj = list
                .as_object()
                .ok_or_else(|| element_err(i, "custom lists", "an object"))?;
            let name = list_obj
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| element_err(i, "custom lists", "an object with a string 'name'"))?;

            let preset = match list_obj.get("preset") {
                None => "",
                Some(p) => p.as_str().ok_or_else(|| {
                    element_err(i, "custom lists", "an object whose 'preset' is a string")
                })?,
            };

            let position = if version == 1 {
                let p = list_obj
                    .get("position")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        element_err(i, "custom lists", "an object with an integer 'position'")
                    })?;
                match p {
                    0 => PositionInFilterChain::PostSource,
                    1 => PositionInFilterChain::PostFieldMatch,
                    2 => PositionInFilterChain::PostDecimate,
                    other => {
                        return Err(ProjectError::Parse(format!(
                            "custom list '{name}' has invalid position {other}"
                        )))
                    }
                }
            } else {
                let p = list_obj
                    .get("position")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        element_err(i, "custom lists", "an object with a string 'position'")
                    })?;
                position_from_str(p).unwrap_or(PositionInFilterChain::PostSource)
            };

            let mut record = CustomList::new(name);
            record.preset = preset.to_string();
            record.position = position;
            project
                .add_custom_list(record)
                .map_err(|e| ProjectError::Parse(format!("custom lists: {e}")))?;

            if let Some(frames) = list_obj.get("frames") {
                let frames = frames.as_array().ok_or_else(|| {
                    element_err(i, "custom lists", "an object whose 'frames' is an array")
                })?;
                for (j, range) in frames.iter().enumerate() {
                    let (first, last) = as_int_pair(range).ok_or_else(|| {
                        element_err(j, "frames", "an array of two integers")
                    })?;
                    project
                        .add_custom_list_range(i, first as i32, last as i32)
                        .map_err(|e| ProjectError::Parse(format!("custom lists: {e}")))?;
                }
            }
        }
    }

    if let Some(value) = root.get("resize") {
        let resize = value
            .as_object()
            .ok_or_else(|| type_err("resize", "an object"))?;
        project.resize.enabled = true;
        project.resize.width = resize
            .get("width")
            .and_then(Value::as_i64)
            .ok_or_else(|| type_err("resize", "an object with an integer 'width'"))?
            as i32;
        project.resize.height = resize
            .get("height")
            .and_then(Value::as_i64)
            .ok_or_else(|| type_err("resize", "an object with an integer 'height'"))?
            as i32;
        project.resize.filter = resize
            .get("filter")
            .and_then(Value::as_str)
            .ok_or_else(|| type_err("resize", "an object with a string 'filter'"))?
            .to_string();
    } else {
        project.resize.enabled = false;
        project.resize.width = project.width;
        project.resize.height = project.height;
    }

    if let Some(value) = root.get("crop") {
        let crop = value
            .as_object()
            .ok_or_else(|| type_err("crop", "an object"))?;
        project.crop.enabled = true;
        project.crop.early = crop
            .get("early")
            .and_then(Value::as_bool)
            .ok_or_else(|| type_err("crop", "an object with a boolean 'early'"))?;
        for (field, slot) in [
            ("left", &mut project.crop.left),
            ("top", &mut project.crop.top),
            ("right", &mut project.crop.right),
            ("bottom", &mut project.crop.bottom),
        ] {
            *slot = crop
                .get(field)
                .and_then(Value::as_i64)
                .ok_or_else(|| type_err("crop", &format!("an object with an integer '{field}'")))?
                as i32;
        }
    } else {
        project.crop.enabled = false;
    }

    if let Some(value) = root.get("depth") {
        let depth = value
            .as_object()
            .ok_or_else(|| type_err("depth", "an object"))?;
        project.depth.enabled = true;
        project.depth.bits = depth
            .get("bits")
            .and_then(Value::as_i64)
            .ok_or_else(|| type_err("depth", "an object with an integer 'bits'"))?
            as i32;
        project.depth.float_samples = depth
            .get("float samples")
            .and_then(Value::as_bool)
            .ok_or_else(|| type_err("depth", "an object with a boolean 'float samples'"))?;
        project.depth.dither = depth
            .get("dither")
            .and_then(Value::as_str)
            .ok_or_else(|| type_err("depth", "an object with a string 'dither'"))?
            .to_string();
    } else {
        project.depth.enabled = false;
    }

    if let Some(value) = root.get("interlaced fades") {
        let fades = value
            .as_array()
            .ok_or_else(|| type_err("interlaced fades", "an array"))?;
        for (i, fade) in fades.iter().enumerate() {
            let fade = fade
                .as_object()
                .ok_or_else(|| element_err(i, "interlaced fades", "an object"))?;
            let frame = fade
                .get("frame")
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    element_err(i, "interlaced fades", "an object with an integer 'frame'")
                })?;
            let difference = fade
                .get("field difference")
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    element_err(
                        i,
                        "interlaced fades",
                        "an object with a numeric 'field difference'",
                    )
                })?;
            project
                .add_interlaced_fade(frame as i32, difference)
                .map_err(|e| ProjectError::Parse(format!("interlaced fades: {e}")))?;
        }
    }

    project.set_modified(false);

    debug!(
        num_frames = project.num_frames_source,
        version, "read project document"
    );
    Ok(project)
}

fn read_i64_pair(root: &Map<String, Value>, key: &str) -> Result<(i64, i64)> {
    root.get(key)
        .ok_or_else(|| missing_err(key))?
        .as_array()
        .filter(|a| a.len() == 2)
        .and_then(|a| Some((a[0].as_i64()?, a[1].as_i64()?)))
        .ok_or_else(|| type_err(key, "an array of two integers"))
}

fn as_int_pair(value: &Value) -> Option<(i64, i64)> {
    let pair = value.as_array().filter(|a| a.len() == 2)?;
    Some((pair[0].as_i64()?, pair[1].as_i64()?))
}

fn read_match_array(value: &Value, key: &str, num_frames: i32) -> Result<Vec<Match>> {
    let chars = value
        .as_array()
        .filter(|a| a.len() == num_frames as usize)
        .ok_or_else(|| type_err(key, &format!("an array with exactly {num_frames} elements")))?;

    let mut matches = Vec::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        let c = c
            .as_str()
            .filter(|s| s.chars().count() == 1)
            .ok_or_else(|| element_err(i, key, "a string with the length of 1"))?;
        let m = Match::from_char(c.chars().next().expect("length checked"))
            .map_err(|_| element_err(i, key, "one of 'p', 'c', 'n', 'b', or 'u'"))?;
        matches.push(m);
    }
    Ok(matches)
}

fn read_metric_rows<const N: usize>(
    value: &Value,
    key: &str,
    num_frames: i32,
) -> Result<Vec<[i32; N]>> {
    let rows = value
        .as_array()
        .filter(|a| a.len() == num_frames as usize)
        .ok_or_else(|| type_err(key, &format!("an array with exactly {num_frames} elements")))?;

    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let row = row
            .as_array()
            .filter(|a| a.len() == N)
            .ok_or_else(|| element_err(i, key, &format!("an array of exactly {N} integers")))?;

        let mut values = [0i32; N];
        for (j, v) in row.iter().enumerate() {
            values[j] = v
                .as_i64()
                .ok_or_else(|| element_err(i, key, &format!("an array of exactly {N} integers")))?
                as i32;
        }
        out.push(values);
    }
    Ok(out)
}

type ParameterMaps = (
    std::collections::BTreeMap<String, i64>,
    std::collections::BTreeMap<String, f64>,
    std::collections::BTreeMap<String, bool>,
);

/// Read the recognized matcher/decimator parameters.
///
/// Format version 2 stored every value as a number; they are coerced back
/// to their declared types. Every other version requires the exact type.
fn read_parameters(
    params: &Map<String, Value>,
    recognized: &[(&str, ParamType)],
    version: i64,
    section_key: &str,
) -> Result<ParameterMaps> {
    let mut ints = std::collections::BTreeMap::new();
    let mut doubles = std::collections::BTreeMap::new();
    let mut bools = std::collections::BTreeMap::new();

    for &(name, param_type) in recognized {
        let Some(value) = params.get(name) else {
            continue;
        };

        if version == 2 {
            let number = value.as_f64().ok_or_else(|| {
                ProjectError::Parse(format!(
                    "JSON key '{name}', member of '{section_key}', must be a number"
                ))
            })?;

            match param_type {
                ParamType::Bool => {
                    bools.insert(name.to_string(), number != 0.0);
                }
                ParamType::Int => {
                    ints.insert(name.to_string(), number as i64);
                }
                ParamType::Double => {
                    doubles.insert(name.to_string(), number);
                }
            }
        } else {
            let wrong_type = |expected: &str| {
                ProjectError::Parse(format!(
                    "JSON key '{name}', member of '{section_key}', must be a {expected}"
                ))
            };

            match param_type {
                ParamType::Bool => {
                    let v = value.as_bool().ok_or_else(|| wrong_type("boolean"))?;
                    bools.insert(name.to_string(), v);
                }
                ParamType::Int => {
                    let v = value.as_i64().ok_or_else(|| wrong_type("integer"))?;
                    ints.insert(name.to_string(), v);
                }
                ParamType::Double => {
                    if !value.is_f64() {
                        return Err(wrong_type("double"));
                    }
                    doubles.insert(name.to_string(), value.as_f64().expect("checked"));
                }
            }
        }
    }

    Ok((ints, doubles, bools))
}

fn read_user_interface(project: &mut Project, ui: &Map<String, Value>) -> Result<()> {
    project.zoom = match ui.get("zoom") {
        None => 1,
        Some(v) => v.as_i64().ok_or_else(|| type_err("zoom", "an integer"))? as i32,
    };

    project.last_visited_frame = match ui.get("last visited frame") {
        None => 0,
        Some(v) => v
            .as_i64()
            .ok_or_else(|| type_err("last visited frame", "an integer"))? as i32,
    };

    if let Some(state) = ui.get("state") {
        project.ui_state = state
            .as_str()
            .ok_or_else(|| type_err("state", "a string"))?
            .to_string();
    }

    if let Some(geometry) = ui.get("geometry") {
        project.ui_geometry = geometry
            .as_str()
            .ok_or_else(|| type_err("geometry", "a string"))?
            .to_string();
    }

    project.shown_frame_rates = [true, false, true, true, true];
    if let Some(rates) = ui.get("show frame rates") {
        let rates = rates
            .as_array()
            .ok_or_else(|| type_err("show frame rates", "an array"))?;
        let mut shown = std::collections::BTreeSet::new();
        for (i, rate) in rates.iter().enumerate() {
            let rate = rate
                .as_i64()
                .ok_or_else(|| element_err(i, "show frame rates", "an integer"))?;
            shown.insert(rate as i32);
        }
        for (slot, rate) in project.shown_frame_rates.iter_mut().zip(FRAME_RATES) {
            *slot = shown.contains(&rate);
        }
    }

    if let Some(minimum) = ui.get("mic search minimum") {
        project.mic_search_minimum = minimum
            .as_i64()
            .ok_or_else(|| type_err("mic search minimum", "an integer"))? as i32;
    }

    if let Some(minimum) = ui.get("c match sequences minimum") {
        project.c_match_sequences_minimum = minimum
            .as_i64()
            .ok_or_else(|| type_err("c match sequences minimum", "an integer"))?
            as i32;
    }

    if let Some(pg) = ui.get("pattern guessing") {
        let pg = pg
            .as_object()
            .ok_or_else(|| type_err("pattern guessing", "an object"))?;

        project.pattern_guessing.method = PatternGuessingMethod::MicsAndDMetrics;
        if let Some(method) = pg.get("method") {
            let method = method
                .as_str()
                .ok_or_else(|| type_err("method", "a string"))?;
            if let Some(method) = method_from_str(method) {
                project.pattern_guessing.method = method;
            }
        }

        if let Some(minimum) = pg.get("minimum length") {
            project.pattern_guessing.minimum_length = minimum
                .as_i64()
                .ok_or_else(|| type_err("minimum length", "an integer"))?
                as i32;
        }

        project.pattern_guessing.third_n_match = UseThirdNMatch::Never;
        if let Some(policy) = pg.get("use third n match") {
            let policy = policy
                .as_str()
                .ok_or_else(|| type_err("use third n match", "a string"))?;
            if let Some(policy) = third_n_match_from_str(policy) {
                project.pattern_guessing.third_n_match = policy;
            }
        }

        project.pattern_guessing.decimation = DropDuplicate::First;
        if let Some(policy) = pg.get("decimate") {
            let policy = policy
                .as_str()
                .ok_or_else(|| type_err("decimate", "a string"))?;
            if let Some(policy) = decimation_from_str(policy) {
                project.pattern_guessing.decimation = policy;
            }
        }

        if let Some(patterns) = pg.get("use patterns") {
            let patterns = patterns
                .as_array()
                .ok_or_else(|| type_err("use patterns", "an array"))?;

            let mut mask = Patterns::empty();
            for (i, pattern) in patterns.iter().enumerate() {
                let pattern = pattern
                    .as_str()
                    .ok_or_else(|| element_err(i, "use patterns", "a string"))?;
                match pattern {
                    "cccnn" => mask.insert(Patterns::CCCNN),
                    "ccnnn" => mask.insert(Patterns::CCNNN),
                    "ccccc" => mask.insert(Patterns::CCCCC),
                    _ => {}
                }
            }
            project.pattern_guessing.use_patterns = mask;
        }

        if let Some(failures) = pg.get("failures") {
            let failures = failures
                .as_array()
                .ok_or_else(|| type_err("failures", "an array"))?;
            for (i, failure) in failures.iter().enumerate() {
                let failure = failure
                    .as_object()
                    .ok_or_else(|| element_err(i, "failures", "an object"))?;
                let start = failure
                    .get("start")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        element_err(i, "failures", "an object with an integer 'start'")
                    })? as i32;
                let reason = failure
                    .get("reason")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        element_err(i, "failures", "an object with a string 'reason'")
                    })?;

                let reason = match reason {
                    "section too short" => PatternGuessingFailureReason::SectionTooShort,
                    _ => PatternGuessingFailureReason::AmbiguousMatchPattern,
                };

                project.pattern_guessing.failures.insert(
                    start,
                    ivtc_core::FailedPatternGuessing { start, reason },
                );
            }
        }
    }

    if let Some(bookmarks) = ui.get("bookmarks") {
        let bookmarks = bookmarks
            .as_array()
            .ok_or_else(|| type_err("bookmarks", "an array"))?;
        for (i, bookmark) in bookmarks.iter().enumerate() {
            let bookmark = bookmark
                .as_object()
                .ok_or_else(|| element_err(i, "bookmarks", "an object"))?;
            let frame = bookmark
                .get("frame")
                .and_then(Value::as_i64)
                .ok_or_else(|| element_err(i, "bookmarks", "an object with an integer 'frame'"))?;
            let description = bookmark
                .get("description")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    element_err(i, "bookmarks", "an object with a string 'description'")
                })?;
            project
                .add_bookmark(frame as i32, description)
                .map_err(|e| ProjectError::Parse(format!("bookmarks: {e}")))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_project() -> Project {
        let mut project = Project::new(
            true,
            "input.dgi",
            "bs.VideoSource",
            30000,
            1001,
            720,
            480,
            30,
        );
        project.add_trim(0, 29);

        for frame in 0..30 {
            project
                .set_mics(frame, [1, 2, 3, 4, 5])
                .unwrap();
            project.set_dmetrics(frame, 10, 20, 30, 40).unwrap();
            project.set_decimate_metric(frame, frame * 7).unwrap();
            project.set_original_match(frame, Match::C).unwrap();
        }
        project
            .set_range_matches_from_pattern(0, 29, "cccnn")
            .unwrap();
        project.add_decimated_frame(4).unwrap();
        project.add_decimated_frame(9).unwrap();
        project.add_combed_frame(17).unwrap();

        project.add_preset("denoise", "clip = clip.std.Median()").unwrap();
        project.add_section(10).unwrap();
        project.set_section_preset(10, "denoise").unwrap();

        let mut list = CustomList::new("credits");
        list.preset = "denoise".to_string();
        list.position = PositionInFilterChain::PostDecimate;
        project.add_custom_list(list).unwrap();
        project.add_custom_list_range(0, 20, 25).unwrap();

        project.add_freeze_frame(12, 14, 12).unwrap();
        project.add_bookmark(3, "check this").unwrap();
        project.add_interlaced_fade(21, 0.625).unwrap();

        project.set_resize_enabled(true);
        project.set_resize(640, 480, "spline36").unwrap();
        project.set_crop_enabled(true);
        project.set_crop(2, 4, 6, 8).unwrap();
        project.set_crop_early(false);
        project.set_bit_depth_enabled(true);
        project.set_bit_depth(16, false, "error_diffusion");

        project.set_vfm_parameter_int("order", 1);
        project.set_vfm_parameter_double("scthresh", 12.0);
        project.set_vfm_parameter_bool("chroma", true);
        project.set_vdecimate_parameter_double("dupthresh", 1.1);

        // A failure record forces the pattern guessing block to be written.
        project
            .guess_section_patterns_from_mics(10, 100, Patterns::all(), DropDuplicate::First)
            .unwrap();

        project
    }

    #[test]
    fn test_round_trip() {
        let project = full_project();
        let bytes = write_project(&project, false).unwrap();
        let loaded = read_project(&bytes, true).unwrap();

        assert_eq!(loaded.input_file(), project.input_file());
        assert_eq!(loaded.source_filter(), project.source_filter());
        assert_eq!(loaded.frame_rate(), project.frame_rate());
        assert_eq!(loaded.resolution(), project.resolution());
        assert_eq!(loaded.num_frames_source(), project.num_frames_source());
        assert_eq!(loaded.num_frames_decimated(), project.num_frames_decimated());
        assert_eq!(loaded.trims(), project.trims());

        assert_eq!(loaded.matches, project.matches);
        assert_eq!(loaded.original_matches, project.original_matches);
        assert_eq!(loaded.mics, project.mics);
        assert_eq!(loaded.mmetrics, project.mmetrics);
        assert_eq!(loaded.vmetrics, project.vmetrics);
        assert_eq!(loaded.decimate_metrics, project.decimate_metrics);
        assert_eq!(loaded.decimated_frames, project.decimated_frames);
        assert_eq!(loaded.combed_frames, project.combed_frames);

        assert_eq!(loaded.sections, project.sections);
        assert_eq!(loaded.presets, project.presets);
        assert_eq!(loaded.custom_lists, project.custom_lists);
        assert_eq!(loaded.frozen_frames, project.frozen_frames);
        assert_eq!(loaded.bookmarks, project.bookmarks);
        assert_eq!(loaded.interlaced_fades, project.interlaced_fades);
        assert_eq!(loaded.pattern_guessing, project.pattern_guessing);

        assert_eq!(loaded.resize, project.resize);
        assert_eq!(loaded.crop, project.crop);
        assert_eq!(loaded.depth, project.depth);

        assert_eq!(loaded.vfm_parameters_int, project.vfm_parameters_int);
        assert_eq!(loaded.vfm_parameters_double, project.vfm_parameters_double);
        assert_eq!(loaded.vfm_parameters_bool, project.vfm_parameters_bool);
        assert_eq!(
            loaded.vdecimate_parameters_double,
            project.vdecimate_parameters_double
        );

        assert!(!loaded.is_modified());
    }

    #[test]
    fn test_compact_form_round_trips_too() {
        let project = full_project();
        let pretty = write_project(&project, false).unwrap();
        let compact = write_project(&project, true).unwrap();

        assert!(compact.len() < pretty.len());

        let loaded = read_project(&compact, true).unwrap();
        assert_eq!(loaded.matches, project.matches);
        assert_eq!(loaded.decimated_frames, project.decimated_frames);
    }

    fn minimal_doc(extra: &str) -> Vec<u8> {
        format!(
            r#"{{
                "wobbly version": 6,
                "project format version": 3,
                "input file": "x.dgi",
                "input frame rate": [30000, 1001],
                "input resolution": [720, 480],
                "trim": [[0, 9]],
                "source filter": "bs.VideoSource"{extra}
            }}"#
        )
        .into_bytes()
    }

    #[test]
    fn test_minimal_document() {
        let project = read_project(&minimal_doc(""), true).unwrap();
        assert_eq!(project.num_frames_source(), 10);
        assert_eq!(project.num_frames_decimated(), 10);
        // Section 0 is synthesized when the document has none.
        assert!(project.sections.contains(0));
        assert_eq!(project.get_match(0).unwrap(), Match::C);
    }

    #[test]
    fn test_missing_required_key() {
        let doc = br#"{"input file": "x", "trim": [[0, 9]]}"#;
        let err = read_project(doc, true).unwrap_err();
        assert!(matches!(err, ProjectError::Parse(_)));
    }

    #[test]
    fn test_future_version_rejected() {
        let doc = br#"{"project format version": 4, "input file": "x"}"#;
        let err = read_project(doc, true).unwrap_err();
        assert!(matches!(err, ProjectError::Parse(_)));
    }

    #[test]
    fn test_wrong_matches_length_rejected() {
        let doc = minimal_doc(r#", "matches": ["c", "c"]"#);
        assert!(matches!(
            read_project(&doc, true),
            Err(ProjectError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_match_char_rejected() {
        let matches: Vec<String> = (0..10).map(|_| "\"x\"".to_string()).collect();
        let doc = minimal_doc(&format!(", \"matches\": [{}]", matches.join(",")));
        assert!(matches!(
            read_project(&doc, true),
            Err(ProjectError::Parse(_))
        ));
    }

    #[test]
    fn test_v2_numeric_coercion() {
        let doc = br#"{
            "project format version": 2,
            "input file": "x.dgi",
            "input frame rate": [30000, 1001],
            "input resolution": [720, 480],
            "trim": [[0, 9]],
            "source filter": "bs.VideoSource",
            "vfm parameters": {"order": 1.0, "chroma": 0.0, "scthresh": 12}
        }"#;

        let project = read_project(doc, true).unwrap();
        assert_eq!(project.vfm_parameter_int("order"), Some(1));
        assert_eq!(project.vfm_parameter_bool("chroma"), Some(false));
        assert_eq!(project.vfm_parameter_double("scthresh"), Some(12.0));
    }

    #[test]
    fn test_v3_exact_types_enforced() {
        let doc = minimal_doc(r#", "vfm parameters": {"order": 1.0}"#);
        assert!(matches!(
            read_project(&doc, true),
            Err(ProjectError::Parse(_))
        ));

        let doc = minimal_doc(r#", "vfm parameters": {"chroma": 0.0}"#);
        assert!(matches!(
            read_project(&doc, true),
            Err(ProjectError::Parse(_))
        ));

        // An integer where a double is declared is also a type error.
        let doc = minimal_doc(r#", "vfm parameters": {"scthresh": 12}"#);
        assert!(matches!(
            read_project(&doc, true),
            Err(ProjectError::Parse(_))
        ));

        let doc = minimal_doc(r#", "vfm parameters": {"order": 1, "scthresh": 12.5}"#);
        let project = read_project(&doc, true).unwrap();
        assert_eq!(project.vfm_parameter_int("order"), Some(1));
        assert_eq!(project.vfm_parameter_double("scthresh"), Some(12.5));
    }

    #[test]
    fn test_v1_integer_positions() {
        let doc = br#"{
            "input file": "x.dgi",
            "input frame rate": [30000, 1001],
            "input resolution": [720, 480],
            "trim": [[0, 9]],
            "source filter": "bs.VideoSource",
            "custom lists": [
                {"name": "a", "preset": "", "position": 2, "frames": [[0, 3]]}
            ]
        }"#;

        let project = read_project(doc, true).unwrap();
        assert_eq!(
            project.custom_list_position(0).unwrap(),
            PositionInFilterChain::PostDecimate
        );
        assert_eq!(
            project.find_custom_list_range(0, 2).unwrap().unwrap().last,
            3
        );
    }

    #[test]
    fn test_decimated_frames_flat_encoding() {
        let doc = minimal_doc(r#", "decimated frames": [1, 6, 7]"#);
        let project = read_project(&doc, true).unwrap();
        assert!(project.is_decimated_frame(1).unwrap());
        assert!(project.is_decimated_frame(6).unwrap());
        assert!(project.is_decimated_frame(7).unwrap());
        assert_eq!(project.num_frames_decimated(), 7);
    }

    #[test]
    fn test_multiple_trims_accumulate_frames() {
        let doc = br#"{
            "input file": "x.dgi",
            "input frame rate": [30000, 1001],
            "input resolution": [720, 480],
            "trim": [[0, 9], [20, 29]],
            "source filter": "bs.VideoSource"
        }"#;
        let project = read_project(doc, true).unwrap();
        assert_eq!(project.num_frames_source(), 20);
        assert_eq!(project.trims().len(), 2);
    }

    #[test]
    fn test_pattern_guessing_block_round_trips() {
        let mut project = full_project();
        project
            .guess_section_patterns_from_mics(10, 100, Patterns::CCCNN, DropDuplicate::Second)
            .unwrap();

        let bytes = write_project(&project, false).unwrap();
        let loaded = read_project(&bytes, true).unwrap();

        assert_eq!(loaded.pattern_guessing.use_patterns, project.pattern_guessing.use_patterns);
        assert!(!loaded.pattern_guessing.failures.is_empty());
        assert_eq!(
            loaded.pattern_guessing.failures.get(&10).unwrap().reason,
            PatternGuessingFailureReason::SectionTooShort
        );
    }
}
