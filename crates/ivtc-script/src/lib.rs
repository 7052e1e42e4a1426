//! IVTC Script - Script generation
//!
//! Compiles the project model into an ordered VapourSynth filter pipeline,
//! plus the v1 timecode and keyframe sidecar formats. Generation is a pure
//! function of the project: nothing here mutates it.

pub mod generate;

pub use generate::{
    generate_final_script, generate_keyframes_v1, generate_main_display_script,
    generate_timecodes_v1, DecimationFunction, FinalScriptFormat,
};
