//! shifter-lib: build pipelines for YUI-style component modules.
//!
//! A module declares its scripts, stylesheets, translations and skins in a
//! `build.json`. This crate turns those declarations into build artifacts:
//! - `descriptor`: the `build.json` model (modules, rollups)
//! - `queue`: declarative step sequences and the engine that runs them
//! - `pipeline`: one sequencer per artifact kind plus the fan-out coordinator
//! - `plan`: wave ordering of modules and the rollups that aggregate them
//! - `stack`: the join primitive every fan-out waits on

pub mod compress;
pub mod consts;
pub mod coverage;
pub mod descriptor;
pub mod lint;
pub mod paths;
pub mod pipeline;
pub mod plan;
pub mod queue;
pub mod stack;
pub mod stamp;
pub mod strip;

#[cfg(test)]
pub(crate) mod util;
