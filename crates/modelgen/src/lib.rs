//! Batch driver and CLI surface for description-to-code generation.
//!
//! One run enumerates a directory of `*.json` entity descriptions, compiles
//! each through [`modelgen_codegen`], writes `models/<E>.js` and
//! `schema/<E>.js` per entity, and regenerates the two aggregator index
//! files. Per-file failures are collected, never fatal to the batch.

pub mod batch;

use std::path::{Path, PathBuf};

/// Expected description-file path for an entity in an input directory.
pub fn description_path(input_dir: &Path, entity: &str) -> PathBuf {
    input_dir.join(format!("{entity}.json"))
}
