//! One-shot batch generation over a directory of description files.

use modelgen_codegen::{
    ApiModel, CompileError, Description, StorageModel, compile_api, compile_storage,
    emit::{emit_model, emit_models_index, emit_schema, emit_schema_index},
};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid description in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: CompileError,
    },

    #[error("file name \"{name}\" is not a valid entity identifier")]
    InvalidEntityName { name: String },

    #[error("entity {entity} generates type \"{type_name}\", already taken by {taken_by}")]
    TypeNameCollision {
        entity: String,
        type_name: String,
        taken_by: String,
    },
}

/// Outcome of one batch run. Errors are per-file and never abort the batch;
/// the aggregators are written even when `generated` is empty.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Entities whose model and schema modules were written, in output order.
    pub generated: Vec<String>,
    pub errors: Vec<BatchError>,
}

impl BatchReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Generate code for every `*.json` description in `input_dir`
/// (non-recursive), writing under `output_dir/models` and
/// `output_dir/schema`. Only enumeration and output-directory creation
/// failures are fatal.
pub fn run_batch(input_dir: &Path, output_dir: &Path) -> Result<BatchReport, BatchError> {
    let mut report = BatchReport::default();

    // Sorted enumeration keeps re-runs byte-identical; readdir order is
    // platform-unstable.
    let mut files = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| BatchError::Read {
            path: input_dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.into_path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    debug!(count = files.len(), input = %input_dir.display(), "enumerated descriptions");

    // The known-entity set is built before any compilation so references
    // bind regardless of processing order.
    let mut inputs: Vec<(String, PathBuf)> = Vec::new();
    let mut known: BTreeSet<String> = BTreeSet::new();
    for path in files {
        match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if is_valid_entity_name(stem) => {
                known.insert(stem.to_string());
                inputs.push((stem.to_string(), path));
            }
            _ => report.errors.push(BatchError::InvalidEntityName {
                name: path.file_name().unwrap_or_default().to_string_lossy().into_owned(),
            }),
        }
    }

    let models_dir = output_dir.join("models");
    let schema_dir = output_dir.join("schema");
    for dir in [&models_dir, &schema_dir] {
        fs::create_dir_all(dir).map_err(|e| BatchError::Write {
            path: dir.clone(),
            source: e,
        })?;
    }

    // Compile everything first: the type-name collision check must see the
    // whole batch before anything is emitted.
    let mut compiled: Vec<(String, StorageModel, ApiModel)> = Vec::new();
    for (entity, path) in inputs {
        match compile_one(&entity, &path, &known) {
            Ok((storage, api)) => compiled.push((entity, storage, api)),
            Err(err) => {
                warn!(entity, "compilation failed");
                report.errors.push(err);
            }
        }
    }

    let mut taken: BTreeMap<String, String> = BTreeMap::new();
    taken.insert("RootQueryType".to_string(), "the schema root".to_string());
    taken.insert("Mutation".to_string(), "the schema root".to_string());
    let mut emitted: Vec<(String, StorageModel, ApiModel)> = Vec::new();
    for (entity, storage, api) in compiled {
        let mut collision = None;
        for type_name in api.type_names() {
            if let Some(taken_by) = taken.get(&type_name) {
                collision = Some(BatchError::TypeNameCollision {
                    entity: entity.clone(),
                    type_name,
                    taken_by: taken_by.clone(),
                });
                break;
            }
        }
        if let Some(err) = collision {
            report.errors.push(err);
            continue;
        }
        for type_name in api.type_names() {
            taken.insert(type_name, entity.clone());
        }
        emitted.push((entity, storage, api));
    }

    let mut aggregated: Vec<(String, ApiModel)> = Vec::new();
    for (entity, storage, api) in emitted {
        let model_path = models_dir.join(format!("{entity}.js"));
        if let Err(source) = fs::write(&model_path, emit_model(&entity, &storage)) {
            report.errors.push(BatchError::Write {
                path: model_path,
                source,
            });
            continue;
        }
        let schema_path = schema_dir.join(format!("{entity}.js"));
        if let Err(source) = fs::write(&schema_path, emit_schema(&entity, &api)) {
            report.errors.push(BatchError::Write {
                path: schema_path,
                source,
            });
            continue;
        }
        info!(entity, "generated");
        report.generated.push(entity.clone());
        aggregated.push((entity, api));
    }

    // Aggregators are regenerated every run, even for an empty entity set.
    let names: Vec<String> = aggregated.iter().map(|(e, _)| e.clone()).collect();
    let models_index = models_dir.join("index.js");
    if let Err(source) = fs::write(&models_index, emit_models_index(&names)) {
        report.errors.push(BatchError::Write {
            path: models_index,
            source,
        });
    }
    let schema_index = schema_dir.join("index.js");
    if let Err(source) = fs::write(&schema_index, emit_schema_index(&aggregated)) {
        report.errors.push(BatchError::Write {
            path: schema_index,
            source,
        });
    }

    Ok(report)
}

fn compile_one(
    entity: &str,
    path: &Path,
    known: &BTreeSet<String>,
) -> Result<(StorageModel, ApiModel), BatchError> {
    let content = fs::read_to_string(path).map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let desc: Description = serde_json::from_str(&content).map_err(|source| BatchError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let storage = compile_storage(entity, &desc, known).map_err(|source| BatchError::Compile {
        path: path.to_path_buf(),
        source,
    })?;
    let api = compile_api(entity, &desc, known).map_err(|source| BatchError::Compile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((storage, api))
}

/// Entity names become identifiers in the generated modules.
fn is_valid_entity_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_name_validation() {
        assert!(is_valid_entity_name("User"));
        assert!(is_valid_entity_name("_private"));
        assert!(is_valid_entity_name("Order2"));
        assert!(!is_valid_entity_name(""));
        assert!(!is_valid_entity_name("2fast"));
        assert!(!is_valid_entity_name("user-profile"));
        assert!(!is_valid_entity_name("user profile"));
    }
}
