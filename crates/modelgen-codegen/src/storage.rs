//! Storage-side model compiler.
//!
//! Recursively walks a description and lowers it into a [`StorageModel`]:
//! ordered schema fields, a deduplicated import list, and the generated
//! helper methods. Methods hoisted out of embedded structures are re-keyed
//! with a `<field>_` prefix and their bodies target the full document path.

use crate::MAX_EMBED_DEPTH;
use crate::bind::{CompileError, bind_storage};
use crate::description::{Description, FieldDecl};
use crate::ir::{
    MethodKind, ReferenceTarget, StorageField, StorageImport, StorageModel, StorageType,
};
use std::collections::BTreeSet;

/// Compile one entity's description into its storage model.
pub fn compile_storage(
    owner: &str,
    desc: &Description,
    known: &BTreeSet<String>,
) -> Result<StorageModel, CompileError> {
    let mut model = StorageModel::default();
    model.push_import(StorageImport::Mongoose);
    let fields = compile_level(owner, desc, known, 0, "", "", &mut model)?;
    model.fields = fields;

    // Every require declares a module-level const; a repeated name would be
    // a JS SyntaxError in the emitted module.
    let mut bindings: BTreeSet<&str> = BTreeSet::new();
    for import in &model.imports {
        if !bindings.insert(import.binding_name()) {
            return Err(CompileError::BindingCollision {
                binding: import.binding_name().to_string(),
            });
        }
    }
    Ok(model)
}

fn compile_level(
    owner: &str,
    desc: &Description,
    known: &BTreeSet<String>,
    depth: usize,
    slot_prefix: &str,
    name_prefix: &str,
    model: &mut StorageModel,
) -> Result<Vec<StorageField>, CompileError> {
    let mut fields = Vec::with_capacity(desc.fields.len());

    for (key, decl) in &desc.fields {
        let slot = format!("{slot_prefix}{key}");
        match decl {
            FieldDecl::Tag(raw) => {
                let binding = bind_storage(key, &slot, raw, owner, known, false)?;
                absorb(model, name_prefix, binding.imports, binding.methods);
                fields.push(StorageField {
                    name: key.clone(),
                    ty: binding.ty,
                    required: binding.required,
                    unique: binding.unique,
                });
            }
            FieldDecl::List(raw) => {
                let binding = bind_storage(key, &slot, raw, owner, known, true)?;
                absorb(model, name_prefix, binding.imports, binding.methods);
                fields.push(StorageField {
                    name: key.clone(),
                    ty: StorageType::List(Box::new(binding.ty)),
                    required: binding.required,
                    unique: binding.unique,
                });
            }
            FieldDecl::Embedded(sub) => {
                if depth + 1 >= MAX_EMBED_DEPTH {
                    return Err(CompileError::TooDeep {
                        field: slot,
                        limit: MAX_EMBED_DEPTH,
                    });
                }
                let sub_fields = compile_level(
                    owner,
                    sub,
                    known,
                    depth + 1,
                    &format!("{slot}."),
                    &format!("{name_prefix}{key}_"),
                    model,
                )?;
                // Embedded structures have no identity and are always
                // nullable, regardless of markers on their own key.
                fields.push(StorageField {
                    name: key.clone(),
                    ty: StorageType::Embedded(sub_fields),
                    required: false,
                    unique: false,
                });
            }
        }
    }

    Ok(fields)
}

fn absorb(
    model: &mut StorageModel,
    name_prefix: &str,
    imports: Vec<StorageImport>,
    methods: Vec<crate::ir::StorageMethod>,
) {
    // Imports and the method bodies that close over them get the same
    // `<field>_` re-keying as the method names, so a reference field in an
    // embedded structure never shadows a top-level one.
    for mut import in imports {
        if !name_prefix.is_empty() {
            if let StorageImport::Model { binding, .. } = &mut import {
                *binding = format!("{name_prefix}{binding}");
            }
        }
        model.push_import(import);
    }
    for mut method in methods {
        if !name_prefix.is_empty() {
            method.name = format!("{name_prefix}{}", method.name);
            if let MethodKind::GetReference {
                target: ReferenceTarget::Import { binding },
            } = &mut method.kind
            {
                *binding = format!("{name_prefix}{binding}");
            }
        }
        model.methods.push(method);
    }
}
