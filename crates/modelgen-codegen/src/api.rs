//! API-side model compiler.
//!
//! Mirrors the storage walk but produces the GraphQL object/input field
//! lists plus the metadata the generated operations need: unique-lookup
//! arguments for the read query and password-field tracking for the
//! add-mutation hashing splice.
//!
//! `PasswordHash` fields are diverted before binding: they never appear on
//! the object type and surface on the input type as raw `String` (or list of
//! `String`) so a caller can submit a plaintext password that gets hashed on
//! write.

use crate::MAX_EMBED_DEPTH;
use crate::bind::{CompileError, bind_api};
use crate::description::{Description, FieldDecl};
use crate::ir::{ApiField, ApiInputField, ApiModel, GqlType, Resolver, UniqueLookup};
use crate::tag::{self, TypeTag};
use std::collections::BTreeSet;

/// Compile one entity's description into its API model.
pub fn compile_api(
    owner: &str,
    desc: &Description,
    known: &BTreeSet<String>,
) -> Result<ApiModel, CompileError> {
    let mut model = ApiModel {
        entity: owner.to_string(),
        ..Default::default()
    };
    let (object_fields, input_fields) = compile_level(owner, desc, known, 0, "", &mut model, true)?;

    // Every entity gains an identifier on its object type, declared or not.
    model.object_fields.push(ApiField {
        name: "_id".to_string(),
        ty: GqlType::Id,
        resolver: None,
    });
    model.object_fields.extend(object_fields);
    model.input_fields = input_fields;
    Ok(model)
}

#[allow(clippy::too_many_arguments)]
fn compile_level(
    owner: &str,
    desc: &Description,
    known: &BTreeSet<String>,
    depth: usize,
    suffix_prefix: &str,
    model: &mut ApiModel,
    top: bool,
) -> Result<(Vec<ApiField>, Vec<ApiInputField>), CompileError> {
    let mut object_fields = Vec::new();
    let mut input_fields = Vec::new();

    for (key, decl) in &desc.fields {
        match decl {
            FieldDecl::Tag(raw) if TypeTag::parse(raw).name == tag::PASSWORD_HASH => {
                if top {
                    model.passwords.singular.push(key.clone());
                }
                input_fields.push(ApiInputField {
                    name: key.clone(),
                    ty: GqlType::Scalar("String".to_string()),
                    password: true,
                });
            }
            FieldDecl::List(raw) if TypeTag::parse(raw).name == tag::PASSWORD_HASH => {
                if top {
                    model.passwords.arrays.push(key.clone());
                }
                input_fields.push(ApiInputField {
                    name: key.clone(),
                    ty: GqlType::Scalar("String".to_string()).list(),
                    password: true,
                });
            }
            FieldDecl::Tag(raw) => {
                let binding = bind_api(key, raw, owner, known)?;
                if let Some(entity) = &binding.import {
                    model.push_import(entity);
                }
                let output = wrap(binding.output, binding.required, false);
                let input = wrap(binding.input, binding.required, false);
                if top && binding.unique {
                    model.unique_lookups.push(UniqueLookup {
                        name: key.clone(),
                        ty: output.strip_non_null().clone(),
                    });
                }
                object_fields.push(ApiField {
                    name: key.clone(),
                    ty: output,
                    resolver: binding.resolve.map(|entity| Resolver {
                        entity,
                        field: key.clone(),
                        list: false,
                    }),
                });
                input_fields.push(ApiInputField {
                    name: key.clone(),
                    ty: input,
                    password: false,
                });
            }
            FieldDecl::List(raw) => {
                let binding = bind_api(key, raw, owner, known)?;
                if let Some(entity) = &binding.import {
                    model.push_import(entity);
                }
                let output = wrap(binding.output, binding.required, true);
                let input = wrap(binding.input, binding.required, true);
                if top && binding.unique {
                    model.unique_lookups.push(UniqueLookup {
                        name: key.clone(),
                        ty: output.strip_non_null().clone(),
                    });
                }
                object_fields.push(ApiField {
                    name: key.clone(),
                    ty: output,
                    resolver: binding.resolve.map(|entity| Resolver {
                        entity,
                        field: key.clone(),
                        list: true,
                    }),
                });
                input_fields.push(ApiInputField {
                    name: key.clone(),
                    ty: input,
                    password: false,
                });
            }
            FieldDecl::Embedded(sub) => {
                if depth + 1 >= MAX_EMBED_DEPTH {
                    return Err(CompileError::TooDeep {
                        field: format!("{suffix_prefix}{key}"),
                        limit: MAX_EMBED_DEPTH,
                    });
                }
                let suffix = format!("{suffix_prefix}{key}");
                let (sub_object, sub_input) =
                    compile_level(owner, sub, known, depth + 1, &suffix, model, false)?;
                // Inline structures carry no identifier, no uniqueness and no
                // required wrapping of their own.
                object_fields.push(ApiField {
                    name: key.clone(),
                    ty: GqlType::InlineObject {
                        suffix: suffix.clone(),
                        fields: sub_object,
                    },
                    resolver: None,
                });
                input_fields.push(ApiInputField {
                    name: key.clone(),
                    ty: GqlType::InlineInput {
                        suffix,
                        fields: sub_input,
                    },
                    password: false,
                });
            }
        }
    }

    Ok((object_fields, input_fields))
}

/// List and non-null wrapping. The non-null wrapper goes outside the list
/// wrapper; element types are never wrapped on their own.
fn wrap(ty: GqlType, required: bool, list: bool) -> GqlType {
    let ty = if list { ty.list() } else { ty };
    if required { ty.non_null() } else { ty }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(entities: &[&str]) -> BTreeSet<String> {
        entities.iter().map(|e| e.to_string()).collect()
    }

    fn desc(json: &str) -> Description {
        serde_json::from_str(json).unwrap()
    }

    fn field<'a>(model: &'a ApiModel, name: &str) -> &'a ApiField {
        model
            .object_fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no object field {name}"))
    }

    fn input<'a>(model: &'a ApiModel, name: &str) -> &'a ApiInputField {
        model
            .input_fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no input field {name}"))
    }

    #[test]
    fn user_scenario() {
        let d = desc(r#"{ "name": "String!", "email": "@String!", "password": "PasswordHash" }"#);
        let model = compile_api("User", &d, &known(&["User"])).unwrap();

        assert_eq!(model.object_fields[0].name, "_id");
        assert_eq!(model.object_fields[0].ty, GqlType::Id);
        assert_eq!(
            field(&model, "name").ty,
            GqlType::Scalar("String".into()).non_null()
        );

        // Password never reaches the object type; raw string on the input.
        assert!(model.object_fields.iter().all(|f| f.name != "password"));
        let pw = input(&model, "password");
        assert_eq!(pw.ty, GqlType::Scalar("String".into()));
        assert!(pw.password);
        assert_eq!(model.passwords.singular, ["password"]);
        assert!(model.passwords.arrays.is_empty());

        // Unique lookup uses the bare nullable type.
        assert_eq!(model.unique_lookups.len(), 1);
        assert_eq!(model.unique_lookups[0].name, "email");
        assert_eq!(model.unique_lookups[0].ty, GqlType::Scalar("String".into()));
    }

    #[test]
    fn array_password_field() {
        let d = desc(r#"{ "recoveryKeys": ["PasswordHash"] }"#);
        let model = compile_api("User", &d, &known(&["User"])).unwrap();
        assert_eq!(
            input(&model, "recoveryKeys").ty,
            GqlType::Scalar("String".into()).list()
        );
        assert_eq!(model.passwords.arrays, ["recoveryKeys"]);
        assert!(model.passwords.singular.is_empty());
    }

    #[test]
    fn reference_field_gets_a_resolver() {
        let d = desc(r#"{ "author": "User!", "reviewers": ["User"] }"#);
        let model = compile_api("Post", &d, &known(&["Post", "User"])).unwrap();

        let author = field(&model, "author");
        assert_eq!(
            author.ty,
            GqlType::ObjectRef("User".into()).non_null()
        );
        let resolver = author.resolver.as_ref().unwrap();
        assert_eq!(resolver.entity, "User");
        assert!(!resolver.list);

        let reviewers = field(&model, "reviewers");
        assert!(reviewers.resolver.as_ref().unwrap().list);
        assert_eq!(model.imports, ["User"]);
    }

    #[test]
    fn self_reference_resolves_without_import() {
        let d = desc(r#"{ "parent": "Comment" }"#);
        let model = compile_api("Comment", &d, &known(&["Comment"])).unwrap();
        assert!(field(&model, "parent").resolver.is_some());
        assert!(model.imports.is_empty());
    }

    #[test]
    fn embedded_structure_becomes_inline_types() {
        let d = desc(r#"{ "address": { "street": "String!", "geo": { "lat": "Float" } } }"#);
        let model = compile_api("User", &d, &known(&["User"])).unwrap();

        match &field(&model, "address").ty {
            GqlType::InlineObject { suffix, fields } => {
                assert_eq!(suffix, "address");
                assert_eq!(fields[0].name, "street");
                match &fields[1].ty {
                    GqlType::InlineObject { suffix, .. } => assert_eq!(suffix, "addressgeo"),
                    other => panic!("expected nested inline object, got {other:?}"),
                }
            }
            other => panic!("expected inline object, got {other:?}"),
        }
        match &input(&model, "address").ty {
            GqlType::InlineInput { suffix, .. } => assert_eq!(suffix, "address"),
            other => panic!("expected inline input, got {other:?}"),
        }
    }

    #[test]
    fn nested_password_is_marked_but_not_spliced() {
        let d = desc(r#"{ "vault": { "pin": "PasswordHash" } }"#);
        let model = compile_api("User", &d, &known(&["User"])).unwrap();
        assert!(model.passwords.singular.is_empty());
        match &input(&model, "vault").ty {
            GqlType::InlineInput { fields, .. } => assert!(fields[0].password),
            other => panic!("expected inline input, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_fails_the_compile() {
        let d = desc(r#"{ "x": "Widget!" }"#);
        assert!(matches!(
            compile_api("User", &d, &known(&["User"])),
            Err(CompileError::UnknownTag { .. })
        ));
    }
}
