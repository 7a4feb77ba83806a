//! Field binding: type tag to concrete storage and API type expressions.
//!
//! The binder decides the type literal for each target surface, whether the
//! field needs a cross-entity lookup at read time, which sibling module must
//! be imported, and which helper methods the field generates. A tag that
//! matches no registry entry and no known entity is a hard error.

use crate::ir::{
    GqlType, MethodKind, ReferenceTarget, StorageImport, StorageMethod, StorageType,
};
use crate::tag::{self, TypeTag};
use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("unknown type \"{tag}\" on field \"{field}\" (not a built-in and not a known entity)")]
    UnknownTag { field: String, tag: String },

    #[error("embedded structure on field \"{field}\" exceeds {limit} levels of nesting")]
    TooDeep { field: String, limit: usize },

    #[error("two requires would share the module-level binding \"{binding}\"")]
    BindingCollision { binding: String },
}

/// Storage-side binding for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageBinding {
    pub ty: StorageType,
    pub required: bool,
    pub unique: bool,
    pub methods: Vec<StorageMethod>,
    pub imports: Vec<StorageImport>,
}

/// API-side binding for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiBinding {
    pub output: GqlType,
    pub input: GqlType,
    pub required: bool,
    pub unique: bool,
    /// The referenced entity when the stored value is an identifier that
    /// must be expanded at read time.
    pub resolve: Option<String>,
    /// Sibling schema module to require (never set for self-references).
    pub import: Option<String>,
}

/// Bind a field for the storage schema.
///
/// `slot` is the document path of the field (`password`, or
/// `address.password` when bound inside an embedded structure); generated
/// method bodies close over it.
pub fn bind_storage(
    field: &str,
    slot: &str,
    raw: &str,
    owner: &str,
    known: &BTreeSet<String>,
    is_array_element: bool,
) -> Result<StorageBinding, CompileError> {
    let tag = TypeTag::parse(raw);
    let mut binding = StorageBinding {
        ty: StorageType::Number,
        required: tag.required,
        unique: tag.unique,
        methods: Vec::new(),
        imports: Vec::new(),
    };

    binding.ty = match tag.name.as_str() {
        "Int" | "Float" => StorageType::Number,
        tag::PASSWORD_HASH => {
            binding.imports.push(StorageImport::Crypto);
            binding.methods.push(StorageMethod {
                name: format!("set{field}"),
                kind: MethodKind::SetPassword {
                    slot: slot.to_string(),
                    list: is_array_element,
                },
            });
            binding.methods.push(StorageMethod {
                name: format!("validate{field}"),
                kind: MethodKind::ValidatePassword {
                    slot: slot.to_string(),
                    list: is_array_element,
                },
            });
            StorageType::HashPair
        }
        name if tag::is_mongoose_builtin(name) => {
            if tag::MONGOOSE_SCHEMA_PATH.contains(&name) {
                StorageType::SchemaPath(name.to_string())
            } else {
                StorageType::Builtin(name.to_string())
            }
        }
        // `Date` is caught by the built-in arm above; `Time`/`DateTime`
        // collapse to the same storage type.
        name if tag::is_temporal(name) => StorageType::SchemaPath("Date".to_string()),
        name if name == owner => {
            binding.methods.push(StorageMethod {
                name: format!("get{field}"),
                kind: MethodKind::GetReference {
                    target: ReferenceTarget::SelfModel {
                        entity: owner.to_string(),
                    },
                },
            });
            StorageType::Reference
        }
        name if known.contains(name) => {
            binding.imports.push(StorageImport::Model {
                binding: field.to_string(),
                entity: name.to_string(),
            });
            binding.methods.push(StorageMethod {
                name: format!("get{field}"),
                kind: MethodKind::GetReference {
                    target: ReferenceTarget::Import {
                        binding: field.to_string(),
                    },
                },
            });
            StorageType::Reference
        }
        _ => {
            return Err(CompileError::UnknownTag {
                field: field.to_string(),
                tag: tag.name,
            });
        }
    };

    Ok(binding)
}

/// Bind a field for the API schema. Required/list wrapping is applied by the
/// compiler, not here. `PasswordHash` never reaches this function: the API
/// compiler diverts password fields before binding.
pub fn bind_api(
    field: &str,
    raw: &str,
    owner: &str,
    known: &BTreeSet<String>,
) -> Result<ApiBinding, CompileError> {
    let tag = TypeTag::parse(raw);
    let (output, input, resolve, import) = match tag.name.as_str() {
        name if tag::is_graphql_scalar(name) => (
            GqlType::Scalar(name.to_string()),
            GqlType::Scalar(name.to_string()),
            None,
            None,
        ),
        name if name == owner => (
            GqlType::ObjectRef(owner.to_string()),
            GqlType::InputRef(owner.to_string()),
            Some(owner.to_string()),
            None,
        ),
        name if tag::is_temporal(name) => (
            GqlType::Temporal(name.to_string()),
            GqlType::Temporal(name.to_string()),
            None,
            None,
        ),
        name if known.contains(name) => (
            GqlType::ObjectRef(name.to_string()),
            GqlType::InputRef(name.to_string()),
            Some(name.to_string()),
            Some(name.to_string()),
        ),
        _ => {
            return Err(CompileError::UnknownTag {
                field: field.to_string(),
                tag: tag.name,
            });
        }
    };

    Ok(ApiBinding {
        output,
        input,
        required: tag.required,
        unique: tag.unique,
        resolve,
        import,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(entities: &[&str]) -> BTreeSet<String> {
        entities.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn numeric_tags_bind_to_number() {
        let k = known(&["User"]);
        for raw in ["Int", "Float", "Int!"] {
            let b = bind_storage("age", "age", raw, "User", &k, false).unwrap();
            assert_eq!(b.ty, StorageType::Number);
        }
    }

    #[test]
    fn password_hash_binds_methods_and_crypto() {
        let k = known(&["User"]);
        let b = bind_storage("password", "password", "PasswordHash", "User", &k, false).unwrap();
        assert_eq!(b.ty, StorageType::HashPair);
        assert_eq!(b.imports, vec![StorageImport::Crypto]);
        let names: Vec<&str> = b.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["setpassword", "validatepassword"]);
    }

    #[test]
    fn password_hash_in_list_binds_per_index_methods() {
        let k = known(&["User"]);
        let b = bind_storage("keys", "keys", "PasswordHash", "User", &k, true).unwrap();
        assert!(matches!(
            b.methods[0].kind,
            MethodKind::SetPassword { list: true, .. }
        ));
    }

    #[test]
    fn schema_path_builtins() {
        let k = known(&["User"]);
        let b = bind_storage("blob", "blob", "ObjectId", "User", &k, false).unwrap();
        assert_eq!(b.ty, StorageType::SchemaPath("ObjectId".into()));
        let b = bind_storage("when", "when", "DateTime!", "User", &k, false).unwrap();
        assert_eq!(b.ty, StorageType::SchemaPath("Date".into()));
        assert!(b.required);
    }

    #[test]
    fn entity_reference_imports_sibling_model() {
        let k = known(&["User", "Post"]);
        let b = bind_storage("author", "author", "User", "Post", &k, false).unwrap();
        assert_eq!(b.ty, StorageType::Reference);
        assert_eq!(
            b.imports,
            vec![StorageImport::Model {
                binding: "author".into(),
                entity: "User".into()
            }]
        );
        assert_eq!(b.methods[0].name, "getauthor");
    }

    #[test]
    fn self_reference_needs_no_import() {
        let k = known(&["User"]);
        let b = bind_storage("friend", "friend", "User", "User", &k, false).unwrap();
        assert_eq!(b.ty, StorageType::Reference);
        assert!(b.imports.is_empty());
        assert!(matches!(
            b.methods[0].kind,
            MethodKind::GetReference {
                target: ReferenceTarget::SelfModel { .. }
            }
        ));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let k = known(&["User"]);
        let err = bind_storage("x", "x", "Strnig!", "User", &k, false).unwrap_err();
        assert!(matches!(err, CompileError::UnknownTag { .. }));
        assert!(err.to_string().contains("Strnig"));
    }

    #[test]
    fn api_scalar_binding() {
        let k = known(&["User"]);
        let b = bind_api("email", "@String!", "User", &k).unwrap();
        assert_eq!(b.output, GqlType::Scalar("String".into()));
        assert!(b.required && b.unique);
        assert!(b.resolve.is_none());
    }

    #[test]
    fn api_temporal_binding() {
        let k = known(&["User"]);
        let b = bind_api("created", "DateTime", "User", &k).unwrap();
        assert_eq!(b.output, GqlType::Temporal("DateTime".into()));
    }

    #[test]
    fn api_reference_marks_resolve_and_import() {
        let k = known(&["User", "Post"]);
        let b = bind_api("author", "User", "Post", &k).unwrap();
        assert_eq!(b.output, GqlType::ObjectRef("User".into()));
        assert_eq!(b.input, GqlType::InputRef("User".into()));
        assert_eq!(b.resolve.as_deref(), Some("User"));
        assert_eq!(b.import.as_deref(), Some("User"));
    }

    #[test]
    fn api_self_reference_marks_resolve_without_import() {
        let k = known(&["User"]);
        let b = bind_api("friend", "User", "User", &k).unwrap();
        assert_eq!(b.resolve.as_deref(), Some("User"));
        assert!(b.import.is_none());
    }

    #[test]
    fn api_unknown_tag_is_an_error() {
        let k = known(&["User"]);
        assert!(matches!(
            bind_api("x", "Widget", "User", &k),
            Err(CompileError::UnknownTag { .. })
        ));
    }
}
