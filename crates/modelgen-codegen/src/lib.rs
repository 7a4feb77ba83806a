//! Mongoose model and GraphQL schema generation from entity descriptions.
//!
//! `modelgen-codegen` compiles JSON entity descriptions into a typed IR and
//! renders that IR as two JavaScript modules per entity: a Mongoose model and
//! a GraphQL object/input type pair with CRUD operations.
//!
//! # Architecture
//!
//! ```text
//! Description          IR                       Output
//! ────────────     ─────────────────        ──────────────────
//! {"name":         ┌─> StorageModel ────────> models/<E>.js
//!  "String!"} ─────┤   (storage.rs)
//!                  └─> ApiModel ─────┬──────> schema/<E>.js
//!                      (api.rs)      └──────> schema/index.js (queries + mutations)
//! ```
//!
//! Every field passes through the binder ([`bind`]), which maps a type tag
//! (`["@"] Name ["!"]`) to concrete storage and API type expressions against
//! statically declared registries ([`tag`]). Unknown tags are hard errors,
//! never silently treated as references.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use modelgen_codegen::{Description, compile_storage, emit};
//!
//! let desc: Description = serde_json::from_str(
//!     r#"{ "name": "String!", "email": "@String!", "password": "PasswordHash" }"#,
//! ).unwrap();
//!
//! let known: BTreeSet<String> = ["User".to_string()].into();
//! let storage = compile_storage("User", &desc, &known).unwrap();
//! let js = emit::emit_model("User", &storage);
//! assert!(js.contains("new Mongoose.Schema"));
//! ```

pub mod api;
pub mod bind;
pub mod description;
pub mod emit;
pub mod ir;
pub mod storage;
pub mod tag;

pub use api::compile_api;
pub use bind::{CompileError, bind_api, bind_storage};
pub use description::{Description, FieldDecl};
pub use ir::{ApiModel, StorageModel};
pub use storage::compile_storage;
pub use tag::TypeTag;

/// Embedded structures deeper than this are rejected. Descriptions are finite
/// JSON trees, so the guard only trips on pathological nesting.
pub const MAX_EMBED_DEPTH: usize = 32;
