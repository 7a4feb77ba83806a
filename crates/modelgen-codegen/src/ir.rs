//! Intermediate representation for generated code.
//!
//! Both compilers ([`crate::storage`], [`crate::api`]) lower a description
//! into these structures before any text is produced, so the emitters render
//! well-formed output by construction instead of splicing raw strings.

use serde::{Deserialize, Serialize};

/// The storage side of one entity: everything needed to emit its Mongoose
/// model module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageModel {
    /// Deduplicated requires, Mongoose always first.
    pub imports: Vec<StorageImport>,
    /// Ordered schema fields.
    pub fields: Vec<StorageField>,
    /// Ordered generated methods (`set<f>`, `validate<f>`, `get<f>`).
    pub methods: Vec<StorageMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StorageImport {
    /// `const Mongoose = require("mongoose")`
    Mongoose,
    /// `const crypto = require("crypto")`
    Crypto,
    /// `const <binding> = require("./<entity>.js")`
    Model { binding: String, entity: String },
}

impl StorageImport {
    /// The module-level `const` name this require declares. Every pair of
    /// imports in one model must disagree here or the module won't load.
    pub fn binding_name(&self) -> &str {
        match self {
            StorageImport::Mongoose => "Mongoose",
            StorageImport::Crypto => "crypto",
            StorageImport::Model { binding, .. } => binding,
        }
    }
}

/// One `{ type, required?, index+unique? }` schema entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageField {
    pub name: String,
    pub ty: StorageType,
    pub required: bool,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StorageType {
    /// `Int`/`Float` tags collapse to Mongoose `Number`.
    Number,
    /// A Mongoose built-in rendered verbatim (`String`, `Boolean`, ...).
    Builtin(String),
    /// A type under `Mongoose.Schema.Types` (`ObjectId`, `Mixed`, `Date`, ...).
    SchemaPath(String),
    /// Opaque salted-hash pair for `PasswordHash` fields.
    HashPair,
    /// Embedded-identifier placeholder for an entity reference.
    Reference,
    /// List-of wrapper.
    List(Box<StorageType>),
    /// Anonymous inline structure. Always nullable.
    Embedded(Vec<StorageField>),
}

/// A generated schema method. `name` carries any `field_` re-keying applied
/// to methods hoisted out of embedded structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageMethod {
    pub name: String,
    pub kind: MethodKind,
}

/// Method bodies as data. `slot` is the document path of the owning field
/// (`password`, or `address.password` for embedded fields), so the body
/// closes over the right storage slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MethodKind {
    SetPassword { slot: String, list: bool },
    ValidatePassword { slot: String, list: bool },
    GetReference { target: ReferenceTarget },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReferenceTarget {
    /// Lookup through an imported sibling model module.
    Import { binding: String },
    /// Self-reference: resolved through the Mongoose model registry.
    SelfModel { entity: String },
}

/// The API side of one entity: object type, input type, lookup and password
/// metadata driving the generated query and mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiModel {
    pub entity: String,
    /// Sibling entities whose schema module must be required.
    pub imports: Vec<String>,
    pub object_fields: Vec<ApiField>,
    pub input_fields: Vec<ApiInputField>,
    /// Unique-flagged fields, in declaration order, with the bare (nullable)
    /// argument type for the read query.
    pub unique_lookups: Vec<UniqueLookup>,
    /// Password fields tracked for the add-mutation hashing splice.
    pub passwords: PasswordFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiField {
    pub name: String,
    pub ty: GqlType,
    pub resolver: Option<Resolver>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInputField {
    pub name: String,
    pub ty: GqlType,
    /// Raw-password input field: excluded from the update-changes input.
    pub password: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueLookup {
    pub name: String,
    pub ty: GqlType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordFields {
    pub singular: Vec<String>,
    pub arrays: Vec<String>,
}

/// Cross-entity lookup attached to a requires-resolve field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolver {
    /// Referenced entity (storage model used for the lookup).
    pub entity: String,
    /// Owning field name on the parent document.
    pub field: String,
    /// One lookup per stored reference instead of a single lookup.
    pub list: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GqlType {
    /// `GraphQL.GraphQLID`
    Id,
    /// `GraphQL.GraphQL<name>` built-in scalar.
    Scalar(String),
    /// `GraphQL<Date|Time|DateTime>` from graphql-iso-date.
    Temporal(String),
    /// `<entity>Type`
    ObjectRef(String),
    /// `<entity>InputType`
    InputRef(String),
    NonNull(Box<GqlType>),
    List(Box<GqlType>),
    /// Inline object type named `<owner><suffix>`.
    InlineObject { suffix: String, fields: Vec<ApiField> },
    /// Inline input type named `<stem><suffix>Input`, where the stem is the
    /// owner name or an operation-prefixed variant of it.
    InlineInput {
        suffix: String,
        fields: Vec<ApiInputField>,
    },
}

impl GqlType {
    pub fn non_null(self) -> Self {
        GqlType::NonNull(Box::new(self))
    }

    pub fn list(self) -> Self {
        GqlType::List(Box::new(self))
    }

    /// The bare type with any outer `NonNull` wrapping removed. Alternate
    /// lookup arguments must be optional.
    pub fn strip_non_null(&self) -> &GqlType {
        match self {
            GqlType::NonNull(inner) => inner.strip_non_null(),
            other => other,
        }
    }
}

impl StorageModel {
    /// Append an import unless an equivalent one is already present.
    pub fn push_import(&mut self, import: StorageImport) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }
}

impl ApiModel {
    /// Append a sibling schema import unless already present.
    pub fn push_import(&mut self, entity: &str) {
        if !self.imports.iter().any(|e| e == entity) {
            self.imports.push(entity.to_string());
        }
    }

    /// Every GraphQL type name this entity will register: the object and
    /// input types, the update-changes wrapper, and all inline types under
    /// each operation stem. Used for the batch-wide collision check.
    pub fn type_names(&self) -> Vec<String> {
        let mut names = vec![
            self.entity.clone(),
            format!("{}Input", self.entity),
            format!("Update{}ChangesInput", self.entity),
        ];
        for field in &self.object_fields {
            collect_object_names(&self.entity, &field.ty, &mut names);
        }
        for stem in [
            self.entity.clone(),
            format!("Add{}", self.entity),
            format!("Update{}Changes", self.entity),
        ] {
            for field in &self.input_fields {
                collect_input_names(&stem, &field.ty, &mut names);
            }
        }
        names
    }
}

fn collect_object_names(owner: &str, ty: &GqlType, out: &mut Vec<String>) {
    match ty {
        GqlType::NonNull(inner) | GqlType::List(inner) => collect_object_names(owner, inner, out),
        GqlType::InlineObject { suffix, fields } => {
            out.push(format!("{owner}{suffix}"));
            for field in fields {
                collect_object_names(owner, &field.ty, out);
            }
        }
        _ => {}
    }
}

fn collect_input_names(stem: &str, ty: &GqlType, out: &mut Vec<String>) {
    match ty {
        GqlType::NonNull(inner) | GqlType::List(inner) => collect_input_names(stem, inner, out),
        GqlType::InlineInput { suffix, fields } => {
            out.push(format!("{stem}{suffix}Input"));
            for field in fields {
                collect_input_names(stem, &field.ty, out);
            }
        }
        _ => {}
    }
}
