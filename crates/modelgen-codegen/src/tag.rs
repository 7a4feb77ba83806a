//! Type-tag grammar and the static type registries.
//!
//! Tags follow `["@"] <TypeName> ["!"]`: `!` marks the field required, `@`
//! marks it unique (and eligible as an alternate lookup key on the read
//! query). The registries below are declared statically; nothing is looked up
//! by reflection against a host library.

/// A parsed type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTag {
    /// Tag name with `@`/`!` markers stripped.
    pub name: String,
    /// `!` suffix: non-null in both the storage and the API schema.
    pub required: bool,
    /// `@` prefix: indexed unique at the storage layer, alternate lookup key
    /// on the read query.
    pub unique: bool,
}

impl TypeTag {
    /// Parse a raw tag string. Marker characters are stripped wherever they
    /// appear; canonical form is `@Name!`.
    pub fn parse(raw: &str) -> Self {
        let required = raw.ends_with('!');
        let unique = raw.starts_with('@');
        let name: String = raw.chars().filter(|c| *c != '@' && *c != '!').collect();
        Self {
            name,
            required,
            unique,
        }
    }
}

/// GraphQL built-in scalar names (wrapped as `GraphQL.GraphQL<name>`).
pub const GRAPHQL_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

/// Mongoose built-in schema type names.
pub const MONGOOSE_BUILTINS: &[&str] = &[
    "String",
    "Number",
    "Boolean",
    "Date",
    "Buffer",
    "Mixed",
    "ObjectId",
    "Decimal128",
    "Map",
    "Array",
];

/// Mongoose types that only exist under `Mongoose.Schema.Types`.
pub const MONGOOSE_SCHEMA_PATH: &[&str] = &["Mixed", "ObjectId", "Decimal128", "Buffer"];

/// Temporal tags, served by `graphql-iso-date` on the API side and stored as
/// `Date` on the storage side.
pub const TEMPORAL: &[&str] = &["Date", "Time", "DateTime"];

/// Sentinel tag that expands into a salted-hash pair plus set/validate
/// helpers instead of a plain scalar.
pub const PASSWORD_HASH: &str = "PasswordHash";

pub fn is_graphql_scalar(name: &str) -> bool {
    GRAPHQL_SCALARS.contains(&name)
}

pub fn is_mongoose_builtin(name: &str) -> bool {
    MONGOOSE_BUILTINS.contains(&name)
}

pub fn is_temporal(name: &str) -> bool {
    TEMPORAL.contains(&name)
}
