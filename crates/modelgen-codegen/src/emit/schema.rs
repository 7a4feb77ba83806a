//! GraphQL schema module and aggregator emitters.

use super::CodeWriter;
use crate::ir::{ApiField, ApiInputField, ApiModel, GqlType};

const GRAPHQL_REQUIRES: &[&str] = &[
    "const GraphQL = require(\"graphql\");",
    "const { GraphQLDate, GraphQLTime, GraphQLDateTime } = require(\"graphql-iso-date\");",
    "const Models = require(\"../models\");",
];

/// Render one entity's API model as a complete `schema/<entity>.js`.
pub fn emit_schema(entity: &str, model: &ApiModel) -> String {
    let mut w = CodeWriter::new();

    for line in GRAPHQL_REQUIRES {
        w.line(line);
    }
    for sibling in &model.imports {
        w.line(&format!(
            "const {{ {sibling}Type, {sibling}InputType }} = require(\"./{sibling}.js\");"
        ));
    }
    w.blank();

    w.open(&format!(
        "const {entity}Type = new GraphQL.GraphQLObjectType({{"
    ));
    w.line(&format!("name: \"{entity}\","));
    w.open("fields: () => ({");
    write_object_fields(&mut w, entity, &model.object_fields);
    w.close("})");
    w.close("});");
    w.blank();

    w.open(&format!(
        "const {entity}InputType = new GraphQL.GraphQLInputObjectType({{"
    ));
    w.line(&format!("name: \"{entity}Input\","));
    if model.input_fields.is_empty() {
        w.line("fields: () => ({})");
    } else {
        w.open("fields: () => ({");
        write_input_fields(&mut w, entity, &model.input_fields, false);
        w.close("})");
    }
    w.close("});");
    w.blank();

    w.line(&format!(
        "module.exports = {{ {entity}Type, {entity}InputType }};"
    ));
    w.finish()
}

/// Render the storage aggregator `models/index.js`.
pub fn emit_models_index(entities: &[String]) -> String {
    let mut w = CodeWriter::new();
    if entities.is_empty() {
        w.line("module.exports = {};");
        return w.finish();
    }
    w.open("module.exports = {");
    for (i, entity) in entities.iter().enumerate() {
        let trailing = if i + 1 == entities.len() { "" } else { "," };
        w.line(&format!("{entity}: require(\"./{entity}.js\"){trailing}"));
    }
    w.close("};");
    w.finish()
}

/// Render the API aggregator `schema/index.js`: root query and mutation
/// objects wiring every entity's operations.
pub fn emit_schema_index(entities: &[(String, ApiModel)]) -> String {
    let mut w = CodeWriter::new();

    for line in GRAPHQL_REQUIRES {
        w.line(line);
    }
    for (entity, _) in entities {
        w.line(&format!(
            "const {{ {entity}Type, {entity}InputType }} = require(\"./{entity}.js\");"
        ));
    }
    w.blank();

    w.open("const RootQuery = new GraphQL.GraphQLObjectType({");
    w.line("name: \"RootQueryType\",");
    if entities.is_empty() {
        w.line("fields: {}");
    } else {
        w.open("fields: {");
        for (i, (entity, model)) in entities.iter().enumerate() {
            let trailing = if i + 1 == entities.len() { "" } else { "," };
            write_query(&mut w, entity, model, trailing);
        }
        w.close("}");
    }
    w.close("});");
    w.blank();

    w.open("const Mutation = new GraphQL.GraphQLObjectType({");
    w.line("name: \"Mutation\",");
    if entities.is_empty() {
        w.line("fields: {}");
    } else {
        w.open("fields: {");
        for (i, (entity, model)) in entities.iter().enumerate() {
            let last = i + 1 == entities.len();
            write_add(&mut w, entity, model, ",");
            write_update(&mut w, entity, model, ",");
            write_remove(&mut w, entity, if last { "" } else { "," });
        }
        w.close("}");
    }
    w.close("});");
    w.blank();

    w.line("module.exports = new GraphQL.GraphQLSchema({ query: RootQuery, mutation: Mutation });");
    w.finish()
}

/// Type expression for everything except inline structures. The compilers
/// never wrap an inline structure, so those always render through
/// `write_object_field` / `write_input_field`.
fn render_type(ty: &GqlType) -> String {
    match ty {
        GqlType::Id => "GraphQL.GraphQLID".to_string(),
        GqlType::Scalar(name) => format!("GraphQL.GraphQL{name}"),
        GqlType::Temporal(name) => format!("GraphQL{name}"),
        GqlType::ObjectRef(entity) => format!("{entity}Type"),
        GqlType::InputRef(entity) => format!("{entity}InputType"),
        GqlType::NonNull(inner) => format!("GraphQL.GraphQLNonNull({})", render_type(inner)),
        GqlType::List(inner) => format!("GraphQL.GraphQLList({})", render_type(inner)),
        GqlType::InlineObject { .. } | GqlType::InlineInput { .. } => {
            unreachable!("inline types are rendered by their field writers")
        }
    }
}

fn write_object_fields(w: &mut CodeWriter, owner: &str, fields: &[ApiField]) {
    for (i, field) in fields.iter().enumerate() {
        let trailing = if i + 1 == fields.len() { "" } else { "," };
        write_object_field(w, owner, field, trailing);
    }
}

fn write_object_field(w: &mut CodeWriter, owner: &str, field: &ApiField, trailing: &str) {
    if let GqlType::InlineObject { suffix, fields } = &field.ty {
        w.open(&format!("{}: {{", field.name));
        w.open("type: new GraphQL.GraphQLObjectType({");
        w.line(&format!("name: \"{owner}{suffix}\","));
        if fields.is_empty() {
            w.line("fields: {}");
        } else {
            w.open("fields: {");
            write_object_fields(w, owner, fields);
            w.close("}");
        }
        w.close("})");
        w.close(&format!("}}{trailing}"));
        return;
    }

    match &field.resolver {
        None => w.line(&format!(
            "{}: {{ type: {} }}{trailing}",
            field.name,
            render_type(&field.ty)
        )),
        Some(resolver) => {
            w.open(&format!("{}: {{", field.name));
            w.line(&format!("type: {},", render_type(&field.ty)));
            w.open("resolve(parent, args) {");
            if resolver.list {
                w.line(&format!(
                    "return parent.{}.map((v) => Models.{}.findOne({{ _id: v._id }}));",
                    resolver.field, resolver.entity
                ));
            } else {
                w.line(&format!(
                    "return Models.{}.findOne({{ _id: parent.{}._id }});",
                    resolver.entity, resolver.field
                ));
            }
            w.close("}");
            w.close(&format!("}}{trailing}"));
        }
    }
}

/// Write input fields under a type-name stem (`User`, `AddUser`,
/// `UpdateUserChanges`). `skip_passwords` drops raw-password fields at every
/// level; the update-changes input must never accept one.
fn write_input_fields(
    w: &mut CodeWriter,
    stem: &str,
    fields: &[ApiInputField],
    skip_passwords: bool,
) {
    let kept: Vec<&ApiInputField> = fields
        .iter()
        .filter(|f| !(skip_passwords && f.password))
        .collect();
    for (i, field) in kept.iter().enumerate() {
        let trailing = if i + 1 == kept.len() { "" } else { "," };
        write_input_field(w, stem, field, trailing, skip_passwords);
    }
}

fn write_input_field(
    w: &mut CodeWriter,
    stem: &str,
    field: &ApiInputField,
    trailing: &str,
    skip_passwords: bool,
) {
    if let GqlType::InlineInput { suffix, fields } = &field.ty {
        w.open(&format!("{}: {{", field.name));
        w.open("type: new GraphQL.GraphQLInputObjectType({");
        w.line(&format!("name: \"{stem}{suffix}Input\","));
        let kept = fields
            .iter()
            .any(|f| !(skip_passwords && f.password));
        if kept {
            w.open("fields: {");
            write_input_fields(w, stem, fields, skip_passwords);
            w.close("}");
        } else {
            w.line("fields: {}");
        }
        w.close("})");
        w.close(&format!("}}{trailing}"));
        return;
    }

    w.line(&format!(
        "{}: {{ type: {} }}{trailing}",
        field.name,
        render_type(&field.ty)
    ));
}

fn write_query(w: &mut CodeWriter, entity: &str, model: &ApiModel, trailing: &str) {
    w.open(&format!("{entity}: {{"));
    w.line(&format!("type: {entity}Type,"));

    w.open("args: {");
    let id_trailing = if model.unique_lookups.is_empty() { "" } else { "," };
    w.line(&format!("_id: {{ type: GraphQL.GraphQLID }}{id_trailing}"));
    for (i, lookup) in model.unique_lookups.iter().enumerate() {
        let t = if i + 1 == model.unique_lookups.len() { "" } else { "," };
        w.line(&format!(
            "{}: {{ type: {} }}{t}",
            lookup.name,
            render_type(&lookup.ty)
        ));
    }
    w.close("},");

    w.open("resolve(parent, args) {");
    w.line("if (args._id)");
    w.line(&format!(
        "  return Models.{entity}.findOne({{ _id: args._id }});"
    ));
    for lookup in &model.unique_lookups {
        w.line(&format!("else if (args.{})", lookup.name));
        w.line(&format!(
            "  return Models.{entity}.findOne({{ {0}: args.{0} }});",
            lookup.name
        ));
    }
    w.close("}");
    w.close(&format!("}}{trailing}"));
}

fn write_add(w: &mut CodeWriter, entity: &str, model: &ApiModel, trailing: &str) {
    w.open(&format!("add{entity}: {{"));
    w.line(&format!("type: {entity}Type,"));

    if model.input_fields.is_empty() {
        w.line("args: {},");
    } else {
        w.open("args: {");
        write_input_fields(w, &format!("Add{entity}"), &model.input_fields, false);
        w.close("},");
    }

    w.open("resolve(parent, args) {");
    for field in model
        .passwords
        .singular
        .iter()
        .chain(&model.passwords.arrays)
    {
        w.line(&format!("var {field} = args.{field};"));
        w.line(&format!("delete args.{field};"));
    }
    w.line(&format!("let doc = new Models.{entity}(args);"));
    for field in model
        .passwords
        .singular
        .iter()
        .chain(&model.passwords.arrays)
    {
        w.line(&format!("doc.set{field}({field});"));
    }
    w.line("return doc.save();");
    w.close("}");
    w.close(&format!("}}{trailing}"));
}

fn write_update(w: &mut CodeWriter, entity: &str, model: &ApiModel, trailing: &str) {
    w.open(&format!("update{entity}: {{"));
    w.line(&format!("type: {entity}Type,"));

    w.open("args: {");
    w.line("_id: { type: GraphQL.GraphQLID },");
    w.open("changes: {");
    w.open("type: new GraphQL.GraphQLInputObjectType({");
    w.line(&format!("name: \"Update{entity}ChangesInput\","));
    let has_changes = model.input_fields.iter().any(|f| !f.password);
    if has_changes {
        w.open("fields: {");
        write_input_fields(w, &format!("Update{entity}Changes"), &model.input_fields, true);
        w.close("}");
    } else {
        w.line("fields: {}");
    }
    w.close("})");
    w.close("}");
    w.close("},");

    w.open("async resolve(parent, args) {");
    w.line(&format!(
        "await Models.{entity}.updateOne({{ _id: args._id }}, {{ $set: args.changes }});"
    ));
    w.line(&format!(
        "return Models.{entity}.findOne({{ _id: args._id }});"
    ));
    w.close("}");
    w.close(&format!("}}{trailing}"));
}

fn write_remove(w: &mut CodeWriter, entity: &str, trailing: &str) {
    w.open(&format!("remove{entity}: {{"));
    w.line(&format!("type: {entity}Type,"));
    w.open("args: {");
    w.line("_id: { type: GraphQL.GraphQLID }");
    w.close("},");
    w.open("async resolve(parent, args) {");
    w.line(&format!(
        "const doc = await Models.{entity}.findOne({{ _id: args._id }});"
    ));
    w.line(&format!(
        "await Models.{entity}.deleteOne({{ _id: args._id }});"
    ));
    w.line("return doc;");
    w.close("}");
    w.close(&format!("}}{trailing}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_api;
    use std::collections::BTreeSet;

    fn compile(entity: &str, json: &str, known: &[&str]) -> ApiModel {
        let desc = serde_json::from_str(json).unwrap();
        let known: BTreeSet<String> = known.iter().map(|e| e.to_string()).collect();
        compile_api(entity, &desc, &known).unwrap()
    }

    const USER: &str = r#"{ "name": "String!", "email": "@String!", "password": "PasswordHash" }"#;

    #[test]
    fn user_schema_module() {
        let js = emit_schema("User", &compile("User", USER, &["User"]));

        assert!(js.starts_with("const GraphQL = require(\"graphql\");"));
        assert!(js.contains("const Models = require(\"../models\");"));
        assert!(js.contains("const UserType = new GraphQL.GraphQLObjectType({"));
        assert!(js.contains("_id: { type: GraphQL.GraphQLID },"));
        assert!(js.contains("name: { type: GraphQL.GraphQLNonNull(GraphQL.GraphQLString) },"));
        assert!(js.contains("email: { type: GraphQL.GraphQLNonNull(GraphQL.GraphQLString) }"));
        // Password never reaches the object type; raw string input instead.
        assert!(!js.contains("password: { type: GraphQL.GraphQLNonNull"));
        assert!(js.contains("name: \"UserInput\","));
        assert!(js.contains("password: { type: GraphQL.GraphQLString }"));
        assert!(js.ends_with("module.exports = { UserType, UserInputType };\n"));
    }

    #[test]
    fn sibling_reference_is_required_and_resolved() {
        let js = emit_schema(
            "Post",
            &compile("Post", r#"{ "author": "User!", "reviewers": ["User"] }"#, &["Post", "User"]),
        );
        assert!(js.contains("const { UserType, UserInputType } = require(\"./User.js\");"));
        assert!(js.contains("type: GraphQL.GraphQLNonNull(UserType),"));
        assert!(js.contains("return Models.User.findOne({ _id: parent.author._id });"));
        assert!(js.contains("return parent.reviewers.map((v) => Models.User.findOne({ _id: v._id }));"));
    }

    #[test]
    fn temporal_fields_use_iso_date_scalars() {
        let js = emit_schema(
            "Event",
            &compile("Event", r#"{ "at": "DateTime!", "day": "Date" }"#, &["Event"]),
        );
        assert!(js.contains("at: { type: GraphQL.GraphQLNonNull(GraphQLDateTime) },"));
        assert!(js.contains("day: { type: GraphQLDate }"));
    }

    #[test]
    fn embedded_structure_renders_inline_types() {
        let js = emit_schema(
            "User",
            &compile("User", r#"{ "address": { "street": "String!" } }"#, &["User"]),
        );
        assert!(js.contains("type: new GraphQL.GraphQLObjectType({"));
        assert!(js.contains("name: \"Useraddress\","));
        assert!(js.contains("name: \"UseraddressInput\","));
    }

    #[test]
    fn query_resolves_by_id_then_unique_fields() {
        let model = compile("User", USER, &["User"]);
        let js = emit_schema_index(&[("User".to_string(), model)]);

        assert!(js.contains("name: \"RootQueryType\","));
        assert!(js.contains("_id: { type: GraphQL.GraphQLID },"));
        // Lookup argument is the bare nullable type.
        assert!(js.contains("email: { type: GraphQL.GraphQLString }"));
        assert!(js.contains("if (args._id)"));
        assert!(js.contains("return Models.User.findOne({ _id: args._id });"));
        assert!(js.contains("else if (args.email)"));
        assert!(js.contains("return Models.User.findOne({ email: args.email });"));
    }

    #[test]
    fn add_mutation_splices_password_hashing() {
        let model = compile("User", USER, &["User"]);
        let js = emit_schema_index(&[("User".to_string(), model)]);

        assert!(js.contains("addUser: {"));
        assert!(js.contains("var password = args.password;"));
        assert!(js.contains("delete args.password;"));
        assert!(js.contains("let doc = new Models.User(args);"));
        assert!(js.contains("doc.setpassword(password);"));
        assert!(js.contains("return doc.save();"));
    }

    #[test]
    fn update_mutation_excludes_password_fields() {
        let model = compile("User", USER, &["User"]);
        let js = emit_schema_index(&[("User".to_string(), model)]);

        assert!(js.contains("updateUser: {"));
        assert!(js.contains("name: \"UpdateUserChangesInput\","));
        assert!(js.contains("await Models.User.updateOne({ _id: args._id }, { $set: args.changes });"));
        let changes_start = js.find("UpdateUserChangesInput").unwrap();
        let changes_end = js[changes_start..].find("async resolve").unwrap() + changes_start;
        assert!(!js[changes_start..changes_end].contains("password"));
    }

    #[test]
    fn remove_mutation_returns_pre_deletion_snapshot() {
        let model = compile("User", USER, &["User"]);
        let js = emit_schema_index(&[("User".to_string(), model)]);

        assert!(js.contains("removeUser: {"));
        let remove = &js[js.find("removeUser").unwrap()..];
        let find = remove.find("findOne").unwrap();
        let delete = remove.find("deleteOne").unwrap();
        assert!(find < delete, "read must precede delete");
        assert!(remove.contains("return doc;"));
    }

    #[test]
    fn add_mutation_renames_nested_input_types() {
        let model = compile("User", r#"{ "vault": { "code": "String" } }"#, &["User"]);
        let js = emit_schema_index(&[("User".to_string(), model)]);
        assert!(js.contains("name: \"AddUservaultInput\","));
        assert!(js.contains("name: \"UpdateUserChangesvaultInput\","));
    }

    #[test]
    fn models_index() {
        let js = emit_models_index(&["Post".to_string(), "User".to_string()]);
        assert!(js.contains("Post: require(\"./Post.js\"),"));
        assert!(js.contains("User: require(\"./User.js\")"));
        assert!(js.starts_with("module.exports = {"));
    }

    #[test]
    fn empty_aggregators_are_still_valid() {
        assert_eq!(emit_models_index(&[]), "module.exports = {};\n");
        let js = emit_schema_index(&[]);
        assert!(js.contains("name: \"RootQueryType\",\n  fields: {}"));
        assert!(js.contains("name: \"Mutation\",\n  fields: {}"));
        assert!(js.contains("module.exports = new GraphQL.GraphQLSchema"));
    }
}
