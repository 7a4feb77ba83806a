//! Integration tests for modelgen-codegen: fixture description files through
//! both compilers and all emitters.

use modelgen_codegen::{
    Description, compile_api, compile_storage,
    emit::{emit_model, emit_models_index, emit_schema, emit_schema_index},
};
use std::collections::BTreeSet;

fn load_fixture(name: &str) -> Description {
    let path = format!("tests/fixtures/{name}.json");
    let content =
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("fixture {name} not found"));
    serde_json::from_str(&content).expect("invalid description")
}

fn known() -> BTreeSet<String> {
    ["User".to_string(), "Post".to_string()].into()
}

#[test]
fn user_model_end_to_end() {
    let desc = load_fixture("user");
    let storage = compile_storage("User", &desc, &known()).unwrap();
    let js = emit_model("User", &storage);

    // Every declared field except the password appears as a schema field.
    assert!(js.contains("name: {"));
    assert!(js.contains("email: {"));
    assert!(js.contains("joined: {"));
    assert!(js.contains("type: Mongoose.Schema.Types.Date"));
    // PasswordHash expands to the hash structure plus the two methods.
    assert!(js.contains("type: Map"));
    assert!(js.contains("UserSchema.methods.setpassword"));
    assert!(js.contains("UserSchema.methods.validatepassword"));
}

#[test]
fn post_schema_end_to_end() {
    let desc = load_fixture("post");
    let api = compile_api("Post", &desc, &known()).unwrap();
    let js = emit_schema("Post", &api);

    assert!(js.contains("const { UserType, UserInputType } = require(\"./User.js\");"));
    assert!(js.contains("title: { type: GraphQL.GraphQLNonNull(GraphQL.GraphQLString) },"));
    assert!(js.contains("tags: { type: GraphQL.GraphQLList(GraphQL.GraphQLString) },"));
    assert!(js.contains("type: GraphQL.GraphQLNonNull(UserType),"));
    assert!(js.contains("name: \"Postmeta\","));
    assert!(js.contains("name: \"PostmetaInput\","));
}

#[test]
fn aggregators_wire_both_entities() {
    let user = compile_api("User", &load_fixture("user"), &known()).unwrap();
    let post = compile_api("Post", &load_fixture("post"), &known()).unwrap();
    let entities = vec![("Post".to_string(), post), ("User".to_string(), user)];

    let models = emit_models_index(&["Post".to_string(), "User".to_string()]);
    assert!(models.contains("Post: require(\"./Post.js\"),"));
    assert!(models.contains("User: require(\"./User.js\")"));

    let schema = emit_schema_index(&entities);
    for op in [
        "Post: {", "User: {", "addPost:", "updatePost:", "removePost:", "addUser:", "updateUser:",
        "removeUser:",
    ] {
        assert!(schema.contains(op), "missing {op} in schema index");
    }
    // Unique lookups: title for Post, email for User.
    assert!(schema.contains("title: { type: GraphQL.GraphQLString }"));
    assert!(schema.contains("else if (args.email)"));
}

#[test]
fn emission_is_deterministic() {
    let desc = load_fixture("post");
    let a = emit_schema("Post", &compile_api("Post", &desc, &known()).unwrap());
    let b = emit_schema("Post", &compile_api("Post", &desc, &known()).unwrap());
    assert_eq!(a, b);
}
