//! Mongoose model module emitter.

use super::CodeWriter;
use crate::ir::{
    MethodKind, ReferenceTarget, StorageField, StorageImport, StorageMethod, StorageModel,
    StorageType,
};

/// Render one entity's storage model as a complete `models/<entity>.js`.
pub fn emit_model(entity: &str, model: &StorageModel) -> String {
    let mut w = CodeWriter::new();

    for import in &model.imports {
        w.line(&render_import(import));
    }
    w.blank();

    if model.fields.is_empty() {
        w.line(&format!("const {entity}Schema = new Mongoose.Schema({{}});"));
    } else {
        w.open(&format!("const {entity}Schema = new Mongoose.Schema({{"));
        write_fields(&mut w, &model.fields);
        w.close("});");
    }

    for method in &model.methods {
        w.blank();
        write_method(&mut w, entity, method);
    }

    w.blank();
    w.line(&format!(
        "module.exports = Mongoose.model(\"{entity}\", {entity}Schema);"
    ));
    w.finish()
}

fn render_import(import: &StorageImport) -> String {
    match import {
        StorageImport::Mongoose => "const Mongoose = require(\"mongoose\");".to_string(),
        StorageImport::Crypto => "const crypto = require(\"crypto\");".to_string(),
        StorageImport::Model { binding, entity } => {
            format!("const {binding} = require(\"./{entity}.js\");")
        }
    }
}

fn write_fields(w: &mut CodeWriter, fields: &[StorageField]) {
    for (i, field) in fields.iter().enumerate() {
        let trailing = if i + 1 == fields.len() { "" } else { "," };
        w.open(&format!("{}: {{", field.name));
        write_field_body(w, field);
        w.close(&format!("}}{trailing}"));
    }
}

fn write_field_body(w: &mut CodeWriter, field: &StorageField) {
    let has_flags = field.required || field.unique;
    let type_trailing = if has_flags { "," } else { "" };
    match &field.ty {
        StorageType::Embedded(sub) => {
            w.open("type: {");
            write_fields(w, sub);
            w.close(&format!("}}{type_trailing}"));
        }
        ty => w.line(&format!("type: {}{type_trailing}", render_type(ty))),
    }
    if field.required {
        let trailing = if field.unique { "," } else { "" };
        w.line(&format!("required: true{trailing}"));
    }
    if field.unique {
        w.line("index: true,");
        w.line("unique: true");
    }
}

fn render_type(ty: &StorageType) -> String {
    match ty {
        StorageType::Number => "Number".to_string(),
        StorageType::Builtin(name) => name.clone(),
        StorageType::SchemaPath(name) => format!("Mongoose.Schema.Types.{name}"),
        StorageType::HashPair => "Map".to_string(),
        StorageType::Reference => "{ _id: Mongoose.Schema.Types.ObjectId }".to_string(),
        StorageType::List(inner) => format!("[{}]", render_type(inner)),
        StorageType::Embedded(_) => {
            unreachable!("embedded structures are rendered by write_field_body")
        }
    }
}

fn write_method(w: &mut CodeWriter, entity: &str, method: &StorageMethod) {
    let head = format!("{entity}Schema.methods.{}", method.name);
    match &method.kind {
        MethodKind::SetPassword { slot, list: false } => {
            w.open(&format!("{head} = function (password) {{"));
            w.line(&format!(
                "this.{slot}.salt = crypto.randomBytes(16).toString(\"hex\");"
            ));
            w.line(&format!(
                "this.{slot}.hash = crypto.pbkdf2Sync(password, this.{slot}.salt, 10000, 512, \"sha512\").toString(\"hex\");"
            ));
            w.close("};");
        }
        MethodKind::SetPassword { slot, list: true } => {
            w.open(&format!("{head} = function (passwords) {{"));
            w.open("for (var i = 0; i < passwords.length; i++) {");
            w.line(&format!(
                "this.{slot}[i].salt = crypto.randomBytes(16).toString(\"hex\");"
            ));
            w.line(&format!(
                "this.{slot}[i].hash = crypto.pbkdf2Sync(passwords[i], this.{slot}[i].salt, 10000, 512, \"sha512\").toString(\"hex\");"
            ));
            w.close("}");
            w.close("};");
        }
        MethodKind::ValidatePassword { slot, list: false } => {
            w.open(&format!("{head} = function (password) {{"));
            w.line(&format!(
                "const hash = crypto.pbkdf2Sync(password, this.{slot}.salt, 10000, 512, \"sha512\").toString(\"hex\");"
            ));
            w.line(&format!("return this.{slot}.hash === hash;"));
            w.close("};");
        }
        MethodKind::ValidatePassword { slot, list: true } => {
            w.open(&format!("{head} = function (password, i) {{"));
            w.line(&format!(
                "const hash = crypto.pbkdf2Sync(password, this.{slot}[i].salt, 10000, 512, \"sha512\").toString(\"hex\");"
            ));
            w.line(&format!("return this.{slot}[i].hash === hash;"));
            w.close("};");
        }
        MethodKind::GetReference { target } => {
            w.open(&format!("{head} = function (_id) {{"));
            match target {
                ReferenceTarget::Import { binding } => {
                    w.line(&format!("return {binding}.findOne({{ _id }});"));
                }
                ReferenceTarget::SelfModel { entity } => {
                    w.line(&format!(
                        "return Mongoose.model(\"{entity}\").findOne({{ _id }});"
                    ));
                }
            }
            w.close("};");
        }
    }
}
