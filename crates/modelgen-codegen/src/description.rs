//! Entity description input model.
//!
//! A description file is a JSON object mapping field names to type tags,
//! single-element arrays of a tag, or nested objects (anonymous embedded
//! structures). Declaration order is preserved and duplicate keys within one
//! mapping level are rejected during deserialization.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// One entity description: an ordered field map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Description {
    pub fields: Vec<(String, FieldDecl)>,
}

/// The declared shape of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDecl {
    /// A scalar type tag, e.g. `"Int"`, `"@String!"`, `"Comment"`.
    Tag(String),
    /// A list-of declaration: a single-element array holding the element tag.
    List(String),
    /// An inline embedded structure with no identity of its own.
    Embedded(Description),
}

impl Description {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDecl> {
        self.fields
            .iter()
            .find_map(|(n, decl)| (n == name).then_some(decl))
    }
}

impl<'de> Deserialize<'de> for Description {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(DescriptionVisitor)
    }
}

struct DescriptionVisitor;

impl<'de> Visitor<'de> for DescriptionVisitor {
    type Value = Description;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping field names to type declarations")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Description, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut fields: Vec<(String, FieldDecl)> = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if fields.iter().any(|(name, _)| *name == key) {
                return Err(de::Error::custom(format!("duplicate field \"{key}\"")));
            }
            let decl = map.next_value::<FieldDecl>()?;
            fields.push((key, decl));
        }
        Ok(Description { fields })
    }
}

impl<'de> Deserialize<'de> for FieldDecl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FieldDeclVisitor)
    }
}

struct FieldDeclVisitor;

impl<'de> Visitor<'de> for FieldDeclVisitor {
    type Value = FieldDecl;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a type tag string, a single-element array, or a nested object")
    }

    fn visit_str<E>(self, value: &str) -> Result<FieldDecl, E>
    where
        E: de::Error,
    {
        Ok(FieldDecl::Tag(value.to_string()))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<FieldDecl, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let element: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::custom("list field must declare an element type"))?;
        if seq.next_element::<serde_json::Value>()?.is_some() {
            return Err(de::Error::custom(
                "list field must declare exactly one element type",
            ));
        }
        Ok(FieldDecl::List(element))
    }

    fn visit_map<A>(self, map: A) -> Result<FieldDecl, A::Error>
    where
        A: MapAccess<'de>,
    {
        DescriptionVisitor.visit_map(map).map(FieldDecl::Embedded)
    }
}
