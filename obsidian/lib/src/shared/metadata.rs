use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One `key=value` pair recovered from an annotation's argument list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Lookup helpers shared by every annotated record.
pub trait Annotated {
    fn attributes(&self) -> &[Attribute];

    /// Whether an attribute with the given name was declared.
    fn has_attribute(&self, name: &str) -> bool {
        self.attributes().iter().any(|attribute| attribute.name == name)
    }

    /// The value of the first attribute with the given name.
    fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

/// Where a declaration was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// 1-based line of the declaration keyword.
    pub line: usize,
}

/// A single enumerator of an annotated enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    pub description: String,
    pub value: i64,
}

/// An annotated enum declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub full_name: String,
    pub scope: String,
    pub description: String,
    pub underlying_type: String,
    /// `None` when the underlying type is an alias the unit never declares.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying_type_size: Option<u64>,
    pub is_scoped: bool,
    pub constants: Vec<EnumConstant>,
    pub attributes: Vec<Attribute>,
    pub location: SourceLocation,
}

impl Enum {
    /// Underlying value of the one-past-the-last sentinel.
    ///
    /// An enum without constants uses `0`.
    pub fn end_value(&self) -> i64 {
        self.constants
            .last()
            .map_or(0, |constant| constant.value.wrapping_add(1))
    }

    pub fn constant(&self, name: &str) -> Option<&EnumConstant> {
        self.constants.iter().find(|constant| constant.name == name)
    }
}

impl Annotated for Enum {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// How generated code copies a field in and out of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Raw byte copy of `size` bytes at `offset`.
    TriviallyCopyable,
    /// A standard library string, copied by assignment.
    Text,
    /// Anything else, copied by assignment.
    Composite,
}

impl FieldKind {
    pub fn is_trivially_copyable(&self) -> bool {
        matches!(self, Self::TriviallyCopyable)
    }
}

/// An annotated field of an annotated class or struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_scope: String,
    pub full_type: String,
    pub description: String,
    pub kind: FieldKind,
    pub is_trivially_copyable: bool,
    /// `const` members get no write accessor.
    #[serde(default)]
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub attributes: Vec<Attribute>,
}

impl Annotated for Property {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// An annotated class or struct declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub full_name: String,
    pub scope: String,
    pub description: String,
    pub is_struct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub properties: Vec<Property>,
    pub attributes: Vec<Attribute>,
    pub location: SourceLocation,
}

impl Class {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }
}

impl Annotated for Class {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// Everything extracted during one run, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionContext {
    pub enums: Vec<Enum>,
    pub classes: Vec<Class>,
    pub processed_input_files: Vec<PathBuf>,
    pub compile_options: Vec<String>,
}

impl ExtractionContext {
    pub fn new(compile_options: Vec<String>) -> Self {
        Self {
            compile_options,
            ..Self::default()
        }
    }

    /// Finds an enum by plain or fully qualified name.
    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums
            .iter()
            .find(|item| item.name == name || item.full_name == name)
    }

    /// Finds a class by plain or fully qualified name.
    pub fn find_class(&self, name: &str) -> Option<&Class> {
        self.classes
            .iter()
            .find(|item| item.name == name || item.full_name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty() && self.classes.is_empty()
    }
}

/// Joins a scope and a name; global declarations get a leading `::`.
pub fn qualified_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        format!("::{name}")
    } else {
        format!("{scope}::{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> SourceLocation {
        SourceLocation {
            file: PathBuf::from("types.hpp"),
            line: 1,
        }
    }

    #[test]
    fn qualified_name_prefixes_global_scope() {
        assert_eq!(qualified_name("", "GlobalPoint"), "::GlobalPoint");
        assert_eq!(qualified_name("A::B", "Fruit"), "A::B::Fruit");
    }

    #[test]
    fn end_value_follows_last_constant() {
        let mut vegetable = Enum {
            name: "Vegetable".to_string(),
            full_name: "FirstNamespace::Vegetable".to_string(),
            scope: "FirstNamespace".to_string(),
            description: String::new(),
            underlying_type: "int8_t".to_string(),
            underlying_type_size: Some(1),
            is_scoped: true,
            constants: Vec::new(),
            attributes: vec![Attribute::new("flags", "1")],
            location: location(),
        };
        assert_eq!(vegetable.end_value(), 0);

        for (name, value) in [("Carrot", -10), ("Potato", -9), ("Cucumber", -8)] {
            vegetable.constants.push(EnumConstant {
                name: name.to_string(),
                description: String::new(),
                value,
            });
        }

        assert_eq!(vegetable.end_value(), -7);
        assert!(vegetable.has_attribute("flags"));
        assert_eq!(vegetable.attribute_value("flags"), Some("1"));
        assert_eq!(vegetable.attribute_value("missing"), None);
    }

    #[test]
    fn lookups_accept_plain_and_qualified_names() {
        let mut context = ExtractionContext::default();
        context.classes.push(Class {
            name: "GlobalPoint".to_string(),
            full_name: "::GlobalPoint".to_string(),
            scope: String::new(),
            description: String::new(),
            is_struct: true,
            alignment: Some(4),
            size: Some(8),
            properties: Vec::new(),
            attributes: Vec::new(),
            location: location(),
        });

        assert!(context.find_class("GlobalPoint").is_some());
        assert!(context.find_class("::GlobalPoint").is_some());
        assert!(context.find_class("Point").is_none());
        assert!(context.find_enum("GlobalPoint").is_none());
    }
}
