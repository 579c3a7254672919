use crate::error::ObsidianError;
use crate::render::escape::string_literal;
use crate::render::skeleton::{CLASS_COLLECTION, CLASS_SPECIALIZATION};
use crate::render::template::{Bindings, fill};
use crate::render::{attribute_list, cpp_name};
use crate::shared::{Class, FieldKind, Property};

/// The `Obs::Class<C>` specialization for one class or struct.
pub fn specialization(item: &Class) -> Result<String, ObsidianError> {
    let static_asserts: String = item
        .properties
        .iter()
        .filter(|property| property.kind == FieldKind::TriviallyCopyable)
        .map(|property| {
            format!(
                "    static_assert(std::is_trivially_copyable_v<decltype(ClassType::{field})>, {message});\n",
                field = property.name,
                message = string_literal(&format!(
                    "{}::{} is copied byte-wise but is not trivially copyable",
                    item.name, property.name
                )),
            )
        })
        .collect();
    let properties: String = item.properties.iter().map(descriptor).collect();

    let bindings = Bindings::new()
        .bind("cpp_name", cpp_name(&item.full_name))
        .bind("static_asserts", static_asserts)
        .bind("name", string_literal(&item.name))
        .bind("scope", string_literal(&item.scope))
        .bind("full_name", string_literal(&item.full_name))
        .bind("description", string_literal(&item.description))
        .bind("is_struct", item.is_struct.to_string())
        .bind("properties", properties)
        .bind("attributes", attribute_list(&item.attributes));

    fill(CLASS_SPECIALIZATION, &bindings)
}

/// One `Obs::Property` initializer.
///
/// Byte-copy accessors for trivially copyable members, typed assignment
/// through a pointer-to-member for everything else.
fn descriptor(property: &Property) -> String {
    let field = &property.name;
    let offset = format!("offsetof(ClassType, {field})");
    let size = format!("sizeof(ClassType::{field})");
    let member = format!("ClassType, decltype(ClassType::{field}), &ClassType::{field}");

    let (kind, read, write) = match property.kind {
        FieldKind::TriviallyCopyable => (
            "PropertyKind::TriviallyCopyable",
            format!("&Detail::ReadBytes<{offset}, {size}>"),
            format!("&Detail::WriteBytes<{offset}, {size}>"),
        ),
        FieldKind::Text => (
            "PropertyKind::Text",
            format!("Detail::AssignReader<{member}>()"),
            format!("Detail::AssignWriter<{member}>()"),
        ),
        FieldKind::Composite => (
            "PropertyKind::Composite",
            format!("Detail::AssignReader<{member}>()"),
            format!("Detail::AssignWriter<{member}>()"),
        ),
    };
    let write = if property.read_only {
        "nullptr".to_string()
    } else {
        write
    };

    format!(
        "            {{{}, {}, {}, {kind}, {}, {offset}, {size}, {read}, {write}, {{{}}}}},\n",
        string_literal(field),
        string_literal(&property.description),
        string_literal(&property.full_type),
        property.is_trivially_copyable,
        attribute_list(&property.attributes),
    )
}

/// Constructor of `Obs::ClassCollection` listing every class in order.
pub fn collection(classes: &[Class]) -> Result<String, ObsidianError> {
    let entries: String = classes
        .iter()
        .map(|item| {
            let cpp = cpp_name(&item.full_name);
            format!(
                "        ClassEntry{{{}, {}, {}, {}, {}, sizeof({cpp}), alignof({cpp}), Class<{cpp}>::GetProperties(), Class<{cpp}>::GetAttributes()}},\n",
                string_literal(&item.name),
                string_literal(&item.scope),
                string_literal(&item.full_name),
                string_literal(&item.description),
                item.is_struct,
            )
        })
        .collect();

    fill(CLASS_COLLECTION, &Bindings::new().bind("entries", entries))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::shared::{Attribute, SourceLocation};

    fn property(name: &str, full_type: &str, kind: FieldKind) -> Property {
        Property {
            name: name.to_string(),
            type_name: full_type.to_string(),
            type_scope: String::new(),
            full_type: full_type.to_string(),
            description: String::new(),
            kind,
            is_trivially_copyable: kind.is_trivially_copyable(),
            read_only: false,
            alignment: None,
            offset: None,
            size: None,
            attributes: Vec::new(),
        }
    }

    fn player() -> Class {
        let mut level = property("level", "int32_t", FieldKind::TriviallyCopyable);
        level.attributes = vec![Attribute::new("min", "0"), Attribute::new("max", "100")];
        let mut id = property("id", "uint64_t", FieldKind::TriviallyCopyable);
        id.read_only = true;

        Class {
            name: "Player".to_string(),
            full_name: "Game::Player".to_string(),
            scope: "Game".to_string(),
            description: "A \\ player".to_string(),
            is_struct: true,
            alignment: Some(8),
            size: Some(48),
            properties: vec![
                level,
                property("name", "std::string", FieldKind::Text),
                id,
            ],
            attributes: vec![Attribute::new("serializable", "1")],
            location: SourceLocation {
                file: PathBuf::from("player.hpp"),
                line: 1,
            },
        }
    }

    #[test]
    fn chooses_accessors_by_kind() -> Result<(), ObsidianError> {
        let rendered = specialization(&player())?;

        assert!(rendered.contains("struct Class<::Game::Player>"));
        assert!(rendered.contains(
            "&Detail::ReadBytes<offsetof(ClassType, level), sizeof(ClassType::level)>"
        ));
        assert!(rendered.contains(
            "Detail::AssignWriter<ClassType, decltype(ClassType::name), &ClassType::name>()"
        ));
        assert!(rendered.contains("PropertyKind::Text, false"));
        assert!(rendered.contains("{{\"min\", \"0\"}, {\"max\", \"100\"}}"));
        assert!(rendered.contains("std::is_trivially_copyable_v<decltype(ClassType::level)>"));
        assert!(!rendered.contains("std::is_trivially_copyable_v<decltype(ClassType::name)>"));
        assert!(rendered.contains("GetDescription() { return \"A \\\\ player\"; }"));
        Ok(())
    }

    #[test]
    fn read_only_members_have_no_writer() -> Result<(), ObsidianError> {
        let rendered = specialization(&player())?;
        let id_line = rendered
            .lines()
            .find(|line| line.contains("{\"id\""))
            .unwrap_or_default();

        assert!(id_line.contains("&Detail::ReadBytes<offsetof(ClassType, id), sizeof(ClassType::id)>, nullptr,"));
        Ok(())
    }

    #[test]
    fn collection_references_specializations() -> Result<(), ObsidianError> {
        let rendered = collection(&[player()])?;

        assert!(rendered.contains("sizeof(::Game::Player), alignof(::Game::Player)"));
        assert!(rendered.contains("Class<::Game::Player>::GetProperties()"));
        Ok(())
    }
}
