use tree_sitter::Node;

use crate::frontend::TranslationUnit;

/// Named scopes enclosing `node`, outermost first.
///
/// Namespaces, classes, structs, unions and enums each contribute their name;
/// anonymous namespaces and unnamed records contribute nothing. Walking stops
/// at the translation unit.
pub fn enclosing_scope(unit: &TranslationUnit, node: Node<'_>) -> Vec<String> {
    let mut innermost_first = Vec::new();
    let mut current = node.parent();

    while let Some(parent) = current {
        match parent.kind() {
            "translation_unit" => break,
            "namespace_definition" | "class_specifier" | "struct_specifier" | "union_specifier"
            | "enum_specifier" => {
                if let Some(name) = parent.child_by_field_name("name") {
                    let mut segments = split_qualified(unit.text(name));
                    segments.reverse();
                    innermost_first.extend(segments);
                }
            }
            _ => {}
        }
        current = parent.parent();
    }

    innermost_first.reverse();
    innermost_first
}

/// Scope of a declaration including any qualifier on its own name.
///
/// `struct Outer::Inner {}` declared in namespace `ns` has scope `ns::Outer`.
/// Returns the scope segments and the unqualified name.
pub fn declared_scope(unit: &TranslationUnit, node: Node<'_>) -> Option<(Vec<String>, String)> {
    let name = node.child_by_field_name("name")?;
    let mut qualified = split_qualified(unit.text(name));
    let plain = qualified.pop()?;

    let mut scope = enclosing_scope(unit, node);
    scope.extend(qualified);
    Some((scope, plain))
}

/// Joins scope segments with `::`.
pub fn render_scope(segments: &[String]) -> String {
    let joined = segments.join("::");
    joined.strip_suffix("::").unwrap_or(&joined).to_string()
}

/// Splits `A :: B::C` into `["A", "B", "C"]`, dropping a leading `::`.
pub fn split_qualified(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ':' if depth == 0 && chars.peek() == Some(&':') => {
                chars.next();
                let segment = current.trim().to_string();
                if !segment.is_empty() {
                    segments.push(segment);
                }
                current.clear();
            }
            ch if ch.is_whitespace() && depth == 0 => {}
            _ => current.push(ch),
        }
    }

    let segment = current.trim().to_string();
    if !segment.is_empty() {
        segments.push(segment);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObsidianError;
    use crate::frontend::ParseOptions;

    fn find<'a>(node: Node<'a>, kind: &str, unit: &TranslationUnit, name: &str) -> Option<Node<'a>> {
        if node.kind() == kind
            && node
                .child_by_field_name("name")
                .is_some_and(|candidate| unit.text(candidate).ends_with(name))
        {
            return Some(node);
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'a>> = node.named_children(&mut cursor).collect();
        children
            .into_iter()
            .find_map(|child| find(child, kind, unit, name))
    }

    #[test]
    fn resolves_nested_namespaces_and_records() -> Result<(), ObsidianError> {
        let source = r#"
namespace FirstNamespace {
namespace SecondNamespace {
struct DataStruct {
    enum class DataType : short { A, B };
};
}
}
"#;
        let unit = TranslationUnit::from_source("scope.hpp", source, &ParseOptions::default())?;
        let data_type = find(unit.root(), "enum_specifier", &unit, "DataType")
            .ok_or(ObsidianError::ParseFailed { path: "scope.hpp".into() })?;

        let scope = enclosing_scope(&unit, data_type);
        assert_eq!(
            render_scope(&scope),
            "FirstNamespace::SecondNamespace::DataStruct"
        );
        Ok(())
    }

    #[test]
    fn global_declarations_have_empty_scope() -> Result<(), ObsidianError> {
        let unit = TranslationUnit::from_source(
            "global.hpp",
            "struct GlobalPoint { int x; };",
            &ParseOptions::default(),
        )?;
        let point = find(unit.root(), "struct_specifier", &unit, "GlobalPoint")
            .ok_or(ObsidianError::ParseFailed { path: "global.hpp".into() })?;

        assert_eq!(render_scope(&enclosing_scope(&unit, point)), "");
        Ok(())
    }

    #[test]
    fn nested_namespace_specifier_and_anonymous_namespace() -> Result<(), ObsidianError> {
        let source = "namespace a::b { namespace { namespace c { struct S {}; } } }";
        let unit = TranslationUnit::from_source("nested.hpp", source, &ParseOptions::default())?;
        let record = find(unit.root(), "struct_specifier", &unit, "S")
            .ok_or(ObsidianError::ParseFailed { path: "nested.hpp".into() })?;

        assert_eq!(enclosing_scope(&unit, record), vec!["a", "b", "c"]);
        Ok(())
    }

    #[test]
    fn out_of_line_names_extend_the_scope() -> Result<(), ObsidianError> {
        let source = "namespace ns { struct Outer { struct Inner; }; struct Outer::Inner { int x; }; }";
        let unit = TranslationUnit::from_source("outer.hpp", source, &ParseOptions::default())?;
        let inner = find(unit.root(), "struct_specifier", &unit, "Outer::Inner")
            .ok_or(ObsidianError::ParseFailed { path: "outer.hpp".into() })?;

        let (scope, name) = declared_scope(&unit, inner)
            .ok_or(ObsidianError::ParseFailed { path: "outer.hpp".into() })?;
        assert_eq!(render_scope(&scope), "ns::Outer");
        assert_eq!(name, "Inner");
        Ok(())
    }

    #[test]
    fn splits_qualified_names_outside_template_arguments() {
        assert_eq!(split_qualified("::std::string"), vec!["std", "string"]);
        assert_eq!(
            split_qualified("std::map<std::string, int>"),
            vec!["std", "map<std::string, int>"]
        );
        assert_eq!(split_qualified("A :: B"), vec!["A", "B"]);
    }
}
