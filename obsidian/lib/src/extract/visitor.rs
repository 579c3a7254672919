//! Walks a translation unit and records annotated enums and classes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, instrument, trace, warn};
use tree_sitter::Node;

use crate::error::ObsidianError;
use crate::extract::annotation::{Marker, SearchWindow, locate};
use crate::extract::attributes::parse_attributes;
use crate::extract::constant::{ConstantLookup, evaluate};
use crate::extract::description::description;
use crate::extract::layout::{LayoutEngine, RecordLayout, normalize_spelling};
use crate::extract::scope::{declared_scope, enclosing_scope, render_scope, split_qualified};
use crate::extract::types::{Declarator, TypeIndex, is_definition, is_templated};
use crate::frontend::TranslationUnit;
use crate::shared::{
    Attribute, Class, Enum, EnumConstant, ExtractionContext, Property, SourceLocation,
    qualified_name,
};

/// Extracts every annotated declaration of `unit` into `context`.
///
/// Declarations are appended in source order. Markers that no declaration
/// claims are reported with a warning.
///
/// ## Errors
/// Returns [`ObsidianError::ConstantExpression`] when an enumerator of an
/// annotated enum cannot be evaluated.
#[instrument(level = "debug", skip_all, fields(path = %unit.path.display()))]
pub fn extract(unit: &TranslationUnit, context: &mut ExtractionContext) -> Result<(), ObsidianError> {
    let index = TypeIndex::build(unit);
    let layouts = LayoutEngine::new(unit, &index);
    let mut extractor = Extractor {
        unit,
        index: &index,
        layouts: &layouts,
        constants: HashMap::new(),
        claimed: HashSet::new(),
        enums: Vec::new(),
        classes: Vec::new(),
    };

    extractor.visit(unit.root())?;
    extractor.report_unclaimed();

    debug!(
        enums = extractor.enums.len(),
        classes = extractor.classes.len(),
        "extracted translation unit"
    );
    context.enums.append(&mut extractor.enums);
    context.classes.append(&mut extractor.classes);
    Ok(())
}

struct Extractor<'e, 'tree> {
    unit: &'tree TranslationUnit,
    index: &'e TypeIndex<'tree>,
    layouts: &'e LayoutEngine<'e, 'tree>,
    /// Enumerator values by qualified name, for later initializers.
    constants: HashMap<String, i64>,
    /// Token indices of markers already attached to a declaration.
    claimed: HashSet<usize>,
    enums: Vec<Enum>,
    classes: Vec<Class>,
}

impl<'tree> Extractor<'_, 'tree> {
    fn visit(&mut self, node: Node<'tree>) -> Result<(), ObsidianError> {
        match node.kind() {
            "enum_specifier" if is_definition(node) => self.visit_enum(node)?,
            "class_specifier" | "struct_specifier" if is_definition(node) => self.visit_class(node),
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'tree>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_enum(&mut self, node: Node<'tree>) -> Result<(), ObsidianError> {
        let Some(body) = node.child_by_field_name("body") else {
            return Ok(());
        };
        let (scope, name) = match declared_scope(self.unit, node) {
            Some((scope, name)) => (scope, Some(name)),
            None => (enclosing_scope(self.unit, node), None),
        };
        let is_scoped = node
            .child(1)
            .is_some_and(|keyword| matches!(keyword.kind(), "class" | "struct"));
        let marker = self.annotation(node, body.start_byte(), Marker::Enum);

        let constants =
            self.evaluate_constants(body, &scope, name.as_deref(), is_scoped, marker.is_some())?;

        let Some(marker) = marker else {
            return Ok(());
        };
        let line = node.start_position().row + 1;
        let Some(name) = name else {
            warn!(line, "anonymous enums cannot be reflected; skipping");
            return Ok(());
        };
        if inside_template(node) {
            warn!(line, %name, "enums inside class templates cannot be reflected; skipping");
            return Ok(());
        }

        let values: Vec<i64> = constants.iter().map(|constant| constant.value).collect();
        let (underlying_type, underlying_type_size) =
            self.underlying_type(node, &scope, is_scoped, &values);
        let scope = render_scope(&scope);

        debug!(%name, %scope, constants = constants.len(), "reflecting enum");
        let reflected = Enum {
            full_name: qualified_name(&scope, &name),
            description: self.declaration_description(node, marker),
            attributes: self.attributes(marker),
            location: self.location(node),
            name,
            scope,
            underlying_type,
            underlying_type_size,
            is_scoped,
            constants,
        };
        self.enums.push(reflected);
        Ok(())
    }

    /// Evaluates every enumerator of an enum body and registers its value.
    ///
    /// Evaluation failures abort the file only for annotated enums; other
    /// enums simply stop registering values at the first failure.
    fn evaluate_constants(
        &mut self,
        body: Node<'tree>,
        scope: &[String],
        name: Option<&str>,
        is_scoped: bool,
        annotated: bool,
    ) -> Result<Vec<EnumConstant>, ObsidianError> {
        let mut own_scope = scope.to_vec();
        own_scope.extend(name.map(str::to_string));

        let mut constants = Vec::new();
        let mut next = 0i64;
        let mut cursor = body.walk();
        let enumerators: Vec<Node<'tree>> = body
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "enumerator")
            .collect();

        for enumerator in enumerators {
            let Some(constant_name) = enumerator
                .child_by_field_name("name")
                .map(|name| self.unit.text(name).to_string())
            else {
                continue;
            };

            let value = match enumerator.child_by_field_name("value") {
                Some(expression) => {
                    let lookup = ScopedConstants {
                        constants: &self.constants,
                        layouts: self.layouts,
                        scope: &own_scope,
                    };
                    evaluate(self.unit, expression, &lookup)
                }
                None => Ok(next),
            };

            let value = match value {
                Ok(value) => value,
                Err(reason) if annotated => {
                    return Err(ObsidianError::ConstantExpression {
                        path: self.unit.path.clone(),
                        line: enumerator.start_position().row + 1,
                        name: constant_name,
                        reason: reason.to_string(),
                    });
                }
                Err(reason) => {
                    debug!(name = %constant_name, %reason, "skipping values of unreflected enum");
                    break;
                }
            };

            let mut path = own_scope.clone();
            path.push(constant_name.clone());
            self.constants.insert(render_scope(&path), value);
            if !is_scoped && name.is_some() {
                let mut path = scope.to_vec();
                path.push(constant_name.clone());
                self.constants.insert(render_scope(&path), value);
            }

            constants.push(EnumConstant {
                description: description(self.unit, enumerator, enumerator.start_position().row),
                name: constant_name,
                value,
            });
            next = value.wrapping_add(1);
        }

        Ok(constants)
    }

    fn underlying_type(
        &self,
        node: Node<'tree>,
        scope: &[String],
        is_scoped: bool,
        values: &[i64],
    ) -> (String, Option<u64>) {
        if let Some(base) = node.child_by_field_name("base") {
            let size = self
                .layouts
                .base_type(base, scope)
                .layout
                .map(|layout| layout.size);
            return (normalize_spelling(self.unit.text(base)), size);
        }
        if is_scoped {
            return ("int".to_string(), Some(4));
        }

        let negative = values.iter().any(|value| *value < 0);
        let (spelling, size) = match negative {
            false if values.iter().all(|value| u32::try_from(*value).is_ok()) => ("unsigned int", 4),
            false => ("unsigned long", 8),
            true if values.iter().all(|value| i32::try_from(*value).is_ok()) => ("int", 4),
            true => ("long", 8),
        };
        (spelling.to_string(), Some(size))
    }

    fn visit_class(&mut self, node: Node<'tree>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(marker) = self.annotation(node, body.start_byte(), Marker::Class) else {
            return;
        };
        let line = node.start_position().row + 1;
        let Some((scope, name)) = declared_scope(self.unit, node) else {
            warn!(line, "anonymous classes cannot be reflected; skipping");
            return;
        };
        if inside_template(node) {
            warn!(line, %name, "class templates cannot be reflected; skipping");
            return;
        }

        let is_struct = node.kind() == "struct_specifier";
        let record = self.layouts.record(node);
        let mut own_scope = scope.clone();
        own_scope.push(name.clone());
        let properties = self.properties(body, is_struct, &own_scope, &record);
        let scope = render_scope(&scope);

        debug!(%name, %scope, properties = properties.len(), "reflecting class");
        let reflected = Class {
            full_name: qualified_name(&scope, &name),
            description: self.declaration_description(node, marker),
            attributes: self.attributes(marker),
            location: self.location(node),
            name,
            scope,
            is_struct,
            alignment: record.layout.map(|layout| layout.alignment),
            size: record.layout.map(|layout| layout.size),
            properties,
        };
        self.classes.push(reflected);
    }

    fn properties(
        &mut self,
        body: Node<'tree>,
        is_struct: bool,
        scope: &[String],
        record: &RecordLayout,
    ) -> Vec<Property> {
        let mut properties = Vec::new();
        let mut public = is_struct;
        let mut cursor = body.walk();
        let members: Vec<Node<'tree>> = body.named_children(&mut cursor).collect();

        for member in members {
            match member.kind() {
                "access_specifier" => public = self.unit.text(member).starts_with("public"),
                "field_declaration" => {
                    self.field(member, public, scope, record, &mut properties);
                }
                "declaration" | "function_definition" | "template_declaration" => {
                    if self
                        .annotation(member, member.end_byte(), Marker::Property)
                        .is_some()
                    {
                        warn!(
                            line = member.start_position().row + 1,
                            "only data members can be reflected; skipping"
                        );
                    }
                }
                _ => {}
            }
        }

        properties
    }

    fn field(
        &mut self,
        member: Node<'tree>,
        public: bool,
        scope: &[String],
        record: &RecordLayout,
        properties: &mut Vec<Property>,
    ) {
        let Some(marker) = self.annotation(member, member.end_byte(), Marker::Property) else {
            trace!(line = member.start_position().row + 1, "member without marker");
            return;
        };
        let line = member.start_position().row + 1;

        if has_static_storage(self.unit, member) {
            warn!(line, "static members cannot be reflected; skipping");
            return;
        }
        if has_child_kind(member, "bitfield_clause") {
            warn!(line, "bit-fields have no address and cannot be reflected; skipping");
            return;
        }
        if !public {
            warn!(line, "non-public members cannot be reflected; skipping");
            return;
        }
        let Some(type_node) = member.child_by_field_name("type") else {
            warn!(line, "annotated member has no type; skipping");
            return;
        };

        let mut cursor = member.walk();
        let declarators: Vec<Node<'tree>> = member
            .children_by_field_name("declarator", &mut cursor)
            .collect();
        if declarators.is_empty() {
            warn!(line, "annotated member declares no data member; skipping");
            return;
        }

        let attributes = self.attributes(marker);
        let anchor_row = self.marker_row(marker).min(member.start_position().row);
        let description = description(self.unit, member, anchor_row);
        let qualifiers = type_qualifiers(self.unit, member);
        let is_const = qualifiers.iter().any(|qualifier| *qualifier == "const");

        for declarator in declarators {
            let Some(shape) = Declarator::parse(self.unit, declarator) else {
                continue;
            };
            if shape.is_function {
                warn!(line, name = %shape.name, "member functions cannot be reflected; skipping");
                continue;
            }
            if shape.is_reference {
                warn!(line, name = %shape.name, "reference members cannot be reflected; skipping");
                continue;
            }

            let info = self.layouts.member_type(type_node, &shape, scope);
            if shape.is_array() && !info.kind.is_trivially_copyable() {
                warn!(
                    line,
                    name = %shape.name,
                    "arrays of non-trivially copyable elements cannot be reflected; skipping"
                );
                continue;
            }

            let (type_name, type_scope, full_type) =
                self.type_names(type_node, &shape, &qualifiers, scope);
            trace!(name = %shape.name, %type_name, kind = ?info.kind, "reflecting member");

            properties.push(Property {
                type_name,
                type_scope,
                full_type,
                description: description.clone(),
                kind: info.kind,
                is_trivially_copyable: info.kind.is_trivially_copyable(),
                read_only: (is_const && shape.pointer_depth == 0) || shape.const_pointer,
                alignment: info.layout.map(|layout| layout.alignment),
                offset: record.offsets.get(&shape.name).copied(),
                size: info.layout.map(|layout| layout.size),
                attributes: attributes.clone(),
                name: shape.name,
            });
        }
    }

    /// `(type, type_scope, full_type)` for a member.
    fn type_names(
        &self,
        type_node: Node<'tree>,
        shape: &Declarator,
        qualifiers: &[&str],
        scope: &[String],
    ) -> (String, String, String) {
        let base = normalize_spelling(self.unit.text(type_node));
        let named = matches!(
            type_node.kind(),
            "type_identifier" | "qualified_identifier" | "template_type"
        );

        if named && shape.pointer_depth == 0 && !shape.is_array() {
            let mut segments = split_qualified(&base);
            let last = segments.pop().unwrap_or_else(|| base.clone());
            let type_scope = match self.index.resolve(&base, scope) {
                Some(entry) => render_scope(&entry.scope),
                None => render_scope(&segments),
            };
            let full_type = if type_scope.is_empty() {
                base
            } else {
                format!("{type_scope}::{last}")
            };
            return (last, type_scope, full_type);
        }

        let mut spelling = String::new();
        if shape.pointer_depth > 0 {
            for qualifier in qualifiers {
                spelling.push_str(qualifier);
                spelling.push(' ');
            }
        }
        spelling.push_str(&base);
        spelling.push_str(&shape.suffix());
        (spelling.clone(), String::new(), spelling)
    }

    /// Finds and claims `marker` in the annotation window of `node`.
    ///
    /// The window starts at the beginning of the line before the declaration,
    /// but never before the end of the preceding declaration, and ends at
    /// `end` (the body for enums and classes, the member's end for fields).
    fn annotation(&mut self, node: Node<'tree>, end: usize, marker: Marker) -> Option<usize> {
        let anchor = declaration_anchor(node);
        let row = anchor.start_position().row;
        let mut start = self.unit.line_start(row.saturating_sub(1));
        if let Some(previous) = previous_code_sibling(anchor) {
            start = start.max(previous.end_byte());
        }

        let index = locate(self.unit.tokens(), marker, SearchWindow { start, end })?;
        self.claimed.insert(index);
        Some(index)
    }

    fn attributes(&self, marker: usize) -> Vec<Attribute> {
        let tokens = self.unit.tokens();
        let line = tokens[marker].line;

        match parse_attributes(&tokens[marker + 1..], line) {
            Ok(attributes) => attributes,
            Err(err) => {
                error!(
                    path = %self.unit.path.display(),
                    line,
                    "{err}; the declaration gets no attributes"
                );
                Vec::new()
            }
        }
    }

    fn declaration_description(&self, node: Node<'tree>, marker: usize) -> String {
        let anchor = declaration_anchor(node);
        let row = self.marker_row(marker).min(anchor.start_position().row);
        description(self.unit, anchor, row)
    }

    fn marker_row(&self, marker: usize) -> usize {
        self.unit.tokens()[marker].line.saturating_sub(1)
    }

    fn location(&self, node: Node<'tree>) -> SourceLocation {
        SourceLocation {
            file: self.unit.path.clone(),
            line: node.start_position().row + 1,
        }
    }

    fn report_unclaimed(&self) {
        for (index, token) in self.unit.tokens().iter().enumerate() {
            if token.in_directive || self.claimed.contains(&index) {
                continue;
            }
            if let Some(marker) = Marker::from_identifier(token) {
                warn!(
                    path = %self.unit.path.display(),
                    line = token.line,
                    %marker,
                    "annotation marker is not attached to a reflectable declaration"
                );
            }
        }
    }
}

/// Resolves enumerator names from inside an enum, innermost scope first.
struct ScopedConstants<'e, 'a, 'tree> {
    constants: &'e HashMap<String, i64>,
    layouts: &'e LayoutEngine<'a, 'tree>,
    scope: &'e [String],
}

impl ConstantLookup for ScopedConstants<'_, '_, '_> {
    fn constant(&self, name: &str) -> Option<i64> {
        let path = render_scope(&split_qualified(name));
        if name.starts_with("::") {
            return self.constants.get(&path).copied();
        }

        (0..=self.scope.len()).rev().find_map(|depth| {
            let mut candidate = self.scope[..depth].to_vec();
            candidate.push(path.clone());
            self.constants.get(&render_scope(&candidate)).copied()
        })
    }

    fn size_of(&self, type_text: &str) -> Option<u64> {
        self.layouts.size_of(type_text, self.scope)
    }
}

/// The outermost node that starts where `node` does and still only declares it.
fn declaration_anchor(node: Node<'_>) -> Node<'_> {
    let mut anchor = node;
    while let Some(parent) = anchor.parent() {
        let wraps = matches!(parent.kind(), "declaration" | "field_declaration")
            && parent.start_byte() == anchor.start_byte();
        if !wraps {
            break;
        }
        anchor = parent;
    }
    anchor
}

fn previous_code_sibling(node: Node<'_>) -> Option<Node<'_>> {
    let mut previous = node.prev_named_sibling();
    while let Some(sibling) = previous {
        if sibling.kind() != "comment" {
            return Some(sibling);
        }
        previous = sibling.prev_named_sibling();
    }
    None
}

/// Whether the enclosing record chain contains a class template.
fn inside_template(node: Node<'_>) -> bool {
    let mut current = Some(node);
    while let Some(candidate) = current {
        let is_record = matches!(
            candidate.kind(),
            "class_specifier" | "struct_specifier" | "union_specifier"
        );
        if is_record && is_templated(candidate) {
            return true;
        }
        current = candidate.parent();
    }
    false
}

fn has_static_storage(unit: &TranslationUnit, node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).any(|child| {
        child.kind() == "storage_class_specifier" && unit.text(child) == "static"
    })
}

fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .any(|child| child.kind() == kind)
}

fn type_qualifiers<'u>(unit: &'u TranslationUnit, node: Node<'_>) -> Vec<&'u str> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() == "type_qualifier")
        .map(|child| unit.text(child))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ParseOptions;
    use crate::shared::{Annotated, FieldKind};

    fn extract_source(source: &str) -> Result<ExtractionContext, ObsidianError> {
        let unit = TranslationUnit::from_source("visitor.hpp", source, &ParseOptions::default())?;
        let mut context = ExtractionContext::default();
        extract(&unit, &mut context)?;
        Ok(context)
    }

    const VEGETABLE: &str = r#"
#include "obs.h"
#include <cstdint>

namespace FirstNamespace {

/// Vegetables grown in the garden.
OBS_ENUM("flags")
enum class Vegetable : int8_t
{
    /** This is carrot. */
    Carrot = -10,
    Potato,
    // This is cucumber.
    Cucumber,
};

enum class Unmarked { X, Y };

}
"#;

    #[test]
    fn extracts_annotated_scoped_enum() -> Result<(), ObsidianError> {
        let context = extract_source(VEGETABLE)?;

        assert_eq!(context.enums.len(), 1);
        let vegetable = &context.enums[0];
        assert_eq!(vegetable.name, "Vegetable");
        assert_eq!(vegetable.scope, "FirstNamespace");
        assert_eq!(vegetable.full_name, "FirstNamespace::Vegetable");
        assert_eq!(vegetable.description, "Vegetables grown in the garden.");
        assert_eq!(vegetable.underlying_type, "int8_t");
        assert_eq!(vegetable.underlying_type_size, Some(1));
        assert!(vegetable.is_scoped);
        assert!(vegetable.has_attribute("flags"));
        assert_eq!(vegetable.location.line, 9);

        let values: Vec<(&str, i64, &str)> = vegetable
            .constants
            .iter()
            .map(|c| (c.name.as_str(), c.value, c.description.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("Carrot", -10, "This is carrot."),
                ("Potato", -9, ""),
                ("Cucumber", -8, "This is cucumber."),
            ]
        );
        assert_eq!(vegetable.end_value(), -7);
        Ok(())
    }

    #[test]
    fn extracts_struct_properties_in_declaration_order() -> Result<(), ObsidianError> {
        let source = r#"
OBS_CLASS("serializable=1")
struct Data
{
    OBS_PROP("min=0", "max=100")
    int32_t a;
    /// Ratio.
    OBS_PROP()
    float b;
    OBS_PROP()
    const char* c;
    int hidden;
    OBS_PROP()
    const int fixed = 3;
};
"#;
        let context = extract_source(source)?;
        let data = &context.classes[0];

        assert_eq!(data.full_name, "::Data");
        assert!(data.is_struct);
        assert_eq!(data.attribute_value("serializable"), Some("1"));
        assert_eq!(data.size, Some(24));
        assert_eq!(data.alignment, Some(8));

        let names: Vec<&str> = data.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "fixed"]);

        let offsets: Vec<Option<u64>> = data.properties.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![Some(0), Some(4), Some(8), Some(20)]);

        let a = &data.properties[0];
        assert_eq!(a.type_name, "int32_t");
        assert_eq!(a.attribute_value("max"), Some("100"));
        assert_eq!(a.kind, FieldKind::TriviallyCopyable);

        assert_eq!(data.properties[1].description, "Ratio.");
        assert_eq!(data.properties[2].type_name, "const char *");
        assert!(!data.properties[2].read_only);
        assert!(data.properties[3].read_only);
        Ok(())
    }

    #[test]
    fn resolves_nested_types_and_text_fields() -> Result<(), ObsidianError> {
        let source = r#"
namespace FirstNamespace::SecondNamespace {
OBS_CLASS()
struct DataStruct
{
    OBS_ENUM()
    enum class DataType : int16_t { A, B = A + 4 };

    OBS_PROP()
    DataType type;
    OBS_PROP()
    std::string label;
};
}
"#;
        let context = extract_source(source)?;

        let data_type = &context.enums[0];
        assert_eq!(data_type.scope, "FirstNamespace::SecondNamespace::DataStruct");
        assert_eq!(data_type.constants[1].value, 4);

        let data = &context.classes[0];
        let kind = &data.properties[0];
        assert_eq!(kind.type_name, "DataType");
        assert_eq!(kind.type_scope, "FirstNamespace::SecondNamespace::DataStruct");
        assert_eq!(
            kind.full_type,
            "FirstNamespace::SecondNamespace::DataStruct::DataType"
        );
        assert_eq!(kind.size, Some(2));

        let label = &data.properties[1];
        assert_eq!(label.type_name, "string");
        assert_eq!(label.type_scope, "std");
        assert_eq!(label.full_type, "std::string");
        assert_eq!(label.kind, FieldKind::Text);
        assert_eq!(label.offset, Some(8));
        Ok(())
    }

    #[test]
    fn infers_unscoped_underlying_types_and_cross_enum_references() -> Result<(), ObsidianError> {
        let source = r#"
enum Base { First = 2, Second };
OBS_ENUM()
enum Derived { Start = Second * 2, Next, Negative = -1 };
OBS_ENUM()
enum Wide { Big = 0x100000000 };
"#;
        let context = extract_source(source)?;

        let derived = &context.enums[0];
        assert!(!derived.is_scoped);
        assert_eq!(derived.underlying_type, "int");
        let values: Vec<i64> = derived.constants.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![6, 7, -1]);

        assert_eq!(context.enums[1].underlying_type, "unsigned long");
        assert_eq!(context.enums[1].underlying_type_size, Some(8));
        Ok(())
    }

    #[test]
    fn unsigned_initializers_keep_their_width() -> Result<(), ObsidianError> {
        let source = r#"
OBS_ENUM()
enum class Mask : uint32_t { None = 0, All = ~0u };
OBS_ENUM()
enum Top { High = ~0u };
"#;
        let context = extract_source(source)?;

        let mask = &context.enums[0];
        assert_eq!(mask.constants[1].value, 4_294_967_295);
        assert_eq!(mask.underlying_type_size, Some(4));

        let top = &context.enums[1];
        assert_eq!(top.constants[0].value, 4_294_967_295);
        assert_eq!(top.underlying_type, "unsigned int");
        Ok(())
    }

    #[test]
    fn user_copy_constructor_makes_member_composite() -> Result<(), ObsidianError> {
        let source = r#"
struct Inner { int v = 0; Inner() = default; Inner(const Inner& o) : v(o.v) {} };
OBS_CLASS()
struct Outer
{
    OBS_PROP()
    Inner inner;
    OBS_PROP()
    int plain;
};
"#;
        let context = extract_source(source)?;
        let outer = &context.classes[0];

        assert_eq!(outer.properties[0].kind, FieldKind::Composite);
        assert_eq!(outer.properties[0].size, Some(4));
        assert_eq!(outer.properties[1].kind, FieldKind::TriviallyCopyable);
        assert_eq!(outer.properties[1].offset, Some(4));
        Ok(())
    }

    #[test]
    fn unevaluable_annotated_enum_is_fatal() {
        let result = extract_source("OBS_ENUM()\nenum class E { A = Missing };\n");

        assert!(matches!(
            result,
            Err(ObsidianError::ConstantExpression { line: 2, .. })
        ));
    }

    #[test]
    fn unevaluable_unannotated_enum_is_ignored() -> Result<(), ObsidianError> {
        let context = extract_source("enum class E { A = Missing };\n")?;

        assert!(context.is_empty());
        Ok(())
    }

    #[test]
    fn distant_marker_is_not_claimed() -> Result<(), ObsidianError> {
        let source = "OBS_ENUM()\n\n\nenum class Far { A };\n";
        let context = extract_source(source)?;

        assert!(context.enums.is_empty());
        Ok(())
    }

    #[test]
    fn empty_enum_and_struct() -> Result<(), ObsidianError> {
        let source = "OBS_ENUM()\nenum class EmptyEnum {};\nOBS_CLASS()\nstruct EmptyStruct {};\n";
        let context = extract_source(source)?;

        assert!(context.enums[0].constants.is_empty());
        assert_eq!(context.enums[0].end_value(), 0);
        assert!(context.classes[0].properties.is_empty());
        assert_eq!(context.classes[0].size, Some(1));
        Ok(())
    }

    #[test]
    fn malformed_annotation_yields_no_attributes() -> Result<(), ObsidianError> {
        let source = "OBS_ENUM(\"a=1\"\nenum class MalformedAttrEnum { A };\n";
        let context = extract_source(source)?;

        assert_eq!(context.enums.len(), 1);
        assert!(context.enums[0].attributes.is_empty());
        Ok(())
    }

    #[test]
    #[tracing_test::traced_test]
    fn warns_about_skipped_members_and_stray_markers() -> Result<(), ObsidianError> {
        let source = r#"
OBS_CLASS()
class Player
{
    OBS_PROP()
    int secret;
public:
    OBS_PROP()
    static int count;
    OBS_PROP()
    int& alias;
    OBS_PROP()
    int level;
};

OBS_PROP()
int loose;
"#;
        let context = extract_source(source)?;

        let names: Vec<&str> = context.classes[0]
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["level"]);
        assert!(!context.classes[0].is_struct);
        assert!(logs_contain("non-public members cannot be reflected"));
        assert!(logs_contain("static members cannot be reflected"));
        assert!(logs_contain("reference members cannot be reflected"));
        assert!(logs_contain("annotation marker is not attached"));
        Ok(())
    }
}
