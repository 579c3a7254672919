//! Size, alignment and copy semantics of member types.
//!
//! Layouts follow the LP64 data model used by x86-64 System V and AArch64
//! Linux. Records with base classes, virtual members, bit-fields or explicit
//! `alignas` are reported as unknown rather than guessed; generated code
//! always asks the C++ compiler through `offsetof`/`sizeof` anyway.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tree_sitter::Node;

use crate::extract::constant::parse_integer_literal;
use crate::extract::scope::{declared_scope, enclosing_scope, split_qualified};
use crate::extract::types::{Declarator, TypeDecl, TypeEntry, TypeIndex, is_definition};
use crate::frontend::TranslationUnit;
use crate::shared::FieldKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    pub size: u64,
    pub alignment: u64,
}

impl TypeLayout {
    pub const fn new(size: u64, alignment: u64) -> Self {
        Self { size, alignment }
    }

    const POINTER: Self = Self::new(8, 8);
}

/// What the generator knows about a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub layout: Option<TypeLayout>,
    pub kind: FieldKind,
}

impl TypeInfo {
    const UNKNOWN: Self = Self {
        layout: None,
        kind: FieldKind::Composite,
    };

    fn trivial(layout: TypeLayout) -> Self {
        Self {
            layout: Some(layout),
            kind: FieldKind::TriviallyCopyable,
        }
    }
}

/// Layout of a record plus the offsets of its named data members.
///
/// Offsets are known for every member before the first one whose layout is
/// unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    pub layout: Option<TypeLayout>,
    pub kind: FieldKind,
    pub offsets: HashMap<String, u64>,
}

impl RecordLayout {
    fn unknown() -> Self {
        Self {
            layout: None,
            kind: FieldKind::Composite,
            offsets: HashMap::new(),
        }
    }
}

/// Computes layouts for types declared in, or referenced by, one unit.
pub struct LayoutEngine<'a, 'tree> {
    unit: &'tree TranslationUnit,
    index: &'a TypeIndex<'tree>,
    records: RefCell<HashMap<usize, RecordLayout>>,
    visiting: RefCell<HashSet<usize>>,
}

impl<'a, 'tree> LayoutEngine<'a, 'tree> {
    pub fn new(unit: &'tree TranslationUnit, index: &'a TypeIndex<'tree>) -> Self {
        Self {
            unit,
            index,
            records: RefCell::new(HashMap::new()),
            visiting: RefCell::new(HashSet::new()),
        }
    }

    /// Layout of a class, struct or union definition.
    pub fn record(&self, node: Node<'tree>) -> RecordLayout {
        let id = node.id();
        if let Some(cached) = self.records.borrow().get(&id).cloned() {
            return cached;
        }
        if !self.visiting.borrow_mut().insert(id) {
            return RecordLayout::unknown();
        }

        let layout = self.compute_record(node);

        self.visiting.borrow_mut().remove(&id);
        self.records.borrow_mut().insert(id, layout.clone());
        layout
    }

    /// Type information for a data member.
    pub fn member_type(
        &self,
        type_node: Node<'tree>,
        declarator: &Declarator,
        scope: &[String],
    ) -> TypeInfo {
        if declarator.is_reference {
            return TypeInfo {
                layout: Some(TypeLayout::POINTER),
                kind: FieldKind::Composite,
            };
        }

        let element = if declarator.pointer_depth > 0 {
            TypeInfo::trivial(TypeLayout::POINTER)
        } else {
            self.base_type(type_node, scope)
        };

        if !declarator.is_array() {
            return element;
        }

        let count: Option<u64> = declarator
            .array_extents
            .iter()
            .try_fold(1u64, |total, extent| extent.map(|extent| total.saturating_mul(extent)));
        TypeInfo {
            layout: element.layout.zip(count).map(|(layout, count)| {
                TypeLayout::new(layout.size.saturating_mul(count), layout.alignment)
            }),
            kind: if element.kind.is_trivially_copyable() {
                FieldKind::TriviallyCopyable
            } else {
                FieldKind::Composite
            },
        }
    }

    /// Type information for a type specifier node.
    pub fn base_type(&self, node: Node<'tree>, scope: &[String]) -> TypeInfo {
        match node.kind() {
            "primitive_type" | "sized_type_specifier" => {
                let spelling = self.unit.text(node);
                builtin_layout(spelling)
                    .or_else(|| fixed_width_layout(spelling))
                    .map_or(TypeInfo::UNKNOWN, TypeInfo::trivial)
            }
            "type_identifier" | "qualified_identifier" | "template_type" => {
                self.named_type(self.unit.text(node), scope)
            }
            "class_specifier" | "struct_specifier" | "union_specifier" if is_definition(node) => {
                let record = self.record(node);
                TypeInfo {
                    layout: record.layout,
                    kind: record.kind,
                }
            }
            "enum_specifier" if is_definition(node) => self.enum_type(node, scope),
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier" => node
                .child_by_field_name("name")
                .map_or(TypeInfo::UNKNOWN, |name| {
                    self.named_type(self.unit.text(name), scope)
                }),
            "type_descriptor" => match node.child_by_field_name("declarator") {
                Some(declarator) if declarator.kind() == "abstract_pointer_declarator" => {
                    TypeInfo::trivial(TypeLayout::POINTER)
                }
                Some(_) => TypeInfo::UNKNOWN,
                None => node
                    .child_by_field_name("type")
                    .map_or(TypeInfo::UNKNOWN, |inner| self.base_type(inner, scope)),
            },
            _ => TypeInfo::UNKNOWN,
        }
    }

    /// Type information for a written type name, looked up from `scope`.
    pub fn named_type(&self, written: &str, scope: &[String]) -> TypeInfo {
        let written = normalize_spelling(written);
        let (base, arguments) = split_template(&written);
        let segments = split_qualified(base);
        let unqualified = segments.len() == 1 && !base.starts_with("::");
        let in_std = segments.len() == 2 && segments[0] == "std";
        let Some(last) = segments.last().map(String::as_str) else {
            return TypeInfo::UNKNOWN;
        };

        if arguments.is_none() {
            if (unqualified || in_std)
                && let Some(layout) = fixed_width_layout(last)
            {
                return TypeInfo::trivial(layout);
            }
            if let Some(entry) = self.index.resolve(base, scope) {
                return self.entry_type(entry);
            }
        }

        if unqualified || in_std {
            if last == "array"
                && let Some(arguments) = arguments
            {
                return self.std_array(arguments, scope);
            }
            if let Some(info) = standard_library_type(last) {
                return info;
            }
        }

        TypeInfo::UNKNOWN
    }

    /// Byte size of a written type, for `sizeof` in constant expressions.
    pub fn size_of(&self, written: &str, scope: &[String]) -> Option<u64> {
        let written = normalize_spelling(written);
        if written.ends_with('*') {
            return Some(TypeLayout::POINTER.size);
        }
        builtin_layout(&written)
            .or_else(|| self.named_type(&written, scope).layout)
            .map(|layout| layout.size)
    }

    /// Underlying layout of an enum definition.
    pub fn enum_type(&self, node: Node<'tree>, scope: &[String]) -> TypeInfo {
        let layout = match node.child_by_field_name("base") {
            Some(base) => self.base_type(base, scope).layout,
            None => Some(TypeLayout::new(4, 4)),
        };
        TypeInfo {
            layout,
            kind: FieldKind::TriviallyCopyable,
        }
    }

    fn entry_type(&self, entry: &TypeEntry<'tree>) -> TypeInfo {
        match entry.decl {
            TypeDecl::Record(node) => {
                let record = self.record(node);
                TypeInfo {
                    layout: record.layout,
                    kind: record.kind,
                }
            }
            TypeDecl::Enum(node) => self.enum_type(node, &entry.scope),
            TypeDecl::Alias {
                target,
                declarator: Some(declarator),
            } => match Declarator::parse(self.unit, declarator) {
                Some(shape) => self.member_type(target, &shape, &entry.scope),
                None => TypeInfo::UNKNOWN,
            },
            TypeDecl::Alias {
                target,
                declarator: None,
            } => self.base_type(target, &entry.scope),
        }
    }

    fn std_array(&self, arguments: &str, scope: &[String]) -> TypeInfo {
        let Some((element, extent)) = arguments.rsplit_once(',') else {
            return TypeInfo::UNKNOWN;
        };
        let element = element.trim();
        let element = builtin_layout(element)
            .map(TypeInfo::trivial)
            .unwrap_or_else(|| self.named_type(element, scope));
        let extent = parse_integer_literal(extent.trim())
            .and_then(|extent| u64::try_from(extent).ok());

        TypeInfo {
            layout: element.layout.zip(extent).map(|(layout, extent)| {
                TypeLayout::new(layout.size.saturating_mul(extent), layout.alignment)
            }),
            kind: if element.kind.is_trivially_copyable() {
                FieldKind::TriviallyCopyable
            } else {
                FieldKind::Composite
            },
        }
    }

    fn compute_record(&self, node: Node<'tree>) -> RecordLayout {
        let Some(body) = node.child_by_field_name("body") else {
            return RecordLayout::unknown();
        };

        let scope = match declared_scope(self.unit, node) {
            Some((mut scope, name)) => {
                scope.push(name);
                scope
            }
            None => enclosing_scope(self.unit, node),
        };
        let is_union = node.kind() == "union_specifier";
        let record_name = node
            .child_by_field_name("name")
            .map(|name| base_name(self.unit.text(name)))
            .unwrap_or_default();
        let head = &self.unit.source()[node.start_byte()..body.start_byte()];

        let mut complete = !mentions(head, "alignas");
        let mut kind = FieldKind::TriviallyCopyable;
        let mut members: Vec<(Option<String>, TypeInfo)> = Vec::new();

        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "base_class_clause")
        {
            complete = false;
            kind = FieldKind::Composite;
        }

        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            let signature = signature_text(self.unit.text(member));

            match member.kind() {
                "field_declaration" => {
                    if is_static(self.unit, member) {
                        continue;
                    }
                    if mentions(signature, "virtual") {
                        complete = false;
                        kind = FieldKind::Composite;
                    }
                    if mentions(signature, "alignas") {
                        complete = false;
                    }

                    let Some(type_node) = member.child_by_field_name("type") else {
                        continue;
                    };
                    let mut declarators = member.walk();
                    let declarators: Vec<Node<'tree>> = member
                        .children_by_field_name("declarator", &mut declarators)
                        .collect();

                    if declarators.is_empty() {
                        // Anonymous struct/union members still take up storage.
                        let anonymous = matches!(
                            type_node.kind(),
                            "struct_specifier" | "union_specifier" | "class_specifier"
                        ) && type_node.child_by_field_name("name").is_none()
                            && is_definition(type_node);
                        if anonymous {
                            let record = self.record(type_node);
                            if !record.kind.is_trivially_copyable() {
                                kind = FieldKind::Composite;
                            }
                            members.push((
                                None,
                                TypeInfo {
                                    layout: record.layout,
                                    kind: record.kind,
                                },
                            ));
                        }
                        continue;
                    }

                    if has_child_kind(member, "bitfield_clause") {
                        complete = false;
                    }

                    for declarator in declarators {
                        let Some(shape) = Declarator::parse(self.unit, declarator) else {
                            continue;
                        };
                        if shape.is_function {
                            if is_special_member(&shape.name)
                                || declares_copy_constructor(self.unit, member, record_name)
                            {
                                kind = FieldKind::Composite;
                            }
                            continue;
                        }

                        let info = self.member_type(type_node, &shape, &scope);
                        if !info.kind.is_trivially_copyable() {
                            kind = FieldKind::Composite;
                        }
                        members.push((Some(shape.name), info));
                    }
                }
                "function_definition" | "declaration" | "template_declaration" => {
                    if mentions(signature, "virtual") {
                        complete = false;
                        kind = FieldKind::Composite;
                    }
                    if signature.contains('~')
                        || declares_assignment(self.unit.text(member))
                        || declares_copy_constructor(self.unit, member, record_name)
                    {
                        kind = FieldKind::Composite;
                    }
                }
                _ => {}
            }
        }

        let mut offsets = HashMap::new();
        let mut end = 0u64;
        let mut alignment = 1u64;
        let mut known = complete;

        if complete {
            for (name, info) in &members {
                let Some(layout) = info.layout else {
                    known = false;
                    break;
                };
                let offset = if is_union {
                    0
                } else {
                    align_up(end, layout.alignment)
                };
                if let Some(name) = name {
                    offsets.insert(name.clone(), offset);
                }
                end = if is_union {
                    end.max(layout.size)
                } else {
                    offset + layout.size
                };
                alignment = alignment.max(layout.alignment);
            }
        }

        let layout = known.then(|| {
            let size = if members.is_empty() {
                1
            } else {
                align_up(end, alignment)
            };
            TypeLayout::new(size, alignment)
        });

        RecordLayout {
            layout,
            kind,
            offsets,
        }
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

fn is_static(unit: &TranslationUnit, node: Node<'_>) -> bool {
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

/// Text of a member up to its body or initializer.
fn signature_text(text: &str) -> &str {
    let end = text.find(['{', '=']).unwrap_or(text.len());
    &text[..end]
}

/// Whether `keyword` appears as a whole word in `text`.
fn mentions(text: &str, keyword: &str) -> bool {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
        .any(|word| word == keyword)
}

fn is_special_member(name: &str) -> bool {
    name.starts_with('~') || name.contains("operator=")
}

/// Whether `member` is a user-provided or deleted copy/move constructor of
/// the record named `record`, which makes the record non-trivially copyable.
/// Defaulted ones are left to the members.
fn declares_copy_constructor(unit: &TranslationUnit, member: Node<'_>, record: &str) -> bool {
    if record.is_empty() {
        return false;
    }

    let mut declarator = member.child_by_field_name("declarator");
    while let Some(node) = declarator {
        if node.kind() == "function_declarator" {
            break;
        }
        declarator = node.child_by_field_name("declarator");
    }
    let Some(function) = declarator else {
        return false;
    };
    let is_constructor = function
        .child_by_field_name("declarator")
        .is_some_and(|name| base_name(unit.text(name)) == record);
    let defaulted = unit
        .text(member)
        .split_whitespace()
        .collect::<String>()
        .contains("=default");
    if !is_constructor || defaulted {
        return false;
    }

    let Some(parameters) = function.child_by_field_name("parameters") else {
        return false;
    };
    let mut cursor = parameters.walk();
    let parameters: Vec<Node<'_>> = parameters
        .named_children(&mut cursor)
        .filter(|parameter| parameter.kind() != "comment")
        .collect();
    let [parameter] = parameters.as_slice() else {
        return false;
    };

    let by_reference = parameter
        .child_by_field_name("declarator")
        .is_some_and(|declarator| {
            matches!(
                declarator.kind(),
                "reference_declarator" | "abstract_reference_declarator"
            )
        });
    let same_type = parameter
        .child_by_field_name("type")
        .is_some_and(|ty| base_name(unit.text(ty)) == record);
    by_reference && same_type
}

/// Whether a member's declarator names `operator=`.
fn declares_assignment(text: &str) -> bool {
    let head = text.split('(').next().unwrap_or_default();
    head.split_whitespace().collect::<String>().ends_with("operator=")
}

/// `ns::Name<T>` becomes `Name`.
fn base_name(text: &str) -> &str {
    let (name, _) = split_template(text.trim());
    name.rsplit("::").next().unwrap_or(name).trim()
}

/// Collapses whitespace runs and drops spaces around `::` and template brackets.
pub fn normalize_spelling(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = collapsed.chars().collect();
    let mut normalized = String::with_capacity(collapsed.len());

    for (index, ch) in chars.iter().enumerate() {
        if *ch == ' ' {
            let previous = index.checked_sub(1).and_then(|previous| chars.get(previous));
            let next = chars.get(index + 1);
            if matches!(previous, Some(':' | '<')) || matches!(next, Some(':' | '<' | '>' | ',')) {
                continue;
            }
        }
        normalized.push(*ch);
    }
    normalized
}

/// Splits `std::array<int, 4>` into `("std::array", Some("int, 4"))`.
fn split_template(written: &str) -> (&str, Option<&str>) {
    match (written.find('<'), written.rfind('>')) {
        (Some(open), Some(close)) if close > open => {
            (&written[..open], Some(&written[open + 1..close]))
        }
        _ => (written, None),
    }
}

/// Layout of a builtin type spelled with keywords, e.g. `unsigned long long`.
pub fn builtin_layout(spelling: &str) -> Option<TypeLayout> {
    let words: Vec<&str> = spelling
        .split_whitespace()
        .filter(|word| !matches!(*word, "const" | "volatile" | "mutable"))
        .collect();
    let has_sign = words
        .iter()
        .any(|word| matches!(*word, "signed" | "unsigned"));
    let longs = words.iter().filter(|word| **word == "long").count();
    let rest: Vec<&str> = words
        .iter()
        .copied()
        .filter(|word| !matches!(*word, "signed" | "unsigned" | "long"))
        .collect();

    let (size, alignment) = match (rest.as_slice(), longs) {
        ([], 0) if has_sign => (4, 4),
        ([], 1 | 2) | (["int"], 1 | 2) => (8, 8),
        (["int"], 0) => (4, 4),
        (["short"], 0) | (["short", "int"], 0) | (["int", "short"], 0) => (2, 2),
        (["char"] | ["char8_t"] | ["bool"], 0) => (1, 1),
        (["char16_t"], 0) => (2, 2),
        (["char32_t"] | ["wchar_t"] | ["float"], 0) => (4, 4),
        (["double"], 0) => (8, 8),
        (["double"], 1) | (["__int128"], 0) => (16, 16),
        _ => return None,
    };
    Some(TypeLayout::new(size, alignment))
}

/// Layout of `<cstdint>`/`<cstddef>` typedefs, with or without `std::`.
pub fn fixed_width_layout(name: &str) -> Option<TypeLayout> {
    let name = name.strip_prefix("std::").unwrap_or(name);
    let size = match name {
        "int8_t" | "uint8_t" | "int_least8_t" | "uint_least8_t" | "int_fast8_t"
        | "uint_fast8_t" | "byte" => 1,
        "int16_t" | "uint16_t" | "int_least16_t" | "uint_least16_t" => 2,
        "int32_t" | "uint32_t" | "int_least32_t" | "uint_least32_t" => 4,
        "int64_t" | "uint64_t" | "int_least64_t" | "uint_least64_t" | "int_fast16_t"
        | "uint_fast16_t" | "int_fast32_t" | "uint_fast32_t" | "int_fast64_t"
        | "uint_fast64_t" | "intptr_t" | "uintptr_t" | "intmax_t" | "uintmax_t" | "size_t"
        | "ssize_t" | "ptrdiff_t" | "nullptr_t" => 8,
        "max_align_t" => 16,
        _ => return None,
    };
    Some(TypeLayout::new(size, size))
}

/// Standard library class types the generator knows by name (libstdc++ sizes).
fn standard_library_type(name: &str) -> Option<TypeInfo> {
    let (size, kind) = match name {
        "string" | "wstring" | "u8string" | "u16string" | "u32string" => (32, FieldKind::Text),
        "string_view" | "wstring_view" | "u8string_view" | "u16string_view"
        | "u32string_view" => (16, FieldKind::TriviallyCopyable),
        "vector" | "list" => (24, FieldKind::Composite),
        "unique_ptr" => (8, FieldKind::Composite),
        "shared_ptr" | "weak_ptr" => (16, FieldKind::Composite),
        "function" => (32, FieldKind::Composite),
        "map" | "set" | "multimap" | "multiset" => (48, FieldKind::Composite),
        "unordered_map" | "unordered_set" | "unordered_multimap" | "unordered_multiset" => {
            (56, FieldKind::Composite)
        }
        "deque" => (80, FieldKind::Composite),
        _ => return None,
    };
    Some(TypeInfo {
        layout: Some(TypeLayout::new(size, 8)),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObsidianError;
    use crate::frontend::ParseOptions;

    fn layout_of(source: &str, name: &str) -> Result<RecordLayout, ObsidianError> {
        let unit = TranslationUnit::from_source("layout.hpp", source, &ParseOptions::default())?;
        let index = TypeIndex::build(&unit);
        let engine = LayoutEngine::new(&unit, &index);

        Ok(match index.resolve(name, &[]).map(|entry| entry.decl) {
            Some(TypeDecl::Record(node)) => engine.record(node),
            _ => RecordLayout::unknown(),
        })
    }

    #[test]
    fn lays_out_scalar_and_pointer_members() -> Result<(), ObsidianError> {
        let source = "struct Data { int32_t a = 1; float b; const char * c; };";
        let record = layout_of(source, "Data")?;

        assert_eq!(record.layout, Some(TypeLayout::new(16, 8)));
        assert_eq!(record.kind, FieldKind::TriviallyCopyable);
        assert_eq!(record.offsets.get("a"), Some(&0));
        assert_eq!(record.offsets.get("b"), Some(&4));
        assert_eq!(record.offsets.get("c"), Some(&8));
        Ok(())
    }

    #[test]
    fn pads_between_members_and_at_the_end() -> Result<(), ObsidianError> {
        let source = "struct Padded { char tag; double value; short count; };";
        let record = layout_of(source, "Padded")?;

        assert_eq!(record.layout, Some(TypeLayout::new(24, 8)));
        assert_eq!(record.offsets.get("value"), Some(&8));
        assert_eq!(record.offsets.get("count"), Some(&16));
        Ok(())
    }

    #[test]
    fn strings_make_records_non_trivial() -> Result<(), ObsidianError> {
        let source = "struct Player { std::string name; int32_t level; };";
        let record = layout_of(source, "Player")?;

        assert_eq!(record.kind, FieldKind::Composite);
        assert_eq!(record.layout, Some(TypeLayout::new(40, 8)));
        assert_eq!(record.offsets.get("level"), Some(&32));
        Ok(())
    }

    #[test]
    fn nested_records_enums_and_arrays() -> Result<(), ObsidianError> {
        let source = r#"
struct Outer {
    enum class Kind : int16_t { A, B };
    struct Point { float x; float y; };
    Kind kind;
    Point points[3];
    static int counter;
    uint8_t flags[2];
    union { int i; double d; };
};
"#;
        let record = layout_of(source, "Outer")?;

        assert_eq!(record.offsets.get("kind"), Some(&0));
        assert_eq!(record.offsets.get("points"), Some(&4));
        assert_eq!(record.offsets.get("flags"), Some(&28));
        assert!(!record.offsets.contains_key("counter"));
        assert_eq!(record.layout, Some(TypeLayout::new(40, 8)));
        assert_eq!(record.kind, FieldKind::TriviallyCopyable);
        Ok(())
    }

    #[test]
    fn user_copy_and_move_constructors_are_not_trivial() -> Result<(), ObsidianError> {
        let copied = layout_of(
            "struct Inner { int v = 0; Inner() = default; Inner(const Inner& o) : v(o.v) {} };",
            "Inner",
        )?;
        assert_eq!(copied.kind, FieldKind::Composite);
        assert_eq!(copied.layout, Some(TypeLayout::new(4, 4)));

        let moved = layout_of("struct M { int v; M(M&& other); };", "M")?;
        assert_eq!(moved.kind, FieldKind::Composite);

        let deleted = layout_of("struct D { int v; D(const D&) = delete; };", "D")?;
        assert_eq!(deleted.kind, FieldKind::Composite);

        let assigned = layout_of(
            "struct A { int v; A& operator=(const A& other) { v = other.v; return *this; } };",
            "A",
        )?;
        assert_eq!(assigned.kind, FieldKind::Composite);

        let outer = layout_of(
            "struct Inner { Inner(const Inner&); int v; }; struct Outer { Inner inner; };",
            "Outer",
        )?;
        assert_eq!(outer.kind, FieldKind::Composite);
        Ok(())
    }

    #[test]
    fn defaulted_and_converting_constructors_stay_trivial() -> Result<(), ObsidianError> {
        let source = r#"
struct Point {
    Point() = default;
    Point(const Point&) = default;
    Point(int x, int y) : x(x), y(y) {}
    explicit Point(const Other& other);
    int x;
    int y;
};
"#;
        let record = layout_of(source, "Point")?;

        assert_eq!(record.kind, FieldKind::TriviallyCopyable);
        assert_eq!(record.layout, Some(TypeLayout::new(8, 4)));
        Ok(())
    }

    #[test]
    fn empty_records_have_size_one() -> Result<(), ObsidianError> {
        let record = layout_of("struct EmptyStruct {};", "EmptyStruct")?;

        assert_eq!(record.layout, Some(TypeLayout::new(1, 1)));
        Ok(())
    }

    #[test]
    fn bases_and_virtuals_are_unknown() -> Result<(), ObsidianError> {
        let derived = layout_of("struct B {}; struct D : B { int x; };", "D")?;
        assert_eq!(derived.layout, None);
        assert_eq!(derived.kind, FieldKind::Composite);

        let polymorphic = layout_of("struct P { virtual ~P(); int x; };", "P")?;
        assert_eq!(polymorphic.layout, None);
        assert!(polymorphic.offsets.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_member_keeps_earlier_offsets() -> Result<(), ObsidianError> {
        let record = layout_of("struct S { int a; Mystery m; int b; };", "S")?;

        assert_eq!(record.layout, None);
        assert_eq!(record.offsets.get("a"), Some(&0));
        assert!(!record.offsets.contains_key("b"));
        Ok(())
    }

    #[test]
    fn resolves_aliases() -> Result<(), ObsidianError> {
        let source = "using u16 = uint16_t; typedef double real; struct S { u16 a; real b; };";
        let record = layout_of(source, "S")?;

        assert_eq!(record.offsets.get("b"), Some(&8));
        assert_eq!(record.layout, Some(TypeLayout::new(16, 8)));
        Ok(())
    }

    #[test]
    fn builtin_spellings() {
        assert_eq!(builtin_layout("unsigned"), Some(TypeLayout::new(4, 4)));
        assert_eq!(builtin_layout("unsigned long long int"), Some(TypeLayout::new(8, 8)));
        assert_eq!(builtin_layout("short"), Some(TypeLayout::new(2, 2)));
        assert_eq!(builtin_layout("signed char"), Some(TypeLayout::new(1, 1)));
        assert_eq!(builtin_layout("long double"), Some(TypeLayout::new(16, 16)));
        assert_eq!(builtin_layout("void"), None);
        assert_eq!(fixed_width_layout("std::int8_t"), Some(TypeLayout::new(1, 1)));
        assert_eq!(fixed_width_layout("Mystery"), None);
    }

    #[test]
    fn normalizes_spelling() {
        assert_eq!(normalize_spelling("std :: map< int ,  float >"), "std::map<int, float>");
        assert_eq!(normalize_spelling("unsigned   int"), "unsigned int");
    }
}
