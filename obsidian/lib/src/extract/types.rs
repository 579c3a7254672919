//! Named types declared in a translation unit, and member declarator shapes.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::extract::constant::parse_integer_literal;
use crate::extract::scope::{declared_scope, enclosing_scope, render_scope, split_qualified};
use crate::frontend::TranslationUnit;

/// What a type name refers to.
#[derive(Debug, Clone, Copy)]
pub enum TypeDecl<'tree> {
    /// A class, struct or union definition.
    Record(Node<'tree>),
    /// An enum definition.
    Enum(Node<'tree>),
    /// `typedef` or `using` alias: the aliased type node plus, for typedefs,
    /// the declarator carrying any pointer or array shape.
    Alias {
        target: Node<'tree>,
        declarator: Option<Node<'tree>>,
    },
}

#[derive(Debug, Clone)]
pub struct TypeEntry<'tree> {
    pub decl: TypeDecl<'tree>,
    pub scope: Vec<String>,
    pub name: String,
}

/// Every named type in a unit, keyed by qualified name without a leading `::`.
#[derive(Debug, Default)]
pub struct TypeIndex<'tree> {
    entries: HashMap<String, TypeEntry<'tree>>,
}

impl<'tree> TypeIndex<'tree> {
    pub fn build(unit: &'tree TranslationUnit) -> Self {
        let mut index = Self::default();
        let mut stack = vec![unit.root()];

        while let Some(node) = stack.pop() {
            index.register(unit, node);

            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
        }

        index
    }

    fn register(&mut self, unit: &'tree TranslationUnit, node: Node<'tree>) {
        match node.kind() {
            "class_specifier" | "struct_specifier" | "union_specifier" | "enum_specifier"
                if is_definition(node) && !is_templated(node) =>
            {
                let Some((scope, name)) = declared_scope(unit, node) else {
                    return;
                };
                let decl = if node.kind() == "enum_specifier" {
                    TypeDecl::Enum(node)
                } else {
                    TypeDecl::Record(node)
                };
                self.insert(TypeEntry { decl, scope, name });
            }
            "type_definition" => {
                let Some(target) = node.child_by_field_name("type") else {
                    return;
                };
                let mut cursor = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut cursor) {
                    let Some(shape) = Declarator::parse(unit, declarator) else {
                        continue;
                    };
                    self.insert(TypeEntry {
                        decl: TypeDecl::Alias {
                            target,
                            declarator: Some(declarator),
                        },
                        scope: enclosing_scope(unit, node),
                        name: shape.name,
                    });
                }
            }
            "alias_declaration" if !is_templated(node) => {
                let (Some(name), Some(target)) = (
                    node.child_by_field_name("name"),
                    node.child_by_field_name("type"),
                ) else {
                    return;
                };
                self.insert(TypeEntry {
                    decl: TypeDecl::Alias {
                        target,
                        declarator: None,
                    },
                    scope: enclosing_scope(unit, node),
                    name: unit.text(name).to_string(),
                });
            }
            _ => {}
        }
    }

    fn insert(&mut self, entry: TypeEntry<'tree>) {
        let mut path = entry.scope.clone();
        path.push(entry.name.clone());
        self.entries.entry(render_scope(&path)).or_insert(entry);
    }

    /// Resolves a written type name the way unqualified lookup would from
    /// inside `scope`: innermost enclosing scope first, then outward.
    pub fn resolve(&self, written: &str, scope: &[String]) -> Option<&TypeEntry<'tree>> {
        let global = written.trim_start().starts_with("::");
        let path = render_scope(&split_qualified(written));

        if global {
            return self.entries.get(&path);
        }

        (0..=scope.len()).rev().find_map(|depth| {
            let mut candidate = scope[..depth].to_vec();
            candidate.push(path.clone());
            self.entries.get(&render_scope(&candidate))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a record or enum specifier has a body (is a definition).
pub fn is_definition(node: Node<'_>) -> bool {
    node.child_by_field_name("body").is_some()
}

/// Whether a declaration sits directly under a `template <...>` header.
pub fn is_templated(node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        match parent.kind() {
            "template_declaration" => return true,
            "declaration" | "field_declaration" | "type_definition" => current = parent.parent(),
            _ => return false,
        }
    }
    false
}

/// The shape a declarator gives a member: its name plus pointer, reference
/// and array layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub name: String,
    pub pointer_depth: usize,
    /// Spelling appended after the base type, e.g. ` *` or ` *const`.
    pub pointer_suffix: String,
    /// Whether the member itself (not its pointee) is `const`.
    pub const_pointer: bool,
    pub is_reference: bool,
    /// Array extents, outermost first; `None` when not a plain literal.
    pub array_extents: Vec<Option<u64>>,
    pub is_function: bool,
}

impl Declarator {
    pub fn parse(unit: &TranslationUnit, node: Node<'_>) -> Option<Self> {
        let mut shape = Self {
            name: String::new(),
            pointer_depth: 0,
            pointer_suffix: String::new(),
            const_pointer: false,
            is_reference: false,
            array_extents: Vec::new(),
            is_function: false,
        };
        let mut extents = Vec::new();
        let mut current = Some(node);

        while let Some(layer) = current {
            current = match layer.kind() {
                "field_identifier" | "identifier" | "type_identifier" | "destructor_name"
                | "operator_name" | "qualified_identifier" => {
                    shape.name = unit.text(layer).to_string();
                    None
                }
                "pointer_declarator" => {
                    shape.pointer_depth += 1;
                    shape.pointer_suffix.push_str(" *");
                    let mut cursor = layer.walk();
                    let qualifiers: Vec<&str> = layer
                        .named_children(&mut cursor)
                        .filter(|child| child.kind() == "type_qualifier")
                        .map(|child| unit.text(child))
                        .collect();
                    shape.const_pointer = qualifiers.contains(&"const");
                    shape.pointer_suffix.push_str(&qualifiers.join(" "));
                    layer.child_by_field_name("declarator")
                }
                "reference_declarator" => {
                    shape.is_reference = true;
                    let mut cursor = layer.walk();
                    let inner = layer.named_children(&mut cursor).last();
                    inner
                }
                "array_declarator" => {
                    extents.push(
                        layer
                            .child_by_field_name("size")
                            .and_then(|size| parse_integer_literal(unit.text(size)))
                            .and_then(|size| u64::try_from(size).ok()),
                    );
                    layer.child_by_field_name("declarator")
                }
                "function_declarator" => {
                    shape.is_function = true;
                    layer.child_by_field_name("declarator")
                }
                "init_declarator" | "attributed_declarator" => {
                    layer.child_by_field_name("declarator").or_else(|| {
                        let mut cursor = layer.walk();
                        let first = layer.named_children(&mut cursor).next();
                        first
                    })
                }
                "parenthesized_declarator" => {
                    let mut cursor = layer.walk();
                    let inner = layer.named_children(&mut cursor).next();
                    inner
                }
                _ => None,
            };
        }

        // Nested array declarators are visited outermost extent last.
        extents.reverse();
        shape.array_extents = extents;

        (!shape.name.is_empty()).then_some(shape)
    }

    /// Spelling suffix for pointer and array layers, e.g. ` *` or `[4]`.
    pub fn suffix(&self) -> String {
        let mut suffix = self.pointer_suffix.clone();
        for extent in &self.array_extents {
            match extent {
                Some(extent) => suffix.push_str(&format!("[{extent}]")),
                None => suffix.push_str("[]"),
            }
        }
        suffix
    }

    pub fn is_array(&self) -> bool {
        !self.array_extents.is_empty()
    }
}
