use tree_sitter::Node;

use crate::frontend::TranslationUnit;

/// Documentation comment attached to a declaration, or an empty string.
///
/// `anchor` is the node whose preceding siblings are searched and `anchor_row`
/// the 0-based row the declaration starts on (the marker's row when the
/// declaration is annotated). The nearest comment is accepted only when it ends
/// on `anchor_row` or the row before it. Consecutive comments on adjacent rows
/// are joined; a comment that trails code on its own row is never a candidate.
pub fn description(unit: &TranslationUnit, anchor: Node<'_>, anchor_row: usize) -> String {
    let mut comments = Vec::new();
    let mut expected_row = anchor_row;
    let mut previous = anchor.prev_named_sibling();

    while let Some(sibling) = previous {
        if sibling.kind() != "comment" {
            break;
        }
        if expected_row.saturating_sub(sibling.end_position().row) > 1 {
            break;
        }

        comments.push(sibling);
        expected_row = sibling.start_position().row;
        previous = sibling.prev_named_sibling();
    }

    // A comment sharing a row with the code before it documents that code.
    while let Some(first) = comments.last() {
        let trails_code = first
            .prev_named_sibling()
            .is_some_and(|code| code.end_position().row == first.start_position().row);
        if !trails_code {
            break;
        }
        comments.pop();
    }

    comments.reverse();
    comments
        .into_iter()
        .map(|comment| clean_comment(unit.text(comment)))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips C++ comment syntax, including Doxygen and JSDoc-style prefixes.
fn clean_comment(comment: &str) -> String {
    let trimmed = comment.trim();

    if let Some(block) = trimmed.strip_suffix("*/") {
        let body = block
            .strip_prefix("/**")
            .or_else(|| block.strip_prefix("/*!"))
            .or_else(|| block.strip_prefix("/*"))
            .unwrap_or(block);
        let body = body.strip_prefix('<').unwrap_or(body);

        return body
            .lines()
            .map(|line| {
                let line = line.trim();
                line.strip_prefix('*').map(str::trim).unwrap_or(line)
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
    }

    let body = trimmed
        .strip_prefix("///")
        .or_else(|| trimmed.strip_prefix("//!"))
        .or_else(|| trimmed.strip_prefix("//"))
        .unwrap_or(trimmed);
    body.strip_prefix('<').unwrap_or(body).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObsidianError;
    use crate::frontend::ParseOptions;

    /// Description of each enumerator of the first enum in `source`.
    fn enumerator_descriptions(source: &str) -> Result<Vec<String>, ObsidianError> {
        let unit = TranslationUnit::from_source("doc.hpp", source, &ParseOptions::default())?;
        let mut stack = vec![unit.root()];
        let mut list = None;

        while let Some(node) = stack.pop() {
            if node.kind() == "enumerator_list" {
                list = Some(node);
                break;
            }
            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor));
        }

        let Some(list) = list else {
            return Ok(Vec::new());
        };
        let mut cursor = list.walk();
        Ok(list
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "enumerator")
            .map(|child| description(&unit, child, child.start_position().row))
            .collect())
    }

    #[test]
    fn cleans_comment_styles() {
        assert_eq!(clean_comment("// This is cucumber."), "This is cucumber.");
        assert_eq!(clean_comment("/** This is carrot. */"), "This is carrot.");
        assert_eq!(clean_comment("/**\n * This is a fruit enum.\n */"), "This is a fruit enum.");
        assert_eq!(clean_comment("/* plain */"), "plain");
        assert_eq!(clean_comment("///< trailing doc"), "trailing doc");
    }

    #[test]
    fn attaches_only_adjacent_comments() -> Result<(), ObsidianError> {
        let source = r#"
enum class Vegetable : signed char
{
    /** This is carrot. */
    Carrot = -10,
    Potato,
    // This is cucumber.
    Cucumber,
    // Too far away.

    Tomato,
};
"#;
        assert_eq!(
            enumerator_descriptions(source)?,
            vec!["This is carrot.", "", "This is cucumber.", ""]
        );
        Ok(())
    }

    #[test]
    fn skips_comments_trailing_previous_code() -> Result<(), ObsidianError> {
        let source = "enum E {\n    A, // about A\n    B,\n};\n";

        assert_eq!(enumerator_descriptions(source)?, vec!["", ""]);
        Ok(())
    }

    #[test]
    fn joins_consecutive_line_comments() -> Result<(), ObsidianError> {
        let source = "enum E {\n    // first line\n    // second line\n    A,\n};\n";

        assert_eq!(enumerator_descriptions(source)?, vec!["first line\nsecond line"]);
        Ok(())
    }
}
