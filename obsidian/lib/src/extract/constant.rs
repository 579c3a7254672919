//! Integer constant expression evaluation for enumerator initializers.

use thiserror::Error;
use tree_sitter::Node;

use crate::frontend::TranslationUnit;
use crate::frontend::token::decode_escapes;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unsupported expression `{0}`")]
    Unsupported(String),

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("invalid integer literal `{0}`")]
    InvalidLiteral(String),

    #[error("unknown size of `{0}`")]
    UnknownSize(String),

    #[error("division by zero")]
    DivisionByZero,
}

/// Name resolution used while evaluating an expression.
pub trait ConstantLookup {
    /// Value of a (possibly qualified) enumerator name.
    fn constant(&self, name: &str) -> Option<i64>;

    /// Byte size of a type, for `sizeof`.
    fn size_of(&self, type_text: &str) -> Option<u64>;
}

/// Evaluates an integer constant expression node.
///
/// Arithmetic follows the operand types C++ would use: `u` suffixed or
/// oversized literals are unsigned, and 32-bit unsigned results wrap at
/// 32 bits.
pub fn evaluate(
    unit: &TranslationUnit,
    node: Node<'_>,
    lookup: &dyn ConstantLookup,
) -> Result<i64, EvalError> {
    eval(unit, node, lookup).map(|constant| constant.value)
}

/// An evaluated value together with its integral type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Constant {
    value: i64,
    unsigned: bool,
    /// 64-bit (`long`) rather than 32-bit (`int`).
    wide: bool,
}

impl Constant {
    fn int(value: i64) -> Self {
        Self {
            value,
            unsigned: false,
            wide: i32::try_from(value).is_err(),
        }
    }

    fn typed(value: i64, unsigned: bool, wide: bool) -> Self {
        let value = match (unsigned, wide) {
            (true, false) => value & 0xFFFF_FFFF,
            (false, false) => i64::from(value as i32),
            _ => value,
        };
        Self {
            value,
            unsigned,
            wide,
        }
    }

    /// Common type of two operands after the usual arithmetic conversions.
    fn common(self, other: Self) -> (bool, bool) {
        let wide = self.wide || other.wide;
        let unsigned = match (self.wide, other.wide) {
            (true, false) => self.unsigned,
            (false, true) => other.unsigned,
            _ => self.unsigned || other.unsigned,
        };
        (unsigned, wide)
    }
}

fn eval(
    unit: &TranslationUnit,
    node: Node<'_>,
    lookup: &dyn ConstantLookup,
) -> Result<Constant, EvalError> {
    let text = unit.text(node);

    match node.kind() {
        "number_literal" => {
            literal(text).ok_or_else(|| EvalError::InvalidLiteral(text.to_string()))
        }
        "char_literal" => char_value(text)
            .map(Constant::int)
            .ok_or_else(|| EvalError::InvalidLiteral(text.to_string())),
        "true" => Ok(Constant::int(1)),
        "false" => Ok(Constant::int(0)),
        "parenthesized_expression" => eval(unit, first_operand(node, text)?, lookup),
        "identifier" | "qualified_identifier" => {
            let name: String = text.chars().filter(|ch| !ch.is_whitespace()).collect();
            lookup
                .constant(&name)
                .map(Constant::int)
                .ok_or(EvalError::UnknownIdentifier(name))
        }
        "unary_expression" => {
            let operand = eval(unit, field(node, "argument", text)?, lookup)?;
            let value = match operator(unit, node) {
                "-" => operand.value.wrapping_neg(),
                "+" => operand.value,
                "~" => !operand.value,
                "!" => return Ok(Constant::int(i64::from(operand.value == 0))),
                _ => return Err(EvalError::Unsupported(text.to_string())),
            };
            Ok(Constant::typed(value, operand.unsigned, operand.wide))
        }
        "binary_expression" => {
            let left = eval(unit, field(node, "left", text)?, lookup)?;
            let right = eval(unit, field(node, "right", text)?, lookup)?;
            apply_binary(operator(unit, node), left, right, text)
        }
        "conditional_expression" => {
            let condition = eval(unit, field(node, "condition", text)?, lookup)?;
            let branch = if condition.value != 0 { "consequence" } else { "alternative" };
            eval(unit, field(node, branch, text)?, lookup)
        }
        "cast_expression" => eval(unit, field(node, "value", text)?, lookup),
        "sizeof_expression" => {
            let target = node
                .child_by_field_name("type")
                .or_else(|| node.child_by_field_name("value"))
                .ok_or_else(|| EvalError::Unsupported(text.to_string()))?;
            let type_text = unit.text(target);
            let type_text = type_text
                .strip_prefix('(')
                .and_then(|inner| inner.strip_suffix(')'))
                .unwrap_or(type_text)
                .trim();
            lookup
                .size_of(type_text)
                .map(|size| Constant::typed(size as i64, true, true))
                .ok_or_else(|| EvalError::UnknownSize(type_text.to_string()))
        }
        "call_expression" => {
            // static_cast<T>(value)
            let function = field(node, "function", text)?;
            let is_cast = function.kind() == "template_function"
                && function
                    .child_by_field_name("name")
                    .is_some_and(|name| unit.text(name) == "static_cast");
            if !is_cast {
                return Err(EvalError::Unsupported(text.to_string()));
            }
            let arguments = field(node, "arguments", text)?;
            eval(unit, first_operand(arguments, text)?, lookup)
        }
        _ => Err(EvalError::Unsupported(text.to_string())),
    }
}

fn field<'a>(node: Node<'a>, name: &str, text: &str) -> Result<Node<'a>, EvalError> {
    node.child_by_field_name(name)
        .ok_or_else(|| EvalError::Unsupported(text.to_string()))
}

fn first_operand<'a>(node: Node<'a>, text: &str) -> Result<Node<'a>, EvalError> {
    let mut cursor = node.walk();
    let operand = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    operand.ok_or_else(|| EvalError::Unsupported(text.to_string()))
}

fn operator<'a>(unit: &'a TranslationUnit, node: Node<'_>) -> &'a str {
    node.child_by_field_name("operator")
        .map(|operator| unit.text(operator))
        .unwrap_or_default()
}

fn apply_binary(
    operator: &str,
    left: Constant,
    right: Constant,
    text: &str,
) -> Result<Constant, EvalError> {
    let (unsigned, wide) = left.common(right);
    let l = Constant::typed(left.value, unsigned, wide).value;
    let r = Constant::typed(right.value, unsigned, wide).value;
    let as_unsigned = |value: i64| value as u64;

    let value = match operator {
        "+" => l.wrapping_add(r),
        "-" => l.wrapping_sub(r),
        "*" => l.wrapping_mul(r),
        "/" | "%" if r == 0 => return Err(EvalError::DivisionByZero),
        "/" if unsigned => (as_unsigned(l) / as_unsigned(r)) as i64,
        "/" => l.wrapping_div(r),
        "%" if unsigned => (as_unsigned(l) % as_unsigned(r)) as i64,
        "%" => l.wrapping_rem(r),
        // Shifts take the type of the left operand.
        "<<" => {
            return Ok(Constant::typed(
                left.value.wrapping_shl(r as u32),
                left.unsigned,
                left.wide,
            ));
        }
        ">>" if left.unsigned => {
            return Ok(Constant::typed(
                (as_unsigned(left.value) >> (r as u32 & 63)) as i64,
                true,
                left.wide,
            ));
        }
        ">>" => {
            return Ok(Constant::typed(
                left.value.wrapping_shr(r as u32),
                false,
                left.wide,
            ));
        }
        "&" => l & r,
        "|" => l | r,
        "^" => l ^ r,
        _ => {
            let truth = match operator {
                "&&" => l != 0 && r != 0,
                "||" => l != 0 || r != 0,
                "==" => l == r,
                "!=" => l != r,
                "<" if unsigned => as_unsigned(l) < as_unsigned(r),
                "<=" if unsigned => as_unsigned(l) <= as_unsigned(r),
                ">" if unsigned => as_unsigned(l) > as_unsigned(r),
                ">=" if unsigned => as_unsigned(l) >= as_unsigned(r),
                "<" => l < r,
                "<=" => l <= r,
                ">" => l > r,
                ">=" => l >= r,
                _ => return Err(EvalError::Unsupported(text.to_string())),
            };
            return Ok(Constant::int(i64::from(truth)));
        }
    };
    Ok(Constant::typed(value, unsigned, wide))
}

/// Parses a C++ integer literal: decimal, hex, octal or binary, with an
/// optional sign, digit separators and `u`/`l`/`z` suffixes. Values above
/// `i64::MAX` wrap.
pub fn parse_integer_literal(text: &str) -> Option<i64> {
    literal(text).map(|constant| constant.value)
}

/// Typed value of an integer literal, following the C++ rules for picking
/// the first of `int`, `unsigned int`, `long` and `unsigned long` that fits.
fn literal(text: &str) -> Option<Constant> {
    let trimmed = text.trim();
    let (negative, digits_text) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed).trim_start()),
    };

    let cleaned: String = digits_text
        .chars()
        .filter(|ch| *ch != '\'')
        .collect::<String>()
        .to_ascii_lowercase();
    let digits = cleaned.trim_end_matches(['u', 'l', 'z']);
    let suffix = &cleaned[digits.len()..];

    let (radix, body) = if let Some(hex) = digits.strip_prefix("0x") {
        (16, hex)
    } else if let Some(binary) = digits.strip_prefix("0b") {
        (2, binary)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    let magnitude = u64::from_str_radix(body, radix).ok()?;

    let suffix_unsigned = suffix.contains('u');
    let suffix_wide = suffix.contains('l') || suffix.contains('z');
    let decimal = radix == 10;

    let fits_int = magnitude <= i32::MAX as u64;
    let fits_uint = magnitude <= u64::from(u32::MAX);
    let fits_long = magnitude <= i64::MAX as u64;

    let (unsigned, wide) = if suffix_unsigned {
        (true, suffix_wide || !fits_uint)
    } else if !suffix_wide && fits_int {
        (false, false)
    } else if !suffix_wide && !decimal && fits_uint {
        (true, false)
    } else {
        (!fits_long, true)
    };

    let value = magnitude as i64;
    let value = if negative { value.wrapping_neg() } else { value };
    Some(Constant::typed(value, unsigned, wide))
}

/// Value of a character literal such as `'a'` or `'\n'`.
fn char_value(text: &str) -> Option<i64> {
    let open = text.find('\'')?;
    let body = text[open + 1..].strip_suffix('\'')?;
    let decoded = decode_escapes(body);

    let mut chars = decoded.chars();
    let first = chars.next()?;
    let value = chars.fold(u32::from(first) as i64, |value, ch| {
        (value << 8) | u32::from(ch) as i64
    });
    Some(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::ObsidianError;
    use crate::frontend::ParseOptions;

    struct Table(HashMap<&'static str, i64>);

    impl ConstantLookup for Table {
        fn constant(&self, name: &str) -> Option<i64> {
            self.0.get(name).copied()
        }

        fn size_of(&self, type_text: &str) -> Option<u64> {
            (type_text == "int").then_some(4)
        }
    }

    /// Evaluates each enumerator initializer of `source`.
    fn values(source: &str, table: &Table) -> Result<Vec<Result<i64, EvalError>>, ObsidianError> {
        let unit = TranslationUnit::from_source("eval.hpp", source, &ParseOptions::default())?;
        let mut stack = vec![unit.root()];
        let mut results = Vec::new();

        while let Some(node) = stack.pop() {
            if node.kind() == "enumerator" {
                if let Some(value) = node.child_by_field_name("value") {
                    results.push(evaluate(&unit, value, table));
                }
                continue;
            }
            let mut cursor = node.walk();
            let mut children: Vec<_> = node.named_children(&mut cursor).collect();
            children.reverse();
            stack.extend(children);
        }
        Ok(results)
    }

    #[test]
    fn parses_integer_literals() {
        assert_eq!(parse_integer_literal("42"), Some(42));
        assert_eq!(parse_integer_literal("0x1F"), Some(31));
        assert_eq!(parse_integer_literal("0XffU"), Some(255));
        assert_eq!(parse_integer_literal("017"), Some(15));
        assert_eq!(parse_integer_literal("0b1010"), Some(10));
        assert_eq!(parse_integer_literal("1'000'000ull"), Some(1_000_000));
        assert_eq!(parse_integer_literal("0"), Some(0));
        assert_eq!(parse_integer_literal("0xFFFFFFFFFFFFFFFF"), Some(-1));
        assert_eq!(parse_integer_literal("1.5"), None);
    }

    #[test]
    fn signed_literals_keep_their_sign() {
        assert_eq!(parse_integer_literal("-10"), Some(-10));
        assert_eq!(parse_integer_literal("+5"), Some(5));
        assert_eq!(parse_integer_literal("-0x10"), Some(-16));
        assert_eq!(parse_integer_literal("- 3"), Some(-3));
        assert_eq!(parse_integer_literal("-1u"), Some(0xFFFF_FFFF));
    }

    #[test]
    fn unsigned_arithmetic_wraps_at_its_width() -> Result<(), ObsidianError> {
        let table = Table(HashMap::new());
        let source = r#"
enum U : unsigned int {
    A = ~0u,
    B = 0xFFFFFFFF,
    C = ~0ul,
    D = 0u - 1,
    E = 1u << 31,
    F = -1 < 0u,
    G = 0xFFFFFFFFu / 2,
};
"#;
        let results: Vec<i64> = values(source, &table)?
            .into_iter()
            .map(|result| result.unwrap_or(i64::MIN))
            .collect();

        assert_eq!(
            results,
            vec![4_294_967_295, 4_294_967_295, -1, 4_294_967_295, 2_147_483_648, 0, 2_147_483_647]
        );
        Ok(())
    }

    #[test]
    fn evaluates_operators_and_references() -> Result<(), ObsidianError> {
        let table = Table(HashMap::from([("Base", 8), ("Other::Flag", 2)]));
        let source = r#"
enum E {
    A = -10,
    B = (1 << 4) | 0x3,
    C = Base * 2 - 1,
    D = Other::Flag + ~0,
    F = 'a',
    G = sizeof(int) > 2 ? 7 : 9,
    H = static_cast<int>(Base) / 3,
    I = !0 + (10 % 4),
};
"#;
        let results: Vec<i64> = values(source, &table)?
            .into_iter()
            .map(|result| result.unwrap_or(i64::MIN))
            .collect();

        assert_eq!(results, vec![-10, 19, 15, 1, 97, 7, 2, 3]);
        Ok(())
    }

    #[test]
    fn reports_unknown_names_and_division_by_zero() -> Result<(), ObsidianError> {
        let table = Table(HashMap::new());
        let results = values("enum E { A = Missing, B = 1 / 0 };", &table)?;

        assert_eq!(
            results,
            vec![
                Err(EvalError::UnknownIdentifier("Missing".to_string())),
                Err(EvalError::DivisionByZero),
            ]
        );
        Ok(())
    }
}
