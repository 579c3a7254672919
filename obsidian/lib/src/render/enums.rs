use std::collections::HashSet;

use crate::error::ObsidianError;
use crate::render::escape::string_literal;
use crate::render::skeleton::{ENUM_COLLECTION, ENUM_SPECIALIZATION};
use crate::render::template::{Bindings, fill};
use crate::render::{attribute_list, cpp_name};
use crate::shared::Enum;

/// The `Obs::Enum<E>` specialization for one enum.
pub fn specialization(item: &Enum) -> Result<String, ObsidianError> {
    let end_value = match item.constants.last() {
        Some(last) => format!(
            "static_cast<EnumType>(static_cast<UnderlyingType>(EnumType::{}) + 1)",
            last.name
        ),
        None => "static_cast<EnumType>(0)".to_string(),
    };

    let mut name_to_value = String::new();
    for constant in &item.constants {
        name_to_value.push_str(&format!(
            "        if (Detail::NameEquals(name, {})) return EnumType::{};\n",
            string_literal(&constant.name),
            constant.name
        ));
    }

    let mut value_to_name = String::new();
    let mut value_to_description = String::new();
    let mut seen = HashSet::new();
    // Duplicate case labels do not compile; the first name for a value wins.
    for constant in item.constants.iter().filter(|c| seen.insert(c.value)) {
        value_to_name.push_str(&format!(
            "            case EnumType::{}: return {};\n",
            constant.name,
            string_literal(&constant.name)
        ));
        value_to_description.push_str(&format!(
            "            case EnumType::{}: return {};\n",
            constant.name,
            string_literal(&constant.description)
        ));
    }

    let bindings = Bindings::new()
        .bind("cpp_name", cpp_name(&item.full_name))
        .bind("end_value", end_value)
        .bind("name", string_literal(&item.name))
        .bind("scope", string_literal(&item.scope))
        .bind("full_name", string_literal(&item.full_name))
        .bind("description", string_literal(&item.description))
        .bind("is_scoped", item.is_scoped.to_string())
        .bind("count", item.constants.len().to_string())
        .bind("name_to_value", name_to_value)
        .bind("value_to_name", value_to_name)
        .bind("value_to_description", value_to_description)
        .bind("attributes", attribute_list(&item.attributes));

    fill(ENUM_SPECIALIZATION, &bindings)
}

/// Constructor of `Obs::EnumCollection` listing every enum in order.
pub fn collection(enums: &[Enum]) -> Result<String, ObsidianError> {
    let entries: String = enums.iter().map(entry).collect();
    fill(ENUM_COLLECTION, &Bindings::new().bind("entries", entries))
}

fn entry(item: &Enum) -> String {
    let items = item
        .constants
        .iter()
        .map(|constant| {
            format!(
                "{{{}, {}, {}}}",
                string_literal(&constant.name),
                string_literal(&constant.description),
                item_value(constant.value, item.underlying_type_size)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let size = item
        .underlying_type_size
        .map_or_else(|| format!("sizeof({})", cpp_name(&item.full_name)), |size| size.to_string());

    format!(
        "        EnumEntry{{{}, {}, {}, {}, {}, {{{}}}, {{{}}}}},\n",
        string_literal(&item.name),
        string_literal(&item.scope),
        string_literal(&item.full_name),
        string_literal(&item.description),
        size,
        items,
        attribute_list(&item.attributes)
    )
}

/// A `std::uint64_t` literal holding `value`'s bit pattern at `width` bytes.
///
/// Negative values are masked to the underlying width, so `-10` in one byte
/// is `0xF6ull` and copies back out as `int8_t{-10}`.
pub fn item_value(value: i64, width: Option<u64>) -> String {
    if value >= 0 {
        return format!("{value}ull");
    }

    let bits = value as u64;
    match width {
        Some(8) => format!("0x{bits:X}ull"),
        Some(width @ (1 | 2 | 4)) => {
            let mask = (1u64 << (width * 8)) - 1;
            format!("0x{:X}ull", bits & mask)
        }
        _ if value == i64::MIN => {
            "static_cast<std::uint64_t>(-9223372036854775807LL - 1)".to_string()
        }
        _ => format!("static_cast<std::uint64_t>({value}LL)"),
    }
}
