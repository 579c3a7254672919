//! Fixed C++ text the generator fills in. Placeholders are `__lowercase__`.

pub const BANNER: &str = "// Generated by obsidian. Do not edit.\n";

/// Shared preamble: descriptor types, accessors and the primary templates.
pub const CORE: &str = r#"#include <cstddef>
#include <cstdint>
#include <cstring>
#include <string>
#include <type_traits>
#include <vector>

namespace Obs
{

struct Attribute
{
    const char* name;
    const char* value;
};

enum class PropertyKind
{
    TriviallyCopyable,
    Text,
    Composite,
};

namespace Detail
{

template <typename T>
struct AlwaysFalse : std::false_type
{
};

inline bool NameEquals(const char* lhs, const char* rhs)
{
    return lhs != nullptr && rhs != nullptr && std::strcmp(lhs, rhs) == 0;
}

inline const Attribute* FindAttribute(const std::vector<Attribute>& attributes, const char* name)
{
    for (const Attribute& attribute : attributes)
    {
        if (NameEquals(attribute.name, name))
        {
            return &attribute;
        }
    }
    return nullptr;
}

inline const char* AttributeValue(const std::vector<Attribute>& attributes, const char* name)
{
    const Attribute* attribute = FindAttribute(attributes, name);
    return attribute == nullptr ? nullptr : attribute->value;
}

template <std::size_t Offset, std::size_t Size>
void ReadBytes(const void* object, void* out)
{
    std::memcpy(out, static_cast<const unsigned char*>(object) + Offset, Size);
}

template <std::size_t Offset, std::size_t Size>
void WriteBytes(void* object, const void* value)
{
    std::memcpy(static_cast<unsigned char*>(object) + Offset, value, Size);
}

template <typename Owner, typename Member, Member Owner::*Field>
void ReadAssign(const void* object, void* out)
{
    *static_cast<std::remove_cv_t<Member>*>(out) = static_cast<const Owner*>(object)->*Field;
}

template <typename Owner, typename Member, Member Owner::*Field>
void WriteAssign(void* object, const void* value)
{
    static_cast<Owner*>(object)->*Field = *static_cast<const Member*>(value);
}

template <typename Owner, typename Member, Member Owner::*Field>
constexpr auto AssignReader() -> void (*)(const void*, void*)
{
    if constexpr (std::is_copy_assignable_v<std::remove_cv_t<Member>>)
    {
        return &ReadAssign<Owner, Member, Field>;
    }
    else
    {
        return nullptr;
    }
}

template <typename Owner, typename Member, Member Owner::*Field>
constexpr auto AssignWriter() -> void (*)(void*, const void*)
{
    if constexpr (!std::is_const_v<Member> && std::is_copy_assignable_v<Member>)
    {
        return &WriteAssign<Owner, Member, Field>;
    }
    else
    {
        return nullptr;
    }
}

inline bool CopyUnderlying(std::uint64_t value, std::size_t width, void* out)
{
    switch (width)
    {
        case 1:
        {
            const std::uint8_t narrow = static_cast<std::uint8_t>(value);
            std::memcpy(out, &narrow, sizeof(narrow));
            return true;
        }
        case 2:
        {
            const std::uint16_t narrow = static_cast<std::uint16_t>(value);
            std::memcpy(out, &narrow, sizeof(narrow));
            return true;
        }
        case 4:
        {
            const std::uint32_t narrow = static_cast<std::uint32_t>(value);
            std::memcpy(out, &narrow, sizeof(narrow));
            return true;
        }
        case 8:
            std::memcpy(out, &value, sizeof(value));
            return true;
        default:
            return false;
    }
}

} // namespace Detail

struct Property
{
    const char* name;
    const char* description;
    const char* type_name;
    PropertyKind kind;
    bool is_trivially_copyable;
    std::size_t offset;
    std::size_t size;
    void (*read)(const void* object, void* out);
    void (*write)(void* object, const void* value);
    std::vector<Attribute> attributes;

    bool HasAttribute(const char* attribute_name) const { return Detail::FindAttribute(attributes, attribute_name) != nullptr; }
    const char* GetAttributeValue(const char* attribute_name) const { return Detail::AttributeValue(attributes, attribute_name); }
};

namespace Detail
{

inline const Property* FindProperty(const std::vector<Property>& properties, const char* name)
{
    for (const Property& property : properties)
    {
        if (NameEquals(property.name, name))
        {
            return &property;
        }
    }
    return nullptr;
}

inline bool ReadProperty(const Property* property, const void* object, void* out)
{
    if (property == nullptr || property->read == nullptr || object == nullptr || out == nullptr)
    {
        return false;
    }
    property->read(object, out);
    return true;
}

inline bool WriteProperty(const Property* property, void* object, const void* value)
{
    if (property == nullptr || property->write == nullptr || object == nullptr || value == nullptr)
    {
        return false;
    }
    property->write(object, value);
    return true;
}

} // namespace Detail

template <typename T>
struct Enum
{
    static_assert(Detail::AlwaysFalse<T>::value, "Obs::Enum<T>: this enum has no reflection data");
};

template <typename T>
struct Class
{
    static_assert(Detail::AlwaysFalse<T>::value, "Obs::Class<T>: this class has no reflection data");
};

struct EnumItem
{
    const char* name;
    const char* description;
    std::uint64_t value;
};

struct EnumEntry
{
    const char* name;
    const char* scope;
    const char* full_name;
    const char* description;
    std::size_t underlying_type_size;
    std::vector<EnumItem> items;
    std::vector<Attribute> attributes;

    const EnumItem* FindItem(const char* item_name) const
    {
        for (const EnumItem& item : items)
        {
            if (Detail::NameEquals(item.name, item_name))
            {
                return &item;
            }
        }
        return nullptr;
    }

    bool HasAttribute(const char* attribute_name) const { return Detail::FindAttribute(attributes, attribute_name) != nullptr; }
    const char* GetAttributeValue(const char* attribute_name) const { return Detail::AttributeValue(attributes, attribute_name); }
};

/// Every reflected enum. Construct once and pass by const reference.
class EnumCollection
{
public:
    EnumCollection();

    const std::vector<EnumEntry>& GetEntries() const { return m_entries; }

    const EnumEntry* GetEnum(const char* enum_name) const
    {
        for (const EnumEntry& entry : m_entries)
        {
            if (Detail::NameEquals(entry.name, enum_name) || Detail::NameEquals(entry.full_name, enum_name))
            {
                return &entry;
            }
        }
        return nullptr;
    }

    bool GetValue(void* out, const char* enum_name, const char* item_name) const
    {
        if (out == nullptr)
        {
            return false;
        }
        const EnumEntry* entry = GetEnum(enum_name);
        if (entry == nullptr)
        {
            return false;
        }
        const EnumItem* item = entry->FindItem(item_name);
        if (item == nullptr)
        {
            return false;
        }
        return Detail::CopyUnderlying(item->value, entry->underlying_type_size, out);
    }

private:
    std::vector<EnumEntry> m_entries;
};

struct ClassEntry
{
    const char* name;
    const char* scope;
    const char* full_name;
    const char* description;
    bool is_struct;
    std::size_t size;
    std::size_t alignment;
    std::vector<Property> properties;
    std::vector<Attribute> attributes;

    const Property* FindProperty(const char* property_name) const { return Detail::FindProperty(properties, property_name); }
    bool HasAttribute(const char* attribute_name) const { return Detail::FindAttribute(attributes, attribute_name) != nullptr; }
    const char* GetAttributeValue(const char* attribute_name) const { return Detail::AttributeValue(attributes, attribute_name); }
};

/// Every reflected class. Construct once and pass by const reference.
class ClassCollection
{
public:
    ClassCollection();

    const std::vector<ClassEntry>& GetEntries() const { return m_entries; }

    const ClassEntry* GetClass(const char* class_name) const
    {
        for (const ClassEntry& entry : m_entries)
        {
            if (Detail::NameEquals(entry.name, class_name) || Detail::NameEquals(entry.full_name, class_name))
            {
                return &entry;
            }
        }
        return nullptr;
    }

    const Property* GetProperty(const char* class_name, const char* property_name) const
    {
        const ClassEntry* entry = GetClass(class_name);
        return entry == nullptr ? nullptr : entry->FindProperty(property_name);
    }

    bool Read(const char* class_name, const char* property_name, const void* object, void* out) const
    {
        return Detail::ReadProperty(GetProperty(class_name, property_name), object, out);
    }

    bool Write(const char* class_name, const char* property_name, void* object, const void* value) const
    {
        return Detail::WriteProperty(GetProperty(class_name, property_name), object, value);
    }

private:
    std::vector<ClassEntry> m_entries;
};

} // namespace Obs
"#;

pub const ENUM_SPECIALIZATION: &str = r#"template <>
struct Enum<__cpp_name__>
{
    using EnumType = __cpp_name__;
    using UnderlyingType = std::underlying_type_t<EnumType>;

    static constexpr EnumType k_end = __end_value__;

    static constexpr const char* GetName() { return __name__; }
    static constexpr const char* GetScope() { return __scope__; }
    static constexpr const char* GetFullName() { return __full_name__; }
    static constexpr const char* GetDescription() { return __description__; }
    static constexpr bool IsScoped() { return __is_scoped__; }
    static constexpr std::size_t GetCount() { return __count__; }

    static constexpr UnderlyingType GetUnderlyingValue(EnumType value)
    {
        return static_cast<UnderlyingType>(value);
    }

    template <typename Integral, typename = std::enable_if_t<std::is_integral_v<Integral>>>
    static constexpr EnumType GetValue(Integral value)
    {
        return static_cast<EnumType>(value);
    }

    static EnumType GetValue(const char* name)
    {
__name_to_value__        return k_end;
    }

    static const char* GetValueName(EnumType value)
    {
        switch (value)
        {
__value_to_name__            default: return nullptr;
        }
    }

    static const char* GetValueDescription(EnumType value)
    {
        switch (value)
        {
__value_to_description__            default: return nullptr;
        }
    }

    static const std::vector<Attribute>& GetAttributes()
    {
        static const std::vector<Attribute> s_attributes = {__attributes__};
        return s_attributes;
    }

    static bool HasAttribute(const char* name) { return Detail::FindAttribute(GetAttributes(), name) != nullptr; }
    static const char* GetAttributeValue(const char* name) { return Detail::AttributeValue(GetAttributes(), name); }
};
"#;

pub const CLASS_SPECIALIZATION: &str = r#"template <>
struct Class<__cpp_name__>
{
    using ClassType = __cpp_name__;

__static_asserts__
    static constexpr const char* GetName() { return __name__; }
    static constexpr const char* GetScope() { return __scope__; }
    static constexpr const char* GetFullName() { return __full_name__; }
    static constexpr const char* GetDescription() { return __description__; }
    static constexpr bool IsStruct() { return __is_struct__; }

    static const std::vector<Property>& GetProperties()
    {
        static const std::vector<Property> s_properties = {
__properties__        };
        return s_properties;
    }

    static const Property* GetProperty(const char* name)
    {
        return Detail::FindProperty(GetProperties(), name);
    }

    static bool Read(const ClassType* object, const char* name, void* out)
    {
        return Detail::ReadProperty(GetProperty(name), object, out);
    }

    static bool Write(ClassType* object, const char* name, const void* value)
    {
        return Detail::WriteProperty(GetProperty(name), object, value);
    }

    static const std::vector<Attribute>& GetAttributes()
    {
        static const std::vector<Attribute> s_attributes = {__attributes__};
        return s_attributes;
    }

    static bool HasAttribute(const char* name) { return Detail::FindAttribute(GetAttributes(), name) != nullptr; }
    static const char* GetAttributeValue(const char* name) { return Detail::AttributeValue(GetAttributes(), name); }
};
"#;

pub const ENUM_COLLECTION: &str = r#"inline EnumCollection::EnumCollection()
    : m_entries{
__entries__      }
{
}
"#;

pub const CLASS_COLLECTION: &str = r#"inline ClassCollection::ClassCollection()
    : m_entries{
__entries__      }
{
}
"#;

/// `reflection.hpp` in single-header mode.
pub const SINGLE_HEADER: &str = r#"__banner__
#pragma once

__core__
__includes__
namespace Obs
{

__specializations__
__collections__
} // namespace Obs
"#;

/// `reflection-core.hpp` in per-type mode.
pub const CORE_HEADER: &str = r#"__banner__
#pragma once

__core__"#;

/// One `refl-*.hpp` in per-type mode.
pub const TYPE_HEADER: &str = r#"__banner__
#pragma once

#include "__core_header__"
__includes__
namespace Obs
{

__specializations__
} // namespace Obs
"#;

/// `reflection.hpp` in per-type mode: every type header plus the collections.
pub const COLLECTION_HEADER: &str = r#"__banner__
#pragma once

__includes__
namespace Obs
{

__collections__
} // namespace Obs
"#;

pub const MARKER_HEADER: &str = r#"// Generated by obsidian. Do not edit.
//
// Annotation markers read by the generator. They expand to nothing, so
// annotated headers compile whether or not reflection code is generated.

#pragma once

#define OBS_ENUM(...)
#define OBS_CLASS(...)
#define OBS_PROP(...)
"#;
