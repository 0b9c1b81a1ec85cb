//! Structural equality of descriptors.
//!
//! Every comparison destructures its left-hand value without `..`, so adding a field to any
//! descriptor type is a compile error here until the field is compared. Sequences are compared in
//! order. Floats are compared by bit pattern, which keeps the relation reflexive for NaN.

use std::fmt;

use tracing::trace;

use super::*;

/// Compares two descriptors, including their provenance names.
pub(crate) fn file(a: &FileDescriptor, b: &FileDescriptor) -> bool {
    let FileDescriptor {
        name,
        syntax,
        package,
        imports,
        options,
        definitions,
    } = a;
    let path = ROOT;

    check(&path, "name", *name == b.name)
        && check(&path, "syntax", *syntax == b.syntax)
        && check(&path, "package", *package == b.package)
        && seq(&path, "imports", imports, &b.imports, import)
        && seq(&path, "options", options, &b.options, option)
        && seq(&path, "definitions", definitions, &b.definitions, definition)
}

fn import(a: &Import, b: &Import, path: &Path) -> bool {
    let Import { path: import_path, kind } = a;

    check(path, "path", *import_path == b.path) && check(path, "kind", *kind == b.kind)
}

fn definition(a: &Definition, b: &Definition, path: &Path) -> bool {
    match (a, b) {
        (Definition::Message(a), Definition::Message(b)) => message(a, b, path),
        (Definition::Enum(a), Definition::Enum(b)) => enumeration(a, b, path),
        (Definition::Service(a), Definition::Service(b)) => service(a, b, path),
        (Definition::Message(_) | Definition::Enum(_) | Definition::Service(_), _) => {
            differ(path, "kind")
        }
    }
}

fn nested(a: &NestedDefinition, b: &NestedDefinition, path: &Path) -> bool {
    match (a, b) {
        (NestedDefinition::Message(a), NestedDefinition::Message(b)) => message(a, b, path),
        (NestedDefinition::Enum(a), NestedDefinition::Enum(b)) => enumeration(a, b, path),
        (NestedDefinition::Message(_) | NestedDefinition::Enum(_), _) => differ(path, "kind"),
    }
}

fn message(a: &MessageDescriptor, b: &MessageDescriptor, path: &Path) -> bool {
    let MessageDescriptor {
        name,
        fields,
        oneofs,
        nested: nested_definitions,
        options,
        reserved: reserved_items,
    } = a;

    check(path, "name", *name == b.name)
        && seq(path, "fields", fields, &b.fields, field)
        && seq(path, "oneofs", oneofs, &b.oneofs, oneof)
        && seq(path, "nested", nested_definitions, &b.nested, nested)
        && seq(path, "options", options, &b.options, option)
        && seq(path, "reserved", reserved_items, &b.reserved, reserved)
}

fn field(a: &FieldDescriptor, b: &FieldDescriptor, path: &Path) -> bool {
    let FieldDescriptor {
        name,
        number,
        label,
        ty,
        proto3_optional,
        default_value,
        options,
        oneof_index,
    } = a;

    check(path, "name", *name == b.name)
        && check(path, "number", *number == b.number)
        && check(path, "label", *label == b.label)
        && check(path, "type", field_type(ty, &b.ty))
        && check(path, "proto3_optional", *proto3_optional == b.proto3_optional)
        && check(
            path,
            "default_value",
            match (default_value, &b.default_value) {
                (Some(a), Some(b)) => value(a, b),
                (None, None) => true,
                (Some(_) | None, _) => false,
            },
        )
        && seq(path, "options", options, &b.options, option)
        && check(path, "oneof_index", *oneof_index == b.oneof_index)
}

fn field_type(a: &FieldType, b: &FieldType) -> bool {
    match (a, b) {
        (FieldType::Scalar(a), FieldType::Scalar(b)) => a == b,
        (FieldType::Named(a), FieldType::Named(b)) => type_ref(a, b),
        (
            FieldType::Map { key, value },
            FieldType::Map {
                key: other_key,
                value: other_value,
            },
        ) => key == other_key && field_type(value, other_value),
        (FieldType::Scalar(_) | FieldType::Named(_) | FieldType::Map { .. }, _) => false,
    }
}

fn type_ref(a: &TypeRef, b: &TypeRef) -> bool {
    match (a, b) {
        (TypeRef::Message(a), TypeRef::Message(b))
        | (TypeRef::Enum(a), TypeRef::Enum(b))
        | (TypeRef::Unresolved(a), TypeRef::Unresolved(b)) => a == b,
        (TypeRef::Message(_) | TypeRef::Enum(_) | TypeRef::Unresolved(_), _) => false,
    }
}

fn oneof(a: &OneofDescriptor, b: &OneofDescriptor, path: &Path) -> bool {
    let OneofDescriptor { name, options } = a;

    check(path, "name", *name == b.name) && seq(path, "options", options, &b.options, option)
}

fn enumeration(a: &EnumDescriptor, b: &EnumDescriptor, path: &Path) -> bool {
    let EnumDescriptor {
        name,
        values,
        options,
        reserved: reserved_items,
    } = a;

    check(path, "name", *name == b.name)
        && seq(path, "values", values, &b.values, enum_value)
        && seq(path, "options", options, &b.options, option)
        && seq(path, "reserved", reserved_items, &b.reserved, reserved)
}

fn enum_value(a: &EnumValueDescriptor, b: &EnumValueDescriptor, path: &Path) -> bool {
    let EnumValueDescriptor {
        name,
        number,
        options,
    } = a;

    check(path, "name", *name == b.name)
        && check(path, "number", *number == b.number)
        && seq(path, "options", options, &b.options, option)
}

fn reserved(a: &Reserved, b: &Reserved, path: &Path) -> bool {
    let equal = match (a, b) {
        (
            Reserved::Range { start, end },
            Reserved::Range {
                start: other_start,
                end: other_end,
            },
        ) => start == other_start && end == other_end,
        (Reserved::Name(a), Reserved::Name(b)) => a == b,
        (Reserved::Range { .. } | Reserved::Name(_), _) => false,
    };
    equal || differ(path, "value")
}

fn service(a: &ServiceDescriptor, b: &ServiceDescriptor, path: &Path) -> bool {
    let ServiceDescriptor {
        name,
        methods,
        options,
    } = a;

    check(path, "name", *name == b.name)
        && seq(path, "methods", methods, &b.methods, method)
        && seq(path, "options", options, &b.options, option)
}

fn method(a: &MethodDescriptor, b: &MethodDescriptor, path: &Path) -> bool {
    let MethodDescriptor {
        name,
        input_type,
        output_type,
        client_streaming,
        server_streaming,
        options,
    } = a;

    check(path, "name", *name == b.name)
        && check(path, "input_type", type_ref(input_type, &b.input_type))
        && check(path, "output_type", type_ref(output_type, &b.output_type))
        && check(
            path,
            "client_streaming",
            *client_streaming == b.client_streaming,
        )
        && check(
            path,
            "server_streaming",
            *server_streaming == b.server_streaming,
        )
        && seq(path, "options", options, &b.options, option)
}

fn option(a: &OptionDescriptor, b: &OptionDescriptor, path: &Path) -> bool {
    let OptionDescriptor { name, value: v } = a;

    let names_equal = name.len() == b.name.len()
        && name.iter().zip(&b.name).all(|(a, b)| {
            let OptionNamePart { name, is_extension } = a;
            *name == b.name && *is_extension == b.is_extension
        });

    check(path, "name", names_equal) && check(path, "value", value(v, &b.value))
}

fn value(a: &OptionValue, b: &OptionValue) -> bool {
    match (a, b) {
        (OptionValue::Ident(a), OptionValue::Ident(b)) => a == b,
        (OptionValue::Int(a), OptionValue::Int(b)) => a == b,
        (OptionValue::Float(a), OptionValue::Float(b)) => a.to_bits() == b.to_bits(),
        (OptionValue::String(a), OptionValue::String(b)) => a == b,
        (
            OptionValue::Ident(_)
            | OptionValue::Int(_)
            | OptionValue::Float(_)
            | OptionValue::String(_),
            _,
        ) => false,
    }
}

fn seq<T>(
    path: &Path,
    name: &'static str,
    a: &[T],
    b: &[T],
    eq: fn(&T, &T, &Path) -> bool,
) -> bool {
    let path = path.field(name);
    if a.len() != b.len() {
        return differ(&path, "length");
    }

    a.iter()
        .zip(b)
        .enumerate()
        .all(|(index, (a, b))| eq(a, b, &path.index(index)))
}

fn check(path: &Path, name: &'static str, equal: bool) -> bool {
    equal || differ(&path.field(name), "value")
}

fn differ(path: &Path, what: &'static str) -> bool {
    trace!(%path, what, "descriptors differ");
    false
}

/// The location of a value within a descriptor, used when logging the first difference found.
#[derive(Clone, Copy)]
struct Path<'a> {
    parent: Option<&'a Path<'a>>,
    segment: Segment,
}

#[derive(Clone, Copy)]
enum Segment {
    Root,
    Field(&'static str),
    Index(usize),
}

const ROOT: Path<'static> = Path {
    parent: None,
    segment: Segment::Root,
};

impl<'a> Path<'a> {
    fn field(&'a self, name: &'static str) -> Path<'a> {
        Path {
            parent: Some(self),
            segment: Segment::Field(name),
        }
    }

    fn index(&'a self, index: usize) -> Path<'a> {
        Path {
            parent: Some(self),
            segment: Segment::Index(index),
        }
    }
}

impl<'a> fmt::Display for Path<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = self.parent {
            write!(f, "{}", parent)?;
        }
        match self.segment {
            Segment::Root => f.write_str("file"),
            Segment::Field(name) => write!(f, ".{}", name),
            Segment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

macro_rules! impl_partial_eq {
    ($($ty:ty => $eq:expr,)*) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    $eq(self, other)
                }
            }
        )*
    };
}

impl_partial_eq! {
    FileDescriptor => file,
    MessageDescriptor => |a, b| message(a, b, &ROOT),
    FieldDescriptor => |a, b| field(a, b, &ROOT),
    EnumDescriptor => |a, b| enumeration(a, b, &ROOT),
    ServiceDescriptor => |a, b| service(a, b, &ROOT),
    FieldType => field_type,
    TypeRef => type_ref,
    OptionValue => value,
}
