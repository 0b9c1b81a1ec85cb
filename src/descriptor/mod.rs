//! The structural, provenance-free representation of a protobuf file used for comparison.
//!
//! Descriptors keep the declaration order of every construct. Spans, comments and the lexical
//! form of literals are discarded, so two files that differ only in formatting lower to equal
//! descriptors.

mod build;
mod eq;
mod proto;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::fmt::{Float, Quoted};

pub(crate) use self::build::build;

/// A lowered protobuf source file.
#[derive(Clone, Debug)]
pub struct FileDescriptor {
    /// The logical name of the source unit. This is provenance only and is overwritten by
    /// [`FileDescriptor::normalize`].
    pub name: String,
    /// The declared syntax, or proto2 if the file has no `syntax` statement.
    pub syntax: Syntax,
    /// The package name, without a leading dot.
    pub package: Option<String>,
    /// Imports in declaration order.
    pub imports: Vec<Import>,
    /// File-level options in declaration order.
    pub options: Vec<OptionDescriptor>,
    /// Top-level messages, enums and services in declaration order.
    pub definitions: Vec<Definition>,
}

/// The syntax version of a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Syntax {
    /// `syntax = "proto2";`, also the default when no syntax is declared.
    Proto2,
    /// `syntax = "proto3";`
    Proto3,
}

/// An `import` statement.
#[derive(Clone, Debug)]
pub struct Import {
    /// The imported path, as written.
    pub path: String,
    /// The import modifier.
    pub kind: ImportKind,
}

/// The modifier of an `import` statement.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportKind {
    /// A plain `import`.
    Default,
    /// `import weak`.
    Weak,
    /// `import public`.
    Public,
}

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Definition {
    /// A message.
    Message(MessageDescriptor),
    /// An enum.
    Enum(EnumDescriptor),
    /// A service.
    Service(ServiceDescriptor),
}

/// A message or enum declared inside a message body.
#[derive(Clone, Debug)]
pub enum NestedDefinition {
    /// A nested message.
    Message(MessageDescriptor),
    /// A nested enum.
    Enum(EnumDescriptor),
}

/// A message definition.
#[derive(Clone, Debug)]
pub struct MessageDescriptor {
    /// The unqualified message name.
    pub name: String,
    /// Fields in declaration order, including the members of oneofs.
    pub fields: Vec<FieldDescriptor>,
    /// Oneofs in declaration order.
    pub oneofs: Vec<OneofDescriptor>,
    /// Nested messages and enums in declaration order.
    pub nested: Vec<NestedDefinition>,
    /// Message-level options.
    pub options: Vec<OptionDescriptor>,
    /// Reserved numbers and names, flattened across `reserved` statements.
    pub reserved: Vec<Reserved>,
}

/// A message field, including map fields and oneof members.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// The field name.
    pub name: String,
    /// The field number.
    pub number: u32,
    /// The field label. Fields declared without one are [`Label::Optional`].
    pub label: Label,
    /// The field type.
    pub ty: FieldType,
    /// Set for proto3 fields explicitly marked `optional`.
    pub proto3_optional: bool,
    /// The value of the `default` pseudo-option. It does not appear in `options`.
    pub default_value: Option<OptionValue>,
    /// Field options other than `default`.
    pub options: Vec<OptionDescriptor>,
    /// Index into [`MessageDescriptor::oneofs`] of the oneof containing this field.
    pub oneof_index: Option<usize>,
}

/// The cardinality of a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Label {
    /// `optional`, or no label.
    Optional,
    /// `required`, only valid in proto2.
    Required,
    /// Also used for map fields.
    Repeated,
}

/// The type of a field.
#[derive(Clone, Debug)]
pub enum FieldType {
    /// A built-in scalar type.
    Scalar(ScalarType),
    /// A message or enum type.
    Named(TypeRef),
    /// A `map<K, V>` field.
    Map {
        /// The key type. Only integral types, `bool` and `string` are valid keys.
        key: ScalarType,
        /// The value type. This is never another map.
        value: Box<FieldType>,
    },
}

/// The built-in scalar types.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

/// A reference to a named type.
///
/// Resolved references hold the fully qualified name with a leading dot. Names that do not refer
/// to a definition in the same file are kept exactly as written.
#[derive(Clone, Debug)]
pub enum TypeRef {
    /// A message defined in this file.
    Message(String),
    /// An enum defined in this file.
    Enum(String),
    /// A name that could not be resolved, typically one defined in an imported file.
    Unresolved(String),
}

/// A `oneof` declaration. Its fields are stored in [`MessageDescriptor::fields`].
#[derive(Clone, Debug)]
pub struct OneofDescriptor {
    /// The oneof name.
    pub name: String,
    /// Options declared inside the oneof body.
    pub options: Vec<OptionDescriptor>,
}

/// An enum definition.
#[derive(Clone, Debug)]
pub struct EnumDescriptor {
    /// The unqualified enum name.
    pub name: String,
    /// Values in declaration order.
    pub values: Vec<EnumValueDescriptor>,
    /// Enum-level options.
    pub options: Vec<OptionDescriptor>,
    /// Reserved numbers and names.
    pub reserved: Vec<Reserved>,
}

/// A value of an enum.
#[derive(Clone, Debug)]
pub struct EnumValueDescriptor {
    /// The value name.
    pub name: String,
    /// The numeric value.
    pub number: i32,
    /// Options from the value's `[...]` list.
    pub options: Vec<OptionDescriptor>,
}

/// A reserved field number range or name. Ranges are inclusive, and `max` is replaced with the
/// largest valid number.
#[derive(Clone, Debug)]
pub enum Reserved {
    /// An inclusive range of numbers.
    Range {
        /// The first reserved number.
        start: i32,
        /// The last reserved number.
        end: i32,
    },
    /// A reserved field or value name.
    Name(String),
}

/// A service definition.
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    /// The unqualified service name.
    pub name: String,
    /// The rpcs of the service, in declaration order.
    pub methods: Vec<MethodDescriptor>,
    /// Service-level options.
    pub options: Vec<OptionDescriptor>,
}

/// An `rpc` declaration.
#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    /// The method name.
    pub name: String,
    /// The request type.
    pub input_type: TypeRef,
    /// The response type.
    pub output_type: TypeRef,
    /// True if the request is marked `stream`.
    pub client_streaming: bool,
    /// True if the response is marked `stream`.
    pub server_streaming: bool,
    /// Options declared in the rpc body.
    pub options: Vec<OptionDescriptor>,
}

/// An option assignment, such as `option java_package = "foo";` or `[deprecated = true]`.
#[derive(Clone, Debug)]
pub struct OptionDescriptor {
    /// The dotted option name.
    pub name: Vec<OptionNamePart>,
    /// The assigned value.
    pub value: OptionValue,
}

/// One dot-separated component of an option name.
#[derive(Clone, Debug)]
pub struct OptionNamePart {
    /// The name, without parentheses.
    pub name: String,
    /// True for parenthesized extension names such as `(foo.bar)`.
    pub is_extension: bool,
}

/// The value of an option.
///
/// Integers are stored by value, so `0x10` and `16` are the same.
#[derive(Clone, Debug)]
pub enum OptionValue {
    /// An identifier such as `true` or an enum value name, possibly dotted.
    Ident(String),
    /// A signed integer.
    Int(i128),
    /// A float, including `-inf` and `-nan`.
    Float(f64),
    /// A string literal, after escapes are processed.
    String(Vec<u8>),
}

impl FileDescriptor {
    /// Returns a copy of this descriptor with its provenance name replaced by `placeholder`.
    ///
    /// Every other field is left untouched, so two descriptors built from different source names
    /// compare equal after normalization exactly when their content is equal.
    pub fn normalize(&self, placeholder: &str) -> FileDescriptor {
        FileDescriptor {
            name: placeholder.to_owned(),
            ..self.clone()
        }
    }

    /// Iterates over the messages declared at the top level of this file.
    pub fn messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Message(message) => Some(message),
            _ => None,
        })
    }

    /// Iterates over the enums declared at the top level of this file.
    pub fn enums(&self) -> impl Iterator<Item = &EnumDescriptor> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Enum(enm) => Some(enm),
            _ => None,
        })
    }

    /// Iterates over the services declared in this file.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.definitions.iter().filter_map(|definition| match definition {
            Definition::Service(service) => Some(service),
            _ => None,
        })
    }
}

impl MessageDescriptor {
    /// Gets a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl Syntax {
    /// The value of the `syntax` statement, such as `"proto3"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

impl ScalarType {
    /// The keyword for this type in protobuf source.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint32 => "uint32",
            ScalarType::Uint64 => "uint64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Bool => "bool",
            ScalarType::String => "string",
            ScalarType::Bytes => "bytes",
        }
    }
}

impl TypeRef {
    /// The referenced name, fully qualified if it was resolved.
    pub fn name(&self) -> &str {
        match self {
            TypeRef::Message(name) | TypeRef::Enum(name) | TypeRef::Unresolved(name) => name,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(scalar) => f.write_str(scalar.as_str()),
            FieldType::Named(ty) => f.write_str(ty.name()),
            FieldType::Map { key, value } => write!(f, "map<{}, {}>", key.as_str(), value),
        }
    }
}

impl fmt::Display for OptionNamePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extension {
            write!(f, "({})", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

impl fmt::Display for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.name.iter().enumerate() {
            if index != 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, " = {}", self.value)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Ident(ident) => f.write_str(ident),
            OptionValue::Int(int) => write!(f, "{}", int),
            OptionValue::Float(float) => write!(f, "{}", Float(*float)),
            OptionValue::String(string) => write!(f, "{}", Quoted(string)),
        }
    }
}
