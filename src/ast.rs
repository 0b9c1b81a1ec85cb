//! The concrete syntax tree produced by the parser.
//!
//! Every node owns its children and carries the span of the source text it was parsed from. Spans
//! are used for error reporting only and take no part in comparisons of the lowered descriptor.

use std::{fmt, ops::Range};

use logos::Span;

/// A parsed protobuf source file.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    pub(crate) name: std::string::String,
    pub(crate) syntax: Syntax,
    pub(crate) syntax_span: std::option::Option<Span>,
    pub(crate) package: std::option::Option<Package>,
    pub(crate) imports: Vec<Import>,
    pub(crate) options: Vec<Option>,
    pub(crate) definitions: Vec<Definition>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Syntax {
    Proto2,
    Proto3,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Ident {
    pub value: std::string::String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FullIdent {
    pub parts: Vec<Ident>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TypeName {
    pub leading_dot: std::option::Option<Span>,
    pub name: FullIdent,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Int {
    pub negative: bool,
    pub value: u64,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Float {
    pub value: f64,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct String {
    pub value: Vec<u8>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Constant {
    FullIdent(FullIdent),
    Int(Int),
    Float(Float),
    String(String),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Package {
    pub name: FullIdent,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Import {
    pub kind: std::option::Option<ImportKind>,
    pub value: std::string::String,
    pub value_span: Span,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ImportKind {
    Weak,
    Public,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Option {
    pub body: OptionBody,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OptionBody {
    pub name: Vec<OptionNamePart>,
    pub value: Constant,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OptionNamePart {
    Ident(Ident),
    Extension(TypeName, Span),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Definition {
    Message(Message),
    Enum(Enum),
    Service(Service),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Message {
    pub name: Ident,
    pub body: MessageBody,
    pub span: Span,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MessageBody {
    pub items: Vec<MessageItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MessageItem {
    Field(Field),
    Map(Map),
    Oneof(Oneof),
    Message(Message),
    Enum(Enum),
    Option(Option),
    Reserved(Reserved),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Field {
    pub label: std::option::Option<FieldLabel>,
    pub ty: Ty,
    pub name: Ident,
    pub number: Int,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FieldLabel {
    Optional,
    Required,
    Repeated,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Ty {
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
    Named(TypeName),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum KeyTy {
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
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Map {
    pub key_ty: KeyTy,
    pub ty: Ty,
    pub name: Ident,
    pub number: Int,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Oneof {
    pub name: Ident,
    pub items: Vec<OneofItem>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OneofItem {
    Field(Field),
    Option(Option),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reserved {
    pub kind: ReservedKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ReservedKind {
    Ranges(Vec<ReservedRange>),
    Names(Vec<Ident>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ReservedRange {
    pub start: Int,
    pub end: ReservedRangeEnd,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ReservedRangeEnd {
    None,
    Int(Int),
    Max,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Enum {
    pub name: Ident,
    pub items: Vec<EnumItem>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EnumItem {
    Value(EnumValue),
    Option(Option),
    Reserved(Reserved),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EnumValue {
    pub name: Ident,
    pub value: Int,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Service {
    pub name: Ident,
    pub items: Vec<ServiceItem>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ServiceItem {
    Method(Method),
    Option(Option),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Method {
    pub name: Ident,
    pub input_ty: TypeName,
    pub output_ty: TypeName,
    pub is_client_streaming: bool,
    pub is_server_streaming: bool,
    pub options: Vec<Option>,
    pub span: Span,
}

impl File {
    /// Returns the logical name this file was parsed with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Ident {
    pub fn new(value: impl Into<std::string::String>, span: Range<usize>) -> Self {
        Ident {
            span,
            value: value.into(),
        }
    }
}

impl From<Ident> for FullIdent {
    fn from(value: Ident) -> Self {
        FullIdent { parts: vec![value] }
    }
}

impl From<Vec<Ident>> for FullIdent {
    fn from(parts: Vec<Ident>) -> Self {
        debug_assert!(!parts.is_empty());
        FullIdent { parts }
    }
}

impl Ty {
    pub fn as_str(&self) -> std::option::Option<&'static str> {
        match self {
            Ty::Double => Some("double"),
            Ty::Float => Some("float"),
            Ty::Int32 => Some("int32"),
            Ty::Int64 => Some("int64"),
            Ty::Uint32 => Some("uint32"),
            Ty::Uint64 => Some("uint64"),
            Ty::Sint32 => Some("sint32"),
            Ty::Sint64 => Some("sint64"),
            Ty::Fixed32 => Some("fixed32"),
            Ty::Fixed64 => Some("fixed64"),
            Ty::Sfixed32 => Some("sfixed32"),
            Ty::Sfixed64 => Some("sfixed64"),
            Ty::Bool => Some("bool"),
            Ty::String => Some("string"),
            Ty::Bytes => Some("bytes"),
            Ty::Named(_) => None,
        }
    }
}

impl KeyTy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyTy::Int32 => "int32",
            KeyTy::Int64 => "int64",
            KeyTy::Uint32 => "uint32",
            KeyTy::Uint64 => "uint64",
            KeyTy::Sint32 => "sint32",
            KeyTy::Sint64 => "sint64",
            KeyTy::Fixed32 => "fixed32",
            KeyTy::Fixed64 => "fixed64",
            KeyTy::Sfixed32 => "sfixed32",
            KeyTy::Sfixed64 => "sfixed64",
            KeyTy::Bool => "bool",
            KeyTy::String => "string",
        }
    }
}

impl FieldLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldLabel::Optional => "optional",
            FieldLabel::Required => "required",
            FieldLabel::Repeated => "repeated",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Proto2 => write!(f, "proto2"),
            Syntax::Proto3 => write!(f, "proto3"),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for FullIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts[0])?;
        for part in &self.parts[1..] {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.leading_dot.is_some() {
            write!(f, ".")?;
        }
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for OptionNamePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionNamePart::Ident(ident) => write!(f, "{}", ident),
            OptionNamePart::Extension(name, _) => write!(f, "({})", name),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Named(name) => write!(f, "{}", name),
            scalar => f.write_str(scalar.as_str().unwrap_or_default()),
        }
    }
}
