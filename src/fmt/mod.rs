//! Renders a parsed file back to protobuf source in canonical form.
//!
//! The output depends only on the content of the syntax tree: comments, whitespace, quoting style
//! and the numeric base of integer literals are not preserved.

use std::fmt::{self, Display, Write};

use crate::ast;


const INDENT: &str = "  ";

pub(crate) fn format_file(file: &ast::File) -> String {
    Canonical(file).to_string()
}

struct Canonical<'a>(&'a ast::File);

impl<'a> Display for Canonical<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.0;
        let mut blocks = Blocks::default();

        if file.syntax_span.is_some() || file.package.is_some() {
            blocks.start(f)?;
            if file.syntax_span.is_some() {
                writeln!(f, "syntax = \"{}\";", file.syntax)?;
            }
            if let Some(package) = &file.package {
                writeln!(f, "package {};", package.name)?;
            }
        }

        if !file.imports.is_empty() {
            blocks.start(f)?;
            for import in &file.imports {
                write_import(f, import)?;
            }
        }

        if !file.options.is_empty() {
            blocks.start(f)?;
            for option in &file.options {
                write_option(f, option, 0)?;
            }
        }

        for definition in &file.definitions {
            blocks.start(f)?;
            match definition {
                ast::Definition::Message(message) => write_message(f, message, 0)?,
                ast::Definition::Enum(enm) => write_enum(f, enm, 0)?,
                ast::Definition::Service(service) => write_service(f, service, 0)?,
            }
        }

        Ok(())
    }
}

/// Separates top-level blocks with a single blank line.
#[derive(Default)]
struct Blocks {
    started: bool,
}

impl Blocks {
    fn start(&mut self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.started {
            f.write_char('\n')?;
        }
        self.started = true;
        Ok(())
    }
}

struct Indent(usize);

impl Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str(INDENT)?;
        }
        Ok(())
    }
}

fn write_import(f: &mut fmt::Formatter<'_>, import: &ast::Import) -> fmt::Result {
    f.write_str("import ")?;
    match import.kind {
        Some(ast::ImportKind::Weak) => f.write_str("weak ")?,
        Some(ast::ImportKind::Public) => f.write_str("public ")?,
        None => {}
    }
    writeln!(f, "{};", Quoted(import.value.as_bytes()))
}

fn write_option(f: &mut fmt::Formatter<'_>, option: &ast::Option, depth: usize) -> fmt::Result {
    writeln!(f, "{}option {};", Indent(depth), OptionBody(&option.body))
}

fn write_message(f: &mut fmt::Formatter<'_>, message: &ast::Message, depth: usize) -> fmt::Result {
    write!(f, "{}message {} {{", Indent(depth), message.name)?;
    if message.body.items.is_empty() {
        return writeln!(f, "}}");
    }
    f.write_char('\n')?;

    for item in &message.body.items {
        match item {
            ast::MessageItem::Field(field) => write_field(f, field, depth + 1)?,
            ast::MessageItem::Map(map) => write_map(f, map, depth + 1)?,
            ast::MessageItem::Oneof(oneof) => write_oneof(f, oneof, depth + 1)?,
            ast::MessageItem::Message(nested) => write_message(f, nested, depth + 1)?,
            ast::MessageItem::Enum(enm) => write_enum(f, enm, depth + 1)?,
            ast::MessageItem::Option(option) => write_option(f, option, depth + 1)?,
            ast::MessageItem::Reserved(reserved) => write_reserved(f, reserved, depth + 1)?,
        }
    }

    writeln!(f, "{}}}", Indent(depth))
}

fn write_field(f: &mut fmt::Formatter<'_>, field: &ast::Field, depth: usize) -> fmt::Result {
    write!(f, "{}", Indent(depth))?;
    if let Some(label) = field.label {
        write!(f, "{} ", label.as_str())?;
    }
    writeln!(
        f,
        "{} {} = {}{};",
        field.ty,
        field.name,
        field.number.value,
        OptionList(&field.options)
    )
}

fn write_map(f: &mut fmt::Formatter<'_>, map: &ast::Map, depth: usize) -> fmt::Result {
    writeln!(
        f,
        "{}map<{}, {}> {} = {}{};",
        Indent(depth),
        map.key_ty.as_str(),
        map.ty,
        map.name,
        map.number.value,
        OptionList(&map.options)
    )
}

fn write_oneof(f: &mut fmt::Formatter<'_>, oneof: &ast::Oneof, depth: usize) -> fmt::Result {
    writeln!(f, "{}oneof {} {{", Indent(depth), oneof.name)?;
    for item in &oneof.items {
        match item {
            ast::OneofItem::Field(field) => write_field(f, field, depth + 1)?,
            ast::OneofItem::Option(option) => write_option(f, option, depth + 1)?,
        }
    }
    writeln!(f, "{}}}", Indent(depth))
}

fn write_reserved(
    f: &mut fmt::Formatter<'_>,
    reserved: &ast::Reserved,
    depth: usize,
) -> fmt::Result {
    write!(f, "{}reserved ", Indent(depth))?;
    match &reserved.kind {
        ast::ReservedKind::Ranges(ranges) => {
            for (index, range) in ranges.iter().enumerate() {
                if index != 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", Int(&range.start))?;
                match &range.end {
                    ast::ReservedRangeEnd::None => {}
                    ast::ReservedRangeEnd::Int(end) => write!(f, " to {}", Int(end))?,
                    ast::ReservedRangeEnd::Max => f.write_str(" to max")?,
                }
            }
        }
        ast::ReservedKind::Names(names) => {
            for (index, name) in names.iter().enumerate() {
                if index != 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", Quoted(name.value.as_bytes()))?;
            }
        }
    }
    writeln!(f, ";")
}

fn write_enum(f: &mut fmt::Formatter<'_>, enm: &ast::Enum, depth: usize) -> fmt::Result {
    write!(f, "{}enum {} {{", Indent(depth), enm.name)?;
    if enm.items.is_empty() {
        return writeln!(f, "}}");
    }
    f.write_char('\n')?;

    for item in &enm.items {
        match item {
            ast::EnumItem::Value(value) => writeln!(
                f,
                "{}{} = {}{};",
                Indent(depth + 1),
                value.name,
                Int(&value.value),
                OptionList(&value.options)
            )?,
            ast::EnumItem::Option(option) => write_option(f, option, depth + 1)?,
            ast::EnumItem::Reserved(reserved) => write_reserved(f, reserved, depth + 1)?,
        }
    }

    writeln!(f, "{}}}", Indent(depth))
}

fn write_service(f: &mut fmt::Formatter<'_>, service: &ast::Service, depth: usize) -> fmt::Result {
    write!(f, "{}service {} {{", Indent(depth), service.name)?;
    if service.items.is_empty() {
        return writeln!(f, "}}");
    }
    f.write_char('\n')?;

    for item in &service.items {
        match item {
            ast::ServiceItem::Method(method) => write_method(f, method, depth + 1)?,
            ast::ServiceItem::Option(option) => write_option(f, option, depth + 1)?,
        }
    }

    writeln!(f, "{}}}", Indent(depth))
}

fn write_method(f: &mut fmt::Formatter<'_>, method: &ast::Method, depth: usize) -> fmt::Result {
    write!(f, "{}rpc {}(", Indent(depth), method.name)?;
    if method.is_client_streaming {
        f.write_str("stream ")?;
    }
    write!(f, "{}) returns (", method.input_ty)?;
    if method.is_server_streaming {
        f.write_str("stream ")?;
    }
    write!(f, "{})", method.output_ty)?;

    if method.options.is_empty() {
        return writeln!(f, ";");
    }

    writeln!(f, " {{")?;
    for option in &method.options {
        write_option(f, option, depth + 1)?;
    }
    writeln!(f, "{}}}", Indent(depth))
}

struct OptionList<'a>(&'a [ast::OptionBody]);

impl<'a> Display for OptionList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }

        f.write_str(" [")?;
        for (index, option) in self.0.iter().enumerate() {
            if index != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", OptionBody(option))?;
        }
        f.write_char(']')
    }
}

struct OptionBody<'a>(&'a ast::OptionBody);

impl<'a> Display for OptionBody<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.0.name.iter().enumerate() {
            if index != 0 {
                f.write_char('.')?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, " = {}", Constant(&self.0.value))
    }
}

struct Constant<'a>(&'a ast::Constant);

impl<'a> Display for Constant<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ast::Constant::FullIdent(ident) => write!(f, "{}", ident),
            ast::Constant::Int(int) => write!(f, "{}", Int(int)),
            ast::Constant::Float(float) => write!(f, "{}", Float(float.value)),
            ast::Constant::String(string) => write!(f, "{}", Quoted(&string.value)),
        }
    }
}

struct Int<'a>(&'a ast::Int);

impl<'a> Display for Int<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.negative {
            f.write_char('-')?;
        }
        write!(f, "{}", self.0.value)
    }
}

/// Writes a float so that lexing it again yields the same value.
pub(crate) struct Float(pub f64);

impl Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            if value.is_sign_negative() {
                f.write_char('-')?;
            }
            f.write_str("nan")
        } else if value.is_infinite() {
            if value.is_sign_negative() {
                f.write_char('-')?;
            }
            f.write_str("inf")
        } else {
            // shortest round-trip form, with an exponent for extreme magnitudes
            write!(f, "{:?}", value)
        }
    }
}

/// Writes bytes as a double quoted string literal.
pub(crate) struct Quoted<'a>(pub &'a [u8]);

impl<'a> Display for Quoted<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        match std::str::from_utf8(self.0) {
            Ok(s) => {
                for ch in s.chars() {
                    match ch {
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        '\n' => f.write_str("\\n")?,
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\x20'..='\x7e' => f.write_char(ch)?,
                        _ if ch.is_ascii() => write!(f, "\\{:03o}", ch as u8)?,
                        _ => f.write_char(ch)?,
                    }
                }
            }
            Err(_) => {
                for &byte in self.0 {
                    match byte {
                        b'\t' => f.write_str("\\t")?,
                        b'\r' => f.write_str("\\r")?,
                        b'\n' => f.write_str("\\n")?,
                        b'\\' => f.write_str("\\\\")?,
                        b'"' => f.write_str("\\\"")?,
                        b'\x20'..=b'\x7e' => f.write_char(byte as char)?,
                        _ => write!(f, "\\{:03o}", byte)?,
                    }
                }
            }
        }
        f.write_char('"')
    }
}
