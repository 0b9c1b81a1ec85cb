use std::collections::HashMap;

use logos::{Lexer, Logos, Span};

use crate::{
    ast::{self, FieldLabel, FullIdent},
    case::is_valid_ident,
    error::ParseErrorKind,
    join_span,
    lex::Token,
    MAX_MESSAGE_FIELD_NUMBER,
};

#[cfg(test)]
mod tests;

pub(crate) fn parse_file(source: &str, name: &str) -> Result<ast::File, Vec<ParseErrorKind>> {
    let mut parser = Parser::new(source);
    match parser.parse_file(name) {
        Ok(file) if parser.lexer.extras.errors.is_empty() => Ok(file),
        _ => Err(parser.lexer.extras.errors),
    }
}

struct Parser<'a> {
    lexer: Lexer<'a, Token<'a>>,
    peek: Option<(Token<'a>, Span)>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lexer: Token::lexer(source),
            peek: None,
        }
    }

    fn parse_file(&mut self, name: &str) -> Result<ast::File, ()> {
        let (syntax, syntax_span) = match self.peek() {
            Some((Token::SYNTAX, _)) => {
                let (syntax, span) = self.parse_syntax()?;
                (syntax, Some(span))
            }
            Some((Token::EDITION, _)) => return self.parse_edition(),
            _ => (ast::Syntax::Proto2, None),
        };

        let mut package: Option<ast::Package> = None;
        let mut imports = Vec::new();
        let mut options = Vec::new();
        let mut definitions = Vec::new();

        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::PACKAGE, _)) => {
                    let new_package = self.parse_package()?;
                    if let Some(existing) = &package {
                        self.add_error(ParseErrorKind::DuplicatePackage {
                            first: existing.span.clone(),
                            second: new_package.span,
                        });
                        return Err(());
                    }
                    package = Some(new_package);
                }
                Some((Token::IMPORT, _)) => imports.push(self.parse_import()?),
                Some((Token::OPTION, _)) => options.push(self.parse_option()?),
                Some((Token::MESSAGE, _)) => {
                    definitions.push(ast::Definition::Message(self.parse_message()?))
                }
                Some((Token::ENUM, _)) => {
                    definitions.push(ast::Definition::Enum(self.parse_enum()?))
                }
                Some((Token::SERVICE, _)) => {
                    definitions.push(ast::Definition::Service(self.parse_service()?))
                }
                Some((Token::EXTEND, _)) => return self.parse_extend(),
                None => break,
                _ => self.unexpected_token(
                    "'enum', 'extend', 'import', 'message', 'option', 'service', 'package' or ';'",
                )?,
            }
        }

        Ok(ast::File {
            name: name.to_owned(),
            syntax,
            syntax_span,
            package,
            imports,
            options,
            definitions,
        })
    }

    fn parse_syntax(&mut self) -> Result<(ast::Syntax, Span), ()> {
        let start = self.expect_eq(Token::SYNTAX)?;
        self.expect_eq(Token::Equals)?;

        let value = self.parse_string()?;
        let syntax = match value.value.as_slice() {
            b"proto2" => ast::Syntax::Proto2,
            b"proto3" => ast::Syntax::Proto3,
            _ => {
                self.add_error(ParseErrorKind::UnknownSyntax {
                    syntax: String::from_utf8_lossy(&value.value).into_owned(),
                    span: value.span,
                });
                return Err(());
            }
        };

        let end = self.expect_eq(Token::Semicolon)?;
        Ok((syntax, join_span(start, end)))
    }

    fn parse_edition<T>(&mut self) -> Result<T, ()> {
        let start = self.expect_eq(Token::EDITION)?;
        self.expect_eq(Token::Equals)?;
        self.parse_string()?;
        let end = self.expect_eq(Token::Semicolon)?;

        self.unsupported("editions", join_span(start, end))
    }

    fn parse_package(&mut self) -> Result<ast::Package, ()> {
        let start = self.expect_eq(Token::PACKAGE)?;

        let name = self.parse_full_ident()?;

        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Package {
            name,
            span: join_span(start, end),
        })
    }

    fn parse_import(&mut self) -> Result<ast::Import, ()> {
        let start = self.expect_eq(Token::IMPORT)?;

        let kind = match self.peek() {
            Some((Token::WEAK, _)) => {
                self.bump();
                Some(ast::ImportKind::Weak)
            }
            Some((Token::PUBLIC, _)) => {
                self.bump();
                Some(ast::ImportKind::Public)
            }
            Some((Token::StringLiteral(_), _)) => None,
            _ => self.unexpected_token("a string literal, 'public' or 'weak'")?,
        };

        let value = self.parse_string()?;
        let value_span = value.span.clone();
        let value = match String::from_utf8(value.value) {
            Ok(value) => value,
            Err(_) => {
                self.add_error(ParseErrorKind::InvalidUtf8String { span: value_span });
                return Err(());
            }
        };

        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Import {
            kind,
            value,
            value_span,
            span: join_span(start, end),
        })
    }

    fn parse_message(&mut self) -> Result<ast::Message, ()> {
        let start = self.expect_eq(Token::MESSAGE)?;

        let name = self.parse_ident()?;

        let (body, end) = self.parse_message_body()?;

        Ok(ast::Message {
            name,
            body,
            span: join_span(start, end),
        })
    }

    fn parse_message_body(&mut self) -> Result<(ast::MessageBody, Span), ()> {
        let mut items = Vec::new();
        let mut numbers = HashMap::new();

        self.expect_eq(Token::LeftBrace)?;

        let end = loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => break self.bump().1,
                Some((Token::OPTION, _)) => {
                    items.push(ast::MessageItem::Option(self.parse_option()?));
                }
                Some((Token::ONEOF, _)) => {
                    let oneof = self.parse_oneof()?;
                    for item in &oneof.items {
                        if let ast::OneofItem::Field(field) = item {
                            self.check_field_number(&mut numbers, &field.number)?;
                        }
                    }
                    items.push(ast::MessageItem::Oneof(oneof));
                }
                Some((Token::MESSAGE, _)) => {
                    items.push(ast::MessageItem::Message(self.parse_message()?));
                }
                Some((Token::ENUM, _)) => {
                    items.push(ast::MessageItem::Enum(self.parse_enum()?));
                }
                Some((Token::RESERVED, _)) => {
                    items.push(ast::MessageItem::Reserved(self.parse_reserved(false)?));
                }
                Some((Token::MAP, _)) => {
                    let map = self.parse_map()?;
                    self.check_field_number(&mut numbers, &map.number)?;
                    items.push(ast::MessageItem::Map(map));
                }
                Some((Token::EXTENSIONS, _)) => return self.parse_extensions(),
                Some((Token::EXTEND, _)) => return self.parse_extend(),
                Some((tok, _)) if is_field_start_token(&tok) => {
                    let field = self.parse_field()?;
                    self.check_field_number(&mut numbers, &field.number)?;
                    items.push(ast::MessageItem::Field(field));
                }
                _ => self.unexpected_token(
                    "a message field, oneof, reserved range, enum, message, option or '}'",
                )?,
            }
        };

        Ok((ast::MessageBody { items }, end))
    }

    fn parse_field(&mut self) -> Result<ast::Field, ()> {
        let (label, start) = match self.peek() {
            Some((Token::OPTIONAL, span)) => {
                self.bump();
                (Some(FieldLabel::Optional), span)
            }
            Some((Token::REQUIRED, span)) => {
                self.bump();
                (Some(FieldLabel::Required), span)
            }
            Some((Token::REPEATED, span)) => {
                self.bump();
                (Some(FieldLabel::Repeated), span)
            }
            Some((tok, span)) if is_field_start_token(&tok) => (None, span),
            _ => self.unexpected_token("a message field")?,
        };

        if let Some((Token::GROUP, _)) = self.peek() {
            return self.parse_group(start);
        }

        let ty = self.parse_field_type()?;

        let name = self.parse_ident()?;

        self.expect_eq(Token::Equals)?;

        let number = self.parse_field_number()?;

        let (options, end) = self.parse_field_options_and_end()?;

        Ok(ast::Field {
            label,
            ty,
            name,
            number,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_group<T>(&mut self, start: Span) -> Result<T, ()> {
        self.expect_eq(Token::GROUP)?;

        self.parse_ident()?;
        self.expect_eq(Token::Equals)?;
        self.parse_field_number()?;

        if let Some((Token::LeftBracket, _)) = self.peek() {
            self.parse_options_list()?;
        }

        let (_, end) = self.parse_message_body()?;

        self.unsupported("groups", join_span(start, end))
    }

    fn parse_map(&mut self) -> Result<ast::Map, ()> {
        let start = self.expect_eq(Token::MAP)?;

        self.expect_eq(Token::LeftAngleBracket)?;
        let key_ty = self.parse_key_type()?;
        self.expect_eq(Token::Comma)?;
        let ty = self.parse_field_type()?;
        self.expect_eq(Token::RightAngleBracket)?;

        let name = self.parse_ident()?;

        self.expect_eq(Token::Equals)?;

        let number = self.parse_field_number()?;

        let (options, end) = self.parse_field_options_and_end()?;

        Ok(ast::Map {
            key_ty,
            ty,
            name,
            number,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_field_options_and_end(&mut self) -> Result<(Vec<ast::OptionBody>, Span), ()> {
        match self.peek() {
            Some((Token::LeftBracket, _)) => {
                let options = self.parse_options_list()?;
                let end = self.expect_eq(Token::Semicolon)?;
                Ok((options, end))
            }
            Some((Token::Semicolon, _)) => Ok((vec![], self.bump().1)),
            _ => self.unexpected_token("';' or '['")?,
        }
    }

    fn parse_oneof(&mut self) -> Result<ast::Oneof, ()> {
        let start = self.expect_eq(Token::ONEOF)?;

        let name = self.parse_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut items = Vec::new();
        let end = loop {
            match self.peek() {
                Some((Token::OPTION, _)) => {
                    items.push(ast::OneofItem::Option(self.parse_option()?));
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => break self.bump().1,
                Some((Token::GROUP, span)) => return self.parse_group(span),
                Some((Token::Dot | Token::Ident(_), span)) => {
                    let ty = self.parse_field_type()?;
                    let name = self.parse_ident()?;
                    self.expect_eq(Token::Equals)?;
                    let number = self.parse_field_number()?;
                    let (options, end) = self.parse_field_options_and_end()?;

                    items.push(ast::OneofItem::Field(ast::Field {
                        label: None,
                        ty,
                        name,
                        number,
                        options,
                        span: join_span(span, end),
                    }));
                }
                _ => self.unexpected_token("a message field, option or '}'")?,
            }
        };

        let span = join_span(start, end);
        if !items
            .iter()
            .any(|item| matches!(item, ast::OneofItem::Field(_)))
        {
            self.add_error(ParseErrorKind::EmptyOneof { span });
            return Err(());
        }

        Ok(ast::Oneof { name, items, span })
    }

    fn parse_extend<T>(&mut self) -> Result<T, ()> {
        let start = self.expect_eq(Token::EXTEND)?;

        self.parse_type_name()?;

        let (_, end) = self.parse_message_body()?;

        self.unsupported("extend blocks", join_span(start, end))
    }

    fn parse_extensions<T>(&mut self) -> Result<T, ()> {
        let start = self.expect_eq(Token::EXTENSIONS)?;

        self.parse_reserved_ranges(false)?;

        let (_, end) = self.parse_field_options_and_end()?;

        self.unsupported("extension ranges", join_span(start, end))
    }

    fn parse_service(&mut self) -> Result<ast::Service, ()> {
        let start = self.expect_eq(Token::SERVICE)?;

        let name = self.parse_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut items = Vec::new();

        let end = loop {
            match self.peek() {
                Some((Token::RPC, _)) => {
                    items.push(ast::ServiceItem::Method(self.parse_method()?));
                }
                Some((Token::OPTION, _)) => {
                    items.push(ast::ServiceItem::Option(self.parse_option()?));
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => break self.bump().1,
                _ => self.unexpected_token("'rpc', '}', 'option' or ';'")?,
            }
        };

        Ok(ast::Service {
            name,
            items,
            span: join_span(start, end),
        })
    }

    fn parse_method(&mut self) -> Result<ast::Method, ()> {
        let start = self.expect_eq(Token::RPC)?;

        let name = self.parse_ident()?;

        self.expect_eq(Token::LeftParen)?;
        let (is_client_streaming, input_ty) = self.parse_method_type()?;
        self.expect_eq(Token::RightParen)?;

        self.expect_eq(Token::RETURNS)?;

        self.expect_eq(Token::LeftParen)?;
        let (is_server_streaming, output_ty) = self.parse_method_type()?;
        self.expect_eq(Token::RightParen)?;

        let mut options = Vec::new();
        let end = match self.peek() {
            Some((Token::Semicolon, _)) => self.bump().1,
            Some((Token::LeftBrace, _)) => {
                self.bump();
                loop {
                    match self.peek() {
                        Some((Token::OPTION, _)) => {
                            options.push(self.parse_option()?);
                        }
                        Some((Token::RightBrace, _)) => break self.bump().1,
                        Some((Token::Semicolon, _)) => {
                            self.bump();
                        }
                        _ => self.unexpected_token("'option', '}' or ';'")?,
                    }
                }
            }
            _ => self.unexpected_token("';' or '{'")?,
        };

        Ok(ast::Method {
            name,
            input_ty,
            output_ty,
            is_client_streaming,
            is_server_streaming,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_method_type(&mut self) -> Result<(bool, ast::TypeName), ()> {
        match self.peek() {
            Some((Token::STREAM, span)) => {
                self.bump();
                match self.peek() {
                    // 'stream' is the name of the type, not a modifier
                    Some((Token::RightParen, _)) => Ok((
                        false,
                        ast::TypeName {
                            leading_dot: None,
                            name: ast::Ident::new("stream", span).into(),
                        },
                    )),
                    _ => Ok((true, self.parse_type_name()?)),
                }
            }
            Some((Token::Dot | Token::Ident(_), _)) => Ok((false, self.parse_type_name()?)),
            _ => self.unexpected_token("'stream' or a type name")?,
        }
    }

    fn parse_enum(&mut self) -> Result<ast::Enum, ()> {
        let start = self.expect_eq(Token::ENUM)?;

        let name = self.parse_ident()?;

        self.expect_eq(Token::LeftBrace)?;

        let mut items = Vec::new();

        let end = loop {
            match self.peek() {
                Some((Token::OPTION, _)) => {
                    items.push(ast::EnumItem::Option(self.parse_option()?));
                }
                Some((Token::RESERVED, _)) => {
                    items.push(ast::EnumItem::Reserved(self.parse_reserved(true)?));
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::Ident(_), _)) => {
                    items.push(ast::EnumItem::Value(self.parse_enum_value()?));
                }
                Some((Token::RightBrace, _)) => break self.bump().1,
                _ => self.unexpected_token("an identifier, '}', ';', 'option' or 'reserved'")?,
            };
        };

        Ok(ast::Enum {
            name,
            items,
            span: join_span(start, end),
        })
    }

    fn parse_enum_value(&mut self) -> Result<ast::EnumValue, ()> {
        let name = self.parse_ident()?;

        self.expect_eq(Token::Equals)?;

        let value = self.parse_enum_number()?;

        let (options, end) = self.parse_field_options_and_end()?;

        Ok(ast::EnumValue {
            span: join_span(name.span.clone(), end),
            name,
            value,
            options,
        })
    }

    fn parse_key_type(&mut self) -> Result<ast::KeyTy, ()> {
        let ty = match self.peek() {
            Some((Token::Ident(ident), _)) => match ident {
                "int32" => ast::KeyTy::Int32,
                "int64" => ast::KeyTy::Int64,
                "uint32" => ast::KeyTy::Uint32,
                "uint64" => ast::KeyTy::Uint64,
                "sint32" => ast::KeyTy::Sint32,
                "sint64" => ast::KeyTy::Sint64,
                "fixed32" => ast::KeyTy::Fixed32,
                "fixed64" => ast::KeyTy::Fixed64,
                "sfixed32" => ast::KeyTy::Sfixed32,
                "sfixed64" => ast::KeyTy::Sfixed64,
                "bool" => ast::KeyTy::Bool,
                "string" => ast::KeyTy::String,
                _ => self.unexpected_token("an integer type, 'bool' or 'string'")?,
            },
            _ => self.unexpected_token("an integer type, 'bool' or 'string'")?,
        };

        self.bump();
        Ok(ty)
    }

    fn parse_field_type(&mut self) -> Result<ast::Ty, ()> {
        let scalar_ty = match self.peek() {
            Some((Token::Ident(ident), _)) => match ident {
                "double" => ast::Ty::Double,
                "float" => ast::Ty::Float,
                "int32" => ast::Ty::Int32,
                "int64" => ast::Ty::Int64,
                "uint32" => ast::Ty::Uint32,
                "uint64" => ast::Ty::Uint64,
                "sint32" => ast::Ty::Sint32,
                "sint64" => ast::Ty::Sint64,
                "fixed32" => ast::Ty::Fixed32,
                "fixed64" => ast::Ty::Fixed64,
                "sfixed32" => ast::Ty::Sfixed32,
                "sfixed64" => ast::Ty::Sfixed64,
                "bool" => ast::Ty::Bool,
                "string" => ast::Ty::String,
                "bytes" => ast::Ty::Bytes,
                _ => return Ok(ast::Ty::Named(self.parse_type_name()?)),
            },
            Some((Token::Dot, _)) => return Ok(ast::Ty::Named(self.parse_type_name()?)),
            _ => self.unexpected_token("a field type")?,
        };

        self.bump();
        Ok(scalar_ty)
    }

    fn parse_reserved(&mut self, allow_negative: bool) -> Result<ast::Reserved, ()> {
        let start = self.expect_eq(Token::RESERVED)?;

        let kind = match self.peek() {
            Some((Token::IntLiteral(_), _)) => {
                ast::ReservedKind::Ranges(self.parse_reserved_ranges(allow_negative)?)
            }
            Some((Token::Minus, _)) if allow_negative => {
                ast::ReservedKind::Ranges(self.parse_reserved_ranges(allow_negative)?)
            }
            Some((Token::StringLiteral(_), _)) => {
                ast::ReservedKind::Names(self.parse_reserved_names()?)
            }
            _ => self.unexpected_token("a positive integer or string")?,
        };

        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Reserved {
            kind,
            span: join_span(start, end),
        })
    }

    fn parse_reserved_names(&mut self) -> Result<Vec<ast::Ident>, ()> {
        let mut names = vec![self.parse_ident_string()?];

        while self.bump_if_eq(Token::Comma) {
            names.push(self.parse_ident_string()?);
        }

        Ok(names)
    }

    fn parse_ident_string(&mut self) -> Result<ast::Ident, ()> {
        let string = self.parse_string()?;
        match String::from_utf8(string.value) {
            Ok(value) if is_valid_ident(&value) => Ok(ast::Ident {
                value,
                span: string.span,
            }),
            _ => {
                self.add_error(ParseErrorKind::InvalidIdentifier { span: string.span });
                Err(())
            }
        }
    }

    fn parse_reserved_ranges(
        &mut self,
        allow_negative: bool,
    ) -> Result<Vec<ast::ReservedRange>, ()> {
        let mut ranges = vec![self.parse_reserved_range(allow_negative)?];

        while self.bump_if_eq(Token::Comma) {
            ranges.push(self.parse_reserved_range(allow_negative)?);
        }

        Ok(ranges)
    }

    fn parse_reserved_range(&mut self, allow_negative: bool) -> Result<ast::ReservedRange, ()> {
        let start = self.parse_range_bound(allow_negative)?;

        let end = if self.bump_if_eq(Token::TO) {
            match self.peek() {
                Some((Token::MAX, _)) => {
                    self.bump();
                    ast::ReservedRangeEnd::Max
                }
                _ => ast::ReservedRangeEnd::Int(self.parse_range_bound(allow_negative)?),
            }
        } else {
            ast::ReservedRangeEnd::None
        };

        Ok(ast::ReservedRange { start, end })
    }

    fn parse_range_bound(&mut self, allow_negative: bool) -> Result<ast::Int, ()> {
        if allow_negative {
            self.parse_enum_number()
        } else {
            self.parse_field_number()
        }
    }

    fn parse_options_list(&mut self) -> Result<Vec<ast::OptionBody>, ()> {
        self.expect_eq(Token::LeftBracket)?;

        let mut options = vec![self.parse_option_body()?];
        loop {
            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                    options.push(self.parse_option_body()?);
                }
                Some((Token::RightBracket, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("',' or ']'")?,
            }
        }

        Ok(options)
    }

    fn parse_option(&mut self) -> Result<ast::Option, ()> {
        let start = self.expect_eq(Token::OPTION)?;

        let body = self.parse_option_body()?;

        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Option {
            body,
            span: join_span(start, end),
        })
    }

    fn parse_option_body(&mut self) -> Result<ast::OptionBody, ()> {
        let mut name = Vec::new();
        loop {
            match self.peek() {
                Some((Token::LeftParen, start)) => {
                    self.bump();
                    let type_name = self.parse_type_name()?;
                    let end = self.expect_eq(Token::RightParen)?;
                    name.push(ast::OptionNamePart::Extension(
                        type_name,
                        join_span(start, end),
                    ));
                }
                Some((Token::Ident(_), _)) => {
                    name.push(ast::OptionNamePart::Ident(self.parse_ident()?));
                }
                _ => self.unexpected_token("an identifier or '('")?,
            }

            match self.peek() {
                Some((Token::Dot, _)) => {
                    self.bump();
                }
                Some((Token::Equals, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("'.' or '='")?,
            }
        }

        let value = match self.peek() {
            Some((Token::Ident(_), _)) => ast::Constant::FullIdent(self.parse_full_ident()?),
            Some((Token::Plus, _)) => {
                self.bump();
                self.parse_int_or_float(false)?
            }
            Some((Token::Minus, start)) => {
                self.bump();
                match self.peek() {
                    Some((Token::Ident(ident @ ("inf" | "nan")), end)) => {
                        self.bump();
                        let value = if ident == "inf" {
                            f64::NEG_INFINITY
                        } else {
                            -f64::NAN
                        };
                        ast::Constant::Float(ast::Float {
                            value,
                            span: join_span(start, end),
                        })
                    }
                    _ => self.parse_int_or_float(true)?,
                }
            }
            Some((Token::IntLiteral(_) | Token::FloatLiteral(_), _)) => {
                self.parse_int_or_float(false)?
            }
            Some((Token::StringLiteral(_), _)) => ast::Constant::String(self.parse_string()?),
            Some((Token::LeftBrace, start)) => {
                let end = self.skip_aggregate()?;
                return self.unsupported("aggregate option values", join_span(start, end));
            }
            _ => self.unexpected_token("a constant")?,
        };

        Ok(ast::OptionBody { name, value })
    }

    fn skip_aggregate(&mut self) -> Result<Span, ()> {
        self.expect_eq(Token::LeftBrace)?;

        let mut depth = 1u32;
        loop {
            match self.peek() {
                Some((Token::LeftBrace, _)) => {
                    self.bump();
                    depth += 1;
                }
                Some((Token::RightBrace, span)) => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(span);
                    }
                }
                Some(_) => {
                    self.bump();
                }
                None => self.unexpected_token("'}'")?,
            }
        }
    }

    fn parse_int_or_float(&mut self, negate: bool) -> Result<ast::Constant, ()> {
        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                Ok(ast::Constant::Int(ast::Int {
                    negative: negate && value != 0,
                    value,
                    span,
                }))
            }
            Some((Token::FloatLiteral(value), span)) => {
                self.bump();
                Ok(ast::Constant::Float(ast::Float {
                    value: if negate { -value } else { value },
                    span,
                }))
            }
            _ => self.unexpected_token("a numeric literal")?,
        }
    }

    fn parse_type_name(&mut self) -> Result<ast::TypeName, ()> {
        let leading_dot = match self.peek() {
            Some((Token::Dot, span)) => {
                self.bump();
                Some(span)
            }
            Some((Token::Ident(_), _)) => None,
            _ => self.unexpected_token("a type name")?,
        };

        let name = self.parse_full_ident()?;

        Ok(ast::TypeName { leading_dot, name })
    }

    fn parse_full_ident(&mut self) -> Result<ast::FullIdent, ()> {
        let mut parts = vec![self.parse_ident()?];

        while self.bump_if_eq(Token::Dot) {
            parts.push(self.parse_ident()?);
        }

        Ok(FullIdent::from(parts))
    }

    fn parse_ident(&mut self) -> Result<ast::Ident, ()> {
        match self.peek() {
            Some((Token::Ident(value), span)) => {
                self.bump();
                Ok(ast::Ident::new(value, span))
            }
            _ => self.unexpected_token("an identifier"),
        }
    }

    fn parse_field_number(&mut self) -> Result<ast::Int, ()> {
        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                if value == 0 || value > MAX_MESSAGE_FIELD_NUMBER as u64 {
                    self.add_error(ParseErrorKind::InvalidMessageNumber { span });
                    return Err(());
                }
                Ok(ast::Int {
                    negative: false,
                    value,
                    span,
                })
            }
            _ => self.unexpected_token("a positive integer"),
        }
    }

    fn parse_enum_number(&mut self) -> Result<ast::Int, ()> {
        let minus = match self.peek() {
            Some((Token::Minus, span)) => {
                self.bump();
                Some(span)
            }
            _ => None,
        };

        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                let negative = minus.is_some();
                let span = match minus {
                    Some(start) => join_span(start, span),
                    None => span,
                };
                let in_range = if negative {
                    value <= i32::MAX as u64 + 1
                } else {
                    value <= i32::MAX as u64
                };
                if !in_range {
                    self.add_error(ParseErrorKind::InvalidEnumNumber { span });
                    return Err(());
                }
                Ok(ast::Int {
                    negative: negative && value != 0,
                    value,
                    span,
                })
            }
            _ => self.unexpected_token("an integer"),
        }
    }

    fn parse_string(&mut self) -> Result<ast::String, ()> {
        let (mut value, mut span) = match self.peek() {
            Some((Token::StringLiteral(value), span)) => {
                self.bump();
                (value.into_owned(), span)
            }
            _ => self.unexpected_token("a string literal")?,
        };

        while let Some((Token::StringLiteral(next), next_span)) = self.peek() {
            self.bump();
            value.extend_from_slice(&next);
            span = join_span(span, next_span);
        }

        Ok(ast::String { value, span })
    }

    fn check_field_number(
        &mut self,
        numbers: &mut HashMap<u64, Span>,
        number: &ast::Int,
    ) -> Result<(), ()> {
        if let Some(first) = numbers.insert(number.value, number.span.clone()) {
            self.add_error(ParseErrorKind::DuplicateFieldNumber {
                number: number.value as i32,
                first,
                second: number.span.clone(),
            });
            return Err(());
        }
        Ok(())
    }

    fn expect_eq(&mut self, t: Token) -> Result<Span, ()> {
        match self.peek() {
            Some((tok, _)) if tok == t => Ok(self.bump().1),
            _ => self.unexpected_token(format!("'{}'", t))?,
        }
    }

    fn bump_if_eq(&mut self, t: Token) -> bool {
        match self.peek() {
            Some((tok, _)) if tok == t => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn bump(&mut self) -> (Token<'a>, Span) {
        self.peek
            .take()
            .expect("called bump without peek returning Some()")
    }

    fn peek(&mut self) -> Option<(Token<'a>, Span)> {
        if self.peek.is_none() {
            self.peek = self.next();
        }
        self.peek.clone()
    }

    fn next(&mut self) -> Option<(Token<'a>, Span)> {
        match self.lexer.next() {
            Some(Token::Error) => {
                self.add_error(ParseErrorKind::InvalidToken {
                    span: self.lexer.span(),
                });
                Some((Token::Error, self.lexer.span()))
            }
            Some(tok) => Some((tok, self.lexer.span())),
            None => None,
        }
    }

    fn unsupported<T>(&mut self, construct: &'static str, span: Span) -> Result<T, ()> {
        self.add_error(ParseErrorKind::UnsupportedConstruct { construct, span });
        Err(())
    }

    fn unexpected_token<T>(&mut self, expected: impl ToString) -> Result<T, ()> {
        match self.peek() {
            Some((Token::Error, _)) => Err(()),
            Some((found, span)) => {
                self.add_error(ParseErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: found.to_string(),
                    span,
                });
                Err(())
            }
            None => {
                self.add_error(ParseErrorKind::UnexpectedEof {
                    expected: expected.to_string(),
                });
                Err(())
            }
        }
    }

    fn add_error(&mut self, err: ParseErrorKind) {
        self.lexer.extras.errors.push(err);
    }
}

fn is_field_start_token(tok: &Token) -> bool {
    matches!(tok, Token::Dot | Token::Ident(_))
}
