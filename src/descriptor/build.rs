use std::collections::HashMap;

use crate::{ast, MAX_MESSAGE_FIELD_NUMBER};

use super::*;

/// Lowers a parsed file into a descriptor. This cannot fail for any file the parser accepted.
pub(crate) fn build(file: &ast::File) -> FileDescriptor {
    let names = NameMap::new(file);
    let package = file.package.as_ref().map(|p| p.name.to_string());

    let builder = Builder {
        syntax: file.syntax,
        names: &names,
    };
    let scope = package.clone().unwrap_or_default();

    FileDescriptor {
        name: file.name.clone(),
        syntax: match file.syntax {
            ast::Syntax::Proto2 => Syntax::Proto2,
            ast::Syntax::Proto3 => Syntax::Proto3,
        },
        package,
        imports: file.imports.iter().map(build_import).collect(),
        options: file.options.iter().map(|o| build_option(&o.body)).collect(),
        definitions: file
            .definitions
            .iter()
            .map(|definition| match definition {
                ast::Definition::Message(message) => {
                    Definition::Message(builder.build_message(message, &scope))
                }
                ast::Definition::Enum(enm) => Definition::Enum(build_enum(enm)),
                ast::Definition::Service(service) => {
                    Definition::Service(builder.build_service(service, &scope))
                }
            })
            .collect(),
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Symbol {
    Package,
    Message,
    Enum,
}

/// Fully qualified names of everything declared in a file, without a leading dot.
struct NameMap {
    names: HashMap<String, Symbol>,
}

impl NameMap {
    fn new(file: &ast::File) -> Self {
        let mut names = HashMap::new();

        let mut scope = String::new();
        if let Some(package) = &file.package {
            for part in &package.name.parts {
                scope = join_name(&scope, &part.value);
                names.insert(scope.clone(), Symbol::Package);
            }
        }

        for definition in &file.definitions {
            match definition {
                ast::Definition::Message(message) => add_message(&mut names, &scope, message),
                ast::Definition::Enum(enm) => {
                    names.insert(join_name(&scope, &enm.name.value), Symbol::Enum);
                }
                ast::Definition::Service(_) => {}
            }
        }

        NameMap { names }
    }

    fn get(&self, name: &str) -> Option<Symbol> {
        self.names.get(name).copied()
    }

    /// Resolves a type name relative to `scope` following protobuf scoping rules: the first
    /// component is looked up from the innermost scope outward, and the remainder must then be
    /// found within whatever it named.
    fn resolve(&self, scope: &str, ty: &ast::TypeName) -> TypeRef {
        let written = ty.to_string();

        let full_name = if ty.leading_dot.is_some() {
            Some(ty.name.to_string())
        } else {
            let first = &ty.name.parts[0].value;
            let rest = ty.name.to_string();

            let mut scope = scope;
            loop {
                if self.get(&join_name(scope, first)).is_some() {
                    break Some(join_name(scope, &rest));
                }
                match scope.rfind('.') {
                    Some(index) => scope = &scope[..index],
                    None if !scope.is_empty() => scope = "",
                    None => break None,
                }
            }
        };

        match full_name.as_deref().and_then(|name| Some((name, self.get(name)?))) {
            Some((name, Symbol::Message)) => TypeRef::Message(format!(".{}", name)),
            Some((name, Symbol::Enum)) => TypeRef::Enum(format!(".{}", name)),
            Some((_, Symbol::Package)) | None => TypeRef::Unresolved(written),
        }
    }
}

fn add_message(names: &mut HashMap<String, Symbol>, scope: &str, message: &ast::Message) {
    let full_name = join_name(scope, &message.name.value);

    for item in &message.body.items {
        match item {
            ast::MessageItem::Message(nested) => add_message(names, &full_name, nested),
            ast::MessageItem::Enum(enm) => {
                names.insert(join_name(&full_name, &enm.name.value), Symbol::Enum);
            }
            _ => {}
        }
    }

    names.insert(full_name, Symbol::Message);
}

fn join_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", scope, name)
    }
}

struct Builder<'a> {
    syntax: ast::Syntax,
    names: &'a NameMap,
}

impl<'a> Builder<'a> {
    fn build_message(&self, message: &ast::Message, scope: &str) -> MessageDescriptor {
        let full_name = join_name(scope, &message.name.value);

        let mut fields = Vec::new();
        let mut oneofs = Vec::new();
        let mut nested = Vec::new();
        let mut options = Vec::new();
        let mut reserved = Vec::new();

        for item in &message.body.items {
            match item {
                ast::MessageItem::Field(field) => {
                    fields.push(self.build_field(field, &full_name, None));
                }
                ast::MessageItem::Map(map) => fields.push(self.build_map(map, &full_name)),
                ast::MessageItem::Oneof(oneof) => {
                    let index = oneofs.len();
                    let mut oneof_options = Vec::new();
                    for item in &oneof.items {
                        match item {
                            ast::OneofItem::Field(field) => {
                                fields.push(self.build_field(field, &full_name, Some(index)));
                            }
                            ast::OneofItem::Option(option) => {
                                oneof_options.push(build_option(&option.body));
                            }
                        }
                    }
                    oneofs.push(OneofDescriptor {
                        name: oneof.name.value.clone(),
                        options: oneof_options,
                    });
                }
                ast::MessageItem::Message(message) => {
                    nested.push(NestedDefinition::Message(
                        self.build_message(message, &full_name),
                    ));
                }
                ast::MessageItem::Enum(enm) => {
                    nested.push(NestedDefinition::Enum(build_enum(enm)));
                }
                ast::MessageItem::Option(option) => options.push(build_option(&option.body)),
                ast::MessageItem::Reserved(r) => {
                    reserved.extend(build_reserved(r, MAX_MESSAGE_FIELD_NUMBER));
                }
            }
        }

        debug_assert!(
            {
                let mut numbers: Vec<u32> = fields.iter().map(|f| f.number).collect();
                numbers.sort_unstable();
                numbers.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate field numbers in message '{}'",
            full_name
        );

        MessageDescriptor {
            name: message.name.value.clone(),
            fields,
            oneofs,
            nested,
            options,
            reserved,
        }
    }

    fn build_field(
        &self,
        field: &ast::Field,
        scope: &str,
        oneof_index: Option<usize>,
    ) -> FieldDescriptor {
        let label = match field.label {
            Some(ast::FieldLabel::Required) => Label::Required,
            Some(ast::FieldLabel::Repeated) => Label::Repeated,
            Some(ast::FieldLabel::Optional) | None => Label::Optional,
        };
        let proto3_optional =
            self.syntax == ast::Syntax::Proto3 && field.label == Some(ast::FieldLabel::Optional);

        let (default_value, options) = split_default(&field.options);

        FieldDescriptor {
            name: field.name.value.clone(),
            number: field_number(&field.number),
            label,
            ty: self.build_type(&field.ty, scope),
            proto3_optional,
            default_value,
            options,
            oneof_index,
        }
    }

    fn build_map(&self, map: &ast::Map, scope: &str) -> FieldDescriptor {
        let (default_value, options) = split_default(&map.options);

        FieldDescriptor {
            name: map.name.value.clone(),
            number: field_number(&map.number),
            label: Label::Repeated,
            ty: FieldType::Map {
                key: build_key_type(map.key_ty),
                value: Box::new(self.build_type(&map.ty, scope)),
            },
            proto3_optional: false,
            default_value,
            options,
            oneof_index: None,
        }
    }

    fn build_type(&self, ty: &ast::Ty, scope: &str) -> FieldType {
        let scalar = match ty {
            ast::Ty::Double => ScalarType::Double,
            ast::Ty::Float => ScalarType::Float,
            ast::Ty::Int32 => ScalarType::Int32,
            ast::Ty::Int64 => ScalarType::Int64,
            ast::Ty::Uint32 => ScalarType::Uint32,
            ast::Ty::Uint64 => ScalarType::Uint64,
            ast::Ty::Sint32 => ScalarType::Sint32,
            ast::Ty::Sint64 => ScalarType::Sint64,
            ast::Ty::Fixed32 => ScalarType::Fixed32,
            ast::Ty::Fixed64 => ScalarType::Fixed64,
            ast::Ty::Sfixed32 => ScalarType::Sfixed32,
            ast::Ty::Sfixed64 => ScalarType::Sfixed64,
            ast::Ty::Bool => ScalarType::Bool,
            ast::Ty::String => ScalarType::String,
            ast::Ty::Bytes => ScalarType::Bytes,
            ast::Ty::Named(name) => return FieldType::Named(self.names.resolve(scope, name)),
        };
        FieldType::Scalar(scalar)
    }

    fn build_service(&self, service: &ast::Service, scope: &str) -> ServiceDescriptor {
        let full_name = join_name(scope, &service.name.value);

        let mut methods = Vec::new();
        let mut options = Vec::new();
        for item in &service.items {
            match item {
                ast::ServiceItem::Method(method) => methods.push(MethodDescriptor {
                    name: method.name.value.clone(),
                    input_type: self.names.resolve(&full_name, &method.input_ty),
                    output_type: self.names.resolve(&full_name, &method.output_ty),
                    client_streaming: method.is_client_streaming,
                    server_streaming: method.is_server_streaming,
                    options: method.options.iter().map(|o| build_option(&o.body)).collect(),
                }),
                ast::ServiceItem::Option(option) => options.push(build_option(&option.body)),
            }
        }

        ServiceDescriptor {
            name: service.name.value.clone(),
            methods,
            options,
        }
    }
}

fn build_import(import: &ast::Import) -> Import {
    Import {
        path: import.value.clone(),
        kind: match import.kind {
            None => ImportKind::Default,
            Some(ast::ImportKind::Weak) => ImportKind::Weak,
            Some(ast::ImportKind::Public) => ImportKind::Public,
        },
    }
}

fn build_enum(enm: &ast::Enum) -> EnumDescriptor {
    let mut values = Vec::new();
    let mut options = Vec::new();
    let mut reserved = Vec::new();

    for item in &enm.items {
        match item {
            ast::EnumItem::Value(value) => values.push(EnumValueDescriptor {
                name: value.name.value.clone(),
                number: enum_number(&value.value),
                options: value.options.iter().map(build_option).collect(),
            }),
            ast::EnumItem::Option(option) => options.push(build_option(&option.body)),
            ast::EnumItem::Reserved(r) => reserved.extend(build_reserved(r, i32::MAX)),
        }
    }

    EnumDescriptor {
        name: enm.name.value.clone(),
        values,
        options,
        reserved,
    }
}

fn build_reserved(reserved: &ast::Reserved, max: i32) -> Vec<Reserved> {
    match &reserved.kind {
        ast::ReservedKind::Ranges(ranges) => ranges
            .iter()
            .map(|range| {
                let start = enum_number(&range.start);
                let end = match &range.end {
                    ast::ReservedRangeEnd::None => start,
                    ast::ReservedRangeEnd::Int(end) => enum_number(end),
                    ast::ReservedRangeEnd::Max => max,
                };
                Reserved::Range { start, end }
            })
            .collect(),
        ast::ReservedKind::Names(names) => names
            .iter()
            .map(|name| Reserved::Name(name.value.clone()))
            .collect(),
    }
}

fn build_key_type(ty: ast::KeyTy) -> ScalarType {
    match ty {
        ast::KeyTy::Int32 => ScalarType::Int32,
        ast::KeyTy::Int64 => ScalarType::Int64,
        ast::KeyTy::Uint32 => ScalarType::Uint32,
        ast::KeyTy::Uint64 => ScalarType::Uint64,
        ast::KeyTy::Sint32 => ScalarType::Sint32,
        ast::KeyTy::Sint64 => ScalarType::Sint64,
        ast::KeyTy::Fixed32 => ScalarType::Fixed32,
        ast::KeyTy::Fixed64 => ScalarType::Fixed64,
        ast::KeyTy::Sfixed32 => ScalarType::Sfixed32,
        ast::KeyTy::Sfixed64 => ScalarType::Sfixed64,
        ast::KeyTy::Bool => ScalarType::Bool,
        ast::KeyTy::String => ScalarType::String,
    }
}

fn split_default(options: &[ast::OptionBody]) -> (Option<OptionValue>, Vec<OptionDescriptor>) {
    let mut default_value = None;
    let mut rest = Vec::with_capacity(options.len());

    for option in options {
        match option.name.as_slice() {
            [ast::OptionNamePart::Ident(ident)] if ident.value == "default" => {
                default_value = Some(build_value(&option.value));
            }
            _ => rest.push(build_option(option)),
        }
    }

    (default_value, rest)
}

fn build_option(option: &ast::OptionBody) -> OptionDescriptor {
    OptionDescriptor {
        name: option
            .name
            .iter()
            .map(|part| match part {
                ast::OptionNamePart::Ident(ident) => OptionNamePart {
                    name: ident.value.clone(),
                    is_extension: false,
                },
                ast::OptionNamePart::Extension(name, _) => OptionNamePart {
                    name: name.to_string(),
                    is_extension: true,
                },
            })
            .collect(),
        value: build_value(&option.value),
    }
}

fn build_value(value: &ast::Constant) -> OptionValue {
    match value {
        ast::Constant::FullIdent(ident) => OptionValue::Ident(ident.to_string()),
        ast::Constant::Int(int) => {
            let magnitude = i128::from(int.value);
            OptionValue::Int(if int.negative { -magnitude } else { magnitude })
        }
        ast::Constant::Float(float) => OptionValue::Float(float.value),
        ast::Constant::String(string) => OptionValue::String(string.value.clone()),
    }
}

// Range checked by the parser.
fn field_number(int: &ast::Int) -> u32 {
    debug_assert!(!int.negative && int.value <= MAX_MESSAGE_FIELD_NUMBER as u64);
    int.value as u32
}

// Range checked by the parser.
fn enum_number(int: &ast::Int) -> i32 {
    let value = int.value as i64;
    let value = if int.negative { -value } else { value };
    debug_assert!(i32::try_from(value).is_ok());
    value as i32
}
