use prost::Message;
use prost_types::{
    descriptor_proto, enum_descriptor_proto, field_descriptor_proto, uninterpreted_option,
    DescriptorProto, EnumDescriptorProto, EnumOptions, EnumValueDescriptorProto, EnumValueOptions,
    FieldDescriptorProto, FieldOptions, FileDescriptorProto, FileOptions, MessageOptions,
    MethodDescriptorProto, MethodOptions, OneofDescriptorProto, OneofOptions,
    ServiceDescriptorProto, ServiceOptions, UninterpretedOption,
};

use crate::case::{map_entry_name, to_json_name};

use super::*;

impl FileDescriptor {
    /// Converts this descriptor to the protobuf representation of a file descriptor.
    ///
    /// Options are stored uninterpreted. Map fields generate a nested `*Entry` message, and proto3
    /// `optional` fields are wrapped in a synthetic oneof, matching the output of `protoc`.
    pub fn to_file_descriptor_proto(&self) -> FileDescriptorProto {
        let scope = match &self.package {
            Some(package) => format!(".{}", package),
            None => String::new(),
        };

        let mut message_type = Vec::new();
        let mut enum_type = Vec::new();
        let mut service = Vec::new();
        for definition in &self.definitions {
            match definition {
                Definition::Message(message) => message_type.push(message.to_proto(&scope)),
                Definition::Enum(enm) => enum_type.push(enm.to_proto()),
                Definition::Service(svc) => service.push(svc.to_proto()),
            }
        }

        let mut public_dependency = Vec::new();
        let mut weak_dependency = Vec::new();
        for (index, import) in self.imports.iter().enumerate() {
            match import.kind {
                ImportKind::Default => {}
                ImportKind::Public => public_dependency.push(index as i32),
                ImportKind::Weak => weak_dependency.push(index as i32),
            }
        }

        FileDescriptorProto {
            name: Some(self.name.clone()),
            package: self.package.clone(),
            dependency: self.imports.iter().map(|i| i.path.clone()).collect(),
            public_dependency,
            weak_dependency,
            message_type,
            enum_type,
            service,
            options: uninterpreted(&self.options).map(|uninterpreted_option| FileOptions {
                uninterpreted_option,
                ..Default::default()
            }),
            syntax: match self.syntax {
                Syntax::Proto2 => None,
                Syntax::Proto3 => Some(Syntax::Proto3.as_str().to_owned()),
            },
            ..Default::default()
        }
    }

    /// Encodes the result of [`FileDescriptor::to_file_descriptor_proto`] in the protobuf binary
    /// format.
    pub fn encode_file_descriptor_proto(&self) -> Vec<u8> {
        self.to_file_descriptor_proto().encode_to_vec()
    }
}

impl MessageDescriptor {
    fn to_proto(&self, scope: &str) -> DescriptorProto {
        let full_name = format!("{}.{}", scope, self.name);

        let mut nested_type = Vec::new();
        let mut enum_type = Vec::new();
        for nested in &self.nested {
            match nested {
                NestedDefinition::Message(message) => nested_type.push(message.to_proto(&full_name)),
                NestedDefinition::Enum(enm) => enum_type.push(enm.to_proto()),
            }
        }

        let mut oneof_decl: Vec<OneofDescriptorProto> =
            self.oneofs.iter().map(OneofDescriptor::to_proto).collect();

        let mut field = Vec::with_capacity(self.fields.len());
        for desc in &self.fields {
            let mut proto = desc.to_proto();

            if let FieldType::Map { key, value } = &desc.ty {
                let entry_name = map_entry_name(&desc.name);
                proto.r#type = Some(field_descriptor_proto::Type::Message as i32);
                proto.type_name = Some(format!("{}.{}", full_name, entry_name));
                nested_type.push(map_entry(entry_name, *key, value));
            }

            if desc.proto3_optional {
                proto.oneof_index = Some(oneof_decl.len() as i32);
                oneof_decl.push(OneofDescriptorProto {
                    name: Some(format!("_{}", desc.name)),
                    options: None,
                });
            }

            field.push(proto);
        }

        let mut reserved_range = Vec::new();
        let mut reserved_name = Vec::new();
        for reserved in &self.reserved {
            match reserved {
                Reserved::Range { start, end } => {
                    reserved_range.push(descriptor_proto::ReservedRange {
                        start: Some(*start),
                        end: Some(end.saturating_add(1)),
                    })
                }
                Reserved::Name(name) => reserved_name.push(name.clone()),
            }
        }

        DescriptorProto {
            name: Some(self.name.clone()),
            field,
            nested_type,
            enum_type,
            oneof_decl,
            options: uninterpreted(&self.options).map(|uninterpreted_option| MessageOptions {
                uninterpreted_option,
                ..Default::default()
            }),
            reserved_range,
            reserved_name,
            ..Default::default()
        }
    }
}

fn map_entry(name: String, key: ScalarType, value: &FieldType) -> DescriptorProto {
    let key_field = FieldDescriptorProto {
        name: Some("key".to_owned()),
        number: Some(1),
        label: Some(field_descriptor_proto::Label::Optional as i32),
        r#type: Some(scalar_type(key) as i32),
        json_name: Some("key".to_owned()),
        ..Default::default()
    };

    let (r#type, type_name) = type_and_name(value);
    let value_field = FieldDescriptorProto {
        name: Some("value".to_owned()),
        number: Some(2),
        label: Some(field_descriptor_proto::Label::Optional as i32),
        r#type,
        type_name,
        json_name: Some("value".to_owned()),
        ..Default::default()
    };

    DescriptorProto {
        name: Some(name),
        field: vec![key_field, value_field],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl FieldDescriptor {
    fn to_proto(&self) -> FieldDescriptorProto {
        let label = match self.label {
            Label::Optional => field_descriptor_proto::Label::Optional,
            Label::Required => field_descriptor_proto::Label::Required,
            Label::Repeated => field_descriptor_proto::Label::Repeated,
        };
        let (r#type, type_name) = type_and_name(&self.ty);

        FieldDescriptorProto {
            name: Some(self.name.clone()),
            number: Some(self.number as i32),
            label: Some(label as i32),
            r#type,
            type_name,
            default_value: self
                .default_value
                .as_ref()
                .map(|value| default_value(&self.ty, value)),
            oneof_index: self.oneof_index.map(|index| index as i32),
            json_name: Some(to_json_name(&self.name)),
            options: uninterpreted(&self.options).map(|uninterpreted_option| FieldOptions {
                uninterpreted_option,
                ..Default::default()
            }),
            proto3_optional: if self.proto3_optional {
                Some(true)
            } else {
                None
            },
            ..Default::default()
        }
    }
}

/// The type of a field. Unresolved names leave the type unset, as `protoc` does before linking.
fn type_and_name(ty: &FieldType) -> (Option<i32>, Option<String>) {
    match ty {
        FieldType::Scalar(scalar) => (Some(scalar_type(*scalar) as i32), None),
        FieldType::Named(TypeRef::Message(name)) => (
            Some(field_descriptor_proto::Type::Message as i32),
            Some(name.clone()),
        ),
        FieldType::Named(TypeRef::Enum(name)) => (
            Some(field_descriptor_proto::Type::Enum as i32),
            Some(name.clone()),
        ),
        FieldType::Named(TypeRef::Unresolved(name)) => (None, Some(name.clone())),
        // Replaced with a reference to the entry message by the caller.
        FieldType::Map { .. } => (None, None),
    }
}

fn scalar_type(ty: ScalarType) -> field_descriptor_proto::Type {
    match ty {
        ScalarType::Double => field_descriptor_proto::Type::Double,
        ScalarType::Float => field_descriptor_proto::Type::Float,
        ScalarType::Int32 => field_descriptor_proto::Type::Int32,
        ScalarType::Int64 => field_descriptor_proto::Type::Int64,
        ScalarType::Uint32 => field_descriptor_proto::Type::Uint32,
        ScalarType::Uint64 => field_descriptor_proto::Type::Uint64,
        ScalarType::Sint32 => field_descriptor_proto::Type::Sint32,
        ScalarType::Sint64 => field_descriptor_proto::Type::Sint64,
        ScalarType::Fixed32 => field_descriptor_proto::Type::Fixed32,
        ScalarType::Fixed64 => field_descriptor_proto::Type::Fixed64,
        ScalarType::Sfixed32 => field_descriptor_proto::Type::Sfixed32,
        ScalarType::Sfixed64 => field_descriptor_proto::Type::Sfixed64,
        ScalarType::Bool => field_descriptor_proto::Type::Bool,
        ScalarType::String => field_descriptor_proto::Type::String,
        ScalarType::Bytes => field_descriptor_proto::Type::Bytes,
    }
}

/// Renders a default value the way `FieldDescriptorProto.default_value` stores it: strings
/// verbatim, bytes C-escaped, and everything else in its text form.
fn default_value(ty: &FieldType, value: &OptionValue) -> String {
    match value {
        OptionValue::String(bytes) => {
            if matches!(ty, FieldType::Scalar(ScalarType::Bytes)) {
                let quoted = Quoted(bytes).to_string();
                quoted[1..quoted.len() - 1].to_owned()
            } else {
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
        OptionValue::Ident(ident) => ident.clone(),
        OptionValue::Int(int) => int.to_string(),
        OptionValue::Float(float) => Float(*float).to_string(),
    }
}

impl OneofDescriptor {
    fn to_proto(&self) -> OneofDescriptorProto {
        OneofDescriptorProto {
            name: Some(self.name.clone()),
            options: uninterpreted(&self.options).map(|uninterpreted_option| OneofOptions {
                uninterpreted_option,
                ..Default::default()
            }),
        }
    }
}

impl EnumDescriptor {
    fn to_proto(&self) -> EnumDescriptorProto {
        let mut reserved_range = Vec::new();
        let mut reserved_name = Vec::new();
        for reserved in &self.reserved {
            match reserved {
                Reserved::Range { start, end } => {
                    reserved_range.push(enum_descriptor_proto::EnumReservedRange {
                        start: Some(*start),
                        end: Some(*end),
                    })
                }
                Reserved::Name(name) => reserved_name.push(name.clone()),
            }
        }

        EnumDescriptorProto {
            name: Some(self.name.clone()),
            value: self
                .values
                .iter()
                .map(|value| EnumValueDescriptorProto {
                    name: Some(value.name.clone()),
                    number: Some(value.number),
                    options: uninterpreted(&value.options).map(|uninterpreted_option| {
                        EnumValueOptions {
                            uninterpreted_option,
                            ..Default::default()
                        }
                    }),
                })
                .collect(),
            options: uninterpreted(&self.options).map(|uninterpreted_option| EnumOptions {
                uninterpreted_option,
                ..Default::default()
            }),
            reserved_range,
            reserved_name,
        }
    }
}

impl ServiceDescriptor {
    fn to_proto(&self) -> ServiceDescriptorProto {
        ServiceDescriptorProto {
            name: Some(self.name.clone()),
            method: self
                .methods
                .iter()
                .map(|method| MethodDescriptorProto {
                    name: Some(method.name.clone()),
                    input_type: Some(method.input_type.name().to_owned()),
                    output_type: Some(method.output_type.name().to_owned()),
                    options: uninterpreted(&method.options).map(|uninterpreted_option| {
                        MethodOptions {
                            uninterpreted_option,
                            ..Default::default()
                        }
                    }),
                    client_streaming: Some(method.client_streaming),
                    server_streaming: Some(method.server_streaming),
                })
                .collect(),
            options: uninterpreted(&self.options).map(|uninterpreted_option| ServiceOptions {
                uninterpreted_option,
                ..Default::default()
            }),
        }
    }
}

fn uninterpreted(options: &[OptionDescriptor]) -> Option<Vec<UninterpretedOption>> {
    if options.is_empty() {
        return None;
    }

    Some(options.iter().map(OptionDescriptor::to_uninterpreted).collect())
}

impl OptionDescriptor {
    fn to_uninterpreted(&self) -> UninterpretedOption {
        let name = self
            .name
            .iter()
            .map(|part| uninterpreted_option::NamePart {
                name_part: part.name.clone(),
                is_extension: part.is_extension,
            })
            .collect();

        match &self.value {
            OptionValue::Ident(ident) => UninterpretedOption {
                name,
                identifier_value: Some(ident.clone()),
                ..Default::default()
            },
            OptionValue::Int(int) if *int >= 0 => UninterpretedOption {
                name,
                positive_int_value: u64::try_from(*int).ok(),
                ..Default::default()
            },
            OptionValue::Int(int) => UninterpretedOption {
                name,
                negative_int_value: i64::try_from(*int).ok(),
                // values below i64::MIN can only be represented as a double
                double_value: i64::try_from(*int).err().map(|_| *int as f64),
                ..Default::default()
            },
            OptionValue::Float(float) => UninterpretedOption {
                name,
                double_value: Some(*float),
                ..Default::default()
            },
            OptionValue::String(string) => UninterpretedOption {
                name,
                string_value: Some(string.clone()),
                ..Default::default()
            },
        }
    }
}
