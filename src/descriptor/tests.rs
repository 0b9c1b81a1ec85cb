use prost::Message;
use prost_types::{field_descriptor_proto, FileDescriptorProto};

use super::*;
use crate::parse::parse_file;

fn descriptor(source: &str) -> FileDescriptor {
    let file = parse_file(source, "test.proto").expect("failed to parse test source");
    build(&file)
}

fn message<'a>(file: &'a FileDescriptor, name: &str) -> &'a MessageDescriptor {
    file.messages()
        .find(|message| message.name == name)
        .expect("message not found")
}

#[test]
fn build_header() {
    let file = descriptor(
        "syntax = 'proto3';
        package foo.bar;
        import 'a.proto';
        import public 'b.proto';
        import weak 'c.proto';
        option java_package = 'com.foo';",
    );

    assert_eq!(file.name, "test.proto");
    assert_eq!(file.syntax, Syntax::Proto3);
    assert_eq!(file.package.as_deref(), Some("foo.bar"));
    let imports: Vec<_> = file.imports.iter().map(|i| (i.path.as_str(), i.kind)).collect();
    assert_eq!(
        imports,
        [
            ("a.proto", ImportKind::Default),
            ("b.proto", ImportKind::Public),
            ("c.proto", ImportKind::Weak),
        ]
    );
    assert_eq!(file.options.len(), 1);
    assert_eq!(file.options[0].to_string(), "java_package = \"com.foo\"");
}

#[test]
fn proto2_is_default_syntax() {
    let file = descriptor("message Foo {}");
    assert_eq!(file.syntax, Syntax::Proto2);
    assert_eq!(file.package, None);
}

#[test]
fn field_labels() {
    let file = descriptor(
        "syntax = 'proto3';
        message Foo {
            int32 a = 1;
            optional int32 b = 2;
            repeated int32 c = 3;
            map<string, int32> d = 4;
            oneof e { int32 f = 5; }
        }",
    );
    let foo = message(&file, "Foo");

    let labels: Vec<_> = foo
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.label, f.proto3_optional, f.oneof_index))
        .collect();
    assert_eq!(
        labels,
        [
            ("a", Label::Optional, false, None),
            ("b", Label::Optional, true, None),
            ("c", Label::Repeated, false, None),
            ("d", Label::Repeated, false, None),
            ("f", Label::Optional, false, Some(0)),
        ]
    );
    assert_eq!(foo.oneofs.len(), 1);
    assert_eq!(foo.oneofs[0].name, "e");

    let file = descriptor("message Foo { int32 a = 1; optional int32 b = 2; required int32 c = 3; }");
    let foo = message(&file, "Foo");
    let labels: Vec<_> = foo.fields.iter().map(|f| (f.label, f.proto3_optional)).collect();
    assert_eq!(
        labels,
        [
            (Label::Optional, false),
            (Label::Optional, false),
            (Label::Required, false),
        ]
    );
}

#[test]
fn map_fields() {
    let file = descriptor("message Foo { map<int64, Foo> children = 1; }");
    let field = &message(&file, "Foo").fields[0];

    assert_eq!(
        field.ty,
        FieldType::Map {
            key: ScalarType::Int64,
            value: Box::new(FieldType::Named(TypeRef::Message(".Foo".to_owned()))),
        }
    );
    assert_eq!(field.ty.to_string(), "map<int64, .Foo>");
}

#[test]
fn default_value_is_extracted() {
    let file = descriptor("message Foo { optional int32 a = 1 [default = -5, deprecated = true]; }");
    let field = &message(&file, "Foo").fields[0];

    assert_eq!(field.default_value, Some(OptionValue::Int(-5)));
    assert_eq!(field.options.len(), 1);
    assert_eq!(field.options[0].to_string(), "deprecated = true");
}

#[test]
fn type_resolution() {
    let file = descriptor(
        "syntax = 'proto3';
        package pkg;
        message Outer {
            message Inner { Kind kind = 1; Outer outer = 2; }
            enum Kind { A = 0; }
            Inner inner = 1;
            Outer.Inner qualified = 2;
            .pkg.Outer absolute = 3;
            pkg.Outer packaged = 4;
            google.protobuf.Timestamp external = 5;
            Missing missing = 6;
            Inner.Missing partial = 7;
        }
        service S { rpc M(Outer) returns (.google.protobuf.Empty); }",
    );

    let outer = message(&file, "Outer");
    let types: Vec<_> = outer.fields.iter().map(|f| f.ty.clone()).collect();
    assert_eq!(
        types,
        [
            FieldType::Named(TypeRef::Message(".pkg.Outer.Inner".to_owned())),
            FieldType::Named(TypeRef::Message(".pkg.Outer.Inner".to_owned())),
            FieldType::Named(TypeRef::Message(".pkg.Outer".to_owned())),
            FieldType::Named(TypeRef::Message(".pkg.Outer".to_owned())),
            FieldType::Named(TypeRef::Unresolved("google.protobuf.Timestamp".to_owned())),
            FieldType::Named(TypeRef::Unresolved("Missing".to_owned())),
            FieldType::Named(TypeRef::Unresolved("Inner.Missing".to_owned())),
        ]
    );

    let inner = match &outer.nested[0] {
        NestedDefinition::Message(inner) => inner,
        NestedDefinition::Enum(_) => panic!("expected message"),
    };
    assert_eq!(
        inner.fields[0].ty,
        FieldType::Named(TypeRef::Enum(".pkg.Outer.Kind".to_owned()))
    );
    assert_eq!(
        inner.fields[1].ty,
        FieldType::Named(TypeRef::Message(".pkg.Outer".to_owned()))
    );

    let service = file.services().next().expect("service not found");
    assert_eq!(
        service.methods[0].input_type,
        TypeRef::Message(".pkg.Outer".to_owned())
    );
    assert_eq!(
        service.methods[0].output_type,
        TypeRef::Unresolved(".google.protobuf.Empty".to_owned())
    );
}

#[test]
fn reserved_ranges() {
    let file = descriptor(
        "message Foo { reserved 1, 5 to 10, 100 to max; reserved 'a'; }
        enum Bar { ZERO = 0; reserved -5 to -1, 10 to max; }",
    );

    let foo = message(&file, "Foo");
    let ranges: Vec<_> = foo
        .reserved
        .iter()
        .map(|r| match r {
            Reserved::Range { start, end } => format!("{}..={}", start, end),
            Reserved::Name(name) => name.clone(),
        })
        .collect();
    assert_eq!(ranges, ["1..=1", "5..=10", "100..=536870911", "a"]);

    let bar = file.enums().next().expect("enum not found");
    let ranges: Vec<_> = bar
        .reserved
        .iter()
        .map(|r| match r {
            Reserved::Range { start, end } => (*start, *end),
            Reserved::Name(_) => panic!("expected range"),
        })
        .collect();
    assert_eq!(ranges, [(-5, -1), (10, i32::MAX)]);
}

#[test]
fn enum_values() {
    let file = descriptor("enum E { option allow_alias = true; A = 0; B = 0; C = -2147483648; }");
    let enm = file.enums().next().expect("enum not found");

    let values: Vec<_> = enm.values.iter().map(|v| (v.name.as_str(), v.number)).collect();
    assert_eq!(values, [("A", 0), ("B", 0), ("C", i32::MIN)]);
    assert_eq!(enm.options[0].to_string(), "allow_alias = true");
}

#[test]
fn normalize_only_changes_name() {
    let a = descriptor("syntax = 'proto3'; message Foo { string a = 1; }");
    let mut b = descriptor("syntax = 'proto3'; message Foo { string a = 1; }");
    b.name = "other.proto".to_owned();

    assert_ne!(a, b);
    assert_eq!(a.normalize("x.proto"), b.normalize("x.proto"));
    assert_eq!(a.normalize("x.proto").name, "x.proto");
    assert_eq!(b.name, "other.proto");
}

#[test]
fn equality_is_order_sensitive() {
    let a = descriptor("message Foo { string a = 1; string b = 2; }");
    let b = descriptor("message Foo { string b = 2; string a = 1; }");
    assert_ne!(a, b);

    let a = descriptor("message A {} message B {}");
    let b = descriptor("message B {} message A {}");
    assert_ne!(a, b);

    let a = descriptor("enum E { X = 0; Y = 1; }");
    let b = descriptor("enum E { Y = 1; X = 0; }");
    assert_ne!(a, b);
}

#[test]
fn equality_ignores_lexical_form() {
    let a = descriptor("message Foo { int32 a = 0x10 [(x) = 'abc', y = 1.0]; }");
    let b = descriptor(
        "// comment\nmessage Foo {\n  /* block */ int32 a = 16 [(x) = \"a\" \"bc\", y = 1.];\n}\n",
    );
    assert_eq!(a, b);
}

#[test]
fn equality_detects_changes() {
    let base = descriptor("syntax = 'proto3'; message Foo { int32 a = 1; }");

    for changed in [
        "syntax = 'proto3'; message Foo { int64 a = 1; }",
        "syntax = 'proto3'; message Foo { int32 b = 1; }",
        "syntax = 'proto3'; message Foo { int32 a = 2; }",
        "syntax = 'proto3'; message Foo { repeated int32 a = 1; }",
        "syntax = 'proto3'; message Foo { optional int32 a = 1; }",
        "syntax = 'proto3'; message Foo { int32 a = 1 [deprecated = true]; }",
        "syntax = 'proto3'; message Foo { oneof o { int32 a = 1; } }",
        "syntax = 'proto3'; package p; message Foo { int32 a = 1; }",
        "syntax = 'proto3'; import 'x.proto'; message Foo { int32 a = 1; }",
        "syntax = 'proto3'; message Foo { int32 a = 1; reserved 2; }",
        "syntax = 'proto2'; message Foo { optional int32 a = 1; }",
        "syntax = 'proto3'; message Bar { int32 a = 1; }",
        "syntax = 'proto3'; enum Foo { a = 0; }",
    ] {
        assert_ne!(base, descriptor(changed), "{}", changed);
    }
}

#[test]
fn nan_options_are_equal() {
    let a = descriptor("option x = nan; option y = -nan;");
    assert!(matches!(a.options[0].value, OptionValue::Ident(_)));
    assert!(matches!(a.options[1].value, OptionValue::Float(f) if f.is_nan()));
    assert_eq!(a, a.clone());
}

#[test]
fn file_descriptor_proto() {
    let file = descriptor(
        "syntax = 'proto3';
        package pkg;
        import public 'other.proto';
        option java_outer_classname = 'Foo';
        message Foo {
            optional string name_value = 1;
            map<string, Foo> children = 2;
            oneof choice { int32 x = 3; }
            reserved 10 to 20;
        }
        enum E { A = 0; }
        service S { rpc M(stream Foo) returns (Foo); }",
    );

    let proto = file.to_file_descriptor_proto();
    assert_eq!(proto.name.as_deref(), Some("test.proto"));
    assert_eq!(proto.package.as_deref(), Some("pkg"));
    assert_eq!(proto.syntax.as_deref(), Some("proto3"));
    assert_eq!(proto.dependency, ["other.proto"]);
    assert_eq!(proto.public_dependency, [0]);

    let options = proto.options.as_ref().expect("missing file options");
    assert_eq!(options.uninterpreted_option.len(), 1);
    assert_eq!(
        options.uninterpreted_option[0].name[0].name_part,
        "java_outer_classname"
    );
    assert_eq!(
        options.uninterpreted_option[0].string_value.as_deref(),
        Some(b"Foo".as_ref())
    );

    let foo = &proto.message_type[0];
    assert_eq!(foo.name.as_deref(), Some("Foo"));

    let name_value = &foo.field[0];
    assert_eq!(name_value.json_name.as_deref(), Some("nameValue"));
    assert_eq!(name_value.proto3_optional, Some(true));
    assert_eq!(name_value.oneof_index, Some(1));

    let children = &foo.field[1];
    assert_eq!(
        children.r#type,
        Some(field_descriptor_proto::Type::Message as i32)
    );
    assert_eq!(
        children.label,
        Some(field_descriptor_proto::Label::Repeated as i32)
    );
    assert_eq!(children.type_name.as_deref(), Some(".pkg.Foo.ChildrenEntry"));

    let entry = &foo.nested_type[0];
    assert_eq!(entry.name.as_deref(), Some("ChildrenEntry"));
    assert_eq!(entry.options.as_ref().and_then(|o| o.map_entry), Some(true));
    assert_eq!(entry.field[1].type_name.as_deref(), Some(".pkg.Foo"));

    assert_eq!(foo.field[2].oneof_index, Some(0));
    let oneofs: Vec<_> = foo.oneof_decl.iter().map(|o| o.name.as_deref()).collect();
    assert_eq!(oneofs, [Some("choice"), Some("_name_value")]);

    assert_eq!(foo.reserved_range[0].start, Some(10));
    assert_eq!(foo.reserved_range[0].end, Some(21));

    assert_eq!(proto.enum_type[0].value[0].name.as_deref(), Some("A"));

    let method = &proto.service[0].method[0];
    assert_eq!(method.input_type.as_deref(), Some(".pkg.Foo"));
    assert_eq!(method.client_streaming, Some(true));
    assert_eq!(method.server_streaming, Some(false));

    let encoded = file.encode_file_descriptor_proto();
    assert_eq!(
        FileDescriptorProto::decode(encoded.as_slice()).expect("failed to decode"),
        proto
    );
}
