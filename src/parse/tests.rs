use super::*;

macro_rules! case {
    ($method:ident($source:expr $(, $arg:expr)*)) => {{
        let mut parser = Parser::new($source);
        let result = parser.$method($($arg),*);
        if parser.lexer.extras.errors.is_empty() {
            Ok(result.expect("parser failed without reporting an error"))
        } else {
            Err(parser.lexer.extras.errors)
        }
    }};
}

fn ident(value: &str, span: Span) -> ast::Ident {
    ast::Ident::new(value, span)
}

#[test]
fn parse_package() {
    let package = case!(parse_package("package foo.bar;")).unwrap();
    assert_eq!(package.name.to_string(), "foo.bar");
    assert_eq!(package.span, 0..16);

    assert_eq!(
        case!(parse_package("package =")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "an identifier".to_owned(),
            found: "=".to_owned(),
            span: 8..9,
        }])
    );
    assert_eq!(
        case!(parse_package("package foo")),
        Err(vec![ParseErrorKind::UnexpectedEof {
            expected: "';'".to_owned(),
        }])
    );
}

#[test]
fn parse_import() {
    let import = case!(parse_import("import 'foo.proto';")).unwrap();
    assert_eq!(import.kind, None);
    assert_eq!(import.value, "foo.proto");
    assert_eq!(import.value_span, 7..18);

    let import = case!(parse_import("import weak \"foo\" '.proto';")).unwrap();
    assert_eq!(import.kind, Some(ast::ImportKind::Weak));
    assert_eq!(import.value, "foo.proto");

    let import = case!(parse_import("import public 'foo.proto';")).unwrap();
    assert_eq!(import.kind, Some(ast::ImportKind::Public));

    assert_eq!(
        case!(parse_import("import foo;")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "a string literal, 'public' or 'weak'".to_owned(),
            found: "foo".to_owned(),
            span: 7..10,
        }])
    );
    assert_eq!(
        case!(parse_import("import '\\xff';")),
        Err(vec![ParseErrorKind::InvalidUtf8String { span: 7..13 }])
    );
}

#[test]
fn parse_option() {
    let option = case!(parse_option("option foo = 5;")).unwrap();
    assert_eq!(
        option.body,
        ast::OptionBody {
            name: vec![ast::OptionNamePart::Ident(ident("foo", 7..10))],
            value: ast::Constant::Int(ast::Int {
                negative: false,
                value: 5,
                span: 13..14,
            }),
        }
    );

    let option = case!(parse_option("option (foo.bar).baz = \"hello\";")).unwrap();
    let name: Vec<String> = option.body.name.iter().map(|p| p.to_string()).collect();
    assert_eq!(name, ["(foo.bar)", "baz"]);
    assert!(matches!(
        option.body.value,
        ast::Constant::String(ast::String { ref value, .. }) if value == b"hello"
    ));

    let option = case!(parse_option("option optimize_for = google.protobuf.SPEED;")).unwrap();
    assert!(matches!(
        option.body.value,
        ast::Constant::FullIdent(ref name) if name.to_string() == "google.protobuf.SPEED"
    ));

    let option = case!(parse_option("option foo = -inf;")).unwrap();
    assert!(matches!(
        option.body.value,
        ast::Constant::Float(ast::Float { value, .. }) if value == f64::NEG_INFINITY
    ));

    let option = case!(parse_option("option foo = -0.5;")).unwrap();
    assert!(matches!(
        option.body.value,
        ast::Constant::Float(ast::Float { value, .. }) if value == -0.5
    ));

    let option = case!(parse_option("option foo = -10;")).unwrap();
    assert!(matches!(
        option.body.value,
        ast::Constant::Int(ast::Int { negative: true, value: 10, .. })
    ));

    let option = case!(parse_option("option message = 1;")).unwrap();
    assert_eq!(option.body.name[0].to_string(), "message");

    assert_eq!(
        case!(parse_option("option ;")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "an identifier or '('".to_owned(),
            found: ";".to_owned(),
            span: 7..8,
        }])
    );
    assert_eq!(
        case!(parse_option("option foo = -'a';")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "a numeric literal".to_owned(),
            found: "\"a\"".to_owned(),
            span: 14..17,
        }])
    );
    assert_eq!(
        case!(parse_option("option (ext).foo = { foo: 5 };")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "aggregate option values",
            span: 19..29,
        }])
    );
    assert_eq!(
        case!(parse_option("option foo = {")),
        Err(vec![ParseErrorKind::UnexpectedEof {
            expected: "'}'".to_owned(),
        }])
    );
}

#[test]
fn parse_enum() {
    let enm = case!(parse_enum("enum Foo {}")).unwrap();
    assert_eq!(enm.name, ident("Foo", 5..8));
    assert!(enm.items.is_empty());

    let enm = case!(parse_enum("enum Foo { ; ; }")).unwrap();
    assert!(enm.items.is_empty());

    let enm =
        case!(parse_enum("enum Foo { option bar = 'quz' ; VAL = -1; BAZ = 2 [deprecated = true]; }"))
            .unwrap();
    assert_eq!(enm.items.len(), 3);
    assert!(matches!(&enm.items[0], ast::EnumItem::Option(_)));
    match &enm.items[1] {
        ast::EnumItem::Value(value) => {
            assert_eq!(value.name.value, "VAL");
            assert!(value.value.negative);
            assert_eq!(value.value.value, 1);
        }
        item => panic!("unexpected item {:?}", item),
    }
    match &enm.items[2] {
        ast::EnumItem::Value(value) => {
            assert_eq!(value.options.len(), 1);
            assert_eq!(value.options[0].name[0].to_string(), "deprecated");
        }
        item => panic!("unexpected item {:?}", item),
    }

    let enm = case!(parse_enum("enum Foo { BAR = 0; reserved -1 to max; }")).unwrap();
    match &enm.items[1] {
        ast::EnumItem::Reserved(ast::Reserved {
            kind: ast::ReservedKind::Ranges(ranges),
            ..
        }) => {
            assert_eq!(ranges.len(), 1);
            assert!(ranges[0].start.negative);
            assert_eq!(ranges[0].end, ast::ReservedRangeEnd::Max);
        }
        item => panic!("unexpected item {:?}", item),
    }

    assert_eq!(
        case!(parse_enum("enum 3")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "an identifier".to_owned(),
            found: "3".to_owned(),
            span: 5..6,
        }])
    );
    assert_eq!(
        case!(parse_enum("enum Foo { BAR = 0 }")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "';' or '['".to_owned(),
            found: "}".to_owned(),
            span: 19..20,
        }])
    );
    assert_eq!(
        case!(parse_enum("enum Foo { BAR = 2147483648; }")),
        Err(vec![ParseErrorKind::InvalidEnumNumber { span: 17..27 }])
    );
    assert!(case!(parse_enum("enum Foo { BAR = -2147483648; }")).is_ok());
}

#[test]
fn parse_service() {
    let service = case!(parse_service("service Foo {}")).unwrap();
    assert!(service.items.is_empty());

    let service = case!(parse_service("service service { }")).unwrap();
    assert_eq!(service.name.value, "service");

    let service = case!(parse_service(
        "service Foo { rpc bar(A) returns (.B.C); option deprecated = true; }"
    ))
    .unwrap();
    assert_eq!(service.items.len(), 2);
    match &service.items[0] {
        ast::ServiceItem::Method(method) => {
            assert_eq!(method.name.value, "bar");
            assert_eq!(method.input_ty.to_string(), "A");
            assert_eq!(method.output_ty.to_string(), ".B.C");
            assert!(!method.is_client_streaming);
            assert!(!method.is_server_streaming);
            assert!(method.options.is_empty());
        }
        item => panic!("unexpected item {:?}", item),
    }

    let service = case!(parse_service(
        "service Foo { rpc bar(stream A) returns (stream B) { option idempotency_level = NO_SIDE_EFFECTS; } }"
    ))
    .unwrap();
    match &service.items[0] {
        ast::ServiceItem::Method(method) => {
            assert!(method.is_client_streaming);
            assert!(method.is_server_streaming);
            assert_eq!(method.options.len(), 1);
        }
        item => panic!("unexpected item {:?}", item),
    }

    assert_eq!(
        case!(parse_service("service Foo { rpc bar(A) returns B; }")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "'('".to_owned(),
            found: "B".to_owned(),
            span: 33..34,
        }])
    );
}

#[test]
fn parse_method_stream_type_name() {
    let method = case!(parse_method("rpc bar(stream) returns (stream.foo);")).unwrap();
    assert!(!method.is_client_streaming);
    assert_eq!(method.input_ty.to_string(), "stream");
    assert!(method.is_server_streaming);
    assert_eq!(method.output_ty.to_string(), ".foo");

    let method = case!(parse_method("rpc bar(stream .chat.Msg) returns (stream .chat.Msg);")).unwrap();
    assert!(method.is_client_streaming);
    assert_eq!(method.input_ty.to_string(), ".chat.Msg");
    assert!(method.is_server_streaming);
    assert_eq!(method.output_ty.to_string(), ".chat.Msg");

    let method = case!(parse_method("rpc bar(stream stream) returns (stream foo.bar);")).unwrap();
    assert!(method.is_client_streaming);
    assert_eq!(method.input_ty.to_string(), "stream");
    assert!(method.is_server_streaming);
    assert_eq!(method.output_ty.to_string(), "foo.bar");
}

#[test]
fn parse_reserved() {
    let reserved = case!(parse_reserved("reserved 1, 3 to 5, 10 to max;", false)).unwrap();
    match reserved.kind {
        ast::ReservedKind::Ranges(ranges) => {
            assert_eq!(ranges.len(), 3);
            assert_eq!(ranges[0].start.value, 1);
            assert_eq!(ranges[0].end, ast::ReservedRangeEnd::None);
            assert!(matches!(
                ranges[1].end,
                ast::ReservedRangeEnd::Int(ast::Int { value: 5, .. })
            ));
            assert_eq!(ranges[2].end, ast::ReservedRangeEnd::Max);
        }
        kind => panic!("unexpected kind {:?}", kind),
    }

    let reserved = case!(parse_reserved("reserved 'foo', \"bar\";", false)).unwrap();
    assert_eq!(
        reserved.kind,
        ast::ReservedKind::Names(vec![ident("foo", 9..14), ident("bar", 16..21)])
    );

    assert_eq!(
        case!(parse_reserved("reserved '0foo';", false)),
        Err(vec![ParseErrorKind::InvalidIdentifier { span: 9..15 }])
    );
    assert_eq!(
        case!(parse_reserved("reserved -1;", false)),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "a positive integer or string".to_owned(),
            found: "-".to_owned(),
            span: 9..10,
        }])
    );
    assert_eq!(
        case!(parse_reserved("reserved 0;", false)),
        Err(vec![ParseErrorKind::InvalidMessageNumber { span: 9..10 }])
    );
}

#[test]
fn parse_field() {
    let field = case!(parse_field("optional string foo = 1;")).unwrap();
    assert_eq!(field.label, Some(FieldLabel::Optional));
    assert_eq!(field.ty, ast::Ty::String);
    assert_eq!(field.name.value, "foo");
    assert_eq!(field.number.value, 1);
    assert_eq!(field.span, 0..24);

    let field = case!(parse_field("foo.Bar bar = 2 [default = 5, packed = true];")).unwrap();
    assert_eq!(field.label, None);
    assert_eq!(field.ty.to_string(), "foo.Bar");
    assert_eq!(field.options.len(), 2);

    let field = case!(parse_field("repeated .foo.Bar message = 3;")).unwrap();
    assert_eq!(field.label, Some(FieldLabel::Repeated));
    assert_eq!(field.ty.to_string(), ".foo.Bar");
    assert_eq!(field.name.value, "message");

    assert_eq!(
        case!(parse_field("int32 foo = 536870912;")),
        Err(vec![ParseErrorKind::InvalidMessageNumber { span: 12..21 }])
    );
    assert_eq!(
        case!(parse_field("int32 foo = 1")),
        Err(vec![ParseErrorKind::UnexpectedEof {
            expected: "';' or '['".to_owned(),
        }])
    );
    assert_eq!(
        case!(parse_field("optional group Foo = 1 { }")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "groups",
            span: 0..26,
        }])
    );
}

#[test]
fn parse_map() {
    let map = case!(parse_map("map<string, Project> projects = 3;")).unwrap();
    assert_eq!(map.key_ty, ast::KeyTy::String);
    assert_eq!(map.ty.to_string(), "Project");
    assert_eq!(map.name.value, "projects");
    assert_eq!(map.number.value, 3);

    assert_eq!(
        case!(parse_map("map<float, int32> foo = 1;")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "an integer type, 'bool' or 'string'".to_owned(),
            found: "float".to_owned(),
            span: 4..9,
        }])
    );
    assert_eq!(
        case!(parse_map("map<int32 int32> foo = 1;")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "','".to_owned(),
            found: "int32".to_owned(),
            span: 10..15,
        }])
    );
}

#[test]
fn parse_oneof() {
    let oneof = case!(parse_oneof("oneof foo { option bar = 1; string a = 1; int32 b = 2; }")).unwrap();
    assert_eq!(oneof.name.value, "foo");
    assert_eq!(oneof.items.len(), 3);

    assert_eq!(
        case!(parse_oneof("oneof foo { }")),
        Err(vec![ParseErrorKind::EmptyOneof { span: 0..13 }])
    );
    assert_eq!(
        case!(parse_oneof("oneof foo { repeated int32 a = 1; }")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected: "'='".to_owned(),
            found: "a".to_owned(),
            span: 27..28,
        }])
    );
    assert_eq!(
        case!(parse_oneof("oneof foo { group Bar = 1 { } }")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "groups",
            span: 12..29,
        }])
    );
}

#[test]
fn parse_message() {
    let message = case!(parse_message(
        "message Foo {
            int32 a = 1;
            map<int32, string> b = 2;
            oneof c { string d = 3; }
            message Bar {}
            enum Baz { ZERO = 0; }
            option deprecated = true;
            reserved 10 to 20;
        }"
    ))
    .unwrap();
    assert_eq!(message.name.value, "Foo");
    let kinds: Vec<&str> = message
        .body
        .items
        .iter()
        .map(|item| match item {
            ast::MessageItem::Field(_) => "field",
            ast::MessageItem::Map(_) => "map",
            ast::MessageItem::Oneof(_) => "oneof",
            ast::MessageItem::Message(_) => "message",
            ast::MessageItem::Enum(_) => "enum",
            ast::MessageItem::Option(_) => "option",
            ast::MessageItem::Reserved(_) => "reserved",
        })
        .collect();
    assert_eq!(
        kinds,
        ["field", "map", "oneof", "message", "enum", "option", "reserved"]
    );

    assert_eq!(
        case!(parse_message("message Foo { int32 a = 1; oneof b { int32 c = 1; } }")),
        Err(vec![ParseErrorKind::DuplicateFieldNumber {
            number: 1,
            first: 24..25,
            second: 47..48,
        }])
    );
    assert_eq!(
        case!(parse_message("message Foo { extensions 100 to max; }")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "extension ranges",
            span: 14..36,
        }])
    );
    assert_eq!(
        case!(parse_message("message Foo { extend Bar { int32 a = 1; } }")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "extend blocks",
            span: 14..41,
        }])
    );
    assert_eq!(
        case!(parse_message("message Foo { int32 a = 1; ")),
        Err(vec![ParseErrorKind::UnexpectedEof {
            expected: "a message field, oneof, reserved range, enum, message, option or '}'"
                .to_owned(),
        }])
    );
}

#[test]
fn parse_file() {
    let file = case!(parse_file(
        "syntax = 'proto3';
        package foo;
        import 'bar.proto';
        option java_package = 'com.foo';
        message A {}
        enum B { ZERO = 0; }
        service C {}",
        "foo.proto"
    ))
    .unwrap();
    assert_eq!(file.name, "foo.proto");
    assert_eq!(file.syntax, ast::Syntax::Proto3);
    assert!(file.syntax_span.is_some());
    assert_eq!(file.package.unwrap().name.to_string(), "foo");
    assert_eq!(file.imports.len(), 1);
    assert_eq!(file.options.len(), 1);
    assert_eq!(file.definitions.len(), 3);

    let file = case!(parse_file("message A {}", "foo.proto")).unwrap();
    assert_eq!(file.syntax, ast::Syntax::Proto2);
    assert_eq!(file.syntax_span, None);

    let file = case!(parse_file("", "empty.proto")).unwrap();
    assert!(file.definitions.is_empty());

    assert_eq!(
        case!(parse_file("syntax = 'proto4';", "foo.proto")),
        Err(vec![ParseErrorKind::UnknownSyntax {
            syntax: "proto4".to_owned(),
            span: 9..17,
        }])
    );
    assert_eq!(
        case!(parse_file("package a; package b;", "foo.proto")),
        Err(vec![ParseErrorKind::DuplicatePackage {
            first: 0..10,
            second: 11..21,
        }])
    );
    assert_eq!(
        case!(parse_file("edition = '2023';", "foo.proto")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "editions",
            span: 0..17,
        }])
    );
    assert_eq!(
        case!(parse_file("extend Foo { int32 bar = 1; }", "foo.proto")),
        Err(vec![ParseErrorKind::UnsupportedConstruct {
            construct: "extend blocks",
            span: 0..29,
        }])
    );
    assert_eq!(
        case!(parse_file("Not a Protobuf schema", "foo.proto")),
        Err(vec![ParseErrorKind::UnexpectedToken {
            expected:
                "'enum', 'extend', 'import', 'message', 'option', 'service', 'package' or ';'"
                    .to_owned(),
            found: "Not".to_owned(),
            span: 0..3,
        }])
    );
    assert_eq!(
        case!(parse_file("message A { int32 a = 1; } @", "foo.proto")),
        Err(vec![ParseErrorKind::InvalidToken { span: 27..28 }])
    );
}
