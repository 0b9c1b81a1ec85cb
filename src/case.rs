/// Returns true if `name` is a valid protobuf identifier.
pub(crate) fn is_valid_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// The default `json_name` protoc assigns to a field.
pub(crate) fn to_json_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut uppercase_next = false;

    for ch in name.chars() {
        if ch == '_' {
            uppercase_next = true
        } else if uppercase_next {
            result.push(ch.to_ascii_uppercase());
            uppercase_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

/// The name of the synthetic message generated for a map field.
pub(crate) fn map_entry_name(field_name: &str) -> String {
    let mut result = String::with_capacity(field_name.len() + 5);
    let mut uppercase_next = true;

    for ch in field_name.chars() {
        if ch == '_' {
            uppercase_next = true
        } else if uppercase_next {
            result.push(ch.to_ascii_uppercase());
            uppercase_next = false;
        } else {
            result.push(ch);
        }
    }

    result.push_str("Entry");
    result
}

#[test]
fn valid_idents() {
    assert!(is_valid_ident("foo"));
    assert!(is_valid_ident("_foo_1"));
    assert!(!is_valid_ident(""));
    assert!(!is_valid_ident("1foo"));
    assert!(!is_valid_ident("foo.bar"));
}

#[test]
fn json_names() {
    assert_eq!(to_json_name("foo_bar"), "fooBar");
    assert_eq!(to_json_name("location_id"), "locationId");
    assert_eq!(to_json_name("foo"), "foo");
}

#[test]
fn map_entry_names() {
    assert_eq!(map_entry_name("projects"), "ProjectsEntry");
    assert_eq!(map_entry_name("foo_bar"), "FooBarEntry");
}
