//! Comparison and canonical formatting of protobuf schemas.
//!
//! Schema registries store protobuf subjects as source text. Deciding whether a locally declared
//! schema matches the registered one cannot be done on the raw text, since the two may differ in
//! whitespace, comments or literal syntax while describing the same schema. This crate parses
//! both texts, lowers them into [`FileDescriptor`]s and compares those structurally.
//!
//! For the common cases see [`schemas_equal()`] and [`canonicalize()`]. For more options see
//! [`Comparator`].
//!
//! # Examples
//!
//! ```
//! let old = "syntax = \"proto3\"; message M { string a = 1; }";
//! let new = "syntax = 'proto3';\n\n// a comment\nmessage M {\n  string a = 1;\n}\n";
//! assert!(protocanon::schemas_equal(old, new).unwrap());
//!
//! assert_eq!(
//!     protocanon::canonicalize(old).unwrap(),
//!     "syntax = \"proto3\";\n\nmessage M {\n  string a = 1;\n}\n",
//! );
//! ```
//!
//! Field order is significant: reordering two fields produces a different schema.
//!
//! ```
//! let old = "message M { string a = 1; string b = 2; }";
//! let new = "message M { string b = 2; string a = 1; }";
//! assert!(!protocanon::schemas_equal(old, new).unwrap());
//! ```
//!
//! ### Error messages
//!
//! Errors implement [`miette::Diagnostic`] and carry the source text, so they can be rendered
//! with labels pointing at the offending token.
//!
//! ```
//! let err = protocanon::canonicalize("Not a Protobuf schema").unwrap_err();
//! assert!(err.is_parse_error());
//!
//! let parse_error = err.parse_error().unwrap();
//! assert_eq!((parse_error.line(), parse_error.column()), (1, 1));
//! assert_eq!(parse_error.found(), Some("Not"));
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/protocanon/0.1.0/")]

pub mod descriptor;
pub mod file;

mod ast;
mod case;
mod error;
mod fmt;
mod lex;
mod lines;
mod parse;

use logos::Span;
use tracing::debug;

pub use crate::ast::File as SyntaxTree;
pub use crate::descriptor::FileDescriptor;
pub use crate::error::{Error, ParseError};

const MAX_MESSAGE_FIELD_NUMBER: i32 = 536_870_911;
const MAX_FILE_LEN: u64 = i32::MAX as u64;

/// The name given to every descriptor before comparison, and to the syntax tree formatted by
/// [`canonicalize()`].
pub const DEFAULT_PLACEHOLDER: &str = "schema.proto";

/// Parses a protobuf source file into a syntax tree.
///
/// `name` identifies the source in error messages and becomes the provenance name of descriptors
/// built from the tree. The parser does not recover from errors: the first malformed construct
/// aborts parsing.
///
/// # Errors
///
/// Returns a [`ParseError`] if `source` is not a valid protobuf file, or if it uses a construct
/// such as `extend` that descriptors cannot represent. Use
/// [`ParseError::is_unsupported_construct`] to distinguish the two.
///
/// # Examples
///
/// ```
/// let tree = protocanon::parse("message Foo {}", "foo.proto").unwrap();
/// assert_eq!(tree.name(), "foo.proto");
///
/// let err = protocanon::parse("message {}", "foo.proto").unwrap_err();
/// assert_eq!(err.to_string(), "expected an identifier, but found '{'");
/// assert_eq!(err.expected(), Some("an identifier"));
/// ```
pub fn parse(source: &str, name: &str) -> Result<SyntaxTree, ParseError> {
    if source.len() as u64 > MAX_FILE_LEN {
        return Err(ParseError::new(
            vec![error::ParseErrorKind::FileTooLarge],
            name,
            "",
        ));
    }

    parse::parse_file(source, name).map_err(|errors| ParseError::new(errors, name, source))
}

/// Lowers a syntax tree into a descriptor.
///
/// Named types are resolved against the definitions of the same file. Names that refer to other
/// files are kept as written.
pub fn build(tree: &SyntaxTree) -> FileDescriptor {
    descriptor::build(tree)
}

/// Returns a copy of `descriptor` with its provenance name replaced by `placeholder`.
pub fn normalize(descriptor: &FileDescriptor, placeholder: &str) -> FileDescriptor {
    descriptor.normalize(placeholder)
}

/// Compares two descriptors field by field, in declaration order.
///
/// The provenance name takes part in the comparison, so descriptors should be passed through
/// [`normalize()`] with the same placeholder first.
pub fn equal(a: &FileDescriptor, b: &FileDescriptor) -> bool {
    a == b
}

/// Renders a syntax tree as canonically formatted source text.
pub fn format(tree: &SyntaxTree) -> String {
    fmt::format_file(tree)
}

/// Returns true if the two schema texts describe the same schema.
///
/// This is shorthand for [`Comparator::schemas_equal`] with the default configuration.
///
/// # Errors
///
/// Returns an error if either text fails to parse. Equality is never computed from a partially
/// parsed schema.
pub fn schemas_equal(old: &str, new: &str) -> Result<bool, Error> {
    Comparator::default().schemas_equal(old, new)
}

/// Formats a schema text in canonical form.
///
/// This is shorthand for [`Comparator::canonicalize`] with the default configuration.
///
/// # Errors
///
/// Returns an error if the text fails to parse.
pub fn canonicalize(text: &str) -> Result<String, Error> {
    Comparator::default().canonicalize(text)
}

/// Options for comparing and canonicalizing schemas.
///
/// # Examples
///
/// ```
/// # use protocanon::Comparator;
/// let mut comparator = Comparator::new();
/// comparator.old_name("registry.proto").new_name("local.proto");
///
/// let err = comparator.schemas_equal("message A {}", "message {}").unwrap_err();
/// assert_eq!(err.parse_error().unwrap().file(), "local.proto");
/// ```
#[derive(Debug, Clone)]
pub struct Comparator {
    placeholder: String,
    old_name: String,
    new_name: String,
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator {
            placeholder: DEFAULT_PLACEHOLDER.to_owned(),
            old_name: "old.proto".to_owned(),
            new_name: "new.proto".to_owned(),
        }
    }
}

impl Comparator {
    /// Creates a new comparator with the default configuration.
    pub fn new() -> Self {
        Comparator::default()
    }

    /// Sets the provenance name both descriptors are normalized to before comparison.
    ///
    /// The default is `schema.proto`.
    pub fn placeholder(&mut self, name: impl Into<String>) -> &mut Self {
        self.placeholder = name.into();
        self
    }

    /// Sets the name used for the old schema in error messages.
    ///
    /// The default is `old.proto`.
    pub fn old_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.old_name = name.into();
        self
    }

    /// Sets the name used for the new schema in error messages.
    ///
    /// The default is `new.proto`.
    pub fn new_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.new_name = name.into();
        self
    }

    /// Returns true if the two schema texts lower to equal descriptors.
    ///
    /// # Errors
    ///
    /// Returns an error if either text fails to parse.
    pub fn schemas_equal(&self, old: &str, new: &str) -> Result<bool, Error> {
        let old_descriptor = self.descriptor(old, &self.old_name)?;
        let new_descriptor = self.descriptor(new, &self.new_name)?;

        Ok(self.descriptors_equal(&old_descriptor, &new_descriptor))
    }

    /// Returns true if two already lowered descriptors are equal once both are normalized to this
    /// comparator's placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// # use protocanon::Comparator;
    /// let comparator = Comparator::new();
    /// let old = comparator.descriptor("message Foo {}", "registry.proto").unwrap();
    /// let new = comparator.descriptor("message Foo { }", "local.proto").unwrap();
    /// assert!(comparator.descriptors_equal(&old, &new));
    /// ```
    pub fn descriptors_equal(&self, old: &FileDescriptor, new: &FileDescriptor) -> bool {
        let equal = equal(
            &old.normalize(&self.placeholder),
            &new.normalize(&self.placeholder),
        );
        debug!(
            old = %old.name,
            new = %new.name,
            equal,
            "compared schemas"
        );
        equal
    }

    /// Formats a schema text in canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error if the text fails to parse.
    pub fn canonicalize(&self, text: &str) -> Result<String, Error> {
        let tree = parse(text, &self.placeholder)?;
        let output = format(&tree);
        debug!(
            input_len = text.len(),
            output_len = output.len(),
            "canonicalized schema"
        );
        Ok(output)
    }

    /// Parses and lowers a schema text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text fails to parse.
    pub fn descriptor(&self, text: &str, name: &str) -> Result<FileDescriptor, Error> {
        let tree = parse(text, name)?;
        Ok(build(&tree))
    }
}

fn join_span(start: Span, end: Span) -> Span {
    start.start..end.end
}
