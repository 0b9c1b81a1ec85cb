use std::{fmt, io, path::PathBuf};

use logos::Span;
use miette::{Diagnostic, NamedSource};
use thiserror::Error;

use crate::{lines::LineResolver, MAX_MESSAGE_FIELD_NUMBER};

/// An error that can occur when comparing or canonicalizing protobuf schemas.
#[derive(Debug, Diagnostic, Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ErrorKind {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(ParseError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnsupportedConstruct(ParseError),
    #[error("error opening file '{path}'")]
    OpenFile {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("error writing file '{path}'")]
    WriteFile {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

impl Error {
    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error { kind }
    }

    /// Returns true if this error was caused by malformed schema text.
    pub fn is_parse_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Parse(_))
    }

    /// Returns true if the schema is grammatically valid but uses a construct that cannot be
    /// represented without losing information, such as an `extend` block.
    pub fn is_unsupported_construct(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedConstruct(_))
    }

    /// Returns true if this error was caused by reading or writing a file.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::OpenFile { .. } | ErrorKind::WriteFile { .. }
        )
    }

    /// Returns the underlying [`ParseError`], if this error was raised while parsing a schema.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match &self.kind {
            ErrorKind::Parse(err) | ErrorKind::UnsupportedConstruct(err) => Some(err),
            ErrorKind::OpenFile { .. } | ErrorKind::WriteFile { .. } => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        if err.is_unsupported_construct() {
            Error::from_kind(ErrorKind::UnsupportedConstruct(err))
        } else {
            Error::from_kind(ErrorKind::Parse(err))
        }
    }
}

/// An error that may occur while parsing a protobuf source file.
#[derive(Error, Diagnostic)]
#[error("{}", kind)]
#[diagnostic(forward(kind))]
pub struct ParseError {
    kind: Box<ParseErrorKind>,
    #[related]
    related: Vec<ParseErrorKind>,
    #[source_code]
    source_code: NamedSource,
    file: String,
    line: usize,
    column: usize,
}

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub(crate) enum ParseErrorKind {
    #[error("invalid token")]
    InvalidToken {
        #[label("found here")]
        span: Span,
    },
    #[error("integer is too large")]
    IntegerOutOfRange {
        #[label("integer defined here")]
        span: Span,
    },
    #[error("float is too large")]
    FloatOutOfRange {
        #[label("float defined here")]
        span: Span,
    },
    #[error("invalid string character")]
    InvalidStringCharacters {
        #[label("invalid characters")]
        span: Span,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },
    #[error("invalid string escape")]
    InvalidStringEscape {
        #[label("defined here")]
        span: Span,
    },
    #[error("string is not valid utf-8")]
    InvalidUtf8String {
        #[label("defined here")]
        span: Span,
    },
    #[error("unterminated block comment")]
    UnterminatedComment {
        #[label("comment starts here")]
        span: Span,
    },
    #[error("unknown syntax '{syntax}'")]
    #[diagnostic(help("possible values are 'proto2' and 'proto3'"))]
    UnknownSyntax {
        syntax: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("invalid identifier")]
    #[diagnostic(help("identifiers must consist of letters, numbers and underscores, and may not start with a number"))]
    InvalidIdentifier {
        #[label("defined here")]
        span: Span,
    },
    #[error("multiple package names specified")]
    DuplicatePackage {
        #[label("defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("whitespace is required between an integer literal and an identifier")]
    NoSpaceBetweenIntAndIdent {
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but reached end of file")]
    UnexpectedEof { expected: String },
    #[error("message numbers must be between 1 and {}", MAX_MESSAGE_FIELD_NUMBER)]
    InvalidMessageNumber {
        #[label("defined here")]
        span: Span,
    },
    #[error("enum numbers must be between {} and {}", i32::MIN, i32::MAX)]
    InvalidEnumNumber {
        #[label("defined here")]
        span: Span,
    },
    #[error("field number {number} is already used")]
    DuplicateFieldNumber {
        number: i32,
        #[label("first used here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("a oneof must have at least one field")]
    EmptyOneof {
        #[label("defined here")]
        span: Span,
    },
    #[error("{construct} are not supported")]
    #[diagnostic(help("schemas using this construct cannot be compared without losing information"))]
    UnsupportedConstruct {
        construct: &'static str,
        #[label("found here")]
        span: Span,
    },
    #[error("file is too large")]
    #[diagnostic(help("the maximum file length is 2,147,483,647 bytes"))]
    FileTooLarge,
}

impl ParseError {
    pub(crate) fn new(mut related: Vec<ParseErrorKind>, name: &str, source: &str) -> Self {
        debug_assert!(!related.is_empty());
        let kind = related.remove(0);

        let offset = kind.span().map_or(source.len(), |span| span.start);
        let (line, column) = LineResolver::new(source).resolve(offset);

        ParseError {
            kind: Box::new(kind),
            related,
            source_code: NamedSource::new(name, source.to_owned()),
            file: name.to_owned(),
            line: line + 1,
            column: column + 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(mut self) -> Vec<ParseErrorKind> {
        self.related.insert(0, *self.kind);
        self.related
    }

    /// Gets the name of the file in which this error occurred.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Gets the one-based line number at which this error occurred.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Gets the one-based column number at which this error occurred.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Gets a description of what the parser expected to find, if this is a syntax error.
    pub fn expected(&self) -> Option<&str> {
        match &*self.kind {
            ParseErrorKind::UnexpectedToken { expected, .. }
            | ParseErrorKind::UnexpectedEof { expected } => Some(expected),
            _ => None,
        }
    }

    /// Gets the token that was found instead of the expected one, if this is a syntax error.
    pub fn found(&self) -> Option<&str> {
        match &*self.kind {
            ParseErrorKind::UnexpectedToken { found, .. } => Some(found),
            ParseErrorKind::UnexpectedEof { .. } => Some("end of file"),
            _ => None,
        }
    }

    /// Gets the primary source code span associated with this error, if any.
    pub fn span(&self) -> Option<Span> {
        self.kind.span()
    }

    /// Returns true if the source was grammatically valid but used a construct that is not modelled.
    pub fn is_unsupported_construct(&self) -> bool {
        matches!(*self.kind, ParseErrorKind::UnsupportedConstruct { .. })
    }
}

impl ParseErrorKind {
    fn span(&self) -> Option<Span> {
        match self {
            ParseErrorKind::InvalidToken { span } => Some(span.clone()),
            ParseErrorKind::IntegerOutOfRange { span } => Some(span.clone()),
            ParseErrorKind::FloatOutOfRange { span } => Some(span.clone()),
            ParseErrorKind::InvalidStringCharacters { span } => Some(span.clone()),
            ParseErrorKind::UnterminatedString { span } => Some(span.clone()),
            ParseErrorKind::InvalidStringEscape { span } => Some(span.clone()),
            ParseErrorKind::InvalidUtf8String { span } => Some(span.clone()),
            ParseErrorKind::UnterminatedComment { span } => Some(span.clone()),
            ParseErrorKind::UnknownSyntax { span, .. } => Some(span.clone()),
            ParseErrorKind::InvalidIdentifier { span } => Some(span.clone()),
            ParseErrorKind::DuplicatePackage { second, .. } => Some(second.clone()),
            ParseErrorKind::NoSpaceBetweenIntAndIdent { span } => Some(span.clone()),
            ParseErrorKind::UnexpectedToken { span, .. } => Some(span.clone()),
            ParseErrorKind::UnexpectedEof { .. } => None,
            ParseErrorKind::InvalidMessageNumber { span } => Some(span.clone()),
            ParseErrorKind::InvalidEnumNumber { span } => Some(span.clone()),
            ParseErrorKind::DuplicateFieldNumber { second, .. } => Some(second.clone()),
            ParseErrorKind::EmptyOneof { span } => Some(span.clone()),
            ParseErrorKind::UnsupportedConstruct { span, .. } => Some(span.clone()),
            ParseErrorKind::FileTooLarge => None,
        }
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self)
    }
}
