//! Reading schemas from the filesystem.
//!
//! The core functions of this crate only operate on in-memory text. [`SourceFile`] is a thin
//! adapter for callers that keep their schemas on disk.

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{ErrorKind, ParseErrorKind},
    Error, FileDescriptor, ParseError, SyntaxTree, MAX_FILE_LEN,
};

/// A parsed protobuf source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Option<PathBuf>,
    source: String,
    tree: SyntaxTree,
}

impl SourceFile {
    /// Reads and parses a protobuf source file from disk.
    ///
    /// The file's path, as given, is used as its name in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if it is not a valid protobuf file.
    ///
    /// # Examples
    ///
    /// ```
    /// # use protocanon::file::SourceFile;
    /// let err = SourceFile::open("notfound.proto".as_ref()).unwrap_err();
    /// assert!(err.is_resource_error());
    /// ```
    pub fn open(path: &Path) -> Result<Self, Error> {
        let map_io_err = |err: io::Error| -> Error {
            Error::from_kind(ErrorKind::OpenFile {
                path: path.to_owned(),
                err,
            })
        };

        let name = path.display().to_string();

        let file = fs::File::open(path).map_err(map_io_err)?;
        let metadata = file.metadata().map_err(map_io_err)?;

        if metadata.len() > MAX_FILE_LEN {
            return Err(ParseError::new(vec![ParseErrorKind::FileTooLarge], &name, "").into());
        }

        let mut source = String::with_capacity(metadata.len() as usize);
        file.take(MAX_FILE_LEN)
            .read_to_string(&mut source)
            .map_err(map_io_err)?;

        let tree = crate::parse(&source, &name)?;
        debug!(path = %path.display(), len = source.len(), "read schema file");

        Ok(SourceFile {
            path: Some(path.to_owned()),
            source,
            tree,
        })
    }

    /// Parses a protobuf source file from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid protobuf file.
    ///
    /// # Examples
    ///
    /// ```
    /// # use protocanon::file::SourceFile;
    /// let file = SourceFile::from_source("foo.proto", "message Foo { }").unwrap();
    /// assert_eq!(file.path(), None);
    /// assert_eq!(file.name(), "foo.proto");
    /// assert_eq!(file.canonical(), "message Foo {}\n");
    /// ```
    pub fn from_source(name: &str, source: &str) -> Result<Self, Error> {
        let tree = crate::parse(source, name)?;

        Ok(SourceFile {
            path: None,
            source: source.to_owned(),
            tree,
        })
    }

    /// The path this file was read from, if it was read from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The name used for this file in error messages and descriptors.
    pub fn name(&self) -> &str {
        self.tree.name()
    }

    /// The source text of this file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed syntax tree.
    pub fn syntax_tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Lowers this file into a descriptor.
    pub fn descriptor(&self) -> FileDescriptor {
        crate::build(&self.tree)
    }

    /// Formats this file in canonical form.
    pub fn canonical(&self) -> String {
        crate::format(&self.tree)
    }

    /// Returns true if the source text is already in canonical form.
    pub fn is_canonical(&self) -> bool {
        self.canonical() == self.source
    }

    /// Overwrites the file on disk with its canonical form, returning true if its contents
    /// changed. Files created with [`SourceFile::from_source`] are never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_canonical(&self) -> Result<bool, Error> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(false),
        };

        let canonical = self.canonical();
        if canonical == self.source {
            return Ok(false);
        }

        fs::write(path, canonical).map_err(|err| {
            Error::from_kind(ErrorKind::WriteFile {
                path: path.clone(),
                err,
            })
        })?;
        debug!(path = %path.display(), "wrote canonical schema");
        Ok(true)
    }
}
