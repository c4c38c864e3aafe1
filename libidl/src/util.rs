//
// util.rs
// The IDL Compiler
//

//! The `util` module provides small helper types used throughout
//! the compiler: source locations for diagnostics, ANSI-colored
//! message wrappers, and package metadata constants.

use std::fmt::{ self, Display, Formatter };
use std::path::Path;


/// Type of a global descriptor that holds information about
/// the current version of the IDL compiler package (library
/// and command-line driver). A global instance of this struct
/// provides user-readable version information in a uniform
/// manner throughout the code base.
#[derive(Debug, Clone, Copy)]
pub struct PackageInfo {
    /// The name of the package.
    pub name: &'static str,
    /// The version of the package.
    pub version: &'static str,
    /// The list of authors of the package.
    pub authors: &'static str,
    /// A short summary of this package.
    pub description: &'static str,
}

/// Holds metadata about the package as defined in the Cargo manifest.
pub static PACKAGE_INFO: PackageInfo = PackageInfo {
    name:        env!["CARGO_PKG_NAME"],
    version:     env!["CARGO_PKG_VERSION"],
    authors:     env!["CARGO_PKG_AUTHORS"],
    description: env!["CARGO_PKG_DESCRIPTION"],
};

/// Used for distinguishing between the types of
/// diagnostic that the compiler can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// A message without any special attributes or coloring.
    Default,
    /// An informative message, eg. compilation progress or performance.
    Info,
    /// A highlighted part of a diagnostic.
    Highlight,
    /// Indicates successful compilation.
    Success,
    /// Indicates that an error occurred during compilation.
    Error,
}

/// Returns `DiagnosticKind::Default`.
impl Default for DiagnosticKind {
    fn default() -> Self {
        DiagnosticKind::Default
    }
}

/// A string which, when `Display`ed, looks pretty and colorful.
/// It is used for formatting diagnostic messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Diagnostic<T> {
    value: T,
    kind: DiagnosticKind,
}

impl<T> Diagnostic<T> {
    /// Makes a pretty-printable diagnostic that displays
    /// a given value in the specified diagnostic style.
    pub fn new(value: T, kind: DiagnosticKind) -> Self {
        Diagnostic { value, kind }
    }

    /// Consumes `self` and returns the inner value, discarding style information.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Returns the diagnostic kind associated with this instance.
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }
}

impl<T> AsRef<T> for Diagnostic<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T> From<T> for Diagnostic<T> {
    fn from(value: T) -> Self {
        Self::new(value, DiagnosticKind::Default)
    }
}

impl<T> Display for Diagnostic<T> where T: Display {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let reset = "\x1b[0m";
        let color = match self.kind {
            DiagnosticKind::Default   => "",
            DiagnosticKind::Info      => "\x1b[1;33m",
            DiagnosticKind::Highlight => "\x1b[1;36m",
            DiagnosticKind::Success   => "\x1b[1;32m",
            DiagnosticKind::Error     => "\x1b[1;31m",
        };

        write!(f, "{}{}{}{}", reset, color, self.value, reset)
    }
}

/// Represents the position of a syntax node within one of the
/// documents fed to the compiler. Every syntax-tree and bound-AST
/// node carries one of these; they end up in user-visible
/// diagnostics, so both indices are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Name of the document this location points into.
    pub file: String,
    /// 1-based line index within the document.
    pub line: usize,
    /// 1-based column index within the line.
    pub column: usize,
}

impl Location {
    /// Makes a location from a file name and 1-based coordinates.
    pub fn new<S: Into<String>>(file: S, line: usize, column: usize) -> Self {
        Location {
            file: file.into(),
            line,
            column,
        }
    }

    /// The base name of the file, as printed in diagnostics.
    pub fn basename(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: ({}, {})", self.basename(), self.line, self.column)
    }
}

/// Uppercases the first character of a name, leaving the rest
/// untouched. This is the default transform from declaration names
/// to generated C++ type names (`one_string` becomes `One_string`),
/// and from field names to `kFieldName` constants.
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// This trait is to be implemented by syntax entities that
/// were parsed out of some position in a source document.
/// It is used for generating location information in
/// user-visible error messages.
pub trait Located {
    /// Returns the location `self` was parsed from.
    fn location(&self) -> &Location;
}

impl Located for Location {
    fn location(&self) -> &Location {
        self
    }
}
