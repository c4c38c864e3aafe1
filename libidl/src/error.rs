//
// error.rs
// The IDL Compiler
//

//! This module defines types for representing the errors that may
//! be produced while compiling an IDL document. Source-located
//! diagnostics carry a stable `IDnnnn` code and accumulate in an
//! `ErrorCollection` that is threaded through every pass; driver
//! and generator failures (mostly I/O) are represented by the
//! `Error` enum.

use std; // for error
use std::io;
use std::result;
use std::cell::{ BorrowError, BorrowMutError };
use std::fmt::{ self, Display, Formatter };
use std::collections::HashSet;
use util::Location;


/// An error that may occur while driving a compilation: reading
/// input documents or writing generated artifacts. User-induced
/// errors in the documents themselves never surface here; those
/// are collected as `ParserError`s instead.
#[derive(Debug)]
pub enum Error {
    /// I/O error, probably coming from the OS, not the compiler itself.
    IO(io::Error),
    /// Internal: an immutable borrow of an output writer failed.
    Borrow(BorrowError),
    /// Internal: a mutable borrow of an output writer failed.
    BorrowMut(BorrowMutError),
}

/// Convenience type alias for expressing `Result`s of IDL `Error`s.
pub type Result<T> = result::Result<T, Error>;

impl std::error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::IO(ref err)        => err.description(),
            Error::Borrow(ref err)    => err.description(),
            Error::BorrowMut(ref err) => err.description(),
        }
    }

    fn cause(&self) -> Option<&std::error::Error> {
        match *self {
            Error::IO(ref err)        => Some(err),
            Error::Borrow(ref err)    => Some(err),
            Error::BorrowMut(ref err) => Some(err),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Error::IO(ref err)        => write!(f, "I/O error: {}", err),
            Error::Borrow(ref err)    => write!(f, "internal borrow error: {}", err),
            Error::BorrowMut(ref err) => write!(f, "internal borrow error: {}", err),
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Error {
        Error::IO(error)
    }
}

impl From<BorrowError> for Error {
    fn from(error: BorrowError) -> Error {
        Error::Borrow(error)
    }
}

impl From<BorrowMutError> for Error {
    fn from(error: BorrowMutError) -> Error {
        Error::BorrowMut(error)
    }
}

//
// Error codes
//
// Each code denotes exactly one failure class. Codes are part of
// the compiler's public contract: build systems and tests match on
// them, so once assigned they must never be renumbered.
//

macro_rules! error_ids {
    ($($name: ident => $code: expr),+,) => {
        $(
            #[allow(missing_docs)]
            pub const $name: &'static str = $code;
        )+

        /// Every error code known to the compiler, in declaration order.
        pub static ALL_ERROR_IDS: &'static [&'static str] = &[$($name),+];
    }
}

error_ids! {
    // structural errors (parser)
    ERROR_ID_YAML_SCAN                         => "ID0001",
    ERROR_ID_UNKNOWN_ROOT                      => "ID0002",
    ERROR_ID_UNKNOWN_NODE                      => "ID0003",
    ERROR_ID_DUPLICATE_NODE                    => "ID0004",
    ERROR_ID_IS_NODE_TYPE                      => "ID0005",
    ERROR_ID_IS_NODE_VALID_BOOL                => "ID0006",
    ERROR_ID_IS_NODE_VALID_INT                 => "ID0007",
    ERROR_ID_IS_NODE_VALID_NON_NEGATIVE_INT    => "ID0008",
    ERROR_ID_MISSING_REQUIRED_FIELD            => "ID0009",
    ERROR_ID_BAD_ARRAY_TYPE_NAME               => "ID0010",
    ERROR_ID_NO_NESTED_VARIANT                 => "ID0011",
    ERROR_ID_BAD_ENUM_VALUE_NODE               => "ID0012",

    // reference errors (loader and binder)
    ERROR_ID_IMPORT_NOT_FOUND                  => "ID0020",
    ERROR_ID_UNKNOWN_TYPE                      => "ID0021",
    ERROR_ID_UNKNOWN_ENUM_VALUE                => "ID0022",
    ERROR_ID_CHAINED_TYPE_NOT_FOUND            => "ID0023",
    ERROR_ID_CHAINED_STRUCT_NOT_FOUND          => "ID0024",
    ERROR_ID_UNKNOWN_REPLY_TYPE                => "ID0025",

    // semantic errors (binder)
    ERROR_ID_DUPLICATE_SYMBOL                  => "ID0030",
    ERROR_ID_DUPLICATE_COMMAND_NAME_AND_ALIAS  => "ID0031",
    ERROR_ID_COMMAND_NAME_COLLIDES_WITH_FIELD  => "ID0032",
    ERROR_ID_ARRAY_FIELD_DEFAULT               => "ID0033",
    ERROR_ID_OPTIONAL_FIELD_DEFAULT            => "ID0034",
    ERROR_ID_ALWAYS_SERIALIZE_NOT_OPTIONAL     => "ID0035",
    ERROR_ID_VARIANT_TOO_FEW_ALTERNATIVES      => "ID0036",
    ERROR_ID_VARIANT_DUPLICATE_BSON_TYPE       => "ID0037",
    ERROR_ID_VARIANT_ENUM_ALTERNATIVE          => "ID0038",
    ERROR_ID_VARIANT_MULTIPLE_STRUCTS          => "ID0039",
    ERROR_ID_CHAINED_NO_NESTED_STRUCT_STRICT   => "ID0040",
    ERROR_ID_BINDATA_DEFAULT                   => "ID0041",
    ERROR_ID_BAD_BSON_TYPE                     => "ID0042",
    ERROR_ID_BAD_BSON_TYPE_LIST                => "ID0043",
    ERROR_ID_BAD_BSON_BINDATA_SUBTYPE          => "ID0044",
    ERROR_ID_NO_STRINGDATA                     => "ID0045",
    ERROR_ID_BAD_NUMERIC_CPP_TYPE              => "ID0046",
    ERROR_ID_CHAIN_NEEDS_SERIALIZERS           => "ID0047",
    ERROR_ID_NON_OBJECT_DOC_SEQUENCE           => "ID0048",
    ERROR_ID_NO_DOC_SEQUENCE_OUTSIDE_COMMAND   => "ID0049",
    ERROR_ID_COMMAND_AS_FIELD_TYPE             => "ID0050",
    ERROR_ID_BAD_ARRAY_FIELD_NAME              => "ID0051",
    ERROR_ID_DUPLICATE_COMPARISON_ORDER        => "ID0052",
    ERROR_ID_MULTIPLE_STABILITY                => "ID0053",
    ERROR_ID_MISSING_REPLY_TYPE                => "ID0054",
    ERROR_ID_MISSING_ACCESS_CHECK              => "ID0055",
    ERROR_ID_AMBIGUOUS_ACCESS_CHECK            => "ID0056",
    ERROR_ID_DUPLICATE_ACCESS_CHECK            => "ID0057",
    ERROR_ID_DUPLICATE_PRIVILEGE               => "ID0058",
    ERROR_ID_STRUCT_DEFAULT_NOT_TRUE           => "ID0059",
    ERROR_ID_VALIDATOR_BAD_BOUND               => "ID0060",
    ERROR_ID_VALIDATOR_EMPTY                   => "ID0061",
    ERROR_ID_ENUM_BAD_TYPE                     => "ID0062",
    ERROR_ID_ENUM_DUPLICATE_VALUE              => "ID0063",
    ERROR_ID_ENUM_NON_CONTINUOUS_VALUE         => "ID0064",
    ERROR_ID_ENUM_BAD_INT_VALUE                => "ID0065",
    ERROR_ID_QUERY_SHAPE_MISSING_FIELD_KIND    => "ID0066",
    ERROR_ID_QUERY_SHAPE_KIND_OUTSIDE_COMPONENT => "ID0067",
    ERROR_ID_QUERY_SHAPE_BAD_KIND              => "ID0068",
    ERROR_ID_QUERY_SHAPE_ANONYMIZE_NOT_STRING  => "ID0069",
    ERROR_ID_BAD_COMMAND_NAMESPACE             => "ID0070",
    ERROR_ID_BAD_STABILITY                     => "ID0071",

    // server parameters, feature flags, config options
    ERROR_ID_SERVER_PARAMETER_INVALID_SET_AT   => "ID0080",
    ERROR_ID_SERVER_PARAMETER_STORAGE_CONFLICT => "ID0081",
    ERROR_ID_FEATURE_FLAG_BAD_PHASE            => "ID0082",
    ERROR_ID_FEATURE_FLAG_MISSING_DEFAULT      => "ID0083",
    ERROR_ID_FEATURE_FLAG_DEFAULT_TRUE_MISSING_VERSION => "ID0084",
    ERROR_ID_FEATURE_FLAG_DEFAULT_FALSE_HAS_VERSION    => "ID0085",
    ERROR_ID_FEATURE_FLAG_ROLLOUT_WITH_VERSION => "ID0086",
    ERROR_ID_FEATURE_FLAG_FCV_GATED_ROLLOUT    => "ID0087",
    ERROR_ID_BAD_SOURCE_SPECIFIER              => "ID0088",
    ERROR_ID_BAD_DUPLICATE_BEHAVIOR            => "ID0089",
    ERROR_ID_BAD_SHORT_NAME                    => "ID0090",
    ERROR_ID_BAD_SINGLE_NAME                   => "ID0091",
    ERROR_ID_MISSING_SHORT_NAME                => "ID0092",
    ERROR_ID_BAD_POSITIONAL_RANGE              => "ID0093",
    ERROR_ID_BAD_ARG_VARTYPE                   => "ID0094",
}

lazy_static! {
    /// The set of all error codes; constructing it asserts that no
    /// two symbolic names were assigned the same `IDnnnn` code.
    pub static ref ERROR_ID_REGISTRY: HashSet<&'static str> = {
        let ids: HashSet<&'static str> = ALL_ERROR_IDS.iter().cloned().collect();
        assert_eq!(ids.len(), ALL_ERROR_IDS.len(), "duplicate error code assigned");
        ids
    };
}

//
// Source-located diagnostics
//

/// A single user-facing diagnostic: a failure class, the source
/// location it was detected at, and a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    /// Location of the offending node.
    pub location: Location,
    /// One of the `ERROR_ID_*` codes.
    pub id: &'static str,
    /// Human-readable description of the failure.
    pub msg: String,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}: ({}, {}): {}: {}",
            self.location.basename(),
            self.location.line,
            self.location.column,
            self.id,
            self.msg,
        )
    }
}

/// Accumulates diagnostics across all compiler passes. Each binding
/// or parsing routine records its failures here and returns `None`,
/// so that sibling declarations keep being validated; the driver
/// inspects `has_errors()` once at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    errors: Vec<ParserError>,
}

impl ErrorCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        ErrorCollection::default()
    }

    /// Records one diagnostic.
    pub fn add<S: Into<String>>(&mut self, location: &Location, id: &'static str, msg: S) {
        debug_assert!(ERROR_ID_REGISTRY.contains(id), "unregistered error code {}", id);

        self.errors.push(
            ParserError {
                location: location.clone(),
                id,
                msg: msg.into(),
            }
        );
    }

    /// True iff at least one diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The number of recorded diagnostics.
    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// The recorded diagnostics, in the order they were produced.
    pub fn errors(&self) -> &[ParserError] {
        &self.errors
    }

    /// True iff some recorded diagnostic carries the given code.
    pub fn contains(&self, id: &str) -> bool {
        self.errors.iter().any(|e| e.id == id)
    }

    /// Moves every diagnostic of `other` into `self`.
    pub fn extend(&mut self, other: ErrorCollection) {
        self.errors.extend(other.errors)
    }

    /// Writes every diagnostic to `wr`, grouped by file in order
    /// of first appearance.
    pub fn dump(&self, wr: &mut io::Write) -> io::Result<()> {
        let mut files: Vec<&str> = vec![];

        for error in &self.errors {
            if !files.contains(&error.location.file.as_str()) {
                files.push(&error.location.file);
            }
        }

        for file in files {
            for error in self.errors.iter().filter(|e| e.location.file == file) {
                writeln!(wr, "{}", error)?;
            }
        }

        Ok(())
    }

    //
    // Helpers for the most common failure classes. These keep the
    // wording of recurring diagnostics consistent across passes.
    //

    /// Records an unknown top-level key.
    pub fn add_unknown_root_node(&mut self, location: &Location, name: &str) {
        self.add(
            location,
            ERROR_ID_UNKNOWN_ROOT,
            format!("unknown root level node '{}'", name),
        );
    }

    /// Records an unknown child key within a known node kind.
    pub fn add_unknown_node(&mut self, location: &Location, kind: &str, name: &str) {
        self.add(
            location,
            ERROR_ID_UNKNOWN_NODE,
            format!("unknown option for {}: '{}'", kind, name),
        );
    }

    /// Records a repeated child key.
    pub fn add_duplicate_node(&mut self, location: &Location, name: &str) {
        self.add(
            location,
            ERROR_ID_DUPLICATE_NODE,
            format!("duplicate node found for '{}'", name),
        );
    }

    /// Records a YAML node of the wrong shape (e.g. a sequence where
    /// a scalar was expected).
    pub fn add_node_type(&mut self, location: &Location, name: &str, expected: &str, actual: &str) {
        self.add(
            location,
            ERROR_ID_IS_NODE_TYPE,
            format!("illegal node type '{}' for '{}', expected {}", actual, name, expected),
        );
    }

    /// Records a scalar that should have been `true` or `false`.
    pub fn add_bad_bool(&mut self, location: &Location, name: &str, value: &str) {
        self.add(
            location,
            ERROR_ID_IS_NODE_VALID_BOOL,
            format!("illegal bool value for '{}', expected 'true' or 'false', got '{}'", name, value),
        );
    }

    /// Records a scalar that should have been an integer.
    pub fn add_bad_int(&mut self, location: &Location, name: &str, value: &str) {
        self.add(
            location,
            ERROR_ID_IS_NODE_VALID_INT,
            format!("illegal integer value for '{}': '{}'", name, value),
        );
    }

    /// Records a negative scalar where a non-negative one was required.
    pub fn add_bad_non_negative_int(&mut self, location: &Location, name: &str, value: &str) {
        self.add(
            location,
            ERROR_ID_IS_NODE_VALID_NON_NEGATIVE_INT,
            format!("illegal negative integer value for '{}': '{}'", name, value),
        );
    }

    /// Records a required child key that never appeared.
    pub fn add_missing_required_field(&mut self, location: &Location, kind: &str, name: &str) {
        self.add(
            location,
            ERROR_ID_MISSING_REQUIRED_FIELD,
            format!("IDL {} is missing required scalar '{}'", kind, name),
        );
    }

    /// Records a name that did not resolve against the symbol table.
    pub fn add_unknown_type(&mut self, location: &Location, field_name: &str, type_name: &str) {
        self.add(
            location,
            ERROR_ID_UNKNOWN_TYPE,
            format!("'{}' is not a known type for field '{}'", type_name, field_name),
        );
    }

    /// Records a symbol declared (or imported) more than once.
    pub fn add_duplicate_symbol(&mut self, location: &Location, name: &str, kind: &str) {
        self.add(
            location,
            ERROR_ID_DUPLICATE_SYMBOL,
            format!("{} '{}' is a duplicate symbol", kind, name),
        );
    }

    /// Records an import whose file could not be located.
    pub fn add_import_not_found(&mut self, location: &Location, name: &str) {
        self.add(
            location,
            ERROR_ID_IMPORT_NOT_FOUND,
            format!("could not resolve import '{}'", name),
        );
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_ids_are_unique() {
        assert_eq!(ERROR_ID_REGISTRY.len(), ALL_ERROR_IDS.len());
    }

    #[test]
    fn error_ids_are_well_formed() {
        for id in ALL_ERROR_IDS {
            assert!(id.len() == 6 && id.starts_with("ID"), "malformed code {}", id);
            assert!(id[2..].chars().all(|c| c.is_digit(10)), "malformed code {}", id);
        }
    }

    #[test]
    fn diagnostic_format() {
        let mut errors = ErrorCollection::new();
        let loc = Location::new("/a/b/sample.idl", 3, 7);
        errors.add(&loc, ERROR_ID_UNKNOWN_ROOT, "unknown root level node 'bogus'");

        let text = format!("{}", errors.errors()[0]);
        assert_eq!(text, "sample.idl: (3, 7): ID0002: unknown root level node 'bogus'");
    }
}
