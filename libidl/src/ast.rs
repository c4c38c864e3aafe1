//
// ast.rs
// The IDL Compiler
//

//! The bound AST: the data model the binder produces once every
//! type reference has been resolved and every invariant checked.
//! The generator walks these nodes and nothing else; the syntax
//! tree is discarded after binding. Unlike the syntax tree, nothing
//! in here is optional unless absence is semantically meaningful.

use yaml::MarkedNode;
use util::Location;


/// The fixed set of BSON wire types a serialization type tag may
/// name. `Any` and `Chain` are pseudo-types: they must appear alone
/// and suppress wire-type checking in generated deserializers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BsonType {
    /// 64-bit IEEE double.
    Floating,
    /// UTF-8 string.
    String,
    /// Embedded document. Arrays also travel as objects with
    /// numeric field names.
    Object,
    /// Binary blob with a subtype tag.
    BinData,
    /// 12-byte object id.
    ObjectId,
    /// Boolean.
    Bool,
    /// UTC datetime, milliseconds since the epoch.
    Date,
    /// Null.
    Null,
    /// Regular expression.
    Regex,
    /// 32-bit signed integer.
    Int32,
    /// Internal replication timestamp.
    Timestamp,
    /// 64-bit signed integer.
    Int64,
    /// 128-bit decimal.
    Decimal,
    /// Accept any element; the custom deserializer sorts it out.
    Any,
    /// Delegate to serializer/deserializer methods that consume the
    /// surrounding document rather than one element.
    Chain,
}

impl BsonType {
    /// Parses a serialization type tag as spelled in documents.
    pub fn from_name(name: &str) -> Option<BsonType> {
        let ty = match name {
            "floating"  => BsonType::Floating,
            "string"    => BsonType::String,
            "object"    => BsonType::Object,
            "bindata"   => BsonType::BinData,
            "objectid"  => BsonType::ObjectId,
            "bool"      => BsonType::Bool,
            "date"      => BsonType::Date,
            "null"      => BsonType::Null,
            "regex"     => BsonType::Regex,
            "int32"     => BsonType::Int32,
            "timestamp" => BsonType::Timestamp,
            "int64"     => BsonType::Int64,
            "decimal"   => BsonType::Decimal,
            "any"       => BsonType::Any,
            "chain"     => BsonType::Chain,
            _ => return None,
        };
        Some(ty)
    }

    /// The tag's spelling in documents and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            BsonType::Floating  => "floating",
            BsonType::String    => "string",
            BsonType::Object    => "object",
            BsonType::BinData   => "bindata",
            BsonType::ObjectId  => "objectid",
            BsonType::Bool      => "bool",
            BsonType::Date      => "date",
            BsonType::Null      => "null",
            BsonType::Regex     => "regex",
            BsonType::Int32     => "int32",
            BsonType::Timestamp => "timestamp",
            BsonType::Int64     => "int64",
            BsonType::Decimal   => "decimal",
            BsonType::Any       => "any",
            BsonType::Chain     => "chain",
        }
    }

    /// The `BSONType` enumerator generated deserializers switch on.
    pub fn cpp_enumerator(self) -> &'static str {
        match self {
            BsonType::Floating  => "NumberDouble",
            BsonType::String    => "String",
            BsonType::Object    => "Object",
            BsonType::BinData   => "BinData",
            BsonType::ObjectId  => "jstOID",
            BsonType::Bool      => "Bool",
            BsonType::Date      => "Date",
            BsonType::Null      => "jstNULL",
            BsonType::Regex     => "RegEx",
            BsonType::Int32     => "NumberInt",
            BsonType::Timestamp => "bsonTimestamp",
            BsonType::Int64     => "NumberLong",
            BsonType::Decimal   => "NumberDecimal",
            // Any/Chain never reach a type switch.
            BsonType::Any       => "Undefined",
            BsonType::Chain     => "Undefined",
        }
    }
}

/// One struct alternative of a variant. When a variant lists more
/// than one struct, generated parsers dispatch objects on the name
/// of their first element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantStruct {
    /// The C++ class name of the alternative.
    pub cpp_name: String,
    /// Wire name of the struct's first field.
    pub first_field_name: String,
}

/// A fully resolved field type. One flat descriptor covers plain
/// types, enums, structs, arrays, and variants: the `is_*` flags
/// say which shape applies, exactly one of them at a time (with
/// `is_array` composing over the element described by the rest).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedType {
    /// The IDL name the reference resolved to.
    pub name: String,
    /// The C++ storage type.
    pub cpp_type: String,
    /// The accepted wire types, in declaration order.
    pub bson_serialization_type: Vec<BsonType>,
    /// BinData subtype tag, if any wire type is `bindata`.
    pub bindata_subtype: Option<String>,
    /// Custom serializer symbol. A `::`-qualified symbol is called
    /// as a function, a bare name as a method on the value.
    pub serializer: Option<String>,
    /// Custom deserializer, canonicalized by the binder to a fully
    /// qualified callable and emitted verbatim.
    pub deserializer: Option<String>,
    /// Default literal declared on the type itself.
    pub default: Option<String>,
    /// Whether deserialization needs the tenant from the context.
    pub deserialize_with_tenant: bool,
    /// Whether the reference resolved to an enum.
    pub is_enum: bool,
    /// Whether the reference resolved to a struct or command-reply.
    pub is_struct: bool,
    /// Whether this is `array<...>` of the described element.
    pub is_array: bool,
    /// Whether this is a variant over `variant_types` and
    /// `variant_structs`.
    pub is_variant: bool,
    /// Whether values point into the parse buffer.
    pub is_view: bool,
    /// Non-struct alternatives of a variant.
    pub variant_types: Vec<ResolvedType>,
    /// Struct alternatives of a variant.
    pub variant_structs: Vec<VariantStruct>,
}

/// A numeric-bounds-plus-callback validator, post-binding: every
/// bound is a checked numeric literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    /// Exclusive lower bound.
    pub gt: Option<String>,
    /// Inclusive lower bound.
    pub gte: Option<String>,
    /// Exclusive upper bound.
    pub lt: Option<String>,
    /// Inclusive upper bound.
    pub lte: Option<String>,
    /// Callback symbol invoked after the bounds checks.
    pub callback: Option<String>,
}

impl Validator {
    /// True iff no predicate at all was declared.
    pub fn is_empty(&self) -> bool {
        self.gt.is_none()
            && self.gte.is_none()
            && self.lt.is_none()
            && self.lte.is_none()
            && self.callback.is_none()
    }
}

/// How a field contributes to a query-shape fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryShapeFieldKind {
    /// Keep the literal value.
    Literal,
    /// Abstract the value into a parameter marker.
    Parameter,
    /// Keep as an identifier.
    Identifier,
    /// Replace string contents with an anonymized token. Only valid
    /// on string-typed fields.
    Anonymize,
}

impl QueryShapeFieldKind {
    /// Parses the document spelling of a kind.
    pub fn from_name(name: &str) -> Option<QueryShapeFieldKind> {
        let kind = match name {
            "literal"   => QueryShapeFieldKind::Literal,
            "parameter" => QueryShapeFieldKind::Parameter,
            "identifier"=> QueryShapeFieldKind::Identifier,
            "anonymize" => QueryShapeFieldKind::Anonymize,
            _ => return None,
        };
        Some(kind)
    }
}

/// A bound struct or command member.
#[derive(Debug, Clone)]
pub struct Field {
    /// Source position of the declaration (or of the struct, for
    /// injected implicit fields).
    pub location: Location,
    /// The wire name.
    pub name: String,
    /// The generated member/getter base name.
    pub cpp_name: String,
    /// Documentation string.
    pub description: String,
    /// Resolved type; `None` only for `ignore`d fields.
    pub type_: Option<ResolvedType>,
    /// Parse and discard without storing.
    pub ignore: bool,
    /// May be absent on the wire.
    pub optional: bool,
    /// Default literal, after propagation from the type.
    pub default: Option<String>,
    /// Serialize even when an unset optional.
    pub always_serialize: bool,
    /// May arrive as an OpMsg document sequence.
    pub supports_doc_sequence: bool,
    /// Supplied by the constructor rather than the parser (e.g. the
    /// database field of concatenate-with-db commands).
    pub constructed: bool,
    /// This entry is the placeholder for a chained struct.
    pub chained: bool,
    /// For fields copied out of an inlined chained struct: the
    /// member name of the placeholder they read/write through.
    pub chained_struct_field: Option<String>,
    /// Injected by the binder, not present on the wire.
    pub hidden: bool,
    /// Tie-breaker for comparison operators; document order when
    /// not declared.
    pub comparison_order: i64,
    /// Bound validator, if declared.
    pub validator: Option<Validator>,
    /// API stability tag.
    pub stability: Option<String>,
    /// Query-shape contribution, when the owner is a shape component.
    pub query_shape: Option<QueryShapeFieldKind>,
}

impl Field {
    /// True iff the generated parser must track whether the field
    /// was seen (required fields only).
    pub fn is_required(&self) -> bool {
        !self.optional && !self.ignore && !self.chained && !self.hidden
    }
}

/// A bound record.
#[derive(Debug, Clone)]
pub struct Struct {
    /// Source position of the declaration.
    pub location: Location,
    /// The IDL name.
    pub name: String,
    /// The generated C++ class name.
    pub cpp_name: String,
    /// Documentation string.
    pub description: String,
    /// Reject unknown fields during deserialization.
    pub strict: bool,
    /// Generate no setters.
    pub immutable: bool,
    /// Chained-struct fields were copied into this struct.
    pub inline_chained_structs: bool,
    /// Generate lexicographic comparison operators.
    pub generate_comparison_operators: bool,
    /// Whether any reachable member stores a reference into the
    /// parse buffer.
    pub is_view: bool,
    /// Marks generated reply types.
    pub is_command_reply: bool,
    /// Participates in query-shape fingerprinting.
    pub query_shape_component: bool,
    /// All members: declared, chained placeholders, inlined copies,
    /// and injected implicit fields, in binding order.
    pub fields: Vec<Field>,
}

/// Namespace discipline of a command: how its first wire field
/// encodes the target collection or database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandNamespace {
    /// The first field's value is ignored.
    Ignored,
    /// The first field is parsed by the command's own type.
    Type,
    /// The first field is a collection name concatenated with `$db`.
    ConcatenateWithDb,
    /// Like `ConcatenateWithDb`, but a UUID is also accepted.
    ConcatenateWithDbOrUuid,
}

impl CommandNamespace {
    /// Parses the document spelling of a namespace discipline.
    pub fn from_name(name: &str) -> Option<CommandNamespace> {
        let ns = match name {
            "ignored"                     => CommandNamespace::Ignored,
            "type"                        => CommandNamespace::Type,
            "concatenate_with_db"         => CommandNamespace::ConcatenateWithDb,
            "concatenate_with_db_or_uuid" => CommandNamespace::ConcatenateWithDbOrUuid,
            _ => return None,
        };
        Some(ns)
    }
}

/// One entry of a bound access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCheck {
    /// Resolved AccessCheck enumeration member.
    pub check: Option<String>,
    /// Resolved privilege.
    pub privilege: Option<Privilege>,
}

/// A bound (resource pattern, action types) privilege.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    /// Resolved MatchType enumeration member.
    pub resource_pattern: String,
    /// Resolved ActionType enumeration members.
    pub action_type: Vec<String>,
}

/// A command's bound authorization requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessChecks {
    /// The command performs its own checks.
    pub ignore: bool,
    /// No authorization required.
    pub none: bool,
    /// The simple/complex check entries (one entry for simple).
    pub checks: Vec<AccessCheck>,
}

/// A bound command.
#[derive(Debug, Clone)]
pub struct Command {
    /// The record part.
    pub base: Struct,
    /// Namespace discipline.
    pub namespace: CommandNamespace,
    /// For `Type` namespaces: the resolved type of the command's
    /// first element.
    pub namespace_type: Option<ResolvedType>,
    /// The wire name.
    pub command_name: String,
    /// Alternate wire name.
    pub command_alias: Option<String>,
    /// API version tag; empty means unversioned.
    pub api_version: Option<String>,
    /// Whether the command is deprecated.
    pub is_deprecated: bool,
    /// C++ class name of the reply struct.
    pub reply_type: Option<String>,
    /// Bound authorization requirements.
    pub access_checks: Option<AccessChecks>,
    /// Wire names contributed by generic argument lists; these are
    /// appended to the known-fields vector so generic arguments
    /// pass through unharmed.
    pub known_generic_fields: Vec<String>,
}

/// The wire representation of a bound enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumWireType {
    /// Consecutive 32-bit integers starting at the first value.
    Int,
    /// One string constant per value.
    String,
}

/// One bound enum value.
#[derive(Debug, Clone)]
pub struct EnumValue {
    /// Source position of the value.
    pub location: Location,
    /// The generated enumerator name.
    pub name: String,
    /// The wire value spelling.
    pub value: String,
    /// Opaque extra data re-emitted through the generated accessor.
    pub extra_data: Option<MarkedNode>,
}

/// A bound enumeration.
#[derive(Debug, Clone)]
pub struct Enum {
    /// Source position of the declaration.
    pub location: Location,
    /// The IDL name.
    pub name: String,
    /// The generated C++ enum name.
    pub cpp_name: String,
    /// Documentation string.
    pub description: String,
    /// Wire representation.
    pub wire_type: EnumWireType,
    /// The values, in document order.
    pub values: Vec<EnumValue>,
}

impl Enum {
    /// True iff any value carries extra data, which makes the
    /// generator emit the `extra_data` accessor.
    pub fn has_extra_data(&self) -> bool {
        self.values.iter().any(|v| v.extra_data.is_some())
    }
}

//
// Runtime tunables
//

/// When a server parameter may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServerParameterSetAt {
    /// At process startup only.
    Startup,
    /// At runtime via setParameter.
    Runtime,
    /// Cluster-wide; excludes every other specifier.
    Cluster,
    /// Never settable; excludes every other specifier.
    Readonly,
}

impl ServerParameterSetAt {
    /// Parses the document spelling of a specifier.
    pub fn from_name(name: &str) -> Option<ServerParameterSetAt> {
        let set_at = match name {
            "startup"  => ServerParameterSetAt::Startup,
            "runtime"  => ServerParameterSetAt::Runtime,
            "cluster"  => ServerParameterSetAt::Cluster,
            "readonly" => ServerParameterSetAt::Readonly,
        _ => return None,
        };
        Some(set_at)
    }

    /// The C++ enumerator emitted in registrations.
    pub fn cpp_enumerator(self) -> &'static str {
        match self {
            ServerParameterSetAt::Startup  => "ServerParameterType::kStartupOnly",
            ServerParameterSetAt::Runtime  => "ServerParameterType::kRuntimeOnly",
            ServerParameterSetAt::Cluster  => "ServerParameterType::kClusterWide",
            ServerParameterSetAt::Readonly => "ServerParameterType::kReadOnly",
        }
    }
}

/// A bound default/implicit value expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    /// The C++ spelling to emit.
    pub expr: String,
    /// Whether the expression is evaluable at compile time.
    pub is_constexpr: bool,
    /// Whether the spelling came from a bare scalar rather than an
    /// `expr:` block; bare string scalars still need quoting.
    pub is_literal: bool,
}

/// A bound registration condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    /// Preprocessor guard text.
    pub preprocessor: Option<String>,
    /// Compile-time predicate.
    pub constexpr_expr: Option<String>,
    /// Runtime predicate.
    pub expr: Option<String>,
}

/// A bound server parameter.
#[derive(Debug, Clone)]
pub struct ServerParameter {
    /// Source position of the declaration.
    pub location: Location,
    /// The parameter's name.
    pub name: String,
    /// Documentation string.
    pub description: String,
    /// Where the parameter may be set.
    pub set_at: Vec<ServerParameterSetAt>,
    /// Specialized-class form.
    pub cpp_class: Option<String>,
    /// Storage-backed form: storage type.
    pub cpp_vartype: Option<String>,
    /// Storage-backed form: storage variable.
    pub cpp_varname: Option<String>,
    /// Default value.
    pub default: Option<Expression>,
    /// Bound validator.
    pub validator: Option<Validator>,
    /// Post-update callback symbol.
    pub on_update: Option<String>,
    /// Redact the value in logs.
    pub redact: bool,
    /// Register only with test commands enabled.
    pub test_only: bool,
    /// Deprecated alias names.
    pub deprecated_name: Vec<String>,
    /// Registration condition.
    pub condition: Option<Condition>,
}

/// Lifecycle phase of a feature flag under incremental rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RolloutPhase {
    /// Classic binary-compatibility flag; not runtime mutable.
    NotForIncrementalRollout,
    /// Incremental rollout flag, disabled by default.
    InDevelopment,
    /// Incremental rollout flag, enabled by default.
    Rollout,
    /// Incremental rollout flag, permanently enabled.
    Released,
}

impl RolloutPhase {
    /// Parses the document spelling of a phase.
    pub fn from_name(name: &str) -> Option<RolloutPhase> {
        let phase = match name {
            "not_for_incremental_rollout" => RolloutPhase::NotForIncrementalRollout,
            "in_development"              => RolloutPhase::InDevelopment,
            "rollout"                     => RolloutPhase::Rollout,
            "released"                    => RolloutPhase::Released,
            _ => return None,
        };
        Some(phase)
    }

    /// Whether the flag participates in incremental feature rollout.
    /// Only such flags are runtime mutable.
    pub fn is_incremental(self) -> bool {
        self != RolloutPhase::NotForIncrementalRollout
    }
}

/// A bound feature flag.
#[derive(Debug, Clone)]
pub struct FeatureFlag {
    /// Source position of the declaration.
    pub location: Location,
    /// The flag's name.
    pub name: String,
    /// Documentation string.
    pub description: String,
    /// Storage variable name.
    pub cpp_varname: String,
    /// Whether the flag is enabled by default.
    pub default: bool,
    /// Version in which the flag became enabled by default.
    pub version: Option<String>,
    /// Lifecycle phase.
    pub phase: RolloutPhase,
    /// Whether enablement is FCV-gated.
    pub fcv_gated: bool,
}

/// Where a config option may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigSource {
    /// Command line.
    Cli,
    /// INI config file.
    Ini,
    /// YAML config file.
    Yaml,
}

impl ConfigSource {
    /// Parses the document spelling of a source specifier.
    pub fn from_name(name: &str) -> Option<ConfigSource> {
        let source = match name {
            "cli"  => ConfigSource::Cli,
            "ini"  => ConfigSource::Ini,
            "yaml" => ConfigSource::Yaml,
            _ => return None,
        };
        Some(source)
    }

    /// The `OptionSources` flag emitted in registrations.
    pub fn cpp_enumerator(self) -> &'static str {
        match self {
            ConfigSource::Cli  => "SourceCommandLine",
            ConfigSource::Ini  => "SourceINIConfig",
            ConfigSource::Yaml => "SourceYAMLConfig",
        }
    }
}

/// How repeated occurrences of a config option combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DuplicateBehavior {
    /// Collect all occurrences.
    Append,
    /// Last occurrence wins.
    Overwrite,
}

/// A positional-argument range; `None` ends are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionalRange {
    /// First 1-based position, if bounded.
    pub start: Option<i64>,
    /// Last 1-based position, if bounded.
    pub end: Option<i64>,
}

/// A bound config option.
#[derive(Debug, Clone)]
pub struct ConfigOption {
    /// Source position of the declaration.
    pub location: Location,
    /// The dotted long name.
    pub name: String,
    /// Alternate command-line spelling.
    pub short_name: Option<String>,
    /// One-letter command-line spelling.
    pub single_name: Option<String>,
    /// Deprecated long aliases.
    pub deprecated_name: Vec<String>,
    /// Deprecated short aliases.
    pub deprecated_short_name: Vec<String>,
    /// Documentation expression.
    pub description: Expression,
    /// Help section.
    pub section: Option<String>,
    /// Option-parsing value type.
    pub arg_vartype: String,
    /// Storage type, for bound options.
    pub cpp_vartype: Option<String>,
    /// Storage variable, for bound options.
    pub cpp_varname: Option<String>,
    /// Accepted sources.
    pub source: Vec<ConfigSource>,
    /// Default value.
    pub default: Option<Expression>,
    /// Implicit value.
    pub implicit: Option<Expression>,
    /// Conflicting options.
    pub conflicts: Vec<String>,
    /// Required companion options.
    pub requires: Vec<String>,
    /// Hidden from help.
    pub hidden: bool,
    /// Redacted in logs.
    pub redact: bool,
    /// Positional range, if the option is positional.
    pub positional: Option<PositionalRange>,
    /// Duplicate handling.
    pub duplicate_behavior: DuplicateBehavior,
    /// Bound validator.
    pub validator: Option<Validator>,
    /// Registration condition.
    pub condition: Option<Condition>,
}

/// Bound document-wide config defaults.
#[derive(Debug, Clone)]
pub struct ConfigGlobal {
    /// Default help section.
    pub section: Option<String>,
    /// Default sources.
    pub source: Vec<ConfigSource>,
    /// Name of the emitted registration initializer.
    pub initializer_name: String,
}

//
// The bound document
//

/// Bound document-level options.
#[derive(Debug, Clone, Default)]
pub struct Global {
    /// Target C++ namespace.
    pub cpp_namespace: String,
    /// Extra user includes for the generated header.
    pub cpp_includes: Vec<String>,
}

/// A completely bound document: everything the generator needs.
/// Only locally declared symbols appear in the lists; imported
/// symbols are reachable through the generated `#include`s listed
/// in `resolved_imports`.
#[derive(Debug, Clone, Default)]
pub struct BoundSpec {
    /// Document-level options.
    pub globals: Global,
    /// Locally declared structs, in document order.
    pub structs: Vec<Struct>,
    /// Locally declared commands, in document order.
    pub commands: Vec<Command>,
    /// Locally declared enums, in document order.
    pub enums: Vec<Enum>,
    /// Bound server parameters.
    pub server_parameters: Vec<ServerParameter>,
    /// Bound feature flags.
    pub feature_flags: Vec<FeatureFlag>,
    /// Bound config options.
    pub configs: Vec<ConfigOption>,
    /// Document-wide config defaults.
    pub config_global: Option<ConfigGlobal>,
    /// Paths of direct imports with struct/enum declarations.
    pub resolved_imports: Vec<String>,
}
