//
// syntax.rs
// The IDL Compiler
//

//! The syntax tree: the data model produced by the parser, before
//! any semantic validation has happened. Fields that the document
//! did not spell out are `None`/empty here; the binder is the pass
//! that checks invariants and produces the bound AST (`ast` module).
//!
//! The `SymbolTable` also lives here. It collects every named
//! declaration of a document plus everything merged in from its
//! imports, and detects duplicate symbols across all categories.

use yaml::MarkedNode;
use error::ErrorCollection;
use util::{ Located, Location };


/// One parsed document, plus every symbol merged from its imports.
#[derive(Debug, Clone, Default)]
pub struct Spec {
    /// The `global:` block, if present.
    pub globals: Option<Global>,
    /// The `imports:` block, if present; the loader fills in the
    /// resolved paths and the transitive dependency list.
    pub imports: Option<Import>,
    /// All named type/struct/command/enum declarations.
    pub symbols: SymbolTable,
    /// Declared server parameters, in document order.
    pub server_parameters: Vec<ServerParameter>,
    /// Declared feature flags, in document order.
    pub feature_flags: Vec<FeatureFlag>,
    /// Declared configuration options, in document order.
    pub configs: Vec<ConfigOption>,
}

/// The outcome of parsing a root document and its imports: either a
/// complete syntax tree, or the non-empty set of diagnostics that
/// prevented one from being built. The loader never panics and
/// never throws; every failure funnels into the collection.
pub type ParsedSpec = ::std::result::Result<Spec, ErrorCollection>;

//
// Document-level entities
//

/// The `global:` block of a root document.
#[derive(Debug, Clone)]
pub struct Global {
    /// Source position of the block.
    pub location: Location,
    /// Target C++ namespace for all generated declarations.
    pub cpp_namespace: Option<String>,
    /// Extra user includes emitted into the generated header.
    pub cpp_includes: Vec<String>,
    /// Defaults applied to every `configs:` declaration.
    pub configs: Option<ConfigGlobal>,
}

impl Global {
    /// An empty block at `location`.
    pub fn new(location: Location) -> Self {
        Global {
            location,
            cpp_namespace: None,
            cpp_includes: vec![],
            configs: None,
        }
    }
}

/// The `configs:` sub-block of `global:`.
#[derive(Debug, Clone)]
pub struct ConfigGlobal {
    /// Source position of the block.
    pub location: Location,
    /// Default section for every config option in the document.
    pub section: Option<String>,
    /// Default source bitmask specifiers (`cli`, `ini`, `yaml`).
    pub source: Vec<String>,
    /// Name of the emitted registration initializer.
    pub initializer_name: Option<String>,
}

impl ConfigGlobal {
    /// An empty block at `location`.
    pub fn new(location: Location) -> Self {
        ConfigGlobal {
            location,
            section: None,
            source: vec![],
            initializer_name: None,
        }
    }
}

/// The `imports:` block. The `imports` list is what the document
/// spelled; the other two lists are filled in by the loader.
#[derive(Debug, Clone)]
pub struct Import {
    /// Source position of the block.
    pub location: Location,
    /// Import names exactly as written in the document.
    pub imports: Vec<String>,
    /// Absolute paths of direct imports that transitively declare
    /// structs or enums; these drive generated `#include`s.
    pub resolved_file_names: Vec<String>,
    /// Absolute paths of every transitively imported file, for
    /// dependency-manifest emission.
    pub dependencies: Vec<String>,
}

impl Import {
    /// An empty block at `location`.
    pub fn new(location: Location) -> Self {
        Import {
            location,
            imports: vec![],
            resolved_file_names: vec![],
            dependencies: vec![],
        }
    }
}

//
// Types and fields
//

/// A named primitive or wrapper type declaration.
#[derive(Debug, Clone)]
pub struct Type {
    /// Source position of the declaration.
    pub location: Location,
    /// The IDL-visible name of the type.
    pub name: String,
    /// Required documentation string.
    pub description: Option<String>,
    /// The C++ type backing this IDL type.
    pub cpp_type: Option<String>,
    /// One or more wire-format serialization type tags.
    pub bson_serialization_type: Vec<String>,
    /// BinData subtype tag, for `bindata` wire types.
    pub bindata_subtype: Option<String>,
    /// Custom serializer symbol.
    pub serializer: Option<String>,
    /// Custom deserializer symbol.
    pub deserializer: Option<String>,
    /// Default literal applied to fields of this type that do not
    /// override it.
    pub default: Option<String>,
    /// Whether deserialization needs the tenant from the context.
    pub deserialize_with_tenant: bool,
    /// Internal-only types are skipped when inlining chained structs.
    pub internal_only: bool,
    /// Whether values of this type point into the parse buffer.
    pub is_view: bool,
    /// True iff the declaration came in through an import.
    pub imported: bool,
}

impl Type {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        Type {
            location,
            name,
            description: None,
            cpp_type: None,
            bson_serialization_type: vec![],
            bindata_subtype: None,
            serializer: None,
            deserializer: None,
            default: None,
            deserialize_with_tenant: false,
            internal_only: false,
            is_view: false,
            imported: false,
        }
    }
}

/// A bare type reference: just a name, plus where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTypeSingle {
    /// Source position of the reference.
    pub location: Location,
    /// The referenced type, struct, command, or enum name.
    pub type_name: String,
}

/// The type expression of a field, as written in the document.
/// Nested variants and nested arrays are rejected by the parser,
/// so alternatives of a `Variant` are `Single` or `Array` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `fieldName: TypeName`
    Single(FieldTypeSingle),
    /// `fieldName: array<TypeName>`
    Array(FieldTypeSingle),
    /// `fieldName: { variant: [T1, T2, ...] }`
    Variant(FieldTypeVariant),
}

/// The alternatives of a variant type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTypeVariant {
    /// Source position of the `variant:` key.
    pub location: Location,
    /// The alternative type expressions, in document order.
    pub alternatives: Vec<FieldType>,
}

impl FieldType {
    /// The source position of the whole type expression.
    pub fn location(&self) -> &Location {
        match *self {
            FieldType::Single(ref single) | FieldType::Array(ref single) => &single.location,
            FieldType::Variant(ref variant) => &variant.location,
        }
    }

    /// A printable rendition for diagnostics.
    pub fn debug_name(&self) -> String {
        match *self {
            FieldType::Single(ref single) => single.type_name.clone(),
            FieldType::Array(ref single) => format!("array<{}>", single.type_name),
            FieldType::Variant(_) => "variant".to_owned(),
        }
    }
}

/// A bounds-or-callback validation block attached to a field or a
/// runtime tunable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    /// Source position of the block.
    pub location: Location,
    /// Exclusive lower bound literal.
    pub gt: Option<String>,
    /// Inclusive lower bound literal.
    pub gte: Option<String>,
    /// Exclusive upper bound literal.
    pub lt: Option<String>,
    /// Inclusive upper bound literal.
    pub lte: Option<String>,
    /// Callback symbol invoked after the bounds checks.
    pub callback: Option<String>,
}

impl Validator {
    /// An empty block at `location`.
    pub fn new(location: Location) -> Self {
        Validator {
            location,
            ..Default::default()
        }
    }
}

/// A named member of a struct or command.
#[derive(Debug, Clone)]
pub struct Field {
    /// Source position of the declaration.
    pub location: Location,
    /// The wire name of the field.
    pub name: String,
    /// Documentation string.
    pub description: Option<String>,
    /// Override for the generated C++ member name.
    pub cpp_name: Option<String>,
    /// The type expression; `None` only for `ignore`d fields.
    pub type_: Option<FieldType>,
    /// Parse and discard the field without storing it.
    pub ignore: bool,
    /// The field may be absent on the wire.
    pub optional: bool,
    /// Default literal; mutually exclusive with `optional`.
    pub default: Option<String>,
    /// Serialize the field even when it is an unset optional.
    pub always_serialize: bool,
    /// Commands only: the field may arrive as an OpMsg document
    /// sequence instead of being embedded in the body.
    pub supports_doc_sequence: bool,
    /// Tie-breaker index for generated comparison operators.
    pub comparison_order: Option<i64>,
    /// Bounds/callback validation.
    pub validator: Option<Validator>,
    /// API stability tag (`stable`, `unstable`, `internal`).
    pub stability: Option<String>,
    /// Legacy spelling of `stability: unstable`; the binder rejects
    /// documents that set both.
    pub unstable: Option<bool>,
    /// How the field contributes to a query shape fingerprint.
    pub query_shape: Option<String>,
}

impl Field {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        Field {
            location,
            name,
            description: None,
            cpp_name: None,
            type_: None,
            ignore: false,
            optional: false,
            default: None,
            always_serialize: false,
            supports_doc_sequence: false,
            comparison_order: None,
            validator: None,
            stability: None,
            unstable: None,
            query_shape: None,
        }
    }
}

/// One entry of a `chained_types:` or `chained_structs:` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainedItem {
    /// Source position of the entry.
    pub location: Location,
    /// Name of the chained type or struct.
    pub name: String,
    /// Override for the generated member name.
    pub cpp_name: Option<String>,
}

/// A named record declaration.
#[derive(Debug, Clone)]
pub struct Struct {
    /// Source position of the declaration.
    pub location: Location,
    /// The IDL-visible name of the struct.
    pub name: String,
    /// Required documentation string.
    pub description: Option<String>,
    /// Override for the generated C++ class name.
    pub cpp_name: Option<String>,
    /// Strict structs reject unknown fields during deserialization.
    pub strict: bool,
    /// Immutable structs get no setters.
    pub immutable: bool,
    /// Whether chained-struct fields are copied into this struct.
    pub inline_chained_structs: bool,
    /// Whether to generate lexicographic comparison operators.
    pub generate_comparison_operators: bool,
    /// Chained types, in document order.
    pub chained_types: Vec<ChainedItem>,
    /// Chained structs, in document order.
    pub chained_structs: Vec<ChainedItem>,
    /// Declared fields, in document order.
    pub fields: Vec<Field>,
    /// Marks generated reply types of commands.
    pub is_command_reply: bool,
    /// Whether the struct participates in query-shape fingerprinting.
    pub query_shape_component: bool,
    /// True iff the declaration came in through an import.
    pub imported: bool,
}

impl Struct {
    /// A declaration with every attribute defaulted. Structs are
    /// strict unless the document opts out.
    pub fn new(location: Location, name: String) -> Self {
        Struct {
            location,
            name,
            description: None,
            cpp_name: None,
            strict: true,
            immutable: false,
            inline_chained_structs: false,
            generate_comparison_operators: false,
            chained_types: vec![],
            chained_structs: vec![],
            fields: vec![],
            is_command_reply: false,
            query_shape_component: false,
            imported: false,
        }
    }
}

/// A command declaration: a struct plus wire-request attributes.
#[derive(Debug, Clone)]
pub struct Command {
    /// The record part of the command.
    pub base: Struct,
    /// Namespace discipline (`ignored`, `type`, `concatenate_with_db`,
    /// `concatenate_with_db_or_uuid`).
    pub namespace: Option<String>,
    /// For `namespace: type`: the type that parses the command's
    /// first element.
    pub type_: Option<FieldType>,
    /// The wire name of the command; defaults to the declaration name.
    pub command_name: Option<String>,
    /// Optional alternate wire name.
    pub command_alias: Option<String>,
    /// API version tag; versioned commands must declare a reply type
    /// and an access check.
    pub api_version: Option<String>,
    /// Whether the command is deprecated.
    pub is_deprecated: bool,
    /// Name of the reply struct.
    pub reply_type: Option<String>,
    /// Authorization requirements.
    pub access_check: Option<AccessChecks>,
}

impl Command {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        Command {
            base: Struct::new(location, name),
            namespace: None,
            type_: None,
            command_name: None,
            command_alias: None,
            api_version: None,
            is_deprecated: false,
            reply_type: None,
            access_check: None,
        }
    }

    /// The wire name: the explicit `command_name` or the declaration name.
    pub fn wire_name(&self) -> &str {
        self.command_name.as_ref().map_or(&self.base.name, String::as_str)
    }
}

//
// Enumerations
//

/// One value of an enum declaration.
#[derive(Debug, Clone)]
pub struct EnumValue {
    /// Source position of the value.
    pub location: Location,
    /// The C++-visible name of the value.
    pub name: String,
    /// The wire value; an integer literal or a string.
    pub value: Option<String>,
    /// Documentation string.
    pub description: Option<String>,
    /// Arbitrary YAML attached to the value, re-emitted through the
    /// generated `extra_data` accessor.
    pub extra_data: Option<MarkedNode>,
}

impl EnumValue {
    /// A value with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        EnumValue {
            location,
            name,
            value: None,
            description: None,
            extra_data: None,
        }
    }
}

/// A named enumeration declaration.
#[derive(Debug, Clone)]
pub struct Enum {
    /// Source position of the declaration.
    pub location: Location,
    /// The IDL-visible name of the enum.
    pub name: String,
    /// Required documentation string.
    pub description: Option<String>,
    /// Override for the generated C++ enum name.
    pub cpp_name: Option<String>,
    /// The scalar wire type: `int` or `string`.
    pub type_name: Option<String>,
    /// The values, in document order.
    pub values: Vec<EnumValue>,
    /// True iff the declaration came in through an import.
    pub imported: bool,
}

impl Enum {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        Enum {
            location,
            name,
            description: None,
            cpp_name: None,
            type_name: None,
            values: vec![],
            imported: false,
        }
    }
}

//
// Generic argument and reply field lists
//

/// A named field list automatically appended to every command
/// request (or reply, for reply lists).
#[derive(Debug, Clone)]
pub struct GenericFieldList {
    /// Source position of the declaration.
    pub location: Location,
    /// The list's name.
    pub name: String,
    /// Documentation string.
    pub description: Option<String>,
    /// The member fields.
    pub fields: Vec<Field>,
    /// True for reply field lists, false for argument lists.
    pub is_reply: bool,
    /// True iff the declaration came in through an import.
    pub imported: bool,
}

impl GenericFieldList {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String, is_reply: bool) -> Self {
        GenericFieldList {
            location,
            name,
            description: None,
            fields: vec![],
            is_reply,
            imported: false,
        }
    }
}

//
// Access checks
//

/// The `access_check:` block of a command. Exactly one of the four
/// member forms must be present; the binder enforces this.
#[derive(Debug, Clone, Default)]
pub struct AccessChecks {
    /// Source position of the block.
    pub location: Location,
    /// The command performs its own checks.
    pub ignore: bool,
    /// The command requires no authorization.
    pub none: bool,
    /// A single check or privilege.
    pub simple: Option<AccessCheck>,
    /// A conjunction of checks and privileges.
    pub complex: Vec<AccessCheck>,
}

/// One entry of a simple or complex access check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessCheck {
    /// Source position of the entry.
    pub location: Location,
    /// Name of a member of the AccessCheck enumeration.
    pub check: Option<String>,
    /// A required privilege.
    pub privilege: Option<Privilege>,
}

/// A (resource pattern, action types) pair of a privilege check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Privilege {
    /// Source position of the entry.
    pub location: Location,
    /// Name of a member of the MatchType enumeration.
    pub resource_pattern: Option<String>,
    /// Names of members of the ActionType enumeration.
    pub action_type: Vec<String>,
}

//
// Conditions and expressions
//

/// A registration condition for server parameters and config
/// options: any combination of a preprocessor guard, a constexpr
/// predicate, and a runtime expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    /// Source position of the block.
    pub location: Location,
    /// Preprocessor `#if` guard text.
    pub preprocessor: Option<String>,
    /// Compile-time predicate expression.
    pub constexpr_expr: Option<String>,
    /// Runtime predicate expression.
    pub expr: Option<String>,
}

/// A literal-or-expression value, e.g. a default. A plain scalar is
/// a literal; the mapping form spells an expression and may mark it
/// `is_constexpr`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    /// Source position of the value.
    pub location: Location,
    /// The literal spelling, for the scalar form.
    pub literal: Option<String>,
    /// The expression text, for the mapping form.
    pub expr: Option<String>,
    /// Whether the expression is evaluable at compile time.
    pub is_constexpr: bool,
}

impl Expression {
    /// The emitted spelling: expression text or literal.
    pub fn as_cpp(&self) -> &str {
        self.expr
            .as_ref()
            .or(self.literal.as_ref())
            .map_or("", String::as_str)
    }
}

//
// Server parameters, feature flags, config options
//

/// A `server_parameters:` declaration.
#[derive(Debug, Clone)]
pub struct ServerParameter {
    /// Source position of the declaration.
    pub location: Location,
    /// The parameter's name.
    pub name: String,
    /// Required documentation string.
    pub description: Option<String>,
    /// Where the parameter may be set (`startup`, `runtime`,
    /// `cluster`, `readonly`).
    pub set_at: Vec<String>,
    /// Specialized-class form: the implementing C++ class.
    pub cpp_class: Option<String>,
    /// Storage-backed form: the storage type.
    pub cpp_vartype: Option<String>,
    /// Storage-backed form: the storage variable.
    pub cpp_varname: Option<String>,
    /// Default value.
    pub default: Option<Expression>,
    /// Bounds/callback validation.
    pub validator: Option<Validator>,
    /// Callback invoked after a successful update.
    pub on_update: Option<String>,
    /// Whether the value is redacted in logs and FTDC.
    pub redact: bool,
    /// Whether the parameter only exists with test commands enabled.
    pub test_only: bool,
    /// Old names that keep working as deprecated aliases.
    pub deprecated_name: Vec<String>,
    /// Registration condition.
    pub condition: Option<Condition>,
}

impl ServerParameter {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        ServerParameter {
            location,
            name,
            description: None,
            set_at: vec![],
            cpp_class: None,
            cpp_vartype: None,
            cpp_varname: None,
            default: None,
            validator: None,
            on_update: None,
            redact: false,
            test_only: false,
            deprecated_name: vec![],
            condition: None,
        }
    }
}

/// A `feature_flags:` declaration.
#[derive(Debug, Clone)]
pub struct FeatureFlag {
    /// Source position of the declaration.
    pub location: Location,
    /// The flag's name.
    pub name: String,
    /// Required documentation string.
    pub description: Option<String>,
    /// Storage variable name; defaults to `gFeatureFlag<Name>`.
    pub cpp_varname: Option<String>,
    /// Default enablement literal; required for flags outside the
    /// incremental rollout lifecycle.
    pub default: Option<String>,
    /// Version in which the flag became enabled by default.
    pub version: Option<String>,
    /// Lifecycle phase (`not_for_incremental_rollout`,
    /// `in_development`, `rollout`, `released`).
    pub incremental_rollout_phase: Option<String>,
    /// Whether enablement is gated on the feature compatibility
    /// version.
    pub fcv_gated: Option<bool>,
}

impl FeatureFlag {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        FeatureFlag {
            location,
            name,
            description: None,
            cpp_varname: None,
            default: None,
            version: None,
            incremental_rollout_phase: None,
            fcv_gated: None,
        }
    }
}

/// A `configs:` declaration.
#[derive(Debug, Clone)]
pub struct ConfigOption {
    /// Source position of the declaration.
    pub location: Location,
    /// The dotted long name of the option.
    pub name: String,
    /// Alternate command-line spelling; no `.` or `,` allowed.
    pub short_name: Option<String>,
    /// One-letter command-line spelling.
    pub single_name: Option<String>,
    /// Old long names kept as deprecated aliases.
    pub deprecated_name: Vec<String>,
    /// Old short names kept as deprecated aliases.
    pub deprecated_short_name: Vec<String>,
    /// Required documentation string.
    pub description: Option<Expression>,
    /// Help section.
    pub section: Option<String>,
    /// The option-parsing value type (`Switch`, `Bool`, `String`,
    /// `Int`, `Long`, `Double`, `StringVector`, `StringMap`,
    /// `Unsigned`, `UnsignedLongLong`).
    pub arg_vartype: Option<String>,
    /// Storage type for the bound variable.
    pub cpp_vartype: Option<String>,
    /// Storage variable name.
    pub cpp_varname: Option<String>,
    /// Accepted sources (`cli`, `ini`, `yaml`).
    pub source: Vec<String>,
    /// Default value.
    pub default: Option<Expression>,
    /// Value assumed when the option is given without an argument.
    pub implicit: Option<Expression>,
    /// Options that may not be combined with this one.
    pub conflicts: Vec<String>,
    /// Options that must accompany this one.
    pub requires: Vec<String>,
    /// Hidden from `--help`.
    pub hidden: bool,
    /// Redacted in logs.
    pub redact: bool,
    /// Positional-argument range (`N`, `N-M`, `N-`, `-M`).
    pub positional: Option<String>,
    /// How repeated occurrences combine (`append` or `overwrite`).
    pub duplicate_behavior: Option<String>,
    /// Bounds/callback validation.
    pub validator: Option<Validator>,
    /// Registration condition.
    pub condition: Option<Condition>,
}

impl ConfigOption {
    /// A declaration with every attribute defaulted.
    pub fn new(location: Location, name: String) -> Self {
        ConfigOption {
            location,
            name,
            short_name: None,
            single_name: None,
            deprecated_name: vec![],
            deprecated_short_name: vec![],
            description: None,
            section: None,
            arg_vartype: None,
            cpp_vartype: None,
            cpp_varname: None,
            source: vec![],
            default: None,
            implicit: None,
            conflicts: vec![],
            requires: vec![],
            hidden: false,
            redact: false,
            positional: None,
            duplicate_behavior: None,
            validator: None,
            condition: None,
        }
    }
}

//
// Symbol table
//

/// The category a symbol belongs to; used in duplicate diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    /// A `types:` declaration.
    Type,
    /// A `structs:` declaration.
    Struct,
    /// A `commands:` declaration.
    Command,
    /// An `enums:` declaration.
    Enum,
    /// A generic argument or reply field list.
    GenericFieldList,
}

impl SymbolKind {
    /// The lowercase noun used in diagnostics.
    pub fn noun(self) -> &'static str {
        match self {
            SymbolKind::Type             => "type",
            SymbolKind::Struct           => "struct",
            SymbolKind::Command          => "command",
            SymbolKind::Enum             => "enum",
            SymbolKind::GenericFieldList => "generic field list",
        }
    }
}

/// All named declarations of a document after import merging.
/// Names must be unique across the union of every category.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// Type declarations.
    pub types: Vec<Type>,
    /// Struct declarations.
    pub structs: Vec<Struct>,
    /// Command declarations.
    pub commands: Vec<Command>,
    /// Enum declarations.
    pub enums: Vec<Enum>,
    /// Generic argument/reply field lists.
    pub generic_field_lists: Vec<GenericFieldList>,
}

impl SymbolTable {
    /// An empty table.
    pub fn new() -> Self {
        SymbolTable::default()
    }

    fn find(&self, name: &str) -> Option<(SymbolKind, &Location, bool)> {
        if let Some(t) = self.types.iter().find(|t| t.name == name) {
            return Some((SymbolKind::Type, &t.location, t.imported));
        }
        if let Some(s) = self.structs.iter().find(|s| s.name == name) {
            return Some((SymbolKind::Struct, &s.location, s.imported));
        }
        if let Some(c) = self.commands.iter().find(|c| c.base.name == name) {
            return Some((SymbolKind::Command, &c.base.location, c.base.imported));
        }
        if let Some(e) = self.enums.iter().find(|e| e.name == name) {
            return Some((SymbolKind::Enum, &e.location, e.imported));
        }
        if let Some(l) = self.generic_field_lists.iter().find(|l| l.name == name) {
            return Some((SymbolKind::GenericFieldList, &l.location, l.imported));
        }
        None
    }

    /// True iff `name` is declared in any category.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    // Reports a duplicate unless the clash is the benign re-import
    // of one fully-qualified symbol along two import paths.
    fn check_duplicate(
        &self,
        errors: &mut ErrorCollection,
        kind: SymbolKind,
        location: &Location,
        name: &str,
    ) -> bool {
        match self.find(name) {
            Some((_, existing, imported)) => {
                if imported && existing.file == location.file {
                    return false; // same symbol seen through two imports
                }
                errors.add_duplicate_symbol(location, name, kind.noun());
                false
            },
            None => true,
        }
    }

    /// Adds a type declaration, diagnosing duplicates.
    pub fn add_type(&mut self, errors: &mut ErrorCollection, ty: Type) {
        if self.check_duplicate(errors, SymbolKind::Type, &ty.location, &ty.name) {
            self.types.push(ty)
        }
    }

    /// Adds a struct declaration, diagnosing duplicates.
    pub fn add_struct(&mut self, errors: &mut ErrorCollection, strct: Struct) {
        if self.check_duplicate(errors, SymbolKind::Struct, &strct.location, &strct.name) {
            self.structs.push(strct)
        }
    }

    /// Adds a command declaration, diagnosing duplicates.
    pub fn add_command(&mut self, errors: &mut ErrorCollection, command: Command) {
        let ok = self.check_duplicate(
            errors,
            SymbolKind::Command,
            &command.base.location,
            &command.base.name,
        );
        if ok {
            self.commands.push(command)
        }
    }

    /// Adds an enum declaration, diagnosing duplicates.
    pub fn add_enum(&mut self, errors: &mut ErrorCollection, enum_: Enum) {
        if self.check_duplicate(errors, SymbolKind::Enum, &enum_.location, &enum_.name) {
            self.enums.push(enum_)
        }
    }

    /// Adds a generic field list, diagnosing duplicates.
    pub fn add_generic_field_list(&mut self, errors: &mut ErrorCollection, list: GenericFieldList) {
        let ok = self.check_duplicate(
            errors,
            SymbolKind::GenericFieldList,
            &list.location,
            &list.name,
        );
        if ok {
            self.generic_field_lists.push(list)
        }
    }

    /// Looks up a type declaration by name.
    pub fn get_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Looks up a struct declaration by name.
    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Looks up a command declaration by name.
    pub fn get_command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.base.name == name)
    }

    /// Looks up an enum declaration by name.
    pub fn get_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// True iff the table contains any struct or enum declaration;
    /// only such imports generate `#include`s downstream.
    pub fn has_includable_symbols(&self) -> bool {
        !self.structs.is_empty() || !self.enums.is_empty() || !self.commands.is_empty()
    }

    /// Merges the symbols of an imported document into `self`,
    /// marking each as imported. Conflicts between two imports of
    /// the same fully-qualified symbol are skipped silently; any
    /// other conflict is a duplicate-symbol diagnostic.
    pub fn merge_imported(&mut self, errors: &mut ErrorCollection, other: SymbolTable) {
        let SymbolTable { types, structs, commands, enums, generic_field_lists } = other;

        for mut ty in types {
            ty.imported = true;
            self.add_type(errors, ty)
        }
        for mut strct in structs {
            strct.imported = true;
            self.add_struct(errors, strct)
        }
        for mut command in commands {
            command.base.imported = true;
            self.add_command(errors, command)
        }
        for mut enum_ in enums {
            enum_.imported = true;
            self.add_enum(errors, enum_)
        }
        for mut list in generic_field_lists {
            list.imported = true;
            self.add_generic_field_list(errors, list)
        }
    }
}

impl Located for Field {
    fn location(&self) -> &Location {
        &self.location
    }
}

impl Located for Struct {
    fn location(&self) -> &Location {
        &self.location
    }
}

impl Located for Command {
    fn location(&self) -> &Location {
        &self.base.location
    }
}

impl Located for Enum {
    fn location(&self) -> &Location {
        &self.location
    }
}

impl Located for Type {
    fn location(&self) -> &Location {
        &self.location
    }
}
