//
// binder.rs
// The IDL Compiler
//

//! The semantic pass: checks every invariant the structural parser
//! cannot, resolves type references against the symbol table, and
//! lowers the syntax tree into the bound AST. Binding never stops
//! at the first failure; each declaration records its diagnostics
//! and the pass reports them all at once.

use heck::{ CamelCase, MixedCase };
use syntax::{ self, SymbolTable, FieldType, FieldTypeSingle };
use ast;
use error::*;
use util::{ title_case, Location };


// C++ spellings that unambiguously denote a fixed-width numeric
// storage type. Custom numeric wrappers are exempt from the
// type-tag/storage-type agreement check.
static NUMERIC_CPP_TYPES: &'static [&'static str] = &[
    "std::int32_t",
    "std::int64_t",
    "std::uint32_t",
    "std::uint64_t",
    "double",
    "float",
];

static BINDATA_SUBTYPES: &'static [&'static str] = &[
    "generic",
    "function",
    "uuid",
    "md5",
    "encrypt",
    "column",
    "sensitive",
];

static ARG_VARTYPES: &'static [&'static str] = &[
    "Switch",
    "Bool",
    "String",
    "Int",
    "Long",
    "Double",
    "StringVector",
    "StringMap",
    "Unsigned",
    "UnsignedLongLong",
];

/// Binds a parsed document, producing either the bound AST the
/// generator consumes or every semantic diagnostic found.
pub fn bind(spec: &syntax::Spec) -> ::std::result::Result<ast::BoundSpec, ErrorCollection> {
    let mut errors = ErrorCollection::new();
    let mut bound = ast::BoundSpec::default();

    bound.globals = bind_globals(spec.globals.as_ref());

    validate_types(&mut errors, &spec.symbols);

    for enum_ in spec.symbols.enums.iter().filter(|e| !e.imported) {
        if let Some(enum_) = bind_enum(&mut errors, enum_) {
            bound.enums.push(enum_)
        }
    }

    for command in spec.symbols.commands.iter().filter(|c| !c.base.imported) {
        if let Some(command) = bind_command(&mut errors, &spec.symbols, command) {
            bound.commands.push(command)
        }
    }

    for strct in spec.symbols.structs.iter().filter(|s| !s.imported) {
        if let Some(strct) = bind_struct(&mut errors, &spec.symbols, strct) {
            bound.structs.push(strct)
        }
    }

    let config_global = spec.globals.as_ref().and_then(|g| g.configs.as_ref());

    for param in &spec.server_parameters {
        if let Some(param) = bind_server_parameter(&mut errors, param) {
            bound.server_parameters.push(param)
        }
    }

    for flag in &spec.feature_flags {
        if let Some(flag) = bind_feature_flag(&mut errors, flag) {
            bound.feature_flags.push(flag)
        }
    }

    for config in &spec.configs {
        if let Some(config) = bind_config_option(&mut errors, config_global, config) {
            bound.configs.push(config)
        }
    }

    bound.config_global = config_global.map(|g| bind_config_global(&mut errors, g));

    if let Some(ref imports) = spec.imports {
        bound.resolved_imports = imports.resolved_file_names.clone();
    }

    if errors.has_errors() {
        Err(errors)
    } else {
        Ok(bound)
    }
}

fn bind_globals(globals: Option<&syntax::Global>) -> ast::Global {
    match globals {
        Some(globals) => ast::Global {
            cpp_namespace: globals
                .cpp_namespace
                .clone()
                .unwrap_or_else(|| "mongo".to_owned()),
            cpp_includes: globals.cpp_includes.clone(),
        },
        None => ast::Global {
            cpp_namespace: "mongo".to_owned(),
            cpp_includes: vec![],
        },
    }
}

//
// Type declarations
//

fn parse_bson_types(ty: &syntax::Type) -> Vec<ast::BsonType> {
    ty.bson_serialization_type
        .iter()
        .filter_map(|tag| ast::BsonType::from_name(tag))
        .collect()
}

// Checks every type declaration, imported ones included: a broken
// declaration is diagnosed once here rather than at each use site.
// A '::'-qualified deserializer is already callable (a leading '::'
// names a free function); a bare name is a static member of the
// storage type. The generator emits the result verbatim.
fn canonical_deserializer(cpp_type: &str, symbol: &str) -> String {
    if symbol.contains("::") {
        symbol.to_owned()
    } else {
        format!("{}::{}", cpp_type, symbol)
    }
}

fn validate_types(errors: &mut ErrorCollection, symbols: &SymbolTable) {
    for ty in &symbols.types {
        for tag in &ty.bson_serialization_type {
            if ast::BsonType::from_name(tag).is_none() {
                errors.add(
                    &ty.location,
                    ERROR_ID_BAD_BSON_TYPE,
                    format!("'{}' is not a valid bson serialization type", tag),
                );
            }
        }

        let parsed = parse_bson_types(ty);

        let exclusive = parsed
            .iter()
            .any(|&t| t == ast::BsonType::Any || t == ast::BsonType::Chain);

        if exclusive && parsed.len() > 1 {
            errors.add(
                &ty.location,
                ERROR_ID_BAD_BSON_TYPE_LIST,
                "'any' and 'chain' must be the only serialization type of a type",
            );
        }

        let has_bindata = parsed.contains(&ast::BsonType::BinData);

        match (has_bindata, ty.bindata_subtype.as_ref()) {
            (true, Some(subtype)) => {
                if !BINDATA_SUBTYPES.contains(&subtype.as_str()) {
                    errors.add(
                        &ty.location,
                        ERROR_ID_BAD_BSON_BINDATA_SUBTYPE,
                        format!("'{}' is not a valid bindata subtype", subtype),
                    );
                }
            },
            (true, None) => {
                errors.add(
                    &ty.location,
                    ERROR_ID_BAD_BSON_BINDATA_SUBTYPE,
                    format!("bindata type '{}' requires a bindata_subtype", ty.name),
                );
            },
            (false, Some(_)) => {
                errors.add(
                    &ty.location,
                    ERROR_ID_BAD_BSON_BINDATA_SUBTYPE,
                    "bindata_subtype is only valid on bindata types",
                );
            },
            (false, None) => {},
        }

        if has_bindata && ty.default.is_some() {
            errors.add(
                &ty.location,
                ERROR_ID_BINDATA_DEFAULT,
                "bindata types may not have a default value",
            );
        }

        if let Some(ref cpp_type) = ty.cpp_type {
            if cpp_type == "StringData" || cpp_type.ends_with("::StringData") {
                errors.add(
                    &ty.location,
                    ERROR_ID_NO_STRINGDATA,
                    "StringData is not an owning type; use std::string instead",
                );
            }

            // a fixed-width storage type must agree with the wire tag
            if parsed.len() == 1 && ty.deserializer.is_none()
                && NUMERIC_CPP_TYPES.contains(&cpp_type.as_str())
            {
                let expected = match parsed[0] {
                    ast::BsonType::Int32    => Some("std::int32_t"),
                    ast::BsonType::Int64    => Some("std::int64_t"),
                    ast::BsonType::Floating => Some("double"),
                    _ => None,
                };

                if let Some(expected) = expected {
                    if cpp_type != expected {
                        errors.add(
                            &ty.location,
                            ERROR_ID_BAD_NUMERIC_CPP_TYPE,
                            format!(
                                "cpp_type '{}' does not match serialization type '{}', expected '{}'",
                                cpp_type,
                                parsed[0].name(),
                                expected,
                            ),
                        );
                    }
                }
            }
        }

        if parsed.contains(&ast::BsonType::Chain)
            && (ty.serializer.is_none() || ty.deserializer.is_none())
        {
            errors.add(
                &ty.location,
                ERROR_ID_CHAIN_NEEDS_SERIALIZERS,
                format!("chain type '{}' requires a serializer and a deserializer", ty.name),
            );
        }
    }
}

//
// Type resolution
//

fn struct_cpp_name(strct: &syntax::Struct) -> String {
    strct.cpp_name.clone().unwrap_or_else(|| title_case(&strct.name))
}

fn enum_cpp_name(enum_: &syntax::Enum) -> String {
    enum_.cpp_name.clone().unwrap_or_else(|| title_case(&enum_.name))
}

fn referenced_type_names(ty: &FieldType, names: &mut Vec<String>) {
    match *ty {
        FieldType::Single(ref single) | FieldType::Array(ref single) => {
            names.push(single.type_name.clone())
        },
        FieldType::Variant(ref variant) => {
            for alternative in &variant.alternatives {
                referenced_type_names(alternative, names)
            }
        },
    }
}

impl SymbolTable {
    // View-ness propagates: a struct is a view if any reachable
    // member type keeps references into the parse buffer. The
    // visiting list breaks reference cycles between structs.
    fn struct_is_view_inner(&self, strct: &syntax::Struct, visiting: &mut Vec<String>) -> bool {
        if visiting.contains(&strct.name) {
            return false;
        }

        visiting.push(strct.name.clone());

        let mut names = vec![];

        for field in &strct.fields {
            if let Some(ref ty) = field.type_ {
                referenced_type_names(ty, &mut names)
            }
        }

        for item in strct.chained_types.iter().chain(&strct.chained_structs) {
            names.push(item.name.clone())
        }

        let result = names.iter().any(|name| {
            if let Some(ty) = self.get_type(name) {
                return ty.is_view;
            }
            if let Some(nested) = self.get_struct(name) {
                return self.struct_is_view_inner(nested, visiting);
            }
            false
        });

        visiting.pop();
        result
    }

    fn struct_is_view(&self, strct: &syntax::Struct) -> bool {
        self.struct_is_view_inner(strct, &mut vec![])
    }

    fn resolve_single(
        &self,
        errors: &mut ErrorCollection,
        field_name: &str,
        single: &FieldTypeSingle,
    ) -> Option<ast::ResolvedType> {
        let name = single.type_name.as_str();

        if self.get_command(name).is_some() {
            errors.add(
                &single.location,
                ERROR_ID_COMMAND_AS_FIELD_TYPE,
                format!("command '{}' cannot be used as the type of field '{}'", name, field_name),
            );
            return None;
        }

        if let Some(strct) = self.get_struct(name) {
            return Some(
                ast::ResolvedType {
                    name: name.to_owned(),
                    cpp_type: struct_cpp_name(strct),
                    bson_serialization_type: vec![ast::BsonType::Object],
                    is_struct: true,
                    is_view: self.struct_is_view(strct),
                    ..Default::default()
                }
            );
        }

        if let Some(enum_) = self.get_enum(name) {
            let wire = match enum_.type_name.as_ref().map(String::as_str) {
                Some("int") => ast::BsonType::Int32,
                _ => ast::BsonType::String,
            };

            return Some(
                ast::ResolvedType {
                    name: name.to_owned(),
                    cpp_type: enum_cpp_name(enum_),
                    bson_serialization_type: vec![wire],
                    is_enum: true,
                    ..Default::default()
                }
            );
        }

        if let Some(ty) = self.get_type(name) {
            let cpp_type = ty.cpp_type.clone().unwrap_or_default();
            let deserializer = ty
                .deserializer
                .as_ref()
                .map(|d| canonical_deserializer(&cpp_type, d));

            return Some(
                ast::ResolvedType {
                    name: name.to_owned(),
                    cpp_type,
                    bson_serialization_type: parse_bson_types(ty),
                    bindata_subtype: ty.bindata_subtype.clone(),
                    serializer: ty.serializer.clone(),
                    deserializer,
                    default: ty.default.clone(),
                    deserialize_with_tenant: ty.deserialize_with_tenant,
                    is_view: ty.is_view,
                    ..Default::default()
                }
            );
        }

        errors.add_unknown_type(&single.location, field_name, name);
        None
    }

    fn resolve_variant(
        &self,
        errors: &mut ErrorCollection,
        field_name: &str,
        variant: &syntax::FieldTypeVariant,
    ) -> Option<ast::ResolvedType> {
        if variant.alternatives.len() < 2 {
            errors.add(
                &variant.location,
                ERROR_ID_VARIANT_TOO_FEW_ALTERNATIVES,
                format!("variant for field '{}' must have at least two alternatives", field_name),
            );
            return None;
        }

        let mut resolved = ast::ResolvedType {
            name: "variant".to_owned(),
            is_variant: true,
            ..Default::default()
        };

        let mut seen_tags: Vec<ast::BsonType> = vec![];
        let mut ok = true;

        for alternative in &variant.alternatives {
            let alt = match self.resolve_field_type(errors, field_name, alternative) {
                Some(alt) => alt,
                None => {
                    ok = false;
                    continue;
                },
            };

            if alt.is_enum {
                errors.add(
                    alternative.location(),
                    ERROR_ID_VARIANT_ENUM_ALTERNATIVE,
                    format!("variant for field '{}' may not contain enum alternatives", field_name),
                );
                ok = false;
                continue;
            }

            resolved.is_view = resolved.is_view || alt.is_view;

            if alt.is_struct && !alt.is_array {
                let duplicate = resolved
                    .variant_structs
                    .iter()
                    .any(|s| s.cpp_name == alt.cpp_type);

                if duplicate {
                    errors.add(
                        alternative.location(),
                        ERROR_ID_VARIANT_MULTIPLE_STRUCTS,
                        format!(
                            "variant for field '{}' lists struct '{}' more than once",
                            field_name,
                            alt.name,
                        ),
                    );
                    ok = false;
                    continue;
                }

                // the struct group as a whole occupies the 'object'
                // slot of the dispatch switch
                if resolved.variant_structs.is_empty() {
                    if seen_tags.contains(&ast::BsonType::Object) {
                        errors.add(
                            alternative.location(),
                            ERROR_ID_VARIANT_DUPLICATE_BSON_TYPE,
                            format!(
                                "variant for field '{}' has more than one alternative of bson type 'object'",
                                field_name,
                            ),
                        );
                        ok = false;
                        continue;
                    }
                    seen_tags.push(ast::BsonType::Object);
                }

                let first_field_name = self
                    .get_struct(&alt.name)
                    .and_then(|s| s.fields.first())
                    .map(|f| f.name.clone())
                    .unwrap_or_default();

                resolved.variant_structs.push(
                    ast::VariantStruct {
                        cpp_name: alt.cpp_type.clone(),
                        first_field_name,
                    }
                );
                continue;
            }

            // non-struct alternatives are dispatched on the wire type
            // of the element, so the leading tags must be distinct
            let tag = if alt.is_array {
                ast::BsonType::Object
            } else {
                match alt.bson_serialization_type.first() {
                    Some(&tag) => tag,
                    None => continue,
                }
            };

            if seen_tags.contains(&tag) {
                errors.add(
                    alternative.location(),
                    ERROR_ID_VARIANT_DUPLICATE_BSON_TYPE,
                    format!(
                        "variant for field '{}' has more than one alternative of bson type '{}'",
                        field_name,
                        tag.name(),
                    ),
                );
                ok = false;
                continue;
            }

            seen_tags.push(tag);
            resolved.variant_types.push(alt);
        }

        if ok { Some(resolved) } else { None }
    }

    /// Resolves a field's type expression against the table.
    pub fn resolve_field_type(
        &self,
        errors: &mut ErrorCollection,
        field_name: &str,
        ty: &FieldType,
    ) -> Option<ast::ResolvedType> {
        match *ty {
            FieldType::Single(ref single) => self.resolve_single(errors, field_name, single),
            FieldType::Array(ref single) => {
                let mut resolved = self.resolve_single(errors, field_name, single)?;
                resolved.is_array = true;
                Some(resolved)
            },
            FieldType::Variant(ref variant) => self.resolve_variant(errors, field_name, variant),
        }
    }
}

//
// Validators, expressions, conditions
//

fn bind_validator(errors: &mut ErrorCollection, validator: &syntax::Validator) -> Option<ast::Validator> {
    let bound = ast::Validator {
        gt: validator.gt.clone(),
        gte: validator.gte.clone(),
        lt: validator.lt.clone(),
        lte: validator.lte.clone(),
        callback: validator.callback.clone(),
    };

    if bound.is_empty() {
        errors.add(
            &validator.location,
            ERROR_ID_VALIDATOR_EMPTY,
            "validator must declare at least one bound or a callback",
        );
        return None;
    }

    let mut ok = true;

    {
        let bounds = [
            ("gt", &bound.gt),
            ("gte", &bound.gte),
            ("lt", &bound.lt),
            ("lte", &bound.lte),
        ];

        for &(name, value) in &bounds {
            if let Some(ref literal) = *value {
                if literal.parse::<f64>().is_err() {
                    errors.add(
                        &validator.location,
                        ERROR_ID_VALIDATOR_BAD_BOUND,
                        format!("validator bound '{}' is not a numeric literal: '{}'", name, literal),
                    );
                    ok = false;
                }
            }
        }
    }

    if ok { Some(bound) } else { None }
}

fn bind_expression(expression: &syntax::Expression) -> ast::Expression {
    ast::Expression {
        expr: expression.as_cpp().to_owned(),
        is_constexpr: expression.is_constexpr,
        is_literal: expression.expr.is_none(),
    }
}

fn bind_condition(condition: &syntax::Condition) -> ast::Condition {
    ast::Condition {
        preprocessor: condition.preprocessor.clone(),
        constexpr_expr: condition.constexpr_expr.clone(),
        expr: condition.expr.clone(),
    }
}

//
// Fields
//

fn bind_field(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    field: &syntax::Field,
    owner_is_command: bool,
    owner_is_shape_component: bool,
) -> Option<ast::Field> {
    if field.name.starts_with("array<") {
        errors.add(
            &field.location,
            ERROR_ID_BAD_ARRAY_FIELD_NAME,
            format!("'{}' is not a valid field name; declare the type as array<...> instead", field.name),
        );
        return None;
    }

    let mut bound = ast::Field {
        location: field.location.clone(),
        name: field.name.clone(),
        cpp_name: field.cpp_name.clone().unwrap_or_else(|| field.name.clone()),
        description: field.description.clone().unwrap_or_default(),
        type_: None,
        ignore: field.ignore,
        optional: field.optional,
        default: field.default.clone(),
        always_serialize: field.always_serialize,
        supports_doc_sequence: field.supports_doc_sequence,
        constructed: false,
        chained: false,
        chained_struct_field: None,
        hidden: false,
        comparison_order: 0,
        validator: None,
        stability: None,
        query_shape: None,
    };

    // stability and the legacy `unstable` flag are mutually exclusive
    match (field.stability.as_ref(), field.unstable) {
        (Some(_), Some(_)) => {
            errors.add(
                &field.location,
                ERROR_ID_MULTIPLE_STABILITY,
                format!("field '{}' sets both 'stability' and 'unstable'", field.name),
            );
        },
        (Some(stability), None) => {
            match stability.as_str() {
                "stable" | "unstable" | "internal" => bound.stability = Some(stability.clone()),
                other => {
                    errors.add(
                        &field.location,
                        ERROR_ID_BAD_STABILITY,
                        format!(
                            "'{}' is not a valid stability for field '{}', \
                             expected 'stable', 'unstable' or 'internal'",
                            other,
                            field.name,
                        ),
                    );
                },
            }
        },
        (None, Some(unstable)) => {
            bound.stability = Some(if unstable { "unstable" } else { "stable" }.to_owned())
        },
        (None, None) => {},
    }

    if let Some(ref kind) = field.query_shape {
        match ast::QueryShapeFieldKind::from_name(kind) {
            Some(kind) if owner_is_shape_component => bound.query_shape = Some(kind),
            Some(_) => {
                errors.add(
                    &field.location,
                    ERROR_ID_QUERY_SHAPE_KIND_OUTSIDE_COMPONENT,
                    format!(
                        "field '{}' declares query_shape but its struct is not a query_shape_component",
                        field.name,
                    ),
                );
            },
            None => {
                errors.add(
                    &field.location,
                    ERROR_ID_QUERY_SHAPE_BAD_KIND,
                    format!("'{}' is not a valid query_shape kind for field '{}'", kind, field.name),
                );
            },
        }
    }

    if field.ignore {
        return Some(bound);
    }

    let ty = match field.type_ {
        Some(ref ty) => symbols.resolve_field_type(errors, &field.name, ty)?,
        None => return None, // parser has already complained
    };

    if field.default.is_some() && field.optional {
        errors.add(
            &field.location,
            ERROR_ID_OPTIONAL_FIELD_DEFAULT,
            format!("optional field '{}' may not have a default value", field.name),
        );
    }

    if field.always_serialize && !field.optional {
        errors.add(
            &field.location,
            ERROR_ID_ALWAYS_SERIALIZE_NOT_OPTIONAL,
            format!("always_serialize on field '{}' requires the field to be optional", field.name),
        );
    }

    if ty.is_array && field.default.is_some() {
        errors.add(
            &field.location,
            ERROR_ID_ARRAY_FIELD_DEFAULT,
            format!("array field '{}' may not have a default value", field.name),
        );
    }

    if field.default.is_some() && ty.bson_serialization_type.contains(&ast::BsonType::BinData) {
        errors.add(
            &field.location,
            ERROR_ID_BINDATA_DEFAULT,
            format!("bindata field '{}' may not have a default value", field.name),
        );
    }

    if ty.is_struct && !ty.is_array {
        if let Some(ref default) = field.default {
            if default != "true" {
                errors.add(
                    &field.location,
                    ERROR_ID_STRUCT_DEFAULT_NOT_TRUE,
                    format!(
                        "struct field '{}' only supports 'default: true' \
                         (default construction), got '{}'",
                        field.name,
                        default,
                    ),
                );
            }
        }
    }

    if field.supports_doc_sequence {
        if !owner_is_command {
            errors.add(
                &field.location,
                ERROR_ID_NO_DOC_SEQUENCE_OUTSIDE_COMMAND,
                format!("field '{}' supports_doc_sequence outside of a command", field.name),
            );
        } else if !ty.is_array
            || !(ty.is_struct || ty.bson_serialization_type.contains(&ast::BsonType::Object))
        {
            errors.add(
                &field.location,
                ERROR_ID_NON_OBJECT_DOC_SEQUENCE,
                format!(
                    "field '{}' supports_doc_sequence but is not an array of objects",
                    field.name,
                ),
            );
        }
    }

    if let Some(kind) = bound.query_shape {
        if kind == ast::QueryShapeFieldKind::Anonymize {
            let is_string = ty.bson_serialization_type.contains(&ast::BsonType::String);

            if !is_string {
                errors.add(
                    &field.location,
                    ERROR_ID_QUERY_SHAPE_ANONYMIZE_NOT_STRING,
                    format!(
                        "query_shape: anonymize on field '{}' requires a string \
                         or array<string> type",
                        field.name,
                    ),
                );
            }
        }
    }

    // a type-level default applies wherever the field declares none
    if bound.default.is_none() && !field.optional && !ty.is_array {
        bound.default = ty.default.clone();
    }

    if let Some(ref validator) = field.validator {
        bound.validator = bind_validator(errors, validator);
    }

    bound.type_ = Some(ty);
    Some(bound)
}

//
// Structs
//

fn bind_chained_type(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    item: &syntax::ChainedItem,
) -> Option<ast::Field> {
    let ty = match symbols.get_type(&item.name) {
        Some(ty) => ty,
        None => {
            errors.add(
                &item.location,
                ERROR_ID_CHAINED_TYPE_NOT_FOUND,
                format!("chained type '{}' is not a known type", item.name),
            );
            return None;
        },
    };

    let parsed = parse_bson_types(ty);

    if !parsed.contains(&ast::BsonType::Chain) {
        errors.add(
            &item.location,
            ERROR_ID_CHAINED_TYPE_NOT_FOUND,
            format!("chained type '{}' must have bson serialization type 'chain'", item.name),
        );
        return None;
    }

    let cpp_name = item
        .cpp_name
        .clone()
        .unwrap_or_else(|| item.name.to_mixed_case());

    let cpp_type = ty.cpp_type.clone().unwrap_or_default();
    let deserializer = ty
        .deserializer
        .as_ref()
        .map(|d| canonical_deserializer(&cpp_type, d));

    Some(
        ast::Field {
            location: item.location.clone(),
            name: item.name.clone(),
            cpp_name,
            description: String::new(),
            type_: Some(
                ast::ResolvedType {
                    name: item.name.clone(),
                    cpp_type,
                    bson_serialization_type: parsed,
                    serializer: ty.serializer.clone(),
                    deserializer,
                    deserialize_with_tenant: ty.deserialize_with_tenant,
                    is_view: ty.is_view,
                    ..Default::default()
                }
            ),
            ignore: false,
            optional: false,
            default: None,
            always_serialize: false,
            supports_doc_sequence: false,
            constructed: false,
            chained: true,
            chained_struct_field: None,
            hidden: false,
            comparison_order: 0,
            validator: None,
            stability: None,
            query_shape: None,
        }
    )
}

fn bind_chained_struct(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    owner: &syntax::Struct,
    item: &syntax::ChainedItem,
    fields: &mut Vec<ast::Field>,
) {
    let chained = match symbols.get_struct(&item.name) {
        Some(chained) => chained,
        None => {
            errors.add(
                &item.location,
                ERROR_ID_CHAINED_STRUCT_NOT_FOUND,
                format!("chained struct '{}' is not a known struct", item.name),
            );
            return;
        },
    };

    if chained.strict {
        errors.add(
            &item.location,
            ERROR_ID_CHAINED_NO_NESTED_STRUCT_STRICT,
            format!("chained struct '{}' must declare strict: false", item.name),
        );
    }

    if !chained.chained_structs.is_empty() || !chained.chained_types.is_empty() {
        errors.add(
            &item.location,
            ERROR_ID_CHAINED_NO_NESTED_STRUCT_STRICT,
            format!("chained struct '{}' may not itself chain structs or types", item.name),
        );
    }

    let placeholder_cpp_name = item
        .cpp_name
        .clone()
        .unwrap_or_else(|| item.name.to_mixed_case());

    fields.push(
        ast::Field {
            location: item.location.clone(),
            name: item.name.clone(),
            cpp_name: placeholder_cpp_name.clone(),
            description: String::new(),
            type_: Some(
                ast::ResolvedType {
                    name: item.name.clone(),
                    cpp_type: struct_cpp_name(chained),
                    bson_serialization_type: vec![ast::BsonType::Chain],
                    is_struct: true,
                    is_view: symbols.struct_is_view(chained),
                    ..Default::default()
                }
            ),
            ignore: false,
            optional: false,
            default: None,
            always_serialize: false,
            supports_doc_sequence: false,
            constructed: false,
            chained: true,
            chained_struct_field: None,
            hidden: false,
            comparison_order: 0,
            validator: None,
            stability: None,
            query_shape: None,
        }
    );

    if !owner.inline_chained_structs {
        // the chained fields still count as known wire fields; they
        // are stored through the placeholder, not individually
        for field in &chained.fields {
            if let Some(mut bound) = bind_field(errors, symbols, field, false, false) {
                bound.ignore = true;
                fields.push(bound)
            }
        }
        return;
    }

    // copy the chained struct's fields into the owner, routing their
    // accessors through the placeholder member
    for field in &chained.fields {
        if let Some(ref ty) = field.type_ {
            let mut names = vec![];
            referenced_type_names(ty, &mut names);

            let internal_only = names
                .iter()
                .any(|name| symbols.get_type(name).map_or(false, |t| t.internal_only));

            if internal_only {
                continue;
            }
        }

        if let Some(mut bound) = bind_field(errors, symbols, field, false, false) {
            bound.chained_struct_field = Some(placeholder_cpp_name.clone());
            fields.push(bound)
        }
    }
}

fn assign_comparison_order(errors: &mut ErrorCollection, strct: &syntax::Struct, fields: &mut [ast::Field]) {
    if !strct.generate_comparison_operators {
        return;
    }

    let mut seen: Vec<i64> = vec![];

    for (index, field) in strct.fields.iter().enumerate() {
        let order = match field.comparison_order {
            Some(order) => {
                if seen.contains(&order) {
                    errors.add(
                        &field.location,
                        ERROR_ID_DUPLICATE_COMPARISON_ORDER,
                        format!("field '{}' repeats comparison_order {}", field.name, order),
                    );
                }
                seen.push(order);
                order
            },
            None => index as i64,
        };

        if let Some(bound) = fields.iter_mut().find(|f| f.name == field.name) {
            bound.comparison_order = order
        }
    }
}

fn bind_struct_base(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    strct: &syntax::Struct,
    is_command: bool,
) -> Option<ast::Struct> {
    let mut fields: Vec<ast::Field> = vec![];

    for field in &strct.fields {
        if let Some(bound) = bind_field(errors, symbols, field, is_command, strct.query_shape_component) {
            fields.push(bound)
        }
    }

    for item in &strct.chained_types {
        if let Some(bound) = bind_chained_type(errors, symbols, item) {
            fields.push(bound)
        }
    }

    for item in &strct.chained_structs {
        bind_chained_struct(errors, symbols, strct, item, &mut fields)
    }

    assign_comparison_order(errors, strct, &mut fields);

    if strct.query_shape_component {
        for field in &fields {
            if field.ignore || field.hidden || field.chained || field.query_shape.is_some() {
                continue;
            }
            errors.add(
                &field.location,
                ERROR_ID_QUERY_SHAPE_MISSING_FIELD_KIND,
                format!(
                    "field '{}' of query_shape_component struct '{}' must declare query_shape",
                    field.name,
                    strct.name,
                ),
            );
        }
    }

    // every struct carries the serialization context of its parse
    fields.push(serialization_context_field(&strct.location));

    Some(
        ast::Struct {
            location: strct.location.clone(),
            name: strct.name.clone(),
            cpp_name: struct_cpp_name(strct),
            description: strct.description.clone().unwrap_or_default(),
            strict: strct.strict,
            immutable: strct.immutable,
            inline_chained_structs: strct.inline_chained_structs,
            generate_comparison_operators: strct.generate_comparison_operators,
            is_view: symbols.struct_is_view(strct),
            is_command_reply: strct.is_command_reply,
            query_shape_component: strct.query_shape_component,
            fields,
        }
    )
}

fn bind_struct(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    strct: &syntax::Struct,
) -> Option<ast::Struct> {
    bind_struct_base(errors, symbols, strct, false)
}

//
// Commands
//

fn builtin_database_name_type(symbols: &SymbolTable) -> ast::ResolvedType {
    // basic_types.idl usually declares database_name; fall back to
    // the well-known spelling when it is not in scope
    if let Some(ty) = symbols.get_type("database_name") {
        let cpp_type = ty.cpp_type.clone().unwrap_or_default();
        let deserializer = ty
            .deserializer
            .as_ref()
            .map(|d| canonical_deserializer(&cpp_type, d));

        return ast::ResolvedType {
            name: "database_name".to_owned(),
            cpp_type,
            bson_serialization_type: parse_bson_types(ty),
            serializer: ty.serializer.clone(),
            deserializer,
            deserialize_with_tenant: ty.deserialize_with_tenant,
            is_view: ty.is_view,
            ..Default::default()
        };
    }

    ast::ResolvedType {
        name: "database_name".to_owned(),
        cpp_type: "mongo::DatabaseName".to_owned(),
        bson_serialization_type: vec![ast::BsonType::String],
        deserialize_with_tenant: true,
        ..Default::default()
    }
}

fn database_field(location: &Location, symbols: &SymbolTable, constructed: bool) -> ast::Field {
    ast::Field {
        location: location.clone(),
        name: "$db".to_owned(),
        cpp_name: "dbName".to_owned(),
        description: String::new(),
        type_: Some(builtin_database_name_type(symbols)),
        ignore: false,
        optional: false,
        default: None,
        always_serialize: false,
        supports_doc_sequence: false,
        constructed,
        chained: false,
        chained_struct_field: None,
        hidden: false,
        comparison_order: 0,
        validator: None,
        stability: None,
        query_shape: None,
    }
}

fn serialization_context_field(location: &Location) -> ast::Field {
    ast::Field {
        location: location.clone(),
        name: "serializationContext".to_owned(),
        cpp_name: "serializationContext".to_owned(),
        description: String::new(),
        type_: Some(
            ast::ResolvedType {
                name: "serialization_context".to_owned(),
                cpp_type: "mongo::SerializationContext".to_owned(),
                bson_serialization_type: vec![ast::BsonType::Any],
                ..Default::default()
            }
        ),
        ignore: false,
        optional: true,
        default: None,
        always_serialize: false,
        supports_doc_sequence: false,
        constructed: true,
        chained: false,
        chained_struct_field: None,
        hidden: true,
        comparison_order: 0,
        validator: None,
        stability: None,
        query_shape: None,
    }
}

fn enum_has_value(symbols: &SymbolTable, enum_name: &str, value: &str) -> Option<bool> {
    symbols
        .get_enum(enum_name)
        .map(|e| e.values.iter().any(|v| v.name == value))
}

fn bind_access_check_entry(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    entry: &syntax::AccessCheck,
) -> Option<ast::AccessCheck> {
    match (entry.check.as_ref(), entry.privilege.as_ref()) {
        (Some(_), Some(_)) | (None, None) => {
            errors.add(
                &entry.location,
                ERROR_ID_AMBIGUOUS_ACCESS_CHECK,
                "an access check entry must have exactly one of 'check' or 'privilege'",
            );
            None
        },
        (Some(check), None) => {
            if enum_has_value(symbols, "AccessCheck", check) == Some(false) {
                errors.add(
                    &entry.location,
                    ERROR_ID_UNKNOWN_ENUM_VALUE,
                    format!("'{}' is not a member of the AccessCheck enum", check),
                );
                return None;
            }

            Some(
                ast::AccessCheck {
                    check: Some(check.clone()),
                    privilege: None,
                }
            )
        },
        (None, Some(privilege)) => {
            let resource_pattern = match privilege.resource_pattern {
                Some(ref pattern) => pattern.clone(),
                None => {
                    errors.add_missing_required_field(
                        &privilege.location,
                        "privilege",
                        "resource_pattern",
                    );
                    return None;
                },
            };

            if privilege.action_type.is_empty() {
                errors.add_missing_required_field(&privilege.location, "privilege", "action_type");
                return None;
            }

            if enum_has_value(symbols, "MatchType", &resource_pattern) == Some(false) {
                errors.add(
                    &privilege.location,
                    ERROR_ID_UNKNOWN_ENUM_VALUE,
                    format!("'{}' is not a member of the MatchType enum", resource_pattern),
                );
                return None;
            }

            for action in &privilege.action_type {
                if enum_has_value(symbols, "ActionType", action) == Some(false) {
                    errors.add(
                        &privilege.location,
                        ERROR_ID_UNKNOWN_ENUM_VALUE,
                        format!("'{}' is not a member of the ActionType enum", action),
                    );
                    return None;
                }
            }

            Some(
                ast::AccessCheck {
                    check: None,
                    privilege: Some(
                        ast::Privilege {
                            resource_pattern,
                            action_type: privilege.action_type.clone(),
                        }
                    ),
                }
            )
        },
    }
}

fn bind_access_checks(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    checks: &syntax::AccessChecks,
) -> Option<ast::AccessChecks> {
    let forms = checks.ignore as usize
        + checks.none as usize
        + checks.simple.is_some() as usize
        + !checks.complex.is_empty() as usize;

    if forms != 1 {
        errors.add(
            &checks.location,
            ERROR_ID_AMBIGUOUS_ACCESS_CHECK,
            "access_check must have exactly one of 'ignore', 'none', 'simple' or 'complex'",
        );
        return None;
    }

    let mut bound = ast::AccessChecks {
        ignore: checks.ignore,
        none: checks.none,
        checks: vec![],
    };

    let entries: Vec<&syntax::AccessCheck> = checks
        .simple
        .iter()
        .chain(&checks.complex)
        .collect();

    for entry in entries {
        if let Some(entry) = bind_access_check_entry(errors, symbols, entry) {
            if let Some(ref check) = entry.check {
                let duplicate = bound
                    .checks
                    .iter()
                    .any(|c| c.check.as_ref() == Some(check));

                if duplicate {
                    errors.add(
                        &checks.location,
                        ERROR_ID_DUPLICATE_ACCESS_CHECK,
                        format!("access check '{}' appears more than once", check),
                    );
                    continue;
                }
            }

            if let Some(ref privilege) = entry.privilege {
                let duplicate = bound.checks.iter().any(|c| {
                    c.privilege
                        .as_ref()
                        .map_or(false, |p| p.resource_pattern == privilege.resource_pattern)
                });

                if duplicate {
                    errors.add(
                        &checks.location,
                        ERROR_ID_DUPLICATE_PRIVILEGE,
                        format!(
                            "privilege for resource pattern '{}' appears more than once",
                            privilege.resource_pattern,
                        ),
                    );
                    continue;
                }
            }

            bound.checks.push(entry)
        }
    }

    Some(bound)
}

// Generic argument lists ride along on every command, chained the
// way a non-inlined chained struct is: one placeholder member plus
// the member fields marked `ignore`.
fn bind_generic_argument_list(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    list: &syntax::GenericFieldList,
    fields: &mut Vec<ast::Field>,
) {
    fields.push(
        ast::Field {
            location: list.location.clone(),
            name: list.name.clone(),
            cpp_name: list.name.to_mixed_case(),
            description: String::new(),
            type_: Some(
                ast::ResolvedType {
                    name: list.name.clone(),
                    cpp_type: title_case(&list.name),
                    bson_serialization_type: vec![ast::BsonType::Chain],
                    is_struct: true,
                    ..Default::default()
                }
            ),
            ignore: false,
            optional: false,
            default: None,
            always_serialize: false,
            supports_doc_sequence: false,
            constructed: false,
            chained: true,
            chained_struct_field: None,
            hidden: false,
            comparison_order: 0,
            validator: None,
            stability: None,
            query_shape: None,
        }
    );

    for field in &list.fields {
        if let Some(mut bound) = bind_field(errors, symbols, field, true, false) {
            bound.ignore = true;
            fields.push(bound)
        }
    }
}

fn bind_command(
    errors: &mut ErrorCollection,
    symbols: &SymbolTable,
    command: &syntax::Command,
) -> Option<ast::Command> {
    let mut base = bind_struct_base(errors, symbols, &command.base, true)?;

    let namespace = match command.namespace {
        Some(ref name) => match ast::CommandNamespace::from_name(name) {
            Some(namespace) => namespace,
            None => {
                errors.add(
                    &command.base.location,
                    ERROR_ID_BAD_COMMAND_NAMESPACE,
                    format!("'{}' is not a valid command namespace", name),
                );
                return None;
            },
        },
        None => return None, // parser has already complained
    };

    let namespace_type = match (namespace, command.type_.as_ref()) {
        (ast::CommandNamespace::Type, Some(ty)) => {
            symbols.resolve_field_type(errors, command.wire_name(), ty)
        },
        (ast::CommandNamespace::Type, None) => {
            errors.add_missing_required_field(&command.base.location, "command", "type");
            None
        },
        (_, Some(ty)) => {
            errors.add(
                ty.location(),
                ERROR_ID_BAD_COMMAND_NAMESPACE,
                "'type' is only valid on commands with 'namespace: type'",
            );
            None
        },
        (_, None) => None,
    };

    let command_name = command.wire_name().to_owned();

    if let Some(ref alias) = command.command_alias {
        if *alias == command_name {
            errors.add(
                &command.base.location,
                ERROR_ID_DUPLICATE_COMMAND_NAME_AND_ALIAS,
                format!("command_alias '{}' duplicates the command name", alias),
            );
        }
    }

    for field in &base.fields {
        if field.name == command_name
            || command.command_alias.as_ref() == Some(&field.name)
        {
            errors.add(
                &field.location,
                ERROR_ID_COMMAND_NAME_COLLIDES_WITH_FIELD,
                format!("field '{}' collides with the command name", field.name),
            );
        }
    }

    let versioned = command.api_version.as_ref().map_or(false, |v| !v.is_empty());

    if versioned && command.reply_type.is_none() {
        errors.add(
            &command.base.location,
            ERROR_ID_MISSING_REPLY_TYPE,
            format!("versioned command '{}' must declare a reply_type", command_name),
        );
    }

    if versioned && command.access_check.is_none() {
        errors.add(
            &command.base.location,
            ERROR_ID_MISSING_ACCESS_CHECK,
            format!("versioned command '{}' must declare an access_check", command_name),
        );
    }

    let reply_type = match command.reply_type {
        Some(ref name) => match symbols.get_struct(name) {
            Some(reply) => Some(struct_cpp_name(reply)),
            None => {
                errors.add(
                    &command.base.location,
                    ERROR_ID_UNKNOWN_REPLY_TYPE,
                    format!("reply_type '{}' is not a known struct", name),
                );
                None
            },
        },
        None => None,
    };

    let access_checks = match command.access_check {
        Some(ref checks) => bind_access_checks(errors, symbols, checks),
        None => None,
    };

    // every command carries $db; the constructor supplies it when the
    // namespace concatenates it with the collection name
    let constructed = namespace == ast::CommandNamespace::ConcatenateWithDb;
    base.fields.push(database_field(&command.base.location, symbols, constructed));

    for list in symbols.generic_field_lists.iter().filter(|l| !l.is_reply) {
        bind_generic_argument_list(errors, symbols, list, &mut base.fields)
    }

    let known_generic_fields = symbols
        .generic_field_lists
        .iter()
        .filter(|list| !list.is_reply)
        .flat_map(|list| list.fields.iter().map(|f| f.name.clone()))
        .collect();

    Some(
        ast::Command {
            base,
            namespace,
            namespace_type,
            command_name,
            command_alias: command.command_alias.clone(),
            api_version: command.api_version.clone(),
            is_deprecated: command.is_deprecated,
            reply_type,
            access_checks,
            known_generic_fields,
        }
    )
}

//
// Enums
//

fn bind_enum(errors: &mut ErrorCollection, enum_: &syntax::Enum) -> Option<ast::Enum> {
    let wire_type = match enum_.type_name.as_ref().map(String::as_str) {
        Some("int") => ast::EnumWireType::Int,
        Some("string") => ast::EnumWireType::String,
        Some(other) => {
            errors.add(
                &enum_.location,
                ERROR_ID_ENUM_BAD_TYPE,
                format!("enum '{}' has invalid type '{}', expected 'int' or 'string'", enum_.name, other),
            );
            return None;
        },
        None => return None, // parser has already complained
    };

    let mut values = vec![];
    let mut wire_values: Vec<&str> = vec![];
    let mut int_values: Vec<i64> = vec![];

    for value in &enum_.values {
        let wire = match value.value {
            Some(ref wire) => wire.as_str(),
            None => continue, // parser has already complained
        };

        if wire_values.contains(&wire) {
            errors.add(
                &value.location,
                ERROR_ID_ENUM_DUPLICATE_VALUE,
                format!("enum '{}' repeats the value '{}'", enum_.name, wire),
            );
            continue;
        }

        wire_values.push(wire);

        if wire_type == ast::EnumWireType::Int {
            match wire.parse::<i64>() {
                Ok(int) => int_values.push(int),
                Err(_) => {
                    errors.add(
                        &value.location,
                        ERROR_ID_ENUM_BAD_INT_VALUE,
                        format!("enum value '{}' of '{}' is not an integer", wire, enum_.name),
                    );
                    continue;
                },
            }
        }

        values.push(
            ast::EnumValue {
                location: value.location.clone(),
                name: value.name.clone(),
                value: wire.to_owned(),
                extra_data: value.extra_data.clone(),
            }
        );
    }

    if wire_type == ast::EnumWireType::Int && !int_values.is_empty() {
        let mut sorted = int_values.clone();
        sorted.sort();

        let continuous = sorted
            .iter()
            .zip(sorted.iter().skip(1))
            .all(|(a, b)| *b == a + 1);

        if !continuous {
            errors.add(
                &enum_.location,
                ERROR_ID_ENUM_NON_CONTINUOUS_VALUE,
                format!("int enum '{}' must have continuous values", enum_.name),
            );
        }
    }

    Some(
        ast::Enum {
            location: enum_.location.clone(),
            name: enum_.name.clone(),
            cpp_name: enum_cpp_name(enum_),
            description: enum_.description.clone().unwrap_or_default(),
            wire_type,
            values,
        }
    )
}

//
// Server parameters
//

fn bind_server_parameter(
    errors: &mut ErrorCollection,
    param: &syntax::ServerParameter,
) -> Option<ast::ServerParameter> {
    let mut set_at = vec![];

    for spec in &param.set_at {
        match ast::ServerParameterSetAt::from_name(spec) {
            Some(parsed) => set_at.push(parsed),
            None => {
                errors.add(
                    &param.location,
                    ERROR_ID_SERVER_PARAMETER_INVALID_SET_AT,
                    format!("'{}' is not a valid set_at specifier", spec),
                );
            },
        }
    }

    let exclusive = set_at.iter().any(|&s| {
        s == ast::ServerParameterSetAt::Cluster || s == ast::ServerParameterSetAt::Readonly
    });

    if exclusive && set_at.len() > 1 {
        errors.add(
            &param.location,
            ERROR_ID_SERVER_PARAMETER_INVALID_SET_AT,
            "'cluster' and 'readonly' must be the only set_at specifier",
        );
    }

    let has_class = param.cpp_class.is_some();
    let has_storage = param.cpp_varname.is_some();

    if has_class == has_storage {
        errors.add(
            &param.location,
            ERROR_ID_SERVER_PARAMETER_STORAGE_CONFLICT,
            format!(
                "server parameter '{}' requires exactly one of cpp_class or cpp_varname",
                param.name,
            ),
        );
    } else if param.cpp_vartype.is_some() && !has_storage {
        errors.add(
            &param.location,
            ERROR_ID_SERVER_PARAMETER_STORAGE_CONFLICT,
            format!("server parameter '{}' has cpp_vartype without cpp_varname", param.name),
        );
    }

    let validator = match param.validator {
        Some(ref validator) => bind_validator(errors, validator),
        None => None,
    };

    Some(
        ast::ServerParameter {
            location: param.location.clone(),
            name: param.name.clone(),
            description: param.description.clone().unwrap_or_default(),
            set_at,
            cpp_class: param.cpp_class.clone(),
            cpp_vartype: param.cpp_vartype.clone(),
            cpp_varname: param.cpp_varname.clone(),
            default: param.default.as_ref().map(bind_expression),
            validator,
            on_update: param.on_update.clone(),
            redact: param.redact,
            test_only: param.test_only,
            deprecated_name: param.deprecated_name.clone(),
            condition: param.condition.as_ref().map(bind_condition),
        }
    )
}

//
// Feature flags
//

fn bind_feature_flag(errors: &mut ErrorCollection, flag: &syntax::FeatureFlag) -> Option<ast::FeatureFlag> {
    let phase = match flag.incremental_rollout_phase {
        Some(ref name) => match ast::RolloutPhase::from_name(name) {
            Some(phase) => phase,
            None => {
                errors.add(
                    &flag.location,
                    ERROR_ID_FEATURE_FLAG_BAD_PHASE,
                    format!("'{}' is not a valid incremental_rollout_phase", name),
                );
                return None;
            },
        },
        None => ast::RolloutPhase::NotForIncrementalRollout,
    };

    let fcv_gated = flag.fcv_gated.unwrap_or(false);

    let explicit_default = match flag.default {
        Some(ref literal) => match literal.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                errors.add_bad_bool(&flag.location, "default", other);
                return None;
            },
        },
        None => None,
    };

    let default;

    if phase.is_incremental() {
        if flag.version.is_some() {
            errors.add(
                &flag.location,
                ERROR_ID_FEATURE_FLAG_ROLLOUT_WITH_VERSION,
                format!("incremental rollout flag '{}' may not declare a version", flag.name),
            );
        }

        if fcv_gated {
            errors.add(
                &flag.location,
                ERROR_ID_FEATURE_FLAG_FCV_GATED_ROLLOUT,
                format!("incremental rollout flag '{}' may not be fcv_gated", flag.name),
            );
        }

        default = phase != ast::RolloutPhase::InDevelopment;

        if let Some(explicit) = explicit_default {
            if explicit != default {
                errors.add(
                    &flag.location,
                    ERROR_ID_FEATURE_FLAG_BAD_PHASE,
                    format!(
                        "feature flag '{}' declares a default contradicting its rollout phase",
                        flag.name,
                    ),
                );
            }
        }
    } else {
        default = match explicit_default {
            Some(explicit) => explicit,
            None => {
                errors.add(
                    &flag.location,
                    ERROR_ID_FEATURE_FLAG_MISSING_DEFAULT,
                    format!("feature flag '{}' must declare a default", flag.name),
                );
                return None;
            },
        };

        if default && fcv_gated && flag.version.is_none() {
            errors.add(
                &flag.location,
                ERROR_ID_FEATURE_FLAG_DEFAULT_TRUE_MISSING_VERSION,
                format!(
                    "fcv_gated feature flag '{}' defaults to true and must declare a version",
                    flag.name,
                ),
            );
        }

        if flag.version.is_some() && !(default && fcv_gated) {
            errors.add(
                &flag.location,
                ERROR_ID_FEATURE_FLAG_DEFAULT_FALSE_HAS_VERSION,
                format!(
                    "feature flag '{}' declares a version but only fcv_gated flags \
                     defaulting to true may have one",
                    flag.name,
                ),
            );
        }
    }

    let cpp_varname = flag
        .cpp_varname
        .clone()
        .unwrap_or_else(|| format!("g{}", flag.name.to_camel_case()));

    Some(
        ast::FeatureFlag {
            location: flag.location.clone(),
            name: flag.name.clone(),
            description: flag.description.clone().unwrap_or_default(),
            cpp_varname,
            default,
            version: flag.version.clone(),
            phase,
            fcv_gated,
        }
    )
}

//
// Config options
//

fn bind_sources(
    errors: &mut ErrorCollection,
    location: &Location,
    specifiers: &[String],
) -> Vec<ast::ConfigSource> {
    let mut sources = vec![];

    for spec in specifiers {
        match ast::ConfigSource::from_name(spec) {
            Some(source) => sources.push(source),
            None => {
                errors.add(
                    location,
                    ERROR_ID_BAD_SOURCE_SPECIFIER,
                    format!("'{}' is not a valid source specifier, expected 'cli', 'ini' or 'yaml'", spec),
                );
            },
        }
    }

    sources
}

fn bind_config_global(errors: &mut ErrorCollection, global: &syntax::ConfigGlobal) -> ast::ConfigGlobal {
    ast::ConfigGlobal {
        section: global.section.clone(),
        source: bind_sources(errors, &global.location, &global.source),
        initializer_name: global
            .initializer_name
            .clone()
            .unwrap_or_else(|| "idl".to_owned()),
    }
}

fn parse_positional_range(
    errors: &mut ErrorCollection,
    location: &Location,
    text: &str,
) -> Option<ast::PositionalRange> {
    let bad = |errors: &mut ErrorCollection| {
        errors.add(
            location,
            ERROR_ID_BAD_POSITIONAL_RANGE,
            format!("'{}' is not a valid positional range, expected N, N-M, N- or -M", text),
        );
        None
    };

    let parse_bound = |part: &str| -> Option<Option<i64>> {
        if part.is_empty() {
            return Some(None);
        }
        match part.parse::<i64>() {
            Ok(n) if n >= 1 => Some(Some(n)),
            _ => None,
        }
    };

    if !text.contains('-') {
        return match parse_bound(text) {
            Some(bound @ Some(_)) => Some(ast::PositionalRange { start: bound, end: bound }),
            _ => bad(errors),
        };
    }

    let mut parts = text.splitn(2, '-');
    let start_text = parts.next().unwrap_or("");
    let end_text = parts.next().unwrap_or("");

    let start = match parse_bound(start_text) {
        Some(start) => start,
        None => return bad(errors),
    };
    let end = match parse_bound(end_text) {
        Some(end) => end,
        None => return bad(errors),
    };

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return bad(errors);
        }
    }

    if start.is_none() && end.is_none() {
        return bad(errors);
    }

    Some(ast::PositionalRange { start, end })
}

fn bind_config_option(
    errors: &mut ErrorCollection,
    global: Option<&syntax::ConfigGlobal>,
    config: &syntax::ConfigOption,
) -> Option<ast::ConfigOption> {
    let arg_vartype = match config.arg_vartype {
        Some(ref vartype) => {
            if !ARG_VARTYPES.contains(&vartype.as_str()) {
                errors.add(
                    &config.location,
                    ERROR_ID_BAD_ARG_VARTYPE,
                    format!("'{}' is not a valid arg_vartype", vartype),
                );
                return None;
            }
            vartype.clone()
        },
        None => return None, // parser has already complained
    };

    if let Some(ref short_name) = config.short_name {
        if short_name.contains('.') || short_name.contains(',') {
            errors.add(
                &config.location,
                ERROR_ID_BAD_SHORT_NAME,
                format!("short_name '{}' may not contain '.' or ','", short_name),
            );
        }
    }

    if config.name.contains('.') && config.short_name.is_none() {
        errors.add(
            &config.location,
            ERROR_ID_MISSING_SHORT_NAME,
            format!("dotted config option '{}' requires a short_name", config.name),
        );
    }

    if let Some(ref single_name) = config.single_name {
        if single_name.chars().count() != 1 {
            errors.add(
                &config.location,
                ERROR_ID_BAD_SINGLE_NAME,
                format!("single_name '{}' must be a single character", single_name),
            );
        }

        if config.short_name.is_none() {
            errors.add(
                &config.location,
                ERROR_ID_MISSING_SHORT_NAME,
                format!("config option '{}' with a single_name requires a short_name", config.name),
            );
        }
    }

    let mut source = bind_sources(errors, &config.location, &config.source);

    if source.is_empty() {
        source = match global {
            Some(global) if !global.source.is_empty() => {
                bind_sources(errors, &config.location, &global.source)
            },
            _ => vec![
                ast::ConfigSource::Cli,
                ast::ConfigSource::Ini,
                ast::ConfigSource::Yaml,
            ],
        };
    }

    let duplicate_behavior = match config.duplicate_behavior {
        Some(ref behavior) => match behavior.as_str() {
            "append"    => ast::DuplicateBehavior::Append,
            "overwrite" => ast::DuplicateBehavior::Overwrite,
            other => {
                errors.add(
                    &config.location,
                    ERROR_ID_BAD_DUPLICATE_BEHAVIOR,
                    format!("'{}' is not a valid duplicate_behavior", other),
                );
                return None;
            },
        },
        // repeatable option kinds accumulate, everything else is
        // last-one-wins
        None => match arg_vartype.as_str() {
            "StringVector" | "StringMap" => ast::DuplicateBehavior::Append,
            _ => ast::DuplicateBehavior::Overwrite,
        },
    };

    let positional = match config.positional {
        Some(ref text) => {
            let text = text.clone();
            parse_positional_range(errors, &config.location, &text)
        },
        None => None,
    };

    let validator = match config.validator {
        Some(ref validator) => bind_validator(errors, validator),
        None => None,
    };

    let section = config
        .section
        .clone()
        .or_else(|| global.and_then(|g| g.section.clone()));

    Some(
        ast::ConfigOption {
            location: config.location.clone(),
            name: config.name.clone(),
            short_name: config.short_name.clone(),
            single_name: config.single_name.clone(),
            deprecated_name: config.deprecated_name.clone(),
            deprecated_short_name: config.deprecated_short_name.clone(),
            description: config.description.as_ref().map(bind_expression).unwrap_or_default(),
            section,
            arg_vartype,
            cpp_vartype: config.cpp_vartype.clone(),
            cpp_varname: config.cpp_varname.clone(),
            source,
            default: config.default.as_ref().map(bind_expression),
            implicit: config.implicit.as_ref().map(bind_expression),
            conflicts: config.conflicts.clone(),
            requires: config.requires.clone(),
            hidden: config.hidden,
            redact: config.redact,
            positional,
            duplicate_behavior,
            validator,
            condition: config.condition.as_ref().map(bind_condition),
        }
    )
}
