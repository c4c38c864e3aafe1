//
// parser.rs
// The IDL Compiler
//

//! The structural pass: maps the marked YAML DOM onto the syntax
//! tree. Every declaration kind is parsed by walking its mapping
//! with `parse_mapping_node()`, which centralizes the unknown-key,
//! duplicate-key, and node-shape diagnostics; the per-kind handlers
//! only dispatch on key names and extract values.
//!
//! This module also owns import resolution: `parse()` loads the
//! root document, then breadth-first resolves and parses every
//! import exactly once and merges the imported symbol tables into
//! the root's.

use std::fs::File;
use std::io::Read;
use std::path::{ Path, PathBuf };
use regex::Regex;
use yaml::{ self, MarkedNode, NodeValue };
use syntax::*;
use error::*;
use util::Location;


lazy_static! {
    static ref ARRAY_TYPE: Regex = Regex::new(r"^array<([\w.]+)>$")
        .expect("invalid array type regex");
}

//
// Generic mapping machinery
//

// Walks a mapping node, diagnosing non-mapping nodes, non-scalar
// keys, and duplicate keys. `handle` returns false for keys it does
// not recognize, which produces the unknown-key diagnostic.
fn parse_mapping_node<F>(
    errors: &mut ErrorCollection,
    node: &MarkedNode,
    kind: &str,
    mut handle: F,
) -> bool
    where F: FnMut(&mut ErrorCollection, &str, &Location, &MarkedNode) -> bool
{
    let entries = match node.mapping() {
        Some(entries) => entries,
        None => {
            errors.add_node_type(&node.location, kind, "mapping", node.type_name());
            return false;
        },
    };

    let mut seen: Vec<&str> = Vec::with_capacity(entries.len());

    for &(ref key_node, ref value) in entries {
        let key = match key_node.scalar() {
            Some(key) => key,
            None => {
                errors.add_node_type(&key_node.location, kind, "scalar", key_node.type_name());
                continue;
            },
        };

        if seen.contains(&key) {
            errors.add_duplicate_node(&key_node.location, key);
            continue;
        }

        seen.push(key);

        if !handle(errors, key, &key_node.location, value) {
            errors.add_unknown_node(&key_node.location, kind, key);
        }
    }

    true
}

// Walks a name -> declaration section mapping.
fn parse_section<F>(errors: &mut ErrorCollection, node: &MarkedNode, kind: &str, mut each: F)
    where F: FnMut(&mut ErrorCollection, &str, &Location, &MarkedNode)
{
    parse_mapping_node(errors, node, kind, |errors, name, location, value| {
        each(errors, name, location, value);
        true
    });
}

//
// Scalar extraction
//

fn expect_scalar(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<String> {
    match node.scalar() {
        Some(value) => Some(value.to_owned()),
        None => {
            errors.add_node_type(&node.location, name, "scalar", node.type_name());
            None
        },
    }
}

// Strict booleans: only the spellings `true` and `false` count.
fn expect_bool(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<bool> {
    match expect_scalar(errors, name, node)?.as_str() {
        "true"  => Some(true),
        "false" => Some(false),
        other => {
            errors.add_bad_bool(&node.location, name, other);
            None
        },
    }
}

fn expect_int(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<i64> {
    let value = expect_scalar(errors, name, node)?;

    match value.parse() {
        Ok(int) => Some(int),
        Err(_) => {
            errors.add_bad_int(&node.location, name, &value);
            None
        },
    }
}

fn expect_non_negative_int(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<i64> {
    let int = expect_int(errors, name, node)?;

    if int < 0 {
        errors.add_bad_non_negative_int(&node.location, name, &int.to_string());
        None
    } else {
        Some(int)
    }
}

// Accepts either one scalar or a sequence of scalars; a lone scalar
// is promoted to a one-element list.
fn expect_scalar_or_sequence(
    errors: &mut ErrorCollection,
    name: &str,
    node: &MarkedNode,
) -> Option<Vec<String>> {
    match node.value {
        NodeValue::Scalar(ref value) => Some(vec![value.clone()]),
        NodeValue::Sequence(ref items) => {
            let mut values = Vec::with_capacity(items.len());

            for item in items {
                if let Some(value) = expect_scalar(errors, name, item) {
                    values.push(value)
                }
            }

            Some(values)
        },
        NodeValue::Mapping(_) => {
            errors.add_node_type(&node.location, name, "scalar or sequence", node.type_name());
            None
        },
    }
}

//
// Field types
//

fn parse_scalar_field_type(
    errors: &mut ErrorCollection,
    location: &Location,
    text: &str,
) -> Option<FieldType> {
    let single = |type_name: &str| FieldTypeSingle {
        location: location.clone(),
        type_name: type_name.to_owned(),
    };

    if let Some(captures) = ARRAY_TYPE.captures(text) {
        let inner = captures.get(1).map_or("", |m| m.as_str());
        return Some(FieldType::Array(single(inner)));
    }

    if text.starts_with("array<") {
        errors.add(
            location,
            ERROR_ID_BAD_ARRAY_TYPE_NAME,
            format!("'{}' is not a valid array element type name", text),
        );
        return None;
    }

    Some(FieldType::Single(single(text)))
}

// A field type is a scalar (`Foo` or `array<Foo>`) or the mapping
// `{ variant: [alternative, ...] }`. Variants never nest.
fn parse_field_type(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<FieldType> {
    if let Some(text) = node.scalar() {
        let text = text.to_owned();
        return parse_scalar_field_type(errors, &node.location, &text);
    }

    let entries = match node.mapping() {
        Some(entries) => entries,
        None => {
            errors.add_node_type(&node.location, "type", "scalar or mapping", node.type_name());
            return None;
        },
    };

    if entries.len() != 1 || entries[0].0.scalar() != Some("variant") {
        errors.add_node_type(&node.location, "type", "'variant' mapping", node.type_name());
        return None;
    }

    let (ref key, ref value) = entries[0];

    let items = match value.sequence() {
        Some(items) => items,
        None => {
            errors.add_node_type(&value.location, "variant", "sequence", value.type_name());
            return None;
        },
    };

    let mut alternatives = Vec::with_capacity(items.len());

    for item in items {
        match parse_field_type(errors, item)? {
            FieldType::Variant(_) => {
                errors.add(
                    &item.location,
                    ERROR_ID_NO_NESTED_VARIANT,
                    "variant types may not contain other variant types",
                );
                return None;
            },
            alternative => alternatives.push(alternative),
        }
    }

    Some(
        FieldType::Variant(
            FieldTypeVariant {
                location: key.location.clone(),
                alternatives,
            }
        )
    )
}

//
// Shared sub-blocks
//

fn parse_validator(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<Validator> {
    let mut validator = Validator::new(node.location.clone());

    parse_mapping_node(errors, node, "validator", |errors, key, _, value| {
        match key {
            "gt"       => validator.gt = expect_scalar(errors, key, value),
            "gte"      => validator.gte = expect_scalar(errors, key, value),
            "lt"       => validator.lt = expect_scalar(errors, key, value),
            "lte"      => validator.lte = expect_scalar(errors, key, value),
            "callback" => validator.callback = expect_scalar(errors, key, value),
            _ => return false,
        }
        true
    });

    Some(validator)
}

// A default or implicit value: a plain scalar is a literal; the
// mapping form spells a C++ expression.
fn parse_expression(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<Expression> {
    if let Some(literal) = node.scalar() {
        return Some(
            Expression {
                location: node.location.clone(),
                literal: Some(literal.to_owned()),
                expr: None,
                is_constexpr: false,
            }
        );
    }

    let mut expression = Expression {
        location: node.location.clone(),
        ..Default::default()
    };

    parse_mapping_node(errors, node, name, |errors, key, _, value| {
        match key {
            "expr"         => expression.expr = expect_scalar(errors, key, value),
            "is_constexpr" => {
                expression.is_constexpr = expect_bool(errors, key, value).unwrap_or(false)
            },
            _ => return false,
        }
        true
    });

    if expression.expr.is_none() {
        errors.add_missing_required_field(&node.location, name, "expr");
        return None;
    }

    Some(expression)
}

fn parse_condition(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<Condition> {
    let mut condition = Condition {
        location: node.location.clone(),
        ..Default::default()
    };

    parse_mapping_node(errors, node, "condition", |errors, key, _, value| {
        match key {
            "preprocessor" => condition.preprocessor = expect_scalar(errors, key, value),
            "constexpr"    => condition.constexpr_expr = expect_scalar(errors, key, value),
            "expr"         => condition.expr = expect_scalar(errors, key, value),
            _ => return false,
        }
        true
    });

    Some(condition)
}

//
// Document-level blocks
//

fn parse_config_global(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<ConfigGlobal> {
    let mut configs = ConfigGlobal::new(node.location.clone());

    parse_mapping_node(errors, node, "global configs", |errors, key, _, value| {
        match key {
            "section" => configs.section = expect_scalar(errors, key, value),
            "source" => {
                configs.source = expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "initializer_name" => configs.initializer_name = expect_scalar(errors, key, value),
            _ => return false,
        }
        true
    });

    Some(configs)
}

fn parse_global(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<Global> {
    let mut global = Global::new(node.location.clone());

    parse_mapping_node(errors, node, "global", |errors, key, _, value| {
        match key {
            "cpp_namespace" => global.cpp_namespace = expect_scalar(errors, key, value),
            "cpp_includes" => {
                global.cpp_includes =
                    expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "configs" => global.configs = parse_config_global(errors, value),
            _ => return false,
        }
        true
    });

    Some(global)
}

fn parse_imports(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<Import> {
    let mut import = Import::new(node.location.clone());
    import.imports = expect_scalar_or_sequence(errors, "imports", node)?;
    Some(import)
}

//
// Types
//

fn parse_type(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<Type> {
    let mut ty = Type::new(node.location.clone(), name.to_owned());

    parse_mapping_node(errors, node, "type", |errors, key, _, value| {
        match key {
            "description" => ty.description = expect_scalar(errors, key, value),
            "cpp_type"    => ty.cpp_type = expect_scalar(errors, key, value),
            "bson_serialization_type" => {
                ty.bson_serialization_type =
                    expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "bindata_subtype" => ty.bindata_subtype = expect_scalar(errors, key, value),
            "serializer"      => ty.serializer = expect_scalar(errors, key, value),
            "deserializer"    => ty.deserializer = expect_scalar(errors, key, value),
            "default"         => ty.default = expect_scalar(errors, key, value),
            "deserialize_with_tenant" => {
                ty.deserialize_with_tenant = expect_bool(errors, key, value).unwrap_or(false)
            },
            "internal_only" => {
                ty.internal_only = expect_bool(errors, key, value).unwrap_or(false)
            },
            "is_view" => ty.is_view = expect_bool(errors, key, value).unwrap_or(false),
            _ => return false,
        }
        true
    });

    if ty.description.is_none() {
        errors.add_missing_required_field(&ty.location, "type", "description");
    }
    if ty.cpp_type.is_none() {
        errors.add_missing_required_field(&ty.location, "type", "cpp_type");
    }
    if ty.bson_serialization_type.is_empty() {
        errors.add_missing_required_field(&ty.location, "type", "bson_serialization_type");
    }

    Some(ty)
}

//
// Fields
//

fn parse_field(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<Field> {
    let mut field = Field::new(node.location.clone(), name.to_owned());

    // shorthand: `fieldName: typeName`
    if let Some(text) = node.scalar() {
        let text = text.to_owned();
        field.type_ = parse_scalar_field_type(errors, &node.location, &text);
        return Some(field);
    }

    parse_mapping_node(errors, node, "field", |errors, key, _, value| {
        match key {
            "description" => field.description = expect_scalar(errors, key, value),
            "cpp_name"    => field.cpp_name = expect_scalar(errors, key, value),
            "type"        => field.type_ = parse_field_type(errors, value),
            "ignore"      => field.ignore = expect_bool(errors, key, value).unwrap_or(false),
            "optional"    => field.optional = expect_bool(errors, key, value).unwrap_or(false),
            "default"     => field.default = expect_scalar(errors, key, value),
            "always_serialize" => {
                field.always_serialize = expect_bool(errors, key, value).unwrap_or(false)
            },
            "supports_doc_sequence" => {
                field.supports_doc_sequence = expect_bool(errors, key, value).unwrap_or(false)
            },
            "comparison_order" => {
                field.comparison_order = expect_non_negative_int(errors, key, value)
            },
            "validator"   => field.validator = parse_validator(errors, value),
            "stability"   => field.stability = expect_scalar(errors, key, value),
            "unstable"    => field.unstable = expect_bool(errors, key, value),
            "query_shape" => field.query_shape = expect_scalar(errors, key, value),
            _ => return false,
        }
        true
    });

    if field.type_.is_none() && !field.ignore {
        errors.add_missing_required_field(&field.location, "field", "type");
        return None;
    }

    Some(field)
}

fn parse_fields(errors: &mut ErrorCollection, node: &MarkedNode, fields: &mut Vec<Field>) {
    parse_section(errors, node, "fields", |errors, name, _, value| {
        if let Some(field) = parse_field(errors, name, value) {
            fields.push(field)
        }
    });
}

//
// Structs and commands
//

fn parse_chained_items(errors: &mut ErrorCollection, node: &MarkedNode, items: &mut Vec<ChainedItem>) {
    parse_section(errors, node, "chained items", |errors, name, location, value| {
        let mut item = ChainedItem {
            location: location.clone(),
            name: name.to_owned(),
            cpp_name: None,
        };

        // shorthand: `ChainedName: cppName`
        if let Some(cpp_name) = value.scalar() {
            item.cpp_name = Some(cpp_name.to_owned());
            items.push(item);
            return;
        }

        parse_mapping_node(errors, value, "chained item", |errors, key, _, value| {
            match key {
                "cpp_name" => item.cpp_name = expect_scalar(errors, key, value),
                _ => return false,
            }
            true
        });

        items.push(item)
    });
}

// Handles the keys common to `structs:` and `commands:`; returns
// false for anything it does not recognize so the caller can try
// its own keys.
fn parse_struct_key(
    errors: &mut ErrorCollection,
    strct: &mut Struct,
    key: &str,
    value: &MarkedNode,
) -> bool {
    match key {
        "description" => strct.description = expect_scalar(errors, key, value),
        "cpp_name"    => strct.cpp_name = expect_scalar(errors, key, value),
        "strict"      => strct.strict = expect_bool(errors, key, value).unwrap_or(true),
        "immutable"   => strct.immutable = expect_bool(errors, key, value).unwrap_or(false),
        "inline_chained_structs" => {
            strct.inline_chained_structs = expect_bool(errors, key, value).unwrap_or(false)
        },
        "generate_comparison_operators" => {
            strct.generate_comparison_operators = expect_bool(errors, key, value).unwrap_or(false)
        },
        "is_command_reply" => {
            strct.is_command_reply = expect_bool(errors, key, value).unwrap_or(false)
        },
        "query_shape_component" => {
            strct.query_shape_component = expect_bool(errors, key, value).unwrap_or(false)
        },
        "chained_types"   => parse_chained_items(errors, value, &mut strct.chained_types),
        "chained_structs" => parse_chained_items(errors, value, &mut strct.chained_structs),
        "fields"          => parse_fields(errors, value, &mut strct.fields),
        _ => return false,
    }
    true
}

fn parse_struct(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<Struct> {
    let mut strct = Struct::new(node.location.clone(), name.to_owned());

    parse_mapping_node(errors, node, "struct", |errors, key, _, value| {
        parse_struct_key(errors, &mut strct, key, value)
    });

    if strct.description.is_none() {
        errors.add_missing_required_field(&strct.location, "struct", "description");
    }

    Some(strct)
}

fn parse_access_check(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<AccessCheck> {
    let mut check = AccessCheck {
        location: node.location.clone(),
        ..Default::default()
    };

    parse_mapping_node(errors, node, "access check", |errors, key, _, value| {
        match key {
            "check" => check.check = expect_scalar(errors, key, value),
            "privilege" => {
                let mut privilege = Privilege {
                    location: value.location.clone(),
                    ..Default::default()
                };

                parse_mapping_node(errors, value, "privilege", |errors, key, _, value| {
                    match key {
                        "resource_pattern" => {
                            privilege.resource_pattern = expect_scalar(errors, key, value)
                        },
                        "action_type" => {
                            privilege.action_type =
                                expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
                        },
                        _ => return false,
                    }
                    true
                });

                check.privilege = Some(privilege)
            },
            _ => return false,
        }
        true
    });

    Some(check)
}

fn parse_access_checks(errors: &mut ErrorCollection, node: &MarkedNode) -> Option<AccessChecks> {
    let mut checks = AccessChecks {
        location: node.location.clone(),
        ..Default::default()
    };

    parse_mapping_node(errors, node, "access_check", |errors, key, _, value| {
        match key {
            "ignore" => checks.ignore = expect_bool(errors, key, value).unwrap_or(false),
            "none"   => checks.none = expect_bool(errors, key, value).unwrap_or(false),
            "simple" => checks.simple = parse_access_check(errors, value),
            "complex" => {
                if let Some(items) = value.sequence() {
                    for item in items {
                        if let Some(check) = parse_access_check(errors, item) {
                            checks.complex.push(check)
                        }
                    }
                } else {
                    errors.add_node_type(&value.location, key, "sequence", value.type_name());
                }
            },
            _ => return false,
        }
        true
    });

    Some(checks)
}

fn parse_command(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<Command> {
    let mut command = Command::new(node.location.clone(), name.to_owned());

    parse_mapping_node(errors, node, "command", |errors, key, _, value| {
        if parse_struct_key(errors, &mut command.base, key, value) {
            return true;
        }

        match key {
            "namespace"     => command.namespace = expect_scalar(errors, key, value),
            "type"          => command.type_ = parse_field_type(errors, value),
            "command_name"  => command.command_name = expect_scalar(errors, key, value),
            "command_alias" => command.command_alias = expect_scalar(errors, key, value),
            "api_version"   => command.api_version = expect_scalar(errors, key, value),
            "is_deprecated" => {
                command.is_deprecated = expect_bool(errors, key, value).unwrap_or(false)
            },
            "reply_type"   => command.reply_type = expect_scalar(errors, key, value),
            "access_check" => command.access_check = parse_access_checks(errors, value),
            _ => return false,
        }
        true
    });

    if command.base.description.is_none() {
        errors.add_missing_required_field(&command.base.location, "command", "description");
    }
    if command.namespace.is_none() {
        errors.add_missing_required_field(&command.base.location, "command", "namespace");
    }

    Some(command)
}

//
// Enums
//

fn parse_enum_value(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<EnumValue> {
    let mut value = EnumValue::new(node.location.clone(), name.to_owned());

    // shorthand: `Name: wireValue`
    if let Some(text) = node.scalar() {
        value.value = Some(text.to_owned());
        return Some(value);
    }

    if node.mapping().is_none() {
        errors.add(
            &node.location,
            ERROR_ID_BAD_ENUM_VALUE_NODE,
            format!("enum value '{}' must be a scalar or a mapping", name),
        );
        return None;
    }

    parse_mapping_node(errors, node, "enum value", |errors, key, _, child| {
        match key {
            "description" => value.description = expect_scalar(errors, key, child),
            "value"       => value.value = expect_scalar(errors, key, child),
            "extra_data"  => value.extra_data = Some(child.clone()),
            _ => return false,
        }
        true
    });

    if value.value.is_none() {
        errors.add_missing_required_field(&value.location, "enum value", "value");
        return None;
    }

    Some(value)
}

fn parse_enum(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<Enum> {
    let mut enum_ = Enum::new(node.location.clone(), name.to_owned());

    parse_mapping_node(errors, node, "enum", |errors, key, _, value| {
        match key {
            "description" => enum_.description = expect_scalar(errors, key, value),
            "cpp_name"    => enum_.cpp_name = expect_scalar(errors, key, value),
            "type"        => enum_.type_name = expect_scalar(errors, key, value),
            "values" => {
                parse_section(errors, value, "enum values", |errors, name, _, value| {
                    if let Some(ev) = parse_enum_value(errors, name, value) {
                        enum_.values.push(ev)
                    }
                });
            },
            _ => return false,
        }
        true
    });

    if enum_.description.is_none() {
        errors.add_missing_required_field(&enum_.location, "enum", "description");
    }
    if enum_.type_name.is_none() {
        errors.add_missing_required_field(&enum_.location, "enum", "type");
    }
    if enum_.values.is_empty() {
        errors.add_missing_required_field(&enum_.location, "enum", "values");
    }

    Some(enum_)
}

//
// Generic argument and reply field lists
//

fn parse_generic_field_list(
    errors: &mut ErrorCollection,
    name: &str,
    node: &MarkedNode,
    is_reply: bool,
) -> Option<GenericFieldList> {
    let mut list = GenericFieldList::new(node.location.clone(), name.to_owned(), is_reply);
    let kind = if is_reply { "generic reply field list" } else { "generic argument list" };

    parse_mapping_node(errors, node, kind, |errors, key, _, value| {
        match key {
            "description" => list.description = expect_scalar(errors, key, value),
            "fields"      => parse_fields(errors, value, &mut list.fields),
            _ => return false,
        }
        true
    });

    Some(list)
}

//
// Server parameters, feature flags, config options
//

fn parse_server_parameter(
    errors: &mut ErrorCollection,
    name: &str,
    node: &MarkedNode,
) -> Option<ServerParameter> {
    let mut param = ServerParameter::new(node.location.clone(), name.to_owned());

    parse_mapping_node(errors, node, "server parameter", |errors, key, _, value| {
        match key {
            "description" => param.description = expect_scalar(errors, key, value),
            "set_at" => {
                param.set_at = expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "cpp_class"   => param.cpp_class = expect_scalar(errors, key, value),
            "cpp_vartype" => param.cpp_vartype = expect_scalar(errors, key, value),
            "cpp_varname" => param.cpp_varname = expect_scalar(errors, key, value),
            "default"     => param.default = parse_expression(errors, key, value),
            "validator"   => param.validator = parse_validator(errors, value),
            "on_update"   => param.on_update = expect_scalar(errors, key, value),
            "redact"      => param.redact = expect_bool(errors, key, value).unwrap_or(false),
            "test_only"   => param.test_only = expect_bool(errors, key, value).unwrap_or(false),
            "deprecated_name" => {
                param.deprecated_name =
                    expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "condition" => param.condition = parse_condition(errors, value),
            _ => return false,
        }
        true
    });

    if param.description.is_none() {
        errors.add_missing_required_field(&param.location, "server parameter", "description");
    }
    if param.set_at.is_empty() {
        errors.add_missing_required_field(&param.location, "server parameter", "set_at");
    }

    Some(param)
}

fn parse_feature_flag(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<FeatureFlag> {
    let mut flag = FeatureFlag::new(node.location.clone(), name.to_owned());

    parse_mapping_node(errors, node, "feature flag", |errors, key, _, value| {
        match key {
            "description" => flag.description = expect_scalar(errors, key, value),
            "cpp_varname" => flag.cpp_varname = expect_scalar(errors, key, value),
            "default"     => flag.default = expect_scalar(errors, key, value),
            "version"     => flag.version = expect_scalar(errors, key, value),
            "incremental_rollout_phase" => {
                flag.incremental_rollout_phase = expect_scalar(errors, key, value)
            },
            "fcv_gated" => flag.fcv_gated = expect_bool(errors, key, value),
            _ => return false,
        }
        true
    });

    if flag.description.is_none() {
        errors.add_missing_required_field(&flag.location, "feature flag", "description");
    }
    if flag.fcv_gated.is_none() {
        errors.add_missing_required_field(&flag.location, "feature flag", "fcv_gated");
    }

    Some(flag)
}

fn parse_config_option(errors: &mut ErrorCollection, name: &str, node: &MarkedNode) -> Option<ConfigOption> {
    let mut config = ConfigOption::new(node.location.clone(), name.to_owned());

    // shorthand for plain switches: `name: description`
    if let Some(text) = node.scalar() {
        config.description = Some(
            Expression {
                location: node.location.clone(),
                literal: Some(text.to_owned()),
                expr: None,
                is_constexpr: false,
            }
        );
        config.arg_vartype = Some("Switch".to_owned());
        return Some(config);
    }

    parse_mapping_node(errors, node, "config option", |errors, key, _, value| {
        match key {
            "short_name"  => config.short_name = expect_scalar(errors, key, value),
            "single_name" => config.single_name = expect_scalar(errors, key, value),
            "deprecated_name" => {
                config.deprecated_name =
                    expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "deprecated_short_name" => {
                config.deprecated_short_name =
                    expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "description" => config.description = parse_expression(errors, key, value),
            "section"     => config.section = expect_scalar(errors, key, value),
            "arg_vartype" => config.arg_vartype = expect_scalar(errors, key, value),
            "cpp_vartype" => config.cpp_vartype = expect_scalar(errors, key, value),
            "cpp_varname" => config.cpp_varname = expect_scalar(errors, key, value),
            "source" => {
                config.source = expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "default"  => config.default = parse_expression(errors, key, value),
            "implicit" => config.implicit = parse_expression(errors, key, value),
            "conflicts" => {
                config.conflicts = expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "requires" => {
                config.requires = expect_scalar_or_sequence(errors, key, value).unwrap_or_default()
            },
            "hidden"     => config.hidden = expect_bool(errors, key, value).unwrap_or(false),
            "redact"     => config.redact = expect_bool(errors, key, value).unwrap_or(false),
            "positional" => config.positional = expect_scalar(errors, key, value),
            "duplicate_behavior" => {
                config.duplicate_behavior = expect_scalar(errors, key, value)
            },
            "validator" => config.validator = parse_validator(errors, value),
            "condition" => config.condition = parse_condition(errors, value),
            _ => return false,
        }
        true
    });

    if config.description.is_none() {
        errors.add_missing_required_field(&config.location, "config option", "description");
    }
    if config.arg_vartype.is_none() {
        errors.add_missing_required_field(&config.location, "config option", "arg_vartype");
    }

    Some(config)
}

//
// Whole documents
//

/// Parses a single document into a syntax tree without resolving
/// its imports. Returns `None` only on structurally fatal input
/// (malformed YAML or a non-mapping root); everything else degrades
/// into diagnostics plus a partial tree.
pub fn parse_document(file_name: &str, source: &str, errors: &mut ErrorCollection) -> Option<Spec> {
    let root = match yaml::load(file_name, source) {
        Ok(Some(root)) => root,
        Ok(None) => return Some(Spec::default()),
        Err(error) => {
            let location = error.location.clone();
            errors.add(&location, error.id, error.msg);
            return None;
        },
    };

    let mut spec = Spec::default();

    let ok = parse_mapping_node(errors, &root, "document", |errors, key, key_location, value| {
        match key {
            "global"  => spec.globals = parse_global(errors, value),
            "imports" => spec.imports = parse_imports(errors, value),
            "types" => {
                parse_section(errors, value, "types", |errors, name, _, node| {
                    if let Some(ty) = parse_type(errors, name, node) {
                        spec.symbols.add_type(errors, ty)
                    }
                });
            },
            "structs" => {
                parse_section(errors, value, "structs", |errors, name, _, node| {
                    if let Some(strct) = parse_struct(errors, name, node) {
                        spec.symbols.add_struct(errors, strct)
                    }
                });
            },
            "commands" => {
                parse_section(errors, value, "commands", |errors, name, _, node| {
                    if let Some(command) = parse_command(errors, name, node) {
                        spec.symbols.add_command(errors, command)
                    }
                });
            },
            "enums" => {
                parse_section(errors, value, "enums", |errors, name, _, node| {
                    if let Some(enum_) = parse_enum(errors, name, node) {
                        spec.symbols.add_enum(errors, enum_)
                    }
                });
            },
            "generic_argument_lists" => {
                parse_section(errors, value, "generic argument lists", |errors, name, _, node| {
                    if let Some(list) = parse_generic_field_list(errors, name, node, false) {
                        spec.symbols.add_generic_field_list(errors, list)
                    }
                });
            },
            "generic_reply_field_lists" => {
                parse_section(errors, value, "generic reply field lists", |errors, name, _, node| {
                    if let Some(list) = parse_generic_field_list(errors, name, node, true) {
                        spec.symbols.add_generic_field_list(errors, list)
                    }
                });
            },
            "server_parameters" => {
                parse_section(errors, value, "server parameters", |errors, name, _, node| {
                    if let Some(param) = parse_server_parameter(errors, name, node) {
                        spec.server_parameters.push(param)
                    }
                });
            },
            "feature_flags" => {
                parse_section(errors, value, "feature flags", |errors, name, _, node| {
                    if let Some(flag) = parse_feature_flag(errors, name, node) {
                        spec.feature_flags.push(flag)
                    }
                });
            },
            "configs" => {
                parse_section(errors, value, "configs", |errors, name, _, node| {
                    if let Some(config) = parse_config_option(errors, name, node) {
                        spec.configs.push(config)
                    }
                });
            },
            _ => errors.add_unknown_root_node(key_location, key),
        }
        true
    });

    if ok { Some(spec) } else { None }
}

//
// Import resolution
//

/// Maps import names, as written in documents, to canonical file
/// names plus document text. Tests substitute an in-memory
/// implementation.
pub trait ImportResolver {
    /// Resolves one import name, or `None` if it cannot be found.
    fn resolve(&self, name: &str) -> Option<(String, String)>;
}

/// Resolves imports against a list of search directories, first
/// match wins. An absolute import name bypasses the search path.
#[derive(Debug, Clone, Default)]
pub struct FileImportResolver {
    directories: Vec<PathBuf>,
}

impl FileImportResolver {
    /// A resolver searching `directories` in order.
    pub fn new<I, P>(directories: I) -> Self
        where I: IntoIterator<Item = P>, P: Into<PathBuf>
    {
        FileImportResolver {
            directories: directories.into_iter().map(Into::into).collect(),
        }
    }
}

impl ImportResolver for FileImportResolver {
    fn resolve(&self, name: &str) -> Option<(String, String)> {
        if Path::new(name).is_absolute() {
            return read_candidate(Path::new(name));
        }

        for directory in &self.directories {
            let candidate = directory.join(name);

            if let Some(resolved) = read_candidate(&candidate) {
                return Some(resolved);
            }
        }

        None
    }
}

fn read_candidate(candidate: &Path) -> Option<(String, String)> {
    let mut file = match File::open(candidate) {
        Ok(file) => file,
        Err(_) => return None,
    };

    let mut source = String::new();

    if file.read_to_string(&mut source).is_ok() {
        Some((candidate.to_string_lossy().into_owned(), source))
    } else {
        None
    }
}

// One parsed import in the breadth-first traversal.
struct ImportedDocument {
    path: String,
    // true iff the document itself declares structs, commands or enums
    includable: bool,
    // import names it spells, for the transitive includability walk
    import_names: Vec<String>,
}

// True iff `path` transitively declares any includable symbol.
fn transitively_includable(
    path: &str,
    documents: &[ImportedDocument],
    resolved: &[(String, String)],
    visiting: &mut Vec<String>,
) -> bool {
    if visiting.iter().any(|p| p == path) {
        return false; // import cycle; its symbols are counted elsewhere
    }

    let document = match documents.iter().find(|d| d.path == path) {
        Some(document) => document,
        None => return false,
    };

    if document.includable {
        return true;
    }

    visiting.push(path.to_owned());

    let result = document.import_names.iter().any(|name| {
        resolved
            .iter()
            .find(|&&(ref n, _)| n == name)
            .map_or(false, |&(_, ref p)| {
                transitively_includable(p, documents, resolved, visiting)
            })
    });

    visiting.pop();
    result
}

/// Parses a root document and everything it transitively imports.
///
/// Each imported file is resolved and parsed exactly once, no
/// matter how many import paths lead to it; import cycles are
/// therefore harmless. All imported symbols are merged into the
/// root's symbol table, and the root's `imports` block is annotated
/// with the resolved direct imports (those that transitively
/// declare generatable symbols) and the full dependency list.
pub fn parse<R: ImportResolver>(file_name: &str, source: &str, resolver: &R) -> ParsedSpec {
    let mut errors = ErrorCollection::new();

    let mut root = match parse_document(file_name, source, &mut errors) {
        Some(spec) => spec,
        None => return Err(errors),
    };

    // (import name, location of the importing block, direct import?)
    let mut queue: Vec<(String, Location, bool)> = vec![];

    if let Some(ref imports) = root.imports {
        for name in &imports.imports {
            queue.push((name.clone(), imports.location.clone(), true))
        }
    }

    let mut visited: Vec<String> = vec![file_name.to_owned()];
    let mut resolved_names: Vec<(String, String)> = vec![]; // import name -> path
    let mut documents: Vec<ImportedDocument> = vec![];
    let mut direct_paths: Vec<String> = vec![];
    let mut dependencies: Vec<String> = vec![];

    let mut index = 0;

    while index < queue.len() {
        let (name, location, is_direct) = queue[index].clone();
        index += 1;

        let already_resolved = resolved_names
            .iter()
            .find(|&&(ref n, _)| *n == name)
            .map(|&(_, ref path)| path.clone());

        let (path, text) = match already_resolved {
            Some(path) => (path, None),
            None => match resolver.resolve(&name) {
                Some((path, text)) => {
                    resolved_names.push((name.clone(), path.clone()));
                    (path, Some(text))
                },
                None => {
                    errors.add_import_not_found(&location, &name);
                    continue;
                },
            },
        };

        if is_direct && !direct_paths.contains(&path) {
            direct_paths.push(path.clone())
        }

        if visited.contains(&path) {
            continue;
        }

        visited.push(path.clone());
        dependencies.push(path.clone());

        let text = match text {
            Some(text) => text,
            None => continue, // resolved earlier, parsed earlier
        };

        let spec = match parse_document(&path, &text, &mut errors) {
            Some(spec) => spec,
            None => continue,
        };

        let mut import_names = vec![];

        if let Some(ref imports) = spec.imports {
            for child in &imports.imports {
                import_names.push(child.clone());
                queue.push((child.clone(), imports.location.clone(), false))
            }
        }

        documents.push(
            ImportedDocument {
                path: path.clone(),
                includable: spec.symbols.has_includable_symbols(),
                import_names,
            }
        );

        root.symbols.merge_imported(&mut errors, spec.symbols);
    }

    if let Some(ref mut imports) = root.imports {
        imports.resolved_file_names = direct_paths
            .iter()
            .filter(|path| {
                transitively_includable(path, &documents, &resolved_names, &mut vec![])
            })
            .cloned()
            .collect();

        imports.dependencies = dependencies;
    }

    if errors.has_errors() {
        Err(errors)
    } else {
        Ok(root)
    }
}

//
// Tests
//

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> (Option<Spec>, ErrorCollection) {
        let mut errors = ErrorCollection::new();
        let spec = parse_document("test.idl", source, &mut errors);
        (spec, errors)
    }

    #[test]
    fn array_type_grammar() {
        let mut errors = ErrorCollection::new();
        let loc = Location::new("test.idl", 1, 1);

        let ty = parse_scalar_field_type(&mut errors, &loc, "array<string>").unwrap();
        assert_eq!(ty.debug_name(), "array<string>");

        assert!(parse_scalar_field_type(&mut errors, &loc, "array<invalid name>").is_none());
        assert!(errors.contains(ERROR_ID_BAD_ARRAY_TYPE_NAME));
    }

    #[test]
    fn unknown_root_node_is_diagnosed() {
        let (spec, errors) = parse_source("bogus:\n    x: y\n");
        assert!(spec.is_some());
        assert!(errors.contains(ERROR_ID_UNKNOWN_ROOT));
    }

    #[test]
    fn duplicate_keys_are_diagnosed() {
        let source = "\
structs:
    foo:
        description: one
        description: two
        fields:
            a: string
";
        let (_, errors) = parse_source(source);
        assert!(errors.contains(ERROR_ID_DUPLICATE_NODE));
    }

    #[test]
    fn shorthand_field_is_a_single_type() {
        let source = "\
structs:
    foo:
        description: a struct
        fields:
            bar: string
";
        let (spec, errors) = parse_source(source);
        assert!(!errors.has_errors(), "{:?}", errors);

        let spec = spec.unwrap();
        let strct = spec.symbols.get_struct("foo").unwrap();
        assert_eq!(strct.fields.len(), 1);
        assert_eq!(strct.fields[0].type_.as_ref().unwrap().debug_name(), "string");
        assert!(strct.strict);
    }

    #[test]
    fn bools_are_strict() {
        let source = "\
structs:
    foo:
        description: a struct
        strict: yes
        fields:
            a: string
";
        let (_, errors) = parse_source(source);
        assert!(errors.contains(ERROR_ID_IS_NODE_VALID_BOOL));
    }
}
