//
// tests/binder.rs
// The IDL Compiler
//

#![deny(missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]

extern crate idl;

mod common;

use common::{ bind_valid, bind_errors };
use idl::ast;
use idl::error::*;


#[test]
fn struct_fields_bind_with_defaults() {
    let bound = bind_valid("\
structs:
    holder:
        description: holds values
        fields:
            count:
                type: int
                default: 42
            label:
                type: string
                optional: true
");
    assert_eq!(bound.structs.len(), 1);

    let strct = &bound.structs[0];
    assert_eq!(strct.cpp_name, "Holder");
    assert_eq!(strct.fields.len(), 3);

    let count = &strct.fields[0];
    assert_eq!(count.default.as_ref().map(String::as_str), Some("42"));
    assert_eq!(count.type_.as_ref().unwrap().cpp_type, "std::int32_t");
    assert!(count.is_required());

    let label = &strct.fields[1];
    assert!(label.optional);
    assert!(!label.is_required());

    // every struct ends with the hidden serialization context
    let context = &strct.fields[2];
    assert_eq!(context.cpp_name, "serializationContext");
    assert!(context.hidden);
    assert!(context.optional);
    assert!(!context.is_required());
}

#[test]
fn commands_carry_an_implicit_db_field() {
    let bound = bind_valid("\
commands:
    ping:
        description: a ping
        command_name: ping
        namespace: ignored
        fields:
            comment:
                type: string
                optional: true
");
    let command = &bound.commands[0];

    let db = command
        .base
        .fields
        .iter()
        .find(|f| f.name == "$db")
        .expect("$db field is missing");

    assert_eq!(db.cpp_name, "dbName");
    assert!(!db.constructed);
    assert!(db.is_required());
}

#[test]
fn concatenating_commands_construct_their_db_field() {
    let bound = bind_valid("\
commands:
    insertThing:
        description: inserts a thing
        command_name: insertThing
        namespace: concatenate_with_db
        fields:
            ordered:
                type: bool
                optional: true
");
    let command = &bound.commands[0];

    let db = command
        .base
        .fields
        .iter()
        .find(|f| f.name == "$db")
        .expect("$db field is missing");

    assert!(db.constructed);
}

#[test]
fn generic_argument_lists_chain_onto_commands() {
    let bound = bind_valid("\
generic_argument_lists:
    generic_args:
        description: arguments every command accepts
        fields:
            comment:
                type: string
                optional: true
commands:
    ping:
        description: a ping
        command_name: ping
        namespace: ignored
        fields:
            beep: string
");
    let command = &bound.commands[0];

    let placeholder = command
        .base
        .fields
        .iter()
        .find(|f| f.name == "generic_args")
        .expect("generic list placeholder is missing");
    assert!(placeholder.chained);
    assert!(placeholder.type_.as_ref().unwrap().is_struct);

    let comment = command
        .base
        .fields
        .iter()
        .find(|f| f.name == "comment")
        .expect("generic list member is missing");
    assert!(comment.ignore);

    assert_eq!(command.known_generic_fields, vec!["comment".to_owned()]);
}

#[test]
fn chained_struct_fields_are_known_but_stored_through_the_placeholder() {
    let bound = bind_valid("\
structs:
    chainee:
        description: gets chained
        strict: false
        fields:
            a: string
    owner:
        description: chains another struct
        strict: false
        chained_structs:
            chainee: chainedChainee
        fields:
            b: string
");
    let owner = bound
        .structs
        .iter()
        .find(|s| s.name == "owner")
        .expect("owner struct is missing");

    let placeholder = owner
        .fields
        .iter()
        .find(|f| f.chained)
        .expect("chained placeholder is missing");
    assert_eq!(placeholder.cpp_name, "chainedChainee");

    let a = owner
        .fields
        .iter()
        .find(|f| f.name == "a")
        .expect("chained member field is missing");
    assert!(a.ignore);
}

#[test]
fn bare_deserializers_are_qualified_with_their_storage_type() {
    let bound = bind_valid("    special:
        description: a member-parsed value
        cpp_type: Special
        bson_serialization_type: string
        deserializer: parseFromString
    free_special:
        description: a free-function-parsed value
        cpp_type: Special
        bson_serialization_type: string
        deserializer: \"::mongo::parseSpecial\"
structs:
    holder:
        description: holds values
        fields:
            a: special
            b: free_special
");
    let strct = &bound.structs[0];

    let a = strct.fields[0].type_.as_ref().unwrap();
    assert_eq!(
        a.deserializer.as_ref().map(String::as_str),
        Some("Special::parseFromString"),
    );

    let b = strct.fields[1].type_.as_ref().unwrap();
    assert_eq!(
        b.deserializer.as_ref().map(String::as_str),
        Some("::mongo::parseSpecial"),
    );
}

#[test]
fn variant_fields_bind() {
    let bound = bind_valid("\
structs:
    holder:
        description: holds a value
        fields:
            value:
                type:
                    variant: [string, int]
");
    let ty = bound.structs[0].fields[0].type_.as_ref().unwrap();
    assert!(ty.is_variant);
    assert_eq!(ty.variant_types.len(), 2);
    assert!(ty.variant_structs.is_empty());
}

#[test]
fn variant_alternatives_must_have_distinct_wire_types() {
    let errors = bind_errors("\
structs:
    holder:
        description: holds a value
        fields:
            value:
                type:
                    variant: [array<string>, array<int>]
");
    assert!(errors.contains(ERROR_ID_VARIANT_DUPLICATE_BSON_TYPE));
}

#[test]
fn variant_struct_alternatives_occupy_the_object_slot() {
    let errors = bind_errors("\
structs:
    inner:
        description: an alternative
        fields:
            a: string
    holder:
        description: holds a value
        fields:
            value:
                type:
                    variant: [array<int>, inner]
");
    assert!(errors.contains(ERROR_ID_VARIANT_DUPLICATE_BSON_TYPE));
}

#[test]
fn unknown_field_types_are_diagnosed() {
    let errors = bind_errors("\
structs:
    holder:
        description: holds a value
        fields:
            value: wibble
");
    assert!(errors.contains(ERROR_ID_UNKNOWN_TYPE));
}

#[test]
fn chained_structs_must_not_be_strict() {
    let errors = bind_errors("\
structs:
    chainee:
        description: gets chained
        fields:
            a: string
    owner:
        description: chains another struct
        chained_structs:
            chainee: chainedChainee
        fields:
            b: string
");
    assert!(errors.contains(ERROR_ID_CHAINED_NO_NESTED_STRUCT_STRICT));
}

#[test]
fn command_aliases_must_differ_from_the_command_name() {
    let errors = bind_errors("\
commands:
    ping:
        description: a ping
        command_name: ping
        command_alias: ping
        namespace: ignored
        fields:
            comment: string
");
    assert!(errors.contains(ERROR_ID_DUPLICATE_COMMAND_NAME_AND_ALIAS));
}

#[test]
fn typed_commands_resolve_their_parameter() {
    let bound = bind_valid("\
commands:
    renameThing:
        description: renames a thing
        command_name: renameThing
        namespace: type
        type: string
        fields:
            to: string
");
    let command = &bound.commands[0];

    match command.namespace {
        ast::CommandNamespace::Type => {},
        ref other => panic!("wrong namespace: {:?}", other),
    }

    let ty = command.namespace_type.as_ref().expect("namespace type is missing");
    assert_eq!(ty.cpp_type, "std::string");
}

#[test]
fn optional_fields_may_not_have_defaults() {
    let errors = bind_errors("\
structs:
    holder:
        description: holds a value
        fields:
            value:
                type: string
                optional: true
                default: abc
");
    assert!(errors.contains(ERROR_ID_OPTIONAL_FIELD_DEFAULT));
}

#[test]
fn int_enums_must_be_continuous() {
    let errors = bind_errors("\
enums:
    gaps:
        description: an enum with a hole
        type: int
        values:
            A: 0
            B: 2
");
    assert!(errors.contains(ERROR_ID_ENUM_NON_CONTINUOUS_VALUE));
}

#[test]
fn fcv_gated_flags_defaulting_to_true_need_a_version() {
    let errors = bind_errors("\
feature_flags:
    featureFlagToaster:
        description: toasts
        fcv_gated: true
        default: true
");
    assert!(errors.contains(ERROR_ID_FEATURE_FLAG_DEFAULT_TRUE_MISSING_VERSION));
}

#[test]
fn server_parameter_storage_forms_are_exclusive() {
    let errors = bind_errors("\
server_parameters:
    myParam:
        description: a parameter
        set_at: startup
        cpp_class: MyParam
        cpp_varname: gMyParam
");
    assert!(errors.contains(ERROR_ID_SERVER_PARAMETER_STORAGE_CONFLICT));
}

#[test]
fn config_options_bind_positional_ranges_and_duplicate_behavior() {
    let bound = bind_valid("\
configs:
    things:
        description: positional things
        arg_vartype: StringVector
        positional: 1-3
");
    let config = &bound.configs[0];

    let positional = config.positional.as_ref().expect("positional range is missing");
    assert_eq!(positional.start, Some(1));
    assert_eq!(positional.end, Some(3));

    match config.duplicate_behavior {
        ast::DuplicateBehavior::Append => {},
        ref other => panic!("wrong duplicate behavior: {:?}", other),
    }
}

#[test]
fn bad_positional_ranges_are_diagnosed() {
    let errors = bind_errors("\
configs:
    things:
        description: positional things
        arg_vartype: String
        positional: 3-1
");
    assert!(errors.contains(ERROR_ID_BAD_POSITIONAL_RANGE));
}
