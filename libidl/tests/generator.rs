//
// tests/generator.rs
// The IDL Compiler
//

#![deny(missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]

extern crate idl;

mod common;

use common::{ generate_outputs, generate_header_and_source };


static HOLDER: &'static str = "\
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
";

#[test]
fn output_is_deterministic() {
    assert_eq!(generate_outputs(HOLDER), generate_outputs(HOLDER));
}

#[test]
fn headers_carry_the_banner_and_guard() {
    let (header, source) = generate_header_and_source(HOLDER);

    assert!(header.contains("WARNING: This is a generated file"));
    assert!(header.contains("Source: test.idl"));
    assert!(header.contains("#pragma once"));
    assert!(source.contains("WARNING: This is a generated file"));
    assert!(!source.contains("#pragma once"));
}

#[test]
fn structs_get_a_class_with_field_constants_and_accessors() {
    let (header, source) = generate_header_and_source(HOLDER);

    assert!(header.contains("class Holder {"));
    assert!(header.contains("kCountFieldName"));
    assert!(header.contains("kLabelFieldName"));
    assert!(header.contains("getCount"));
    assert!(header.contains("setLabel"));
    assert!(header.contains("boost::optional<std::string> _label"));

    assert!(header.contains("kCountFieldName = \"count\"_sd;"));
    assert!(source.contains("constexpr StringData Holder::kCountFieldName;"));
}

#[test]
fn string_enums_get_parse_and_serialize_helpers() {
    let body = "\
enums:
    Colour:
        description: a colour
        type: string
        values:
            Red: red
            Blue: blue
";
    let (header, source) = generate_header_and_source(body);

    assert!(header.contains("enum class Colour : std::int32_t {"));
    assert!(header.contains("Colour Colour_parse(const IDLParserContext& ctxt, StringData value);"));
    assert!(header.contains("StringData Colour_serializer(Colour value);"));

    assert!(source.contains("Colour_parse"));
    assert!(source.contains("Colour_serializer"));
    assert!(source.contains("\"red\""));
    assert!(source.contains("\"blue\""));
}

#[test]
fn commands_emit_their_name_constant() {
    let body = "\
commands:
    ping:
        description: a ping
        command_name: ping
        namespace: ignored
        fields:
            comment:
                type: string
                optional: true
";
    let (header, source) = generate_header_and_source(body);

    assert!(header.contains("static constexpr auto kCommandName = \"ping\"_sd;"));
    assert!(header.contains("class Ping {"));
    assert!(source.contains("constexpr StringData Ping::kCommandName;"));
}

#[test]
fn variant_fields_are_stored_in_std_variant() {
    let body = "\
structs:
    holder:
        description: holds a value
        fields:
            value:
                type:
                    variant: [string, int]
";
    let (header, _) = generate_header_and_source(body);

    assert!(header.contains("std::variant<std::string, std::int32_t>"));
}

#[test]
fn required_scalars_start_from_sentinel_values() {
    let body = "\
structs:
    holder:
        description: holds values
        fields:
            count: int
            flag: bool
";
    let (_, source) = generate_header_and_source(body);

    assert!(source.contains(
        "Holder::Holder() : _count(-1), _flag(false), _hasCount(false), _hasFlag(false) {"
    ));
}

#[test]
fn structs_capture_the_serialization_context() {
    let (header, source) = generate_header_and_source(HOLDER);

    assert!(header.contains("_serializationContext"));
    assert!(source.contains("_serializationContext = ctxt.getSerializationContext();"));
}

#[test]
fn commands_parse_their_implicit_db_field() {
    let body = "\
commands:
    ping:
        description: a ping
        command_name: ping
        namespace: ignored
        fields:
            comment:
                type: string
                optional: true
";
    let (header, source) = generate_header_and_source(body);

    assert!(header.contains("kDbNameFieldName = \"$db\"_sd;"));
    assert!(source.contains("if (fieldName == kDbNameFieldName) {"));
}

#[test]
fn non_strict_structs_track_fields_by_name() {
    let body = "\
structs:
    holder:
        description: holds values
        strict: false
        fields:
            count: int
";
    let (_, source) = generate_header_and_source(body);

    assert!(source.contains("#include <set>"));
    assert!(source.contains("std::set<StringData> usedFieldSet;"));
    assert!(source.contains("if (MONGO_unlikely(!usedFieldSet.insert(fieldName).second)) {"));
    assert!(source.contains("if (MONGO_unlikely(!usedFieldSet.count(kCountFieldName))) {"));
    assert!(!source.contains("std::bitset"));
}

#[test]
fn custom_deserializers_are_called_fully_qualified() {
    let body = "    special:
        description: a member-parsed value
        cpp_type: Special
        bson_serialization_type: string
        deserializer: parseFromString
structs:
    holder:
        description: holds a value
        fields:
            value: special
";
    let (_, source) = generate_header_and_source(body);

    assert!(source.contains("Special::parseFromString(element.valueStringData())"));
}

#[test]
fn server_parameters_are_registered() {
    let body = "\
server_parameters:
    myKnob:
        description: a knob
        set_at: [startup, runtime]
        cpp_vartype: std::int32_t
        cpp_varname: gMyKnob
        default: 7
";
    let (header, source) = generate_header_and_source(body);

    assert!(header.contains("extern std::int32_t gMyKnob;"));
    assert!(source.contains("std::int32_t gMyKnob{7};"));
    assert!(source.contains("MONGO_SERVER_PARAMETER_REGISTER"));
    assert!(source.contains("makeIDLServerParameterWithStorage"));
}
