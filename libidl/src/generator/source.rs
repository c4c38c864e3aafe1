//
// generator/source.rs
// The IDL Compiler
//

//! Emits the generated C++ source file: enum parse/serialize
//! helpers, constructors, the wire parsers, and the serializers of
//! every struct and command.

use std::io;
use itertools::Itertools;
use yaml::{ MarkedNode, NodeValue };
use ast::*;
use error::Result;
use generator::*;
use generator::params;
use util::title_case;


pub fn generate(spec: &BoundSpec, gen_params: &CodegenParams, wp: &mut WriterProvider) -> Result<()> {
    let wr = wp(&gen_params.source_file_name)?;
    let mut wr = wr.try_borrow_mut()?;
    let wr: &mut io::Write = &mut *wr;

    write_file_banner(wr, &gen_params.input_file)?;
    write_includes(wr, spec, gen_params)?;
    open_namespace(wr, &spec.globals.cpp_namespace)?;

    for enum_ in &spec.enums {
        write_enum_impl(wr, enum_)?;
    }

    for strct in &spec.structs {
        write_struct_impl(wr, strct, None)?;
    }

    for command in &spec.commands {
        write_struct_impl(wr, &command.base, Some(command))?;
    }

    params::write_source_definitions(wr, spec)?;

    close_namespace(wr, &spec.globals.cpp_namespace)?;

    Ok(())
}

fn write_includes(wr: &mut io::Write, spec: &BoundSpec, gen_params: &CodegenParams) -> Result<()> {
    let base_dir = gen_params.output_base_dir.as_ref().map(String::as_str);
    let own_header = generated_header_path(&gen_params.input_file, base_dir);

    let strict_any = spec.structs.iter().any(|s| s.strict)
        || spec.commands.iter().any(|c| c.base.strict);
    let non_strict_any = spec.structs.iter().any(|s| !s.strict)
        || spec.commands.iter().any(|c| !c.base.strict);

    writeln!(wr, "#include \"{}\"", own_header)?;
    writeln!(wr)?;

    if strict_any {
        writeln!(wr, "#include <bitset>")?;
    }

    if non_strict_any {
        writeln!(wr, "#include <set>")?;
    }

    writeln!(wr)?;

    if !spec.commands.is_empty() {
        writeln!(wr, "#include \"mongo/idl/command_generic_argument.h\"")?;
        writeln!(wr, "#include \"mongo/util/database_name_util.h\"")?;
        writeln!(wr, "#include \"mongo/util/namespace_string_util.h\"")?;
    }

    if !spec.configs.is_empty() {
        writeln!(wr, "#include \"mongo/util/options_parser/startup_option_init.h\"")?;
        writeln!(wr, "#include \"mongo/util/options_parser/startup_options.h\"")?;
    }

    writeln!(wr)?;
    Ok(())
}

//
// Enums
//

fn write_enum_impl(wr: &mut io::Write, enum_: &Enum) -> Result<()> {
    match enum_.wire_type {
        EnumWireType::String => write_string_enum_impl(wr, enum_)?,
        EnumWireType::Int    => write_int_enum_impl(wr, enum_)?,
    }

    if enum_.has_extra_data() {
        write_enum_extra_data(wr, enum_)?;
    }

    Ok(())
}

fn write_string_enum_impl(wr: &mut io::Write, enum_: &Enum) -> Result<()> {
    writeln!(
        wr,
        "{} {}_parse(const IDLParserContext& ctxt, StringData value) {{",
        enum_.cpp_name,
        enum_.cpp_name,
    )?;

    for value in &enum_.values {
        writeln!(wr, "    if (value == \"{}\"_sd) {{", EscapedStr(&value.value))?;
        writeln!(wr, "        return {}::k{};", enum_.cpp_name, title_case(&value.name))?;
        writeln!(wr, "    }}")?;
    }

    writeln!(wr, "    ctxt.throwBadEnumValue(value);")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;

    writeln!(wr, "StringData {}_serializer({} value) {{", enum_.cpp_name, enum_.cpp_name)?;
    writeln!(wr, "    switch (value) {{")?;

    for value in &enum_.values {
        writeln!(wr, "        case {}::k{}:", enum_.cpp_name, title_case(&value.name))?;
        writeln!(wr, "            return \"{}\"_sd;", EscapedStr(&value.value))?;
    }

    writeln!(wr, "    }}")?;
    writeln!(wr, "    MONGO_UNREACHABLE;")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}

fn write_int_enum_impl(wr: &mut io::Write, enum_: &Enum) -> Result<()> {
    let values: Vec<i64> = enum_
        .values
        .iter()
        .map(|v| v.value.parse().unwrap_or(0))
        .collect();

    let min = values.iter().cloned().min().unwrap_or(0);
    let max = values.iter().cloned().max().unwrap_or(0);

    writeln!(
        wr,
        "{} {}_parse(const IDLParserContext& ctxt, std::int32_t value) {{",
        enum_.cpp_name,
        enum_.cpp_name,
    )?;
    writeln!(wr, "    if (!(value >= {} && value <= {})) {{", min, max)?;
    writeln!(wr, "        ctxt.throwBadEnumValue(value);")?;
    writeln!(wr, "    }}")?;
    writeln!(wr, "    return static_cast<{}>(value);", enum_.cpp_name)?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;

    writeln!(wr, "std::int32_t {}_serializer({} value) {{", enum_.cpp_name, enum_.cpp_name)?;
    writeln!(wr, "    return static_cast<std::int32_t>(value);")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}

fn write_enum_extra_data(wr: &mut io::Write, enum_: &Enum) -> Result<()> {
    writeln!(
        wr,
        "const BSONObj& {}_get_extra_data({} value) {{",
        enum_.cpp_name,
        enum_.cpp_name,
    )?;
    writeln!(wr, "    static const BSONObj kNoExtraData;")?;

    for value in &enum_.values {
        if let Some(ref extra) = value.extra_data {
            writeln!(
                wr,
                "    static const BSONObj k{}ExtraData = fromjson(R\"json({})json\");",
                title_case(&value.name),
                yaml_to_json(extra),
            )?;
        }
    }

    writeln!(wr, "    switch (value) {{")?;

    for value in &enum_.values {
        writeln!(wr, "        case {}::k{}:", enum_.cpp_name, title_case(&value.name))?;

        if value.extra_data.is_some() {
            writeln!(wr, "            return k{}ExtraData;", title_case(&value.name))?;
        } else {
            writeln!(wr, "            return kNoExtraData;")?;
        }
    }

    writeln!(wr, "    }}")?;
    writeln!(wr, "    MONGO_UNREACHABLE;")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}

// Extra data is carried through the pipeline as a raw document
// node and re-emitted as JSON inside a `fromjson` call.
fn yaml_to_json(node: &MarkedNode) -> String {
    match node.value {
        NodeValue::Scalar(ref s) => {
            let is_literal = s == "true"
                || s == "false"
                || s.parse::<i64>().is_ok()
                || s.parse::<f64>().is_ok();

            if is_literal {
                s.clone()
            } else {
                format!("\"{}\"", json_escape(s))
            }
        },
        NodeValue::Sequence(ref items) => {
            format!("[{}]", items.iter().map(yaml_to_json).join(", "))
        },
        NodeValue::Mapping(ref entries) => {
            let body = entries
                .iter()
                .map(|&(ref key, ref value)| {
                    format!(
                        "\"{}\": {}",
                        json_escape(key.scalar().unwrap_or("")),
                        yaml_to_json(value),
                    )
                })
                .join(", ");

            format!("{{{}}}", body)
        },
    }
}

fn json_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

//
// Struct and command implementations
//

// chained placeholders, parsed from the whole document after the loop
fn chained_fields(strct: &Struct) -> Vec<&Field> {
    strct.fields.iter().filter(|f| f.chained).collect()
}

fn has_bit_fields(strct: &Struct) -> Vec<&Field> {
    strct
        .fields
        .iter()
        .filter(|f| f.is_required() && f.default.is_none() && f.chained_struct_field.is_none())
        .collect()
}

fn bit_name(field: &Field) -> String {
    format!("k{}Bit", title_case(&field.cpp_name))
}

fn write_struct_impl(wr: &mut io::Write, strct: &Struct, command: Option<&Command>) -> Result<()> {
    write_constant_definitions(wr, strct, command)?;
    write_constructors(wr, strct)?;
    write_parse_methods(wr, strct, command)?;
    write_serializers(wr, strct, command)?;
    Ok(())
}

fn write_constant_definitions(
    wr: &mut io::Write,
    strct: &Struct,
    command: Option<&Command>,
) -> Result<()> {
    if let Some(command) = command {
        writeln!(wr, "constexpr StringData {}::kCommandName;", strct.cpp_name)?;

        if command.command_alias.is_some() {
            writeln!(wr, "constexpr StringData {}::kCommandAlias;", strct.cpp_name)?;
        }
    }

    for field in &constant_fields(strct) {
        writeln!(
            wr,
            "constexpr StringData {}::{};",
            strct.cpp_name,
            field_constant(field),
        )?;
    }

    writeln!(wr)?;

    if let Some(command) = command {
        writeln!(
            wr,
            "const std::vector<StringData> {}::kKnownBSONFields = {{",
            strct.cpp_name,
        )?;

        for field in &constant_fields(strct) {
            writeln!(wr, "    {}::{},", strct.cpp_name, field_constant(field))?;
        }

        for name in &command.known_generic_fields {
            writeln!(wr, "    \"{}\"_sd,", EscapedStr(name))?;
        }

        writeln!(wr, "    {}::kCommandName,", strct.cpp_name)?;
        writeln!(wr, "}};")?;
        writeln!(wr)?;
    }

    Ok(())
}

// The default value spelling emitted into generated C++. String and
// enum defaults are written bare in documents and need decoration.
fn default_expr(field: &Field) -> String {
    let default = match field.default {
        Some(ref default) => default.clone(),
        None => return String::new(),
    };

    let ty = match field.type_ {
        Some(ref ty) => ty,
        None => return default,
    };

    if ty.is_enum {
        if default.contains("::") {
            return default;
        }
        return format!("{}::k{}", ty.cpp_type, title_case(&default));
    }

    let is_string = ty.bson_serialization_type.first() == Some(&BsonType::String);

    if is_string && !ty.is_enum && !default.starts_with('"') && ty.deserializer.is_none() {
        return format!("\"{}\"", EscapedStr(&default));
    }

    default
}

// Non-defaulted required scalars start from a recognizable sentinel
// value instead of uninitialized storage.
fn sentinel_expr(field: &Field) -> Option<&'static str> {
    let ty = field.type_.as_ref()?;

    if ty.is_array || ty.is_variant || ty.is_struct || ty.is_enum {
        return None;
    }

    match ty.cpp_type.as_str() {
        "bool" => Some("false"),
        "double"
        | "float"
        | "std::int32_t"
        | "std::int64_t"
        | "std::uint32_t"
        | "std::uint64_t" => Some("-1"),
        _ => None,
    }
}

fn write_constructors(wr: &mut io::Write, strct: &Struct) -> Result<()> {
    let has_bits = has_bit_fields(strct);

    // default constructor
    let mut initializers: Vec<String> = vec![];

    for field in &stored_fields(strct) {
        if field.chained_struct_field.is_some() {
            continue;
        }
        if field.default.is_some() && !field.optional {
            initializers.push(format!("{}({})", member_name(field), default_expr(field)));
        } else if field.is_required() && field.default.is_none() {
            if let Some(sentinel) = sentinel_expr(field) {
                initializers.push(format!("{}({})", member_name(field), sentinel));
            }
        }
    }

    for field in &has_bits {
        initializers.push(format!("{}(false)", has_member_name(field)));
    }

    if initializers.is_empty() {
        writeln!(wr, "{}::{}() {{", strct.cpp_name, strct.cpp_name)?;
    } else {
        writeln!(
            wr,
            "{}::{}() : {} {{",
            strct.cpp_name,
            strct.cpp_name,
            initializers.join(", "),
        )?;
    }

    writeln!(wr, "    // Used for initialization only")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;

    // constructor taking every required field
    let ctor_fields: Vec<&Field> = strct
        .fields
        .iter()
        .filter(|f| f.is_required() && f.default.is_none() && f.chained_struct_field.is_none())
        .collect();

    if ctor_fields.is_empty() {
        return Ok(());
    }

    let args: Vec<String> = ctor_fields
        .iter()
        .map(|f| format!("{} {}", storage_type(f), f.cpp_name))
        .collect();

    let mut initializers: Vec<String> = vec![];

    for field in &ctor_fields {
        if pass_by_value(field) {
            initializers.push(format!("{}({})", member_name(field), field.cpp_name));
        } else {
            initializers.push(format!("{}(std::move({}))", member_name(field), field.cpp_name));
        }
    }

    for field in &stored_fields(strct) {
        if field.default.is_some() && !field.optional && field.chained_struct_field.is_none() {
            initializers.push(format!("{}({})", member_name(field), default_expr(field)));
        }
    }

    for field in &has_bits {
        initializers.push(format!("{}(true)", has_member_name(field)));
    }

    writeln!(
        wr,
        "{}::{}({}) : {} {{",
        strct.cpp_name,
        strct.cpp_name,
        args.join(", "),
        initializers.join(", "),
    )?;
    writeln!(wr, "    // Used for initialization only")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}

//
// Deserialization
//

// the BSONElement accessor for one scalar (non-array) resolved type
fn scalar_element_expr(ty: &ResolvedType, elem: &str, ctxt: &str) -> String {
    if ty.is_enum {
        let arg = match ty.bson_serialization_type.first() {
            Some(&BsonType::Int32) => format!("{}._numberInt()", elem),
            _                      => format!("{}.valueStringData()", elem),
        };
        return format!("{}_parse({}, {})", ty.cpp_type, ctxt, arg);
    }

    if ty.is_struct {
        return format!("{}::parse({}, {}.Obj())", ty.cpp_type, ctxt, elem);
    }

    if let Some(ref deserializer) = ty.deserializer {
        let arg = match ty.bson_serialization_type.first() {
            Some(&BsonType::String) => format!("{}.valueStringData()", elem),
            Some(&BsonType::Object) => format!("{}.Obj()", elem),
            Some(&BsonType::Any)
            | Some(&BsonType::Chain) => elem.to_owned(),
            _ => elem.to_owned(),
        };

        // deserializer symbols arrive fully qualified from the binder
        if ty.deserialize_with_tenant {
            return format!(
                "{}({}.getTenantId(), {}, {}.getSerializationContext())",
                deserializer,
                ctxt,
                arg,
                ctxt,
            );
        }

        return format!("{}({})", deserializer, arg);
    }

    match ty.bson_serialization_type.first() {
        Some(&BsonType::Floating)  => format!("{}._numberDouble()", elem),
        Some(&BsonType::String)    => {
            if ty.is_view {
                format!("{}.valueStringData()", elem)
            } else {
                format!("{}.str()", elem)
            }
        },
        Some(&BsonType::Object)    => format!("{}.Obj().getOwned()", elem),
        Some(&BsonType::BinData)   => {
            if ty.bindata_subtype.as_ref().map(String::as_str) == Some("uuid") {
                format!("uassertStatusOK(UUID::parse({}))", elem)
            } else {
                format!("{}._binDataVector()", elem)
            }
        },
        Some(&BsonType::ObjectId)  => format!("{}.OID()", elem),
        Some(&BsonType::Bool)      => format!("{}.boolean()", elem),
        Some(&BsonType::Date)      => format!("{}.date()", elem),
        Some(&BsonType::Regex)     => format!("{}.regex()", elem),
        Some(&BsonType::Int32)     => format!("{}._numberInt()", elem),
        Some(&BsonType::Timestamp) => format!("{}.timestamp()", elem),
        Some(&BsonType::Int64)     => format!("{}._numberLong()", elem),
        Some(&BsonType::Decimal)   => format!("{}._numberDecimal()", elem),
        _                          => elem.to_owned(),
    }
}

// wire-type enumerators an element of this type is checked against
fn element_type_checks(ty: &ResolvedType) -> Vec<&'static str> {
    if ty.is_struct {
        return vec![BsonType::Object.cpp_enumerator()];
    }

    ty.bson_serialization_type
        .iter()
        .filter(|tag| **tag != BsonType::Any && **tag != BsonType::Chain)
        .map(|tag| tag.cpp_enumerator())
        .collect()
}

// leading wire type an element of this type dispatches on in variants
fn leading_type(ty: &ResolvedType) -> &'static str {
    if ty.is_array {
        return "Array";
    }
    if ty.is_struct {
        return BsonType::Object.cpp_enumerator();
    }
    ty.bson_serialization_type
        .first()
        .map(|tag| tag.cpp_enumerator())
        .unwrap_or("Undefined")
}

// opens the checkAndAssertType guard; returns whether one was opened
fn write_type_check(
    wr: &mut io::Write,
    ty: &ResolvedType,
    elem: &str,
    ctxt: &str,
    indent: &str,
) -> Result<bool> {
    let checks = element_type_checks(ty);

    match checks.len() {
        0 => Ok(false),
        1 => {
            writeln!(
                wr,
                "{}if (MONGO_likely({}.checkAndAssertType({}, {}))) {{",
                indent,
                ctxt,
                elem,
                checks[0],
            )?;
            Ok(true)
        },
        _ => {
            writeln!(
                wr,
                "{}if (MONGO_likely({}.checkAndAssertTypes({}, {{{}}}))) {{",
                indent,
                ctxt,
                elem,
                checks.join(", "),
            )?;
            Ok(true)
        },
    }
}

// the assignment, wrapped in bounds/callback validation when declared
fn write_checked_assignment(
    wr: &mut io::Write,
    field: &Field,
    target: &str,
    expr: &str,
    indent: &str,
) -> Result<()> {
    let validator = match field.validator {
        Some(ref validator) => validator,
        None => {
            writeln!(wr, "{}{} = {};", indent, target, expr)?;
            return Ok(());
        },
    };

    writeln!(wr, "{}{{", indent)?;
    writeln!(wr, "{}    auto value = {};", indent, expr)?;

    let bounds = [
        (&validator.gt,  ">"),
        (&validator.gte, ">="),
        (&validator.lt,  "<"),
        (&validator.lte, "<="),
    ];

    for &(bound, op) in &bounds {
        if let Some(ref bound) = *bound {
            writeln!(wr, "{}    if (!(value {} {})) {{", indent, op, bound)?;
            writeln!(
                wr,
                "{}        throwComparisonError<decltype(value)>(ctxt, \"{}\"_sd, \"{}\"_sd, value);",
                indent,
                EscapedStr(&field.name),
                op,
            )?;
            writeln!(wr, "{}    }}", indent)?;
        }
    }

    if let Some(ref callback) = validator.callback {
        writeln!(wr, "{}    uassertStatusOK({}(value));", indent, callback)?;
    }

    writeln!(wr, "{}    {} = std::move(value);", indent, target)?;
    writeln!(wr, "{}}}", indent)?;
    Ok(())
}

fn write_variant_parser(
    wr: &mut io::Write,
    ty: &ResolvedType,
    field: &Field,
    elem: &str,
    ctxt: &str,
    target: &str,
    indent: &str,
) -> Result<()> {
    writeln!(wr, "{}switch ({}.type()) {{", indent, elem)?;

    let inner = format!("{}    ", indent);
    let mut expected: Vec<&'static str> = vec![];

    for alternative in &ty.variant_types {
        let lead = leading_type(alternative);
        expected.push(lead);

        if alternative.is_array {
            writeln!(wr, "{}case Array: {{", indent)?;
            write_array_loop(wr, alternative, field, elem, ctxt, target, &inner)?;
            writeln!(wr, "{}    break;", indent)?;
            writeln!(wr, "{}}}", indent)?;
            continue;
        }

        for tag in element_type_checks(alternative) {
            writeln!(wr, "{}case {}:", indent, tag)?;
        }

        let expr = scalar_element_expr(alternative, elem, ctxt);
        writeln!(wr, "{}    {} = {};", indent, target, expr)?;
        writeln!(wr, "{}    break;", indent)?;
    }

    if !ty.variant_structs.is_empty() {
        expected.push("Object");
        writeln!(wr, "{}case Object: {{", indent)?;

        if ty.variant_structs.len() == 1 {
            writeln!(
                wr,
                "{}    {} = {}::parse({}, {}.Obj());",
                indent,
                target,
                ty.variant_structs[0].cpp_name,
                ctxt,
                elem,
            )?;
        } else {
            writeln!(wr, "{}    const BSONObj& variantObject = {}.Obj();", indent, elem)?;
            writeln!(
                wr,
                "{}    const auto firstField = variantObject.firstElementFieldNameStringData();",
                indent,
            )?;

            for (index, strct) in ty.variant_structs.iter().enumerate() {
                let keyword = if index == 0 { "if" } else { "} else if" };
                writeln!(
                    wr,
                    "{}    {} (firstField == \"{}\"_sd) {{",
                    indent,
                    keyword,
                    EscapedStr(&strct.first_field_name),
                )?;
                writeln!(
                    wr,
                    "{}        {} = {}::parse({}, variantObject);",
                    indent,
                    target,
                    strct.cpp_name,
                    ctxt,
                )?;
            }

            writeln!(wr, "{}    }} else {{", indent)?;
            writeln!(wr, "{}        {}.throwUnknownField(firstField);", indent, ctxt)?;
            writeln!(wr, "{}    }}", indent)?;
        }

        writeln!(wr, "{}    break;", indent)?;
        writeln!(wr, "{}}}", indent)?;
    }

    expected.dedup();
    writeln!(wr, "{}default:", indent)?;
    writeln!(
        wr,
        "{}    {}.throwBadType({}, {{{}}});",
        indent,
        ctxt,
        elem,
        expected.join(", "),
    )?;
    writeln!(wr, "{}}}", indent)?;
    Ok(())
}

// the body of an array parse: the numbering check and one
// emplace_back per element
fn write_array_loop(
    wr: &mut io::Write,
    ty: &ResolvedType,
    field: &Field,
    elem: &str,
    ctxt: &str,
    target: &str,
    indent: &str,
) -> Result<()> {
    let element_type = if ty.is_variant {
        variant_cpp_type(ty)
    } else {
        ty.cpp_type.clone()
    };

    writeln!(wr, "{}std::uint32_t expectedFieldNumber{{0}};", indent)?;
    writeln!(
        wr,
        "{}const IDLParserContext arrayCtxt({}, &{});",
        indent,
        field_constant(field),
        ctxt,
    )?;
    writeln!(wr, "{}std::vector<{}> values;", indent, element_type)?;
    writeln!(wr)?;
    writeln!(wr, "{}for (const auto& arrayElement : {}.Obj()) {{", indent, elem)?;

    let inner = format!("{}    ", indent);

    writeln!(
        wr,
        "{}const auto arrayFieldName = arrayElement.fieldNameStringData();",
        inner,
    )?;
    writeln!(
        wr,
        "{}if (MONGO_unlikely(arrayFieldName != std::to_string(expectedFieldNumber))) {{",
        inner,
    )?;
    writeln!(
        wr,
        "{}    arrayCtxt.throwBadArrayFieldNumberSequence(arrayFieldName, expectedFieldNumber);",
        inner,
    )?;
    writeln!(wr, "{}}}", inner)?;
    writeln!(wr, "{}++expectedFieldNumber;", inner)?;
    writeln!(wr)?;

    if ty.is_variant {
        writeln!(wr, "{}{} variantValue;", inner, element_type)?;
        write_variant_parser(wr, ty, field, "arrayElement", "arrayCtxt", "variantValue", &inner)?;
        writeln!(wr, "{}values.emplace_back(std::move(variantValue));", inner)?;
    } else {
        let opened = write_type_check(wr, ty, "arrayElement", "arrayCtxt", &inner)?;
        let body_indent = if opened { format!("{}    ", inner) } else { inner.clone() };
        let expr = scalar_element_expr(ty, "arrayElement", "arrayCtxt");
        writeln!(wr, "{}values.emplace_back({});", body_indent, expr)?;
        if opened {
            writeln!(wr, "{}}}", inner)?;
        }
    }

    writeln!(wr, "{}}}", indent)?;
    writeln!(wr, "{}{} = std::move(values);", indent, target)?;
    Ok(())
}

// one field's branch of the parse loop, from inside the name match
fn write_field_parser(wr: &mut io::Write, field: &Field, indent: &str) -> Result<()> {
    if field.ignore {
        return Ok(());
    }

    let ty = match field.type_ {
        Some(ref ty) => ty,
        None => return Ok(()),
    };

    let target = member_name(field);

    if ty.is_variant && !ty.is_array {
        write_variant_parser(wr, ty, field, "element", "ctxt", &target, indent)?;
        return Ok(());
    }

    if ty.is_array {
        writeln!(
            wr,
            "{}if (MONGO_likely(ctxt.checkAndAssertType(element, Array))) {{",
            indent,
        )?;
        write_array_loop(wr, ty, field, "element", "ctxt", &target, &format!("{}    ", indent))?;
        writeln!(wr, "{}}}", indent)?;
        return Ok(());
    }

    if ty.is_struct {
        writeln!(
            wr,
            "{}if (MONGO_likely(ctxt.checkAndAssertType(element, Object))) {{",
            indent,
        )?;
        writeln!(
            wr,
            "{}    IDLParserContext tempContext({}, &ctxt);",
            indent,
            field_constant(field),
        )?;
        writeln!(
            wr,
            "{}    {} = {}::parse(tempContext, element.Obj());",
            indent,
            target,
            ty.cpp_type,
        )?;
        writeln!(wr, "{}}}", indent)?;
        return Ok(());
    }

    let opened = write_type_check(wr, ty, "element", "ctxt", indent)?;
    let body_indent = if opened {
        format!("{}    ", indent)
    } else {
        indent.to_owned()
    };

    let expr = scalar_element_expr(ty, "element", "ctxt");
    write_checked_assignment(wr, field, &target, &expr, &body_indent)?;

    if opened {
        writeln!(wr, "{}}}", indent)?;
    }

    Ok(())
}

fn write_parse_methods(wr: &mut io::Write, strct: &Struct, command: Option<&Command>) -> Result<()> {
    // factory methods
    writeln!(
        wr,
        "{} {}::parse(const IDLParserContext& ctxt, const BSONObj& bsonObject) {{",
        strct.cpp_name,
        strct.cpp_name,
    )?;
    writeln!(wr, "    {} object;", strct.cpp_name)?;
    writeln!(wr, "    object.parseProtected(ctxt, bsonObject);")?;
    writeln!(wr, "    return object;")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;

    if command.is_some() {
        writeln!(
            wr,
            "{} {}::parse(const IDLParserContext& ctxt, const OpMsgRequest& request) {{",
            strct.cpp_name,
            strct.cpp_name,
        )?;
        writeln!(wr, "    {} object;", strct.cpp_name)?;
        writeln!(wr, "    object.parseProtected(ctxt, request);")?;
        writeln!(wr, "    return object;")?;
        writeln!(wr, "}}")?;
        writeln!(wr)?;
    }

    write_parse_protected(wr, strct, command, false)?;

    if command.is_some() {
        write_parse_protected(wr, strct, command, true)?;
    }

    Ok(())
}

fn write_parse_protected(
    wr: &mut io::Write,
    strct: &Struct,
    command: Option<&Command>,
    op_msg: bool,
) -> Result<()> {
    let fields = constant_fields(strct);
    let chained = chained_fields(strct);
    let object_expr = if op_msg { "request.body" } else { "bsonObject" };

    if op_msg {
        writeln!(
            wr,
            "void {}::parseProtected(const IDLParserContext& ctxt, const OpMsgRequest& request) {{",
            strct.cpp_name,
        )?;
    } else {
        writeln!(
            wr,
            "void {}::parseProtected(const IDLParserContext& ctxt, const BSONObj& bsonObject) {{",
            strct.cpp_name,
        )?;
    }

    if strct.fields.iter().any(|f| f.hidden && f.cpp_name == "serializationContext") {
        writeln!(wr, "    _serializationContext = ctxt.getSerializationContext();")?;
    }

    if strct.strict {
        if !fields.is_empty() {
            writeln!(wr, "    std::bitset<{}> usedFields;", fields.len())?;

            for (index, field) in fields.iter().enumerate() {
                writeln!(wr, "    constexpr std::size_t {} = {};", bit_name(field), index)?;
            }

            writeln!(wr)?;
        }
    } else {
        writeln!(wr, "    std::set<StringData> usedFieldSet;")?;
        writeln!(wr)?;
    }

    let needs_command_element = match command.map(|c| c.namespace) {
        Some(CommandNamespace::ConcatenateWithDb)
        | Some(CommandNamespace::ConcatenateWithDbOrUuid) => true,
        _ => false,
    };

    if command.is_some() {
        writeln!(wr, "    bool firstFieldFound = false;")?;

        if needs_command_element {
            writeln!(wr, "    BSONElement commandElement;")?;
        }

        writeln!(wr)?;
    }

    writeln!(wr, "    for (const auto& element : {}) {{", object_expr)?;
    writeln!(wr, "        const auto fieldName = element.fieldNameStringData();")?;
    writeln!(wr)?;

    if let Some(command) = command {
        writeln!(wr, "        if (MONGO_unlikely(!firstFieldFound)) {{")?;
        writeln!(wr, "            firstFieldFound = true;")?;

        match command.namespace {
            CommandNamespace::Ignored => {},
            CommandNamespace::Type => {
                let ty = command.namespace_type.as_ref();
                let expr = match ty {
                    Some(ty) => scalar_element_expr(ty, "element", "ctxt"),
                    None => "element".to_owned(),
                };
                writeln!(wr, "            _commandParameter = {};", expr)?;
            },
            CommandNamespace::ConcatenateWithDb
            | CommandNamespace::ConcatenateWithDbOrUuid => {
                writeln!(wr, "            commandElement = element;")?;
            },
        }

        writeln!(wr, "            continue;")?;
        writeln!(wr, "        }}")?;
        writeln!(wr)?;
    }

    if !strct.strict {
        writeln!(wr, "        if (MONGO_unlikely(!usedFieldSet.insert(fieldName).second)) {{")?;
        writeln!(wr, "            ctxt.throwDuplicateField(element);")?;
        writeln!(wr, "        }}")?;
        writeln!(wr)?;
    }

    for (index, field) in fields.iter().enumerate() {
        writeln!(wr, "        if (fieldName == {}) {{", field_constant(field))?;
        if strct.strict {
            writeln!(wr, "            if (MONGO_unlikely(usedFields[{}])) {{", bit_name(field))?;
            writeln!(wr, "                ctxt.throwDuplicateField(element);")?;
            writeln!(wr, "            }}")?;
            writeln!(wr, "            usedFields.set({});", bit_name(field))?;
        }
        write_field_parser(wr, field, "            ")?;
        writeln!(wr, "            continue;")?;
        writeln!(wr, "        }}")?;

        if index + 1 < fields.len() {
            writeln!(wr)?;
        }
    }

    // unknown fields
    if strct.strict && chained.is_empty() {
        writeln!(wr)?;

        if command.is_some() {
            writeln!(wr, "        if (!isGenericArgument(fieldName)) {{")?;
            writeln!(wr, "            ctxt.throwUnknownField(fieldName);")?;
            writeln!(wr, "        }}")?;
        } else {
            writeln!(wr, "        ctxt.throwUnknownField(fieldName);")?;
        }
    }

    writeln!(wr, "    }}")?;
    writeln!(wr)?;

    // chained types and chained structs consume the whole document
    for field in &chained {
        let ty = match field.type_ {
            Some(ref ty) => ty,
            None => continue,
        };

        if ty.is_struct {
            writeln!(
                wr,
                "    {} = {}::parse(ctxt, {});",
                member_name(field),
                ty.cpp_type,
                object_expr,
            )?;
        } else if let Some(ref deserializer) = ty.deserializer {
            writeln!(wr, "    {} = {}({});", member_name(field), deserializer, object_expr)?;
        }
    }

    // document sequences arrive outside the body
    if op_msg {
        let sequence_fields: Vec<&&Field> = fields
            .iter()
            .filter(|f| f.supports_doc_sequence)
            .collect();

        writeln!(wr, "    for (auto&& sequence : request.sequences) {{")?;

        for (index, field) in sequence_fields.iter().enumerate() {
            let keyword = if index == 0 { "if" } else { "} else if" };
            let element_type = field
                .type_
                .as_ref()
                .map(|t| t.cpp_type.clone())
                .unwrap_or_default();

            writeln!(wr, "        {} (sequence.name == {}) {{", keyword, field_constant(field))?;
            if strct.strict {
                writeln!(wr, "            if (MONGO_unlikely(usedFields[{}])) {{", bit_name(field))?;
                writeln!(wr, "                ctxt.throwDuplicateField(sequence.name);")?;
                writeln!(wr, "            }}")?;
                writeln!(wr, "            usedFields.set({});", bit_name(field))?;
            } else {
                writeln!(wr, "            if (MONGO_unlikely(!usedFieldSet.insert(sequence.name).second)) {{")?;
                writeln!(wr, "                ctxt.throwDuplicateField(sequence.name);")?;
                writeln!(wr, "            }}")?;
            }
            writeln!(wr, "            std::vector<{}> values;", element_type)?;
            writeln!(wr, "            values.reserve(sequence.objs.size());")?;
            writeln!(wr)?;
            writeln!(wr, "            for (const BSONObj& sequenceObject : sequence.objs) {{")?;
            writeln!(
                wr,
                "                IDLParserContext tempContext({}, &ctxt);",
                field_constant(field),
            )?;
            writeln!(
                wr,
                "                values.emplace_back({}::parse(tempContext, sequenceObject));",
                element_type,
            )?;
            writeln!(wr, "            }}")?;
            writeln!(wr, "            {} = std::move(values);", member_name(field))?;
        }

        if sequence_fields.is_empty() {
            writeln!(wr, "        ctxt.throwUnknownField(sequence.name);")?;
        } else {
            writeln!(wr, "        }} else {{")?;
            writeln!(wr, "            ctxt.throwUnknownField(sequence.name);")?;
            writeln!(wr, "        }}")?;
        }

        writeln!(wr, "    }}")?;
        writeln!(wr)?;
    }

    // required fields and defaults
    for field in &fields {
        if !field.is_required() {
            continue;
        }

        if field.default.is_some() {
            continue;
        }

        if strct.strict {
            writeln!(wr, "    if (MONGO_unlikely(!usedFields[{}])) {{", bit_name(field))?;
        } else {
            writeln!(wr, "    if (MONGO_unlikely(!usedFieldSet.count({}))) {{", field_constant(field))?;
        }
        writeln!(wr, "        ctxt.throwMissingField({});", field_constant(field))?;
        writeln!(wr, "    }}")?;
    }

    for field in &has_bit_fields(strct) {
        if fields.iter().any(|f| f.name == field.name) {
            writeln!(wr, "    {} = true;", has_member_name(field))?;
        }
    }

    if let Some(command) = command {
        match command.namespace {
            CommandNamespace::ConcatenateWithDb => {
                writeln!(wr)?;
                writeln!(
                    wr,
                    "    _nss = ctxt.parseNSCollectionRequired(_dbName, commandElement, false);",
                )?;
            },
            CommandNamespace::ConcatenateWithDbOrUuid => {
                writeln!(wr)?;
                writeln!(wr, "    _nssOrUUID = ctxt.parseNsOrUUID(_dbName, commandElement);")?;
            },
            _ => {},
        }
    }

    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}

//
// Serialization
//

// the serializer invocation for one scalar value
fn scalar_serialize_expr(ty: &ResolvedType, value: &str) -> String {
    if ty.is_enum {
        return format!("{}_serializer({})", ty.cpp_type, value);
    }

    if let Some(ref serializer) = ty.serializer {
        if serializer.contains("::") {
            return format!("{}({})", serializer, value);
        }
        return format!("{}.{}()", value, serializer);
    }

    value.to_owned()
}

fn write_field_serializer(wr: &mut io::Write, field: &Field, indent: &str) -> Result<()> {
    let ty = match field.type_ {
        Some(ref ty) => ty,
        None => return Ok(()),
    };

    let member = member_name(field);

    // chained entries hand the whole builder to their serializer
    if field.chained {
        if ty.is_struct {
            writeln!(wr, "{}{}.serialize(builder);", indent, member)?;
        } else if let Some(ref serializer) = ty.serializer {
            if serializer.contains("::") {
                writeln!(wr, "{}{}({}, builder);", indent, serializer, member)?;
            } else {
                writeln!(wr, "{}{}.{}(builder);", indent, member, serializer)?;
            }
        }
        return Ok(());
    }

    let (value, inner): (String, String) = if field.optional {
        writeln!(wr, "{}if ({}) {{", indent, member)?;
        (format!("(*{})", member), format!("{}    ", indent))
    } else {
        (member.clone(), indent.to_owned())
    };

    write_value_serializer(wr, ty, field, &value, &inner)?;

    if field.optional {
        writeln!(wr, "{}}}", indent)?;

        if field.always_serialize {
            writeln!(wr, "{}else {{", indent)?;
            writeln!(wr, "{}    builder->appendNull({});", indent, field_constant(field))?;
            writeln!(wr, "{}}}", indent)?;
        }
    }

    Ok(())
}

fn write_value_serializer(
    wr: &mut io::Write,
    ty: &ResolvedType,
    field: &Field,
    value: &str,
    indent: &str,
) -> Result<()> {
    let constant = field_constant(field);

    if ty.is_array {
        writeln!(wr, "{}{{", indent)?;
        writeln!(
            wr,
            "{}    BSONArrayBuilder arrayBuilder(builder->subarrayStart({}));",
            indent,
            constant,
        )?;
        writeln!(wr)?;
        writeln!(wr, "{}    for (const auto& item : {}) {{", indent, value)?;

        if ty.is_variant {
            write_variant_serializer(wr, ty, field, "item", &format!("{}        ", indent), true)?;
        } else if ty.is_struct {
            writeln!(
                wr,
                "{}        BSONObjBuilder subObjBuilder(arrayBuilder.subobjStart());",
                indent,
            )?;
            writeln!(wr, "{}        item.serialize(&subObjBuilder);", indent)?;
        } else {
            writeln!(
                wr,
                "{}        arrayBuilder.append({});",
                indent,
                scalar_serialize_expr(ty, "item"),
            )?;
        }

        writeln!(wr, "{}    }}", indent)?;
        writeln!(wr, "{}}}", indent)?;
        return Ok(());
    }

    if ty.is_variant {
        write_variant_serializer(wr, ty, field, value, indent, false)?;
        return Ok(());
    }

    if ty.is_struct {
        writeln!(wr, "{}{{", indent)?;
        writeln!(
            wr,
            "{}    BSONObjBuilder subObjBuilder(builder->subobjStart({}));",
            indent,
            constant,
        )?;
        writeln!(wr, "{}    {}.serialize(&subObjBuilder);", indent, value)?;
        writeln!(wr, "{}}}", indent)?;
        return Ok(());
    }

    writeln!(
        wr,
        "{}builder->append({}, {});",
        indent,
        constant,
        scalar_serialize_expr(ty, value),
    )?;
    Ok(())
}

fn write_variant_serializer(
    wr: &mut io::Write,
    ty: &ResolvedType,
    field: &Field,
    value: &str,
    indent: &str,
    in_array: bool,
) -> Result<()> {
    let constant = field_constant(field);

    writeln!(wr, "{}std::visit(OverloadedVisitor{{", indent)?;

    for strct in &ty.variant_structs {
        writeln!(wr, "{}    [&](const {}& alternative) {{", indent, strct.cpp_name)?;

        if in_array {
            writeln!(
                wr,
                "{}        BSONObjBuilder subObjBuilder(arrayBuilder.subobjStart());",
                indent,
            )?;
        } else {
            writeln!(
                wr,
                "{}        BSONObjBuilder subObjBuilder(builder->subobjStart({}));",
                indent,
                constant,
            )?;
        }

        writeln!(wr, "{}        alternative.serialize(&subObjBuilder);", indent)?;
        writeln!(wr, "{}    }},", indent)?;
    }

    writeln!(wr, "{}    [&](const auto& alternative) {{", indent)?;

    if in_array {
        writeln!(wr, "{}        arrayBuilder.append(alternative);", indent)?;
    } else {
        writeln!(wr, "{}        builder->append({}, alternative);", indent, constant)?;
    }

    writeln!(wr, "{}    }},", indent)?;
    writeln!(wr, "{}}}, {});", indent, value)?;
    Ok(())
}

fn write_serializers(wr: &mut io::Write, strct: &Struct, command: Option<&Command>) -> Result<()> {
    writeln!(wr, "void {}::serialize(BSONObjBuilder* builder) const {{", strct.cpp_name)?;

    let has_bits = has_bit_fields(strct);

    if !has_bits.is_empty() {
        let condition = has_bits
            .iter()
            .map(|f| has_member_name(f))
            .join(" && ");

        writeln!(wr, "    invariant({});", condition)?;
        writeln!(wr)?;
    }

    if let Some(command) = command {
        match command.namespace {
            CommandNamespace::Ignored => {
                writeln!(wr, "    builder->append(kCommandName, 1);")?;
            },
            CommandNamespace::Type => {
                let expr = command
                    .namespace_type
                    .as_ref()
                    .map(|ty| scalar_serialize_expr(ty, "_commandParameter"))
                    .unwrap_or_else(|| "_commandParameter".to_owned());
                writeln!(wr, "    builder->append(kCommandName, {});", expr)?;
            },
            CommandNamespace::ConcatenateWithDb => {
                writeln!(wr, "    builder->append(kCommandName, _nss.coll());")?;
            },
            CommandNamespace::ConcatenateWithDbOrUuid => {
                writeln!(wr, "    if (_nssOrUUID.isUUID()) {{")?;
                writeln!(wr, "        _nssOrUUID.uuid().appendToBuilder(builder, kCommandName);")?;
                writeln!(wr, "    }} else {{")?;
                writeln!(wr, "        builder->append(kCommandName, _nssOrUUID.nss().coll());")?;
                writeln!(wr, "    }}")?;
            },
        }

        writeln!(wr)?;
    }

    for field in &wire_fields(strct) {
        write_field_serializer(wr, field, "    ")?;
    }

    writeln!(wr, "}}")?;
    writeln!(wr)?;

    writeln!(wr, "BSONObj {}::toBSON() const {{", strct.cpp_name)?;
    writeln!(wr, "    BSONObjBuilder builder;")?;
    writeln!(wr, "    serialize(&builder);")?;
    writeln!(wr, "    return builder.obj();")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}
