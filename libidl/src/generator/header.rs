//
// generator/header.rs
// The IDL Compiler
//

//! Emits the generated C++ header: enum declarations with their
//! parse/serialize helpers, one class per struct and command, and
//! the extern declarations of runtime tunables.

use std::io;
use ast::*;
use error::Result;
use generator::*;
use generator::params;
use util::title_case;


pub fn generate(spec: &BoundSpec, gen_params: &CodegenParams, wp: &mut WriterProvider) -> Result<()> {
    let wr = wp(&gen_params.header_file_name)?;
    let mut wr = wr.try_borrow_mut()?;
    let wr: &mut io::Write = &mut *wr;

    write_file_banner(wr, &gen_params.input_file)?;

    writeln!(wr, "#pragma once")?;
    writeln!(wr)?;

    write_includes(wr, spec, gen_params)?;

    open_namespace(wr, &spec.globals.cpp_namespace)?;

    for enum_ in &spec.enums {
        write_enum(wr, enum_)?;
    }

    for strct in &spec.structs {
        write_class(wr, strct, None)?;
    }

    for command in &spec.commands {
        write_class(wr, &command.base, Some(command))?;
    }

    params::write_header_declarations(wr, spec)?;

    close_namespace(wr, &spec.globals.cpp_namespace)?;

    Ok(())
}

fn any_field<F>(spec: &BoundSpec, predicate: F) -> bool
    where F: Fn(&Field) -> bool
{
    spec.structs
        .iter()
        .chain(spec.commands.iter().map(|c| &c.base))
        .flat_map(|s| s.fields.iter())
        .any(predicate)
}

fn write_includes(wr: &mut io::Write, spec: &BoundSpec, gen_params: &CodegenParams) -> Result<()> {
    writeln!(wr, "#include <cstdint>")?;
    writeln!(wr, "#include <string>")?;

    if spec.structs.iter().any(|s| s.generate_comparison_operators) {
        writeln!(wr, "#include <tuple>")?;
    }

    if any_field(spec, |f| f.type_.as_ref().map_or(false, |t| t.is_variant)) {
        writeln!(wr, "#include <variant>")?;
    }

    writeln!(wr, "#include <vector>")?;
    writeln!(wr)?;
    writeln!(wr, "#include <boost/optional.hpp>")?;
    writeln!(wr)?;
    writeln!(wr, "#include \"mongo/base/string_data.h\"")?;
    writeln!(wr, "#include \"mongo/bson/bsonobj.h\"")?;
    writeln!(wr, "#include \"mongo/bson/bsonobjbuilder.h\"")?;
    writeln!(wr, "#include \"mongo/idl/idl_parser.h\"")?;

    if !spec.commands.is_empty() {
        writeln!(wr, "#include \"mongo/db/database_name.h\"")?;
        writeln!(wr, "#include \"mongo/db/namespace_string.h\"")?;
        writeln!(wr, "#include \"mongo/db/serialization_context.h\"")?;
        writeln!(wr, "#include \"mongo/rpc/op_msg.h\"")?;
    }

    if !spec.feature_flags.is_empty() {
        writeln!(wr, "#include \"mongo/db/feature_flag.h\"")?;
    }

    if !spec.server_parameters.is_empty() {
        writeln!(wr, "#include \"mongo/db/server_parameter.h\"")?;
        writeln!(wr, "#include \"mongo/db/server_parameter_with_storage.h\"")?;
    }

    if !spec.configs.is_empty() {
        writeln!(wr, "#include \"mongo/util/options_parser/option_section.h\"")?;
    }

    for include in &spec.globals.cpp_includes {
        writeln!(wr, "#include \"{}\"", include)?;
    }

    let base_dir = gen_params.output_base_dir.as_ref().map(String::as_str);

    for import in &spec.resolved_imports {
        writeln!(wr, "#include \"{}\"", generated_header_path(import, base_dir))?;
    }

    writeln!(wr)?;
    Ok(())
}

//
// Enums
//

fn write_enum(wr: &mut io::Write, enum_: &Enum) -> Result<()> {
    writeln!(wr, "/**")?;
    writeln!(wr, " * {}", enum_.description)?;
    writeln!(wr, " */")?;
    writeln!(wr, "enum class {} : std::int32_t {{", enum_.cpp_name)?;

    for value in &enum_.values {
        match enum_.wire_type {
            EnumWireType::Int => {
                writeln!(wr, "    k{} = {},", title_case(&value.name), value.value)?
            },
            EnumWireType::String => writeln!(wr, "    k{},", title_case(&value.name))?,
        }
    }

    writeln!(wr, "}};")?;
    writeln!(wr)?;

    match enum_.wire_type {
        EnumWireType::Int => {
            writeln!(
                wr,
                "{} {}_parse(const IDLParserContext& ctxt, std::int32_t value);",
                enum_.cpp_name,
                enum_.cpp_name,
            )?;
            writeln!(
                wr,
                "std::int32_t {}_serializer({} value);",
                enum_.cpp_name,
                enum_.cpp_name,
            )?;
        },
        EnumWireType::String => {
            writeln!(
                wr,
                "{} {}_parse(const IDLParserContext& ctxt, StringData value);",
                enum_.cpp_name,
                enum_.cpp_name,
            )?;
            writeln!(
                wr,
                "StringData {}_serializer({} value);",
                enum_.cpp_name,
                enum_.cpp_name,
            )?;
        },
    }

    if enum_.has_extra_data() {
        writeln!(
            wr,
            "const BSONObj& {}_get_extra_data({} value);",
            enum_.cpp_name,
            enum_.cpp_name,
        )?;
    }

    writeln!(wr)?;
    Ok(())
}

//
// Structs and commands
//

// fields that need a constructor argument
fn constructor_fields(strct: &Struct) -> Vec<&Field> {
    strct
        .fields
        .iter()
        .filter(|f| f.is_required() && f.default.is_none() && f.chained_struct_field.is_none())
        .collect()
}

fn write_class(wr: &mut io::Write, strct: &Struct, command: Option<&Command>) -> Result<()> {
    writeln!(wr, "/**")?;
    writeln!(wr, " * {}", strct.description)?;
    writeln!(wr, " */")?;
    writeln!(wr, "class {} {{", strct.cpp_name)?;
    writeln!(wr, "public:")?;

    if let Some(command) = command {
        writeln!(
            wr,
            "    static constexpr auto kCommandName = \"{}\"_sd;",
            EscapedStr(&command.command_name),
        )?;

        if let Some(ref alias) = command.command_alias {
            writeln!(
                wr,
                "    static constexpr auto kCommandAlias = \"{}\"_sd;",
                EscapedStr(alias),
            )?;
        }

        if let Some(ref reply) = command.reply_type {
            writeln!(wr, "    using Reply = {};", reply)?;
        }

        writeln!(wr, "    static const std::vector<StringData> kKnownBSONFields;")?;
    }

    for field in &constant_fields(strct) {
        writeln!(
            wr,
            "    static constexpr auto {} = \"{}\"_sd;",
            field_constant(field),
            EscapedStr(&field.name),
        )?;
    }

    writeln!(wr)?;
    writeln!(wr, "    {}();", strct.cpp_name)?;

    let ctor_fields = constructor_fields(strct);

    if !ctor_fields.is_empty() {
        let args: Vec<String> = ctor_fields
            .iter()
            .map(|f| format!("{} {}", storage_type(f), f.cpp_name))
            .collect();

        writeln!(wr, "    explicit {}({});", strct.cpp_name, args.join(", "))?;
    }

    writeln!(wr)?;
    writeln!(
        wr,
        "    static {} parse(const IDLParserContext& ctxt, const BSONObj& bsonObject);",
        strct.cpp_name,
    )?;

    if command.is_some() {
        writeln!(
            wr,
            "    static {} parse(const IDLParserContext& ctxt, const OpMsgRequest& request);",
            strct.cpp_name,
        )?;
    }

    writeln!(wr, "    void serialize(BSONObjBuilder* builder) const;")?;
    writeln!(wr, "    BSONObj toBSON() const;")?;
    writeln!(wr)?;

    if let Some(command) = command {
        match command.namespace {
            CommandNamespace::ConcatenateWithDb => {
                writeln!(wr, "    const NamespaceString& getNamespace() const {{")?;
                writeln!(wr, "        return _nss;")?;
                writeln!(wr, "    }}")?;
                writeln!(wr)?;
            },
            CommandNamespace::ConcatenateWithDbOrUuid => {
                writeln!(wr, "    const NamespaceStringOrUUID& getNamespaceOrUUID() const {{")?;
                writeln!(wr, "        return _nssOrUUID;")?;
                writeln!(wr, "    }}")?;
                writeln!(wr)?;
            },
            CommandNamespace::Type => {
                if let Some(ref ty) = command.namespace_type {
                    writeln!(wr, "    const {}& getCommandParameter() const {{", ty.cpp_type)?;
                    writeln!(wr, "        return _commandParameter;")?;
                    writeln!(wr, "    }}")?;
                    writeln!(wr)?;
                }
            },
            CommandNamespace::Ignored => {},
        }
    }

    for field in &stored_fields(strct) {
        write_accessors(wr, strct, field)?;
    }

    if strct.generate_comparison_operators {
        write_comparison_operators(wr, strct)?;
    }

    writeln!(wr, "protected:")?;
    writeln!(wr, "    void parseProtected(const IDLParserContext& ctxt, const BSONObj& bsonObject);")?;

    if command.is_some() {
        writeln!(wr, "    void parseProtected(const IDLParserContext& ctxt, const OpMsgRequest& request);")?;
    }

    writeln!(wr)?;
    writeln!(wr, "private:")?;

    if let Some(command) = command {
        match command.namespace {
            CommandNamespace::ConcatenateWithDb => {
                writeln!(wr, "    NamespaceString _nss;")?;
            },
            CommandNamespace::ConcatenateWithDbOrUuid => {
                writeln!(wr, "    NamespaceStringOrUUID _nssOrUUID;")?;
            },
            CommandNamespace::Type => {
                if let Some(ref ty) = command.namespace_type {
                    writeln!(wr, "    {} _commandParameter;", ty.cpp_type)?;
                }
            },
            CommandNamespace::Ignored => {},
        }
    }

    for field in &stored_fields(strct) {
        // inlined chained fields are stored inside their placeholder
        if field.chained_struct_field.is_some() {
            continue;
        }

        writeln!(wr, "    {} {};", storage_type(field), member_name(field))?;
    }

    for field in &stored_fields(strct) {
        if field.is_required() && field.default.is_none() && field.chained_struct_field.is_none() {
            writeln!(wr, "    bool {} : 1;", has_member_name(field))?;
        }
    }

    writeln!(wr, "}};")?;
    writeln!(wr)?;
    Ok(())
}

fn write_accessors(wr: &mut io::Write, strct: &Struct, field: &Field) -> Result<()> {
    let ty = storage_type(field);

    // accessors of inlined chained fields forward to the placeholder
    if let Some(ref placeholder) = field.chained_struct_field {
        if pass_by_value(field) {
            writeln!(wr, "    {} {}() const {{", ty, getter_name(field))?;
        } else {
            writeln!(wr, "    const {}& {}() const {{", ty, getter_name(field))?;
        }
        writeln!(wr, "        return _{}.{}();", placeholder, getter_name(field))?;
        writeln!(wr, "    }}")?;

        if !strct.immutable {
            writeln!(wr, "    void {}({} value) {{", setter_name(field), ty)?;
            writeln!(
                wr,
                "        _{}.{}(std::move(value));",
                placeholder,
                setter_name(field),
            )?;
            writeln!(wr, "    }}")?;
        }

        writeln!(wr)?;
        return Ok(());
    }

    let member = member_name(field);

    if pass_by_value(field) {
        writeln!(wr, "    {} {}() const {{", ty, getter_name(field))?;
        writeln!(wr, "        return {};", member)?;
        writeln!(wr, "    }}")?;
    } else {
        writeln!(wr, "    const {}& {}() const {{", ty, getter_name(field))?;
        writeln!(wr, "        return {};", member)?;
        writeln!(wr, "    }}")?;
    }

    if !strct.immutable {
        writeln!(wr, "    void {}({} value) {{", setter_name(field), ty)?;

        if pass_by_value(field) {
            writeln!(wr, "        {} = value;", member)?;
        } else {
            writeln!(wr, "        {} = std::move(value);", member)?;
        }

        if field.is_required() && field.default.is_none() {
            writeln!(wr, "        {} = true;", has_member_name(field))?;
        }

        writeln!(wr, "    }}")?;
    }

    writeln!(wr)?;
    Ok(())
}

fn write_comparison_operators(wr: &mut io::Write, strct: &Struct) -> Result<()> {
    let mut fields: Vec<&Field> = strct
        .fields
        .iter()
        .filter(|f| !f.ignore && !f.hidden && f.chained_struct_field.is_none())
        .collect();

    fields.sort_by_key(|f| f.comparison_order);

    let members: Vec<String> = fields.iter().map(|f| member_name(f)).collect();
    let tie = format!("std::tie({})", members.join(", "));

    for op in &["==", "!=", "<", ">", "<=", ">="] {
        writeln!(
            wr,
            "    friend bool operator{}(const {}& left, const {}& right) {{",
            op,
            strct.cpp_name,
            strct.cpp_name,
        )?;
        writeln!(wr, "        return left._relopTuple() {} right._relopTuple();", op)?;
        writeln!(wr, "    }}")?;
    }

    writeln!(wr)?;
    writeln!(wr, "private:")?;
    writeln!(wr, "    auto _relopTuple() const {{")?;
    writeln!(wr, "        return {};", tie)?;
    writeln!(wr, "    }}")?;
    writeln!(wr)?;
    writeln!(wr, "public:")?;
    writeln!(wr)?;
    Ok(())
}
