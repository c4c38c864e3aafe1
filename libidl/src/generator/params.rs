//
// generator/params.rs
// The IDL Compiler
//

//! Emission of the runtime tunables: server parameter storage and
//! registration, feature flag definitions, and config option
//! registration through the options parser.

use std::io;
use itertools::Itertools;
use ast::*;
use error::Result;
use generator::*;
use util::title_case;


//
// Shared helpers
//

// the ServerParameterType enumerator for a set_at specifier list
fn set_at_enumerator(set_at: &[ServerParameterSetAt]) -> &'static str {
    if set_at.contains(&ServerParameterSetAt::Cluster) {
        return ServerParameterSetAt::Cluster.cpp_enumerator();
    }

    if set_at.contains(&ServerParameterSetAt::Readonly) {
        return ServerParameterSetAt::Readonly.cpp_enumerator();
    }

    let startup = set_at.contains(&ServerParameterSetAt::Startup);
    let runtime = set_at.contains(&ServerParameterSetAt::Runtime);

    match (startup, runtime) {
        (true, true)  => "ServerParameterType::kStartupAndRuntime",
        (false, true) => ServerParameterSetAt::Runtime.cpp_enumerator(),
        _             => ServerParameterSetAt::Startup.cpp_enumerator(),
    }
}

fn rollout_phase_enumerator(phase: RolloutPhase) -> &'static str {
    match phase {
        RolloutPhase::NotForIncrementalRollout => "RolloutPhase::kNotForIncrementalRollout",
        RolloutPhase::InDevelopment            => "RolloutPhase::kInDevelopment",
        RolloutPhase::Rollout                  => "RolloutPhase::kRollout",
        RolloutPhase::Released                 => "RolloutPhase::kReleased",
    }
}

fn feature_flag_class(flag: &FeatureFlag) -> &'static str {
    if flag.phase.is_incremental() {
        "IncrementalRolloutFeatureFlag"
    } else if flag.fcv_gated {
        "FCVGatedFeatureFlag"
    } else {
        "BinaryCompatibleFeatureFlag"
    }
}

// bare string scalars are re-quoted; expression blocks pass through
fn expression_spelling(expression: &Expression, quote_literal: bool) -> String {
    if expression.is_literal && quote_literal {
        format!("\"{}\"", EscapedStr(&expression.expr))
    } else {
        expression.expr.clone()
    }
}

// whether a moe value of this vartype is spelled as a string literal
fn vartype_is_string(arg_vartype: &str) -> bool {
    arg_vartype == "String" || arg_vartype == "StringVector" || arg_vartype == "StringMap"
}

// opens condition guards; returns (preprocessor, runtime guard open)
fn open_condition(
    wr: &mut io::Write,
    condition: &Option<Condition>,
    indent: &str,
    allow_runtime: bool,
) -> Result<(bool, bool)> {
    let condition = match *condition {
        Some(ref condition) => condition,
        None => return Ok((false, false)),
    };

    let mut preprocessor = false;
    let mut runtime = false;

    if let Some(ref guard) = condition.preprocessor {
        writeln!(wr, "#if {}", guard)?;
        preprocessor = true;
    }

    if allow_runtime {
        if let Some(ref guard) = condition.constexpr_expr {
            writeln!(wr, "{}if constexpr ({}) {{", indent, guard)?;
            runtime = true;
        } else if let Some(ref guard) = condition.expr {
            writeln!(wr, "{}if ({}) {{", indent, guard)?;
            runtime = true;
        }
    }

    Ok((preprocessor, runtime))
}

fn close_condition(
    wr: &mut io::Write,
    guards: (bool, bool),
    indent: &str,
) -> Result<()> {
    if guards.1 {
        writeln!(wr, "{}}}", indent)?;
    }
    if guards.0 {
        writeln!(wr, "#endif")?;
    }
    Ok(())
}

//
// Header declarations
//

pub fn write_header_declarations(wr: &mut io::Write, spec: &BoundSpec) -> Result<()> {
    for param in &spec.server_parameters {
        let varname = match param.cpp_varname {
            Some(ref varname) => varname,
            None => continue,
        };
        let vartype = param
            .cpp_vartype
            .as_ref()
            .map(String::as_str)
            .unwrap_or("std::string");

        let guards = open_condition(wr, &param.condition, "", false)?;
        writeln!(wr, "extern {} {};", vartype, varname)?;
        close_condition(wr, guards, "")?;
    }

    for flag in &spec.feature_flags {
        writeln!(wr, "extern {} {};", feature_flag_class(flag), flag.cpp_varname)?;
    }

    for config in &spec.configs {
        let varname = match config.cpp_varname {
            Some(ref varname) => varname,
            None => continue,
        };
        let vartype = config
            .cpp_vartype
            .as_ref()
            .map(String::as_str)
            .unwrap_or("std::string");

        let guards = open_condition(wr, &config.condition, "", false)?;
        writeln!(wr, "extern {} {};", vartype, varname)?;
        close_condition(wr, guards, "")?;
    }

    if !spec.server_parameters.is_empty()
        || !spec.feature_flags.is_empty()
        || !spec.configs.is_empty()
    {
        writeln!(wr)?;
    }

    Ok(())
}

//
// Source definitions
//

pub fn write_source_definitions(wr: &mut io::Write, spec: &BoundSpec) -> Result<()> {
    write_storage_definitions(wr, spec)?;
    write_feature_flag_definitions(wr, spec)?;

    if !spec.server_parameters.is_empty() || !spec.feature_flags.is_empty() {
        write_server_parameter_register(wr, spec)?;
    }

    if !spec.configs.is_empty() {
        write_config_registration(wr, spec)?;
    }

    Ok(())
}

fn write_storage_definitions(wr: &mut io::Write, spec: &BoundSpec) -> Result<()> {
    for param in &spec.server_parameters {
        let varname = match param.cpp_varname {
            Some(ref varname) => varname,
            None => continue,
        };
        let vartype = param
            .cpp_vartype
            .as_ref()
            .map(String::as_str)
            .unwrap_or("std::string");
        let quote = vartype.contains("string");

        let guards = open_condition(wr, &param.condition, "", false)?;

        match param.default {
            Some(ref default) => writeln!(
                wr,
                "{} {}{{{}}};",
                vartype,
                varname,
                expression_spelling(default, quote),
            )?,
            None => writeln!(wr, "{} {};", vartype, varname)?,
        }

        close_condition(wr, guards, "")?;
    }

    for config in &spec.configs {
        let varname = match config.cpp_varname {
            Some(ref varname) => varname,
            None => continue,
        };
        let vartype = config
            .cpp_vartype
            .as_ref()
            .map(String::as_str)
            .unwrap_or("std::string");
        let quote = vartype.contains("string");

        let guards = open_condition(wr, &config.condition, "", false)?;

        match config.default {
            Some(ref default) => writeln!(
                wr,
                "{} {}{{{}}};",
                vartype,
                varname,
                expression_spelling(default, quote),
            )?,
            None => writeln!(wr, "{} {};", vartype, varname)?,
        }

        close_condition(wr, guards, "")?;
    }

    writeln!(wr)?;
    Ok(())
}

fn write_feature_flag_definitions(wr: &mut io::Write, spec: &BoundSpec) -> Result<()> {
    for flag in &spec.feature_flags {
        let default = if flag.default { "true" } else { "false" };

        if flag.phase.is_incremental() {
            writeln!(
                wr,
                "IncrementalRolloutFeatureFlag {}{{\"{}\"_sd, {}, {}}};",
                flag.cpp_varname,
                EscapedStr(&flag.name),
                rollout_phase_enumerator(flag.phase),
                default,
            )?;
        } else if flag.fcv_gated {
            let version = flag.version.as_ref().map(String::as_str).unwrap_or("");
            writeln!(
                wr,
                "FCVGatedFeatureFlag {}{{\"{}\"_sd, {}, \"{}\"_sd}};",
                flag.cpp_varname,
                EscapedStr(&flag.name),
                default,
                EscapedStr(version),
            )?;
        } else {
            writeln!(
                wr,
                "BinaryCompatibleFeatureFlag {}{{\"{}\"_sd, {}}};",
                flag.cpp_varname,
                EscapedStr(&flag.name),
                default,
            )?;
        }
    }

    if !spec.feature_flags.is_empty() {
        writeln!(wr)?;
    }

    Ok(())
}

fn write_validator_bounds(
    wr: &mut io::Write,
    validator: &Validator,
    handle: &str,
    indent: &str,
) -> Result<()> {
    let bounds = [
        (&validator.gt,  "GT"),
        (&validator.gte, "GTE"),
        (&validator.lt,  "LT"),
        (&validator.lte, "LTE"),
    ];

    for &(bound, tag) in &bounds {
        if let Some(ref bound) = *bound {
            writeln!(
                wr,
                "{}{}->addBound<idl_server_parameter_detail::{}>({});",
                indent,
                handle,
                tag,
                bound,
            )?;
        }
    }

    if let Some(ref callback) = validator.callback {
        writeln!(wr, "{}{}->setValidator({});", indent, handle, callback)?;
    }

    Ok(())
}

fn write_server_parameter_register(wr: &mut io::Write, spec: &BoundSpec) -> Result<()> {
    writeln!(
        wr,
        "MONGO_SERVER_PARAMETER_REGISTER(idl_server_parameters)(InitializerContext*) {{",
    )?;

    let mut index = 0;

    for param in &spec.server_parameters {
        let handle = format!("scp_{}", index);
        index += 1;

        let guards = open_condition(wr, &param.condition, "    ", true)?;
        let indent = if guards.1 { "        " } else { "    " };
        let inner = format!("{}    ", indent);

        writeln!(wr, "{}{{", indent)?;
        writeln!(wr, "{}// {}", inner, param.description)?;

        if let Some(ref cpp_class) = param.cpp_class {
            writeln!(
                wr,
                "{}auto* {} = new {}(\"{}\"_sd, {});",
                inner,
                handle,
                cpp_class,
                EscapedStr(&param.name),
                set_at_enumerator(&param.set_at),
            )?;
        } else {
            let varname = param
                .cpp_varname
                .as_ref()
                .map(String::as_str)
                .unwrap_or("");
            writeln!(
                wr,
                "{}auto* {} = makeIDLServerParameterWithStorage<{}>(\"{}\"_sd, {});",
                inner,
                handle,
                set_at_enumerator(&param.set_at),
                EscapedStr(&param.name),
                varname,
            )?;
        }

        if let Some(ref validator) = param.validator {
            write_validator_bounds(wr, validator, &handle, &inner)?;
        }

        if let Some(ref on_update) = param.on_update {
            writeln!(wr, "{}{}->setOnUpdate({});", inner, handle, on_update)?;
        }

        if param.redact {
            writeln!(wr, "{}{}->setRedact();", inner, handle)?;
        }

        if param.test_only {
            writeln!(wr, "{}{}->setTestOnly();", inner, handle)?;
        }

        for (alias_index, name) in param.deprecated_name.iter().enumerate() {
            writeln!(
                wr,
                "{}[[maybe_unused]] auto* {}_alias_{} = makeIDLServerParameterDeprecatedAlias(\"{}\"_sd, {});",
                inner,
                handle,
                alias_index,
                EscapedStr(name),
                handle,
            )?;
        }

        writeln!(wr, "{}registerServerParameter({});", inner, handle)?;
        writeln!(wr, "{}}}", indent)?;

        close_condition(wr, guards, "    ")?;
    }

    for flag in &spec.feature_flags {
        let handle = format!("scp_{}", index);
        index += 1;

        writeln!(wr, "    {{")?;
        writeln!(wr, "        // {}", flag.description)?;
        writeln!(
            wr,
            "        auto* {} = new FeatureFlagServerParameter(\"{}\"_sd, &{});",
            handle,
            EscapedStr(&flag.name),
            flag.cpp_varname,
        )?;
        writeln!(wr, "        registerServerParameter({});", handle)?;
        writeln!(wr, "    }}")?;
    }

    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}

//
// Config options
//

fn write_option_chaining(
    wr: &mut io::Write,
    config: &ConfigOption,
    target: &str,
    indent: &str,
) -> Result<()> {
    // the boost-style spelling: short name, comma, single letter
    let mut cli_name = config
        .short_name
        .as_ref()
        .map(String::as_str)
        .unwrap_or(&config.name)
        .to_owned();

    if let Some(ref single) = config.single_name {
        cli_name = format!("{},{}", cli_name, single);
    }

    let deprecated = config
        .deprecated_name
        .iter()
        .map(|n| format!("\"{}\"", EscapedStr(n)))
        .join(", ");
    let deprecated_short = config
        .deprecated_short_name
        .iter()
        .map(|n| format!("\"{}\"", EscapedStr(n)))
        .join(", ");

    writeln!(wr, "{}{}", indent, target)?;
    writeln!(
        wr,
        "{}    .addOptionChaining(\"{}\", \"{}\", moe::{}, {}, {{{}}}, {{{}}})",
        indent,
        EscapedStr(&config.name),
        EscapedStr(&cli_name),
        config.arg_vartype,
        expression_spelling(&config.description, true),
        deprecated,
        deprecated_short,
    )?;

    let sources = config
        .source
        .iter()
        .map(|s| format!("moe::{}", s.cpp_enumerator()))
        .join(" | ");

    if config.source.len() == 3 {
        writeln!(wr, "{}    .setSources(moe::SourceAll)", indent)?;
    } else if !config.source.is_empty() {
        writeln!(wr, "{}    .setSources(static_cast<moe::OptionSources>({}))", indent, sources)?;
    }

    if config.hidden {
        writeln!(wr, "{}    .hidden()", indent)?;
    }

    if config.redact {
        writeln!(wr, "{}    .redact()", indent)?;
    }

    let quote = vartype_is_string(&config.arg_vartype);

    if let Some(ref default) = config.default {
        writeln!(
            wr,
            "{}    .setDefault(moe::Value({}))",
            indent,
            expression_spelling(default, quote),
        )?;
    }

    if let Some(ref implicit) = config.implicit {
        writeln!(
            wr,
            "{}    .setImplicit(moe::Value({}))",
            indent,
            expression_spelling(implicit, quote),
        )?;
    }

    if config.duplicate_behavior == DuplicateBehavior::Append {
        writeln!(wr, "{}    .composing()", indent)?;
    }

    for other in &config.conflicts {
        writeln!(wr, "{}    .incompatibleWith(\"{}\")", indent, EscapedStr(other))?;
    }

    for other in &config.requires {
        writeln!(wr, "{}    .requiresOption(\"{}\")", indent, EscapedStr(other))?;
    }

    if let Some(ref positional) = config.positional {
        writeln!(
            wr,
            "{}    .positional({}, {})",
            indent,
            positional.start.unwrap_or(-1),
            positional.end.unwrap_or(-1),
        )?;
    }

    writeln!(wr, "{};", indent)?;
    Ok(())
}

fn write_config_registration(wr: &mut io::Write, spec: &BoundSpec) -> Result<()> {
    let initializer = spec
        .config_global
        .as_ref()
        .map(|g| g.initializer_name.clone())
        .unwrap_or_else(|| "idl".to_owned());
    let function_stem = title_case(&initializer);

    // options grouped by help section, in first-appearance order
    let mut sections: Vec<(Option<&str>, Vec<&ConfigOption>)> = vec![];

    for config in &spec.configs {
        let section = config.section.as_ref().map(String::as_str);

        match sections.iter().position(|&(s, _)| s == section) {
            Some(index) => sections[index].1.push(config),
            None => sections.push((section, vec![config])),
        }
    }

    writeln!(wr, "namespace moe = ::mongo::optionenvironment;")?;
    writeln!(wr)?;
    writeln!(wr, "namespace {{")?;
    writeln!(wr)?;
    writeln!(
        wr,
        "Status add{}Options(moe::OptionSection* options_ptr) {{",
        function_stem,
    )?;
    writeln!(wr, "    auto& options = *options_ptr;")?;
    writeln!(wr)?;

    for &(section, ref group) in &sections {
        match section {
            None => {
                for config in group {
                    let guards = open_condition(wr, &config.condition, "    ", true)?;
                    let indent = if guards.1 { "        " } else { "    " };
                    write_option_chaining(wr, config, "options", indent)?;
                    close_condition(wr, guards, "    ")?;
                }
            },
            Some(section) => {
                writeln!(wr, "    {{")?;
                writeln!(
                    wr,
                    "        moe::OptionSection section(\"{}\");",
                    EscapedStr(section),
                )?;
                writeln!(wr)?;

                for config in group {
                    let guards = open_condition(wr, &config.condition, "        ", true)?;
                    let indent = if guards.1 { "            " } else { "        " };
                    write_option_chaining(wr, config, "section", indent)?;
                    close_condition(wr, guards, "        ")?;
                }

                writeln!(wr)?;
                writeln!(wr, "        auto status = options.addSection(section);")?;
                writeln!(wr, "        if (!status.isOK()) {{")?;
                writeln!(wr, "            return status;")?;
                writeln!(wr, "        }}")?;
                writeln!(wr, "    }}")?;
            },
        }
    }

    writeln!(wr)?;
    writeln!(wr, "    return Status::OK();")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;

    // the store pass copies parsed values into their storage
    writeln!(
        wr,
        "Status store{}Options(const moe::Environment& params) {{",
        function_stem,
    )?;

    for config in &spec.configs {
        let varname = match config.cpp_varname {
            Some(ref varname) => varname,
            None => continue,
        };
        let vartype = config
            .cpp_vartype
            .as_ref()
            .map(String::as_str)
            .unwrap_or("std::string");

        let guards = open_condition(wr, &config.condition, "    ", true)?;
        let indent = if guards.1 { "        " } else { "    " };
        let inner = format!("{}    ", indent);

        writeln!(wr, "{}if (params.count(\"{}\")) {{", indent, EscapedStr(&config.name))?;
        writeln!(
            wr,
            "{}{} = params[\"{}\"].as<{}>();",
            inner,
            varname,
            EscapedStr(&config.name),
            vartype,
        )?;

        if let Some(ref validator) = config.validator {
            let bounds = [
                (&validator.gt,  ">"),
                (&validator.gte, ">="),
                (&validator.lt,  "<"),
                (&validator.lte, "<="),
            ];

            for &(bound, op) in &bounds {
                if let Some(ref bound) = *bound {
                    writeln!(wr, "{}if (!({} {} {})) {{", inner, varname, op, bound)?;
                    writeln!(
                        wr,
                        "{}    return Status(ErrorCodes::BadValue, \"Invalid value for {}\");",
                        inner,
                        EscapedStr(&config.name),
                    )?;
                    writeln!(wr, "{}}}", inner)?;
                }
            }

            if let Some(ref callback) = validator.callback {
                writeln!(wr, "{}{{", inner)?;
                writeln!(wr, "{}    auto status = {}({});", inner, callback, varname)?;
                writeln!(wr, "{}    if (!status.isOK()) {{", inner)?;
                writeln!(wr, "{}        return status;", inner)?;
                writeln!(wr, "{}    }}", inner)?;
                writeln!(wr, "{}}}", inner)?;
            }
        }

        writeln!(wr, "{}}}", indent)?;
        close_condition(wr, guards, "    ")?;
    }

    writeln!(wr)?;
    writeln!(wr, "    return Status::OK();")?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    writeln!(wr, "}}  // namespace")?;
    writeln!(wr)?;
    writeln!(
        wr,
        "MONGO_MODULE_STARTUP_OPTIONS_REGISTER({})(InitializerContext*) {{",
        initializer,
    )?;
    writeln!(
        wr,
        "    uassertStatusOK(add{}Options(&moe::startupOptions));",
        function_stem,
    )?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    writeln!(wr, "MONGO_STARTUP_OPTIONS_STORE({})(InitializerContext*) {{", initializer)?;
    writeln!(
        wr,
        "    uassertStatusOK(store{}Options(moe::startupOptionsParsed));",
        function_stem,
    )?;
    writeln!(wr, "}}")?;
    writeln!(wr)?;
    Ok(())
}
