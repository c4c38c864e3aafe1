//
// declgen.rs
// The IDL Compiler
//

//! The declaration backend: walks the symbol table of a parsed (not
//! bound) document and appends one compact declaration per symbol
//! to a per-category stream, for consumption by a scripting
//! front-end. A generator instance may be driven over many
//! documents; symbols shared through imports are emitted once.

use std::io;
use std::collections::BTreeSet;
use syntax::{ Spec, Struct, Command, Enum, Field };
use generator::WriterProvider;
use error::Result;


/// Names of the three output streams requested from the
/// `WriterProvider`, in emission order.
pub const STRUCTS_STREAM: &'static str = "structs.decl";
pub const COMMANDS_STREAM: &'static str = "commands.decl";
pub const ENUMS_STREAM: &'static str = "enums.decl";

/// Emits declaration streams; remembers which symbols it has
/// already written so that re-imported declarations stay unique
/// across a whole run.
#[derive(Debug, Default)]
pub struct DeclGenerator {
    seen: BTreeSet<String>,
}

impl DeclGenerator {
    pub fn new() -> Self {
        DeclGenerator::default()
    }

    /// Appends every not-yet-seen symbol of `spec` to its
    /// category stream.
    pub fn generate(&mut self, spec: &Spec, wp: &mut WriterProvider) -> Result<()> {
        for enum_ in &spec.symbols.enums {
            if self.seen.insert(enum_.name.clone()) {
                let wr = wp(ENUMS_STREAM)?;
                let mut wr = wr.try_borrow_mut()?;
                write_enum_decl(&mut *wr, enum_)?;
            }
        }

        for strct in &spec.symbols.structs {
            if self.seen.insert(strct.name.clone()) {
                let wr = wp(STRUCTS_STREAM)?;
                let mut wr = wr.try_borrow_mut()?;
                write_struct_decl(&mut *wr, strct)?;
            }
        }

        for command in &spec.symbols.commands {
            if self.seen.insert(command.base.name.clone()) {
                let wr = wp(COMMANDS_STREAM)?;
                let mut wr = wr.try_borrow_mut()?;
                write_command_decl(&mut *wr, command)?;
            }
        }

        Ok(())
    }
}

fn write_field_decl(wr: &mut io::Write, field: &Field) -> Result<()> {
    if field.ignore {
        return Ok(());
    }

    let type_name = field
        .type_
        .as_ref()
        .map(|t| t.debug_name())
        .unwrap_or_else(|| "any".to_owned());

    write!(wr, "    {}: {}", field.name, type_name)?;

    if field.optional {
        write!(wr, " [optional]")?;
    }

    if let Some(ref default) = field.default {
        write!(wr, " = {}", default)?;
    }

    writeln!(wr, ";")?;
    Ok(())
}

fn write_struct_decl(wr: &mut io::Write, strct: &Struct) -> Result<()> {
    if let Some(ref description) = strct.description {
        writeln!(wr, "// {}", description)?;
    }

    writeln!(wr, "struct {} {{", strct.name)?;

    for chained in strct.chained_types.iter().chain(strct.chained_structs.iter()) {
        writeln!(wr, "    chained {};", chained.name)?;
    }

    for field in &strct.fields {
        write_field_decl(wr, field)?;
    }

    writeln!(wr, "}};")?;
    writeln!(wr)?;
    Ok(())
}

fn write_command_decl(wr: &mut io::Write, command: &Command) -> Result<()> {
    if let Some(ref description) = command.base.description {
        writeln!(wr, "// {}", description)?;
    }

    writeln!(
        wr,
        "command {} (wire name \"{}\") {{",
        command.base.name,
        command.wire_name(),
    )?;

    if let Some(ref namespace) = command.namespace {
        writeln!(wr, "    namespace {};", namespace)?;
    }

    if let Some(ref api_version) = command.api_version {
        if !api_version.is_empty() {
            writeln!(wr, "    api_version {};", api_version)?;
        }
    }

    if let Some(ref reply) = command.reply_type {
        writeln!(wr, "    reply {};", reply)?;
    }

    for field in &command.base.fields {
        write_field_decl(wr, field)?;
    }

    writeln!(wr, "}};")?;
    writeln!(wr)?;
    Ok(())
}

fn write_enum_decl(wr: &mut io::Write, enum_: &Enum) -> Result<()> {
    if let Some(ref description) = enum_.description {
        writeln!(wr, "// {}", description)?;
    }

    let wire = enum_.type_name.as_ref().map(String::as_str).unwrap_or("string");
    writeln!(wr, "enum {}: {} {{", enum_.name, wire)?;

    for value in &enum_.values {
        match value.value {
            Some(ref wire_value) => writeln!(wr, "    {} = {};", value.name, wire_value)?,
            None => writeln!(wr, "    {};", value.name)?,
        }
    }

    writeln!(wr, "}};")?;
    writeln!(wr)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use super::*;
    use util::Location;
    use syntax::EnumValue;

    fn streams_of(specs: Vec<Spec>) -> HashMap<String, String> {
        let buffers: Rc<RefCell<HashMap<String, Rc<RefCell<Vec<u8>>>>>> = Rc::default();
        let sink = buffers.clone();

        {
            let mut wp = move |name: &str| {
                let mut sink = sink.borrow_mut();
                let buffer = sink
                    .entry(name.to_owned())
                    .or_insert_with(Rc::default)
                    .clone();
                let writer: Rc<RefCell<::std::io::Write>> = buffer;
                Ok(writer)
            };

            let mut declgen = DeclGenerator::new();

            for spec in &specs {
                declgen.generate(spec, &mut wp).unwrap();
            }
        }

        let buffers = buffers.borrow();
        buffers
            .iter()
            .map(|(name, buffer)| {
                (name.clone(), String::from_utf8(buffer.borrow().clone()).unwrap())
            })
            .collect()
    }

    fn enum_named(name: &str) -> Enum {
        let mut enum_ = Enum::new(Location::new("test.idl", 1, 1), name.to_owned());
        enum_.type_name = Some("string".to_owned());
        enum_.values.push(EnumValue::new(Location::new("test.idl", 2, 1), "a".to_owned()));
        enum_
    }

    #[test]
    fn symbols_are_emitted_once_across_documents() {
        let mut first = Spec::default();
        first.symbols.enums.push(enum_named("Color"));

        let mut second = Spec::default();
        let mut imported = enum_named("Color");
        imported.imported = true;
        second.symbols.enums.push(imported);
        second.symbols.enums.push(enum_named("Shape"));

        let streams = streams_of(vec![first, second]);
        let enums = &streams[ENUMS_STREAM];

        assert_eq!(enums.matches("enum Color").count(), 1);
        assert_eq!(enums.matches("enum Shape").count(), 1);
        assert!(!streams.contains_key(STRUCTS_STREAM));
    }
}
