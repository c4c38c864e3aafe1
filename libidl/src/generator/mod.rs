//
// generator/mod.rs
// The IDL Compiler
//

//! The backend: turns a bound document into a C++ header/source
//! pair. `header` and `source` each write one output stream; the
//! `params` module contributes the declarations and registration
//! blocks for server parameters, feature flags and config options
//! to both. Output is deterministic: everything is emitted in
//! document order.

pub mod header;
pub mod source;
pub mod params;

use std::io;
use std::rc::Rc;
use std::cell::RefCell;
use std::path::Path;
use std::fmt::{ self, Display, Formatter };
use ast::*;
use error::Result;
use util::title_case;


/// Functions of this type are expected to yield a (possibly cached)
/// `io::Write` object that the generator can write to. The cache
/// key is the name of the output file being produced.
pub type WriterProvider = FnMut(&str) -> Result<Rc<RefCell<io::Write>>>;

/// A bunch of centralized settings governing the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodegenParams {
    /// The root document the output was generated from; only used
    /// in the banner comment of the emitted files.
    pub input_file: String,
    /// Name of the generated header.
    pub header_file_name: String,
    /// Name of the generated source file.
    pub source_file_name: String,
    /// Directory that `#include` paths are made relative to.
    pub output_base_dir: Option<String>,
    /// Target architecture, exposed to config option conditions.
    pub target_arch: Option<String>,
}

/// Given a bound document and some configuration parameters,
/// generates a C++ header and source file through `wp`.
pub fn generate(spec: &BoundSpec, params: &CodegenParams, wp: &mut WriterProvider) -> Result<()> {
    header::generate(spec, params, wp)?;
    source::generate(spec, params, wp)
}

//
// Shared emission helpers
//

/// A string which `Display`s as the body of a C++ string literal,
/// with quotes, backslashes and control characters escaped.
#[derive(Debug, Clone, Copy)]
pub struct EscapedStr<'a>(pub &'a str);

impl<'a> Display for EscapedStr<'a> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '"'  => write!(f, "\\\"")?,
                '\\' => write!(f, "\\\\")?,
                '\n' => write!(f, "\\n")?,
                '\r' => write!(f, "\\r")?,
                '\t' => write!(f, "\\t")?,
                _    => write!(f, "{}", ch)?,
            }
        }
        Ok(())
    }
}

// name of the `kFooFieldName` constant of a field
pub fn field_constant(field: &Field) -> String {
    format!("k{}FieldName", title_case(&field.cpp_name))
}

pub fn getter_name(field: &Field) -> String {
    format!("get{}", title_case(&field.cpp_name))
}

pub fn setter_name(field: &Field) -> String {
    format!("set{}", title_case(&field.cpp_name))
}

pub fn member_name(field: &Field) -> String {
    format!("_{}", field.cpp_name)
}

pub fn has_member_name(field: &Field) -> String {
    format!("_has{}", title_case(&field.cpp_name))
}

// The C++ type a variant field is stored as.
fn variant_cpp_type(ty: &ResolvedType) -> String {
    let mut alternatives: Vec<String> = ty
        .variant_types
        .iter()
        .map(element_storage_type)
        .collect();

    for strct in &ty.variant_structs {
        alternatives.push(strct.cpp_name.clone())
    }

    format!("std::variant<{}>", alternatives.join(", "))
}

// storage type of one element, wrapping arrays in std::vector
fn element_storage_type(ty: &ResolvedType) -> String {
    let base = if ty.is_variant {
        variant_cpp_type(ty)
    } else {
        ty.cpp_type.clone()
    };

    if ty.is_array {
        format!("std::vector<{}>", base)
    } else {
        base
    }
}

/// The C++ type a field is stored as, `boost::optional` included.
pub fn storage_type(field: &Field) -> String {
    let ty = match field.type_ {
        Some(ref ty) => ty,
        None => return String::new(),
    };

    let base = element_storage_type(ty);

    if field.optional {
        format!("boost::optional<{}>", base)
    } else {
        base
    }
}

// Numeric, boolean and enum values are passed and returned by
// value; everything else by const reference.
pub fn pass_by_value(field: &Field) -> bool {
    let ty = match field.type_ {
        Some(ref ty) => ty,
        None => return true,
    };

    if ty.is_array || ty.is_variant || ty.is_struct {
        return false;
    }

    if ty.is_enum {
        return true;
    }

    match ty.cpp_type.as_str() {
        "bool" | "double" | "float"
        | "std::int32_t" | "std::int64_t"
        | "std::uint32_t" | "std::uint64_t" => true,
        _ => false,
    }
}

/// Maps the path of an IDL document to the path of its generated
/// header, relative to the output base directory.
pub fn generated_header_path(idl_path: &str, base_dir: Option<&str>) -> String {
    let relative = match base_dir {
        Some(base) => Path::new(idl_path)
            .strip_prefix(base)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| idl_path.to_owned()),
        None => idl_path.to_owned(),
    };

    if relative.ends_with(".idl") {
        format!("{}_gen.h", &relative[..relative.len() - 4])
    } else {
        format!("{}_gen.h", relative)
    }
}

/// Writes the banner every generated file starts with.
pub fn write_file_banner(wr: &mut io::Write, input_file: &str) -> Result<()> {
    writeln!(wr, "/**")?;
    writeln!(wr, " * WARNING: This is a generated file. Do not modify.")?;
    writeln!(wr, " *")?;
    writeln!(wr, " * Source: {}", input_file)?;
    writeln!(wr, " */")?;
    writeln!(wr)?;
    Ok(())
}

/// Writes the `namespace` opening for a `::`-separated namespace.
pub fn open_namespace(wr: &mut io::Write, namespace: &str) -> Result<()> {
    for part in namespace.split("::") {
        writeln!(wr, "namespace {} {{", part)?;
    }
    writeln!(wr)?;
    Ok(())
}

/// Writes the matching `namespace` closers.
pub fn close_namespace(wr: &mut io::Write, namespace: &str) -> Result<()> {
    writeln!(wr)?;
    for part in namespace.rsplit("::") {
        writeln!(wr, "}}  // namespace {}", part)?;
    }
    Ok(())
}

// fields that live in the generated class as members
pub fn stored_fields(strct: &Struct) -> Vec<&Field> {
    strct.fields.iter().filter(|f| !f.ignore).collect()
}

// members parsed off the wire (chained placeholders included,
// inlined copies and constructed fields excluded)
pub fn wire_fields(strct: &Struct) -> Vec<&Field> {
    strct
        .fields
        .iter()
        .filter(|f| !f.ignore && !f.hidden && !f.constructed && f.chained_struct_field.is_none())
        .collect()
}

// fields that get a `kFooFieldName` constant: everything matched by
// name in the parse loop, constructed fields included
pub fn constant_fields(strct: &Struct) -> Vec<&Field> {
    strct
        .fields
        .iter()
        .filter(|f| !f.ignore && !f.hidden && !f.chained && f.chained_struct_field.is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(format!("{}", EscapedStr("plain")), "plain");
        assert_eq!(format!("{}", EscapedStr("a \"b\" \\ c\n")), "a \\\"b\\\" \\\\ c\\n");
    }

    #[test]
    fn generated_header_paths() {
        assert_eq!(
            generated_header_path("/src/mongo/db/commands.idl", Some("/src")),
            "mongo/db/commands_gen.h",
        );
        assert_eq!(generated_header_path("foo.idl", None), "foo_gen.h");
    }
}
