//
// tests/common/mod.rs
// The IDL Compiler
//

#![deny(missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]

use std::rc::Rc;
use std::cell::RefCell;
use std::collections::HashMap;
use idl::parser::{ self, ImportResolver };
use idl::syntax::ParsedSpec;
use idl::binder;
use idl::ast::BoundSpec;
use idl::error::ErrorCollection;
use idl::generator::{ self, CodegenParams };


/// Serves imports from an in-memory name -> source map; the import
/// name doubles as the resolved file name.
#[derive(Debug, Default)]
pub struct MapResolver {
    documents: HashMap<String, String>,
}

impl MapResolver {
    pub fn new(documents: &[(&str, &str)]) -> Self {
        MapResolver {
            documents: documents
                .iter()
                .map(|&(name, source)| (name.to_owned(), source.to_owned()))
                .collect(),
        }
    }
}

impl ImportResolver for MapResolver {
    fn resolve(&self, name: &str) -> Option<(String, String)> {
        self.documents
            .get(name)
            .map(|source| (name.to_owned(), source.clone()))
    }
}

/// Primitive type declarations every test document may assume.
pub static PRELUDE: &'static str = "\
types:
    string:
        description: a UTF-8 string
        cpp_type: std::string
        bson_serialization_type: string
    int:
        description: a 32-bit integer
        cpp_type: std::int32_t
        bson_serialization_type: int32
    bool:
        description: a boolean
        cpp_type: bool
        bson_serialization_type: bool
";

pub fn parse_with_imports(source: &str, imports: &[(&str, &str)]) -> ParsedSpec {
    parser::parse("test.idl", source, &MapResolver::new(imports))
}

/// Parses and binds `body` with the primitive prelude prepended.
pub fn parse_and_bind(body: &str) -> Result<BoundSpec, ErrorCollection> {
    let source = format!("{}{}", PRELUDE, body);
    let spec = parse_with_imports(&source, &[])?;
    binder::bind(&spec)
}

pub fn bind_valid(body: &str) -> BoundSpec {
    match parse_and_bind(body) {
        Ok(bound) => bound,
        Err(errors) => panic!("valid document was rejected: {:?}", errors),
    }
}

pub fn bind_errors(body: &str) -> ErrorCollection {
    match parse_and_bind(body) {
        Ok(_) => panic!("invalid document was accepted"),
        Err(errors) => errors,
    }
}

/// Runs the full backend over `body`, capturing every output stream
/// in memory.
pub fn generate_outputs(body: &str) -> HashMap<String, String> {
    let bound = bind_valid(body);

    let params = CodegenParams {
        input_file: "test.idl".to_owned(),
        header_file_name: "test_gen.h".to_owned(),
        source_file_name: "test_gen.cpp".to_owned(),
        output_base_dir: None,
        target_arch: None,
    };

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

        generator::generate(&bound, &params, &mut wp).expect("generation failed");
    }

    let buffers = buffers.borrow();
    buffers
        .iter()
        .map(|(name, buffer)| {
            (name.clone(), String::from_utf8(buffer.borrow().clone()).unwrap())
        })
        .collect()
}

/// The generated header and source for `body`, in that order.
pub fn generate_header_and_source(body: &str) -> (String, String) {
    let mut outputs = generate_outputs(body);
    let header = outputs.remove("test_gen.h").expect("no header was generated");
    let source = outputs.remove("test_gen.cpp").expect("no source was generated");
    (header, source)
}
