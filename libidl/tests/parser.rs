//
// tests/parser.rs
// The IDL Compiler
//

#![deny(missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]

extern crate idl;

mod common;

use std::cell::RefCell;
use common::{ parse_with_imports, MapResolver };
use idl::parser::{ self, FileImportResolver, ImportResolver };
use idl::error::*;


#[test]
fn imported_symbols_are_merged_into_the_root() {
    let root = "\
imports:
    - types.idl
structs:
    holder:
        description: holds a value
        fields:
            value: string
";
    let types = "\
types:
    string:
        description: a UTF-8 string
        cpp_type: std::string
        bson_serialization_type: string
";
    let spec = parse_with_imports(root, &[("types.idl", types)])
        .expect("valid import was rejected");

    let ty = spec.symbols.get_type("string").expect("imported type is missing");
    assert!(ty.imported);

    let strct = spec.symbols.get_struct("holder").expect("root struct is missing");
    assert!(!strct.imported);
}

#[test]
fn missing_imports_are_diagnosed() {
    let errors = parse_with_imports("imports: nope.idl\n", &[])
        .expect_err("unresolvable import was accepted");

    assert!(errors.contains(ERROR_ID_IMPORT_NOT_FOUND));
}

#[test]
fn import_cycles_are_benign_and_each_file_is_parsed_once() {
    let root = "\
imports:
    - a.idl
";
    let a = "\
imports:
    - b.idl
enums:
    colour:
        description: a colour
        type: string
        values:
            Red: red
";
    let b = "\
imports:
    - a.idl
enums:
    shade:
        description: a shade
        type: string
        values:
            Dark: dark
";

    // records every name handed to the resolver
    #[derive(Debug)]
    struct CountingResolver {
        inner: MapResolver,
        calls: RefCell<Vec<String>>,
    }

    impl ImportResolver for CountingResolver {
        fn resolve(&self, name: &str) -> Option<(String, String)> {
            self.calls.borrow_mut().push(name.to_owned());
            self.inner.resolve(name)
        }
    }

    let resolver = CountingResolver {
        inner: MapResolver::new(&[("a.idl", a), ("b.idl", b)]),
        calls: RefCell::default(),
    };

    let spec = parser::parse("test.idl", root, &resolver)
        .expect("cyclic imports were rejected");

    assert!(spec.symbols.get_enum("colour").is_some());
    assert!(spec.symbols.get_enum("shade").is_some());

    let calls = resolver.calls.borrow();
    assert_eq!(calls.iter().filter(|n| n.as_str() == "a.idl").count(), 1);
    assert_eq!(calls.iter().filter(|n| n.as_str() == "b.idl").count(), 1);

    let imports = spec.imports.as_ref().expect("imports block is missing");
    assert_eq!(imports.dependencies, vec!["a.idl".to_owned(), "b.idl".to_owned()]);
}

#[test]
fn only_includable_imports_are_resolved_for_inclusion() {
    let root = "\
imports:
    - types.idl
    - enums.idl
";
    let types = "\
types:
    string:
        description: a UTF-8 string
        cpp_type: std::string
        bson_serialization_type: string
";
    let enums = "\
enums:
    colour:
        description: a colour
        type: string
        values:
            Red: red
";
    let spec = parse_with_imports(root, &[("types.idl", types), ("enums.idl", enums)])
        .expect("valid imports were rejected");

    let imports = spec.imports.as_ref().expect("imports block is missing");

    // type-only documents contribute no generated header
    assert_eq!(imports.resolved_file_names, vec!["enums.idl".to_owned()]);
    assert_eq!(imports.dependencies.len(), 2);
}

#[test]
fn absolute_import_names_bypass_the_search_directories() {
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    let path = env::temp_dir().join("idl_resolver_absolute_import.idl");
    let document = "\
enums:
    colour:
        description: a colour
        type: string
        values:
            Red: red
";
    fs::write(&path, document).unwrap();

    // no search directories at all
    let resolver = FileImportResolver::new(Vec::<PathBuf>::new());
    let name = path.to_string_lossy().into_owned();

    let (resolved_name, source) = resolver
        .resolve(&name)
        .expect("absolute import did not resolve");

    assert_eq!(resolved_name, name);
    assert_eq!(source, document);

    fs::remove_file(&path).ok();
}

#[test]
fn duplicate_symbols_across_categories_are_diagnosed() {
    let source = "\
structs:
    foo:
        description: a struct
        fields:
            a:
                type: foo
enums:
    foo:
        description: an enum
        type: string
        values:
            A: a
";
    let errors = parse_with_imports(source, &[])
        .expect_err("duplicate symbol was accepted");

    assert!(errors.contains(ERROR_ID_DUPLICATE_SYMBOL));
}
