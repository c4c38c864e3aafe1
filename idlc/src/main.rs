//
// main.rs
// The IDL Compiler
//

//! `idlc` is the command-line driver for the IDL Compiler.
//!
//! ## Basic usage:
//!
//! `idlc --base_dir src src/mongo/db/commands/count.idl`
//!
//! The only mandatory argument is a single IDL document. Everything
//! else has a sensible default:
//!
//! * `-i`, `--include`: a directory to search for imported documents.
//!   May be given multiple times; directories are searched in the
//!   order given, and the input file's own directory is always
//!   searched last.
//! * `-o`, `--source`: path of the generated implementation file.
//!   Defaults to the input path with its `.idl` extension replaced
//!   by `_gen.cpp`.
//! * `--header`: path of the generated header. Defaults to the input
//!   path with its extension replaced by `_gen.h`.
//! * `--base_dir`: the directory that `#include` directives in the
//!   generated code are made relative to.
//! * `--target_arch`: the architecture the generated code is
//!   destined for, consulted by conditionally-registered options.
//! * `--write_dependencies`: instead of generating code, print the
//!   transitive list of imported documents to standard output, one
//!   path per line, and exit.
//! * `--write_dependencies_inline`: like `--write_dependencies`,
//!   but each path is printed as `import file:<path>`.
//!
//! ## Exit Status
//!
//! The compiler exits with status `0` if the compilation succeeds,
//! and with a non-zero status if the document had errors (which are
//! reported on standard error) or an I/O failure occurred.

#![crate_name="idlc"]
#![crate_type="bin"]
#![doc(html_root_url = "https://docs.rs/crate/idlc/0.1.0")]
#![deny(missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]

#[macro_use]
extern crate clap;
extern crate idl;

use std::io::prelude::*;
use std::io::stderr;
use std::time::Instant;
use idl::util::{ Diagnostic, DiagnosticKind, PACKAGE_INFO };
use idl::compiler::{ self, CompilerArgs };
use idl::error::Result;


// Reporting elapsed time for each compiler invocation
macro_rules! stopwatch {
    ($msg: expr, $code: expr) => ({
        eprint!("    {:.<40}", $msg);
        stderr().flush().expect("Could not flush stderr");
        let t0 = Instant::now();
        let val = $code;
        let t1 = Instant::now();
        let dt = t1 - t0;
        let secs = dt.as_secs() as f64 + f64::from(dt.subsec_nanos()) * 1e-9;
        let message = format!("{:6.1} ms", secs * 1e3);
        eprintln!("{}", Diagnostic::new(message, DiagnosticKind::Info));
        val
    })
}

//
// Parsing Command-Line Arguments
//

fn parse_args() -> CompilerArgs {
    let args = clap_app!(idlc =>
        (name:    PACKAGE_INFO.name)
        (version: PACKAGE_INFO.version)
        (author:  PACKAGE_INFO.authors)
        (about:   PACKAGE_INFO.description)
        (@arg include:     -i --include     +takes_value +multiple "Directory to search for imported files")
        (@arg source:      -o --source      +takes_value           "Generated implementation file")
        (@arg header:         --header      +takes_value           "Generated header file")
        (@arg base_dir:       --base_dir    +takes_value           "Base directory for generated includes")
        (@arg target_arch:    --target_arch +takes_value           "Target architecture for conditional registrations")
        (@arg write_deps:     --write_dependencies                 "Print the list of imported files and exit")
        (@arg write_deps_inline: --write_dependencies_inline       "Like --write_dependencies, in 'import file:' format")
        (@arg input: +required "The IDL document to compile")
    ).get_matches();

    CompilerArgs {
        input_file: args.value_of("input").unwrap().to_owned(),
        import_directories: args
            .values_of("include")
            .map(|values| values.map(str::to_owned).collect())
            .unwrap_or_default(),
        output_source: args.value_of("source").map(str::to_owned),
        output_header: args.value_of("header").map(str::to_owned),
        output_base_dir: args.value_of("base_dir").map(str::to_owned),
        target_arch: args.value_of("target_arch").map(str::to_owned),
        write_dependencies: args.is_present("write_deps"),
        write_dependencies_inline: args.is_present("write_deps_inline"),
    }
}

//
// Entry point
//

fn idlc_main(args: &CompilerArgs) -> Result<bool> {
    stopwatch!("Compiling", compiler::compile(args, &mut stderr()))
}

fn main() {
    let args = parse_args();

    eprintln!();
    eprintln!("    The IDL Compiler, version {}", PACKAGE_INFO.version);
    eprintln!();

    let succeeded = idlc_main(&args).unwrap_or_else(|error| {
        eprintln!("    {}", Diagnostic::new(&error, DiagnosticKind::Error));
        std::process::exit(2);
    });

    if !succeeded {
        eprintln!();
        eprintln!("    {}", Diagnostic::new("Compilation Failed", DiagnosticKind::Error));
        eprintln!();
        std::process::exit(1);
    }

    eprintln!();
    eprintln!("    {}", Diagnostic::new("Compilation Successful", DiagnosticKind::Success));
    eprintln!();
}
