//
// lib.rs
// The IDL Compiler
//

//! This library provides the programmatic interface for the IDL
//! Compiler: a three-pass language tool that turns YAML schema
//! documents describing BSON-serializable structures into C++
//! serialization code. The crate is composed of several modules,
//! each of which roughly corresponds to a single step in the
//! compilation pipeline:
//!
//! * `yaml` loads document text into a source-located DOM.
//! * `parser` maps the DOM onto a…
//! * `syntax` tree, resolving imports along the way.
//! * `binder` typechecks and validates the syntax tree into an…
//! * `ast`, the bound representation the backends walk.
//! * `generator` emits the C++ header/source pair.
//! * `declgen` is the alternate backend emitting declaration streams.
//! * `compiler` is the driver tying the passes together.
//! * `util` contains miscellaneous helper types and functions.
//! * `error` contains the diagnostic codes, the error collection,
//!   and the driver-level error type.
//!
//! Embedders normally call `compiler::compile`; tools that only
//! enumerate declarations (build-system scanners, the declaration
//! backend) use `parser::parse` and walk the symbol table directly.

#![crate_name="idl"]
#![crate_type="rlib"]
#![crate_type="dylib"]
#![doc(html_root_url = "https://docs.rs/idl/0.1.0")]
#![deny(missing_debug_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces)]

extern crate regex;
extern crate heck;
extern crate itertools;
extern crate yaml_rust;
#[macro_use]
extern crate lazy_static;

pub mod util;
pub mod error;
pub mod yaml;
pub mod syntax;
pub mod parser;
pub mod ast;
pub mod binder;
pub mod generator;
pub mod declgen;
pub mod compiler;
