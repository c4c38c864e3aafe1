//
// compiler.rs
// The IDL Compiler
//

//! The driver: one entry point that reads a root document, runs the
//! loader, the binder, and the generator, and reports diagnostics.
//! Returns whether the invocation succeeded; diagnostics go to the
//! writer the caller supplies (the CLI passes stderr).

use std::fs::File;
use std::io::{ self, Read, Write };
use std::rc::Rc;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{ Path, PathBuf };
use error::Result;
use parser::{ self, FileImportResolver };
use binder;
use generator::{ self, CodegenParams, WriterProvider };


/// Everything one compiler invocation needs.
#[derive(Debug, Clone, Default)]
pub struct CompilerArgs {
    /// Path of the root document.
    pub input_file: String,
    /// Ordered search path for `imports:` resolution. The input
    /// file's own directory is always searched last.
    pub import_directories: Vec<String>,
    /// Explicit implementation-file path; derived from the input
    /// path when absent.
    pub output_source: Option<String>,
    /// Explicit header path; derived from the input path when absent.
    pub output_header: Option<String>,
    /// Directory emitted `#include` paths are made relative to.
    pub output_base_dir: Option<String>,
    /// Target architecture, exposed to conditional registrations.
    pub target_arch: Option<String>,
    /// Print the transitive import list, one path per line, and
    /// skip generation.
    pub write_dependencies: bool,
    /// Like `write_dependencies`, in `import file:<path>` format.
    pub write_dependencies_inline: bool,
}

impl CompilerArgs {
    fn header_file_name(&self) -> String {
        match self.output_header {
            Some(ref path) => path.clone(),
            None => format!("{}_gen.h", strip_idl_extension(&self.input_file)),
        }
    }

    fn source_file_name(&self) -> String {
        match self.output_source {
            Some(ref path) => path.clone(),
            None => format!("{}_gen.cpp", strip_idl_extension(&self.input_file)),
        }
    }
}

fn strip_idl_extension(path: &str) -> &str {
    if path.ends_with(".idl") {
        &path[..path.len() - 4]
    } else {
        path
    }
}

fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut buf = String::new();
    let mut file = File::open(path)?;
    file.read_to_string(&mut buf)?;
    Ok(buf)
}

// Writers are cached per path so that the header and source
// generators may interleave onto the same stream if asked to.
struct FileWriterProvider {
    files: HashMap<PathBuf, Rc<RefCell<io::Write>>>,
}

impl FileWriterProvider {
    fn new() -> Self {
        FileWriterProvider {
            files: Default::default(),
        }
    }

    fn writer_with_name(&mut self, name: &str) -> Result<Rc<RefCell<io::Write>>> {
        let path = PathBuf::from(name);

        if let Some(rc) = self.files.get(&path) {
            return Ok(rc.clone())
        }

        let file = File::create(&path)?;
        let rc: Rc<RefCell<io::Write>> = Rc::new(RefCell::new(file));

        self.files.insert(path, rc.clone());

        Ok(rc)
    }
}

/// Compiles one document. Returns `Ok(true)` on success, `Ok(false)`
/// when the document had diagnostics (already written to
/// `diagnostics`), and `Err` for I/O failures.
pub fn compile(args: &CompilerArgs, diagnostics: &mut io::Write) -> Result<bool> {
    // the provider moves into the closure; the writer seam is a
    // 'static trait object
    let mut provider = FileWriterProvider::new();
    let mut wp = move |name: &str| provider.writer_with_name(name);

    compile_with_writers(args, diagnostics, &mut wp)
}

/// The testable core of `compile`: output streams come from `wp`
/// instead of the filesystem.
pub fn compile_with_writers(
    args: &CompilerArgs,
    diagnostics: &mut io::Write,
    wp: &mut WriterProvider,
) -> Result<bool> {
    let source = read_file(&args.input_file)?;

    let mut directories: Vec<PathBuf> = args
        .import_directories
        .iter()
        .map(PathBuf::from)
        .collect();

    // the input's own directory resolves sibling imports
    if let Some(parent) = Path::new(&args.input_file).parent() {
        directories.push(parent.to_path_buf());
    }

    let resolver = FileImportResolver::new(directories);

    let spec = match parser::parse(&args.input_file, &source, &resolver) {
        Ok(spec) => spec,
        Err(errors) => {
            errors.dump(diagnostics)?;
            return Ok(false);
        },
    };

    if args.write_dependencies || args.write_dependencies_inline {
        write_dependency_manifest(args, &spec)?;
        return Ok(true);
    }

    let bound = match binder::bind(&spec) {
        Ok(bound) => bound,
        Err(errors) => {
            errors.dump(diagnostics)?;
            return Ok(false);
        },
    };

    let params = CodegenParams {
        input_file: args.input_file.clone(),
        header_file_name: args.header_file_name(),
        source_file_name: args.source_file_name(),
        output_base_dir: args.output_base_dir.clone(),
        target_arch: args.target_arch.clone(),
    };

    generator::generate(&bound, &params, wp)?;

    Ok(true)
}

fn write_dependency_manifest(args: &CompilerArgs, spec: &::syntax::Spec) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(ref imports) = spec.imports {
        for path in &imports.dependencies {
            if args.write_dependencies_inline {
                writeln!(out, "import file:{}", path)?;
            } else {
                writeln!(out, "{}", path)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_derive_from_the_input() {
        let args = CompilerArgs {
            input_file: "src/mongo/db/commands.idl".to_owned(),
            ..Default::default()
        };

        assert_eq!(args.header_file_name(), "src/mongo/db/commands_gen.h");
        assert_eq!(args.source_file_name(), "src/mongo/db/commands_gen.cpp");
    }

    #[test]
    fn explicit_output_paths_win() {
        let args = CompilerArgs {
            input_file: "a.idl".to_owned(),
            output_header: Some("out/a.h".to_owned()),
            output_source: Some("out/a.cpp".to_owned()),
            ..Default::default()
        };

        assert_eq!(args.header_file_name(), "out/a.h");
        assert_eq!(args.source_file_name(), "out/a.cpp");
    }
}
