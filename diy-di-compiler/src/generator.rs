//! Entry point for build scripts - scans given sources, compiles all found components and writes
//! the construction units into a single file, which can then be included in the crate:
//!
//! ```no_run
//! use diy_di_compiler::generator::Generator;
//! use std::path::PathBuf;
//!
//! let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
//! Generator::from_environment()
//!     .unwrap()
//!     .with_source("src/lib.rs", "crate")
//!     .generate_to_file(out_dir.join("components.rs"))
//!     .unwrap();
//! ```

use crate::config::CompilerConfig;
use crate::emit::emit;
use crate::error::CompileError;
use crate::graph::GraphCompiler;
use crate::source::SourceDeclarations;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const HEADER: &str = "// Generated by diy-di-compiler. Do not edit.\n";

/// Generator of construction units for all components found in given sources.
pub struct Generator {
    config: CompilerConfig,
    sources: Vec<(PathBuf, String)>,
}

impl Generator {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            sources: vec![],
        }
    }

    /// Creates a generator with configuration read from the environment.
    pub fn from_environment() -> Result<Self, CompileError> {
        Ok(Self::new(CompilerConfig::init_from_environment()?))
    }

    /// Adds a source file, reachable at given module path from the generated code.
    pub fn with_source<P: Into<PathBuf>, M: Into<String>>(mut self, path: P, module_path: M) -> Self {
        self.sources.push((path.into(), module_path.into()));
        self
    }

    /// Paths of all added sources, e.g. for `cargo:rerun-if-changed`.
    pub fn source_paths(&self) -> impl Iterator<Item = &Path> {
        self.sources.iter().map(|(path, _)| path.as_path())
    }

    /// Generates construction units of all components, in discovery order.
    pub fn generate(&self) -> Result<String, CompileError> {
        if self.config.install_tracing_logger {
            // a logger might have already been installed by the host
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .try_init();
        }

        let mut declarations = SourceDeclarations::new();
        for (path, module_path) in &self.sources {
            declarations.add_file(path, module_path)?;
        }

        let compiler = GraphCompiler::new(&declarations);
        let mut output = HEADER.to_string();

        for component in declarations.components()? {
            let graph = compiler.compile(&component)?;
            let unit = emit(&graph, &self.config)?;

            output.push_str(&unit.to_string());
            output.push('\n');
        }

        Ok(output)
    }

    /// Generates construction units and writes them to given file. Nothing is written on error.
    pub fn generate_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CompileError> {
        let output = self.generate()?;
        let path = path.as_ref();

        info!(path = %path.display(), "Writing generated components.");

        fs::write(path, output).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
