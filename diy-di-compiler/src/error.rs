use diy_di::error::DeclarationError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of static graph compilation. No output is produced when any of them occurs.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
    #[error("Type '{type_name}' required by {required_by} has no injectable constructor.")]
    UnresolvedType {
        type_name: String,
        required_by: String,
    },
    #[error("Bind functions form a cycle at type '{0}'.")]
    BindingCycle(String),
    #[error("Detected dependency cycle: {}.", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
    #[error("Cannot use '{0}' as an injected type - expected an instance pointer.")]
    InvalidTypeName(String),
    #[error("Error parsing '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },
    #[error("Error accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
