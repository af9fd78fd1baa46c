use crate::instance_provider::TypeKey;
use thiserror::Error;

/// Errors in declarations of injectable types and bind modules. Shared by the runtime resolver
/// and the static graph compiler, since both read the same declarations.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum DeclarationError {
    #[error("Type '{0}' has no constructor marked as injectable.")]
    MissingInjectableConstructor(String),
    #[error("Type '{type_name}' has {count} constructors marked as injectable, but at most one is allowed.")]
    AmbiguousInjectableConstructor { type_name: String, count: usize },
    #[error("Bind function '{function}' in module '{module}' should have exactly one parameter, but has {count}.")]
    MalformedBindFunction {
        module: String,
        function: String,
        count: usize,
    },
}

/// Errors related to resolving instances from a resolution context.
#[derive(Error, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ResolutionError {
    #[error("Cannot resolve type '{0}' - neither an explicit binding nor an injectable constructor exists.")]
    UnresolvedType(TypeKey),
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
    #[error("Detected dependency cycle while resolving '{0}'.")]
    DependencyCycle(TypeKey),
    #[error("Provider for '{0}' returned an instance of an incompatible type.")]
    IncompatibleInstance(TypeKey),
    #[error("Constructor of '{target}' received too few arguments - missing '{parameter}'.")]
    MissingArgument { target: TypeKey, parameter: TypeKey },
}
