//! Declarations of components and bind modules, along with the textual type names identifying
//! types in parsed sources.

use crate::error::CompileError;
use convert_case::{Case, Casing};
use itertools::Itertools;
use quote::ToTokens;
use std::fmt::{Display, Formatter};
use syn::{GenericArgument, Path, PathArguments, Type, TypeParamBound};

const INSTANCE_POINTERS: [&str; 3] = ["InstancePtr", "Arc", "Rc"];
const AUTO_TRAITS: [&str; 2] = ["Send", "Sync"];

/// Canonical name of a type found in sources. Names are rendered from already resolved types, so
/// paths are kept whole and two types with the same name in different modules stay distinct.
/// Trait objects list their principal trait first and auto traits sorted after it, so
/// `dyn Heater + Sync + Send` and `dyn Heater + Send + Sync` name the same type.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the canonical name of given type.
    pub fn of_type(ty: &Type) -> Result<Self, CompileError> {
        canonical_type(ty).map(Self)
    }

    /// Creates the canonical name of the type held by given instance pointer type, e.g. `T` for
    /// `InstancePtr<T>`.
    pub fn of_instance(ty: &Type) -> Result<Self, CompileError> {
        Self::of_type(instance_type(ty)?)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name usable as a part of a snake case identifier. Module paths are skipped.
    pub fn snake_name(&self) -> String {
        self.0
            .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
            .filter_map(|part| part.rsplit("::").next())
            .filter(|part| !part.is_empty())
            .join(" ")
            .to_case(Case::Snake)
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Returns the type held by given instance pointer type, e.g. `T` for `InstancePtr<T>`.
pub fn instance_type(ty: &Type) -> Result<&Type, CompileError> {
    let invalid = || CompileError::InvalidTypeName(ty.to_token_stream().to_string());

    let Type::Path(path) = ty else {
        return Err(invalid());
    };

    let segment = path.path.segments.last().ok_or_else(invalid)?;
    if !INSTANCE_POINTERS.contains(&segment.ident.to_string().as_str()) {
        return Err(invalid());
    }

    match &segment.arguments {
        PathArguments::AngleBracketed(arguments) if arguments.args.len() == 1 => {
            match arguments.args.first() {
                Some(GenericArgument::Type(inner)) => Ok(inner),
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

fn canonical_path(path: &Path) -> Result<String, CompileError> {
    let segments: Vec<_> = path
        .segments
        .iter()
        .map(|segment| -> Result<String, CompileError> {
            let arguments = match &segment.arguments {
                PathArguments::None => String::new(),
                PathArguments::AngleBracketed(arguments) => {
                    let arguments: Vec<_> = arguments
                        .args
                        .iter()
                        .map(|argument| match argument {
                            GenericArgument::Type(ty) => canonical_type(ty),
                            other => Ok(other.to_token_stream().to_string().replace(' ', "")),
                        })
                        .try_collect()?;

                    format!("<{}>", arguments.join(", "))
                }
                PathArguments::Parenthesized(_) => {
                    return Err(CompileError::InvalidTypeName(
                        path.to_token_stream().to_string(),
                    ))
                }
            };

            Ok(format!("{}{arguments}", segment.ident))
        })
        .try_collect()?;

    if segments.is_empty() {
        return Err(CompileError::InvalidTypeName(
            path.to_token_stream().to_string(),
        ));
    }

    let prefix = if path.leading_colon.is_some() { "::" } else { "" };
    Ok(format!("{prefix}{}", segments.join("::")))
}

fn auto_trait(path: &Path) -> Option<&'static str> {
    let name = path.segments.last()?.ident.to_string();
    AUTO_TRAITS.into_iter().find(|auto_trait| *auto_trait == name)
}

fn canonical_type(ty: &Type) -> Result<String, CompileError> {
    match ty {
        Type::Path(path) if path.qself.is_none() => canonical_path(&path.path),
        Type::TraitObject(object) => {
            let paths = object.bounds.iter().filter_map(|bound| match bound {
                TypeParamBound::Trait(bound) => Some(&bound.path),
                _ => None,
            });

            let mut principal = vec![];
            let mut auto_traits = vec![];
            for path in paths {
                match auto_trait(path) {
                    Some(auto_trait) => auto_traits.push(auto_trait.to_string()),
                    None => principal.push(canonical_path(path)?),
                }
            }

            if principal.is_empty() {
                return Err(CompileError::InvalidTypeName(
                    ty.to_token_stream().to_string(),
                ));
            }

            let bounds = principal
                .into_iter()
                .chain(auto_traits.into_iter().sorted().dedup())
                .join(" + ");

            Ok(format!("dyn {bounds}"))
        }
        Type::Paren(inner) => canonical_type(&inner.elem),
        Type::Group(inner) => canonical_type(&inner.elem),
        _ => Err(CompileError::InvalidTypeName(
            ty.to_token_stream().to_string(),
        )),
    }
}

/// Exposed accessor of a component, returning an instance of the requested type.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct EntryPoint<K> {
    pub name: String,
    pub ty: K,
}

/// Function of a bind module, mapping its single parameter to the requested supertype.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BindFunction<K> {
    pub name: String,
    pub requested: K,
    pub parameters: Vec<K>,
}

/// Named set of bind functions.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BindModule<K> {
    pub name: String,
    pub binds: Vec<BindFunction<K>>,
}

/// A component to compile - its entry points and bind modules, in declared order. Earlier
/// modules take precedence over later ones.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ComponentDeclaration<K> {
    pub name: String,
    pub entry_points: Vec<EntryPoint<K>>,
    pub modules: Vec<BindModule<K>>,
}
