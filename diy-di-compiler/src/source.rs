//! Declarations read from Rust sources. [SourceDeclarations] scans parsed files for the same
//! markers the runtime macros process: `#[derive(Injectable)]` structs, `#[injectable]` impl
//! blocks, manual `Inject` implementations, `#[binds]` modules and `#[component]` traits.

use crate::declaration::{BindFunction, BindModule, ComponentDeclaration, EntryPoint, TypeName};
use crate::error::CompileError;
use crate::module_scope::ModuleScope;
use diy_di::declaration::{single_constructor, Declarations};
use diy_di::error::DeclarationError;
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use quote::quote;
use std::fs;
use std::path::{Path as FilePath, PathBuf};
use syn::{
    Attribute, Expr, ExprLit, Fields, FnArg, ImplItem, Item, ItemImpl, ItemStruct, ItemTrait,
    Lit, LitStr, Path, ReturnType, Token, TraitItem, Type,
};
use tracing::{debug, info};

const DERIVE: &str = "derive";
const INJECTABLE_DERIVE: &str = "Injectable";
const INJECTABLE: &str = "injectable";
const INJECT: &str = "inject";
const BINDS: &str = "binds";
const COMPONENT: &str = "component";

/// Component found in sources, with modules referenced by name.
#[derive(Clone, Debug)]
struct ComponentSource {
    name: String,
    entry_points: Vec<EntryPoint<TypeName>>,
    modules: Vec<TypeName>,
}

fn has_marker(attributes: &[Attribute], marker: &str) -> bool {
    attributes.iter().any(|attribute| {
        attribute
            .path()
            .segments
            .last()
            .map_or(false, |segment| segment.ident == marker)
    })
}

fn derives_injectable(attributes: &[Attribute]) -> syn::Result<bool> {
    let mut found = false;
    for attribute in attributes {
        if attribute.path().is_ident(DERIVE) {
            attribute.parse_nested_meta(|meta| {
                if meta
                    .path
                    .segments
                    .last()
                    .map_or(false, |segment| segment.ident == INJECTABLE_DERIVE)
                {
                    found = true;
                }

                Ok(())
            })?;
        }
    }

    Ok(found)
}

fn is_singleton_struct(attributes: &[Attribute]) -> syn::Result<bool> {
    let mut is_singleton = false;
    for attribute in attributes {
        if attribute.path().is_ident(INJECT) {
            attribute.parse_nested_meta(|meta| {
                if meta.path.is_ident("singleton") {
                    is_singleton = true;
                }

                Ok(())
            })?;
        }
    }

    Ok(is_singleton)
}

fn is_default_field(attributes: &[Attribute]) -> syn::Result<bool> {
    let mut is_default = false;
    for attribute in attributes {
        if attribute.path().is_ident(INJECT) {
            attribute.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    if meta.input.peek(Token![=]) {
                        let _: LitStr = meta.value()?.parse()?;
                    }

                    is_default = true;
                }

                Ok(())
            })?;
        }
    }

    Ok(is_default)
}

fn injectable_impl_is_singleton(attribute: &Attribute) -> syn::Result<bool> {
    let mut is_singleton = false;
    if matches!(attribute.meta, syn::Meta::List(_)) {
        attribute.parse_nested_meta(|meta| {
            if meta.path.is_ident("singleton") {
                is_singleton = true;
            }

            Ok(())
        })?;
    }

    Ok(is_singleton)
}

fn component_modules(attribute: &Attribute) -> syn::Result<Vec<Path>> {
    let mut modules = vec![];
    if matches!(attribute.meta, syn::Meta::List(_)) {
        attribute.parse_nested_meta(|meta| {
            if meta.path.is_ident("modules") {
                meta.parse_nested_meta(|module| {
                    modules.push(module.path);
                    Ok(())
                })?;
            }

            Ok(())
        })?;
    }

    Ok(modules)
}

fn return_instance(
    scope: &ModuleScope,
    output: &ReturnType,
    ty_name: &str,
) -> Result<TypeName, CompileError> {
    match output {
        ReturnType::Type(_, ty) => scope.instance_name(ty),
        ReturnType::Default => Err(CompileError::InvalidTypeName(format!("{ty_name} -> ()"))),
    }
}

/// Declarations scanned from Rust sources. Each scanned file needs the module path it is
/// reachable at from the generated code (e.g. `crate::coffee`). All found types are named by
/// their paths from the crate root, so types sharing a name in different modules stay distinct.
#[derive(Default)]
pub struct SourceDeclarations {
    constructors: FxHashMap<TypeName, Vec<Vec<TypeName>>>,
    empty_injectables: FxHashSet<TypeName>,
    singletons: FxHashSet<TypeName>,
    modules: FxHashMap<TypeName, BindModule<TypeName>>,
    components: Vec<ComponentSource>,
}

impl SourceDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and scans given file.
    pub fn add_file<P: AsRef<FilePath>>(
        &mut self,
        path: P,
        module_path: &str,
    ) -> Result<(), CompileError> {
        let path = path.as_ref();
        info!(path = %path.display(), module_path, "Scanning source file.");

        let source = fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.add_source_with_path(&source, module_path, path.to_path_buf())
    }

    /// Parses and scans given source text.
    pub fn add_source(&mut self, source: &str, module_path: &str) -> Result<(), CompileError> {
        self.add_source_with_path(source, module_path, PathBuf::from("<source>"))
    }

    fn add_source_with_path(
        &mut self,
        source: &str,
        module_path: &str,
        path: PathBuf,
    ) -> Result<(), CompileError> {
        let parse_error = |source: syn::Error| CompileError::Parse {
            path: path.clone(),
            source,
        };

        let file = syn::parse_file(source).map_err(parse_error)?;
        let module_path = syn::parse_str::<Path>(module_path).map_err(parse_error)?;

        let scope = ModuleScope::new(module_path, &file.items);
        self.add_items(&file.items, &scope)
            .map_err(|error| match error {
                ScanError::Syntax(source) => parse_error(source),
                ScanError::Compile(error) => error,
            })
    }

    fn add_items(&mut self, items: &[Item], scope: &ModuleScope) -> Result<(), ScanError> {
        for item in items {
            match item {
                Item::Struct(item) => self.add_struct(item, scope)?,
                Item::Trait(item) => self.add_trait(item, scope)?,
                Item::Impl(item) => self.add_impl(item, scope)?,
                Item::Mod(item) => {
                    if let Some((_, items)) = &item.content {
                        self.add_items(items, &scope.child(&item.ident, items))?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn add_constructor(&mut self, ty: TypeName, parameters: Vec<TypeName>, is_singleton: bool) {
        debug!(%ty, is_singleton, "Found injectable constructor.");

        if is_singleton {
            self.singletons.insert(ty.clone());
        }

        self.constructors.entry(ty).or_default().push(parameters);
    }

    fn add_struct(&mut self, item: &ItemStruct, scope: &ModuleScope) -> Result<(), ScanError> {
        if !derives_injectable(&item.attrs)? {
            return Ok(());
        }

        let fields = match &item.fields {
            Fields::Named(fields) => fields.named.iter().collect_vec(),
            Fields::Unnamed(fields) => fields.unnamed.iter().collect_vec(),
            Fields::Unit => vec![],
        };

        let mut parameters = vec![];
        for field in fields {
            if !is_default_field(&field.attrs)? {
                parameters.push(scope.instance_name(&field.ty)?);
            }
        }

        self.add_constructor(
            scope.item_name(&item.ident)?,
            parameters,
            is_singleton_struct(&item.attrs)?,
        );

        Ok(())
    }

    fn add_impl(&mut self, item: &ItemImpl, scope: &ModuleScope) -> Result<(), ScanError> {
        if let Some((_, path, _)) = &item.trait_ {
            if path
                .segments
                .last()
                .map_or(false, |segment| segment.ident == "Inject")
            {
                self.add_manual_inject(scope.type_name(&item.self_ty)?, item, scope)?;
            }

            return Ok(());
        }

        if let Some(attribute) = item
            .attrs
            .iter()
            .find(|attribute| attribute.path().is_ident(INJECTABLE))
        {
            let is_singleton = injectable_impl_is_singleton(attribute)?;
            self.add_injectable_impl(scope.type_name(&item.self_ty)?, item, scope, is_singleton)?;
        } else if has_marker(&item.attrs, BINDS) {
            self.add_binds(scope.type_name(&item.self_ty)?, item, scope)?;
        }

        Ok(())
    }

    fn add_manual_inject(
        &mut self,
        ty: TypeName,
        item: &ItemImpl,
        scope: &ModuleScope,
    ) -> Result<(), ScanError> {
        let mut parameters = vec![];
        let mut is_singleton = false;

        for impl_item in &item.items {
            match impl_item {
                ImplItem::Type(parameters_type) if parameters_type.ident == "Parameters" => {
                    parameters = match &parameters_type.ty {
                        Type::Tuple(tuple) => tuple
                            .elems
                            .iter()
                            .map(|ty| scope.instance_name(ty))
                            .try_collect()?,
                        other => return Err(CompileError::InvalidTypeName(quote!(#other).to_string()).into()),
                    };
                }
                ImplItem::Const(constant) if constant.ident == "SINGLETON" => {
                    is_singleton = matches!(
                        &constant.expr,
                        Expr::Lit(ExprLit {
                            lit: Lit::Bool(value),
                            ..
                        }) if value.value
                    );
                }
                _ => {}
            }
        }

        self.add_constructor(ty, parameters, is_singleton);
        Ok(())
    }

    fn add_injectable_impl(
        &mut self,
        ty: TypeName,
        item: &ItemImpl,
        scope: &ModuleScope,
        is_singleton: bool,
    ) -> Result<(), ScanError> {
        let constructors = item
            .items
            .iter()
            .filter_map(|item| match item {
                ImplItem::Fn(function) if has_marker(&function.attrs, INJECT) => Some(function),
                _ => None,
            })
            .collect_vec();

        if constructors.is_empty() {
            self.empty_injectables.insert(ty);
            return Ok(());
        }

        for constructor in constructors {
            let parameters: Vec<_> = constructor
                .sig
                .inputs
                .iter()
                .map(|input| match input {
                    FnArg::Typed(argument) => scope.instance_name(&argument.ty),
                    FnArg::Receiver(_) => Err(CompileError::InvalidTypeName("self".to_string())),
                })
                .try_collect()?;

            self.add_constructor(ty.clone(), parameters, is_singleton);
        }

        Ok(())
    }

    fn add_binds(
        &mut self,
        ty: TypeName,
        item: &ItemImpl,
        scope: &ModuleScope,
    ) -> Result<(), ScanError> {
        let mut binds = vec![];
        for impl_item in &item.items {
            let ImplItem::Fn(function) = impl_item else {
                continue;
            };

            let name = function.sig.ident.to_string();
            let parameters: Vec<_> = function
                .sig
                .inputs
                .iter()
                .map(|input| match input {
                    FnArg::Typed(argument) => scope.instance_name(&argument.ty),
                    FnArg::Receiver(_) => Ok(TypeName::new("Self")),
                })
                .try_collect()?;

            binds.push(BindFunction {
                requested: return_instance(scope, &function.sig.output, &name)?,
                name,
                parameters,
            });
        }

        debug!(module = %ty, count = binds.len(), "Found bind module.");

        self.modules.insert(
            ty.clone(),
            BindModule {
                name: ty.to_string(),
                binds,
            },
        );

        Ok(())
    }

    fn add_trait(&mut self, item: &ItemTrait, scope: &ModuleScope) -> Result<(), ScanError> {
        let Some(attribute) = item
            .attrs
            .iter()
            .find(|attribute| attribute.path().is_ident(COMPONENT))
        else {
            return Ok(());
        };

        let modules: Vec<_> = component_modules(attribute)?
            .iter()
            .map(|module| scope.path_name(module))
            .try_collect()?;

        let entry_points: Vec<_> = item
            .items
            .iter()
            .filter_map(|item| match item {
                TraitItem::Fn(function) => Some(function),
                _ => None,
            })
            .map(|function| {
                let name = function.sig.ident.to_string();
                return_instance(scope, &function.sig.output, &name)
                    .map(|ty| EntryPoint { name, ty })
            })
            .try_collect()?;

        debug!(component = %item.ident, "Found component.");

        self.components.push(ComponentSource {
            name: scope.item_name(&item.ident)?.to_string(),
            entry_points,
            modules,
        });

        Ok(())
    }

    /// Returns all found components, in discovery order.
    pub fn components(&self) -> Result<Vec<ComponentDeclaration<TypeName>>, CompileError> {
        self.components
            .iter()
            .map(|component| -> Result<_, CompileError> {
                let modules: Vec<_> = component
                    .modules
                    .iter()
                    .map(|module| {
                        self.modules
                            .get(module)
                            .cloned()
                            .ok_or_else(|| CompileError::UnresolvedType {
                                type_name: module.to_string(),
                                required_by: format!("component '{}'", component.name),
                            })
                    })
                    .try_collect()?;

                Ok(ComponentDeclaration {
                    name: component.name.clone(),
                    entry_points: component.entry_points.clone(),
                    modules,
                })
            })
            .try_collect()
    }
}

impl Declarations<TypeName> for SourceDeclarations {
    fn injectable_constructor(
        &self,
        ty: &TypeName,
    ) -> Result<Option<Vec<TypeName>>, DeclarationError> {
        match self.constructors.get(ty) {
            Some(constructors) => single_constructor(ty, constructors.clone()),
            None if self.empty_injectables.contains(ty) => Err(
                DeclarationError::MissingInjectableConstructor(ty.to_string()),
            ),
            None => Ok(None),
        }
    }

    fn is_singleton(&self, ty: &TypeName) -> bool {
        self.singletons.contains(ty)
    }
}

/// Errors while scanning items - syntax errors get the file path attached later.
enum ScanError {
    Syntax(syn::Error),
    Compile(CompileError),
}

impl From<syn::Error> for ScanError {
    fn from(value: syn::Error) -> Self {
        Self::Syntax(value)
    }
}

impl From<CompileError> for ScanError {
    fn from(value: CompileError) -> Self {
        Self::Compile(value)
    }
}
