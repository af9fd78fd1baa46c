//! Name resolution within a single scanned module. Types written in sources are rewritten into
//! paths reachable from the crate root, so they can be compared between files and used from
//! generated code regardless of where they were written.

use crate::declaration::{instance_type, TypeName};
use crate::error::CompileError;
use fxhash::{FxHashMap, FxHashSet};
use syn::punctuated::Punctuated;
use syn::{
    GenericArgument, Ident, Item, Path, PathArguments, PathSegment, Type, TypeParamBound, UseTree,
};

/// Items declared and imported by a single module.
#[derive(Clone)]
pub struct ModuleScope {
    module_path: Path,
    declared: FxHashSet<Ident>,
    imports: FxHashMap<Ident, Path>,
}

impl ModuleScope {
    /// Creates the scope of a module at given path, containing given items.
    pub fn new(module_path: Path, items: &[Item]) -> Self {
        let declared = items
            .iter()
            .filter_map(|item| match item {
                Item::Struct(item) => Some(item.ident.clone()),
                Item::Enum(item) => Some(item.ident.clone()),
                Item::Union(item) => Some(item.ident.clone()),
                Item::Type(item) => Some(item.ident.clone()),
                Item::Trait(item) => Some(item.ident.clone()),
                Item::Mod(item) => Some(item.ident.clone()),
                _ => None,
            })
            .collect();

        let mut scope = Self {
            module_path,
            declared,
            imports: FxHashMap::default(),
        };

        let mut imports = vec![];
        for item in items {
            if let Item::Use(item) = item {
                collect_imports(&item.tree, empty_path(), &mut imports);
            }
        }

        // imports are relative to the module, not to other imports
        let imports = imports
            .into_iter()
            .map(|(alias, path)| (alias, scope.resolve_path(&path)))
            .collect();
        scope.imports = imports;

        scope
    }

    /// Scope of an inline child module.
    pub fn child(&self, ident: &Ident, items: &[Item]) -> Self {
        Self::new(self.item_path(ident), items)
    }

    /// Path of an item declared directly in this module.
    pub fn item_path(&self, ident: &Ident) -> Path {
        let mut path = self.module_path.clone();
        path.segments.push(PathSegment::from(ident.clone()));
        path
    }

    /// Name of an item declared directly in this module.
    pub fn item_name(&self, ident: &Ident) -> Result<TypeName, CompileError> {
        path_type_name(self.item_path(ident))
    }

    /// Resolved name of a written type.
    pub fn type_name(&self, ty: &Type) -> Result<TypeName, CompileError> {
        TypeName::of_type(&self.resolve_type(ty))
    }

    /// Resolved name of the type held by a written instance pointer type.
    pub fn instance_name(&self, ty: &Type) -> Result<TypeName, CompileError> {
        self.type_name(instance_type(ty)?)
    }

    /// Resolved name of a written path, e.g. a bind module reference.
    pub fn path_name(&self, path: &Path) -> Result<TypeName, CompileError> {
        path_type_name(self.resolve_path(path))
    }

    /// Rewrites all paths in given type to be reachable from the crate root. Paths which cannot
    /// be resolved, e.g. from other crates or the prelude, are kept as written.
    pub fn resolve_type(&self, ty: &Type) -> Type {
        let mut ty = ty.clone();
        match &mut ty {
            Type::Path(path) if path.qself.is_none() => path.path = self.resolve_path(&path.path),
            Type::TraitObject(object) => {
                for bound in object.bounds.iter_mut() {
                    if let TypeParamBound::Trait(bound) = bound {
                        bound.path = self.resolve_path(&bound.path);
                    }
                }
            }
            Type::Paren(inner) => *inner.elem = self.resolve_type(&inner.elem),
            Type::Group(inner) => *inner.elem = self.resolve_type(&inner.elem),
            Type::Reference(inner) => *inner.elem = self.resolve_type(&inner.elem),
            Type::Slice(inner) => *inner.elem = self.resolve_type(&inner.elem),
            Type::Array(inner) => *inner.elem = self.resolve_type(&inner.elem),
            Type::Tuple(tuple) => {
                for elem in tuple.elems.iter_mut() {
                    *elem = self.resolve_type(elem);
                }
            }
            _ => {}
        }

        ty
    }

    /// Rewrites given path to be reachable from the crate root.
    pub fn resolve_path(&self, path: &Path) -> Path {
        let mut segments = path.segments.iter().map(|segment| self.resolve_arguments(segment));
        if path.leading_colon.is_some() {
            return Path {
                leading_colon: path.leading_colon,
                segments: segments.collect(),
            };
        }

        let Some(first) = segments.next() else {
            return path.clone();
        };

        let mut resolved = if first.ident == "crate" {
            Path::from(first)
        } else if first.ident == "self" {
            self.module_path.clone()
        } else if first.ident == "super" {
            parent(&self.module_path)
        } else if let Some(import) = self.imports.get(&first.ident) {
            let mut import = import.clone();
            if let Some(last) = import.segments.last_mut() {
                last.arguments = first.arguments;
            }

            import
        } else if self.declared.contains(&first.ident) {
            let mut item = self.module_path.clone();
            item.segments.push(first);
            item
        } else {
            let mut external = Path::from(first);
            external.segments.extend(segments);
            return external;
        };

        for segment in segments {
            if segment.ident == "super" {
                resolved = parent(&resolved);
            } else {
                resolved.segments.push(segment);
            }
        }

        resolved
    }

    fn resolve_arguments(&self, segment: &PathSegment) -> PathSegment {
        let mut segment = segment.clone();
        if let PathArguments::AngleBracketed(arguments) = &mut segment.arguments {
            for argument in arguments.args.iter_mut() {
                if let GenericArgument::Type(ty) = argument {
                    *ty = self.resolve_type(ty);
                }
            }
        }

        segment
    }
}

fn empty_path() -> Path {
    Path {
        leading_colon: None,
        segments: Punctuated::new(),
    }
}

fn parent(path: &Path) -> Path {
    let count = path.segments.len().saturating_sub(1);
    Path {
        leading_colon: path.leading_colon,
        segments: path.segments.iter().take(count).cloned().collect(),
    }
}

fn path_type_name(path: Path) -> Result<TypeName, CompileError> {
    TypeName::of_type(&Type::Path(syn::TypePath { qself: None, path }))
}

fn collect_imports(tree: &UseTree, prefix: Path, imports: &mut Vec<(Ident, Path)>) {
    let with = |ident: &Ident| {
        let mut path = prefix.clone();
        path.segments.push(PathSegment::from(ident.clone()));
        path
    };

    match tree {
        UseTree::Path(tree) => collect_imports(&tree.tree, with(&tree.ident), imports),
        UseTree::Name(tree) if tree.ident == "self" => {
            if let Some(last) = prefix.segments.last() {
                imports.push((last.ident.clone(), prefix.clone()));
            }
        }
        UseTree::Name(tree) => imports.push((tree.ident.clone(), with(&tree.ident))),
        UseTree::Rename(tree) if tree.ident == "self" => {
            imports.push((tree.rename.clone(), prefix.clone()));
        }
        UseTree::Rename(tree) => imports.push((tree.rename.clone(), with(&tree.ident))),
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_imports(tree, prefix.clone(), imports);
            }
        }
        // glob imports cannot be resolved without the imported module
        UseTree::Glob(_) => {}
    }
}
