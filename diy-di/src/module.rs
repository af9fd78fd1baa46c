//! Binding modules - explicit mappings from requested types to [Provider]s. Modules are consulted
//! by the [ObjectGraph](crate::object_graph::ObjectGraph) before deriving providers from
//! injectable constructors, which makes them the place for binding abstract types to concrete
//! implementations, installing hand-made instances, or overriding defaults in tests.
//!
//! Within a single [BindingModule] the last installed provider for a type wins. When multiple
//! modules are composed (either with [ModuleChain] or [BindingModule::merge]), the *first* module
//! defining a type wins.

use crate::error::ResolutionError;
use crate::instance_provider::{Instance, InstancePtr, InstanceResolver, TypeKey};
use crate::provider::{
    provider_ptr, singleton, BindProvider, FnProvider, InstanceProvider, ProviderPtr,
};
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;
use tracing::warn;

#[cfg(not(feature = "threadsafe"))]
pub type ModulePtr = Box<dyn Module>;
#[cfg(feature = "threadsafe")]
pub type ModulePtr = Box<dyn Module + Send + Sync>;

/// Source of explicit providers.
#[cfg_attr(test, automock)]
pub trait Module {
    /// Returns the provider for the requested type, if this module defines one.
    fn provider(&self, ty: TypeKey) -> Option<ProviderPtr>;
}

/// A set of bind functions, each mapping a provided type to a requested supertype. Usually
/// implemented by the [binds](crate::binds) attribute macro.
pub trait Binds {
    /// Installs all bind functions in the given module.
    fn install(module: &mut BindingModule);
}

/// Module holding explicitly installed providers.
#[derive(Clone, Default)]
pub struct BindingModule {
    providers: FxHashMap<TypeKey, ProviderPtr>,
}

impl BindingModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a module with all bind functions from `B`.
    pub fn from_binds<B: Binds>() -> Self {
        Self::new().with_binds::<B>()
    }

    /// Installs all bind functions from `B`.
    pub fn with_binds<B: Binds>(mut self) -> Self {
        B::install(&mut self);
        self
    }

    /// Installs a provider for given type, replacing any previous one.
    pub fn install_provider(&mut self, ty: TypeKey, provider: ProviderPtr) -> &mut Self {
        if self.providers.insert(ty, provider).is_some() {
            warn!(requested_type = %ty, "Replacing previously installed provider.");
        }

        self
    }

    /// Installs a factory function creating a new instance on each request.
    pub fn install<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Instance + ?Sized,
        F: Fn(&mut dyn InstanceResolver) -> Result<InstancePtr<T>, ResolutionError> + Instance,
    {
        self.install_provider(TypeKey::of::<T>(), provider_ptr(FnProvider::new(factory)))
    }

    /// Installs a factory function, which will be called at most once.
    pub fn install_singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Instance + ?Sized,
        F: Fn(&mut dyn InstanceResolver) -> Result<InstancePtr<T>, ResolutionError> + Instance,
    {
        self.install_provider(
            TypeKey::of::<T>(),
            provider_ptr(singleton(FnProvider::new(factory))),
        )
    }

    /// Installs an already existing instance.
    pub fn install_instance<T: Instance + ?Sized>(&mut self, instance: InstancePtr<T>) -> &mut Self {
        self.install_provider(TypeKey::of::<T>(), provider_ptr(InstanceProvider::new(instance)))
    }

    /// Binds requested type `R` to provided type `P`, so a request for `R` resolves `P` and
    /// upcasts it.
    pub fn bind<R: Instance + ?Sized, P: Instance + ?Sized>(
        &mut self,
        upcast: fn(InstancePtr<P>) -> InstancePtr<R>,
    ) -> &mut Self {
        self.install_provider(TypeKey::of::<R>(), provider_ptr(BindProvider::new(upcast)))
    }

    /// Adds all providers from `other`, which are not already defined in this module.
    pub fn merge(&mut self, other: BindingModule) -> &mut Self {
        for (ty, provider) in other.providers {
            self.providers.entry(ty).or_insert(provider);
        }

        self
    }

    #[inline]
    pub fn contains(&self, ty: TypeKey) -> bool {
        self.providers.contains_key(&ty)
    }
}

impl Module for BindingModule {
    fn provider(&self, ty: TypeKey) -> Option<ProviderPtr> {
        self.providers.get(&ty).cloned()
    }
}

/// Composition of multiple modules, queried in order. The first module defining a type wins.
#[derive(Default)]
pub struct ModuleChain {
    modules: Vec<ModulePtr>,
}

impl ModuleChain {
    pub fn new(modules: Vec<ModulePtr>) -> Self {
        Self { modules }
    }

    /// Adds a module with the lowest priority.
    pub fn push(&mut self, module: ModulePtr) {
        self.modules.push(module);
    }
}

impl Module for ModuleChain {
    fn provider(&self, ty: TypeKey) -> Option<ProviderPtr> {
        self.modules.iter().find_map(|module| module.provider(ty))
    }
}
