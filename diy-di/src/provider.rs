//! [Provider]s are units of construction - each returns instances of exactly one type, when given
//! a resolution context. A provider either constructs a new instance on each call, or is wrapped in
//! a [SingletonProvider], which constructs an instance at most once and reuses it later.
//!
//! Note: singleton memoization is tied to the provider instance. Providers derived by an
//! [ObjectGraph](crate::object_graph::ObjectGraph) are private to it, so two graphs never share
//! singletons, but a singleton provider explicitly installed in a module shared by multiple graphs
//! will be shared as well.

use crate::constructor_registry::InjectableConstructor;
use crate::error::ResolutionError;
use crate::inject::Arguments;
use crate::instance_provider::{
    erase, Instance, InstanceAnyPtr, InstanceCell, InstancePtr, InstanceResolver,
    TypedInstanceResolver,
};
use itertools::Itertools;
use std::marker::PhantomData;
use tracing::trace;

#[cfg(not(feature = "threadsafe"))]
pub type ProviderPtr = InstancePtr<dyn Provider>;
#[cfg(feature = "threadsafe")]
pub type ProviderPtr = InstancePtr<dyn Provider + Send + Sync>;

/// Unit of construction for a single type. The returned type-erased instance always wraps an
/// [InstancePtr] of the type this provider was installed for.
pub trait Provider {
    fn get(&self, resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError>;
}

/// Wraps given provider in a shareable pointer.
#[inline]
pub fn provider_ptr<P: Provider + Instance>(provider: P) -> ProviderPtr {
    InstancePtr::new(provider) as ProviderPtr
}

/// Wraps given provider, so it constructs its instance at most once.
#[inline]
pub fn singleton<P: Provider>(provider: P) -> SingletonProvider<P> {
    SingletonProvider::new(provider)
}

/// Provider calling a typed factory function on each request.
pub struct FnProvider<T: ?Sized, F> {
    factory: F,
    _instance: PhantomData<fn() -> InstancePtr<T>>,
}

impl<T, F> FnProvider<T, F>
where
    T: Instance + ?Sized,
    F: Fn(&mut dyn InstanceResolver) -> Result<InstancePtr<T>, ResolutionError>,
{
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _instance: PhantomData,
        }
    }
}

impl<T, F> Provider for FnProvider<T, F>
where
    T: Instance + ?Sized,
    F: Fn(&mut dyn InstanceResolver) -> Result<InstancePtr<T>, ResolutionError>,
{
    fn get(&self, resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError> {
        (self.factory)(resolver).map(erase)
    }
}

/// Provider always returning the same, already existing instance.
pub struct InstanceProvider {
    instance: InstanceAnyPtr,
}

impl InstanceProvider {
    pub fn new<T: Instance + ?Sized>(instance: InstancePtr<T>) -> Self {
        Self {
            instance: erase(instance),
        }
    }
}

impl Provider for InstanceProvider {
    fn get(&self, _resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError> {
        Ok(self.instance.clone())
    }
}

/// Memoizing wrapper - the inner provider is called at most once, unless it fails. Failed
/// construction leaves the wrapper empty, so the next request tries again.
pub struct SingletonProvider<P> {
    inner: P,
    instance: InstanceCell<InstanceAnyPtr>,
}

impl<P> SingletonProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            instance: InstanceCell::new(),
        }
    }
}

impl<P: Provider> Provider for SingletonProvider<P> {
    fn get(&self, resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError> {
        self.instance
            .get_or_try_init(|| self.inner.get(resolver))
            .cloned()
    }
}

/// Provider for a requested supertype, which resolves the provided type from the context and
/// upcasts it.
pub struct BindProvider<R: ?Sized, P: ?Sized> {
    upcast: fn(InstancePtr<P>) -> InstancePtr<R>,
}

impl<R: ?Sized, P: ?Sized> BindProvider<R, P> {
    pub fn new(upcast: fn(InstancePtr<P>) -> InstancePtr<R>) -> Self {
        Self { upcast }
    }
}

impl<R: Instance + ?Sized, P: Instance + ?Sized> Provider for BindProvider<R, P> {
    fn get(&self, resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError> {
        resolver
            .resolve_typed::<P>()
            .map(|provided| erase((self.upcast)(provided)))
    }
}

/// Provider calling a registered [InjectableConstructor] with parameters resolved from the context.
pub struct ReflectiveProvider {
    constructor: InjectableConstructor,
}

impl ReflectiveProvider {
    pub fn new(constructor: InjectableConstructor) -> Self {
        Self { constructor }
    }
}

impl Provider for ReflectiveProvider {
    fn get(&self, resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError> {
        trace!(target_type = %self.constructor.target, "Resolving constructor parameters.");

        let values: Vec<_> = self
            .constructor
            .parameters
            .iter()
            .map(|parameter| resolver.resolve(*parameter))
            .try_collect()?;

        (self.constructor.construct)(&mut Arguments::new(self.constructor.target, values))
    }
}
