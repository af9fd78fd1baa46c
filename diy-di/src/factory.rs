//! Per-type factories. Each injectable type registered by the derive macros also gets an
//! [InjectFactory], which constructs the type directly from its [Inject] implementation without
//! going through type-erased constructor metadata. Factories resolve their parameters through any
//! [InstanceResolver], so they compose with the [ObjectGraph](crate::object_graph::ObjectGraph)
//! (via [FactoryModule]) as well as with custom contexts.

use crate::error::ResolutionError;
use crate::factory::internal::FactoryRegisterer;
use crate::inject::{Inject, Parameters};
use crate::instance_provider::{
    erase, InstanceAnyPtr, InstanceCell, InstancePtr, InstanceResolver, TypeKey,
};
use crate::module::Module;
use crate::provider::{provider_ptr, Provider, ProviderPtr};
use derivative::Derivative;
use fxhash::FxHashMap;
use tracing::debug;

/// Factory for a single injectable type. Singleton-scoped types are constructed at most once per
/// factory instance.
pub struct InjectFactory<T> {
    instance: InstanceCell<InstancePtr<T>>,
}

impl<T: Inject> InjectFactory<T> {
    pub fn new() -> Self {
        Self {
            instance: InstanceCell::new(),
        }
    }

    /// Returns an instance of `T`, resolving constructor parameters from given context.
    pub fn create(
        &self,
        resolver: &mut dyn InstanceResolver,
    ) -> Result<InstancePtr<T>, ResolutionError> {
        if T::SINGLETON {
            self.instance
                .get_or_try_init(|| Self::construct(resolver))
                .cloned()
        } else {
            Self::construct(resolver)
        }
    }

    fn construct(resolver: &mut dyn InstanceResolver) -> Result<InstancePtr<T>, ResolutionError> {
        T::Parameters::resolve(resolver).map(|parameters| InstancePtr::new(T::inject(parameters)))
    }
}

impl<T: Inject> Default for InjectFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Inject> Provider for InjectFactory<T> {
    fn get(&self, resolver: &mut dyn InstanceResolver) -> Result<InstanceAnyPtr, ResolutionError> {
        self.create(resolver).map(erase)
    }
}

/// Statically registered factory of a single type.
#[derive(Derivative, Clone, Copy)]
#[derivative(Debug)]
pub struct FactoryDefinition {
    pub target: TypeKey,

    /// Creates a new, independent factory.
    #[derivative(Debug = "ignore")]
    pub create: fn() -> ProviderPtr,
}

impl FactoryDefinition {
    pub fn of<T: Inject>() -> Self {
        Self {
            target: TypeKey::of::<T>(),
            create: || provider_ptr(InjectFactory::<T>::new()),
        }
    }
}

/// Module serving all statically registered per-type factories. Every lookup creates a new
/// factory, so each resolution context owns its singletons.
#[derive(Clone, Debug, Default)]
pub struct FactoryModule {
    definitions: FxHashMap<TypeKey, FactoryDefinition>,
}

impl FactoryModule {
    /// Creates a module with all factories registered by [Injectable](crate::Injectable),
    /// [injectable](crate::injectable) and [register_injectable](crate::register_injectable).
    pub fn new() -> Self {
        let mut module = Self::default();
        for registerer in inventory::iter::<FactoryRegisterer> {
            module.register((registerer.register)());
        }

        debug!(
            count = module.definitions.len(),
            "Collected statically registered factories."
        );

        module
    }

    pub fn register(&mut self, definition: FactoryDefinition) {
        self.definitions.insert(definition.target, definition);
    }
}

impl Module for FactoryModule {
    fn provider(&self, ty: TypeKey) -> Option<ProviderPtr> {
        self.definitions
            .get(&ty)
            .map(|definition| (definition.create)())
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::factory::FactoryDefinition;
    use inventory::collect;

    pub struct FactoryRegisterer {
        pub register: fn() -> FactoryDefinition,
    }

    collect!(FactoryRegisterer);
}

#[cfg(test)]
mod tests {
    use crate::factory::{FactoryDefinition, FactoryModule, InjectFactory};
    use crate::inject::Inject;
    use crate::instance_provider::{
        downcast, erase, InstancePtr, MockInstanceResolver, TypeKey,
    };
    use crate::module::Module;
    use mockall::predicate::*;

    struct Water;

    impl Inject for Water {
        type Parameters = ();

        const SINGLETON: bool = true;

        fn inject(_parameters: Self::Parameters) -> Self {
            Water
        }
    }

    struct Cup {
        water: InstancePtr<Water>,
    }

    impl Inject for Cup {
        type Parameters = (InstancePtr<Water>,);

        fn inject((water,): Self::Parameters) -> Self {
            Self { water }
        }
    }

    #[test]
    fn should_resolve_parameters_from_context() {
        let water = InstancePtr::new(Water);
        let shared = water.clone();

        let mut resolver = MockInstanceResolver::new();
        resolver
            .expect_resolve()
            .with(eq(TypeKey::of::<Water>()))
            .times(2)
            .returning(move |_| Ok(erase(shared.clone())));

        let factory = InjectFactory::<Cup>::new();
        let first = factory.create(&mut resolver).unwrap();
        let second = factory.create(&mut resolver).unwrap();

        assert!(!InstancePtr::ptr_eq(&first, &second));
        assert!(InstancePtr::ptr_eq(&first.water, &water));
    }

    #[test]
    fn should_memoize_singletons_per_factory() {
        let mut resolver = MockInstanceResolver::new();

        let factory = InjectFactory::<Water>::new();
        let first = factory.create(&mut resolver).unwrap();
        let second = factory.create(&mut resolver).unwrap();
        assert!(InstancePtr::ptr_eq(&first, &second));

        let other = InjectFactory::<Water>::new().create(&mut resolver).unwrap();
        assert!(!InstancePtr::ptr_eq(&first, &other));
    }

    #[test]
    fn should_create_fresh_factories() {
        let mut module = FactoryModule::default();
        module.register(FactoryDefinition::of::<Water>());

        assert!(module.provider(TypeKey::of::<Cup>()).is_none());

        let mut resolver = MockInstanceResolver::new();
        let first = module
            .provider(TypeKey::of::<Water>())
            .unwrap()
            .get(&mut resolver)
            .unwrap();
        let second = module
            .provider(TypeKey::of::<Water>())
            .unwrap()
            .get(&mut resolver)
            .unwrap();

        assert!(!InstancePtr::ptr_eq(
            &downcast::<Water>(&first).unwrap(),
            &downcast::<Water>(&second).unwrap()
        ));
    }
}
