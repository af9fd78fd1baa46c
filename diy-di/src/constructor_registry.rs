//! Functionality related to registering injectable constructors. The runtime resolver derives
//! providers for types without explicit bindings from these registrations, which can be collected
//! automatically or added manually.

use crate::constructor_registry::internal::ConstructorRegisterer;
use crate::declaration::{single_constructor, Declarations};
use crate::error::{DeclarationError, ResolutionError};
use crate::inject::{Arguments, Inject, Parameters};
use crate::instance_provider::{erase, InstanceAnyPtr, InstancePtr, TypeKey};
use derivative::Derivative;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;
use std::any::TypeId;
use tracing::debug;

/// Type-erased constructor function, receiving already resolved arguments.
pub type ConstructorFunction =
    fn(arguments: &mut Arguments) -> Result<InstanceAnyPtr, ResolutionError>;

/// Registered injectable constructor of a single type.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct InjectableConstructor {
    /// Type created by this constructor.
    pub target: TypeKey,

    /// Types of all parameters, in declared order.
    pub parameters: Vec<TypeKey>,

    /// Should the created instance be memoized per resolution context.
    pub is_singleton: bool,

    #[derivative(Debug = "ignore")]
    pub construct: ConstructorFunction,
}

impl InjectableConstructor {
    /// Creates the constructor definition based on the [Inject] implementation of `T`.
    pub fn of<T: Inject>() -> Self {
        Self {
            target: TypeKey::of::<T>(),
            parameters: T::Parameters::keys(),
            is_singleton: T::SINGLETON,
            construct: construct::<T>,
        }
    }
}

fn construct<T: Inject>(arguments: &mut Arguments) -> Result<InstanceAnyPtr, ResolutionError> {
    T::Parameters::from_arguments(arguments)
        .map(|parameters| erase(InstancePtr::new(T::inject(parameters))))
}

/// A registry of injectable constructors.
#[cfg_attr(test, automock)]
pub trait ConstructorRegistry {
    /// Adds a constructor. Registering another constructor for the same type makes the type
    /// ambiguous.
    fn register(&mut self, constructor: InjectableConstructor);

    /// Returns the single constructor for given type, `None` if there's no constructor, or an
    /// error if there are multiple.
    fn constructor(
        &self,
        ty: TypeKey,
    ) -> Result<Option<InjectableConstructor>, DeclarationError>;
}

impl<R: ConstructorRegistry + ?Sized> Declarations<TypeKey> for R {
    fn injectable_constructor(
        &self,
        ty: &TypeKey,
    ) -> Result<Option<Vec<TypeKey>>, DeclarationError> {
        self.constructor(*ty)
            .map(|constructor| constructor.map(|constructor| constructor.parameters))
    }

    fn is_singleton(&self, ty: &TypeKey) -> bool {
        matches!(self.constructor(*ty), Ok(Some(constructor)) if constructor.is_singleton)
    }
}

/// Registry of injectable constructors initialized from statically registered definitions.
#[derive(Clone, Debug, Default)]
pub struct StaticConstructorRegistry {
    constructors: FxHashMap<TypeId, Vec<InjectableConstructor>>,
}

impl StaticConstructorRegistry {
    /// Creates a registry containing all constructors registered by
    /// [Injectable](crate::Injectable), [injectable](crate::injectable) and
    /// [register_injectable](crate::register_injectable).
    pub fn new() -> Self {
        let mut registry = Self::default();
        for registerer in inventory::iter::<ConstructorRegisterer> {
            registry.register((registerer.register)());
        }

        debug!(
            count = registry.constructors.len(),
            "Collected statically registered constructors."
        );

        registry
    }

    /// Creates an empty registry, for manual registration only.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConstructorRegistry for StaticConstructorRegistry {
    fn register(&mut self, constructor: InjectableConstructor) {
        self.constructors
            .entry(constructor.target.id())
            .or_default()
            .push(constructor);
    }

    fn constructor(
        &self,
        ty: TypeKey,
    ) -> Result<Option<InjectableConstructor>, DeclarationError> {
        single_constructor(
            ty,
            self.constructors.get(&ty.id()).cloned().unwrap_or_default(),
        )
    }
}

#[doc(hidden)]
pub mod internal {
    use crate::constructor_registry::InjectableConstructor;
    use inventory::collect;
    pub use inventory::submit;

    pub struct ConstructorRegisterer {
        pub register: fn() -> InjectableConstructor,
    }

    collect!(ConstructorRegisterer);
}

#[cfg(test)]
mod tests {
    use crate::constructor_registry::{
        ConstructorRegistry, InjectableConstructor, StaticConstructorRegistry,
    };
    use crate::declaration::Declarations;
    use crate::error::DeclarationError;
    use crate::inject::{Arguments, Inject};
    use crate::instance_provider::{downcast, erase, InstancePtr, TypeKey};

    struct Engine;

    impl Inject for Engine {
        type Parameters = ();

        const SINGLETON: bool = true;

        fn inject(_parameters: Self::Parameters) -> Self {
            Engine
        }
    }

    struct Car {
        engine: InstancePtr<Engine>,
    }

    impl Inject for Car {
        type Parameters = (InstancePtr<Engine>,);

        fn inject((engine,): Self::Parameters) -> Self {
            Self { engine }
        }
    }

    #[test]
    fn should_describe_inject_implementation() {
        let constructor = InjectableConstructor::of::<Car>();
        assert_eq!(constructor.target, TypeKey::of::<Car>());
        assert_eq!(constructor.parameters, vec![TypeKey::of::<Engine>()]);
        assert!(!constructor.is_singleton);
        assert!(InjectableConstructor::of::<Engine>().is_singleton);
    }

    #[test]
    fn should_construct_from_arguments() {
        let engine = InstancePtr::new(Engine);
        let constructor = InjectableConstructor::of::<Car>();
        let mut arguments = Arguments::new(constructor.target, vec![erase(engine.clone())]);

        let car = (constructor.construct)(&mut arguments).unwrap();
        let car = downcast::<Car>(&car).unwrap();
        assert!(InstancePtr::ptr_eq(&car.engine, &engine));
    }

    #[test]
    fn should_return_registered_constructor() {
        let mut registry = StaticConstructorRegistry::empty();
        registry.register(InjectableConstructor::of::<Car>());

        assert!(registry.constructor(TypeKey::of::<Car>()).unwrap().is_some());
        assert!(registry.constructor(TypeKey::of::<Engine>()).unwrap().is_none());
        assert_eq!(
            registry
                .injectable_constructor(&TypeKey::of::<Car>())
                .unwrap()
                .unwrap(),
            vec![TypeKey::of::<Engine>()]
        );
    }

    #[test]
    fn should_reject_ambiguous_constructors() {
        let mut registry = StaticConstructorRegistry::empty();
        registry.register(InjectableConstructor::of::<Engine>());
        registry.register(InjectableConstructor::of::<Engine>());

        assert!(matches!(
            registry.constructor(TypeKey::of::<Engine>()).unwrap_err(),
            DeclarationError::AmbiguousInjectableConstructor { count: 2, .. }
        ));
        assert!(!registry.is_singleton(&TypeKey::of::<Engine>()));
    }

    #[test]
    fn should_report_scope() {
        let mut registry = StaticConstructorRegistry::empty();
        registry.register(InjectableConstructor::of::<Engine>());
        registry.register(InjectableConstructor::of::<Car>());

        assert!(registry.is_singleton(&TypeKey::of::<Engine>()));
        assert!(!registry.is_singleton(&TypeKey::of::<Car>()));
    }
}
