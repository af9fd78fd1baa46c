//! Injectable types and their constructors.
//!
//! A type becomes injectable by implementing [Inject], which designates its single injectable
//! constructor. Usually the implementation is generated:
//!
//! ```
//! use diy_di::instance_provider::InstancePtr;
//! use diy_di::{injectable, Injectable};
//! use std::sync::atomic::AtomicBool;
//!
//! #[derive(Injectable)]
//! #[inject(singleton)]
//! struct Logger;
//!
//! #[derive(Injectable)]
//! struct Heater {
//!     // each injected field is a constructor parameter
//!     logger: InstancePtr<Logger>,
//!     // not injected - use Default::default()
//!     #[inject(default)]
//!     is_hot: AtomicBool,
//! }
//!
//! struct Pump {
//!     heater: InstancePtr<Heater>,
//! }
//!
//! // alternatively, mark a single constructor function
//! #[injectable]
//! impl Pump {
//!     #[inject]
//!     fn new(heater: InstancePtr<Heater>) -> Self {
//!         Self { heater }
//!     }
//! }
//! ```
//!
//! ### Supported `#[inject]` struct configuration
//!
//! * `singleton` - memoize the instance per resolution context
//!
//! ### Supported `#[inject]` field configuration
//!
//! * `default` - use `Default::default()` initialization
//! * `default = "expr"` - call `expr()` for initialization
//!
//! ### Supported `#[injectable]` arguments
//!
//! * `singleton` - same as above
//!
//! Manual implementations of [Inject] need to be registered with [register_injectable](crate::register_injectable)
//! to be visible to the runtime resolver.

use crate::error::ResolutionError;
use crate::instance_provider::{
    downcast, Instance, InstanceAnyPtr, InstancePtr, InstanceResolver, TypeKey,
    TypedInstanceResolver,
};

/// Designates the single injectable constructor of a type.
pub trait Inject: Instance + Sized {
    /// Constructor parameters, as a tuple of [InstancePtr]s in declared order.
    type Parameters: Parameters;

    /// Is the type singleton-scoped, i.e. memoized per resolution context.
    const SINGLETON: bool = false;

    /// Constructs the type from already resolved parameters.
    fn inject(parameters: Self::Parameters) -> Self;
}

/// Tuple of constructor parameters, which knows how to resolve itself.
pub trait Parameters: Sized {
    /// Requested types of all parameters, in declared order.
    fn keys() -> Vec<TypeKey>;

    /// Takes the parameters from resolved, type-erased arguments.
    fn from_arguments(arguments: &mut Arguments) -> Result<Self, ResolutionError>;

    /// Resolves all parameters from given context.
    fn resolve(resolver: &mut dyn InstanceResolver) -> Result<Self, ResolutionError>;
}

macro_rules! impl_parameters {
    ($($parameter:ident),*) => {
        impl<$($parameter: Instance + ?Sized),*> Parameters for ($(InstancePtr<$parameter>,)*) {
            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$parameter>()),*]
            }

            #[allow(unused_variables)]
            fn from_arguments(arguments: &mut Arguments) -> Result<Self, ResolutionError> {
                Ok(($(arguments.next::<$parameter>()?,)*))
            }

            #[allow(unused_variables)]
            fn resolve(resolver: &mut dyn InstanceResolver) -> Result<Self, ResolutionError> {
                Ok(($(resolver.resolve_typed::<$parameter>()?,)*))
            }
        }
    };
}

impl_parameters!();
impl_parameters!(A);
impl_parameters!(A, B);
impl_parameters!(A, B, C);
impl_parameters!(A, B, C, D);
impl_parameters!(A, B, C, D, E);
impl_parameters!(A, B, C, D, E, F);
impl_parameters!(A, B, C, D, E, F, G);
impl_parameters!(A, B, C, D, E, F, G, H);
impl_parameters!(A, B, C, D, E, F, G, H, I);
impl_parameters!(A, B, C, D, E, F, G, H, I, J);
impl_parameters!(A, B, C, D, E, F, G, H, I, J, K);
impl_parameters!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Resolved, type-erased constructor arguments.
pub struct Arguments {
    target: TypeKey,
    values: std::vec::IntoIter<InstanceAnyPtr>,
}

impl Arguments {
    pub fn new(target: TypeKey, values: Vec<InstanceAnyPtr>) -> Self {
        Self {
            target,
            values: values.into_iter(),
        }
    }

    /// Takes the next argument as an instance of `T`.
    pub fn next<T: Instance + ?Sized>(&mut self) -> Result<InstancePtr<T>, ResolutionError> {
        let parameter = TypeKey::of::<T>();
        let value = self
            .values
            .next()
            .ok_or(ResolutionError::MissingArgument {
                target: self.target,
                parameter,
            })?;

        downcast::<T>(&value).ok_or(ResolutionError::IncompatibleInstance(parameter))
    }
}
