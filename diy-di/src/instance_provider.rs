//! Instances and the contexts resolving them.
//!
//! Every resolved instance is held by an [InstancePtr]. When passed around in a type-erased form,
//! the [InstanceAnyPtr] always wraps the `InstancePtr<K>` of the requested key `K`, which makes it
//! possible to request abstract `dyn Trait` types the same way as concrete ones.

use crate::error::ResolutionError;
#[cfg(test)]
use mockall::automock;
use std::any::{type_name, Any, TypeId};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::Arc;

#[cfg(not(feature = "threadsafe"))]
pub type InstancePtr<T> = Rc<T>;
#[cfg(feature = "threadsafe")]
pub type InstancePtr<T> = Arc<T>;

#[cfg(not(feature = "threadsafe"))]
pub type InstanceAnyPtr = InstancePtr<dyn Any + 'static>;
#[cfg(feature = "threadsafe")]
pub type InstanceAnyPtr = InstancePtr<dyn Any + Send + Sync + 'static>;

/// Cell holding a lazily computed instance. Thread-safe cells block concurrent initializers, so a
/// value is computed at most once.
#[cfg(not(feature = "threadsafe"))]
pub type InstanceCell<T> = once_cell::unsync::OnceCell<T>;
#[cfg(feature = "threadsafe")]
pub type InstanceCell<T> = once_cell::sync::OnceCell<T>;

/// Bound for all types which can be requested from a resolution context. Note: with the
/// "threadsafe" feature, trait objects need `Send + Sync` supertraits to be requestable.
#[cfg(not(feature = "threadsafe"))]
pub trait Instance: 'static {}
#[cfg(not(feature = "threadsafe"))]
impl<T: ?Sized + 'static> Instance for T {}

/// Bound for all types which can be requested from a resolution context. Note: with the
/// "threadsafe" feature, trait objects need `Send + Sync` supertraits to be requestable.
#[cfg(feature = "threadsafe")]
pub trait Instance: Send + Sync + 'static {}
#[cfg(feature = "threadsafe")]
impl<T: ?Sized + Send + Sync + 'static> Instance for T {}

/// Identifier of a requested type. Equality is based on [TypeId] only, while the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Converts a typed instance into its type-erased form.
#[inline]
pub fn erase<T: Instance + ?Sized>(instance: InstancePtr<T>) -> InstanceAnyPtr {
    InstancePtr::new(instance) as InstanceAnyPtr
}

/// Recovers a typed instance from its type-erased form. Returns `None` if the erased instance was
/// created for a different type.
#[inline]
pub fn downcast<T: Instance + ?Sized>(instance: &InstanceAnyPtr) -> Option<InstancePtr<T>> {
    (**instance).downcast_ref::<InstancePtr<T>>().cloned()
}

/// Resolution context returning instances of requested types.
#[cfg_attr(test, automock)]
pub trait InstanceResolver {
    /// Returns an instance of the requested type, constructing it along with its dependencies if
    /// needed.
    fn resolve(&mut self, ty: TypeKey) -> Result<InstanceAnyPtr, ResolutionError>;
}

/// Helper trait for [InstanceResolver] providing strongly-typed access.
pub trait TypedInstanceResolver {
    /// Typesafe version of [InstanceResolver::resolve].
    fn resolve_typed<T: Instance + ?Sized>(&mut self) -> Result<InstancePtr<T>, ResolutionError>;
}

impl<R: InstanceResolver + ?Sized> TypedInstanceResolver for R {
    fn resolve_typed<T: Instance + ?Sized>(&mut self) -> Result<InstancePtr<T>, ResolutionError> {
        let ty = TypeKey::of::<T>();
        let instance = self.resolve(ty)?;
        downcast::<T>(&instance).ok_or(ResolutionError::IncompatibleInstance(ty))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ResolutionError;
    use crate::instance_provider::{
        downcast, erase, InstancePtr, MockInstanceResolver, TypeKey, TypedInstanceResolver,
    };
    use mockall::predicate::*;

    trait Shape: Send + Sync {
        fn corners(&self) -> u8;
    }

    struct Square;

    impl Shape for Square {
        fn corners(&self) -> u8 {
            4
        }
    }

    #[test]
    fn should_compare_keys_by_type() {
        assert_eq!(TypeKey::of::<u8>(), TypeKey::of::<u8>());
        assert_ne!(TypeKey::of::<u8>(), TypeKey::of::<i8>());
        assert_eq!(TypeKey::of::<dyn Shape>().to_string(), std::any::type_name::<dyn Shape>());
    }

    #[test]
    fn should_round_trip_trait_objects() {
        let shape = InstancePtr::new(Square) as InstancePtr<dyn Shape>;
        let erased = erase(shape.clone());

        let restored = downcast::<dyn Shape>(&erased).unwrap();
        assert!(InstancePtr::ptr_eq(&shape, &restored));
        assert_eq!(restored.corners(), 4);
        assert!(downcast::<Square>(&erased).is_none());
    }

    #[test]
    fn should_resolve_typed_instances() {
        let mut resolver = MockInstanceResolver::new();
        resolver
            .expect_resolve()
            .with(eq(TypeKey::of::<i32>()))
            .times(1)
            .returning(|_| Ok(erase(InstancePtr::new(5_i32))));

        assert_eq!(*resolver.resolve_typed::<i32>().unwrap(), 5);
    }

    #[test]
    fn should_reject_incompatible_instances() {
        let mut resolver = MockInstanceResolver::new();
        resolver
            .expect_resolve()
            .returning(|_| Ok(erase(InstancePtr::new(5_u8))));

        assert_eq!(
            resolver.resolve_typed::<i32>().unwrap_err(),
            ResolutionError::IncompatibleInstance(TypeKey::of::<i32>())
        );
    }
}
