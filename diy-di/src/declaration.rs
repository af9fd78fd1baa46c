//! The declaration capability shared by both resolution strategies. The runtime
//! [ObjectGraph](crate::object_graph::ObjectGraph) reads declarations registered by the derive
//! macros, while a static graph compiler can read the same declarations from parsed sources. Since
//! both work against [Declarations], their results can be compared for identical input.

use crate::error::DeclarationError;

/// Source of injectable constructor and scope metadata for types identified by `K`.
pub trait Declarations<K> {
    /// Returns the parameter types of the single injectable constructor of `ty`, in declared
    /// order. Returns `None` if the type has no injectable constructor and an error if there is
    /// more than one.
    fn injectable_constructor(&self, ty: &K) -> Result<Option<Vec<K>>, DeclarationError>;

    /// Checks if `ty` is marked as singleton-scoped.
    fn is_singleton(&self, ty: &K) -> bool;
}

/// Helper deciding the outcome of a constructor lookup based on the number of candidates found.
pub fn single_constructor<C>(
    type_name: impl ToString,
    mut candidates: Vec<C>,
) -> Result<Option<C>, DeclarationError> {
    match candidates.len() {
        0 | 1 => Ok(candidates.pop()),
        count => Err(DeclarationError::AmbiguousInjectableConstructor {
            type_name: type_name.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::declaration::single_constructor;
    use crate::error::DeclarationError;

    #[test]
    fn should_accept_single_constructor() {
        assert_eq!(single_constructor("A", vec![1]).unwrap(), Some(1));
        assert_eq!(single_constructor::<i32>("A", vec![]).unwrap(), None);
    }

    #[test]
    fn should_reject_ambiguous_constructors() {
        assert_eq!(
            single_constructor("A", vec![1, 2]).unwrap_err(),
            DeclarationError::AmbiguousInjectableConstructor {
                type_name: "A".to_string(),
                count: 2
            }
        );
    }
}
