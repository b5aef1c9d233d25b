//! Parameter bindings: the pull side of a data edge.
//!
//! A binding installed in a parameter slot holds shared access to an
//! upstream [`ValueCell`] together with a projection — identity for a
//! whole-value connection, a [`Field`] index for an indexed one. Gathering
//! a slot awaits the upstream cell and yields the projected, owned value.

use crate::cell::ValueCell;
use crate::error::RunError;
use crate::field::Field;
use crate::sync::Arc;
use core::any::{Any, type_name};

/// A bound input a parameter slot can pull from. Blocks until the
/// upstream value is published.
pub(crate) trait Source<T>: Send {
    fn pull(&self) -> Result<T, RunError>;
}

/// Identity binding: delivers the upstream value as-is.
pub(crate) struct WholeBinding<U> {
    pub(crate) cell: Arc<ValueCell<U>>,
}

impl<U> Source<U> for WholeBinding<U>
where
    U: Clone + Send + Sync + 'static,
{
    fn pull(&self) -> Result<U, RunError> {
        let value = self.cell.get()?;
        Ok((*value).clone())
    }
}

/// Indexed binding: delivers element `K` of the upstream value.
pub(crate) struct FieldBinding<U, const K: usize> {
    pub(crate) cell: Arc<ValueCell<U>>,
}

impl<U, const K: usize> Source<<U as Field<K>>::Output> for FieldBinding<U, K>
where
    U: Field<K> + Send + Sync + 'static,
{
    fn pull(&self) -> Result<<U as Field<K>>::Output, RunError> {
        let value = self.cell.get()?;
        Ok(value.field())
    }
}

/// Typed binding ready to be installed. Erased to `Any` for the trip into
/// a type-erased slot, which recovers it with a checked downcast.
pub(crate) struct BoundInput<T>(pub(crate) Box<dyn Source<T>>);

impl<T: 'static> BoundInput<T> {
    pub(crate) fn erase(self) -> (Box<dyn Any>, &'static str) {
        (Box::new(self), type_name::<T>())
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn whole_binding_clones_snapshot() {
        let cell = Arc::new(ValueCell::new());
        cell.set(vec![1, 2, 3]).unwrap();
        let binding = WholeBinding {
            cell: Arc::clone(&cell),
        };
        assert_eq!(binding.pull().unwrap(), vec![1, 2, 3]);
        // The snapshot is untouched by the consumer's copy.
        assert_eq!(*cell.get().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn field_binding_projects() {
        let cell = Arc::new(ValueCell::new());
        cell.set((7_u32, "seven")).unwrap();
        let first = FieldBinding::<(u32, &str), 0> {
            cell: Arc::clone(&cell),
        };
        let second = FieldBinding::<(u32, &str), 1> { cell };
        assert_eq!(first.pull().unwrap(), 7);
        assert_eq!(second.pull().unwrap(), "seven");
    }

    #[test]
    fn pull_reports_aborted_upstream() {
        let cell = Arc::new(ValueCell::<u32>::new());
        cell.poison();
        let binding = WholeBinding { cell };
        assert_eq!(binding.pull(), Err(RunError::Aborted));
    }
}
