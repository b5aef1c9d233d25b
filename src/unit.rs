//! Wrapped callables and their parameter slots.
//!
//! A unit pairs a callable with one typed [`Slot`] per parameter and a
//! result cell. Units come in two shapes, mirroring their signatures:
//! [`SourceUnit`] for zero-parameter callables, which own a single trigger
//! slot awaiting an upstream void cell, and [`ParamUnit`] for callables
//! with parameters, which gather every slot before the call. Nodes store
//! units behind the [`UnitCore`] capability trait; everything type-specific
//! stays inside, only the slots' bind points are reachable from outside,
//! through a checked downcast.

use crate::binding::{BoundInput, Source};
use crate::cell::{AnyCell, CellHandle, ValueCell};
use crate::error::{GraphError, RunError};
use crate::sync::Arc;
use crate::types::NodeKey;
use core::any::{Any, type_name};

/// One parameter slot: holds at most one bound input. Re-binding
/// replaces the previous input.
pub(crate) struct Slot<T> {
    source: Option<Box<dyn Source<T>>>,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Self { source: None }
    }

    fn pull(&self, slot: usize) -> Result<T, RunError> {
        match &self.source {
            Some(source) => source.pull(),
            None => Err(RunError::ParameterMissing { slot }),
        }
    }
}

/// Bind point of a slot whose value type has been erased.
pub(crate) trait AnySlot {
    /// Install `input`, which must be an erased [`BoundInput`] of exactly
    /// this slot's type; `input_ty` names the delivered type for the error
    /// message when it is not.
    fn bind(&mut self, input: Box<dyn Any>, input_ty: &'static str) -> Result<(), GraphError>;

    fn is_bound(&self) -> bool;
}

impl<T: 'static> AnySlot for Slot<T> {
    fn bind(&mut self, input: Box<dyn Any>, input_ty: &'static str) -> Result<(), GraphError> {
        match input.downcast::<BoundInput<T>>() {
            Ok(bound) => {
                self.source = Some(bound.0);
                Ok(())
            }
            Err(_) => Err(GraphError::SlotType {
                expected: type_name::<T>(),
                found: input_ty,
            }),
        }
    }

    fn is_bound(&self) -> bool {
        self.source.is_some()
    }
}

/// Capability set of a type-erased unit: invoke, validity, slot access.
///
/// The run lifecycle of the result cell (reset, poison) is deliberately
/// *not* here — it goes through the node's [`AnyCell`] handle, which stays
/// shareable while a worker holds the unit exclusively.
pub(crate) trait UnitCore: Send {
    /// Gather inputs, call the callable, publish the result.
    fn invoke(&mut self) -> Result<(), RunError>;

    /// All slots bound (for a zero-parameter unit: the trigger is bound).
    fn is_valid(&self) -> bool;

    fn arity(&self) -> usize;

    /// The slot at `index`; `None` past the parameter list. Zero-parameter
    /// units expose their trigger at index zero.
    fn slot(&mut self, index: usize) -> Option<&mut dyn AnySlot>;
}

/// A zero-parameter callable with its trigger slot.
///
/// The trigger, when bound, is awaited before the call; the graph root's
/// trigger stays unbound and the root runs unconditionally.
pub(crate) struct SourceUnit<F, R> {
    callable: F,
    trigger: Slot<()>,
    result: Arc<ValueCell<R>>,
}

impl<F, R> UnitCore for SourceUnit<F, R>
where
    F: FnMut() -> R + Send + 'static,
    R: Send + Sync + 'static,
{
    fn invoke(&mut self) -> Result<(), RunError> {
        if let Some(trigger) = &self.trigger.source {
            trigger.pull()?;
        }
        let out = (self.callable)();
        self.result.set(out)
    }

    fn is_valid(&self) -> bool {
        self.trigger.is_bound()
    }

    fn arity(&self) -> usize {
        0
    }

    fn slot(&mut self, index: usize) -> Option<&mut dyn AnySlot> {
        (index == 0).then_some(&mut self.trigger as &mut dyn AnySlot)
    }
}

/// A callable with parameters; slots are gathered in order before the call.
pub(crate) struct ParamUnit<F, S, R> {
    callable: F,
    slots: S,
    result: Arc<ValueCell<R>>,
}

macro_rules! impl_param_unit {
    ($arity:literal; $($P:ident $var:ident $idx:tt),+) => {
        impl<F, $($P,)+ R> UnitCore for ParamUnit<F, ($(Slot<$P>,)+), R>
        where
            F: FnMut($($P),+) -> R + Send + 'static,
            $($P: Send + 'static,)+
            R: Send + Sync + 'static,
        {
            fn invoke(&mut self) -> Result<(), RunError> {
                $(let $var = self.slots.$idx.pull($idx)?;)+
                let out = (self.callable)($($var),+);
                self.result.set(out)
            }

            fn is_valid(&self) -> bool {
                $(self.slots.$idx.is_bound())&&+
            }

            fn arity(&self) -> usize {
                $arity
            }

            fn slot(&mut self, index: usize) -> Option<&mut dyn AnySlot> {
                match index {
                    $($idx => Some(&mut self.slots.$idx as &mut dyn AnySlot),)+
                    _ => None,
                }
            }
        }
    };
}

impl_param_unit!(1; A a 0);
impl_param_unit!(2; A a 0, B b 1);
impl_param_unit!(3; A a 0, B b 1, C c 2);
impl_param_unit!(4; A a 0, B b 1, C c 2, D d 3);
impl_param_unit!(5; A a 0, B b 1, C c 2, D d 3, E e 4);
impl_param_unit!(6; A a 0, B b 1, C c 2, D d 3, E e 4, G g 5);

/// Build a zero-parameter unit and the erased handle to its result cell.
pub(crate) fn source_unit<F, R>(callable: F) -> (Box<dyn UnitCore>, Box<dyn AnyCell>)
where
    F: FnMut() -> R + Send + 'static,
    R: Send + Sync + 'static,
{
    let result = Arc::new(ValueCell::new());
    let handle = Box::new(CellHandle(Arc::clone(&result)));
    (
        Box::new(SourceUnit {
            callable,
            trigger: Slot::new(),
            result,
        }),
        handle,
    )
}

/// A connection destination resolved by [`NodeTarget`]: either a node the
/// graph already owns or a freshly built unit about to be inserted.
pub struct Target(pub(crate) TargetKind);

pub(crate) enum TargetKind {
    Existing {
        key: NodeKey,
        graph: u64,
    },
    Fresh {
        unit: Box<dyn UnitCore>,
        result: Box<dyn AnyCell>,
    },
}

/// Anything a connection can point at: a fresh callable of arity zero to
/// six (moved into the graph, creating a node) or a `Vertex` naming an
/// existing node.
///
/// The `Marker` parameter carries the callable's signature so the
/// per-arity implementations do not overlap; it is always inferred.
pub trait NodeTarget<Marker> {
    /// Result type of the destination callable.
    type Output;

    #[doc(hidden)]
    fn into_target(self) -> Target;
}

impl<F, R> NodeTarget<fn() -> R> for F
where
    F: FnMut() -> R + Send + 'static,
    R: Send + Sync + 'static,
{
    type Output = R;

    fn into_target(self) -> Target {
        let (unit, result) = source_unit(self);
        Target(TargetKind::Fresh { unit, result })
    }
}

macro_rules! impl_node_target {
    ($($P:ident),+) => {
        impl<F, $($P,)+ R> NodeTarget<fn($($P),+) -> R> for F
        where
            F: FnMut($($P),+) -> R + Send + 'static,
            $($P: Send + 'static,)+
            R: Send + Sync + 'static,
        {
            type Output = R;

            fn into_target(self) -> Target {
                let result = Arc::new(ValueCell::new());
                let handle = Box::new(CellHandle(Arc::clone(&result)));
                Target(TargetKind::Fresh {
                    unit: Box::new(ParamUnit {
                        callable: self,
                        slots: ($(Slot::<$P>::new(),)+),
                        result,
                    }),
                    result: handle,
                })
            }
        }
    };
}

impl_node_target!(A);
impl_node_target!(A, B);
impl_node_target!(A, B, C);
impl_node_target!(A, B, C, D);
impl_node_target!(A, B, C, D, E);
impl_node_target!(A, B, C, D, E, G);
