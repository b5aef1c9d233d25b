//! Graph nodes: a unit with identity, successor set and one-shot latch.

use crate::cell::AnyCell;
use crate::error::{GraphError, RunError};
use crate::sync::{AtomicBool, ExclusiveCell, Ordering};
use crate::types::{IndexSet, NodeKey};
use crate::unit::UnitCore;
use core::any::Any;

/// One node of a graph.
///
/// The unit sits in an [`ExclusiveCell`]: during a run the only mutable
/// access is the invocation, guarded by the latch; every other mutable
/// access happens while the graph is exclusively borrowed. The result
/// cell is additionally reachable through a shared [`AnyCell`] handle, so
/// the runner can reset and poison cells without touching the unit.
pub(crate) struct GraphNode {
    unit: ExclusiveCell<Box<dyn UnitCore>>,
    fired: AtomicBool,
    result: Box<dyn AnyCell>,
    pub(crate) children: IndexSet<NodeKey>,
}

impl GraphNode {
    pub(crate) fn new(unit: Box<dyn UnitCore>, result: Box<dyn AnyCell>) -> Self {
        Self {
            unit: ExclusiveCell::new(unit),
            fired: AtomicBool::new(false),
            result,
            children: IndexSet::default(),
        }
    }

    /// Attempt the one-shot latch. True for the first caller of the run;
    /// false for everyone after, until the next reset.
    pub(crate) fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    /// Invoke the unit. Must only be called after winning
    /// [`try_fire`](Self::try_fire) for the current run.
    pub(crate) fn invoke(&self) -> Result<(), RunError> {
        // SAFETY: the latch admits exactly one invoker per run, and resets
        // happen only between runs.
        unsafe { self.unit.with_mut(|unit| unit.invoke()) }
    }

    /// Re-arm the latch and empty the result cell. Only between runs.
    pub(crate) fn reset(&self) {
        self.fired.store(false, Ordering::Release);
        self.result.reset();
    }

    /// Abort pending reads of the result cell.
    pub(crate) fn poison(&self) {
        self.result.poison();
    }

    /// The typed result cell, for connect-time binding construction.
    pub(crate) fn result_any(&self) -> &dyn Any {
        self.result.as_any()
    }

    /// Install `input` in the slot at `index`.
    pub(crate) fn bind_slot(
        &mut self,
        index: usize,
        input: Box<dyn Any>,
        input_ty: &'static str,
    ) -> Result<(), GraphError> {
        // SAFETY: `&mut self` — graph construction, no run in flight.
        unsafe {
            self.unit.with_mut(|unit| {
                let arity = unit.arity();
                match unit.slot(index) {
                    Some(slot) => slot.bind(input, input_ty),
                    None => Err(GraphError::SlotOutOfRange { slot: index, arity }),
                }
            })
        }
    }

    /// Whether every slot of the unit is bound.
    pub(crate) fn is_valid(&self) -> bool {
        // SAFETY: validity is inspected while the caller holds the graph,
        // which cannot happen concurrently with a run; concurrent shared
        // inspections are fine.
        unsafe { self.unit.with_ref(|unit| unit.is_valid()) }
    }
}
