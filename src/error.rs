use thiserror::Error;

/// Error reported synchronously by graph connection operations.
///
/// Connection errors never mutate the graph: a failed `connect` leaves
/// every node, binding and successor set exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// Connecting the two nodes would form a cycle, either directly
    /// (a node connected to itself) or through an existing path from the
    /// destination back to the source.
    #[error("connecting the nodes would form a cycle")]
    Cycle,
    /// The source vertex does not name a node of this graph.
    #[error("source node not found in this graph")]
    SourceNotFound,
    /// A vertex presented as a destination does not name a node of this
    /// graph. Unlike a fresh callable, a bare vertex carries nothing to
    /// insert, so the connection is rejected.
    #[error("destination vertex does not refer to a node of this graph")]
    UnknownVertex,
    /// The parameter index is not a slot of the destination callable.
    #[error("parameter index {slot} is out of range for a callable with {arity} parameter(s)")]
    SlotOutOfRange {
        /// The requested parameter index.
        slot: usize,
        /// The destination callable's parameter count.
        arity: usize,
    },
    /// The value carried by the connection does not match the slot's type.
    /// There are no implicit conversions: the produced (or projected) type
    /// must equal the parameter type exactly.
    #[error("cannot bind a value of type `{found}` to a parameter slot of type `{expected}`")]
    SlotType {
        /// Type the destination slot expects.
        expected: &'static str,
        /// Type the connection would deliver.
        found: &'static str,
    },
}

/// Error captured by a worker during a run and surfaced on the
/// completion handle.
///
/// A run error aborts the current run but does not damage the graph;
/// the next `execute` starts from a fully reset state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RunError {
    /// A parameter slot was never bound. Cannot occur when the graph
    /// reported `valid()` before the run.
    #[error("parameter slot {slot} has no binding")]
    ParameterMissing {
        /// Index of the unbound slot.
        slot: usize,
    },
    /// A result cell was set twice within one run.
    #[error("result cell was set twice in one run")]
    DoubleSet,
    /// The run was aborted before the awaited value was produced.
    #[error("run aborted before the value was produced")]
    Aborted,
    /// A callable panicked; the payload is rendered best-effort.
    #[error("node panicked: {0}")]
    Panicked(String),
}
