//! The call graph: an ordered table of nodes forming a DAG.
//!
//! A graph always contains a distinguished root node wrapping a no-op
//! `() -> ()`. Zero-parameter callables inserted with [`Graph::insert`]
//! are triggered by the root's void result cell, which unifies "connect
//! to the graph" and "connect to a predecessor" under one primitive.
//!
//! Connections are made through [`Vertex`] handles. Every connection
//! returns the destination's vertex, so wiring naturally threads handles
//! forward:
//!
//! ```
//! use callflow::{Graph, Runner};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let seen = Arc::new(AtomicU32::new(0));
//! let sink = Arc::clone(&seen);
//!
//! let mut graph = Graph::new();
//! let producer = graph.insert(|| 21_u32);
//! graph
//!     .connect_to(producer, move |n: u32| sink.store(n * 2, Ordering::Relaxed), 0)
//!     .unwrap();
//!
//! let mut runner = Runner::new(graph);
//! runner.execute().wait().unwrap();
//! assert_eq!(seen.load(Ordering::Relaxed), 42);
//! ```

use crate::binding::{BoundInput, FieldBinding, WholeBinding};
use crate::cell::ValueCell;
use crate::error::GraphError;
use crate::field::{Field, Proj};
use crate::node::GraphNode;
use crate::sync::Arc;
use crate::types::NodeKey;
use crate::unit::{NodeTarget, Target, TargetKind, source_unit};
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicU64, Ordering};

// Graph instance ids let a vertex prove which graph owns its node.
// Process-global and monotonically increasing.
static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(0);

/// An opaque, copyable handle to a node of a [`Graph`], typed by the
/// node's result. Returned from every insertion and connection; accepted
/// anywhere a node is named.
///
/// Two copies of the same vertex refer to the same node. A closure
/// inserted twice by value yields two distinct nodes — vertices, not
/// callables, carry identity.
pub struct Vertex<R> {
    pub(crate) key: NodeKey,
    pub(crate) graph: u64,
    _result: PhantomData<fn() -> R>,
}

impl<R> Vertex<R> {
    fn new(key: NodeKey, graph: u64) -> Self {
        Self {
            key,
            graph,
            _result: PhantomData,
        }
    }
}

// Manual impls: a vertex is a plain handle whatever `R` is.
impl<R> Copy for Vertex<R> {}

impl<R> Clone for Vertex<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> PartialEq for Vertex<R> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.graph == other.graph
    }
}

impl<R> Eq for Vertex<R> {}

impl<R> fmt::Debug for Vertex<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("node", &self.key.0)
            .field("graph", &self.graph)
            .finish()
    }
}

/// Marker for the [`NodeTarget`] implementation on vertices.
#[doc(hidden)]
pub struct ByVertex;

impl<R> NodeTarget<ByVertex> for Vertex<R> {
    type Output = R;

    fn into_target(self) -> Target {
        Target(TargetKind::Existing {
            key: self.key,
            graph: self.graph,
        })
    }
}

/// A container of callable nodes joined into a directed acyclic graph.
///
/// The graph describes an asynchronous work pattern and its information
/// flow; a [`Runner`](crate::runner::Runner) manages the synchronization
/// and threads needed to execute it.
pub struct Graph {
    nodes: Vec<GraphNode>,
    id: u64,
}

impl Graph {
    pub(crate) const ROOT: NodeKey = NodeKey(0);

    /// Construct an empty graph, consisting only of the no-op root node.
    pub fn new() -> Self {
        let (unit, result) = source_unit(|| ());
        Self {
            nodes: vec![GraphNode::new(unit, result)],
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Connect a zero-parameter callable to the root node.
    ///
    /// The new node's trigger is bound to the root's void cell, so it
    /// becomes runnable as soon as a run starts.
    pub fn insert<F, R>(&mut self, callable: F) -> Vertex<R>
    where
        F: FnMut() -> R + Send + 'static,
        R: Send + Sync + 'static,
    {
        let (mut unit, result) = source_unit(callable);
        let cell = self.result_cell_of::<()>(Self::ROOT);
        let (input, input_ty) = BoundInput::<()>(Box::new(WholeBinding { cell })).erase();
        unit.slot(0)
            .expect("Graph::insert: trigger slot")
            .bind(input, input_ty)
            .expect("Graph::insert: trigger bind");

        let key = self.push_node(GraphNode::new(unit, result));
        self.nodes[Self::ROOT.index()].children.insert(key);
        tracing::trace!(node = key.0, "inserted root-triggered node");
        Vertex::new(key, self.id)
    }

    /// Connect a void-producing node to the trigger of a zero-parameter
    /// destination: the destination waits for `source` to finish, then
    /// runs.
    ///
    /// # Errors
    /// [`GraphError::Cycle`] if the edge would close a cycle,
    /// [`GraphError::SourceNotFound`] if `source` is not a node of this
    /// graph, [`GraphError::SlotType`] if an existing destination is not
    /// zero-parameter. The graph is unchanged on error.
    pub fn connect<D, M>(
        &mut self,
        source: Vertex<()>,
        destination: D,
    ) -> Result<Vertex<D::Output>, GraphError>
    where
        D: NodeTarget<M>,
    {
        self.connect_to(source, destination, 0)
    }

    /// Connect the whole result of `source` into parameter `slot` of the
    /// destination.
    ///
    /// # Errors
    /// [`GraphError::Cycle`], [`GraphError::SourceNotFound`],
    /// [`GraphError::UnknownVertex`], [`GraphError::SlotOutOfRange`] or
    /// [`GraphError::SlotType`]; the graph is unchanged on error.
    pub fn connect_to<U, D, M>(
        &mut self,
        source: Vertex<U>,
        destination: D,
        slot: usize,
    ) -> Result<Vertex<D::Output>, GraphError>
    where
        U: Clone + Send + Sync + 'static,
        D: NodeTarget<M>,
    {
        let source_key = self.lookup_source(source)?;
        let cell = self.result_cell_of::<U>(source_key);
        let input = BoundInput::<U>(Box::new(WholeBinding { cell })).erase();
        let key = self.finish_connection(source_key, destination.into_target(), slot, input)?;
        Ok(Vertex::new(key, self.id))
    }

    /// Connect component `K` of `source`'s result into parameter `slot`
    /// of the destination, as in
    /// `graph.connect_from(a, from::<1>(), b, 0)`.
    ///
    /// # Errors
    /// As [`connect_to`](Self::connect_to); the graph is unchanged on
    /// error.
    pub fn connect_from<U, const K: usize, D, M>(
        &mut self,
        source: Vertex<U>,
        _projection: Proj<K>,
        destination: D,
        slot: usize,
    ) -> Result<Vertex<D::Output>, GraphError>
    where
        U: Field<K> + Send + Sync + 'static,
        <U as Field<K>>::Output: 'static,
        D: NodeTarget<M>,
    {
        let source_key = self.lookup_source(source)?;
        let cell = self.result_cell_of::<U>(source_key);
        let input =
            BoundInput::<<U as Field<K>>::Output>(Box::new(FieldBinding::<U, K> { cell })).erase();
        let key = self.finish_connection(source_key, destination.into_target(), slot, input)?;
        Ok(Vertex::new(key, self.id))
    }

    /// Check that each node in the graph with a non-empty parameter list
    /// has each parameter bound. The root is exempt.
    pub fn valid(&self) -> bool {
        self.nodes
            .iter()
            .enumerate()
            .all(|(index, node)| index == Self::ROOT.index() || node.is_valid())
    }

    /// The number of root-to-leaf paths, which hints at the number of
    /// worker threads required to execute the graph. At least one, even
    /// for an empty graph.
    pub fn depth(&self) -> usize {
        self.node_depth(Self::ROOT)
    }

    /// The number of nodes which have no children.
    pub fn leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.children.is_empty())
            .count()
    }

    /// Perform a transitive reduction: drop every direct edge that is
    /// dominated by a longer path between the same nodes.
    ///
    /// Bindings are untouched, so the reduction does not affect what runs
    /// or what values flow — only the scheduling shape, and with it the
    /// number of concurrent threads required.
    pub fn reduce(&mut self) {
        let mut remove = Vec::new();
        for index in 0..self.nodes.len() {
            let parent = NodeKey(index as u32);
            for &child in &self.nodes[parent.index()].children {
                if self.longest_path(parent, child) > 1 {
                    remove.push((parent, child));
                }
            }
        }
        tracing::debug!(removed = remove.len(), "transitive reduction");
        for (parent, child) in remove {
            self.nodes[parent.index()].children.shift_remove(&child);
        }
    }

    pub(crate) fn node(&self, key: NodeKey) -> &GraphNode {
        &self.nodes[key.index()]
    }

    pub(crate) fn reset_nodes(&self) {
        for node in &self.nodes {
            node.reset();
        }
    }

    pub(crate) fn poison_cells(&self) {
        for node in &self.nodes {
            node.poison();
        }
    }

    fn push_node(&mut self, node: GraphNode) -> NodeKey {
        let key = NodeKey(u32::try_from(self.nodes.len()).expect("Graph::push_node: node count"));
        self.nodes.push(node);
        key
    }

    fn lookup_source<R>(&self, vertex: Vertex<R>) -> Result<NodeKey, GraphError> {
        if vertex.graph != self.id || vertex.key.index() >= self.nodes.len() {
            return Err(GraphError::SourceNotFound);
        }
        Ok(vertex.key)
    }

    /// Clone of the typed result cell behind `key`. The vertex type
    /// parameter is the source of truth for `U`, so the downcast cannot
    /// fail for handles this graph issued.
    fn result_cell_of<U: Send + Sync + 'static>(&self, key: NodeKey) -> Arc<ValueCell<U>> {
        self.nodes[key.index()]
            .result_any()
            .downcast_ref::<Arc<ValueCell<U>>>()
            .expect("Graph::result_cell_of: vertex result type")
            .clone()
    }

    /// Shared tail of every connection: cycle check, slot binding, child
    /// edge. Ordered so that nothing mutates unless every check passes.
    fn finish_connection(
        &mut self,
        source_key: NodeKey,
        target: Target,
        slot: usize,
        (input, input_ty): (Box<dyn Any>, &'static str),
    ) -> Result<NodeKey, GraphError> {
        let key = match target.0 {
            TargetKind::Existing { key, graph } => {
                if graph != self.id || key.index() >= self.nodes.len() {
                    return Err(GraphError::UnknownVertex);
                }
                if self.makes_cycle(source_key, key) {
                    return Err(GraphError::Cycle);
                }
                self.nodes[key.index()].bind_slot(slot, input, input_ty)?;
                key
            }
            TargetKind::Fresh { unit, result } => {
                let mut node = GraphNode::new(unit, result);
                node.bind_slot(slot, input, input_ty)?;
                self.push_node(node)
            }
        };
        self.nodes[source_key.index()].children.insert(key);
        tracing::trace!(source = source_key.0, destination = key.0, slot, "connected");
        Ok(key)
    }

    /// True if making `candidate` a child of `source` would close a cycle:
    /// either they are the same node, or a path already runs from the
    /// candidate back to the source.
    fn makes_cycle(&self, source: NodeKey, candidate: NodeKey) -> bool {
        source == candidate || self.longest_path(candidate, source) > 0
    }

    /// Length in edges of the longest path from `from` to `to` over
    /// successor edges; zero when no path exists. Naive DFS with
    /// recomputation, quadratic but faithful to graphs of this size.
    fn longest_path(&self, from: NodeKey, to: NodeKey) -> usize {
        let children = &self.nodes[from.index()].children;
        let mut distance = usize::from(children.contains(&to));
        for &child in children {
            let via = self.longest_path(child, to);
            if via > 0 && via + 1 > distance {
                distance = via + 1;
            }
        }
        distance
    }

    fn node_depth(&self, key: NodeKey) -> usize {
        let depth: usize = self.nodes[key.index()]
            .children
            .iter()
            .map(|&child| self.node_depth(child))
            .sum();
        depth.max(1)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
