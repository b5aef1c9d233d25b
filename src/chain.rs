//! Fluent wiring on top of the core connection operations.
//!
//! A [`Chain`] threads the most recent vertex through a sequence of
//! connections, reading like the flow it builds:
//!
//! ```
//! use callflow::{Graph, Runner, from};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let seen = Arc::new(AtomicU32::new(0));
//! let sink = Arc::clone(&seen);
//!
//! let mut graph = Graph::new();
//! graph
//!     .begin(|| (3_u32, 4_u32))
//!     .pipe_from(from::<0>(), |x: u32| x * x, 0)
//!     .unwrap()
//!     .pipe(move |sq: u32| sink.store(sq, Ordering::Relaxed))
//!     .unwrap();
//!
//! let mut runner = Runner::new(graph);
//! runner.execute().wait().unwrap();
//! assert_eq!(seen.load(Ordering::Relaxed), 9);
//! ```

use crate::error::GraphError;
use crate::field::{Field, Proj};
use crate::graph::{Graph, Vertex};
use crate::unit::NodeTarget;

/// A borrowed wiring cursor: the graph plus the vertex the next
/// connection starts from.
#[derive(Debug)]
pub struct Chain<'g, R> {
    graph: &'g mut Graph,
    tail: Vertex<R>,
}

impl Graph {
    /// Insert a zero-parameter callable at the root and start a chain
    /// from it.
    pub fn begin<F, R>(&mut self, callable: F) -> Chain<'_, R>
    where
        F: FnMut() -> R + Send + 'static,
        R: Send + Sync + 'static,
    {
        let tail = self.insert(callable);
        Chain { graph: self, tail }
    }

    /// Resume a chain from an existing vertex.
    pub fn chain<R>(&mut self, tail: Vertex<R>) -> Chain<'_, R> {
        Chain { graph: self, tail }
    }
}

impl<'g, R> Chain<'g, R> {
    /// The vertex the chain currently points at.
    pub fn vertex(&self) -> Vertex<R> {
        self.tail
    }
}

impl<'g> Chain<'g, ()> {
    /// Trigger-connect the destination: it runs once the current tail
    /// has finished.
    ///
    /// # Errors
    /// As [`Graph::connect`].
    pub fn then<D, M>(self, destination: D) -> Result<Chain<'g, D::Output>, GraphError>
    where
        D: NodeTarget<M>,
    {
        let tail = self.graph.connect(self.tail, destination)?;
        Ok(Chain {
            graph: self.graph,
            tail,
        })
    }
}

impl<'g, R> Chain<'g, R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Feed the tail's whole result into parameter zero of the
    /// destination.
    ///
    /// # Errors
    /// As [`Graph::connect_to`].
    pub fn pipe<D, M>(self, destination: D) -> Result<Chain<'g, D::Output>, GraphError>
    where
        D: NodeTarget<M>,
    {
        self.pipe_at(destination, 0)
    }

    /// Feed the tail's whole result into parameter `slot` of the
    /// destination.
    ///
    /// # Errors
    /// As [`Graph::connect_to`].
    pub fn pipe_at<D, M>(
        self,
        destination: D,
        slot: usize,
    ) -> Result<Chain<'g, D::Output>, GraphError>
    where
        D: NodeTarget<M>,
    {
        let tail = self.graph.connect_to(self.tail, destination, slot)?;
        Ok(Chain {
            graph: self.graph,
            tail,
        })
    }
}

impl<'g, R> Chain<'g, R>
where
    R: Send + Sync + 'static,
{
    /// Feed component `K` of the tail's result into parameter `slot` of
    /// the destination.
    ///
    /// # Errors
    /// As [`Graph::connect_from`].
    pub fn pipe_from<const K: usize, D, M>(
        self,
        projection: Proj<K>,
        destination: D,
        slot: usize,
    ) -> Result<Chain<'g, D::Output>, GraphError>
    where
        R: Field<K>,
        <R as Field<K>>::Output: 'static,
        D: NodeTarget<M>,
    {
        let tail = self
            .graph
            .connect_from(self.tail, projection, destination, slot)?;
        Ok(Chain {
            graph: self.graph,
            tail,
        })
    }
}
