//! Typed asynchronous call graphs.
//!
//! This crate wires callables — closures, function items, function
//! objects — into a directed acyclic graph whose edges carry typed values
//! from one node's result into another node's parameter slots, then runs
//! the graph concurrently on a pool of worker threads. It:
//! - Binds results to parameters element-wise: a composite result can be
//!   exploded across consumers through the [`Field`] projection protocol,
//!   with one upstream source per parameter slot.
//! - Rejects cycles and unknown sources at connection time, before any
//!   mutation; a failed connection leaves the graph untouched.
//! - Executes each node at most once per run behind a one-shot latch,
//!   publishing results through one-shot cells that any number of
//!   downstream consumers read as shared snapshots.
//! - Signals completion exactly when every leaf has run, or carries the
//!   first failure (including panics inside callables) on the run handle.
//!
//! Key modules:
//! - `graph`: the DAG itself — insertion, typed connections through
//!   [`Vertex`] handles, validity, depth, leaves, transitive reduction.
//! - `runner`: the execution engine — worker pool, ready queue,
//!   completion signal, sequential re-execution.
//! - `cell`: the one-shot [`ValueCell`] rendezvous between producers and
//!   consumers.
//! - `field`: compile-time projection of tuple-like results.
//! - `chain`: fluent wiring on top of the core connection operations.
//!
//! Quick start:
//!
//! ```
//! use callflow::{Graph, Runner};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let total = Arc::new(AtomicU32::new(0));
//! let sink = Arc::clone(&total);
//!
//! let mut graph = Graph::new();
//! let a = graph.insert(|| 2_u32);
//! let b = graph.insert(|| 3_u32);
//! let sum = graph
//!     .connect_to(a, |x: u32, y: u32| x + y, 0)
//!     .unwrap();
//! graph.connect_to(b, sum, 1).unwrap();
//! graph
//!     .connect_to(sum, move |s: u32| sink.store(s, Ordering::Relaxed), 0)
//!     .unwrap();
//!
//! assert!(graph.valid());
//! let mut runner = Runner::new(graph);
//! runner.execute().wait().unwrap();
//! assert_eq!(total.load(Ordering::Relaxed), 5);
//! ```
//!
//! The runner guarantees that a node only gathers values its producers
//! have already published (happens-before via the cells), so callables
//! never observe stale or default inputs.

pub mod cell;
pub mod chain;
pub mod error;
pub mod field;
pub mod graph;
pub mod runner;

mod binding;
mod node;
mod sync;
mod types;
mod unit;
mod worker;

pub use crate::{
    cell::ValueCell,
    chain::Chain,
    error::{GraphError, RunError},
    field::{Field, Proj, from},
    graph::{Graph, Vertex},
    runner::{RunHandle, Runner},
    unit::{NodeTarget, Target},
};
