//! Footprint-declared task graphs.
//!
//! The declarative half of the runtime: units carry read/write region sets
//! and a placement hint, the graph infers ordering edges from overlaps, and
//! execution joins the whole DAG before returning.

pub mod footprint;
pub mod task_graph;

pub use footprint::{BufferId, Footprint, Region};
pub use task_graph::{Placement, TaskGraph, UnitId};
