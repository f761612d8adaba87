use super::footprint::Footprint;
use crate::executor::{CpuPool, Task};
use crossbeam_channel::{unbounded, Sender, TryRecvError};
use std::marker::PhantomData;
use std::thread;

/// Affinity hint attached to a unit; maps to a worker shard in the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement(Option<usize>);

impl Placement {
    /// No preference; any worker may run the unit.
    pub fn any() -> Self {
        Placement(None)
    }

    /// Prefer the shard owning node `id`.
    pub fn node(id: usize) -> Self {
        Placement(Some(id))
    }

    pub(crate) fn shard(&self) -> Option<usize> {
        self.0
    }
}

/// Handle to a unit within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitId(usize);

struct UnitSpec {
    footprint: Footprint,
    placement: Placement,
    body: Option<Box<dyn FnOnce() + Send + 'static>>,
    successors: Vec<usize>,
    pending: usize,
}

/// A batch of dependency units over borrowed data.
///
/// Units are added with their declared read/write footprints; an edge is
/// inferred from every earlier unit whose footprint conflicts. `execute`
/// runs the whole DAG on a pool and returns only when every unit has
/// finished, so it doubles as the barrier: borrows captured by unit bodies
/// are guaranteed dead once it returns.
pub struct TaskGraph<'scope> {
    units: Vec<UnitSpec>,
    edges: usize,
    _marker: PhantomData<&'scope ()>,
}

impl<'scope> TaskGraph<'scope> {
    pub fn new() -> Self {
        Self {
            units: Vec::new(),
            edges: 0,
            _marker: PhantomData,
        }
    }

    /// Declare a unit. Ordering edges against all previously declared
    /// conflicting units are recorded here; submission order is the program
    /// order that hazards are resolved against.
    pub fn add_unit<F>(&mut self, footprint: Footprint, placement: Placement, body: F) -> UnitId
    where
        F: FnOnce() + Send + 'scope,
    {
        let body: Box<dyn FnOnce() + Send + 'static> =
            unsafe { std::mem::transmute(Box::new(body) as Box<dyn FnOnce() + Send + 'scope>) };

        let idx = self.units.len();
        let mut pending = 0;

        for unit in self.units.iter_mut() {
            if unit.footprint.conflicts_with(&footprint) {
                unit.successors.push(idx);
                pending += 1;
            }
        }
        self.edges += pending;

        self.units.push(UnitSpec {
            footprint,
            placement,
            body: Some(body),
            successors: Vec::new(),
            pending,
        });

        UnitId(idx)
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges
    }

    /// Number of inferred predecessors of a unit.
    pub fn dependency_count(&self, id: UnitId) -> usize {
        self.units[id.0].pending
    }

    /// Run the graph to completion on `pool`.
    ///
    /// The calling thread coordinates: it releases units whose predecessors
    /// finished and helps execute pool tasks while it waits, so a graph can
    /// be executed from inside another unit without deadlocking the pool.
    pub fn execute(self, pool: &CpuPool) {
        let mut units = self.units;
        let total = units.len();
        if total == 0 {
            return;
        }

        let (tx, rx) = unbounded::<usize>();

        let mut pending: Vec<usize> = units.iter().map(|u| u.pending).collect();
        let successors: Vec<Vec<usize>> = units.iter_mut().map(|u| std::mem::take(&mut u.successors)).collect();

        for idx in 0..total {
            if pending[idx] == 0 {
                Self::release(pool, &tx, &mut units, idx);
            }
        }

        let mut remaining = total;
        while remaining > 0 {
            match rx.try_recv() {
                Ok(done) => {
                    remaining -= 1;
                    for &succ in &successors[done] {
                        pending[succ] -= 1;
                        if pending[succ] == 0 {
                            Self::release(pool, &tx, &mut units, succ);
                        }
                    }
                }
                Err(TryRecvError::Empty) => {
                    if !pool.help_run_one() {
                        thread::yield_now();
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn release(pool: &CpuPool, tx: &Sender<usize>, units: &mut [UnitSpec], idx: usize) {
        let body = units[idx]
            .body
            .take()
            .expect("unit released twice");
        let tx = tx.clone();

        pool.submit(Task::with_placement(
            move || {
                body();
                let _ = tx.send(idx);
            },
            units[idx].placement.shard(),
        ));
    }
}

impl<'scope> Default for TaskGraph<'scope> {
    fn default() -> Self {
        Self::new()
    }
}
