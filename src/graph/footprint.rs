//! Declared data footprints for dependency inference.
//!
//! A unit does not name the units it depends on; it names the buffer regions
//! it reads and writes. The graph turns overlaps between those regions into
//! ordering edges, the same way a dependency-aware task runtime resolves
//! `in`/`out` clauses.

/// Identifies a logical buffer within one graph.
///
/// Ids are assigned by the caller; two regions can only overlap if they name
/// the same buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Half-open element range `[start, start + len)` of one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub buffer: BufferId,
    pub start: usize,
    pub len: usize,
}

impl Region {
    pub fn new(buffer: BufferId, start: usize, len: usize) -> Self {
        Self { buffer, start, len }
    }

    fn end(&self) -> usize {
        self.start + self.len
    }

    /// Empty regions never overlap anything.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.buffer == other.buffer && self.start < other.end() && other.start < self.end()
    }
}

/// The read and write sets of one unit.
#[derive(Debug, Clone, Default)]
pub struct Footprint {
    reads: Vec<Region>,
    writes: Vec<Region>,
}

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(mut self, region: Region) -> Self {
        self.reads.push(region);
        self
    }

    pub fn write(mut self, region: Region) -> Self {
        self.writes.push(region);
        self
    }

    pub fn reads(&self) -> &[Region] {
        &self.reads
    }

    pub fn writes(&self) -> &[Region] {
        &self.writes
    }

    /// True if the two footprints must be ordered.
    ///
    /// Any write overlapping the other unit's read or write set is a hazard;
    /// read-read overlap is not.
    pub fn conflicts_with(&self, other: &Footprint) -> bool {
        for w in &self.writes {
            if other.writes.iter().any(|r| w.overlaps(r)) {
                return true;
            }
            if other.reads.iter().any(|r| w.overlaps(r)) {
                return true;
            }
        }
        self.reads
            .iter()
            .any(|r| other.writes.iter().any(|w| r.overlaps(w)))
    }
}
