use serde::{Deserialize, Serialize};

/// Tuning knobs of a [`DocumentTable`](crate::table::DocumentTable).
///
/// Options only influence how work is scheduled, never the stored rows or the
/// assembled records. They can be loaded from JSON:
///
/// ```json
/// { "parallel_load": true, "min_parallel_batch": 256 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Rows reserved up front in every column.
    pub initial_capacity: usize,

    /// Shred the records of `insert_batch` on the rayon thread pool.
    pub parallel_load: bool,

    /// Smallest batch that is shredded in parallel when `parallel_load` is set.
    pub min_parallel_batch: usize,

    /// Assemble the records of `assemble_range` on the rayon thread pool.
    pub parallel_assembly: bool,

    /// Number of consecutive records each parallel assembly task reconstructs.
    pub assembly_chunk_size: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            initial_capacity: 1024,
            parallel_load: true,
            min_parallel_batch: 64,
            parallel_assembly: true,
            assembly_chunk_size: 256,
        }
    }
}

impl TableOptions {
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_parallel_load(mut self, parallel_load: bool) -> Self {
        self.parallel_load = parallel_load;
        self
    }

    pub fn with_min_parallel_batch(mut self, min_parallel_batch: usize) -> Self {
        self.min_parallel_batch = min_parallel_batch;
        self
    }

    pub fn with_parallel_assembly(mut self, parallel_assembly: bool) -> Self {
        self.parallel_assembly = parallel_assembly;
        self
    }

    pub fn with_assembly_chunk_size(mut self, assembly_chunk_size: usize) -> Self {
        self.assembly_chunk_size = assembly_chunk_size;
        self
    }
}
