use parking_lot::{Mutex, MutexGuard};

use super::constants::{DEFAULT_BATCH_SIZE, DEFAULT_SNAPSHOT_INTERVAL};

/// Options passed throughout the program.
pub struct Options {
    /// Number of consecutive engine steps per batch before yielding to the host
    pub batch_size: usize,

    /// Minimum time between emitted snapshots, in milliseconds
    pub snapshot_interval: u64,

    /// Whether call boundaries trigger reachability collections
    pub collect_garbage: bool,

    /// Buffer to write all dumped output into instead of stdout
    pub dump_buffer: Option<Mutex<String>>,
}

impl Options {
    pub fn dump_buffer(&self) -> Option<MutexGuard<'_, String>> {
        self.dump_buffer.as_ref().map(|buffer| buffer.lock())
    }
}

impl Default for Options {
    /// Create a new options struct with default values.
    fn default() -> Self {
        OptionsBuilder::new().build()
    }
}

pub struct OptionsBuilder(Options);

impl OptionsBuilder {
    /// Create new options with default values.
    pub fn new() -> Self {
        Self(Options {
            batch_size: DEFAULT_BATCH_SIZE,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            collect_garbage: true,
            dump_buffer: None,
        })
    }

    /// Return the options that have been built, consuming the builder.
    pub fn build(self) -> Options {
        self.0
    }

    /// A batch always runs at least one step.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.0.batch_size = batch_size.max(1);
        self
    }

    pub fn snapshot_interval(mut self, snapshot_interval: u64) -> Self {
        self.0.snapshot_interval = snapshot_interval;
        self
    }

    pub fn collect_garbage(mut self, collect_garbage: bool) -> Self {
        self.0.collect_garbage = collect_garbage;
        self
    }

    pub fn dump_buffer(mut self, dump_buffer: Option<Mutex<String>>) -> Self {
        self.0.dump_buffer = dump_buffer;
        self
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
