/// Number of consecutive engine steps run before the stepper yields to the host.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Minimum time between two emitted snapshots, in milliseconds.
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 1000;
