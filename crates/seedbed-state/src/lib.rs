mod tracker;

pub use tracker::{Checkpoint, CheckpointStatus, RollbackPoint, StateTracker};

#[cfg(test)]
mod tests;
