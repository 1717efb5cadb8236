mod manager;
mod probes;

pub use manager::{RecoveryContext, RecoveryManager};
pub use probes::{probe_tool, write_delete_probe};

#[cfg(test)]
mod tests;
