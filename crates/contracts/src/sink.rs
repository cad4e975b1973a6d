//! Output sinks: consumers of the engine's per-event `TickOutput`.

use crate::{ContractError, TickOutput};

/// A destination for engine outputs (a log, a JSONL recording, a renderer bridge).
///
/// Each sink runs behind its own queue and writer task, so `write` may
/// take as long as it needs without stalling the engine. Outputs arrive
/// in `tick_id` order; a sink may miss view-only updates under load but
/// never a layer, route or signal change.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Name used in logs and metric labels
    fn name(&self) -> &str;

    /// Consume one output batch
    async fn write(&mut self, output: &TickOutput) -> Result<(), ContractError>;

    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Release resources; called once after the last write
    async fn close(&mut self) -> Result<(), ContractError>;
}
