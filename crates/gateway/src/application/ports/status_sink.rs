use vizora_core::DisplayStatusUpdate;

/// Outbound path for liveness/status changes to external persistence
///
/// Both methods return immediately; writes happen in the background and
/// failures are retried, so a slow or broken directory never stalls a
/// device connection.
pub trait StatusSink: Send + Sync {
    /// Stage an update, coalesced with later updates for the same display
    /// and written on the next periodic flush
    fn enqueue(&self, update: DisplayStatusUpdate);

    /// Stage an update and start writing it right away
    fn write_through(&self, update: DisplayStatusUpdate);
}
