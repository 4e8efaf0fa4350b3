use std::ptr::NonNull;

/// Liveness test supplied by the collector.
///
/// `sweep_object` is called exactly once per occupied block per sweep. It
/// returns whether the block at `object` survives, and may push finalization
/// work for a dead block onto `finalizer_queue`.
pub trait SweepScope {
    type FinalizerQueue;

    fn sweep_object(&mut self, object: NonNull<u8>, finalizer_queue: &mut Self::FinalizerQueue) -> bool;
}
