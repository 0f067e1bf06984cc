//! Notification and metrics sinks.
//!
//! The engine never owns these: they are injected collaborators rather than a hard-wired
//! transport. There is no actor runtime in scope, so the seam is a plain trait: calls must be
//! synchronous, fire-and-forget, and must not re-enter the engine.

use crate::id::Id;

/// Receives `issue` / `accept` / `reject` notifications for vertices as the engine decides them.
pub trait Dispatcher {
    fn issue(&self, chain_id: Id, vertex_id: Id, bytes: &[u8]);
    fn accept(&self, chain_id: Id, vertex_id: Id, bytes: &[u8]);
    fn reject(&self, chain_id: Id, vertex_id: Id, bytes: &[u8]);
}

/// Records issued/accepted/rejected counts per vertex.
///
/// No concrete metrics backend is bundled: wiring this to Prometheus, StatsD or anything else is
/// an external concern.
pub trait Metrics {
    fn issued(&self, vertex_id: Id);
    fn accepted(&self, vertex_id: Id);
    fn rejected(&self, vertex_id: Id);
}

/// A [Dispatcher] that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDispatcher;

impl Dispatcher for NoopDispatcher {
    fn issue(&self, _chain_id: Id, _vertex_id: Id, _bytes: &[u8]) {}
    fn accept(&self, _chain_id: Id, _vertex_id: Id, _bytes: &[u8]) {}
    fn reject(&self, _chain_id: Id, _vertex_id: Id, _bytes: &[u8]) {}
}

/// A [Metrics] sink that records nothing.
///
/// Used when the caller's metrics registry fails to initialize: the failure is logged
/// upstream and the engine falls back to this no-op rather than treating it as fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn issued(&self, _vertex_id: Id) {}
    fn accepted(&self, _vertex_id: Id) {}
    fn rejected(&self, _vertex_id: Id) {}
}
