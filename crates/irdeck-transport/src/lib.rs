//! irdeck-transport: the push status channel.
//!
//! One WebSocket connection per open wizard, decoded frames delivered
//! over an mpsc channel, reconnects governed by a pure backoff policy
//! with a circuit breaker that tells the caller to lean on HTTP polling.

pub mod backoff;
pub mod stream;

pub use backoff::{ReconnectDecision, ReconnectPolicy, ReconnectTracker};
pub use stream::{StreamEvent, StreamHandle, agent_log_stream, learn_status_stream};
