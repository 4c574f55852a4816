//! Control execution context: everything that runs off the receive thread.
//!
//! Command handlers never reply or mutate shared state directly. They queue
//! a [`SystemCallback`]; the control loop runs it against [`ControlContext`].

mod callback;
mod observers;
mod queue;
mod reply;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use callback::SystemCallback;
pub use observers::ObserverRegistry;
pub use queue::{callback_queue, spawn_control_loop, CallbackReceiver, CallbackSender};
pub use reply::{
    NullSink, Reply, ReplySink, ResponseTransport, SharedTestSink, StatusReport, TestSink,
    SMALL_REPLY_CAPACITY, STATUS_REPLY_CAPACITY,
};

use crate::DumpFlag;

/// State owned by the control loop.
pub struct ControlContext {
    observers: ObserverRegistry,
    transport: ResponseTransport,
    dump_osc: DumpFlag,
    status: StatusReport,
    /// Cleared by `quit`; shared with the receive thread so it stops too.
    running: Arc<AtomicBool>,
}

impl ControlContext {
    pub fn new(transport: ResponseTransport, dump_osc: DumpFlag) -> Self {
        Self {
            observers: ObserverRegistry::new(),
            transport,
            dump_osc,
            status: StatusReport::unknown(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Share the shutdown flag with another thread.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request shutdown. Idempotent.
    pub fn terminate(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn observers_mut(&mut self) -> &mut ObserverRegistry {
        &mut self.observers
    }

    pub fn dump_osc(&self) -> &DumpFlag {
        &self.dump_osc
    }

    pub fn status_report(&self) -> StatusReport {
        self.status
    }

    /// Replace the metrics reported by `/status`.
    pub fn set_status_report(&mut self, report: StatusReport) {
        self.status = report;
    }

    /// Send a reply, logging (not propagating) transport failures.
    pub fn reply(&self, reply: &Reply, endpoint: SocketAddr) {
        if let Err(e) = self.transport.send(reply, endpoint) {
            log::warn!(target: "control", "failed to send {} to {}: {}", reply.address(), endpoint, e);
        }
    }
}
