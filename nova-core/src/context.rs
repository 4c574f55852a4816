//! Receive-side context threaded through the parser and dispatcher.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::control::{CallbackSender, SystemCallback};
use crate::stats::ReceiveStats;

/// Process-wide packet dump mode: 0 off, 1 print every received packet.
///
/// Written by the control loop, read by the receive thread.
#[derive(Debug, Clone, Default)]
pub struct DumpFlag(Arc<AtomicU8>);

impl DumpFlag {
    pub fn new(mode: u8) -> Self {
        let flag = Self::default();
        flag.set(mode);
        flag
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }

    /// Any nonzero mode is stored as 1; only one dump style exists.
    pub fn set(&self, mode: u8) {
        self.0.store(mode.min(1), Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.get() != 0
    }
}

/// What the dispatcher needs from the server: somewhere to queue callbacks,
/// the dump flag, and the receive counters.
#[derive(Clone)]
pub struct ServerContext {
    callbacks: CallbackSender,
    dump_osc: DumpFlag,
    stats: Arc<ReceiveStats>,
}

impl ServerContext {
    pub fn new(callbacks: CallbackSender, dump_osc: DumpFlag) -> Self {
        Self {
            callbacks,
            dump_osc,
            stats: Arc::new(ReceiveStats::default()),
        }
    }

    pub fn enqueue(&self, callback: SystemCallback) -> bool {
        self.callbacks.enqueue(callback)
    }

    pub fn dump_osc(&self) -> &DumpFlag {
        &self.dump_osc
    }

    pub fn stats(&self) -> &Arc<ReceiveStats> {
        &self.stats
    }
}
