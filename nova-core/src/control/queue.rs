//! System callback queue and the control loop that drains it.
//!
//! Handlers on the receive thread push callbacks into an unbounded channel;
//! a dedicated control thread executes them one at a time. Replies, observer
//! changes and the dump flag are only touched from that thread.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::callback::SystemCallback;
use super::ControlContext;

/// Create a connected sender/receiver pair.
pub fn callback_queue() -> (CallbackSender, CallbackReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (CallbackSender { tx }, CallbackReceiver { rx })
}

/// Producer half. Cheap to clone; one per receive thread.
#[derive(Clone)]
pub struct CallbackSender {
    tx: Sender<SystemCallback>,
}

impl CallbackSender {
    /// Hand ownership of a callback to the queue. Returns `false` if the
    /// control loop has already exited, in which case the callback is dropped.
    pub fn enqueue(&self, callback: SystemCallback) -> bool {
        match self.tx.send(callback) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(target: "control", "control loop gone, dropping {}", e.0.command());
                false
            }
        }
    }

    /// Number of callbacks waiting to run.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer half, owned by the control loop.
pub struct CallbackReceiver {
    rx: Receiver<SystemCallback>,
}

impl CallbackReceiver {
    /// Run every callback queued right now, in FIFO order. Returns how many ran.
    pub fn run_pending(&self, ctx: &mut ControlContext) -> usize {
        let mut count = 0;
        while let Ok(callback) = self.rx.try_recv() {
            callback.run(ctx);
            count += 1;
        }
        count
    }

    /// Remove queued callbacks without running them.
    pub fn take_pending(&self) -> Vec<SystemCallback> {
        self.rx.try_iter().collect()
    }

    /// Execute callbacks until one of them terminates the context or every
    /// sender is gone. Whatever was already queued at termination still runs.
    pub fn run(self, ctx: &mut ControlContext, poll_interval: Duration) {
        while ctx.is_running() {
            match self.rx.recv_timeout(poll_interval) {
                Ok(callback) => callback.run(ctx),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let drained = self.run_pending(ctx);
        if drained > 0 {
            log::debug!(target: "control", "drained {} callbacks after shutdown", drained);
        }
        ctx.terminate();
    }
}

/// Spawn the control thread. Joining it yields the final context.
pub fn spawn_control_loop(
    receiver: CallbackReceiver,
    mut ctx: ControlContext,
    poll_interval: Duration,
) -> io::Result<JoinHandle<ControlContext>> {
    thread::Builder::new()
        .name("osc-control".into())
        .spawn(move || {
            receiver.run(&mut ctx, poll_interval);
            ctx
        })
}
