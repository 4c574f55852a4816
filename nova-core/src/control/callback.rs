//! Deferred work produced by command handlers.

use std::net::SocketAddr;

use nova_types::Command;

use super::reply::Reply;
use super::ControlContext;

/// A unit of work queued by a handler and executed exactly once on the
/// control loop. Carries the endpoint it answers to.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemCallback {
    /// Acknowledge with `/done`, then stop the server.
    Quit { endpoint: SocketAddr },
    /// Subscribe or unsubscribe the sender, then acknowledge with `/done`.
    Notify { endpoint: SocketAddr, enable: bool },
    /// Answer with `status.reply`.
    Status { endpoint: SocketAddr },
    /// Set the packet dump mode (already clamped to 0 or 1).
    DumpOsc { mode: u8 },
    /// Answer with `/synced id` once everything queued before it has run.
    Sync { endpoint: SocketAddr, id: i32 },
}

impl SystemCallback {
    /// The command this callback was produced for.
    pub fn command(&self) -> Command {
        match self {
            SystemCallback::Quit { .. } => Command::Quit,
            SystemCallback::Notify { .. } => Command::Notify,
            SystemCallback::Status { .. } => Command::Status,
            SystemCallback::DumpOsc { .. } => Command::DumpOsc,
            SystemCallback::Sync { .. } => Command::Sync,
        }
    }

    /// Execute on the control loop. Send failures are logged; the peer only
    /// notices the missing reply.
    pub fn run(self, ctx: &mut ControlContext) {
        match self {
            SystemCallback::Quit { endpoint } => {
                ctx.reply(&Reply::done(), endpoint);
                log::info!(target: "control", "quit requested by {}", endpoint);
                ctx.terminate();
            }
            SystemCallback::Notify { endpoint, enable } => {
                if enable {
                    if ctx.observers_mut().add(endpoint) {
                        log::info!(target: "control", "{} subscribed to notifications", endpoint);
                    }
                } else if ctx.observers_mut().remove(&endpoint) {
                    log::info!(target: "control", "{} unsubscribed from notifications", endpoint);
                }
                ctx.reply(&Reply::done(), endpoint);
            }
            SystemCallback::Status { endpoint } => {
                let report = ctx.status_report();
                ctx.reply(&Reply::status(&report), endpoint);
            }
            SystemCallback::DumpOsc { mode } => {
                ctx.dump_osc().set(mode);
            }
            SystemCallback::Sync { endpoint, id } => {
                ctx.reply(&Reply::synced(id), endpoint);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::control::reply::{SharedTestSink, StatusReport, TestSink};
    use crate::control::ResponseTransport;
    use crate::osc::{parse_packet, Packet};
    use crate::DumpFlag;

    fn context() -> (ControlContext, Arc<TestSink>) {
        let sink = Arc::new(TestSink::new());
        let ctx = ControlContext::new(
            ResponseTransport::new(SharedTestSink(sink.clone())),
            DumpFlag::new(0),
        );
        (ctx, sink)
    }

    fn endpoint() -> SocketAddr {
        "127.0.0.1:57120".parse().unwrap()
    }

    fn reply_addresses(sink: &TestSink) -> Vec<String> {
        sink.sent()
            .iter()
            .map(|(_, bytes)| match parse_packet(bytes).unwrap() {
                Packet::Message(m) => m.address().to_string(),
                Packet::Bundle(_) => panic!("reply must be a message"),
            })
            .collect()
    }

    #[test]
    fn quit_acknowledges_then_terminates() {
        let (mut ctx, sink) = context();
        assert!(ctx.is_running());

        SystemCallback::Quit { endpoint: endpoint() }.run(&mut ctx);

        assert_eq!(reply_addresses(&sink), vec!["/done"]);
        assert_eq!(sink.sent()[0].0, endpoint());
        assert!(!ctx.is_running());
    }

    #[test]
    fn notify_round_trip() {
        let (mut ctx, sink) = context();

        SystemCallback::Notify { endpoint: endpoint(), enable: true }.run(&mut ctx);
        assert!(ctx.observers().contains(&endpoint()));

        SystemCallback::Notify { endpoint: endpoint(), enable: false }.run(&mut ctx);
        assert!(!ctx.observers().contains(&endpoint()));

        assert_eq!(reply_addresses(&sink), vec!["/done", "/done"]);
    }

    #[test]
    fn status_replies_to_sender() {
        let (mut ctx, sink) = context();
        SystemCallback::Status { endpoint: endpoint() }.run(&mut ctx);
        assert_eq!(reply_addresses(&sink), vec!["status.reply"]);
    }

    #[test]
    fn status_reports_current_metrics() {
        let (mut ctx, sink) = context();
        ctx.set_status_report(StatusReport {
            ugens: 12,
            synths: 2,
            groups: 1,
            synthdefs: 40,
            avg_cpu: 1.5,
            peak_cpu: 3.0,
            nominal_sample_rate: 48000.0,
            actual_sample_rate: 48000.0,
        });

        SystemCallback::Status { endpoint: endpoint() }.run(&mut ctx);

        let sent = sink.sent();
        let Packet::Message(msg) = parse_packet(&sent[0].1).unwrap() else {
            panic!("reply must be a message");
        };
        let mut args = msg.arg_stream();
        assert_eq!(args.int32(), Ok(1));
        assert_eq!(args.int32(), Ok(12));
        assert_eq!(args.int32(), Ok(2));
        assert_eq!(args.int32(), Ok(1));
        assert_eq!(args.int32(), Ok(40));
        assert_eq!(args.float32(), Ok(1.5));
        assert_eq!(args.float32(), Ok(3.0));
        assert_eq!(args.remaining(), 2);
    }

    #[test]
    fn dump_osc_sets_flag_without_reply() {
        let (mut ctx, sink) = context();
        SystemCallback::DumpOsc { mode: 1 }.run(&mut ctx);
        assert_eq!(ctx.dump_osc().get(), 1);
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn command_mapping() {
        assert_eq!(SystemCallback::Status { endpoint: endpoint() }.command(), Command::Status);
        assert_eq!(SystemCallback::DumpOsc { mode: 0 }.command(), Command::DumpOsc);
        assert_eq!(SystemCallback::Sync { endpoint: endpoint(), id: 3 }.command(), Command::Sync);
    }
}
