//! UDP front end: a receive thread that parses and dispatches datagrams, and
//! a control thread that executes the callbacks they produce.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::ServerSettings;
use crate::context::{DumpFlag, ServerContext};
use crate::control::{callback_queue, spawn_control_loop, ControlContext, ObserverRegistry, ResponseTransport};
use crate::dispatch;
use crate::osc::ReceivedPacket;
use crate::stats::{ReceiveStats, StatsSnapshot};

/// Handle to a running server. Dropping it stops both threads.
pub struct OscServer {
    local_addr: SocketAddr,
    running: Arc<AtomicBool>,
    stats: Arc<ReceiveStats>,
    dump_osc: DumpFlag,
    recv_thread: Option<JoinHandle<()>>,
    control_thread: Option<JoinHandle<ControlContext>>,
}

/// State left behind once the server has stopped.
#[derive(Debug)]
pub struct ServerExit {
    pub stats: StatsSnapshot,
    pub observers: ObserverRegistry,
}

impl OscServer {
    /// Bind to the configured address and start serving.
    pub fn start(settings: &ServerSettings) -> io::Result<Self> {
        let socket = UdpSocket::bind((settings.bind_address.as_str(), settings.udp_port))?;
        Self::with_socket(socket, settings)
    }

    /// Serve on an already bound socket. Address and port in `settings` are
    /// ignored.
    pub fn with_socket(socket: UdpSocket, settings: &ServerSettings) -> io::Result<Self> {
        let local_addr = socket.local_addr()?;
        let reply_socket = socket.try_clone()?;
        socket.set_read_timeout(Some(settings.poll_interval))?;

        let dump_osc = DumpFlag::new(settings.dump_osc);
        let (callback_tx, callback_rx) = callback_queue();
        let control = ControlContext::new(ResponseTransport::new(reply_socket), dump_osc.clone());
        let running = control.running_flag();
        let ctx = ServerContext::new(callback_tx, dump_osc.clone());
        let stats = Arc::clone(ctx.stats());

        let control_thread = spawn_control_loop(callback_rx, control, settings.poll_interval)?;

        let recv_running = Arc::clone(&running);
        let max_packet_size = settings.max_packet_size;
        let recv_thread = thread::Builder::new()
            .name("osc-recv".into())
            .spawn(move || receive_loop(socket, ctx, recv_running, max_packet_size));
        let recv_thread = match recv_thread {
            Ok(handle) => handle,
            Err(e) => {
                // The control loop exits once its senders are gone
                running.store(false, Ordering::Release);
                let _ = control_thread.join();
                return Err(e);
            }
        };

        log::info!(target: "osc::recv", "listening on udp {}", local_addr);

        Ok(Self {
            local_addr,
            running,
            stats,
            dump_osc,
            recv_thread: Some(recv_thread),
            control_thread: Some(control_thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// False once `quit` has executed or [`OscServer::stop`] was called.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn dump_osc(&self) -> u8 {
        self.dump_osc.get()
    }

    /// Block until a client sends `quit`, then shut down.
    pub fn wait(mut self) -> io::Result<ServerExit> {
        self.join()
    }

    /// Shut down without waiting for `quit`.
    pub fn stop(mut self) -> io::Result<ServerExit> {
        self.running.store(false, Ordering::Release);
        self.join()
    }

    fn join(&mut self) -> io::Result<ServerExit> {
        let control = match self.control_thread.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| io::Error::other("control thread panicked"))?,
            None => return Err(io::Error::other("server already stopped")),
        };
        // The control loop only returns after clearing the running flag
        if let Some(handle) = self.recv_thread.take() {
            handle
                .join()
                .map_err(|_| io::Error::other("receive thread panicked"))?;
        }

        let stats = self.stats.snapshot();
        log::info!(target: "osc::recv", "stopped: {}", stats);
        Ok(ServerExit {
            stats,
            observers: control.observers().clone(),
        })
    }
}

impl Drop for OscServer {
    fn drop(&mut self) {
        if self.control_thread.is_some() {
            self.running.store(false, Ordering::Release);
            let _ = self.join();
        }
    }
}

fn receive_loop(socket: UdpSocket, ctx: ServerContext, running: Arc<AtomicBool>, max_packet_size: usize) {
    let mut buf = vec![0u8; max_packet_size];
    while running.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                let packet = ReceivedPacket::alloc(&buf[..n], from);
                dispatch::handle_packet(&packet, &ctx);
            }
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            // ICMP port unreachable from an earlier reply surfaces here on some platforms
            Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
            Err(e) => {
                log::error!(target: "osc::recv", "receive failed, stopping: {}", e);
                running.store(false, Ordering::Release);
                break;
            }
        }
    }
}
