use std::path::PathBuf;

use clap::Parser;
use nova_core::config::Config;
use nova_core::server::OscServer;

/// OSC control front end of the nova synthesis server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// UDP port to listen on (overrides config)
    #[clap(short = 'u', long)]
    port: Option<u16>,
    /// Address to bind to (overrides config)
    #[clap(short = 'B', long)]
    bind: Option<String>,
    /// Initial packet dump mode, 0 or 1
    #[clap(short = 'd', long)]
    dump_osc: Option<u8>,
    /// Config file to use instead of the per-user one
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[clap(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();

    if TermLogger::init(log_level, config.clone(), TerminalMode::Stderr, ColorChoice::Auto).is_err() {
        let _ = SimpleLogger::init(log_level, config);
    }

    log::debug!("logging at {:?}", log_level);
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut settings = config.server_settings();
    if let Some(port) = args.port {
        settings.udp_port = port;
    }
    if let Some(bind) = args.bind {
        settings.bind_address = bind;
    }
    if let Some(mode) = args.dump_osc {
        settings.dump_osc = mode.min(1);
    }

    let server = OscServer::start(&settings)?;
    log::info!(
        "nova-server {} ready on {}",
        env!("CARGO_PKG_VERSION"),
        server.local_addr()
    );

    let exit = server.wait()?;
    log::info!("{} observers registered at exit", exit.observers.len());
    Ok(())
}
