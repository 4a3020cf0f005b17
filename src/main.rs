use std::path::PathBuf;
use std::sync::mpsc;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use radiobuf::config::FileConfig;
use radiobuf::discovery::{DiscoveryListener, DISCOVERY_PORT};
use radiobuf::receive::{self, ReceiveOpt};
use radiobuf::source::{self, SendOpt};
use radiobuf::RunError;

#[derive(StructOpt)]
struct Opt {
    /// Config file, defaults to radiobuf.toml in the XDG config directory
    #[structopt(long, env = "RADIOBUF_CONFIG", parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Receive audio packets and play them through the jitter buffer
    Receive(ReceiveOpt),
    /// Send raw PCM from stdin as audio packets
    Send(SendOpt),
    /// Print server endpoints announced on the local network
    Discover(DiscoverOpt),
}

#[derive(StructOpt)]
struct DiscoverOpt {
    #[structopt(long, env = "RADIOBUF_DISCOVERY_PORT")]
    port: Option<u16>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info")))
        // stdout may be carrying audio
        .with_writer(std::io::stderr)
        .init();

    let opt = Opt::from_args();

    if let Err(e) = run(opt) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), RunError> {
    let file = FileConfig::load(opt.config.as_deref())?;

    match opt.command {
        Command::Receive(opt) => receive::run(opt, file),
        Command::Send(opt) => source::run(opt, file),
        Command::Discover(opt) => {
            let port = opt.port
                .or(file.discovery.port)
                .unwrap_or(DISCOVERY_PORT);

            let (tx, rx) = mpsc::channel();
            let _listener = DiscoveryListener::start(port, move |endpoint| {
                let _ = tx.send(endpoint);
            }).map_err(RunError::Listen)?;

            for endpoint in rx {
                println!("{endpoint}");
            }

            Ok(())
        }
    }
}
