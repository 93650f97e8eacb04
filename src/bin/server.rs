//! sockscope server daemon.
//!
//! Binds the host socket bank, prints the startup banner, and serves the
//! monitor loop until a fatal error.
//!
//! # Usage
//!
//! ```sh
//! sockscope-server --bind 0.0.0.0:2231 --slots 8 --reserve 3
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use sockscope::console;
use sockscope::net::{DeviceError, NetDevice};
use sockscope::pool::MAX_SOCKETS;
use sockscope::{Endpoint, HostDevice, Monitor, MonitorConfig, MonitorError, SlotIndex};

/// Default bind address.
const DEFAULT_BIND: &str = "0.0.0.0:2231";

/// Default number of slots in the bank.
const DEFAULT_SLOTS: usize = MAX_SOCKETS;

#[derive(Debug, Error)]
enum ServerError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}

struct ServerOptions {
    bind: Endpoint,
    slots: usize,
    reserve: Vec<SlotIndex>,
    config: MonitorConfig,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("sockscope-server: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), ServerError> {
    sockscope::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args)?;

    let device = HostDevice::bind(options.bind, options.slots, &options.reserve)?;
    println!(
        "{}",
        console::banner(device.local_endpoint(), options.slots)
    );

    let mut monitor = Monitor::new(device, options.config);
    monitor.run()?;
    Ok(())
}

/// Parses command line arguments into ServerOptions.
fn parse_args(args: &[String]) -> Result<ServerOptions, ServerError> {
    let mut bind: Option<SocketAddr> = None;
    let mut slots = DEFAULT_SLOTS;
    let mut reserve: Vec<SlotIndex> = Vec::new();
    let mut config = MonitorConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                i += 1;
                if i >= args.len() {
                    return Err(ServerError::Usage("missing value for --bind".into()));
                }
                let addr: SocketAddr = args[i].parse().map_err(|_| {
                    ServerError::Usage(format!("invalid value for --bind: {}", args[i]))
                })?;
                bind = Some(addr);
            }
            "--slots" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err(ServerError::Usage("missing value for --slots".into()));
                }
                slots = args[i].parse().map_err(|_| {
                    ServerError::Usage(format!("invalid value for --slots: {}", args[i]))
                })?;
            }
            "--reserve" | "-r" => {
                i += 1;
                if i >= args.len() {
                    return Err(ServerError::Usage("missing value for --reserve".into()));
                }
                let slot: u8 = args[i].parse().map_err(|_| {
                    ServerError::Usage(format!("invalid value for --reserve: {}", args[i]))
                })?;
                if slot as usize >= MAX_SOCKETS {
                    return Err(ServerError::Usage(format!(
                        "reserve slot out of range: {slot}"
                    )));
                }
                reserve.push(SlotIndex::new(slot));
            }
            "--heartbeat" => {
                i += 1;
                if i >= args.len() {
                    return Err(ServerError::Usage("missing value for --heartbeat".into()));
                }
                let secs: u64 = args[i].parse().map_err(|_| {
                    ServerError::Usage(format!("invalid value for --heartbeat: {}", args[i]))
                })?;
                if secs == 0 {
                    return Err(ServerError::Usage(
                        "heartbeat must be greater than zero".into(),
                    ));
                }
                config = config.with_heartbeat_interval(Duration::from_secs(secs));
            }
            "--tick-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err(ServerError::Usage("missing value for --tick-ms".into()));
                }
                let millis: u64 = args[i].parse().map_err(|_| {
                    ServerError::Usage(format!("invalid value for --tick-ms: {}", args[i]))
                })?;
                config = config.with_tick_interval(Duration::from_millis(millis));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => {
                return Err(ServerError::Usage(format!("unknown argument: {arg}")));
            }
        }
        i += 1;
    }

    let bind = bind.unwrap_or_else(|| {
        DEFAULT_BIND
            .parse()
            .expect("default bind address is valid")
    });

    Ok(ServerOptions {
        bind: Endpoint::from(bind),
        slots,
        reserve,
        config,
    })
}

fn print_usage() {
    eprintln!(
        r#"sockscope-server - socket pool monitor and heartbeat server

USAGE:
    sockscope-server [OPTIONS]

OPTIONS:
    -b, --bind <ADDR>       Bind address (default: 0.0.0.0:2231)
    -s, --slots <N>         Number of sockets in the bank, 1-8 (default: 8)
    -r, --reserve <N>       Mark a slot reserved, 1-7 (can be repeated)
        --heartbeat <SECS>  Heartbeat interval in seconds (default: 2)
        --tick-ms <MS>      Loop pacing in milliseconds (default: 1)
    -h, --help              Print this help message

EXAMPLE:
    sockscope-server --bind 0.0.0.0:2231 --slots 4
    sockscope-server --reserve 1 --reserve 2 --heartbeat 5
"#
    );
}
