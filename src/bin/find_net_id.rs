//! find-net-id: print the AMS Net ID of the local router.
//!
//! ```text
//! find-net-id [--router <ip[:port]>] [--timeout <ms>]
//! ```
//!
//! Prints `NET_ID:<a.b.c.d.e.f>` on success.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use beckhoff_ads::{
    parse_router_addr, router_address, AdsError, AmsNetId, Result, ADS_TCP_PORT, DEFAULT_TIMEOUT,
};

const USAGE: &str = "Usage: find-net-id [--router <ip[:port]>] [--timeout <ms>]";

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<(SocketAddr, Duration)> {
    let mut router = SocketAddr::from(([127, 0, 0, 1], ADS_TCP_PORT));
    let mut timeout = DEFAULT_TIMEOUT;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| AdsError::invalid_parameter(flag, "missing value"))
        };
        match arg.as_str() {
            "--router" | "-r" => router = parse_router_addr(&value("router")?)?,
            "--timeout" | "-t" => {
                let ms = value("timeout")?;
                let ms: u64 = ms.parse().map_err(|_| {
                    AdsError::invalid_parameter("timeout", format!("'{ms}' is not milliseconds"))
                })?;
                timeout = Duration::from_millis(ms);
            }
            other => return Err(AdsError::invalid_parameter(other, "unexpected argument")),
        }
    }

    Ok((router, timeout))
}

fn find(router: SocketAddr, timeout: Duration) -> Result<AmsNetId> {
    Ok(router_address(router, timeout)?.net_id())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let (router, timeout) = match parse_args(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match find(router, timeout) {
        Ok(net_id) => {
            println!("NET_ID:{net_id}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
