//! read-tag: print the value of one PLC symbol.
//!
//! ```text
//! read-tag [--router <ip[:port]>] [--source <netid:port>] [--timeout <ms>]
//!          [--type <TYPE>] <endpoint> <tag-name>
//! ```
//!
//! The value alone goes to stdout. Every failure goes to stderr with a
//! non-zero exit status and nothing on stdout, so a calling process can
//! capture the output without parsing prose.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use beckhoff_ads::{
    parse_router_addr, AdsError, AdsType, AdsValue, AmsAddr, Client, ClientConfig, Result,
    ADS_TCP_PORT, DEFAULT_TIMEOUT, PORT_TC3PLC1,
};

const USAGE: &str = "Usage: read-tag [--router <ip[:port]>] [--source <netid:port>] \
[--timeout <ms>] [--type <TYPE>] <endpoint> <tag-name>";

#[derive(Debug)]
struct Options {
    router: SocketAddr,
    source: Option<AmsAddr>,
    timeout: Duration,
    ty: AdsType,
    target: AmsAddr,
    tag: String,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut router = SocketAddr::from(([127, 0, 0, 1], ADS_TCP_PORT));
    let mut source = None;
    let mut timeout = DEFAULT_TIMEOUT;
    let mut ty = AdsType::Real;
    let mut positional = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| AdsError::invalid_parameter(flag, "missing value"))
        };
        match arg.as_str() {
            "--router" | "-r" => router = parse_router_addr(&value("router")?)?,
            "--source" | "-s" => source = Some(value("source")?.parse()?),
            "--timeout" | "-t" => {
                let ms = value("timeout")?;
                let ms: u64 = ms.parse().map_err(|_| {
                    AdsError::invalid_parameter("timeout", format!("'{ms}' is not milliseconds"))
                })?;
                timeout = Duration::from_millis(ms);
            }
            "--type" => ty = value("type")?.parse()?,
            flag if flag.starts_with("--") => {
                return Err(AdsError::invalid_parameter(flag, "unknown option"));
            }
            _ => positional.push(arg),
        }
    }

    let [endpoint, tag]: [String; 2] = positional.try_into().map_err(|_| {
        AdsError::invalid_parameter("arguments", "expected <endpoint> <tag-name>")
    })?;

    Ok(Options {
        router,
        source,
        timeout,
        ty,
        target: AmsAddr::parse_with_default_port(&endpoint, PORT_TC3PLC1)?,
        tag,
    })
}

fn read(options: &Options) -> Result<AdsValue> {
    let mut config = ClientConfig::new(options.target)
        .with_router(options.router)
        .with_timeout(options.timeout);
    if let Some(source) = options.source {
        config = config.with_source(source);
    }

    let mut client = Client::new(config);
    client.open()?;
    let value = client.read_by_name(&options.tag, options.ty);
    client.close();
    value
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match read(&options) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::debug!("read of '{}' from {} failed: {e:?}", options.tag, options.target);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
