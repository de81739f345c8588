use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use snmp_reader::config::{persist, AppSettings};
use snmp_reader::{DisplaySink, Monitor, ReaderId};
use snmp_reader_core::DEFAULT_PORT;
use snmp_reader_snmp::{check_oid, probe, resolve, UdpConnector};
use snmp_reader_types::SnmpVersion;
use std::path::{Path, PathBuf};

/// snmp-reader - poll SNMP devices and show what they report
#[derive(Parser, Debug)]
#[command(name = "snmp-reader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0", global = true)]
    debug: u8,

    /// Settings file to use instead of the one in the config directory
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the configured readers and print what they display
    Run {
        /// Readers file (default: readers.conf next to the settings)
        #[arg(value_name = "READERS_FILE")]
        readers: Option<PathBuf>,

        /// Stop after this many ticks
        #[arg(short = 'n', long = "ticks", value_name = "N")]
        ticks: Option<u64>,
    },

    /// Ask a device for its system group
    Probe {
        /// Host name or address, optionally followed by :udp or :udp6
        host: String,

        #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(short = 'C', long = "community", default_value = "public")]
        community: String,

        /// Speak SNMPv2c instead of SNMPv1
        #[arg(long = "v2c")]
        v2c: bool,
    },

    /// Check whether an OID string resolves, and to what
    CheckOid { oid: String },
}

/// Prints everything the monitor publishes
struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn set_label(&mut self, reader: ReaderId, text: &str) {
        println!("{} {}", reader, text);
    }

    fn set_tooltip(&mut self, reader: ReaderId, text: &str) {
        for line in text.lines() {
            println!("{}   | {}", reader, line);
        }
    }

    fn store_chart_point(&mut self, reader: ReaderId, series: usize, value: i64) {
        log::debug!("{} chart[{}] <- {}", reader, series, value);
    }
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = dispatch(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => AppSettings::load_from_path(path)?,
        None => AppSettings::load()?,
    };

    match cli.command {
        Command::Run { readers, ticks } => {
            let readers = match (readers, &cli.config) {
                (Some(path), _) => path,
                (None, Some(config)) => config.with_file_name("readers.conf"),
                (None, None) => AppSettings::readers_path()?,
            };
            run(&settings, &readers, ticks)
        }
        Command::Probe {
            host,
            port,
            community,
            v2c,
        } => {
            let version = if v2c { SnmpVersion::V2c } else { SnmpVersion::V1 };
            let text = runtime()?
                .block_on(probe(
                    &mut UdpConnector::new(),
                    &host,
                    port,
                    version,
                    &community,
                    settings.session_settings(),
                ))
                .with_context(|| format!("Probe of {} failed", host))?;
            print!("{}", text);
            Ok(())
        }
        Command::CheckOid { oid } => {
            if !check_oid(&oid) {
                anyhow::bail!("Invalid OID: {}", oid);
            }
            let numeric = resolve(&oid)?;
            println!("{} = {}", oid, numeric);
            Ok(())
        }
    }
}

/// Sockets are registered with this runtime's reactor
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

fn run(settings: &AppSettings, readers_path: &Path, ticks: Option<u64>) -> Result<()> {
    let rt = runtime()?;
    let _guard = rt.enter();
    let mut monitor = Monitor::new(Box::new(UdpConnector::new()), settings.session_settings())
        .with_budgets(settings.label_budget, settings.info_budget);

    for (n, line) in persist::load_file(readers_path)?.iter().enumerate() {
        match monitor.load_config_line(line) {
            Ok(errors) => {
                for e in errors {
                    warn!("{}:{}: {}", readers_path.display(), n + 1, e);
                }
            }
            Err(e) => warn!("{}:{}: {}", readers_path.display(), n + 1, e),
        }
    }
    if monitor.readers().is_empty() {
        warn!("No readers configured in {:?}", readers_path);
        return Ok(());
    }
    info!(
        "Polling {} readers every {:?}",
        monitor.readers().len(),
        settings.tick_interval()
    );

    let mut sink = ConsoleSink;
    rt.block_on(async {
        let mut interval = tokio::time::interval(settings.tick_interval());
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    monitor.tick(&mut sink);
                    if ticks.map_or(false, |limit| monitor.ticks() >= limit) {
                        break;
                    }
                }
                _ = &mut ctrl_c => {
                    info!("Interrupted");
                    break;
                }
            }
        }
    });

    persist::save_file(readers_path, &monitor.persist_config())?;
    monitor.clear();
    Ok(())
}
