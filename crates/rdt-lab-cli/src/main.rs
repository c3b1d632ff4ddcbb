mod udp;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rdt_lab_engine::{Receiver, Sender};
use rdt_lab_sim::{SimulationReport, scenario_runner};

use crate::udp::UdpTransport;

#[derive(Parser, Debug)]
#[command(author, version, about = "Alternating-bit reliable delivery over UDP")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reliably send numbered test messages to a receiver.
    Send {
        /// Local address to bind the UDP socket to.
        #[arg(long, default_value = "127.0.0.1:0")]
        bind: SocketAddr,
        /// Receiver address.
        #[arg(long, default_value = "127.0.0.1:11555")]
        peer: SocketAddr,
        /// How many messages (msg1..msgN) to deliver.
        #[arg(long, default_value_t = 9)]
        count: u32,
        /// Retransmission timeout in milliseconds.
        #[arg(long, default_value_t = 3000)]
        timeout_ms: u64,
    },
    /// Run the receiving role, printing each in-order message.
    Recv {
        #[arg(long, default_value = "0.0.0.0:11555")]
        bind: SocketAddr,
    },
    /// Run a TOML scenario over the simulated channel.
    Simulate {
        #[arg(long)]
        scenario: PathBuf,
        /// Write a JSON report of the finished run.
        #[arg(long)]
        trace_out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::Send {
            bind,
            peer,
            count,
            timeout_ms,
        } => run_sender(bind, peer, count, timeout_ms),
        Command::Recv { bind } => run_receiver(bind),
        Command::Simulate {
            scenario,
            trace_out,
        } => run_simulation(&scenario, trace_out.as_deref()),
    }
}

fn run_sender(bind: SocketAddr, peer: SocketAddr, count: u32, timeout_ms: u64) -> Result<()> {
    let transport = UdpTransport::bind_to_peer(bind, peer)
        .with_context(|| format!("failed to bind sender socket to {bind}"))?;
    let mut sender = Sender::with_timeout(transport, Duration::from_millis(timeout_ms));

    for i in 1..=count {
        let message = format!("msg{i}");
        info!("sending {message:?}");
        let delivery = sender
            .send(&message)
            .with_context(|| format!("delivering {message:?}"))?;
        info!(
            "{message:?} confirmed under seq {} after {} retransmissions",
            delivery.seq, delivery.retransmits
        );
    }

    info!(
        "all {count} messages delivered ({} datagrams, {} retransmissions)",
        sender.datagrams_sent(),
        sender.retransmits()
    );
    Ok(())
}

fn run_receiver(bind: SocketAddr) -> Result<()> {
    let transport =
        UdpTransport::bind(bind).with_context(|| format!("failed to bind receiver to {bind}"))?;
    info!("receiver listening on {bind}");

    let mut receiver = Receiver::new(transport);
    let mut count = 0u64;
    receiver.run(|payload| {
        count += 1;
        println!("[{count}] {}", String::from_utf8_lossy(&payload));
    })?;
    Ok(())
}

fn run_simulation(scenario: &Path, trace_out: Option<&Path>) -> Result<()> {
    let report = scenario_runner::run_scenario_file(scenario)?;
    info!(
        "scenario finished in {}ms: {} delivered, {} datagrams, {} retransmissions",
        report.duration_ms,
        report.delivered.len(),
        report.sender_datagrams,
        report.retransmits
    );
    if let Some(path) = trace_out {
        write_trace(path, &report)?;
    }
    Ok(())
}

fn write_trace(path: &Path, report: &SimulationReport) -> Result<()> {
    let data = serde_json::to_vec_pretty(report).context("failed to serialize report")?;
    fs::write(path, &data)
        .with_context(|| format!("failed to write trace file {}", path.display()))?;
    info!("trace written to {}", path.display());
    Ok(())
}
