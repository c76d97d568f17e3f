//! Command-line front end for the pilot protocol.
//!
//! Run with: cargo run --example wiz_cli -- --help

use std::net::Ipv4Addr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use wiz_pilot::{
    Brightness, Candidate, Kelvin, Light, Mired, PilotConfig, discover, scan_candidates,
};

#[derive(Parser)]
#[command(name = "wiz-cli")]
#[command(about = "Query and control WiZ bulbs on the local network", long_about = None)]
struct Cli {
    /// IP address of the bulb (for per-device commands)
    #[arg(short, long, global = true)]
    ip: Option<Ipv4Addr>,

    /// Reply timeout in milliseconds
    #[arg(short, long, global = true, default_value = "1000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Broadcast a registration probe and list who answers
    Scan {
        /// Listening window in seconds
        #[arg(short, long, default_value = "3")]
        window: u64,
    },

    /// Probe candidates (IP=MAC pairs) and classify the ones that answer
    Discover {
        /// Candidates as IP=MAC, e.g. 192.168.1.40=a8bb50aabbcc
        #[arg(value_parser = parse_candidate)]
        candidates: Vec<Candidate>,

        /// Scan by broadcast first instead of listing candidates
        #[arg(long)]
        scan: bool,
    },

    /// Print the bulb's current state
    Status,

    /// Turn the bulb on
    On,

    /// Turn the bulb off
    Off,

    /// Set brightness (10-100)
    Brightness {
        #[arg(value_parser = clap::value_parser!(u8).range(10..=100))]
        level: u8,
    },

    /// Set color temperature, in Kelvin (2700-6500) or UI units (140-500)
    Temperature {
        value: u16,

        /// Interpret the value on the 140-500 UI scale
        #[arg(long)]
        mired: bool,
    },

    /// Query twice concurrently and print the exchange history
    Diagnostics,
}

fn parse_candidate(s: &str) -> Result<Candidate, String> {
    let (ip, mac) = s
        .split_once('=')
        .ok_or_else(|| format!("expected IP=MAC, got {s:?}"))?;
    let ip: Ipv4Addr = ip.parse().map_err(|e| format!("bad IP {ip:?}: {e}"))?;
    Ok(Candidate::new(ip, mac))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = PilotConfig {
        request_timeout: Duration::from_millis(cli.timeout_ms),
        discovery_timeout: Duration::from_millis(cli.timeout_ms),
        ..PilotConfig::default()
    };
    config.validate()?;

    match cli.command {
        Commands::Scan { window } => {
            let found = scan_candidates(Duration::from_secs(window), &config).await?;
            if found.is_empty() {
                println!("No bulbs answered the broadcast.");
            }
            for candidate in found {
                println!("  IP: {:15}  MAC: {}", candidate.ip.to_string(), candidate.mac);
            }
        }

        Commands::Discover { mut candidates, scan } => {
            if scan {
                candidates.extend(scan_candidates(Duration::from_secs(3), &config).await?);
            }
            let devices = discover(&candidates, &config).await?;
            println!("{} of {} candidate(s) answered", devices.len(), candidates.len());
            for device in devices {
                println!(
                    "  {:15}  {}  {:10}  {}  dim={}  temp={}",
                    device.ip.to_string(),
                    device.mac,
                    device.device_class.to_string(),
                    if device.is_on { "ON " } else { "OFF" },
                    device.brightness,
                    device
                        .color_temperature_kelvin
                        .map(|k| format!("{k}K ({})", device.mired_or_default().value()))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        command => {
            let ip = cli.ip.ok_or("IP address is required for this command. Use --ip <IP>")?;
            // MAC is only needed for identity; the bulb reports its own.
            let light = Light::new(ip, "unknown", config);

            match command {
                Commands::Scan { .. } | Commands::Discover { .. } => unreachable!(),

                Commands::Status => match light.describe().await? {
                    Some(device) => println!("{}", serde_json::to_string_pretty(&device)?),
                    None => eprintln!("No reply from {ip}"),
                },

                Commands::On => report(light.set_power(true).await?),
                Commands::Off => report(light.set_power(false).await?),

                Commands::Brightness { level } => {
                    let brightness = Brightness::create(level).ok_or("brightness must be 10-100")?;
                    report(light.set_brightness(&brightness).await?)
                }

                Commands::Temperature { value, mired } => {
                    let kelvin = if mired {
                        Mired::create(value).ok_or("UI temperature must be 140-500")?.to_kelvin()
                    } else {
                        Kelvin::create(value).ok_or("temperature must be 2700-6500K")?
                    };
                    println!("Setting {}K", kelvin.kelvin());
                    report(light.set_temperature(&kelvin).await?)
                }

                Commands::Diagnostics => {
                    let (a, b) = tokio::join!(light.get_state(), light.get_state());
                    println!("first:  {:?}", a?.map(|s| s.state));
                    println!("second: {:?}", b?.map(|s| s.state));
                    println!("{}", serde_json::to_string_pretty(&light.diagnostics().await)?);
                }
            }
        }
    }

    Ok(())
}

fn report(ack: Option<wiz_pilot::Ack>) {
    match ack {
        Some(_) => println!("OK"),
        None => println!("No reply; the command may or may not have been applied"),
    }
}
