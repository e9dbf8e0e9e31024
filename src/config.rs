//! Configuration and command-line argument parsing

use std::env;
use std::time::Duration;

use gdl90_relay::gdl90::Identity;
use gdl90_relay::icao::Icao;
use gdl90_relay::quality::nacp_from_horizontal_accuracy_m;
use gdl90_relay::report::{Ownship, EMITTER_LIGHT};
use gdl90_relay::store::{StoreConfig, DEFAULT_MAX_TARGETS, DEFAULT_TTL};

/// NIC sent for a configured ownship fix.
const OWNSHIP_NIC: u8 = 8;

#[derive(Debug, Clone)]
pub struct Config {
    // Networking
    pub listen_port: u16,
    pub dest: String,
    pub interval_ms: u64,

    // Store
    pub max_targets: usize,
    pub ttl_secs: u64,

    // Ownship
    pub icao: Icao,
    pub callsign: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt_feet: i32,
    /// Estimated 95% horizontal accuracy of the fix, meters
    pub gps_accuracy_m: f64,

    // ID message
    pub short_name: String,
    pub long_name: String,

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        let identity = Identity::default();
        Self {
            listen_port: 30011,
            dest: "255.255.255.255:4000".to_string(),
            interval_ms: 1000,
            max_targets: DEFAULT_MAX_TARGETS,
            ttl_secs: DEFAULT_TTL.as_secs(),
            icao: Icao([0xF0, 0x00, 0x00]),
            callsign: "STRATUX".to_string(),
            lat: None,
            lon: None,
            alt_feet: 0,
            gps_accuracy_m: 5.0,
            short_name: identity.short_name,
            long_name: identity.long_name,
            debug: false,
        }
    }
}

/// What the argument list asked for.
#[derive(Debug)]
pub enum ParsedArgs {
    Run(Config),
    Help,
    Unknown(String),
}

impl Config {
    pub fn from_args() -> Self {
        match Self::parse(env::args().skip(1)) {
            ParsedArgs::Run(config) => config,
            ParsedArgs::Help => {
                print_help();
                std::process::exit(0);
            }
            ParsedArgs::Unknown(arg) => {
                eprintln!("Unknown option: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
    }

    /// Parse options, program name excluded. Unparseable values keep the
    /// default.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> ParsedArgs {
        let args: Vec<String> = args.into_iter().collect();
        let mut config = Config::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--listen-port" => {
                    i += 1;
                    config.listen_port = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30011);
                }
                "--dest" => {
                    i += 1;
                    if let Some(dest) = args.get(i) {
                        config.dest = dest.clone();
                    }
                }
                "--interval-ms" => {
                    i += 1;
                    config.interval_ms = args
                        .get(i)
                        .and_then(|s| s.parse().ok())
                        .filter(|&ms| ms > 0)
                        .unwrap_or(1000);
                }
                "--max-targets" => {
                    i += 1;
                    config.max_targets = args
                        .get(i)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(DEFAULT_MAX_TARGETS);
                }
                "--ttl" => {
                    i += 1;
                    config.ttl_secs = args
                        .get(i)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(DEFAULT_TTL.as_secs());
                }
                "--icao" => {
                    i += 1;
                    if let Some(icao) = args.get(i).and_then(|s| s.parse().ok()) {
                        config.icao = icao;
                    }
                }
                "--callsign" => {
                    i += 1;
                    if let Some(cs) = args.get(i) {
                        config.callsign = cs.clone();
                    }
                }
                "--lat" => {
                    i += 1;
                    config.lat = args.get(i).and_then(|s| s.parse().ok());
                }
                "--lon" => {
                    i += 1;
                    config.lon = args.get(i).and_then(|s| s.parse().ok());
                }
                "--alt" => {
                    i += 1;
                    config.alt_feet = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(0);
                }
                "--gps-accuracy" => {
                    i += 1;
                    config.gps_accuracy_m = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(5.0);
                }
                "--short-name" => {
                    i += 1;
                    if let Some(name) = args.get(i) {
                        config.short_name = name.clone();
                    }
                }
                "--long-name" => {
                    i += 1;
                    if let Some(name) = args.get(i) {
                        config.long_name = name.clone();
                    }
                }
                "--debug" => config.debug = true,
                "--help" => return ParsedArgs::Help,
                other => return ParsedArgs::Unknown(other.to_string()),
            }
            i += 1;
        }

        ParsedArgs::Run(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_targets: self.max_targets,
            ttl: Duration::from_secs(self.ttl_secs),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            short_name: self.short_name.clone(),
            long_name: self.long_name.clone(),
        }
    }

    /// The configured ownship, present only when both coordinates are given.
    pub fn ownship(&self) -> Option<Ownship> {
        let (lat, lon) = (self.lat?, self.lon?);
        Some(Ownship {
            icao: self.icao,
            lat_deg: lat,
            lon_deg: lon,
            alt_feet: self.alt_feet,
            nic_nacp: Some((OWNSHIP_NIC, nacp_from_horizontal_accuracy_m(self.gps_accuracy_m))),
            callsign: self.callsign.clone(),
            emitter: EMITTER_LIGHT,
            ..Default::default()
        })
    }
}

fn print_help() {
    println!(
        r#"gdl90-relay - relay traffic updates as a GDL90 stream

Usage: gdl90-relay [OPTIONS]

Options:
  --listen-port <port>   TCP port for NDJSON traffic updates (default: 30011)
  --dest <addr:port>     UDP destination (default: 255.255.255.255:4000)
  --interval-ms <ms>     Broadcast interval (default: 1000)
  --max-targets <N>      Max tracked targets (default: 200)
  --ttl <s>              Drop targets idle for <s> seconds (default: 30)
  --icao <hex>           Ownship ICAO address (default: F00000)
  --callsign <id>        Ownship callsign (default: STRATUX)
  --lat <degrees>        Ownship latitude
  --lon <degrees>        Ownship longitude
  --alt <feet>           Ownship altitude (default: 0)
  --gps-accuracy <m>     Horizontal accuracy of the fix (default: 5)
  --short-name <name>    Device short name for the ID message
  --long-name <name>     Device long name for the ID message
  --debug                Debug logging
  --help                 Show this help
"#
    );
}
