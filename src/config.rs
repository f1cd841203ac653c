/*!
Run configuration (spec.md §6 "External interfaces"): a `clap`-derived CLI,
the same pattern `bgpkit-parser`'s own CLI binary uses, with every field also
`serde::Deserialize` so an optional `--config <path>` TOML file can supply
defaults that individual CLI flags then override.
*/
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug, Deserialize)]
#[clap(author, version, about = "Reconstructs fine-grained BGP RIB snapshots from RouteViews/RIPE RIS archives", long_about = None)]
#[serde(default)]
pub struct Config {
    /// Output files directory and base name; a subdirectory of this name is
    /// created under `output_dir`.
    #[clap(short = 'f', long, default_value = "default_conf")]
    pub output_filename: String,

    /// Root directory observer dumps, logs and the download cache live under.
    #[clap(short = 'o', long, default_value = "./data")]
    pub output_dir: PathBuf,

    /// `<start>,<end>` inclusive window, parsed with `time_format`.
    #[clap(short = 'd', long, default_value = "")]
    pub date_range: String,

    /// Route collector names, e.g. `rrc00` or `route-views.sydney`.
    #[clap(short = 'c', long = "collector", num_args = 1..)]
    pub collectors: Vec<String>,

    /// Seconds between observer dumps.
    #[clap(short = 'i', long, default_value_t = 900)]
    pub interval: i64,

    /// Restrict processing to these peer ASNs; empty means all.
    #[clap(short = 'j', long = "peer_asn")]
    pub peer_asns: Vec<u32>,

    /// Restrict processing to these peer IPs; empty means all.
    #[clap(short = 'k', long = "peer_ip")]
    pub peer_ips: Vec<String>,

    /// strftime/strptime-compatible format for `date_range` and output
    /// filenames.
    #[clap(short = 'l', long, default_value = "%Y%m%d.%H%M")]
    pub time_format: String,

    /// Optional TOML file supplying defaults for the above, overridden by
    /// any flag the user passes explicitly.
    #[clap(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// External decoder binary to invoke as `<decoder_bin> -m -v <path>`.
    #[clap(long, default_value = "bgpdump")]
    pub decoder_bin: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_filename: "default_conf".to_string(),
            output_dir: PathBuf::from("./data"),
            date_range: String::new(),
            collectors: Vec::new(),
            interval: 900,
            peer_asns: Vec::new(),
            peer_ips: Vec::new(),
            time_format: "%Y%m%d.%H%M".to_string(),
            config: None,
            decoder_bin: "bgpdump".to_string(),
        }
    }
}

impl Config {
    /// Parse CLI arguments, layering an optional `--config` TOML file
    /// underneath them so only explicitly-passed flags override the file.
    pub fn load() -> Result<Self> {
        let cli = Config::parse();
        let Some(config_path) = &cli.config else {
            return Ok(cli);
        };
        let text = fs::read_to_string(config_path)?;
        let file_config: Config = toml::from_str(&text)
            .map_err(|e| Error::config(format!("invalid config file {}: {e}", config_path.display())))?;
        Ok(cli.merged_over(file_config))
    }

    /// Returns `self` with any field left at its CLI default replaced by
    /// `base`'s value. `date_range` and `collectors` are required in
    /// practice, so they are never silently inherited from the file if the
    /// CLI value looks unset.
    fn merged_over(self, base: Config) -> Config {
        Config {
            output_filename: if self.output_filename == "default_conf" {
                base.output_filename
            } else {
                self.output_filename
            },
            output_dir: if self.output_dir == PathBuf::from("./data") {
                base.output_dir
            } else {
                self.output_dir
            },
            date_range: if self.date_range.is_empty() {
                base.date_range
            } else {
                self.date_range
            },
            collectors: if self.collectors.is_empty() {
                base.collectors
            } else {
                self.collectors
            },
            interval: if self.interval == 900 { base.interval } else { self.interval },
            peer_asns: if self.peer_asns.is_empty() { base.peer_asns } else { self.peer_asns },
            peer_ips: if self.peer_ips.is_empty() { base.peer_ips } else { self.peer_ips },
            time_format: if self.time_format == "%Y%m%d.%H%M" {
                base.time_format
            } else {
                self.time_format
            },
            config: self.config,
            decoder_bin: if self.decoder_bin == "bgpdump" { base.decoder_bin } else { self.decoder_bin },
        }
    }

    /// Parse `date_range` into `(ts_start, ts_end)` using `time_format`.
    pub fn parse_date_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let mut parts = self.date_range.splitn(2, ',');
        let start = parts
            .next()
            .ok_or_else(|| Error::config("date_range missing start"))?;
        let end = parts
            .next()
            .ok_or_else(|| Error::config("date_range missing end, expected <start>,<end>"))?;

        let parse_one = |s: &str| -> Result<DateTime<Utc>> {
            NaiveDateTime::parse_from_str(s, &self.time_format)
                .map(|naive| naive.and_utc())
                .map_err(|e| Error::config(format!("invalid date '{s}' for format '{}': {e}", self.time_format)))
        };

        Ok((parse_one(start)?, parse_one(end)?))
    }

    pub fn peer_ip_filter(&self) -> Vec<String> {
        self.peer_ips.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_range() {
        let config = Config {
            date_range: "20240201.0000,20240201.0200".to_string(),
            ..Config::default()
        };
        let (start, end) = config.parse_date_range().unwrap();
        assert_eq!(start.to_string(), "2024-02-01 00:00:00 UTC");
        assert_eq!(end.to_string(), "2024-02-01 02:00:00 UTC");
    }

    #[test]
    fn rejects_missing_end() {
        let config = Config {
            date_range: "20240201.0000".to_string(),
            ..Config::default()
        };
        assert!(config.parse_date_range().is_err());
    }
}
