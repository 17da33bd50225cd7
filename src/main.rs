use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::fs;
use std::process::ExitCode;
use std::time::Duration;

use leo_link::config::Config;
use leo_link::link::{Polarization, RainAttenuationModel, Weather};
use leo_link::tle::{TleParser, TleRecord};
use leo_link::track::{BatchReport, DEFAULT_CHUNK_SIZE};
use leo_link::visibility::{predict_passes, VisibilityError};

#[derive(Parser)]
#[command(name = "leo-link")]
#[command(about = "LEO satellite geometry and link budget")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a TLE catalog and report skipped blocks
    Parse {
        tle_file: String,
        /// Accept lines whose checksum does not match
        #[arg(long)]
        no_checksum: bool,
    },
    /// Time series of position, geometry and link budget
    Track {
        tle_file: String,
        /// Only this satellite; all satellites otherwise
        #[arg(long)]
        norad: Option<u32>,
        /// RFC 3339 start time
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
        step: Duration,
        #[arg(long, default_value_t = 120)]
        count: usize,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Passes above the configured minimum elevation
    Passes {
        tle_file: String,
        #[arg(long)]
        norad: Option<u32>,
        /// RFC 3339 start time
        #[arg(long, value_parser = parse_time)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = humantime::parse_duration, default_value = "1d")]
        duration: Duration,
    },
    /// ITU-R rain attenuation on a slant path
    Rain {
        #[arg(long)]
        frequency: f64,
        #[arg(long)]
        rain_rate: f64,
        #[arg(long)]
        elevation: f64,
        #[arg(long, default_value = "circular")]
        polarization: Polarization,
        #[arg(long, default_value_t = 0.0)]
        tilt: f64,
        #[arg(long, default_value_t = 2.0)]
        rain_height: f64,
        #[arg(long, default_value_t = 0.0)]
        station_height: f64,
    },
    /// Link budget for a given distance and elevation
    Budget {
        #[arg(long)]
        distance: f64,
        #[arg(long)]
        elevation: f64,
        /// Carrier in GHz; the configured channel otherwise
        #[arg(long)]
        frequency: Option<f64>,
        #[arg(long)]
        weather: Option<Weather>,
        #[arg(long)]
        rain_rate: Option<f64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Commands::Parse {
            tle_file,
            no_checksum,
        } => parse(&tle_file, !no_checksum),
        Commands::Track {
            tle_file,
            norad,
            start,
            step,
            count,
            chunk_size,
        } => track(&config, &tle_file, norad, start, step, count, chunk_size),
        Commands::Passes {
            tle_file,
            norad,
            start,
            duration,
        } => passes(&config, &tle_file, norad, start, duration),
        Commands::Rain {
            frequency,
            rain_rate,
            elevation,
            polarization,
            tilt,
            rain_height,
            station_height,
        } => {
            let model = RainAttenuationModel::default()
                .with_heights(rain_height, station_height)
                .with_tilt(tilt);
            print_json(model.total_attenuation(frequency, rain_rate, elevation, polarization))
        }
        Commands::Budget {
            distance,
            elevation,
            frequency,
            weather,
            rain_rate,
        } => {
            let model = config.link_model();
            print_json(model.total_path_loss(
                distance,
                elevation,
                frequency.unwrap_or(config.channel.frequency_ghz),
                weather.unwrap_or(config.weather.label),
                rain_rate.or(config.weather.rain_rate_mm_h),
            ))
        }
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("'{}' is not an RFC 3339 time: {}", s, e))
}

fn print_json<T: serde::Serialize, E: std::fmt::Display>(result: Result<T, E>) -> ExitCode {
    match result {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(line) => {
                println!("{}", line);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_catalog(path: &str, norad: Option<u32>) -> Result<Vec<TleRecord>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Error reading {}: {}", path, e))?;
    let report = TleParser::default().parse_report(&text);
    if !report.skipped.is_empty() {
        log::warn!("{}: skipped {} malformed blocks", path, report.skipped.len());
    }
    let records: Vec<_> = report
        .records
        .into_iter()
        .filter(|r| norad.map_or(true, |id| r.norad_id == id))
        .collect();
    if records.is_empty() {
        return Err(match norad {
            Some(id) => format!("NORAD {} not found in {}", id, path),
            None => format!("no valid element sets in {}", path),
        });
    }
    Ok(records)
}

fn parse(path: &str, verify_checksum: bool) -> ExitCode {
    let text = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = TleParser::new(verify_checksum).parse_report(&text);
    println!("{} element sets, {} skipped", report.records.len(), report.skipped.len());
    for tle in &report.records {
        println!(
            "  {:>6} {:<24} epoch {} period {:.1} min",
            tle.norad_id,
            tle.satellite_name,
            tle.epoch.to_rfc3339(),
            tle.period_minutes()
        );
    }
    for skipped in &report.skipped {
        println!(
            "  line {}: {} ({})",
            skipped.line,
            skipped.name.as_deref().unwrap_or("unnamed"),
            skipped.reason
        );
    }

    if report.records.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn track(
    config: &Config,
    path: &str,
    norad: Option<u32>,
    start: DateTime<Utc>,
    step: Duration,
    count: usize,
    chunk_size: usize,
) -> ExitCode {
    let tles = match load_catalog(path, norad) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let pipeline = match config.pipeline() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let step_seconds = step.as_secs_f64();
    // Chunks run in parallel; each chunk is tracked sequentially.
    let report = tles
        .par_chunks(chunk_size.max(1))
        .map(|chunk| pipeline.run_batch(chunk, start, step_seconds, count, chunk.len()))
        .try_reduce(BatchReport::default, |a, b| Ok(a.merge(b)));

    let report = match report {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for track in &report.tracks {
        for point in &track.points {
            let line = serde_json::json!({
                "satellite": track.satellite,
                "norad_id": track.norad_id,
                "point": point,
            });
            println!("{}", line);
        }
    }
    for failure in &report.failures {
        eprintln!("{} ({}): {}", failure.satellite, failure.norad_id, failure.reason);
    }
    let s = report.summary;
    log::info!(
        "{} satellites: {} ok, {} failed, {} points, {} failed steps",
        s.satellites,
        s.succeeded,
        s.failed,
        s.points,
        s.failed_steps
    );

    if s.succeeded == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn passes(
    config: &Config,
    path: &str,
    norad: Option<u32>,
    start: DateTime<Utc>,
    duration: Duration,
) -> ExitCode {
    let tles = match load_catalog(path, norad) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let evaluator = match config.evaluator() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let end = match chrono::Duration::from_std(duration) {
        Ok(d) => start + d,
        Err(e) => {
            eprintln!("Invalid duration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let propagator = config.propagator();

    let mut found: Vec<_> = tles
        .par_iter()
        .filter_map(|tle| {
            let result = propagator
                .prepare(tle)
                .map_err(VisibilityError::from)
                .and_then(|prepared| predict_passes(&evaluator, &prepared, start, end));
            match result {
                Ok(passes) => Some(passes),
                Err(e) => {
                    log::warn!("{} ({}): {}", tle.satellite_name, tle.norad_id, e);
                    None
                }
            }
        })
        .flatten()
        .collect();
    found.sort_by_key(|p| p.aos);

    for pass in &found {
        match serde_json::to_string(pass) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }
    log::info!("{} passes between {} and {}", found.len(), start, end);
    ExitCode::SUCCESS
}
