//! trackpid command-line interface.
//!
//! Applies PID cuts to a JSON track file, prints cut configurations and the
//! frozen preset tables.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use trackpid_core::band::presets;
use trackpid_core::momentum::{P_MAX_PRESETS, P_MIN_PRESETS};
use trackpid_core::params::COMBINED_MODE_PRESETS;
use trackpid_core::{Detector, PidCuts, Species, StoredResponse};
use trackpid_io::{read_cuts, read_tracks, SelectionWriter};
use trackpid_select::{
    select_batch, true_track_accepted, truth_accepted, BeforeSampling, CutQa, PidSelector,
    QaLevel, RunPeriod,
};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    TrackpidIo(#[from] trackpid_io::Error),

    #[error("Cut error: {0}")]
    Core(#[from] trackpid_core::Error),

    #[error("{0}")]
    Usage(String),
}

/// QA recording level.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Qa {
    /// No QA
    None,
    /// Counters and accepted-track histograms
    Light,
    /// Everything, including before-cut histograms and co-activation
    Heavy,
}

/// Cut configuration sources, applied in order: file or descriptor, then
/// individual parameters.
#[derive(Args, Debug)]
struct CutArgs {
    /// Target species (electron, muon, pion, kaon, proton)
    #[arg(short, long)]
    target: Option<Species>,

    /// Label of the cut instance
    #[arg(long, default_value = "0")]
    cut_number: u32,

    /// JSON cut configuration file
    #[arg(long)]
    cuts: Option<PathBuf>,

    /// Canonical 18-digit descriptor string
    #[arg(long, conflicts_with = "cuts")]
    descriptor: Option<String>,

    /// Parameter as ID=CODE, repeatable
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(i32, i32)>,
}

/// PID track selection.
#[derive(Parser)]
#[command(name = "trackpid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the cut to a JSON track file
    Select {
        /// Input track file
        input: PathBuf,

        #[command(flatten)]
        cuts: CutArgs,

        /// Per-track CSV output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// QA level
        #[arg(long, value_enum, default_value = "light")]
        qa: Qa,

        /// QA output: `.json` for histograms, anything else for counter CSV
        #[arg(long)]
        qa_output: Option<PathBuf>,

        /// Record before-cut histograms at every QA level
        #[arg(long)]
        before_every_track: bool,

        /// Summary JSON output
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Name prefix of the QA storage
        #[arg(long, default_value = "PIDCut")]
        name: String,
    },

    /// Print a cut configuration
    Describe {
        #[command(flatten)]
        cuts: CutArgs,
    },

    /// Print the preset tables
    Presets,
}

fn parse_param(s: &str) -> std::result::Result<(i32, i32), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=CODE, got '{s}'"))?;
    let id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid parameter ID '{id}'"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid code '{value}'"))?;
    Ok((id, value))
}

fn build_cuts(args: &CutArgs) -> Result<PidCuts> {
    let target = || {
        args.target
            .ok_or_else(|| CliError::Usage("--target is required without --cuts".into()))
    };
    let mut cuts = match (&args.cuts, &args.descriptor) {
        (Some(path), _) => {
            let cuts = read_cuts(path)?;
            if args.target.is_some_and(|t| t != cuts.target()) {
                return Err(CliError::Usage(format!(
                    "--target conflicts with {} target {}",
                    path.display(),
                    cuts.target()
                )));
            }
            cuts
        }
        (None, Some(descriptor)) => {
            PidCuts::from_descriptor(target()?, args.cut_number, descriptor)?
        }
        (None, None) => PidCuts::new(target()?, args.cut_number)?,
    };
    for &(id, value) in &args.params {
        cuts.set_parameter(id, value)?;
    }
    Ok(cuts)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Select {
            input,
            cuts,
            output,
            qa,
            qa_output,
            before_every_track,
            summary,
            name,
        } => {
            let cuts = build_cuts(&cuts)?;
            let data = read_tracks(&input)?;
            log::debug!("cut {}:\n{}", cuts.descriptor(), cuts.describe());

            let start = Instant::now();
            let selector = PidSelector::new(cuts, Some(StoredResponse::new(data.start_time_ps)))?;

            let level = match qa {
                Qa::None => QaLevel::None,
                Qa::Light => QaLevel::Light,
                Qa::Heavy => QaLevel::Heavy,
            };
            let policy = if before_every_track {
                BeforeSampling::EveryTrack
            } else {
                BeforeSampling::HeavyOnly
            };
            let mut recorder =
                CutQa::new(&name, selector.cuts(), level).with_before_sampling(policy);
            let period = data.run_period.clone().unwrap_or_else(|| "default".to_string());
            recorder.on_run_changed(RunPeriod::new(period));

            let (outcomes, totals) = select_batch(&selector, &data.tracks, &mut recorder);
            let elapsed = start.elapsed();

            if let Some(path) = &output {
                SelectionWriter::create(path)?.write_outcomes_csv(&data.tracks, &outcomes)?;
                log::info!("wrote per-track results to {}", path.display());
            }
            if let Some(path) = &qa_output {
                let mut writer = SelectionWriter::create(path)?;
                if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
                    writer.write_qa_json(&recorder)?;
                } else {
                    writer.write_counters_csv(&recorder)?;
                }
                log::info!("wrote QA to {}", path.display());
            }
            if let Some(path) = &summary {
                SelectionWriter::create(path)?.write_summary_json(&totals)?;
            }

            println!(
                "Cut: {} ({})",
                selector.cuts().descriptor(),
                selector.cuts().target()
            );
            println!(
                "Selected {} of {} tracks in {:.3}s ({:.1}%)",
                totals.accepted,
                totals.total,
                elapsed.as_secs_f64(),
                100.0 * totals.efficiency()
            );
            println!("Outside momentum window: {}", totals.momentum_rejected);
            println!("Missing required TOF: {}", totals.tof_missing);
            for kind in trackpid_core::CutKind::ALL {
                println!(
                    "Rejected by {}: {}",
                    kind.name(),
                    totals.rejected_by[kind.index()]
                );
            }

            if !data.particles.is_empty() {
                let generated = data
                    .particles
                    .iter()
                    .filter(|&particle| truth_accepted(selector.cuts(), Some(particle)))
                    .count();
                let reconstructed = data
                    .tracks
                    .iter()
                    .zip(&outcomes)
                    .filter(|(track, outcome)| {
                        outcome.accepted
                            && true_track_accepted(selector.cuts(), *track, &data.particles)
                    })
                    .count();
                println!(
                    "Truth: {} generated in acceptance, {} correctly selected",
                    generated, reconstructed
                );
            }
        }

        Commands::Describe { cuts } => {
            let cuts = build_cuts(&cuts)?;
            println!(
                "Target: {} (cut number {})",
                cuts.target(),
                cuts.cut_number()
            );
            println!("Descriptor: {}", cuts.descriptor());
            println!("{}", cuts.describe());
        }

        Commands::Presets => {
            println!("P minimum (parameter 0):");
            for (code, p) in P_MIN_PRESETS.iter().enumerate() {
                println!("  {:>2}: {:.1} GeV/c", code, p);
            }
            println!("P maximum (parameter 1):");
            for (code, p) in P_MAX_PRESETS.iter().enumerate() {
                println!("  {:>2}: {} GeV/c", code, p);
            }
            let first_ids = [(2, Detector::Its), (7, Detector::Tpc), (12, Detector::Tof)];
            for (first_id, detector) in first_ids {
                println!(
                    "{} n-sigma (parameters {}-{}, e mu pi K p):",
                    detector,
                    first_id,
                    first_id + 4
                );
                for (code, band) in presets(detector).iter().enumerate() {
                    match band {
                        Some(band) => {
                            println!("  {:>2}: {} < nsigma < {}", code, band.below, band.above);
                        }
                        None => println!("  {:>2}: species not checked", code),
                    }
                }
            }
            println!("TPC+TOF mode (parameter 17):");
            for (code, mode) in COMBINED_MODE_PRESETS.iter().enumerate() {
                println!(
                    "  {:>2}: TOF {}, {}",
                    code,
                    if mode.tof_required { "required" } else { "optional" },
                    if mode.joint_2d { "joint 2D" } else { "independent" }
                );
            }
        }
    }

    Ok(())
}
