use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use wellsig::{AuditLog, RunConfig, logging};

/// Extracts signals from a multi-well microscope experiment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to a toml file with run config parameters
    toml_config_path: PathBuf,

    /// Path to a raw video with multi-well data
    #[arg(long)]
    input_path: Option<PathBuf>,

    /// Directory to save all output to
    #[arg(long)]
    output_dir_path: Option<PathBuf>,

    /// Number of frames
    #[arg(long)]
    num_frames: Option<usize>,

    /// Number of frames per second
    #[arg(long)]
    fps: Option<f64>,

    /// Number of bits per pixel (8, 12 or 16)
    #[arg(long)]
    bit_depth: Option<u32>,

    /// Scaling factor: a 3072x2048 image has a scale factor of 1, a 1536x1024 one has 2
    #[arg(long)]
    scale_factor: Option<i64>,
}

impl Cli {
    fn apply(self, config: &mut RunConfig) {
        if let Some(v) = self.input_path {
            config.input_path = v;
        }
        if let Some(v) = self.output_dir_path {
            config.output_dir_path = v;
        }
        if let Some(v) = self.num_frames {
            config.num_frames = v;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
        if let Some(v) = self.bit_depth {
            config.bit_depth = v;
        }
        if let Some(v) = self.scale_factor {
            config.scale_factor = v;
        }
    }
}

fn run(cli: Cli, audit: &AuditLog) -> wellsig::Result<()> {
    let mut config = RunConfig::load_from(&cli.toml_config_path)?;
    cli.apply(&mut config);
    let summary = wellsig::run(&config, audit)?;
    tracing::debug!(outputs = ?summary.outputs, calibration = ?summary.calibration, "Run complete");
    Ok(())
}

fn main() -> ExitCode {
    let audit = AuditLog::new();
    if let Err(e) = logging::init(&audit) {
        eprintln!("{}", e);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            tracing::error!(error = %e, "Invalid command line arguments");
            return ExitCode::from(2);
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    match run(cli, &audit) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Error in local analysis");
            ExitCode::FAILURE
        }
    }
}
