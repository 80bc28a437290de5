//! PiPark setup: prepare a car park for automatic monitoring.
//!
//! An operator takes a reference photo of the car park, marks every parking
//! space as a rectangle over it, places control points that tie image pixels
//! to surveyed positions, and registers the result with the PiPark server.
//! The registered site is then handed to the monitoring program.
//!
//! # Modules
//!
//! - [`site`]: Site configuration model (image, spaces, control points)
//! - [`capture`]: Reference image sources
//! - [`editor`]: Pointer-driven editors for spaces and control points
//! - [`controller`]: The setup workflow
//! - [`registration`]: Registration payload and clients
//! - [`validation`]: Site validation and error reporting
//! - [`session`]: Line-oriented console front end
//! - [`error`]: Error types for setup operations

pub mod calibration;
pub mod capture;
pub mod controller;
pub mod editor;
pub mod error;
pub mod handoff;
pub mod logging;
pub mod operator;
pub mod registration;
pub mod session;
pub mod settings;
pub mod site;
pub mod validation;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

pub use error::SetupError;

use crate::capture::{CommandCamera, ImageSource, StillFileSource};
use crate::controller::SetupController;
use crate::handoff::SiteFileHandoff;
use crate::registration::{RegistrationClient, RegistrationPayload, UnconfiguredRegistrar};
use crate::session::ConsoleOperator;
use crate::settings::{SettingsOverrides, SetupSettings};
use crate::site::SiteConfiguration;
use crate::validation::ValidationIssue;

/// The pipark-setup CLI application.
#[derive(Parser)]
#[command(name = "pipark-setup")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run an interactive setup session on stdin/stdout.
    Setup(SetupArgs),
    /// Validate a saved site file for errors and warnings.
    Validate(ValidateArgs),
    /// Print the registration payload for a saved site file.
    Payload(PayloadArgs),
}

/// Arguments for the setup subcommand.
#[derive(clap::Args)]
struct SetupArgs {
    /// YAML settings file.
    #[arg(long, env = "PIPARK_SETTINGS")]
    settings: Option<PathBuf>,

    /// Base URL of the registration server.
    #[arg(long, env = "PIPARK_SERVER")]
    server: Option<String>,

    /// Where the setup image is stored.
    #[arg(long)]
    setup_image: Option<PathBuf>,

    /// Where the registered site is written for the monitoring program.
    #[arg(long)]
    site_file: Option<PathBuf>,

    /// Name of the car park.
    #[arg(long)]
    name: Option<String>,

    /// Control-point pick radius in image pixels.
    #[arg(long)]
    pick_radius: Option<f64>,

    /// Echo every action and log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Site file to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

/// Arguments for the payload subcommand.
#[derive(clap::Args)]
struct PayloadArgs {
    /// Site file to build the payload from.
    input: PathBuf,
}

/// Run the pipark-setup CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SetupError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Setup(args)) => run_setup(args),
        Some(Commands::Validate(args)) => {
            logging::init_cli_logger(false);
            run_validate(args)
        }
        Some(Commands::Payload(args)) => {
            logging::init_cli_logger(false);
            run_payload(args)
        }
        None => {
            println!("pipark-setup {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Setup utility for the PiPark parking-space monitor.");
            println!();
            println!("Run 'pipark-setup --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the setup subcommand.
fn run_setup(args: SetupArgs) -> Result<(), SetupError> {
    let settings = SetupSettings::resolve(
        args.settings.as_deref(),
        SettingsOverrides {
            server: args.server,
            setup_image: args.setup_image,
            site_file: args.site_file,
            name: args.name,
            pick_radius: args.pick_radius,
            verbose: args.verbose,
        },
    )?;
    logging::init_cli_logger(settings.verbose);

    let camera: Box<dyn ImageSource> = match &settings.capture_command {
        Some(command) => Box::new(
            CommandCamera::new(command, &settings.setup_image)?
                .with_preview_args(settings.preview_args.clone()),
        ),
        None => Box::new(StillFileSource::new(&settings.setup_image)),
    };
    let registrar = build_registrar(&settings)?;
    let launcher = Box::new(SiteFileHandoff::new(&settings.site_file));

    let mut site = startup_site(&settings.setup_image);
    site.name = settings.name.clone();

    let mut controller =
        SetupController::new(settings.setup_options(), camera, registrar, launcher)
            .with_site(site);
    let mut console = ConsoleOperator::new(io::stdin().lock(), io::stdout().lock());

    let summary = session::run_session(&mut controller, &mut console)?;
    match (&summary.handoff, &summary.site_id) {
        (Some(handoff), _) => info!(site = %handoff.site_id, "setup complete"),
        (None, Some(site_id)) => info!(
            site = %site_id,
            site_file = %settings.site_file.display(),
            "site registered; monitoring not started"
        ),
        (None, None) => info!("setup ended without registering a site"),
    }
    Ok(())
}

/// Seeds the session with the setup image already on disk, if any.
fn startup_site(setup_image: &Path) -> SiteConfiguration {
    if !setup_image.exists() {
        return SiteConfiguration::new();
    }
    match capture::read_still(setup_image) {
        Ok(image) => {
            info!(
                path = %setup_image.display(),
                width = image.width,
                height = image.height,
                "loaded existing setup image"
            );
            SiteConfiguration::with_image(image)
        }
        Err(err) => {
            warn!(error = %err, "ignoring existing setup image");
            SiteConfiguration::new()
        }
    }
}

#[cfg(feature = "remote")]
fn build_registrar(settings: &SetupSettings) -> Result<Box<dyn RegistrationClient>, SetupError> {
    match &settings.server {
        Some(server) => Ok(Box::new(registration::HttpRegistrationClient::new(
            server,
            settings.timeout(),
        )?)),
        None => Ok(Box::new(UnconfiguredRegistrar)),
    }
}

#[cfg(not(feature = "remote"))]
fn build_registrar(settings: &SetupSettings) -> Result<Box<dyn RegistrationClient>, SetupError> {
    if settings.server.is_some() {
        warn!("built without the `remote` feature; the registration server is ignored");
    }
    Ok(Box::new(UnconfiguredRegistrar))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    error_count: usize,
    warning_count: usize,
    issues: &'a [ValidationIssue],
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), SetupError> {
    let site = site::io_json::read_site_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_site(&site, &opts);

    match args.output {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonReport {
                error_count: report.error_count(),
                warning_count: report.warning_count(),
                issues: &report.issues,
            })
            .map_err(io::Error::from)?;
            println!("{}", json);
        }
        ReportFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(SetupError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the payload subcommand.
fn run_payload(args: PayloadArgs) -> Result<(), SetupError> {
    let site = site::io_json::read_site_json(&args.input)?;
    let payload = RegistrationPayload::from_site(&site)?;
    let json = payload.to_json_string().map_err(io::Error::from)?;
    println!("{}", json);
    Ok(())
}
