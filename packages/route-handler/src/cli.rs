//! Command-line interface for the route handler.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use serde::Serialize;

use crate::config::HandlerConfig;
use crate::dispatch::{BuildCall, RecordingBuilder};
use crate::error::{HandlerError, Result};
use crate::handler::{handle_document, Diagnostic, Severity};
use crate::types::SumoTime;

/// Route handler - Parse route files into typed demand objects.
#[derive(Parser)]
#[command(name = "route-handler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by all commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Abort on the first invalid vehicle, flow, person or container
    #[arg(long)]
    pub hard_fail: bool,

    /// Begin of flows without an explicit begin (seconds or H:M:S)
    #[arg(long, value_parser = parse_time)]
    pub begin: Option<SumoTime>,

    /// End of flows without an explicit end (seconds or H:M:S)
    #[arg(long, value_parser = parse_time)]
    pub end: Option<SumoTime>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every object built from a route file.
    Inspect {
        /// Route file to read
        file: PathBuf,

        #[command(flatten)]
        session: SessionArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate a route file; fails if any element had to be dropped.
    Check {
        /// Route file to read
        file: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },
}

/// Output format of the inspect command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Yaml,
}

fn parse_time(text: &str) -> std::result::Result<SumoTime, String> {
    SumoTime::parse(text).ok_or_else(|| format!("invalid time '{text}'"))
}

/// Serialized result of one session.
#[derive(Debug, Serialize)]
pub struct Report {
    pub calls: Vec<BuildCall>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            file,
            session,
            format,
        } => inspect_command(&file, &session, format),
        Commands::Check { file, session } => check_command(&file, &session),
    }
}

/// Build the session configuration from file and flags; flags win.
pub fn resolve_config(args: &SessionArgs) -> Result<HandlerConfig> {
    let mut config = match &args.config {
        Some(path) => HandlerConfig::load(path)?,
        None => HandlerConfig::default(),
    };
    config.hard_fail |= args.hard_fail;
    if let Some(begin) = args.begin {
        config.begin = begin;
    }
    if args.end.is_some() {
        config.end = args.end;
    }
    config.validate()?;
    Ok(config)
}

/// Parse one file with a recording builder.
pub fn process_file(file: &Path, args: &SessionArgs) -> Result<Report> {
    let config = resolve_config(args)?;
    let text = std::fs::read_to_string(file).map_err(|e| {
        HandlerError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot read {}: {e}", file.display()),
        ))
    })?;
    let (builder, diagnostics) = handle_document(&text, config, RecordingBuilder::new())?;
    Ok(Report {
        calls: builder.calls,
        diagnostics,
    })
}

/// Execute the inspect command.
fn inspect_command(file: &Path, args: &SessionArgs, format: OutputFormat) -> Result<()> {
    let report = process_file(file, args)?;

    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yaml_ng::to_string(&report)?);
        }
        OutputFormat::Text => {
            for call in &report.calls {
                match call.object_id() {
                    Some(id) => println!("{} {}", style(call.name()).cyan(), style(id).green()),
                    None => println!("  {}", style(call.name()).cyan()),
                }
            }
            print_diagnostics(&report.diagnostics);
            print_summary(&report);
        }
    }
    Ok(())
}

/// Execute the check command.
fn check_command(file: &Path, args: &SessionArgs) -> Result<()> {
    let report = process_file(file, args)?;
    print_summary(&report);

    match report.count(Severity::Error) {
        0 => Ok(()),
        errors => Err(HandlerError::Rejected { errors }),
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Warning => style("warning").yellow().bold(),
            Severity::Error => style("error").red().bold(),
        };
        println!("{label}: {}", diagnostic.message);
    }
}

fn print_summary(report: &Report) {
    println!();
    println!(
        "{} {} callbacks, {} warnings, {} errors",
        style("Built:").bold(),
        report.calls.len(),
        style(report.count(Severity::Warning)).yellow(),
        style(report.count(Severity::Error)).red(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_inspect() {
        let cli = Cli::parse_from(["route-handler", "inspect", "demand.rou.xml"]);

        let Commands::Inspect {
            file,
            session,
            format,
        } = cli.command
        else {
            panic!("expected inspect");
        };
        assert_eq!(file, PathBuf::from("demand.rou.xml"));
        assert_eq!(format, OutputFormat::Text);
        assert!(!session.hard_fail);
        assert!(session.config.is_none());
    }

    #[test]
    fn test_cli_parse_check_with_flags() {
        let cli = Cli::parse_from([
            "route-handler",
            "check",
            "demand.rou.xml",
            "--hard-fail",
            "--begin",
            "0:01:00",
            "--end",
            "3600",
        ]);

        let Commands::Check { session, .. } = cli.command else {
            panic!("expected check");
        };
        assert!(session.hard_fail);
        assert_eq!(session.begin, Some(SumoTime::from_secs(60)));
        assert_eq!(session.end, Some(SumoTime::from_secs(3600)));
    }

    #[test]
    fn test_cli_rejects_bad_time() {
        let result = Cli::try_parse_from(["route-handler", "check", "f.xml", "--end", "later"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"begin: 10\nend: 100\n").unwrap();
        let args = SessionArgs {
            config: Some(file.path().to_path_buf()),
            hard_fail: true,
            begin: None,
            end: Some(SumoTime::from_secs(50)),
        };
        let config = resolve_config(&args).unwrap();
        assert!(config.hard_fail);
        assert_eq!(config.begin, SumoTime::from_secs(10));
        assert_eq!(config.end, Some(SumoTime::from_secs(50)));
    }

    #[test]
    fn test_resolve_config_rejects_inverted_flags() {
        let args = SessionArgs {
            begin: Some(SumoTime::from_secs(10)),
            end: Some(SumoTime::from_secs(5)),
            ..SessionArgs::default()
        };
        assert!(matches!(
            resolve_config(&args),
            Err(HandlerError::InvalidConfig(_))
        ));
    }
}
