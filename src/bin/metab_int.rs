use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use metabolite_integrator::app::{App, IntegrateRequest, SynonymRequest};
use metabolite_integrator::config::{ConfigLoader, ResolvedConfig};
use metabolite_integrator::domain::{Field, SynonymSource};
use metabolite_integrator::error::IntegrateError;
use metabolite_integrator::output::{JsonOutput, LogSink, OutputMode, TextOutput};

#[derive(Parser)]
#[command(name = "metab-int")]
#[command(about = "Integrate metabolite records from HMDB, LIPID MAPS, KEGG, PubChem and ChEBI by InChIKey")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true, help = "Print the run summary as JSON")]
    json: bool,

    #[arg(long, short, global = true, help = "Log at debug level unless RUST_LOG is set")]
    verbose: bool,

    #[arg(long, global = true, help = "Path to metab-int.json")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Merge per-source compound tables into one table")]
    Integrate(IntegrateArgs),
    #[command(about = "Collect synonyms and fill in missing names")]
    Synonyms(SynonymArgs),
}

#[derive(Args)]
struct IntegrateArgs {
    #[arg(short, long, help = "Folder with one compound table per source")]
    input: Option<Utf8PathBuf>,

    #[arg(short, long, help = "Output prefix, written as <prefix>.txt")]
    output: Option<Utf8PathBuf>,

    #[arg(short, long, help = "Join key field")]
    key: Option<String>,
}

#[derive(Args)]
struct SynonymArgs {
    #[arg(short, long, help = "Integrated compound table")]
    compounds: Option<Utf8PathBuf>,

    #[arg(long, help = "HMDB synonym table")]
    hmdb: Option<Utf8PathBuf>,

    #[arg(long, help = "LIPID MAPS synonym table")]
    lmid: Option<Utf8PathBuf>,

    #[arg(long, help = "PubChem synonym table")]
    pc: Option<Utf8PathBuf>,

    #[arg(short, long, help = "Directory for CompoundSynonyms.txt and CompoundData.txt")]
    output_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<IntegrateError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &IntegrateError) -> u8 {
    match error {
        IntegrateError::MissingKey(_)
        | IntegrateError::MissingConfig
        | IntegrateError::ConfigRead(_)
        | IntegrateError::ConfigParse(_)
        | IntegrateError::MissingInput(_) => 2,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let config = ConfigLoader::resolve_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Integrate(args) => run_integrate(args, config, output_mode),
        Commands::Synonyms(args) => run_synonyms(args, config, output_mode),
    }
}

fn run_integrate(
    args: IntegrateArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let key = match args.key.as_deref() {
        Some(name) => Field::parse_schema(name)?,
        None => config.key,
    };
    let input = args.input.or(config.input).ok_or_else(|| {
        miette::Report::msg("input folder required (use --input or \"input\" in metab-int.json)")
    })?;
    let request = IntegrateRequest {
        input,
        output_prefix: args.output.unwrap_or(config.output_prefix),
        key,
    };

    match output_mode {
        OutputMode::Json => {
            let result = App::integrate(&request, &JsonOutput)?;
            JsonOutput::print_integrate(&result).into_diagnostic()
        }
        OutputMode::Text => {
            let result = App::integrate(&request, &LogSink)?;
            TextOutput::print_integrate(&result).into_diagnostic()
        }
    }
}

fn run_synonyms(
    args: SynonymArgs,
    config: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let compounds = args.compounds.or(config.compounds).ok_or_else(|| {
        miette::Report::msg(
            "compound table required (use --compounds or \"compounds\" in metab-int.json)",
        )
    })?;

    let overrides = [
        (SynonymSource::Hmdb, args.hmdb),
        (SynonymSource::PcCompound, args.pc),
        (SynonymSource::Lmid, args.lmid),
    ];
    let tables = overrides
        .into_iter()
        .filter_map(|(source, path)| {
            path.or_else(|| {
                config
                    .synonyms
                    .iter()
                    .find(|(configured, _)| *configured == source)
                    .map(|(_, path)| path.clone())
            })
            .map(|path| (source, path))
        })
        .collect::<Vec<_>>();

    let request = SynonymRequest {
        compounds,
        tables,
        output_dir: args.output_dir.unwrap_or(config.output_dir),
    };

    match output_mode {
        OutputMode::Json => {
            let result = App::synonyms(&request, &JsonOutput)?;
            JsonOutput::print_synonyms(&result).into_diagnostic()
        }
        OutputMode::Text => {
            let result = App::synonyms(&request, &LogSink)?;
            TextOutput::print_synonyms(&result).into_diagnostic()
        }
    }
}
