use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use brapi2biosamples::app::App;
use brapi2biosamples::biosamples::{BioSamplesHttpClient, SampleRegistry};
use brapi2biosamples::brapi::{BrapiHttpClient, PaginationMode};
use brapi2biosamples::config::{ConfigLoader, ResolvedRun, RunMode, RunRequest};
use brapi2biosamples::endpoints::Environment;
use brapi2biosamples::error::BridgeError;
use brapi2biosamples::output::{ConsoleOutput, JsonOutput, OutputMode};
use brapi2biosamples::sample::SubmittedSample;
use brapi2biosamples::store::Store;
use brapi2biosamples::transform::TaxonScan;

#[derive(Parser)]
#[command(name = "brapi2biosamples")]
#[command(about = "Submits samples to BioSamples using the Breeding API")]
#[command(version, author)]
struct Cli {
    #[arg(short = 't', long = "trialdbid", help = "The identifier of a trial")]
    trial_db_id: String,

    #[arg(short = 'e', long, help = "The URL towards the BrAPI endpoint")]
    endpoint: String,

    #[arg(
        short = 'd',
        long,
        help = "The date of sample publication (example: 2021-01-20T17:05:13Z), defaults to now"
    )]
    date: Option<String>,

    #[arg(short = 'D', long, help = "The domain of your BioSamples account")]
    domain: String,

    #[arg(
        short = 's',
        long,
        help = "Submit the samples to BioSamples instead of exporting them as JSON"
    )]
    submit: bool,

    #[arg(long, help = "Submit to the dev instance of BioSamples")]
    dev: bool,

    #[arg(long, help = "Path to a secret.yml file with the BioSamples credentials")]
    secret: Option<PathBuf>,

    #[arg(long, help = "Directory where the JSON files are written to [default: .]")]
    output: Option<PathBuf>,

    #[arg(
        short = 'N',
        long,
        help = "Reconstruct the sample name from genus, institute and accession number"
    )]
    rename: bool,

    #[arg(
        short = 'c',
        long,
        help = "Comma-separated fields to base64-decode, e.g. -c \"field 1, field 2\""
    )]
    decode: Option<String>,

    #[arg(long, help = "Follow every page of the study germplasm listings")]
    all_pages: bool,

    #[arg(long, help = "Look for an NCBI taxon id among all taxon ids, not only the first")]
    scan_all_taxa: bool,

    #[arg(long, help = "Print a JSON run summary instead of progress lines")]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<BridgeError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BridgeError) -> u8 {
    match error {
        BridgeError::MissingCredentials
        | BridgeError::CredentialsRead(_)
        | BridgeError::CredentialsParse(_)
        | BridgeError::InvalidEnvironment(_)
        | BridgeError::OutputDirMissing(_) => 2,
        BridgeError::AuthFailed { .. }
        | BridgeError::RequestFailed { .. }
        | BridgeError::Http(_)
        | BridgeError::InvalidResponse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };

    let request = RunRequest {
        trial_id: cli.trial_db_id,
        endpoint: cli.endpoint,
        release: cli.date,
        domain: cli.domain,
        submit: cli.submit,
        environment: if cli.dev {
            Environment::Dev
        } else {
            Environment::Stable
        },
        secret: cli.secret,
        output: cli.output,
        rename: cli.rename,
        decode: cli.decode,
        pagination: if cli.all_pages {
            PaginationMode::AllPages
        } else {
            PaginationMode::FirstPage
        },
        taxon_scan: if cli.scan_all_taxa {
            TaxonScan::AnyEntry
        } else {
            TaxonScan::FirstEntry
        },
    };
    let resolved = ConfigLoader::resolve(request)?;
    let brapi = BrapiHttpClient::new(resolved.brapi_base.clone(), resolved.pagination)?;

    match &resolved.mode {
        RunMode::Export { output_dir } => {
            let app = App::new(brapi, NopRegistry, Store::new(output_dir.clone()));
            execute(app, &resolved, output_mode)
        }
        RunMode::Submit {
            environment,
            endpoints,
            ..
        } => {
            if matches!(output_mode, OutputMode::Console) && *environment == Environment::Dev {
                println!("--- This is a test submission ---");
            }
            tracing::info!(%environment, submit = %endpoints.submit, "submitting to BioSamples");
            let registry = BioSamplesHttpClient::new(endpoints.clone())?;
            let app = App::new(brapi, registry, Store::new(Utf8PathBuf::from(".")));
            execute(app, &resolved, output_mode)
        }
    }
}

fn execute<S: SampleRegistry>(
    app: App<BrapiHttpClient, S>,
    resolved: &ResolvedRun,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match output_mode {
        OutputMode::Console => {
            app.run(resolved, &ConsoleOutput)?;
            Ok(())
        }
        OutputMode::Json => {
            let summary = app.run(resolved, &JsonOutput)?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
            Ok(())
        }
    }
}

struct NopRegistry;

impl SampleRegistry for NopRegistry {
    fn fetch_token(&self, _username: &str, _password: &str) -> Result<String, BridgeError> {
        Err(BridgeError::MissingCredentials)
    }

    fn validate(&self, _token: &str, _sample: &Value) -> Result<(), BridgeError> {
        Err(BridgeError::MissingCredentials)
    }

    fn submit(&self, _token: &str, _sample: &Value) -> Result<SubmittedSample, BridgeError> {
        Err(BridgeError::MissingCredentials)
    }

    fn sample_url(&self, accession: &str) -> String {
        accession.to_string()
    }
}
