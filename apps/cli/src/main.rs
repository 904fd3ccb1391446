mod logging;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use kcdb_export::config::{
    default_user_agent, resolve_endpoint, DEFAULT_ACCEPT, DEFAULT_BASE_URL, DEFAULT_OUT_DIR,
};
use kcdb_export::{catalog, load_plan, ExportSummary, Harvester, HttpFetcher, Job, ScopedJob, Settings, SweepJob};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "kcdb")]
#[command(about = "Export BIPM KCDB reference data to CSV files", long_about = None, version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Base URL of the KCDB API
    #[arg(long, env = "KCDB_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Directory the CSV files are written to
    #[arg(short, long, env = "KCDB_OUT_DIR", default_value = DEFAULT_OUT_DIR, global = true)]
    out_dir: PathBuf,

    /// Per-request timeout (e.g. 15s, 500ms)
    #[arg(long, env = "KCDB_TIMEOUT", default_value = "15s", value_parser = humantime::parse_duration, global = true)]
    timeout: Duration,

    /// Pause between consecutive requests
    #[arg(long, env = "KCDB_DELAY", default_value = "200ms", value_parser = humantime::parse_duration, global = true)]
    delay: Duration,

    /// User-Agent sent with every request
    #[arg(long, env = "KCDB_USER_AGENT", global = true)]
    user_agent: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

impl GlobalArgs {
    fn settings(&self) -> Settings {
        Settings {
            base_url: self.base_url.clone(),
            out_dir: self.out_dir.clone(),
            timeout: self.timeout,
            delay: self.delay,
            accept: DEFAULT_ACCEPT.to_string(),
            user_agent: self.user_agent.clone().unwrap_or_else(default_user_agent),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the known reference-data endpoints
    List,

    /// Export reference lists that take no parameters (all when none named)
    Catalog {
        names: Vec<String>,
    },

    /// Export one endpoint once per value of a query parameter
    Scoped {
        #[arg(long)]
        endpoint: String,

        #[arg(long)]
        param: String,

        #[arg(required = true)]
        values: Vec<String>,

        /// Per-value files are named <PREFIX>_<VALUE>.csv (default: endpoint name)
        #[arg(long)]
        prefix: Option<String>,

        /// Name of the merged file (default: <endpoint>_<param>.csv)
        #[arg(long, conflicts_with = "no_combined")]
        combined: Option<String>,

        /// Skip the merged file
        #[arg(long, default_value_t = false)]
        no_combined: bool,
    },

    /// Sweep a numeric parameter over an inclusive range to find valid identifiers
    Sweep {
        #[arg(long)]
        endpoint: String,

        #[arg(long)]
        param: String,

        #[arg(long, default_value_t = 1)]
        start: u64,

        #[arg(long)]
        end: u64,

        /// Also write <PREFIX>_<ID>.csv for every identifier with data
        #[arg(long)]
        prefix: Option<String>,

        /// Name of the merged file (default: <endpoint>_<param>.csv)
        #[arg(long)]
        combined: Option<String>,
    },

    /// Run every job of a YAML plan file
    Run {
        #[arg(long)]
        plan: PathBuf,
    },
}

/// Turns a command into the job it describes; `None` for `list`.
fn build_jobs(command: Commands) -> Result<Option<Vec<Job>>> {
    let jobs = match command {
        Commands::List => return Ok(None),
        Commands::Catalog { names } => {
            let endpoints = if names.is_empty() {
                catalog::all()
            } else {
                names
                    .iter()
                    .map(|name| resolve_endpoint(name))
                    .collect::<Result<Vec<_>>>()?
            };
            vec![Job::Catalog { endpoints }]
        }
        Commands::Scoped {
            endpoint,
            param,
            values,
            prefix,
            combined,
            no_combined,
        } => {
            let mut job = ScopedJob::new(resolve_endpoint(&endpoint)?, param, values);
            if let Some(prefix) = prefix {
                job.file_prefix = prefix;
            }
            if no_combined {
                job.combined = None;
            } else if combined.is_some() {
                job.combined = combined;
            }
            vec![Job::Scoped(job)]
        }
        Commands::Sweep {
            endpoint,
            param,
            start,
            end,
            prefix,
            combined,
        } => {
            let mut job = SweepJob::new(resolve_endpoint(&endpoint)?, param, start, end)?;
            job.file_prefix = prefix;
            if let Some(name) = combined {
                job.combined = name;
            }
            vec![Job::Sweep(job)]
        }
        Commands::Run { plan } => load_plan(&plan)?.jobs,
    };

    Ok(Some(jobs))
}

fn print_catalog() {
    for endpoint in catalog::all() {
        println!(
            "{:<20} {:<40} {}",
            endpoint.name,
            endpoint.path,
            endpoint.list_key.as_deref().unwrap_or("-")
        );
    }
}

fn print_summary(summaries: &[ExportSummary]) {
    let written: Vec<&ExportSummary> = summaries.iter().filter(|s| s.rows > 0).collect();
    let total: usize = written.iter().map(|s| s.rows).sum();

    for summary in &written {
        println!("  + {:>6} rows -> {}", summary.rows, summary.path.display());
    }
    println!(
        "\n{} file(s) written, {} row(s) total, {} empty result(s) skipped",
        written.len(),
        total,
        summaries.len() - written.len()
    );
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_tracing(cli.global.verbose)?;

    let settings = cli.global.settings();
    let Some(jobs) = build_jobs(cli.command)? else {
        print_catalog();
        return Ok(());
    };

    info!(
        base_url = %settings.base_url,
        out_dir = %settings.out_dir.display(),
        jobs = jobs.len(),
        "Starting export"
    );

    let fetcher = HttpFetcher::new(&settings)?;
    let harvester = Harvester::new(fetcher, settings);

    let mut summaries = Vec::new();
    for job in &jobs {
        summaries.extend(harvester.run_job(job).context("Export failed")?);
    }

    print_summary(&summaries);
    Ok(())
}
