/*!
`s3inspect` - find sensitive data in S3 buckets

A CLI tool that scans the objects of an S3-compatible bucket for email
addresses, phone numbers, card numbers and other info types.
*/

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use s3inspect::{
    build_client, inspect_objects, write_report, ClientSettings, InfoType, InspectConfig,
    Inspector, KeyMatcher, Likelihood, ObjectReport, OutputFormat, ScanOptions,
};
use structopt::StructOpt;
use tracing::info;

/// Output target for printing messages.
enum OutputTarget {
    Stdout,
    Stderr,
}

/**
    Command-line options for s3inspect.

    Every option can also be set through its `S3INSPECT_*` environment variable.
*/
#[derive(StructOpt, Debug)]
#[structopt(name = "s3inspect", about = "Find sensitive data in S3 buckets")]
struct Opt {
    /// S3 bucket name
    #[structopt(short, long, env = "S3INSPECT_BUCKET")]
    bucket: String,

    /// Object key or glob pattern; `*` inspects every object
    #[structopt(short, long, default_value = "*", env = "S3INSPECT_PATTERN")]
    pattern: String,

    /// Info types to look for, comma separated (default: all)
    #[structopt(
        short = "t",
        long = "info-type",
        use_delimiter = true,
        env = "S3INSPECT_INFO_TYPES"
    )]
    info_types: Vec<InfoType>,

    /// Drop findings rated below this likelihood
    #[structopt(long, default_value = "POSSIBLE", env = "S3INSPECT_MIN_LIKELIHOOD")]
    min_likelihood: Likelihood,

    /// Maximum findings per object, 0 for unlimited
    #[structopt(long, default_value = "0", env = "S3INSPECT_MAX_FINDINGS")]
    max_findings: usize,

    /// Do not print the matched text
    #[structopt(long)]
    no_quote: bool,

    /// Number of concurrent tasks
    #[structopt(short, long, default_value = "8", env = "S3INSPECT_CONCURRENCY")]
    concurrent_tasks: usize,

    /// Only inspect this many bytes of each object
    #[structopt(long, default_value = "16777216", env = "S3INSPECT_MAX_BYTES")]
    max_bytes: u64,

    /// Output format: text or json
    #[structopt(short, long, default_value = "text", env = "S3INSPECT_FORMAT")]
    format: OutputFormat,

    /// AWS region, overriding the environment and profile
    #[structopt(long, env = "S3INSPECT_REGION")]
    region: Option<String>,

    /// Custom S3 endpoint, e.g. Localstack or MinIO
    #[structopt(long, env = "S3INSPECT_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Address buckets by path instead of virtual host
    #[structopt(long)]
    force_path_style: bool,

    /// Hide progress bar
    #[structopt(short = "q", long)]
    quiet: bool,
}

/// Entry point for the s3inspect CLI application.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("s3inspect error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let opt = Opt::from_args();

    let client = build_client(&ClientSettings {
        region: opt.region.clone(),
        endpoint_url: opt.endpoint_url.clone(),
        force_path_style: opt.force_path_style,
    })
    .await;

    let matcher = KeyMatcher::new(&opt.pattern)?;
    let inspector = Arc::new(Inspector::new(InspectConfig {
        info_types: opt.info_types.clone(),
        min_likelihood: opt.min_likelihood,
        max_findings: opt.max_findings,
        include_quote: !opt.no_quote,
    }));
    let options = ScanOptions {
        concurrency: opt.concurrent_tasks,
        max_bytes: opt.max_bytes,
    };
    let color = opt.format == OutputFormat::Text && std::io::stdout().is_terminal();

    let progress = if !opt.quiet {
        let p = ProgressBar::new_spinner();
        p.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} Inspected {pos} objects... ({per_sec} objects/sec)")?,
        );
        Some(p)
    } else {
        None
    };

    let reports = inspect_objects(client, opt.bucket.clone(), matcher, inspector, &options);
    let tally = print_reports(reports, opt.format, color, progress.as_ref()).await;

    if let Some(p) = progress {
        p.finish_and_clear();
    }
    let tally = tally?;
    if tally.inspected == 0 {
        println!("No objects matched {}", opt.pattern);
    }
    info!(
        inspected = tally.inspected,
        with_findings = tally.with_findings,
        "inspection complete"
    );

    Ok(())
}

/// Objects seen by `print_reports`.
#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    inspected: usize,
    with_findings: usize,
}

/**
    Prints each report as it arrives. Reports for objects that could not be
    read go to stderr; the rest go to stdout.

    A listing failure stops the run and is returned, since the remaining
    objects are unknown.
*/
async fn print_reports<S>(
    reports: S,
    format: OutputFormat,
    color: bool,
    progress: Option<&ProgressBar>,
) -> Result<Tally>
where
    S: Stream<Item = s3inspect::Result<ObjectReport>>,
{
    let mut reports = std::pin::pin!(reports);
    let mut tally = Tally::default();

    while let Some(item) = reports.next().await {
        let report = item.context("listing objects")?;

        tally.inspected += 1;
        if !report.findings.is_empty() {
            tally.with_findings += 1;
        }

        let mut buf = Vec::new();
        write_report(&mut buf, &report, format, color)
            .with_context(|| format!("formatting report for {}", report.url()))?;
        let text = String::from_utf8_lossy(&buf);
        let target = if report.error.is_some() {
            OutputTarget::Stderr
        } else {
            OutputTarget::Stdout
        };
        print_with_target(progress, text.trim_end(), target);

        if let Some(p) = progress {
            p.inc(1);
        }
    }
    Ok(tally)
}

/// Writes `msg` to stdout or stderr. A running spinner is hidden while the line is printed.
fn print_with_target(progress: Option<&ProgressBar>, msg: &str, target: OutputTarget) {
    let print = || match target {
        OutputTarget::Stdout => println!("{}", msg),
        OutputTarget::Stderr => eprintln!("s3inspect: {}", msg),
    };
    match progress {
        Some(p) => p.suspend(print),
        None => print(),
    }
}
