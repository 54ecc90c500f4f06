//! clipscope - reports over crawled video metadata
//!
//! Loads one project document, normalizes its records and prints the
//! derived views, or streams an answer to a question about the project.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use clipscope_core::analytics::{build_report, AnalyticsOptions, AnalyticsReport, HistogramBucket};
use clipscope_core::chat::{ask_project, ChatClient};
use clipscope_core::config::ChatConfig;
use clipscope_core::format::{format_compact, format_relative_time};
use clipscope_core::ingest::{normalize_project, NormalizeOptions, ReferenceClock};
use clipscope_core::source::{DocumentSource, JsonDirSource};
use clipscope_core::{Config, RawProjectDocument, VideoRecord};
use futures_util::StreamExt;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "clipscope")]
#[command(about = "Dashboard reports over crawled video metadata")]
#[command(version)]
struct Args {
    /// Project id to load from the documents directory
    #[arg(long, conflicts_with = "file")]
    project: Option<String>,

    /// Load a project document from a JSON file instead
    #[arg(long)]
    file: Option<PathBuf>,

    /// Documents directory (default: source.documents_dir or the data dir)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// List available project ids and exit
    #[arg(long)]
    list: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Length of the top-N rankings
    #[arg(long)]
    top: Option<usize>,

    /// Ask a question about the project and stream the answer
    #[arg(long)]
    ask: Option<String>,

    /// Chat model, used when the config has no [chat] section
    #[arg(long)]
    model: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// JSON document written by `--format json`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    project_id: &'a str,
    project_name: Option<&'a str>,
    generated_at: DateTime<Local>,
    records: &'a [VideoRecord],
    report: &'a AnalyticsReport,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = clipscope_core::logging::init(&config.logging).ok();

    let documents_dir = args.dir.clone().unwrap_or_else(|| config.documents_dir());
    let source = JsonDirSource::new(&documents_dir);

    if args.list {
        let projects = source
            .list_projects()
            .context("failed to list projects")?;
        if projects.is_empty() {
            println!("No projects found in {}", documents_dir.display());
        }
        for id in projects {
            println!("{}", id);
        }
        return Ok(());
    }

    let document = load_document(&args, &source)?;

    // One clock per pass so relative phrases agree across every view
    let clock = ReferenceClock::now();
    let normalize_options = NormalizeOptions::from_config(&config.normalize);
    let records = normalize_project(&document, &normalize_options, &clock);

    tracing::info!(
        project = %document.id,
        records = records.len(),
        "Normalized project"
    );

    if let Some(question) = &args.ask {
        return ask(&args, &config, &document, &records, question);
    }

    let mut analytics_options = AnalyticsOptions::from_config(&config.analytics);
    if let Some(top) = args.top {
        analytics_options.top_n = top;
    }
    let report = build_report(&records, &analytics_options, &clock);

    match args.format {
        OutputFormat::Json => print_json(&document, &records, &report, &clock)?,
        OutputFormat::Text => print_terminal(&document, &report, &clock),
    }

    Ok(())
}

fn load_document(args: &Args, source: &JsonDirSource) -> Result<RawProjectDocument> {
    if let Some(path) = &args.file {
        return JsonDirSource::read_file(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let Some(project_id) = &args.project else {
        anyhow::bail!("Specify --project <id>, --file <path> or --list");
    };

    source
        .require(project_id)
        .with_context(|| format!("failed to load project {:?}", project_id))
}

fn ask(
    args: &Args,
    config: &Config,
    document: &RawProjectDocument,
    records: &[VideoRecord],
    question: &str,
) -> Result<()> {
    let chat_config = match (&config.chat, &args.model) {
        (Some(chat), None) => chat.clone(),
        (Some(chat), Some(model)) => ChatConfig {
            model: model.clone(),
            ..chat.clone()
        },
        (None, Some(model)) => {
            let mut chat = ChatConfig::for_model(model.clone());
            chat.apply_env_key();
            chat
        }
        (None, None) => anyhow::bail!(
            "No [chat] section in {} and no --model given",
            Config::config_path().display()
        ),
    };

    let max_records = chat_config.max_records;
    let client = ChatClient::new(chat_config).context("failed to create chat client")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(async {
        let mut stream = ask_project(&client, document, records, max_records, &[], question)
            .await
            .context("chat request failed")?;

        let mut stdout = std::io::stdout();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment.context("chat stream failed")?;
            stdout.write_all(fragment.as_bytes())?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
        Ok::<(), anyhow::Error>(())
    })
}

fn print_json(
    document: &RawProjectDocument,
    records: &[VideoRecord],
    report: &AnalyticsReport,
    clock: &ReferenceClock,
) -> Result<()> {
    let output = JsonOutput {
        project_id: &document.id,
        project_name: document.name.as_deref(),
        generated_at: clock.at(),
        records,
        report,
    };
    let json = serde_json::to_string_pretty(&output).context("failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

fn print_terminal(document: &RawProjectDocument, report: &AnalyticsReport, clock: &ReferenceClock) {
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", document.display_name());
    println!("╰{}╯", "─".repeat(60));
    println!();

    let totals = &report.totals;
    if totals.records == 0 {
        println!("  No videos in this project.");
        println!();
        return;
    }

    println!("SUMMARY");
    println!(
        "   Videos:  {:<12} Plays:   {}",
        totals.records,
        totals.plays_display()
    );
    println!(
        "   Dated:   {:<12} Danmaku: {}",
        totals.dated_records,
        totals.danmaku_display()
    );
    println!("   Average plays: {}", format_compact(totals.average_plays()));
    println!();

    print_histogram("PLAY COUNTS", &report.play_histogram);
    print_histogram("DURATIONS", &report.duration_histogram);

    if !report.top_by_plays.is_empty() {
        println!("TOP BY PLAYS");
        for (i, record) in report.top_by_plays.iter().enumerate() {
            println!(
                "   {:>3}. {:<36} {:>8}  {}",
                i + 1,
                truncate_chars(&record.title, 36),
                format_compact(record.play_count),
                record.uploader
            );
        }
        println!();
    }

    if !report.top_by_recency.is_empty() {
        println!("MOST RECENT");
        for (i, record) in report.top_by_recency.iter().enumerate() {
            let when = record
                .publish_instant(clock)
                .map(|ts| format_relative_time(ts, clock))
                .unwrap_or_else(|| record.publish_time.clone());
            println!(
                "   {:>3}. {:<36} {:>10}",
                i + 1,
                truncate_chars(&record.title, 36),
                when
            );
        }
        println!();
    }

    if !report.keywords.is_empty() {
        println!("KEYWORDS");
        let line = report
            .keywords
            .iter()
            .take(20)
            .map(|k| format!("{} ({})", k.word, k.count))
            .collect::<Vec<_>>()
            .join(", ");
        println!("   {}", line);
        println!();
    }

    if let (Some(first), Some(last)) = (report.timeline.first(), report.timeline.last()) {
        println!("TIMELINE");
        println!(
            "   {} dated videos from {} to {}",
            report.timeline.len(),
            first.day,
            last.day
        );
        println!();
    }
}

fn print_histogram(title: &str, buckets: &[HistogramBucket]) {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    println!("{}", title);
    for bucket in buckets {
        let width = if max == 0 { 0 } else { bucket.count * 30 / max };
        println!(
            "   {:>10} {:>6}  {}",
            bucket.label,
            bucket.count,
            "█".repeat(width as usize)
        );
    }
    println!();
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
