// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use mtm_pipelines::pipeline::orchestrator::OcrEngine;
use mtm_pipelines::utils::logging::{format_error, format_info, format_success, format_warning};
use mtm_pipelines::{
    cancel_pair, exporter, BatchSummary, Config, ConsoleProgress, Job, JobRunner, JsonExporter,
    RecordResult, XlsxExporter,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "mtm_pipelines")]
#[command(version = "0.1.0")]
#[command(about = "Command-line client for the MTM AI pipeline services", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    Deepseek,
    Hunyuan,
}

impl From<EngineArg> for OcrEngine {
    fn from(engine: EngineArg) -> Self {
        match engine {
            EngineArg::Deepseek => OcrEngine::Deepseek,
            EngineArg::Hunyuan => OcrEngine::Hunyuan,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ExportFormat {
    Xlsx,
    Json,
    None,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single image
    Ocr {
        image: PathBuf,

        #[arg(long, value_enum, default_value_t = EngineArg::Deepseek)]
        engine: EngineArg,
    },

    /// Extract structured bankruptcy-notice fields from newspaper images
    Extract {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        #[arg(long, value_enum, default_value_t = EngineArg::Deepseek)]
        engine: EngineArg,

        #[arg(long, value_enum, default_value_t = ExportFormat::None)]
        export: ExportFormat,
    },

    /// Run the kunye batch pipeline over a clip-id spreadsheet
    Kunye {
        sheet: PathBuf,

        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        /// Spreadsheet column holding the clip identifiers
        #[arg(long, default_value = "A")]
        column: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        export: ExportFormat,
    },

    /// Run the kunye web pipeline over a spreadsheet of publications and links
    KunyeWeb {
        sheet: PathBuf,

        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        /// Spreadsheet column holding the publication names
        #[arg(long, default_value = "A")]
        yayin_column: String,

        /// Spreadsheet column holding the web page links
        #[arg(long, default_value = "B")]
        link_column: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        export: ExportFormat,
    },

    /// Separate an audio file into isolated/residual tracks
    Separate {
        audio: PathBuf,

        /// Natural-language description of the sound to isolate
        #[arg(long)]
        prompt: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze a radio broadcast recording for news items (streaming)
    Radio {
        audio: PathBuf,

        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        export: ExportFormat,
    },

    /// Probe the health endpoints of every configured service
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    mtm_pipelines::utils::logging::init_logger(cli.color, cli.verbose);

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    let runner = JobRunner::new(config.clone())?;

    match cli.command {
        Commands::Ocr { image, engine } => {
            cmd_ocr(&runner, image, engine.into()).await?;
        }
        Commands::Extract {
            images,
            api_key,
            engine,
            export,
        } => {
            cmd_extract(&runner, &config, images, api_key, engine.into(), export).await?;
        }
        Commands::Kunye {
            sheet,
            api_key,
            column,
            export,
        } => {
            cmd_kunye(&runner, &config, sheet, api_key, &column, export).await?;
        }
        Commands::KunyeWeb {
            sheet,
            api_key,
            yayin_column,
            link_column,
            export,
        } => {
            cmd_kunye_web(&runner, &config, sheet, api_key, &yayin_column, &link_column, export)
                .await?;
        }
        Commands::Separate {
            audio,
            prompt,
            output,
        } => {
            cmd_separate(&runner, &config, audio, &prompt, output).await?;
        }
        Commands::Radio {
            audio,
            api_key,
            export,
        } => {
            cmd_radio(&runner, &config, audio, api_key, export).await?;
        }
        Commands::Health => {
            cmd_health(&runner, &config).await?;
        }
    }

    Ok(())
}

async fn cmd_ocr(runner: &JobRunner, image: PathBuf, engine: OcrEngine) -> Result<()> {
    let job = runner.run_ocr(&image, engine).await?;
    let job = require_completed(job)?;

    for record in job.result_rows() {
        if let Some(text) = record.raw_text.as_deref() {
            println!("{}", text);
        }
    }
    Ok(())
}

async fn cmd_extract(
    runner: &JobRunner,
    config: &Config,
    images: Vec<PathBuf>,
    api_key: Option<String>,
    engine: OcrEngine,
    export: ExportFormat,
) -> Result<()> {
    let job = runner.run_iflas(&images, api_key, engine).await?;
    let job = require_completed(job)?;

    for record in job.result_rows() {
        println!("{}", format_info(&format!("Record {}", record.index)));
        println!("{}", serde_json::to_string_pretty(&record.fields)?);
    }

    export_table(
        config,
        export,
        exporter::iflas_table(job.result_rows()),
        job.result_rows(),
        job.summary().copied(),
        "iflas_sonuclari",
        "İflas Sonuçları",
    )?;
    Ok(())
}

async fn cmd_kunye(
    runner: &JobRunner,
    config: &Config,
    sheet: PathBuf,
    api_key: Option<String>,
    column: &str,
    export: ExportFormat,
) -> Result<()> {
    let job = runner.run_kunye_batch(&sheet, api_key, column).await?;
    let job = require_completed(job)?;

    print_summary(job.summary());
    for record in job.result_rows() {
        match record.error_message.as_deref() {
            None => println!(
                "{}",
                format_success(&format!("row {} ({})", record.index, record.source_id))
            ),
            Some(error) => println!(
                "{}",
                format_error(&format!(
                    "row {} ({}): {}",
                    record.index, record.source_id, error
                ))
            ),
        }
    }

    export_table(
        config,
        export,
        exporter::kunye_table(job.result_rows()),
        job.result_rows(),
        job.summary().copied(),
        "kunye_sonuclari",
        "Künye Sonuçları",
    )?;
    Ok(())
}

async fn cmd_kunye_web(
    runner: &JobRunner,
    config: &Config,
    sheet: PathBuf,
    api_key: Option<String>,
    yayin_column: &str,
    link_column: &str,
    export: ExportFormat,
) -> Result<()> {
    let progress = ConsoleProgress::with_color(true);
    let cancel = spawn_ctrl_c_handler();

    let job = runner
        .run_kunye_web_stream(&sheet, api_key, yayin_column, link_column, cancel, &progress)
        .await?;
    progress.finish();

    if !job.state().is_terminal() {
        println!("{}", format_warning("Cancelled"));
        return Ok(());
    }
    let job = require_completed(job)?;

    print_summary(job.summary());
    for record in job.result_rows() {
        match record.error_message.as_deref() {
            None => println!(
                "{}",
                format_success(&format!("row {} ({})", record.index, record.source_id))
            ),
            Some(error) => println!(
                "{}",
                format_error(&format!(
                    "row {} ({}): {}",
                    record.index, record.source_id, error
                ))
            ),
        }
    }

    export_table(
        config,
        export,
        exporter::kunye_table(job.result_rows()),
        job.result_rows(),
        job.summary().copied(),
        "kunye_web_sonuclari",
        "Künye Web Sonuçları",
    )?;
    Ok(())
}

async fn cmd_separate(
    runner: &JobRunner,
    config: &Config,
    audio: PathBuf,
    prompt: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| config.export.output_dir.clone());
    let progress = ConsoleProgress::with_color(true);
    let cancel = spawn_ctrl_c_handler();

    let (job, downloads) = runner
        .run_audio_separation(&audio, prompt, &output_dir, cancel, &progress)
        .await?;
    progress.finish();

    if !job.state().is_terminal() {
        println!("{}", format_warning("Cancelled"));
        return Ok(());
    }
    let _job = require_completed(job)?;

    println!("{}", format_success("Separation complete"));
    for path in downloads {
        println!("  {}", path.display());
    }
    Ok(())
}

async fn cmd_radio(
    runner: &JobRunner,
    config: &Config,
    audio: PathBuf,
    api_key: Option<String>,
    export: ExportFormat,
) -> Result<()> {
    let progress = ConsoleProgress::with_color(true);
    let cancel = spawn_ctrl_c_handler();

    let job = runner
        .run_radio_stream(&audio, api_key, cancel, &progress)
        .await?;
    let stats = progress.get_stats();
    progress.finish();

    if !job.state().is_terminal() {
        println!("{}", format_warning("Cancelled"));
        return Ok(());
    }
    let job = require_completed(job)?;

    info!("Stream finished in {} seconds", stats.duration_secs);
    for record in job.result_rows() {
        if let Some(count) = record.scalar("total_news_count") {
            println!("{}", format_success(&format!("{} news items found", count)));
        }
        println!("{}", serde_json::to_string_pretty(&record.fields)?);
    }

    if export == ExportFormat::Json {
        let path = JsonExporter::new(&config.export.output_dir, config.export.pretty_json)?
            .export(job.result_rows(), job.summary().copied(), "radyo_analiz")?;
        println!("{}", format_info(&format!("Exported to {}", path.display())));
    }
    Ok(())
}

async fn cmd_health(runner: &JobRunner, config: &Config) -> Result<()> {
    let services = [
        ("deepseek-ocr", &config.services.ocr_base_url),
        ("hunyuan-ocr", &config.services.hunyuan_ocr_base_url),
        ("iflas", &config.services.iflas_base_url),
        ("kunye", &config.services.kunye_base_url),
        ("kunye-web", &config.services.kunye_web_base_url),
        ("sam-audio", &config.services.audio_base_url),
        ("radyo", &config.services.radio_base_url),
    ];

    let mut unhealthy = 0usize;
    for (name, base) in services {
        match runner.client().health(base).await {
            Ok(_) => println!("{}", format_success(name)),
            Err(e) => {
                unhealthy += 1;
                println!("{}", format_error(&format!("{}: {}", name, e)));
            }
        }
    }

    if unhealthy > 0 {
        anyhow::bail!("{} service(s) unhealthy", unhealthy);
    }
    Ok(())
}

/// A completed job passes through; a failed one renders its error inline and
/// stops the command.
fn require_completed(job: Job) -> Result<Job> {
    if let Some(error) = job.error() {
        println!("{}", format_error(error));
        anyhow::bail!("job failed: {}", error);
    }
    Ok(job)
}

fn print_summary(summary: Option<&BatchSummary>) {
    if let Some(summary) = summary {
        println!(
            "{}",
            format_info(&format!(
                "total {} | successful {} | failed {} | processed {}",
                summary.total, summary.successful, summary.failed, summary.processed
            ))
        );
    }
}

fn export_table(
    config: &Config,
    format: ExportFormat,
    table: exporter::ResultTable,
    records: &[RecordResult],
    summary: Option<BatchSummary>,
    file_stem: &str,
    sheet_name: &str,
) -> Result<()> {
    let path = match format {
        ExportFormat::None => return Ok(()),
        ExportFormat::Xlsx => {
            XlsxExporter::new(&config.export.output_dir)?.write(&table, file_stem, sheet_name)?
        }
        ExportFormat::Json => JsonExporter::new(&config.export.output_dir, config.export.pretty_json)?
            .export(records, summary, file_stem)?,
    };
    println!("{}", format_info(&format!("Exported to {}", path.display())));
    Ok(())
}

fn spawn_ctrl_c_handler() -> mtm_pipelines::CancelToken {
    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling job");
            handle.cancel();
        }
    });
    token
}
