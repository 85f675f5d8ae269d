use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::{Args, Parser, Subcommand, ValueEnum};
use printseq_printing::{
    decode_kind, fetch_capabilities, prepare_job, submit_job, CapabilityProvider, ConnectInfo,
    DocumentDescriptor, DuplexMode, JobController, JobId, JobParameters, JobPlan, JobSubmission,
    PageRequest, PageTransmitter, PreparedJob, PrinterCapabilities, ReasonKind, SequencerConfig,
    SourceInfo, StackingOrientation, StartRequest, TransmissionFormat,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "printseq-cli",
    about = "Plan and inspect print jobs for network printers",
    author,
    version
)]
struct Cli {
    /// 序列器設定檔路徑。 / Sequencer configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 顯示作業的傳送計畫。 / Show the finalized parameters and transmission plan of a job.
    Plan(PlanArgs),
    /// 將作業送往主控台傳輸端。 / Submit a job to a console transport that echoes every call.
    Submit(SubmitArgs),
    /// 解碼狀態位元遮罩。 / Decode a job status bitmask into reason symbols.
    Decode(DecodeArgs),
    /// 管理序列器設定檔。 / Manage the sequencer configuration file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct PlanArgs {
    /// 作業描述 JSON 檔。 / Job description (JSON).
    job: PathBuf,
    /// 以 JSON 輸出。 / Emit JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SubmitArgs {
    /// 作業描述 JSON 檔。 / Job description (JSON).
    job: PathBuf,
    /// 讓第 N 次頁面傳送失敗（從 1 起算）。 / Make the N-th page transmission fail (1-based).
    #[arg(long, value_name = "N")]
    fail_at: Option<usize>,
}

#[derive(Args)]
struct DecodeArgs {
    /// 位元遮罩，十進位或 0x 十六進位。 / Bitmask, decimal or 0x-prefixed hexadecimal.
    bits: String,
    /// 使用的原因表。 / Reason table to decode with.
    #[arg(long, value_enum, default_value_t = TableChoice::Blocked)]
    table: TableChoice,
    /// 以 `|` 串接輸出。 / Print the symbols joined with `|` on one line.
    #[arg(long)]
    joined: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum TableChoice {
    Blocked,
    Failed,
}

impl From<TableChoice> for ReasonKind {
    fn from(choice: TableChoice) -> Self {
        match choice {
            TableChoice::Blocked => ReasonKind::Blocked,
            TableChoice::Failed => ReasonKind::Failed,
        }
    }
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// 寫入預設設定檔。 / Write a default configuration file.
    Init {
        /// 目標路徑。 / Destination path.
        path: PathBuf,
    },
    /// 顯示生效中的設定。 / Print the effective configuration.
    Show,
}

/// Job description read by `plan` and `submit`.
#[derive(Deserialize)]
struct JobDescription {
    #[serde(default = "default_address")]
    address: String,
    #[serde(default = "default_port")]
    port: u16,
    capabilities: PrinterCapabilities,
    #[serde(default)]
    params: JobParameters,
    documents: Vec<DocumentDescriptor>,
}

fn default_address() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    631
}

/// Answers capability queries from the job description.
struct DescribedPrinter(PrinterCapabilities);

impl CapabilityProvider for DescribedPrinter {
    type Error = std::convert::Infallible;

    fn fetch(&self, _connection: &ConnectInfo) -> Result<PrinterCapabilities, Self::Error> {
        Ok(self.0.clone())
    }
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let Cli { config, command } = Cli::parse();
    match command {
        Commands::Plan(args) => {
            let config = load_config(config.as_deref())?;
            execute_plan(args, &config)
        }
        Commands::Submit(args) => {
            let config = load_config(config.as_deref())?;
            execute_submit(args, &config)
        }
        Commands::Decode(args) => execute_decode(args),
        Commands::Config(command) => execute_config(command, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<SequencerConfig> {
    let Some(path) = path else {
        return Ok(SequencerConfig::default());
    };
    if !path.exists() {
        info!(path = %path.display(), "configuration file not found, using defaults");
    }
    let config = SequencerConfig::load_or_default(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    info!(
        path = %path.display(),
        capability_timeout_ms = config.capability_timeout_ms,
        "loaded configuration"
    );
    Ok(config)
}

fn read_job(path: &Path) -> Result<JobDescription> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse job description {}", path.display()))
}

fn resolve_printer(
    job: &JobDescription,
    config: &SequencerConfig,
) -> Result<(ConnectInfo, PrinterCapabilities)> {
    let connection = ConnectInfo::new(job.address.clone(), job.port, config);
    let provider = DescribedPrinter(job.capabilities.clone());
    let capabilities = fetch_capabilities(&provider, &connection)
        .with_context(|| format!("failed to query {connection}"))?;
    Ok((connection, capabilities))
}

#[derive(Serialize)]
struct PlanReport<'a> {
    job_name: &'a str,
    mime_type: &'a str,
    format: TransmissionFormat,
    stacking: StackingOrientation,
    duplex: DuplexMode,
    smart_duplex: bool,
    print_scaling: &'a str,
    render_flags: u32,
    job_pages_per_set: u32,
    certificate: Option<String>,
    plan: &'a JobPlan,
}

impl<'a> PlanReport<'a> {
    fn new(prepared: &'a PreparedJob) -> Self {
        let params = &prepared.params;
        Self {
            job_name: &params.job_name,
            mime_type: &prepared.mime_type,
            format: prepared.format,
            stacking: prepared.stacking,
            duplex: params.duplex,
            smart_duplex: prepared.smart_duplex,
            print_scaling: &params.print_scaling,
            render_flags: params.render_flags.bits(),
            job_pages_per_set: params.job_pages_per_set,
            certificate: params.certificate.as_ref().map(|bytes| BASE64.encode(bytes)),
            plan: &prepared.plan,
        }
    }
}

fn execute_plan(args: PlanArgs, config: &SequencerConfig) -> Result<()> {
    let job = read_job(&args.job)?;
    let (_, capabilities) = resolve_printer(&job, config)?;
    let prepared = prepare_job(&job.documents, &job.params, &capabilities)?;

    if args.json {
        let report = PlanReport::new(&prepared);
        let text = serde_json::to_string_pretty(&report).context("failed to encode plan")?;
        println!("{text}");
        return Ok(());
    }

    let params = &prepared.params;
    println!("format: {}", prepared.format);
    println!("stacking: {}", stacking_label(prepared.stacking));
    println!(
        "duplex: {}{}",
        duplex_label(params.duplex),
        if prepared.smart_duplex { " (smart duplex)" } else { "" }
    );
    println!(
        "print-scaling: {}",
        if params.print_scaling.is_empty() {
            "<unset>"
        } else {
            params.print_scaling.as_str()
        }
    );
    println!("pages-per-set: {}", params.job_pages_per_set);
    for (index, request) in prepared.plan.pages().iter().enumerate() {
        println!("{:>3}. {}", index + 1, describe_request(request));
    }
    println!("  -. {}", describe_request(&prepared.plan.end_marker));
    Ok(())
}

fn execute_submit(args: SubmitArgs, config: &SequencerConfig) -> Result<()> {
    let job = read_job(&args.job)?;
    let (connection, capabilities) = resolve_printer(&job, config)?;

    let controller = ConsoleController::new(args.fail_at);
    controller.init().map_err(|err| anyhow!(err))?;
    controller.set_source_info(&config.source);

    let outcome = submit_job(
        &controller,
        JobSubmission {
            connection: &connection,
            documents: &job.documents,
            params: &job.params,
            capabilities: &capabilities,
            debug_dir: config.debug_dir.as_deref(),
        },
    );

    let result = match outcome {
        Ok(submitted) => {
            controller
                .end_job(submitted.job_id)
                .map_err(|err| anyhow!(err))?;
            info!(
                job_id = %submitted.job_id,
                pages = submitted.prepared.plan.pages().len(),
                "job submitted"
            );
            println!("submitted {}", submitted.job_id);
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "job submission failed");
            Err(anyhow!(err).context("job submission failed"))
        }
    };
    controller.shutdown().map_err(|err| anyhow!(err))?;
    result
}

fn execute_decode(args: DecodeArgs) -> Result<()> {
    let bits = parse_bits(&args.bits)?;
    let reasons = decode_kind(bits, args.table.into());
    if args.joined {
        println!("{}", reasons.joined());
    } else {
        for symbol in reasons.iter() {
            println!("{symbol}");
        }
    }
    Ok(())
}

fn execute_config(command: ConfigCommand, path: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommand::Init { path } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            SequencerConfig::default()
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(path)?;
            let text =
                serde_json::to_string_pretty(&config).context("failed to encode configuration")?;
            println!("{text}");
            Ok(())
        }
    }
}

fn parse_bits(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.with_context(|| format!("invalid bitmask '{input}'"))
}

fn describe_request(request: &PageRequest) -> String {
    match (&request.content, request.document) {
        (Some(path), Some(document)) => format!(
            "doc {document} {} page {}{}",
            path.display(),
            request.page_number,
            if request.pdf_passthrough { " [pdf]" } else { "" }
        ),
        _ => format!("end-of-document (page {})", request.page_number),
    }
}

fn stacking_label(stacking: StackingOrientation) -> &'static str {
    match stacking {
        StackingOrientation::FaceDown => "face-down",
        StackingOrientation::FaceUp => "face-up",
    }
}

fn duplex_label(duplex: DuplexMode) -> &'static str {
    match duplex {
        DuplexMode::Off => "off",
        DuplexMode::LongEdge => "long-edge",
        DuplexMode::ShortEdge => "short-edge",
    }
}

/// Transport that prints every call instead of talking to a printer.
struct ConsoleController {
    fail_at: Option<usize>,
    transmitted: Mutex<usize>,
}

impl ConsoleController {
    fn new(fail_at: Option<usize>) -> Self {
        Self {
            fail_at,
            transmitted: Mutex::new(0),
        }
    }
}

impl PageTransmitter for ConsoleController {
    type Error = String;

    fn transmit_page(&self, job: JobId, request: &PageRequest) -> Result<(), Self::Error> {
        println!("{job} send {}", describe_request(request));
        if request.is_end_of_document() {
            return Ok(());
        }
        let mut transmitted = self
            .transmitted
            .lock()
            .map_err(|_| "transmission counter poisoned".to_string())?;
        *transmitted += 1;
        if self.fail_at == Some(*transmitted) {
            return Err(format!("page {} refused by console transport", request.page_number));
        }
        Ok(())
    }
}

impl JobController for ConsoleController {
    fn init(&self) -> Result<(), Self::Error> {
        println!("init");
        Ok(())
    }

    fn shutdown(&self) -> Result<(), Self::Error> {
        println!("shutdown");
        Ok(())
    }

    fn set_source_info(&self, source: &SourceInfo) {
        println!(
            "source {} {} on {}",
            source.app_name, source.app_version, source.os_name
        );
    }

    fn start_job(&self, request: &StartRequest<'_>) -> Result<JobId, Self::Error> {
        let job = JobId::from_raw(1);
        println!(
            "{job} start {} {} scaling={:?}",
            request.connection, request.mime_type, request.params.print_scaling
        );
        if let Some(dir) = request.debug_dir {
            println!("{job} debug dir {}", dir.display());
        }
        Ok(job)
    }

    fn cancel_job(&self, job: JobId) -> Result<(), Self::Error> {
        println!("{job} cancel");
        Ok(())
    }

    fn end_job(&self, job: JobId) -> Result<(), Self::Error> {
        println!("{job} end");
        Ok(())
    }
}
