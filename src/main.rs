//! Purpose: `rowpager` CLI entry point.
//! Role: Binary crate root; parses args, resolves the token, runs one command.
//! Invariants: Rows are written to stdout as JSON lines; diagnostics go to stderr.
//! Invariants: Errors are emitted as JSON on stderr and mapped via `api::to_exit_code`.
//! Invariants: The token is read from flags or environment here, never inside the library.
use std::io::{self, Write};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rowpager::api::{
    ApiResult, ClientConfig, DEFAULT_BASE_URL, DatasetClient, Error, ErrorKind, Page,
    PageRequest, interleave, to_exit_code,
};

const TOKEN_ENV_VARS: [&str; 2] = ["HF_TOKEN", "HUGGINGFACE_ACCESS_TOKEN"];

#[derive(Parser)]
#[command(
    name = "rowpager",
    version,
    about = "Page through remote dataset rows as JSON lines",
    long_about = None,
    after_help = r#"EXAMPLES
  $ rowpager valid rajpurkar/squad
  $ rowpager rows rajpurkar/squad --config plain_text --length 5 --max-pages 2
  $ rowpager interleave sentence-transformers/all-nli sentence-transformers/stsb --config pair
"#
)]
struct Cli {
    #[arg(long, default_value = DEFAULT_BASE_URL, help = "Dataset query service base url")]
    base_url: String,
    #[arg(
        long,
        help = "Bearer token (default: $HF_TOKEN, then $HUGGINGFACE_ACCESS_TOKEN)"
    )]
    token: Option<String>,
    #[arg(long, help = "Per-request timeout in seconds")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Report which viewer features are available for a dataset")]
    Valid { dataset: String },
    #[command(about = "List configs and splits")]
    Splits { dataset: String },
    #[command(about = "Show dataset card metadata for one config")]
    Info {
        dataset: String,
        #[arg(long)]
        config: Option<String>,
    },
    #[command(about = "List the parquet export files")]
    Parquet { dataset: String },
    #[command(about = "Stream rows of one split as JSON lines")]
    Rows {
        dataset: String,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, help = "Stop after this many pages")]
        max_pages: Option<usize>,
    },
    #[command(about = "Interleave rows from several datasets, one page per dataset per round")]
    Interleave {
        #[arg(required = true, num_args = 1..)]
        datasets: Vec<String>,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, help = "Stop after this many rounds")]
        max_rounds: Option<usize>,
    },
}

#[derive(Args, Clone)]
struct PageArgs {
    #[arg(long, default_value = "train")]
    split: String,
    #[arg(long, default_value = "default")]
    config: String,
    #[arg(long, default_value_t = 0)]
    offset: u64,
    #[arg(long, help = "Rows per page (default: 100)")]
    length: Option<u64>,
}

impl PageArgs {
    fn request(&self) -> PageRequest {
        let request = PageRequest::new(&self.split, &self.config).with_offset(self.offset);
        match self.length {
            Some(length) => request.with_length(length),
            None => request,
        }
    }
}

#[derive(Serialize)]
struct RowLine<'a> {
    row_idx: u64,
    row: &'a Value,
    #[serde(skip_serializing_if = "<[Value]>::is_empty")]
    truncated_cells: &'a [Value],
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> ApiResult<()> {
    let config = client_config(&cli);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to start runtime")
                .with_source(err)
        })?;
    runtime.block_on(dispatch(cli.command, config))
}

async fn dispatch(command: Command, config: ClientConfig) -> ApiResult<()> {
    match command {
        Command::Valid { dataset } => {
            let client = DatasetClient::<Value>::new(dataset, config)?;
            emit_json(&client.is_valid().await?)
        }
        Command::Splits { dataset } => {
            let client = DatasetClient::<Value>::new(dataset, config)?;
            emit_json(&client.splits().await?)
        }
        Command::Info { dataset, config: name } => {
            let client = DatasetClient::<Value>::new(dataset, config)?;
            emit_json(&client.info(name.as_deref()).await?)
        }
        Command::Parquet { dataset } => {
            let client = DatasetClient::<Value>::new(dataset, config)?;
            emit_json(&client.parquet_files().await?)
        }
        Command::Rows {
            dataset,
            page,
            max_pages,
        } => {
            let client = DatasetClient::<Value>::new(dataset, config)?;
            let pages = client
                .stream(page.request())?
                .into_stream()
                .take(max_pages.unwrap_or(usize::MAX));
            tokio::pin!(pages);
            let mut count = 0usize;
            while let Some(page) = pages.next().await {
                emit_rows(&page?)?;
                count += 1;
            }
            info!(pages = count, "rows finished");
            Ok(())
        }
        Command::Interleave {
            datasets,
            page,
            max_rounds,
        } => {
            let mut streams = Vec::with_capacity(datasets.len());
            for dataset in &datasets {
                let client = DatasetClient::<Value>::new(dataset.as_str(), config.clone())?;
                streams.push(client.stream(page.request())?);
            }
            let rounds = interleave(streams)
                .into_stream()
                .take(max_rounds.unwrap_or(usize::MAX));
            tokio::pin!(rounds);
            let mut count = 0usize;
            while let Some(round) = rounds.next().await {
                for page in round? {
                    emit_rows(&page)?;
                }
                count += 1;
            }
            info!(rounds = count, "interleave finished");
            Ok(())
        }
    }
}

fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::new().with_base_url(&cli.base_url);
    if let Some(token) = resolve_token(cli.token.as_deref()) {
        config = config.with_token(token);
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

fn resolve_token(flag: Option<&str>) -> Option<String> {
    if let Some(token) = flag.filter(|token| !token.is_empty()) {
        return Some(token.to_string());
    }
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|token| !token.is_empty())
}

fn emit_rows(page: &Page<Value>) -> ApiResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for record in &page.rows {
        let line = RowLine {
            row_idx: record.index,
            row: &record.value,
            truncated_cells: &record.truncated_cells,
        };
        let encoded = serde_json::to_string(&line).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode row")
                .with_source(err)
        })?;
        writeln!(out, "{encoded}").map_err(write_error)?;
    }
    out.flush().map_err(write_error)
}

fn emit_json<T: Serialize>(value: &T) -> ApiResult<()> {
    let encoded = serde_json::to_string_pretty(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode json")
            .with_source(err)
    })?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{encoded}").map_err(write_error)
}

fn write_error(err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write output")
        .with_source(err)
}

fn emit_error(err: &Error) {
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert(
        "message".to_string(),
        json!(err.message().unwrap_or("request failed")),
    );
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(stage) = err.stage() {
        inner.insert("stage".to_string(), json!(format!("{stage:?}")));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = std::error::Error::source(err);
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }
    causes
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
