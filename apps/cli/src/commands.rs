//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use composefn_response as response;
use composefn_shared::{
    AppConfig, ComposeFnError, GroupVersionKind, Labels, RunFunctionRequest, RunFunctionResponse,
    Severity, config_file_path, init_config, load_config,
};
use serde_json::Value;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// composefn - build composition function responses.
#[derive(Parser)]
#[command(
    name = "composefn",
    version,
    about = "Build composition function responses from request documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build a response to a request and print it as JSON.
    Respond(RespondArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `composefn respond`.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RespondArgs {
    /// Request JSON file, or `-` for stdin.
    #[arg(long, default_value = "-")]
    pub request: String,

    /// Response cache TTL in seconds (defaults to the configured TTL).
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Context value to set. Values that are not valid JSON are stored as strings.
    #[arg(long = "context", value_name = "KEY=JSON")]
    pub context: Vec<String>,

    /// Extra resource to request by name.
    #[arg(long = "require-name", value_name = "ID=APIVERSION:KIND:NAME")]
    pub require_name: Vec<String>,

    /// Extra resources to request by labels.
    #[arg(long = "require-labels", value_name = "ID=APIVERSION:KIND[:K=V,...]")]
    pub require_labels: Vec<String>,

    /// Result to append, in order.
    #[arg(long = "result", value_name = "SEVERITY:MESSAGE")]
    pub results: Vec<String>,

    /// Print compact JSON regardless of config.
    #[arg(long)]
    pub compact: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout is
/// reserved for the response document.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "composefn=info",
        1 => "composefn=debug",
        _ => "composefn=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Respond(args) => cmd_respond(&args),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn cmd_respond(args: &RespondArgs) -> Result<()> {
    let config = load_config()?;
    let req = read_request(&args.request)?;
    let rsp = build_response(&req, args, &config)?;

    let pretty = config.defaults.pretty && !args.compact;
    let out = if pretty {
        serde_json::to_string_pretty(&rsp)
    } else {
        serde_json::to_string(&rsp)
    }
    .wrap_err("failed to serialize response")?;

    println!("{out}");
    Ok(())
}

/// Apply the `respond` flags to a fresh response.
///
/// Malformed flags are errors. Requirements the builder rejects become
/// fatal results in the response.
fn build_response(
    req: &RunFunctionRequest,
    args: &RespondArgs,
    config: &AppConfig,
) -> Result<RunFunctionResponse> {
    let ttl = args.ttl.map_or_else(|| config.ttl(), Duration::from_secs);
    let mut rsp = response::to(req, ttl);
    info!(tag = req.tag(), ttl_secs = ttl.as_secs(), "building response");

    for raw in &args.context {
        let (key, value) = parse_context(raw)?;
        response::set_context_key(&mut rsp, key, value);
    }

    for raw in &args.require_name {
        let (id, gvk, name) = parse_name_requirement(raw)?;
        if let Err(e) = response::request_extra_resource_by_name(&mut rsp, &id, &name, &gvk) {
            warn!(%e, "requirement rejected");
            response::fatal(&mut rsp, e);
        }
    }

    for raw in &args.require_labels {
        let (id, gvk, labels) = parse_labels_requirement(raw)?;
        if let Err(e) = response::request_extra_resource_by_labels(&mut rsp, &id, labels, &gvk) {
            warn!(%e, "requirement rejected");
            response::fatal(&mut rsp, e);
        }
    }

    for raw in &args.results {
        let (severity, message) = parse_result(raw)?;
        response::append_result(&mut rsp, severity, message);
    }

    debug!(results = rsp.results.len(), "response built");
    Ok(rsp)
}

fn read_request(source: &str) -> Result<RunFunctionRequest> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| ComposeFnError::io("<stdin>", e))?;
        buf
    } else {
        std::fs::read_to_string(source).map_err(|e| ComposeFnError::io(source, e))?
    };

    let req = serde_json::from_str(&raw)
        .map_err(|e| ComposeFnError::parse(format!("invalid request document {source}: {e}")))?;
    Ok(req)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("# {}", config_file_path()?.display());
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Flag parsing
// ---------------------------------------------------------------------------

fn parse_context(raw: &str) -> composefn_shared::Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ComposeFnError::parse(format!("context {raw:?} must be KEY=VALUE")))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn parse_result(raw: &str) -> composefn_shared::Result<(Severity, String)> {
    let (severity, message) = raw
        .split_once(':')
        .ok_or_else(|| ComposeFnError::parse(format!("result {raw:?} must be SEVERITY:MESSAGE")))?;
    let severity = severity.parse::<Severity>()?;
    Ok((severity, message.to_string()))
}

/// `ID=APIVERSION:KIND:NAME`. Empty parts are left for the builder to reject.
fn parse_name_requirement(
    raw: &str,
) -> composefn_shared::Result<(String, GroupVersionKind, String)> {
    let malformed =
        || ComposeFnError::parse(format!("requirement {raw:?} must be ID=APIVERSION:KIND:NAME"));
    let (id, rest) = raw.split_once('=').ok_or_else(malformed)?;
    let mut parts = rest.splitn(3, ':');
    let (Some(api_version), Some(kind), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    Ok((
        id.to_string(),
        GroupVersionKind::from_api_version_kind(api_version, kind),
        name.to_string(),
    ))
}

/// `ID=APIVERSION:KIND[:K=V,K=V]`. Omitting the labels selects every
/// resource of the kind.
fn parse_labels_requirement(
    raw: &str,
) -> composefn_shared::Result<(String, GroupVersionKind, Labels)> {
    let malformed = || {
        ComposeFnError::parse(format!(
            "requirement {raw:?} must be ID=APIVERSION:KIND[:K=V,...]"
        ))
    };
    let (id, rest) = raw.split_once('=').ok_or_else(malformed)?;
    let mut parts = rest.splitn(3, ':');
    let (Some(api_version), Some(kind)) = (parts.next(), parts.next()) else {
        return Err(malformed());
    };

    let mut labels = Labels::new();
    for pair in parts.next().unwrap_or("").split(',').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').ok_or_else(malformed)?;
        labels.insert(k.to_string(), v.to_string());
    }

    Ok((
        id.to_string(),
        GroupVersionKind::from_api_version_kind(api_version, kind),
        labels,
    ))
}
