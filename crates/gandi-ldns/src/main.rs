// # gandi-ldns - Gandi LiveDNS updater
//
// One-shot client that keeps Gandi LiveDNS A records pointing at the current
// address of the configured hosts. Run it from cron or a systemd timer.
//
// The binary is a thin integration layer:
// 1. Initialize logging
// 2. Load `config.txt` from the executable's directory
// 3. Build the shared HTTP transport, the provider and the IP source
// 4. Run one reconciliation pass
// 5. Map the outcome to an exit code
//
// All reconciliation logic lives in ldns-core.
//
// ## Configuration
//
// `config.txt` next to the executable, one INI section per host:
//
// ```ini
// [DEFAULT]
// api = https://api.gandi.net/v5/livedns/
// apikey = your_api_key
// ttl = 300
//
// [home]
// domain = example.com
// a_name = @
// host = home.example.com
// ```
//
// Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::{Context, Result, anyhow};
use ldns_core::config::{CONFIG_FILE_NAME, HostEntry, RetryPolicy, load_config};
use ldns_core::http::{HttpTransport, build_client};
use ldns_core::{Error, Reconciler, RunSummary, SystemResolver};
use ldns_ip_http::HttpIpSource;
use ldns_provider_gandi::{DEFAULT_HTTP_TIMEOUT, GandiProvider};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit codes for the possible run outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LdnsExitCode {
    /// Every entry matched or was updated
    Success = 0,
    /// Configuration missing or invalid, or startup failure
    ConfigError = 1,
    /// Public IP discovery failed
    ExternalIpError = 2,
    /// The pass completed but at least one entry failed
    EntryFailures = 3,
}

impl From<LdnsExitCode> for ExitCode {
    fn from(code: LdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl LdnsExitCode {
    /// Exit code for the result of a reconciliation pass
    fn for_run(result: &ldns_core::Result<RunSummary>) -> Self {
        match result {
            Ok(summary) if summary.is_clean() => Self::Success,
            Ok(_) => Self::EntryFailures,
            Err(Error::ExternalIp(_)) => Self::ExternalIpError,
            Err(_) => Self::ConfigError,
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return LdnsExitCode::ConfigError.into();
    }

    let path = match config_path() {
        Ok(path) => path,
        Err(e) => {
            error!("{:#}", e);
            return LdnsExitCode::ConfigError.into();
        }
    };

    let entries = match load_entries(&path) {
        Ok(entries) => entries,
        Err(code) => return code.into(),
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return LdnsExitCode::ConfigError.into();
        }
    };

    let code = rt.block_on(async {
        let reconciler = match build_reconciler() {
            Ok(reconciler) => reconciler,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                return LdnsExitCode::ConfigError;
            }
        };

        run_once(&reconciler, &entries).await
    });

    code.into()
}

/// Install the global tracing subscriber, filtered by `RUST_LOG`
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!(e))
}

/// `config.txt` in the directory of the running executable
fn config_path() -> Result<PathBuf> {
    let exe = env::current_exe().context("Cannot locate the running executable")?;
    let dir = exe
        .parent()
        .with_context(|| format!("{} has no parent directory", exe.display()))?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load the host entries, telling the operator what to fix on failure
fn load_entries(path: &Path) -> std::result::Result<Vec<HostEntry>, LdnsExitCode> {
    match load_config(path) {
        Ok(entries) => {
            info!(
                "Loaded {} host entr{} from {}",
                entries.len(),
                if entries.len() == 1 { "y" } else { "ies" },
                path.display()
            );
            Ok(entries)
        }
        Err(Error::ConfigMissing(path)) => {
            warn!("No host entries found in {}", path.display());
            eprintln!("please fill in the '{}' file", CONFIG_FILE_NAME);
            Err(LdnsExitCode::ConfigError)
        }
        Err(e) => {
            error!("{}", e);
            Err(LdnsExitCode::ConfigError)
        }
    }
}

/// Wire the production components
///
/// One HTTP client is shared by the provider and the IP source.
fn build_reconciler() -> Result<Reconciler> {
    let client = build_client(DEFAULT_HTTP_TIMEOUT).context("Failed to build HTTP client")?;
    let transport = HttpTransport::new(client, RetryPolicy::default());

    Ok(Reconciler::new(
        Box::new(GandiProvider::new(transport.clone())),
        Box::new(SystemResolver::new()),
        Box::new(HttpIpSource::new(transport)),
    ))
}

/// Run one pass and report how it went
async fn run_once(reconciler: &Reconciler, entries: &[HostEntry]) -> LdnsExitCode {
    let result = reconciler.run(entries).await;

    match &result {
        Ok(summary) if !summary.is_clean() => {
            warn!("{} of {} entries failed", summary.failed(), summary.entries.len());
        }
        Ok(_) => {}
        Err(e) => error!("Run aborted: {}", e),
    }

    LdnsExitCode::for_run(&result)
}
