use clap::{Parser, Subcommand};
use cryptotrack::history::{HistoryFormat, HistoryStore};
use cryptotrack::provider::coingecko::{self, CoinGecko};
use cryptotrack::provider::{PriceProvider, normalize_currency, parse_coin_list};
use cryptotrack::report::{self, PriceForm, ReportLog};
use cryptotrack::{config, error, output, repl};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::Result;

#[derive(Parser)]
#[command(
    name = "cryptotrack",
    version,
    about = "Look up cryptocurrency prices from your terminal"
)]
struct Cli {
    /// Quote currency (e.g. usd, eur). Skips the currency prompt.
    #[arg(long, short, global = true)]
    currency: Option<String>,

    /// Explicit config file path (overrides XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pricing API base URL
    #[arg(long, env = "CRYPTOTRACK_BASE_URL", global = true)]
    base_url: Option<String>,

    /// History file used by the interactive console
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Store only coin names in the history file
    #[arg(long)]
    names_only: bool,

    /// Save history automatically when leaving the console
    #[arg(long)]
    autosave: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch prices once and exit
    Quote {
        /// Coin ids, space or comma separated (e.g. bitcoin ethereum)
        #[arg(required = true)]
        coins: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a price report panel and append it to the report log
    Report {
        /// Comma-separated coin ids
        #[arg(long, default_value = report::DEFAULT_COINS)]
        coins: String,

        /// Disable colours
        #[arg(long)]
        plain: bool,

        /// Report log path
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Do not append to the report log
        #[arg(long)]
        no_log: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_base_url(cli: &Cli, app_config: &config::AppConfig) -> String {
    cli.base_url
        .as_deref()
        .or(app_config.api.base_url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(coingecko::BASE_URL)
        .to_string()
}

fn resolve_history_store(cli: &Cli, app_config: &config::AppConfig) -> HistoryStore {
    let path = cli
        .history_file
        .clone()
        .unwrap_or_else(|| app_config.history_path());
    let format = if cli.names_only {
        HistoryFormat::Names
    } else {
        app_config.history_format()
    };
    HistoryStore::new(path, format)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load .env before CLI parsing so env-backed args pick it up.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!(error = %e, "fatal error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = match cli.config.as_deref() {
        Some(path) => config::load_from_path(path)?,
        None => config::load()?,
    };

    let default_currency = app_config.default_currency();
    let provider = CoinGecko::with_base_url(resolve_base_url(&cli, &app_config));

    match &cli.command {
        Some(Command::Quote { coins, json }) => {
            let currency =
                normalize_currency(cli.currency.as_deref().unwrap_or(""), &default_currency);
            quote(&provider, coins, &currency, *json).await
        }
        Some(Command::Report {
            coins,
            plain,
            log_file,
            no_log,
        }) => {
            let form = PriceForm {
                coins: coins.clone(),
                currency: cli.currency.clone().unwrap_or(default_currency),
            };
            let log = (!*no_log).then(|| {
                ReportLog::new(
                    log_file
                        .clone()
                        .unwrap_or_else(|| app_config.report_log_path()),
                )
            });
            show_report(&provider, &form, log.as_ref(), !*plain).await
        }
        None => interactive(&cli, &app_config, &provider, &default_currency).await,
    }
}

async fn quote(
    provider: &dyn PriceProvider,
    coins: &[String],
    currency: &str,
    json: bool,
) -> Result<()> {
    let coin_ids = parse_coin_list(&coins.join(","));
    if coin_ids.is_empty() {
        return Err(error::Error::Config(
            "no coins provided -- usage: cryptotrack quote bitcoin ethereum".into(),
        ));
    }

    info!(provider = provider.name(), coins = ?coin_ids, currency = %currency, "fetching prices");
    let lookups = provider.fetch(&coin_ids, currency).await?;

    if json {
        output::json::print_lookups_json(&lookups)?;
    } else {
        for lookup in &lookups {
            println!("{}", output::table::lookup_block(lookup, currency));
        }
    }

    Ok(())
}

async fn show_report(
    provider: &dyn PriceProvider,
    form: &PriceForm,
    log: Option<&ReportLog>,
    color: bool,
) -> Result<()> {
    info!(coins = %form.coins, currency = %form.currency, "running price report");
    let report = report::get_prices(form, provider, chrono::Local::now()).await;

    println!("{}", output::panel::render_report_panel(&report, color));

    if let Some(log) = log
        && let Err(err) = log.record(&report)
    {
        warn!(error = %err, path = %log.path().display(), "failed to append report log");
        eprintln!("Warning: could not write {}: {}", log.path().display(), err);
    }

    Ok(())
}

async fn interactive(
    cli: &Cli,
    app_config: &config::AppConfig,
    provider: &dyn PriceProvider,
    default_currency: &str,
) -> Result<()> {
    let store = resolve_history_store(cli, app_config);
    let history = store.load();
    info!(path = %store.path().display(), entries = history.len(), "history loaded");

    let mut input = io::stdin().lock();
    let mut out = io::stdout().lock();

    let currency = match cli.currency.as_deref() {
        Some(raw) => normalize_currency(raw, default_currency),
        None => repl::prompt_currency(&mut input, &mut out, default_currency)?,
    };

    let history = repl::Repl::new(provider, &store, currency, input, &mut out)
        .with_autosave(cli.autosave)
        .run(history)
        .await?;
    out.flush()?;

    info!(entries = history.len(), "session finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn no_subcommand_runs_interactive_console() {
        let cli = parse(&["cryptotrack", "--names-only", "-c", "eur"]);
        assert!(cli.command.is_none());
        assert!(cli.names_only);
        assert_eq!(cli.currency.as_deref(), Some("eur"));
    }

    #[test]
    fn quote_requires_coins() {
        assert!(Cli::try_parse_from(["cryptotrack", "quote"]).is_err());

        let cli = parse(&["cryptotrack", "quote", "bitcoin,ethereum", "doge", "--json"]);
        match cli.command {
            Some(Command::Quote { coins, json }) => {
                assert_eq!(coins, vec!["bitcoin,ethereum", "doge"]);
                assert!(json);
            }
            _ => panic!("expected quote command"),
        }
    }

    #[test]
    fn report_defaults_to_prefilled_coins() {
        let cli = parse(&["cryptotrack", "report"]);
        match cli.command {
            Some(Command::Report {
                coins,
                plain,
                no_log,
                ..
            }) => {
                assert_eq!(coins, "bitcoin, ethereum, dogecoin");
                assert!(!plain);
                assert!(!no_log);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn base_url_prefers_cli_then_config_then_default() {
        let mut app_config = config::AppConfig::default();
        let cli = parse(&["cryptotrack"]);
        if std::env::var("CRYPTOTRACK_BASE_URL").is_err() {
            assert_eq!(resolve_base_url(&cli, &app_config), coingecko::BASE_URL);
        }

        app_config.api.base_url = Some("http://config.test/api/v3".to_string());
        let cli = parse(&["cryptotrack", "--base-url", "http://cli.test/api/v3"]);
        assert_eq!(resolve_base_url(&cli, &app_config), "http://cli.test/api/v3");
    }

    #[test]
    fn names_only_flag_overrides_configured_format() {
        let app_config = config::AppConfig::default();
        let cli = parse(&["cryptotrack", "--names-only", "--history-file", "/tmp/h.txt"]);
        let store = resolve_history_store(&cli, &app_config);

        assert_eq!(store.format(), HistoryFormat::Names);
        assert_eq!(store.path(), std::path::Path::new("/tmp/h.txt"));
    }
}
