//! `riskwatch` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto tenant sessions and report runs in `riskwatch_core`.
//! - Translate failures into stable exit codes for schedulers.
//!
//! Exit codes: `0` ok, `1` other failure, `2` store, `3` delivery, `4` config.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use riskwatch_core::db::{open_db, DbError};
use riskwatch_core::{
    AddCompanyOutcome, AppConfig, ArticleMatcher, CancelToken, ConfigError, DeliveryError,
    DeliveryTarget, LogDelivery, MailRelayDelivery, NewsApiProvider, RemoveCompanyOutcome,
    RepoError, Report, ReportBuilder, ReportDelivery, ReportRunner, RunError, Session,
    SessionError, SmtpDelivery, SqliteTenantRepository, TenantService, EMPTY_REPORT_TEXT,
};
use rusqlite::Connection;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;
const EXIT_STORE: u8 = 2;
const EXIT_DELIVERY: u8 = 3;
const EXIT_CONFIG: u8 = 4;

#[derive(Parser, Debug)]
#[command(name = "riskwatch", version, about = "Adverse-media monitoring for tracked companies")]
struct Cli {
    #[arg(long, global = true, help = "Tenant database path (overrides RISKWATCH_DB)")]
    db: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level (overrides RISKWATCH_LOG_LEVEL)")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    username: String,
    #[arg(long, help = "Password; read from the first stdin line when omitted")]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account.
    Register {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Store the address that receives this account's reports.
    SetEmail {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        email: String,
    },
    AddCompany {
        #[command(flatten)]
        credentials: Credentials,
        company: String,
    },
    RemoveCompany {
        #[command(flatten)]
        credentials: Credentials,
        company: String,
    },
    /// List tracked companies in the order they were added.
    Companies {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Scan this account's companies and print flagged articles.
    Scan {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long, default_value_t = false, help = "Also deliver the report to the stored email")]
        deliver: bool,
    },
    /// Scan the configured watchlist and deliver one report.
    Batch {
        #[arg(long, default_value_t = false, help = "Write the report to stdout instead of mailing it")]
        dry_run: bool,
    },
    /// Deliver a report to every account with a stored email.
    BatchUsers {
        #[arg(long, default_value_t = false, help = "Write reports to stdout instead of mailing them")]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code(&err);
            error!("event=cli_command module=cli status=error exit_code={code} error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(code)
        }
    };
    log::logger().flush();
    code
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = Some(level);
    }
    init_cli_logging(&config)?;

    match cli.command {
        Commands::Register { credentials } => {
            let password = read_password(&credentials)?;
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let user_id = Session::new().register(&tenants, &credentials.username, &password)?;
            info!("event=cli_register module=cli status=ok user_id={user_id}");
            println!("registered {}", credentials.username);
        }
        Commands::SetEmail { credentials, email } => {
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let mut session = login(&tenants, &credentials)?;
            session.set_notification_email(&tenants, &email)?;
            println!("email updated");
        }
        Commands::AddCompany {
            credentials,
            company,
        } => {
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let session = login(&tenants, &credentials)?;
            match session.add_company(&tenants, &company)? {
                AddCompanyOutcome::Added => println!("tracking {}", company.trim()),
                AddCompanyOutcome::AlreadyTracked => {
                    println!("already tracking {}", company.trim())
                }
            }
        }
        Commands::RemoveCompany {
            credentials,
            company,
        } => {
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let session = login(&tenants, &credentials)?;
            match session.remove_company(&tenants, &company)? {
                RemoveCompanyOutcome::Removed => println!("stopped tracking {}", company.trim()),
                RemoveCompanyOutcome::NotTracked => println!("not tracking {}", company.trim()),
            }
        }
        Commands::Companies { credentials } => {
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let session = login(&tenants, &credentials)?;
            for company in session.companies(&tenants)? {
                println!("{company}");
            }
        }
        Commands::Scan {
            credentials,
            deliver,
        } => {
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let session = login(&tenants, &credentials)?;
            let user_id = session.user_id()?;

            let provider = NewsApiProvider::new(config.news_api_options()?)
                .context("failed to build news client")?;
            let matcher = ArticleMatcher::builtin()?;
            let delivery = build_delivery(&config, false)?;
            let runner = ReportRunner::new(
                ReportBuilder::new(&provider, &matcher)
                    .with_fetch_concurrency(config.fetch_concurrency),
                delivery.as_ref(),
            )
            .with_delivery_attempts(config.delivery_attempts)
            .with_retry_delay(config.retry_delay);

            let report = runner.scan_for_user(&tenants, user_id, &CancelToken::new())?;
            print_report(&report);

            if deliver {
                let recipient = tenants
                    .notification_email(user_id)?
                    .ok_or(RunError::NoRecipient(user_id))?;
                let summary = runner.deliver_report(&report, &recipient)?;
                println!("report sent to {}", summary.recipient);
            }
        }
        Commands::Batch { dry_run } => {
            let provider = NewsApiProvider::new(config.news_api_options()?)
                .context("failed to build news client")?;
            let recipient = match config.batch_recipient() {
                Ok(recipient) => recipient,
                Err(_) if dry_run => "stdout".to_string(),
                Err(err) => return Err(err.into()),
            };
            let matcher = ArticleMatcher::builtin()?;
            let delivery = build_delivery(&config, dry_run)?;
            let runner = ReportRunner::new(
                ReportBuilder::new(&provider, &matcher)
                    .with_fetch_concurrency(config.fetch_concurrency),
                delivery.as_ref(),
            )
            .with_delivery_attempts(config.delivery_attempts)
            .with_retry_delay(config.retry_delay);

            let summary =
                runner.run_for_companies(&config.watchlist, &recipient, &CancelToken::new())?;
            eprintln!(
                "report sent to {}: {} flagged, {} failed fetches",
                summary.recipient, summary.flagged, summary.failed_fetches
            );
        }
        Commands::BatchUsers { dry_run } => {
            let provider = NewsApiProvider::new(config.news_api_options()?)
                .context("failed to build news client")?;
            let conn = open_store(&config)?;
            let tenants = TenantService::new(SqliteTenantRepository::new(&conn));
            let matcher = ArticleMatcher::builtin()?;
            let delivery = build_delivery(&config, dry_run)?;
            let runner = ReportRunner::new(
                ReportBuilder::new(&provider, &matcher)
                    .with_fetch_concurrency(config.fetch_concurrency),
                delivery.as_ref(),
            )
            .with_delivery_attempts(config.delivery_attempts)
            .with_retry_delay(config.retry_delay);

            let summary = runner.run_for_all_users(&tenants, &CancelToken::new())?;
            for (username, run) in &summary.delivered {
                eprintln!(
                    "{username}: sent to {} ({} flagged, {} failed fetches)",
                    run.recipient, run.flagged, run.failed_fetches
                );
            }
            let failed = summary.failed.len();
            let worst = summary
                .failed
                .into_iter()
                .max_by_key(|(_, err)| run_exit_code(err));
            if let Some((username, err)) = worst {
                return Err(anyhow::Error::new(err)
                    .context(format!("report for {username} failed ({failed} failed in total)")));
            }
        }
    }

    Ok(())
}

fn init_cli_logging(config: &AppConfig) -> anyhow::Result<()> {
    let result = match config.log_dir.as_deref() {
        Some(dir) => init_logging_at(config, dir),
        None => riskwatch_core::init_stderr_logging(config.log_level.as_deref().unwrap_or("warn")),
    };
    result.map_err(|reason| {
        anyhow::Error::new(ConfigError::Invalid {
            key: "RISKWATCH_LOG_LEVEL",
            reason,
        })
    })
}

fn init_logging_at(config: &AppConfig, dir: &str) -> Result<(), String> {
    let level = config
        .log_level
        .as_deref()
        .unwrap_or_else(|| riskwatch_core::default_log_level());
    riskwatch_core::init_logging(level, dir)
}

fn open_store(config: &AppConfig) -> anyhow::Result<Connection> {
    open_db(&config.db_path)
        .with_context(|| format!("failed to open tenant store {}", config.db_path.display()))
}

fn read_password(credentials: &Credentials) -> anyhow::Result<String> {
    if let Some(password) = &credentials.password {
        return Ok(password.clone());
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn login<R: riskwatch_core::TenantRepository>(
    tenants: &TenantService<R>,
    credentials: &Credentials,
) -> anyhow::Result<Session> {
    let password = read_password(credentials)?;
    let mut session = Session::new();
    session.login(tenants, &credentials.username, &password)?;
    Ok(session)
}

fn build_delivery(config: &AppConfig, dry_run: bool) -> anyhow::Result<Box<dyn ReportDelivery>> {
    if dry_run {
        return Ok(Box::new(LogDelivery::stdout()));
    }
    match config.delivery_target() {
        DeliveryTarget::Relay(options) => Ok(Box::new(MailRelayDelivery::new(options)?)),
        DeliveryTarget::Smtp(options) => Ok(Box::new(SmtpDelivery::new(options)?)),
        DeliveryTarget::Local => Ok(Box::new(LogDelivery::stdout())),
    }
}

fn print_report(report: &Report) {
    if report.entries.is_empty() {
        println!("{EMPTY_REPORT_TEXT}");
    }
    for entry in &report.entries {
        println!(
            "{}: {} - {} [{}]",
            entry.company, entry.article_title, entry.article_url, entry.term
        );
    }
    for failure in &report.failures {
        eprintln!("warning: no news for {} ({})", failure.company, failure.reason);
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG;
        }
        if cause.downcast_ref::<DeliveryError>().is_some() {
            return EXIT_DELIVERY;
        }
        if cause.downcast_ref::<DbError>().is_some() {
            return EXIT_STORE;
        }
        if let Some(err) = cause.downcast_ref::<RepoError>() {
            return repo_exit_code(err);
        }
        if let Some(SessionError::Repo(err)) = cause.downcast_ref::<SessionError>() {
            return repo_exit_code(err);
        }
        if let Some(err) = cause.downcast_ref::<RunError>() {
            return run_exit_code(err);
        }
    }
    EXIT_FAILURE
}

fn run_exit_code(err: &RunError) -> u8 {
    match err {
        RunError::Store(err) => repo_exit_code(err),
        RunError::Delivery { .. } | RunError::NoRecipient(_) => EXIT_DELIVERY,
        RunError::Scan(_) => EXIT_FAILURE,
    }
}

fn repo_exit_code(err: &RepoError) -> u8 {
    match err {
        RepoError::Db(_) | RepoError::InvalidData(_) => EXIT_STORE,
        RepoError::Validation(_)
        | RepoError::NotFound(_)
        | RepoError::Conflict(_)
        | RepoError::Hashing(_) => EXIT_FAILURE,
    }
}
