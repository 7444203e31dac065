use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use infolist_backend::api;
use infolist_backend::config::{self, AppConfig};
use infolist_backend::import::{ImportReport, IssueKind};
use infolist_backend::state::AppState;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

#[derive(Parser)]
#[command(name = "infolist", version = VERSION, about = "Personal record import and search service")]
struct Cli {
    /// Config file path / 配置文件路径
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default) / 启动 HTTP 服务
    Serve,
    /// Bulk import a `----` delimited text file / 批量导入
    Import {
        #[arg(default_value = "info.txt")]
        file: PathBuf,
    },
    /// Recreate the schema / 重建数据库
    Reset {
        /// Drop existing tables first, deleting all records
        #[arg(long)]
        drop: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Repopulate the search index from the records table afterwards
        #[arg(long)]
        reindex: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "infolist_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration / 加载配置
    let app_config = config::load_config(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(app_config).await,
        Command::Import { file } => {
            println!("Working...");
            let state = AppState::open(app_config).await?;
            let result = state.importer().import(&file).await;
            let limit = state.config.import.report_issue_limit;
            state.close().await;

            match result {
                Ok(report) => {
                    print_report(&report, limit);
                    Ok(())
                }
                Err(e) => {
                    println!("An error occurred: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Reset { drop, yes, reindex } => {
            if drop && !yes && !confirm("This operation will delete the database, do you want to continue? [y/N]")? {
                println!("Aborted.");
                return Ok(());
            }
            let state = AppState::open(app_config).await?;
            let result = match state.store.reset(drop).await {
                Ok(()) if reindex => state.store.reindex().await,
                other => other,
            };
            state.close().await;
            result?;

            if drop {
                println!("Drop tables.");
            }
            println!("Initialized database.");
            if reindex {
                println!("Rebuilt search index.");
            }
            Ok(())
        }
    }
}

async fn serve(app_config: AppConfig) -> anyhow::Result<()> {
    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::open(app_config).await?);
    let app = api::router(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.close().await;
    Ok(())
}

fn print_report(report: &ImportReport, limit: usize) {
    println!(
        "Detected encoding: {} (confidence {:.2})",
        report.encoding, report.confidence
    );
    for issue in report.issues.iter().take(limit) {
        match &issue.kind {
            IssueKind::Malformed { fields } => {
                println!("Invalid data format in line {} ({} fields)", issue.line_no, fields)
            }
            IssueKind::Duplicate { username } => {
                println!("Skipping duplicate username: {}", username)
            }
        }
    }
    if report.issues.len() > limit {
        println!("... {} more issues not shown", report.issues.len() - limit);
    }
    println!(
        "Created {} records (lines read {}, duplicates {}, malformed {}).",
        report.created, report.lines_read, report.duplicates, report.malformed
    );
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
