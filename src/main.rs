mod cache;
mod config;
mod error;
mod orchestrator;
mod probe;
mod rank;
mod registry;
mod selection;
mod storage;
mod traits;
mod types;
mod utils;

use anyhow::Result;
use cache::ResultCache;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::Orchestrator;
use probe::{HttpProber, ProbeExecutor};
use registry::MirrorRegistry;
use selection::SelectionStore;
use std::time::Duration;
use storage::JsonStore;
use traits::Presenter;
use types::{host_of, ErrorKind, RankedEntry};
use utils::now_ms;

#[derive(Parser)]
#[command(name = "ghmirror")]
#[command(about = "Pick the fastest GitHub proxy mirror and remember your choice", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank mirrors by latency (e.g., ghmirror check --refresh)
    Check {
        /// Ignore the cached round and probe again
        #[arg(long, short)]
        refresh: bool,
    },
    /// Pick a mirror explicitly by hostname or URL (e.g., ghmirror use gh-proxy.com)
    Use {
        /// Hostname or URL; hostnames are resolved against the registry
        mirror: String,
    },
    /// Show the active mirror and cache age
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let orchestrator = build_orchestrator();

    match cli.command {
        Commands::Check { refresh } => handle_check(&orchestrator, refresh).await,
        Commands::Use { mirror } => handle_use(&orchestrator, &mirror)?,
        Commands::Status => handle_status(&orchestrator),
    }

    Ok(())
}

/// 每次运行构造一个会话级协调器, 所有依赖在这里注入
fn build_orchestrator() -> Orchestrator {
    let registry = MirrorRegistry::new(config::load_mirror_urls());
    let store = JsonStore::open_default();
    let timeout = Duration::from_secs(config::PROBE_TIMEOUT_SECS);

    Orchestrator::new(
        registry,
        ResultCache::new(store.clone()),
        SelectionStore::new(store),
        ProbeExecutor::new(Box::new(HttpProber::new(timeout))),
        Box::new(TablePresenter),
    )
}

// --- Handlers ---

async fn handle_check(orchestrator: &Orchestrator, refresh: bool) {
    orchestrator.bootstrap();

    // 进度条画到 stderr, 表格输出互不干扰
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}").unwrap());
    pb.set_message("Testing mirrors...");
    pb.enable_steady_tick(Duration::from_millis(80));

    orchestrator.refresh(refresh).await;

    pb.finish_and_clear();
}

fn handle_use(orchestrator: &Orchestrator, mirror: &str) -> Result<()> {
    // 裸 hostname 先在注册表里找, 找不到就按 URL 处理 (交给校验把关)
    let (hostname, url) = match orchestrator.registry().find(mirror) {
        Some(ep) => (ep.hostname(), ep.url.clone()),
        None => (host_of(mirror), mirror.to_string()),
    };

    orchestrator.on_user_select(&hostname, &url)?;
    println!("Now using {}.", hostname);
    Ok(())
}

fn handle_status(orchestrator: &Orchestrator) {
    println!("{}", "-".repeat(60));
    match orchestrator.selection().get_selected() {
        Some(s) => println!("Active mirror : {} ({})", s.hostname, s.url),
        None => println!("Active mirror : none (defaults to the first registry entry)"),
    }
    match orchestrator.cache().get() {
        Some(c) => {
            let age_min = now_ms().saturating_sub(c.timestamp) / 60_000;
            println!(
                "Latency cache : {} results, {} min old",
                c.results.len(),
                age_min
            );
        }
        None => println!("Latency cache : empty or expired"),
    }
    println!("Mirrors       : {} configured", orchestrator.registry().len());
    println!("{}", "-".repeat(60));
}

/// 终端表格渲染, Presenter 的 CLI 实现
struct TablePresenter;

impl Presenter for TablePresenter {
    fn render_ranked_list(&self, list: &[RankedEntry]) {
        if list.is_empty() {
            println!("No mirrors configured.");
            return;
        }

        // 引导阶段的占位列表不值得打全表, 一行提示即可
        if list
            .iter()
            .all(|e| e.result.error == Some(ErrorKind::Probing))
        {
            println!("Checking {} mirrors...", list.len());
            return;
        }

        println!(
            "{:<4} {:<10} {:<22} {:<6} URL",
            "RANK", "LATENCY", "HOST", "FLAGS"
        );
        println!("{}", "-".repeat(76));

        for (i, entry) in list.iter().enumerate() {
            let latency = if entry.result.success {
                format!("{}ms", entry.result.latency_ms)
            } else {
                entry
                    .result
                    .error
                    .map(|k| k.as_str())
                    .unwrap_or("error")
                    .to_string()
            };

            let mut flags = String::new();
            if entry.is_selected {
                flags.push('*');
            }
            if entry.is_last_used {
                flags.push('^');
            }

            println!(
                "{:<4} {:<10} {:<22} {:<6} {}",
                i + 1,
                latency,
                host_of(&entry.result.url),
                flags,
                entry.result.url
            );
        }

        println!("{}", "-".repeat(76));
        println!("* selected   ^ last used   (run 'ghmirror use <host>' to switch)");
    }
}
