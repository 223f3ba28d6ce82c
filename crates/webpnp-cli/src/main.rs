use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webpnp_core::{platform_name, WebPnpConfig, WorkloadSpec};
use webpnp_runner::{
    pull_all, search_results, ExecutorRegistry, JsonDeviceInfoProvider, RemoteSync, SuiteRunner,
    SyncDirection, SyncReport,
};

#[derive(Parser)]
#[command(name = "webpnp")]
#[command(about = "WebPnP - browser benchmark runner", long_about = None)]
struct Cli {
    /// Path to the runner configuration
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all configured workloads and store their results
    Run {
        /// Device info JSON produced by the environment probe
        #[arg(short, long)]
        device_info: PathBuf,

        /// Only run this workload
        #[arg(short, long)]
        workload: Option<String>,
    },

    /// Download results missing locally from the result server
    Pull {
        /// Only sync this workload
        #[arg(short, long)]
        workload: Option<String>,
    },

    /// Upload local results missing on the result server
    Push {
        /// Only sync this workload
        #[arg(short, long)]
        workload: Option<String>,
    },

    /// Find one result per workload by CPU and browser
    Search {
        #[arg(long)]
        cpu: String,

        /// Browser channel (Stable, Beta, Dev, Canary)
        #[arg(long)]
        channel: String,

        /// Browser version
        #[arg(long)]
        version: String,
    },

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run {
            device_info,
            workload,
        } => cmd_run(&config, &device_info, workload.as_deref()).await?,
        Commands::Pull { workload } => {
            cmd_sync(&config, workload.as_deref(), SyncDirection::Pull).await?
        }
        Commands::Push { workload } => {
            cmd_sync(&config, workload.as_deref(), SyncDirection::Push).await?
        }
        Commands::Search {
            cpu,
            channel,
            version,
        } => cmd_search(&config, &cpu, &channel, &version).await?,
        Commands::Status => cmd_status(&config),
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<WebPnpConfig> {
    WebPnpConfig::load(path).with_context(|| format!("loading {}", path.display()))
}

fn selected_workloads(config: &WebPnpConfig, only: Option<&str>) -> Result<Vec<WorkloadSpec>> {
    match only {
        Some(name) => Ok(vec![config.workload(name)?.clone()]),
        None => Ok(config.workloads.clone()),
    }
}

async fn cmd_run(config: &WebPnpConfig, device_info: &Path, only: Option<&str>) -> Result<()> {
    let workloads = selected_workloads(config, only)?;
    let registry = ExecutorRegistry::from_config(config);
    let provider = JsonDeviceInfoProvider::new(device_info);

    let mut suite = SuiteRunner::new(config, registry);
    if config.sync_enabled() {
        suite = suite.with_sync(RemoteSync::from_config(config)?);
    }

    let manifest = suite.run(&provider, &workloads).await?;

    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

async fn cmd_sync(config: &WebPnpConfig, only: Option<&str>, direction: SyncDirection) -> Result<()> {
    let sync = RemoteSync::from_config(config)?;
    let workloads = selected_workloads(config, only)?;

    let reports = match direction {
        SyncDirection::Pull => pull_all(&sync, &workloads).await?,
        SyncDirection::Push => {
            let mut reports = Vec::with_capacity(workloads.len());
            for workload in &workloads {
                reports.push(sync.sync(workload, SyncDirection::Push).await?);
            }
            reports
        }
    };

    print_reports(&reports);

    let failed: usize = reports.iter().map(|r| r.failed.len()).sum();
    if failed > 0 {
        anyhow::bail!("{} files failed to {}", failed, direction);
    }
    Ok(())
}

async fn cmd_search(config: &WebPnpConfig, cpu: &str, channel: &str, version: &str) -> Result<()> {
    let sync = RemoteSync::from_config(config)?;
    let manifest = search_results(&sync, &config.workloads, cpu, channel, version).await?;

    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn cmd_status(config: &WebPnpConfig) {
    println!();
    println!("Platform:      {}", platform_name());
    println!("Results root:  {}", config.results_root.display());
    match &config.result_server {
        Some(server) => println!(
            "Result server: {}@{}:{} ({})",
            server.username,
            server.host,
            server.port,
            server.archive_root()
        ),
        None => println!("Result server: not configured"),
    }
    println!(
        "Remote sync:   {}",
        if config.sync_enabled() { "around each workload" } else { "off" }
    );
    println!("Browser flags: {}", config.chrome_flags.join(" "));
    println!();
    println!("{:-<60}", "");
    println!("  {:<28} {:>6} {:>8}  {}", "Workload", "Runs", "Sleep", "Executor");
    println!("{:-<60}", "");
    let registry = ExecutorRegistry::from_config(config);
    for w in &config.workloads {
        let executor = if registry.contains(&w.name) { "yes" } else { "MISSING" };
        println!(
            "  {:<28} {:>6} {:>7}s  {}",
            w.name, w.run_times, w.sleep_interval, executor
        );
    }

    let unused: Vec<&str> = registry
        .names()
        .into_iter()
        .filter(|name| config.workload(name).is_err())
        .collect();
    if !unused.is_empty() {
        println!();
        println!("Executors without a workload: {}", unused.join(", "));
    }
    println!();
}

fn print_reports(reports: &[SyncReport]) {
    println!();
    println!("{:-<60}", "");
    for report in reports {
        println!(
            "  {:<28} {} {:>3} transferred {:>3} failed",
            report.workload,
            report.direction,
            report.transferred.len(),
            report.failed.len()
        );
        for name in &report.failed {
            println!("    failed: {}", name);
        }
    }
    println!("{:-<60}", "");
    println!();
}
