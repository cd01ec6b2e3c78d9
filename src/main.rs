use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use quality_track::config::{load_config, ConfigType};
use quality_track::records::Area;
use quality_track::report::{self, ReportPeriod};
use quality_track::stats;
use quality_track::{db, serve, store, sync};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    /// Plant-chat text summary
    Chat,
    /// Slide-deck content as JSON
    Briefing,
    /// CSV sheets for the three collections
    Sheets,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Vehicle quality-control tracking: workspace server, sync and reports"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the workspace API server
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Pull the workspace records from a remote instance
    Sync {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Generate a report from the local workspace database
    Report {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Lookback period
        #[arg(long, value_enum, default_value = "weekly")]
        period: ReportPeriod,

        /// Restrict the report to one area (default: all areas)
        #[arg(long)]
        area: Option<String>,

        /// Report flavor
        #[arg(long, value_enum, default_value = "chat")]
        kind: ReportKind,
    },
    /// Empty all record collections of the workspace
    Clear {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            let mut config = load_config(&config)?;
            if config.config_type != ConfigType::Serve {
                return Err("Config file is not a serve configuration".into());
            }
            if let Some(port) = port {
                config.api_port = port;
            }
            serve::serve_workspace(&config)
        }
        Command::Sync { config } => {
            let config = load_config(&config)?;
            if config.config_type != ConfigType::Sync {
                return Err("Config file is not a sync configuration".into());
            }
            let summary = sync::sync_workspace(&config)?;
            println!(
                "Synced {} pass, {} defect, {} downtime records",
                summary.pass, summary.defects, summary.downtime
            );
            Ok(())
        }
        Command::Report {
            config,
            period,
            area,
            kind,
        } => {
            let config = load_config(&config)?;
            run_report(&config, period, area.as_deref(), kind)
        }
        Command::Clear { config, yes } => {
            let config = load_config(&config)?;
            if !yes {
                return Err("Refusing to clear records without --yes".into());
            }
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let pool = db::open_database_pool(&config.database_path())
                    .await
                    .map_err(|e| format!("Failed to open database: {}", e))?;
                db::init_database_schema(&pool).await?;
                store::clear_all(&pool).await?;
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
            println!("All records cleared for workspace '{}'", config.workspace);
            Ok(())
        }
    }
}

fn run_report(
    config: &quality_track::config::AppConfig,
    period: ReportPeriod,
    area: Option<&str>,
    kind: ReportKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut filter = period.filter();
    if let Some(label) = area {
        filter.area =
            Some(Area::from_str(label).ok_or_else(|| format!("Unknown area '{}'", label))?);
    }
    let area_label = filter.area.map(|a| a.as_str()).unwrap_or("Geral");

    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(async {
        let pool = db::open_database_pool(&config.database_path())
            .await
            .map_err(|e| format!("Failed to open database: {}", e))?;
        db::init_database_schema(&pool).await?;
        let snapshot = store::load_snapshot(&pool).await?;
        Ok::<store::Snapshot, Box<dyn std::error::Error>>(snapshot)
    })?;

    let filtered = stats::filter_snapshot(
        &snapshot.pass,
        &snapshot.defects,
        &snapshot.downtime,
        &filter,
    );

    match kind {
        ReportKind::Chat => {
            let text = report::chat_report(&filtered, area_label, Local::now().date_naive());
            println!("{}", text);
            println!();
            println!("Share: {}", report::chat_share_link(&text));
        }
        ReportKind::Briefing => {
            let briefing = report::build_briefing(&filtered, period, area_label);
            println!("{}", serde_json::to_string_pretty(&briefing)?);
        }
        ReportKind::Sheets => {
            let date = Local::now().date_naive().format("%Y-%m-%d");
            let dir = config
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("data"));
            std::fs::create_dir_all(&dir)?;

            for sheet in [
                report::pass_sheet(&filtered.pass, area_label),
                report::defect_sheet(&filtered.defects, area_label),
                report::downtime_sheet(&filtered.downtime, area_label),
            ] {
                let path = dir.join(format!(
                    "Planilha_VQ_{}_{}_{}.csv",
                    sheet.name,
                    period.label(),
                    date
                ));
                std::fs::write(&path, report::sheet_to_csv(&sheet))?;
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}
