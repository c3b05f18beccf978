use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dcexport_core::{
    ChannelFilter, ChannelReporter, ChannelSelector, DirectMessageFilter, DryRunExporter,
    ExportInvoker, GuildFilter, ManifestExporter, RunOutcome, Scope, Snowflake,
};
use dcexport_discord::DiscordChannelSource;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::DcexportConfig;

/// Exit code used when the run is interrupted (128 + SIGINT)
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser)]
#[command(name = "dcexport")]
#[command(version)]
#[command(about = "Select Discord channels for export")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exports all channels within the specified server
    #[command(name = "export-guild", alias = "exportguild")]
    ExportGuild(ExportGuildArgs),

    /// Exports all direct message channels
    #[command(name = "export-dm", alias = "exportdm")]
    ExportDm(ExportDmArgs),

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[derive(Args)]
struct ExportGuildArgs {
    /// Server ID
    #[arg(short, long)]
    guild: Snowflake,

    /// Include voice channels
    #[arg(long = "include-vc", default_value_t = true, action = clap::ArgAction::Set)]
    include_vc: bool,

    /// Channel IDs to ignore (comma-separated)
    #[arg(long = "ignore-channels", value_delimiter = ',')]
    ignore_channels: Vec<Snowflake>,

    /// Category IDs to ignore (comma-separated)
    #[arg(long = "ignore-categories", value_delimiter = ',')]
    ignore_categories: Vec<Snowflake>,

    /// Only export these channel IDs (comma-separated). Overrides ignore options.
    #[arg(long = "only-channels", value_delimiter = ',')]
    only_channels: Vec<Snowflake>,

    /// Only export channels from these category IDs (comma-separated). Overrides ignore options.
    #[arg(long = "only-categories", value_delimiter = ',')]
    only_categories: Vec<Snowflake>,

    #[command(flatten)]
    output: OutputArgs,
}

impl ExportGuildArgs {
    fn filter(&self) -> GuildFilter {
        GuildFilter {
            ignored_channel_ids: self.ignore_channels.iter().copied().collect(),
            ignored_category_ids: self.ignore_categories.iter().copied().collect(),
            only_channel_ids: self.only_channels.iter().copied().collect(),
            only_category_ids: self.only_categories.iter().copied().collect(),
            include_voice: self.include_vc,
        }
    }
}

#[derive(Args)]
struct ExportDmArgs {
    /// DM channel IDs to ignore (comma-separated)
    #[arg(long = "ignore-channels", value_delimiter = ',')]
    ignore_channels: Vec<Snowflake>,

    /// Only export these DM channel IDs (comma-separated). Overrides ignore options.
    #[arg(long = "only-channels", value_delimiter = ',')]
    only_channels: Vec<Snowflake>,

    /// Include group DM channels
    #[arg(long = "include-group-dm", default_value_t = true, action = clap::ArgAction::Set)]
    include_group_dm: bool,

    #[command(flatten)]
    output: OutputArgs,
}

impl ExportDmArgs {
    fn filter(&self) -> DirectMessageFilter {
        DirectMessageFilter {
            ignored_channel_ids: self.ignore_channels.iter().copied().collect(),
            only_channel_ids: self.only_channels.iter().copied().collect(),
            include_group_dms: self.include_group_dm,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output directory for the selection manifest (defaults to config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only log the selection, write nothing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => cmd_init().await.map(|_| ExitCode::SUCCESS),
        Commands::Config => cmd_config(&cli.config).map(|_| ExitCode::SUCCESS),
        Commands::ExportGuild(args) => {
            let scope = Scope::Guild(args.guild);
            cmd_export(&cli.config, scope, Box::new(args.filter()), &args.output).await
        }
        Commands::ExportDm(args) => {
            cmd_export(
                &cli.config,
                Scope::DirectMessages,
                Box::new(args.filter()),
                &args.output,
            )
            .await
        }
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        info!("Created default config at {}", config_path.display());
    }

    println!("dcexport initialized at {}", config_dir.display());
    println!(
        "Set DISCORD_TOKEN or edit {} to configure your token.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(config_path: &Option<PathBuf>) -> Result<()> {
    let mut cfg = DcexportConfig::load(config_path)?;
    cfg.discord.token = config::mask_secret(&cfg.discord.token);
    println!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}

async fn cmd_export(
    config_path: &Option<PathBuf>,
    scope: Scope,
    filter: Box<dyn ChannelFilter>,
    output: &OutputArgs,
) -> Result<ExitCode> {
    let cfg = DcexportConfig::load(config_path)?;

    let mut source = DiscordChannelSource::new(cfg.discord.token.clone())?
        .with_base_url(cfg.discord.base_url.clone());
    if !cfg.discord.bot {
        source = source.as_user();
    }

    let exporter: Box<dyn ExportInvoker> = if output.dry_run {
        Box::new(DryRunExporter)
    } else {
        let dir = output.output.clone().unwrap_or_else(|| cfg.output_dir());
        Box::new(ManifestExporter::new(dir))
    };

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel_on_signal.cancelled() => {}
            result = signal::ctrl_c() => {
                if result.is_ok() {
                    info!("Received Ctrl+C, cancelling...");
                    cancel_on_signal.cancel();
                }
            }
        }
    });

    // Status line on stderr, fed by the selector through a bounded channel
    let (reporter, mut progress_rx) = ChannelReporter::new(cfg.export.progress_buffer);
    let status = tokio::spawn(async move {
        let mut stderr = std::io::stderr();
        let mut shown = false;
        while let Some(event) = progress_rx.recv().await {
            let _ = write!(stderr, "\r\x1b[2K{}", event);
            let _ = stderr.flush();
            shown = true;
        }
        if shown {
            let _ = writeln!(stderr);
        }
    });

    match scope {
        Scope::Guild(_) => println!("Fetching channels..."),
        Scope::DirectMessages => println!("Fetching DM channels..."),
    }

    let selector = ChannelSelector::new(filter, Arc::new(reporter));
    let result = selector.run(&source, scope, exporter.as_ref(), &cancel).await;

    // Dropping the selector closes the progress channel so the status task ends
    drop(selector);
    let _ = status.await;
    cancel.cancel();

    let outcome = result?;
    for line in outcome.tally().summary(scope) {
        println!("{}", line);
    }

    match outcome {
        RunOutcome::Exported(_) => Ok(ExitCode::SUCCESS),
        RunOutcome::Cancelled(tally) => {
            warn!(
                "Cancelled after {} channel(s); nothing was exported",
                tally.consumed()
            );
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
    }
}
