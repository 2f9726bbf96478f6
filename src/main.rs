use anyhow::Context;
use clap::Parser;

mod ai;
mod api;
mod app;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod services;

use app::App;
use cli::{Cli, Command};
use config::Config;
use db::Repository;
use services::DailyTrendManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (info by default, RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Status => print_status(&config).await?,

        Command::Serve {
            listen,
            no_scheduler,
        } => {
            let app = App::new(&config).await?;
            if !no_scheduler {
                app.orchestrator.start();
            }

            let addr = listen.unwrap_or_else(|| config.listen_addr.clone());
            api::serve(app.clone(), &addr, shutdown_signal())
                .await
                .with_context(|| format!("admin API on {} failed", addr))?;

            if let Some(handle) = app.orchestrator.stop() {
                tracing::info!("Waiting for any running content cycle to finish");
                handle.await.context("scheduler task panicked")?;
            }
        }

        Command::Cycle => {
            let app = App::new(&config).await?;
            let report = app.orchestrator.run_scheduled_cycle().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Generate { count } => {
            let app = App::new(&config).await?;
            let count = count.unwrap_or(config.generation.manual_default_count);
            let outcome = app.orchestrator.run_now(count).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Command::Analyze => {
            let app = App::new(&config).await?;
            let record = app.orchestrator.analyze_now().await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

/// Reads storage only, so it works without an API key.
async fn print_status(config: &Config) -> anyhow::Result<()> {
    let repository = Repository::new(&config.db_path).await?;
    let today = DailyTrendManager::today();

    match repository.get_trend_record(today).await? {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("No trend record for {} yet", today),
    }

    let total = repository.count_blog_posts(None).await?;
    let auto = repository
        .count_blog_posts(Some(models::CreatedBy::Auto))
        .await?;
    println!("Blog posts: {} total, {} auto-generated", total, auto);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("Shutdown requested");
}
