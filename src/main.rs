use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod agent;
mod ai;
mod app;
mod config;
mod content;
mod db;
mod error;
mod models;
mod server;
mod services;
#[cfg(test)]
mod testing;

use agent::Trigger;
use app::App;
use config::Config;
use error::Result;

const USAGE: &str = "Usage: estate-press [--generate | --import-topics <file> | --seed-topics | --status]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so its log level can seed the filter
    let config = Config::load()?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let flag = args.get(1).map(String::as_str);

    if matches!(flag, Some("--help") | Some("-h")) {
        println!("{}", USAGE);
        return Ok(());
    }

    // Check for --import-topics flag
    let import_path = match flag {
        Some("--import-topics") => match args.get(2) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                eprintln!("{}", USAGE);
                std::process::exit(2);
            }
        },
        _ => None,
    };

    let app = Arc::new(App::new(config).await?);

    // If import path provided, import topics and exit
    if let Some(path) = import_path {
        let (added, skipped) = app.import_topics_file(&path).await?;
        println!("Imported topics from {:?}: {} added, {} skipped", path, added, skipped);
        return Ok(());
    }

    match flag {
        Some("--seed-topics") => {
            let (added, skipped) = app.seed_topics().await?;
            println!("Seeded starter topics: {} added, {} already present", added, skipped);
        }
        Some("--status") => {
            print!("{}", app.status_report().await?);
        }
        // Headless run through the scheduler so the running flag and last run are honored
        Some("--generate") => {
            let report = app.scheduler.run_now(Trigger::Manual).await;
            match &report.post {
                Some(post) => println!("Created post {}: {}", post.post_id, post.title),
                None => println!("No post created: {}", report.message),
            }
            if !report.success {
                std::process::exit(1);
            }
        }
        Some(other) => {
            eprintln!("Unknown option: {}\n{}", other, USAGE);
            std::process::exit(2);
        }
        None => {
            app.scheduler.start().await?;
            let served = server::serve(app.clone()).await;
            app.scheduler.stop().await?;
            served?;
        }
    }

    Ok(())
}
