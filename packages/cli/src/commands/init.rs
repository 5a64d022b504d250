use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use atelier_store::MemoryStore;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Record store file, relative to the working directory
    #[arg(short, long, default_value = "atelier.store.json")]
    pub store_path: String,

    /// Files per upload request
    #[arg(long)]
    pub chunk_count_max: Option<usize>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Atelier workspace...".bright_blue().bold());

    let mut config = Config {
        store_path: args.store_path.clone(),
        ..Config::default()
    };
    if let Some(count) = args.chunk_count_max {
        config.editor.chunk_count_max = count;
    }
    config.editor.validate()?;

    let store_path = config.get_store_path(cwd);
    if !store_path.exists() {
        if let Some(parent) = store_path.parent() {
            fs::create_dir_all(parent)?;
        }
        MemoryStore::new().save(&store_path)?;
        println!("  {} Created {}", "✓".green(), args.store_path);
    }

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Workspace initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: atelier plan-upload <photo-dir>");
    println!("  2. Run: atelier check --id <record-id>");

    Ok(())
}
