use crate::config::Config;
use anyhow::Result;
use atelier_editor::{DraftRecord, RecordId, RecordSchema, RecordStatus, StoredRecord};
use atelier_store::MemoryStore;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Serialized record (JSON) to check
    pub input: Option<PathBuf>,

    /// Check a record from the configured store instead of a file
    #[arg(long, conflicts_with = "input")]
    pub id: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Commit requirements a record does not meet yet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub id: RecordId,
    pub status: RecordStatus,
    pub draft: Vec<String>,
    pub publish: Vec<String>,
    /// `None` when the record kind cannot hold homepage slots
    pub slot: Option<Vec<String>>,
}

impl CheckReport {
    pub fn evaluate(record: StoredRecord) -> Self {
        let schema = RecordSchema::for_kind(record.kind);
        let id = record.id.clone();
        let status = record.status;
        let mut draft: DraftRecord = schema.new_draft();
        record.merge_into(&mut draft);

        let slot = schema
            .supports_homepage_slots()
            .then(|| schema.unmet_with_cover(&draft, &schema.slot_requirements()));

        Self {
            id,
            status,
            draft: schema
                .missing(&draft, schema.required_for_draft)
                .into_iter()
                .map(|field| field.replace('_', " "))
                .collect(),
            publish: schema.unmet_with_cover(&draft, schema.required_for_publish),
            slot,
        }
    }

    /// Whether the record breaks the rules of the state it is already in
    pub fn has_violations(&self) -> bool {
        !self.draft.is_empty() || (self.status == RecordStatus::Published && !self.publish.is_empty())
    }
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let record = match (&args.input, &args.id) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<StoredRecord>(&content)
                .map_err(|e| anyhow::anyhow!("Invalid record in {}: {}", path.display(), e))?
        }
        (None, Some(id)) => {
            let config = Config::load(cwd)?;
            let store = MemoryStore::load(&config.get_store_path(cwd))?;
            store
                .record(&RecordId::new(id.as_str()))
                .ok_or_else(|| anyhow::anyhow!("No record with id {}", id))?
        }
        (None, None) => return Err(anyhow::anyhow!("Pass a record file or --id")),
    };

    let report = CheckReport::evaluate(record);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.has_violations() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    println!("🔍 {} {} ({:?})", "Checking".green().bold(), report.id, report.status);
    println!();

    print_line("save as draft", Some(&report.draft));
    print_line("publish", Some(&report.publish));
    print_line("homepage slot", report.slot.as_ref());
}

fn print_line(action: &str, unmet: Option<&Vec<String>>) {
    match unmet {
        None => println!("   {} {}: not available", "-".dimmed(), action),
        Some(unmet) if unmet.is_empty() => println!("   {} {}", "✓".green(), action),
        Some(unmet) => println!(
            "   {} {}: missing {}",
            "✗".red(),
            action,
            unmet.join(", ").yellow()
        ),
    }
}
