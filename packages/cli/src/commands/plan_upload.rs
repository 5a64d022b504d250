use crate::config::Config;
use anyhow::Result;
use atelier_editor::{plan_chunks, validate_selection, ChunkLimits, FileHandle, UploadChunk};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct PlanUploadArgs {
    /// Directory of media files to upload
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn plan_upload(args: PlanUploadArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;

    if !args.input.is_dir() {
        return Err(anyhow::anyhow!(
            "Input directory does not exist: {}",
            args.input.display()
        ));
    }

    let files = collect_media_files(&args.input)?;
    if files.is_empty() {
        println!("{} No media files found in {}", "⚠️".yellow(), args.input.display());
        return Ok(());
    }

    validate_selection(&files, &config.editor)?;
    let chunks = plan_chunks(files, ChunkLimits::from(&config.editor));

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&chunks_to_json(&chunks))?);
        return Ok(());
    }

    println!("📦 {} upload plan", "Planned".green().bold());
    println!("   Input: {}", args.input.display());
    println!(
        "   Limits: {} files / {} bytes per request",
        config.editor.chunk_count_max, config.editor.chunk_byte_max
    );
    println!();

    for chunk in &chunks {
        println!(
            "{} {} ({} files, {} bytes)",
            "chunk".cyan().bold(),
            chunk.index + 1,
            chunk.len(),
            chunk.total_bytes()
        );
        for file in &chunk.entries {
            println!("   {} {} ({})", "•".dimmed(), file.name, file.media_type);
        }
    }

    let total: usize = chunks.iter().map(UploadChunk::len).sum();
    println!();
    println!("✨ {} {} files in {} requests", "Done".green().bold(), total, chunks.len());

    Ok(())
}

/// Media type guessed from the file extension
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

/// Media files under `dir`, sorted by path; contents are not read
fn collect_media_files(dir: &Path) -> Result<Vec<FileHandle>> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && media_type_for(path).is_some() {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(media_type) = media_type_for(&path) else {
            continue;
        };
        let metadata = std::fs::metadata(&path)?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        let name = path
            .strip_prefix(dir)
            .unwrap_or(path.as_path())
            .to_string_lossy()
            .into_owned();
        files.push(FileHandle::from_metadata(name, media_type, metadata.len(), modified));
    }

    tracing::debug!(dir = %dir.display(), count = files.len(), "collected media files");
    Ok(files)
}

fn chunks_to_json(chunks: &[UploadChunk<FileHandle>]) -> serde_json::Value {
    chunks
        .iter()
        .map(|chunk| {
            json!({
                "index": chunk.index,
                "totalBytes": chunk.total_bytes(),
                "files": chunk
                    .entries
                    .iter()
                    .map(|f| json!({ "name": f.name, "mediaType": f.media_type, "size": f.size }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect()
}
