//! Command-line driver for the tag engine.
//!
//! # Responsibility
//! - Load a plain-text file (one row per line) into a document database.
//! - Run apply-tags, print the sidebar tree and optionally a filtered view.

use clap::Parser;
use log::info;
use rowtags_core::repo::sqlite_document::SqliteDocument;
use rowtags_core::tagging::color::color_slot;
use rowtags_core::{EngineConfig, HostResult, RowStore, SidebarHost, SidebarItem, TagService};
use std::path::PathBuf;
use std::process::ExitCode;

const SIDEBAR_WINDOW: u64 = 1;

/// Tag rows from a text file and print the tag tree.
#[derive(Parser, Debug)]
#[command(name = "rowtags_cli", version)]
struct CliArgs {
    /// Text file holding one row per line.
    rows_file: PathBuf,

    /// Mark and print rows carrying this tag or one of its descendants.
    #[arg(long)]
    filter: Option<String>,

    /// SQLite document file; an in-memory document is used when omitted.
    #[arg(long = "db")]
    db_path: Option<PathBuf>,

    /// Number of chip color slots.
    #[arg(long = "palette", value_parser = clap::value_parser!(u32).range(1..))]
    palette_size: Option<u32>,

    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<String>,
}

/// Prints sidebar items as an indented tree with color slots.
struct StdoutSidebar {
    palette_size: u32,
}

impl SidebarHost for StdoutSidebar {
    fn show_tags(&mut self, items: &[SidebarItem]) -> HostResult<()> {
        println!("tags:");
        for item in items {
            let marker = if item.synthesized { " (container)" } else { "" };
            println!(
                "  {} [color {}]{marker}",
                item.label,
                color_slot(&item.tag, self.palette_size)
            );
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    match run(CliArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), String> {
    if let Some(log_dir) = &args.log_dir {
        rowtags_core::init_logging(rowtags_core::default_log_level(), log_dir)
            .map_err(|err| err.to_string())?;
    }

    let mut config = EngineConfig::default();
    if let Some(size) = args.palette_size {
        config.palette_size = size;
    }
    let palette_size = config.palette_size;
    let mut service = TagService::new(config).map_err(|err| err.to_string())?;

    let content = std::fs::read_to_string(&args.rows_file)
        .map_err(|err| format!("cannot read `{}`: {err}", args.rows_file.display()))?;
    let mut doc = match &args.db_path {
        Some(path) => SqliteDocument::open(path),
        None => SqliteDocument::open_in_memory(),
    }
    .map_err(|err| err.to_string())?;

    for line in content.lines() {
        doc.insert_row(line).map_err(|err| err.to_string())?;
    }
    info!("event=cli_load module=cli status=ok rows={}", content.lines().count());

    let summary = service
        .apply_tags_with_summary(&mut doc)
        .ok_or("apply-tags failed; see log for details")?;
    println!(
        "rows={} updated={} cleared={} unchanged={} failed={}",
        summary.rows, summary.updated, summary.cleared, summary.unchanged, summary.failed
    );

    service.window_opened(SIDEBAR_WINDOW);
    let mut sidebar = StdoutSidebar { palette_size };
    if !service.rebuild_sidebar(SIDEBAR_WINDOW, &mut doc, &mut sidebar) {
        println!("tags: unavailable");
    }

    if let Some(target) = &args.filter {
        if !service.filter_by_tag(&mut doc, target) {
            return Err(format!("filter `{target}` did not resolve to a tag"));
        }
        let rows = service
            .filtered_rows(&mut doc)
            .ok_or("reading filtered rows failed")?;
        println!("filter {target}: {} row(s)", rows.len());
        let reader = doc.reader();
        for row in rows {
            let text = reader.row_text(row).map_err(|err| err.to_string())?;
            println!("  {text}");
        }
    }

    service.window_closed(SIDEBAR_WINDOW);
    Ok(())
}
