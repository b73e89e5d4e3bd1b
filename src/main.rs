use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::time::ChronoLocal;

use lgu_compliance::{
    build_checklist, export_checklist_csv, load_entities, load_records, process_batch,
    save_compilation, AppConfig, BatchProgress, ChecklistFilter, ReportFile,
    DEFAULT_COMPILATION_NAME,
};

fn main() -> Result<()> {
    // Local-time log format, diagnostics only; user-facing output is printed
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("parse") => run_parse(&args[2..]),
        Some("checklist") => run_checklist(&args[2..]),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("LGU Compliance Report Tracker v{}", lgu_compliance::VERSION);
    println!();
    println!("Usage:");
    println!("  lgu-compliance parse <report-dir> [out.xlsx]");
    println!("      Parse every report in <report-dir> and export the compilation.");
    println!();
    println!("  lgu-compliance checklist <registry.json> <records.json> <period> [out.csv]");
    println!("      Reconcile submissions for <period> and print the checklist.");
}

fn run_parse(args: &[String]) -> Result<()> {
    let Some(dir) = args.first() else {
        bail!("parse: missing <report-dir> argument");
    };

    println!("📂 Loading reports from {dir}...");
    let files = collect_report_files(Path::new(dir))?;
    if files.is_empty() {
        bail!("No report files (.xlsx/.xls) found in {dir}");
    }
    println!("✓ Found {} report files\n", files.len());

    let mut print_progress = |p: &BatchProgress| {
        println!("  [{}/{}] {}", p.current, p.total, p.file_name);
    };
    let report = process_batch(&files, Some(&mut print_progress));

    println!("\n{}", report.summary());
    for failure in &report.errors {
        println!(
            "  ✗ {}: {}",
            failure.source_file,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }

    let out_path = match args.get(1) {
        Some(name) => PathBuf::from(name),
        None => AppConfig::from_env().export_dir.join(DEFAULT_COMPILATION_NAME),
    };
    save_compilation(&report.results, &out_path)?;
    println!("\n✓ Compilation written to {}", out_path.display());

    Ok(())
}

fn run_checklist(args: &[String]) -> Result<()> {
    let (Some(registry_path), Some(records_path), Some(period)) =
        (args.first(), args.get(1), args.get(2))
    else {
        bail!("checklist: expected <registry.json> <records.json> <period>");
    };

    let entities = load_entities(Path::new(registry_path))?;
    let records = load_records(Path::new(records_path))?;

    let checklist = build_checklist(&entities, &records, period, &ChecklistFilter::default())
        .context("Checklist inputs are structurally invalid")?;

    for group in &checklist.groups {
        println!("{} ({} LGUs)", group.province, group.total_lgu);
        for row in &group.rows {
            let date = row
                .date_submitted
                .map(|d| format!(" on {d}"))
                .unwrap_or_default();
            println!("  {:<30} {}{}", row.name, row.status.as_str(), date);
        }
    }
    println!("\n{}", checklist.summary_line());

    if let Some(out) = args.get(3) {
        let bytes = export_checklist_csv(&checklist)?;
        std::fs::write(out, bytes)
            .with_context(|| format!("Failed to write checklist CSV: {out}"))?;
        println!("✓ Checklist written to {out}");
    }

    Ok(())
}

/// Collect report files from a directory, sorted by name so batch order is
/// deterministic across platforms.
fn collect_report_files(dir: &Path) -> Result<Vec<ReportFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read report directory: {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("xlsx") | Some("xls")
            )
        })
        .collect();
    paths.sort();

    paths.iter().map(|path| ReportFile::from_path(path)).collect()
}
