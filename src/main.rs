use clap::Parser;
use folio::{BuildConfig, BuildPipelineBuilder, BuildReport};
use std::process::ExitCode;

/// Build the manual: compile every unit twice, merge, and add bookmarks and
/// clickable table-of-contents entries.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Keep individual PDFs as a zip file instead of deleting them
    #[arg(long)]
    leave_individual: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let result = BuildPipelineBuilder::from_config(BuildConfig::default().with_env_overrides())
        .with_leave_individual(args.leave_individual)
        .build()
        .and_then(|pipeline| pipeline.run());

    match result {
        Ok(report) => {
            print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_summary(report: &BuildReport) {
    println!();
    match &report.output {
        Some(output) => println!("✓ Created {}", output.display()),
        None => println!("! No merged output was produced"),
    }
    println!("✓ Total pages: {}", report.total_pages);
    println!("✓ Chapters: {}", report.chapter_count);
    if let Some(backend) = report.metadata_backend {
        println!("✓ Bookmarks and metadata applied with {backend}");
    }
    if report.links_written > 0 {
        println!("✓ {} outline entries are clickable", report.links_written);
    }
    if let Some(archive) = &report.archive {
        println!("✓ Individual PDFs archived in {}", archive.display());
    }
    if let Some(scratch) = &report.scratch_dir {
        println!("  Individual PDFs are available in {}", scratch.display());
    }
    for degraded in &report.degraded {
        println!("! Skipped at {}: {}", degraded.stage, degraded.reason);
        for hint in &degraded.hints {
            println!("    {hint}");
        }
    }
}
