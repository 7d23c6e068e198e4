use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use simplelog::{CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, WriteLogger};
use std::fs::File;
use takeoutfix::takeoutfix_core::{
    check, run_fix, Cli, Commands, ExifToolService, OutputLayout, RunOptions, TimestampSource,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize loggers
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];

    if cli.log {
        loggers.push(WriteLogger::new(
            cli.log_level,
            Config::default(),
            File::create("takeoutfix.log")?,
        ));
    }

    CombinedLogger::init(loggers)?;

    // One exiftool process for the whole run; dropped (and shut down) on
    // every return path below.
    let mut exiftool = ExifToolService::new()?;

    match cli.command {
        Commands::Fix {
            root,
            output,
            keep_edited,
        } => {
            let options = RunOptions {
                root,
                output,
                remove_edited: !keep_edited,
            };
            let report = run_fix(&options, &mut exiftool, &ProgressBar::no_length())?;
            let layout = OutputLayout::new(&options.output);

            println!("\nDone!");
            if !report.deleted_edited.is_empty() {
                println!("  {} edited copies deleted", report.deleted_edited.len());
            }
            println!(
                "  {} files dated ({} from embedded tags, {} from sidecars) -> {}",
                report.resolved_total(),
                report.resolved_from(TimestampSource::Embedded),
                report.resolved_from(TimestampSource::Sidecar),
                layout.resolved_dir().display()
            );
            println!(
                "  {} files without a date -> {}",
                report.unresolved,
                layout.unresolved_dir().display()
            );
        }

        Commands::Check { root, output } => {
            let report = check(&root, &output, &mut exiftool, &ProgressBar::no_length())?;

            println!("Checked {} media files", report.checked);
            if !report.no_date.is_empty() {
                println!("\nFiles with no date ({}):", report.no_date.len());
                for path in &report.no_date {
                    println!("  {}", path.display());
                }
            }
            if !report.unhandled.is_empty() {
                println!("\nFiles not handled ({}):", report.unhandled.len());
                for path in &report.unhandled {
                    println!("  {}", path.display());
                }
                anyhow::bail!("{} file(s) with unhandled types", report.unhandled.len());
            }
        }
    }

    Ok(())
}
