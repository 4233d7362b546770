//! Command implementations

use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::session_controller::{ProgressUpdate, SessionController};
use crate::cli::args::{RunArgs, ScanArgs, StatusArgs};
use crate::domain::model::{Notice, SkipRangeField};
use crate::domain::rules::ScanReconciler;
use crate::output::progress::{ConsoleProgressReporter, JsonProgressReporter, ProgressReporter};
use crate::output::format_scan;
use crate::ports::ClientConfig;
use crate::utils::Utils;

/// Execute the scan command
pub async fn scan(config: &ClientConfig, args: ScanArgs) -> Result<()> {
    info!("Starting scan of {}", args.input);

    let container = DefaultAppContainer::new(config)?;
    let result = container
        .scan_client()
        .scan(&args.input)
        .await
        .with_context(|| format!("Error scanning folder {}", args.input))?;

    let report = format_scan(&args.input, &result, args.format)?;
    print!("{}", report);
    if !report.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Execute the run command
pub async fn run(config: &ClientConfig, args: RunArgs) -> Result<()> {
    let container = DefaultAppContainer::new(config)?;
    let mut session = container.session_controller();
    let reporter: Box<dyn ProgressReporter> = if args.json_progress {
        Box::new(JsonProgressReporter::new())
    } else {
        Box::new(ConsoleProgressReporter::new())
    };

    let result = run_session(&mut session, reporter.as_ref(), &args).await;
    session.shutdown();
    // The console error is printed by main; scripts get it as an event.
    if let (Err(e), true) = (&result, args.json_progress) {
        reporter.on_error(&format!("{:#}", e));
    }
    result
}

async fn run_session(
    session: &mut SessionController,
    reporter: &dyn ProgressReporter,
    args: &RunArgs,
) -> Result<()> {
    let scan = session
        .scan(&args.input)
        .await
        .with_context(|| format!("Error scanning folder {}", args.input))?;
    info!(
        "Scanned {}: {} chapters, {} audio tracks",
        scan.first_file,
        scan.chapters.len(),
        scan.audio_tracks.len()
    );
    if let Some(Notice::StaleReferencesCleared(references)) = session.notice() {
        for reference in references {
            info!("Default adjusted: {}", reference);
        }
    }

    configure(session, args)?;
    for label in ScanReconciler::unknown_labels(session.configuration(), &scan) {
        reporter.on_warning(&format!("'{}' is not a chapter of {}", label, scan.first_file));
    }

    let ack = session
        .submit(&args.input, &args.output)
        .await
        .context("Error starting trim process")?;
    reporter.on_submitted(&args.input, &args.output, &ack);

    follow(session, reporter).await
}

/// Apply the command-line trim options to a freshly scanned session
fn configure(session: &mut SessionController, args: &RunArgs) -> Result<()> {
    for (index, skip) in args.skips.iter().enumerate() {
        session.add_skip_range()?;
        session.update_skip_range(index, SkipRangeField::Start, &skip.start)?;
        session.update_skip_range(index, SkipRangeField::End, &skip.end)?;
    }
    session.set_parts(i64::from(args.parts))?;
    if let Some(audio) = args.audio {
        if !session.audio_tracks().iter().any(|track| track.index == audio) {
            warn!("Audio track #{} was not found by the scan", audio);
        }
        session.set_audio_index(audio)?;
    }
    Ok(())
}

/// Follow the submitted job until it finishes or the user interrupts
async fn follow(session: &mut SessionController, reporter: &dyn ProgressReporter) -> Result<()> {
    let started = Instant::now();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                session.stop_polling()?;
                reporter.on_cancel();
                return Ok(());
            }
            update = session.next_progress() => match update? {
                ProgressUpdate::Snapshot(snapshot) => reporter.on_progress(&snapshot),
                ProgressUpdate::Failed(error) => reporter.on_poll_error(&error),
                ProgressUpdate::Finished(snapshot) => {
                    reporter.on_complete(&snapshot);
                    info!("Job finished in {}", Utils::format_duration(started.elapsed()));
                    return Ok(());
                }
                ProgressUpdate::Abandoned { consecutive_failures } => {
                    let notice = session
                        .notice()
                        .map(|n| n.to_string())
                        .unwrap_or_default();
                    session.acknowledge_error()?;
                    return Err(anyhow!(
                        "{} ({} consecutive failures)",
                        notice,
                        consecutive_failures
                    ));
                }
                ProgressUpdate::Ended => return Ok(()),
            },
        }
    }
}

/// Execute the status command
pub async fn status(config: &ClientConfig, args: StatusArgs) -> Result<()> {
    let container = DefaultAppContainer::new(config)?;
    let snapshot = container
        .service()
        .status()
        .await
        .context("Error reading job status")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", ConsoleProgressReporter::new().render(&snapshot));
        if snapshot.done {
            println!("Job finished");
        }
    }
    Ok(())
}
