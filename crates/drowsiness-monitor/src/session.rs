//! The frame loop

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use alerting::AlertSink;
use camera_capture::FrameSource;
use dms::{DmsModule, FaceEyeDetector};
use tracing::{debug, info, warn};

use crate::{MonitorError, Preview, PreviewControl};

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitReason {
    /// Source delivered its last frame
    #[default]
    EndOfStream,
    /// Source failed to deliver a frame
    ReadFailure,
    /// Quit key pressed in the preview
    QuitRequested,
    /// Stop flag raised (Ctrl-C)
    Interrupted,
}

/// What happened during one monitoring session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub alerts_fired: u32,
    /// Longest closed-eyes run, in frames
    pub longest_closed_run: u32,
    pub exit_reason: ExitReason,
}

/// Run the monitor until the source ends, the user quits or `stop` is set.
///
/// Each iteration reads a frame, analyzes it, fires the alert on the first
/// drowsy frame of an episode and hands the overlay to the preview. The
/// source is owned by the loop and dropped on every return path, errors
/// included, which releases the camera.
pub fn run_session<S, D, A, P>(
    mut source: S,
    dms: &mut DmsModule<D>,
    alert: &A,
    preview: &mut P,
    stop: &AtomicBool,
) -> Result<SessionSummary, MonitorError>
where
    S: FrameSource,
    D: FaceEyeDetector,
    A: AlertSink + ?Sized,
    P: Preview + ?Sized,
{
    let mut summary = SessionSummary::default();

    let reason = loop {
        if stop.load(Ordering::Relaxed) {
            info!("Stop requested");
            break ExitReason::Interrupted;
        }

        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Frame source ended");
                break ExitReason::EndOfStream;
            }
            Err(e) => {
                warn!("{}; ending session", e);
                metrics::counter!("monitor_frame_read_failures_total").increment(1);
                break ExitReason::ReadFailure;
            }
        };

        let analysis = dms.analyze(&frame)?;
        summary.frames_processed += 1;

        if analysis.should_alert() {
            alert.fire_alert();
            summary.alerts_fired += 1;
        }

        let overlay = analysis.overlay(dms.fps());
        if preview.show(&frame, &overlay)? == PreviewControl::Quit {
            info!("Quit key pressed");
            break ExitReason::QuitRequested;
        }
    };

    drop(source);
    debug!("Frame source released");

    summary.longest_closed_run = dms.tracker().longest_run();
    summary.exit_reason = reason;
    Ok(summary)
}

/// Raise `stop` on the first interrupt and return `true` on the second.
///
/// `stop` is only checked between frames, so a source blocked inside
/// `read_frame` is left to the second interrupt, on which the caller exits
/// the process. Returns `false` if the interrupt handler cannot be installed.
pub async fn watch_interrupts<F, Fut>(mut interrupt: F, stop: &AtomicBool) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        return false;
    }
    info!("Interrupted, stopping after the current frame (Ctrl-C again to exit now)");
    stop.store(true, Ordering::Relaxed);

    interrupt().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    type Interrupt = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

    fn interrupts(notify: &Arc<Notify>) -> impl FnMut() -> Interrupt {
        let notify = Arc::clone(notify);
        move || {
            let notify = Arc::clone(&notify);
            Box::pin(async move {
                notify.notified().await;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_second_interrupt_forces_exit() {
        let notify = Arc::new(Notify::new());
        let stop = Arc::new(AtomicBool::new(false));

        let watcher = {
            let next = interrupts(&notify);
            let stop = Arc::clone(&stop);
            tokio::spawn(async move { watch_interrupts(next, &stop).await })
        };

        notify.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !stop.load(Ordering::Relaxed) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(!watcher.is_finished());

        notify.notify_one();
        let forced = tokio::time::timeout(Duration::from_secs(5), watcher)
            .await
            .unwrap()
            .unwrap();
        assert!(forced);
    }

    #[tokio::test]
    async fn test_missing_handler_never_stops() {
        let stop = AtomicBool::new(false);
        let failing = || async { Err::<(), _>(std::io::Error::other("no signal handler")) };

        assert!(!watch_interrupts(failing, &stop).await);
        assert!(!stop.load(Ordering::Relaxed));
    }
}
