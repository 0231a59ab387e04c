use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use confab_core::SpeedPreset;

use crate::plain::PlainJob;
use crate::rich;
use crate::speed;

/// Presentation sink for reveal jobs.
///
/// The scheduler drives the pacing; the surface owns what "append" and
/// "visible" mean for the embedding host.
pub trait RevealSurface: Send {
    /// Append already-revealed plain text to the target.
    fn append_plain(&mut self, target: &str, text: &str);
    /// Show or hide the in-progress marker at the target's tail.
    fn show_typing_marker(&mut self, target: &str, visible: bool);
    /// Mount fully rendered rich HTML with all reveal units hidden.
    fn mount_rich(&mut self, target: &str, html: &str, unit_count: usize);
    /// Make units `0..visible_upto` visible.
    fn reveal_rich_units(&mut self, target: &str, visible_upto: usize);
}

/// One reveal to run.
#[derive(Clone, Debug)]
pub struct RevealRequest {
    /// Presentation target, typically a message id.
    pub target: String,
    pub text: String,
    pub speed: SpeedPreset,
    pub speed_multiplier: f64,
    /// Render as markdown and reveal units instead of appending words.
    pub rich_text: bool,
}

/// Fired once when a job reveals its final batch. Superseded jobs never fire.
pub type CompleteCallback = Box<dyn FnOnce() + Send + 'static>;

struct JobHandle {
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

/// Runs at most one reveal job per presentation target.
///
/// Starting a job on a target cancels any job already running there. A
/// cancelled job stops at its next tick without touching the surface again.
pub struct RevealScheduler {
    surface: Arc<Mutex<dyn RevealSurface>>,
    jobs: HashMap<String, JobHandle>,
}

impl RevealScheduler {
    pub fn new(surface: Arc<Mutex<dyn RevealSurface>>) -> Self {
        Self {
            surface,
            jobs: HashMap::new(),
        }
    }

    /// Start a reveal job, superseding any job on the same target.
    pub fn start(&mut self, request: RevealRequest, on_complete: Option<CompleteCallback>) {
        // Targets are usually fresh message ids, so completed jobs would
        // otherwise accumulate here for the life of the conversation.
        self.jobs.retain(|_, job| !job.task.is_finished());
        self.cancel(&request.target);

        let cancel = Arc::new(Notify::new());
        let surface = Arc::clone(&self.surface);
        let task_cancel = Arc::clone(&cancel);
        let target = request.target.clone();

        let task = tokio::spawn(async move {
            if request.rich_text {
                run_rich(surface, request, task_cancel, on_complete).await;
            } else {
                run_plain(surface, request, task_cancel, on_complete).await;
            }
        });

        self.jobs.insert(target, JobHandle { cancel, task });
    }

    /// Cancel the job on `target`, if any. Pending ticks never fire.
    pub fn cancel(&mut self, target: &str) {
        if let Some(prev) = self.jobs.remove(target) {
            debug!("Superseding reveal job on {}", target);
            // notify_one stores a permit, so cancellation lands even if the
            // job is between ticks right now.
            prev.cancel.notify_one();
        }
    }

    pub fn cancel_all(&mut self) {
        for (target, job) in self.jobs.drain() {
            debug!("Cancelling reveal job on {}", target);
            job.cancel.notify_one();
        }
    }

    /// Number of jobs currently tracked (running or awaiting reap).
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Whether a job is still revealing on `target`.
    pub fn is_active(&self, target: &str) -> bool {
        self.jobs
            .get(target)
            .map(|job| !job.task.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run_plain(
    surface: Arc<Mutex<dyn RevealSurface>>,
    request: RevealRequest,
    cancel: Arc<Notify>,
    on_complete: Option<CompleteCallback>,
) {
    let tuning = speed::tuning(
        request.speed,
        request.speed_multiplier,
        speed::is_large(&request.text),
    );
    let delay = Duration::from_millis(tuning.delay_ms);
    let mut job = PlainJob::new(&request.text, tuning.words_per_chunk());

    // First batch goes out immediately so the reveal starts on arrival.
    {
        let Ok(mut s) = surface.lock() else {
            warn!("Reveal surface lock poisoned; dropping job");
            return;
        };
        s.show_typing_marker(&request.target, true);
        if let Some(batch) = job.next_batch() {
            s.append_plain(&request.target, &batch);
        }
    }

    while !job.is_finished() {
        tokio::select! {
            _ = sleep(delay) => {}
            _ = cancel.notified() => {
                debug!("Reveal job on {} cancelled", request.target);
                return;
            }
        }
        let Ok(mut s) = surface.lock() else {
            warn!("Reveal surface lock poisoned; dropping job");
            return;
        };
        if let Some(batch) = job.next_batch() {
            s.append_plain(&request.target, &batch);
        }
    }

    if let Ok(mut s) = surface.lock() {
        s.show_typing_marker(&request.target, false);
    }
    if let Some(callback) = on_complete {
        callback();
    }
}

async fn run_rich(
    surface: Arc<Mutex<dyn RevealSurface>>,
    request: RevealRequest,
    cancel: Arc<Notify>,
    on_complete: Option<CompleteCallback>,
) {
    let tuning = speed::tuning(
        request.speed,
        request.speed_multiplier,
        speed::is_large(&request.text),
    );
    let delay = Duration::from_millis(tuning.delay_ms);
    let per_tick = tuning.rich_units_per_tick();
    let content = rich::prepare(&request.text);

    let mut visible = per_tick.min(content.unit_count);
    {
        let Ok(mut s) = surface.lock() else {
            warn!("Reveal surface lock poisoned; dropping job");
            return;
        };
        // Structure mounts complete and hidden, so layout is right from the
        // first frame.
        s.mount_rich(&request.target, &content.html, content.unit_count);
        s.reveal_rich_units(&request.target, visible);
    }

    while visible < content.unit_count {
        tokio::select! {
            _ = sleep(delay) => {}
            _ = cancel.notified() => {
                debug!("Reveal job on {} cancelled", request.target);
                return;
            }
        }
        visible = (visible + per_tick).min(content.unit_count);
        let Ok(mut s) = surface.lock() else {
            warn!("Reveal surface lock poisoned; dropping job");
            return;
        };
        s.reveal_rich_units(&request.target, visible);
    }

    if let Some(callback) = on_complete {
        callback();
    }
}
