use grab_fetch::{FetchPhase, Progress};
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

pub trait Tracker {
    type Ctx: Clone;
    fn new(ctx: Self::Ctx) -> Self;
    fn finish(&self, msg: Option<String>);
}

const BYTES_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TASKS_STYLE: &str = "{spinner:.blue} [{elapsed_precise}] {wide_bar:.green/blue} {pos}/{len} tasks {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

fn styled(template: &str) -> Option<ProgressStyle> {
    ProgressStyle::with_template(template)
        .ok()
        .map(|s| s.tick_chars(TICK).progress_chars(PB_CHARS))
}

static BYTES_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| styled(BYTES_STYLE));

static TASKS_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| styled(TASKS_STYLE));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerUnit {
    Bytes,
    Tasks,
}

pub struct ProgressTracker {
    pub pb: ProgressBar,
}

#[derive(Debug, Clone)]
pub struct ProgressTrackerConfig {
    pub len: Option<u64>,
    pub unit: TrackerUnit,
}

impl ProgressTracker {
    /// Mirror a transfer snapshot onto the bar.
    pub fn update(&self, progress: &Progress) {
        if let Some(total) = progress.total_bytes {
            if self.pb.length() != Some(total) {
                self.pb.set_length(total);
            }
        }
        self.pb.set_position(progress.bytes_downloaded);

        let msg = match (progress.phase, progress.retry_count) {
            (FetchPhase::Downloading, 0) => String::new(),
            (phase, 0) => phase.to_string(),
            (phase, n) => format!("{phase} (retries: {n})"),
        };
        self.pb.set_message(msg);
    }

    pub fn inc(&self, delta: u64) {
        self.pb.inc(delta);
    }

    pub fn abandon(&self) {
        self.pb.abandon_with_message("failed");
    }
}

impl Tracker for ProgressTracker {
    type Ctx = ProgressTrackerConfig;

    fn new(ctx: Self::Ctx) -> Self {
        let pb = match ctx.len {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::no_length(),
        };

        let template = match ctx.unit {
            TrackerUnit::Bytes => &BYTES_TEMPLATE,
            TrackerUnit::Tasks => &TASKS_TEMPLATE,
        };
        let style = Option::clone(template).unwrap_or_else(ProgressStyle::default_bar);
        pb.set_style(style);
        ProgressTracker { pb }
    }

    fn finish(&self, msg: Option<String>) {
        match msg {
            Some(msg) => self.pb.finish_with_message(msg),
            None => self.pb.finish(),
        }
    }
}
