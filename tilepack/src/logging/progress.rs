use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::progress::ProgressSink;

struct LogBackoff {
    last_logged: Instant,
    iteration: u64,
}

impl LogBackoff {
    fn new(last_logged: Instant) -> Self {
        Self {
            last_logged,
            iteration: 0,
        }
    }

    fn should_log(&mut self) -> bool {
        // capped to not log too few times.
        // 5<<10 = 5120s = 1.4h
        let iteration = self.iteration.min(10);
        let delay = Duration::from_secs(5u64 << iteration);
        if self.last_logged.elapsed() > delay {
            self.last_logged = Instant::now();
            self.iteration += 1;
            true
        } else {
            false
        }
    }
}

enum MaybeInteractiveProgressBar {
    Interactive(ProgressBar),
    NonInteractive { log_backoff: LogBackoff },
}

impl MaybeInteractiveProgressBar {
    fn new() -> Self {
        if Self::is_interactive() {
            let bar = ProgressBar::new(100);
            let style = ProgressStyle::default_bar()
                .template("{elapsed_precise} [{bar:40.cyan/blue} {percent}%] | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░ ");
            bar.set_style(style);
            Self::Interactive(bar)
        } else {
            Self::NonInteractive {
                log_backoff: LogBackoff::new(Instant::now()),
            }
        }
    }

    fn is_interactive() -> bool {
        use std::io::IsTerminal;
        std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
    }
}

/// Shows build progress as a bar on a terminal, or as occasional log lines otherwise.
pub struct BuildProgress {
    bar: MaybeInteractiveProgressBar,
    started_at: Instant,
}

impl BuildProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: MaybeInteractiveProgressBar::new(),
            started_at: Instant::now(),
        }
    }

    pub fn finish(&self) {
        if let MaybeInteractiveProgressBar::Interactive(bar) = &self.bar {
            bar.finish_and_clear();
        }
        info!("Finished in {:?}", self.started_at.elapsed());
    }
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BuildProgress {
    fn report(&mut self, percent: u8, status: &str) {
        match &mut self.bar {
            MaybeInteractiveProgressBar::Interactive(bar) => {
                bar.set_position(u64::from(percent));
                bar.set_message(status.to_string());
            }
            MaybeInteractiveProgressBar::NonInteractive { log_backoff } => {
                if log_backoff.should_log() {
                    let elapsed = self.started_at.elapsed();
                    info!("{percent}% after {elapsed:?}: {status}");
                }
            }
        }
    }
}
