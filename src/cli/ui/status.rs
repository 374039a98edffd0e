//! Shared terminal status line
//!
//! A [`StatusLine`] owns the bottom line of the terminal. While a request is
//! in flight it animates a spinner there; finished lines (client progress
//! messages, batch announcements) are printed above it so the two never end
//! up on the same line.
//!
//! ```rust,ignore
//! let status = StatusLine::new();
//! let client = client.with_progress(ConsoleProgress::new(status.clone()));
//! let report = status
//!     .spin_while("Batch 1/3 in flight …", client.bulk_insert_options(&chunk, &target, bulk))
//!     .await?;
//! ```

use std::future::Future;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use colored::Colorize;

use crate::api::ProgressSink;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

#[derive(Debug, Default)]
struct LineState {
    /// Text next to the spinner; `None` when nothing spins
    message: Option<String>,
    /// Bumped on every start and stop so a stale animator exits
    generation: u64,
}

/// Handle to the status line; clones share it
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    state: Arc<Mutex<LineState>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Print a complete line above the spinner, if one is running.
    ///
    /// The spinner is redrawn on its next frame.
    pub fn println(&self, text: &str) {
        let state = self.lock();
        if state.message.is_some() {
            clear_line();
        }
        println!("{}", text);
    }

    /// Whether a spinner currently owns the line
    pub fn is_spinning(&self) -> bool {
        self.lock().message.is_some()
    }

    /// Start animating `message`; the returned guard stops it when dropped
    pub fn spin(&self, message: impl Into<String>) -> Spinner {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.message = Some(message.into());
            state.generation
        };

        tokio::spawn(animate(Arc::clone(&self.state), generation));

        Spinner {
            line: self.clone(),
            generation,
        }
    }

    /// Await `future` while the spinner shows `message`
    pub async fn spin_while<F, T>(&self, message: impl Into<String>, future: F) -> T
    where
        F: Future<Output = T>,
    {
        let _spinner = self.spin(message);
        future.await
    }
}

/// Running spinner; dropping it clears the line
#[derive(Debug)]
pub struct Spinner {
    line: StatusLine,
    generation: u64,
}

impl Drop for Spinner {
    fn drop(&mut self) {
        let mut state = self.line.lock();
        // a newer spinner already took over the line
        if state.generation != self.generation {
            return;
        }
        state.message = None;
        state.generation += 1;
        clear_line();
    }
}

async fn animate(state: Arc<Mutex<LineState>>, generation: u64) {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);

    for frame in FRAMES.iter().cycle() {
        ticker.tick().await;

        let guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.generation != generation {
            break;
        }
        match guard.message.as_deref() {
            Some(message) => {
                print!("\r\x1b[K{} {}", frame.to_string().cyan(), message);
                let _ = io::stdout().flush();
            }
            None => break,
        }
    }
}

fn clear_line() {
    print!("\r\x1b[K");
    let _ = io::stdout().flush();
}

/// Client progress messages as dimmed lines above the spinner
#[derive(Debug, Clone, Default)]
pub struct ConsoleProgress {
    line: StatusLine,
}

impl ConsoleProgress {
    pub fn new(line: StatusLine) -> Self {
        Self { line }
    }
}

impl ProgressSink for ConsoleProgress {
    fn emit(&self, message: &str) {
        self.line.println(&message.dimmed().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spin_while_releases_line() {
        let status = StatusLine::new();
        let value = status
            .spin_while("Working …", async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                42
            })
            .await;

        assert_eq!(value, 42);
        assert!(!status.is_spinning());
    }

    #[tokio::test]
    async fn test_stale_spinner_keeps_newer_line() {
        let status = StatusLine::new();
        let first = status.spin("first");
        let second = status.spin("second");

        drop(first);
        assert!(status.is_spinning());
        assert_eq!(status.lock().message.as_deref(), Some("second"));

        drop(second);
        assert!(!status.is_spinning());
    }

    #[tokio::test]
    async fn test_progress_prints_while_spinning() {
        let status = StatusLine::new();
        let progress = ConsoleProgress::new(status.clone());

        let _spinner = status.spin("Sending …");
        progress.emit("Batch INSERT complete: 2/2 succeeded");
        assert!(status.is_spinning());
    }
}
