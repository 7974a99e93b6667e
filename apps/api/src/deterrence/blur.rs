use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

pub const SCREENSHOT_BLUR: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlurState {
    pub blurred: bool,
    pub focused: bool,
    /// Bumped on every transition; timers only clear the blur they set.
    pub generation: u64,
}

/// Shared blur flag for one editing session. Cloning shares the state, so
/// timers spawned by `screenshot_detected` can clear it later.
#[derive(Debug, Clone)]
pub struct BlurController {
    state: Arc<Mutex<BlurState>>,
}

impl Default for BlurController {
    fn default() -> Self {
        Self::new()
    }
}

impl BlurController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BlurState {
                blurred: false,
                focused: true,
                generation: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> BlurState {
        self.with_state(|s| *s)
    }

    pub fn is_blurred(&self) -> bool {
        self.snapshot().blurred
    }

    /// Blurs immediately and clears after `SCREENSHOT_BLUR`, unless something
    /// else changed the blur in the meantime.
    pub fn screenshot_detected(&self) {
        let ticket = self.with_state(|s| {
            s.blurred = true;
            s.generation += 1;
            s.generation
        });

        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SCREENSHOT_BLUR).await;
            controller.expire(ticket);
        });
    }

    pub fn focus_lost(&self) {
        self.with_state(|s| {
            s.focused = false;
            s.blurred = true;
            s.generation += 1;
        });
    }

    pub fn focus_gained(&self) {
        self.with_state(|s| {
            s.focused = true;
            s.blurred = false;
            s.generation += 1;
        });
    }

    fn expire(&self, ticket: u64) {
        self.with_state(|s| {
            if s.generation == ticket && s.focused {
                s.blurred = false;
                debug!("Screenshot blur cleared");
            }
        });
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut BlurState) -> T) -> T {
        // A poisoned lock still holds a usable flag.
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn advance(d: Duration) {
        tokio::time::sleep(d).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_screenshot_blur_clears_after_two_seconds() {
        let blur = BlurController::new();
        blur.screenshot_detected();
        assert!(blur.is_blurred());

        advance(Duration::from_millis(1900)).await;
        assert!(blur.is_blurred());
        advance(Duration::from_millis(200)).await;
        assert!(!blur.is_blurred());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_clear_newer_blur() {
        let blur = BlurController::new();
        blur.screenshot_detected();
        advance(Duration::from_millis(1500)).await;
        blur.screenshot_detected();

        advance(Duration::from_millis(600)).await;
        assert!(blur.is_blurred(), "first timer fired but second blur is still active");
        advance(Duration::from_millis(1500)).await;
        assert!(!blur.is_blurred());
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_loss_blurs_until_focus_returns() {
        let blur = BlurController::new();
        blur.screenshot_detected();
        blur.focus_lost();

        advance(SCREENSHOT_BLUR * 3).await;
        assert!(blur.is_blurred());

        blur.focus_gained();
        assert!(!blur.is_blurred());
    }

    #[test]
    fn test_starts_clear_and_focused() {
        let state = BlurController::default().snapshot();
        assert!(!state.blurred);
        assert!(state.focused);
    }
}
