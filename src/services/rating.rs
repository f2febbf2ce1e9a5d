use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use crate::models::RatingStepper;

/// 长按重复触发器
///
/// Fires once on press, again after `initial_delay`, then every `interval`
/// until the returned handle is released or dropped.
#[derive(Debug, Clone, Copy)]
pub struct HoldRepeater {
    initial_delay: Duration,
    interval: Duration,
}

impl Default for HoldRepeater {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(400),
            interval: Duration::from_millis(100),
        }
    }
}

impl HoldRepeater {
    pub fn new(initial_delay: Duration, interval: Duration) -> Self {
        Self {
            initial_delay,
            interval,
        }
    }

    pub fn press<F>(&self, mut action: F) -> HoldHandle
    where
        F: FnMut() + Send + 'static,
    {
        action();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let initial_delay = self.initial_delay;
        let interval = self.interval;

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => return,
                _ = tokio::time::sleep(initial_delay) => action(),
            }

            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => action(),
                }
            }
        });

        HoldHandle {
            token,
            task: Some(task),
        }
    }
}

/// 长按句柄（释放即取消）
#[derive(Debug)]
pub struct HoldHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl HoldHandle {
    /// Stops repeating and waits for the task to wind down.
    pub async fn release(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for HoldHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
