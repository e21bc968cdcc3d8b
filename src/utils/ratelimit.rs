//! Sliding-window rate limiter for outbound API calls

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

struct Window {
    /// Request timestamps within the current window
    request_times: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl Window {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            request_times: VecDeque::new(),
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Returns how long to wait before the request may go out.
    /// A zero duration means the request was recorded.
    fn check_and_record(&mut self, now: Instant) -> Duration {
        while let Some(&front) = self.request_times.front() {
            if now.duration_since(front) >= self.window {
                self.request_times.pop_front();
            } else {
                break;
            }
        }

        if self.request_times.len() >= self.max_requests {
            if let Some(&oldest) = self.request_times.front() {
                let elapsed = now.duration_since(oldest);
                if elapsed < self.window {
                    return self.window - elapsed;
                }
            }
        }

        self.request_times.push_back(now);
        Duration::ZERO
    }
}

/// Limits a client to `max_requests` per second. Owned by the client, never global.
pub struct RateLimiter {
    inner: Mutex<Window>,
}

impl RateLimiter {
    pub fn per_second(max_requests: usize) -> Self {
        Self {
            inner: Mutex::new(Window::new(max_requests, Duration::from_secs(1))),
        }
    }

    /// Wait until a request slot is free, then take it
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.inner.lock().await;
                window.check_and_record(Instant::now())
            };

            if wait.is_zero() {
                return;
            }

            tracing::debug!("Rate limit: waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
    }
}
