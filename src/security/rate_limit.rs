//! Per-route admission gate.
//!
//! # Design Decisions
//! - Fixed one-second window per route: the first request opens a window,
//!   at most `limit` requests are admitted until it expires
//! - Independent of the rolling rate tracker, which only observes
//! - Uses tokio's clock so windows follow paused time in tests

use std::num::NonZeroU32;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use tokio::time::Instant;

use crate::pipeline::draft::ResponseDraft;

/// Length of the admission window.
pub const RATE_WINDOW: Duration = Duration::from_secs(1);

const REJECTION_MESSAGE: &str = "Too many requests, please try again later.";

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Admits at most `limit` requests per window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Option<Window>>,
}

impl FixedWindowLimiter {
    pub fn new(limit: NonZeroU32) -> Self {
        Self::with_window(limit, RATE_WINDOW)
    }

    pub fn with_window(limit: NonZeroU32, window: Duration) -> Self {
        Self {
            limit: limit.get(),
            window,
            state: Mutex::new(None),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit one request, or return how long until the window resets.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let expired = state
            .as_ref()
            .map_or(true, |w| now.duration_since(w.started) >= self.window);
        if expired {
            *state = None;
        }
        let window = state.get_or_insert(Window { started: now, count: 0 });

        if window.count < self.limit {
            window.count += 1;
            Ok(())
        } else {
            Err(self.window.saturating_sub(now.duration_since(window.started)))
        }
    }

    /// Build the 429 response, keeping headers already written to the draft.
    pub fn reject(&self, draft: ResponseDraft, retry_after: Duration) -> Response {
        let mut response = draft.finish_with(StatusCode::TOO_MANY_REQUESTS, Body::from(REJECTION_MESSAGE));
        let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: u32) -> FixedWindowLimiter {
        FixedWindowLimiter::new(NonZeroU32::new(limit).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_over_limit_within_window() {
        let limiter = limiter(5);
        for _ in 0..5 {
            assert!(limiter.try_acquire().is_ok());
        }
        let retry_after = limiter.try_acquire().unwrap_err();
        assert!(retry_after <= RATE_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn admits_again_after_window_resets() {
        let limiter = limiter(5);
        for _ in 0..5 {
            limiter.try_acquire().unwrap();
        }
        assert!(limiter.try_acquire().is_err());

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(limiter.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn window_starts_at_first_request() {
        let limiter = limiter(1);
        tokio::time::advance(Duration::from_secs(10)).await;
        limiter.try_acquire().unwrap();

        tokio::time::advance(Duration::from_millis(900)).await;
        let retry_after = limiter.try_acquire().unwrap_err();
        assert_eq!(retry_after, Duration::from_millis(100));
    }

    #[test]
    fn rejection_response_carries_retry_after() {
        let limiter = limiter(1);
        let response = limiter.reject(ResponseDraft::default(), Duration::from_millis(300));
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
