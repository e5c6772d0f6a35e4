use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use crate::state::AppState;

/// Sliding-window rate limiter keyed by client IP. Each key holds the
/// instants of its requests inside the current window; the deque is pruned
/// on every check.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
    max: u32,
    window: Duration,
}

pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max,
            window,
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub async fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut map = self.inner.write().await;
        let hits = map.entry(key.to_string()).or_default();

        while let Some(front) = hits.front() {
            if now.duration_since(*front) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() as u32 >= self.max {
            let retry_after_secs = hits
                .front()
                .map(|front| {
                    self.window
                        .checked_sub(now.duration_since(*front))
                        .unwrap_or(Duration::ZERO)
                        .as_secs()
                })
                .unwrap_or(0);
            return Decision::Limited { retry_after_secs };
        }

        hits.push_back(now);
        Decision::Allowed {
            remaining: self.max - hits.len() as u32,
        }
    }
}

fn client_key(req: &Request) -> String {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let key = client_key(&req);

    let remaining = match state.limiter.check(&key).await {
        Decision::Limited { retry_after_secs } => {
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(serde_json::json!({
                    "success": false,
                    "message": "Too many requests. Please try again later.",
                })),
            )
                .into_response());
        }
        Decision::Allowed { remaining } => remaining,
    };

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", state.limiter.max().into());
    headers.insert("X-RateLimit-Remaining", remaining.into());

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_max_then_limits() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for expected_remaining in [2u32, 1, 0] {
            match limiter.check("1.2.3.4").await {
                Decision::Allowed { remaining } => assert_eq!(remaining, expected_remaining),
                Decision::Limited { .. } => panic!("limited too early"),
            }
        }
        assert!(matches!(
            limiter.check("1.2.3.4").await,
            Decision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(matches!(
            limiter.check("a").await,
            Decision::Allowed { .. }
        ));
        assert!(matches!(limiter.check("a").await, Decision::Limited { .. }));
        assert!(matches!(
            limiter.check("b").await,
            Decision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn window_slides() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));
        assert!(matches!(
            limiter.check("a").await,
            Decision::Allowed { .. }
        ));
        assert!(matches!(limiter.check("a").await, Decision::Limited { .. }));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(matches!(
            limiter.check("a").await,
            Decision::Allowed { .. }
        ));
    }
}
