//! Fixed-window request limiting per client IP, applied to the API routes.

use std::{
  collections::HashMap,
  net::{IpAddr, Ipv4Addr, SocketAddr},
  sync::Arc,
  time::{Duration, Instant},
};

use axum::{
  extract::{ConnectInfo, Request, State},
  http::StatusCode,
  middleware::Next,
  response::{IntoResponse, Response},
  Json,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::errors::ErrorOut;
use crate::state::AppState;

#[derive(Debug)]
struct Window {
  started: Instant,
  hits: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
  window: Duration,
  max_hits: u32,
  clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
  pub fn new(window: Duration, max_hits: u32) -> Self {
    Self { window, max_hits, clients: Mutex::new(HashMap::new()) }
  }

  /// Count one request from `ip` at `now`. Returns the seconds until the
  /// window resets when the client is over its budget.
  pub async fn check(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
    let mut clients = self.clients.lock().await;
    // Forget clients whose window is long gone so the map does not grow forever.
    if clients.len() > 1024 {
      clients.retain(|_, w| now.duration_since(w.started) < self.window);
    }
    let w = clients.entry(ip).or_insert(Window { started: now, hits: 0 });
    if now.duration_since(w.started) >= self.window {
      w.started = now;
      w.hits = 0;
    }
    if w.hits >= self.max_hits {
      let reset = self.window.saturating_sub(now.duration_since(w.started));
      return Err(reset.as_secs().max(1));
    }
    w.hits += 1;
    Ok(())
  }
}

/// axum middleware; peers without connect info share one bucket.
pub async fn limit_requests(
  State(state): State<Arc<AppState>>,
  peer: Option<ConnectInfo<SocketAddr>>,
  req: Request,
  next: Next,
) -> Response {
  let ip = peer.map(|ConnectInfo(addr)| addr.ip()).unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
  match state.limiter.check(ip, Instant::now()).await {
    Ok(()) => next.run(req).await,
    Err(retry_after) => {
      warn!(target: "studytutor_backend", %ip, path = %req.uri().path(), retry_after, "Rate limit exceeded");
      let body = ErrorOut {
        error: "Too many requests".into(),
        details: format!("Try again in {retry_after}s"),
      };
      (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
    }
  }
}
