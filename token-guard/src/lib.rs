//! Private bearer-token supplier for hub HTTP calls
//!
//! The hub's REST surface (device/network metadata, not peripheral polling)
//! requires a bearer token that stays valid for roughly 55 minutes. The
//! guard acquires one lazily, caches it for its validity window, and can be
//! invalidated so the next attempt re-authenticates from scratch.

mod error;

pub use error::TokenError;

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};

/// How long a freshly issued token is trusted before re-authenticating
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(55 * 60);

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Supplies a valid bearer credential for the hub's REST endpoint
pub struct TokenGuard {
    agent: ureq::Agent,
    base_url: String,
    username: String,
    password: String,
    validity: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenGuard {
    /// Create a guard for the given REST base URL and stored credentials
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::with_validity(base_url, username, password, TOKEN_VALIDITY)
    }

    /// Guard with a custom validity window (tests shrink this)
    pub fn with_validity(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        validity: Duration,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            validity,
            cached: Mutex::new(None),
        }
    }

    /// Return a valid bearer token, authenticating lazily when the cached
    /// one is missing or expired
    pub fn bearer(&self) -> Result<String, TokenError> {
        {
            let cached = self.cached.lock();
            if let Some(entry) = cached.as_ref() {
                if Instant::now() < entry.expires_at {
                    return Ok(entry.token.clone());
                }
            }
        }

        let token = self.authenticate()?;
        *self.cached.lock() = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + self.validity,
        });
        Ok(token)
    }

    /// Drop the cached token so the next call re-authenticates.
    ///
    /// Called after an authentication failure downstream; recovery is then
    /// automatic on the very next request.
    pub fn invalidate(&self) {
        *self.cached.lock() = None;
    }

    fn authenticate(&self) -> Result<String, TokenError> {
        let url = format!("{}/api/v1/token", self.base_url);
        debug!(url = %url, "requesting bearer token");

        let response = self
            .agent
            .post(&url)
            .send_json(serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .map_err(|err| match err {
                ureq::Error::Status(code, _) if code == 401 || code == 403 => {
                    warn!(code, "hub rejected credentials");
                    TokenError::Denied(code)
                }
                ureq::Error::Status(code, _) => {
                    TokenError::Http(format!("token endpoint returned HTTP {}", code))
                }
                other => TokenError::Http(other.to_string()),
            })?;

        let parsed: TokenResponse = response
            .into_json()
            .map_err(|err| TokenError::Parse(err.to_string()))?;

        if parsed.token.is_empty() {
            return Err(TokenError::Parse("empty token".to_string()));
        }
        Ok(parsed.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Minimal HTTP server answering each token request on its own
    /// connection; returns the number of requests served
    fn spawn_token_server(
        responses: Vec<(u16, String)>,
    ) -> (String, Arc<AtomicUsize>, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let served = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&served);

        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();

                // Drain the request head and body enough to respond
                let mut buffer = [0u8; 4096];
                let _ = stream.read(&mut buffer);

                let reason = if status == 200 { "OK" } else { "Unauthorized" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        (format!("http://{}", addr), served, handle)
    }

    #[test]
    fn test_token_is_cached_for_its_validity_window() {
        let (base, served, handle) =
            spawn_token_server(vec![(200, "{\"token\":\"abc123\"}".to_string())]);
        let guard = TokenGuard::new(&base, "admin", "secret");

        assert_eq!(guard.bearer().unwrap(), "abc123");
        assert_eq!(guard.bearer().unwrap(), "abc123");

        handle.join().unwrap();
        assert_eq!(served.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_forces_reauthentication() {
        let (base, served, handle) = spawn_token_server(vec![
            (200, "{\"token\":\"first\"}".to_string()),
            (200, "{\"token\":\"second\"}".to_string()),
        ]);
        let guard = TokenGuard::new(&base, "admin", "secret");

        assert_eq!(guard.bearer().unwrap(), "first");
        guard.invalidate();
        assert_eq!(guard.bearer().unwrap(), "second");

        handle.join().unwrap();
        assert_eq!(served.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rejected_credentials_surface_as_denied() {
        let (base, _served, handle) =
            spawn_token_server(vec![(401, "{\"error\":\"bad credentials\"}".to_string())]);
        let guard = TokenGuard::new(&base, "admin", "wrong");

        match guard.bearer() {
            Err(TokenError::Denied(401)) => {}
            other => panic!("expected Denied, got {:?}", other),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_expired_token_is_refreshed() {
        let (base, served, handle) = spawn_token_server(vec![
            (200, "{\"token\":\"first\"}".to_string()),
            (200, "{\"token\":\"second\"}".to_string()),
        ]);
        let guard =
            TokenGuard::with_validity(&base, "admin", "secret", Duration::from_millis(10));

        assert_eq!(guard.bearer().unwrap(), "first");
        thread::sleep(Duration::from_millis(30));
        assert_eq!(guard.bearer().unwrap(), "second");

        handle.join().unwrap();
        assert_eq!(served.load(Ordering::SeqCst), 2);
    }
}
