use crate::config::SessionConfig;
use axum::http::{header::COOKIE, HeaderMap};
use dashmap::DashMap;
use rand::RngCore;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user_name: String,
}

struct Entry {
    session: Session,
    last_seen: Instant,
}

/// Server-side sessions keyed by an opaque random token carried in a cookie.
pub struct SessionStore {
    sessions: DashMap<String, Entry>,
    cookie_name: String,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_name: config.cookie_name.clone(),
            idle_timeout: Duration::from_secs(config.idle_timeout_minutes * 60),
        }
    }

    /// Starts a fresh authenticated session and returns its token. Tokens are
    /// never reused, so a successful login always rotates the cookie.
    pub fn create_authenticated(&self, user_name: &str) -> String {
        self.prune_expired();

        let token = new_token();
        self.sessions.insert(token.clone(), Entry {
            session: Session { authenticated: true, user_name: user_name.to_string() },
            last_seen: Instant::now(),
        });
        token
    }

    /// Looks up a live session and refreshes its idle timer.
    pub fn lookup(&self, token: &str) -> Option<Session> {
        let mut entry = self.sessions.get_mut(token)?;
        if entry.last_seen.elapsed() > self.idle_timeout {
            drop(entry);
            self.sessions.remove(token);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn prune_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.last_seen.elapsed() <= self.idle_timeout);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Extracts this store's token from the request's `Cookie` headers.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, token)| token.to_string())
    }

    /// The session attached to a request, if it is still live.
    pub fn current(&self, headers: &HeaderMap) -> Option<Session> {
        self.token_from_headers(headers)
            .and_then(|token| self.lookup(&token))
    }

    /// Drops whatever session the request carries.
    pub fn clear(&self, headers: &HeaderMap) {
        if let Some(token) = self.token_from_headers(headers) {
            self.remove(&token);
        }
    }

    pub fn set_cookie(&self, token: &str) -> String {
        format!("{}={}; Path=/; HttpOnly; SameSite=Lax", self.cookie_name, token)
    }

    pub fn expired_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.cookie_name)
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig::default())
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn created_session_is_authenticated() {
        let store = store();
        let token = store.create_authenticated("alice");
        let session = store.lookup(&token).unwrap();
        assert!(session.authenticated);
        assert_eq!(session.user_name, "alice");
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let store = store();
        let a = store.create_authenticated("alice");
        let b = store.create_authenticated("alice");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_is_found_among_other_cookies() {
        let store = store();
        let headers = headers_with("theme=dark; liftgate_session=abc123; other=1");
        assert_eq!(store.token_from_headers(&headers).as_deref(), Some("abc123"));
        assert!(store.token_from_headers(&headers_with("theme=dark")).is_none());
    }

    #[test]
    fn clear_removes_the_session() {
        let store = store();
        let token = store.create_authenticated("bob");
        let headers = headers_with(&format!("liftgate_session={}", token));
        assert!(store.current(&headers).is_some());
        store.clear(&headers);
        assert!(store.current(&headers).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::new(&SessionConfig {
            idle_timeout_minutes: 0,
            ..SessionConfig::default()
        });
        let token = store.create_authenticated("carol");
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.lookup(&token).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn unknown_token_is_absent() {
        assert!(store().lookup("nope").is_none());
    }
}
