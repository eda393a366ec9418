//! CSRF token generation and comparison.

use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::guard::rate_limit::now_ms;

/// Random bytes per token. Hex encoding doubles the length.
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Draw a fresh token from the OS random source, hex encoded (64 chars).
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Compare a submitted token against the stored one.
///
/// Missing or empty tokens never match.
pub fn validate_csrf_token(token: Option<&str>, stored: Option<&str>) -> bool {
    match (token, stored) {
        (Some(token), Some(stored)) if !token.is_empty() && !stored.is_empty() => {
            constant_time_eq(token.as_bytes(), stored.as_bytes())
        }
        _ => false,
    }
}

/// Equality whose running time depends only on the length of the inputs.
///
/// Lengths are compared first; equal-length inputs are walked in full and
/// differences folded with `|`, so the position of the first mismatch is not
/// observable.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    std::hint::black_box(diff) == 0
}

/// Session-side storage of issued tokens.
pub trait CsrfTokenStore: Send + Sync {
    fn get(&self, session_id: &str) -> Option<String>;

    /// Store `token` for `session_id`, stamped with the current time.
    fn set(&self, session_id: &str, token: String);

    fn remove(&self, session_id: &str);

    /// Drop tokens issued before `issued_before_ms`. Returns how many went.
    fn sweep(&self, issued_before_ms: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct IssuedToken {
    token: String,
    issued_at_ms: u64,
}

/// Process-local [`CsrfTokenStore`]. Grows with sessions until swept.
#[derive(Debug, Default)]
pub struct InMemoryCsrfStore {
    tokens: DashMap<String, IssuedToken>,
}

impl InMemoryCsrfStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`CsrfTokenStore::set`] with an explicit clock reading.
    pub fn set_at(&self, session_id: &str, token: String, now_ms: u64) {
        self.tokens.insert(
            session_id.to_string(),
            IssuedToken {
                token,
                issued_at_ms: now_ms,
            },
        );
    }
}

impl CsrfTokenStore for InMemoryCsrfStore {
    fn get(&self, session_id: &str) -> Option<String> {
        self.tokens.get(session_id).map(|r| r.value().token.clone())
    }

    fn set(&self, session_id: &str, token: String) {
        self.set_at(session_id, token, now_ms());
    }

    fn remove(&self, session_id: &str) {
        self.tokens.remove(session_id);
    }

    fn sweep(&self, issued_before_ms: u64) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, issued| issued.issued_at_ms >= issued_before_ms);
        before.saturating_sub(self.tokens.len())
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }
}
