use std::fmt;

/// Transport authorization for one connection attempt
///
/// Never cached: every session fetches its own and drops them once the
/// media session has consumed them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub server_url: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            server_url: server_url.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("server_url", &self.server_url)
            .finish()
    }
}
