//! Authentication state of a client.

use std::fmt;

use crate::error::RtirError;

/// RT user name and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    password: String,
}

impl Credentials {
    /// Creates credentials. The user name is trimmed.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// The RT user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The password. Never log the returned value.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Form fields expected by the RT login page.
    pub(crate) fn login_form(&self) -> [(&'static str, &str); 2] {
        [("user", self.user.as_str()), ("pass", self.password.as_str())]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login state held by a client: who, where, and whether RT accepted us.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Option<Credentials>,
    base_url: String,
    logged_in: bool,
    cookie: Option<String>,
}

impl Session {
    /// Creates a logged-out session.
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Self {
        Self {
            credentials: Some(credentials),
            base_url: base_url.into(),
            logged_in: false,
            cookie: None,
        }
    }

    /// Base URL of the RT instance.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true once RT accepted the credentials.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Session cookie(s) received at login, as `name=value` pairs.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Current credentials, if any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Current credentials or `MissingCredentials`.
    pub fn require_credentials(&self) -> Result<&Credentials, RtirError> {
        self.credentials.as_ref().ok_or(RtirError::MissingCredentials)
    }

    /// User name of the current credentials, empty if there are none.
    pub fn user(&self) -> &str {
        self.credentials.as_ref().map(Credentials::user).unwrap_or("")
    }

    /// Fails with `NotLoggedIn` unless a session is established.
    pub fn ensure_logged_in(&self) -> Result<(), RtirError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(RtirError::NotLoggedIn)
        }
    }

    pub(crate) fn mark_logged_in(&mut self, cookie: Option<String>) {
        self.logged_in = true;
        self.cookie = cookie.filter(|c| !c.is_empty());
    }

    pub(crate) fn mark_logged_out(&mut self) {
        self.logged_in = false;
        self.cookie = None;
    }

    /// Logs out and forgets the credentials.
    pub(crate) fn close(&mut self) {
        self.mark_logged_out();
        self.credentials = None;
    }

    pub(crate) fn replace_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }
}
