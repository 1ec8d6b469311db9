//! Login and signup behind a pluggable authenticator.
//!
//! Only request validation is real here.  [`SimulatedAuthenticator`] accepts
//! every well-formed request and hands out sequential session identifiers; a
//! backend-backed implementation can replace it through the [`Authenticator`]
//! trait.

use std::fmt;
use std::thread;
use std::time::Duration;

use log::info;

use crate::error::AuthError;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Login form values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Signup form values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Identifier of an authenticated session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

/// A signed-in user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    email: String,
    display_name: Option<String>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Name given at signup; logins carry none.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// Capability that turns login or signup requests into sessions.
pub trait Authenticator {
    /// Signs in an existing user.
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Creates an account and signs the new user in.
    fn register(&mut self, request: &SignupRequest) -> Result<Session, AuthError>;
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}

fn check_email(email: &str) -> Result<(), AuthError> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail(email.to_owned()))
    }
}

/// Checks a login form: both fields present and a plausible e-mail.
pub fn validate_login(credentials: &Credentials) -> Result<(), AuthError> {
    require(&credentials.email, "email")?;
    require(&credentials.password, "password")?;
    check_email(&credentials.email)
}

/// Checks a signup form: all fields present, a plausible e-mail and a
/// password of at least [`MIN_PASSWORD_LEN`] characters.
pub fn validate_signup(request: &SignupRequest) -> Result<(), AuthError> {
    require(&request.name, "name")?;
    require(&request.email, "email")?;
    require(&request.password, "password")?;
    check_email(&request.email)?;
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min_len: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Authenticator that accepts every valid request without a backend.
#[derive(Clone, Debug, Default)]
pub struct SimulatedAuthenticator {
    delay: Duration,
    issued: u64,
}

impl SimulatedAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks the calling thread for `delay` before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn open_session(&mut self, email: &str, display_name: Option<String>) -> Session {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.issued += 1;
        let session = Session {
            id: SessionId(self.issued),
            email: email.trim().to_owned(),
            display_name,
        };
        info!("auth: opened session {} for {}", session.id, session.email);
        session
    }
}

impl Authenticator for SimulatedAuthenticator {
    fn authenticate(&mut self, credentials: &Credentials) -> Result<Session, AuthError> {
        validate_login(credentials)?;
        Ok(self.open_session(&credentials.email, None))
    }

    fn register(&mut self, request: &SignupRequest) -> Result<Session, AuthError> {
        validate_signup(request)?;
        Ok(self.open_session(&request.email, Some(request.name.trim().to_owned())))
    }
}
