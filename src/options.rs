//! Connect options.
//!
//! [`ConnectOptions`] is the frozen record consumed by
//! [`Connector::connect`](crate::Connector::connect). It is built through
//! [`ConnectOptionsBuilder`], which validates the auth-mode/provider pairing
//! at build time so an invalid combination never reaches the connector.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConnectorError, Result};
use crate::instance::InstanceUri;
use crate::token::TokenProvider;

/// Default user agent sent in the metadata exchange.
pub const DEFAULT_USER_AGENT: &str = concat!("alloydb-connector/", env!("CARGO_PKG_VERSION"));

/// Default per-I/O deadline.
pub const DEFAULT_IO_DEADLINE: Duration = Duration::from_secs(30);

/// How a connect authenticates to the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Authenticate with an OAuth bearer token from a [`TokenProvider`].
    #[default]
    Iam,
    /// Authenticate with a database-native password, spoken by the
    /// downstream PostgreSQL driver after the channel is returned.
    DbNative,
}

/// Options for one connect.
///
/// Construct with [`ConnectOptions::builder`]:
///
/// ```
/// use std::sync::Arc;
/// use alloydb_connector::{ConnectOptions, StaticTokenProvider};
///
/// let options = ConnectOptions::builder(
///     "projects/p/locations/r/clusters/c/instances/i".parse().unwrap(),
/// )
/// .token_provider(Arc::new(StaticTokenProvider::new("TOK")))
/// .build()
/// .unwrap();
/// ```
#[derive(Clone)]
pub struct ConnectOptions {
    instance_uri: InstanceUri,
    auth_mode: AuthMode,
    token_provider: Option<Arc<dyn TokenProvider>>,
    user_agent: String,
    io_deadline: Duration,
}

impl ConnectOptions {
    /// Start building options for the given instance.
    pub fn builder(instance_uri: InstanceUri) -> ConnectOptionsBuilder {
        ConnectOptionsBuilder {
            instance_uri,
            auth_mode: AuthMode::default(),
            token_provider: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            io_deadline: DEFAULT_IO_DEADLINE,
        }
    }

    /// The target instance.
    pub fn instance_uri(&self) -> &InstanceUri {
        &self.instance_uri
    }

    /// The selected authentication mode.
    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// The token provider, present iff `auth_mode` is [`AuthMode::Iam`].
    pub fn token_provider(&self) -> Option<&Arc<dyn TokenProvider>> {
        self.token_provider.as_ref()
    }

    /// The user agent declared in the metadata exchange.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Deadline applied to each individual network I/O, not to the connect
    /// as a whole.
    pub fn io_deadline(&self) -> Duration {
        self.io_deadline
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("instance_uri", &self.instance_uri)
            .field("auth_mode", &self.auth_mode)
            .field(
                "token_provider",
                &self.token_provider.as_ref().map(|_| "..."),
            )
            .field("user_agent", &self.user_agent)
            .field("io_deadline", &self.io_deadline)
            .finish()
    }
}

/// Builder for [`ConnectOptions`].
pub struct ConnectOptionsBuilder {
    instance_uri: InstanceUri,
    auth_mode: AuthMode,
    token_provider: Option<Arc<dyn TokenProvider>>,
    user_agent: String,
    io_deadline: Duration,
}

impl ConnectOptionsBuilder {
    /// Select the authentication mode. Defaults to [`AuthMode::Iam`].
    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Supply the token provider. Required for IAM, forbidden otherwise.
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Override the user agent declared in the metadata exchange.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the per-I/O deadline. Defaults to 30 seconds.
    pub fn io_deadline(mut self, deadline: Duration) -> Self {
        self.io_deadline = deadline;
        self
    }

    /// Validate the combination and freeze the options.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidConfig`] if IAM mode has no token
    /// provider, or DB-native mode has one.
    pub fn build(self) -> Result<ConnectOptions> {
        match (self.auth_mode, &self.token_provider) {
            (AuthMode::Iam, None) => {
                return Err(ConnectorError::invalid_config(
                    "IAM auth mode requires a token provider",
                ));
            }
            (AuthMode::DbNative, Some(_)) => {
                return Err(ConnectorError::invalid_config(
                    "a token provider must not be set for database-native auth",
                ));
            }
            _ => {}
        }
        if self.io_deadline.is_zero() {
            return Err(ConnectorError::invalid_config(
                "io_deadline must be non-zero",
            ));
        }

        Ok(ConnectOptions {
            instance_uri: self.instance_uri,
            auth_mode: self.auth_mode,
            token_provider: self.token_provider,
            user_agent: self.user_agent,
            io_deadline: self.io_deadline,
        })
    }
}
