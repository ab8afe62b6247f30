//! Classified failures of the calendar and the booking source.
//!
//! The engine never inspects messages. It acts on the [`ProviderErrorCode`]:
//! retryable codes are retried with backoff, `NotFound` and `Conflict` steer
//! identity recovery, everything else is recorded against the booking or unit.

use std::fmt;
use thiserror::Error;

/// What went wrong, as far as the caller needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials missing, invalid or expired (401).
    AuthenticationFailed,
    /// Valid credentials without access to the calendar or collection (403).
    AuthorizationFailed,
    /// Timeout, refused connection, DNS failure.
    NetworkError,
    /// Throttled: 429, or 403 with a rate-limit reason.
    RateLimited,
    /// 5xx.
    ServerError,
    /// A body that does not decode.
    InvalidResponse,
    /// 404 or 410.
    NotFound,
    /// 409, typically a caller-supplied event id already in use.
    Conflict,
    /// 400.
    BadRequest,
    ConfigurationError,
    InternalError,
}

impl ProviderErrorCode {
    /// Transient failures: throttling, network trouble, server errors.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed call to a calendar provider or source reader.
///
/// Renders as `[provider] code: message`.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Which backend failed, e.g. `google`, `firestore`, `snapshot`.
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

macro_rules! constructors {
    ($($(#[$doc:meta])* $name:ident => $code:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ProviderErrorCode::$code, message)
            }
        )*
    };
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    constructors! {
        authentication => AuthenticationFailed;
        authorization => AuthorizationFailed;
        network => NetworkError;
        rate_limited => RateLimited;
        server => ServerError;
        invalid_response => InvalidResponse;
        not_found => NotFound;
        conflict => Conflict;
        bad_request => BadRequest;
        /// Missing or unusable settings, keys or files.
        configuration => ConfigurationError;
        internal => InternalError;
    }

    /// Builder: tag the backend that failed.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Builder: keep the underlying error for `source()` chains.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// The event or document does not exist (any more).
    pub fn is_not_found(&self) -> bool {
        self.code == ProviderErrorCode::NotFound
    }

    /// The id is already taken.
    pub fn is_conflict(&self) -> bool {
        self.code == ProviderErrorCode::Conflict
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Result alias for provider and source calls.
pub type ProviderResult<T> = Result<T, ProviderError>;
