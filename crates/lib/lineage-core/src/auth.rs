//! Per-request credential classification for the HTTP transport.
//!
//! Every request that passes the gate carries exactly one [`AuthContext`].
//! Bearer credentials are inspected before Basic so that a server running in
//! API-token mode can refuse Basic without decoding it.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Realm advertised in `WWW-Authenticate` challenges.
pub const AUTH_REALM: &str = "MicroStrategy Lineage MCP";

/// Credentials attached to a request after authentication.
///
/// Handlers read this to pick the identity used against the query engine.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    /// No per-request credentials. Used by the stdio transport.
    #[default]
    None,
    /// Caller-supplied database credentials.
    BasicCredentials { user: String, pass: String },
    /// Opaque token forwarded to the database (single-sign-on passthrough).
    BearerToken { token: String },
    /// The caller presented the server's static API token.
    ApiTokenAuthenticated,
}

impl AuthContext {
    /// Short label for logs. Never includes secrets.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BasicCredentials { .. } => "basic",
            Self::BearerToken { .. } => "bearer",
            Self::ApiTokenAuthenticated => "api_token",
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::BasicCredentials { user, .. } => f
                .debug_struct("BasicCredentials")
                .field("user", user)
                .field("pass", &"<redacted>")
                .finish(),
            Self::BearerToken { .. } => f
                .debug_struct("BearerToken")
                .field("token", &"<redacted>")
                .finish(),
            Self::ApiTokenAuthenticated => f.write_str("ApiTokenAuthenticated"),
        }
    }
}

/// Authentication scheme named in a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Basic,
    Bearer,
}

impl Scheme {
    #[must_use]
    pub fn challenge(self) -> String {
        let name = match self {
            Self::Basic => "Basic",
            Self::Bearer => "Bearer",
        };
        format!("{name} realm=\"{AUTH_REALM}\"")
    }
}

/// Reasons a request is rejected before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No usable Basic or Bearer credentials were sent.
    #[error("Basic or Bearer authentication required")]
    MissingCredentials,
    /// A credential was sent but is empty.
    #[error("{}", empty_message(.0))]
    EmptyCredentials(Scheme),
    /// The bearer token does not match the configured API token.
    #[error("Invalid API token")]
    InvalidApiToken,
    /// The server is in API-token mode and the request did not use Bearer.
    #[error("Bearer token required")]
    SchemeNotAllowed,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn empty_message(scheme: &Scheme) -> &'static str {
    match scheme {
        Scheme::Basic => "Username and password cannot be empty",
        Scheme::Bearer => "Bearer token is empty",
    }
}

impl AuthError {
    /// Schemes to advertise in `WWW-Authenticate`, in header order.
    #[must_use]
    pub const fn challenges(self) -> &'static [Scheme] {
        match self {
            Self::MissingCredentials => &[Scheme::Basic, Scheme::Bearer],
            Self::EmptyCredentials(Scheme::Basic) => &[Scheme::Basic],
            Self::EmptyCredentials(Scheme::Bearer)
            | Self::InvalidApiToken
            | Self::SchemeNotAllowed => &[Scheme::Bearer],
        }
    }
}

/// Classifies the `Authorization` header of a request.
///
/// `api_token` is the server's static token, if one is configured.
///
/// # Errors
/// Returns `AuthError` when the request must be rejected with a 401.
pub fn authenticate(
    authorization: Option<&str>,
    api_token: Option<&str>,
) -> Result<AuthContext, AuthError> {
    if let Some(token) = authorization.and_then(bearer_token) {
        if token.is_empty() {
            return Err(AuthError::EmptyCredentials(Scheme::Bearer));
        }
        return match api_token {
            Some(expected) if tokens_match(token, expected) => {
                Ok(AuthContext::ApiTokenAuthenticated)
            }
            Some(_) => Err(AuthError::InvalidApiToken),
            None => Ok(AuthContext::BearerToken {
                token: token.to_string(),
            }),
        };
    }

    if api_token.is_some() {
        return Err(AuthError::SchemeNotAllowed);
    }

    let (user, pass) = authorization
        .and_then(basic_credentials)
        .ok_or(AuthError::MissingCredentials)?;
    if user.is_empty() || pass.is_empty() {
        return Err(AuthError::EmptyCredentials(Scheme::Basic));
    }
    Ok(AuthContext::BasicCredentials { user, pass })
}

/// Constant-time comparison of a presented token against the configured one.
#[must_use]
pub fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn split_scheme(header: &str) -> (&str, &str) {
    let header = header.trim_start();
    header
        .split_once(char::is_whitespace)
        .unwrap_or((header, ""))
}

/// Returns the trimmed token when the header uses the Bearer scheme.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = split_scheme(header);
    scheme.eq_ignore_ascii_case("bearer").then(|| rest.trim())
}

fn basic_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, rest) = split_scheme(header);
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(rest.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(user_pass))
    }

    #[test]
    fn empty_bearer_is_rejected_in_every_mode() {
        for api_token in [None, Some("T")] {
            for header in ["Bearer ", "Bearer", "Bearer    "] {
                assert_eq!(
                    authenticate(Some(header), api_token),
                    Err(AuthError::EmptyCredentials(Scheme::Bearer)),
                    "header {header:?} with api token {api_token:?}"
                );
            }
        }
    }

    #[test]
    fn matching_api_token_is_accepted() {
        assert_eq!(
            authenticate(Some("Bearer T"), Some("T")),
            Ok(AuthContext::ApiTokenAuthenticated)
        );
        assert_eq!(
            authenticate(Some("bearer   T  "), Some("T")),
            Ok(AuthContext::ApiTokenAuthenticated)
        );
    }

    #[test]
    fn mismatched_api_token_is_rejected() {
        assert_eq!(
            authenticate(Some("Bearer T2"), Some("T")),
            Err(AuthError::InvalidApiToken)
        );
        assert_eq!(
            authenticate(Some("Bearer t"), Some("T")),
            Err(AuthError::InvalidApiToken)
        );
    }

    #[test]
    fn api_token_mode_refuses_basic_and_missing_headers() {
        let header = basic("alice:secret");
        assert_eq!(
            authenticate(Some(header.as_str()), Some("T")),
            Err(AuthError::SchemeNotAllowed)
        );
        assert_eq!(authenticate(None, Some("T")), Err(AuthError::SchemeNotAllowed));
    }

    #[test]
    fn bearer_passes_through_without_api_token() {
        assert_eq!(
            authenticate(Some("Bearer sso-token"), None),
            Ok(AuthContext::BearerToken {
                token: "sso-token".to_string()
            })
        );
    }

    #[test]
    fn basic_credentials_are_accepted() {
        let header = basic("alice:s3cr:et");
        assert_eq!(
            authenticate(Some(header.as_str()), None),
            Ok(AuthContext::BasicCredentials {
                user: "alice".to_string(),
                pass: "s3cr:et".to_string(),
            })
        );
    }

    #[test]
    fn empty_basic_fields_are_rejected() {
        for user_pass in [":pass", "user:", ":"] {
            let header = basic(user_pass);
            assert_eq!(
                authenticate(Some(header.as_str()), None),
                Err(AuthError::EmptyCredentials(Scheme::Basic)),
                "credentials {user_pass:?}"
            );
        }
    }

    #[test]
    fn missing_or_malformed_credentials_are_rejected() {
        assert_eq!(authenticate(None, None), Err(AuthError::MissingCredentials));
        assert_eq!(
            authenticate(Some("Basic !!!not-base64"), None),
            Err(AuthError::MissingCredentials)
        );
        let no_colon = format!("Basic {}", STANDARD.encode("alice"));
        assert_eq!(
            authenticate(Some(no_colon.as_str()), None),
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            authenticate(Some("Digest abc"), None),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn challenges_name_the_accepted_schemes() {
        assert_eq!(
            AuthError::MissingCredentials.challenges(),
            &[Scheme::Basic, Scheme::Bearer]
        );
        assert_eq!(
            AuthError::EmptyCredentials(Scheme::Basic).challenges(),
            &[Scheme::Basic]
        );
        assert_eq!(AuthError::SchemeNotAllowed.challenges(), &[Scheme::Bearer]);
        assert_eq!(
            Scheme::Bearer.challenge(),
            "Bearer realm=\"MicroStrategy Lineage MCP\""
        );
    }

    #[test]
    fn rejection_messages_match_the_scheme() {
        assert_eq!(
            AuthError::EmptyCredentials(Scheme::Bearer).to_string(),
            "Bearer token is empty"
        );
        assert_eq!(
            AuthError::EmptyCredentials(Scheme::Basic).to_string(),
            "Username and password cannot be empty"
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let basic = AuthContext::BasicCredentials {
            user: "alice".to_string(),
            pass: "hunter2".to_string(),
        };
        let bearer = AuthContext::BearerToken {
            token: "sso-token".to_string(),
        };
        assert!(!format!("{basic:?}").contains("hunter2"));
        assert!(!format!("{bearer:?}").contains("sso-token"));
        assert_eq!(bearer.mode(), "bearer");
    }

    #[test]
    fn token_comparison_is_exact() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("", "abc"));
    }
}
