use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Client;

use timegrid_core::{CsrfToken, TOKEN_HEADER};

use crate::config::Config;
use crate::error::AutosaveError;

/// Whether a response status counts as a successful write
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Posts form-encoded fields to the persistence endpoint
#[async_trait]
pub trait SaveTransport: Send + Sync {
    /// Send one POST and return the response status code.
    ///
    /// Only transport failures are errors; any status comes back as `Ok`.
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<u16, AutosaveError>;
}

/// HTTP transport backed by reqwest
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client that sends the token header and session cookie on every request
    pub fn new(config: &Config, token: &CsrfToken) -> Result<Self, AutosaveError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        headers.insert(
            HeaderName::from_bytes(TOKEN_HEADER.as_bytes())
                .map_err(|e| AutosaveError::Config(e.to_string()))?,
            header_value(token.as_str(), "token")?,
        );
        if let Some(cookie) = &config.cookie {
            headers.insert(COOKIE, header_value(cookie, "cookie")?);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { client })
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, AutosaveError> {
    HeaderValue::from_str(value)
        .map_err(|_| AutosaveError::Config(format!("{} is not a valid header value", what)))
}

#[async_trait]
impl SaveTransport for HttpTransport {
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<u16, AutosaveError> {
        let response = self.client.post(url).form(fields).send().await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert!(is_success_status(200));
        assert!(is_success_status(204));
        assert!(!is_success_status(302));
        assert!(!is_success_status(403));
        assert!(!is_success_status(500));
    }

    #[test]
    fn test_rejects_invalid_cookie_header() {
        let config = Config::from_lookup(|key| match key {
            "TIMEGRID_COOKIE" => Some("bad\nvalue".to_string()),
            _ => None,
        })
        .unwrap();
        let result = HttpTransport::new(&config, &CsrfToken::new("tok"));
        assert!(matches!(result, Err(AutosaveError::Config(_))));
    }
}
