use std::collections::HashMap;

use crate::configuration::Configuration;
use crate::endpoints::{
    CONTENT_TYPE_FORM, CONTENT_TYPE_JSON, CONTENT_TYPE_XML, HEADER_ACCEPT, HEADER_AUTHORIZATION,
    HEADER_CONTENT_TYPE, HEADER_COOKIE,
};

/// Fluent builder for request headers
#[derive(Debug, Default, Clone)]
pub struct HeaderManager {
    headers: HashMap<String, String>,
}

impl HeaderManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        log::debug!("Added header: {}", name);
        self.headers.insert(name, value.into());
        self
    }

    pub fn add_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.headers.insert(name.into(), value.into());
        }
        self
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove(name);
        log::debug!("Removed header: {}", name);
        self
    }

    pub fn clear_headers(&mut self) -> &mut Self {
        self.headers.clear();
        self
    }

    pub fn add_content_type_json(&mut self) -> &mut Self {
        self.add_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
    }

    pub fn add_content_type_xml(&mut self) -> &mut Self {
        self.add_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_XML)
    }

    pub fn add_content_type_form(&mut self) -> &mut Self {
        self.add_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_FORM)
    }

    pub fn add_accept_json(&mut self) -> &mut Self {
        self.add_header(HEADER_ACCEPT, CONTENT_TYPE_JSON)
    }

    pub fn add_accept_xml(&mut self) -> &mut Self {
        self.add_header(HEADER_ACCEPT, CONTENT_TYPE_XML)
    }

    /// Add the headers configured under `common_headers`
    pub fn add_common_headers(&mut self, config: &Configuration) -> &mut Self {
        for (name, value) in config.common_headers.pairs() {
            log::debug!("Added common header from config: {}", name);
            self.headers.insert(name, value);
        }
        self
    }

    /// Set `Authorization`, prefixing `Bearer ` unless the token already carries a scheme.
    ///
    /// An empty token leaves the headers untouched.
    pub fn add_authorization_header(&mut self, token: &str) -> &mut Self {
        if token.is_empty() {
            log::warn!("Attempted to add empty authorization token");
            return self;
        }

        let value = if token.starts_with("Bearer ") || token.starts_with("Basic ") {
            token.to_string()
        } else {
            format!("Bearer {}", token)
        };
        self.headers.insert(HEADER_AUTHORIZATION.to_string(), value);
        log::debug!("Added Authorization header");
        self
    }

    /// Append `name=value` to the `Cookie` header, whatever case it was added under
    pub fn add_cookie(&mut self, name: &str, value: &str) -> &mut Self {
        let cookie = format!("{}={}", name, value);
        match self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(HEADER_COOKIE))
        {
            Some((_, existing)) => {
                existing.push_str("; ");
                existing.push_str(&cookie);
            }
            None => {
                self.headers.insert(HEADER_COOKIE.to_string(), cookie);
            }
        }
        self
    }

    /// Copy of the current headers
    pub fn headers(&self) -> HashMap<String, String> {
        self.headers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::CommonHeaders;

    #[test]
    fn test_bearer_prefix_rules() {
        let mut manager = HeaderManager::new();

        manager.add_authorization_header("abc");
        assert_eq!(manager.headers()["Authorization"], "Bearer abc");

        manager.add_authorization_header("Bearer xyz");
        assert_eq!(manager.headers()["Authorization"], "Bearer xyz");

        manager.add_authorization_header("Basic dXNlcjpwYXNz");
        assert_eq!(manager.headers()["Authorization"], "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let mut manager = HeaderManager::new();
        manager.add_authorization_header("");
        assert!(manager.headers().is_empty());
    }

    #[test]
    fn test_fluent_chain_and_removal() {
        let mut manager = HeaderManager::new();
        manager
            .add_content_type_json()
            .add_accept_xml()
            .add_header("X-Trace", "1")
            .remove_header("X-Trace");

        let headers = manager.headers();
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(headers["Accept"], "application/xml");
        assert!(!headers.contains_key("X-Trace"));

        manager.clear_headers();
        assert!(manager.headers().is_empty());
    }

    #[test]
    fn test_common_headers_from_inline_config() {
        let config = Configuration {
            common_headers: CommonHeaders::Inline("X-Env = qa; X-Team=payments ;broken".to_string()),
            ..Configuration::default()
        };

        let mut manager = HeaderManager::new();
        manager.add_common_headers(&config);

        let headers = manager.headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Env"], "qa");
        assert_eq!(headers["X-Team"], "payments");
    }

    #[test]
    fn test_cookies_accumulate() {
        let mut manager = HeaderManager::new();
        manager.add_cookie("token", "abc").add_cookie("session", "42");
        assert_eq!(manager.headers()["Cookie"], "token=abc; session=42");
    }

    #[test]
    fn test_cookie_joins_header_added_in_lower_case() {
        let mut manager = HeaderManager::new();
        manager.add_header("cookie", "session=1").add_cookie("token", "abc");

        let headers = manager.headers();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["cookie"], "session=1; token=abc");
    }

    #[test]
    fn test_headers_returns_a_copy() {
        let mut manager = HeaderManager::new();
        manager.add_accept_json();

        let mut copy = manager.headers();
        copy.insert("X-Other".to_string(), "1".to_string());
        assert_eq!(manager.headers().len(), 1);
    }
}
