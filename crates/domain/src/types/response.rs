//! Raw transport responses

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

/// One (status, headers, body) tuple as returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl RawResponse {
    /// Empty response with `status`.
    pub fn new(status: u16) -> Self {
        Self { status, headers: BTreeMap::new(), body: Vec::new() }
    }

    /// Add a header. Names are stored lowercase; repeated names are joined
    /// with `", "` the way HTTP folds list-valued headers.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref().to_ascii_lowercase();
        let value = value.as_ref();
        self.headers
            .entry(name)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Headers, keyed by lowercase name.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Consume the response, keeping only the body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// `true` for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `Retry-After` expressed in delta-seconds. HTTP-date values are not
    /// interpreted.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")?.trim().parse::<u64>().ok().map(Duration::from_secs)
    }

    /// Short excerpt of the body for error messages and logs.
    pub fn body_excerpt(&self, max_chars: usize) -> String {
        let text = self.text();
        if text.chars().count() <= max_chars {
            text.into_owned()
        } else {
            let mut excerpt: String = text.chars().take(max_chars).collect();
            excerpt.push('…');
            excerpt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive_and_folded() {
        let response = RawResponse::new(200)
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2")
            .with_header("Content-Type", "text/plain");

        assert_eq!(response.header("SET-COOKIE"), Some("a=1, b=2"));
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert!(response.is_success());
    }

    #[test]
    fn retry_after_parses_delta_seconds_only() {
        let seconds = RawResponse::new(429).with_header("Retry-After", " 120 ");
        assert_eq!(seconds.retry_after(), Some(Duration::from_secs(120)));

        let date = RawResponse::new(429).with_header("Retry-After", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(date.retry_after(), None);
        assert_eq!(RawResponse::new(429).retry_after(), None);
    }

    #[test]
    fn body_excerpt_truncates_on_char_boundaries() {
        let response = RawResponse::new(500).with_body("héllo wörld".as_bytes().to_vec());
        assert_eq!(response.body_excerpt(5), "héllo…");
        assert_eq!(response.body_excerpt(100), "héllo wörld");
    }

    #[test]
    fn non_2xx_is_not_success() {
        assert!(!RawResponse::new(199).is_success());
        assert!(!RawResponse::new(301).is_success());
        assert!(RawResponse::new(204).is_success());
    }
}
