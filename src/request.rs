// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-only snapshot of an inbound request, as seen by rule predicates.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

use crate::errors::RequestError;

/// Request information available when evaluating permission rules.
///
/// Header names are stored lowercased; query parameters and attributes are
/// case-sensitive. Repeated headers and parameters keep every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    method: String,
    path: String,
    headers: BTreeMap<String, Vec<String>>,
    query: BTreeMap<String, Vec<String>>,
    attributes: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Build a context from an origin-form request target such as
    /// `/api/users?page=2`.
    ///
    /// The path is percent-decoded first and then normalized: dot segments
    /// are resolved and empty segments dropped, so `/public/%2e%2e/admin` and
    /// `//admin` are both seen under `/admin`. A trailing slash is kept.
    pub fn from_uri(method: impl Into<String>, uri: &str) -> Result<Self, RequestError> {
        let target = uri.split_once('#').map_or(uri, |(target, _)| target);
        let (raw_path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        if !raw_path.starts_with('/') {
            return Err(RequestError::NotOriginForm(uri.to_string()));
        }

        let decoded = percent_decode_str(raw_path)
            .decode_utf8()
            .map_err(|_| RequestError::InvalidEncoding(uri.to_string()))?;

        let mut context = Self::new(method, normalize_path(&decoded));
        for (name, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            context = context.with_query(name, value);
        }
        Ok(context)
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Attach a collaborator-defined attribute (e.g. resolved database name).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn header_values(&self, name: &str) -> Option<&[String]> {
        self.headers
            .get(name)
            .or_else(|| self.headers.get(&name.to_ascii_lowercase()))
            .map(Vec::as_slice)
    }

    pub fn query_values(&self, name: &str) -> Option<&[String]> {
        self.query.get(name).map(Vec::as_slice)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    let trailing = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    if normalized.is_empty() || trailing {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_uri_splits_path_and_query() {
        let request = RequestContext::from_uri("GET", "/api/users?page=2&tag=a&tag=b%20c")
            .expect("valid uri");
        assert_eq!(request.path(), "/api/users");
        assert_eq!(request.query_values("page"), Some(&["2".to_string()][..]));
        assert_eq!(
            request.query_values("tag"),
            Some(&["a".to_string(), "b c".to_string()][..])
        );
        assert_eq!(request.query_values("missing"), None);
    }

    #[test]
    fn from_uri_resolves_dot_segments() {
        let request = RequestContext::from_uri("GET", "/public/../admin/x").expect("valid uri");
        assert_eq!(request.path(), "/admin/x");
    }

    #[test]
    fn from_uri_decodes_before_normalizing() {
        let request = RequestContext::from_uri("GET", "/%61dmin/secrets").expect("valid uri");
        assert_eq!(request.path(), "/admin/secrets");

        let request = RequestContext::from_uri("GET", "/public/%2e%2e/admin").expect("valid uri");
        assert_eq!(request.path(), "/admin");

        let request = RequestContext::from_uri("GET", "/public/..%2fadmin").expect("valid uri");
        assert_eq!(request.path(), "/admin");
    }

    #[test]
    fn from_uri_never_reads_an_authority() {
        let request = RequestContext::from_uri("GET", "//admin/secrets?x=1").expect("valid uri");
        assert_eq!(request.path(), "/admin/secrets");
        assert_eq!(request.query_values("x"), Some(&["1".to_string()][..]));

        let request = RequestContext::from_uri("GET", "/a//b/./c/").expect("valid uri");
        assert_eq!(request.path(), "/a/b/c/");

        let request = RequestContext::from_uri("GET", "/../..").expect("valid uri");
        assert_eq!(request.path(), "/");
    }

    #[test]
    fn from_uri_rejects_bad_targets() {
        assert_eq!(
            RequestContext::from_uri("GET", "http://evil/admin"),
            Err(RequestError::NotOriginForm("http://evil/admin".to_string()))
        );
        assert!(matches!(
            RequestContext::from_uri("GET", "admin"),
            Err(RequestError::NotOriginForm(_))
        ));
        assert!(matches!(
            RequestContext::from_uri("GET", "/%ff/x"),
            Err(RequestError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn from_uri_drops_the_fragment() {
        let request = RequestContext::from_uri("GET", "/docs?page=1#admin").expect("valid uri");
        assert_eq!(request.path(), "/docs");
        assert_eq!(request.query_values("page"), Some(&["1".to_string()][..]));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let request = RequestContext::new("GET", "/")
            .with_header("Accept", "text/plain")
            .with_header("ACCEPT", "application/json");
        assert_eq!(request.header_values("accept").map(<[String]>::len), Some(2));
        assert_eq!(request.header_values("Accept").map(<[String]>::len), Some(2));
    }
}
