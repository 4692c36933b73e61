//! Request descriptors and the builder that derives them from parameter values

use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

use crate::app::Config;
use crate::error::FuzzError;
use crate::fuzzer::{ParamCategory, ParameterSet};

/// Cookie attached to a fuzz request, scoped to the target host and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Immutable snapshot of one outbound request
#[derive(Debug, Clone)]
pub struct FuzzRequest {
    /// Position in enumeration order; the baseline request is 0
    pub seq: u64,

    /// HTTP method
    pub method: String,

    /// Absolute target URL, query string included
    pub url: Url,

    /// Request headers, ordered by name
    pub headers: Vec<(String, String)>,

    /// Request cookies, ordered by name
    pub cookies: Vec<Cookie>,
}

impl FuzzRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Value of the `Cookie` request header, if any cookies are set
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        Some(pairs.join("; "))
    }
}

/// Turns parameter sets into request descriptors for one target
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    scheme: &'static str,
    host: String,
    authority: String,
    path: String,
}

impl RequestTemplate {
    pub fn new(scheme: &'static str, host: &str, authority: &str, path: &str) -> Self {
        Self {
            scheme,
            host: host.to_string(),
            authority: authority.to_string(),
            path: path.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.scheme(), &config.host, &config.authority(), &config.path)
    }

    /// Build a GET request from the current parameter values.
    ///
    /// Path parameters replace `{name}` placeholders in the path template,
    /// URL parameters become the query string, header and cookie parameters
    /// are attached as-is.
    pub fn build(&self, params: &ParameterSet, seq: u64) -> Result<FuzzRequest, FuzzError> {
        let mut path = self.path.clone();
        for (name, value) in params.iter(ParamCategory::Path) {
            path = path.replace(&format!("{{{}}}", name), &urlencoding::encode(value));
        }

        let raw = format!("{}://{}{}", self.scheme, self.authority, path);
        let mut url = Url::parse(&raw).map_err(|e| FuzzError::MalformedTarget {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(FuzzError::MalformedTarget {
                url: raw,
                reason: "not an absolute URL".into(),
            });
        }

        let mut query = params.iter(ParamCategory::Url).peekable();
        if query.peek().is_some() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut headers = Vec::new();
        for (name, value) in params.iter(ParamCategory::Header) {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| FuzzError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            HeaderValue::from_str(value).map_err(|e| FuzzError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            headers.push((name.to_string(), value.to_string()));
        }

        let mut cookies = Vec::new();
        for (name, value) in params.iter(ParamCategory::Cookie) {
            if !is_cookie_token(name) {
                return Err(FuzzError::InvalidCookie {
                    name: name.to_string(),
                    reason: "name must be a non-empty RFC 6265 token".into(),
                });
            }
            cookies.push(Cookie {
                name: name.to_string(),
                value: sanitize_cookie_value(value),
                domain: self.host.clone(),
                path: url.path().to_string(),
            });
        }

        Ok(FuzzRequest {
            seq,
            method: "GET".to_string(),
            url,
            headers,
            cookies,
        })
    }
}

/// Visible ASCII other than the RFC 2616 separators
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}

/// Drop characters outside RFC 6265 `cookie-octet`, quoting the result when
/// it contains a space or comma.
///
/// A `;` can never reach the header, so one cookie parameter always stays
/// one cookie.
fn sanitize_cookie_value(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|&c| (' '..='~').contains(&c) && !matches!(c, '"' | ';' | '\\'))
        .collect();
    if kept.contains(' ') || kept.contains(',') {
        format!("\"{}\"", kept)
    } else {
        kept
    }
}
