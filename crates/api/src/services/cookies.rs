//! Cookie helpers.
//!
//! Reads the `Cookie` request header into an ordered list that rules can
//! modify, and builds `Set-Cookie` values for responses.

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

/// Cookies sent with a request, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    pairs: Vec<(String, String)>,
}

impl RequestCookies {
    /// Parse every `Cookie` header of a request.
    ///
    /// HTTP/2 clients may split cookies over several header fields, so all
    /// of them are read.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookie_header| cookie_header.split(';'))
            .filter_map(|cookie| {
                let (name, value) = cookie.trim().split_once('=')?;
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), value.to_string()))
                }
            })
            .collect();

        Self { pairs }
    }

    /// Value of the first cookie with this name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a cookie, replacing an existing one with the same name.
    pub fn set(&mut self, name: &str, value: &str) {
        match self.pairs.iter_mut().find(|(n, _)| n == name) {
            Some(pair) => pair.1 = value.to_string(),
            None => self.pairs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as a single `Cookie` header value.
    pub fn to_header_value(&self) -> Option<HeaderValue> {
        if self.pairs.is_empty() {
            return None;
        }

        let rendered = self
            .pairs
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&rendered).ok()
    }

    /// Replace the `Cookie` headers of `headers` with these cookies.
    pub fn write_to(&self, headers: &mut HeaderMap) {
        headers.remove(COOKIE);
        if let Some(value) = self.to_header_value() {
            headers.insert(COOKIE, value);
        }
    }
}

/// Build a `Set-Cookie` value scoped to the whole site.
pub fn build_cookie(name: &str, value: &str, max_age_secs: Option<i64>) -> String {
    let mut cookie = format!("{}={}; Path=/", name, value);

    if let Some(max_age) = max_age_secs {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }

    cookie.push_str("; HttpOnly; SameSite=Lax");
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_parse_single_header() {
        let cookies = RequestCookies::from_headers(&headers_with(&["a=1; b=two"]));
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("b"), Some("two"));
        assert_eq!(cookies.get("c"), None);
    }

    #[test]
    fn test_parse_split_headers() {
        let cookies = RequestCookies::from_headers(&headers_with(&["a=1", "b=2"]));
        assert_eq!(cookies.get("b"), Some("2"));
    }

    #[test]
    fn test_parse_skips_malformed_pairs() {
        let cookies = RequestCookies::from_headers(&headers_with(&["garbage; =x; ok=yes"]));
        assert_eq!(cookies.get("ok"), Some("yes"));
        assert_eq!(cookies.to_header_value().unwrap(), "ok=yes");
    }

    #[test]
    fn test_set_replaces_existing() {
        let mut cookies = RequestCookies::from_headers(&headers_with(&["a=1; b=2"]));
        cookies.set("a", "9");
        cookies.set("c", "3");
        assert_eq!(cookies.to_header_value().unwrap(), "a=9; b=2; c=3");
    }

    #[test]
    fn test_write_to_replaces_header() {
        let mut headers = headers_with(&["a=1", "b=2"]);
        let mut cookies = RequestCookies::from_headers(&headers);
        cookies.set("new-booker-enabled", "1");
        cookies.write_to(&mut headers);

        assert_eq!(headers.get_all(COOKIE).iter().count(), 1);
        assert_eq!(
            headers.get(COOKIE).unwrap(),
            "a=1; b=2; new-booker-enabled=1"
        );
    }

    #[test]
    fn test_empty_jar_has_no_header() {
        let cookies = RequestCookies::default();
        assert!(cookies.is_empty());
        assert!(cookies.to_header_value().is_none());
    }

    #[test]
    fn test_build_cookie() {
        assert_eq!(
            build_cookie("__clnds", "abc", None),
            "__clnds=abc; Path=/; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            build_cookie("__clnds", "abc", Some(60)),
            "__clnds=abc; Path=/; Max-Age=60; HttpOnly; SameSite=Lax"
        );
    }
}
