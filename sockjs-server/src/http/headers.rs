//! The four header-policy helpers every static and dynamic handler composes
//! from: CORS, cookie echo, long-lived caching, and no-caching.

use axum::http::{HeaderMap, HeaderValue};
use chrono::Utc;

const JSESSIONID_COOKIE: &str = "JSESSIONID=dummy; Path=/";
const ONE_YEAR: chrono::Duration = chrono::Duration::days(365);

pub fn enable_cors(headers: &mut HeaderMap, origin: Option<&str>) {
    let origin = origin.unwrap_or("*");
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert("Access-Control-Allow-Origin", value);
    }
    headers.insert(
        "Access-Control-Allow-Credentials",
        HeaderValue::from_static("true"),
    );
}

/// Echoes the incoming `Cookie` header back verbatim, or sets the default
/// dummy `JSESSIONID` SockJS clients expect when none was sent.
pub fn enable_cookie(headers: &mut HeaderMap, incoming_cookie: Option<&str>) {
    let value = incoming_cookie.unwrap_or(JSESSIONID_COOKIE);
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert("Set-Cookie", value);
    }
}

pub fn enable_caching(headers: &mut HeaderMap) {
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("max-age=31536000, public"),
    );
    let expires = (Utc::now() + ONE_YEAR).format("%a, %d %b %Y %H:%M:%S GMT").to_string();
    headers.insert(
        "Expires",
        HeaderValue::from_str(&expires).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert(
        "access-control-max-age",
        HeaderValue::from_static("31536000"),
    );
}

pub fn enable_nocache(headers: &mut HeaderMap) {
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enable_cors_defaults_to_wildcard_origin() {
        let mut headers = HeaderMap::new();
        enable_cors(&mut headers, None);
        assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
        assert_eq!(
            headers.get("Access-Control-Allow-Credentials").unwrap(),
            "true"
        );
    }

    #[test]
    fn enable_cors_echoes_given_origin() {
        let mut headers = HeaderMap::new();
        enable_cors(&mut headers, Some("https://example.com"));
        assert_eq!(
            headers.get("Access-Control-Allow-Origin").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn enable_cookie_sets_dummy_jsessionid_when_absent() {
        let mut headers = HeaderMap::new();
        enable_cookie(&mut headers, None);
        assert_eq!(
            headers.get("Set-Cookie").unwrap(),
            "JSESSIONID=dummy; Path=/"
        );
    }

    #[test]
    fn enable_cookie_echoes_incoming_cookie() {
        let mut headers = HeaderMap::new();
        enable_cookie(&mut headers, Some("JSESSIONID=abc123"));
        assert_eq!(headers.get("Set-Cookie").unwrap(), "JSESSIONID=abc123");
    }

    #[test]
    fn enable_nocache_sets_the_full_directive_set() {
        let mut headers = HeaderMap::new();
        enable_nocache(&mut headers);
        assert_eq!(
            headers.get("Cache-Control").unwrap(),
            "no-store, no-cache, must-revalidate, max-age=0"
        );
    }

    #[test]
    fn enable_caching_sets_one_year_headers() {
        let mut headers = HeaderMap::new();
        enable_caching(&mut headers);
        assert_eq!(
            headers.get("Cache-Control").unwrap(),
            "max-age=31536000, public"
        );
        assert_eq!(headers.get("access-control-max-age").unwrap(), "31536000");
        assert!(headers.get("Expires").is_some());
    }
}
