// auth/cookie.rs - session cookie formatting and parsing
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Utc};

pub const SESSION_COOKIE: &str = "JWT";

/// `Set-Cookie` value carrying a session token until `expiry`.
pub fn session_cookie(token: &str, expiry: DateTime<Utc>, domain: Option<&str>) -> String {
    let max_age = (expiry - Utc::now()).num_seconds().max(0);
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Strict; Path=/{}; Expires={}; Max-Age={}",
        SESSION_COOKIE,
        token,
        domain_attr(domain),
        http_date(expiry),
        max_age
    )
}

/// Overwrites the session cookie with an already expired one.
pub fn cleared_cookie(domain: Option<&str>) -> String {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Strict; Path=/{}; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0",
        SESSION_COOKIE,
        domain_attr(domain)
    )
}

pub fn set_cookie_header(value: &str) -> Option<(header::HeaderName, HeaderValue)> {
    HeaderValue::from_str(value).ok().map(|v| (header::SET_COOKIE, v))
}

/// Finds the session token among all `Cookie` headers of a request.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty())
}

fn domain_attr(domain: Option<&str>) -> String {
    match domain {
        Some(d) if !d.is_empty() => format!("; Domain={}", d),
        _ => String::new(),
    }
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_session_cookie_attributes() {
        let expiry = Utc::now() + Duration::days(7);
        let cookie = session_cookie("abc", expiry, Some("example.com"));
        assert!(cookie.starts_with("JWT=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Domain=example.com"));
        assert!(cookie.contains(&format!("Expires={}", http_date(expiry))));
    }

    #[test]
    fn test_cleared_cookie_is_expired() {
        let cookie = cleared_cookie(None);
        assert!(cookie.starts_with("JWT=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Domain="));
    }

    #[test]
    fn test_http_date_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(http_date(at), "Tue, 05 Mar 2024 07:08:09 GMT");
    }

    #[test]
    fn test_token_found_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("lang=zh; JWT=tok.en.value"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok.en.value"));
    }

    #[test]
    fn test_similar_cookie_names_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("JWTX=nope; JWT="));
        assert_eq!(session_token(&headers), None);
    }
}
