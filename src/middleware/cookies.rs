use axum::http::{header, HeaderMap, HeaderValue};

pub const ACCESS_COOKIE: &str = "prada_token";
pub const REFRESH_COOKIE: &str = "prada_refresh";

/// `Set-Cookie` value for an HttpOnly, SameSite=Lax session cookie
pub fn session_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        name, value, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expire a cookie immediately
pub fn cleared_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

/// Append `Set-Cookie` headers, skipping values that are not valid header text
pub fn append_cookies(headers: &mut HeaderMap, cookies: impl IntoIterator<Item = String>) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Refusing to send malformed cookie: {}", e),
        }
    }
}

/// Value of the named cookie from the request `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        assert_eq!(
            session_cookie(ACCESS_COOKIE, "abc", 3600, false),
            "prada_token=abc; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
        );
        assert!(session_cookie(REFRESH_COOKIE, "abc", 60, true).ends_with("; Secure"));
        assert!(cleared_cookie(ACCESS_COOKIE, false).contains("Max-Age=0"));
    }

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; prada_token=tok.en.value; prada_refresh="),
        );
        assert_eq!(read_cookie(&headers, ACCESS_COOKIE).as_deref(), Some("tok.en.value"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), None);
        assert_eq!(read_cookie(&headers, "missing"), None);
    }
}
