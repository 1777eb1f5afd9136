//! The narrow views of HTTP messages that session persistence needs
//!
//! Implemented for the plain `http` crate types and for salvo's own request
//! and response, so the persistence core works with either.

use http::header::{HeaderName, HeaderValue, COOKIE, SET_COOKIE};
use http::HeaderMap;
use salvo_core::http::cookie::Cookie;
use std::collections::HashMap;

use crate::error::SessionError;

/// Read access to the cookies of an inbound request
pub trait SessionRequest {
    /// The raw `Cookie` header line, if the request carries one
    fn cookie_header(&self) -> Option<String>;

    /// A cookie value from cookies the transport has already parsed
    fn cookie_param(&self, name: &str) -> Option<String>;
}

/// Header and cookie updates on an outbound response
///
/// Updates consume the response and hand back the updated value.
pub trait SessionResponse: Sized {
    fn has_header(&self, name: &str) -> bool;

    /// Set a header, replacing any previous value
    fn with_header(self, name: &str, value: &str) -> Result<Self, SessionError>;

    /// Set a cookie, replacing any previous cookie of the same name
    fn with_cookie(self, cookie: Cookie<'static>) -> Result<Self, SessionError>;
}

/// Cookies already parsed by the transport, for requests that arrive without
/// a raw `Cookie` header. Attach as an extension of an [`http::Request`].
#[derive(Debug, Clone, Default)]
pub struct CookieParams(pub HashMap<String, String>);

/// Find the value of cookie `name` in a raw `Cookie` header line
pub fn cookie_from_header(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| {
            let value = cookie.value();
            match urlencoding::decode(value) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => value.to_string(),
            }
        })
}

/// Resolve the session cookie: the raw header wins when present, otherwise the
/// pre-parsed cookies are consulted.
pub fn session_cookie_value<R: SessionRequest + ?Sized>(req: &R, name: &str) -> Option<String> {
    match req.cookie_header().filter(|h| !h.is_empty()) {
        Some(header) => cookie_from_header(&header, name),
        None => req.cookie_param(name),
    }
}

fn joined_cookie_header(headers: &HeaderMap) -> Option<String> {
    let lines: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("; "))
    }
}

fn header_name(name: &str) -> Result<HeaderName, SessionError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| SessionError::InvalidHeader(e.to_string()))
}

impl<B> SessionRequest for http::Request<B> {
    fn cookie_header(&self) -> Option<String> {
        joined_cookie_header(self.headers())
    }

    fn cookie_param(&self, name: &str) -> Option<String> {
        self.extensions()
            .get::<CookieParams>()
            .and_then(|params| params.0.get(name).cloned())
    }
}

impl<B> SessionResponse for http::Response<B> {
    fn has_header(&self, name: &str) -> bool {
        self.headers().contains_key(name)
    }

    fn with_header(mut self, name: &str, value: &str) -> Result<Self, SessionError> {
        let name = header_name(name)?;
        self.headers_mut().insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    fn with_cookie(mut self, cookie: Cookie<'static>) -> Result<Self, SessionError> {
        let value = HeaderValue::from_str(&cookie.to_string())?;
        let headers = self.headers_mut();

        let kept: Vec<HeaderValue> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter(|v| {
                v.to_str()
                    .ok()
                    .and_then(|s| Cookie::parse(s).ok())
                    .map_or(true, |existing| existing.name() != cookie.name())
            })
            .cloned()
            .collect();

        headers.remove(SET_COOKIE);
        for v in kept {
            headers.append(SET_COOKIE, v);
        }
        headers.append(SET_COOKIE, value);
        Ok(self)
    }
}

impl SessionRequest for salvo_core::Request {
    fn cookie_header(&self) -> Option<String> {
        joined_cookie_header(self.headers())
    }

    fn cookie_param(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| c.value().to_string())
    }
}

impl<'a> SessionResponse for &'a mut salvo_core::Response {
    fn has_header(&self, name: &str) -> bool {
        self.headers().contains_key(name)
    }

    fn with_header(self, name: &str, value: &str) -> Result<Self, SessionError> {
        let name = header_name(name)?;
        self.headers_mut().insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    fn with_cookie(self, cookie: Cookie<'static>) -> Result<Self, SessionError> {
        // The jar keys cookies by name, so this replaces earlier values
        self.add_cookie(cookie);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_from_header() {
        let header = "foo=bar; sess=abc%20def; other=1";
        assert_eq!(cookie_from_header(header, "sess"), Some("abc def".to_string()));
        assert_eq!(cookie_from_header(header, "missing"), None);
        assert_eq!(cookie_from_header("", "sess"), None);
    }

    #[test]
    fn test_header_takes_precedence_over_params() {
        let mut params = CookieParams::default();
        params.0.insert("sess".to_string(), "from-params".to_string());

        let req = http::Request::builder()
            .header("Cookie", "sess=from-header")
            .extension(params.clone())
            .body(())
            .unwrap();
        assert_eq!(session_cookie_value(&req, "sess"), Some("from-header".to_string()));

        // Header present without our cookie: params are not consulted
        let req = http::Request::builder()
            .header("Cookie", "other=1")
            .extension(params.clone())
            .body(())
            .unwrap();
        assert_eq!(session_cookie_value(&req, "sess"), None);

        let req = http::Request::builder().extension(params).body(()).unwrap();
        assert_eq!(session_cookie_value(&req, "sess"), Some("from-params".to_string()));
    }

    #[test]
    fn test_repeated_cookie_headers_are_joined() {
        let req = http::Request::builder()
            .header("Cookie", "a=1")
            .header("Cookie", "sess=xyz")
            .body(())
            .unwrap();
        assert_eq!(session_cookie_value(&req, "sess"), Some("xyz".to_string()));
    }

    #[test]
    fn test_with_cookie_replaces_same_name() {
        let res = http::Response::builder()
            .header("Set-Cookie", "sess=old; Path=/")
            .header("Set-Cookie", "theme=dark")
            .body(())
            .unwrap();

        let res = res.with_cookie(Cookie::new("sess", "new")).unwrap();
        let values: Vec<&str> = res
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["theme=dark", "sess=new"]);
    }

    #[test]
    fn test_with_header_replaces() {
        let res = http::Response::builder()
            .header("Pragma", "public")
            .body(())
            .unwrap();
        let res = res.with_header("Pragma", "no-cache").unwrap();
        assert!(res.has_header("pragma"));
        assert_eq!(res.headers().get_all("pragma").iter().count(), 1);
        assert_eq!(res.headers()["pragma"], "no-cache");
    }
}
