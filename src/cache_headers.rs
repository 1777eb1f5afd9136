//! HTTP caching headers for session-bearing responses

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::config::CacheLimiter;

/// Distant past date used to expire responses immediately. Taken as-is from
/// the PHP engine for compatibility.
pub const CACHE_PAST_DATE: &str = "Thu, 19 Nov 1981 08:52:00 GMT";

/// `strftime` pattern for HTTP dates, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Headers that, once set by the application, stop session caching headers
/// from being added.
pub const CACHE_HEADER_NAMES: [&str; 4] = ["Expires", "Last-Modified", "Cache-Control", "Pragma"];

/// Format a timestamp as an HTTP date
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Last instant with a four-digit year; far-future expiries saturate here
fn latest_http_date() -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).single()
}

/// The caching header set for one limiter mode. `None` means the header is
/// not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    pub expires: Option<String>,
    pub cache_control: String,
    pub pragma: Option<String>,
    pub last_modified: Option<String>,
}

impl CacheHeaders {
    /// Iterate the headers that are present, as (name, value)
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("Expires", self.expires.as_deref()),
            ("Cache-Control", Some(self.cache_control.as_str())),
            ("Pragma", self.pragma.as_deref()),
            ("Last-Modified", self.last_modified.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
    }
}

/// Build the caching headers for `limiter`.
///
/// `last_modified` is an already formatted HTTP date.
pub fn cache_headers(
    limiter: CacheLimiter,
    now: DateTime<Utc>,
    cache_expire: u64,
    last_modified: &str,
) -> CacheHeaders {
    match limiter {
        CacheLimiter::NoCache => CacheHeaders {
            expires: Some(CACHE_PAST_DATE.to_string()),
            cache_control: "no-store, no-cache, must-revalidate".to_string(),
            pragma: Some("no-cache".to_string()),
            last_modified: None,
        },
        CacheLimiter::Public => {
            let latest = latest_http_date().unwrap_or(now);
            let expires = i64::try_from(cache_expire)
                .ok()
                .and_then(Duration::try_seconds)
                .and_then(|delta| now.checked_add_signed(delta))
                .map_or(latest, |expires| expires.min(latest));
            CacheHeaders {
                expires: Some(http_date(expires)),
                cache_control: format!("public, max-age={}", cache_expire),
                pragma: None,
                last_modified: Some(last_modified.to_string()),
            }
        }
        CacheLimiter::Private => CacheHeaders {
            expires: Some(CACHE_PAST_DATE.to_string()),
            cache_control: format!("private, max-age={}", cache_expire),
            pragma: None,
            last_modified: Some(last_modified.to_string()),
        },
        CacheLimiter::PrivateNoExpire => CacheHeaders {
            expires: None,
            cache_control: format!("private, max-age={}", cache_expire),
            pragma: None,
            last_modified: Some(last_modified.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAST_MODIFIED: &str = "Mon, 01 Jan 2018 00:00:00 GMT";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 3, 4, 5, 6, 7).unwrap()
    }

    fn table(limiter: CacheLimiter) -> Vec<(&'static str, String)> {
        cache_headers(limiter, now(), 10800, LAST_MODIFIED)
            .iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect()
    }

    #[test]
    fn test_http_date_format() {
        assert_eq!(http_date(now()), "Sun, 04 Mar 2018 05:06:07 GMT");
    }

    #[test]
    fn test_header_table() {
        let cases: Vec<(CacheLimiter, Vec<(&str, &str)>)> = vec![
            (
                CacheLimiter::NoCache,
                vec![
                    ("Expires", CACHE_PAST_DATE),
                    ("Cache-Control", "no-store, no-cache, must-revalidate"),
                    ("Pragma", "no-cache"),
                ],
            ),
            (
                CacheLimiter::Public,
                vec![
                    ("Expires", "Sun, 04 Mar 2018 08:06:07 GMT"),
                    ("Cache-Control", "public, max-age=10800"),
                    ("Last-Modified", LAST_MODIFIED),
                ],
            ),
            (
                CacheLimiter::Private,
                vec![
                    ("Expires", CACHE_PAST_DATE),
                    ("Cache-Control", "private, max-age=10800"),
                    ("Last-Modified", LAST_MODIFIED),
                ],
            ),
            (
                CacheLimiter::PrivateNoExpire,
                vec![
                    ("Cache-Control", "private, max-age=10800"),
                    ("Last-Modified", LAST_MODIFIED),
                ],
            ),
        ];

        for (limiter, expected) in cases {
            let expected: Vec<(&str, String)> =
                expected.into_iter().map(|(k, v)| (k, v.to_string())).collect();
            assert_eq!(table(limiter), expected, "limiter {}", limiter);
        }
    }

    #[test]
    fn test_public_expires_saturates_for_huge_expiry() {
        let headers = cache_headers(CacheLimiter::Public, now(), u64::MAX, LAST_MODIFIED);
        assert_eq!(headers.expires.as_deref(), Some("Fri, 31 Dec 9999 23:59:59 GMT"));
        assert_eq!(headers.cache_control, format!("public, max-age={}", u64::MAX));
    }

    #[test]
    fn test_empty_last_modified_is_skipped() {
        let headers = cache_headers(CacheLimiter::PrivateNoExpire, now(), 60, "");
        let names: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["Cache-Control"]);
    }
}
