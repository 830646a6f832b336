//! Pure field extraction for measurements.

use url::Url;

/// Path component of the page URL; `/` if the URL does not parse.
pub fn path(location: &str) -> String {
    Url::parse(location)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| "/".to_string())
}

/// Referrer to report: empty when absent, unparsable, or from the page's
/// own host. Cross-host referrers pass through unchanged.
pub fn referrer(raw: &str, location: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let Ok(referrer_url) = Url::parse(raw) else {
        return String::new();
    };
    let page_host = Url::parse(location).ok().and_then(|url| host_key(&url));
    if page_host.is_some() && host_key(&referrer_url) == page_host {
        return String::new();
    }
    raw.to_string()
}

pub fn screen_size(width: u32, height: u32) -> String {
    format!("{width}x{height}")
}

pub fn user_agent(raw: &str) -> String {
    raw.to_string()
}

/// Host plus explicit non-default port, matching `Location.host`.
fn host_key(url: &Url) -> Option<(String, Option<u16>)> {
    url.host_str().map(|h| (h.to_ascii_lowercase(), url.port()))
}
