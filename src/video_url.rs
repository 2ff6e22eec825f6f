use std::fmt;

use url::Url;

use crate::error::{Error, Result};

const SITE_ROOT: &str = "https://www.youtube.com/";
const WATCH_MARKER: &str = "watch?v=";

/// A watch address reduced to scheme, host, path and the `v` parameter.
///
/// Two hrefs that only differ in tracking parameters (`list`, `index`, `pp`, ...)
/// or fragment normalize to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoUrl {
    url: String,
    id: String,
}

impl VideoUrl {
    /// Normalize an anchor href. Site-relative hrefs are resolved against youtube.com.
    pub fn parse(href: &str) -> Result<Self> {
        let href = href.trim();
        let parsed = match Url::parse(href) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(SITE_ROOT)
                .and_then(|root| root.join(href))
                .map_err(|e| Error::InvalidUrl(format!("{}: {}", href, e)))?,
            Err(e) => return Err(Error::InvalidUrl(format!("{}: {}", href, e))),
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("{}: not a web address", href)));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{}: missing host", href)))?;
        if !parsed.path().ends_with("/watch") {
            return Err(Error::InvalidUrl(format!("{}: not a watch page", href)));
        }

        let id = parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::InvalidUrl(format!("{}: missing video id", href)))?;

        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let url = format!("{}://{}{}{}?v={}", parsed.scheme(), host, port, parsed.path(), id);

        Ok(Self { url, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for VideoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl AsRef<str> for VideoUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

/// Whether an href points at a single video.
pub fn is_watch_href(href: &str) -> bool {
    href.contains(WATCH_MARKER)
}

/// Check that the address handed to the CLI is a mix or playlist listing.
pub fn validate_mix_url(address: &str) -> Result<Url> {
    let parsed =
        Url::parse(address.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", address, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!("{}: not a web address", address)));
    }
    let has_list = parsed
        .query_pairs()
        .any(|(key, value)| key == "list" && !value.is_empty());
    if !has_list {
        return Err(Error::InvalidUrl(format!(
            "{}: expected a mix or playlist address with a list parameter",
            address
        )));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_everything_but_the_video_id() {
        let url = VideoUrl::parse(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=RDdQw4w9WgXcQ&index=2&pp=8AUB#t=10",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(url.id(), "dQw4w9WgXcQ");
    }

    #[test]
    fn tracking_parameters_do_not_affect_equality() {
        let a = VideoUrl::parse("https://www.youtube.com/watch?list=RDx&v=abc123&index=4").unwrap();
        let b = VideoUrl::parse("https://www.youtube.com/watch?v=abc123&pp=iAQB").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relative_hrefs_resolve_against_the_site() {
        let url = VideoUrl::parse("/watch?v=abc123&list=RDabc").unwrap();
        assert_eq!(url.to_string(), "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn rejects_non_watch_addresses() {
        assert!(VideoUrl::parse("https://www.youtube.com/playlist?list=RDabc").is_err());
        assert!(VideoUrl::parse("https://www.youtube.com/watch?list=RDabc").is_err());
        assert!(VideoUrl::parse("https://www.youtube.com/watch?v=").is_err());
        assert!(VideoUrl::parse("javascript:void(0)").is_err());
    }

    #[test]
    fn watch_marker_detection() {
        assert!(is_watch_href("https://www.youtube.com/watch?v=abc"));
        assert!(!is_watch_href("https://www.youtube.com/@channel"));
    }

    #[test]
    fn mix_addresses_need_a_list() {
        assert!(validate_mix_url("https://www.youtube.com/watch?v=abc&list=RDabc").is_ok());
        assert!(validate_mix_url("https://www.youtube.com/playlist?list=PL123").is_ok());
        assert!(matches!(
            validate_mix_url("https://www.youtube.com/watch?v=abc"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(validate_mix_url("not a url").is_err());
    }
}
