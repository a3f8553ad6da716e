//! A small URL splitter for `location` headers.

/// Extracts the path component of an absolute http(s) URL.
///
/// ```text
/// scheme "://" host [ ":" port ] path [ "?" query ] [ "#" fragment ]
/// ```
///
/// Only the `path` part is returned: the query and the fragment are dropped,
/// and the scheme, host and port are validated but otherwise ignored. Returns
/// None for relative URLs and for URLs without a host, in which case the
/// redirect is not followed.
pub(crate) fn parse_location(location: &str) -> Option<String> {
    enum UrlParseStatus {
        Host,
        Port,
        Path,
    }

    let url = if let Some(after_protocol) = location.strip_prefix("http://") {
        after_protocol
    } else if let Some(after_protocol) = location.strip_prefix("https://") {
        after_protocol
    } else {
        return None;
    };

    let mut host = String::new();
    let mut path = String::new();
    let mut status = UrlParseStatus::Host;
    for c in url.chars() {
        match status {
            UrlParseStatus::Host => match c {
                '/' => {
                    status = UrlParseStatus::Path;
                    path.push(c);
                }
                '?' | '#' => break,
                ':' => status = UrlParseStatus::Port,
                _ => host.push(c),
            },
            UrlParseStatus::Port => match c {
                '/' => {
                    status = UrlParseStatus::Path;
                    path.push(c);
                }
                '?' | '#' => break,
                _ => {}
            },
            UrlParseStatus::Path => match c {
                '?' | '#' => break,
                _ => path.push(c),
            },
        }
    }

    if host.is_empty() {
        return None;
    }
    // Ensure the path is *something*
    if path.is_empty() {
        path.push('/');
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::parse_location;

    #[test]
    fn absolute_url_yields_path() {
        assert_eq!(
            parse_location("http://example.com/foo/bar"),
            Some("/foo/bar".to_string())
        );
    }

    #[test]
    fn port_is_skipped() {
        assert_eq!(
            parse_location("http://localhost:8080/basic"),
            Some("/basic".to_string())
        );
    }

    #[test]
    fn query_and_fragment_are_dropped() {
        assert_eq!(
            parse_location("http://example.com/foo?x=1#frag"),
            Some("/foo".to_string())
        );
        assert_eq!(
            parse_location("https://example.com/foo#frag"),
            Some("/foo".to_string())
        );
    }

    #[test]
    fn bare_host_yields_root() {
        assert_eq!(parse_location("https://example.com"), Some("/".to_string()));
        assert_eq!(
            parse_location("http://example.com?some=params"),
            Some("/".to_string())
        );
    }

    #[test]
    fn relative_location_is_rejected() {
        assert_eq!(parse_location("/basic"), None);
        assert_eq!(parse_location("basic"), None);
    }

    #[test]
    fn missing_host_is_rejected() {
        assert_eq!(parse_location("http://"), None);
        assert_eq!(parse_location("http:///basic"), None);
    }
}
