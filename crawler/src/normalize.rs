use url::Url;

/// Link prefixes dropped at ingress.
const FORBIDDEN_PREFIXES: [&str; 4] = ["mailto:", "javascript:", "tel:", "#"];

pub fn has_forbidden_prefix(url: &str) -> bool {
    FORBIDDEN_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Canonicalize a URL into its comparison key: resolve relative links
/// against the referer, lowercase scheme and host, decode unreserved
/// percent-octets, strip the fragment and any trailing slashes. Two URLs
/// are the same page iff their normalized forms are byte-equal.
pub fn normalize(raw: &str, referer: Option<&str>) -> Option<String> {
    let mut url = match referer {
        Some(base) => Url::parse(base).ok()?.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };
    url.set_fragment(None);
    let mut normalized = decode_unreserved(url.as_str());
    while normalized.ends_with('/') {
        normalized.pop();
    }
    Some(normalized)
}

/// Network-location of a URL (host plus explicit port). Politeness is
/// enforced per this key; `www.h` and `h` stay distinct.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Decode %XX escapes whose octet is unreserved (ALPHA / DIGIT / - . _ ~);
/// reserved octets keep their escaped form.
fn decode_unreserved(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(octet) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                if octet.is_ascii_alphanumeric() || matches!(octet, b'-' | b'.' | b'_' | b'~') {
                    out.push(octet as char);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_against_referer() {
        assert_eq!(
            normalize("/about", Some("http://example.com/index.html")),
            Some("http://example.com/about".to_string())
        );
        assert_eq!(
            normalize("faq.html", Some("http://example.com/docs/index.html")),
            Some("http://example.com/docs/faq.html".to_string())
        );
    }

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            normalize("HTTP://EXAMPLE.COM/Path", None),
            Some("http://example.com/Path".to_string())
        );
    }

    #[test]
    fn strips_fragment_and_trailing_slash() {
        assert_eq!(
            normalize("http://example.com/docs/#section", None),
            Some("http://example.com/docs".to_string())
        );
        assert_eq!(
            normalize("http://example.com", None),
            Some("http://example.com".to_string())
        );
    }

    #[test]
    fn decodes_only_unreserved_octets() {
        assert_eq!(
            normalize("http://example.com/%41%42%2Fc", None),
            Some("http://example.com/AB%2Fc".to_string())
        );
    }

    #[test]
    fn identical_pages_normalize_identically() {
        let a = normalize("http://Example.com/a/", None);
        let b = normalize("http://example.com/a#top", None);
        assert_eq!(a, b);
    }

    #[test]
    fn host_includes_explicit_port() {
        assert_eq!(
            host_of("http://example.com:8080/x"),
            Some("example.com:8080".to_string())
        );
        assert_eq!(host_of("http://example.com/x"), Some("example.com".to_string()));
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn forbidden_prefixes_are_flagged() {
        assert!(has_forbidden_prefix("mailto:someone@example.com"));
        assert!(has_forbidden_prefix("javascript:void(0)"));
        assert!(has_forbidden_prefix("tel:+4512345678"));
        assert!(has_forbidden_prefix("#top"));
        assert!(!has_forbidden_prefix("http://example.com"));
    }
}
