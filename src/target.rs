//! Tracked-page records and their filesystem identity.

use url::Url;

/// Longest path segment kept when deriving a slug.
const MAX_PATH_SEGMENT: usize = 100;

/// One tracked resource: a URL plus presentation and scheduling metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Source URL fetched on every run.
    pub url: Url,
    /// Optional display name used in logs and summaries.
    pub name: Option<String>,
    /// Inactive targets are skipped without being reported as failures.
    pub active: bool,
}

impl Target {
    /// Builds an active target without a display name.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            name: None,
            active: true,
        }
    }

    /// Attaches a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Human-readable label for log lines: the display name when present,
    /// otherwise the URL.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.url.as_str())
    }

    /// Derives the stable filesystem slug that keys this target's snapshot
    /// and diff directories.
    ///
    /// The host (minus a leading `www.`) becomes the first segment with dots
    /// mapped to underscores. A non-empty path becomes a second segment with
    /// separator and query-ish characters mapped to underscores, trailing
    /// underscores trimmed, and the segment capped at a fixed length. The
    /// same URL always yields the same slug.
    pub fn slug(&self) -> String {
        let host = self.url.host_str().unwrap_or("unknown_site");
        let domain = host.strip_prefix("www.").unwrap_or(host).replace('.', "_");

        let path = self.url.path().trim_matches('/');
        if path.is_empty() {
            return domain;
        }

        let mut segment: String = path
            .chars()
            .map(|ch| match ch {
                '/' | '?' | '&' | '=' | '#' => '_',
                other => other,
            })
            .collect();
        segment.truncate(floor_char_boundary(&segment, MAX_PATH_SEGMENT));
        let segment = segment.trim_end_matches('_');
        if segment.is_empty() {
            return domain;
        }

        format!("{domain}/{segment}")
    }
}

fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    let mut index = index;
    while !value.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> Target {
        Target::new(Url::parse(url).expect("valid url"))
    }

    #[test]
    fn slug_for_bare_domain() {
        assert_eq!(target("https://example.com").slug(), "example_com");
        assert_eq!(target("https://example.com/").slug(), "example_com");
    }

    #[test]
    fn slug_strips_www_prefix() {
        assert_eq!(
            target("https://www.news.example.org").slug(),
            "news_example_org"
        );
    }

    #[test]
    fn slug_appends_sanitized_path() {
        assert_eq!(
            target("https://example.com/blog/posts/1").slug(),
            "example_com/blog_posts_1"
        );
    }

    #[test]
    fn slug_trims_trailing_separators() {
        assert_eq!(
            target("https://example.com/archive///").slug(),
            "example_com/archive"
        );
    }

    #[test]
    fn slug_caps_long_paths() {
        let long = format!("https://example.com/{}", "a".repeat(300));
        let slug = target(&long).slug();
        let path = slug.split('/').nth(1).expect("path segment");
        assert_eq!(path.len(), 100);
    }

    #[test]
    fn slug_is_deterministic() {
        let a = target("https://example.com/a?x=1");
        let b = target("https://example.com/a?x=1");
        assert_eq!(a.slug(), b.slug());
    }

    #[test]
    fn label_prefers_display_name() {
        let named = target("https://example.com").with_name("Example");
        assert_eq!(named.label(), "Example");
        assert_eq!(target("https://example.com").label(), "https://example.com/");
    }
}
