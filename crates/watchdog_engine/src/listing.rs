use scraper::{Html, Selector};
use watchdog_core::VersionSet;

const PARENT_DIR: &str = "../";

/// Subdirectory names linked from a directory listing page, sorted.
///
/// A link counts when its `href` ends with `/` and does not start with
/// `../`. Trailing slashes are stripped; a link that is nothing but slashes
/// names no directory and is skipped. Malformed markup yields whatever the
/// parser recovers.
pub fn extract_subdirectories(html: &str) -> VersionSet {
    let document = Html::parse_document(html);
    let Some(anchors) = Selector::parse("a[href]").ok() else {
        return VersionSet::new();
    };

    let mut names: Vec<&str> = document
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.ends_with('/') && !href.starts_with(PARENT_DIR))
        .map(|href| href.trim_end_matches('/'))
        .filter(|name| !name.is_empty())
        .collect();
    names.sort_unstable();
    names.into_iter().collect()
}
