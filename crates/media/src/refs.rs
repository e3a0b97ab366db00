use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `src='...'` or `src="..."`, any case, possibly spanning lines. Non-greedy so
// two references in one value stay two references.
regex!(SRC_REGEX, r#"(?is)src=['"](.+?)['"]"#);

/// Fast pre-filter: does the text contain at least one media reference?
pub fn contains_references(text: &str) -> bool {
    SRC_REGEX.is_match(text)
}

/// Every media reference in the text, in order of appearance (duplicates included).
pub fn references(text: &str) -> impl Iterator<Item = &str> {
    SRC_REGEX.captures_iter(text).filter_map(|captures| captures.get(1)).map(|m| m.as_str())
}

/// Replace references in place, keeping the surrounding `src=` and quotes.
///
/// `replace` returns the new reference, or `None` to leave it as is.
pub(crate) fn rewrite<'t, F>(text: &'t str, mut replace: F) -> Cow<'t, str>
where
    F: FnMut(&str) -> Option<String>,
{
    SRC_REGEX.replace_all(text, |captures: &Captures| {
        let (Some(whole), Some(reference)) = (captures.get(0), captures.get(1)) else {
            return String::new();
        };
        match replace(reference.as_str()) {
            Some(new) => {
                let start = reference.start() - whole.start();
                let end = reference.end() - whole.start();
                format!("{}{new}{}", &whole.as_str()[..start], &whole.as_str()[end..])
            },
            None => whole.as_str().to_string(),
        }
    })
}

/// Whether a reference points outside the filesystem entirely (`http://...`).
pub(crate) fn is_remote(reference: &str) -> bool {
    reference.contains("://")
}
