//! S3-style prefix/delimiter listing over an in-process key set.

use std::collections::BTreeSet;

use crate::Listing;

pub const DELIMITER: char = '/';

/// Apply `ListObjectsV2` semantics to `keys`.
///
/// Output is sorted lexicographically, like S3.
pub fn list_keys<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    delimited: bool,
) -> Listing {
    let mut common_prefixes = BTreeSet::new();
    let mut matched = BTreeSet::new();
    for key in keys {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        if delimited {
            if let Some(idx) = rest.find(DELIMITER) {
                common_prefixes.insert(format!("{}{}", prefix, &rest[..=idx]));
                continue;
            }
        }
        matched.insert(key.to_string());
    }
    Listing {
        common_prefixes: common_prefixes.into_iter().collect(),
        keys: matched.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 6] = [
        "A/photo.jpg",
        "A/other.png",
        "new_face/",
        "new_face/x.png",
        "B/nested/deep.jpg",
        "loose.jpg",
    ];

    #[test]
    fn test_top_level_delimited() {
        let listing = list_keys(KEYS, "", true);
        assert_eq!(listing.common_prefixes, vec!["A/", "B/", "new_face/"]);
        assert_eq!(listing.keys, vec!["loose.jpg"]);
    }

    #[test]
    fn test_folder_delimited_includes_marker() {
        let listing = list_keys(KEYS, "new_face/", true);
        assert!(listing.common_prefixes.is_empty());
        assert_eq!(listing.keys, vec!["new_face/", "new_face/x.png"]);

        let listing = list_keys(KEYS, "B/", true);
        assert_eq!(listing.common_prefixes, vec!["B/nested/"]);
        assert!(listing.keys.is_empty());
    }

    #[test]
    fn test_recursive() {
        let listing = list_keys(KEYS, "B/", false);
        assert!(listing.common_prefixes.is_empty());
        assert_eq!(listing.keys, vec!["B/nested/deep.jpg"]);
    }

    #[test]
    fn test_prefix_is_textual() {
        // "A" without a trailing slash also matches "A/..." and nothing else here.
        let listing = list_keys(["A/x", "AB/y", "Z"], "A", true);
        assert_eq!(listing.common_prefixes, vec!["A/", "AB/"]);
    }
}
