//! Case-insensitive text helpers for names shown in lists and pickers.

use std::cmp::Ordering;

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Compare two strings ignoring case and surrounding whitespace.
pub fn cmp_ci(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b))
}

/// Sort in place by a string key, ignoring case. Stable, so equal keys keep
/// their input order.
pub fn sort_alphabetically<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| fold(key(item)));
}

/// First item whose key equals `needle`, ignoring case.
pub fn find_ci<'a, T, F>(items: &'a [T], key: F, needle: &str) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let needle = fold(needle);
    items.iter().find(|item| fold(key(item)) == needle)
}

/// Substring search ignoring case. An empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = fold(needle);
    needle.is_empty() || haystack.to_lowercase().contains(&needle)
}

/// "First Last", skipping blank parts.
pub fn display_name(first: &str, last: &str) -> String {
    [first.trim(), last.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_alphabetically_ignores_case() {
        let mut names = vec!["bravo", "Alpha", "charlie", "alpha"];
        sort_alphabetically(&mut names, |s| s);
        assert_eq!(names, vec!["Alpha", "alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_sort_by_struct_key() {
        struct Contact {
            last_name: String,
        }
        let mut contacts = vec![
            Contact { last_name: "zimmer".into() },
            Contact { last_name: "Adams".into() },
        ];
        sort_alphabetically(&mut contacts, |c| c.last_name.as_str());
        assert_eq!(contacts[0].last_name, "Adams");
    }

    #[test]
    fn test_find_ci() {
        let names = vec!["Paris".to_string(), "Rome".to_string()];
        assert_eq!(find_ci(&names, |s| s.as_str(), " rome "), Some(&names[1]));
        assert_eq!(find_ci(&names, |s| s.as_str(), "Lisbon"), None);
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Ada Lovelace", "LOVE"));
        assert!(contains_ci("Ada", ""));
        assert!(!contains_ci("Ada", "Bob"));
    }

    #[test]
    fn test_cmp_ci() {
        assert_eq!(cmp_ci("abc", "ABC"), Ordering::Equal);
        assert_eq!(cmp_ci("a", "B"), Ordering::Less);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Ada", "Lovelace"), "Ada Lovelace");
        assert_eq!(display_name(" ", "Lovelace"), "Lovelace");
    }
}
