/// Shortcut recognition and expansion for the search box
use std::collections::HashMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

use crate::config::SEARCH_BASE_URL;
use crate::query_data::SavedQuery;

/// Upper bound on substitutions made by a single `expand_nested` call
pub const MAX_EXPANSION_PASSES: usize = 10;

/// Characters left alone by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Keystrokes that may trigger an expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKey {
    Space,
    Enter,
}

impl TriggerKey {
    /// Map a DOM `KeyboardEvent.key` value to a trigger
    pub fn from_key(key: &str) -> Option<TriggerKey> {
        match key {
            " " => Some(TriggerKey::Space),
            "Enter" => Some(TriggerKey::Enter),
            _ => None,
        }
    }
}

/// The leading `?token` of a search box value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutPrefix {
    /// Lowercased token without the `?`
    pub token: String,
    /// Characters covered by `?token`, before trimming the token
    pub len: usize,
}

impl ShortcutPrefix {
    /// Everything in `text` after the `?token` region
    pub fn remainder<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.len) {
            Some((idx, _)) => &text[idx..],
            None => "",
        }
    }
}

/// Detect a `?token` at the very start of `text`
///
/// The token runs up to the first space (or the end of the text). Returns
/// `None` when the text does not start with `?` or the token is blank.
pub fn recognize_shortcut_prefix(text: &str) -> Option<ShortcutPrefix> {
    let rest = text.strip_prefix('?')?;
    let raw_token = rest.split(' ').next().unwrap_or_default();
    let token = raw_token.trim().to_lowercase();

    if token.is_empty() {
        return None;
    }

    Some(ShortcutPrefix {
        token,
        len: 1 + raw_token.chars().count(),
    })
}

/// Case-insensitive shortcut → query lookup
///
/// Keys are kept sorted longest first so scans always prefer the longest
/// shortcut that fits at a given position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutMap {
    expansions: HashMap<String, String>,
    by_length: Vec<String>,
}

impl ShortcutMap {
    pub fn new() -> Self {
        ShortcutMap::default()
    }

    /// Add or replace a shortcut; blank shortcuts are ignored
    pub fn insert(&mut self, shortcut: &str, query: &str) {
        let key = shortcut.trim().to_lowercase();
        if key.is_empty() {
            return;
        }

        if self
            .expansions
            .insert(key.clone(), query.trim().to_string())
            .is_none()
        {
            self.by_length.push(key);
            self.by_length
                .sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        }
    }

    pub fn get(&self, shortcut: &str) -> Option<&str> {
        self.expansions
            .get(&shortcut.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, shortcut: &str) -> bool {
        self.get(shortcut).is_some()
    }

    pub fn len(&self) -> usize {
        self.expansions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    /// Shortcut keys, longest first
    pub fn keys(&self) -> &[String] {
        &self.by_length
    }
}

/// Build the shortcut map from saved queries
///
/// Later queries win when two of them share a shortcut.
pub fn build_shortcut_map(queries: &[SavedQuery]) -> ShortcutMap {
    queries.iter().fold(ShortcutMap::new(), |mut map, query| {
        map.insert(&query.shortcut, &query.query);
        map
    })
}

/// Expand every `?shortcut` in `text`, including ones introduced by earlier
/// substitutions
///
/// Algorithm:
/// 1. Scan left to right for `?`
/// 2. At each `?`, try the shortcuts longest first, comparing case-insensitively
/// 3. A match only counts when it is followed by a space or the end of the text
/// 4. Splice in the first match and rescan from the start
/// 5. Stop when a scan finds nothing or after `MAX_EXPANSION_PASSES` substitutions
///
/// Self-referential shortcuts can leave a `?token` behind once the pass limit
/// is hit.
pub fn expand_nested(text: &str, shortcuts: &ShortcutMap) -> String {
    if shortcuts.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();
    for _ in 0..MAX_EXPANSION_PASSES {
        match find_first_shortcut(&result, shortcuts) {
            Some((start, end, expansion)) => result.replace_range(start..end, expansion),
            None => break,
        }
    }
    result
}

/// Byte range of the first expandable `?shortcut` in `text`, with its expansion
fn find_first_shortcut<'m>(text: &str, shortcuts: &'m ShortcutMap) -> Option<(usize, usize, &'m str)> {
    for (idx, c) in text.char_indices() {
        if c != '?' {
            continue;
        }

        let after = &text[idx + 1..];
        for key in shortcuts.keys() {
            let key_end = after
                .char_indices()
                .nth(key.chars().count())
                .map_or(after.len(), |(i, _)| i);

            if after[..key_end].to_lowercase() != *key {
                continue;
            }

            if matches!(after[key_end..].chars().next(), Some(next) if next != ' ') {
                continue;
            }

            match shortcuts.get(key) {
                Some(expansion) if !expansion.is_empty() => {
                    return Some((idx, idx + 1 + key_end, expansion));
                }
                _ => continue,
            }
        }
    }
    None
}

/// Expand the shortcut at the start of a search box value
///
/// Returns `None` when the value has no leading `?token` or the token is not
/// a known shortcut. A space keystroke adds one space between the expansion
/// and the rest of the value unless the rest already starts with one.
pub fn expand_leading_shortcut(
    value: &str,
    shortcuts: &ShortcutMap,
    trigger: TriggerKey,
) -> Option<String> {
    let value = value.trim_start();
    let prefix = recognize_shortcut_prefix(value)?;
    let expansion = shortcuts.get(&prefix.token)?;

    let remainder = prefix.remainder(value);
    let separator = if trigger == TriggerKey::Space && !remainder.starts_with(' ') {
        " "
    } else {
        ""
    };

    let combined = format!("{}{}{}", expansion, separator, remainder);
    Some(expand_nested(&combined, shortcuts))
}

/// Search page URL for a query, with the query percent-encoded as `q`
pub fn search_url(query: &str) -> String {
    let encoded = utf8_percent_encode(query.trim(), URI_COMPONENT).to_string();

    match Url::parse(SEARCH_BASE_URL) {
        Ok(mut url) => {
            url.set_query(Some(&format!("q={}", encoded)));
            url.to_string()
        }
        Err(_) => format!("{}?q={}", SEARCH_BASE_URL, encoded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_map(pairs: &[(&str, &str)]) -> ShortcutMap {
        let mut map = ShortcutMap::new();
        for (shortcut, query) in pairs {
            map.insert(shortcut, query);
        }
        map
    }

    fn create_test_query(shortcut: &str, query: &str) -> SavedQuery {
        SavedQuery {
            id: format!("q_{}", shortcut),
            name: shortcut.to_string(),
            shortcut: shortcut.to_string(),
            query: query.to_string(),
            folder_id: String::new(),
        }
    }

    #[test]
    fn test_recognize_prefix_basic() {
        let prefix = recognize_shortcut_prefix("?CMD creature").unwrap();

        assert_eq!(prefix.token, "cmd");
        assert_eq!(prefix.len, 4);
        assert_eq!(prefix.remainder("?CMD creature"), " creature");
    }

    #[test]
    fn test_recognize_prefix_whole_value() {
        let prefix = recognize_shortcut_prefix("?abzC").unwrap();

        assert_eq!(prefix.token, "abzc");
        assert_eq!(prefix.len, 5);
        assert_eq!(prefix.remainder("?abzC"), "");
    }

    #[test]
    fn test_recognize_prefix_rejects() {
        assert_eq!(recognize_shortcut_prefix(""), None);
        assert_eq!(recognize_shortcut_prefix("cmd"), None);
        assert_eq!(recognize_shortcut_prefix("?"), None);
        assert_eq!(recognize_shortcut_prefix("? cmd"), None);
        assert_eq!(recognize_shortcut_prefix(" ?cmd"), None);
    }

    #[test]
    fn test_recognize_prefix_counts_characters() {
        let prefix = recognize_shortcut_prefix("?éa rest").unwrap();

        assert_eq!(prefix.len, 3);
        assert_eq!(prefix.remainder("?éa rest"), " rest");
    }

    #[test]
    fn test_build_shortcut_map() {
        let queries = vec![
            create_test_query(" CMD ", " legal:commander "),
            create_test_query("", "ignored"),
            create_test_query("red", "c:r"),
        ];

        let map = build_shortcut_map(&queries);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("cmd"), Some("legal:commander"));
        assert_eq!(map.get("Cmd"), Some("legal:commander"));
        assert!(!map.contains(""));
    }

    #[test]
    fn test_build_shortcut_map_last_wins() {
        let queries = vec![
            create_test_query("r", "c:r"),
            create_test_query("R", "c:r t:instant"),
        ];

        let map = build_shortcut_map(&queries);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("r"), Some("c:r t:instant"));
    }

    #[test]
    fn test_keys_longest_first() {
        let map = create_test_map(&[("a", "X"), ("abc", "Z"), ("ab", "Y")]);

        assert_eq!(map.keys(), &["abc".to_string(), "ab".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_expand_nested_without_question_mark() {
        let map = create_test_map(&[("a", "X"), ("ab", "Y")]);

        assert_eq!(expand_nested("t:creature c:g", &map), "t:creature c:g");
        assert_eq!(expand_nested("", &map), "");
    }

    #[test]
    fn test_expand_nested_empty_map() {
        assert_eq!(expand_nested("?a ?b", &ShortcutMap::new()), "?a ?b");
    }

    #[test]
    fn test_longest_match_wins() {
        let map = create_test_map(&[("a", "X"), ("ab", "Y")]);

        assert_eq!(expand_nested("?ab", &map), "Y");
        assert_eq!(expand_nested("?a", &map), "X");
    }

    #[test]
    fn test_match_must_end_at_space_or_end() {
        let map = create_test_map(&[("ab", "Y")]);

        assert_eq!(expand_nested("?ab extra", &map), "Y extra");
        assert_eq!(expand_nested("?abc", &map), "?abc");
        assert_eq!(expand_nested("?ab,", &map), "?ab,");
    }

    #[test]
    fn test_expand_nested_case_insensitive() {
        let map = create_test_map(&[("cmd", "legal:commander")]);

        assert_eq!(expand_nested("t:elf ?CMD", &map), "t:elf legal:commander");
    }

    #[test]
    fn test_expand_nested_mid_text() {
        let map = create_test_map(&[("g", "c:g"), ("elf", "t:elf")]);

        assert_eq!(expand_nested("?elf and ?g", &map), "t:elf and c:g");
    }

    #[test]
    fn test_nested_expansion() {
        let map = create_test_map(&[("a", "?b"), ("b", "Z")]);

        assert_eq!(expand_nested("?a", &map), "Z");
    }

    #[test]
    fn test_cyclic_shortcut_terminates() {
        let map = create_test_map(&[("a", "?a")]);

        assert_eq!(expand_nested("?a", &map), "?a");
    }

    #[test]
    fn test_growing_cycle_is_bounded() {
        let map = create_test_map(&[("a", "?a x")]);

        let expanded = expand_nested("?a", &map);

        assert_eq!(expanded, format!("?a{}", " x".repeat(MAX_EXPANSION_PASSES)));
    }

    #[test]
    fn test_empty_expansion_is_skipped() {
        let map = create_test_map(&[("blank", ""), ("b", "Z")]);

        assert_eq!(expand_nested("?blank ?b", &map), "?blank Z");
    }

    #[test]
    fn test_expand_nested_idempotent() {
        let map = create_test_map(&[("a", "?b t:elf"), ("b", "c:g"), ("cmd", "legal:commander")]);

        let once = expand_nested("?a ?cmd ?unknown", &map);
        let twice = expand_nested(&once, &map);

        assert_eq!(once, "c:g t:elf legal:commander ?unknown");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_expand_leading_shortcut_space() {
        let map = create_test_map(&[("cmd", "legal:commander")]);

        assert_eq!(
            expand_leading_shortcut("?cmd creature", &map, TriggerKey::Space),
            Some("legal:commander creature".to_string())
        );
        assert_eq!(
            expand_leading_shortcut("?cmd", &map, TriggerKey::Space),
            Some("legal:commander ".to_string())
        );
    }

    #[test]
    fn test_expand_leading_shortcut_enter() {
        let map = create_test_map(&[("cmd", "legal:commander")]);

        assert_eq!(
            expand_leading_shortcut("  ?cmd", &map, TriggerKey::Enter),
            Some("legal:commander".to_string())
        );
        assert_eq!(
            expand_leading_shortcut("?cmd t:elf", &map, TriggerKey::Enter),
            Some("legal:commander t:elf".to_string())
        );
    }

    #[test]
    fn test_expand_leading_shortcut_resolves_remainder() {
        let map = create_test_map(&[("cmd", "legal:commander ?g"), ("g", "c:g"), ("elf", "t:elf")]);

        assert_eq!(
            expand_leading_shortcut("?cmd ?elf", &map, TriggerKey::Enter),
            Some("legal:commander c:g t:elf".to_string())
        );
    }

    #[test]
    fn test_expand_leading_shortcut_no_action() {
        let map = create_test_map(&[("cmd", "legal:commander")]);

        assert_eq!(expand_leading_shortcut("cmd", &map, TriggerKey::Space), None);
        assert_eq!(expand_leading_shortcut("?nope", &map, TriggerKey::Space), None);
        assert_eq!(expand_leading_shortcut("t:elf ?cmd", &map, TriggerKey::Enter), None);
        assert_eq!(expand_leading_shortcut("?cmd", &ShortcutMap::new(), TriggerKey::Enter), None);
    }

    #[test]
    fn test_trigger_key_from_key() {
        assert_eq!(TriggerKey::from_key(" "), Some(TriggerKey::Space));
        assert_eq!(TriggerKey::from_key("Enter"), Some(TriggerKey::Enter));
        assert_eq!(TriggerKey::from_key("a"), None);
        assert_eq!(TriggerKey::from_key("Tab"), None);
    }

    #[test]
    fn test_search_url() {
        assert_eq!(
            search_url(" legal:commander t:creature "),
            "https://scryfall.com/search?q=legal%3Acommander%20t%3Acreature"
        );
        assert_eq!(search_url("o:\"draw a card\""), "https://scryfall.com/search?q=o%3A%22draw%20a%20card%22");
    }
}
