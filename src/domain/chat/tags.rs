//! Parsed IRCv3 message tags.
//!
//! A tagged chat line starts with `@key=value;key=value ...`. [`ChatTags`]
//! holds the decoded pairs for one line and offers typed accessors for the
//! handful of keys the portal uses.

use std::collections::HashMap;

/// Key/value metadata attached to a single chat line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTags {
    entries: HashMap<String, String>,
}

impl ChatTags {
    /// Parses a raw tag segment, with or without its leading `@`.
    ///
    /// Pairs are split on `;` and each pair on its first `=`. Pairs without
    /// an `=` are ignored. Escaped values (`\s`, `\:` ...) are decoded.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('@').unwrap_or(raw);
        let entries = raw
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.to_string(), unescape_value(value)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `display-name`, if present and non-empty.
    pub fn display_name(&self) -> Option<&str> {
        self.non_empty("display-name")
    }

    /// `color`, if present and non-empty.
    pub fn color(&self) -> Option<&str> {
        self.non_empty("color")
    }

    pub fn is_moderator(&self) -> bool {
        self.get("mod") == Some("1")
    }

    pub fn is_subscriber(&self) -> bool {
        self.get("subscriber") == Some("1")
    }

    /// Badge names from the comma-separated `badges` tag, without the
    /// `/version` suffix.
    pub fn badges(&self) -> Vec<String> {
        self.get("badges")
            .map(|badges| {
                badges
                    .split(',')
                    .filter_map(|badge| badge.split('/').next())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }
}

fn unescape_value(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_with_and_without_leading_at() {
        let with_at = ChatTags::parse("@mod=1;color=#FF0000");
        let without_at = ChatTags::parse("mod=1;color=#FF0000");
        assert_eq!(with_at, without_at);
        assert_eq!(with_at.len(), 2);
    }

    #[test]
    fn splits_each_pair_on_first_equals_only() {
        let tags = ChatTags::parse("reply-text=a=b");
        assert_eq!(tags.get("reply-text"), Some("a=b"));
    }

    #[test]
    fn ignores_pairs_without_equals() {
        let tags = ChatTags::parse("flag;mod=1");
        assert_eq!(tags.len(), 1);
        assert!(tags.get("flag").is_none());
    }

    #[test]
    fn badges_drop_version_suffix() {
        let tags = ChatTags::parse("badges=broadcaster/1,subscriber/12,premium/1");
        assert_eq!(tags.badges(), vec!["broadcaster", "subscriber", "premium"]);
    }

    #[test]
    fn empty_badges_tag_yields_no_badges() {
        assert!(ChatTags::parse("badges=").badges().is_empty());
        assert!(ChatTags::default().badges().is_empty());
    }

    #[test]
    fn empty_display_name_is_absent() {
        assert!(ChatTags::parse("display-name=").display_name().is_none());
        assert_eq!(
            ChatTags::parse("display-name=Ada").display_name(),
            Some("Ada")
        );
    }

    #[test]
    fn moderator_and_subscriber_flags_require_one() {
        let tags = ChatTags::parse("mod=1;subscriber=0");
        assert!(tags.is_moderator());
        assert!(!tags.is_subscriber());
    }

    #[test]
    fn decodes_escaped_values() {
        let tags = ChatTags::parse(r"system-msg=5\sraiders\sfrom\:\sAda\\");
        assert_eq!(tags.get("system-msg"), Some(r"5 raiders from; Ada\"));
    }
}
