//! Entry filtering
//!
//! Decides, from the raw tar name and type flag alone, whether an entry is
//! staged and under which name. The staged name is always the last path
//! component, which keeps every write inside the flat staging directory.

use crate::config::{ENTRY_SUFFIX, SHADOW_PREFIX};

/// What to do with one archive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDecision {
    /// Stage the entry under this base name
    Accept(String),

    /// AppleDouble `._` shadow file
    SkipShadow,

    /// Directory, link, device or other non-regular entry
    SkipNotRegular,

    /// Regular file without the `.json` suffix
    SkipExtension,

    /// Name has no usable last component (`/`, `..`)
    SkipUnnamed,
}

/// Classify an entry by its raw tar name and whether it is a regular file
pub fn classify(raw_name: &str, is_regular: bool) -> EntryDecision {
    let Some(base) = base_name(raw_name) else {
        return EntryDecision::SkipUnnamed;
    };

    if base.starts_with(SHADOW_PREFIX) {
        return EntryDecision::SkipShadow;
    }

    if !is_regular {
        return EntryDecision::SkipNotRegular;
    }

    if !base.ends_with(ENTRY_SUFFIX) {
        return EntryDecision::SkipExtension;
    }

    EntryDecision::Accept(base.to_string())
}

/// Last `/`-separated component of a tar name
///
/// Trailing slashes are ignored. `.` and `..` are not names.
pub fn base_name(raw_name: &str) -> Option<&str> {
    let base = raw_name.trim_end_matches('/').rsplit('/').next()?;
    match base {
        "" | "." | ".." => None,
        _ => Some(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a.json"), Some("a.json"));
        assert_eq!(base_name("host/logs/a.json"), Some("a.json"));
        assert_eq!(base_name("./logs/"), Some("logs"));
        assert_eq!(base_name("/"), None);
        assert_eq!(base_name("logs/.."), None);
        assert_eq!(base_name(""), None);
    }

    #[test]
    fn test_accepts_nested_json() {
        assert_eq!(
            classify("collection/unifiedlogs/system.json", true),
            EntryDecision::Accept("system.json".into())
        );
    }

    #[test]
    fn test_skip_rules() {
        assert_eq!(classify("logs/._a.json", true), EntryDecision::SkipShadow);
        assert_eq!(classify("logs/b.txt", true), EntryDecision::SkipExtension);
        assert_eq!(classify("logs/a.JSON", true), EntryDecision::SkipExtension);
        assert_eq!(classify("logs/dir.json/", false), EntryDecision::SkipNotRegular);
        assert_eq!(classify("logs/link.json", false), EntryDecision::SkipNotRegular);
        assert_eq!(classify("../", true), EntryDecision::SkipUnnamed);
    }

    #[test]
    fn test_shadow_rule_applies_before_type_check() {
        assert_eq!(classify("._dir/", false), EntryDecision::SkipShadow);
    }
}
