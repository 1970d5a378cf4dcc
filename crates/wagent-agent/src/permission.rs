// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whitelist/blacklist filtering of message authors.

use wagent_core::{PermissionEntry, PermissionScope};

/// Decides whether `author` may talk to the agent.
///
/// A blacklist hit denies regardless of scope, even when the whitelist has
/// an `ALL` entry. Otherwise an `ALL` whitelist entry or an exact
/// identifier match allows; anything else is denied.
pub fn is_allowed(author: &str, whitelist: &[PermissionEntry], blacklist: &[PermissionEntry]) -> bool {
    if blacklist.iter().any(|entry| entry.identifier == author) {
        return false;
    }
    whitelist
        .iter()
        .any(|entry| entry.scope == PermissionScope::All || entry.identifier == author)
}

/// Author identifier of a message: the group participant when present,
/// else the sender, without the `@server` suffix.
pub fn author_identifier<'a>(from: &'a str, author: Option<&'a str>) -> &'a str {
    let address = author.filter(|a| !a.is_empty()).unwrap_or(from);
    address.split('@').next().unwrap_or(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(scope: PermissionScope, id: &str) -> PermissionEntry {
        PermissionEntry::new(scope, id)
    }

    #[test]
    fn blacklist_beats_whitelist() {
        let white = [entry(PermissionScope::Contact, "1555")];
        let black = [entry(PermissionScope::Group, "1555")];
        assert!(!is_allowed("1555", &white, &black));
    }

    #[test]
    fn all_scope_admits_everyone_not_blacklisted() {
        let white = [entry(PermissionScope::All, "")];
        let black = [entry(PermissionScope::Contact, "1666")];
        assert!(is_allowed("1777", &white, &black));
        assert!(!is_allowed("1666", &white, &black));
    }

    #[test]
    fn empty_whitelist_denies() {
        let black = [entry(PermissionScope::Contact, "1666")];
        assert!(!is_allowed("1777", &[], &black));
        assert!(!is_allowed("1777", &[], &[]));
    }

    #[test]
    fn group_entries_match_by_identifier() {
        let white = [entry(PermissionScope::Group, "120363")];
        assert!(is_allowed("120363", &white, &[]));
        assert!(!is_allowed("1555", &white, &[]));
    }

    #[test]
    fn author_strips_server_suffix() {
        assert_eq!(author_identifier("1555@c.us", None), "1555");
        assert_eq!(
            author_identifier("120363@g.us", Some("1666@c.us")),
            "1666"
        );
        assert_eq!(author_identifier("1555@c.us", Some("")), "1555");
        assert_eq!(author_identifier("bare", None), "bare");
    }

    proptest! {
        #[test]
        fn blacklisted_is_never_allowed(
            id in "[0-9]{4,12}",
            others in proptest::collection::vec("[0-9]{4,12}", 0..5),
            all in any::<bool>(),
        ) {
            let mut white: Vec<_> = others.iter().map(|o| entry(PermissionScope::Contact, o)).collect();
            white.push(entry(PermissionScope::Contact, &id));
            if all {
                white.push(entry(PermissionScope::All, "*"));
            }
            let black = [entry(PermissionScope::Contact, &id)];
            prop_assert!(!is_allowed(&id, &white, &black));
        }

        #[test]
        fn all_scope_allows_any_unlisted(id in "[0-9]{4,12}") {
            let white = [entry(PermissionScope::All, "*")];
            prop_assert!(is_allowed(&id, &white, &[]));
        }
    }
}
