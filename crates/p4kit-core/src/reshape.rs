// ── Record reshaping ──
//
// The server flattens arrays and per-index groups into numbered keys:
// `View0`, `View1`, ... for lists and `action0`, `rev1`, `how0,1` for
// composites. These helpers fold them back into ordered containers before
// any typed construction happens.

use std::sync::LazyLock;

use indexmap::IndexMap;
use p4kit_api::Record;
use regex::Regex;

/// Keys of per-revision `filelog` fields: `<name><index>[,<related>]`.
///
/// Prefix match, like every composite pattern handed to
/// [`extract_indexed_composite`]: group 1 is the field name, group 2 the
/// index, and the optional group 3 the related index.
pub static REVISION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z]+)([0-9]+)(?:,([0-9]+))?").expect("revision key regex is valid")
});

/// Pop `prefix0`, `prefix1`, ... until the first missing index.
///
/// Consumed keys are removed from `record`; everything else keeps its
/// order. No `prefix0` means an empty list and an untouched record.
pub fn extract_indexed_list(record: &mut Record, prefix: &str) -> Vec<String> {
    let mut values = Vec::new();
    while let Some(value) = record.shift_remove(&format!("{prefix}{}", values.len())) {
        values.push(value);
    }
    values
}

/// Group every key matching `pattern` by its index.
///
/// `change0` lands in group 0 as `change`, `how0,1` lands in group 0 as
/// `how1`. Keys that do not match are shared and copied into every group;
/// a group's own field wins over a shared one with the same name. Groups
/// keep first-seen order.
pub fn extract_indexed_composite(record: Record, pattern: &Regex) -> IndexMap<usize, Record> {
    let mut groups: IndexMap<usize, Record> = IndexMap::new();
    let mut shared = Record::new();

    for (key, value) in record {
        match split_key(pattern, &key) {
            Some((index, field)) => {
                groups.entry(index).or_default().insert(field, value);
            }
            None => {
                shared.insert(key, value);
            }
        }
    }

    for group in groups.values_mut() {
        for (key, value) in &shared {
            group
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
    groups
}

/// Remove the keys matching `pattern` from `record` and group them by index.
///
/// Unlike [`extract_indexed_composite`] nothing is shared: non-matching
/// keys stay where they are.
pub fn take_indexed_groups(record: &mut Record, pattern: &Regex) -> IndexMap<usize, Record> {
    let mut groups: IndexMap<usize, Record> = IndexMap::new();
    for (key, value) in std::mem::take(record) {
        match split_key(pattern, &key) {
            Some((index, field)) => {
                groups.entry(index).or_default().insert(field, value);
            }
            None => {
                record.insert(key, value);
            }
        }
    }
    groups
}

/// `how0,1` -> `(0, "how1")`, `rev2` -> `(2, "rev")`.
fn split_key(pattern: &Regex, key: &str) -> Option<(usize, String)> {
    let caps = pattern.captures(key)?;
    let name = caps.get(1)?.as_str();
    let index = caps.get(2)?.as_str().parse().ok()?;
    let field = match caps.get(3) {
        Some(related) => {
            let related: usize = related.as_str().parse().ok()?;
            format!("{name}{related}")
        }
        None => name.to_owned(),
    };
    Some((index, field))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    // ── Indexed lists ───────────────────────────────────────────────

    #[test]
    fn list_pops_contiguous_entries_in_order() {
        let mut r = record(&[
            ("Files1", "//depot/b"),
            ("Change", "4"),
            ("Files0", "//depot/a"),
            ("Files2", "//depot/c"),
        ]);
        let files = extract_indexed_list(&mut r, "Files");
        assert_eq!(files, ["//depot/a", "//depot/b", "//depot/c"]);
        assert_eq!(r, record(&[("Change", "4")]));
    }

    #[test]
    fn list_without_first_index_is_empty_and_untouched() {
        let mut r = record(&[("Files1", "//depot/b"), ("Change", "4")]);
        let before = r.clone();
        assert!(extract_indexed_list(&mut r, "Files").is_empty());
        assert_eq!(r, before);
    }

    #[test]
    fn list_stops_at_gap() {
        let mut r = record(&[("View0", "a"), ("View2", "c")]);
        assert_eq!(extract_indexed_list(&mut r, "View"), ["a"]);
        assert_eq!(r, record(&[("View2", "c")]));
    }

    #[test]
    fn list_prefix_is_exact() {
        let mut r = record(&[("Files0", "a"), ("OtherFiles0", "b")]);
        assert_eq!(extract_indexed_list(&mut r, "Files"), ["a"]);
        assert!(r.contains_key("OtherFiles0"));
    }

    // ── Indexed composites ──────────────────────────────────────────

    #[test]
    fn composite_groups_by_index_and_shares_plain_keys() {
        let r = record(&[
            ("code", "stat"),
            ("depotFile", "//depot/a"),
            ("action0", "edit"),
            ("change0", "12"),
            ("action1", "add"),
            ("change1", "10"),
            ("user", "alice"),
        ]);
        let groups = extract_indexed_composite(r, &REVISION_KEY);

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups[&0],
            record(&[
                ("action", "edit"),
                ("change", "12"),
                ("code", "stat"),
                ("depotFile", "//depot/a"),
                ("user", "alice"),
            ])
        );
        assert_eq!(
            groups[&1],
            record(&[
                ("action", "add"),
                ("change", "10"),
                ("code", "stat"),
                ("depotFile", "//depot/a"),
                ("user", "alice"),
            ])
        );
    }

    #[test]
    fn composite_related_suffix_does_not_collide() {
        let r = record(&[("change0", "12"), ("change0,1", "7"), ("how0,0", "copy from")]);
        let groups = extract_indexed_composite(r, &REVISION_KEY);
        assert_eq!(
            groups[&0],
            record(&[("change", "12"), ("change1", "7"), ("how0", "copy from")])
        );
    }

    #[test]
    fn composite_keeps_first_seen_order() {
        let r = record(&[("rev3", "3"), ("rev1", "1"), ("rev2", "2")]);
        let order: Vec<usize> = extract_indexed_composite(r, &REVISION_KEY)
            .keys()
            .copied()
            .collect();
        assert_eq!(order, [3, 1, 2]);
    }

    #[test]
    fn composite_without_indexed_keys_is_empty() {
        let r = record(&[("code", "stat"), ("depotFile", "//depot/a")]);
        assert!(extract_indexed_composite(r, &REVISION_KEY).is_empty());
    }

    #[test]
    fn take_groups_leaves_other_keys_in_place() {
        let pattern = Regex::new(r"^(otherOpen|otherAction)([0-9]+)$").unwrap();
        let mut r = record(&[
            ("depotFile", "//depot/a"),
            ("otherOpen0", "bob@ws"),
            ("otherAction0", "edit"),
            ("otherOpen", "1"),
            ("otherLock0", "carol@ws"),
        ]);
        let groups = take_indexed_groups(&mut r, &pattern);

        assert_eq!(groups[&0], record(&[("otherOpen", "bob@ws"), ("otherAction", "edit")]));
        assert_eq!(
            r,
            record(&[
                ("depotFile", "//depot/a"),
                ("otherOpen", "1"),
                ("otherLock0", "carol@ws"),
            ])
        );
    }
}
