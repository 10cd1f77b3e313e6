// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audience segment evaluation.
//!
//! A pure predicate over one [`AudienceMember`] and a campaign's
//! [`SegmentFilter`]. Clauses that are absent (or given as an empty list) do
//! not filter; the clauses that are present must all pass.
//!
//! Ward and booth clauses let members *without* a ward or booth label through.
//! Audience rows are often sparsely tagged and dropping them silently would
//! shrink geographically-targeted campaigns. This is pinned by tests; change
//! it deliberately if it is ever changed.

use herald_core::{AudienceMember, OneOrMany, SegmentFilter};

/// Does `member` fall inside the segment described by `filter`?
pub fn matches(member: &AudienceMember, filter: &SegmentFilter) -> bool {
    if filter.exclude_opted_out && member.opted_out {
        return false;
    }

    if !label_clause(filter.ward.as_ref(), member.ward.as_deref()) {
        return false;
    }

    if !label_clause(filter.booth.as_ref(), member.booth.as_deref()) {
        return false;
    }

    if let Some(tags) = filter.tags.as_ref().filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| member.tags.contains(t)) {
            return false;
        }
    }

    if let Some(capable) = filter.whatsapp_capable {
        if member.whatsapp_capable != capable {
            return false;
        }
    }

    true
}

/// The members matching `filter`, in their original order.
pub fn segment<'a>(members: &'a [AudienceMember], filter: &SegmentFilter) -> Vec<&'a AudienceMember> {
    members.iter().filter(|m| matches(m, filter)).collect()
}

/// Ward/booth clause: a labelled member must carry one of the allowed
/// labels; an unlabelled member passes.
fn label_clause(allowed: Option<&OneOrMany<String>>, label: Option<&str>) -> bool {
    match (allowed, label) {
        (None, _) => true,
        (Some(allowed), _) if allowed.is_empty() => true,
        (Some(_), None) => true,
        (Some(allowed), Some(label)) => allowed.as_slice().iter().any(|a| a == label),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    fn member(id: &str) -> AudienceMember {
        AudienceMember {
            id: id.into(),
            name: None,
            phone: format!("+1555{id}"),
            ward: None,
            booth: None,
            tags: BTreeSet::new(),
            whatsapp_capable: false,
            opted_out: false,
        }
    }

    fn with_ward(id: &str, ward: &str) -> AudienceMember {
        AudienceMember {
            ward: Some(ward.to_string()),
            ..member(id)
        }
    }

    fn with_tags(id: &str, tags: &[&str]) -> AudienceMember {
        AudienceMember {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..member(id)
        }
    }

    #[test]
    fn empty_filter_matches_everyone() {
        let filter = SegmentFilter::default();
        assert!(matches(&member("1"), &filter));
        let opted = AudienceMember {
            opted_out: true,
            ..member("2")
        };
        // The filter alone does not exclude opted-out members unless asked to.
        assert!(matches(&opted, &filter));
    }

    #[test]
    fn exclude_opted_out_short_circuits() {
        let filter = SegmentFilter {
            exclude_opted_out: true,
            ..Default::default()
        };
        let opted = AudienceMember {
            opted_out: true,
            ..with_ward("1", "12")
        };
        assert!(!matches(&opted, &filter));
    }

    #[test]
    fn ward_scalar_and_list() {
        let scalar = SegmentFilter {
            ward: Some(OneOrMany::One("12".into())),
            ..Default::default()
        };
        assert!(matches(&with_ward("1", "12"), &scalar));
        assert!(!matches(&with_ward("2", "13"), &scalar));

        let list = SegmentFilter {
            ward: Some(OneOrMany::Many(vec!["12".into(), "13".into()])),
            ..Default::default()
        };
        assert!(matches(&with_ward("2", "13"), &list));
        assert!(!matches(&with_ward("3", "14"), &list));
    }

    #[test]
    fn member_without_ward_passes_ward_clause() {
        let filter = SegmentFilter {
            ward: Some(OneOrMany::One("12".into())),
            ..Default::default()
        };
        assert!(matches(&member("1"), &filter));
    }

    #[test]
    fn member_without_booth_passes_booth_clause() {
        let filter = SegmentFilter {
            booth: Some(OneOrMany::Many(vec!["B-7".into()])),
            ..Default::default()
        };
        assert!(matches(&member("1"), &filter));
        let elsewhere = AudienceMember {
            booth: Some("B-9".into()),
            ..member("2")
        };
        assert!(!matches(&elsewhere, &filter));
    }

    #[test]
    fn tags_clause_has_no_pass_through() {
        let filter = SegmentFilter {
            tags: Some(vec!["volunteer".into(), "donor".into()]),
            ..Default::default()
        };
        assert!(!matches(&member("1"), &filter));
        assert!(!matches(&with_tags("2", &["youth"]), &filter));
        assert!(matches(&with_tags("3", &["youth", "donor"]), &filter));
    }

    #[test]
    fn empty_tag_list_is_an_absent_clause() {
        let filter = SegmentFilter {
            tags: Some(vec![]),
            ..Default::default()
        };
        assert!(matches(&member("1"), &filter));
    }

    #[test]
    fn whatsapp_capability_is_exact() {
        let filter = SegmentFilter {
            whatsapp_capable: Some(false),
            ..Default::default()
        };
        let capable = AudienceMember {
            whatsapp_capable: true,
            ..member("1")
        };
        assert!(!matches(&capable, &filter));
        assert!(matches(&member("2"), &filter));
    }

    #[test]
    fn all_clauses_must_pass() {
        let filter = SegmentFilter {
            ward: Some(OneOrMany::One("12".into())),
            tags: Some(vec!["volunteer".into()]),
            ..Default::default()
        };
        let right_ward_no_tag = with_ward("1", "12");
        let both = AudienceMember {
            tags: ["volunteer".to_string()].into_iter().collect(),
            ..with_ward("2", "12")
        };
        assert!(!matches(&right_ward_no_tag, &filter));
        assert!(matches(&both, &filter));
    }

    #[test]
    fn segment_preserves_order() {
        let members = vec![
            with_tags("1", &["a"]),
            with_tags("2", &["b"]),
            with_tags("3", &["a"]),
        ];
        let filter = SegmentFilter {
            tags: Some(vec!["a".into()]),
            ..Default::default()
        };
        let ids: Vec<&str> = segment(&members, &filter)
            .iter()
            .map(|m| m.id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    fn arb_member() -> impl Strategy<Value = AudienceMember> {
        (
            "[0-9]{1,4}",
            proptest::option::of("[0-9]{1,2}"),
            proptest::option::of("B-[0-9]"),
            proptest::collection::btree_set("[a-d]", 0..4),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(id, ward, booth, tags, capable, opted_out)| AudienceMember {
                id: id.as_str().into(),
                name: None,
                phone: format!("+1555{id}"),
                ward,
                booth,
                tags,
                whatsapp_capable: capable,
                opted_out,
            })
    }

    fn arb_filter() -> impl Strategy<Value = SegmentFilter> {
        (
            proptest::option::of(proptest::collection::vec("[0-9]{1,2}", 0..3)),
            proptest::option::of(proptest::collection::vec("B-[0-9]", 0..3)),
            proptest::option::of(proptest::collection::vec("[a-d]", 0..3)),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(|(ward, booth, tags, capable)| SegmentFilter {
                exclude_opted_out: true,
                ward: ward.map(OneOrMany::Many),
                booth: booth.map(OneOrMany::Many),
                tags,
                whatsapp_capable: capable,
            })
    }

    proptest! {
        #[test]
        fn opted_out_members_never_selected_when_excluded(
            members in proptest::collection::vec(arb_member(), 0..20),
            filter in arb_filter(),
        ) {
            for m in segment(&members, &filter) {
                prop_assert!(!m.opted_out);
            }
        }

        #[test]
        fn tags_only_filter_is_set_intersection(
            m in arb_member(),
            wanted in proptest::collection::vec("[a-d]", 1..3),
        ) {
            let filter = SegmentFilter { tags: Some(wanted.clone()), ..Default::default() };
            let overlaps = wanted.iter().any(|t| m.tags.contains(t));
            prop_assert_eq!(matches(&m, &filter), overlaps);
        }

        #[test]
        fn segment_is_a_subsequence(
            members in proptest::collection::vec(arb_member(), 0..20),
            filter in arb_filter(),
        ) {
            let selected = segment(&members, &filter);
            let mut it = members.iter();
            for s in selected {
                prop_assert!(it.any(|m| std::ptr::eq(m, s)));
            }
        }
    }
}
