//! Property-based tests for dynaq using proptest.

use std::cmp::Ordering;

use dynaq::{apply, collate, collate_ignore_case, parse, Query, Queryable};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, Queryable)]
struct TestItem {
    value: i64,
    name: String,
    active: bool,
    marks: Vec<i64>,
}

fn test_item_strategy() -> impl Strategy<Value = TestItem> {
    (
        any::<i64>(),
        "[a-zA-Z]{1,10}",
        any::<bool>(),
        prop::collection::vec(-50i64..50, 0..6),
    )
        .prop_map(|(value, name, active, marks)| TestItem {
            value,
            name,
            active,
            marks,
        })
}

fn run<'a>(items: &'a [TestItem], query: &str) -> Vec<&'a TestItem> {
    let mut options = parse(query, None).unwrap();
    apply(Query::new(items), Some(&mut options)).unwrap().to_vec()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Parsing arbitrary text fails cleanly or succeeds; it never panics.
    #[test]
    fn parse_never_panics(text in ".{0,80}") {
        let _ = parse(&text, None);
    }

    /// Parsing arbitrary key/value soup never panics either.
    #[test]
    fn parse_query_like_text_never_panics(
        parts in prop::collection::vec(("(o|p|v|s|offset|count)", "[a-z0-9(),|%=]{0,8}"), 0..8),
    ) {
        let text = parts
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let _ = parse(&text, None);
    }

    /// A relational filter keeps exactly the items the same comparison keeps.
    #[test]
    fn relational_filter_matches_std(
        items in prop::collection::vec(test_item_strategy(), 0..50),
        threshold in any::<i64>(),
    ) {
        let results = run(&items, &format!("o=gt&p=value&v={threshold}"));
        let expected: Vec<_> = items.iter().filter(|i| i.value > threshold).collect();
        prop_assert_eq!(results.len(), expected.len());
        for (got, want) in results.iter().zip(&expected) {
            prop_assert!(std::ptr::eq(*got, *want));
        }
    }

    /// A filter and its negation partition the input.
    #[test]
    fn equality_and_inequality_partition(
        items in prop::collection::vec(test_item_strategy(), 0..50),
        flag in any::<bool>(),
    ) {
        let eq = run(&items, &format!("o=eq&p=active&v={flag}"));
        let ne = run(&items, &format!("o=ne&p=active&v={flag}"));
        prop_assert_eq!(eq.len() + ne.len(), items.len());
    }

    /// `In` keeps an item exactly when its value is listed.
    #[test]
    fn in_matches_membership(
        items in prop::collection::vec(test_item_strategy(), 0..30),
        listed in prop::collection::vec(-5i64..5, 1..5),
    ) {
        let items: Vec<_> = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| TestItem { value: i as i64 % 10 - 5, ..item })
            .collect();
        let values = listed.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");

        let kept = run(&items, &format!("o=in&p=value&v={values}"));
        let dropped = run(&items, &format!("o=nin&p=value&v={values}"));

        prop_assert!(kept.iter().all(|i| listed.contains(&i.value)));
        prop_assert!(dropped.iter().all(|i| !listed.contains(&i.value)));
        prop_assert_eq!(kept.len() + dropped.len(), items.len());
    }

    /// `Any` and `All` agree with iterator `any`/`all`.
    #[test]
    fn quantifiers_match_iterators(
        items in prop::collection::vec(test_item_strategy(), 0..30),
        threshold in -50i64..50,
    ) {
        let any = run(&items, &format!("o=any&p=marks&v=(o=gtoe&p=_&v={threshold})"));
        let all = run(&items, &format!("o=all&p=marks&v=(o=gtoe&p=_&v={threshold})"));

        let expected_any = items.iter().filter(|i| i.marks.iter().any(|m| *m >= threshold)).count();
        let expected_all = items.iter().filter(|i| i.marks.iter().all(|m| *m >= threshold)).count();
        prop_assert_eq!(any.len(), expected_any);
        prop_assert_eq!(all.len(), expected_all);
    }

    /// Sorting yields a non-decreasing (or non-increasing) sequence.
    #[test]
    fn sort_is_ordered(
        items in prop::collection::vec(test_item_strategy(), 0..50),
        desc in any::<bool>(),
    ) {
        let dir = if desc { "desc" } else { "asc" };
        let results = run(&items, &format!("s=value,{dir}"));
        prop_assert_eq!(results.len(), items.len());
        for pair in results.windows(2) {
            if desc {
                prop_assert!(pair[0].value >= pair[1].value);
            } else {
                prop_assert!(pair[0].value <= pair[1].value);
            }
        }
    }

    /// Case-insensitive sorting orders by lowercase text.
    #[test]
    fn case_insensitive_sort(items in prop::collection::vec(test_item_strategy(), 0..30)) {
        let results = run(&items, "s=name");
        for pair in results.windows(2) {
            prop_assert!(pair[0].name.to_lowercase() <= pair[1].name.to_lowercase());
        }
    }

    /// Pagination is skip-then-take over the unwindowed result.
    #[test]
    fn pagination_is_a_slice(
        items in prop::collection::vec(test_item_strategy(), 0..50),
        offset in 0i64..60,
        count in 1i64..20,
    ) {
        let all = run(&items, "s=value");
        let page = run(&items, &format!("s=value&offset={offset}&count={count}"));

        let expected: Vec<_> = all
            .iter()
            .skip(offset as usize)
            .take(count as usize)
            .map(|i| i.value)
            .collect();
        let got: Vec<_> = page.iter().map(|i| i.value).collect();
        prop_assert_eq!(got, expected);
    }

    /// Collation is antisymmetric.
    #[test]
    fn collate_is_antisymmetric(a in "[a-zA-Z]{0,8}", b in "[a-zA-Z]{0,8}") {
        prop_assert_eq!(collate(&a, &b), collate(&b, &a).reverse());
        prop_assert_eq!(collate_ignore_case(&a, &b), collate_ignore_case(&b, &a).reverse());
    }

    /// Collation only calls strings equal when they are identical.
    #[test]
    fn collate_equal_means_identical(a in "[a-zA-Z]{0,8}", b in "[a-zA-Z]{0,8}") {
        prop_assert_eq!(collate(&a, &b) == Ordering::Equal, a == b);
    }
}
