//! Property-based tests using QuickCheck

use aip_resourcename::{join, parent, segment, segment_count, segments, validate};
use quickcheck::{QuickCheck, TestResult};

fn clean(parts: &[String]) -> Vec<String> {
    parts
        .iter()
        .map(|p| p.replace('/', ""))
        .filter(|p| !p.is_empty())
        .collect()
}

/// Property: joining clean segments gives a valid name with those segments
#[test]
fn prop_join_segments() {
    fn prop(parts: Vec<String>) -> TestResult {
        let parts = clean(&parts);
        if parts.is_empty() {
            return TestResult::discard();
        }
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let name = join(&refs);
        TestResult::from_bool(
            validate(&name).is_ok()
                && segments(&name).eq(refs.iter().copied())
                && segment_count(&name) == refs.len(),
        )
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>) -> TestResult);
}

/// Property: negative and positive indices address the same segment
#[test]
fn prop_negative_indices() {
    fn prop(parts: Vec<String>, index: usize) -> TestResult {
        let parts = clean(&parts);
        if parts.is_empty() {
            return TestResult::discard();
        }
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let name = join(&refs);
        let count = refs.len();
        let i = index % count;
        let negative = i as isize - count as isize;
        TestResult::from_bool(segment(&name, i as isize) == segment(&name, negative))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>, usize) -> TestResult);
}

/// Property: a parent is the name minus two segments
#[test]
fn prop_parent_drops_one_pair() {
    fn prop(parts: Vec<String>) -> TestResult {
        let parts = clean(&parts);
        if parts.len() < 3 {
            return TestResult::discard();
        }
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let name = join(&refs);
        let expected = join(&refs[..refs.len() - 2]);
        TestResult::from_bool(parent(&name) == Some(expected.as_str()))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>) -> TestResult);
}
