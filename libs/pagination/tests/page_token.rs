//! Page token behaviour across requests

use aip_pagination::{decode, encode, Error, PageToken};
use quickcheck::{QuickCheck, TestResult};
use serde::Serialize;

#[derive(Serialize)]
struct ListBooks<'a> {
    parent: &'a str,
    filter: &'a str,
    order_by: &'a str,
}

const REQUEST: ListBooks<'static> = ListBooks {
    parent: "publishers/1",
    filter: "rating >= 4",
    order_by: "title",
};

#[test]
fn test_empty_token_is_first_page() {
    let token = PageToken::parse("", &REQUEST).unwrap();
    assert_eq!(token.offset, 0);
    assert_eq!(token, PageToken::for_request(&REQUEST).unwrap());
}

#[test]
fn test_follow_pages() {
    let first = PageToken::for_request(&REQUEST).unwrap();
    let second = first.next(25);
    let encoded = second.encode().unwrap();

    let parsed = PageToken::parse(&encoded, &REQUEST).unwrap();
    assert_eq!(parsed.offset, 25);
    assert_eq!(parsed.next(25).offset, 50);
}

#[test]
fn test_token_bound_to_request() {
    let token = PageToken::for_request(&REQUEST).unwrap().next(10).encode().unwrap();
    let other = ListBooks {
        filter: "rating >= 3",
        ..REQUEST
    };
    assert!(matches!(
        PageToken::parse(&token, &other),
        Err(Error::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_negative_offset_rejected() {
    let checksum = aip_pagination::request_checksum(&REQUEST).unwrap();
    let forged = encode(&PageToken {
        offset: -5,
        request_checksum: checksum,
    })
    .unwrap();
    assert!(matches!(
        PageToken::parse(&forged, &REQUEST),
        Err(Error::NegativeOffset(-5))
    ));
}

#[test]
fn test_garbage_tokens() {
    for token in ["%%%", "AAAA", "eyJvZmZzZXQiOjB9"] {
        assert!(PageToken::parse(token, &REQUEST).is_err(), "{token:?}");
    }
}

#[test]
fn test_next_saturates() {
    let token = PageToken {
        offset: i64::MAX - 1,
        request_checksum: 0,
    };
    assert_eq!(token.next(usize::MAX).offset, i64::MAX);
}

/// Property: any string list survives the codec
#[test]
fn prop_codec_round_trip() {
    fn prop(values: Vec<String>) -> TestResult {
        let Ok(token) = encode(&values) else {
            return TestResult::failed();
        };
        match decode::<Vec<String>>(&token) {
            Ok(back) => TestResult::from_bool(back == values),
            Err(_) => TestResult::failed(),
        }
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Vec<String>) -> TestResult);
}
