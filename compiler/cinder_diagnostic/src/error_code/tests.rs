use std::collections::HashSet;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn codes_are_unique_and_sorted() {
    let strings: Vec<&str> = ErrorCode::ALL.iter().map(ErrorCode::as_str).collect();
    let unique: HashSet<&str> = strings.iter().copied().collect();
    assert_eq!(unique.len(), strings.len());

    let mut sorted = strings.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, strings);
}

#[test]
fn parses_back_from_display() {
    for code in ErrorCode::ALL {
        assert_eq!(code.to_string().parse::<ErrorCode>(), Ok(*code));
    }
    assert_eq!("e7010".parse::<ErrorCode>(), Ok(ErrorCode::E7010));
    assert_eq!("E1234".parse::<ErrorCode>(), Err(()));
}

#[test]
fn category_predicates() {
    assert!(ErrorCode::E7002.is_mode_error());
    assert!(ErrorCode::E7020.is_mode_error());
    assert!(!ErrorCode::E7004.is_mode_error());

    assert!(ErrorCode::E7008.is_pinning_error());
    assert!(ErrorCode::E7011.is_pinning_error());
    assert!(!ErrorCode::E7012.is_pinning_error());

    assert!(ErrorCode::E7006.is_conversion_error());
    assert!(ErrorCode::E9002.is_internal_error());
}
