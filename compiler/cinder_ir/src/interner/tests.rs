use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn same_text_same_name() {
    let interner = StringInterner::new();
    let a = interner.intern("buffer");
    let b = interner.intern("buffer");
    let c = interner.intern("length");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn lookup_round_trips_text() {
    let interner = StringInterner::new();
    let name = interner.intern("stackalloc");
    assert_eq!(interner.lookup(name).as_deref(), Some("stackalloc"));
    assert_eq!(interner.lookup(Name::EMPTY).as_deref(), Some(""));
}

#[test]
fn empty_string_is_preinterned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.len(), 1);
}

#[test]
fn concurrent_interning_agrees() {
    let interner = Arc::new(StringInterner::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let interner = Arc::clone(&interner);
            std::thread::spawn(move || {
                (0..64)
                    .map(|i| interner.intern(&format!("field{i}")))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<Vec<Name>> = handles
        .into_iter()
        .map(|h| h.join().unwrap_or_default())
        .collect();
    for other in &results[1..] {
        assert_eq!(&results[0], other);
    }
    assert_eq!(interner.len(), 65);
}
