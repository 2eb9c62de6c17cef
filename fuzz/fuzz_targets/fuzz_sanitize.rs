#![no_main]
//! Drives arbitrary byte soup through append → sanitize and checks the
//! invariants the buffer promises: bounded length, trailing terminator,
//! valid UTF-8 after repair, and a second pass that changes nothing.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textbuf::TextBuf;

#[derive(Arbitrary, Debug)]
struct Case<'a> {
    data: &'a [u8],
    // Small capacities force the `?` fallback paths of the sanitizer.
    capacity: u8,
}

fuzz_target!(|case: Case<'_>| {
    let mut arena = [0u8; 256];
    let cap = usize::from(case.capacity).max(1).min(arena.len());
    let storage = &mut arena[..cap];

    let mut buf = TextBuf::new(storage);
    buf.append(case.data);
    assert!(buf.len() < cap);

    let first = buf.sanitize();
    assert_eq!(first, buf.len());
    assert!(first < cap);
    assert!(buf.validate());

    let snapshot: Vec<u8> = buf.as_bytes().to_vec();
    let second = buf.sanitize();
    assert_eq!(second, first);
    assert_eq!(buf.as_bytes(), snapshot.as_slice());

    drop(buf);
    assert_eq!(arena[first], 0);
});
