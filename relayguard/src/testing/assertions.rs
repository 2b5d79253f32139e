//! Test assertions for coordinated event sequences.

use crate::core::{EventKind, StreamEvent};

/// Asserts the caller contract: at most one `error` event, and only as the
/// last element.
pub fn assert_well_formed(events: &[StreamEvent]) {
    let errors: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_error())
        .map(|(i, _)| i)
        .collect();
    match errors.as_slice() {
        [] => {}
        [index] => assert_eq!(
            *index,
            events.len() - 1,
            "Error event at {} is followed by more events: {:?}",
            index,
            events
        ),
        _ => panic!("Expected at most one error event, got {}: {:?}", errors.len(), events),
    }
}

/// Asserts the sequence ends in exactly one error event and returns its message.
pub fn assert_ends_with_error(events: &[StreamEvent]) -> String {
    assert_well_formed(events);
    let last = events.last().expect("Expected an error event, got no events");
    assert!(
        last.is_error(),
        "Expected the last event to be an error, got {:?}",
        last.kind
    );
    last.content_str().to_string()
}

/// Asserts the sequence contains no error event.
pub fn assert_no_error(events: &[StreamEvent]) {
    assert!(
        events.iter().all(|e| !e.is_error()),
        "Expected no error events, got: {:?}",
        events
    );
}

/// Asserts the kinds of the events, in order.
pub fn assert_kinds(events: &[StreamEvent], expected: &[EventKind]) {
    let actual: Vec<EventKind> = events.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(actual, expected, "Unexpected event kinds");
}
