//! Integration tests for quill-common crate.

use quill_common::{BytePos, Span};

#[test]
fn test_span_merge() {
    let a = Span::from_usize(10, 20);
    let b = Span::from_usize(15, 30);
    let merged = a.merge(b);
    assert_eq!(merged.start.0, 10);
    assert_eq!(merged.end.0, 30);
}

#[test]
fn test_span_point_and_offset() {
    let point = Span::point(7);
    assert!(point.is_empty());
    assert_eq!(point.offset(), 7);
}

#[test]
fn test_span_range() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.range(), 5..15);
    assert_eq!(span.len(), 10);
}

#[test]
fn test_byte_pos_offset() {
    let pos = BytePos(10);
    assert_eq!(pos.offset(5), BytePos(15));
}
