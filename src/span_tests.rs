use super::*;

#[test]
fn span_basics_and_conversions() {
    let s = Span::new(10, 20);
    assert_eq!(s.start, 10);
    assert_eq!(s.end, 20);
    assert_eq!(s.len(), 10);

    assert!(Span::new(0, 0).is_empty());
    assert!(Span::new(7, 7).is_empty());
    assert!(!Span::new(0, 1).is_empty());
    assert!(!Span::new(7, 8).is_empty());
    assert_eq!(Span::new(5, 2).len(), 0);
    assert!(Span::new(5, 2).is_empty());

    assert_eq!(Span::new(1, 2), Span::new(1, 2));
    assert_ne!(Span::new(1, 2), Span::new(1, 3));

    let t: (u32, u32) = Span::new(5, 10).into();
    assert_eq!(t, (5, 10));

    let t: (usize, usize) = Span::new(5, 10).into();
    assert_eq!(t, (5, 10));

    let s: Span = (3u32..7u32).into();
    assert_eq!(s, Span::new(3, 7));

    let r: std::ops::Range<u32> = Span::new(3, 7).into();
    assert_eq!(r, 3..7);

    let r: std::ops::Range<usize> = Span::new(3, 7).into();
    assert_eq!(r, 3usize..7usize);
}

#[test]
fn span_from_usize_offsets() {
    assert_eq!(Span::at(4, 9), Span::new(4, 9));
    assert_eq!(Span::default(), Span::new(0, 0));
}
