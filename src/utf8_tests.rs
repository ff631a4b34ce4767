use super::*;

#[track_caller]
fn reject(bytes: &[u8], mode: Mode) -> Error {
    match validate(bytes, mode) {
        Ok(_) => panic!("expected {bytes:?} to be rejected"),
        Err(err) => err,
    }
}

#[test]
fn accepts_well_formed_text() {
    let inputs: &[&[u8]] = &[
        b"",
        b"plain ascii",
        "caf\u{e9}".as_bytes(),
        "\u{20AC} sign".as_bytes(),
        "\u{10348} gothic".as_bytes(),
        "\u{10FFFF}".as_bytes(),
        "\u{D7FF}\u{E000}".as_bytes(),
    ];
    for input in inputs {
        assert_eq!(validate(input, Mode::Document).ok(), std::str::from_utf8(input).ok());
        assert!(validate(input, Mode::StringContent).is_ok(), "{input:?}");
    }
}

#[test]
fn rejects_malformed_sequences() {
    let cases: &[&[u8]] = &[
        &[0x80],                   // lone continuation byte
        &[0xC0, 0xAF],             // overlong '/'
        &[0xC1, 0xBF],             // overlong two-byte
        &[0xE0, 0x80, 0xAF],       // overlong three-byte
        &[0xED, 0xA0, 0x80],       // surrogate U+D800
        &[0xF0, 0x80, 0x80, 0xAF], // overlong four-byte
        &[0xF4, 0x90, 0x80, 0x80], // past U+10FFFF
        &[0xF5, 0x80, 0x80, 0x80], // invalid lead
        &[0xE2, 0x82],             // truncated
        &[0xC3, 0x41],             // bad continuation
    ];
    for case in cases {
        let err = reject(case, Mode::Document);
        assert!(matches!(err.kind, ErrorKind::InvalidUtf8), "{case:?}");
    }
}

#[test]
fn reports_line_and_offset() {
    let mut input = b"a = 1\nb = 2\nc = \"".to_vec();
    input.push(0xFF);
    input.push(b'"');
    let err = reject(&input, Mode::Document);
    assert_eq!(err.line_info, Some((2, 5)));
    assert_eq!(err.span, Span::new(17, 18));
}

#[test]
fn string_content_mode_rejects_control_bytes() {
    for b in (0x00u8..=0x08).chain(0x0B..=0x1F).chain([0x7F]) {
        let input = [b'x', b, b'y'];
        assert!(validate(&input, Mode::Document).is_ok());
        let err = reject(&input, Mode::StringContent);
        assert!(matches!(err.kind, ErrorKind::InvalidControlChar(c) if c == b));
        assert_eq!(err.line_info, Some((0, 1)));
    }
    assert!(validate(b"tab\tand\nnewline", Mode::StringContent).is_ok());
}

#[test]
fn escape_scalar_bounds() {
    assert_eq!(escape_scalar(0x41), Some('A'));
    assert_eq!(escape_scalar(0x10FFFF), Some('\u{10FFFF}'));
    assert_eq!(escape_scalar(0xD800), None);
    assert_eq!(escape_scalar(0xDFFF), None);
    assert_eq!(escape_scalar(0x110000), None);
}

#[test]
fn randomized_agrees_with_std() {
    let mut rng = oorandom::Rand32::new(17);
    for _ in 0..20000 {
        let len = (rng.rand_u32() % 8) as usize;
        let bytes: Vec<u8> = (0..len).map(|_| (rng.rand_u32() % 256) as u8).collect();
        assert_eq!(
            validate(&bytes, Mode::Document).ok(),
            std::str::from_utf8(&bytes).ok(),
            "{bytes:?}"
        );
    }
}
