//! Extraction of sub-fields from SDP format-parameter (`a=fmtp`) strings.
//!
//! Two primitives cover every lookup the resolver needs:
//!
//! - [`find_field`]: substring between a start marker and an end marker,
//!   used for `config=` and `sprop-parameter-sets=`.
//! - [`Pattern`]: a fixed token sequence matched against the whole fmtp
//!   value, used for the positional H.265 `sprop-vps/sps/pps` layout.
//!
//! ```text
//! a=fmtp:96 sprop-vps=QAEMAf//AWAAAAMAkAAAAwAAAwBdlZgJ; sprop-sps=QgEBAWAAAAMAkAAAAwAAAwBdoAKAgC0WNlmZpJMrgEAAAAMAQAAAB4I=; sprop-pps=RAHBcrRiQA==
//!        └┬┘└─────────────────┬──────────────────┘  └──────────────────────┬───────────────────────────────────┘  └──────┬──────────┘
//!      Integer   Literal + Field                             Literal + Field                                    Literal + Field
//! ```

/// Return the text strictly between `start` and the next `end`.
///
/// - `start` of `None` (or empty) anchors at the beginning of `src`.
/// - `end` of `None` runs to the end of `src`.
/// - A missing `start` marker, or a missing `end` marker after it, yields `""`.
///
/// ```
/// use media_factory::attribute::find_field;
///
/// let fmtp = "streamtype=5;mode=AAC-hbr;config=1210;sizelength=13";
/// assert_eq!(find_field(fmtp, Some("config="), Some(";")), "1210");
/// assert_eq!(find_field(fmtp, Some("config="), None), "1210;sizelength=13");
/// assert_eq!(find_field(fmtp, Some("profile="), None), "");
/// ```
pub fn find_field<'a>(src: &'a str, start: Option<&str>, end: Option<&str>) -> &'a str {
    let begin = match start.filter(|s| !s.is_empty()) {
        Some(marker) => match src.find(marker) {
            Some(pos) => pos + marker.len(),
            None => return "",
        },
        None => 0,
    };
    let rest = &src[begin..];
    match end {
        Some(marker) => match rest.find(marker) {
            Some(pos) => &rest[..pos],
            None => "",
        },
        None => rest,
    }
}

/// Look up the AAC `config=` value.
///
/// The first pass reads to the end of the string, which is right when
/// `config=` is the last parameter. If that does not give exactly four hex
/// characters, a second pass stops at the next `;`.
pub fn find_aac_config(fmtp: &str) -> &str {
    let value = find_field(fmtp, Some("config="), None);
    if value.len() == 4 {
        return value;
    }
    find_field(fmtp, Some("config="), Some(";"))
}

/// One element of a [`Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Decimal integer, optionally signed, leading whitespace skipped.
    Integer,
    /// Literal text. A space matches any run of whitespace, including none.
    Literal(&'static str),
    /// One or more characters up to (not including) the next `;`.
    Field,
}

/// Values captured by a successful [`Pattern::captures`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures<'a> {
    pub integers: Vec<i64>,
    pub fields: Vec<&'a str>,
}

/// Fixed token sequence matched from the start of the input.
///
/// Trailing input after the last token is ignored.
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    tokens: &'static [Token],
}

/// `<pt> sprop-vps=<A>; sprop-sps=<B>; sprop-pps=<C>` (RFC 7798 §7.1).
pub const H265_VPS_SPS_PPS: Pattern = Pattern::new(&[
    Token::Integer,
    Token::Literal(" sprop-vps="),
    Token::Field,
    Token::Literal("; sprop-sps="),
    Token::Field,
    Token::Literal("; sprop-pps="),
    Token::Field,
]);

/// `<pt> sprop-sps=<B>; sprop-pps=<C>`, senders that omit the VPS.
pub const H265_SPS_PPS: Pattern = Pattern::new(&[
    Token::Integer,
    Token::Literal(" sprop-sps="),
    Token::Field,
    Token::Literal("; sprop-pps="),
    Token::Field,
]);

impl Pattern {
    pub const fn new(tokens: &'static [Token]) -> Self {
        Self { tokens }
    }

    /// Match the whole pattern against `input`.
    ///
    /// Returns `None` unless every token matches.
    pub fn captures<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        let mut rest = input;
        let mut captures = Captures::default();

        for token in self.tokens {
            match *token {
                Token::Integer => {
                    let (value, tail) = scan_integer(rest)?;
                    captures.integers.push(value);
                    rest = tail;
                }
                Token::Literal(text) => {
                    rest = scan_literal(rest, text)?;
                }
                Token::Field => {
                    let len = rest.find(';').unwrap_or(rest.len());
                    if len == 0 {
                        return None;
                    }
                    captures.fields.push(&rest[..len]);
                    rest = &rest[len..];
                }
            }
        }

        Some(captures)
    }
}

fn scan_integer(input: &str) -> Option<(i64, &str)> {
    let trimmed = input.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['+', '-']));
    let digits = trimmed[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    let end = sign_len + digits;
    let value = trimmed[..end].parse().ok()?;
    Some((value, &trimmed[end..]))
}

fn scan_literal<'a>(input: &'a str, literal: &str) -> Option<&'a str> {
    let mut rest = input;
    for ch in literal.chars() {
        if ch.is_whitespace() {
            rest = rest.trim_start();
        } else {
            rest = rest.strip_prefix(ch)?;
        }
    }
    Some(rest)
}
