//! Query text lexer.
//!
//! Splits the raw text into the positional occurrences of each recognised key.
//! Every `v=(...)` value is captured as a parenthesised group with its
//! matching close paren, so each collection filter keeps its own sub-query.

pub(crate) const OPERATION_KEY: &str = "o";
pub(crate) const PROPERTY_KEY: &str = "p";
pub(crate) const VALUE_KEY: &str = "v";
pub(crate) const SORT_KEY: &str = "s";
pub(crate) const OFFSET_KEY: &str = "offset";
pub(crate) const COUNT_KEY: &str = "count";

/// A `v` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawValue {
    Literal(String),
    /// Parenthesised value. `inner` is the text between the parens, still
    /// encoded unless `decoded` is set; `literal` is the decoded text
    /// including the parens.
    Group {
        inner: String,
        literal: String,
        decoded: bool,
    },
    /// A group that could not be delimited. Reported once the filter
    /// triplets are known to line up.
    Malformed(&'static str),
}

/// Occurrences of each key, in query order.
#[derive(Debug, Default)]
pub(crate) struct Lexed {
    pub operations: Vec<String>,
    pub properties: Vec<String>,
    pub values: Vec<RawValue>,
    pub sorts: Vec<String>,
    pub offsets: Vec<String>,
    pub counts: Vec<String>,
}

impl Lexed {
    fn push(&mut self, key: &str, value: String) {
        if key.eq_ignore_ascii_case(OPERATION_KEY) {
            self.operations.push(clear_spaces(&value));
        } else if key.eq_ignore_ascii_case(PROPERTY_KEY) {
            self.properties.push(clear_spaces(&value));
        } else if key.eq_ignore_ascii_case(VALUE_KEY) {
            self.values.push(group_of(value));
        } else if key.eq_ignore_ascii_case(SORT_KEY) {
            self.sorts.push(clear_spaces(&value));
        } else if key.eq_ignore_ascii_case(OFFSET_KEY) {
            self.offsets.push(clear_spaces(&value));
        } else if key.eq_ignore_ascii_case(COUNT_KEY) {
            self.counts.push(clear_spaces(&value));
        } else {
            log::trace!("ignoring unknown query key '{}'", key);
        }
    }
}

/// A value that arrived percent-encoded may still be a whole group.
fn group_of(value: String) -> RawValue {
    if value.starts_with('(') && matching_paren(&value, 0) == Some(value.len() - 1) {
        RawValue::Group {
            inner: value[1..value.len() - 1].to_string(),
            literal: value,
            decoded: true,
        }
    } else {
        RawValue::Literal(value)
    }
}

fn clear_spaces(text: &str) -> String {
    text.replace(' ', "")
}

/// Returns `true` when the text looks like a fully encoded query: no raw `=`
/// but an encoded one.
pub(crate) fn is_fully_encoded(text: &str) -> bool {
    !text.contains('=') && text.to_ascii_lowercase().contains("%3d")
}

/// Form-decodes one component unless the text is already decoded.
///
/// `+` is a space and malformed escapes are left untouched.
pub(crate) fn decode(text: &str, decoded: bool) -> String {
    if decoded {
        return text.to_string();
    }
    let spaced = text.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(value) => value.into_owned(),
        Err(_) => spaced,
    }
}

/// Index of the paren closing the one at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Lexes `text` into key occurrences.
///
/// Lexing never fails; an undelimited group is kept as
/// [`RawValue::Malformed`] in its `v` position.
pub(crate) fn lex(text: &str, decoded: bool) -> Lexed {
    let mut lexed = Lexed::default();
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < text.len() {
        let end = text[pos..].find('&').map_or(text.len(), |i| pos + i);
        let segment = &text[pos..end];
        let Some(eq) = segment.find('=') else {
            pos = end + 1;
            continue;
        };

        let key = decode(&segment[..eq], decoded);
        let value_start = pos + eq + 1;

        if key.eq_ignore_ascii_case(VALUE_KEY) && bytes.get(value_start) == Some(&b'(') {
            let Some(close) = matching_paren(text, value_start) else {
                lexed
                    .values
                    .push(RawValue::Malformed("unbalanced parentheses in nested query"));
                break;
            };
            let after = close + 1;
            if after < text.len() && bytes[after] != b'&' {
                lexed
                    .values
                    .push(RawValue::Malformed("unexpected text after nested query"));
                pos = text[after..].find('&').map_or(text.len(), |i| after + i) + 1;
                continue;
            }
            lexed.values.push(RawValue::Group {
                inner: text[value_start + 1..close].to_string(),
                literal: decode(&text[value_start..after], decoded),
                decoded,
            });
            pos = after + 1;
            continue;
        }

        lexed.push(&key, decode(&segment[eq + 1..], decoded));
        pos = end + 1;
    }

    lexed
}
