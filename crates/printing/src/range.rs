//! Page-range expressions such as `"1-3,7,10-8"`.
//!
//! A range resolves to an ordered list of 1-based page numbers. Descending
//! segments are kept descending and nothing is deduplicated. Any malformed
//! segment makes the whole expression fall back to the full document.

use thiserror::Error;
use tracing::debug;

/// Reasons a single range segment is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range bounds are not numeric: first={begin:?}, second={end:?}")]
    NotNumeric { begin: String, end: String },
    #[error("range bounds must be at least 1: first={begin}, second={end}")]
    NotPositive { begin: i64, end: i64 },
    #[error("range bounds exceed {page_count} pages: first={begin}, second={end}")]
    OutOfBounds {
        begin: i64,
        end: i64,
        page_count: u32,
    },
}

const TOKEN_CAPACITY: usize = 4;

/// Fixed-width accumulator for one bound of a range segment.
///
/// Holds at most [`PageToken::CAPACITY`] characters; anything written past
/// that is dropped, so `"12345"` reads as `"1234"`. [`PageToken::rewind`]
/// moves the write position back to the start without clearing, so later
/// characters overwrite earlier ones.
/// 範圍區段中單一邊界的定長緩衝區，超出容量的字元會被捨棄。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageToken {
    chars: [char; TOKEN_CAPACITY],
    len: usize,
    position: usize,
}

impl PageToken {
    pub const CAPACITY: usize = TOKEN_CAPACITY;

    pub fn push(&mut self, ch: char) {
        if self.position < Self::CAPACITY {
            self.chars[self.position] = ch;
            self.position += 1;
            self.len = self.len.max(self.position);
        }
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn as_string(&self) -> String {
        self.chars[..self.len].iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Returns true when `token` is a complete decimal number with no leading whitespace.
///
/// Negative values are accepted here; callers reject them through their own
/// bound checks.
pub fn is_numeric(token: &str) -> bool {
    match token.chars().next() {
        None => false,
        Some(first) if first.is_ascii_whitespace() => false,
        Some(_) => token.parse::<f64>().is_ok(),
    }
}

/// Integer value of the leading `[+-]digits` prefix, zero when there is none.
fn leading_integer(token: &str) -> i64 {
    let mut chars = token.chars().peekable();
    let negative = match chars.peek() {
        Some('-') => {
            chars.next();
            true
        }
        Some('+') => {
            chars.next();
            false
        }
        _ => false,
    };
    let mut value: i64 = 0;
    for ch in chars {
        let Some(digit) = ch.to_digit(10) else {
            break;
        };
        value = value.saturating_mul(10).saturating_add(i64::from(digit));
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Parses one comma-free segment (`"3-1"`, `"5"`, `" 12 "`) and appends its
/// pages to `pages`.
///
/// On error `pages` may already hold part of the segment; callers are
/// expected to discard the whole list.
pub fn parse_segment(segment: &str, page_count: u32, pages: &mut Vec<u32>) -> Result<(), RangeError> {
    let mut begin = PageToken::default();
    let mut end = PageToken::default();
    let mut dash_seen = false;

    for ch in segment.chars().filter(|ch| !ch.is_ascii_whitespace()) {
        if ch == '-' {
            dash_seen = true;
            begin.rewind();
            end.rewind();
            continue;
        }
        if dash_seen {
            end.push(ch);
        } else {
            begin.push(ch);
        }
    }

    if !dash_seen {
        end.push('0');
    }

    let (begin, end) = (begin.as_string(), end.as_string());
    if !is_numeric(&begin) || !is_numeric(&end) {
        return Err(RangeError::NotNumeric { begin, end });
    }

    let mut first = leading_integer(&begin);
    let mut last = leading_integer(&end);
    if last == 0 {
        last = first;
    }

    if first <= 0 || last <= 0 {
        return Err(RangeError::NotPositive {
            begin: first,
            end: last,
        });
    }

    let limit = i64::from(page_count);
    if first > limit || last > limit {
        return Err(RangeError::OutOfBounds {
            begin: first,
            end: last,
            page_count,
        });
    }

    // Bounds are within 1..=page_count from here on, so the casts are lossless.
    if last >= first {
        last = last.min(limit);
        pages.extend((first..=last).map(|page| page as u32));
    } else {
        first = first.min(limit);
        pages.extend((last..=first).rev().map(|page| page as u32));
    }
    Ok(())
}

/// Parses every segment of `expression`, failing on the first bad one.
fn parse_expression(expression: &str, page_count: u32) -> Result<Vec<u32>, RangeError> {
    let mut pages = Vec::new();
    for segment in expression.split(',').filter(|segment| !segment.is_empty()) {
        parse_segment(segment, page_count, &mut pages)?;
    }
    Ok(pages)
}

/// Expression covering the whole document.
pub fn full_range(page_count: u32) -> String {
    format!("1-{page_count}")
}

/// Range actually applied to a document together with its pages.
/// 實際套用於文件的頁面範圍與解析後的頁碼。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    /// Display form of the range that was applied; differs from the request after a fallback.
    pub applied: String,
    pub pages: Vec<u32>,
}

impl ResolvedRange {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Resolves a job's page-range expression against a document of `page_count` pages.
///
/// Never fails: an absent, empty or malformed expression degrades to
/// printing the whole document.
pub fn resolve_page_range(expression: Option<&str>, page_count: u32) -> ResolvedRange {
    let full = full_range(page_count);
    let requested = expression.filter(|value| !value.is_empty());

    if let Some(requested) = requested {
        match parse_expression(requested, page_count) {
            Ok(pages) => {
                debug!(range = requested, page_count, "resolved page range");
                return ResolvedRange {
                    applied: requested.to_string(),
                    pages,
                };
            }
            Err(err) => {
                debug!(
                    range = requested,
                    fallback = %full,
                    error = %err,
                    "page range rejected, printing full document"
                );
            }
        }
    }

    ResolvedRange {
        applied: full,
        pages: (1..=page_count).collect(),
    }
}
