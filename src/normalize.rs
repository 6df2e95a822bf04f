//! Text normalization and collation.
//!
//! [`normalize`] folds case, strips combining marks after canonical
//! decomposition, maps the Vietnamese `đ` to `d`, and collapses whitespace.
//! [`collate`] orders strings the way a Vietnamese, accent- and
//! case-insensitive, numeric-aware collator would, with a raw tie-break so the
//! ordering is total.

use std::{cmp::Ordering, iter::Peekable, str::Chars};

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::data::CellValue;

pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .map(|ch| if ch == 'đ' { 'd' } else { ch })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a cell; null and absent cells yield the empty string.
pub fn normalize_value(value: Option<&CellValue>) -> String {
    match value {
        None | Some(CellValue::Null) => String::new(),
        Some(other) => normalize(&other.as_display()),
    }
}

pub fn collate(left: &str, right: &str) -> Ordering {
    natural_cmp(&normalize(left), &normalize(right)).then_with(|| left.cmp(right))
}

/// Compares digit runs by numeric value and everything else by code point.
fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut a = left.chars().peekable();
    let mut b = right.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digits(&mut a);
                let run_b = take_digits(&mut b);
                let ordering = compare_digit_runs(&run_a, &run_b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.cmp(&y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(ch) = chars.peek().copied() {
        if !ch.is_ascii_digit() {
            break;
        }
        run.push(ch);
        chars.next();
    }
    run
}

fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    let a = left.trim_start_matches('0');
    let b = right.trim_start_matches('0');
    a.len()
        .cmp(&b.len())
        .then_with(|| a.cmp(b))
        .then_with(|| left.len().cmp(&right.len()))
}
