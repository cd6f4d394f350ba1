//! Text encodings of a single axis label.
//!
//! Both encodings work on ordinals where label value `0` is ordinal `1`.

/// Decimal ordinal, zero padded to `width` digits with a leading `-` when negative.
pub(crate) fn format_numeric(ordinal: i64, width: usize) -> String {
    if ordinal < 0 {
        format!("-{:0width$}", ordinal.unsigned_abs())
    } else {
        format!("{ordinal:0width$}")
    }
}

pub(crate) fn decode_numeric(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Letters of `ordinal`, at least `width` of them.
///
/// A width of one gives spreadsheet letters: `1 → A`, `26 → Z`, `27 → AA`.
/// Wider axes count in base 26 with `A` as zero, padded with `A` to `width`
/// letters, so with width two `1 → AA` and `27 → BA`. Ordinals past
/// `26^width` grow extra letters and never start with `A`.
///
/// Ordinals below one have no letters of their own and are written as `-`
/// followed by the letters of `1 - ordinal`, so `0 → -A` and `-1 → -B`.
pub(crate) fn format_alphabetic(ordinal: i64, width: usize) -> String {
    if ordinal < 1 {
        return format!("-{}", format_alphabetic(1 - ordinal, width));
    }
    let mut letters = Vec::new();
    if width <= 1 {
        let mut remaining = ordinal;
        while remaining > 0 {
            letters.push(letter((remaining - 1) % 26));
            remaining = (remaining - 1) / 26;
        }
    } else {
        let mut remaining = ordinal - 1;
        while remaining > 0 || letters.len() < width {
            letters.push(letter(remaining % 26));
            remaining /= 26;
        }
    }
    letters.iter().rev().collect()
}

fn letter(digit: i64) -> char {
    char::from(b'A' + digit as u8)
}

pub(crate) fn decode_alphabetic(text: &str, width: usize) -> Option<i64> {
    if let Some(rest) = text.strip_prefix('-') {
        return decode_letters(rest, width).map(|ordinal| 1 - ordinal);
    }
    decode_letters(text, width)
}

fn decode_letters(text: &str, width: usize) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_uppercase()) {
        return None;
    }
    let mut digits = text.bytes().map(|byte| i64::from(byte - b'A'));
    if width <= 1 {
        return digits.try_fold(0_i64, |ordinal, digit| {
            ordinal.checked_mul(26)?.checked_add(digit + 1)
        });
    }
    if text.len() < width || (text.len() > width && text.starts_with('A')) {
        return None;
    }
    digits
        .try_fold(0_i64, |value, digit| value.checked_mul(26)?.checked_add(digit))?
        .checked_add(1)
}
