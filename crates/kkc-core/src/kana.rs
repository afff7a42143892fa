//! Kana helpers used to build the katakana alternative of a segment.

/// Hiragana letters that have a katakana counterpart 0x60 code points up:
/// ぁ..ゖ and the iteration marks ゝゞ. The voicing marks ゛゜ have no such
/// counterpart and are left alone.
pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{3096}' | '\u{309D}'..='\u{309E}')
}

/// Katakana rendition of `s`. Anything that is not hiragana (ー, ASCII,
/// punctuation, existing katakana) passes through.
pub fn to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if is_hiragana(c) {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// True when `s` has at least one hiragana letter, so `to_katakana` changes it.
pub fn has_hiragana(s: &str) -> bool {
    s.chars().any(is_hiragana)
}
