/*!
 * Unicode script detection for translated answers.
 *
 * The target script is CJK ideographs. Four other scripts disqualify an
 * answer outright: a model that drifts into Japanese kana, Hangul, Cyrillic
 * or Arabic did not produce the Chinese text we asked for.
 */

use std::fmt;
use std::ops::RangeInclusive;

/// CJK unified ideographs (basic block as used for Chinese detection)
const CHINESE: RangeInclusive<char> = '\u{4E00}'..='\u{9FA5}';
const HIRAGANA: RangeInclusive<char> = '\u{3040}'..='\u{309F}';
const KATAKANA: RangeInclusive<char> = '\u{30A0}'..='\u{30FF}';
/// Hangul compatibility jamo
const HANGUL_JAMO: RangeInclusive<char> = '\u{3130}'..='\u{318F}';
const CYRILLIC: RangeInclusive<char> = '\u{0400}'..='\u{04FF}';
const ARABIC: RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// A script whose presence rejects a candidate answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Japanese,
    Korean,
    Cyrillic,
    Arabic,
}

impl Script {
    /// All disqualifying scripts, in the order they are checked
    pub const DISQUALIFYING: [Script; 4] = [
        Script::Japanese,
        Script::Korean,
        Script::Cyrillic,
        Script::Arabic,
    ];

    /// Whether `text` contains at least one character of this script
    pub fn is_present_in(self, text: &str) -> bool {
        match self {
            Script::Japanese => has_japanese(text),
            Script::Korean => has_korean(text),
            Script::Cyrillic => has_cyrillic(text),
            Script::Arabic => has_arabic(text),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Script::Japanese => "Japanese",
            Script::Korean => "Korean",
            Script::Cyrillic => "Cyrillic",
            Script::Arabic => "Arabic",
        };
        write!(f, "{}", name)
    }
}

fn contains_any(text: &str, ranges: &[RangeInclusive<char>]) -> bool {
    text.chars().any(|c| ranges.iter().any(|r| r.contains(&c)))
}

/// Whether the text contains at least one Chinese ideograph
pub fn has_chinese(text: &str) -> bool {
    contains_any(text, &[CHINESE])
}

/// Whether the text contains Hiragana or Katakana
pub fn has_japanese(text: &str) -> bool {
    contains_any(text, &[HIRAGANA, KATAKANA])
}

/// Whether the text contains Hangul compatibility jamo
pub fn has_korean(text: &str) -> bool {
    contains_any(text, &[HANGUL_JAMO])
}

/// Whether the text contains Cyrillic letters
pub fn has_cyrillic(text: &str) -> bool {
    contains_any(text, &[CYRILLIC])
}

/// Whether the text contains Arabic script
pub fn has_arabic(text: &str) -> bool {
    contains_any(text, &[ARABIC])
}

/// First disqualifying script found in the text, if any
pub fn disqualifying_script(text: &str) -> Option<Script> {
    Script::DISQUALIFYING
        .into_iter()
        .find(|script| script.is_present_in(text))
}

/// A field needs translation unless it already contains the target script
pub fn needs_translation(text: &str) -> bool {
    !has_chinese(text)
}

/// Acceptance test for an extracted answer.
///
/// The answer must be non-blank, contain Chinese and contain none of the
/// disqualifying scripts.
pub fn is_pass_answer(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if !has_chinese(text) {
        return false;
    }
    disqualifying_script(text).is_none()
}
