//! Numbering management for list paragraphs
//!
//! Legacy paragraph styles reference a numbering definition by id and level.
//! The manager keeps one counter per (id, level) pair across the whole
//! document and renders the marker text that prefixes each list paragraph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counters keyed by (numbering id, level)
pub(crate) type NumberingCounters = HashMap<(u32, u8), u32>;

const HANGUL_SYLLABLES: [char; 14] = [
    '가', '나', '다', '라', '마', '바', '사', '아', '자', '차', '카', '타', '파', '하',
];
const HANGUL_JAMO: [char; 14] = [
    'ㄱ', 'ㄴ', 'ㄷ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅅ', 'ㅇ', 'ㅈ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// Marker styles found in word-processor numbering definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingFormat {
    #[default]
    Decimal, // 1. 2. 3.
    CircledDecimal,   // ① ② ③
    LowerLetter,      // a. b. c.
    UpperLetter,      // A. B. C.
    LowerRoman,       // i. ii. iii.
    UpperRoman,       // I. II. III.
    Hangul,           // 가. 나. 다.
    HangulJamo,       // ㄱ. ㄴ. ㄷ.
    ParenDecimal,     // (1) (2) (3)
    ParenLowerLetter, // (a) (b) (c)
    ParenHangul,      // (가) (나) (다)
    Bullet,           // • • •
}

/// Manages document-wide numbering state for sequential list markers
#[derive(Debug, Default)]
pub(crate) struct DocumentNumberingManager {
    counters: NumberingCounters,
}

impl DocumentNumberingManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Advance the counter for (`num_id`, `level`) and render its marker
    pub(crate) fn generate_number(&mut self, num_id: u32, level: u8, format: NumberingFormat) -> String {
        let counter_value = {
            let counter = self.counters.entry((num_id, level)).or_insert(0);
            *counter += 1;
            *counter
        };

        // 1. -> 1.a -> 2. restarts the nested list at a.
        self.reset_deeper_levels(num_id, level);

        format_number(counter_value, format)
    }

    fn reset_deeper_levels(&mut self, num_id: u32, current_level: u8) {
        self.counters
            .retain(|&(id, level), _| id != num_id || level <= current_level);
    }
}

fn format_number(counter: u32, format: NumberingFormat) -> String {
    match format {
        NumberingFormat::Decimal => format!("{counter}. "),
        NumberingFormat::CircledDecimal => match circled(counter) {
            Some(symbol) => format!("{symbol} "),
            None => format!("({counter}) "),
        },
        NumberingFormat::LowerLetter => match latin(counter, b'a') {
            Some(letter) => format!("{letter}. "),
            None => format!("{counter}. "),
        },
        NumberingFormat::UpperLetter => match latin(counter, b'A') {
            Some(letter) => format!("{letter}. "),
            None => format!("{counter}. "),
        },
        NumberingFormat::LowerRoman => format!("{}. ", to_roman(counter).to_lowercase()),
        NumberingFormat::UpperRoman => format!("{}. ", to_roman(counter)),
        NumberingFormat::Hangul => match nth(&HANGUL_SYLLABLES, counter) {
            Some(syllable) => format!("{syllable}. "),
            None => format!("{counter}. "),
        },
        NumberingFormat::HangulJamo => match nth(&HANGUL_JAMO, counter) {
            Some(jamo) => format!("{jamo}. "),
            None => format!("{counter}. "),
        },
        NumberingFormat::ParenDecimal => format!("({counter}) "),
        NumberingFormat::ParenLowerLetter => match latin(counter, b'a') {
            Some(letter) => format!("({letter}) "),
            None => format!("({counter}) "),
        },
        NumberingFormat::ParenHangul => match nth(&HANGUL_SYLLABLES, counter) {
            Some(syllable) => format!("({syllable}) "),
            None => format!("({counter}) "),
        },
        NumberingFormat::Bullet => "• ".to_string(),
    }
}

fn latin(counter: u32, base: u8) -> Option<char> {
    (1..=26)
        .contains(&counter)
        .then(|| (base + (counter - 1) as u8) as char)
}

fn nth(symbols: &[char], counter: u32) -> Option<char> {
    let index = usize::try_from(counter).ok()?.checked_sub(1)?;
    symbols.get(index).copied()
}

fn circled(counter: u32) -> Option<char> {
    // ① .. ⑳
    (1..=20)
        .contains(&counter)
        .then(|| char::from_u32(0x2460 + counter - 1))
        .flatten()
}

fn to_roman(num: u32) -> String {
    let values = [1000, 900, 500, 400, 100, 90, 50, 40, 10, 9, 5, 4, 1];
    let symbols = [
        "M", "CM", "D", "CD", "C", "XC", "L", "XL", "X", "IX", "V", "IV", "I",
    ];

    let mut result = String::new();
    let mut n = num;

    for (i, &value) in values.iter().enumerate() {
        while n >= value {
            result.push_str(symbols[i]);
            n -= value;
        }
    }

    result
}
