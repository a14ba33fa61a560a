//! Audience descriptors and readability targets for each complexity level.
//!
//! Level 1 targets children, level 2 adult patients, level 3 nursing and
//! allied health, level 4 medical students and level 5 physicians.

use serde::Serialize;

use super::level::ComplexityLevel;

/// Who a level is written for and how hard its prose may be
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExplanationLevel {
    pub level: u8,
    pub name: &'static str,
    /// Short label for badges
    pub label: &'static str,
    pub audience: &'static str,
    /// Flesch-Kincaid grade range (inclusive)
    pub grade_range: (f64, f64),
    /// Flesch reading-ease range (inclusive)
    pub reading_ease_range: (f64, f64),
    pub max_words_per_sentence: f64,
    pub max_syllables_per_word: f64,
}

pub const EXPLANATION_LEVELS: [ExplanationLevel; 5] = [
    ExplanationLevel {
        level: 1,
        name: "Child",
        label: "Kids",
        audience: "Children ages 5-12",
        grade_range: (3.0, 4.0),
        reading_ease_range: (90.0, 100.0),
        max_words_per_sentence: 10.0,
        max_syllables_per_word: 1.2,
    },
    ExplanationLevel {
        level: 2,
        name: "Patient",
        label: "Patient",
        audience: "General adult patients and caregivers",
        grade_range: (6.0, 8.0),
        reading_ease_range: (60.0, 80.0),
        max_words_per_sentence: 17.0,
        max_syllables_per_word: 1.5,
    },
    ExplanationLevel {
        level: 3,
        name: "Nursing/Allied Health",
        label: "Nursing",
        audience: "Nurses, PAs, respiratory therapists, allied health professionals",
        grade_range: (10.0, 12.0),
        reading_ease_range: (40.0, 60.0),
        max_words_per_sentence: 22.0,
        max_syllables_per_word: 1.7,
    },
    ExplanationLevel {
        level: 4,
        name: "Medical Student",
        label: "Med Student",
        audience: "Medical students, PA students, advanced learners",
        grade_range: (13.0, 16.0),
        reading_ease_range: (20.0, 40.0),
        max_words_per_sentence: 27.0,
        max_syllables_per_word: 1.9,
    },
    ExplanationLevel {
        level: 5,
        name: "Physician",
        label: "Physician",
        audience: "Attending physicians, specialists, researchers",
        grade_range: (17.0, 20.0),
        reading_ease_range: (0.0, 30.0),
        max_words_per_sentence: 30.0,
        max_syllables_per_word: 2.1,
    },
];

/// Look up the descriptor for a level
pub fn explanation_level(level: ComplexityLevel) -> &'static ExplanationLevel {
    &EXPLANATION_LEVELS[usize::from(level.get() - ComplexityLevel::MIN)]
}

/// Readability statistics for a block of prose
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Readability {
    pub words: usize,
    pub sentences: usize,
    pub syllables: usize,
    pub grade: f64,
    pub reading_ease: f64,
}

impl Readability {
    /// Estimate Flesch-Kincaid grade and Flesch reading ease.
    ///
    /// Markdown markers are ignored. Returns `None` for text without words.
    pub fn estimate(text: &str) -> Option<Self> {
        let mut words = 0usize;
        let mut syllables = 0usize;
        let mut sentences = 0usize;
        let mut in_sentence = false;

        for token in text.split_whitespace() {
            let word: String = token.chars().filter(|c| c.is_alphabetic()).collect();
            if !word.is_empty() {
                words += 1;
                syllables += count_syllables(&word);
                in_sentence = true;
            }
            if in_sentence && token.ends_with(['.', '!', '?', ':', ';']) {
                sentences += 1;
                in_sentence = false;
            }
        }
        if in_sentence {
            sentences += 1;
        }
        if words == 0 {
            return None;
        }

        let wps = words as f64 / sentences.max(1) as f64;
        let spw = syllables as f64 / words as f64;

        Some(Self {
            words,
            sentences,
            syllables,
            grade: 0.39 * wps + 11.8 * spw - 15.59,
            reading_ease: 206.835 - 1.015 * wps - 84.6 * spw,
        })
    }
}

/// Vowel-group heuristic, at least one syllable per word
fn count_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let mut count = 0;
    let mut prev_vowel = false;
    for c in lower.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'á' | 'é' | 'í' | 'ó' | 'ú');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if lower.ends_with('e') && !lower.ends_with("le") && count > 1 {
        count -= 1;
    }
    count.max(1)
}
