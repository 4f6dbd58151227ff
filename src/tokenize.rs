//! Canonical token sets from extracted text.
//!
//! Text is case-folded, stripped of everything that is neither a word
//! character (alphabetic, mark, decimal digit, connector punctuation, zero
//! width joiner) nor whitespace, then split on whitespace and deduplicated.
//! Combining marks stay attached, so decomposed accents survive.

use unicode_categories::UnicodeCategories;

use crate::models::TokenSet;

/// Tokenizes `text` into a [`TokenSet`]. Empty input yields an empty set.
pub fn tokenize(text: &str) -> TokenSet {
    let folded = text.to_lowercase();
    let stripped: String = folded
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect()
}

/// Unicode `\w`: Alphabetic, Mark, Decimal_Number, Connector_Punctuation
/// and Join_Control.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphabetic()
        || c.is_mark()
        || c.is_number_decimal_digit()
        || c.is_punctuation_connector()
        || matches!(c, '\u{200C}' | '\u{200D}')
}
