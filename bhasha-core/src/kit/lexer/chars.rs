//! 字符分类

/// 不属于标识符的天城文标点
const DEVANAGARI_PUNCTUATION: [char; 3] = ['।', '॥', '॰'];

/// 字母、数字、`_`，以及除标点外的整个天城文区块（含元音符号、virama、nukta）
pub fn is_identifier_char(c: char) -> bool {
    if c == '_' || c.is_alphanumeric() {
        return !DEVANAGARI_PUNCTUATION.contains(&c);
    }
    is_devanagari(c) && !DEVANAGARI_PUNCTUATION.contains(&c)
}

/// 标识符首字符：不能是数字
pub fn is_identifier_start(c: char) -> bool {
    is_identifier_char(c) && !c.is_ascii_digit() && !is_devanagari_digit(c)
}

pub fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

pub fn is_devanagari_digit(c: char) -> bool {
    ('\u{0966}'..='\u{096F}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devanagari_word_is_identifier() {
        assert!("परिभाषित".chars().all(is_identifier_char));
        assert!("वापस_करें".chars().all(is_identifier_char));
        // virama
        assert!(is_identifier_char('्'));
    }

    #[test]
    fn test_punctuation_is_not_identifier() {
        assert!(!is_identifier_char('।'));
        assert!(!is_identifier_char('('));
        assert!(!is_identifier_char(' '));
    }

    #[test]
    fn test_identifier_start() {
        assert!(is_identifier_start('a'));
        assert!(is_identifier_start('_'));
        assert!(is_identifier_start('क'));
        assert!(!is_identifier_start('7'));
        assert!(!is_identifier_start('७'));
    }
}
