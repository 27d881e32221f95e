//! 数字规范化
//!
//! 把天城文数字（०-९）改写为 ASCII 数字，其他字符原样保留，
//! 输出与输入的字符数始终相同。

use std::borrow::Cow;

use once_cell::sync::Lazy;
use tracing::trace;

/// 本地数字字形 → ASCII 数字
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumeralTable {
    digits: [(char, char); 10],
}

impl NumeralTable {
    /// 天城文数字，U+0966..=U+096F
    pub fn devanagari() -> Self {
        let digits = [
            ('०', '0'),
            ('१', '1'),
            ('२', '2'),
            ('३', '3'),
            ('४', '4'),
            ('५', '5'),
            ('६', '6'),
            ('७', '7'),
            ('८', '8'),
            ('९', '9'),
        ];
        Self { digits }
    }

    /// `c` 是本地数字时返回对应 ASCII 数字
    pub fn lookup(&self, c: char) -> Option<char> {
        self.digits
            .iter()
            .find(|(native, _)| *native == c)
            .map(|(_, ascii)| *ascii)
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.digits.iter().copied()
    }

    /// 替换所有本地数字；没有变化时直接借用
    pub fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.chars().any(|c| self.lookup(c).is_some()) {
            return Cow::Borrowed(text);
        }
        let out: String = text
            .chars()
            .map(|c| self.lookup(c).unwrap_or(c))
            .collect();
        trace!(target: "bhasha::numerals", chars = out.chars().count(), "normalized digits");
        Cow::Owned(out)
    }
}

impl Default for NumeralTable {
    fn default() -> Self {
        Self::devanagari()
    }
}

static NUMERALS: Lazy<NumeralTable> = Lazy::new(NumeralTable::devanagari);

/// 全局数字表
pub fn numeral_table() -> &'static NumeralTable {
    &NUMERALS
}

/// 使用全局数字表规范化
pub fn normalize_numerals(text: &str) -> String {
    NUMERALS.normalize(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ten_digits() {
        assert_eq!(normalize_numerals("०१२३४५६७८९"), "0123456789");
    }

    #[test]
    fn test_other_characters_untouched() {
        let input = "छापें(१० / ०) # टिप्पणी";
        let out = normalize_numerals(input);
        assert_eq!(out, "छापें(10 / 0) # टिप्पणी");
        assert_eq!(out.chars().count(), input.chars().count());
    }

    #[test]
    fn test_borrows_when_unchanged() {
        let table = NumeralTable::default();
        assert!(matches!(table.normalize("print(10)"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_lookup() {
        let table = numeral_table();
        assert_eq!(table.lookup('७'), Some('7'));
        assert_eq!(table.lookup('7'), None);
        assert_eq!(table.iter().count(), 10);
    }
}
