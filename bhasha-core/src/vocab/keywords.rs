//! 关键字转译
//!
//! 关键字表把本地词汇映射为规范关键字，提供两种改写方式：
//!
//! - [`KeywordTable::transpile_substring`] 按插入顺序逐条替换所有出现，
//!   包括更长标识符和字符串字面量内部的出现。
//! - [`KeywordTable::transpile_tokenized`] 从左到右扫描一次，只改写
//!   字符串与注释之外的完整单词，每个位置取最长关键字。

use once_cell::sync::Lazy;
use tracing::debug;

use bhasha_config::TranspileMode;

use super::trie::KeywordTrie;
use crate::kit::lexer::is_identifier_char;
use crate::kit::{DuplicateKey, OrderedTable};

/// 本地词 → 规范词，按替换顺序排列
///
/// 复合词 `अन्यथा_अगर` 必须排在 `अगर` 与 `अन्यथा` 之前，否则子串替换会得到 `else_if`。
const DEFAULT_KEYWORDS: &[(&str, &str)] = &[
    ("अन्यथा_अगर", "elif"),
    ("परिभाषित", "def"),
    ("वापस_करें", "return"),
    ("छापें", "print"),
    ("इनपुट", "input"),
    ("अगर", "if"),
    ("अन्यथा", "else"),
    ("के_लिए", "for"),
    ("जबतक", "while"),
    ("सही", "True"),
    ("गलत", "False"),
    ("संख्या", "int"),
    ("पाठ", "str"),
    ("सूची", "list"),
    ("टपल", "tuple"),
    ("शब्दकोश", "dict"),
    ("स्व", "self"),
    ("आरंभ", "__init__"),
    ("वर्ग", "class"),
    ("वस्तु", "object"),
    ("नया", "new"),
    ("में", "in"),
    ("सीमा", "range"),
];

static DEFAULT_TABLE: Lazy<KeywordTable> = Lazy::new(|| {
    KeywordTable::new(DEFAULT_KEYWORDS.iter().copied())
        .unwrap_or_else(|e| unreachable!("built-in keyword table is malformed: {e}"))
});

/// 全局关键字表
pub fn keyword_table() -> &'static KeywordTable {
    &DEFAULT_TABLE
}

#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: OrderedTable<String, String>,
    trie: KeywordTrie,
}

impl KeywordTable {
    /// 从有序键值对构建，拒绝重复的本地词
    pub fn new<I, K, V>(pairs: I) -> Result<Self, DuplicateKey>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = OrderedTable::try_from_pairs(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())),
        )?;
        let mut trie = KeywordTrie::new();
        for (index, native) in entries.keys().enumerate() {
            trie.insert(native, index);
        }
        Ok(Self { entries, trie })
    }

    pub fn get(&self, native: &str) -> Option<&str> {
        self.entries.get(native).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn transpile(&self, text: &str, mode: TranspileMode) -> String {
        let out = match mode {
            TranspileMode::Substring => self.transpile_substring(text),
            TranspileMode::Tokenized => self.transpile_tokenized(text),
        };
        debug!(
            target: "bhasha::transpiler",
            mode = mode.as_str(),
            input_len = text.len(),
            output_len = out.len(),
            "transpiled source"
        );
        out
    }

    /// 顺序折叠：每一条在上一条的输出上替换
    pub fn transpile_substring(&self, text: &str) -> String {
        self.entries
            .iter()
            .fold(text.to_string(), |acc, (native, canonical)| {
                if acc.contains(native.as_str()) {
                    acc.replace(native.as_str(), canonical)
                } else {
                    acc
                }
            })
    }

    /// 单次从左到右扫描；只改写完整单词，字符串字面量与 `#` 注释原样复制
    pub fn transpile_tokenized(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut prev: Option<char> = None;

        while let Some(c) = rest.chars().next() {
            if c == '#' {
                let end = rest.find('\n').unwrap_or(rest.len());
                out.push_str(&rest[..end]);
                rest = &rest[end..];
                prev = None;
                continue;
            }
            if c == '"' || c == '\'' {
                let end = string_literal_len(rest);
                out.push_str(&rest[..end]);
                rest = &rest[end..];
                prev = Some(c);
                continue;
            }
            let at_boundary = !prev.is_some_and(is_identifier_char);
            if at_boundary {
                let whole_word = |after: &str| !after.starts_with(is_identifier_char);
                if let Some(m) = self.trie.longest_match(rest, whole_word) {
                    let canonical = self
                        .entries
                        .iter()
                        .nth(m.index)
                        .map(|(_, v)| v.as_str())
                        .unwrap_or(&rest[..m.len]);
                    out.push_str(canonical);
                    prev = rest[..m.len].chars().last();
                    rest = &rest[m.len..];
                    continue;
                }
            }
            out.push(c);
            prev = Some(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

/// 以引号开头的字符串字面量的字节长度（含两端引号，支持三引号）；
/// 未闭合时延伸到行尾
fn string_literal_len(text: &str) -> usize {
    let quote = match text.chars().next() {
        Some(q) => q,
        None => return 0,
    };
    let triple: String = std::iter::repeat(quote).take(3).collect();
    if text.starts_with(&triple) {
        return match text[3..].find(&triple) {
            Some(i) => 3 + i + 3,
            None => text.len(),
        };
    }
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\n' => return i,
            c if c == quote => return i + c.len_utf8(),
            _ => {}
        }
    }
    text.len()
}

/// 使用全局关键字表转译
pub fn transpile(text: &str, mode: TranspileMode) -> String {
    DEFAULT_TABLE.transpile(text, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_keyword() {
        let out = transpile("छापें(\"नमस्ते\")", TranspileMode::Substring);
        assert_eq!(out, "print(\"नमस्ते\")");
    }

    #[test]
    fn test_canonical_source_unchanged() {
        let src = "def f(x):\n    return x * 2\nprint(f(21))\n";
        assert_eq!(transpile(src, TranspileMode::Substring), src);
        assert_eq!(transpile(src, TranspileMode::Tokenized), src);
    }

    #[test]
    fn test_elif_compound_before_parts() {
        let src = "अगर x:\n    pass\nअन्यथा_अगर y:\n    pass\nअन्यथा:\n    pass";
        let out = transpile(src, TranspileMode::Substring);
        assert_eq!(out, "if x:\n    pass\nelif y:\n    pass\nelse:\n    pass");
    }

    #[test]
    fn test_substring_mode_rewrites_inside_identifiers() {
        // स्वागत 里的 स्व 也被改写
        let out = transpile("स्वागत = 1", TranspileMode::Substring);
        assert_eq!(out, "selfागत = 1");
    }

    #[test]
    fn test_tokenized_mode_respects_word_boundaries() {
        let out = transpile("स्वागत = 1\nस्व.x = 2", TranspileMode::Tokenized);
        assert_eq!(out, "स्वागत = 1\nself.x = 2");
    }

    #[test]
    fn test_tokenized_mode_skips_strings_and_comments() {
        let src = "छापें(\"अगर\")  # अगर";
        let out = transpile(src, TranspileMode::Tokenized);
        assert_eq!(out, "print(\"अगर\")  # अगर");
        let substring = transpile(src, TranspileMode::Substring);
        assert_eq!(substring, "print(\"if\")  # if");
    }

    #[test]
    fn test_tokenized_elif() {
        let out = transpile("अन्यथा_अगर x:", TranspileMode::Tokenized);
        assert_eq!(out, "elif x:");
    }

    #[test]
    fn test_custom_table_rejects_duplicates() {
        let err = KeywordTable::new([("क", "a"), ("क", "b")]).unwrap_err();
        assert_eq!(err.key, "क");
    }

    #[test]
    fn test_default_table_shape() {
        let table = keyword_table();
        assert_eq!(table.len(), 23);
        assert_eq!(table.get("वर्ग"), Some("class"));
        assert_eq!(table.iter().next(), Some(("अन्यथा_अगर", "elif")));
    }

    #[test]
    fn test_string_literal_len() {
        assert_eq!(string_literal_len("'ab' + x"), 4);
        assert_eq!(string_literal_len(r#""a\"b" x"#), 6);
        assert_eq!(string_literal_len("\"\"\"a\nb\"\"\" x"), 9);
        assert_eq!(string_literal_len("'open\nx"), 5);
    }
}
