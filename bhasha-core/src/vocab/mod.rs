//! 本地词汇层
//!
//! 数字规范化、关键字转译与逐行解释。内置表全进程共享，首次使用后只读。

pub mod explain;
pub mod keywords;
pub mod numerals;
pub mod trie;

pub use explain::{explain, trigger_table, TriggerTable, FALLBACK_EXPLANATION};
pub use keywords::{keyword_table, transpile, KeywordTable};
pub use numerals::{normalize_numerals, numeral_table, NumeralTable};
pub use trie::KeywordTrie;
