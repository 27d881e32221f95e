//! 逐行解释
//!
//! 每一行按顺序匹配触发词，第一个出现在该行中的触发词决定解释。
//! 复合触发词必须排在它包含的单词之前。

use once_cell::sync::Lazy;
use tracing::debug;

use crate::kit::{DuplicateKey, OrderedTable};

/// 没有触发词匹配时的解释
pub const FALLBACK_EXPLANATION: &str = "ℹ️ यह एक सामान्य लाइन है।";

const DEFAULT_TRIGGERS: &[(&str, &str)] = &[
    ("परिभाषित", "🔧 **परिभाषित**: यह एक फ़ंक्शन को परिभाषित करता है (def)."),
    ("वापस_करें", "↩️ **वापस_करें**: यह फ़ंक्शन से एक मान लौटाता है (return)."),
    ("छापें", "🖨️ **छापें**: आउटपुट स्क्रीन पर दिखाने के लिए (print)."),
    ("अन्यथा_अगर", "🔀 **अन्यथा_अगर**: यह elif block है (else if condition)."),
    ("अगर", "🔍 **अगर**: शर्त (if condition) लगाने के लिए."),
    ("अन्यथा", "📌 **अन्यथा**: else block, जब शर्त false हो."),
    ("के_लिए", "🔁 **के_लिए**: for loop चलाने के लिए."),
    ("जबतक", "🔁 **जबतक**: while loop चलाने के लिए."),
    ("इनपुट", "⌨️ **इनपुट**: उपयोगकर्ता से इनपुट लेने के लिए (input)."),
    ("सीमा", "🔢 **सीमा**: संख्याओं की एक श्रृंखला बनाने के लिए (range)."),
    ("सूची", "📋 **सूची**: Python की list datatype (mutable, ordered)."),
    ("टपल", "🔗 **टपल**: Python का tuple (immutable, ordered)."),
    ("शब्दकोश", "📚 **शब्दकोश**: dictionary (key-value pairs)."),
    ("स्व", "👤 **स्व**: self keyword, object के current instance को दर्शाता है."),
    ("आरंभ", "⚙️ **आरंभ**: यह constructor है (__init__) जो object बनाते समय चलता है."),
    ("वर्ग", "🏛️ **वर्ग**: class define करने के लिए."),
];

static DEFAULT_TRIGGER_TABLE: Lazy<TriggerTable> = Lazy::new(|| {
    TriggerTable::new(DEFAULT_TRIGGERS.iter().copied(), FALLBACK_EXPLANATION)
        .unwrap_or_else(|e| unreachable!("built-in trigger table is malformed: {e}"))
});

pub fn trigger_table() -> &'static TriggerTable {
    &DEFAULT_TRIGGER_TABLE
}

/// 有序的触发词 → 解释表，带兜底行
#[derive(Debug, Clone)]
pub struct TriggerTable {
    triggers: OrderedTable<String, String>,
    fallback: String,
}

impl TriggerTable {
    pub fn new<I, K, V>(pairs: I, fallback: impl Into<String>) -> Result<Self, DuplicateKey>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let triggers = OrderedTable::try_from_pairs(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())),
        )?;
        Ok(Self {
            triggers,
            fallback: fallback.into(),
        })
    }

    /// 单行解释
    pub fn explain_line(&self, line: &str) -> &str {
        self.triggers
            .first_match(|trigger| line.contains(trigger))
            .map(|(_, text)| text.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    /// 去掉首尾空白后每行一条解释；空源码也会得到一条兜底解释
    pub fn explain_lines(&self, source: &str) -> Vec<&str> {
        let lines: Vec<&str> = source
            .trim()
            .split('\n')
            .map(|line| self.explain_line(line))
            .collect();
        debug!(target: "bhasha::explain", lines = lines.len(), "explained source");
        lines
    }

    /// 以换行连接的解释
    pub fn explain(&self, source: &str) -> String {
        self.explain_lines(source).join("\n")
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// 使用全局触发词表解释
pub fn explain(source: &str) -> String {
    DEFAULT_TRIGGER_TABLE.explain(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_else_if_is_specific() {
        let table = trigger_table();
        let text = table.explain_line("अन्यथा_अगर x > 5:");
        assert!(text.contains("elif"));
        let plain = table.explain_line("अन्यथा:");
        assert!(plain.contains("else block"));
    }

    #[test]
    fn test_first_trigger_wins() {
        // छापें 与 अगर 都出现，表中 छापें 在前
        let text = trigger_table().explain_line("अगर x: छापें(x)");
        assert!(text.contains("print"));
    }

    #[test]
    fn test_one_line_per_input_line() {
        let src = "परिभाषित f():\n    वापस_करें 1\nx = 2\n";
        let lines = trigger_table().explain_lines(src);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("def"));
        assert!(lines[1].contains("return"));
        assert_eq!(lines[2], FALLBACK_EXPLANATION);
    }

    #[test]
    fn test_empty_source_yields_fallback() {
        assert_eq!(explain(""), FALLBACK_EXPLANATION);
        assert_eq!(explain("  \n "), FALLBACK_EXPLANATION);
    }

    #[test]
    fn test_custom_table() {
        let table = TriggerTable::new([("loop", "a loop")], "other").unwrap();
        assert_eq!(table.explain("loop\nx"), "a loop\nother");
        assert_eq!(table.fallback(), "other");
        assert_eq!(table.len(), 1);
    }
}
