//! 本地化文本表
//!
//! 全部是进程级只读表；片段表按插入顺序匹配，先匹配者胜出。

use once_cell::sync::Lazy;

use bhasha_core::kit::{DuplicateKey, OrderedTable};
use bhasha_core::ErrorKind;

/// 基础消息与细节之间的分隔符
pub const SEPARATOR: &str = " 👉 ";

/// 未识别类别的基础消息
pub const UNKNOWN_FAILURE: &str = "अज्ञात त्रुटि";

/// 每种错误类别的基础消息
pub fn base_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UnresolvedName => "नाम त्रुटि: आपने ऐसा नाम उपयोग किया है जो परिभाषित नहीं है।",
        ErrorKind::TypeMismatch => "टाइप त्रुटि: गलत प्रकार के डेटा पर ऑपरेशन किया गया।",
        ErrorKind::DivisionByZero => "शून्य भाग त्रुटि: आप 0 से भाग नहीं कर सकते।",
        ErrorKind::IndexOutOfBounds => "इंडेक्स त्रुटि: सूची/टपल में गलत इंडेक्स चुना गया।",
        ErrorKind::KeyNotFound => "कुंजी त्रुटि: यह key शब्दकोश में मौजूद नहीं है।",
        ErrorKind::UnresolvedAttribute => "विशेषता त्रुटि: यह attribute मौजूद नहीं है।",
        ErrorKind::ImportFailure => "आयात त्रुटि: मॉड्यूल आयात नहीं हो सका।",
        ErrorKind::ResourceNotFound => "फाइल त्रुटि: फाइल नहीं मिली।",
        ErrorKind::MalformedSyntax => "सिंटैक्स त्रुटि: कोड लिखावट में गलती है।",
        ErrorKind::UnclosedDelimiter => "सिंटैक्स त्रुटि: कोड में कोई चिह्न बंद नहीं हुआ।",
        ErrorKind::IndentationFault => {
            "इंडेंटेशन त्रुटि: कोड सही तरीके से space/tab से नहीं लिखा गया।"
        }
        ErrorKind::InvalidValue => "मान त्रुटि: गलत मान (value) पास किया गया।",
        ErrorKind::ResourceExceeded => {
            "संसाधन त्रुटि: प्रोग्राम ने समय या मेमोरी की सीमा पार कर दी।"
        }
        ErrorKind::Cancelled => "रद्द: प्रोग्राम को बीच में रोक दिया गया।",
        ErrorKind::Unclassified => UNKNOWN_FAILURE,
    }
}

/// 英文片段 → 本地化解释。前 12 项保持原有顺序。
const DEFAULT_FRAGMENTS: &[(&str, &str)] = &[
    ("invalid syntax", "अमान्य सिंटैक्स: आपके कोड की संरचना सही नहीं है।"),
    ("forgot a comma", "शायद आपने अल्पविराम (,) लगाना भूल गए।"),
    ("not defined", "यह नाम परिभाषित नहीं है। पहले इसे घोषित करें।"),
    ("division by zero", "शून्य से भाग नहीं कर सकते।"),
    ("expected an indented block", "यहाँ indented block की जरूरत थी।"),
    ("unexpected indent", "अप्रत्याशित indentation मिला।"),
    ("list index out of range", "सूची का index सीमा से बाहर है।"),
    ("missing", "कुछ गायब है"),
    ("cannot import", "आयात नहीं हो सका"),
    ("unsupported operand", "यह ऑपरेशन इन डेटा टाइप्स पर काम नहीं करता।"),
    ("takes", "फंक्शन को गलत संख्या में arguments दिए गए।"),
    ("required positional argument", "आवश्यक argument नहीं दिया गया।"),
    ("modulo by zero", "शून्य से भाग नहीं कर सकते।"),
    ("index out of range", "index सीमा से बाहर है।"),
    ("no module named", "यह मॉड्यूल यहाँ उपलब्ध नहीं है; केवल built-in फ़ंक्शन उपयोग करें।"),
    ("no such file or directory", "यहाँ फाइलें उपलब्ध नहीं हैं; डेटा सीधे कोड में लिखें।"),
    ("invalid literal for int()", "यह पाठ पूर्ण संख्या में नहीं बदला जा सकता।"),
    ("could not convert string to float", "यह पाठ दशमलव संख्या में नहीं बदला जा सकता।"),
    ("can only concatenate", "पाठ (str) को केवल पाठ से जोड़ा जा सकता है; संख्या को पहले str() से बदलें।"),
    ("has no attribute", "इस वस्तु में यह attribute या method नहीं है।"),
    ("is not callable", "यह फ़ंक्शन नहीं है, इसलिए इसे बुलाया नहीं जा सकता।"),
    ("is not iterable", "इस मान पर लूप नहीं चलाया जा सकता।"),
    ("is not subscriptable", "इस मान में [] से इंडेक्स नहीं किया जा सकता।"),
    ("cannot access local variable", "स्थानीय नाम को मान देने से पहले उपयोग किया गया।"),
    ("values to unpack", "बाएँ और दाएँ तरफ़ के मानों की संख्या मेल नहीं खाती।"),
    ("maximum recursion depth", "फ़ंक्शन स्वयं को बहुत गहराई तक बुला रहा है।"),
    ("timed out", "प्रोग्राम बहुत देर तक चला; शायद लूप कभी समाप्त नहीं होता।"),
    ("step limit", "प्रोग्राम बहुत देर तक चला; शायद लूप कभी समाप्त नहीं होता।"),
    ("sandbox limit", "प्रोग्राम ने बहुत अधिक मेमोरी या आउटपुट का उपयोग किया।"),
    ("integer result too large", "संख्या बहुत बड़ी हो गई।"),
    ("eof when reading a line", "इनपुट की सभी पंक्तियाँ पहले ही पढ़ी जा चुकी हैं।"),
];

static DEFAULT_FRAGMENT_TABLE: Lazy<FragmentTable> = Lazy::new(|| {
    FragmentTable::new(DEFAULT_FRAGMENTS.iter().copied())
        .unwrap_or_else(|e| unreachable!("built-in fragment table is malformed: {e}"))
});

pub fn fragment_table() -> &'static FragmentTable {
    &DEFAULT_FRAGMENT_TABLE
}

/// 有序的片段表，大小写不敏感的子串匹配
#[derive(Debug, Clone)]
pub struct FragmentTable {
    fragments: OrderedTable<String, String>,
}

impl FragmentTable {
    pub fn new<I, K, V>(pairs: I) -> Result<Self, DuplicateKey>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fragments = OrderedTable::try_from_pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into())),
        )?;
        Ok(Self { fragments })
    }

    /// 第一个出现在 `detail` 中的片段
    pub fn find(&self, detail: &str) -> Option<(&str, &str)> {
        let detail = detail.to_lowercase();
        self.fragments
            .first_match(|fragment| detail.contains(fragment))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// 语法类失败的专用句子；没有可识别的线索时返回 `None`
pub fn syntax_sentence(detail: &str) -> Option<&'static str> {
    let detail = detail.to_lowercase();
    if detail.contains("never closed") {
        let sentence = if detail.contains('(') {
            "सिंटैक्स त्रुटि: '(' को बंद नहीं किया गया। कृपया ')' जोड़ें।"
        } else if detail.contains('[') {
            "सिंटैक्स त्रुटि: '[' को बंद नहीं किया गया। कृपया ']' जोड़ें।"
        } else if detail.contains('{') {
            "सिंटैक्स त्रुटि: '{' को बंद नहीं किया गया। कृपया '}' जोड़ें।"
        } else if detail.contains('\'') || detail.contains('"') {
            QUOTE_SENTENCE
        } else {
            "सिंटैक्स त्रुटि: कोड में कोई चिह्न बंद नहीं हुआ।"
        };
        return Some(sentence);
    }
    if detail.contains("unterminated") && detail.contains("string literal") {
        return Some(QUOTE_SENTENCE);
    }
    if detail.contains("invalid syntax") {
        return Some("सिंटैक्स त्रुटि: अमान्य सिंटैक्स। कृपया अपने कोड की संरचना जांचें।");
    }
    if detail.contains("unexpected indent") {
        return Some("सिंटैक्स त्रुटि: अप्रत्याशित indentation मिला।");
    }
    if detail.contains("expected an indented block") {
        return Some("सिंटैक्स त्रुटि: यहाँ indented block की जरूरत थी।");
    }
    None
}

const QUOTE_SENTENCE: &str =
    "सिंटैक्स त्रुटि: उद्धरण चिह्न को बंद नहीं किया गया। कृपया उद्धरण बंद करें।";
