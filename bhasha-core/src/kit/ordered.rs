//! 有序查找表
//!
//! 关键字表、触发词表和片段表都依赖“先匹配者胜”。顺序是表的约定：
//! 条目保持插入顺序，键唯一，查找总是从前往后。

use std::fmt;

/// 插入重复键时的错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("duplicate table key '{key}' at position {position}")]
pub struct DuplicateKey {
    pub key: String,
    pub position: usize,
}

/// 保持插入顺序、键唯一的查找表
#[derive(Clone, PartialEq, Eq)]
pub struct OrderedTable<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: AsRef<str>, V> OrderedTable<K, V> {
    /// 从有序键值对构建，遇到重复键时失败
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, DuplicateKey>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut entries: Vec<(K, V)> = Vec::new();
        for (position, (key, value)) in pairs.into_iter().enumerate() {
            if entries.iter().any(|(k, _)| k.as_ref() == key.as_ref()) {
                return Err(DuplicateKey {
                    key: key.as_ref().to_string(),
                    position,
                });
            }
            entries.push((key, value));
        }
        Ok(Self { entries })
    }

    /// 按键精确查找
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// 返回第一个满足谓词的条目（按插入顺序）
    pub fn first_match<P>(&self, mut predicate: P) -> Option<(&K, &V)>
    where
        P: FnMut(&str) -> bool,
    {
        self.entries
            .iter()
            .find(|(k, _)| predicate(k.as_ref()))
            .map(|(k, v)| (k, v))
    }

    /// `key` 的插入位置
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.as_ref() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}
