//! 最长匹配用的关键字前缀树
//!
//! 节点存放在扁平数组中，每个节点把下一个字符映射到子节点下标。

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<char, usize>,
    /// 在此结束的关键字下标
    terminal: Option<usize>,
}

/// [`KeywordTrie::longest_match`] 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieMatch {
    /// 匹配到的关键字字节长度
    pub len: usize,
    /// 关键字的插入序号
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct KeywordTrie {
    nodes: Vec<TrieNode>,
}

impl KeywordTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    /// 插入 `key`，标记为 `index`
    pub fn insert(&mut self, key: &str, index: usize) {
        let mut node_idx = 0;
        for c in key.chars() {
            let next_idx = match self.nodes[node_idx].children.get(&c) {
                Some(&id) => id,
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node_idx].children.insert(c, id);
                    id
                }
            };
            node_idx = next_idx;
        }
        self.nodes[node_idx].terminal = Some(index);
    }

    /// `text` 的最长关键字前缀，且其后剩余部分满足 `accept`
    pub fn longest_match<F>(&self, text: &str, accept: F) -> Option<TrieMatch>
    where
        F: Fn(&str) -> bool,
    {
        let mut node_idx = 0;
        let mut best = None;
        for (offset, c) in text.char_indices() {
            match self.nodes[node_idx].children.get(&c) {
                Some(&next) => node_idx = next,
                None => break,
            }
            if let Some(index) = self.nodes[node_idx].terminal {
                let len = offset + c.len_utf8();
                if accept(&text[len..]) {
                    best = Some(TrieMatch { len, index });
                }
            }
        }
        best
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for KeywordTrie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(keys: &[&str]) -> KeywordTrie {
        let mut t = KeywordTrie::new();
        for (i, k) in keys.iter().enumerate() {
            t.insert(k, i);
        }
        t
    }

    #[test]
    fn test_longest_match_wins() {
        let t = trie(&["अन्यथा", "अन्यथा_अगर"]);
        let m = t.longest_match("अन्यथा_अगर x", |_| true).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.len, "अन्यथा_अगर".len());
    }

    #[test]
    fn test_accept_rejects_partial_word() {
        let t = trie(&["स्व"]);
        let boundary = |rest: &str| !rest.starts_with(crate::kit::lexer::is_identifier_char);
        assert!(t.longest_match("स्वागत", boundary).is_none());
        assert!(t.longest_match("स्व.नाम", boundary).is_some());
    }

    #[test]
    fn test_no_match() {
        let t = trie(&["abc"]);
        assert!(t.longest_match("abx", |_| true).is_none());
        assert!(t.longest_match("", |_| true).is_none());
        assert_eq!(t.node_count(), 4);
    }
}
