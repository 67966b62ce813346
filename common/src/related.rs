//! 関連語展開モジュール
//!
//! アセットのパスから検索用の関連語（同義語）を導出する。
//! ルール表は差し替え可能で、インデックス構築側は `RelatedTerms` だけを見る。

/// パス → 関連語 の純粋関数
pub trait RelatedTerms {
    fn related_terms(&self, path: &str) -> Vec<String>;
}

impl<F> RelatedTerms for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn related_terms(&self, path: &str) -> Vec<String> {
        self(path)
    }
}

/// 展開ルール（パスに `needle` を含めば `terms` を追加）
#[derive(Debug, Clone)]
pub struct RelatedRule {
    pub needle: String,
    pub terms: Vec<String>,
}

impl RelatedRule {
    pub fn new(needle: &str, terms: &[&str]) -> Self {
        Self {
            needle: needle.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// 優先順位付きルール表（最初に一致したルールのみ適用）
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<RelatedRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<RelatedRule>) -> Self {
        Self { rules }
    }

    /// 組み込みの動物ルール
    pub fn animals() -> Self {
        Self::new(vec![
            RelatedRule::new("meow", &["cat", "kitten", "animal"]),
            RelatedRule::new("cat", &["meow", "kitten", "animal"]),
            RelatedRule::new("dog", &["dog", "animal"]),
            // "root" も "roo" で一致する
            RelatedRule::new("roo", &["animal", "panda"]),
        ])
    }

    pub fn rules(&self) -> &[RelatedRule] {
        &self.rules
    }
}

impl RelatedTerms for RuleTable {
    fn related_terms(&self, path: &str) -> Vec<String> {
        self.rules
            .iter()
            .find(|rule| path.contains(rule.needle.as_str()))
            .map(|rule| rule.terms.clone())
            .unwrap_or_default()
    }
}

/// 関連語なし
pub struct NoRelatedTerms;

impl RelatedTerms for NoRelatedTerms {
    fn related_terms(&self, _path: &str) -> Vec<String> {
        Vec::new()
    }
}
