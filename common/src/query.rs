//! 検索クエリサービス
//!
//! ロード済みインデックスに対して自由文クエリを実行し、関連度順のヒットを返す。

use crate::error::{Error, Result};
use crate::index::{tokenize, EntryMeta, Field, SearchIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 完全一致
const EXACT_SCORE: f64 = 1.0;
/// 前方一致
const PREFIX_SCORE: f64 = 0.75;
/// 部分一致
const SUBSTRING_SCORE: f64 = 0.5;
/// あいまい一致（類似度を掛ける）
const FUZZY_SCORE: f64 = 0.4;
const FUZZY_THRESHOLD: f64 = 0.75;
const FUZZY_MIN_LEN: usize = 4;
/// url フィールドの重み（content を 1.0 とする）
const URL_WEIGHT: f64 = 0.6;

/// 検索ヒット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: String,
    pub score: f64,
    pub meta: EntryMeta,
}

/// 検索バックエンド
///
/// 空クエリは「検索なし」として呼び出し側で処理すること。
pub trait SearchService: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<RankedHit>>;
}

/// インデックスを保持するクエリサービス
#[derive(Debug, Clone, Default)]
pub struct QueryService {
    index: Option<SearchIndex>,
}

impl QueryService {
    /// 未ロード状態（search は IndexUnavailable を返す）
    pub fn unloaded() -> Self {
        Self { index: None }
    }

    pub fn with_index(index: SearchIndex) -> Self {
        Self { index: Some(index) }
    }

    /// インデックスファイルを読み込む
    pub fn load(path: &std::path::Path) -> Result<Self> {
        Ok(Self::with_index(SearchIndex::from_file(path)?))
    }

    pub fn is_loaded(&self) -> bool {
        self.index.is_some()
    }

    pub fn index(&self) -> Option<&SearchIndex> {
        self.index.as_ref()
    }
}

impl SearchService for QueryService {
    fn search(&self, query: &str) -> Result<Vec<RankedHit>> {
        let index = self.index.as_ref().ok_or(Error::IndexUnavailable)?;
        Ok(rank(index, query))
    }
}

/// クエリトークンと索引語の一致度
fn match_strength(query_token: &str, term: &str) -> Option<f64> {
    if term == query_token {
        return Some(EXACT_SCORE);
    }
    if term.starts_with(query_token) {
        return Some(PREFIX_SCORE);
    }
    if term.contains(query_token) {
        return Some(SUBSTRING_SCORE);
    }
    if query_token.chars().count() >= FUZZY_MIN_LEN && term.chars().count() >= FUZZY_MIN_LEN {
        let similarity = strsim::normalized_levenshtein(query_token, term);
        if similarity >= FUZZY_THRESHOLD {
            return Some(FUZZY_SCORE * similarity);
        }
    }
    None
}

fn field_weight(field: Field) -> f64 {
    match field {
        Field::Url => URL_WEIGHT,
        Field::Content => 1.0,
    }
}

/// 全トークンに一致したドキュメントをスコア降順で返す（同点は索引順）
pub fn rank(index: &SearchIndex, query: &str) -> Vec<RankedHit> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut totals: HashMap<u32, f64> = HashMap::new();
    for (i, token) in tokens.iter().enumerate() {
        let mut best: HashMap<u32, f64> = HashMap::new();
        for (term, postings) in &index.terms {
            let Some(strength) = match_strength(token, term) else {
                continue;
            };
            for posting in postings {
                let score = strength * field_weight(posting.field);
                let slot = best.entry(posting.doc).or_insert(0.0);
                if score > *slot {
                    *slot = score;
                }
            }
        }

        if i == 0 {
            totals = best;
        } else {
            // AND: 今回一致しなかったドキュメントは落とす
            totals = totals
                .into_iter()
                .filter_map(|(doc, total)| best.get(&doc).map(|s| (doc, total + s)))
                .collect();
        }
        if totals.is_empty() {
            return Vec::new();
        }
    }

    let mut scored: Vec<(u32, f64)> = totals
        .into_iter()
        .map(|(doc, total)| (doc, total / tokens.len() as f64))
        .collect();
    scored.sort_by_key(|(doc, _)| *doc);
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .filter_map(|(doc, score)| {
            index.documents.get(doc as usize).map(|entry| RankedHit {
                id: entry.meta.id.clone(),
                score,
                meta: entry.meta.clone(),
            })
        })
        .collect()
}
