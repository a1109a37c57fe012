use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#:\-–—.,;()\[\]{}]").expect("punctuation pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("number pattern"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").expect("word pattern"));

/// 匹配成功的阶段，按尝试顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Exact,
    CaseInsensitive,
    Normalized,
    Contains,
    ContainedIn,
    NumberAndKeyword,
}

/// 解析结果：已知章节列表中的名称及命中阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterMatch<'a> {
    pub name: &'a str,
    pub stage: MatchStage,
}

/// 预先计算好的查询形式
struct Query<'q> {
    raw: &'q str,
    lowered: String,
    normalized: String,
    first_number: Option<&'q str>,
    words: HashSet<String>,
}

impl<'q> Query<'q> {
    fn new(raw: &'q str) -> Self {
        let lowered = raw.trim().to_lowercase();
        Self {
            raw,
            normalized: normalize(raw),
            first_number: NUMBER.find(raw).map(|m| m.as_str()),
            words: words(&lowered),
            lowered,
        }
    }
}

type Stage = fn(&Query, &str) -> bool;

/// 级联顺序，先命中者胜出
const STAGES: [(MatchStage, Stage); 6] = [
    (MatchStage::Exact, exact),
    (MatchStage::CaseInsensitive, case_insensitive),
    (MatchStage::Normalized, normalized_equal),
    (MatchStage::Contains, normalized_contains),
    (MatchStage::ContainedIn, normalized_contained_in),
    (MatchStage::NumberAndKeyword, number_and_keyword),
];

/// 归一化：小写，标点替换为空格，合并连续空白
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let spaced = PUNCTUATION.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

fn words(lowered: &str) -> HashSet<String> {
    WORD.find_iter(lowered).map(|m| m.as_str().to_string()).collect()
}

fn exact(query: &Query, candidate: &str) -> bool {
    candidate == query.raw
}

fn case_insensitive(query: &Query, candidate: &str) -> bool {
    candidate.trim().to_lowercase() == query.lowered
}

fn normalized_equal(query: &Query, candidate: &str) -> bool {
    normalize(candidate) == query.normalized
}

// 归一化后为空的一侧不参与包含匹配：空串是任何字符串的子串，不加判断时纯标点查询会命中第一个章节
fn normalized_contains(query: &Query, candidate: &str) -> bool {
    !query.normalized.is_empty() && normalize(candidate).contains(&query.normalized)
}

fn normalized_contained_in(query: &Query, candidate: &str) -> bool {
    let candidate = normalize(candidate);
    !candidate.is_empty() && query.normalized.contains(&candidate)
}

/// 查询中的第一个数字出现在候选中，且两者至少有一个相同的单词
fn number_and_keyword(query: &Query, candidate: &str) -> bool {
    let Some(number) = query.first_number else {
        return false;
    };
    let has_number = NUMBER.find_iter(candidate).any(|m| m.as_str() == number);
    has_number && !words(&candidate.to_lowercase()).is_disjoint(&query.words)
}

/// 将用户输入的章节引用解析为已知章节名
///
/// 依次尝试：精确、忽略大小写、归一化相等、归一化包含、反向包含、编号+关键词。
/// 查询为空或全部阶段都未命中时返回 `None`。
pub fn resolve_chapter<'a>(query: &str, chapters: &'a [String]) -> Option<ChapterMatch<'a>> {
    if query.trim().is_empty() || chapters.is_empty() {
        return None;
    }

    let query = Query::new(query);
    STAGES.iter().find_map(|(stage, matches)| {
        chapters
            .iter()
            .find(|candidate| matches(&query, candidate.as_str()))
            .map(|candidate| ChapterMatch {
                name: candidate.as_str(),
                stage: *stage,
            })
    })
}
