use once_cell::sync::Lazy;
use regex::Regex;

/// 首轮检测使用的主关键词
///
/// 只保留 chapter/part/unit，避免 "Section 18.19" 这类交叉引用被当成章节
pub const PRIMARY_KEYWORDS: [&str; 3] = ["chapter", "part", "unit"];

/// 回退检测使用的全部关键词
pub const ALL_KEYWORDS: [&str; 20] = [
    "chapter", "part", "unit", "lecture", "module", "section", "lesson", "topic", "week",
    "session", "book", "volume", "appendix", "tutorial", "lab", "class", "day", "stage",
    "episode", "step",
];

/// 关键词与编号之间允许的单个分隔符
const SEPARATOR: &str = r"[#:.\-–—]?";

const ONES: [&str; 9] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

const TEENS: [&str; 10] = [
    "ten", "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
    "eighteen", "nineteen",
];

const TENS: [&str; 4] = ["twenty", "thirty", "forty", "fifty"];

/// 英文数字 1-50 的拼写表，按数值降序排列
///
/// 降序保证 "twenty-one" 在正则分支中先于 "twenty" 尝试
static SPELLED_NUMBERS: Lazy<Vec<(String, u32)>> = Lazy::new(|| {
    let mut table: Vec<(String, u32)> = (1..=50).map(|n| (spell(n), n)).collect();
    table.reverse();
    table
});

static SPELLED_ALTERNATION: Lazy<String> = Lazy::new(|| {
    SPELLED_NUMBERS
        .iter()
        .map(|(word, _)| word.replace('-', r"[\s\-]?"))
        .collect::<Vec<_>>()
        .join("|")
});

static PRIMARY_CATALOG: Lazy<PatternCatalog> = Lazy::new(|| PatternCatalog::new(&PRIMARY_KEYWORDS));
static FALLBACK_CATALOG: Lazy<PatternCatalog> = Lazy::new(|| PatternCatalog::new(&ALL_KEYWORDS));

fn spell(n: u32) -> String {
    match n {
        1..=9 => ONES[(n - 1) as usize].to_string(),
        10..=19 => TEENS[(n - 10) as usize].to_string(),
        _ => {
            let tens = TENS[(n / 10 - 2) as usize];
            match n % 10 {
                0 => tens.to_string(),
                unit => format!("{}-{}", tens, ONES[(unit - 1) as usize]),
            }
        }
    }
}

/// 把标题中的编号文本解析为整数
///
/// 支持阿拉伯数字和 one..fifty 的英文拼写（连字符、空格或直接相连）
pub fn parse_number_token(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.chars().all(|c| c.is_ascii_digit()) {
        return token.parse().ok();
    }

    let compact: String = token
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();

    SPELLED_NUMBERS
        .iter()
        .find(|(word, _)| word.replace('-', "") == compact)
        .map(|(_, n)| *n)
}

/// 单个关键词对应的一组正则
pub struct KeywordPatterns {
    pub keyword: &'static str,
    /// 行首 "关键词 [分隔符] 数字"
    pub numeric: Regex,
    /// 行首 "关键词 [分隔符] 英文数字"
    pub spelled: Regex,
    /// 不锚定行首的宽松形式，仅用于统计目录页密度
    pub loose: Regex,
}

impl KeywordPatterns {
    fn new(keyword: &'static str) -> Self {
        let spelled = SPELLED_ALTERNATION.as_str();
        let kw = regex::escape(keyword);

        let numeric = format!(r"(?im)^[ \t]*{kw}[ \t]*{SEPARATOR}[ \t]*(\d+)\b");
        let spelled_line = format!(r"(?im)^[ \t]*{kw}[ \t]*{SEPARATOR}[ \t]*({spelled})\b");
        let loose = format!(r"(?i)\b{kw}\s*{SEPARATOR}\s*(\d+|{spelled})\b");

        // 模式由常量拼接而成，编译失败属于编程错误
        Self {
            keyword,
            numeric: Regex::new(&numeric).expect("numeric heading pattern"),
            spelled: Regex::new(&spelled_line).expect("spelled heading pattern"),
            loose: Regex::new(&loose).expect("loose keyword pattern"),
        }
    }
}

/// 模式目录
///
/// 按关键词顺序保存每个关键词的数字形式与拼写形式
pub struct PatternCatalog {
    entries: Vec<KeywordPatterns>,
}

impl PatternCatalog {
    /// 根据有序关键词列表构建目录
    pub fn new(keywords: &[&'static str]) -> Self {
        Self {
            entries: keywords.iter().map(|kw| KeywordPatterns::new(kw)).collect(),
        }
    }

    /// 主目录（chapter/part/unit）
    pub fn primary() -> &'static PatternCatalog {
        &PRIMARY_CATALOG
    }

    /// 回退目录（全部关键词）
    pub fn fallback() -> &'static PatternCatalog {
        &FALLBACK_CATALOG
    }

    pub fn entries(&self) -> &[KeywordPatterns] {
        &self.entries
    }

    pub fn keywords(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.keyword).collect()
    }

    /// 行首标题模式，顺序为：关键词1数字、关键词1拼写、关键词2数字……
    pub fn heading_patterns(&self) -> impl Iterator<Item = &Regex> {
        self.entries
            .iter()
            .flat_map(|entry| [&entry.numeric, &entry.spelled])
    }

    /// 统计页面中任意位置出现的关键词+编号次数
    pub fn count_matches(&self, text: &str) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.loose.find_iter(text).count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_numbers() {
        assert_eq!(spell(1), "one");
        assert_eq!(spell(13), "thirteen");
        assert_eq!(spell(20), "twenty");
        assert_eq!(spell(42), "forty-two");
        assert_eq!(spell(50), "fifty");
        assert_eq!(SPELLED_NUMBERS.len(), 50);
    }

    #[test]
    fn test_parse_number_token() {
        assert_eq!(parse_number_token("7"), Some(7));
        assert_eq!(parse_number_token("Three"), Some(3));
        assert_eq!(parse_number_token("twenty-one"), Some(21));
        assert_eq!(parse_number_token("Twenty One"), Some(21));
        assert_eq!(parse_number_token("fortytwo"), Some(42));
        assert_eq!(parse_number_token("hundred"), None);
        assert_eq!(parse_number_token("99999999999"), None);
    }

    #[test]
    fn test_primary_catalog_keywords() {
        assert_eq!(PatternCatalog::primary().keywords(), vec!["chapter", "part", "unit"]);
        assert_eq!(PatternCatalog::fallback().entries().len(), 20);
        assert_eq!(PatternCatalog::primary().heading_patterns().count(), 6);
    }

    #[test]
    fn test_numeric_pattern_is_line_anchored() {
        let catalog = PatternCatalog::primary();
        let chapter = &catalog.entries()[0].numeric;

        assert!(chapter.is_match("CHAPTER 4\nThe Cell"));
        assert!(chapter.is_match("intro text\n  Chapter: 12 Waves"));
        assert!(chapter.is_match("Chapter #3"));
        assert!(!chapter.is_match("as shown in Chapter 4 earlier"));

        let caps = chapter.captures("Chapter - 16 Tides").unwrap();
        assert_eq!(&caps[1], "16");
    }

    #[test]
    fn test_spelled_pattern_prefers_compound() {
        let catalog = PatternCatalog::primary();
        let part = &catalog.entries()[1].spelled;

        let caps = part.captures("Part Twenty-Three: Later Work").unwrap();
        assert_eq!(parse_number_token(&caps[1]), Some(23));

        let caps = part.captures("PART ONE").unwrap();
        assert_eq!(parse_number_token(&caps[1]), Some(1));

        assert!(!part.is_match("Particle one"));
    }

    #[test]
    fn test_count_matches_is_unanchored() {
        let catalog = PatternCatalog::primary();
        let text = "Contents Chapter 1 Intro 3 Chapter 2 Motion 9 Unit Three Review 20";
        assert_eq!(catalog.count_matches(text), 3);
        assert_eq!(catalog.count_matches("no structure here"), 0);
    }

    #[test]
    fn test_fallback_catalog_matches_lecture() {
        let catalog = PatternCatalog::fallback();
        let text = "Lecture 5: Scheduling";
        assert!(catalog.heading_patterns().any(|p| p.is_match(text)));
        assert!(!PatternCatalog::primary().heading_patterns().any(|p| p.is_match(text)));
    }
}
