use once_cell::sync::Lazy;
use regex::Regex;

/// 超过该长度的行一定是正文
pub const MAX_LINE_CHARS: usize = 200;
/// 标题最多保留的字符数
pub const MAX_TITLE_CHARS: usize = 80;

/// 正文特征词：代词、助动词、否定形式
static PROSE_INDICATORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:that|which|whose|whom|we|you|they|he|she|was|were|would|should|could|does|did|has been|have been|is not|are not|does not|do not|cannot|can't|don't|doesn't|won't|isn't)\b",
    )
    .expect("prose indicator pattern")
});

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Heading,
    /// 行长度超过 200 字符
    TooLong,
    /// 含有正文特征词
    Prose,
    /// 编号后紧跟小写字母，是句子的延续
    SentenceContinuation,
}

/// 判断候选行是真正的标题还是碰巧含有关键词的正文
///
/// # 参数
/// - `line`: 候选所在的整行文本
/// - `token_end`: "关键词 编号" 在该行中的结束偏移
pub fn classify(line: &str, token_end: usize) -> Verdict {
    if line.chars().count() > MAX_LINE_CHARS {
        return Verdict::TooLong;
    }

    if PROSE_INDICATORS.is_match(line) {
        return Verdict::Prose;
    }

    let rest = line.get(token_end..).unwrap_or("").trim_start();
    let mut chars = rest.chars();
    let rest = match chars.next() {
        Some(c) if is_separator(c) => chars.as_str().trim_start(),
        _ => rest,
    };

    if rest.chars().next().is_some_and(char::is_lowercase) {
        return Verdict::SentenceContinuation;
    }

    Verdict::Heading
}

pub fn is_heading(line: &str, token_end: usize) -> bool {
    classify(line, token_end) == Verdict::Heading
}

fn is_separator(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '–' | '—' | '…')
}

/// 取出包含 `[start, end)` 的整行
///
/// 匹配跨行时（"CHAPTER\n1"），范围延伸到 `end` 所在行的行尾
///
/// # 返回
/// (整行文本, `end` 在该行中的偏移)
pub fn enclosing_line(text: &str, start: usize, end: usize) -> (&str, usize) {
    let end = end.clamp(start, text.len());
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..]
        .find('\n')
        .map(|i| end + i)
        .unwrap_or(text.len());
    (&text[line_start..line_end], end - line_start)
}

/// 由候选行生成标题：各行去除首尾空白后以空格连接，截断到 80 个字符
pub fn make_title(line: &str) -> String {
    line.lines()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_headings() {
        assert!(is_heading("Chapter 3", 9));
        assert!(is_heading("Chapter 3: Chemical Kinetics", 9));
        assert!(is_heading("CHAPTER 12 — Thermodynamics", 10));
        assert!(is_heading("Unit 4 Review Questions", 6));
    }

    #[test]
    fn test_rejects_prose_indicators() {
        let line = "Chapter 3 that the reaction does not proceed without a catalyst";
        assert_eq!(classify(line, 9), Verdict::Prose);
        assert_eq!(classify("Chapter 16 shows which moon phases matter", 10), Verdict::Prose);
    }

    #[test]
    fn test_rejects_sentence_continuation() {
        assert_eq!(classify("Chapter 5 explains orbital motion", 9), Verdict::SentenceContinuation);
        assert_eq!(classify("Part 2, and then the story", 6), Verdict::SentenceContinuation);
        assert_eq!(classify("Part 2: Early Years", 6), Verdict::Heading);
    }

    #[test]
    fn test_rejects_long_lines() {
        let line = format!("Chapter 1 {}", "X".repeat(250));
        assert_eq!(classify(&line, 9), Verdict::TooLong);
    }

    #[test]
    fn test_prose_words_match_whole_words_only() {
        // "Weather" 含有 "we"，但不是整词
        assert!(is_heading("Chapter 7 Weather Systems", 9));
        assert!(is_heading("Chapter 8 Theyre Patterns", 9));
    }

    #[test]
    fn test_enclosing_line() {
        let text = "intro\n  Chapter 2 Motion\nbody text";
        let start = text.find("Chapter").unwrap();
        let end = start + "Chapter 2".len();
        let (line, offset) = enclosing_line(text, start, end);
        assert_eq!(line, "  Chapter 2 Motion");
        assert_eq!(&line[offset..], " Motion");
    }

    #[test]
    fn test_enclosing_line_at_end_of_text() {
        let text = "first\nChapter 9";
        let (line, offset) = enclosing_line(text, 6, text.len());
        assert_eq!(line, "Chapter 9");
        assert_eq!(offset, 9);
    }

    #[test]
    fn test_enclosing_line_spans_wrapped_number() {
        let text = "CHAPTER\n1\nMatter";
        let end = "CHAPTER\n1".len();
        let (line, offset) = enclosing_line(text, 0, end);
        assert_eq!(line, "CHAPTER\n1");
        assert_eq!(offset, end);
        assert!(is_heading(line, offset));
        assert_eq!(make_title(line), "CHAPTER 1");
    }

    #[test]
    fn test_make_title_truncates() {
        let line = format!("   Chapter 1 {}   ", "a".repeat(100));
        let title = make_title(&line);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.starts_with("Chapter 1 "));
        assert_eq!(make_title("  Unit 3 Waves \r"), "Unit 3 Waves");
    }
}
