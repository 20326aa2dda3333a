//! Turns raw analysis text into the four fixed [`AnalysisSections`].
//!
//! Parsing is a pure, line-based state machine:
//!
//! 1. A line recognised as a section label switches the current section; the
//!    label line itself is dropped.
//! 2. Any other non-blank line is appended (trimmed, plus one space) to the
//!    current section.
//! 3. Lines before the first label are dropped.
//!
//! Text without any label (the translation fallback) therefore yields four
//! empty sections. That is a valid result, not an error.
//!
//! Label recognition is pluggable through [`LabelMatcher`]:
//! [`ExactLabels`] does a plain substring check for the numbered markers the
//! prompt asks for, and [`LenientLabels`] accepts the common ways models
//! deviate from them.

use crate::config::LabelMatching;
use crate::models::{AnalysisSections, SectionKey};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Decides whether a line is a section label, and which one.
pub trait LabelMatcher: Send + Sync {
    fn match_label(&self, line: &str) -> Option<SectionKey>;
}

/// Matches a line that contains one of the exact numbered markers, e.g. `1. 新聞要點`.
///
/// Markers are checked in section order and the first hit wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactLabels;

impl LabelMatcher for ExactLabels {
    fn match_label(&self, line: &str) -> Option<SectionKey> {
        SectionKey::ALL
            .into_iter()
            .find(|key| line.contains(key.marker()))
    }
}

static LENIENT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\s>#*_-]*[1-4]\s*[.．、:：)）]\s*[*_\s]*(新聞要點|新闻要点|背景分析|影響評估|影响评估|專業見解|专业见解)",
    )
    .expect("lenient label pattern is valid")
});

/// Matches numbered labels at the start of a line with looser formatting.
///
/// Accepts markdown headings and emphasis (`### **1. 新聞要點**`), other
/// numbering punctuation (`1、`, `1．`, `1)`), and Simplified Chinese
/// spellings of the labels (`新闻要点`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientLabels;

impl LabelMatcher for LenientLabels {
    fn match_label(&self, line: &str) -> Option<SectionKey> {
        let caps = LENIENT_LABEL.captures(line)?;
        match caps.get(1)?.as_str() {
            "新聞要點" | "新闻要点" => Some(SectionKey::Highlights),
            "背景分析" => Some(SectionKey::Background),
            "影響評估" | "影响评估" => Some(SectionKey::Impact),
            "專業見解" | "专业见解" => Some(SectionKey::Insight),
            _ => None,
        }
    }
}

/// Section parser with a configurable label strategy.
pub struct SectionParser {
    matcher: Box<dyn LabelMatcher>,
}

impl SectionParser {
    pub fn new(matcher: impl LabelMatcher + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
        }
    }

    pub fn for_mode(mode: LabelMatching) -> Self {
        match mode {
            LabelMatching::Exact => Self::new(ExactLabels),
            LabelMatching::Lenient => Self::new(LenientLabels),
        }
    }

    /// Split `analysis_text` into the four sections.
    pub fn parse(&self, analysis_text: &str) -> AnalysisSections {
        let mut sections = AnalysisSections::default();
        let mut current: Option<SectionKey> = None;

        for line in analysis_text.lines() {
            if let Some(key) = self.matcher.match_label(line) {
                current = Some(key);
                continue;
            }

            let trimmed = line.trim();
            if let Some(key) = current {
                if !trimmed.is_empty() {
                    let section = sections.get_mut(key);
                    section.push_str(trimmed);
                    section.push(' ');
                }
            }
        }

        sections
    }
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new(ExactLabels)
    }
}

impl fmt::Debug for SectionParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionParser").finish_non_exhaustive()
    }
}

/// Parse with the default exact-marker strategy.
pub fn parse_sections(analysis_text: &str) -> AnalysisSections {
    SectionParser::default().parse(analysis_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
1. 新聞要點：
蘋果發布新款晶片。
效能提升 30%。

2. 背景分析：
市場競爭加劇。
3. 影響評估：
供應鏈受惠。
4. 專業見解：
值得持續關注。
";

    #[test]
    fn test_parse_well_formed() {
        let sections = parse_sections(WELL_FORMED);
        assert_eq!(sections.highlights, "蘋果發布新款晶片。 效能提升 30%。 ");
        assert_eq!(sections.background, "市場競爭加劇。 ");
        assert_eq!(sections.impact, "供應鏈受惠。 ");
        assert_eq!(sections.insight, "值得持續關注。 ");
    }

    #[test]
    fn test_label_lines_are_excluded() {
        let sections = parse_sections(WELL_FORMED);
        for (key, content) in sections.iter() {
            assert!(!content.is_empty());
            assert!(!content.contains(key.marker()));
        }
    }

    #[test]
    fn test_parse_is_idempotent_on_same_input() {
        assert_eq!(parse_sections(WELL_FORMED), parse_sections(WELL_FORMED));
    }

    #[test]
    fn test_unlabelled_text_yields_empty_sections() {
        let sections = parse_sections("蘋果今天發布了新款晶片，效能大幅提升。\n第二行。");
        assert_eq!(sections, AnalysisSections::default());
        assert!(sections.is_blank());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_sections(""), AnalysisSections::default());
    }

    #[test]
    fn test_preamble_is_discarded() {
        let text = "以下是分析：\n標題重述\n1. 新聞要點\n重點內容\n";
        let sections = parse_sections(text);
        assert_eq!(sections.highlights, "重點內容 ");
        assert!(!sections.highlights.contains("標題重述"));
    }

    #[test]
    fn test_label_with_inline_content_is_dropped_whole() {
        let sections = parse_sections("**1. 新聞要點**：同一行的內容\n下一行\n");
        assert_eq!(sections.highlights, "下一行 ");
    }

    #[test]
    fn test_missing_section_stays_empty() {
        let sections = parse_sections("1. 新聞要點\nA\n3. 影響評估\nC\n");
        assert_eq!(sections.highlights, "A ");
        assert_eq!(sections.background, "");
        assert_eq!(sections.impact, "C ");
        assert_eq!(sections.insight, "");
    }

    #[test]
    fn test_repeated_label_appends() {
        let sections = parse_sections("1. 新聞要點\nA\n2. 背景分析\nB\n1. 新聞要點\nA2\n");
        assert_eq!(sections.highlights, "A A2 ");
        assert_eq!(sections.background, "B ");
    }

    #[test]
    fn test_crlf_lines() {
        let sections = parse_sections("1. 新聞要點\r\n內容\r\n");
        assert_eq!(sections.highlights, "內容 ");
    }

    #[test]
    fn test_exact_ignores_loose_formatting() {
        assert_eq!(ExactLabels.match_label("1、新聞要點"), None);
        assert_eq!(ExactLabels.match_label("1. 新闻要点"), None);
        assert_eq!(
            ExactLabels.match_label("## 2. 背景分析"),
            Some(SectionKey::Background)
        );
    }

    #[test]
    fn test_lenient_matches_variants() {
        let cases = [
            ("1. 新聞要點", SectionKey::Highlights),
            ("**1. 新聞要點**", SectionKey::Highlights),
            ("1、新闻要点：", SectionKey::Highlights),
            ("### 2．背景分析", SectionKey::Background),
            ("3) 影响评估", SectionKey::Impact),
            ("  4：專業見解", SectionKey::Insight),
        ];
        for (line, expected) in cases {
            assert_eq!(LenientLabels.match_label(line), Some(expected), "{line}");
        }
    }

    #[test]
    fn test_lenient_rejects_prose() {
        assert_eq!(LenientLabels.match_label("背景分析顯示市場成長"), None);
        assert_eq!(LenientLabels.match_label("第1. 新聞要點"), None);
        assert_eq!(LenientLabels.match_label("5. 新聞要點"), None);
    }

    #[test]
    fn test_lenient_parser() {
        let text = "**1、新聞要點**\nA\n**2、背景分析**\nB\n**3、影響評估**\nC\n**4、專業見解**\nD";
        assert!(parse_sections(text).is_blank());

        let sections = SectionParser::for_mode(LabelMatching::Lenient).parse(text);
        assert_eq!(sections.highlights, "A ");
        assert_eq!(sections.background, "B ");
        assert_eq!(sections.impact, "C ");
        assert_eq!(sections.insight, "D ");
    }
}
