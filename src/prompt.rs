//! Prompt text for the per-article analysis request.
//!
//! The user prompt lists the four numbered section markers from
//! [`SectionKey::marker`], which are the same strings the section parser looks
//! for, so the two cannot drift apart.

use crate::models::{Article, SectionKey};

/// Fixed system instruction sent with every analysis request.
pub const SYSTEM_PROMPT: &str = "你是一個專業的科技新聞分析師和編輯，擅長將英文科技新聞翻譯成繁體中文並進行深入分析。
請注意以下幾點：
1. 準確翻譯原文的關鍵信息
2. 分析新聞背後的影響和意義
3. 結合行業趨勢給出見解
4. 使用專業但易懂的語言";

fn section_instruction(key: SectionKey) -> &'static str {
    match key {
        SectionKey::Highlights => "簡要概述主要事件和關鍵信息",
        SectionKey::Background => "說明事件的背景和原因",
        SectionKey::Impact => "分析這個新聞可能帶來的影響",
        SectionKey::Insight => "從行業趨勢角度提供你的觀點",
    }
}

/// Build the user prompt for one article.
pub fn analysis_prompt(article: &Article) -> String {
    let mut prompt = format!(
        "請對以下英文新聞進行翻譯和深入分析（200-300字）：\n\n標題：{}\n\n內容：{}\n\n請按照以下結構輸出：",
        article.title, article.description
    );
    for key in SectionKey::ALL {
        prompt.push('\n');
        prompt.push_str(key.marker());
        prompt.push('：');
        prompt.push_str(section_instruction(key));
    }
    prompt
}
