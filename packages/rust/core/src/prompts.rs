//! Prompt construction for the three generation stages.
//!
//! Every builder is a pure function of its inputs: identical arguments give
//! byte-identical prompts.

use copycraft_shared::StyleTag;

use crate::angles::{ANGLE_DELIMITER, MAX_ANGLES};

/// System instruction sent with the research call.
pub const RESEARCH_SYSTEM_INSTRUCTION: &str = "You are a creative content strategist. \
     Generate 10 high-value, practical headlines.";

/// Marker phrase the article must use inside image-suggestion blockquotes.
pub const IMAGE_SUGGESTION_MARKER: &str = "【配图建议】";

/// Inclusive article length band, in Chinese characters.
pub const ARTICLE_LENGTH: (u32, u32) = (1000, 1800);

/// Prompt asking for [`MAX_ANGLES`] headline candidates in the format
/// [`parse_angles`](crate::angles::parse_angles) reads.
pub fn build_research_prompt(topic: &str, audience: &str) -> String {
    format!(
        "你是一位熟悉新媒体传播规律的中文内容策划。用户准备写一篇软文。\n\
         \n\
         主题：{topic}\n\
         目标受众：{audience}\n\
         \n\
         任务：\n\
         1. 使用网络搜索，重点查找微信公众号、小红书等平台上针对该人群、关于该主题的近期热门内容。\n\
         2. 给出恰好 {MAX_ANGLES} 个标题候选。\n\
         \n\
         标题要求：\n\
         - 干货优先：读者一眼就能看出这篇文章能帮他解决什么问题、省下多少时间。\n\
         - 拒绝标题党：可以吸引人，但必须言之有物，暗示文中有具体方法、清单、避坑经验或深度盘点。\n\
         \n\
         输出格式必须严格如下（纯文本，不要使用 Markdown 代码块）：\n\
         \n\
         {ANGLE_DELIMITER}\n\
         Title: [标题]\n\
         Description: [一句话说明这个标题的核心价值]\n\
         {ANGLE_DELIMITER}\n\
         Title: [标题]\n\
         Description: [说明]\n\
         ……依此类推，共 {MAX_ANGLES} 个。\n"
    )
}

/// Prompt for a structured Markdown outline following the chosen angle.
pub fn build_outline_prompt(
    topic: &str,
    audience: &str,
    angle_title: &str,
    angle_description: &str,
) -> String {
    format!(
        "主题：{topic}\n\
         目标受众：{audience}\n\
         选定标题：{angle_title}\n\
         策略方向：{angle_description}\n\
         \n\
         请基于以上标题，写一份详细、逻辑严密的中文软文大纲。\n\
         \n\
         要求：\n\
         - 大纲必须兑现“{angle_title}”这个标题的承诺。\n\
         - 必须围绕{audience}的真实需求展开。\n\
         - 在合适的章节标注建议插入表格或引用官方数据图片的位置。\n\
         - 结构清晰：引言、3-5 个核心干货部分、结语。\n\
         \n\
         请使用清晰的 Markdown 格式输出大纲。\n"
    )
}

/// Prompt for the final article.
///
/// A preset `style` contributes its instruction; `None` or
/// [`StyleTag::Custom`] defers tone to `custom_links`. Non-blank
/// `custom_links` always adds an instruction to study and imitate them.
pub fn build_article_prompt(
    topic: &str,
    audience: &str,
    outline: &str,
    style: Option<StyleTag>,
    custom_links: &str,
) -> String {
    let style_line = match style {
        Some(tag) if tag.is_preset() => format!("风格要求：{}", tag.instruction()),
        _ => "风格要求：请模仿下方参考链接的风格。".to_string(),
    };

    let links = custom_links.trim();
    let reference_block = if links.is_empty() {
        String::new()
    } else {
        format!(
            "\n\
             重要：用户提供了参考风格的链接或账号：\n\
             {links}\n\
             请使用 Google Search 查阅这些链接，分析其内容风格、语气和排版习惯，并在本文中模仿这种行文风格。\n"
        )
    };

    let (min_len, max_len) = ARTICLE_LENGTH;

    format!(
        "你是一位资深的中文内容创作者。请写一篇高质量的深度文章。\n\
         \n\
         基本信息：\n\
         - 主题：{topic}\n\
         - 目标受众：{audience}\n\
         - {style_line}\n\
         {reference_block}\
         \n\
         已确认的大纲：\n\
         {outline}\n\
         \n\
         写作要求（务必遵守）：\n\
         1. 实用干货：多给具体步骤、具体数据、具体建议，不说正确的废话。\n\
         2. 拒绝硬广和过度营销：行文真实、客观、专业，语气平实真诚；严禁滥用感叹号（！）。\n\
         3. 数据可视化：凡是涉及对比、参数、流程、费用的内容，必须使用 Markdown 表格呈现。\n\
         4. 引用权威：文中需引用真实数据或行业报告，并用 Google Search 核实数据准确性。\n\
         5. 配图建议：在文章合适位置至少插入一处配图建议，使用 Markdown 引用块（> ），写成“> {IMAGE_SUGGESTION_MARKER}：画面描述”。\n\
         6. 篇幅：{min_len}-{max_len} 字，内容充实。\n\
         \n\
         现在开始写作。\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_prompt_is_deterministic() {
        let a = build_research_prompt("日本留学", "职场白领");
        let b = build_research_prompt("日本留学", "职场白领");
        assert_eq!(a, b);
    }

    #[test]
    fn research_prompt_requests_parseable_format() {
        let prompt = build_research_prompt("日本留学", "职场白领");
        assert!(prompt.contains("日本留学"));
        assert!(prompt.contains("职场白领"));
        assert!(prompt.contains("恰好 10 个"));
        assert!(prompt.contains("###\nTitle:"));
        assert!(prompt.contains("Description:"));
        assert!(prompt.contains("搜索"));
        assert!(prompt.contains("拒绝标题党"));
    }

    #[test]
    fn outline_prompt_follows_angle() {
        let prompt = build_outline_prompt("日本留学", "职场白领", "30岁留学值不值", "用数据说话");
        assert!(prompt.contains("选定标题：30岁留学值不值"));
        assert!(prompt.contains("策略方向：用数据说话"));
        assert!(prompt.contains("围绕职场白领"));
        assert!(prompt.contains("表格"));
        assert!(prompt.contains("引言、3-5 个核心干货部分、结语"));
        assert!(prompt.contains("Markdown"));
    }

    #[test]
    fn outline_prompt_is_deterministic() {
        let a = build_outline_prompt("日本留学", "职场白领", "30岁留学值不值", "用数据说话");
        let b = build_outline_prompt("日本留学", "职场白领", "30岁留学值不值", "用数据说话");
        assert_eq!(a, b);
    }

    #[test]
    fn article_prompt_embeds_preset_instruction() {
        let prompt = build_article_prompt("t", "a", "A\nB\nC", Some(StyleTag::Senior), "");
        assert!(prompt.contains("风格要求：学姐/学长分享 (Senior Student)"));
        assert!(!prompt.contains("参考风格的链接"));
        assert!(prompt.contains("A\nB\nC"));
    }

    #[test]
    fn article_prompt_custom_defers_to_links() {
        for style in [None, Some(StyleTag::Custom)] {
            let prompt = build_article_prompt("t", "a", "o", style, "https://mp.example/post");
            assert!(prompt.contains("请模仿下方参考链接的风格"));
            assert!(prompt.contains("https://mp.example/post"));
            assert!(prompt.contains("Google Search 查阅这些链接"));
        }
    }

    #[test]
    fn article_prompt_preset_with_links_has_both() {
        let prompt = build_article_prompt("t", "a", "o", Some(StyleTag::Expert), "@some_account");
        assert!(prompt.contains("行业专家 (Industry Expert)"));
        assert!(prompt.contains("@some_account"));
    }

    #[test]
    fn blank_links_add_nothing() {
        let with_blank = build_article_prompt("t", "a", "o", Some(StyleTag::Official), "  \n ");
        let without = build_article_prompt("t", "a", "o", Some(StyleTag::Official), "");
        assert_eq!(with_blank, without);
    }

    #[test]
    fn article_prompt_carries_writing_rules() {
        let prompt = build_article_prompt("t", "a", "o", Some(StyleTag::Neighbor), "");
        assert!(prompt.contains("Markdown 表格"));
        assert!(prompt.contains("> 【配图建议】"));
        assert!(prompt.contains("1000-1800 字"));
        assert!(prompt.contains("感叹号"));
    }

    #[test]
    fn article_prompt_is_deterministic() {
        let a = build_article_prompt("t", "a", "o", Some(StyleTag::Storytelling), "x");
        let b = build_article_prompt("t", "a", "o", Some(StyleTag::Storytelling), "x");
        assert_eq!(a, b);
    }
}
