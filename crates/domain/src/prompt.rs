//! Per-bot prompt templates and report wording
//!
//! Bots share one pipeline; only the template, keywords and quota differ.
//! Templates use `{name}` placeholders filled from the curated item.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::model::CuratedItem;
use crate::ports::AnalysisRequest;
use crate::sanitize::SanitizerConfig;

/// The digest bots this crate can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BotKind {
    /// Top-journal feed digest
    Journals,
    /// Trending repositories per language
    Trending,
    /// Fund valuation diagnosis
    Funds,
    /// Recent arXiv papers per keyword
    Papers,
    /// Evidence-based health facts (encyclopedia + literature)
    HealthFacts,
    /// Single health topic from the first available source
    HealthBrief,
}

impl BotKind {
    pub const ALL: [BotKind; 6] = [
        BotKind::Journals,
        BotKind::Trending,
        BotKind::Funds,
        BotKind::Papers,
        BotKind::HealthFacts,
        BotKind::HealthBrief,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BotKind::Journals => "journals",
            BotKind::Trending => "trending",
            BotKind::Funds => "funds",
            BotKind::Papers => "papers",
            BotKind::HealthFacts => "health-facts",
            BotKind::HealthBrief => "health-brief",
        }
    }
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BotKind::ALL
            .into_iter()
            .find(|bot| bot.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown bot: {}", s))
    }
}

/// Prompt and report wording for one bot
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub bot: BotKind,
    /// Optional system message
    pub system: Option<String>,
    /// User prompt body with `{placeholders}`
    pub body: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// Sanitizer settings for this bot's output
    pub sanitizer: SanitizerConfig,
    /// First header line; `{date}` and `{md}` are available
    pub banner: String,
    /// Second header line; `{count}` and `{sources}` are available
    pub summary: String,
    /// Report footer; `{sources_tried}` is available
    pub footer: String,
    /// Sentinel text used when nothing survives curation
    pub empty_message: String,
    /// Maximum characters of an item title shown in a section heading
    pub title_chars: usize,
}

impl PromptTemplate {
    /// Built-in template for a bot
    pub fn for_bot(bot: BotKind) -> Self {
        match bot {
            BotKind::Journals => journals(),
            BotKind::Trending => trending(),
            BotKind::Funds => funds(),
            BotKind::Papers => papers(),
            BotKind::HealthFacts => health_facts(),
            BotKind::HealthBrief => health_brief(),
        }
    }

    /// Render the user prompt for one curated item
    pub fn render_prompt(&self, item: &CuratedItem) -> String {
        fill(&self.body, &self.item_values(item))
    }

    /// Build the completion request for one curated item
    pub fn request(&self, item: &CuratedItem) -> AnalysisRequest {
        AnalysisRequest {
            system: self.system.clone(),
            prompt: self.render_prompt(item),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }

    fn item_values(&self, curated: &CuratedItem) -> BTreeMap<String, String> {
        let item = &curated.item;
        let mut values: BTreeMap<String, String> = item.attributes.clone();

        values.insert("title".to_string(), item.title.clone());
        values.insert("source".to_string(), item.source.clone());
        values.insert("link".to_string(), item.link.clone());
        values.insert("key".to_string(), item.identity_key.clone());
        values.insert("rank".to_string(), curated.rank.to_string());
        values.insert(
            "excerpt".to_string(),
            if item.body_excerpt.trim().is_empty() {
                MISSING.to_string()
            } else {
                item.body_excerpt.clone()
            },
        );
        if let Some(published) = item.published_at {
            values.insert("published".to_string(), published.date().to_string());
        }

        if self.bot == BotKind::Papers {
            values.insert("field_hint".to_string(), paper_field_hint(item.attribute("categories")));
        }

        values
    }
}

/// Placeholder value for fields the item does not carry
pub const MISSING: &str = "N/A";

/// Replace `{name}` placeholders; unknown names become [`MISSING`]
pub fn fill(template: &str, values: &BTreeMap<String, String>) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder pattern"));

    re.replace_all(template, |caps: &Captures<'_>| {
        values
            .get(&caps[1])
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| MISSING.to_string())
    })
    .into_owned()
}

fn paper_field_hint(categories: Option<&str>) -> String {
    let categories = categories.unwrap_or_default().to_lowercase();
    let is_bio = ["bio", "genomics", "rna", "cell", "medical"]
        .iter()
        .any(|marker| categories.contains(marker));

    if is_bio {
        "单细胞(scRNA-seq)注意dropout/批次效应/降维质量控制".to_string()
    } else {
        "关注深度学习架构/损失函数设计/计算效率".to_string()
    }
}

const NO_MARKUP_RULE: &str = "禁止使用Markdown符号（井号、星号、减号、反引号、大于号），只能用emoji、中文、数字、换行，列表用•开头。";

fn journals() -> PromptTemplate {
    PromptTemplate {
        bot: BotKind::Journals,
        system: None,
        body: format!(
            r#"你是Cell/Nature期刊的资深审稿人，请对这篇顶刊文章做"研究生组会汇报"级别的深度解析（总字数<600字，严格结构）：

文章信息
期刊：{{source}}（IF: {{impact_factor}}）
标题：{{title}}
摘要片段：{{excerpt}}

🏆 研究档次
• 研究类型：概念突破/技术革命/临床转化/机制深挖？
• 一句话评级：领域里程碑/重要补充/incremental work？

🧬 核心发现
• 颠覆了哪个传统认知，或填补了哪个空白？
• 关键实验设计与数据规模

💊 医学意义
• 能否改变诊疗指南？潜在靶点是否已有药物？

⚠️ 审稿人视角的质疑
• 实验设计漏洞、因果证据、样本偏倚

🎯 你能学到什么
• 可迁移的技术、提问思路、写作技巧

严禁套路化评价，必须有具体批判点。{rule}"#,
            rule = NO_MARKUP_RULE
        ),
        temperature: 0.4,
        max_output_tokens: 1200,
        sanitizer: SanitizerConfig::default(),
        banner: "🏆 CNS晨读 | {md}".to_string(),
        summary: "📊 扫描 {sources} 本顶刊，精选 {count} 篇".to_string(),
        footer: "📚 来源：期刊官网RSS | 由 AI 审稿人解读".to_string(),
        empty_message: "📭 今日CNS无生物医学相关新文，或抓取失败".to_string(),
        title_chars: 60,
    }
}

fn trending() -> PromptTemplate {
    PromptTemplate {
        bot: BotKind::Trending,
        system: None,
        body: format!(
            r#"你是资深开源项目分析师，请用极简语言总结这个GitHub项目（总字数<150字）：

仓库：{{title}}
语言：{{source}}
描述：{{excerpt}}
总Star：{{stars}} | 今日新增：{{stars_today}}

请输出一行：
💡 一句话定位 | 🚀 解决痛点 | 🎯 适合谁

示例：💡 API性能测试工具 | 🚀 比Postman轻量，支持自动化压测 | 🎯 后端开发自测接口用
{rule}"#,
            rule = NO_MARKUP_RULE
        ),
        temperature: 0.5,
        max_output_tokens: 400,
        sanitizer: SanitizerConfig::default(),
        banner: "🔥 GitHub 今日热点 | {date}".to_string(),
        summary: "📌 {sources} 个榜单，共 {count} 个仓库".to_string(),
        footer: "⭐ 数据来源：GitHub Trending | 由 AI 速读".to_string(),
        empty_message: "📭 今日 GitHub Trending 抓取失败或被反爬，请稍后重试".to_string(),
        title_chars: 80,
    }
}

fn funds() -> PromptTemplate {
    PromptTemplate {
        bot: BotKind::Funds,
        system: None,
        body: format!(
            r#"你是一位专业基金投顾（CFA持证人），请对以下基金进行深度分析，并给出同类型的优选对比（总字数<600字，严格格式）。

基金信息
名称代码：{{title}}（{{key}}）
最新净值：{{nav}} | 盘中估值：{{estimate}}（涨跌：{{change_percent}}%）
估值时间：{{valuation_time}}
类型提示：混合偏股型，关注股票仓位和重仓行业

📊 基金诊断
• 健康度评级（5星制）、当前状态（🟢适合加仓 / 🟡持有观望 / 🔴考虑转换）、适合人群

📈 业绩分析
• 近期表现、风险特征、性价比

⚠️ 风险扫描
• 持仓风险、规模风险、经理风险

🔄 优化建议
• 同类型更优选择（给出代码和名称）或互补配置

💡 今日操作建议
• 定投、单笔、持仓、止损，必须明确

合规声明：以上对比仅基于公开数据分析，不构成投资建议。
禁止模糊表述、禁止预测具体点位、禁止保证收益。{rule}"#,
            rule = NO_MARKUP_RULE
        ),
        temperature: 0.4,
        max_output_tokens: 1200,
        sanitizer: SanitizerConfig {
            strip_brackets: true,
        },
        banner: "💰 每日基金诊断 | {date}".to_string(),
        summary: "📊 今日诊断 {count} 只基金".to_string(),
        footer: "📈 数据来源：天天基金 | 由 AI 分析\n⚠️ 风险提示：以上分析仅供参考，不构成投资建议。基金有风险，投资需谨慎。"
            .to_string(),
        empty_message: "📭 今日基金分析失败，请检查网络或基金代码".to_string(),
        title_chars: 40,
    }
}

fn papers() -> PromptTemplate {
    PromptTemplate {
        bot: BotKind::Papers,
        system: None,
        body: format!(
            r#"你是一位高效的学术猎手，请用极简方式分析这篇论文（总字数<600字）：

论文：{{title}}
作者：{{authors}}
领域：{{primary_category}}
摘要：{{excerpt}}

🔍 摘要翻译（100字内）
💡 为什么做（现有方法缺陷与本文思路，50字内）
⚙️ 怎么做（输入、核心步骤、输出，150字内）
📊 好在哪里（关键指标对比SOTA，50字内）
⚠️ 坑在哪（计算开销、数据依赖、参数敏感性，30字内）
🛠️ 复现难度（开源情况、硬件要求、关键依赖，30字内）
🎯 速记版（核心一句话 + 三步流程，用初中词汇）

领域提示：{{field_hint}}
{rule}"#,
            rule = NO_MARKUP_RULE
        ),
        temperature: 0.4,
        max_output_tokens: 1200,
        sanitizer: SanitizerConfig::default(),
        banner: "🎓 每日论文速递 | {date}".to_string(),
        summary: "📊 共发现 {count} 篇新论文".to_string(),
        footer: "📚 来源：arXiv | 由 AI 分析".to_string(),
        empty_message: "📭 今日暂无新论文（或arXiv未更新）".to_string(),
        title_chars: 80,
    }
}

fn health_facts() -> PromptTemplate {
    PromptTemplate {
        bot: BotKind::HealthFacts,
        system: None,
        body: format!(
            r#"你是一位循证医学科普作家，请将以下信息改写为有明确来源标签的生活建议（总字数<400字）。

主题：{{title}}
来源：{{source}}
内容：{{excerpt}}

🧠 今日冷知识（1句话，反直觉的科学事实，带⚠️警示或✅建议）
📖 为什么（机制解释，100字内，用大白话）
🔬 证据来源（✅强证据 / 📚参考知识 / ⚠️不适用人群）
❌ 常见谣言澄清

禁止出现"专家表示"等模糊来源，禁止推荐保健品或品牌，禁止绝对化表述。{rule}"#,
            rule = NO_MARKUP_RULE
        ),
        temperature: 0.7,
        max_output_tokens: 800,
        sanitizer: SanitizerConfig::default(),
        banner: "🌟 循证生活 | {md}".to_string(),
        summary: "📚 今日核查 {count} 条来源".to_string(),
        footer: "⚖️ 免责声明：以上信息仅供科普，不作为医疗建议，具体诊疗请咨询医师。".to_string(),
        empty_message: "📭 今日科普素材获取失败，请手动检查网络".to_string(),
        title_chars: 60,
    }
}

fn health_brief() -> PromptTemplate {
    PromptTemplate {
        bot: BotKind::HealthBrief,
        system: None,
        body: format!(
            r#"你是一位医学科普博主，请基于以下今日热点话题，写一篇朋友圈风格的科普短文（总字数<400字）。

来源：{{source}}
标题：{{title}}
{{excerpt}}

🧠 现象解读：为什么大家关注这个话题（1句话）
📖 科学原理：用大白话解释机制（100字内）
✅ 正确做法：3条具体可操作的建议
❌ 常见误区：辟谣1个相关错误认知

像朋友分享经验，不要说教，每段用emoji开头，专业术语要解释。{rule}"#,
            rule = NO_MARKUP_RULE
        ),
        temperature: 0.7,
        max_output_tokens: 800,
        sanitizer: SanitizerConfig {
            strip_brackets: true,
        },
        banner: "🌐 每日健康速递 | {md}".to_string(),
        summary: "💡 今日话题 {count} 个".to_string(),
        footer: "📡 数据抓取：{sources_tried}\n⚖️ 免责声明：仅供参考，具体诊疗请咨询医师"
            .to_string(),
        empty_message: "📭 今日健康话题获取失败，请检查网络".to_string(),
        title_chars: 60,
    }
}
