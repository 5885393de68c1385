//! Report assembly - composes analysis results into the deliverable text

use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::model::{AnalysisResult, CuratedItem, Report, ReportSection};
use crate::prompt::{PromptTemplate, fill};

/// Used when a template carries an empty sentinel
pub const DEFAULT_EMPTY_MESSAGE: &str = "📭 No content today";

/// Run facts shown in the header and footer
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_at: OffsetDateTime,
    /// Number of configured sources
    pub source_count: usize,
    /// Sources actually consulted, in order
    pub sources_tried: Vec<String>,
}

/// Assembler for one bot's report wording
pub struct ReportAssembler {
    template: PromptTemplate,
}

impl ReportAssembler {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// Compose the report; an empty selection yields the sentinel
    pub fn assemble(
        &self,
        context: &RunContext,
        items: &[CuratedItem],
        results: &[AnalysisResult],
    ) -> Report {
        if items.is_empty() {
            return Report::NoContent {
                message: self.empty_message(),
            };
        }

        let values = self.context_values(context, items.len());

        let header = format!(
            "{}\n\n{}",
            fill(&self.template.banner, &values),
            fill(&self.template.summary, &values)
        );
        let footer = fill(&self.template.footer, &values);

        let sections = items
            .iter()
            .zip(results)
            .enumerate()
            .map(|(index, (curated, result))| ReportSection {
                number: index + 1,
                source: curated.item.source.clone(),
                title: truncate_chars(&curated.item.title, self.template.title_chars),
                link: curated.item.link.clone(),
                body: result.sanitized_text.clone(),
            })
            .collect();

        Report::Digest {
            header,
            sections,
            footer,
        }
    }

    fn empty_message(&self) -> String {
        if self.template.empty_message.trim().is_empty() {
            DEFAULT_EMPTY_MESSAGE.to_string()
        } else {
            self.template.empty_message.clone()
        }
    }

    fn context_values(&self, context: &RunContext, count: usize) -> BTreeMap<String, String> {
        let date = context.run_at.date();
        let mut values = BTreeMap::new();
        values.insert("date".to_string(), date.to_string());
        values.insert(
            "md".to_string(),
            format!("{:02}-{:02}", u8::from(date.month()), date.day()),
        );
        values.insert("count".to_string(), count.to_string());
        values.insert("sources".to_string(), context.source_count.to_string());
        values.insert("sources_tried".to_string(), context.sources_tried.join("/"));
        values
    }
}

/// Truncate to `max` characters, marking the cut with "..."
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Origin, RawItem};
    use crate::prompt::BotKind;
    use time::macros::datetime;

    fn context() -> RunContext {
        RunContext {
            run_at: datetime!(2025-03-07 08:00 UTC),
            source_count: 14,
            sources_tried: vec!["知乎热榜".to_string(), "WHO".to_string()],
        }
    }

    fn curated(rank: usize, title: &str) -> CuratedItem {
        CuratedItem {
            rank,
            item: RawItem::new(
                Origin::Feed,
                "Nature",
                title,
                format!("https://nature.com/{}", rank),
            ),
        }
    }

    fn result(key: &str, text: &str) -> AnalysisResult {
        AnalysisResult {
            item_identity_key: key.to_string(),
            raw_text: text.to_string(),
            sanitized_text: text.to_string(),
            failed: false,
        }
    }

    #[test]
    fn test_empty_selection_yields_sentinel() {
        let template = PromptTemplate::for_bot(BotKind::Journals);
        let expected = template.empty_message.clone();
        let report = ReportAssembler::new(template).assemble(&context(), &[], &[]);

        assert_eq!(report, Report::NoContent { message: expected.clone() });
        assert_eq!(report.render(), expected);
    }

    #[test]
    fn test_blank_sentinel_falls_back() {
        let mut template = PromptTemplate::for_bot(BotKind::Papers);
        template.empty_message = " ".to_string();
        let report = ReportAssembler::new(template).assemble(&context(), &[], &[]);
        assert_eq!(report.render(), DEFAULT_EMPTY_MESSAGE);
    }

    #[test]
    fn test_sections_are_numbered_in_order() {
        let assembler = ReportAssembler::new(PromptTemplate::for_bot(BotKind::Journals));
        let items = vec![curated(1, "First"), curated(2, "Second")];
        let results = vec![result("First", "analysis one"), result("Second", "analysis two")];

        let report = assembler.assemble(&context(), &items, &results);
        let text = report.render();

        assert_eq!(report.section_count(), 2);
        assert!(text.starts_with("🏆 CNS晨读 | 03-07\n\n📊 扫描 14 本顶刊，精选 2 篇"));
        let first = text.find("【1】Nature | First").unwrap();
        let second = text.find("【2】Nature | Second").unwrap();
        assert!(first < second);
        assert!(text.contains("analysis two\n🔗 https://nature.com/2"));
        assert!(text.trim_end().ends_with("由 AI 审稿人解读"));
    }

    #[test]
    fn test_footer_lists_sources_tried() {
        let assembler = ReportAssembler::new(PromptTemplate::for_bot(BotKind::HealthBrief));
        let report = assembler.assemble(
            &context(),
            &[curated(1, "Topic")],
            &[result("Topic", "text")],
        );
        assert!(report.render().contains("📡 数据抓取：知乎热榜/WHO"));
    }

    #[test]
    fn test_title_truncation_is_char_based() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("单细胞图谱揭示肿瘤微环境", 5), "单细胞图谱...");
        assert_eq!(truncate_chars("abc def ghi", 4), "abc...");
    }
}
