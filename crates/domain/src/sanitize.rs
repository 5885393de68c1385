//! Output sanitizer: reduces generative text to plain text with emoji
//!
//! The generative service is asked to avoid rich-text markup but does not
//! always comply. Every analysis passes through [`Sanitizer::sanitize`]
//! exactly once before it is placed in a report.

use regex::Regex;
use std::sync::OnceLock;

/// Glyph substituted for list markers
pub const BULLET: char = '•';

/// Sanitizer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizerConfig {
    /// Also remove the `【` / `】` bracket pair
    pub strip_brackets: bool,
}

/// Idempotent markup stripper
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
    config: SanitizerConfig,
}

impl Sanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> SanitizerConfig {
        self.config
    }

    /// Strip markup from `text`.
    ///
    /// `sanitize(sanitize(x)) == sanitize(x)` for every input.
    pub fn sanitize(&self, text: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut previous_blank = true;

        for line in text.split('\n') {
            let cleaned = self.sanitize_line(line);
            let blank = cleaned.is_empty();
            if blank && previous_blank {
                continue;
            }
            lines.push(cleaned);
            previous_blank = blank;
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }

    /// Check whether `text` still contains forbidden markup
    pub fn contains_markup(&self, text: &str) -> bool {
        text.split('\n').any(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with("- ")
                || line.contains(['#', '*', '`', '>'])
                || line.contains("__")
                || (self.config.strip_brackets && line.contains(['【', '】']))
        })
    }

    fn sanitize_line(&self, line: &str) -> String {
        let strip_brackets = self.config.strip_brackets;
        let line: String = line
            .chars()
            .filter(|c| match c {
                '`' | '>' => false,
                '【' | '】' => !strip_brackets,
                _ => true,
            })
            .collect();

        // Heading markers take their trailing space with them
        let (indent, rest) = split_indent(&line);
        let line = if rest.starts_with('#') {
            format!("{}{}", indent, rest.trim_start_matches('#').trim_start())
        } else {
            line.clone()
        };
        let line = line.replace('#', "");

        let (indent, rest) = split_indent(&line);
        let line = if rest.starts_with("* ") {
            format!("{}{} {}", indent, BULLET, &rest[2..])
        } else {
            line.clone()
        };
        let line = line.replace('*', "");

        let line = underscore_runs().replace_all(&line, "").into_owned();

        let (indent, rest) = split_indent(&line);
        let line = if let Some(stripped) = rest.strip_prefix("- ") {
            format!("{}{} {}", indent, BULLET, stripped)
        } else {
            line.clone()
        };

        line.trim_end().to_string()
    }
}

fn split_indent(line: &str) -> (&str, &str) {
    let rest = line.trim_start();
    (&line[..line.len() - rest.len()], rest)
}

fn underscore_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("_{2,}").expect("valid underscore pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<&'static str> {
        vec![
            "",
            "plain text",
            "# Title\n## Sub\n### Deep",
            "**bold** and *italic* and __under__",
            "- item one\n- item two\n  - nested",
            "* star bullet\n*not a bullet*",
            "```rust\nfn main() {}\n```",
            "> quoted\n>> double",
            "【研究档次】 重要补充",
            "a___b ____ c_d",
            "_#_ hidden underscores",
            "#* heading star",
            "*- star dash",
            "__- underscore dash",
            "> - quoted bullet",
            "- - double dash",
            "🏆 研究档次 • 期刊实力：Nature (IF: 64.8)",
            "\n\n\nline\n\n\n\nline\n\n",
            "trailing spaces   \r\nwindows line\r\n",
            "A -> B => C",
            "-\n- \n-x",
        ]
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for strip_brackets in [false, true] {
            let sanitizer = Sanitizer::new(SanitizerConfig { strip_brackets });
            for input in samples() {
                let once = sanitizer.sanitize(input);
                let twice = sanitizer.sanitize(&once);
                assert_eq!(once, twice, "not idempotent for {:?}", input);
            }
        }
    }

    #[test]
    fn test_sanitize_never_emits_markup() {
        for strip_brackets in [false, true] {
            let sanitizer = Sanitizer::new(SanitizerConfig { strip_brackets });
            for input in samples() {
                let output = sanitizer.sanitize(input);
                assert!(
                    !sanitizer.contains_markup(&output),
                    "markup left in {:?} -> {:?}",
                    input,
                    output
                );
            }
        }
    }

    #[test]
    fn test_headings_and_emphasis_removed() {
        let sanitizer = Sanitizer::default();
        let output = sanitizer.sanitize("## 🧬 核心发现\n**颠覆** 了 *传统* 认知");
        assert_eq!(output, "🧬 核心发现\n颠覆 了 传统 认知");
    }

    #[test]
    fn test_list_markers_become_bullets() {
        let sanitizer = Sanitizer::default();
        let output = sanitizer.sanitize("- first\n  - nested\n* starred");
        assert_eq!(output, "• first\n  • nested\n• starred");
    }

    #[test]
    fn test_brackets_are_optional() {
        let keep = Sanitizer::default();
        let strip = Sanitizer::new(SanitizerConfig {
            strip_brackets: true,
        });

        assert_eq!(keep.sanitize("【合规声明】 仅供参考"), "【合规声明】 仅供参考");
        assert_eq!(strip.sanitize("【合规声明】 仅供参考"), "合规声明 仅供参考");
    }

    #[test]
    fn test_emoji_cjk_and_punctuation_untouched() {
        let sanitizer = Sanitizer::new(SanitizerConfig {
            strip_brackets: true,
        });
        let input = "📊 基金诊断：⭐⭐⭐⭐（5星制），适合定投！snake_case, 3.5% - ok?";
        assert_eq!(sanitizer.sanitize(input), input);
    }

    #[test]
    fn test_blank_lines_collapsed() {
        let sanitizer = Sanitizer::default();
        assert_eq!(sanitizer.sanitize("\n\na\n\n\n\nb\n\n"), "a\n\nb");
    }
}
