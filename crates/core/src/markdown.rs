//! Synopsis markdown construction and parsing.
//!
//! The synopsis is written in a deliberately small markdown dialect:
//!
//! - `# ` starts a level-1 heading, which also names the current section
//! - `## ` and `### ` start a level-2 heading, which never changes the current section
//! - every other non-blank line is a paragraph line
//! - a line that is exactly `---` is a horizontal rule and is dropped
//! - `*` emphasis markers are removed from headings and paragraph lines
//!
//! Blocks are separated by one or more blank lines. Parsing is a single forward pass that
//! threads the current section through a fold, so classification depends only on the text seen
//! so far.

use crate::constants::{
    FACILITIES_TITLE, FEASIBILITY_TITLE, LITERATURE_REVIEW_TITLE, METHODOLOGY_TITLE,
    OUTCOMES_TITLE, REFERENCES_TITLE,
};
use crate::{SynopsisError, SynopsisResult};
use synopsis_types::{PaperRecord, Synopsis};

const LEVEL1_MARKER: &str = "# ";
const LEVEL2_MARKERS: [&str; 2] = ["### ", "## "];
const HORIZONTAL_RULE: &str = "---";

/// Literal line prefixes recognised as roman-numeral list items.
const ROMAN_MARKERS: [&str; 4] = ["I.", "II.", "III.", "IV."];
/// Literal line prefixes recognised as numbered list items. Six or more items are not detected.
const NUMBERED_MARKERS: [&str; 5] = ["1.", "2.", "3.", "4.", "5."];

const METHODOLOGY_KEY: &str = "Methodology";
const OUTCOMES_KEY: &str = "Expected Outcomes";
const REFERENCES_KEY: &str = "References";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    One,
    Two,
}

/// Paragraph classification derived from the enclosing level-1 section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRole {
    Plain,
    MethodologyPoint,
    Outcomes,
    Reference,
}

impl SectionRole {
    /// Classify a paragraph line given the current section name.
    ///
    /// Section names are matched by substring, so `"Methodology/Planning of Project"` counts as
    /// a methodology section. Before any level-1 heading every line is plain.
    pub fn classify(current_section: Option<&str>, line: &str) -> Self {
        match current_section {
            Some(section) if section.contains(METHODOLOGY_KEY) => {
                if starts_with_digit_dot(line) {
                    Self::MethodologyPoint
                } else {
                    Self::Plain
                }
            }
            Some(section) if section.contains(OUTCOMES_KEY) => Self::Outcomes,
            Some(section) if section.contains(REFERENCES_KEY) => Self::Reference,
            _ => Self::Plain,
        }
    }
}

/// Line-level list marker, independent of the section role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMarker {
    None,
    Roman,
    Numbered,
}

impl LineMarker {
    /// Exact literal prefix match; `"10. x"` is not numbered.
    pub fn detect(line: &str) -> Self {
        if ROMAN_MARKERS.iter().any(|m| line.starts_with(m)) {
            Self::Roman
        } else if NUMBERED_MARKERS.iter().any(|m| line.starts_with(m)) {
            Self::Numbered
        } else {
            Self::None
        }
    }
}

/// A classified unit of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: HeadingLevel,
        text: String,
    },
    Paragraph {
        text: String,
        role: SectionRole,
        marker: LineMarker,
    },
}

fn starts_with_digit_dot(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), Some('.')) if c.is_ascii_digit()
    )
}

/// Emphasis markers are not part of the dialect; strip them so `**1.** Step` reads `1. Step`.
fn strip_emphasis(line: &str) -> String {
    line.replace('*', "").trim().to_string()
}

/// Split source text into blocks of lines.
///
/// A blank or whitespace-only line ends the current block; runs of blank lines collapse into a
/// single boundary. `\r\n` line endings are handled by `str::lines`.
pub fn split_blocks(source: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in source.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Service for building and parsing synopsis markdown.
#[derive(Debug, Clone, Default)]
pub struct MarkdownService;

impl MarkdownService {
    /// Creates a new `MarkdownService` instance.
    pub fn new() -> Self {
        Self
    }

    /// Formats one reference entry.
    ///
    /// Produces `"{authors} ({year}). {title}."`, followed by `" Retrieved from {url}"` only
    /// when the paper has a URL that is not the `N/A` placeholder.
    pub fn reference_render(&self, paper: &PaperRecord) -> String {
        let mut reference = format!("{} ({}). {}.", paper.authors, paper.year, paper.title);
        if let Some(url) = paper.link() {
            reference.push_str(" Retrieved from ");
            reference.push_str(url);
        }
        reference
    }

    /// Renders a synopsis and its references into the markdown dialect.
    ///
    /// Layout produced:
    /// ```markdown
    /// # <title>
    ///
    /// ---
    ///
    /// # Introduction
    ///
    /// <first introduction paragraph>
    ///
    /// ## Rationale
    ///
    /// <rationale>
    ///
    /// ## Objectives
    ///
    /// <objectives>
    ///
    /// # Literature Review
    /// ... one level-1 section per main part ...
    /// # References
    ///
    /// <one reference per block>
    /// ```
    ///
    /// Missing sections render as empty blocks, which the parser drops.
    ///
    /// # Arguments
    ///
    /// * `synopsis` - Generated sections
    /// * `references` - Papers cited in the reference list, in order
    pub fn synopsis_render(&self, synopsis: &Synopsis, references: &[PaperRecord]) -> String {
        let mut output = String::new();

        let title = synopsis.title.trim().trim_matches('"').trim();
        output.push_str(&format!("{LEVEL1_MARKER}{title}\n\n"));
        output.push_str(&format!("{HORIZONTAL_RULE}\n\n"));

        output.push_str(&format!("{LEVEL1_MARKER}Introduction\n\n"));
        let mut intro_paragraphs = synopsis
            .introduction
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(first) = intro_paragraphs.next() {
            output.push_str(&format!("{first}\n\n"));
        }

        // The introduction prompt sometimes returns the rationale as its second paragraph.
        let rationale = match synopsis.rationale.trim() {
            "" => intro_paragraphs.next().unwrap_or(""),
            rationale => rationale,
        };
        output.push_str("## Rationale\n\n");
        if !rationale.is_empty() {
            output.push_str(&format!("{rationale}\n\n"));
        }

        output.push_str("## Objectives\n\n");
        output.push_str(&format!("{}\n\n", synopsis.objectives.trim()));

        let main_sections = [
            (LITERATURE_REVIEW_TITLE, &synopsis.literature_review),
            (FEASIBILITY_TITLE, &synopsis.feasibility),
            (METHODOLOGY_TITLE, &synopsis.methodology),
            (FACILITIES_TITLE, &synopsis.facilities),
            (OUTCOMES_TITLE, &synopsis.outcomes),
        ];
        for (title, content) in main_sections {
            output.push_str(&format!("{LEVEL1_MARKER}{title}\n\n"));
            output.push_str(&format!("{}\n\n", content.trim()));
        }

        output.push_str(&format!("{LEVEL1_MARKER}{REFERENCES_TITLE}\n\n"));
        for paper in references {
            output.push_str(&format!("{}\n\n", self.reference_render(paper)));
        }

        output
    }

    /// Parses source text into classified blocks.
    ///
    /// Heading blocks are recognised by their first line. Any further lines in a heading block
    /// are classified as paragraph lines under the section that heading establishes. Every
    /// other block yields one `Block::Paragraph` per non-blank line.
    ///
    /// # Errors
    ///
    /// Returns `SynopsisError::Parse` if the text contains no blocks at all.
    pub fn document_parse(&self, source: &str) -> SynopsisResult<Vec<Block>> {
        let raw_blocks = split_blocks(source);
        if raw_blocks.is_empty() {
            return Err(SynopsisError::Parse(
                "document contains no blocks".to_string(),
            ));
        }

        let (blocks, _) = raw_blocks.iter().fold(
            (Vec::new(), None),
            |(mut blocks, current_section), lines| {
                let current_section = self.block_classify(lines, current_section, &mut blocks);
                (blocks, current_section)
            },
        );

        Ok(blocks)
    }

    /// Classifies one raw block, appending to `out`, and returns the updated current section.
    fn block_classify(
        &self,
        lines: &[&str],
        current_section: Option<String>,
        out: &mut Vec<Block>,
    ) -> Option<String> {
        let Some((first, rest)) = lines.split_first() else {
            return current_section;
        };
        let head = first.trim_start();

        let (section, body) = if let Some(text) = head.strip_prefix(LEVEL1_MARKER) {
            let text = strip_emphasis(text);
            out.push(Block::Heading {
                level: HeadingLevel::One,
                text: text.clone(),
            });
            (Some(text), rest)
        } else if let Some(text) = LEVEL2_MARKERS.iter().find_map(|m| head.strip_prefix(m)) {
            out.push(Block::Heading {
                level: HeadingLevel::Two,
                text: strip_emphasis(text),
            });
            (current_section, rest)
        } else {
            (current_section, lines)
        };

        for line in body {
            if line.trim() == HORIZONTAL_RULE {
                continue;
            }
            // A line of bare emphasis markers still yields an (empty) paragraph.
            let text = strip_emphasis(line);
            out.push(Block::Paragraph {
                role: SectionRole::classify(section.as_deref(), &text),
                marker: LineMarker::detect(&text),
                text,
            });
        }

        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: HeadingLevel, text: &str) -> Block {
        Block::Heading {
            level,
            text: text.into(),
        }
    }

    fn paragraph(text: &str, role: SectionRole, marker: LineMarker) -> Block {
        Block::Paragraph {
            text: text.into(),
            role,
            marker,
        }
    }

    fn paper(url: &str) -> PaperRecord {
        PaperRecord {
            title: "A Study".into(),
            authors: "Smith, J.".into(),
            year: "2020".into(),
            url: url.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_render_with_url() {
        let service = MarkdownService::new();
        assert_eq!(
            service.reference_render(&paper("http://x")),
            "Smith, J. (2020). A Study. Retrieved from http://x"
        );
    }

    #[test]
    fn test_reference_render_placeholder_url() {
        let service = MarkdownService::new();
        assert_eq!(
            service.reference_render(&paper("N/A")),
            "Smith, J. (2020). A Study."
        );
        assert_eq!(service.reference_render(&paper("")), "Smith, J. (2020). A Study.");
    }

    #[test]
    fn test_split_blocks_collapses_blank_runs() {
        let blocks = split_blocks("a\nb\n\n\n\nc\n   \nd\r\ne");
        assert_eq!(blocks, vec![vec!["a", "b"], vec!["c"], vec!["d", "e"]]);
    }

    #[test]
    fn test_parse_scenario_level2_keeps_section() {
        let service = MarkdownService::new();
        let blocks = service
            .document_parse("# Intro\n\nSome text.\n\n### Sub\n\nMore text.")
            .unwrap();
        assert_eq!(
            blocks,
            vec![
                heading(HeadingLevel::One, "Intro"),
                paragraph("Some text.", SectionRole::Plain, LineMarker::None),
                heading(HeadingLevel::Two, "Sub"),
                paragraph("More text.", SectionRole::Plain, LineMarker::None),
            ]
        );
    }

    #[test]
    fn test_parse_without_headings_gives_one_paragraph_per_line() {
        let service = MarkdownService::new();
        let blocks = service
            .document_parse("first line\nsecond line\n\nthird\n\n\nfourth\n")
            .unwrap();
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| matches!(
            b,
            Block::Paragraph {
                role: SectionRole::Plain,
                ..
            }
        )));
    }

    #[test]
    fn test_parse_blank_separators_yield_only_headings() {
        let service = MarkdownService::new();
        let blocks = service.document_parse("# Title\n\n\n\n# Next").unwrap();
        assert_eq!(
            blocks,
            vec![
                heading(HeadingLevel::One, "Title"),
                heading(HeadingLevel::One, "Next"),
            ]
        );
    }

    #[test]
    fn test_parse_section_sticks_across_level2_heading() {
        let service = MarkdownService::new();
        let source = "# Methodology\n\n## Data Collection\n\n1. Gather data\nContext line\n\n# Outcomes\n\nDone.";
        let blocks = service.document_parse(source).unwrap();
        assert_eq!(
            blocks[2],
            paragraph(
                "1. Gather data",
                SectionRole::MethodologyPoint,
                LineMarker::Numbered
            )
        );
        assert_eq!(
            blocks[3],
            paragraph("Context line", SectionRole::Plain, LineMarker::None)
        );
        assert_eq!(
            blocks[5],
            paragraph("Done.", SectionRole::Plain, LineMarker::None)
        );
    }

    #[test]
    fn test_methodology_point_requires_single_digit_then_dot() {
        assert_eq!(
            SectionRole::classify(Some("Methodology/Planning of Project"), "7. Deploy"),
            SectionRole::MethodologyPoint
        );
        assert_eq!(
            SectionRole::classify(Some("Methodology"), "10. Something"),
            SectionRole::Plain
        );
        assert_eq!(
            SectionRole::classify(None, "1. Something"),
            SectionRole::Plain
        );
    }

    #[test]
    fn test_line_marker_is_exact_literal() {
        assert_eq!(LineMarker::detect("1. Something"), LineMarker::Numbered);
        assert_eq!(LineMarker::detect("5. Something"), LineMarker::Numbered);
        assert_eq!(LineMarker::detect("6. Something"), LineMarker::None);
        assert_eq!(LineMarker::detect("10. Something"), LineMarker::None);
        assert_eq!(LineMarker::detect("I. Overview"), LineMarker::Roman);
        assert_eq!(LineMarker::detect("III. Scope"), LineMarker::Roman);
        assert_eq!(LineMarker::detect("IV. Plan"), LineMarker::Roman);
        assert_eq!(LineMarker::detect("V. Later"), LineMarker::None);
        assert_eq!(LineMarker::detect("Intro"), LineMarker::None);
    }

    #[test]
    fn test_outcomes_and_references_roles() {
        let service = MarkdownService::new();
        let source = "# Expected Outcomes\n\n**Bold** claim.\n\n# References\n\nSmith, J. (2020). A Study.";
        let blocks = service.document_parse(source).unwrap();
        assert_eq!(
            blocks[1],
            paragraph("Bold claim.", SectionRole::Outcomes, LineMarker::None)
        );
        assert_eq!(
            blocks[3],
            paragraph(
                "Smith, J. (2020). A Study.",
                SectionRole::Reference,
                LineMarker::None
            )
        );
    }

    #[test]
    fn test_heading_block_trailing_lines_become_paragraphs() {
        let service = MarkdownService::new();
        let blocks = service
            .document_parse("# References\nSmith, J. (2020). A Study.")
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[1],
            paragraph(
                "Smith, J. (2020). A Study.",
                SectionRole::Reference,
                LineMarker::None
            )
        );
    }

    #[test]
    fn test_horizontal_rule_is_dropped() {
        let service = MarkdownService::new();
        let blocks = service.document_parse("# Title\n\n---\n\n# Intro").unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_emphasis_only_block_still_yields_paragraph() {
        let service = MarkdownService::new();
        let blocks = service.document_parse("# Intro\n\n***\n\nText").unwrap();
        assert_eq!(
            blocks,
            vec![
                heading(HeadingLevel::One, "Intro"),
                paragraph("", SectionRole::Plain, LineMarker::None),
                paragraph("Text", SectionRole::Plain, LineMarker::None),
            ]
        );
    }

    #[test]
    fn test_heading_emphasis_is_stripped() {
        let service = MarkdownService::new();
        let blocks = service
            .document_parse("# **Bold Title**\n\n## *Sub*\n\n# **References**\n\nA (2020). B.")
            .unwrap();
        assert_eq!(blocks[0], heading(HeadingLevel::One, "Bold Title"));
        assert_eq!(blocks[1], heading(HeadingLevel::Two, "Sub"));
        assert_eq!(
            blocks[3],
            paragraph("A (2020). B.", SectionRole::Reference, LineMarker::None)
        );
    }

    #[test]
    fn test_parse_empty_fails() {
        let service = MarkdownService::new();
        assert!(matches!(
            service.document_parse(""),
            Err(SynopsisError::Parse(_))
        ));
        assert!(matches!(
            service.document_parse(" \n\n \t\n"),
            Err(SynopsisError::Parse(_))
        ));
    }

    #[test]
    fn test_synopsis_render_layout() {
        let service = MarkdownService::new();
        let synopsis = Synopsis {
            title: "\"Deep Learning for Crops\"".into(),
            introduction: "Intro paragraph.\n\nSecond paragraph.".into(),
            objectives: "1. To measure.\n2. To compare.".into(),
            methodology: "1. Data Collection".into(),
            outcomes: "Better yields.".into(),
            ..Default::default()
        };
        let markdown = service.synopsis_render(&synopsis, &[paper("http://x")]);

        assert!(markdown.starts_with("# Deep Learning for Crops\n\n---\n\n# Introduction\n\n"));
        assert!(markdown.contains("Intro paragraph.\n\n## Rationale\n\nSecond paragraph.\n\n"));
        assert!(markdown.contains("# Methodology/Planning of Project\n\n1. Data Collection\n\n"));
        assert!(markdown.ends_with("# References\n\nSmith, J. (2020). A Study. Retrieved from http://x\n\n"));
    }

    #[test]
    fn test_synopsis_render_prefers_explicit_rationale() {
        let service = MarkdownService::new();
        let synopsis = Synopsis {
            introduction: "Intro.\n\nIgnored second paragraph.".into(),
            rationale: "Because.".into(),
            ..Default::default()
        };
        let markdown = service.synopsis_render(&synopsis, &[]);
        assert!(markdown.contains("## Rationale\n\nBecause.\n\n"));
        assert!(!markdown.contains("Ignored second paragraph."));
    }

    #[test]
    fn test_synopsis_render_then_parse_classifies_sections() {
        let service = MarkdownService::new();
        let synopsis = Synopsis {
            title: "T".into(),
            methodology: "1. Collect\n2. Clean".into(),
            outcomes: "Results.".into(),
            ..Default::default()
        };
        let markdown = service.synopsis_render(&synopsis, &[paper("N/A")]);
        let blocks = service.document_parse(&markdown).unwrap();

        let roles: Vec<SectionRole> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::Paragraph { role, .. } => Some(*role),
                Block::Heading { .. } => None,
            })
            .collect();
        assert_eq!(
            roles,
            vec![
                SectionRole::MethodologyPoint,
                SectionRole::MethodologyPoint,
                SectionRole::Outcomes,
                SectionRole::Reference,
            ]
        );
    }
}
