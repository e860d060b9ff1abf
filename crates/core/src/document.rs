//! Styled document model and the markdown-to-document renderer.
//!
//! `render` turns synopsis markdown into a [`StyledDocument`]: page geometry, a default body
//! font, and one styled element per heading or paragraph line, in source order. Styling is
//! resolved here so that serialization (see [`crate::docx`]) is a plain mapping.
//!
//! Lengths are stored in twips (1/1440 inch) and spacing in points, matching the units the
//! word-processor format uses.

use crate::markdown::{Block, HeadingLevel, LineMarker, MarkdownService, SectionRole};
use crate::{SynopsisError, SynopsisResult};
use std::path::Path;

pub const TWIPS_PER_INCH: i32 = 1440;

const HALF_INCH: i32 = TWIPS_PER_INCH / 2;
const QUARTER_INCH: i32 = TWIPS_PER_INCH / 4;

/// Serif face used for body text and headings.
pub const BODY_FONT: &str = "Times New Roman";
pub const BODY_SIZE_PT: u32 = 12;

/// Page margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub margin_top: i32,
    pub margin_right: i32,
    pub margin_bottom: i32,
    pub margin_left: i32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            margin_top: TWIPS_PER_INCH,
            margin_right: TWIPS_PER_INCH,
            margin_bottom: TWIPS_PER_INCH,
            margin_left: TWIPS_PER_INCH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub family: String,
    pub size_pt: u32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: BODY_FONT.into(),
            size_pt: BODY_SIZE_PT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    None,
    /// Whole paragraph shifted right.
    Left(i32),
    /// First line starts at `left - hanging`, wrapped lines at `left`.
    Hanging { left: i32, hanging: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpacingRule {
    Single,
    /// 1.5 lines.
    Relaxed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingStyle {
    pub size_pt: u32,
    pub bold: bool,
    pub space_before_pt: u32,
    pub space_after_pt: u32,
}

impl HeadingStyle {
    /// Level-1 headings are 18pt bold; level-2 headings are 14pt and not bold.
    pub fn for_level(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::One => Self {
                size_pt: 18,
                bold: true,
                space_before_pt: 24,
                space_after_pt: 16,
            },
            HeadingLevel::Two => Self {
                size_pt: 14,
                bold: false,
                space_before_pt: 18,
                space_after_pt: 12,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphStyle {
    pub indent: Indent,
    pub line_spacing: LineSpacingRule,
    pub space_after_pt: u32,
    pub bold: bool,
}

impl ParagraphStyle {
    /// Resolve paragraph styling: the section role decides everything, then the line marker
    /// overrides the indentation alone.
    pub fn resolve(role: SectionRole, marker: LineMarker) -> Self {
        let base = match role {
            SectionRole::Plain => Self {
                indent: Indent::None,
                line_spacing: LineSpacingRule::Single,
                space_after_pt: 10,
                bold: false,
            },
            SectionRole::MethodologyPoint => Self {
                indent: Indent::Hanging {
                    left: HALF_INCH,
                    hanging: QUARTER_INCH,
                },
                line_spacing: LineSpacingRule::Relaxed,
                space_after_pt: 12,
                bold: false,
            },
            SectionRole::Outcomes => Self {
                indent: Indent::None,
                line_spacing: LineSpacingRule::Relaxed,
                space_after_pt: 12,
                bold: false,
            },
            SectionRole::Reference => Self {
                indent: Indent::Hanging {
                    left: HALF_INCH,
                    hanging: HALF_INCH,
                },
                line_spacing: LineSpacingRule::Relaxed,
                space_after_pt: 12,
                bold: false,
            },
        };

        let indent = match marker {
            LineMarker::None => base.indent,
            LineMarker::Roman => Indent::None,
            LineMarker::Numbered => Indent::Left(QUARTER_INCH),
        };

        Self { indent, ..base }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyledElement {
    Heading {
        level: HeadingLevel,
        text: String,
        style: HeadingStyle,
    },
    Paragraph {
        text: String,
        role: SectionRole,
        marker: LineMarker,
        style: ParagraphStyle,
    },
}

impl From<Block> for StyledElement {
    fn from(block: Block) -> Self {
        match block {
            Block::Heading { level, text } => Self::Heading {
                level,
                text,
                style: HeadingStyle::for_level(level),
            },
            Block::Paragraph { text, role, marker } => Self::Paragraph {
                text,
                role,
                marker,
                style: ParagraphStyle::resolve(role, marker),
            },
        }
    }
}

/// A fully styled document, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledDocument {
    pub geometry: PageGeometry,
    pub font: FontSpec,
    pub elements: Vec<StyledElement>,
}

impl StyledDocument {
    pub fn headings(&self) -> impl Iterator<Item = &StyledElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e, StyledElement::Heading { .. }))
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &StyledElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e, StyledElement::Paragraph { .. }))
    }
}

/// Render markdown source into a styled document.
///
/// # Errors
///
/// Returns `SynopsisError::Parse` if the source contains no blocks.
pub fn render(source: &str) -> SynopsisResult<StyledDocument> {
    let blocks = MarkdownService::new().document_parse(source)?;

    Ok(StyledDocument {
        geometry: PageGeometry::default(),
        font: FontSpec::default(),
        elements: blocks.into_iter().map(StyledElement::from).collect(),
    })
}

/// Render raw bytes, which must be UTF-8 text.
///
/// # Errors
///
/// Returns `SynopsisError::Parse` if the bytes are not valid UTF-8 or contain no blocks.
pub fn render_bytes(source: &[u8]) -> SynopsisResult<StyledDocument> {
    let text = std::str::from_utf8(source)
        .map_err(|e| SynopsisError::Parse(format!("source is not valid UTF-8: {e}")))?;
    render(text)
}

/// Load a markdown file and render it.
///
/// # Errors
///
/// Returns `SynopsisError::FileRead` if the file cannot be read, or `SynopsisError::Parse` as
/// for [`render_bytes`].
pub fn render_file(path: &Path) -> SynopsisResult<StyledDocument> {
    let bytes = std::fs::read(path).map_err(SynopsisError::FileRead)?;
    render_bytes(&bytes)
}
