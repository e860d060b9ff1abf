//! DOCX serialization of a [`StyledDocument`].
//!
//! The document is packed in memory first; only a complete archive is written to disk. The
//! bytes go to a sibling `.partial` file that is renamed over the target once the handle has
//! been flushed and closed, so an interrupted save never leaves a truncated `.docx` behind.

use crate::document::{Indent, LineSpacingRule, StyledDocument, StyledElement};
use crate::markdown::HeadingLevel;
use crate::{SynopsisError, SynopsisResult};
use docx_rs::{
    Docx, LineSpacing, PageMargin, Paragraph, Run, RunFonts, SpecialIndentType, Style, StyleType,
};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

const HEADING1_STYLE: &str = "Heading1";
const HEADING2_STYLE: &str = "Heading2";

fn fonts(family: &str) -> RunFonts {
    RunFonts::new()
        .ascii(family)
        .hi_ansi(family)
        .east_asia(family)
        .cs(family)
}

/// Sizes in the format are half-points.
fn half_points(pt: u32) -> usize {
    (pt * 2) as usize
}

/// Spacing in the format is twentieths of a point.
fn twentieths(pt: u32) -> u32 {
    pt * 20
}

fn heading_style_id(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::One => HEADING1_STYLE,
        HeadingLevel::Two => HEADING2_STYLE,
    }
}

fn initialize_styles(docx: Docx, family: &str) -> Docx {
    let heading1 = Style::new(HEADING1_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .fonts(fonts(family))
        .size(half_points(18))
        .bold();
    let heading2 = Style::new(HEADING2_STYLE, StyleType::Paragraph)
        .name("Heading 2")
        .fonts(fonts(family))
        .size(half_points(14));

    docx.add_style(heading1).add_style(heading2)
}

fn element_paragraph(element: &StyledElement, doc: &StyledDocument) -> Paragraph {
    match element {
        StyledElement::Heading { level, text, style } => {
            let mut run = Run::new()
                .add_text(text.as_str())
                .fonts(fonts(&doc.font.family))
                .size(half_points(style.size_pt));
            if style.bold {
                run = run.bold();
            }
            Paragraph::new()
                .style(heading_style_id(*level))
                .add_run(run)
                .line_spacing(
                    LineSpacing::new()
                        .before(twentieths(style.space_before_pt))
                        .after(twentieths(style.space_after_pt)),
                )
        }
        StyledElement::Paragraph { text, style, .. } => {
            let mut run = Run::new()
                .add_text(text.as_str())
                .fonts(fonts(&doc.font.family))
                .size(half_points(doc.font.size_pt));
            if style.bold {
                run = run.bold();
            }

            let line = match style.line_spacing {
                LineSpacingRule::Single => 240,
                LineSpacingRule::Relaxed => 360,
            };
            let paragraph = Paragraph::new().add_run(run).line_spacing(
                LineSpacing::new()
                    .before(0)
                    .after(twentieths(style.space_after_pt))
                    .line(line),
            );

            match style.indent {
                Indent::None => paragraph,
                Indent::Left(left) => paragraph.indent(Some(left), None, None, None),
                Indent::Hanging { left, hanging } => paragraph.indent(
                    Some(left),
                    Some(SpecialIndentType::Hanging(hanging)),
                    None,
                    None,
                ),
            }
        }
    }
}

/// Build the in-memory `Docx` for a styled document.
pub fn docx_build(doc: &StyledDocument) -> Docx {
    let margins = PageMargin::new()
        .top(doc.geometry.margin_top)
        .right(doc.geometry.margin_right)
        .bottom(doc.geometry.margin_bottom)
        .left(doc.geometry.margin_left);

    let mut docx = Docx::new()
        .page_margin(margins)
        .default_fonts(fonts(&doc.font.family))
        .default_size(half_points(doc.font.size_pt));
    docx = initialize_styles(docx, &doc.font.family);

    doc.elements.iter().fold(docx, |docx, element| {
        docx.add_paragraph(element_paragraph(element, doc))
    })
}

/// Pack a styled document into DOCX bytes.
///
/// # Errors
///
/// Returns `SynopsisError::DocxPack` if the archive cannot be written.
pub fn docx_bytes(doc: &StyledDocument) -> SynopsisResult<Vec<u8>> {
    let mut buffer = Vec::new();
    docx_build(doc)
        .build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| SynopsisError::DocxPack(e.to_string()))?;
    Ok(buffer)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write bytes to `path`, creating parent directories as needed.
///
/// The file handle is scoped to this function; it is flushed and synced before the rename and
/// dropped on every return path. A failed write removes the partial file.
///
/// # Errors
///
/// Returns `SynopsisError::DirCreation` if the parent directory cannot be created, or
/// `SynopsisError::FileWrite` if writing, syncing or renaming fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SynopsisResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(SynopsisError::DirCreation)?;
    }

    let partial = partial_path(path);
    let written = fs::File::create(&partial)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.flush()?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&partial, path));

    if let Err(e) = written {
        if partial.exists() {
            if let Err(cleanup) = fs::remove_file(&partial) {
                tracing::warn!(
                    "failed to remove partial file {}: {}",
                    partial.display(),
                    cleanup
                );
            }
        }
        return Err(SynopsisError::FileWrite(e));
    }

    Ok(())
}

/// Serialize a styled document to a `.docx` file.
///
/// # Errors
///
/// Returns `SynopsisError::DocxPack`, `SynopsisError::DirCreation` or
/// `SynopsisError::FileWrite`; nothing is retried.
pub fn serialize(doc: &StyledDocument, path: &Path) -> SynopsisResult<()> {
    let bytes = docx_bytes(doc)?;
    write_atomic(path, &bytes)?;
    tracing::debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
