//! Rich-document (.docx) extraction.
//!
//! The document is first decoded into a small HTML-like tree, then flattened
//! to plain text with one line per block element.

use crate::capability::MarkupConverter;
use crate::content::ExtractedContent;
use crate::error::{ConversionError, Result};
use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};
use tracing::debug;

/// A node of the decoded document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element {
        tag: String,
        children: Vec<MarkupNode>,
    },
    Text(String),
}

impl MarkupNode {
    pub fn element(tag: impl Into<String>, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element {
            tag: tag.into(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        MarkupNode::Text(text.into())
    }

    /// Tag name, or `None` for text nodes.
    pub fn tag(&self) -> Option<&str> {
        match self {
            MarkupNode::Element { tag, .. } => Some(tag),
            MarkupNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::Element { children, .. } => children,
            MarkupNode::Text(_) => &[],
        }
    }

    /// Concatenated inline text; `br` becomes a newline.
    pub fn inline_text(&self) -> String {
        let mut out = String::new();
        self.push_inline(&mut out);
        out
    }

    fn push_inline(&self, out: &mut String) {
        match self {
            MarkupNode::Text(t) => out.push_str(t),
            MarkupNode::Element { tag, children } => {
                if tag == "br" {
                    out.push('\n');
                    return;
                }
                for (i, child) in children.iter().enumerate() {
                    // Paragraphs nested in a table cell are joined by a space.
                    if tag == "td" && i > 0 {
                        out.push(' ');
                    }
                    child.push_inline(out);
                }
            }
        }
    }

    /// Flatten the tree to text lines, one per block element. Table rows
    /// become a single line of tab-separated cells.
    pub fn flatten(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.push_lines(&mut lines);
        lines
    }

    fn push_lines(&self, lines: &mut Vec<String>) {
        match self {
            MarkupNode::Text(t) => lines.extend(t.split('\n').map(str::to_string)),
            MarkupNode::Element { tag, children } => match tag.as_str() {
                "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" => {
                    lines.extend(self.inline_text().split('\n').map(str::to_string));
                }
                "tr" => {
                    let cells: Vec<String> = children
                        .iter()
                        .map(|cell| cell.inline_text().replace('\n', " "))
                        .collect();
                    lines.push(cells.join("\t"));
                }
                "br" => lines.push(String::new()),
                _ => {
                    for child in children {
                        child.push_lines(lines);
                    }
                }
            },
        }
    }
}

/// [`MarkupConverter`] backed by docx-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxMarkupConverter;

impl MarkupConverter for DocxMarkupConverter {
    fn convert(&self, bytes: &[u8]) -> Result<MarkupNode> {
        let docx = read_docx(bytes)
            .map_err(|e| ConversionError::input("document", format!("{:?}", e)))?;

        let mut body = Vec::new();
        for child in docx.document.children.iter() {
            match child {
                DocumentChild::Paragraph(para) => body.push(paragraph_node(para)),
                DocumentChild::Table(table) => body.push(table_node(table)),
                _ => {}
            }
        }

        debug!("Decoded document into {} block nodes", body.len());
        Ok(MarkupNode::element("body", body))
    }
}

fn paragraph_node(para: &Paragraph) -> MarkupNode {
    let tag = para
        .property
        .style
        .as_ref()
        .and_then(|style| heading_level(&style.val))
        .map(|level| format!("h{}", level))
        .unwrap_or_else(|| "p".to_string());

    let mut children = Vec::new();
    for child in &para.children {
        push_paragraph_child(child, &mut children);
    }
    MarkupNode::element(tag, children)
}

fn push_paragraph_child(child: &ParagraphChild, out: &mut Vec<MarkupNode>) {
    match child {
        ParagraphChild::Run(run) => push_run(run, out),
        ParagraphChild::Hyperlink(link) => {
            for inner in &link.children {
                push_paragraph_child(inner, out);
            }
        }
        _ => {}
    }
}

fn push_run(run: &Run, out: &mut Vec<MarkupNode>) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push(MarkupNode::text(t.text.clone())),
            RunChild::Tab(_) => out.push(MarkupNode::text("\t")),
            RunChild::Break(_) => out.push(MarkupNode::element("br", Vec::new())),
            _ => {}
        }
    }
}

fn table_node(table: &Table) -> MarkupNode {
    let mut rows = Vec::new();
    for table_child in &table.rows {
        let TableChild::TableRow(row) = table_child;
        let mut cells = Vec::new();
        for row_child in &row.cells {
            let TableRowChild::TableCell(cell) = row_child;
            let mut content = Vec::new();
            for item in &cell.children {
                match item {
                    TableCellContent::Paragraph(para) => content.push(paragraph_node(para)),
                    TableCellContent::Table(inner) => {
                        content.push(MarkupNode::text(
                            table_node(inner).flatten().join(" "),
                        ));
                    }
                    _ => {}
                }
            }
            cells.push(MarkupNode::element("td", content));
        }
        rows.push(MarkupNode::element("tr", cells));
    }
    MarkupNode::element("table", rows)
}

/// "Heading2" → 2, "Title" → 1; anything else is body text.
fn heading_level(style_id: &str) -> Option<u8> {
    if style_id.eq_ignore_ascii_case("title") {
        return Some(1);
    }
    let lower = style_id.to_ascii_lowercase();
    let rest = lower.strip_prefix("heading")?;
    let level = rest.trim().parse::<u8>().ok()?;
    Some(level.clamp(1, 6))
}

/// Decode a rich document and flatten it to plain text.
pub fn extract(converter: &dyn MarkupConverter, bytes: &[u8]) -> Result<ExtractedContent> {
    let tree = converter.convert(bytes)?;
    Ok(ExtractedContent::plain(tree.flatten().join("\n")))
}
