//! # PDF Serializer
//!
//! Takes a [`LayoutDocument`] and writes a PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The document only ever needs the
//! two standard Helvetica faces, straight lines, filled rectangles and
//! single-line text, so the subset of PDF we produce is small.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root and info objects
//! %%EOF
//! ```
//!
//! Layout coordinates are millimetres from the top-left corner. PDF user
//! space is points from the bottom-left, so every coordinate is scaled by
//! [`PT_PER_MM`] and `y` is flipped against the page height.

use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;
use tracing::debug;

use crate::font::{self, FontWeight, StandardFont};
use crate::layout::{
    Color, DrawInstruction, LayoutDocument, Page, Rule, TableBlock, TextAlign, TextRun, PT_PER_MM,
};

/// Stroke width of the table grid, in millimetres.
const GRID_WIDTH: f64 = 0.1;

/// Object ids are fixed for the catalog, page tree and the two fonts.
const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FIRST_FONT_ID: usize = 3;

const FONTS: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

#[derive(Debug, Default)]
pub struct PdfWriter;

struct PdfObject {
    data: Vec<u8>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a laid-out invoice to PDF bytes.
    pub fn write(&self, document: &LayoutDocument) -> Vec<u8> {
        // Index 0 is the free-list placeholder; PDF objects are 1-indexed.
        let mut objects: Vec<PdfObject> = (0..FIRST_FONT_ID)
            .map(|_| PdfObject { data: Vec::new() })
            .collect();

        for std_font in FONTS {
            objects.push(PdfObject {
                data: format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    std_font.pdf_name()
                )
                .into_bytes(),
            });
        }

        let font_resources = FONTS
            .iter()
            .enumerate()
            .map(|(i, _)| format!("/F{} {} 0 R", i + 1, FIRST_FONT_ID + i))
            .collect::<Vec<_>>()
            .join(" ");

        let mut page_obj_ids = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            let content = self.build_content_stream(page);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_obj_id = objects.len();
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data: content_data });

            let page_obj_id = objects.len();
            let page_dict = format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {} >> >> >>",
                PAGES_ID,
                page.width * PT_PER_MM,
                page.height * PT_PER_MM,
                content_obj_id,
                font_resources
            );
            objects.push(PdfObject {
                data: page_dict.into_bytes(),
            });
            page_obj_ids.push(page_obj_id);
        }

        objects[CATALOG_ID].data = format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID).into_bytes();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects[PAGES_ID].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = objects.len();
        objects.push(PdfObject {
            data: format!(
                "<< /Title ({}) /Producer (invoicer {}) >>",
                escape_pdf_string(&document.title),
                env!("CARGO_PKG_VERSION")
            )
            .into_bytes(),
        });

        let bytes = self.serialize(&objects, info_obj_id);
        debug!(
            pages = page_obj_ids.len(),
            bytes = bytes.len(),
            "pdf written"
        );
        bytes
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &Page) -> String {
        let mut stream = String::new();
        for instruction in &page.instructions {
            match instruction {
                DrawInstruction::Text(run) => write_text(&mut stream, run, page.height, Color::BLACK),
                DrawInstruction::Line(rule) => write_rule(&mut stream, rule, page.height),
                DrawInstruction::Table(table) => write_table(&mut stream, table, page.height),
            }
        }
        stream
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, objects: &[PdfObject], info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len(),
            CATALOG_ID,
            info_obj_id,
            xref_offset
        );

        output
    }
}

/// Resource name of the font for a weight: `/F1` regular, `/F2` bold.
fn font_resource(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Regular => "F1",
        FontWeight::Bold => "F2",
    }
}

fn pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

fn write_text(stream: &mut String, run: &TextRun, page_height: f64, color: Color) {
    if run.text.is_empty() {
        return;
    }
    let width = font::measure_string(&run.text, run.weight, run.font_size);
    let x = match run.align {
        TextAlign::Left => pt(run.x),
        TextAlign::Center => pt(run.x) - width / 2.0,
        TextAlign::Right => pt(run.x) - width,
    };
    let y = pt(page_height - run.y);
    let _ = write!(
        stream,
        "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
        color.r,
        color.g,
        color.b,
        font_resource(run.weight),
        run.font_size,
        x,
        y,
        escape_pdf_string(&run.text)
    );
}

fn write_line(stream: &mut String, x1: f64, y1: f64, x2: f64, y2: f64, width: f64, color: Color) {
    let _ = write!(
        stream,
        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
        color.r,
        color.g,
        color.b,
        pt(width),
        pt(x1),
        pt(y1),
        pt(x2),
        pt(y2)
    );
}

fn write_rule(stream: &mut String, rule: &Rule, page_height: f64) {
    write_line(
        stream,
        rule.x1,
        page_height - rule.y1,
        rule.x2,
        page_height - rule.y2,
        rule.width,
        rule.color,
    );
}

/// Header fill, grid, then cell text.
fn write_table(stream: &mut String, table: &TableBlock, page_height: f64) {
    let width = table.width();
    let bottom = page_height - (table.y + table.height());
    let top = page_height - table.y;

    let fill = table.header_fill;
    let _ = write!(
        stream,
        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
        fill.r,
        fill.g,
        fill.b,
        pt(table.x),
        pt(top - table.row_height),
        pt(width),
        pt(table.row_height)
    );

    // Horizontal grid lines: one above each row plus the bottom edge.
    for i in 0..=table.rows.len() + 1 {
        let y = top - table.row_height * i as f64;
        write_line(stream, table.x, y, table.x + width, y, GRID_WIDTH, table.grid_color);
    }
    let mut x = table.x;
    for w in std::iter::once(&0.0).chain(table.column_widths.iter()) {
        x += w;
        write_line(stream, x, top, x, bottom, GRID_WIDTH, table.grid_color);
    }

    // Baseline offset that roughly centres cap height in the row.
    let baseline = (table.row_height + table.font_size / PT_PER_MM * 0.7) / 2.0;
    let cell_runs = |cells: &[String], row_top: f64, weight: FontWeight| {
        let mut x = table.x;
        let mut runs = Vec::with_capacity(cells.len());
        for (cell, w) in cells.iter().zip(&table.column_widths) {
            runs.push(TextRun {
                x: x + table.cell_padding,
                y: row_top + baseline,
                text: cell.clone(),
                font_size: table.font_size,
                weight,
                align: TextAlign::Left,
            });
            x += w;
        }
        runs
    };

    for run in cell_runs(&table.header, table.y, FontWeight::Bold) {
        write_text(stream, &run, page_height, Color::WHITE);
    }
    for (i, row) in table.rows.iter().enumerate() {
        for run in cell_runs(row, table.row_top(i), FontWeight::Regular) {
            write_text(stream, &run, page_height, Color::BLACK);
        }
    }
}

/// Escape a string for a PDF literal. Text is WinAnsi encoded: bytes
/// outside ASCII are written as octal escapes, anything the encoding
/// cannot represent becomes `?`.
fn escape_pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(ch),
            _ => match win_ansi_byte(ch) {
                Some(b) => {
                    let _ = write!(out, "\\{:03o}", b);
                }
                None => out.push('?'),
            },
        }
    }
    out
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch {
        '\u{20AC}' => Some(0x80),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{00A0}'..='\u{00FF}' => Some(ch as u32 as u8),
        _ => None,
    }
}
