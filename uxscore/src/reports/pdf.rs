//! PDF rendering of the evaluation report.
//!
//! Landscape A4, one table row per score (or a single "No scores" row for a
//! scoreless evaluation), alternating row fills by evaluation, and the score
//! column colored by value.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Rect, Rgb,
};

use crate::db::models::reports::ReportEvaluation;
use crate::errors::Error;

use super::format_average;

const PT_TO_MM: f32 = 0.352_778;

// Landscape A4 in points
const PAGE_WIDTH_PT: f32 = 842.0;
const PAGE_HEIGHT_PT: f32 = 595.0;

const TABLE_X_PT: f32 = 40.0;
const ROW_HEIGHT_PT: f32 = 25.0;
const PAGE_BREAK_MARGIN_PT: f32 = 80.0;

const HEADERS: [&str; 7] = ["Project", "Website", "Category", "Score", "Comment", "Notes", "Avg"];
const COLUMN_WIDTHS_PT: [f32; 7] = [120.0, 150.0, 150.0, 40.0, 120.0, 120.0, 50.0];

const BODY_FONT_SIZE: f32 = 8.0;
const HEADER_FONT_SIZE: f32 = 10.0;
const TITLE_FONT_SIZE: f32 = 14.0;

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn dark_blue() -> Color {
    rgb(0.0, 0.0, 0.55)
}

fn dark_gray() -> Color {
    rgb(0.66, 0.66, 0.66)
}

fn light_gray() -> Color {
    rgb(0.83, 0.83, 0.83)
}

fn score_color(score: i32) -> Color {
    if score >= 4 {
        rgb(0.0, 0.5, 0.0)
    } else if score >= 3 {
        rgb(1.0, 0.65, 0.0)
    } else {
        rgb(1.0, 0.0, 0.0)
    }
}

/// Truncate to `max` characters, ellipsized. Counts chars, not bytes, so
/// multi-byte text cannot split a code point.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

struct PdfReport {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    /// Cursor measured in points from the top of the page.
    y_pt: f32,
}

impl PdfReport {
    fn new() -> Result<Self, Error> {
        let (doc, page, layer) = PdfDocument::new(
            "Evaluation Report",
            Mm(PAGE_WIDTH_PT * PT_TO_MM),
            Mm(PAGE_HEIGHT_PT * PT_TO_MM),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(Self::pdf_error)?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(Self::pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            y_pt: 80.0,
        })
    }

    fn pdf_error(e: printpdf::Error) -> Error {
        Error::Internal {
            operation: format!("render pdf report: {e}"),
        }
    }

    fn x(pt: f32) -> Mm {
        Mm(pt * PT_TO_MM)
    }

    /// Convert a from-the-top y coordinate into the page's bottom-left space.
    fn y(pt_from_top: f32) -> Mm {
        Mm((PAGE_HEIGHT_PT - pt_from_top) * PT_TO_MM)
    }

    fn text(&self, text: &str, size: f32, x_pt: f32, baseline_from_top_pt: f32, font: &IndirectFontRef, color: Color) {
        self.layer.set_fill_color(color);
        self.layer
            .use_text(text, size, Self::x(x_pt), Self::y(baseline_from_top_pt), font);
    }

    /// Rough Helvetica centering; close enough for headings.
    fn text_centered(&self, text: &str, size: f32, baseline_from_top_pt: f32, font: &IndirectFontRef, color: Color) {
        let width_pt = text.chars().count() as f32 * size * 0.5;
        self.text(
            text,
            size,
            (PAGE_WIDTH_PT - width_pt) / 2.0,
            baseline_from_top_pt,
            font,
            color,
        );
    }

    fn cell(&self, x_pt: f32, width_pt: f32, fill: Color) {
        let rect = Rect::new(
            Self::x(x_pt),
            Self::y(self.y_pt + ROW_HEIGHT_PT),
            Self::x(x_pt + width_pt),
            Self::y(self.y_pt),
        )
        .with_mode(PaintMode::FillStroke)
        .with_winding(WindingOrder::NonZero);

        self.layer.set_fill_color(fill);
        self.layer.set_outline_color(dark_gray());
        self.layer.set_outline_thickness(0.5);
        self.layer.add_rect(rect);
    }

    fn header_row(&mut self) {
        let mut x = TABLE_X_PT;
        for (header, width) in HEADERS.iter().zip(COLUMN_WIDTHS_PT) {
            self.cell(x, width, light_gray());
            self.text(header, HEADER_FONT_SIZE, x + 5.0, self.y_pt + 16.0, &self.font_bold, dark_blue());
            x += width;
        }
        self.y_pt += ROW_HEIGHT_PT;
    }

    fn body_row(&mut self, values: &[String; 7], fill: Color, score: Option<i32>, text_color: Color) {
        self.break_page_if_needed();

        let mut x = TABLE_X_PT;
        for (i, (value, width)) in values.iter().zip(COLUMN_WIDTHS_PT).enumerate() {
            self.cell(x, width, fill.clone());
            let color = match (i, score) {
                (3, Some(score)) => score_color(score),
                _ => text_color.clone(),
            };
            self.text(value, BODY_FONT_SIZE, x + 5.0, self.y_pt + 16.0, &self.font, color);
            x += width;
        }
        self.y_pt += ROW_HEIGHT_PT;
    }

    fn break_page_if_needed(&mut self) {
        if self.y_pt <= PAGE_HEIGHT_PT - PAGE_BREAK_MARGIN_PT {
            return;
        }
        let (page, layer) = self.doc.add_page(
            Mm(PAGE_WIDTH_PT * PT_TO_MM),
            Mm(PAGE_HEIGHT_PT * PT_TO_MM),
            "Layer 1",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y_pt = 40.0;
        self.header_row();
    }

    fn footer(&self, total: usize) {
        self.text(
            &format!("Page 1 • Total Evaluations: {total} • Report generated by Website Evaluator"),
            BODY_FONT_SIZE,
            TABLE_X_PT,
            PAGE_HEIGHT_PT - 40.0,
            &self.font,
            rgb(0.5, 0.5, 0.5),
        );
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        self.doc.save_to_bytes().map_err(Self::pdf_error)
    }
}

pub fn render(rows: &[ReportEvaluation]) -> Result<Vec<u8>, Error> {
    let mut report = PdfReport::new()?;

    report.text_centered("Evaluation Report", TITLE_FONT_SIZE, 30.0, &report.font_bold, dark_blue());
    report.text_centered(
        &format!("Generated on {}", chrono::Utc::now().format("%d/%m/%Y")),
        BODY_FONT_SIZE,
        50.0,
        &report.font,
        dark_gray(),
    );

    if rows.is_empty() {
        report.text_centered(
            "No evaluations found",
            HEADER_FONT_SIZE,
            110.0,
            &report.font_bold,
            rgb(0.5, 0.5, 0.5),
        );
        return report.finish();
    }

    report.header_row();

    for (index, row) in rows.iter().enumerate() {
        let average = format_average(row.average_score());

        if row.scores.is_empty() {
            let fill = if index % 2 == 0 { rgb(1.0, 1.0, 1.0) } else { rgb(0.94, 0.97, 1.0) };
            report.body_row(
                &[
                    truncate(&row.project_name, 12),
                    truncate(&row.website_url, 18),
                    "No scores".to_string(),
                    String::new(),
                    String::new(),
                    truncate(&row.notes, 15),
                    average.clone(),
                ],
                fill,
                None,
                dark_gray(),
            );
            continue;
        }

        let fill = if index % 2 == 0 { rgb(1.0, 1.0, 1.0) } else { light_gray() };
        for score in &row.scores {
            report.body_row(
                &[
                    truncate(&row.project_name, 30),
                    truncate(&row.website_url, 30),
                    truncate(&score.category_name, 30),
                    score.score.to_string(),
                    truncate(&score.comment, 30),
                    truncate(&row.notes, 30),
                    average.clone(),
                ],
                fill.clone(),
                Some(score.score),
                rgb(0.0, 0.0, 0.0),
            );
        }
    }

    report.footer(rows.len());
    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::reports::ReportScore;
    use chrono::Utc;

    fn row(scores: Vec<i32>) -> ReportEvaluation {
        ReportEvaluation {
            evaluation_id: uuid::Uuid::new_v4(),
            project_id: uuid::Uuid::new_v4(),
            project_name: "Portal".to_string(),
            project_description: String::new(),
            project_websites: vec![],
            website_url: "https://a.example".to_string(),
            notes: "notes".to_string(),
            created_at: Utc::now(),
            created_by: "alice".to_string(),
            scores: scores
                .into_iter()
                .map(|v| ReportScore {
                    id: uuid::Uuid::new_v4(),
                    category_name: "Navigation and Flow".to_string(),
                    score: v,
                    comment: "ok".to_string(),
                    annotation: String::new(),
                    screenshot: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_renders_a_pdf() {
        let bytes = render(&[row(vec![4, 2]), row(vec![])]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_report_still_renders() {
        let bytes = render(&[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_many_rows_paginate() {
        let rows: Vec<_> = (0..60).map(|_| row(vec![3])).collect();
        let bytes = render(&rows).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 30), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        // 10 multi-byte chars survive a cut at 8
        let s = "éééééééééé";
        assert_eq!(truncate(s, 8), "ééééé...");
    }
}
