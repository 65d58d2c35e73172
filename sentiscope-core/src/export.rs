use printpdf::BuiltinFont;
use printpdf::IndirectFontRef;
use printpdf::Mm;
use printpdf::PdfDocument;
use printpdf::PdfLayerReference;

use crate::error::AnalysisError;
use crate::error::Result;
use crate::model::AnalysisResult;

/// The three client-side export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    /// Fixed output filename for this format.
    pub fn filename(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "sentiment_analysis_results.csv",
            ExportFormat::Json => "sentiment_analysis_results.json",
            ExportFormat::Pdf => "sentiment_analysis_results.pdf",
        }
    }
}

/// Render one result sequence into the requested format. Each serializer is
/// stateless and consumes the same sequence; there is no partial export.
pub fn render(results: &[AnalysisResult], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => Ok(to_csv(results).into_bytes()),
        ExportFormat::Json => Ok(to_json(results)?.into_bytes()),
        ExportFormat::Pdf => to_pdf(results),
    }
}

const COLUMN_HEADERS: [&str; 5] = ["Text", "Sentiment", "Confidence", "Keywords", "Explanation"];

/// CSV with a fixed column order. Free-text fields are always quoted with
/// embedded quotes doubled; confidence renders with two decimal places;
/// keywords join with "; ". Embedded newlines survive inside the quotes.
pub fn to_csv(results: &[AnalysisResult]) -> String {
    let mut rows = vec![COLUMN_HEADERS.join(",")];

    for result in results {
        let row = [
            escape_csv_field(&result.original_text),
            result.sentiment.to_string(),
            format!("{:.2}", result.confidence),
            escape_csv_field(&result.keywords.join("; ")),
            escape_csv_field(&result.explanation),
        ];
        rows.push(row.join(","));
    }

    rows.join("\n")
}

fn escape_csv_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Pretty-printed JSON of the result sequence, camelCase field order as in
/// the data model.
pub fn to_json(results: &[AnalysisResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}

// Landscape A4 layout for the PDF table.
const PAGE_WIDTH: f64 = 297.0;
const PAGE_HEIGHT: f64 = 210.0;
const MARGIN: f64 = 14.0;
const TITLE_SIZE: f64 = 14.0;
const BODY_SIZE: f64 = 8.0;
const LINE_HEIGHT: f64 = 3.5;
const ROW_GAP: f64 = 1.5;
const CELL_PAD: f64 = 1.0;

// Width hints per column; the two free-text columns carry fixed hints and
// explanation takes the remainder of the printable width.
const COLUMN_WIDTHS: [f64; 5] = [50.0, 25.0, 22.0, 40.0, 132.0];

/// Paginated table rendering of the result sequence: landscape pages, a
/// title on the first page, the header row repeated on every page.
pub fn to_pdf(results: &[AnalysisResult]) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        "Sentiment Analysis Results",
        Mm(PAGE_WIDTH as f32),
        Mm(PAGE_HEIGHT as f32),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| AnalysisError::Export(err.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| AnalysisError::Export(err.to_string()))?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.use_text(
        "Sentiment Analysis Results",
        TITLE_SIZE as f32,
        Mm(MARGIN as f32),
        Mm((PAGE_HEIGHT - 16.0) as f32),
        &bold,
    );

    let mut cursor = PAGE_HEIGHT - 20.0;
    draw_row(&layer, &wrap_cells(&COLUMN_HEADERS.map(String::from)), &bold, &mut cursor);

    for result in results {
        let cells = [
            result.original_text.clone(),
            result.sentiment.to_string(),
            format!("{:.2}", result.confidence),
            result.keywords.join(", "),
            result.explanation.clone(),
        ];
        let wrapped = wrap_cells(&cells);
        let height = row_height(&wrapped);

        if cursor - height < MARGIN {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            cursor = PAGE_HEIGHT - MARGIN;
            draw_row(
                &layer,
                &wrap_cells(&COLUMN_HEADERS.map(String::from)),
                &bold,
                &mut cursor,
            );
        }

        draw_row(&layer, &wrapped, &regular, &mut cursor);
    }

    doc.save_to_bytes()
        .map_err(|err| AnalysisError::Export(err.to_string()))
}

fn wrap_cells(cells: &[String; 5]) -> [Vec<String>; 5] {
    let mut wrapped: [Vec<String>; 5] = Default::default();
    for (slot, (cell, width)) in wrapped.iter_mut().zip(cells.iter().zip(COLUMN_WIDTHS)) {
        *slot = wrap_text(cell, max_chars_for(width));
    }
    wrapped
}

fn max_chars_for(width: f64) -> usize {
    // Average Helvetica glyph width at 8pt is roughly 1.6mm.
    (((width - 2.0 * CELL_PAD) / 1.6) as usize).max(1)
}

fn row_height(wrapped: &[Vec<String>; 5]) -> f64 {
    let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f64 * LINE_HEIGHT + ROW_GAP
}

fn draw_row(
    layer: &PdfLayerReference,
    wrapped: &[Vec<String>; 5],
    font: &IndirectFontRef,
    cursor: &mut f64,
) {
    let mut x = MARGIN;
    for (cell, width) in wrapped.iter().zip(COLUMN_WIDTHS) {
        for (index, line) in cell.iter().enumerate() {
            layer.use_text(
                line.clone(),
                BODY_SIZE as f32,
                Mm((x + CELL_PAD) as f32),
                Mm((*cursor - LINE_HEIGHT * (index + 1) as f64) as f32),
                font,
            );
        }
        x += width;
    }

    *cursor -= row_height(wrapped);
}

/// Greedy word wrap at a character limit; words longer than the limit are
/// hard-split so every cell fits its column.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(max_chars)
                .map(|(idx, _)| idx)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
