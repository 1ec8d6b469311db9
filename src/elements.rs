//! Custom `genpdf` elements that draw the invoice bands.
//!
//! Every page of an invoice is a single [`InvoicePage`] element that paints
//! the bands of one [`PagePlan`] at their planned offsets.  The footer is a
//! separate [`FooterBand`] rendered by the page decorator.  `genpdf` has no
//! filled shapes, so backgrounds are painted with overlapping strokes.

use std::path::Path;
use std::rc::Rc;

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error, ErrorKind};
use genpdf::fonts::FontCache;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

use crate::invoice::{InvoiceConfig, InvoiceSheet};
use crate::layout::{Band, InvoiceLayout, PagePlan, TablePlacement};
use crate::ledger::LineItem;
use crate::money::{format_currency, gst_label};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
// Lines are stroked at the PDF default width of 1pt.
const DEFAULT_STROKE_MM: f64 = MM_PER_INCH / 72.0;
const FILL_STEP_MM: f64 = 0.3;
const BODY_FONT_SIZE: u8 = 10;
const MIN_AMOUNT_FONT_SIZE: u8 = 6;
const CELL_PADDING_MM: f64 = 3.0;
const BRAND_MARK_MM: f64 = 15.0;
const ELLIPSIS: &str = "...";

const BLACK: Color = Color::Rgb(0, 0, 0);
const WHITE: Color = Color::Rgb(255, 255, 255);
const INK: Color = Color::Rgb(33, 37, 41);
const MUTED: Color = Color::Rgb(128, 128, 128);
const BAND_DARK: Color = Color::Rgb(28, 36, 54);
const TABLE_HEAD: Color = Color::Rgb(35, 41, 54);
const ACCENT: Color = Color::Rgb(203, 251, 69);
const RULE: Color = Color::Rgb(220, 220, 220);
const TOTALS_FILL: Color = Color::Rgb(245, 245, 245);
const TOTALS_LABEL: Color = Color::Rgb(100, 100, 100);
const TOTAL_AMOUNT: Color = Color::Rgb(0, 114, 229);

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn position(x: f64, y: f64) -> Position {
    Position::new(mm_from_f64(x), mm_from_f64(y))
}

fn line_style(color: Color) -> Style {
    Style::new().with_color(color)
}

/// Horizontal offset of text of `text_width` inside a box starting at `left`.
pub(crate) fn aligned_x(left: f64, box_width: f64, text_width: f64, alignment: Alignment) -> f64 {
    match alignment {
        Alignment::Left => left,
        Alignment::Center => left + (box_width - text_width) / 2.0,
        Alignment::Right => left + box_width - text_width,
    }
}

/// Shortens `text` with a trailing ellipsis until `measure` reports it fits `max_width`.
pub(crate) fn truncate_to_width(
    text: &str,
    max_width: f64,
    measure: impl Fn(&str) -> f64,
) -> String {
    if measure(text) <= max_width {
        return text.to_owned();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}{}", chars.iter().collect::<String>().trim_end(), ELLIPSIS);
        if measure(&candidate) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Paints a filled rectangle using overlapping horizontal strokes.
fn fill_rect(area: &render::Area<'_>, x: f64, y: f64, width: f64, height: f64, color: Color) {
    for offset in fill_offsets(height) {
        area.draw_line(
            vec![position(x, y + offset), position(x + width, y + offset)],
            line_style(color),
        );
    }
}

/// Vertical offsets of the strokes that cover a fill of `height`.
fn fill_offsets(height: f64) -> Vec<f64> {
    let mut offsets = Vec::new();
    let mut offset = DEFAULT_STROKE_MM / 2.0;
    while offset < height {
        offsets.push(offset);
        offset += FILL_STEP_MM;
    }
    if let Some(&last) = offsets.last() {
        let edge = height - DEFAULT_STROKE_MM / 2.0;
        if edge > last {
            offsets.push(edge);
        }
    }
    offsets
}

/// Largest font size between the body size and the amount minimum at which
/// `measure` reports the text fits `max_width`.
pub(crate) fn fitting_font_size(max_width: f64, measure: impl Fn(u8) -> f64) -> Option<u8> {
    (MIN_AMOUNT_FONT_SIZE..=BODY_FONT_SIZE)
        .rev()
        .find(|size| measure(*size) <= max_width)
}

/// Returns the first quantity or amount cell that cannot be printed in its
/// column even at the smallest amount font size.
pub(crate) fn oversized_amount(
    font_cache: &FontCache,
    layout: &InvoiceLayout,
    currency: &str,
    items: &[LineItem],
) -> Option<String> {
    let columns = layout.column_widths_mm();
    items.iter().find_map(|item| {
        let cells = row_cells(item, currency);
        cells
            .iter()
            .zip(columns)
            .skip(1)
            .find(|(cell, column)| {
                let inner = column - 2.0 * CELL_PADDING_MM;
                fitting_font_size(inner, |size| {
                    let style = Style::new().with_font_size(size);
                    mm_to_f64(StyledString::new(cell.to_string(), style).width(font_cache))
                })
                .is_none()
            })
            .map(|(cell, _)| cell.clone())
    })
}

fn rule(area: &render::Area<'_>, x: f64, y: f64, width: f64) {
    area.draw_line(
        vec![position(x, y), position(x + width, y)],
        line_style(RULE),
    );
}

/// Text drawing helpers bound to one render call.
struct Painter<'c, 'a, 'p> {
    context: &'c genpdf::Context,
    area: &'a render::Area<'p>,
    base: Style,
}

impl Painter<'_, '_, '_> {
    fn style(&self, size: u8, color: Color) -> Style {
        self.base.and(Style::new().with_font_size(size).with_color(color))
    }

    fn width(&self, text: &str, style: Style) -> f64 {
        mm_to_f64(StyledString::new(text.to_owned(), style).width(&self.context.font_cache))
    }

    fn line_height(&self, style: Style) -> f64 {
        mm_to_f64(style.line_height(&self.context.font_cache))
    }

    /// Prints `text` with its top-left corner at (`x`, `y`).
    fn text(&self, x: f64, y: f64, style: Style, text: &str) -> Result<(), Error> {
        if let Some(mut section) =
            self.area
                .text_section(&self.context.font_cache, position(x, y), style)
        {
            section.print_str(text, style)?;
        }
        Ok(())
    }

    /// Prints `text` aligned inside a box and vertically centred in it.
    #[allow(clippy::too_many_arguments)]
    fn text_in_box(
        &self,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        alignment: Alignment,
        style: Style,
        text: &str,
    ) -> Result<(), Error> {
        let x = aligned_x(left, width, self.width(text, style), alignment);
        let y = top + (height - self.line_height(style)) / 2.0;
        self.text(x, y, style, text)
    }
}

/// One page of an invoice, drawn from its precomputed plan.
pub struct InvoicePage {
    sheet: Rc<InvoiceSheet>,
    plan: PagePlan,
}

impl InvoicePage {
    /// Creates the element for `plan` using the shared invoice content.
    pub fn new(sheet: Rc<InvoiceSheet>, plan: PagePlan) -> Self {
        Self { sheet, plan }
    }

    fn draw_header(&self, painter: &Painter<'_, '_, '_>, band: Band) -> Result<(), Error> {
        let config = self.sheet.config();
        let width = self.sheet.layout().body_width_mm();
        let top = band.top_mm;

        match self.sheet.logo() {
            Some(logo) => draw_logo(painter, logo, top)?,
            None => fill_rect(painter.area, 0.0, top, BRAND_MARK_MM, BRAND_MARK_MM, BLACK),
        }

        let text_left = BRAND_MARK_MM + 5.0;
        painter.text(text_left, top + 1.0, painter.style(16, BLACK).bold(), config.brand_name())?;
        painter.text(text_left, top + 9.0, painter.style(12, MUTED), config.tagline())?;

        let title_style = painter.style(22, INK).bold();
        let title_width = painter.width(config.title(), title_style);
        let title_x = aligned_x(0.0, width, title_width, Alignment::Right);
        painter.text(title_x, top, title_style, config.title())?;

        if let Some(subtitle) = config.subtitle() {
            let style = painter.style(12, MUTED);
            let x = aligned_x(0.0, width, painter.width(subtitle, style), Alignment::Right);
            painter.text(x, top + 12.0, style, subtitle)?;
        }
        Ok(())
    }

    fn draw_customer(&self, painter: &Painter<'_, '_, '_>, band: Band) -> Result<(), Error> {
        let customer = self.sheet.config().customer();
        let width = self.sheet.layout().body_width_mm();
        let top = band.top_mm;
        fill_rect(painter.area, 0.0, top, width, band.height_mm, BAND_DARK);

        painter.text(10.0, top + 8.0, painter.style(12, WHITE), "Name")?;
        painter.text(10.0, top + 18.0, painter.style(14, ACCENT).bold(), customer.name())?;

        let email_style = painter.style(10, INK);
        let pill_width = (painter.width(customer.email(), email_style) + 6.0).max(45.0);
        let pill_left = width - 10.0 - pill_width;
        fill_rect(painter.area, pill_left, top + 9.0, pill_width, 8.0, WHITE);
        painter.text_in_box(
            pill_left,
            top + 9.0,
            pill_width,
            8.0,
            Alignment::Center,
            email_style,
            customer.email(),
        )?;

        let date = format!("Date: {}", customer.date());
        let date_style = painter.style(10, WHITE);
        let date_width = painter.width(&date, date_style);
        let date_x = aligned_x(pill_left, pill_width, date_width, Alignment::Right);
        painter.text(date_x, top + 22.0, date_style, &date)?;
        Ok(())
    }

    fn draw_table(
        &self,
        painter: &Painter<'_, '_, '_>,
        table: &TablePlacement,
    ) -> Result<(), Error> {
        let layout = self.sheet.layout();
        let width = layout.body_width_mm();
        let columns = layout.column_widths_mm();
        let alignments = [
            Alignment::Left,
            Alignment::Right,
            Alignment::Right,
            Alignment::Right,
        ];

        fill_rect(
            painter.area,
            0.0,
            table.top_mm,
            width,
            table.header_height_mm,
            TABLE_HEAD,
        );
        let head_style = painter.style(11, WHITE).bold();
        let headings = ["Product", "Qty", "Rate", "Total Amount"];
        let mut left = 0.0;
        for ((heading, column), alignment) in headings.iter().zip(columns).zip(alignments) {
            painter.text_in_box(
                left + CELL_PADDING_MM,
                table.top_mm,
                column - 2.0 * CELL_PADDING_MM,
                table.header_height_mm,
                alignment,
                head_style,
                heading,
            )?;
            left += column;
        }

        let body_style = painter.style(BODY_FONT_SIZE, INK);
        let currency = self.sheet.config().currency();
        let items = self.sheet.snapshot().items();
        for (position, index) in table.rows.clone().enumerate() {
            let Some(item) = items.get(index) else {
                break;
            };
            let top = table.row_top_mm(position);
            let cells = row_cells(item, currency);
            let mut left = 0.0;
            for (column_index, ((cell, column), alignment)) in
                cells.iter().zip(columns).zip(alignments).enumerate()
            {
                let inner = column - 2.0 * CELL_PADDING_MM;
                let (text, style) = if column_index == 0 {
                    let text = truncate_to_width(cell, inner, |s| painter.width(s, body_style));
                    (text, body_style)
                } else {
                    // Amounts shrink instead of losing digits.
                    let size = fitting_font_size(inner, |size| {
                        painter.width(cell, painter.style(size, INK))
                    })
                    .ok_or_else(|| {
                        Error::new(
                            format!("Amount {} does not fit its table column", cell),
                            ErrorKind::InvalidData,
                        )
                    })?;
                    (cell.clone(), painter.style(size, INK))
                };
                painter.text_in_box(
                    left + CELL_PADDING_MM,
                    top,
                    inner,
                    table.row_height_mm,
                    alignment,
                    style,
                    &text,
                )?;
                left += column;
            }
            rule(painter.area, 0.0, top + table.row_height_mm, width);
        }
        Ok(())
    }

    fn draw_totals(&self, painter: &Painter<'_, '_, '_>, band: Band) -> Result<(), Error> {
        let layout = self.sheet.layout();
        let currency = self.sheet.config().currency();
        let totals = self.sheet.snapshot().totals();
        let band_width = layout.totals_width_mm;
        let left = layout.body_width_mm() - band_width;
        fill_rect(
            painter.area,
            left,
            band.top_mm,
            band_width,
            band.height_mm,
            TOTALS_FILL,
        );

        let label_style = painter.style(11, TOTALS_LABEL);
        let rows = [
            ("Total Charges".to_owned(), totals.subtotal, label_style, label_style),
            (gst_label(), totals.tax, label_style, label_style),
            (
                "Total Amount".to_owned(),
                totals.total,
                painter.style(13, INK).bold(),
                painter.style(13, TOTAL_AMOUNT).bold(),
            ),
        ];

        let inner_left = left + 8.0;
        let inner_width = band_width - 16.0;
        let row_height = band.height_mm / rows.len() as f64;
        for (index, (label, amount, label_style, amount_style)) in rows.iter().enumerate() {
            let top = band.top_mm + index as f64 * row_height;
            painter.text_in_box(
                inner_left,
                top,
                inner_width,
                row_height,
                Alignment::Left,
                *label_style,
                label,
            )?;
            painter.text_in_box(
                inner_left,
                top,
                inner_width,
                row_height,
                Alignment::Right,
                *amount_style,
                &format_currency(currency, *amount),
            )?;
        }
        Ok(())
    }
}

fn row_cells(item: &LineItem, currency: &str) -> [String; 4] {
    [
        item.name().to_owned(),
        item.quantity().to_string(),
        format_currency(currency, item.unit_price()),
        format_currency(currency, item.line_total()),
    ]
}

fn draw_logo(
    painter: &Painter<'_, '_, '_>,
    logo: &image::DynamicImage,
    top: f64,
) -> Result<(), Error> {
    let (px_width, px_height) = logo.dimensions();
    let natural_width = MM_PER_INCH * px_width as f64 / DEFAULT_IMAGE_DPI;
    let natural_height = MM_PER_INCH * px_height as f64 / DEFAULT_IMAGE_DPI;
    let longest = natural_width.max(natural_height);
    if longest <= f64::EPSILON {
        return Ok(());
    }

    let scale = BRAND_MARK_MM / longest;
    let mut image = Image::from_dynamic_image(logo.clone())?;
    image.set_scale(Scale::new(scale, scale));

    let mut area = painter.area.clone();
    area.add_offset(position(0.0, top));
    area.set_width(mm_from_f64(BRAND_MARK_MM));
    image.render(painter.context, area, painter.base)?;
    Ok(())
}

/// Loads a logo image and strips any alpha channel, which PDF images cannot carry here.
pub fn load_logo(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open logo file {}", path.display()))?;
    let decoded = reader
        .with_guessed_format()
        .context("Unable to determine logo image format")?
        .decode()
        .with_context(|| format!("Failed to decode logo file {}", path.display()))?;
    Ok(image::DynamicImage::ImageRgb8(decoded.to_rgb8()))
}

impl Element for InvoicePage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let painter = Painter {
            context,
            area: &area,
            base: style,
        };

        if let Some(band) = self.plan.header {
            self.draw_header(&painter, band)?;
        }
        if let Some(band) = self.plan.customer {
            self.draw_customer(&painter, band)?;
        }
        if let Some(table) = &self.plan.table {
            self.draw_table(&painter, table)?;
        }
        if let Some(band) = self.plan.totals {
            self.draw_totals(&painter, band)?;
        }

        let mut result = RenderResult::default();
        result.size = area.size();
        Ok(result)
    }
}

/// Closing text drawn at the bottom of every page.
pub struct FooterBand {
    lines: Vec<String>,
    gap_mm: f64,
    height_mm: f64,
}

impl FooterBand {
    /// Creates a footer using the configured closing lines.
    pub fn new(config: &InvoiceConfig, gap_mm: f64, height_mm: f64) -> Self {
        Self {
            lines: config.footer_lines().to_vec(),
            gap_mm,
            height_mm,
        }
    }
}

impl Element for FooterBand {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let width = mm_to_f64(area.size().width);
        fill_rect(&area, 0.0, self.gap_mm, width, self.height_mm, BAND_DARK);

        let painter = Painter {
            context,
            area: &area,
            base: style,
        };
        let text_style = painter.style(9, WHITE);
        let line_height = painter.line_height(text_style);
        let block_height = line_height * self.lines.len() as f64;
        let mut top = self.gap_mm + (self.height_mm - block_height) / 2.0;
        for line in &self.lines {
            painter.text_in_box(
                0.0,
                top,
                width,
                line_height,
                Alignment::Center,
                text_style,
                line,
            )?;
            top += line_height;
        }

        let mut result = RenderResult::default();
        result.size = Size::new(area.size().width, mm_from_f64(self.gap_mm + self.height_mm));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_inside_box() {
        assert_eq!(aligned_x(10.0, 100.0, 20.0, Alignment::Left), 10.0);
        assert_eq!(aligned_x(10.0, 100.0, 20.0, Alignment::Center), 50.0);
        assert_eq!(aligned_x(10.0, 100.0, 20.0, Alignment::Right), 90.0);
    }

    #[test]
    fn keeps_text_that_fits() {
        let measure = |s: &str| s.chars().count() as f64;
        assert_eq!(truncate_to_width("Widget", 6.0, measure), "Widget");
    }

    #[test]
    fn truncates_with_ellipsis() {
        let measure = |s: &str| s.chars().count() as f64;
        assert_eq!(truncate_to_width("Deluxe widget", 10.0, measure), "Deluxe...");
        assert_eq!(truncate_to_width("Widget", 2.0, measure), "");
    }

    #[test]
    fn fill_strokes_overlap_and_reach_both_edges() {
        let offsets = fill_offsets(40.0);
        assert!(offsets[0] - DEFAULT_STROKE_MM / 2.0 <= 0.0);
        let last = *offsets.last().unwrap();
        assert!(last + DEFAULT_STROKE_MM / 2.0 >= 40.0 - 1e-9);
        for pair in offsets.windows(2) {
            assert!(pair[1] - pair[0] <= DEFAULT_STROKE_MM);
        }
        assert!(fill_offsets(0.0).is_empty());
    }

    #[test]
    fn amounts_shrink_before_failing() {
        let measure = |text: &str, size: u8| text.chars().count() as f64 * size as f64 / 10.0;
        assert_eq!(fitting_font_size(10.0, |size| measure("INR 100.00", size)), Some(10));
        assert_eq!(fitting_font_size(8.0, |size| measure("INR 100.00", size)), Some(8));
        assert_eq!(fitting_font_size(5.0, |size| measure("INR 100.00", size)), None);
    }

    #[test]
    fn row_cells_format_amounts() {
        let mut ledger = crate::ledger::Ledger::new();
        let item = ledger.add_item("Widget", "10", "3").unwrap();
        assert_eq!(
            row_cells(&item, "INR"),
            [
                "Widget".to_owned(),
                "3".to_owned(),
                "INR 10.00".to_owned(),
                "INR 30.00".to_owned()
            ]
        );
    }
}
