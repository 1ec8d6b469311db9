//! Page geometry of the invoice and the top-down band planner.
//!
//! All measurements are millimetres stored as `f64` so the plan can be computed
//! and tested without touching the rendering crate.  Vertical positions are
//! relative to the top of the page body, i.e. the area left after the page
//! margins and the reserved footer band are removed.

use std::ops::Range;

use log::debug;

use crate::error::InvoiceError;

const EPSILON_MM: f64 = 1e-6;

/// Geometry used by the invoice renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceLayout {
    /// Paper width.
    pub page_width_mm: f64,
    /// Paper height.
    pub page_height_mm: f64,
    /// Margin applied on all four sides.
    pub margin_mm: f64,
    /// Height of the brand and title band.
    pub header_height_mm: f64,
    /// Height of the customer information band.
    pub customer_height_mm: f64,
    /// Space between header, customer band and table.
    pub band_gap_mm: f64,
    /// Height of the table header row.
    pub table_header_height_mm: f64,
    /// Height of a table body row.
    pub row_height_mm: f64,
    /// Relative widths of the product, quantity, rate and amount columns.
    pub column_weights: [usize; 4],
    /// Space between the last table row and the totals band.
    pub totals_gap_mm: f64,
    /// Width of the totals band, anchored to the right edge.
    pub totals_width_mm: f64,
    /// Height of the totals band.
    pub totals_height_mm: f64,
    /// Height of the footer band.
    pub footer_height_mm: f64,
    /// Space kept free between the page body and the footer band.
    pub footer_gap_mm: f64,
}

impl Default for InvoiceLayout {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 15.0,
            header_height_mm: 25.0,
            customer_height_mm: 40.0,
            band_gap_mm: 10.0,
            table_header_height_mm: 10.0,
            row_height_mm: 8.0,
            column_weights: [60, 30, 40, 50],
            totals_gap_mm: 20.0,
            totals_width_mm: 75.0,
            totals_height_mm: 45.0,
            footer_height_mm: 25.0,
            footer_gap_mm: 5.0,
        }
    }
}

impl InvoiceLayout {
    /// Creates the default A4 layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the height of a table body row.
    pub fn with_row_height_mm(mut self, row_height_mm: f64) -> Self {
        self.row_height_mm = row_height_mm;
        self
    }

    /// Sets the space between the table and the totals band.
    pub fn with_totals_gap_mm(mut self, totals_gap_mm: f64) -> Self {
        self.totals_gap_mm = totals_gap_mm;
        self
    }

    /// Sets the page margin.
    pub fn with_margin_mm(mut self, margin_mm: f64) -> Self {
        self.margin_mm = margin_mm;
        self
    }

    /// Sets the paper size.
    pub fn with_page_size_mm(mut self, width_mm: f64, height_mm: f64) -> Self {
        self.page_width_mm = width_mm;
        self.page_height_mm = height_mm;
        self
    }

    /// Width available between the left and right margins.
    pub fn body_width_mm(&self) -> f64 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    /// Height reserved at the bottom of every page for the footer.
    pub fn footer_reserved_mm(&self) -> f64 {
        self.footer_gap_mm + self.footer_height_mm
    }

    /// Height available for bands above the footer.
    pub fn body_height_mm(&self) -> f64 {
        self.page_height_mm - 2.0 * self.margin_mm - self.footer_reserved_mm()
    }

    /// Splits the body width into the four table column widths.
    pub fn column_widths_mm(&self) -> [f64; 4] {
        let total: usize = self.column_weights.iter().sum();
        let width = self.body_width_mm();
        let mut widths = [0.0; 4];
        if total == 0 {
            return widths;
        }
        for (slot, weight) in widths.iter_mut().zip(self.column_weights) {
            *slot = width * weight as f64 / total as f64;
        }
        widths
    }

    fn validate(&self) -> Result<(), InvoiceError> {
        let measures = [
            ("margin", self.margin_mm),
            ("header height", self.header_height_mm),
            ("customer height", self.customer_height_mm),
            ("band gap", self.band_gap_mm),
            ("table header height", self.table_header_height_mm),
            ("totals gap", self.totals_gap_mm),
            ("totals width", self.totals_width_mm),
            ("totals height", self.totals_height_mm),
            ("footer height", self.footer_height_mm),
            ("footer gap", self.footer_gap_mm),
        ];
        if let Some((name, _)) = measures
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(InvoiceError::layout(format!(
                "{} must be a non-negative length",
                name
            )));
        }
        let positive = [
            ("page width", self.page_width_mm),
            ("page height", self.page_height_mm),
            ("row height", self.row_height_mm),
        ];
        if let Some((name, _)) = positive
            .iter()
            .find(|(_, value)| !value.is_finite() || *value <= 0.0)
        {
            return Err(InvoiceError::layout(format!("{} must be positive", name)));
        }
        if self.body_width_mm() <= 0.0 || self.body_height_mm() <= 0.0 {
            return Err(InvoiceError::layout(
                "margins and footer leave no room on the page",
            ));
        }
        if self.column_weights.iter().sum::<usize>() == 0 {
            return Err(InvoiceError::layout("column weights must not all be zero"));
        }
        if self.totals_width_mm > self.body_width_mm() + EPSILON_MM {
            return Err(InvoiceError::layout(
                "totals band is wider than the page body",
            ));
        }

        let body = self.body_height_mm();
        let first_page_top = self.header_height_mm + self.band_gap_mm + self.customer_height_mm;
        let checks = [
            ("header and customer bands", first_page_top),
            (
                "table header with one row",
                self.table_header_height_mm + self.row_height_mm,
            ),
            ("totals band", self.totals_height_mm),
        ];
        for (name, height) in checks {
            if height > body + EPSILON_MM {
                return Err(InvoiceError::layout(format!(
                    "{} ({:.1} mm) do not fit the page body ({:.1} mm)",
                    name, height, body
                )));
            }
        }
        Ok(())
    }

    /// Computes where every band goes for a table of `row_count` rows.
    ///
    /// The header and customer bands sit at fixed positions on the first page.
    /// The table follows the customer band and continues at the top of
    /// subsequent pages while rows remain.  The totals band starts one totals
    /// gap below the last row, or at the top of a new page when it would not
    /// fit there.
    pub fn plan(&self, row_count: usize) -> Result<LayoutPlan, InvoiceError> {
        self.validate()?;

        let body = self.body_height_mm();
        let mut pages = Vec::new();
        let mut page = PagePlan::default();

        page.header = Some(Band::new(0.0, self.header_height_mm));
        let mut cursor = self.header_height_mm + self.band_gap_mm;
        page.customer = Some(Band::new(cursor, self.customer_height_mm));
        cursor += self.customer_height_mm + self.band_gap_mm;

        let mut next_row = 0;
        loop {
            let remaining = row_count - next_row;
            let room = body - cursor - self.table_header_height_mm;
            let fitting = if room + EPSILON_MM < 0.0 {
                0
            } else {
                ((room + EPSILON_MM) / self.row_height_mm).floor() as usize
            };

            if fitting == 0 && remaining > 0 {
                if cursor <= EPSILON_MM {
                    return Err(InvoiceError::layout(
                        "a table row does not fit on an empty page",
                    ));
                }
                // Not even one row fits under the current bands.
                pages.push(std::mem::take(&mut page));
                cursor = 0.0;
                continue;
            }

            let take = fitting.min(remaining);
            let table = TablePlacement {
                top_mm: cursor,
                header_height_mm: self.table_header_height_mm,
                row_height_mm: self.row_height_mm,
                rows: next_row..next_row + take,
            };
            cursor = table.bottom_mm();
            next_row += take;
            page.table = Some(table);

            if next_row < row_count {
                pages.push(std::mem::take(&mut page));
                cursor = 0.0;
            } else {
                break;
            }
        }

        let totals_top = cursor + self.totals_gap_mm;
        if totals_top + self.totals_height_mm <= body + EPSILON_MM {
            page.totals = Some(Band::new(totals_top, self.totals_height_mm));
        } else {
            pages.push(std::mem::take(&mut page));
            page.totals = Some(Band::new(0.0, self.totals_height_mm));
        }
        pages.push(page);

        debug!(
            "layout: {} rows planned over {} page(s)",
            row_count,
            pages.len()
        );
        Ok(LayoutPlan { pages })
    }
}

/// Vertical extent of a band on a page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    /// Offset from the top of the page body.
    pub top_mm: f64,
    /// Height of the band.
    pub height_mm: f64,
}

impl Band {
    fn new(top_mm: f64, height_mm: f64) -> Self {
        Self { top_mm, height_mm }
    }

    /// Offset of the band's lower edge.
    pub fn bottom_mm(&self) -> f64 {
        self.top_mm + self.height_mm
    }
}

/// Portion of the item table drawn on one page.
#[derive(Clone, Debug, PartialEq)]
pub struct TablePlacement {
    /// Offset of the header row.
    pub top_mm: f64,
    /// Height of the header row.
    pub header_height_mm: f64,
    /// Height of every body row.
    pub row_height_mm: f64,
    /// Indices of the snapshot items drawn on this page.
    pub rows: Range<usize>,
}

impl TablePlacement {
    /// Offset of the lower edge of the last row on this page.
    pub fn bottom_mm(&self) -> f64 {
        self.top_mm + self.header_height_mm + self.rows.len() as f64 * self.row_height_mm
    }

    /// Offset of the upper edge of the body row at `position` within this page.
    pub fn row_top_mm(&self, position: usize) -> f64 {
        self.top_mm + self.header_height_mm + position as f64 * self.row_height_mm
    }
}

/// Bands drawn on a single page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PagePlan {
    /// Brand and title band, first page only.
    pub header: Option<Band>,
    /// Customer band, first page only.
    pub customer: Option<Band>,
    /// Table slice, if any rows land on this page.
    pub table: Option<TablePlacement>,
    /// Totals band, last page only.
    pub totals: Option<Band>,
}

/// Result of [`InvoiceLayout::plan`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    pages: Vec<PagePlan>,
}

impl LayoutPlan {
    /// Returns the planned pages in order.
    pub fn pages(&self) -> &[PagePlan] {
        &self.pages
    }

    /// Returns the number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the totals band together with the index of its page.
    pub fn totals(&self) -> Option<(usize, Band)> {
        self.pages
            .iter()
            .enumerate()
            .find_map(|(index, page)| page.totals.map(|band| (index, band)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_body_matches_a4() {
        let layout = InvoiceLayout::default();
        assert!(approx(layout.body_width_mm(), 180.0));
        assert!(approx(layout.body_height_mm(), 297.0 - 30.0 - 30.0));
        let widths = layout.column_widths_mm();
        assert!(approx(widths.iter().sum::<f64>(), 180.0));
        assert!(approx(widths[0], 60.0));
    }

    #[test]
    fn fixed_bands_on_first_page() {
        let plan = InvoiceLayout::default().plan(2).unwrap();
        let page = &plan.pages()[0];
        assert_eq!(page.header, Some(Band::new(0.0, 25.0)));
        assert_eq!(page.customer, Some(Band::new(35.0, 40.0)));
        assert!(approx(page.table.as_ref().unwrap().top_mm, 85.0));
    }

    #[test]
    fn totals_follow_table_end() {
        let layout = InvoiceLayout::default();
        for rows in [1, 2, 5, 9] {
            let plan = layout.plan(rows).unwrap();
            assert_eq!(plan.page_count(), 1);
            let page = &plan.pages()[0];
            let table = page.table.as_ref().unwrap();
            let totals = page.totals.unwrap();
            assert!(approx(totals.top_mm, table.bottom_mm() + layout.totals_gap_mm));
            assert!(approx(
                table.bottom_mm(),
                85.0 + 10.0 + rows as f64 * layout.row_height_mm
            ));
        }
    }

    #[test]
    fn totals_move_to_next_page_when_crowded() {
        let layout = InvoiceLayout::default();
        // 237 mm body: table starts at 85, header row 10, leaving 142 mm = 17 rows.
        let plan = layout.plan(17).unwrap();
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.pages()[0].table.as_ref().unwrap().rows, 0..17);
        assert_eq!(plan.totals(), Some((1, Band::new(0.0, 45.0))));
        assert!(plan.pages()[1].table.is_none());
    }

    #[test]
    fn long_tables_continue_at_page_top() {
        let layout = InvoiceLayout::default();
        let plan = layout.plan(30).unwrap();
        let slices: Vec<_> = plan
            .pages()
            .iter()
            .filter_map(|page| page.table.as_ref())
            .collect();

        assert_eq!(slices[0].rows, 0..17);
        assert!(approx(slices[1].top_mm, 0.0));
        assert_eq!(slices[1].rows, 17..30);

        let covered: Vec<usize> = slices.iter().flat_map(|slice| slice.rows.clone()).collect();
        assert_eq!(covered, (0..30).collect::<Vec<_>>());

        assert!(plan.pages()[1].header.is_none());
        let (page, totals) = plan.totals().unwrap();
        assert_eq!(page, 1);
        assert!(approx(totals.top_mm, slices[1].bottom_mm() + 20.0));
    }

    #[test]
    fn empty_table_still_places_totals() {
        let plan = InvoiceLayout::default().plan(0).unwrap();
        let page = &plan.pages()[0];
        let table = page.table.as_ref().unwrap();
        assert!(table.rows.is_empty());
        assert!(approx(page.totals.unwrap().top_mm, 85.0 + 10.0 + 20.0));
    }

    #[test]
    fn rejects_layouts_that_cannot_fit() {
        let tiny = InvoiceLayout::default().with_page_size_mm(210.0, 100.0);
        assert!(matches!(tiny.plan(1), Err(InvoiceError::Layout(_))));

        let no_rows = InvoiceLayout::default().with_row_height_mm(0.0);
        assert!(matches!(no_rows.plan(1), Err(InvoiceError::Layout(_))));
    }

    #[test]
    fn rejects_non_finite_or_empty_pages() {
        for (width, height) in [
            (210.0, f64::NAN),
            (f64::NAN, 297.0),
            (210.0, f64::INFINITY),
            (0.0, 297.0),
            (210.0, -1.0),
        ] {
            let layout = InvoiceLayout::default().with_page_size_mm(width, height);
            assert!(
                matches!(layout.plan(1), Err(InvoiceError::Layout(_))),
                "page {}x{} should be rejected",
                width,
                height
            );
        }

        let no_body = InvoiceLayout::default().with_margin_mm(150.0);
        assert!(matches!(no_body.plan(1), Err(InvoiceError::Layout(_))));
    }
}
