//! Invoice document configuration and rendering.
//!
//! [`InvoiceRenderer`] turns an [`InvoiceSnapshot`] into PDF bytes.  The page
//! layout is planned up front with [`InvoiceLayout::plan`], then each planned
//! page is drawn by an [`InvoicePage`] element while the footer is pinned to the
//! bottom of every page through the document's page decorator.  Each page
//! element fills its whole page, so the document advances to the next page
//! after every element without explicit breaks.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use genpdf::{Margins, Size};
use log::{info, warn};

use crate::builder::{DocumentBuilder, FooterSpec};
use crate::elements::{load_logo, oversized_amount, FooterBand, InvoicePage};
use crate::error::InvoiceError;
use crate::layout::InvoiceLayout;
use crate::ledger::InvoiceSnapshot;

/// Conventional name of the generated file.
pub const DEFAULT_FILE_NAME: &str = "invoice.pdf";

/// Customer details printed in the customer band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerInfo {
    name: String,
    email: String,
    date: String,
}

impl Default for CustomerInfo {
    fn default() -> Self {
        Self {
            name: "Person_name".to_owned(),
            email: "example@email.com".to_owned(),
            date: "12/04/23".to_owned(),
        }
    }
}

impl CustomerInfo {
    /// Creates customer details from explicit values.
    pub fn new(name: impl Into<String>, email: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            date: date.into(),
        }
    }

    /// Returns the customer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the customer e-mail address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the invoice date as printed.
    pub fn date(&self) -> &str {
        &self.date
    }
}

/// Texts and assets of the invoice document.
#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceConfig {
    brand_name: String,
    tagline: String,
    title: String,
    subtitle: Option<String>,
    customer: CustomerInfo,
    footer_lines: Vec<String>,
    currency: String,
    file_name: String,
    logo_path: Option<PathBuf>,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            brand_name: "Levitation".to_owned(),
            tagline: "infotech".to_owned(),
            title: "INVOICE GENERATOR".to_owned(),
            subtitle: Some("Sample Output should be this".to_owned()),
            customer: CustomerInfo::default(),
            footer_lines: vec![
                "We are pleased to provide any further information you may require and look forward to assisting with".to_owned(),
                "your next order. Rest assured, it will receive our prompt and dedicated attention.".to_owned(),
            ],
            currency: "INR".to_owned(),
            file_name: DEFAULT_FILE_NAME.to_owned(),
            logo_path: None,
        }
    }
}

impl InvoiceConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brand_name(&self) -> &str {
        &self.brand_name
    }

    pub fn tagline(&self) -> &str {
        &self.tagline
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn footer_lines(&self) -> &[String] {
        &self.footer_lines
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn logo_path(&self) -> Option<&Path> {
        self.logo_path.as_deref()
    }

    /// Sets the brand name and tagline shown next to the brand mark.
    pub fn with_brand(mut self, name: impl Into<String>, tagline: impl Into<String>) -> Self {
        self.brand_name = name.into();
        self.tagline = tagline.into();
        self
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets or clears the line printed under the title.
    pub fn with_subtitle(mut self, subtitle: impl Into<Option<String>>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Sets the customer details.
    pub fn with_customer(mut self, customer: CustomerInfo) -> Self {
        self.customer = customer;
        self
    }

    /// Replaces the closing lines of the footer.
    pub fn with_footer_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.footer_lines = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the label printed in front of every amount.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Sets the suggested file name of the rendered document.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Uses an image file instead of the drawn brand mark.
    pub fn with_logo_path(mut self, path: impl Into<Option<PathBuf>>) -> Self {
        self.logo_path = path.into();
        self
    }
}

/// Everything an invoice page needs while it is drawn.
pub struct InvoiceSheet {
    config: InvoiceConfig,
    layout: InvoiceLayout,
    snapshot: InvoiceSnapshot,
    logo: Option<image::DynamicImage>,
}

impl InvoiceSheet {
    pub fn config(&self) -> &InvoiceConfig {
        &self.config
    }

    pub fn layout(&self) -> &InvoiceLayout {
        &self.layout
    }

    pub fn snapshot(&self) -> &InvoiceSnapshot {
        &self.snapshot
    }

    pub fn logo(&self) -> Option<&image::DynamicImage> {
        self.logo.as_ref()
    }
}

/// A generated invoice document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedInvoice {
    /// PDF bytes.
    pub bytes: Vec<u8>,
    /// Suggested file name, `invoice.pdf` unless configured otherwise.
    pub file_name: String,
    /// Number of pages in the document.
    pub page_count: usize,
}

impl RenderedInvoice {
    /// Writes the document to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), InvoiceError> {
        fs::write(path.as_ref(), &self.bytes)?;
        Ok(())
    }

    /// Writes the document under its file name inside `directory` and returns the path.
    pub fn save_in(&self, directory: impl AsRef<Path>) -> Result<PathBuf, InvoiceError> {
        let path = directory.as_ref().join(&self.file_name);
        self.write_to(&path)?;
        Ok(path)
    }
}

/// Produces invoice PDFs from ledger snapshots.
#[derive(Clone, Debug, Default)]
pub struct InvoiceRenderer {
    config: InvoiceConfig,
    layout: InvoiceLayout,
}

impl InvoiceRenderer {
    /// Creates a renderer with the given configuration and the default layout.
    pub fn new(config: InvoiceConfig) -> Self {
        Self {
            config,
            layout: InvoiceLayout::default(),
        }
    }

    /// Replaces the page geometry.
    pub fn with_layout(mut self, layout: InvoiceLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn config(&self) -> &InvoiceConfig {
        &self.config
    }

    pub fn layout(&self) -> &InvoiceLayout {
        &self.layout
    }

    /// Renders `snapshot` into a PDF document.
    ///
    /// Fails with [`InvoiceError::EmptyLedger`] before any font or image is
    /// loaded when the snapshot has no items.
    pub fn render(&self, snapshot: &InvoiceSnapshot) -> Result<RenderedInvoice, InvoiceError> {
        if snapshot.is_empty() {
            warn!("invoice: refusing to render an empty ledger");
            return Err(InvoiceError::EmptyLedger);
        }

        let plan = self.layout.plan(snapshot.items().len())?;
        let logo = match self.config.logo_path() {
            Some(path) => Some(load_logo(path).map_err(InvoiceError::Render)?),
            None => None,
        };

        let layout = &self.layout;
        let footer_config = self.config.clone();
        let (footer_gap, footer_height) = (layout.footer_gap_mm, layout.footer_height_mm);
        let rendered_pages = Rc::new(Cell::new(0));
        let footer_pages = Rc::clone(&rendered_pages);
        let mut document = DocumentBuilder::new()
            .with_title(self.config.title())
            .with_paper_size(Size::new(
                mm(layout.page_width_mm),
                mm(layout.page_height_mm),
            ))
            .with_margins(Margins::all(mm(layout.margin_mm)))
            .with_footer(FooterSpec::new(mm(layout.footer_reserved_mm()), move |page| {
                footer_pages.set(page);
                FooterBand::new(&footer_config, footer_gap, footer_height)
            }))
            .build()
            .map_err(InvoiceError::FontLoad)?;

        if let Some(amount) = oversized_amount(
            document.font_cache(),
            layout,
            self.config.currency(),
            snapshot.items(),
        ) {
            return Err(InvoiceError::layout(format!(
                "amount {} does not fit its table column",
                amount
            )));
        }

        let sheet = Rc::new(InvoiceSheet {
            config: self.config.clone(),
            layout: self.layout.clone(),
            snapshot: snapshot.clone(),
            logo,
        });
        for page in plan.pages() {
            document.push(InvoicePage::new(Rc::clone(&sheet), page.clone()));
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(InvoiceError::Render)?;
        let page_count = rendered_pages.get();
        if page_count != plan.page_count() {
            return Err(InvoiceError::layout(format!(
                "rendered {} page(s) but planned {}",
                page_count,
                plan.page_count()
            )));
        }
        info!(
            "invoice: rendered {} item(s) over {} page(s), {} bytes",
            snapshot.items().len(),
            page_count,
            bytes.len()
        );

        Ok(RenderedInvoice {
            bytes,
            file_name: self.config.file_name().to_owned(),
            page_count,
        })
    }
}

fn mm(value: f64) -> genpdf::Mm {
    genpdf::Mm::from(printpdf::Mm(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Ledger, SortOrder};

    #[test]
    fn empty_snapshot_is_refused() {
        let renderer = InvoiceRenderer::default();
        let snapshot = Ledger::new().snapshot(SortOrder::Ascending);
        assert!(matches!(
            renderer.render(&snapshot),
            Err(InvoiceError::EmptyLedger)
        ));
    }

    #[test]
    fn broken_layout_is_reported_before_fonts() {
        let renderer = InvoiceRenderer::default()
            .with_layout(InvoiceLayout::default().with_page_size_mm(210.0, 80.0));
        let mut ledger = Ledger::new();
        ledger.add_item("Widget", "1", "1").unwrap();
        assert!(matches!(
            renderer.render(&ledger.snapshot(SortOrder::Ascending)),
            Err(InvoiceError::Layout(_))
        ));
    }

    #[test]
    fn default_config_matches_sample_document() {
        let config = InvoiceConfig::default();
        assert_eq!(config.file_name(), DEFAULT_FILE_NAME);
        assert_eq!(config.customer().email(), "example@email.com");
        assert_eq!(config.footer_lines().len(), 2);
        assert!(config.logo_path().is_none());
    }

    #[test]
    fn builder_overrides_texts() {
        let config = InvoiceConfig::new()
            .with_brand("Acme", "tools")
            .with_subtitle(None)
            .with_currency("USD")
            .with_footer_lines(["Thanks!"])
            .with_customer(CustomerInfo::new("Ada", "ada@example.com", "01/02/24"));
        assert_eq!(config.brand_name(), "Acme");
        assert_eq!(config.subtitle(), None);
        assert_eq!(config.currency(), "USD");
        assert_eq!(config.footer_lines(), ["Thanks!".to_owned()]);
        assert_eq!(config.customer().name(), "Ada");
    }
}
