use gst_invoice::fonts;
use gst_invoice::{
    InvoiceConfig, InvoiceError, InvoiceLayout, InvoiceRenderer, Ledger, SortOrder,
};
use sha2::{Digest, Sha256};

fn sample_ledger(rows: usize) -> Ledger {
    let mut ledger = Ledger::new();
    ledger.add_item("Widget", "10.00", "3").unwrap();
    ledger.add_item("Gadget", "5.50", "2").unwrap();
    for index in 2..rows {
        ledger
            .add_item(&format!("Spare part {index:03}"), "1.25", "4")
            .unwrap();
    }
    ledger
}

fn render(rows: usize) -> Option<gst_invoice::RenderedInvoice> {
    if !fonts::fonts_available() {
        return None;
    }

    let invoice = InvoiceRenderer::new(InvoiceConfig::default())
        .render(&sample_ledger(rows).snapshot(SortOrder::Ascending))
        .expect("render sample invoice");
    Some(invoice)
}

/// Zeroes the timestamps and random identifiers printpdf writes into every document.
fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    const VOLATILE: [(&[u8], &[u8]); 8] = [
        (b"/CreationDate(", b")"),
        (b"/ModDate(", b")"),
        (b"/ID[", b"]"),
        (b"<xmp:CreateDate>", b"<"),
        (b"<xmp:ModifyDate>", b"<"),
        (b"<xmp:MetadataDate>", b"<"),
        (b"<xmpMM:DocumentID>", b"<"),
        (b"<xmpMM:InstanceID>", b"<"),
    ];

    let mut data = bytes.to_vec();
    for (start, end) in VOLATILE {
        let mut offset = 0;
        while let Some(found) = find(&data[offset..], start) {
            let from = offset + found + start.len();
            let Some(length) = find(&data[from..], end) else {
                break;
            };
            data[from..from + length].fill(b'0');
            offset = from + length;
        }
    }
    data
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Counts `/Type /Page` dictionaries, leaving out the `/Pages` tree node.
fn page_objects(bytes: &[u8]) -> usize {
    let mut count = 0;
    let mut offset = 0;
    while let Some(found) = find(&bytes[offset..], b"/Type") {
        let mut cursor = offset + found + b"/Type".len();
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        let rest = &bytes[cursor..];
        if rest.starts_with(b"/Page")
            && !rest
                .get(b"/Page".len())
                .map_or(false, |byte| byte.is_ascii_alphanumeric())
        {
            count += 1;
        }
        offset = cursor;
    }
    count
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(scrub_pdf(bytes)).into()
}

const SKIP_NOTE: &str =
    "bundled and system fonts missing. Set INVOICE_FONTS_DIR or copy assets/fonts next to the binary.";

#[test]
fn empty_ledger_produces_no_document() {
    let result = InvoiceRenderer::default().render(&Ledger::new().snapshot(SortOrder::Ascending));
    assert!(matches!(result, Err(InvoiceError::EmptyLedger)));
}

#[test]
fn renders_pdf_named_invoice() {
    let Some(invoice) = render(2) else {
        eprintln!("Skipping renders_pdf_named_invoice: {SKIP_NOTE}");
        return;
    };
    assert!(invoice.bytes.starts_with(b"%PDF"), "output should be a PDF stream");
    assert_eq!(invoice.file_name, "invoice.pdf");
    assert_eq!(invoice.page_count, 1);
}

#[test]
fn page_objects_match_the_plan() {
    let layout = InvoiceLayout::default();
    // 16 rows fill page one and push the totals band to page two; 30 rows
    // continue the table on page two; 60 rows need a third page.
    for rows in [1, 16, 17, 30, 60] {
        let Some(invoice) = render(rows) else {
            eprintln!("Skipping page_objects_match_the_plan: {SKIP_NOTE}");
            return;
        };
        let planned = layout.plan(rows).unwrap().page_count();
        assert_eq!(invoice.page_count, planned, "{rows} rows");
        assert_eq!(page_objects(&invoice.bytes), planned, "{rows} rows");
    }
}

#[test]
fn totals_band_on_its_own_page() {
    let Some(invoice) = render(16) else {
        eprintln!("Skipping totals_band_on_its_own_page: {SKIP_NOTE}");
        return;
    };
    let plan = InvoiceLayout::default().plan(16).unwrap();
    assert_eq!(plan.totals().map(|(page, _)| page), Some(1));
    assert_eq!(page_objects(&invoice.bytes), 2);
}

#[test]
fn largest_amounts_shrink_to_fit() {
    if !fonts::fonts_available() {
        eprintln!("Skipping largest_amounts_shrink_to_fit: {SKIP_NOTE}");
        return;
    }
    let mut ledger = Ledger::new();
    ledger
        .add_item("Bulk order", "999999999999.99", &u32::MAX.to_string())
        .unwrap();
    let invoice = InvoiceRenderer::default()
        .render(&ledger.snapshot(SortOrder::Ascending))
        .expect("amounts fit at a smaller font size");
    assert_eq!(page_objects(&invoice.bytes), 1);
}

#[test]
fn amounts_wider_than_their_column_are_refused() {
    if !fonts::fonts_available() {
        eprintln!("Skipping amounts_wider_than_their_column_are_refused: {SKIP_NOTE}");
        return;
    }
    let mut layout = InvoiceLayout::default();
    layout.column_weights = [170, 4, 3, 3];
    let result = InvoiceRenderer::default()
        .with_layout(layout)
        .render(&sample_ledger(2).snapshot(SortOrder::Ascending));
    assert!(matches!(result, Err(InvoiceError::Layout(_))));
}

#[test]
fn rendering_is_deterministic() {
    let (Some(first), Some(second)) = (render(5), render(5)) else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_NOTE}");
        return;
    };

    assert_eq!(first.bytes.len(), second.bytes.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&first.bytes),
        normalized_hash(&second.bytes),
        "invoice renders must be deterministic after metadata normalization"
    );
}

#[test]
fn saves_under_configured_name() {
    let Some(invoice) = render(1) else {
        eprintln!("Skipping saves_under_configured_name: {SKIP_NOTE}");
        return;
    };
    let directory = std::env::temp_dir().join(format!("gst_invoice_test_{}", std::process::id()));
    std::fs::create_dir_all(&directory).unwrap();
    let path = invoice.save_in(&directory).unwrap();
    assert_eq!(path.file_name().unwrap(), "invoice.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), invoice.bytes);
    std::fs::remove_dir_all(&directory).unwrap();
}
