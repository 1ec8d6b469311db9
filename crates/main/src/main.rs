use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gst_invoice::money::{format_currency, gst_label};
use gst_invoice::{CustomerInfo, InvoiceConfig, InvoiceRenderer, Ledger, SortOrder};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Builds GST invoices from the command line.
///
/// Fonts are searched under `INVOICE_FONTS_DIR`, `assets/fonts` next to the
/// binary and the library's `assets/fonts`, then in common system locations.
#[derive(Parser)]
#[command(author, version, about = "Ledger totals and PDF invoices with 18% GST")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the item listing with subtotal, GST and total.
    Totals(ItemArgs),

    /// Render the invoice PDF.
    #[command(aliases = ["pdf", "invoice"])]
    Generate {
        #[command(flatten)]
        items: ItemArgs,

        /// Output path; defaults to `invoice.pdf` in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Customer name printed on the invoice.
        #[arg(long)]
        customer: Option<String>,

        /// Customer e-mail printed on the invoice.
        #[arg(long)]
        email: Option<String>,

        /// Invoice date as printed.
        #[arg(long)]
        date: Option<String>,

        /// Label printed in front of amounts.
        #[arg(long, default_value = "INR")]
        currency: String,

        /// Image used instead of the drawn brand mark.
        #[arg(long)]
        logo: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ItemArgs {
    /// Line item as NAME:PRICE:QUANTITY; repeat for more items.
    #[arg(short, long = "item", value_name = "NAME:PRICE:QTY", required = true)]
    items: Vec<String>,

    /// Listing order by product name.
    #[arg(short, long, value_enum, default_value_t = SortArg::Asc)]
    sort: SortArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Asc => SortOrder::Ascending,
            SortArg::Desc => SortOrder::Descending,
        }
    }
}

fn split_item(spec: &str) -> Result<(&str, &str, &str), String> {
    let mut parts = spec.rsplitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(quantity), Some(price), Some(name)) => Ok((name, price, quantity)),
        _ => Err(format!(
            "item '{}' must look like NAME:PRICE:QUANTITY",
            spec
        )),
    }
}

fn build_ledger(args: &ItemArgs) -> Result<Ledger, Box<dyn Error>> {
    let mut ledger = Ledger::new();
    for (index, spec) in args.items.iter().enumerate() {
        let (name, price, quantity) = split_item(spec)?;
        ledger
            .add_item(name, price, quantity)
            .map_err(|err| format!("item {} ('{}'): {}", index + 1, spec, err))?;
    }
    Ok(ledger)
}

fn print_totals(args: &ItemArgs, currency: &str) -> Result<(), Box<dyn Error>> {
    let ledger = build_ledger(args)?;
    for item in ledger.list_items(args.sort.into()) {
        println!(
            "{:<30} {:>6} x {:>16} = {:>16}",
            item.name(),
            item.quantity(),
            format_currency(currency, item.unit_price()),
            format_currency(currency, item.line_total())
        );
    }

    let totals = ledger.totals();
    println!("{:>56} {:>16}", "Sub-Total:", format_currency(currency, totals.subtotal));
    println!("{:>56} {:>16}", format!("{}:", gst_label()), format_currency(currency, totals.tax));
    println!("{:>56} {:>16}", "Total:", format_currency(currency, totals.total));
    Ok(())
}

fn generate(
    args: &ItemArgs,
    output: Option<PathBuf>,
    customer: CustomerInfo,
    currency: String,
    logo: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let ledger = build_ledger(args)?;
    let config = InvoiceConfig::new()
        .with_customer(customer)
        .with_currency(currency)
        .with_logo_path(logo);
    let invoice = InvoiceRenderer::new(config).render(&ledger.snapshot(args.sort.into()))?;

    let path = output.unwrap_or_else(|| PathBuf::from(&invoice.file_name));
    invoice.write_to(&path)?;
    info!(
        path = %path.display(),
        pages = invoice.page_count,
        bytes = invoice.bytes.len(),
        "invoice written"
    );
    println!("Generated {} ({} bytes)", path.display(), invoice.bytes.len());
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Totals(items) => print_totals(&items, "INR"),
        Commands::Generate {
            items,
            output,
            customer,
            email,
            date,
            currency,
            logo,
        } => {
            let defaults = CustomerInfo::default();
            let customer = CustomerInfo::new(
                customer.unwrap_or_else(|| defaults.name().to_owned()),
                email.unwrap_or_else(|| defaults.email().to_owned()),
                date.unwrap_or_else(|| defaults.date().to_owned()),
            );
            generate(&items, output, customer, currency, logo)
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
