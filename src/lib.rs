//! Invoice ledger with GST totals and fixed-layout PDF rendering.
//!
//! A [`Ledger`] collects validated line items and computes subtotal, GST and
//! total.  An [`InvoiceRenderer`] turns a snapshot of the ledger into an A4 PDF
//! using `genpdf`.  [`Dashboard`] ties both to a signed-in [`auth::Session`].

pub mod auth;
pub mod builder;
pub mod dashboard;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod invoice;
pub mod layout;
pub mod ledger;
pub mod money;

pub use dashboard::{Dashboard, Notice, NoticeVariant, ProductForm};
pub use error::{AuthError, Field, InvoiceError, ValidationError};
pub use invoice::{CustomerInfo, InvoiceConfig, InvoiceRenderer, RenderedInvoice};
pub use layout::InvoiceLayout;
pub use ledger::{InvoiceSnapshot, ItemId, Ledger, LineItem, SortOrder, Totals};
