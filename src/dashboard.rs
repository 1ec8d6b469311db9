//! Per-session product dashboard.
//!
//! [`Dashboard`] owns everything a signed-in user manipulates: the product
//! form, the ledger and the sort toggle.  Outcomes are reported as [`Notice`]
//! values that a front-end shows as toasts.

use log::{debug, warn};

use crate::auth::{Authenticator, Credentials, Session, SignupRequest};
use crate::error::{AuthError, InvoiceError, ValidationError};
use crate::invoice::{InvoiceRenderer, RenderedInvoice};
use crate::ledger::{Ledger, LineItem, SortOrder, Totals};

/// Visual weight of a notice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoticeVariant {
    /// Informational.
    #[default]
    Default,
    /// Error shown in warning colours.
    Destructive,
}

/// A short user-facing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub variant: NoticeVariant,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    fn info(title: &str, description: Option<&str>) -> Self {
        Self {
            variant: NoticeVariant::Default,
            title: title.to_owned(),
            description: description.map(str::to_owned),
        }
    }

    fn destructive(title: &str, description: &str) -> Self {
        Self {
            variant: NoticeVariant::Destructive,
            title: title.to_owned(),
            description: Some(description.to_owned()),
        }
    }

    /// Returns whether the notice reports a failure.
    pub fn is_error(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}

impl From<&ValidationError> for Notice {
    fn from(err: &ValidationError) -> Self {
        match err {
            ValidationError::EmptyField(field) => {
                Notice::destructive("Missing field", &format!("{} is required.", field))
            }
            ValidationError::NotANumber(_) => Notice::destructive(
                "Invalid input",
                "Price and quantity must be valid numbers.",
            ),
            ValidationError::Negative(field) => {
                Notice::destructive("Invalid input", &format!("{} must not be negative.", field))
            }
            ValidationError::OutOfRange(field) => {
                Notice::destructive("Invalid input", &format!("{} is too large.", field))
            }
        }
    }
}

impl From<&InvoiceError> for Notice {
    fn from(err: &InvoiceError) -> Self {
        match err {
            InvoiceError::EmptyLedger => Notice::destructive(
                "No products",
                "Please add at least one product to generate an invoice.",
            ),
            other => Notice::destructive("Invoice failed", &other.to_string()),
        }
    }
}

impl From<&AuthError> for Notice {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::MissingField(_) => Notice::destructive(
                "All fields are required",
                "Please fill in all fields to continue.",
            ),
            AuthError::InvalidEmail(_) => Notice::destructive(
                "Invalid email",
                "Please enter a valid email address.",
            ),
            AuthError::WeakPassword { min_len } => Notice::destructive(
                "Password too short",
                &format!("Password must be at least {} characters long.", min_len),
            ),
        }
    }
}

/// Current contents of the product form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub quantity: String,
}

impl ProductForm {
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            quantity: quantity.into(),
        }
    }

    /// Clears all fields.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// State of one signed-in dashboard session.
#[derive(Debug)]
pub struct Dashboard {
    session: Session,
    form: ProductForm,
    ledger: Ledger,
    sort_order: SortOrder,
    renderer: InvoiceRenderer,
}

impl Dashboard {
    /// Opens an empty dashboard for `session`.
    pub fn new(session: Session, renderer: InvoiceRenderer) -> Self {
        Self {
            session,
            form: ProductForm::default(),
            ledger: Ledger::new(),
            sort_order: SortOrder::default(),
            renderer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ProductForm {
        &mut self.form
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Adds the form contents to the ledger.
    ///
    /// The form is cleared only when the item was accepted, so rejected input
    /// stays available for correction.
    pub fn submit_product(&mut self) -> Notice {
        let ProductForm {
            name,
            price,
            quantity,
        } = &self.form;
        match self.ledger.add_item(name, price, quantity) {
            Ok(item) => {
                debug!("dashboard: {} accepted item {}", self.session.id(), item.id());
                self.form.reset();
                Notice::info("Product added successfully!", None)
            }
            Err(err) => {
                debug!("dashboard: {} rejected product: {}", self.session.id(), err);
                Notice::from(&err)
            }
        }
    }

    /// Flips the listing order and returns the new order.
    pub fn toggle_sort(&mut self) -> SortOrder {
        self.sort_order = self.sort_order.toggled();
        self.sort_order
    }

    /// Items in the current display order.
    pub fn visible_items(&self) -> Vec<LineItem> {
        self.ledger.list_items(self.sort_order)
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    /// Renders the invoice for the current items in display order.
    pub fn generate_invoice(&self) -> Result<(RenderedInvoice, Notice), Notice> {
        match self.renderer.render(&self.ledger.snapshot(self.sort_order)) {
            Ok(invoice) => Ok((
                invoice,
                Notice::info(
                    "Invoice Generated",
                    Some("Your invoice has been downloaded successfully."),
                ),
            )),
            Err(err) => {
                warn!("dashboard: invoice generation failed: {}", err);
                Err(Notice::from(&err))
            }
        }
    }

    /// Signs in through `authenticator` and opens an empty dashboard.
    pub fn login(
        authenticator: &mut impl Authenticator,
        credentials: &Credentials,
        renderer: InvoiceRenderer,
    ) -> Result<(Self, Notice), Notice> {
        match authenticator.authenticate(credentials) {
            Ok(session) => Ok((
                Self::new(session, renderer),
                Notice::info(
                    "Login successful!",
                    Some("Welcome back to Levitation Infotech."),
                ),
            )),
            Err(err) => {
                debug!("dashboard: login rejected: {}", err);
                Err(Notice::from(&err))
            }
        }
    }

    /// Creates an account through `authenticator` and opens an empty dashboard.
    pub fn signup(
        authenticator: &mut impl Authenticator,
        request: &SignupRequest,
        renderer: InvoiceRenderer,
    ) -> Result<(Self, Notice), Notice> {
        match authenticator.register(request) {
            Ok(session) => Ok((
                Self::new(session, renderer),
                Notice::info(
                    "Account created successfully!",
                    Some("Welcome to Levitation Infotech."),
                ),
            )),
            Err(err) => {
                debug!("dashboard: signup rejected: {}", err);
                Err(Notice::from(&err))
            }
        }
    }

    /// Ends the session, discarding the ledger.
    pub fn logout(self) -> Session {
        debug!(
            "dashboard: {} logged out, dropping {} item(s)",
            self.session.id(),
            self.ledger.len()
        );
        self.session
    }
}
