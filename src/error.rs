//! Error types shared by the ledger, the renderer and the authenticator.

use std::fmt;
use std::io;

use thiserror::Error;

/// Product form field referenced by a [`ValidationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// Product name.
    Name,
    /// Unit price.
    Price,
    /// Quantity.
    Quantity,
}

impl Field {
    /// Returns the label shown next to the form input.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Product name",
            Field::Price => "Price",
            Field::Quantity => "Quantity",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rejection of a line item submitted to the ledger.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required input was blank.
    #[error("{0} is required")]
    EmptyField(Field),

    /// Price or quantity text could not be parsed.
    #[error("{0} must be a valid number")]
    NotANumber(Field),

    /// Price or quantity was below zero.
    #[error("{0} must not be negative")]
    Negative(Field),

    /// The value is too large to be totalled safely.
    #[error("{0} is out of range")]
    OutOfRange(Field),
}

impl ValidationError {
    /// Returns the field that failed validation.
    pub fn field(&self) -> Field {
        match *self {
            ValidationError::EmptyField(field)
            | ValidationError::NotANumber(field)
            | ValidationError::Negative(field)
            | ValidationError::OutOfRange(field) => field,
        }
    }
}

/// Failure to produce an invoice document.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Generation was requested for a ledger without items.
    #[error("cannot generate an invoice without line items")]
    EmptyLedger,

    /// The configured layout cannot hold the invoice bands.
    #[error("invalid invoice layout: {0}")]
    Layout(String),

    /// No usable font family was found.
    #[error("failed to load invoice fonts")]
    FontLoad(#[source] genpdf::error::Error),

    /// `genpdf` failed while laying out or writing the document.
    #[error("failed to render invoice")]
    Render(#[source] genpdf::error::Error),

    /// Writing the rendered document to disk failed.
    #[error("failed to write invoice")]
    Io(#[from] io::Error),
}

impl InvoiceError {
    pub(crate) fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }
}

/// Rejection of a login or signup request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// One or more required fields were blank.
    #[error("all fields are required")]
    MissingField(&'static str),

    /// The e-mail address lacks an `@`.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// The password is shorter than the allowed minimum.
    #[error("password must be at least {min_len} characters long")]
    WeakPassword {
        /// Minimum accepted length in characters.
        min_len: usize,
    },
}
