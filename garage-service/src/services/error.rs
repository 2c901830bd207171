use service_core::error::AppError;
use std::borrow::Cow;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

/// Failures of the document operations.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invoice number '{0}' is already in use")]
    DuplicateInvoiceNumber(String),

    #[error("Document {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Validation(e) => AppError::ValidationError(e),
            DocumentError::DuplicateInvoiceNumber(invoice_no) => {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "invoice_no",
                    ValidationError::new("unique").with_message(Cow::Owned(format!(
                        "invoice number '{}' is already in use",
                        invoice_no
                    ))),
                );
                AppError::ValidationError(errors)
            }
            DocumentError::NotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Document {} not found", id))
            }
            DocumentError::Storage(e) => e,
        }
    }
}

impl DocumentError {
    /// Label for the errors metric.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::Validation(_) => "validation_error",
            DocumentError::DuplicateInvoiceNumber(_) => "duplicate_invoice_no",
            DocumentError::NotFound(_) => "not_found",
            DocumentError::Storage(_) => "db_error",
        }
    }
}
