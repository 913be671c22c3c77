use std::fmt::Display;

use serde::Serialize;
use time::OffsetDateTime;

pub type AttachmentId = i64;

/// An uploaded file kept in the media storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub id: AttachmentId,
    /// The path of the file relative to the media root.
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_uploaded: OffsetDateTime,
}

impl Attachment {
    /// The name of the file without its directory.
    pub fn file_name(&self) -> &str {
        self.location
            .rsplit('/')
            .next()
            .unwrap_or(self.location.as_str())
    }
}

const MAX_DISPLAY_LENGTH: usize = 70;
const TRUNCATED_LENGTH: usize = 67;

impl Display for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file_name = self.file_name();

        if file_name.chars().count() > MAX_DISPLAY_LENGTH {
            let truncated: String = file_name.chars().take(TRUNCATED_LENGTH).collect();
            write!(f, "{truncated}...")
        } else {
            write!(f, "{file_name}")
        }
    }
}

/// The record that links an attachment to a statement or transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentMatch {
    pub id: i64,
    pub attachment: Attachment,
}

/// The row an attachment is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentOwner {
    Statement(i64),
    FinancialTransaction(i64),
}

impl AttachmentOwner {
    /// The join table and its owner column.
    pub(super) fn table(&self) -> (&'static str, &'static str) {
        match self {
            AttachmentOwner::Statement(_) => ("statement_attachment", "statement_id"),
            AttachmentOwner::FinancialTransaction(_) => {
                ("financial_transaction_attachment", "transaction_id")
            }
        }
    }

    pub(super) fn id(&self) -> i64 {
        match self {
            AttachmentOwner::Statement(id) | AttachmentOwner::FinancialTransaction(id) => *id,
        }
    }
}
