use crate::error::{FatouraError, Result};

#[derive(Debug, Clone)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub ice: Option<String>,
    pub if_number: Option<String>,
    pub rc: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Partial,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Partial => "partial",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "paid" => Ok(Self::Paid),
            "partial" => Ok(Self::Partial),
            "overdue" => Ok(Self::Overdue),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(FatouraError::Other(format!("unknown invoice status: {other}"))),
        }
    }

    /// Statuses with an open balance, eligible as match candidates.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Sent | Self::Overdue | Self::Partial)
    }
}

#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub client_id: i64,
    pub date: String,
    pub due_date: String,
    pub total_ht: f64,
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub total: f64,
    pub paid_amount: f64,
    pub status: InvoiceStatus,
}

impl Invoice {
    pub fn outstanding(&self) -> f64 {
        self.total - self.paid_amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "expired" => Ok(Self::Expired),
            other => Err(FatouraError::Other(format!("unknown quote status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    Unmatched,
    Matched,
    PartiallyMatched,
    Ignored,
}

impl TxnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
            Self::PartiallyMatched => "partially_matched",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "unmatched" => Ok(Self::Unmatched),
            "matched" => Ok(Self::Matched),
            "partially_matched" => Ok(Self::PartiallyMatched),
            "ignored" => Ok(Self::Ignored),
            other => Err(FatouraError::Other(format!("unknown transaction status: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BankTransaction {
    pub id: i64,
    pub account: String,
    pub date: String,
    pub description: String,
    pub amount: f64,
    pub reference: Option<String>,
    pub status: TxnStatus,
    pub match_confidence: Option<i64>,
}

/// Intermediate representation from a bank CSV parser before DB insert.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub date: String,
    pub description: String,
    pub reference: Option<String>,
    pub amount: f64,
}
