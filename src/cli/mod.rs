pub mod backup;
pub mod clients;
pub mod credit_notes;
pub mod demo;
pub mod import;
pub mod init;
pub mod invoices;
pub mod load;
pub mod payments;
pub mod quotes;
pub mod reconcile;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fatoura", about = "Invoicing and bank-reconciliation CLI for Moroccan small businesses.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up fatoura: choose a data directory and initialize the database.
    Init {
        /// Path for fatoura data (default: ~/Documents/fatoura)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Company name stored in the database metadata
        #[arg(long)]
        company: Option<String>,
    },
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// Manage quotes (devis).
    Quotes {
        #[command(subcommand)]
        command: QuotesCommands,
    },
    /// Manage invoices.
    Invoices {
        #[command(subcommand)]
        command: InvoicesCommands,
    },
    /// Record and list payments.
    Payments {
        #[command(subcommand)]
        command: PaymentsCommands,
    },
    /// Manage credit notes (avoirs).
    CreditNotes {
        #[command(subcommand)]
        command: CreditNotesCommands,
    },
    /// Import a bank statement CSV.
    Import {
        /// Path to the CSV file
        file: String,
        /// Bank account label, e.g. 'Attijariwafa'
        #[arg(long)]
        account: String,
        /// Importer format key (bank_generic, bank_debit_credit)
        #[arg(long)]
        format: Option<String>,
    },
    /// Reconcile bank transactions against open invoices.
    Reconcile {
        #[command(subcommand)]
        command: ReconcileCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Load sample data (clients, invoices, bank transactions) to explore fatoura.
    Demo,
    /// Show current database and summary statistics.
    Status,
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/fatoura-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Switch to an existing fatoura data directory.
    Load {
        /// Path to data directory containing fatoura.db
        path: String,
    },
    /// Generate shell completions.
    Completions {
        /// Shell: bash, zsh, fish, ...
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Add a new client.
    Add {
        /// Client name, e.g. 'Maroc Telecom'
        name: String,
        /// Identifiant Commun de l'Entreprise (15 digits)
        #[arg(long)]
        ice: Option<String>,
        /// Identifiant Fiscal
        #[arg(long = "if")]
        if_number: Option<String>,
        /// Registre de Commerce
        #[arg(long)]
        rc: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List all clients.
    List,
}

#[derive(Subcommand)]
pub enum QuotesCommands {
    /// Create a quote.
    Create {
        /// Client name
        #[arg(long)]
        client: String,
        /// Amount excluding VAT (hors taxe)
        #[arg(long)]
        amount: f64,
        /// VAT rate: 0, 7, 10, 14 or 20
        #[arg(long, default_value = "20")]
        vat: f64,
        /// Quote date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Validity end date: YYYY-MM-DD (default: date + 30 days)
        #[arg(long = "valid-until")]
        valid_until: Option<String>,
    },
    /// List all quotes.
    List,
    /// Mark a quote as sent.
    Send {
        /// Quote number (shown in `fatoura quotes list`)
        number: String,
    },
    /// Accept a quote and create the matching draft invoice.
    Accept {
        number: String,
        /// Invoice date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Decline a quote.
    Decline {
        number: String,
    },
}

#[derive(Subcommand)]
pub enum InvoicesCommands {
    /// Create a draft invoice.
    Create {
        /// Client name
        #[arg(long)]
        client: String,
        /// Amount excluding VAT (hors taxe)
        #[arg(long)]
        amount: f64,
        /// VAT rate: 0, 7, 10, 14 or 20
        #[arg(long, default_value = "20")]
        vat: f64,
        /// Invoice date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Due date: YYYY-MM-DD (default: date + 30 days)
        #[arg(long)]
        due: Option<String>,
    },
    /// List invoices.
    List {
        /// Filter by status: draft, sent, paid, partial, overdue, cancelled
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one invoice with its settlements.
    Show {
        /// Invoice number, e.g. FAC-2025-0001
        number: String,
    },
    /// Mark a draft invoice as sent.
    Send {
        number: String,
    },
    /// Cancel an invoice (only without settlements).
    Cancel {
        number: String,
    },
}

#[derive(Subcommand)]
pub enum PaymentsCommands {
    /// Record a payment against an invoice.
    Record {
        /// Invoice number
        #[arg(long)]
        invoice: String,
        /// Amount received
        #[arg(long)]
        amount: f64,
        /// Method: bank, cheque, cash, other
        #[arg(long, default_value = "bank")]
        method: String,
        /// Payment date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List payments, optionally for one invoice.
    List {
        #[arg(long)]
        invoice: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CreditNotesCommands {
    /// Create a credit note against an invoice.
    Create {
        /// Invoice number
        #[arg(long)]
        invoice: String,
        /// Credit amount (capped at the invoice's outstanding balance)
        #[arg(long)]
        amount: f64,
        /// Credit note date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List all credit notes.
    List,
}

#[derive(Subcommand)]
pub enum ReconcileCommands {
    /// List bank transactions and their match status.
    List {
        /// Filter by status: unmatched, matched, partially_matched, ignored
        #[arg(long)]
        status: Option<String>,
    },
    /// Show ranked invoice candidates for one transaction.
    Candidates {
        /// Bank transaction id (shown in `fatoura reconcile list`)
        id: i64,
    },
    /// Confirm a match: settle the listed invoices from this transaction.
    Confirm {
        id: i64,
        /// Invoice numbers to settle, e.g. FAC-2025-0001
        invoices: Vec<String>,
    },
    /// Ignore a transaction (terminal).
    Ignore {
        id: i64,
    },
    /// Auto-match all unmatched credit transactions.
    Auto,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// VAT due under the encashment regime.
    Vat {
        /// Year: YYYY (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Aggregate by quarter instead of month
        #[arg(long)]
        quarterly: bool,
    },
    /// Receivables aging by client.
    Aging,
    /// Invoiced vs collected amounts per month.
    Revenue {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Law 69-21 late-payment penalties over the overdue set.
    LateFees,
}
