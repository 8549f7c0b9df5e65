mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod invoices;
mod matcher;
mod models;
mod reconciler;
mod reports;
mod settings;
mod vat;

use clap::{CommandFactory, Parser};

use cli::{
    Cli, ClientsCommands, Commands, CreditNotesCommands, InvoicesCommands, PaymentsCommands,
    QuotesCommands, ReconcileCommands, ReportCommands,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir, company } => cli::init::run(data_dir, company),
        Commands::Clients { command } => match command {
            ClientsCommands::Add {
                name,
                ice,
                if_number,
                rc,
                address,
                email,
                phone,
            } => cli::clients::add(
                &name,
                ice.as_deref(),
                if_number.as_deref(),
                rc.as_deref(),
                address.as_deref(),
                email.as_deref(),
                phone.as_deref(),
            ),
            ClientsCommands::List => cli::clients::list(),
        },
        Commands::Quotes { command } => match command {
            QuotesCommands::Create {
                client,
                amount,
                vat,
                date,
                valid_until,
            } => cli::quotes::create(&client, amount, vat, date, valid_until),
            QuotesCommands::List => cli::quotes::list(),
            QuotesCommands::Send { number } => cli::quotes::send(&number),
            QuotesCommands::Accept { number, date } => cli::quotes::accept(&number, date),
            QuotesCommands::Decline { number } => cli::quotes::decline(&number),
        },
        Commands::Invoices { command } => match command {
            InvoicesCommands::Create {
                client,
                amount,
                vat,
                date,
                due,
            } => cli::invoices::create(&client, amount, vat, date, due),
            InvoicesCommands::List { status } => cli::invoices::list(status),
            InvoicesCommands::Show { number } => cli::invoices::show(&number),
            InvoicesCommands::Send { number } => cli::invoices::send(&number),
            InvoicesCommands::Cancel { number } => cli::invoices::cancel(&number),
        },
        Commands::Payments { command } => match command {
            PaymentsCommands::Record {
                invoice,
                amount,
                method,
                date,
                reference,
                notes,
            } => cli::payments::record(&invoice, amount, &method, date, reference, notes),
            PaymentsCommands::List { invoice } => cli::payments::list(invoice),
        },
        Commands::CreditNotes { command } => match command {
            CreditNotesCommands::Create {
                invoice,
                amount,
                date,
                reason,
            } => cli::credit_notes::create(&invoice, amount, date, reason),
            CreditNotesCommands::List => cli::credit_notes::list(),
        },
        Commands::Import {
            file,
            account,
            format,
        } => cli::import::run(&file, &account, format.as_deref()),
        Commands::Reconcile { command } => match command {
            ReconcileCommands::List { status } => cli::reconcile::list(status.as_deref()),
            ReconcileCommands::Candidates { id } => cli::reconcile::candidates(id),
            ReconcileCommands::Confirm { id, invoices } => cli::reconcile::confirm(id, &invoices),
            ReconcileCommands::Ignore { id } => cli::reconcile::ignore(id),
            ReconcileCommands::Auto => cli::reconcile::auto(),
        },
        Commands::Report { command } => match command {
            ReportCommands::Vat { year, quarterly } => cli::report::vat(year, quarterly),
            ReportCommands::Aging => cli::report::aging(),
            ReportCommands::Revenue { year } => cli::report::revenue(year),
            ReportCommands::LateFees => cli::report::late_fees(),
        },
        Commands::Demo => cli::demo::run(),
        Commands::Status => cli::status::run(),
        Commands::Backup { output } => cli::backup::run(output),
        Commands::Load { path } => cli::load::run(&path),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
