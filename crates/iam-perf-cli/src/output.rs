//! Output formatting utilities.

use colored::Colorize;
use iam_perf_provider::UserBatch;
use tabled::{settings::Style, Table, Tabled};

use crate::artifact::FixtureBundle;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Prompts for confirmation.
pub fn confirm(message: &str) -> crate::CliResult<bool> {
    print!("{message} [y/N]: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Prints the per-user failure table, if any.
pub fn print_user_failures(batch: &UserBatch) {
    if batch.failures.is_empty() {
        return;
    }

    let rows: Vec<FailureRow> = batch
        .failures
        .iter()
        .map(|f| FailureRow {
            index: f.index,
            username: f.username.clone(),
            error: f.error.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

/// Prints the fixture summary.
pub fn print_summary(bundle: &FixtureBundle) {
    let user_range = match (bundle.usernames.first(), bundle.usernames.last()) {
        (Some(first), Some(last)) if first != last => format!("{first} through {last}"),
        (Some(first), _) => first.clone(),
        _ => "none".to_string(),
    };

    let mut rows = vec![
        SummaryRow {
            key: "Provider",
            value: bundle.provider.display_name().to_string(),
        },
        SummaryRow {
            key: "Realm",
            value: bundle.realm.clone(),
        },
        SummaryRow {
            key: "Client ID",
            value: bundle.client_id.clone(),
        },
        SummaryRow {
            key: "Client Secret",
            value: bundle.client_secret.clone(),
        },
        SummaryRow {
            key: "Public Client ID",
            value: bundle.public_client_id.clone(),
        },
        SummaryRow {
            key: "Test users",
            value: user_range,
        },
        SummaryRow {
            key: "User password",
            value: bundle.test_password.clone(),
        },
    ];
    if !bundle.extra_clients.is_empty() {
        rows.push(SummaryRow {
            key: "Fixture clients",
            value: bundle.extra_clients.join(", "),
        });
    }

    println!("{}", Table::new(rows).with(Style::rounded()));
}
