//! Plain-text rendering of snapshots and customers

use rust_decimal::Decimal;
use std::fmt::Write;

use crate::types::{Account, Address, Atm, Branch, Customer, SnapshotSummary, UserSnapshot};

/// Amount with two decimals and its currency, e.g. `-318.42 USD`
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {}", amount.round_dp(2), currency)
}

fn account_line(account: &Account) -> String {
    format!(
        "{:<24} {:<12} {:>16}  ({})",
        account.nickname,
        account.account_type.label(),
        format_amount(account.balance, &account.currency),
        account.id
    )
}

pub fn render_snapshot(snapshot: &UserSnapshot) -> String {
    let mut out = String::new();

    let who = match &snapshot.customer {
        Some(c) => format!("{} ({})", c.full_name(), c.id),
        None => format!("unknown customer ({})", snapshot.customer_id),
    };
    let _ = writeln!(
        out,
        "{} [{}] as of {}",
        who,
        snapshot.source,
        snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );

    if snapshot.is_empty() {
        let _ = writeln!(out, "No accounts.");
        return out;
    }

    for view in &snapshot.accounts {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", account_line(&view.account));

        for card in &view.cards {
            let _ = writeln!(
                out,
                "  card {} exp {} {}",
                card.last_four()
                    .map(|d| format!("*{}", d))
                    .unwrap_or_else(|| card.masked_number.clone()),
                card.expiration,
                card.status.as_str()
            );
        }

        for tx in &view.transactions {
            let _ = writeln!(
                out,
                "  {}  {:<10} {:<9} {:>14}  {}",
                tx.date,
                tx.kind.as_str(),
                tx.status.as_str(),
                format_amount(tx.amount, &view.account.currency),
                tx.description.as_deref().unwrap_or("")
            );
        }
    }

    out
}

pub fn render_summary(summary: &SnapshotSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Accounts:     {}", summary.account_count);
    let _ = writeln!(out, "Cards:        {}", summary.card_count);
    let _ = writeln!(out, "Transactions: {}", summary.transaction_count);
    for (currency, total) in &summary.balances {
        let _ = writeln!(out, "Balance:      {}", format_amount(*total, currency));
    }
    out
}

pub fn render_customers(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers.\n".to_string();
    }
    let mut out = String::new();
    for c in customers {
        let _ = writeln!(
            out,
            "{:<26} {:<24} {}, {}",
            c.id,
            c.full_name(),
            c.address.city,
            c.address.state
        );
    }
    out
}

fn street(address: &Address) -> String {
    format!(
        "{} {}, {}, {}",
        address.street_number, address.street_name, address.city, address.state
    )
}

pub fn render_atms(atms: &[Atm]) -> String {
    if atms.is_empty() {
        return "No ATMs.\n".to_string();
    }
    let mut out = String::new();
    for atm in atms {
        let _ = writeln!(
            out,
            "{:<26} {:<28} {}  ({:.4}, {:.4})",
            atm.id,
            atm.name,
            street(&atm.address),
            atm.geocode.lat,
            atm.geocode.lng
        );
    }
    out
}

pub fn render_branches(branches: &[Branch]) -> String {
    if branches.is_empty() {
        return "No branches.\n".to_string();
    }
    let mut out = String::new();
    for branch in branches {
        let _ = writeln!(
            out,
            "{:<26} {:<28} {}  {}",
            branch.id,
            branch.name,
            street(&branch.address),
            branch.phone_number.as_deref().unwrap_or("")
        );
    }
    out
}
