//! Plain-text invoice for a voucher.

use std::collections::HashMap;
use std::fmt::Write;

use crate::money::Money;
use crate::types::{Company, Product, VoucherKind, VoucherWithItems};

const WIDTH: usize = 64;

/// Renders a fixed-width invoice.
///
/// ```text
/// ================================================================
///                          SALES INVOICE
/// ================================================================
/// Invoice No: SV-20260314-0001                   Date: 2026-03-14
/// Bill To:    Hill Traders
/// ----------------------------------------------------------------
/// Item                              Qty       Price        Amount
/// ...
/// ```
pub fn render_text(
    voucher: &VoucherWithItems,
    products: &HashMap<String, Product>,
    company: Option<&Company>,
    symbol: &str,
) -> String {
    let header = &voucher.voucher;
    let mut out = String::new();
    let rule = "=".repeat(WIDTH);
    let thin = "-".repeat(WIDTH);
    let money = |cents: i64| Money::from_cents(cents).format_with_symbol(symbol);

    let title = match header.kind {
        VoucherKind::Sales => "SALES INVOICE",
        VoucherKind::Purchase => "PURCHASE VOUCHER",
    };
    let party_label = match header.kind {
        VoucherKind::Sales => "Bill To:",
        VoucherKind::Purchase => "Supplier:",
    };

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:^width$}", title, width = WIDTH);
    let _ = writeln!(out, "{}", rule);

    let number = format!("Invoice No: {}", header.voucher_number);
    let date = format!("Date: {}", header.voucher_date);
    let _ = writeln!(out, "{}{:>width$}", number, date, width = WIDTH - number.len());

    let party = company
        .map(|c| c.name.as_str())
        .or(header.party_name.as_deref())
        .unwrap_or("Walk-in customer");
    let _ = writeln!(out, "{:<12}{}", party_label, party);
    if let Some(company) = company {
        for line in [&company.address, &company.phone, &company.tax_number]
            .into_iter()
            .flatten()
        {
            let _ = writeln!(out, "{:<12}{}", "", line);
        }
    }
    let _ = writeln!(out, "Status:     {}", header.status.as_str());
    let _ = writeln!(out, "{}", thin);
    let _ = writeln!(
        out,
        "{:<30}{:>8}{:>12}{:>14}",
        "Item", "Qty", "Price", "Amount"
    );
    let _ = writeln!(out, "{}", thin);

    for item in &voucher.items {
        let name = products
            .get(&item.product_id)
            .map(|p| p.name.as_str())
            .unwrap_or(item.product_id.as_str());
        let name: String = if name.chars().count() > 29 {
            name.chars().take(28).chain(std::iter::once('~')).collect()
        } else {
            name.to_string()
        };
        let _ = writeln!(
            out,
            "{:<30}{:>8}{:>12}{:>14}",
            name,
            item.quantity,
            money(item.unit_price_cents),
            money(item.line_total_cents)
        );
    }

    let _ = writeln!(out, "{}", thin);
    let totals = [
        ("Subtotal", header.subtotal_cents),
        ("Discount", -header.discount_cents),
        ("Tax", header.tax_cents),
    ];
    for (label, cents) in totals {
        if cents != 0 || label == "Subtotal" {
            let _ = writeln!(out, "{:>50}{:>14}", label, money(cents));
        }
    }
    let _ = writeln!(out, "{:>50}{:>14}", "TOTAL", money(header.total_cents));
    let _ = writeln!(out, "{}", rule);

    if let Some(notes) = header.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out, "Notes: {}", notes.trim());
    }
    out
}
