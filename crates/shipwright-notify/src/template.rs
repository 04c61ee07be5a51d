// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of notification payloads.
//!
//! Payloads are self-contained snapshots, so rendering never reads the
//! stores and a job claimed long after enqueue still produces the message
//! the transition intended.

use shipwright_core::NotificationPayload;

fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

/// Render the subject and body for a status-changed message.
pub fn render_status_changed(payload: &NotificationPayload) -> (String, String) {
    let subject = format!(
        "Order {} update: {}",
        payload.order_id, payload.status
    );

    let mut body = String::new();
    body.push_str(&format!(
        "Your order {} is now {}.\n",
        payload.order_id, payload.status
    ));
    if let Some(tracking) = &payload.tracking_number {
        body.push_str(&format!("Tracking number: {tracking}\n"));
    }
    if let Some(note) = &payload.note {
        body.push_str(&format!("Note: {note}\n"));
    }
    if !payload.lines.is_empty() {
        body.push('\n');
        for line in &payload.lines {
            body.push_str(&format!(
                "  {} x {} @ {}\n",
                line.quantity,
                line.sku,
                format_cents(line.unit_price_cents)
            ));
        }
    }
    body.push_str(&format!("\nOrder total: {}\n", format_cents(payload.total_cents)));

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwright_core::{OrderLine, OrderStatus};

    fn payload() -> NotificationPayload {
        NotificationPayload {
            recipient: Some("buyer@example.com".to_string()),
            order_id: "ord-1".to_string(),
            status: OrderStatus::Shipping,
            tracking_number: Some("TRACK-123".to_string()),
            note: Some("left warehouse".to_string()),
            lines: vec![OrderLine {
                product_id: "p1".to_string(),
                sku: "SKU-A".to_string(),
                quantity: 3,
                unit_price_cents: 1000,
            }],
            total_cents: 3000,
        }
    }

    #[test]
    fn subject_names_order_and_status() {
        let (subject, _) = render_status_changed(&payload());
        assert_eq!(subject, "Order ord-1 update: shipping");
    }

    #[test]
    fn body_carries_tracking_note_and_totals() {
        let (_, body) = render_status_changed(&payload());
        assert!(body.contains("Tracking number: TRACK-123"));
        assert!(body.contains("Note: left warehouse"));
        assert!(body.contains("3 x SKU-A @ $10.00"));
        assert!(body.contains("Order total: $30.00"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let mut p = payload();
        p.tracking_number = None;
        p.note = None;
        let (_, body) = render_status_changed(&p);
        assert!(!body.contains("Tracking number"));
        assert!(!body.contains("Note:"));
    }
}
