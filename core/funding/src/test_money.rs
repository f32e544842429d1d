use chrono::Utc;
use rust_decimal::Decimal;

use crate::errors::FundingError;
use crate::money;
use crate::types::{Investment, PaymentMethod, PaymentStatus};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn settled(id: i64, amount: &str) -> Investment {
    Investment {
        id,
        investor_id: id,
        investor_email: format!("i{id}@example.com"),
        project_id: 1,
        amount: dec(amount),
        method: PaymentMethod::Card,
        status: PaymentStatus::Settled,
        intent_id: None,
        client_secret: None,
        created_at: Utc::now(),
    }
}

#[test]
fn minor_unit_conversion() {
    assert_eq!(money::to_minor_units(dec("600.00")).unwrap(), 60_000);
    assert_eq!(money::to_minor_units(dec("0.01")).unwrap(), 1);
    assert_eq!(money::to_minor_units(dec("1")).unwrap(), 100);
    assert_eq!(money::to_minor_units(dec("1234.56")).unwrap(), 123_456);
}

#[test]
fn fractional_minor_units_are_rejected() {
    assert!(matches!(
        money::to_minor_units(dec("10.005")),
        Err(FundingError::Validation(_))
    ));
    assert!(matches!(
        money::to_minor_units(dec("0.001")),
        Err(FundingError::Validation(_))
    ));
}

#[test]
fn check_scale_accepts_two_decimal_places() {
    assert!(money::check_scale(dec("10.00")).is_ok());
    assert!(money::check_scale(dec("10.5")).is_ok());
    assert!(money::check_scale(dec("10")).is_ok());
    assert!(money::check_scale(dec("10.001")).is_err());
}

#[test]
fn sum_is_exact_where_floats_drift() {
    // 0.1 + 0.2 is the classic binary-float trap; decimals stay exact.
    let investments = vec![settled(1, "0.10"), settled(2, "0.20")];
    assert_eq!(money::sum_settled(&investments), dec("0.30"));

    let many: Vec<Investment> = (0..1000).map(|i| settled(i, "0.01")).collect();
    assert_eq!(money::sum_settled(&many), dec("10.00"));
}

#[test]
fn sum_ignores_pending_and_failed() {
    let mut investments = vec![settled(1, "600.00"), settled(2, "400.00")];
    investments.push(Investment {
        status: PaymentStatus::Pending,
        ..settled(3, "999.00")
    });
    investments.push(Investment {
        status: PaymentStatus::Failed,
        ..settled(4, "999.00")
    });
    assert_eq!(money::sum_settled(&investments), dec("1000.00"));
}

#[test]
fn amount_text_round_trip() {
    for s in ["0.00", "1.00", "600.00", "1234.56", "99999999.99"] {
        let parsed = money::parse_amount(s).unwrap();
        assert_eq!(money::format_amount(&parsed), s);
    }
    assert!(money::parse_amount("not-a-number").is_err());
}

#[test]
fn format_amount_pads_to_two_places() {
    assert_eq!(money::format_amount(&dec("5")), "5.00");
    assert_eq!(money::format_amount(&dec("5.5")), "5.50");
}
