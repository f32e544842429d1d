use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::errors::FundingError;
use crate::invariants;
use crate::ledger;
use crate::lifecycle;
use crate::types::{Investment, PaymentMethod, PaymentStatus, Principal, Project, ProjectStatus, Role};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn principal(id: i64, role: Role) -> Principal {
    Principal {
        id,
        email: format!("user{id}@example.com"),
        role,
    }
}

fn project(goal: &str, raised: &str, status: ProjectStatus, deadline_days: i64) -> Project {
    let now = Utc::now();
    Project {
        id: 1,
        title: "Solar kiosk".into(),
        description: "A".repeat(60),
        goal: dec(goal),
        amount_raised: dec(raised),
        status,
        deadline: now + Duration::days(deadline_days),
        created_at: now,
        owner_id: 10,
        owner_email: "owner@example.com".into(),
    }
}

fn investment(id: i64, project_id: i64, amount: &str, status: PaymentStatus) -> Investment {
    Investment {
        id,
        investor_id: 20,
        investor_email: "investor@example.com".into(),
        project_id,
        amount: dec(amount),
        method: PaymentMethod::Card,
        status,
        intent_id: None,
        client_secret: None,
        created_at: Utc::now(),
    }
}

// ─────────────────────────────────────────────────────────
// evaluate
// ─────────────────────────────────────────────────────────

#[test]
fn partial_funding_stays_active() {
    // goal=1000, first investor settles 600: total below goal, deadline ahead.
    let p = project("1000.00", "600.00", ProjectStatus::Active, 30);
    assert_eq!(lifecycle::evaluate(&p, Utc::now()), ProjectStatus::Active);
}

#[test]
fn reaching_goal_transitions_to_funded_before_deadline() {
    // 600 + 400 settled: exactly at goal, 30 days of runway left.
    let p = project("1000.00", "1000.00", ProjectStatus::Active, 30);
    let next = lifecycle::evaluate(&p, Utc::now());
    invariants::assert_valid_status_transition(p.status, next);
    assert_eq!(next, ProjectStatus::Funded);
}

#[test]
fn exactly_at_goal_is_funded_not_active() {
    let p = project("500.00", "500.00", ProjectStatus::Active, 365);
    assert_eq!(lifecycle::evaluate(&p, Utc::now()), ProjectStatus::Funded);
}

#[test]
fn over_goal_is_funded() {
    let p = project("500.00", "700.50", ProjectStatus::Active, 5);
    assert_eq!(lifecycle::evaluate(&p, Utc::now()), ProjectStatus::Funded);
}

#[test]
fn expired_below_goal_fails() {
    let p = project("1000.00", "300.00", ProjectStatus::Active, -1);
    let next = lifecycle::evaluate(&p, Utc::now());
    invariants::assert_valid_status_transition(p.status, next);
    assert_eq!(next, ProjectStatus::Failed);
}

#[test]
fn funded_check_precedes_expiry_check() {
    // Deadline already passed, but the goal was reached: Funded wins.
    let p = project("1000.00", "1000.00", ProjectStatus::Active, -1);
    assert_eq!(lifecycle::evaluate(&p, Utc::now()), ProjectStatus::Funded);
}

#[test]
fn pending_validation_never_auto_transitions() {
    let funded = project("100.00", "100.00", ProjectStatus::PendingValidation, 30);
    let expired = project("100.00", "0.00", ProjectStatus::PendingValidation, -5);
    assert_eq!(
        lifecycle::evaluate(&funded, Utc::now()),
        ProjectStatus::PendingValidation
    );
    assert_eq!(
        lifecycle::evaluate(&expired, Utc::now()),
        ProjectStatus::PendingValidation
    );
}

#[test]
fn terminal_statuses_are_sticky() {
    // Even if the books were rewound, Funded/Failed never move again.
    let funded = project("1000.00", "0.00", ProjectStatus::Funded, 30);
    let failed = project("1000.00", "1000.00", ProjectStatus::Failed, 30);
    assert_eq!(lifecycle::evaluate(&funded, Utc::now()), ProjectStatus::Funded);
    assert_eq!(lifecycle::evaluate(&failed, Utc::now()), ProjectStatus::Failed);
}

// ─────────────────────────────────────────────────────────
// validate
// ─────────────────────────────────────────────────────────

#[test]
fn validate_requires_admin() {
    let p = project("100.00", "0.00", ProjectStatus::PendingValidation, 30);
    let owner = principal(10, Role::ProjectOwner);
    let investor = principal(20, Role::Investor);
    assert_eq!(
        lifecycle::check_validate(&p, &owner),
        Err(FundingError::Forbidden)
    );
    assert_eq!(
        lifecycle::check_validate(&p, &investor),
        Err(FundingError::Forbidden)
    );
}

#[test]
fn validate_succeeds_exactly_once() {
    let mut p = project("100.00", "0.00", ProjectStatus::PendingValidation, 30);
    let admin = principal(1, Role::Admin);

    let next = lifecycle::check_validate(&p, &admin).unwrap();
    assert_eq!(next, ProjectStatus::Active);
    p.status = next;

    // Second call sees Active and is rejected.
    assert!(matches!(
        lifecycle::check_validate(&p, &admin),
        Err(FundingError::InvalidTransition(_))
    ));
}

#[test]
fn validate_rejected_from_terminal_states() {
    let admin = principal(1, Role::Admin);
    for status in [ProjectStatus::Funded, ProjectStatus::Failed, ProjectStatus::Active] {
        let p = project("100.00", "0.00", status, 30);
        assert!(matches!(
            lifecycle::check_validate(&p, &admin),
            Err(FundingError::InvalidTransition(_))
        ));
    }
}

// ─────────────────────────────────────────────────────────
// project creation rules
// ─────────────────────────────────────────────────────────

#[test]
fn create_project_rules() {
    let now = Utc::now();
    let owner = principal(10, Role::ProjectOwner);
    let deadline = now + Duration::days(30);
    let desc = "A".repeat(60);

    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", &desc, dec("1000.00"), deadline, now).is_ok());

    // Role gate.
    let investor = principal(20, Role::Investor);
    assert_eq!(
        lifecycle::check_create_project(&investor, "Solar kiosk", &desc, dec("1000.00"), deadline, now),
        Err(FundingError::RoleForbidden)
    );

    // Short title / description.
    assert!(lifecycle::check_create_project(&owner, "Hi", &desc, dec("1000.00"), deadline, now).is_err());
    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", "too short", dec("1000.00"), deadline, now).is_err());

    // Non-positive goal, fractional-cent goal, past deadline.
    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", &desc, dec("0.00"), deadline, now).is_err());
    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", &desc, dec("10.005"), deadline, now).is_err());
    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", &desc, dec("1000.00"), now - Duration::days(1), now).is_err());
}

#[test]
fn length_minimums_count_characters_not_bytes() {
    let now = Utc::now();
    let owner = principal(10, Role::ProjectOwner);
    let deadline = now + Duration::days(30);
    let desc = "A".repeat(60);

    // "Télé" is 4 characters but 6 bytes; it must still fail the 5-minimum.
    assert_eq!(
        lifecycle::check_create_project(&owner, "Télé", &desc, dec("1000.00"), deadline, now),
        Err(FundingError::Validation(
            "title must be at least 5 characters".into()
        ))
    );
    // 5 accented characters pass.
    assert!(lifecycle::check_create_project(&owner, "Téléé", &desc, dec("1000.00"), deadline, now).is_ok());

    // Same rule for the description: 49 two-byte characters are too short,
    // 50 are enough.
    let accented_short = "é".repeat(49);
    let accented_ok = "é".repeat(50);
    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", &accented_short, dec("1000.00"), deadline, now).is_err());
    assert!(lifecycle::check_create_project(&owner, "Solar kiosk", &accented_ok, dec("1000.00"), deadline, now).is_ok());
}

// ─────────────────────────────────────────────────────────
// investment admission
// ─────────────────────────────────────────────────────────

#[test]
fn record_accepts_a_valid_investment() {
    let p = project("1000.00", "0.00", ProjectStatus::Active, 30);
    let investor = principal(20, Role::Investor);
    assert!(ledger::check_record(&investor, &p, dec("50.00"), dec("1.00"), Utc::now()).is_ok());
}

#[test]
fn record_rejects_non_positive_and_below_minimum_amounts() {
    let p = project("1000.00", "0.00", ProjectStatus::Active, 30);
    let investor = principal(20, Role::Investor);
    let now = Utc::now();
    assert!(matches!(
        ledger::check_record(&investor, &p, dec("0.00"), dec("1.00"), now),
        Err(FundingError::Validation(_))
    ));
    assert!(matches!(
        ledger::check_record(&investor, &p, dec("-5.00"), dec("1.00"), now),
        Err(FundingError::Validation(_))
    ));
    assert!(matches!(
        ledger::check_record(&investor, &p, dec("0.50"), dec("1.00"), now),
        Err(FundingError::Validation(_))
    ));
}

#[test]
fn record_rejects_inactive_or_expired_projects() {
    let investor = principal(20, Role::Investor);
    let now = Utc::now();
    for status in [
        ProjectStatus::PendingValidation,
        ProjectStatus::Funded,
        ProjectStatus::Failed,
    ] {
        let p = project("1000.00", "0.00", status, 30);
        assert_eq!(
            ledger::check_record(&investor, &p, dec("50.00"), dec("1.00"), now),
            Err(FundingError::ProjectNotAcceptingFunds)
        );
    }
    let expired = project("1000.00", "0.00", ProjectStatus::Active, -1);
    assert_eq!(
        ledger::check_record(&investor, &expired, dec("50.00"), dec("1.00"), now),
        Err(FundingError::ProjectNotAcceptingFunds)
    );
}

#[test]
fn owner_cannot_invest_in_own_project() {
    let p = project("1000.00", "0.00", ProjectStatus::Active, 30);
    // Same id as the project owner, even with the investor role.
    let owner_as_investor = principal(10, Role::Investor);
    assert_eq!(
        ledger::check_record(&owner_as_investor, &p, dec("50.00"), dec("1.00"), Utc::now()),
        Err(FundingError::SelfInvestmentForbidden)
    );
}

#[test]
fn only_investors_may_invest() {
    let p = project("1000.00", "0.00", ProjectStatus::Active, 30);
    for role in [Role::ProjectOwner, Role::Admin] {
        let actor = principal(99, role);
        assert_eq!(
            ledger::check_record(&actor, &p, dec("50.00"), dec("1.00"), Utc::now()),
            Err(FundingError::RoleForbidden)
        );
    }
}

// ─────────────────────────────────────────────────────────
// payment transitions
// ─────────────────────────────────────────────────────────

#[test]
fn settle_and_fail_only_from_pending() {
    assert!(ledger::check_transition(PaymentStatus::Pending, PaymentStatus::Settled).is_ok());
    assert!(ledger::check_transition(PaymentStatus::Pending, PaymentStatus::Failed).is_ok());

    // Double settlement and settling a failed payment are both rejected.
    for current in [PaymentStatus::Settled, PaymentStatus::Failed] {
        for target in [PaymentStatus::Settled, PaymentStatus::Failed] {
            assert!(matches!(
                ledger::check_transition(current, target),
                Err(FundingError::InvalidState(_))
            ));
        }
    }
    assert!(ledger::check_transition(PaymentStatus::Pending, PaymentStatus::Pending).is_err());
}

// ─────────────────────────────────────────────────────────
// derived properties
// ─────────────────────────────────────────────────────────

#[test]
fn funded_percentage_is_capped_and_zero_safe() {
    let half = project("1000.00", "500.00", ProjectStatus::Active, 30);
    assert_eq!(half.funded_percentage(), dec("50"));

    let over = project("1000.00", "2500.00", ProjectStatus::Active, 30);
    assert_eq!(over.funded_percentage(), dec("100"));

    let mut zero_goal = project("1000.00", "0.00", ProjectStatus::Active, 30);
    zero_goal.goal = Decimal::ZERO;
    assert_eq!(zero_goal.funded_percentage(), Decimal::ZERO);
}

#[test]
fn days_remaining_rounds_up_and_floors_at_zero() {
    let now = Utc::now();
    let mut p = project("1000.00", "0.00", ProjectStatus::Active, 0);

    p.deadline = now + Duration::hours(36);
    assert_eq!(p.days_remaining(now), 2);

    p.deadline = now + Duration::days(30);
    assert_eq!(p.days_remaining(now), 30);

    p.deadline = now - Duration::hours(1);
    assert_eq!(p.days_remaining(now), 0);
}

#[test]
fn amount_consistency_invariant_across_transitions() {
    let mut p = project("1000.00", "0.00", ProjectStatus::Active, 30);
    let investments = vec![
        investment(1, p.id, "600.00", PaymentStatus::Settled),
        investment(2, p.id, "400.00", PaymentStatus::Settled),
        investment(3, p.id, "123.45", PaymentStatus::Failed),
        investment(4, p.id, "77.00", PaymentStatus::Pending),
        investment(5, 999, "500.00", PaymentStatus::Settled),
    ];
    p.amount_raised = crate::money::sum_settled(investments.iter().filter(|i| i.project_id == p.id));
    invariants::assert_amount_consistent(&p, &investments);
    assert_eq!(p.amount_raised, dec("1000.00"));
    assert_eq!(lifecycle::evaluate(&p, Utc::now()), ProjectStatus::Funded);
}
