//! Property-based tests for the closing summary engine.

use chrono::Utc;
use cuadra_shared::types::{LedgerEntryId, RegisterSessionId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::closing::{ClosingEngine, ClosingInput, ClosingSummary};
use super::payment::{Breakdown, PaymentMethod, breakdown_total};
use super::types::{
    EntryKind, FeedTotals, LedgerEntry, RegisterSession, ReviewStatus, SessionStatus,
};

const METHODS: [&str; 4] = ["cash", "card", "transfer", "nequi"];

/// Strategy for a non-negative amount with cents, up to 10,000,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a strictly positive amount.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn method() -> impl Strategy<Value = PaymentMethod> {
    prop::sample::select(METHODS.to_vec()).prop_map(|m| PaymentMethod::parse(m).unwrap())
}

fn breakdown() -> impl Strategy<Value = Breakdown> {
    prop::collection::btree_map(method(), amount(), 0..4)
}

fn kind() -> impl Strategy<Value = EntryKind> {
    prop_oneof![Just(EntryKind::Income), Just(EntryKind::Expense)]
}

fn entries() -> impl Strategy<Value = Vec<(EntryKind, Decimal, PaymentMethod)>> {
    prop::collection::vec((kind(), positive_amount(), method()), 0..20)
}

fn session(opening: Breakdown) -> RegisterSession {
    RegisterSession {
        id: RegisterSessionId::new(),
        register_id: "R1".to_string(),
        name: "Prop".to_string(),
        responsible: "ana".to_string(),
        opened_at: Utc::now(),
        closed_at: None,
        opening_float: breakdown_total(&opening).unwrap(),
        opening_float_breakdown: opening,
        cashiers: Vec::new(),
        status: SessionStatus::Open,
        notes: None,
        revision: 0,
        declared_amounts: None,
        closing_summary: None,
        review_status: ReviewStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        review_notes: None,
    }
}

fn ledger(
    session: &RegisterSession,
    raw: Vec<(EntryKind, Decimal, PaymentMethod)>,
) -> Vec<LedgerEntry> {
    raw.into_iter()
        .map(|(kind, amount, payment_method)| LedgerEntry {
            id: LedgerEntryId::new(),
            session_id: session.id,
            kind,
            amount,
            payment_method,
            description: None,
            recorded_by: None,
            recorded_at: session.opened_at,
        })
        .collect()
}

fn run(
    session: &RegisterSession,
    entries: &[LedgerEntry],
    feed: &FeedTotals,
    declared: &Breakdown,
    tolerance: Decimal,
) -> ClosingSummary {
    let input = ClosingInput {
        session,
        entries,
        feed,
        declared,
        window_end: Utc::now(),
        tolerance,
    };
    ClosingEngine::summarize(&input, Utc::now()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every line satisfies `difference == declared - expected` and the
    /// aggregate equals the sum of the lines.
    #[test]
    fn prop_differences_add_up(
        opening in breakdown(),
        raw in entries(),
        sales in breakdown(),
        external in breakdown(),
        declared in breakdown(),
    ) {
        let s = session(opening);
        let entries = ledger(&s, raw);
        let feed = FeedTotals { sales, external_expenses: external };
        let report = run(&s, &entries, &feed, &declared, Decimal::new(5000, 0));

        for line in &report.methods {
            prop_assert_eq!(line.difference, line.declared - line.expected);
            prop_assert_eq!(
                line.expected,
                line.opening + line.incomes - line.expenses + line.sales - line.external_expenses
            );
        }
        let sum: Decimal = report.methods.iter().map(|l| l.difference).sum();
        prop_assert_eq!(report.total_difference, sum);
        prop_assert_eq!(report.total_difference, report.total_declared - report.total_expected);
        prop_assert_eq!(report.total_declared, breakdown_total(&declared).unwrap());
    }

    /// Every method seen anywhere gets exactly one line, in lexical order.
    #[test]
    fn prop_methods_zero_filled_and_sorted(
        opening in breakdown(),
        raw in entries(),
        sales in breakdown(),
        declared in breakdown(),
    ) {
        let s = session(opening.clone());
        let entries = ledger(&s, raw);
        let feed = FeedTotals { sales: sales.clone(), external_expenses: Breakdown::new() };
        let report = run(&s, &entries, &feed, &declared, Decimal::ZERO);

        let keys: Vec<&PaymentMethod> = report.methods.iter().map(|l| &l.payment_method).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(&keys, &sorted);

        for key in opening.keys().chain(sales.keys()).chain(declared.keys())
            .chain(entries.iter().map(|e| &e.payment_method))
        {
            prop_assert!(keys.contains(&key));
        }
    }

    /// Tolerance is judged on the absolute aggregate difference.
    #[test]
    fn prop_within_tolerance_matches_definition(
        opening in breakdown(),
        declared in breakdown(),
        tolerance in amount(),
    ) {
        let s = session(opening);
        let report = run(&s, &[], &FeedTotals::default(), &declared, tolerance);
        prop_assert_eq!(report.within_tolerance, report.total_difference.abs() <= tolerance);
    }

    /// Declaring exactly what is expected always balances.
    #[test]
    fn prop_exact_declaration_balances(
        opening in breakdown(),
        raw in entries(),
        sales in breakdown(),
    ) {
        let s = session(opening);
        let entries = ledger(&s, raw);
        let feed = FeedTotals { sales, external_expenses: Breakdown::new() };
        let preview = run(&s, &entries, &feed, &Breakdown::new(), Decimal::ZERO);

        let declared: Breakdown = preview
            .methods
            .iter()
            .map(|l| (l.payment_method.clone(), l.expected))
            .collect();

        let report = run(&s, &entries, &feed, &declared, Decimal::ZERO);
        prop_assert_eq!(report.total_difference, Decimal::ZERO);
        prop_assert!(report.within_tolerance);
    }

    /// Recomputing over the same data yields the same fingerprint.
    #[test]
    fn prop_fingerprint_is_stable(
        opening in breakdown(),
        raw in entries(),
        declared in breakdown(),
    ) {
        let s = session(opening);
        let entries = ledger(&s, raw);
        let a = run(&s, &entries, &FeedTotals::default(), &declared, Decimal::ONE);
        let b = run(&s, &entries, &FeedTotals::default(), &declared, Decimal::ONE);
        prop_assert_eq!(a.fingerprint, b.fingerprint);
        prop_assert_eq!(a.methods, b.methods);
    }
}
