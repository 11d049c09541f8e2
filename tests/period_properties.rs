//! Property tests for period identifiers, windows and overdue detection

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use compliance_core::period::iso_week_of;
use compliance_core::{
    classify, is_overdue, period_identifier_for, period_window, ComplianceRecord, Frequency,
    PeriodIdentifier, RecordStatus,
};
use proptest::prelude::*;
use uuid::Uuid;

// -- Strategy helpers --

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2000-01-01 .. 2050-01-01, millisecond resolution
    (946_684_800_000i64..2_524_608_000_000i64).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    })
}

fn arb_frequency() -> impl Strategy<Value = Frequency> {
    prop::sample::select(Frequency::ALL.to_vec())
}

fn arb_record_status() -> impl Strategy<Value = Option<RecordStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(RecordStatus::Completed)),
        Just(Some(RecordStatus::Pending)),
        Just(Some(RecordStatus::Overdue)),
        Just(Some(RecordStatus::New)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// The window of the period computed for a date contains that date
    #[test]
    fn window_contains_its_date(date in arb_instant(), frequency in arb_frequency()) {
        let id = period_identifier_for(date, frequency).unwrap();
        let window = period_window(&id.to_string(), frequency).unwrap();
        prop_assert!(window.start <= date && date <= window.end,
            "{} not in {} ({:?})", date, id, window);
    }

    /// Consecutive windows touch: end + 1ms is the next start
    #[test]
    fn consecutive_windows_are_contiguous(date in arb_instant(), frequency in arb_frequency()) {
        let id = period_identifier_for(date, frequency).unwrap();
        let current = id.window().unwrap();
        let next = id.next().window().unwrap();
        prop_assert_eq!(current.end + Duration::milliseconds(1), next.start);
        prop_assert_eq!(id.next().previous(), id);
    }

    /// Not overdue at the first instant, overdue one millisecond after the last
    #[test]
    fn overdue_flips_after_window_end(date in arb_instant(), frequency in arb_frequency()) {
        let id = period_identifier_for(date, frequency).unwrap().to_string();
        let window = period_window(&id, frequency).unwrap();
        prop_assert!(!is_overdue(&id, frequency, window.start).unwrap());
        prop_assert!(!is_overdue(&id, frequency, window.end).unwrap());
        prop_assert!(is_overdue(&id, frequency, window.end + Duration::milliseconds(1)).unwrap());
    }

    /// Zero-padded identifiers of one frequency sort like their windows
    #[test]
    fn lexicographic_order_agrees_with_windows(
        a in arb_instant(),
        b in arb_instant(),
        frequency in arb_frequency(),
    ) {
        let earlier = period_identifier_for(a, frequency).unwrap().to_string();
        let now_period = period_identifier_for(b, frequency).unwrap().to_string();
        let by_window = is_overdue(&earlier, frequency, b).unwrap();
        prop_assert_eq!(by_window, earlier < now_period);
    }

    /// The Thursday-shift algorithm agrees with chrono's ISO week
    #[test]
    fn iso_week_matches_chrono(date in arb_instant()) {
        let day = date.date_naive();
        let iso = day.iso_week();
        prop_assert_eq!(iso_week_of(day), (iso.year(), iso.week()));
    }

    /// Same inputs, same status
    #[test]
    fn classification_is_idempotent(
        date in arb_instant(),
        now in arb_instant(),
        frequency in arb_frequency(),
        status in arb_record_status(),
    ) {
        let id = period_identifier_for(date, frequency).unwrap().to_string();
        let record =
            status.map(|s| ComplianceRecord::new(Uuid::nil(), Uuid::nil(), id.clone(), s));
        let first = classify(record.as_ref(), &id, frequency, now).unwrap();
        let second = classify(record.as_ref(), &id, frequency, now).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn sixty_consecutive_months_across_two_leap_years() {
    let mut id = PeriodIdentifier::Monthly {
        year: 2024,
        month: 1,
    };
    for _ in 0..60 {
        let window = id.window().unwrap();
        let next = id.next();
        assert_eq!(
            window.end + Duration::milliseconds(1),
            next.window().unwrap().start,
            "gap after {id}"
        );
        id = next;
    }
    assert_eq!(id.to_string(), "2029-01");
}

#[test]
fn weekly_windows_are_contiguous_across_53_week_year() {
    let mut id = PeriodIdentifier::Weekly {
        year: 2020,
        week: 50,
    };
    for _ in 0..10 {
        let next = id.next();
        assert_eq!(
            id.window().unwrap().end + Duration::milliseconds(1),
            next.window().unwrap().start
        );
        id = next;
    }
    assert_eq!(id.to_string(), "2021-W07");
}
