use chrono::{Datelike, Duration, TimeZone, Utc, Weekday};
use market_data::range::{ChartInterval, ChartRange, RangeSpec, resolve, resolve_spec};
use proptest::prelude::*;

proptest! {
    #[test]
    fn any_tokens_resolve_to_an_ordered_window(
        range in "\\PC{0,6}",
        interval in "\\PC{0,6}",
        secs in 0i64..4_000_000_000,
    ) {
        let now = Utc.timestamp_opt(secs, 0).unwrap();
        let w = resolve(&range, &interval, now);
        prop_assert!(w.start < w.end);
        prop_assert!(w.end <= now);
    }

    #[test]
    fn one_day_never_lands_on_a_weekend(secs in 0i64..4_000_000_000) {
        let now = Utc.timestamp_opt(secs, 0).unwrap();
        let w = resolve("1d", "5m", now);
        prop_assert!(!matches!(w.start.weekday(), Weekday::Sat | Weekday::Sun));
        prop_assert!(now - w.start <= Duration::days(4));
    }
}

#[test]
fn suggested_pairs_all_resolve() {
    let now = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
    for spec in RangeSpec::SUGGESTED {
        let w = resolve_spec(spec, now);
        assert_eq!(w.timeframe, spec.interval.timeframe());
    }
    assert!(RangeSpec::SUGGESTED.contains(&RangeSpec::DEFAULT));
    assert_eq!(ChartRange::ALL.len(), ChartInterval::ALL.len());
}
