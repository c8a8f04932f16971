use chrono::{DateTime, Duration, Utc};

use crate::data::types::{MarketId, MarketSnapshot};
use crate::reporting::trend::Trend;

/// `📅 2025-10-27, 14:05 WAT` (West Africa Time, UTC+1)
pub fn header(now: DateTime<Utc>) -> String {
    let wat = now + Duration::hours(1);
    format!("📅 {} WAT", wat.format("%Y-%m-%d, %H:%M"))
}

/// Group digits in threes: `1234567` -> `1,234,567`.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Chat message for one market report.
pub fn format_report(
    market: MarketId,
    snapshot: &MarketSnapshot,
    trend: Trend,
    now: DateTime<Utc>,
) -> String {
    let mut msg = format!(
        "{}: {} TOP 3\n",
        header(now),
        market.as_str().to_uppercase()
    );

    let lines: Vec<String> = snapshot
        .outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| {
            format!(
                "{}. {}: {}%\n   {}¢/{}¢ {} | ${} {}",
                i + 1,
                o.name,
                o.probability,
                o.yes_price,
                o.no_price,
                o.change,
                o.volume,
                o.tag
            )
        })
        .collect();
    msg.push_str(&lines.join("\n"));

    msg.push_str(&format!(
        "\n\nTotal: ${} ({})",
        thousands(snapshot.total_volume),
        trend.narrative()
    ));
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Outcome;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 27, 23, 30, 0).unwrap()
    }

    #[test]
    fn test_header_is_utc_plus_one() {
        assert_eq!(header(now()), "📅 2025-10-28, 00:30 WAT");
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_100), "1,100");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_report() {
        let snapshot = MarketSnapshot {
            total_volume: 1_100,
            outcomes: vec![
                Outcome {
                    name: "16°C".to_string(),
                    probability: 45,
                    yes_price: 46,
                    no_price: 55,
                    change: "+3%".to_string(),
                    volume: 12_000,
                    tag: "Hot".to_string(),
                },
                Outcome::default(),
            ],
        };

        let msg = format_report(MarketId::London, &snapshot, Trend::Change(10.0), now());
        assert_eq!(
            msg,
            "📅 2025-10-28, 00:30 WAT: LONDON TOP 3\n\
             1. 16°C: 45%\n   46¢/55¢ +3% | $12000 Hot\n\
             2. : 0%\n   0¢/0¢  | $0 None\n\n\
             Total: $1,100 (+10.0% vs last check)"
        );
    }

    #[test]
    fn test_format_report_without_outcomes() {
        let msg = format_report(
            MarketId::Nyc,
            &MarketSnapshot::default(),
            Trend::Unavailable,
            now(),
        );
        assert!(msg.starts_with("📅 2025-10-28, 00:30 WAT: NYC TOP 3\n"));
        assert!(msg.ends_with("Total: $0 (n/a vs last check)"));
    }
}
