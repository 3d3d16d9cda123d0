use chrono::{DateTime, Datelike, Utc};

/// Humanized distance between `instant` and `now`, e.g. `an hour ago`.
pub fn relative_label(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta_ms = (now - instant).num_milliseconds();
    let phrase = humanize(delta_ms.unsigned_abs());
    if delta_ms < 0 {
        return format!("in {}", phrase);
    }
    format!("{} ago", phrase)
}

/// `October 19th 2026`
pub fn absolute_label(instant: DateTime<Utc>) -> String {
    let day = instant.day();
    format!(
        "{} {}{} {}",
        instant.format("%B"),
        day,
        ordinal_suffix(day),
        instant.format("%Y")
    )
}

fn humanize(millis: u64) -> String {
    let millis = millis as f64;
    let seconds = (millis / 1000.0).round();
    let minutes = (millis / 60_000.0).round();
    let hours = (millis / 3_600_000.0).round();
    let exact_days = millis / 86_400_000.0;
    let days = exact_days.round();
    let exact_months = exact_days * 4800.0 / 146_097.0;
    let months = exact_months.round();
    let years = (exact_months / 12.0).round();

    if seconds <= 44.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes as u64)
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours as u64)
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days as u64)
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{} months", months as u64)
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{} years", years as u64)
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{absolute_label, ordinal_suffix, relative_label};

    #[test]
    fn recent_instants_read_as_a_few_seconds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        assert_eq!(relative_label(now, now), "a few seconds ago");
        assert_eq!(
            relative_label(now - Duration::seconds(44), now),
            "a few seconds ago"
        );
    }

    #[test]
    fn relative_label_walks_the_thresholds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let cases = [
            (Duration::seconds(60), "a minute ago"),
            (Duration::milliseconds(89_500), "a minute ago"),
            (Duration::seconds(90), "2 minutes ago"),
            (Duration::minutes(5), "5 minutes ago"),
            (Duration::hours(1), "an hour ago"),
            (Duration::minutes(89) + Duration::seconds(30), "an hour ago"),
            (Duration::minutes(90), "2 hours ago"),
            (Duration::hours(3), "3 hours ago"),
            (Duration::hours(30), "a day ago"),
            (Duration::minutes(35 * 60 + 30), "a day ago"),
            (Duration::hours(36), "2 days ago"),
            (Duration::days(4), "4 days ago"),
            (Duration::days(30), "a month ago"),
            (Duration::days(120), "4 months ago"),
            (Duration::days(365), "a year ago"),
            (Duration::days(365 * 3), "3 years ago"),
        ];
        for (age, expected) in cases {
            assert_eq!(relative_label(now - age, now), expected, "age {:?}", age);
        }
    }

    #[test]
    fn future_instants_use_in_prefix() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        assert_eq!(relative_label(now + Duration::hours(3), now), "in 3 hours");
    }

    #[test]
    fn absolute_label_uses_month_name_and_ordinal_day() {
        let date = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        assert_eq!(absolute_label(date), "October 19th 2026");
        let date = Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(absolute_label(date), "March 2nd 2020");
    }

    #[test]
    fn ordinal_suffix_handles_teens() {
        assert_eq!(ordinal_suffix(1), "st");
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(21), "st");
        assert_eq!(ordinal_suffix(22), "nd");
        assert_eq!(ordinal_suffix(23), "rd");
        assert_eq!(ordinal_suffix(30), "th");
    }
}
