//! Number, currency, date and relative-time formatting.
//!
//! Formatting is pattern based and deliberately small: no CLDR data, only the
//! configured separators and date tokens.

use chrono::{
    DateTime,
    Datelike,
    TimeZone,
    Timelike,
};

use crate::config::{
    DateFormat,
    NumberFormat,
};
use crate::interpolate::ParamValue;

/// Which [`DateFormat`] pattern to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateStyle {
    #[default]
    Date,
    Time,
    DateTime,
}

/// Rounds `value` to `format.decimals` (half away from zero) and groups the
/// integer digits in threes.
///
/// ```
/// use i18n_engine::config::NumberFormat;
/// use i18n_engine::format::format_number;
///
/// assert_eq!(format_number(1234567.89, &NumberFormat::default()), "1,234,567.89");
/// ```
#[must_use]
pub fn format_number(value: f64, format: &NumberFormat) -> String {
    if !value.is_finite() {
        return ParamValue::Float(value).to_string();
    }

    let decimals = format.decimals;
    let scale = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let scaled = (value.abs() * scale).round();
    if !scaled.is_finite() {
        return ParamValue::Float(value).to_string();
    }

    // `scaled` is integral, so this prints its digits without a fraction.
    let mut digits = format!("{scaled:.0}");
    if digits.len() <= decimals {
        digits = format!("{digits:0>width$}", width = decimals + 1);
    }
    let (int_part, frac_part) = digits.split_at(digits.len() - decimals);

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if value.is_sign_negative() && scaled > 0.0 {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, &format.thousands_separator));
    if !frac_part.is_empty() {
        out.push_str(&format.decimal_separator);
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Symbol for well-known ISO 4217 codes.
#[must_use]
pub fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "CNY" | "JPY" => Some("¥"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "KRW" => Some("₩"),
        _ => None,
    }
}

/// [`format_number`] prefixed with the currency symbol, or with the code and
/// a space for codes without a known symbol.
#[must_use]
pub fn format_currency(value: f64, currency: &str, format: &NumberFormat) -> String {
    let amount = format_number(value, format);
    currency_symbol(currency).map_or_else(
        || format!("{currency} {amount}"),
        |symbol| format!("{symbol}{amount}"),
    )
}

/// Substitutes `YYYY MM DD HH mm ss` in the pattern selected by `style`.
#[must_use]
pub fn format_date<T>(datetime: &T, style: DateStyle, format: &DateFormat) -> String
where
    T: Datelike + Timelike,
{
    let pattern = match style {
        DateStyle::Date => &format.date,
        DateStyle::Time => &format.time,
        DateStyle::DateTime => &format.datetime,
    };
    apply_pattern(pattern, datetime)
}

fn apply_pattern<T: Datelike + Timelike>(pattern: &str, datetime: &T) -> String {
    pattern
        .replace("YYYY", &format!("{:04}", datetime.year()))
        .replace("MM", &format!("{:02}", datetime.month()))
        .replace("DD", &format!("{:02}", datetime.day()))
        .replace("HH", &format!("{:02}", datetime.hour()))
        .replace("mm", &format!("{:02}", datetime.minute()))
        .replace("ss", &format!("{:02}", datetime.second()))
}

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
/// From this age on, relative phrasing gives way to the date pattern.
const MONTH: i64 = 30 * DAY;

#[derive(Clone, Copy)]
enum Unit {
    Minute,
    Hour,
    Day,
}

/// Describes `then` relative to `now`.
///
/// `zh`-prefixed locales get Chinese phrasing, everything else English.
/// Differences of 30 days or more are printed with the date pattern instead.
#[must_use]
pub fn format_relative_time<Tz: TimeZone>(
    then: &DateTime<Tz>,
    now: &DateTime<Tz>,
    locale: &str,
    format: &DateFormat,
) -> String {
    let seconds = now.clone().signed_duration_since(then).num_seconds();
    let future = seconds < 0;
    let elapsed = seconds.saturating_abs();
    let chinese = locale.starts_with("zh");

    let (count, unit) = match elapsed {
        s if s < MINUTE => return if chinese { "刚刚" } else { "just now" }.to_string(),
        s if s < HOUR => (s / MINUTE, Unit::Minute),
        s if s < DAY => (s / HOUR, Unit::Hour),
        s if s < MONTH => (s / DAY, Unit::Day),
        _ => return format_date(then, DateStyle::Date, format),
    };

    if chinese {
        let unit = match unit {
            Unit::Minute => "分钟",
            Unit::Hour => "小时",
            Unit::Day => "天",
        };
        let direction = if future { "后" } else { "前" };
        format!("{count} {unit}{direction}")
    } else {
        let unit = match unit {
            Unit::Minute => "minute",
            Unit::Hour => "hour",
            Unit::Day => "day",
        };
        let plural = if count == 1 { "" } else { "s" };
        if future { format!("in {count} {unit}{plural}") } else { format!("{count} {unit}{plural} ago") }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{
        Duration,
        NaiveDate,
        Utc,
    };
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn decimals(decimals: usize) -> NumberFormat {
        NumberFormat { decimals, ..NumberFormat::default() }
    }

    #[rstest]
    #[case::grouped(1_234_567.89, 2, "1,234,567.89")]
    #[case::rounds_half_up(1234.5, 0, "1,235")]
    #[case::rounds_fraction(1234.567, 2, "1,234.57")]
    #[case::pads_fraction(5.0, 2, "5.00")]
    #[case::small_fraction(0.05, 2, "0.05")]
    #[case::no_grouping_needed(999.0, 0, "999")]
    #[case::exact_group(1000.0, 0, "1,000")]
    #[case::negative(-1234.5, 1, "-1,234.5")]
    #[case::negative_zero(-0.001, 2, "0.00")]
    fn formats_numbers(#[case] value: f64, #[case] places: usize, #[case] expected: &str) {
        assert_that!(format_number(value, &decimals(places)), eq(expected));
    }

    #[rstest]
    fn formats_with_custom_separators() {
        let format = NumberFormat {
            decimals: 2,
            thousands_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
        };

        assert_that!(format_number(1_234_567.891, &format), eq("1.234.567,89"));
    }

    #[rstest]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    fn formats_non_finite(#[case] value: f64, #[case] expected: &str) {
        assert_that!(format_number(value, &NumberFormat::default()), eq(expected));
    }

    #[rstest]
    #[case("USD", "$1,234.50")]
    #[case("CNY", "¥1,234.50")]
    #[case("JPY", "¥1,234.50")]
    #[case("EUR", "€1,234.50")]
    #[case("GBP", "£1,234.50")]
    #[case("KRW", "₩1,234.50")]
    #[case("CHF", "CHF 1,234.50")]
    fn formats_currency(#[case] currency: &str, #[case] expected: &str) {
        assert_that!(format_currency(1234.5, currency, &NumberFormat::default()), eq(expected));
    }

    #[rstest]
    #[case(DateStyle::Date, "2024-03-05")]
    #[case(DateStyle::Time, "07:08:09")]
    #[case(DateStyle::DateTime, "2024-03-05 07:08:09")]
    fn formats_dates_with_default_patterns(#[case] style: DateStyle, #[case] expected: &str) {
        let datetime = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(7, 8, 9).unwrap();

        assert_that!(format_date(&datetime, style, &DateFormat::default()), eq(expected));
    }

    #[rstest]
    fn formats_dates_with_custom_pattern() {
        let datetime =
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap().and_hms_opt(23, 59, 0).unwrap();
        let format = DateFormat { date: "DD/MM/YYYY".to_string(), ..DateFormat::default() };

        assert_that!(format_date(&datetime, DateStyle::Date, &format), eq("31/12/2024"));
    }

    #[rstest]
    #[case::zh_just_now(Duration::seconds(30), "zh-CN", "刚刚")]
    #[case::en_just_now(Duration::seconds(59), "en-US", "just now")]
    #[case::zh_minutes(Duration::minutes(5), "zh-CN", "5 分钟前")]
    #[case::en_minutes(Duration::minutes(5), "en-US", "5 minutes ago")]
    #[case::en_one_minute(Duration::seconds(90), "en", "1 minute ago")]
    #[case::zh_hours(Duration::hours(3), "zh-TW", "3 小时前")]
    #[case::en_hours(Duration::hours(23), "fr", "23 hours ago")]
    #[case::zh_days(Duration::days(2), "zh", "2 天前")]
    #[case::en_days(Duration::days(29), "en-GB", "29 days ago")]
    #[case::zh_future(Duration::minutes(-5), "zh-CN", "5 分钟后")]
    #[case::en_future(Duration::hours(-2), "en-US", "in 2 hours")]
    fn formats_relative_time(
        #[case] age: Duration,
        #[case] locale: &str,
        #[case] expected: &str,
    ) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let then = now - age;

        assert_that!(
            format_relative_time(&then, &now, locale, &DateFormat::default()),
            eq(expected)
        );
    }

    #[rstest]
    fn relative_time_falls_back_to_date_after_thirty_days() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let then = now - Duration::days(45);

        assert_that!(
            format_relative_time(&then, &now, "en-US", &DateFormat::default()),
            eq("2024-04-17")
        );
    }
}
