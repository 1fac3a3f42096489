use memora_core::models::test_result::TestItem;

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_MINUTE: u64 = 60;

/// Total elapsed time across all items, formatted `MM:SS`, or `HH:MM:SS`
/// once the total reaches an hour.
pub fn compute_duration(items: &[TestItem]) -> String {
    let total: u64 = items
        .iter()
        .map(|item| item.elapsed().map(parse_elapsed).unwrap_or(0))
        .fold(0, u64::saturating_add);

    format_elapsed(total)
}

/// Seconds in a `MM:SS` or `HH:MM:SS` string. Other shapes count as zero.
pub fn parse_elapsed(s: &str) -> u64 {
    let parts: Vec<u64> = s.split(':').map(leading_number).collect();
    match parts.as_slice() {
        [m, sec] => m.saturating_mul(SECS_PER_MINUTE).saturating_add(*sec),
        [h, m, sec] => h
            .saturating_mul(SECS_PER_HOUR)
            .saturating_add(m.saturating_mul(SECS_PER_MINUTE))
            .saturating_add(*sec),
        _ => 0,
    }
}

pub fn format_elapsed(total_secs: u64) -> String {
    let h = total_secs / SECS_PER_HOUR;
    let m = (total_secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let s = total_secs % SECS_PER_MINUTE;

    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// The run of digits at the start of a field, after leading whitespace.
/// A field with no leading digits (including a sign) is zero.
fn leading_number(field: &str) -> u64 {
    field
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)))
}
