use ratatui::style::Color;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Parse a duration such as `5s`, `2m`, `4h`, `1h30m` or `250ms`.
///
/// A bare `0` is accepted and means no limit. Units: `h`, `m`, `s`, `ms`.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        if digits == 0 {
            return Err(format!("invalid duration '{}'", input));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid number in duration '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "s" => Some(Duration::from_secs(value)),
            "ms" => Some(Duration::from_millis(value)),
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| format!("duration '{}' too large", input))?;
        rest = &rest[unit_len..];
    }
    Ok(total)
}

/// Generate a color for a string based on hash.
pub fn get_color(s: &str) -> Color {
    let colors = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::LightRed,
        Color::LightGreen,
        Color::LightBlue,
        Color::LightYellow,
        Color::LightMagenta,
        Color::LightCyan,
    ];
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    let hash = hasher.finish() as u32;
    colors[(hash % colors.len() as u32) as usize]
}
