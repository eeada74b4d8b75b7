use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::builtin::builtin_format;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Largest serial that still maps to a calendar date (9999-12-31).
const MAX_DATE_SERIAL: f64 = 2_958_466.0;

/// Render a raw numeric cell value through a number-format code.
///
/// An empty `code` is resolved through the built-in table using
/// `format_index`; unknown ids render as `General`.
pub fn format_raw_cell_contents(value: f64, format_index: u16, code: &str) -> String {
    let code = if code.trim().is_empty() {
        builtin_format(format_index).unwrap_or("General")
    } else {
        code
    };

    if !value.is_finite() {
        return value.to_string();
    }

    let sections = split_sections(code);
    let (section, value) = select_section(&sections, value);
    let section = strip_bracket_tokens(section);

    if is_general(&section) {
        return format_general(value);
    }
    if is_date_format(&section) {
        return format_date_pattern(&section, value);
    }
    format_number_pattern(&section, value)
}

/// Render a number the way the `General` format does: integral values without
/// a fraction, everything else with at most ten significant digits.
pub fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }

    let magnitude = value.abs().log10().floor() as i32 + 1;
    let decimals = (10 - magnitude).clamp(0, 15) as usize;
    let mut out = format!("{:.*}", decimals, value);
    if out.contains('.') {
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }
    if out == "-0" {
        out = "0".to_string();
    }
    out
}

/// Whether a format code renders its value as a date and/or time.
pub fn is_date_format(code: &str) -> bool {
    let first = split_sections(code).first().copied().unwrap_or(code);
    let cleaned = strip_literals(&strip_bracket_tokens(first));
    let lower = cleaned.to_ascii_lowercase();

    if lower.contains('#') || lower.contains('?') || lower.trim() == "general" {
        return false;
    }
    lower
        .chars()
        .any(|ch| matches!(ch, 'y' | 'm' | 'd' | 'h' | 's'))
}

fn is_general(section: &str) -> bool {
    let trimmed = section.trim();
    trimmed.is_empty() || trimmed == "@" || trimmed.eq_ignore_ascii_case("general")
}

/// Split a format code on `;` outside quoted literals.
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                sections.push(&code[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// Pick the positive/negative/zero section for `value`. A dedicated negative
/// section receives the absolute value; its literals carry the sign.
fn select_section<'a>(sections: &[&'a str], value: f64) -> (&'a str, f64) {
    let first = sections[0];
    if value < 0.0 {
        if let Some(negative) = sections.get(1) {
            return (negative, -value);
        }
    } else if value == 0.0 {
        if let Some(zero) = sections.get(2) {
            return (zero, value);
        }
    }
    (first, value)
}

/// Remove `[...]` tokens (colours, conditions, locales). Currency tokens such
/// as `[$€-407]` keep their symbol and elapsed-time tokens such as `[h]` keep
/// their letters.
fn strip_bracket_tokens(section: &str) -> String {
    let mut out = String::with_capacity(section.len());
    let mut chars = section.chars();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        if in_quotes {
            out.push(ch);
            if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_quotes = true;
                out.push(ch);
            }
            '\\' => {
                out.push(ch);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' => {
                let mut token = String::new();
                for next in chars.by_ref() {
                    if next == ']' {
                        break;
                    }
                    token.push(next);
                }
                if let Some(currency) = token.strip_prefix('$') {
                    let symbol = currency.split('-').next().unwrap_or_default();
                    out.push_str(symbol);
                } else if !token.is_empty()
                    && token
                        .chars()
                        .all(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's'))
                {
                    out.push_str(&token);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Drop quoted text, escaped characters and padding/fill directives.
fn strip_literals(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    let mut in_quotes = false;
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                in_quotes = false;
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            '\\' | '_' | '*' => {
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum NumToken {
    Literal(String),
    Digit(char),
    Dot,
    Comma,
    Percent,
    Exponent { always_sign: bool },
    Slash,
}

fn tokenize_number(section: &str) -> Vec<NumToken> {
    let mut tokens = Vec::new();
    let mut chars = section.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                let mut text = String::new();
                for next in chars.by_ref() {
                    if next == '"' {
                        break;
                    }
                    text.push(next);
                }
                tokens.push(NumToken::Literal(text));
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    tokens.push(NumToken::Literal(next.to_string()));
                }
            }
            '_' => {
                chars.next();
                tokens.push(NumToken::Literal(" ".to_string()));
            }
            '*' => {
                chars.next();
            }
            '0' | '#' | '?' => tokens.push(NumToken::Digit(ch)),
            '.' => tokens.push(NumToken::Dot),
            ',' => tokens.push(NumToken::Comma),
            '%' => tokens.push(NumToken::Percent),
            '/' => tokens.push(NumToken::Slash),
            'E' | 'e' if matches!(chars.peek(), Some('+' | '-')) => {
                let always_sign = chars.next() == Some('+');
                tokens.push(NumToken::Exponent { always_sign });
            }
            _ => tokens.push(NumToken::Literal(ch.to_string())),
        }
    }
    tokens
}

fn render_literals(tokens: &[NumToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            NumToken::Literal(text) => out.push_str(text),
            NumToken::Percent => out.push('%'),
            NumToken::Slash => out.push('/'),
            NumToken::Dot => out.push('.'),
            NumToken::Comma | NumToken::Digit(_) | NumToken::Exponent { .. } => {}
        }
    }
    out
}

fn format_number_pattern(section: &str, value: f64) -> String {
    let tokens = tokenize_number(section);

    // Fractions are not rendered; fall back to the general representation.
    if tokens.contains(&NumToken::Slash)
        && tokens.iter().any(|t| matches!(t, NumToken::Digit(_)))
    {
        return format_general(value);
    }

    let first_digit = tokens.iter().position(|t| matches!(t, NumToken::Digit(_)));
    let last_digit = tokens
        .iter()
        .rposition(|t| matches!(t, NumToken::Digit(_)));

    let (Some(first), Some(last)) = (first_digit, last_digit) else {
        // No placeholders: the section is pure text (e.g. an accounting zero "-").
        return render_literals(&tokens).trim().to_string();
    };

    let prefix = &tokens[..first];
    let core = &tokens[first..=last];
    let suffix = &tokens[last + 1..];

    let percent_count = tokens.iter().filter(|t| **t == NumToken::Percent).count();
    let scaling_commas = suffix
        .iter()
        .take_while(|t| **t == NumToken::Comma)
        .count();

    let mut number = value.abs();
    for _ in 0..percent_count {
        number *= 100.0;
    }
    for _ in 0..scaling_commas {
        number /= 1000.0;
    }

    let body = if let Some(exp_at) = core
        .iter()
        .position(|t| matches!(t, NumToken::Exponent { .. }))
    {
        format_scientific(&core[..exp_at], &core[exp_at..], number)
    } else {
        format_fixed(core, number)
    };

    let negative = value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&render_literals(prefix));
    out.push_str(&body);
    out.push_str(&render_literals(suffix));
    out
}

fn format_fixed(core: &[NumToken], number: f64) -> String {
    let dot_at = core.iter().position(|t| *t == NumToken::Dot);
    let (int_tokens, frac_tokens) = match dot_at {
        Some(idx) => (&core[..idx], &core[idx + 1..]),
        None => (core, &[][..]),
    };

    let min_int = int_tokens
        .iter()
        .filter(|t| **t == NumToken::Digit('0'))
        .count();
    let decimals = frac_tokens
        .iter()
        .filter(|t| matches!(t, NumToken::Digit(_)))
        .count();
    let required_decimals = frac_tokens
        .iter()
        .filter(|t| **t == NumToken::Digit('0'))
        .count();
    let use_separator = int_tokens.contains(&NumToken::Comma);

    let formatted = format!("{:.*}", decimals, round_half_away(number, decimals));
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), frac_part.to_string()),
        None => (formatted, String::new()),
    };

    let mut int_part = if int_part == "0" && min_int == 0 {
        String::new()
    } else {
        int_part
    };
    while int_part.len() < min_int {
        int_part.insert(0, '0');
    }
    if use_separator {
        int_part = format_with_thousands(&int_part);
    }

    let mut frac = frac_part;
    while frac.len() > required_decimals && frac.ends_with('0') {
        frac.pop();
    }

    let mut out = int_part;
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    } else if dot_at.is_some() && decimals == 0 {
        out.push('.');
    }
    out
}

/// Spreadsheet rounding is half away from zero; `format!` rounds half to even.
fn round_half_away(number: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (number * factor).round() / factor
}

fn format_scientific(mantissa: &[NumToken], exponent: &[NumToken], number: f64) -> String {
    let always_sign = matches!(
        exponent.first(),
        Some(NumToken::Exponent { always_sign: true })
    );
    let exp_digits = exponent
        .iter()
        .filter(|t| matches!(t, NumToken::Digit(_)))
        .count()
        .max(1);
    let decimals = mantissa
        .iter()
        .skip_while(|t| **t != NumToken::Dot)
        .filter(|t| matches!(t, NumToken::Digit(_)))
        .count();

    let mut exp = if number == 0.0 {
        0
    } else {
        number.log10().floor() as i32
    };
    let mut scaled = number / 10f64.powi(exp);
    let factor = 10f64.powi(decimals as i32);
    if (scaled * factor).round() / factor >= 10.0 {
        exp += 1;
        scaled /= 10.0;
    }

    let sign = if exp < 0 {
        "-"
    } else if always_sign {
        "+"
    } else {
        ""
    };
    format!(
        "{:.*}E{}{:0width$}",
        decimals,
        round_half_away(scaled, decimals),
        sign,
        exp.unsigned_abs(),
        width = exp_digits
    )
}

fn format_with_thousands(input: &str) -> String {
    let mut out = String::new();
    for (idx, ch) in input.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

#[derive(Debug, Clone, PartialEq)]
enum DateToken {
    Year(usize),
    Month(usize),
    MonthOrMinute(usize),
    Minute(usize),
    Day(usize),
    Hour(usize),
    Second(usize),
    SubSecond(usize),
    AmPm { short: bool },
    Literal(String),
}

impl DateToken {
    fn is_literal(&self) -> bool {
        matches!(self, DateToken::Literal(_))
    }
}

fn tokenize_date(section: &str) -> Vec<DateToken> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let lower = ch.to_ascii_lowercase();
        let run = chars[i..]
            .iter()
            .take_while(|c| c.to_ascii_lowercase() == lower)
            .count();

        let rest: String = chars[i..].iter().collect::<String>().to_ascii_lowercase();
        if rest.starts_with("am/pm") {
            tokens.push(DateToken::AmPm { short: false });
            i += 5;
            continue;
        }
        if rest.starts_with("a/p") {
            tokens.push(DateToken::AmPm { short: true });
            i += 3;
            continue;
        }

        match lower {
            'y' | 'e' => tokens.push(DateToken::Year(run)),
            'm' => tokens.push(DateToken::MonthOrMinute(run)),
            'd' => tokens.push(DateToken::Day(run)),
            'h' => tokens.push(DateToken::Hour(run)),
            's' => tokens.push(DateToken::Second(run)),
            '.' if matches!(tokens.last(), Some(DateToken::Second(_)))
                && chars.get(i + 1) == Some(&'0') =>
            {
                let zeros = chars[i + 1..].iter().take_while(|c| **c == '0').count();
                tokens.push(DateToken::SubSecond(zeros));
                i += 1 + zeros;
                continue;
            }
            '"' => {
                let text: String = chars[i + 1..].iter().take_while(|c| **c != '"').collect();
                i += text.chars().count() + 2;
                tokens.push(DateToken::Literal(text));
                continue;
            }
            '\\' => {
                if let Some(next) = chars.get(i + 1) {
                    tokens.push(DateToken::Literal(next.to_string()));
                }
                i += 2;
                continue;
            }
            '_' => {
                tokens.push(DateToken::Literal(" ".to_string()));
                i += 2;
                continue;
            }
            '*' => {
                i += 2;
                continue;
            }
            _ => {
                tokens.push(DateToken::Literal(ch.to_string()));
                i += 1;
                continue;
            }
        }
        i += run;
    }

    resolve_minutes(&mut tokens);
    tokens
}

/// `m` means minutes right after an hour token or right before a seconds token.
fn resolve_minutes(tokens: &mut [DateToken]) {
    for idx in 0..tokens.len() {
        let DateToken::MonthOrMinute(len) = tokens[idx] else {
            continue;
        };
        let previous = tokens[..idx].iter().rev().find(|t| !t.is_literal());
        let next = tokens[idx + 1..].iter().find(|t| !t.is_literal());
        let is_minute = matches!(previous, Some(DateToken::Hour(_)))
            || matches!(next, Some(DateToken::Second(_)));
        tokens[idx] = if is_minute {
            DateToken::Minute(len)
        } else {
            DateToken::Month(len)
        };
    }
}

fn format_date_pattern(section: &str, value: f64) -> String {
    let tokens = tokenize_date(section);
    let sub_digits = tokens
        .iter()
        .find_map(|t| match t {
            DateToken::SubSecond(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(0);
    let Some(dt) = serial_to_datetime(value, sub_digits) else {
        return format_general(value);
    };
    let twelve_hour = tokens.iter().any(|t| matches!(t, DateToken::AmPm { .. }));

    let mut out = String::new();
    for token in &tokens {
        match token {
            DateToken::Year(n) if *n <= 2 => out.push_str(&format!("{:02}", dt.year() % 100)),
            DateToken::Year(_) => out.push_str(&format!("{:04}", dt.year())),
            DateToken::Month(n) | DateToken::MonthOrMinute(n) => {
                let name = MONTH_NAMES[dt.month0() as usize];
                match *n {
                    1 => out.push_str(&dt.month().to_string()),
                    2 => out.push_str(&format!("{:02}", dt.month())),
                    3 => out.push_str(&name[..3]),
                    4 => out.push_str(name),
                    _ => out.push_str(&name[..1]),
                }
            }
            DateToken::Minute(n) => push_padded(&mut out, dt.minute(), *n),
            DateToken::Day(n) => {
                let name = WEEKDAY_NAMES[dt.weekday().num_days_from_monday() as usize];
                match *n {
                    1 => out.push_str(&dt.day().to_string()),
                    2 => out.push_str(&format!("{:02}", dt.day())),
                    3 => out.push_str(&name[..3]),
                    _ => out.push_str(name),
                }
            }
            DateToken::Hour(n) => {
                let hour = if twelve_hour {
                    (dt.hour() + 11) % 12 + 1
                } else {
                    dt.hour()
                };
                push_padded(&mut out, hour, *n);
            }
            DateToken::Second(n) => push_padded(&mut out, dt.second(), *n),
            DateToken::SubSecond(n) => {
                let millis = format!("{:03}", dt.nanosecond() / 1_000_000);
                out.push('.');
                out.push_str(&millis[..(*n).min(3)]);
            }
            DateToken::AmPm { short } => {
                let pm = dt.hour() >= 12;
                out.push_str(match (pm, *short) {
                    (false, false) => "AM",
                    (true, false) => "PM",
                    (false, true) => "A",
                    (true, true) => "P",
                });
            }
            DateToken::Literal(text) => out.push_str(text),
        }
    }
    out
}

fn push_padded(out: &mut String, value: u32, width: usize) {
    if width >= 2 {
        out.push_str(&format!("{value:02}"));
    } else {
        out.push_str(&value.to_string());
    }
}

/// Convert a 1900-system serial into a calendar timestamp. Serials below 61
/// precede the phantom 1900-02-29 and use a shifted epoch.
fn serial_to_datetime(serial: f64, sub_second_digits: usize) -> Option<NaiveDateTime> {
    if !(0.0..MAX_DATE_SERIAL).contains(&serial) {
        return None;
    }

    let mut days = serial.trunc() as i64;
    let mut millis = ((serial - serial.trunc()) * 86_400_000.0).round() as i64;
    if sub_second_digits == 0 {
        millis = (millis + 500) / 1000 * 1000;
    }
    if millis >= 86_400_000 {
        days += 1;
        millis -= 86_400_000;
    }

    let epoch = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let date = epoch.checked_add_signed(TimeDelta::try_days(days)?)?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_basic_number() {
        assert_eq!(format_raw_cell_contents(1234.5, 4, "#,##0.00"), "1,234.50");
        assert_eq!(format_raw_cell_contents(1234.5, 3, "#,##0"), "1,235");
        assert_eq!(format_raw_cell_contents(5.0, 0, "000"), "005");
    }

    #[test]
    fn test_format_negative_section() {
        assert_eq!(format_raw_cell_contents(-12.3, 0, "0.0;-0.0"), "-12.3");
        assert_eq!(format_raw_cell_contents(-12.3, 0, "0.0;(0.0)"), "(12.3)");
        assert_eq!(format_raw_cell_contents(-12.3, 0, "0.0"), "-12.3");
    }

    #[test]
    fn test_format_zero_section() {
        assert_eq!(format_raw_cell_contents(0.0, 0, "0.0;-0.0;\"zero\""), "zero");
    }

    #[test]
    fn test_format_colour_tokens_are_ignored() {
        assert_eq!(format_raw_cell_contents(-1.0, 0, "0.0;[Red]-0.0"), "-1.0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_raw_cell_contents(0.25, 9, "0%"), "25%");
        assert_eq!(format_raw_cell_contents(0.125, 10, "0.00%"), "12.50%");
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_raw_cell_contents(12345.0, 11, "0.00E+00"), "1.23E+04");
        assert_eq!(format_raw_cell_contents(0.00012, 11, "0.00E+00"), "1.20E-04");
    }

    #[test]
    fn test_format_currency_literals() {
        assert_eq!(format_raw_cell_contents(5.5, 0, "\"$\"0.00"), "$5.50");
        assert_eq!(format_raw_cell_contents(5.5, 0, "[$€-407]0.00"), "€5.50");
    }

    #[test]
    fn test_format_accounting_padding() {
        let out = format_raw_cell_contents(1234.5, 43, "");
        assert_eq!(out.trim(), "1,234.50");
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_raw_cell_contents(30.0, 0, "General"), "30");
        assert_eq!(format_raw_cell_contents(1.5, 0, "General"), "1.5");
        assert_eq!(format_raw_cell_contents(0.1 + 0.2, 0, "General"), "0.3");
        assert_eq!(format_raw_cell_contents(-4.0, 0, ""), "-4");
        assert_eq!(format_raw_cell_contents(7.0, 49, "@"), "7");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_raw_cell_contents(44562.0, 14, "mm/dd/yyyy"), "01/01/2022");
        assert_eq!(format_raw_cell_contents(32994.0, 164, "yyyy-mm-dd"), "1990-05-01");
        assert_eq!(format_raw_cell_contents(32994.0, 14, ""), "5/1/90");
        assert_eq!(format_raw_cell_contents(32994.0, 15, ""), "1-May-90");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_raw_cell_contents(0.5, 20, "h:mm"), "12:00");
        assert_eq!(format_raw_cell_contents(0.75, 18, ""), "6:00 PM");
        assert_eq!(format_raw_cell_contents(0.5 + 90.0 / 86_400.0, 45, ""), "01:30");
    }

    #[test]
    fn test_format_date_out_of_range_falls_back() {
        assert_eq!(format_raw_cell_contents(-3.0, 14, "m/d/yy"), "-3");
    }

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("h:mm AM/PM"));
        assert!(is_date_format("[h]:mm:ss"));
        assert!(!is_date_format("General"));
        assert!(!is_date_format("#,##0.00"));
        assert!(!is_date_format("0.00E+00"));
        assert!(!is_date_format("0.0 \"days\""));
    }
}
