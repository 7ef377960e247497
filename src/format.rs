use rust_decimal::{Decimal, RoundingStrategy};

/// How amounts are rendered in human-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountStyle {
    /// Rounding precision (half away from zero); output always has exactly
    /// this many decimal places.
    pub decimals: u32,
    /// Inserted between groups of three integer digits. Empty disables grouping.
    pub grouping_separator: String,
    /// Wrap values in `*...*` for chat markdown.
    pub markdown: bool,
}

impl Default for AmountStyle {
    fn default() -> Self {
        Self {
            decimals: 1,
            grouping_separator: " ".to_string(),
            markdown: true,
        }
    }
}

impl AmountStyle {
    pub fn plain() -> Self {
        Self {
            markdown: false,
            ..Self::default()
        }
    }
}

fn group_int_digits(int_part: &str, separator: &str) -> String {
    if separator.is_empty() {
        return int_part.to_string();
    }
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3 * separator.len());
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push_str(separator);
        }
    }
    out
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if dp == 0 {
        return int_part.to_string();
    }

    let mut frac: String = frac_part.chars().take(dp as usize).collect();
    while frac.len() < dp as usize {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}

/// Round and render a magnitude without sign or markdown.
fn format_magnitude(value: Decimal, style: &AmountStyle) -> String {
    let rounded = value
        .abs()
        .round_dp_with_strategy(style.decimals, RoundingStrategy::MidpointAwayFromZero);
    let fixed = pad_fraction_to_dp(&rounded.normalize().to_string(), style.decimals);
    match fixed.split_once('.') {
        Some((int_part, frac)) => format!(
            "{}.{frac}",
            group_int_digits(int_part, &style.grouping_separator)
        ),
        None => group_int_digits(&fixed, &style.grouping_separator),
    }
}

fn emphasize(s: &str, style: &AmountStyle) -> String {
    if style.markdown {
        format!("*{s}*")
    } else {
        s.to_string()
    }
}

/// Render a monetary value, e.g. `*10 000.0*`.
pub fn format_amount(value: Decimal, style: &AmountStyle) -> String {
    let rounded = value.round_dp_with_strategy(style.decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let magnitude = format_magnitude(value, style);
    if negative {
        emphasize(&format!("-{magnitude}"), style)
    } else {
        emphasize(&magnitude, style)
    }
}

/// Render a signed change, e.g. `(+*3 000.0*)`. Exactly zero renders as nothing.
pub fn format_delta(delta: Decimal, style: &AmountStyle) -> Option<String> {
    if delta.is_zero() {
        return None;
    }
    let sign = if delta.is_sign_negative() { '-' } else { '+' };
    Some(format!(
        "({sign}{})",
        emphasize(&format_magnitude(delta, style), style)
    ))
}

/// Render a plain number with exactly `dp` decimals and no grouping (e.g. percentages).
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let body = pad_fraction_to_dp(&rounded.abs().normalize().to_string(), dp);
    if negative {
        format!("-{body}")
    } else {
        body
    }
}
