//! Number formatting for tooltips, KPIs, tables and axis labels.

/// Thousands separators, at most two decimals, trailing zeros dropped: `1,234.5`.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let cents = (v.abs() * 100.0).round() as u64;
    let (int, frac) = (cents / 100, cents % 100);
    let mut out = String::new();
    if v < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(int));
    if frac > 0 {
        let decimals = format!("{:02}", frac);
        out.push('.');
        out.push_str(decimals.trim_end_matches('0'));
    }
    out
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `+4` / `-4`; zero is `+0`.
pub fn format_signed(v: f64) -> String {
    if v < 0.0 {
        format_number(v)
    } else {
        format!("+{}", format_number(v))
    }
}

/// One decimal place: `12.5%`.
pub fn format_percent(p: f64) -> String {
    format!("{:.1}%", p)
}

/// `+12.5%` / `-50.0%`.
pub fn format_signed_percent(p: f64) -> String {
    if p < 0.0 {
        format!("{:.1}%", p)
    } else {
        format!("+{:.1}%", p)
    }
}

/// `2008–2024`, or just the year when the extent is a single year.
pub fn format_year_range(extent: Option<(i32, i32)>) -> String {
    match extent {
        Some((lo, hi)) if lo == hi => lo.to_string(),
        Some((lo, hi)) => format!("{}–{}", lo, hi),
        None => "all years".to_string(),
    }
}

/// Axis tick labels: compact suffixes above ten thousand, otherwise [`format_number`].
pub fn format_tick(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000.0 {
        format!("{}M", trim_decimal(v / 1_000_000.0))
    } else if abs >= 10_000.0 {
        format!("{}k", trim_decimal(v / 1_000.0))
    } else {
        format_number(v)
    }
}

fn trim_decimal(v: f64) -> String {
    let s = format!("{:.1}", v);
    s.strip_suffix(".0").map(String::from).unwrap_or(s)
}
