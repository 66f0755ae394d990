/// Short display form for currency amounts: `999`, `1.5K`, `12.0M`.
pub fn format_amount(amount: f64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

    if !amount.is_finite() {
        return "0".to_string();
    }
    if amount < 1000.0 {
        return format!("{}", amount.floor() as i64);
    }

    let magnitude = ((amount.log10() / 3.0).floor() as usize).min(SUFFIXES.len() - 1);
    let scaled = amount / 1000f64.powi(magnitude as i32);
    format!("{:.1}{}", scaled, SUFFIXES[magnitude])
}
