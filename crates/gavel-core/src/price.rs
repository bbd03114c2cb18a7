// Display formatting for prices held in lakhs (100 lakhs = 1 crore).

/// Long form: `₹2 Cr`, `₹1.50 Cr`, `₹75 L`.
pub fn format_price(lakhs: u32) -> String {
    if lakhs >= 100 {
        if lakhs % 100 == 0 {
            format!("₹{} Cr", lakhs / 100)
        } else {
            format!("₹{:.2} Cr", lakhs as f64 / 100.0)
        }
    } else {
        format!("₹{lakhs} L")
    }
}

/// Compact form for tables: `2.0Cr`, `1.5Cr`, `75L`.
pub fn format_price_short(lakhs: u32) -> String {
    if lakhs >= 100 {
        format!("{:.1}Cr", lakhs as f64 / 100.0)
    } else {
        format!("{lakhs}L")
    }
}
