/// Placeholder substituted with the stock symbol in a chart URL template
pub const SYMBOL_TOKEN: &str = "{symbol}";

/// Build the chart URL for a stock symbol
///
/// The symbol is trimmed and percent-encoded before substitution. A template
/// without `{symbol}` gets the symbol appended.
pub fn chart_url(template: &str, symbol: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(symbol.trim().as_bytes()).collect();
    if template.contains(SYMBOL_TOKEN) {
        template.replace(SYMBOL_TOKEN, &encoded)
    } else {
        format!("{}{}", template, encoded)
    }
}
