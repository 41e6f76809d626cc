use std::collections::BTreeMap;

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Serialize attributes as ` key="value"` pairs in key order.
pub fn attributes_to_string(attributes: &BTreeMap<String, String>) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_html(value)))
        .collect()
}
