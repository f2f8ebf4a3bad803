//! Item name and SKU normalization.

/// Collapses whitespace and title-cases each word: `"  sodium   CHLORIDE "`
/// becomes `"Sodium Chloride"`.
#[must_use]
pub fn normalize_item_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Case-insensitive comparison key for item names.
#[must_use]
pub fn name_key(name: &str) -> String {
    normalize_item_name(name).to_lowercase()
}

/// Trims a SKU; blank SKUs become `None`.
#[must_use]
pub fn normalize_sku(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|sku| !sku.is_empty())
        .map(str::to_uppercase)
}
