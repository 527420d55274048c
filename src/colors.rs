/// A named heading colour; `value` of `None` restores the page's own colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    pub name: &'static str,
    pub value: Option<&'static str>,
}

pub const PREDEFINED_COLORS: &[ColorOption] = &[
    ColorOption { name: "Red", value: Some("#ff0000") },
    ColorOption { name: "Blue", value: Some("#0066ff") },
    ColorOption { name: "Green", value: Some("#00aa00") },
    ColorOption { name: "Purple", value: Some("#8b00ff") },
    ColorOption { name: "Orange", value: Some("#ff6600") },
    ColorOption { name: "Pink", value: Some("#ff00aa") },
    ColorOption { name: "Restore", value: None },
];

pub fn find_color_by_name(name: &str) -> Option<&'static ColorOption> {
    PREDEFINED_COLORS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Resolves a requested colour: predefined names map to their value,
/// anything else (hex, CSS keywords) passes through untouched.
pub fn resolve_color(requested: Option<&str>) -> Option<String> {
    let requested = requested.map(str::trim).filter(|c| !c.is_empty())?;
    match find_color_by_name(requested) {
        Some(option) => option.value.map(|v| v.to_string()),
        None => Some(requested.to_string()),
    }
}
