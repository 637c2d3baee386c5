//! Name conversions shared by the synthesizer and compiler.

/// Converts `snake_case` to `CamelCase` (`goto_line` becomes `GotoLine`).
#[must_use]
pub fn camelize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// Converts `CamelCase` to `snake_case` (`CmdManager` becomes `cmd_manager`).
#[must_use]
pub fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c);
        }
    }
    out
}

/// Human label for an identifier (`cmd_manager` becomes `Cmd manager`).
#[must_use]
pub fn humanize(name: &str) -> String {
    let spaced = underscore(name).replace('_', " ");
    capitalize(spaced.trim())
}

/// Title-cases each underscore-separated word (`line_number` becomes `Line Number`).
#[must_use]
pub fn titleize(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes embedded whitespace so a title can be used as a type name.
#[must_use]
pub fn strip_spaces(title: &str) -> String {
    title.chars().filter(|c| !c.is_whitespace()).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
