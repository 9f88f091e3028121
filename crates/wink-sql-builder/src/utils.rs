//! Identifier and fragment helpers shared by every builder.

/// Quotes an identifier with backticks, doubling embedded backticks.
///
/// An empty name renders as an empty string so optional parts can be passed
/// straight through.
#[must_use]
pub fn secure_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    format!("`{}`", name.replace('`', "``"))
}

/// Joins the non-empty fragments with `separator`.
#[must_use]
pub fn concat_sql<I, S>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref().trim();
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(part);
    }
    out
}

/// Converts `camelCase` or `PascalCase` to `snake_case`.
///
/// ```
/// use wink_sql_builder::utils::camel_to_underline;
///
/// assert_eq!(camel_to_underline("createDate"), "create_date");
/// assert_eq!(camel_to_underline("UpdateDate"), "update_date");
/// ```
#[must_use]
pub fn camel_to_underline(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Converts `snake_case` to `camelCase`.
#[must_use]
pub fn underline_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' && !out.is_empty() {
            upper = true;
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Splits `"expr as alias"` or `"expr alias"` into the expression and its alias.
#[must_use]
pub fn parse_alias_expression(express: &str) -> (&str, Option<&str>) {
    let express = express.trim();
    let lower = express.to_ascii_lowercase();
    if let Some(pos) = lower.rfind(" as ") {
        let alias = express[pos + 4..].trim();
        return (express[..pos].trim(), (!alias.is_empty()).then_some(alias));
    }
    // A bare alias only follows a plain identifier, never a function call.
    if !express.contains('(') {
        if let Some((name, alias)) = express.split_once(char::is_whitespace) {
            let alias = alias.trim();
            return (name, (!alias.is_empty()).then_some(alias));
        }
    }
    (express, None)
}
