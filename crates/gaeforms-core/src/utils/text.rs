//! String helpers for labels and HTML output.

/// Title-cases a string: the first letter of every alphabetic run is
/// upper-cased and the rest of the run lower-cased.
///
/// Any non-letter (space, digit, punctuation) starts a new run.
///
/// # Examples
///
/// ```
/// use gaeforms_core::utils::text::title_case;
///
/// assert_eq!(title_case("is admin"), "Is Admin");
/// assert_eq!(title_case("HTTP status"), "Http Status");
/// assert_eq!(title_case("geo2pt"), "Geo2Pt");
/// ```
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

/// Derives a default label from a property name: underscores become spaces
/// and the result is title-cased.
///
/// # Examples
///
/// ```
/// use gaeforms_core::utils::text::label_from_name;
///
/// assert_eq!(label_from_name("prop_date_time"), "Prop Date Time");
/// assert_eq!(label_from_name("city"), "City");
/// ```
pub fn label_from_name(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entity equivalents.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
