/// Trim `text` and escape angle brackets so no markup reaches the synthesizer.
///
/// `<` becomes `&lt;` and `>` becomes `&gt;`. Nothing else is escaped, so
/// sanitizing twice gives the same result as sanitizing once.
///
/// ```
/// assert_eq!(speech_core::sanitize_text("  <b>hi</b> "), "&lt;b&gt;hi&lt;/b&gt;");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let text = text.trim();
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}
