use axum::response::Html;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Escapes text for use inside HTML element content and quoted attributes.
/// Braces are escaped too since pages are filled by placeholder replacement.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            // keeps user text from matching a later `{placeholder}`
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps page content in the shared layout. `content` is inserted verbatim,
/// flashes are escaped here.
pub fn layout(title: &str, flashes: &[String], content: &str) -> Html<String> {
    let flash_items: String = flashes
        .iter()
        .map(|msg| include_res!(str, "/pages/flash.html").replace("{message}", &escape(msg)))
        .collect();

    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &escape(title))
            .replace("{flashes}", &flash_items)
            .replace("{content}", content),
    )
}

/// Renders `(field, message)` pairs for one field as a list, or nothing.
pub fn field_errors(errors: &[(&'static str, String)], field: &str) -> String {
    let items: String = errors
        .iter()
        .filter(|(f, _)| *f == field)
        .map(|(_, msg)| format!("<li>{}</li>", escape(msg)))
        .collect();

    if items.is_empty() {
        items
    } else {
        format!(r#"<ul class="errors">{items}</ul>"#)
    }
}
