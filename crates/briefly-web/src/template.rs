use axum::response::Html;

use briefly_core::{WORD_LENGTH_DEFAULT, WORD_LENGTH_MAX, WORD_LENGTH_MIN, WORD_LENGTH_STEP};

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Render the index page with the slider domain and model name filled in.
pub fn render_index(model: &str) -> Html<String> {
    let html = INDEX_HTML
        .replace("{{ word_min }}", &WORD_LENGTH_MIN.to_string())
        .replace("{{ word_max }}", &WORD_LENGTH_MAX.to_string())
        .replace("{{ word_step }}", &WORD_LENGTH_STEP.to_string())
        .replace("{{ word_default }}", &WORD_LENGTH_DEFAULT.to_string())
        .replace("{{ model }}", &escape_html(model));
    Html(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
