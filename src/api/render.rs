//! HTML fragments returned by the generate endpoint

use std::fmt::Write;

use crate::pipeline::PipelineOutcome;

/// Escape text for use in HTML element content and quoted attributes
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Download file name: the deck name with every non-alphanumeric replaced by `_`
#[must_use]
pub fn download_name(deck_name: &str) -> String {
    let stem: String = deck_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}.apkg")
}

/// Red error paragraph
#[must_use]
pub fn error_fragment(message: &str) -> String {
    format!(r#"<p style="color: red;">{}</p>"#, escape(message))
}

/// Summary of a finished request with card previews and a download link
#[must_use]
pub fn success_fragment(outcome: &PipelineOutcome, source_file: Option<&str>) -> String {
    let build = &outcome.build;
    let id = outcome.request_id;
    let deck = escape(&build.deck_name);

    let mut html = String::new();
    html.push_str("<div class=\"success-message\">\n<h3>Success!</h3>\n");
    let _ = writeln!(
        html,
        "<p>Generated {} cards for \"{deck}\"</p>",
        build.cards.len()
    );

    if let Some(name) = source_file {
        let _ = writeln!(html, r#"<p style="color: #2196F3;">From file: {}</p>"#, escape(name));
    }
    if !build.failed.is_empty() {
        let _ = writeln!(
            html,
            r#"<p style="color: #ff9800;">Failed: {}</p>"#,
            escape(&build.failed.join(", "))
        );
    }
    if !build.degraded.is_empty() {
        let _ = writeln!(
            html,
            r#"<p style="color: #ff9800;">Missing definition or example: {}</p>"#,
            escape(&build.degraded.join(", "))
        );
    }
    if !outcome.package.missing_media.is_empty() {
        let _ = writeln!(
            html,
            r#"<p style="color: #ff9800;">Audio missing from deck: {}</p>"#,
            escape(&outcome.package.missing_media.join(", "))
        );
    }

    html.push_str("<div class=\"card-previews\">\n");
    for card in &build.cards {
        let _ = writeln!(
            html,
            "<div class=\"card-preview\">\
             <h4>{word} <small>{pos}</small></h4>\
             <div class=\"pronunciation\">{pron}</div>\
             <audio controls src=\"/audio/{id}/{word_audio}\"></audio>\
             <p><strong>Definition:</strong> {def}</p>\
             <audio controls src=\"/audio/{id}/{def_audio}\"></audio>\
             <p><strong>Example:</strong> <em>{ex}</em></p>\
             <audio controls src=\"/audio/{id}/{ex_audio}\"></audio>\
             </div>",
            word = escape(&card.word),
            pos = escape(&card.part_of_speech),
            pron = escape(&card.pronunciation),
            def = escape(&card.definition),
            ex = escape(&card.example),
            word_audio = urlencoding::encode(&card.audio.word),
            def_audio = urlencoding::encode(&card.audio.definition),
            ex_audio = urlencoding::encode(&card.audio.example),
        );
    }
    html.push_str("</div>\n");

    let _ = write!(
        html,
        "<div class=\"download-section\">\n\
         <a class=\"download-btn\" href=\"/output/{id}\" download=\"{}\">Download Anki Deck</a>\n\
         </div>\n</div>",
        escape(&download_name(&build.deck_name))
    );

    html
}
