//! `clean_idc_metadata`: flatten HTML descriptions to plain text

use super::{PostProcessContext, PostProcessor};
use html2text::render::text_renderer::TrivialDecorator;
use serde_json::Value;

/// Field rewritten by [`CleanIdcMetadata`]
pub const DESCRIPTION_FIELD: &str = "description";

/// Rewrites the `description` of each record from HTML to plain text
#[derive(Debug, Default, Clone, Copy)]
pub struct CleanIdcMetadata;

impl PostProcessor for CleanIdcMetadata {
    fn name(&self) -> &'static str {
        "clean_idc_metadata"
    }

    fn apply(&self, metadata: Value, _context: &PostProcessContext<'_>) -> Value {
        match metadata {
            Value::Array(records) => Value::Array(records.into_iter().map(clean_record).collect()),
            record => clean_record(record),
        }
    }
}

fn clean_record(record: Value) -> Value {
    let Value::Object(mut fields) = record else {
        return record;
    };

    match fields.get(DESCRIPTION_FIELD) {
        Some(Value::String(html)) => {
            let text = html_to_text(html);
            fields.insert(DESCRIPTION_FIELD.to_string(), Value::String(text));
            tracing::debug!("Transformed HTML in 'description' field of metadata");
        }
        Some(_) => {}
        None => tracing::warn!("'description' key not found in metadata"),
    }
    Value::Object(fields)
}

/// Wide enough that html2text never wraps a line
const RENDER_WIDTH: usize = 10_000;

/// Convert an HTML fragment to a single line of plain text
///
/// Links and emphasis render as their bare text, block elements become word
/// breaks and every whitespace run collapses to one space. Input the parser
/// rejects is kept as-is apart from the whitespace collapse.
pub fn html_to_text(html: &str) -> String {
    let rendered = html2text::config::with_decorator(TrivialDecorator::new())
        .string_from_read(html.as_bytes(), RENDER_WIDTH);

    match rendered {
        Ok(text) => collapse_whitespace(&text),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse HTML description, keeping raw text");
            collapse_whitespace(html)
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
