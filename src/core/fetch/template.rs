//! `{param}` URL templating
//!
//! Templates carry named placeholders in braces; `{{` and `}}` stand for
//! literal braces. Only one parameter is bound per render, so any other
//! placeholder is an error.

use crate::domain::FetchError;

/// Substitute `value` for every `{param}` placeholder in `template`
///
/// # Errors
///
/// Returns [`FetchError::MissingTemplateParameter`] when the template names a
/// placeholder other than `param`, or has an unterminated `{`.
///
/// # Example
///
/// ```
/// use data_retriever::core::fetch::render_template;
///
/// let url = render_template("/getSeries?Collection={collection_id}", "collection_id", "ICDC-Glioma").unwrap();
/// assert_eq!(url, "/getSeries?Collection=ICDC-Glioma");
/// ```
pub fn render_template(template: &str, param: &str, value: &str) -> Result<String, FetchError> {
    let mut rendered = String::with_capacity(template.len() + value.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                rendered.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                rendered.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed || name != param {
                    return Err(FetchError::MissingTemplateParameter {
                        template: template.to_string(),
                        parameter: name,
                    });
                }
                rendered.push_str(value);
            }
            _ => rendered.push(c),
        }
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_every_occurrence() {
        let url = render_template("/a/{id}/b/{id}", "id", "42").unwrap();
        assert_eq!(url, "/a/42/b/42");
    }

    #[test]
    fn test_template_without_placeholder() {
        assert_eq!(render_template("/static", "id", "42").unwrap(), "/static");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            render_template("/q?f={{\"x\"}}&c={id}", "id", "7").unwrap(),
            "/q?f={\"x\"}&c=7"
        );
    }

    #[test]
    fn test_unknown_placeholder_is_error() {
        let err =
            render_template("/series?Collection={collection}", "collection_id", "x").unwrap_err();
        match err {
            FetchError::MissingTemplateParameter { parameter, .. } => {
                assert_eq!(parameter, "collection")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_placeholder_is_error() {
        assert!(render_template("/series/{collection_id", "collection_id", "x").is_err());
    }
}
