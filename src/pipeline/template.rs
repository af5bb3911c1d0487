use std::collections::BTreeMap;

use url::Url;

use super::types::{RequestSpec, RequestTemplate};
use crate::error::HttpError;

/// Variables for one iteration: plan vars overlaid with the built-ins.
#[must_use]
pub fn iteration_vars(
    plan_vars: &BTreeMap<String, String>,
    worker: usize,
    seq: u64,
    step_index: usize,
) -> BTreeMap<String, String> {
    let mut vars = plan_vars.clone();
    let now_ms = chrono::Utc::now().timestamp_millis();
    vars.insert("seq".to_owned(), seq.to_string());
    vars.insert("worker".to_owned(), worker.to_string());
    vars.insert("step".to_owned(), step_index.saturating_add(1).to_string());
    vars.insert("timestamp_ms".to_owned(), now_ms.to_string());
    vars.insert(
        "timestamp_s".to_owned(),
        now_ms.checked_div(1000).unwrap_or(0).to_string(),
    );
    vars
}

/// Replace `{{key}}` with its value. Unknown keys stay in place, trimmed.
#[must_use]
pub fn render_template(input: &str, vars: &BTreeMap<String, String>) -> String {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = after_start.strip_prefix("{{") else {
            output.push_str(after_start);
            break;
        };
        let Some(end) = after.find("}}") else {
            output.push_str("{{");
            output.push_str(after);
            break;
        };
        let (key_part, after_end) = after.split_at(end);
        let key = key_part.trim();
        if let Some(value) = vars.get(key) {
            output.push_str(value);
        } else {
            output.push_str("{{");
            output.push_str(key);
            output.push_str("}}");
        }
        rest = match after_end.strip_prefix("}}") {
            Some(remaining) => remaining,
            None => {
                output.push_str(after_end);
                break;
            }
        };
    }

    output
}

/// Render a request template into something the executor can send.
///
/// # Errors
///
/// Returns an error when neither `url` nor `path` is set, when a relative
/// path has no base URL, or when the rendered URL does not parse.
pub fn materialize(
    template: &RequestTemplate,
    base_url: Option<&str>,
    vars: &BTreeMap<String, String>,
) -> Result<RequestSpec, HttpError> {
    let url = resolve_url(template, base_url, vars)?;
    let headers = template
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), render_template(value, vars)))
        .collect();
    let body = template.body.as_deref().map(|body| render_template(body, vars));

    Ok(RequestSpec {
        method: template.method,
        url,
        headers,
        body,
    })
}

fn resolve_url(
    template: &RequestTemplate,
    base_url: Option<&str>,
    vars: &BTreeMap<String, String>,
) -> Result<Url, HttpError> {
    if let Some(url) = template.url.as_ref() {
        let rendered = render_template(url, vars);
        return Url::parse(&rendered).map_err(|source| HttpError::InvalidUrl {
            url: rendered,
            source,
        });
    }

    let path = template.path.as_ref().ok_or(HttpError::MissingUrlOrPath)?;
    let base_url = base_url.ok_or(HttpError::BaseUrlRequired)?;
    let rendered_base = render_template(base_url, vars);
    let base = Url::parse(&rendered_base).map_err(|source| HttpError::InvalidUrl {
        url: rendered_base,
        source,
    })?;
    let rendered_path = render_template(path, vars);
    base.join(&rendered_path)
        .map_err(|source| HttpError::InvalidUrl {
            url: rendered_path,
            source,
        })
}
