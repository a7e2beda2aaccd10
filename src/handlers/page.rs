//! HTML rendering for the feedback page.
//!
//! The page is a static template with `{{name}}` slots filled in one pass, so
//! submitted text can never introduce further slots.

use std::fmt::Write;

use crate::analysis::FeedbackAnalysis;
use crate::intake::{FeedbackForm, SubmissionOutcome};

const TEMPLATE: &str = include_str!("index.html");

/// The form with no values and no status.
pub fn render_form() -> String {
    render(&FeedbackForm::default(), String::new(), String::new())
}

/// The page after a submission.
pub fn render_outcome(form: &FeedbackForm, outcome: &SubmissionOutcome) -> String {
    let message = outcome.message();
    match outcome {
        SubmissionOutcome::Rejected { .. } => {
            render(form, status_block("error", &message), String::new())
        }
        SubmissionOutcome::Stored {
            stored, analysis, ..
        } => {
            let reference = stored.feedback_id.to_string();
            render(
                &FeedbackForm::default(),
                status_block("success", &message),
                analysis_block(analysis, &reference),
            )
        }
        SubmissionOutcome::StorageFailed { feedback_id, .. } => {
            let status = format!(
                "{}\n  <p class=\"reference\">Reference: {}</p>",
                status_block("error", &message),
                feedback_id
            );
            render(form, status, String::new())
        }
    }
}

fn render(form: &FeedbackForm, status: String, analysis: String) -> String {
    fill(TEMPLATE, |slot| match slot {
        "status" => Some(status.clone()),
        "analysis" => Some(analysis.clone()),
        "customer_name" => Some(escape_html(&form.customer_name)),
        "product_name" => Some(escape_html(&form.product_name)),
        "feedback_text" => Some(escape_html(&form.feedback_text)),
        _ => None,
    })
}

fn status_block(class: &str, message: &str) -> String {
    format!(
        "<p class=\"status {class}\" role=\"status\">{}</p>",
        escape_html(message)
    )
}

fn analysis_block(analysis: &FeedbackAnalysis, reference: &str) -> String {
    let mut html = String::from("<section class=\"analysis\">\n    <h2>Analysis</h2>\n    <dl>\n");

    let _ = writeln!(
        html,
        "      <dt>Summary</dt><dd>{}</dd>",
        escape_html(&analysis.summary)
    );

    html.push_str("      <dt>Issues</dt><dd>");
    if analysis.issues.is_empty() {
        html.push_str("None reported");
    } else {
        html.push_str("<ul>");
        for issue in &analysis.issues {
            let _ = write!(html, "<li>{}</li>", escape_html(issue));
        }
        html.push_str("</ul>");
    }
    html.push_str("</dd>\n");

    let _ = writeln!(
        html,
        "      <dt>Sentiment</dt><dd>{}</dd>",
        analysis.sentiment
    );
    let _ = write!(
        html,
        "    </dl>\n    <p class=\"reference\">Reference: {}</p>\n  </section>",
        escape_html(reference)
    );

    html
}

/// Replace every `{{slot}}` in `template` with `lookup(slot)`; unknown slots
/// are kept verbatim.
fn fill(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let slot = &after[..end];
                match lookup(slot) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("{{");
                        out.push_str(slot);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
