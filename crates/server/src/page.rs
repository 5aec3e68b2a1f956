//! HTML rendering of the prediction form

use pollutant_lib::models::{result_heading, InputBounds, RawInput};
use pollutant_lib::predictor::Prediction;
use std::fmt::Write;

pub const TITLE: &str = "Water pollutants prediction";
pub const DESCRIPTION: &str = "Predict water pollutants based on year, month and station id.";

/// What to show below the form
pub enum Outcome<'a> {
    Prediction(&'a Prediction),
    Error(&'a str),
}

/// Text shown in the three inputs, kept as submitted so a rejected value
/// is echoed back rather than replaced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub year: String,
    pub month: String,
    pub station_id: String,
}

impl From<&RawInput> for FormValues {
    fn from(input: &RawInput) -> Self {
        Self {
            year: input.year.to_string(),
            month: input.month.to_string(),
            station_id: input.station_id.to_string(),
        }
    }
}

/// Render the whole page; `values` pre-fills the three inputs
pub fn render(bounds: &InputBounds, values: &FormValues, outcome: Option<Outcome<'_>>) -> String {
    let mut html = String::with_capacity(2048);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", TITLE);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", TITLE);
    let _ = writeln!(html, "<p>{}</p>", DESCRIPTION);

    html.push_str("<form method=\"post\" action=\"/predict\">\n");
    number_input(
        &mut html,
        "year",
        "Enter year:",
        bounds.year_min as i64,
        bounds.year_max as i64,
        &values.year,
    );
    number_input(
        &mut html,
        "month",
        "Enter month:",
        bounds.month_min as i64,
        bounds.month_max as i64,
        &values.month,
    );
    number_input(
        &mut html,
        "station_id",
        "Enter station id:",
        bounds.station_min,
        bounds.station_max,
        &values.station_id,
    );
    html.push_str("<button type=\"submit\">Predict</button>\n</form>\n");

    match outcome {
        Some(Outcome::Prediction(prediction)) => {
            html.push_str("<section id=\"result\">\n");
            let _ = writeln!(html, "<h2>{}</h2>", escape(&result_heading(&prediction.input)));
            for line in prediction.result.display_lines() {
                let _ = writeln!(html, "<p>{}</p>", escape(&line));
            }
            html.push_str("</section>\n");
        }
        Some(Outcome::Error(message)) => {
            let _ = writeln!(html, "<section id=\"error\">\n<p>{}</p>\n</section>", escape(message));
        }
        None => {}
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn number_input(html: &mut String, name: &str, label: &str, min: i64, max: i64, value: &str) {
    let value = escape(value);
    let _ = writeln!(
        html,
        "<label for=\"{name}\">{label}</label>\n\
         <input type=\"number\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{value}\">"
    );
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_carries_bounds_and_defaults() {
        let bounds = InputBounds::default();
        let html = render(&bounds, &FormValues::from(&bounds.default_input()), None);

        assert!(html.contains(TITLE));
        assert!(html.contains(r#"name="year" min="2000" max="2047" step="1" value="2025""#));
        assert!(html.contains(r#"name="month" min="1" max="12" step="1" value="1""#));
        assert!(html.contains(r#"name="station_id" min="1" max="22" step="1" value="1""#));
        assert!(!html.contains("id=\"result\""));
    }

    #[test]
    fn test_error_message_escaped() {
        let bounds = InputBounds::default();
        let html = render(
            &bounds,
            &FormValues::from(&bounds.default_input()),
            Some(Outcome::Error("<bad> & worse")),
        );
        assert!(html.contains("&lt;bad&gt; &amp; worse"));
    }

    #[test]
    fn test_submitted_text_echoed_and_escaped() {
        let values = FormValues {
            year: "soon\"><script>".to_string(),
            month: "6".to_string(),
            station_id: "3".to_string(),
        };
        let html = render(&InputBounds::default(), &values, Some(Outcome::Error("bad year")));
        assert!(html.contains(r#"value="soon&quot;&gt;&lt;script&gt;""#));
        assert!(html.contains(r#"name="month" min="1" max="12" step="1" value="6""#));
        assert!(html.contains(r#"name="station_id" min="1" max="22" step="1" value="3""#));
    }
}
