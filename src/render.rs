//! HTML for the form and result pages. Every user-supplied string goes
//! through [`escape`].

use crate::{decision::Label, types::Prediction};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:44rem;margin:2rem auto}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.25rem .6rem}\
.phishing{color:#b00020}.legitimate{color:#1b5e20}";

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn form(value: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/predict\">\n<label for=\"url\">URL</label>\n<input id=\"url\" name=\"url\" type=\"text\" size=\"60\" value=\"{}\" required>\n<button type=\"submit\">Check</button>\n</form>",
        escape(value)
    )
}

pub fn index_page() -> String {
    page(
        "Phishing URL check",
        &format!("<h1>Phishing URL check</h1>\n{}", form("")),
    )
}

pub fn result_page(url: &str, prediction: &Prediction) -> String {
    let class = match prediction.label {
        Label::Phishing => "phishing",
        Label::Legitimate => "legitimate",
    };

    let mut rows = String::new();
    for (feature, value) in prediction.features.iter() {
        let _ = writeln!(rows, "<tr><td>{}</td><td>{}</td></tr>", feature.name(), value);
    }

    let body = format!(
        "<h1>Result</h1>\n<p>URL: <code>{}</code></p>\n<p class=\"{}\">Prediction: <strong>{}</strong> ({} confidence)</p>\n<table>\n<tr><th>Feature</th><th>Value</th></tr>\n{}</table>\n<h2>Check another</h2>\n{}",
        escape(url),
        class,
        prediction.label,
        prediction.confidence_percent(),
        rows,
        form("")
    );
    page("Phishing URL check: result", &body)
}

pub fn error_page(url: &str, message: &str) -> String {
    let body = format!(
        "<h1>Cannot check this URL</h1>\n<p>{}</p>\n{}",
        escape(message),
        form(url)
    );
    page("Phishing URL check: error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{features::FeatureVector, schema::FeatureSchema};

    fn prediction(label: Label, confidence: f64) -> Prediction {
        Prediction {
            label,
            confidence,
            probability_of_legitimate: confidence,
            features: FeatureVector::from_values(FeatureSchema::Base, vec![1; 9]).unwrap(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn result_page_shows_label_confidence_and_features() {
        let html = result_page("http://x.com/<script>", &prediction(Label::Legitimate, 0.875));
        assert!(html.contains("<strong>Legitimate</strong> (87.50% confidence)"));
        assert!(html.contains("<tr><td>having_IP_Address</td><td>1</td></tr>"));
        assert!(html.contains("<tr><td>HTTPS_token</td><td>1</td></tr>"));
        assert!(html.contains("http://x.com/&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn index_has_form() {
        let html = index_page();
        assert!(html.contains("action=\"/predict\""));
        assert!(html.contains("name=\"url\""));
    }

    #[test]
    fn error_page_keeps_input() {
        let html = error_page("\"oops", "Invalid input: URL must not be empty");
        assert!(html.contains("value=\"&quot;oops\""));
    }
}
