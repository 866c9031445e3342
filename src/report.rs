//! Batch mode: a list of URLs in, one CSV row per prediction out.

use crate::{decision::Label, engine::PhishingEngine, error::AppError};
use std::{
    borrow::Cow,
    io::{BufRead, Write},
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub phishing: usize,
    pub legitimate: usize,
}

/// One URL per line; blank lines and `#` comments are skipped.
pub fn read_url_list<R: BufRead>(reader: R) -> Result<Vec<String>, AppError> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        urls.push(trimmed.to_string());
    }
    Ok(urls)
}

pub fn write_report<W: Write>(
    engine: &PhishingEngine,
    urls: &[String],
    mut writer: W,
) -> Result<ReportSummary, AppError> {
    let mut header = vec!["URL", "Result", "Confidence"];
    header.extend(engine.schema().names());
    writeln!(writer, "{}", header.join(","))?;

    let mut summary = ReportSummary::default();
    for url in urls {
        let prediction = engine.predict(url)?;
        debug!("{}: {}", url, prediction.label);

        let mut fields = vec![
            csv_field(url).into_owned(),
            prediction.label.to_string(),
            prediction.confidence_percent(),
        ];
        fields.extend(prediction.features.values().iter().map(|v| v.to_string()));
        writeln!(writer, "{}", fields.join(","))?;

        summary.total += 1;
        match prediction.label {
            Label::Phishing => summary.phishing += 1,
            Label::Legitimate => summary.legitimate += 1,
        }
    }
    writer.flush()?;

    info!(
        "Report written: {} URLs, {} phishing, {} legitimate",
        summary.total, summary.phishing, summary.legitimate
    );
    Ok(summary)
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
