//! Offline evaluation of a model artifact against a labelled dataset, and
//! ROC-based threshold selection.

use crate::{
    decision::{decide, Label, Threshold},
    error::AppError,
    features::FeatureVector,
    model::{ClassMapping, LoadedModel},
    schema::FeatureSchema,
};
use std::{fmt, io::BufRead};
use tracing::info;

pub const LABEL_COLUMN: &str = "Result";

const LABELS: [Label; 2] = [Label::Phishing, Label::Legitimate];

fn label_index(label: Label) -> usize {
    match label {
        Label::Phishing => 0,
        Label::Legitimate => 1,
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    schema: FeatureSchema,
    rows: Vec<(FeatureVector, Label)>,
}

impl Dataset {
    /// Reads a CSV with a header row. Feature columns are located by name, so
    /// the file's column order does not matter.
    pub fn from_csv<R: BufRead>(
        reader: R,
        schema: FeatureSchema,
        mapping: &ClassMapping,
    ) -> Result<Self, AppError> {
        let mut lines = reader.lines().enumerate();

        let header = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break split_row(&line);
                    }
                }
                None => return Err(AppError::Dataset("dataset is empty".to_string())),
            }
        };

        let column = |name: &str| -> Result<usize, AppError> {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| AppError::Dataset(format!("missing column {}", name)))
        };
        let feature_columns = schema
            .features()
            .iter()
            .map(|f| column(f.name()))
            .collect::<Result<Vec<_>, _>>()?;
        let label_column = column(LABEL_COLUMN)?;

        let mut rows = Vec::new();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = index + 1;
            let cells = split_row(&line);
            let cell = |i: usize| -> Result<i64, AppError> {
                let raw = cells.get(i).ok_or_else(|| {
                    AppError::Dataset(format!("line {}: expected at least {} columns", line_no, i + 1))
                })?;
                parse_int(raw).ok_or_else(|| {
                    AppError::Dataset(format!("line {}: {:?} is not an integer", line_no, raw))
                })
            };

            let values = feature_columns
                .iter()
                .map(|i| cell(*i).map(|v| v.clamp(i8::MIN as i64, i8::MAX as i64) as i8))
                .collect::<Result<Vec<_>, _>>()?;
            let features = FeatureVector::from_values(schema, values)
                .map_err(|e| AppError::Dataset(format!("line {}: {}", line_no, e)))?;

            let class = cell(label_column)?;
            let label = mapping.label_of(class).ok_or_else(|| {
                AppError::Dataset(format!("line {}: unknown class {}", line_no, class))
            })?;
            rows.push((features, label));
        }

        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> FeatureSchema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect()
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    /// Predict legitimate when `p >= threshold`.
    pub threshold: f64,
    pub tpr: f64,
    pub fpr: f64,
}

/// ROC curve with legitimate as the positive class, from the strictest
/// threshold (nothing positive) down to the loosest.
pub fn roc_curve(scores: &[f64], positives: &[bool]) -> Vec<RocPoint> {
    let total_pos = positives.iter().filter(|p| **p).count();
    let total_neg = positives.len() - total_pos;
    let rate = |n: usize, d: usize| if d == 0 { 0.0 } else { n as f64 / d as f64 };

    let mut order: Vec<usize> = (0..scores.len().min(positives.len())).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));

    let mut points = vec![RocPoint {
        threshold: f64::INFINITY,
        tpr: 0.0,
        fpr: 0.0,
    }];
    let (mut tp, mut fp) = (0, 0);
    let mut i = 0;
    while i < order.len() {
        let score = scores[order[i]];
        while i < order.len() && scores[order[i]] == score {
            if positives[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold: score,
            tpr: rate(tp, total_pos),
            fpr: rate(fp, total_neg),
        });
    }
    points
}

pub fn auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
        .sum()
}

/// Point maximizing Youden's J (TPR - FPR). Ties keep the stricter threshold.
pub fn optimal_threshold(points: &[RocPoint]) -> Option<RocPoint> {
    points
        .iter()
        .filter(|p| p.threshold.is_finite())
        .fold(None, |best: Option<RocPoint>, p| match best {
            Some(b) if b.tpr - b.fpr >= p.tpr - p.fpr => Some(b),
            _ => Some(*p),
        })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassReport {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub samples: usize,
    pub threshold: f64,
    pub accuracy: f64,
    /// `confusion[actual][predicted]`, Phishing first.
    pub confusion: [[usize; 2]; 2],
    pub per_class: Vec<ClassReport>,
    /// None when the dataset holds only one class.
    pub roc_auc: Option<f64>,
    pub optimal: Option<RocPoint>,
}

pub fn evaluate(
    model: &LoadedModel,
    dataset: &Dataset,
    threshold: Threshold,
) -> Result<EvaluationReport, AppError> {
    if dataset.is_empty() {
        return Err(AppError::Dataset("dataset has no rows".to_string()));
    }

    let mut confusion = [[0usize; 2]; 2];
    let mut scores = Vec::with_capacity(dataset.len());
    let mut positives = Vec::with_capacity(dataset.len());

    for (features, actual) in &dataset.rows {
        let p = model.probability_of_legitimate(features)?;
        let (predicted, _) = decide(p, threshold.value());
        confusion[label_index(*actual)][label_index(predicted)] += 1;
        scores.push(p);
        positives.push(*actual == Label::Legitimate);
    }

    let correct = confusion[0][0] + confusion[1][1];
    let per_class = LABELS
        .iter()
        .map(|label| {
            let i = label_index(*label);
            let tp = confusion[i][i] as f64;
            let predicted: usize = confusion.iter().map(|row| row[i]).sum();
            let support: usize = confusion[i].iter().sum();
            let precision = if predicted == 0 { 0.0 } else { tp / predicted as f64 };
            let recall = if support == 0 { 0.0 } else { tp / support as f64 };
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassReport {
                label: *label,
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect::<Vec<_>>();

    let both_classes = per_class.iter().all(|c| c.support > 0);
    let (roc_auc, optimal) = if both_classes {
        let points = roc_curve(&scores, &positives);
        (Some(auc(&points)), optimal_threshold(&points))
    } else {
        (None, None)
    };

    let report = EvaluationReport {
        samples: dataset.len(),
        threshold: threshold.value(),
        accuracy: correct as f64 / dataset.len() as f64,
        confusion,
        per_class,
        roc_auc,
        optimal,
    };
    info!(
        "Evaluated {} samples: accuracy {:.4}, auc {:?}",
        report.samples, report.accuracy, report.roc_auc
    );
    Ok(report)
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.per_class {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label.as_str(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>29.4} {:>9}", "accuracy", self.accuracy, self.samples)?;
        writeln!(f, "threshold: {:.3}", self.threshold)?;
        writeln!(f, "confusion (rows actual, cols predicted; Phishing, Legitimate):")?;
        for row in &self.confusion {
            writeln!(f, "  {:>8} {:>8}", row[0], row[1])?;
        }
        match self.roc_auc {
            Some(auc) => writeln!(f, "roc auc: {:.4}", auc)?,
            None => writeln!(f, "roc auc: n/a (single class)")?,
        }
        if let Some(p) = self.optimal {
            writeln!(
                f,
                "optimal threshold (max TPR-FPR): {:.4} (tpr {:.3}, fpr {:.3})",
                p.threshold, p.tpr, p.fpr
            )?;
        }
        Ok(())
    }
}
