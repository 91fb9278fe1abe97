//! Assessment engine
//!
//! Pure scoring, severity classification and specialist recommendation.
//! Nothing here touches I/O or the clock.

use crate::catalog::{Catalog, Category};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Weight of the strongest answer option
pub const MAX_WEIGHT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssessmentError {
    #[error("Cannot score an empty answer set")]
    NoAnswers,
    #[error("Maximum possible score is zero")]
    ZeroMaximum,
    #[error("Score {total} exceeds maximum {max_possible}")]
    ScoreOutOfRange { total: u32, max_possible: u32 },
    #[error("Category '{category}' has {answered} of {expected} questions answered in order")]
    Incomplete {
        category: String,
        answered: usize,
        expected: usize,
    },
}

/// Graded answer to a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOption {
    No,
    Sometimes,
    Yes,
    Often,
}

impl AnswerOption {
    pub const ALL: [AnswerOption; 4] = [
        AnswerOption::No,
        AnswerOption::Sometimes,
        AnswerOption::Yes,
        AnswerOption::Often,
    ];

    pub fn weight(self) -> u32 {
        match self {
            AnswerOption::No => 0,
            AnswerOption::Sometimes => 1,
            AnswerOption::Yes => 2,
            AnswerOption::Often => 3,
        }
    }

    /// Text shown on the answer keyboard
    pub fn label(self) -> &'static str {
        match self {
            AnswerOption::No => "No",
            AnswerOption::Sometimes => "Sometimes",
            AnswerOption::Yes => "Yes",
            AnswerOption::Often => "Often",
        }
    }

    /// Exact match against the keyboard labels
    pub fn from_label(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.label() == text)
    }

    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|o| o.label().to_string()).collect()
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    /// Classify a normalized score in `[0, 1]`
    #[allow(dead_code)] // API completeness
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.25 {
            Severity::Mild
        } else if ratio < 0.6 {
            Severity::Moderate
        } else {
            Severity::Severe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    /// Row fill used by spreadsheet-style exports
    pub fn highlight(self) -> &'static str {
        match self {
            Severity::Mild => "C6EFCE",
            Severity::Moderate => "FFEB9C",
            Severity::Severe => "FFC7CE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub total: u32,
    pub max_possible: u32,
}

/// Outcome of a fully answered category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub score: Score,
    pub severity: Severity,
    pub recommendation: String,
}

pub fn score_answers(answers: &[(String, AnswerOption)]) -> Result<Score, AssessmentError> {
    if answers.is_empty() {
        return Err(AssessmentError::NoAnswers);
    }
    let total = answers.iter().map(|(_, a)| a.weight()).sum();
    let count = u32::try_from(answers.len()).unwrap_or(u32::MAX);
    Ok(Score {
        total,
        max_possible: count.saturating_mul(MAX_WEIGHT),
    })
}

/// Bands are inclusive on their lower bound: 0.25 is moderate, 0.6 is severe.
///
/// Compared with integer cross-multiplication so the boundaries are exact.
pub fn classify_severity(total: u32, max_possible: u32) -> Result<Severity, AssessmentError> {
    if max_possible == 0 {
        return Err(AssessmentError::ZeroMaximum);
    }
    if total > max_possible {
        return Err(AssessmentError::ScoreOutOfRange {
            total,
            max_possible,
        });
    }

    let total = u64::from(total);
    let max = u64::from(max_possible);
    let severity = if total * 4 < max {
        Severity::Mild
    } else if total * 5 < max * 3 {
        Severity::Moderate
    } else {
        Severity::Severe
    };
    Ok(severity)
}

/// Phrasing depends only on severity; the specialist comes from the catalog.
pub fn recommend(catalog: &Catalog, category: &str, severity: Severity) -> String {
    let doctor = catalog.specialist_for(category);
    match severity {
        Severity::Severe => format!("Urgent: please see a specialist as soon as possible: {doctor}."),
        Severity::Moderate => format!("A consultation is advisable: {doctor}."),
        Severity::Mild => format!("Your condition looks stable. Follow-up if needed: {doctor}."),
    }
}

/// Score, classify and recommend for a category answered end to end.
pub fn assess(
    catalog: &Catalog,
    category: &Category,
    answers: &[(String, AnswerOption)],
) -> Result<Assessment, AssessmentError> {
    let in_order = answers.len() == category.questions.len()
        && answers
            .iter()
            .zip(&category.questions)
            .all(|((asked, _), expected)| asked == expected);
    if !in_order {
        return Err(AssessmentError::Incomplete {
            category: category.name.clone(),
            answered: answers.len(),
            expected: category.questions.len(),
        });
    }

    let score = score_answers(answers)?;
    let severity = classify_severity(score.total, score.max_possible)?;
    Ok(Assessment {
        score,
        severity,
        recommendation: recommend(catalog, &category.name, severity),
    })
}
