//! Evaluation tasks and their fixed instruction texts.
//!
//! The three instructions are the only prompt engineering in the crate.
//! They live in one lookup, [`instruction`], keyed by the closed [`Task`]
//! enum, so call sites never carry string literals and a new task is a
//! new variant plus one match arm.

use crate::error::AtsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instruction for [`Task::FullAnalysis`].
pub const FULL_ANALYSIS_PROMPT: &str = "You are an experienced Technical Human Resource Manager. \
Review the provided resume against the job description and share a professional evaluation \
with the strengths and weaknesses of the candidate with respect to the job description.";

/// Instruction for [`Task::PercentageMatch`].
pub const PERCENTAGE_MATCH_PROMPT: &str = "You are an ATS scanner. \
Evaluate the resume against the job description and provide:
- Percentage match
- Missing keywords
- Final evaluation.";

/// Instruction for [`Task::KeywordExtraction`].
pub const KEYWORD_EXTRACTION_PROMPT: &str = "Extract the most relevant keywords from the job description and the resume.
Provide them as a bullet-point list.";

/// The evaluations a user can request for an uploaded resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Recruiter-style review: strengths and weaknesses.
    FullAnalysis,
    /// ATS-style score: percentage, missing keywords, verdict.
    PercentageMatch,
    /// Keywords shared between job description and resume.
    KeywordExtraction,
}

impl Task {
    /// Every task, in the order a front end presents them.
    pub const ALL: [Task; 3] = [
        Task::FullAnalysis,
        Task::PercentageMatch,
        Task::KeywordExtraction,
    ];

    /// Short name used on the command line and in [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Task::FullAnalysis => "analyze",
            Task::PercentageMatch => "match",
            Task::KeywordExtraction => "keywords",
        }
    }

    /// Heading of the downloadable report.
    pub fn report_title(&self) -> &'static str {
        match self {
            Task::FullAnalysis => "Resume Analysis",
            Task::PercentageMatch => "Percentage Match Analysis",
            Task::KeywordExtraction => "Extracted Keywords",
        }
    }

    /// File name of the downloadable report.
    pub fn report_file_name(&self) -> &'static str {
        match self {
            Task::FullAnalysis => "analysis_report.txt",
            Task::PercentageMatch => "match_report.txt",
            Task::KeywordExtraction => "keywords_report.txt",
        }
    }

    /// Progress message shown while the task runs.
    pub fn progress_label(&self) -> &'static str {
        match self {
            Task::FullAnalysis => "Analyzing Resume…",
            Task::PercentageMatch => "Calculating Match…",
            Task::KeywordExtraction => "Extracting Keywords…",
        }
    }
}

/// Instruction text sent as the last part of every request for `task`.
pub fn instruction(task: Task) -> &'static str {
    match task {
        Task::FullAnalysis => FULL_ANALYSIS_PROMPT,
        Task::PercentageMatch => PERCENTAGE_MATCH_PROMPT,
        Task::KeywordExtraction => KEYWORD_EXTRACTION_PROMPT,
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = AtsError;

    /// Accepts the short names plus the variant names in snake or kebab case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "analyze" | "analysis" | "full_analysis" => Ok(Task::FullAnalysis),
            "match" | "percentage" | "percentage_match" => Ok(Task::PercentageMatch),
            "keywords" | "keyword_extraction" => Ok(Task::KeywordExtraction),
            _ => Err(AtsError::InvalidTask {
                task: s.to_string(),
            }),
        }
    }
}
