use serde::{Deserialize, Serialize};

/// Structured resume produced from an upload or pasted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedResume {
    pub candidate_name: String,
    pub html_content: String,
    pub raw_text: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsFeedback {
    /// 0 to 100.
    pub score: f64,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub suggested_keywords: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jd_match_analysis: Option<String>,
}

impl AtsFeedback {
    pub fn clamped(mut self) -> Self {
        self.score = self.score.clamp(0.0, 100.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_resume_uses_camel_case() {
        let json = r#"{"candidateName":"Jane Doe","htmlContent":"<h1>Jane Doe</h1>","rawText":"Jane Doe"}"#;
        let resume: ExtractedResume = serde_json::from_str(json).unwrap();
        assert_eq!(resume.candidate_name, "Jane Doe");
        assert_eq!(resume.confidence, 0.0);
    }

    #[test]
    fn test_feedback_tolerates_missing_lists_and_clamps() {
        let json = r#"{"score":140,"improvements":["Quantify impact"]}"#;
        let feedback: AtsFeedback = serde_json::from_str::<AtsFeedback>(json).unwrap().clamped();
        assert_eq!(feedback.score, 100.0);
        assert!(feedback.red_flags.is_empty());
        assert!(feedback.jd_match_analysis.is_none());

        let out = serde_json::to_value(&feedback).unwrap();
        assert!(out.get("suggestedKeywords").is_some());
        assert!(out.get("jdMatchAnalysis").is_none());
    }
}
