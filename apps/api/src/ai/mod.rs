//! AI collaborator: turns uploads and pasted text into resume HTML, edits it
//! and scores it for ATS compatibility.
//!
//! `AppState` holds an `Arc<dyn ResumeAi>`; the default backend is
//! `ClaudeResumeAi`, tests swap in a scripted mock.

pub mod handlers;
pub mod models;
pub mod prompts;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::llm_client::prompts::{HTML_ONLY_SYSTEM, JSON_ONLY_SYSTEM};
use crate::llm_client::{Attachment, LlmClient, LlmError};

pub use models::{AtsFeedback, ExtractedResume};

#[async_trait]
pub trait ResumeAi: Send + Sync {
    /// `document` is base64; `mime_type` is `image/*` or `application/pdf`.
    async fn convert(
        &self,
        document: &str,
        mime_type: &str,
        job_description: &str,
    ) -> Result<ExtractedResume, LlmError>;

    async fn structure_from_text(
        &self,
        text: &str,
        job_description: &str,
    ) -> Result<ExtractedResume, LlmError>;

    async fn improve(
        &self,
        html: &str,
        instruction: &str,
        job_description: &str,
    ) -> Result<String, LlmError>;

    async fn reorder_sections(&self, html: &str, job_description: &str) -> Result<String, LlmError>;

    async fn score_for_ats(&self, text: &str, job_description: &str)
        -> Result<AtsFeedback, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// ClaudeResumeAi
// ────────────────────────────────────────────────────────────────────────────

pub struct ClaudeResumeAi(pub LlmClient);

#[async_trait]
impl ResumeAi for ClaudeResumeAi {
    #[instrument(skip(self, document, job_description), fields(bytes = document.len()))]
    async fn convert(
        &self,
        document: &str,
        mime_type: &str,
        job_description: &str,
    ) -> Result<ExtractedResume, LlmError> {
        let prompt = prompts::structure_prompt(job_description, prompts::CONVERT_FILE_SUFFIX);
        let attachment = Attachment {
            media_type: mime_type,
            data: document,
        };
        let resume: ExtractedResume = self
            .0
            .call_json(&prompt, JSON_ONLY_SYSTEM, Some(attachment))
            .await?;
        info!("Converted uploaded resume for {}", resume.candidate_name);
        Ok(resume)
    }

    #[instrument(skip_all, fields(chars = text.len()))]
    async fn structure_from_text(
        &self,
        text: &str,
        job_description: &str,
    ) -> Result<ExtractedResume, LlmError> {
        let suffix = prompts::structure_text_suffix(text);
        let prompt = prompts::structure_prompt(job_description, &suffix);
        self.0.call_json(&prompt, JSON_ONLY_SYSTEM, None).await
    }

    #[instrument(skip_all)]
    async fn improve(
        &self,
        html: &str,
        instruction: &str,
        job_description: &str,
    ) -> Result<String, LlmError> {
        let prompt = prompts::improve_prompt(html, instruction, job_description);
        self.0.call_html(&prompt, HTML_ONLY_SYSTEM).await
    }

    #[instrument(skip_all)]
    async fn reorder_sections(&self, html: &str, job_description: &str) -> Result<String, LlmError> {
        let prompt = prompts::reorder_prompt(html, job_description);
        self.0.call_html(&prompt, HTML_ONLY_SYSTEM).await
    }

    #[instrument(skip_all)]
    async fn score_for_ats(
        &self,
        text: &str,
        job_description: &str,
    ) -> Result<AtsFeedback, LlmError> {
        let prompt = prompts::ats_prompt(text, job_description);
        let feedback: AtsFeedback = self.0.call_json(&prompt, JSON_ONLY_SYSTEM, None).await?;
        Ok(feedback.clamped())
    }
}

#[cfg(test)]
pub mod mock {
    //! Scripted backend shared by workspace and handler tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MockAi {
        pub resumes: Mutex<VecDeque<Result<ExtractedResume, String>>>,
        pub html: Mutex<VecDeque<Result<String, String>>>,
        pub feedback: Mutex<VecDeque<Result<AtsFeedback, String>>>,
        /// `(operation, job_description)` for every call.
        pub calls: Mutex<Vec<(String, String)>>,
    }

    pub fn resume(name: &str, html: &str) -> ExtractedResume {
        ExtractedResume {
            candidate_name: name.to_string(),
            html_content: html.to_string(),
            raw_text: name.to_string(),
            confidence: 0.9,
        }
    }

    pub fn feedback(score: f64) -> AtsFeedback {
        AtsFeedback {
            score,
            improvements: vec!["Quantify impact".into()],
            suggested_keywords: vec![],
            red_flags: vec![],
            jd_match_analysis: None,
        }
    }

    impl MockAi {
        pub fn push_resume(&self, r: Result<ExtractedResume, String>) {
            self.resumes.lock().unwrap().push_back(r);
        }

        pub fn push_html(&self, r: Result<String, String>) {
            self.html.lock().unwrap().push_back(r);
        }

        pub fn push_feedback(&self, r: Result<AtsFeedback, String>) {
            self.feedback.lock().unwrap().push_back(r);
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, op: &str, jd: &str) {
            self.calls.lock().unwrap().push((op.to_string(), jd.to_string()));
        }

        fn next<T>(queue: &Mutex<VecDeque<Result<T, String>>>) -> Result<T, LlmError> {
            match queue.lock().unwrap().pop_front() {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(LlmError::Api { status: 500, message }),
                None => Err(LlmError::EmptyContent),
            }
        }
    }

    #[async_trait]
    impl ResumeAi for MockAi {
        async fn convert(&self, _: &str, _: &str, jd: &str) -> Result<ExtractedResume, LlmError> {
            self.record("convert", jd);
            Self::next(&self.resumes)
        }

        async fn structure_from_text(&self, _: &str, jd: &str) -> Result<ExtractedResume, LlmError> {
            self.record("structure_from_text", jd);
            Self::next(&self.resumes)
        }

        async fn improve(&self, _: &str, _: &str, jd: &str) -> Result<String, LlmError> {
            self.record("improve", jd);
            Self::next(&self.html)
        }

        async fn reorder_sections(&self, _: &str, jd: &str) -> Result<String, LlmError> {
            self.record("reorder_sections", jd);
            Self::next(&self.html)
        }

        async fn score_for_ats(&self, _: &str, jd: &str) -> Result<AtsFeedback, LlmError> {
            self.record("score_for_ats", jd);
            Self::next(&self.feedback)
        }
    }
}
