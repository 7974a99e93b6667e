//! Editing sessions.
//!
//! A `Workspace` owns everything one user is working on: the structured
//! resume, the rich-text surface over it, ATS feedback, template choice,
//! profile photo, blur state and pending toasts. Every user action is a
//! method here; remote calls go through the `ResumeAi` and `UsageGate`
//! seams so the whole flow runs against mocks in tests.

pub mod handlers;
pub mod photo;
pub mod registry;
pub mod toast;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::{AtsFeedback, ExtractedResume, ResumeAi};
use crate::deterrence::{classify_key, BlurController, KeyChord, KeyVerdict};
use crate::editor::{ClickOutcome, EditorError, LinkDialog, RichEditor, TextSpan};
use crate::export::{
    export_document, AssetCleanup, BufferedContext, BufferedHost, ExportError, ExportRequest,
    PhotoOffset, UsageGate,
};
use crate::templates::TemplateId;

pub use photo::{PhotoError, PhotoSlot, ProfilePhoto};
pub use registry::SessionRegistry;
pub use toast::{Toast, ToastKind, ToastQueue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Idle,
    Processing,
    Editing,
    Analyzing,
    Improving,
}

/// Why an action did not go through. The matching toast has already been
/// queued when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Input problem; nothing changed.
    #[error("{0}")]
    Notice(String),

    /// Remote failure; phase reverted, document untouched.
    #[error("{0}")]
    Failed(String),

    /// Quota or premium template; the client should show the upgrade flow.
    #[error("{0}")]
    Upsell(String),
}

const ACCEPTED_UPLOAD_TYPES: [&str; 2] = ["image/", "application/pdf"];

/// Feedback suggestions a free account may apply; the rest are premium.
pub const FREE_IMPROVEMENTS: usize = 2;

const UPGRADE_NOTICE: &str = "Upgrade to Premium to unlock this feature.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeView {
    pub candidate_name: String,
    pub html: String,
    pub raw_text: String,
    pub confidence: f64,
}

/// Everything the client needs to render the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub id: Uuid,
    pub phase: Phase,
    pub job_description: String,
    pub resume: Option<ResumeView>,
    pub feedback: Option<AtsFeedback>,
    pub template: TemplateId,
    pub template_class: String,
    pub photo: Option<ProfilePhoto>,
    pub selection: Option<TextSpan>,
    pub link_dialog: Option<LinkDialog>,
    pub blurred: bool,
    pub upsell: bool,
    pub toasts: Vec<Toast>,
}

pub struct Workspace {
    id: Uuid,
    owner: Uuid,
    phase: Phase,
    job_description: String,
    resume: Option<ExtractedResume>,
    editor: RichEditor,
    feedback: Option<AtsFeedback>,
    template: TemplateId,
    photo: PhotoSlot,
    blur: BlurController,
    toasts: ToastQueue,
    upsell: bool,
}

impl Workspace {
    pub fn new(owner: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            phase: Phase::Idle,
            job_description: String::new(),
            resume: None,
            editor: RichEditor::new(""),
            feedback: None,
            template: TemplateId::default(),
            photo: PhotoSlot::default(),
            blur: BlurController::new(),
            toasts: ToastQueue::default(),
            upsell: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn html(&self) -> Option<String> {
        self.resume.as_ref().map(|r| r.html_content.clone())
    }

    pub fn feedback(&self) -> Option<&AtsFeedback> {
        self.feedback.as_ref()
    }

    pub fn toasts(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn view(&mut self) -> WorkspaceView {
        WorkspaceView {
            id: self.id,
            phase: self.phase,
            job_description: self.job_description.clone(),
            resume: self.resume.as_ref().map(|r| ResumeView {
                candidate_name: r.candidate_name.clone(),
                html: r.html_content.clone(),
                raw_text: r.raw_text.clone(),
                confidence: r.confidence,
            }),
            feedback: self.feedback.clone(),
            template: self.template,
            template_class: self.template.css_class(),
            photo: self.photo.get(),
            selection: self.editor.selection(),
            link_dialog: self.editor.dialog().cloned(),
            blurred: self.blur.is_blurred(),
            upsell: self.upsell,
            toasts: self.toasts.active(),
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Inputs
    // ────────────────────────────────────────────────────────────────────────

    pub fn set_job_description(&mut self, text: &str) {
        self.job_description = text.to_string();
    }

    pub fn set_template(&mut self, template: TemplateId) {
        self.template = template;
    }

    pub fn dismiss_upsell(&mut self) {
        self.upsell = false;
    }

    fn notice(&mut self, text: &str) -> ActionError {
        self.toasts.info(text);
        ActionError::Notice(text.to_string())
    }

    fn upsell(&mut self, text: &str) -> ActionError {
        self.upsell = true;
        self.toasts.info(text);
        ActionError::Upsell(text.to_string())
    }

    fn fail(&mut self, previous: Phase, text: &str) -> ActionError {
        self.phase = previous;
        self.toasts.error(text);
        ActionError::Failed(text.to_string())
    }

    /// Replaces the whole document with a fresh AI result.
    fn load_resume(&mut self, resume: ExtractedResume) {
        self.editor = RichEditor::new(&resume.html_content);
        self.resume = Some(resume);
    }

    /// Pushes owner-side html into the surface.
    fn replace_html(&mut self, html: String) {
        self.editor.sync_from_owner(&html);
        if let Some(resume) = self.resume.as_mut() {
            resume.html_content = html;
        }
    }

    /// Records a change reported by the surface.
    fn absorb(&mut self, change: Option<String>) -> bool {
        match (change, self.resume.as_mut()) {
            (Some(html), Some(resume)) => {
                resume.html_content = html;
                true
            }
            _ => false,
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // AI actions
    // ────────────────────────────────────────────────────────────────────────

    pub async fn upload_resume(
        &mut self,
        ai: &dyn ResumeAi,
        document: &str,
        mime_type: &str,
    ) -> Result<(), ActionError> {
        if document.trim().is_empty() {
            return Err(self.notice("Please choose a file to upload."));
        }
        if !ACCEPTED_UPLOAD_TYPES.iter().any(|t| mime_type.starts_with(t)) {
            return Err(self.notice("Please upload an image or a PDF."));
        }

        let previous = self.phase;
        self.phase = Phase::Processing;
        self.toasts.info("Architecting your data...");

        match ai.convert(document, mime_type, &self.job_description).await {
            Ok(resume) => {
                info!("Session {} loaded an uploaded resume", self.id);
                self.load_resume(resume);
                self.phase = Phase::Editing;
                self.toasts.success("Architecture complete!");
                self.analyze(ai).await;
                Ok(())
            }
            Err(e) => {
                warn!("Resume conversion failed: {e}");
                Err(self.fail(previous, "Process failed. Try a different image or text."))
            }
        }
    }

    pub async fn submit_text(&mut self, ai: &dyn ResumeAi, text: &str) -> Result<(), ActionError> {
        if text.trim().is_empty() {
            return Err(self.notice("Please enter text."));
        }

        let previous = self.phase;
        self.phase = Phase::Processing;

        match ai.structure_from_text(text, &self.job_description).await {
            Ok(resume) => {
                info!("Session {} structured pasted text", self.id);
                self.load_resume(resume);
                self.phase = Phase::Editing;
                self.toasts.success("Resume structured!");
                self.analyze(ai).await;
                Ok(())
            }
            Err(e) => {
                warn!("Text structuring failed: {e}");
                Err(self.fail(previous, "Structure failed."))
            }
        }
    }

    pub async fn smart_reorder(&mut self, ai: &dyn ResumeAi) -> Result<(), ActionError> {
        if self.job_description.trim().is_empty() {
            return Err(self.notice("Please provide a Job Description for Smart Reordering."));
        }
        let Some(html) = self.html() else {
            return Err(self.notice("There is no resume to reorder yet."));
        };

        let previous = self.phase;
        self.phase = Phase::Processing;
        self.toasts.info("AI analyzing JD vs Content for optimal sequence...");

        match ai.reorder_sections(&html, &self.job_description).await {
            Ok(reordered) => {
                self.replace_html(reordered);
                self.phase = Phase::Editing;
                self.toasts.success("Smart Sequence Applied!");
                Ok(())
            }
            Err(e) => {
                warn!("Reordering failed: {e}");
                Err(self.fail(previous, "Reordering failed."))
            }
        }
    }

    /// Applies one of the ATS feedback suggestions. Only the first
    /// `FREE_IMPROVEMENTS` are open to free accounts.
    pub async fn apply_improvement(
        &mut self,
        ai: &dyn ResumeAi,
        index: usize,
        is_premium: bool,
    ) -> Result<(), ActionError> {
        let Some(instruction) = self
            .feedback
            .as_ref()
            .and_then(|f| f.improvements.get(index))
            .cloned()
        else {
            return Err(self.notice("That improvement is no longer available."));
        };
        if !is_premium && index >= FREE_IMPROVEMENTS {
            return Err(self.upsell(UPGRADE_NOTICE));
        }
        let Some(html) = self.html() else {
            return Err(self.notice("There is no resume to improve yet."));
        };

        let previous = self.phase;
        self.phase = Phase::Improving;

        match ai.improve(&html, &instruction, &self.job_description).await {
            Ok(improved) => {
                self.replace_html(improved);
                self.phase = Phase::Editing;
                self.toasts.success("AI Optimization Applied!");
                Ok(())
            }
            Err(e) => {
                warn!("Improvement failed: {e}");
                Err(self.fail(previous, "Optimization failed."))
            }
        }
    }

    /// Re-scores the current document.
    pub async fn refresh_feedback(&mut self, ai: &dyn ResumeAi) -> Result<(), ActionError> {
        if self.resume.is_none() {
            return Err(self.notice("There is no resume to analyze yet."));
        }
        self.analyze(ai).await;
        Ok(())
    }

    /// Scoring failures are not surfaced; the feedback panel just stays empty.
    async fn analyze(&mut self, ai: &dyn ResumeAi) {
        let text = self.editor.text();
        let previous = self.phase;
        self.phase = Phase::Analyzing;
        self.feedback = match ai.score_for_ats(&text, &self.job_description).await {
            Ok(feedback) => Some(feedback),
            Err(e) => {
                debug!("ATS feedback unavailable: {e}");
                None
            }
        };
        self.phase = previous;
    }

    // ────────────────────────────────────────────────────────────────────────
    // Photo
    // ────────────────────────────────────────────────────────────────────────

    pub fn upload_photo(&mut self, data_url: &str) -> Result<(), ActionError> {
        match ProfilePhoto::from_data_url(data_url) {
            Ok(photo) => {
                self.photo.set(photo);
                self.toasts.success("Profile photo added! You can now drag it to position.");
                Ok(())
            }
            Err(e) => {
                let text = e.to_string();
                self.toasts.error(&text);
                Err(ActionError::Notice(text))
            }
        }
    }

    pub fn move_photo(&mut self, offset: PhotoOffset) -> Result<(), ActionError> {
        if self.photo.move_to(offset) {
            Ok(())
        } else {
            Err(self.notice("Upload a photo first."))
        }
    }

    pub fn remove_photo(&mut self) {
        self.photo.clear();
    }

    // ────────────────────────────────────────────────────────────────────────
    // Editor
    // ────────────────────────────────────────────────────────────────────────

    fn editor_notice(&mut self, error: EditorError) -> ActionError {
        self.notice(&error.to_string())
    }

    pub fn select(&mut self, span: Option<TextSpan>) {
        match span {
            Some(span) => self.editor.select(span),
            None => self.editor.clear_selection(),
        }
    }

    /// Returns whether the document changed.
    pub fn exec(&mut self, command: &str, value: Option<&str>) -> Result<bool, ActionError> {
        match self.editor.exec(command, value) {
            Ok(change) => Ok(self.absorb(change)),
            Err(e) => Err(self.editor_notice(e)),
        }
    }

    pub fn open_link_editor(&mut self) -> Result<(), ActionError> {
        let existing = self.editor.selected_link();
        match self.editor.open_link_editor(existing) {
            Ok(_) => Ok(()),
            Err(e) => Err(self.editor_notice(e)),
        }
    }

    pub fn set_link_url(&mut self, url: &str) -> Result<(), ActionError> {
        match self.editor.set_dialog_url(url) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.editor_notice(e)),
        }
    }

    pub fn commit_link(&mut self, url: &str) -> Result<bool, ActionError> {
        match self.editor.commit_link(url) {
            Ok(change) => Ok(self.absorb(change)),
            Err(e) => Err(self.editor_notice(e)),
        }
    }

    pub fn cancel_link(&mut self) {
        self.editor.cancel_link_editor();
    }

    pub fn remove_link(&mut self) -> bool {
        let change = self.editor.remove_link();
        self.absorb(change)
    }

    pub fn click(&mut self, target: &[usize]) -> ClickOutcome {
        self.editor.click(target)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Deterrence
    // ────────────────────────────────────────────────────────────────────────

    pub fn key_pressed(&mut self, chord: &KeyChord) -> KeyVerdict {
        let verdict = classify_key(chord);
        if verdict == KeyVerdict::BlurBriefly {
            self.blur.screenshot_detected();
        }
        verdict
    }

    pub fn focus_changed(&mut self, focused: bool) {
        if focused {
            self.blur.focus_gained();
        } else {
            self.blur.focus_lost();
        }
    }

    pub fn is_blurred(&self) -> bool {
        self.blur.is_blurred()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Export
    // ────────────────────────────────────────────────────────────────────────

    /// Runs the print export. On success the written document is returned.
    pub async fn export(
        &mut self,
        gate: &dyn UsageGate,
        styles: Vec<String>,
    ) -> Result<BufferedContext, ActionError> {
        let html = self.html().unwrap_or_default();
        let candidate = self.resume.as_ref().map(|r| r.candidate_name.clone());
        let overlay = self.photo.get().map(|p| p.overlay());
        let host = BufferedHost { styles };
        let assets: Arc<dyn AssetCleanup> = Arc::new(self.photo.clone());

        let result = export_document(
            gate,
            &host,
            Some(assets),
            ExportRequest {
                html: &html,
                template: self.template,
                candidate_name: candidate.as_deref(),
                photo: overlay.as_ref(),
            },
        )
        .await;

        match result {
            Ok(receipt) => {
                info!("Session {} exported (download #{})", self.id, receipt.downloads);
                Ok(receipt.context)
            }
            Err(e) if e.routes_to_upgrade() => {
                info!("Session {} export needs an upgrade: {e}", self.id);
                Err(self.upsell(UPGRADE_NOTICE))
            }
            Err(ExportError::EmptyDocument) => Err(self.notice("There is no resume to export yet.")),
            Err(ExportError::PopupBlocked) => {
                let text = ExportError::PopupBlocked.to_string();
                self.toasts.error(&text);
                Err(ActionError::Failed(text))
            }
            Err(e) => {
                warn!("Export failed: {e}");
                self.toasts.error("Download failed. Try again.");
                Err(ActionError::Failed(e.to_string()))
            }
        }
    }
}
