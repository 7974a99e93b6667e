//! Export-to-print pipeline.
//!
//! Order of side effects:
//! 1. usage/limit check (`UsageGate`), nothing else happens if it fails
//! 2. open the print context (`PrintHost`); `None` means popups are blocked
//! 3. schedule clearing of ancillary assets for photo templates
//! 4. inline the host's active styles
//! 5. write the document (body, template class, photo overlay)
//! 6. the document prints itself after `PRINT_DELAY_MS` and closes afterwards

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::export::document::{PhotoOverlay, PrintableDocument};
use crate::templates::TemplateId;

/// How long user-supplied photo assets survive after an export is triggered.
pub const ASSET_CLEAR_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Download limit reached ({downloads}/{limit})")]
    LimitReached { downloads: i32, limit: i32 },

    #[error("Template '{}' requires premium", .0.slug())]
    UpgradeRequired(TemplateId),

    #[error("Usage check failed: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadReceipt {
    pub downloads: i32,
}

/// Server-side usage accounting consulted before anything is opened.
#[async_trait]
pub trait UsageGate: Send + Sync {
    async fn authorize_download(&self, template: TemplateId) -> Result<DownloadReceipt, GateError>;
}

/// A fresh browsing context the printable document is written into.
pub trait PrintContext {
    fn write(&mut self, html: &str);
    fn close(&mut self);
}

pub trait PrintHost {
    type Context: PrintContext;

    /// `None` when the environment refuses to open a new context.
    fn open_context(&self) -> Option<Self::Context>;

    /// Style sheets currently active on the host page.
    fn active_styles(&self) -> Vec<String>;
}

/// Clears user-supplied assets (the profile photo) once an export ran.
pub trait AssetCleanup: Send + Sync + 'static {
    fn clear_assets(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("There is no resume to export yet")]
    EmptyDocument,

    #[error("Download limit reached ({downloads}/{limit})")]
    LimitReached { downloads: i32, limit: i32 },

    #[error("Template '{}' requires premium", .0.slug())]
    UpgradeRequired(TemplateId),

    #[error("Popup blocked! Please allow popups to generate your PDF.")]
    PopupBlocked,

    #[error("Download failed: {0}")]
    Failed(String),
}

impl ExportError {
    /// Failures that should send the user to the upgrade flow.
    pub fn routes_to_upgrade(&self) -> bool {
        matches!(self, Self::LimitReached { .. } | Self::UpgradeRequired(_))
    }
}

impl From<GateError> for ExportError {
    fn from(error: GateError) -> Self {
        match error {
            GateError::LimitReached { downloads, limit } => Self::LimitReached { downloads, limit },
            GateError::UpgradeRequired(template) => Self::UpgradeRequired(template),
            GateError::Unavailable(msg) => Self::Failed(msg),
        }
    }
}

pub struct ExportRequest<'a> {
    pub html: &'a str,
    pub template: TemplateId,
    pub candidate_name: Option<&'a str>,
    pub photo: Option<&'a PhotoOverlay>,
}

#[derive(Debug)]
pub struct ExportReceipt<C> {
    pub context: C,
    pub downloads: i32,
    pub assets_scheduled: bool,
}

/// Runs the export. The context is handed back so the caller can keep
/// driving it (or, server-side, read what was written).
pub async fn export_document<H: PrintHost>(
    gate: &dyn UsageGate,
    host: &H,
    assets: Option<Arc<dyn AssetCleanup>>,
    request: ExportRequest<'_>,
) -> Result<ExportReceipt<H::Context>, ExportError> {
    if request.html.trim().is_empty() {
        return Err(ExportError::EmptyDocument);
    }

    let receipt = gate.authorize_download(request.template).await.map_err(|e| {
        warn!("Export refused by usage gate: {e}");
        ExportError::from(e)
    })?;

    let Some(mut context) = host.open_context() else {
        warn!("Print context could not be opened");
        return Err(ExportError::PopupBlocked);
    };

    let assets_scheduled = match assets {
        Some(assets) if request.template.requires_photo() => {
            tokio::spawn(async move {
                tokio::time::sleep(ASSET_CLEAR_DELAY).await;
                assets.clear_assets();
                debug!("Cleared export assets");
            });
            true
        }
        _ => false,
    };

    let styles = host.active_styles();
    let document = PrintableDocument {
        candidate_name: request.candidate_name,
        template: request.template,
        styles: &styles,
        photo: request.photo,
        body_html: request.html,
    }
    .render();

    context.write(&document);
    context.close();

    info!(
        "Exported resume with template {} ({} bytes, download #{})",
        request.template.slug(),
        document.len(),
        receipt.downloads
    );

    Ok(ExportReceipt {
        context,
        downloads: receipt.downloads,
        assets_scheduled,
    })
}

/// Print context that buffers the document, used when the "new context" is
/// an HTTP response body.
#[derive(Debug, Default)]
pub struct BufferedContext {
    pub document: String,
    pub closed: bool,
}

impl PrintContext for BufferedContext {
    fn write(&mut self, html: &str) {
        self.document.push_str(html);
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Host whose contexts are buffers; it always opens.
#[derive(Debug, Default)]
pub struct BufferedHost {
    pub styles: Vec<String>,
}

impl PrintHost for BufferedHost {
    type Context = BufferedContext;

    fn open_context(&self) -> Option<BufferedContext> {
        Some(BufferedContext::default())
    }

    fn active_styles(&self) -> Vec<String> {
        self.styles.clone()
    }
}
