pub mod document;
pub mod pipeline;

pub use document::{PhotoOffset, PhotoOverlay, PrintableDocument, PRINT_DELAY_MS};
pub use pipeline::{
    export_document, AssetCleanup, BufferedContext, BufferedHost, DownloadReceipt, ExportError,
    ExportReceipt, ExportRequest, GateError, PrintContext, PrintHost, UsageGate,
};
