use arboard::Clipboard;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write clipboard: {0}")]
    Write(String),
}

/// Platform write-to-clipboard primitive
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard backed by `arboard`. The handle is opened on first use so
/// headless sessions only fail when a copy is actually attempted.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        if self.inner.is_none() {
            let clipboard =
                Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }

        match self.inner.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text.to_owned())
                .map_err(|e| ClipboardError::Write(e.to_string())),
            None => Err(ClipboardError::Unavailable("not initialised".to_string())),
        }
    }
}

/// Copies code segments to the clipboard, logging failures instead of raising them.
pub struct ClipboardExporter {
    writer: Box<dyn ClipboardWriter>,
}

impl ClipboardExporter {
    pub fn new(writer: Box<dyn ClipboardWriter>) -> Self {
        Self { writer }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard::default()))
    }

    /// Copy `content` unmodified. Fence markers must already be stripped.
    pub fn copy(&mut self, content: &str) -> bool {
        match self.writer.write_text(content) {
            Ok(()) => {
                tracing::debug!(bytes = content.len(), "copied code segment");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to copy code segment");
                false
            }
        }
    }
}
