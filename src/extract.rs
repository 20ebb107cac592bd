//! Per-page PDF text extraction with OCR fallback.
//!
//! Text is pulled from each page with `pdf-extract`. A page that yields no
//! text (typically a scanned image) is rendered with `pdftoppm` and read
//! with `tesseract`. If OCR is disabled, unavailable, or also finds nothing,
//! the page contributes zero words; that is logged, not treated as an error.
//! Each OCR subprocess is killed once `ocr.timeout_secs` elapses.
//!
//! Extraction is CPU-bound and may spawn subprocesses, so async callers run
//! it on a blocking thread.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::ScopedJoinHandle;
use std::time::{Duration, Instant};

use studydesk_core::models::PageText;
use studydesk_core::{RagError, Result};

use crate::config::OcrConfig;

/// Turns raw document bytes into page-ordered text.
pub trait TextExtractor: Send + Sync {
    /// Extract text per page. Page numbers are 1-indexed and ascending.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>>;
}

/// PDF extractor backed by `pdf-extract`, with optional OCR for blank pages.
pub struct PdfExtractor {
    ocr: Option<OcrConfig>,
}

impl PdfExtractor {
    pub fn new(ocr: &OcrConfig) -> Self {
        Self {
            ocr: ocr.enabled.then(|| ocr.clone()),
        }
    }

    /// Extractor that never shells out to OCR tools.
    pub fn without_ocr() -> Self {
        Self { ocr: None }
    }
}

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>> {
        let raw_pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| RagError::Extraction(format!("PDF extraction failed: {}", e)))?;

        let mut pages = Vec::with_capacity(raw_pages.len());
        for (i, text) in raw_pages.into_iter().enumerate() {
            let page_number = i as i64 + 1;
            if !text.trim().is_empty() {
                tracing::debug!(page = page_number, words = text.split_whitespace().count(), "extracted text");
                pages.push(PageText::new(text, page_number));
                continue;
            }

            let text = match &self.ocr {
                Some(ocr) => {
                    tracing::info!(page = page_number, "no text found, applying OCR");
                    match ocr_page(ocr, bytes, page_number) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(page = page_number, error = %e, "OCR failed, page skipped");
                            String::new()
                        }
                    }
                }
                None => String::new(),
            };
            if text.trim().is_empty() {
                tracing::warn!(page = page_number, "page has no extractable text");
            }
            pages.push(PageText::new(text, page_number));
        }

        Ok(pages)
    }
}

/// Render one page to PNG and OCR it.
///
/// Both tools are driven over stdin/stdout so no temporary files are needed.
fn ocr_page(ocr: &OcrConfig, pdf: &[u8], page_number: i64) -> Result<String> {
    let page = page_number.to_string();
    let dpi = ocr.dpi.to_string();
    let timeout = Duration::from_secs(ocr.timeout_secs);
    let png = run_piped(
        &ocr.pdftoppm_cmd,
        &["-f", &page, "-l", &page, "-r", &dpi, "-png", "-singlefile", "-"],
        pdf,
        timeout,
    )?;
    if png.is_empty() {
        return Err(RagError::Extraction(format!(
            "{} produced no image for page {}",
            ocr.pdftoppm_cmd, page_number
        )));
    }

    let text = run_piped(
        &ocr.tesseract_cmd,
        &["stdin", "stdout", "-l", &ocr.language],
        &png,
        timeout,
    )?;
    Ok(String::from_utf8_lossy(&text).into_owned())
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run `program` with `input` on stdin and return its stdout.
///
/// The child is killed if it has not exited within `timeout`.
fn run_piped(program: &str, args: &[&str], input: &[u8], timeout: Duration) -> Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| RagError::Extraction(format!("failed to run {}: {}", program, e)))?;

    let (mut stdin, mut stdout, mut stderr) =
        match (child.stdin.take(), child.stdout.take(), child.stderr.take()) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RagError::Extraction(format!("{}: pipes unavailable", program)));
            }
        };

    // Every pipe gets its own thread so a full buffer cannot stall the wait.
    let (status, output, errors, written) = std::thread::scope(|scope| {
        let writer = scope.spawn(move || stdin.write_all(input));
        let out_reader = scope.spawn(move || read_to_vec(&mut stdout));
        let err_reader = scope.spawn(move || read_to_vec(&mut stderr));
        let status = wait_with_deadline(&mut child, timeout).inspect_err(|_| {
            let _ = child.kill();
            let _ = child.wait();
        });
        (status, join_pipe(out_reader), join_pipe(err_reader), join_pipe(writer))
    });

    let status = status
        .map_err(|e| RagError::Extraction(format!("{}: {}", program, e)))?
        .ok_or_else(|| {
            RagError::Extraction(format!(
                "{} timed out after {}s and was killed",
                program,
                timeout.as_secs()
            ))
        })?;

    // Report a failed exit before any broken-pipe error on stdin.
    if !status.success() {
        return Err(RagError::Extraction(format!(
            "{} exited with {}: {}",
            program,
            status,
            String::from_utf8_lossy(&errors.unwrap_or_default()).trim()
        )));
    }
    written.map_err(|e| RagError::Extraction(format!("{}: writing stdin: {}", program, e)))?;
    output.map_err(|e| RagError::Extraction(format!("{}: reading stdout: {}", program, e)))
}

/// Wait for `child` to exit. `Ok(None)` means it was killed at the deadline.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn read_to_vec(pipe: &mut impl Read) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    pipe.read_to_end(&mut buf)?;
    Ok(buf)
}

fn join_pipe<T>(handle: ScopedJoinHandle<'_, std::io::Result<T>>) -> std::io::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(std::io::Error::other("pipe thread panicked")))
}
