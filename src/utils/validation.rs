use std::path::Path;

/// Leading bytes of every PDF document
const PDF_MAGIC: &[u8] = b"%PDF";

/// Characters that never survive into an uploaded file name
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', ';'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::new("EMPTY_FILE", "File appears to be empty"));
    }
    if size > max_size {
        return Err(ValidationError::new(
            "FILE_TOO_LARGE",
            format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        ));
    }
    Ok(())
}

/// Guesses the MIME type the way a browser file picker does: by extension.
pub fn mime_from_path(path: &Path) -> mime::Mime {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Only `application/pdf` is accepted, parameters ignored.
pub fn validate_mime_type(content_type: &str) -> Result<(), ValidationError> {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    if normalized == mime::APPLICATION_PDF.essence_str() {
        return Ok(());
    }

    Err(ValidationError::new(
        "INVALID_MIME_TYPE",
        format!("MIME type '{}' is not allowed. Only PDF files are accepted.", content_type),
    ))
}

/// Checks that the content really is a PDF, not just named like one.
pub fn verify_magic_bytes(header: &[u8]) -> Result<(), ValidationError> {
    if header.is_empty() {
        return Err(ValidationError::new("EMPTY_FILE", "File appears to be empty"));
    }

    let detected = infer::get(header).map(|kind| kind.mime_type());
    if detected == Some("application/pdf") || header.starts_with(PDF_MAGIC) {
        return Ok(());
    }

    Err(ValidationError::new(
        "NOT_A_PDF",
        format!(
            "File content does not look like a PDF (detected: {})",
            detected.unwrap_or("unknown")
        ),
    ))
}

/// Strips any directory part and replaces reserved characters.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() {
        return Err(ValidationError::new(
            "INVALID_FILENAME",
            "Filename cannot be empty",
        ));
    }

    if name.starts_with('.') {
        return Err(ValidationError::new(
            "HIDDEN_FILE",
            "Hidden files (starting with '.') are not allowed",
        ));
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        return Ok(sanitized[..end].to_string());
    }

    Ok(sanitized)
}

/// Full validation pipeline run before a paper leaves the machine.
/// Returns the file name to upload under.
pub fn validate_pdf_upload(
    filename: &str,
    content_type: &str,
    size: usize,
    header: &[u8],
    max_size: usize,
) -> Result<String, ValidationError> {
    validate_mime_type(content_type)?;
    validate_file_size(size, max_size)?;
    verify_magic_bytes(header)?;
    sanitize_filename(filename)
}
