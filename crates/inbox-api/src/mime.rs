//! Download naming for stored files.

/// Content type assumed when a block has none
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.trim().to_ascii_lowercase();
    mime_guess::get_mime_extensions_str(&content_type).and_then(|exts| exts.first().copied())
}

/// Filename offered in `Content-Disposition`: the stored name, else
/// `attachment.<ext>` from the content type, else `attachment.<major type>`.
/// Characters that cannot appear in a header value are replaced.
pub fn download_filename(filename: Option<&str>, content_type: &str) -> String {
    let name = match filename.filter(|f| !f.is_empty()) {
        Some(f) => f.to_string(),
        None => match extension_for(content_type) {
            Some(ext) => format!("attachment.{}", ext),
            None => {
                tracing::warn!(content_type, "Unknown extension for content type");
                let major = content_type.split('/').next().unwrap_or("bin");
                format!("attachment.{}", major)
            }
        },
    };

    name.chars()
        .map(|c| match c {
            ' '..='~' if c != '"' && c != '\\' && c != ';' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename(Some("report.pdf"), "application/pdf"), "report.pdf");
        assert_eq!(download_filename(None, "IMAGE/PNG"), "attachment.png");
        assert_eq!(download_filename(None, "application/x-unknown"), "attachment.application");
        assert_eq!(download_filename(Some("résumé \"v2\".doc"), "text/plain"), "r_sum_ _v2_.doc");
    }

    #[test]
    fn test_less_common_types_resolve() {
        assert_eq!(extension_for("application/x-7z-compressed"), Some("7z"));
        assert_eq!(extension_for("application/pdf"), Some("pdf"));

        for (content_type, major) in [
            ("audio/mp4", "audio"),
            ("image/heic", "image"),
            ("text/markdown", "text"),
        ] {
            assert!(extension_for(content_type).is_some(), "{}", content_type);
            assert_ne!(download_filename(None, content_type), format!("attachment.{}", major));
        }
    }
}
