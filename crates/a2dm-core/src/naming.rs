//! Default output filename derivation from the task URL.

/// Fallback when the URL path yields no usable filename.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Derives a Linux-safe output filename from a URL.
///
/// Takes the last non-empty path segment, sanitizes it, and falls back to
/// [`DEFAULT_FILENAME`] for root paths or unparsable URLs.
pub fn filename_for_url(url: &str) -> String {
    match last_path_segment(url) {
        Some(segment) => {
            let name = sanitize_filename(&segment);
            if name.is_empty() {
                DEFAULT_FILENAME.to_string()
            } else {
                name
            }
        }
        None => DEFAULT_FILENAME.to_string(),
    }
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let path = parsed.path();
    let segment = path.split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Sanitizes a candidate filename for safe use on Linux.
///
/// - Replaces NUL, `/`, `\`, whitespace and control characters with `_`
/// - Trims leading/trailing spaces, dots and underscores
/// - Collapses consecutive underscores
/// - Limits length to 255 bytes (Linux NAME_MAX)
pub fn sanitize_filename(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            '_'
        } else if c == ' ' || c == '\t' {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '\t' || c == '.' || c == '_');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_url() {
        assert_eq!(
            filename_for_url("https://example.com/a/b/file.iso"),
            "file.iso"
        );
        assert_eq!(filename_for_url("https://example.com/single"), "single");
    }

    #[test]
    fn query_string_ignored() {
        assert_eq!(
            filename_for_url("https://example.com/file.zip?token=abc"),
            "file.zip"
        );
    }

    #[test]
    fn root_or_unparsable_falls_back() {
        assert_eq!(filename_for_url("https://example.com/"), DEFAULT_FILENAME);
        assert_eq!(filename_for_url("https://example.com"), DEFAULT_FILENAME);
        assert_eq!(filename_for_url("not a url"), DEFAULT_FILENAME);
    }

    #[test]
    fn sanitize_removes_slash_and_backslash() {
        assert_eq!(sanitize_filename("a/b\\c.txt"), "a_b_c.txt");
    }

    #[test]
    fn sanitize_trims_and_collapses() {
        assert_eq!(sanitize_filename("  ..  file.txt  ..  "), "file.txt");
        assert_eq!(sanitize_filename("file___name.txt"), "file_name.txt");
        assert_eq!(sanitize_filename("file\x00name.txt"), "file_name.txt");
    }

    #[test]
    fn percent_encoded_segment_kept_verbatim() {
        assert_eq!(
            filename_for_url("https://example.com/dl/some%20file.tar.gz"),
            "some%20file.tar.gz"
        );
    }
}
