/// Why an uploaded file name was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    /// Contains `/`, `\`, NUL or another control character.
    IllegalCharacter,
    /// Starts with a dot.
    Hidden,
    MissingExtension,
    ExtensionNotAllowed { extension: String, allowed: String },
    NotAnImage,
}

impl FilenameError {
    pub fn message(&self) -> String {
        match self {
            Self::Empty => "File name cannot be empty".into(),
            Self::IllegalCharacter => "File name contains illegal characters".into(),
            Self::Hidden => "Hidden files (starting with '.') are not allowed".into(),
            Self::MissingExtension => "File must have an extension".into(),
            Self::ExtensionNotAllowed { extension, allowed } => {
                format!("Files of type '{extension}' are not allowed (allowed: {allowed})")
            }
            Self::NotAnImage => "File must be an image".into(),
        }
    }
}

/// Validates a client-supplied file name with no directory components.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed
        .chars()
        .any(|c| c.is_ascii_control() || c == '/' || c == '\\')
    {
        return Err(FilenameError::IllegalCharacter);
    }
    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Lowercased extension of `filename`, without the dot.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validate `filename` and return its extension if it is in `allowed`.
pub fn allowed_extension(filename: &str, allowed: &[String]) -> Result<String, FilenameError> {
    let name = validate_flat_filename(filename)?;
    let ext = extension_of(name).ok_or(FilenameError::MissingExtension)?;
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        Ok(ext)
    } else {
        Err(FilenameError::ExtensionNotAllowed {
            extension: ext,
            allowed: allowed.join(", "),
        })
    }
}

/// Extensions accepted for profile photos and gallery images.
pub fn image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Like [`allowed_extension`] against [`image_extensions`], also checking the guessed MIME type.
pub fn image_extension(filename: &str) -> Result<String, FilenameError> {
    let ext = allowed_extension(filename, &image_extensions())?;
    let is_image = mime_guess::from_ext(&ext)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
    if is_image {
        Ok(ext)
    } else {
        Err(FilenameError::NotAnImage)
    }
}
