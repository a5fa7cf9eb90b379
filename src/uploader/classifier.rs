use super::types::{ErrorKind, UploadFailure};

/// Map a raised failure to its kind using only the discriminator.
///
/// Unknown or missing discriminators fall through to `OtherError`, so a new
/// upstream failure type is reported and offered a retry rather than dropped.
pub fn classify(failure: &UploadFailure) -> ErrorKind {
    match failure.discriminator.as_deref() {
        Some(ErrorKind::SIZE_DISCRIMINATOR) => ErrorKind::SizeError,
        Some(ErrorKind::VALID_DISCRIMINATOR) => ErrorKind::ValidError,
        Some(other) => {
            log::debug!("Unrecognised failure discriminator '{}', treating as retryable", other);
            ErrorKind::OtherError
        }
        None => ErrorKind::OtherError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_discriminators_map_directly() {
        assert_eq!(classify(&UploadFailure::size("big")), ErrorKind::SizeError);
        assert_eq!(classify(&UploadFailure::valid("bad")), ErrorKind::ValidError);
    }

    #[test]
    fn test_unknown_and_missing_default_to_other() {
        assert_eq!(
            classify(&UploadFailure::new(Some("TimeoutError"), "slow")),
            ErrorKind::OtherError
        );
        assert_eq!(
            classify(&UploadFailure::new(Some("OtherError"), "x")),
            ErrorKind::OtherError
        );
        assert_eq!(classify(&UploadFailure::other("x")), ErrorKind::OtherError);
    }

    #[test]
    fn test_message_text_is_ignored() {
        let failure = UploadFailure::other("SizeError: file too large");
        assert_eq!(classify(&failure), ErrorKind::OtherError);
    }

    #[test]
    fn test_discriminator_match_is_exact() {
        assert_eq!(
            classify(&UploadFailure::new(Some("sizeerror"), "x")),
            ErrorKind::OtherError
        );
    }
}
