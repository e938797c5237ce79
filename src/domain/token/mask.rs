//! Display masking for token secrets

const MASK: &str = "****";
const MASKED_PREFIX: &str = "sk-****";
const MIN_REVEAL_LENGTH: usize = 8;
const REVEALED_SUFFIX: usize = 4;

/// Derive a display-safe form of a secret.
///
/// Secrets shorter than 8 characters are fully hidden. Longer secrets keep
/// only their last 4 characters behind a fixed `sk-****` prefix.
pub fn mask(secret: &str) -> String {
    let length = secret.chars().count();

    if length < MIN_REVEAL_LENGTH {
        return MASK.to_string();
    }

    let suffix: String = secret.chars().skip(length - REVEALED_SUFFIX).collect();
    format!("{}{}", MASKED_PREFIX, suffix)
}
