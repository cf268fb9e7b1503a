use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureKeyError {
    #[error("texture key must not be empty")]
    Empty,
    #[error("texture key must not start or end with '/'")]
    EdgeSlash,
    #[error("texture key must not contain '..'")]
    ParentTraversal,
    #[error("texture key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys double as relative file stems under the texture override directory,
/// so they stay lowercase and path-safe.
pub(crate) fn validate_texture_key(key: &str) -> Result<(), TextureKeyError> {
    if key.is_empty() {
        return Err(TextureKeyError::Empty);
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(TextureKeyError::EdgeSlash);
    }
    if key.contains("..") {
        return Err(TextureKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(TextureKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tile_and_actor_keys() {
        for key in ["player", "tile/road", "actor/npc-struck", "tile_2"] {
            assert!(validate_texture_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_unsafe_keys() {
        assert_eq!(validate_texture_key(""), Err(TextureKeyError::Empty));
        assert_eq!(validate_texture_key("/road"), Err(TextureKeyError::EdgeSlash));
        assert_eq!(validate_texture_key("tile/"), Err(TextureKeyError::EdgeSlash));
        assert_eq!(
            validate_texture_key("tile/../x"),
            Err(TextureKeyError::ParentTraversal)
        );
        assert_eq!(
            validate_texture_key("Road"),
            Err(TextureKeyError::InvalidCharacter { character: 'R' })
        );
        assert!(validate_texture_key(r"a\b").is_err());
    }
}
