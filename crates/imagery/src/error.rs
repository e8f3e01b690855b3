use crate::remote::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageryError {
    #[error("Invalid image: the upload could not be identified")]
    InvalidImage,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid variant name: {0}")]
    InvalidVariant(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Converter error: {0}")]
    Converter(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ImageryError {
    /// True when the failure came from the caller's input rather than the environment.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ImageryError::InvalidImage
                | ImageryError::InvalidGeometry(_)
                | ImageryError::InvalidIdentity(_)
                | ImageryError::InvalidVariant(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ImageryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_input_failures_are_rejections() {
        assert!(ImageryError::InvalidImage.is_rejection());
        assert!(ImageryError::InvalidIdentity("..".into()).is_rejection());
        assert!(ImageryError::InvalidVariant("original".into()).is_rejection());
        assert!(!ImageryError::Converter("gm: not found".into()).is_rejection());
        assert!(!ImageryError::Remote(RemoteError::NotConnected).is_rejection());
    }
}
