use crate::rasterize::RasterizeError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("SVG parse error: {message}")]
    Parse { message: String },

    #[error("Not an SVG document: root element is <{root}>")]
    NotSvg { root: String },

    #[error("SVG input is not valid UTF-8")]
    InvalidUtf8,

    #[error("No SVG document is loaded")]
    NoDocument,

    #[error("Unsupported image file: {name}")]
    UnsupportedImage { name: String },

    #[error("Invalid editor options: {message}")]
    InvalidOptions { message: String },

    #[error(transparent)]
    Rasterize(#[from] RasterizeError),
}

impl From<roxmltree::Error> for Error {
    fn from(value: roxmltree::Error) -> Self {
        Self::Parse {
            message: value.to_string(),
        }
    }
}
