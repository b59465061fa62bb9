use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page} does not exist (document has {total} pages)")]
    PageOutOfRange { page: u32, total: usize },

    #[error("page {0} has no usable /MediaBox")]
    MissingMediaBox(u32),

    #[error("nothing to merge")]
    NoInputs,

    #[error("{0}")]
    Other(String),
}
