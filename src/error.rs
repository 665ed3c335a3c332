use thiserror::Error;

#[derive(Error, Debug)]
pub enum W2Error {
    #[error("An IO error occurred: `{source}`")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error(transparent)]
    Pud(#[from] crate::PudError),
    #[error(transparent)]
    War(#[from] crate::WarError),
    #[error(transparent)]
    Check(#[from] crate::CheckError),
}

pub type Result<T> = core::result::Result<T, W2Error>;
