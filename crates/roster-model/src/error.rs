use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("separator list is empty")]
    EmptySeparators,
    #[error("separator {0:?} is not a single visible character or space")]
    InvalidSeparator(char),
}

pub type Result<T> = std::result::Result<T, ModelError>;
