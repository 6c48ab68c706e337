use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty interaction matrix: {users} users and {items} items survived filtering")]
    EmptyMatrix { users: usize, items: usize },

    #[error("Recommender has no data loaded")]
    NotLoaded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for the variants the caller caused (bad name, bad `n`, ...).
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Error::InvalidParameter(_))
    }

    /// True when the data behind the recommender is missing or unusable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::DataUnavailable(_) | Error::NotLoaded)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
