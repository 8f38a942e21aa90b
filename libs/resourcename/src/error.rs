use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Resource name is empty")]
    Empty,

    #[error("Resource name '{0}' starts with '/'")]
    LeadingSlash(String),

    #[error("Resource name '{0}' ends with '/'")]
    TrailingSlash(String),

    #[error("Resource name '{name}' has an empty segment at index {index}")]
    EmptySegment { name: String, index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
