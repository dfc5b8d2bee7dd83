#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("worker pool needs at least one worker")]
    InvalidConcurrency,
}

pub type Result<T> = std::result::Result<T, Error>;
