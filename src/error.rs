use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape with is invalid. Selector: {0}")]
    ParseInvalidSelector(String),

    #[error("Invalid place type: {0}. Expected \"Address\" or \"Headquarters\".")]
    InvalidPlaceType(String),

    #[error("Can't sample {requested} profiles out of {available}.")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("The table is missing the column: {0}")]
    MissingColumn(String),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Waiting for the site was cancelled.")]
    Cancelled,

    #[error("Browser Error: {0}")]
    Browser(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),
}
