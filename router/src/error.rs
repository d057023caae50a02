use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("unknown net '{0}'")]
    UnknownNet(String),
    #[error("cannot route net '{net}' with {sources} source pins")]
    InvalidNetShape { net: String, sources: usize },
    #[error("the process was aborted by the user")]
    UserAborted,
    #[error("no start location given")]
    NoStartLocation,
    #[error("no path found to sink {sink}")]
    PathNotFound { sink: String },
}
