use thiserror::Error;

/// Failures while fetching or decoding one of the two input documents.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode CSV from {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },
}

/// Failures after the data arrived: the render cannot proceed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("topology has no object named '{0}'")]
    MissingObject(String),

    #[error("unsupported boundary document type: {0}")]
    UnsupportedSource(String),

    #[error("malformed topology: {0}")]
    MalformedTopology(String),

    #[error("invalid colour '{0}'")]
    InvalidColor(String),

    #[error("no county features to render")]
    NoFeatures,
}

/// Any failure of the fetch → transform → join → render pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
