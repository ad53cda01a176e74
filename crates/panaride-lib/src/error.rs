use thiserror::Error;

/// Convenient result alias for the Panaride library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when the exchange-rate source answered with a non-success status.
    #[error("rate source returned HTTP {status}")]
    RateSourceStatus { status: u16 },

    /// Raised when the exchange-rate response carried neither an average nor a
    /// sell quote.
    #[error("rate source response carried no usable rate field")]
    RateSourceMissingField,

    /// Raised when the collection store rejected a request.
    #[error("store request failed with HTTP {status}: {detail}")]
    StoreRequest { status: u16, detail: String },

    /// Raised when a ride id did not match any stored record.
    #[error("unknown ride id: {id}")]
    RideNotFound { id: String },

    /// Raised when a driver id did not match any stored record.
    #[error("unknown driver id: {id}")]
    DriverNotFound { id: String },

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
