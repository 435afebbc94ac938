use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{method} {url} failed: {source}"))]
    RequestError {
        url: String,
        method: String,
        source: ureq::Error,
    },
    #[snafu(display("Unreadable response from {url}: {message}"))]
    ResponseError { url: String, message: String },
    #[snafu(display("Malformed MAAS credential: {message}"))]
    CredentialError { message: String },
    #[snafu(display("{prefix}: {message}"))]
    ConfigError { message: String, prefix: String },
    #[snafu(display("{message}"))]
    AllocationError { message: String },
    #[snafu(display("{operation} is not implemented by this driver"))]
    NotImplementedError { operation: String },
}

pub type Result<T> = std::result::Result<T, Error>;
