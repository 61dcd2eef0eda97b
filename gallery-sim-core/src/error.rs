//! Error types for the simulation core

use crate::links::LinkError;
use gallery_sim_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Simulation errors. None of these stop a worker; they are recorded as
/// failed actions or logged cleanup failures.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to scan images directory {path}: {source}")]
    ImageScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No images available to upload")]
    NoImages,

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Page parsing error: {0}")]
    Link(#[from] LinkError),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
