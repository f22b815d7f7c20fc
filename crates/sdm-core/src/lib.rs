pub mod config;
pub mod logging;

pub mod downloader;
pub mod probe;
pub mod retry;
pub mod segmenter;
pub mod storage;
pub mod transfer;
pub mod url_model;
