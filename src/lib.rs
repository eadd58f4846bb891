//! Resolver and downloader for the EEGEYENET EEG + eye-tracking dataset.
//!
//! Maps (subject, run) pairs to remote resource locations and integrity
//! hashes via a static catalog, and orchestrates downloads through a
//! pluggable fetch collaborator while working around its folder-keyed
//! caching.

pub mod catalog;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod http;
pub mod output;
pub mod store;
