/// TexHub Core: texture discovery, colour indexing and the catalog.
///
/// This crate contains all business logic with zero UI dependencies. The
/// `texhub` binary is one frontend; an editor integration would be another.
///
/// # Modules
///
/// - [`model`]: Categories, colours, candidates and catalog records.
/// - [`host`]: The project tree: enumeration, identities, pixel decoding.
/// - [`scanner`]: Folder and material-property scanners.
/// - [`features`]: Colour signature and spread extraction.
/// - [`hashing`]: Content digests with a per-scan memo cache.
/// - [`catalog`]: The persistent catalog store and merge logic.
/// - [`orchestrator`]: Full and incremental scans with progress and cancellation.
/// - [`analysis`]: Browse, duplicate and export queries over the catalog.
/// - [`library`]: Copying textures into category folders and the library.
/// - [`changes`]: Import notifications mapped to incremental scans.
/// - [`config`]: Layered `texhub.toml` configuration.
pub mod analysis;
pub mod catalog;
pub mod changes;
pub mod config;
pub mod error;
pub mod features;
pub mod hashing;
pub mod host;
pub mod library;
pub mod model;
pub mod orchestrator;
pub mod scanner;
