// Mon Aug 3 2026 - Alex

#![allow(dead_code)]

pub mod analyzer;
pub mod compare;
pub mod config;
pub mod corpus;
pub mod image;
pub mod layout;
pub mod manifest;
pub mod output;
pub mod repo;
pub mod spawn;

pub use analyzer::HlilAnalyzer;
pub use compare::{compare_manifests, ComparisonReport};
pub use config::Config;
pub use corpus::Corpus;
pub use image::BinaryImage;
pub use manifest::{build_hlil_manifest, HlilSpawnInfo, RepoSpawnInfo, SpawnFlagOps};
pub use output::ManifestWriter;
pub use repo::RepoParser;
