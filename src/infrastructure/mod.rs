// Infrastructure adapters for stubdoc: file trees, surface sources and the worker pool.

pub mod concurrency;
pub mod snapshot_file;
pub mod source_tree;
pub mod stub_scanner;

pub use snapshot_file::JsonSnapshotFile;
pub use source_tree::SourceTree;
pub use stub_scanner::{StubModule, StubSurfaceScanner};
