//! Workspace root package. Exists to anchor shared developer tooling
//! (git hooks via `cargo-husky`); all functionality lives in `crates/`.
