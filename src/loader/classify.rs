// Shared by build.rs through `#[path]`; keep this file free of crate imports.

pub const LAMBDA_DIR: &str = "lambda";
pub const MODULE_EXTENSION: &str = "rs";
pub const INDEX_FILE: &str = "mod.rs";

const ALWAYS_SKIPPED: [&str; 2] = [INDEX_FILE, ".DS_Store"];
const ASSET_EXTENSIONS: [&str; 2] = ["sql", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Index,
    Asset,
    NotAModule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Skip(SkipReason),
    /// The `lambda` directory: children are registered flat.
    LambdaDir,
    /// No `.rs` extension: registered through `<entry>/mod.rs`.
    Directory,
    Module,
}

fn extension(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => Some(ext),
        _ => None,
    }
}

/// Classifies a top-level entry of the modules directory.
pub fn classify_entry(name: &str) -> EntryClass {
    if ALWAYS_SKIPPED.contains(&name) {
        return EntryClass::Skip(SkipReason::Index);
    }
    if name == LAMBDA_DIR {
        return EntryClass::LambdaDir;
    }
    match extension(name) {
        Some(ext) if ASSET_EXTENSIONS.contains(&ext) => EntryClass::Skip(SkipReason::Asset),
        Some(MODULE_EXTENSION) => EntryClass::Module,
        _ => EntryClass::Directory,
    }
}

/// Classifies a child of the `lambda` directory. Only `.rs` files qualify and
/// there is no further recursion.
pub fn classify_lambda_entry(name: &str) -> EntryClass {
    if ALWAYS_SKIPPED.contains(&name) {
        return EntryClass::Skip(SkipReason::Index);
    }
    match extension(name) {
        Some(MODULE_EXTENSION) => EntryClass::Module,
        Some(ext) if ASSET_EXTENSIONS.contains(&ext) => EntryClass::Skip(SkipReason::Asset),
        _ => EntryClass::Skip(SkipReason::NotAModule),
    }
}

/// Rust module name for a registrable entry (`equipment.rs` -> `equipment`).
pub fn module_name(name: &str) -> &str {
    name.strip_suffix(".rs").unwrap_or(name)
}
