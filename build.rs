use std::{
    env, fs,
    path::{Path, PathBuf},
};

#[path = "src/loader/classify.rs"]
#[allow(dead_code)]
mod classify;

use classify::{
    EntryClass, INDEX_FILE, LAMBDA_DIR, SkipReason, classify_entry, classify_lambda_entry,
};

#[derive(Debug, Clone)]
struct ModuleEntry {
    path: String,
    kind: &'static str,
    register_fn: String,
}

fn list_dir(dir: &Path) -> Vec<(String, PathBuf)> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read {}: {}", dir.display(), err));
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.unwrap_or_else(|err| panic!("failed to read dir entry: {}", err));
        let name = entry.file_name().to_string_lossy().into_owned();
        out.push((name, entry.path()));
    }
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

fn collect_lambda_entries(lambda_dir: &Path, out: &mut Vec<ModuleEntry>) {
    println!("cargo:rerun-if-changed={}", lambda_dir.display());
    for (name, path) in list_dir(lambda_dir) {
        match classify_lambda_entry(&name) {
            EntryClass::Module if path.is_file() => {
                let module = classify::module_name(&name);
                out.push(ModuleEntry {
                    path: format!("{LAMBDA_DIR}/{name}"),
                    kind: "ModuleKind::Lambda",
                    register_fn: format!("crate::modules::{LAMBDA_DIR}::{module}::register"),
                });
            }
            EntryClass::Skip(reason) if reason != SkipReason::Index => {
                println!("cargo:warning=skipping lambda entry {name} ({reason:?})");
            }
            _ => {}
        }
    }
}

fn collect_entries(modules_dir: &Path) -> Vec<ModuleEntry> {
    let mut out = Vec::new();
    for (name, path) in list_dir(modules_dir) {
        match classify_entry(&name) {
            EntryClass::Skip(_) => {}
            EntryClass::LambdaDir => collect_lambda_entries(&path, &mut out),
            EntryClass::Directory => {
                let index = path.join(INDEX_FILE);
                if !index.is_file() {
                    println!(
                        "cargo:warning=skipping {name}: no {INDEX_FILE} found in {}",
                        path.display()
                    );
                    continue;
                }
                out.push(ModuleEntry {
                    path: format!("{name}/{INDEX_FILE}"),
                    kind: "ModuleKind::Table",
                    register_fn: format!("crate::modules::{name}::register"),
                });
            }
            EntryClass::Module => {
                let module = classify::module_name(&name);
                out.push(ModuleEntry {
                    path: name.clone(),
                    kind: "ModuleKind::Table",
                    register_fn: format!("crate::modules::{module}::register"),
                });
            }
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

fn escape_rust_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/loader/classify.rs");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR");
    let modules_dir = Path::new(&manifest_dir).join("src/modules");
    println!("cargo:rerun-if-changed={}", modules_dir.display());

    let entries = collect_entries(&modules_dir);

    let out_dir = env::var("OUT_DIR").expect("missing OUT_DIR");
    let out_path = Path::new(&out_dir).join("modules_generated.rs");
    let mut output = String::from("pub static MODULES: &[ModuleEntry] = &[\n");
    for entry in entries {
        output.push_str(&format!(
            "    ModuleEntry {{ path: \"{}\", kind: {}, register: {} }},\n",
            escape_rust_string(&entry.path),
            entry.kind,
            entry.register_fn
        ));
    }
    output.push_str("];\n");

    fs::write(&out_path, output)
        .unwrap_or_else(|err| panic!("failed to write {}: {}", out_path.display(), err));
}
