//! Build script for the web crate.
//!
//! Hashes the static assets that pages link to so their URLs change with
//! their content (`?v=<hash>`), letting browsers cache them aggressively.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Assets and the compile-time variable holding each one's hash.
const HASHED_ASSETS: &[(&str, &str)] = &[
    ("static/css/main.css", "CSS_HASH"),
    ("static/js/session.js", "JS_HASH"),
];

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set; asset hashes left empty");
        for (_, var) in HASHED_ASSETS {
            println!("cargo:rustc-env={var}=");
        }
        return;
    };

    for (relative, var) in HASHED_ASSETS {
        let path = Path::new(&manifest_dir).join(relative);
        println!("cargo:rerun-if-changed={}", path.display());
        println!("cargo:rustc-env={var}={}", short_hash(&path));
    }
}

/// First 8 hex chars of the file's SHA-256, or empty if it cannot be read.
fn short_hash(path: &Path) -> String {
    match fs::read(path) {
        Ok(content) => {
            let digest = format!("{:x}", Sha256::digest(&content));
            digest.chars().take(8).collect()
        }
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", path.display());
            String::new()
        }
    }
}
