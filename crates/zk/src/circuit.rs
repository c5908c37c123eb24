//! Circuit working directories.
//!
//! Each circuit lives in its own nargo package:
//!
//! ```text
//! <dir>/
//! ├── Nargo.toml
//! ├── Prover.toml           ← witness written before proving
//! ├── src/**/*.nr           ← circuit source (hashed by the proof cache)
//! ├── target/<package>.json ← compiled circuit (in-process backend)
//! └── proofs/<package>.proof
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::kind::CircuitKind;

/// Location and package name of one circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitHandle {
    kind: CircuitKind,
    dir: PathBuf,
    package: String,
}

impl CircuitHandle {
    /// Package name defaults to the kind's name (`init`, `move`, ...).
    pub fn new(kind: CircuitKind, dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            dir: dir.into(),
            package: kind.default_dir_name().to_string(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn prover_input_path(&self) -> PathBuf {
        self.dir.join("Prover.toml")
    }

    pub fn proof_path(&self) -> PathBuf {
        self.dir
            .join("proofs")
            .join(format!("{}.proof", self.package))
    }

    pub fn compiled_path(&self) -> PathBuf {
        self.dir
            .join("target")
            .join(format!("{}.json", self.package))
    }

    pub fn source_dir(&self) -> PathBuf {
        self.dir.join("src")
    }

    /// All source files under `src/`, concatenated in path order.
    ///
    /// Each file contributes its relative path, a NUL byte, then its contents,
    /// so moving code between files also changes the bytes.
    pub fn read_source(&self) -> io::Result<Vec<u8>> {
        let root = self.source_dir();
        let mut files = Vec::new();
        collect_files(&root, &mut files)?;
        if files.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no circuit sources under {}", root.display()),
            ));
        }
        files.sort();

        let mut source = Vec::new();
        for path in files {
            let relative = path.strip_prefix(&root).unwrap_or(&path);
            source.extend_from_slice(relative.to_string_lossy().as_bytes());
            source.push(0);
            source.extend_from_slice(&fs::read(&path)?);
        }
        Ok(source)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
