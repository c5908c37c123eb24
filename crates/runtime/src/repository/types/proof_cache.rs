//! Cache keys, content hashes and the persisted index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use df_zk::{CircuitKind, ProofBackend, ProofBytes};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Stable name of a scenario, e.g. `planet_1_init`.
///
/// Used verbatim as a file name, so it is limited to ASCII letters, digits,
/// `_`, `-` and `.`, and may not start with `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TestCaseId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid test case id `{0}`")]
pub struct InvalidTestCaseId(pub String);

impl TestCaseId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidTestCaseId> {
        let id = id.into();
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if valid { Ok(Self(id)) } else { Err(InvalidTestCaseId(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TestCaseId {
    type Err = InvalidTestCaseId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TestCaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 over the serialized witness followed by the circuit source.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn compute(witness: &[u8], circuit_source: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(witness);
        hasher.update(circuit_source);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Provenance recorded alongside every proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub circuit_kind: CircuitKind,
    pub content_hash: ContentHash,
    pub generated_at: DateTime<Utc>,
    pub backend: ProofBackend,
}

/// A generated proof. Never modified once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifact {
    bytes: ProofBytes,
    metadata: ArtifactMetadata,
}

impl ProofArtifact {
    pub fn new(bytes: ProofBytes, metadata: ArtifactMetadata) -> Self {
        Self { bytes, metadata }
    }

    pub fn bytes(&self) -> &ProofBytes {
        &self.bytes
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn kind(&self) -> CircuitKind {
        self.metadata.circuit_kind
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.metadata.content_hash
    }

    /// `0x`-prefixed hex of the proof bytes.
    pub fn to_hex(&self) -> String {
        self.bytes.to_hex()
    }
}

/// Index record for one cached proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub test_case: TestCaseId,

    #[serde(flatten)]
    pub metadata: ArtifactMetadata,

    /// File name under `artifacts/<kind>/`.
    pub proof_file: String,

    /// Size of the proof file in bytes.
    pub size: u64,
}

impl CacheEntry {
    pub fn kind(&self) -> CircuitKind {
        self.metadata.circuit_kind
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.metadata.content_hash
    }

    pub fn key(&self) -> String {
        CacheIndex::key(self.kind(), &self.test_case)
    }
}

/// Persisted form of the cache: every entry, keyed by `<kind>/<test_case>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheIndex {
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CacheIndex {
    pub fn key(kind: CircuitKind, test_case: &TestCaseId) -> String {
        format!("{kind}/{test_case}")
    }

    pub fn get(&self, kind: CircuitKind, test_case: &TestCaseId) -> Option<&CacheEntry> {
        self.entries.get(&Self::key(kind, test_case))
    }

    /// Replace the entry for the same key, returning the one it displaced.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(entry.key(), entry)
    }

    pub fn remove(&mut self, kind: CircuitKind, test_case: &TestCaseId) -> Option<CacheEntry> {
        self.entries.remove(&Self::key(kind, test_case))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_ids_are_file_safe() {
        assert!(TestCaseId::new("planet_1_init").is_ok());
        assert!(TestCaseId::new("move-v2.negative").is_ok());

        for bad in ["", ".hidden", "../escape", "a/b", "with space"] {
            assert_eq!(
                TestCaseId::new(bad),
                Err(InvalidTestCaseId(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn content_hash_covers_witness_and_source() {
        let base = ContentHash::compute(b"perlin = \"0x10\"\n", b"main.nr\0fn main() {}");

        assert_eq!(
            base,
            ContentHash::compute(b"perlin = \"0x10\"\n", b"main.nr\0fn main() {}")
        );
        assert_ne!(
            base,
            ContentHash::compute(b"perlin = \"0x11\"\n", b"main.nr\0fn main() {}")
        );
        assert_ne!(
            base,
            ContentHash::compute(b"perlin = \"0x10\"\n", b"main.nr\0fn main() { }")
        );
    }

    #[test]
    fn content_hash_round_trips_through_hex() {
        let hash = ContentHash::compute(b"witness", b"source");
        let parsed: ContentHash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);
        assert!("abcd".parse::<ContentHash>().is_err());
    }

    #[test]
    fn index_replaces_whole_entries() {
        let test_case = TestCaseId::new("planet_1_init").unwrap();
        let entry = |file: &str| CacheEntry {
            test_case: test_case.clone(),
            metadata: ArtifactMetadata {
                circuit_kind: CircuitKind::Init,
                content_hash: ContentHash::compute(file.as_bytes(), b""),
                generated_at: Utc::now(),
                backend: ProofBackend::Stub,
            },
            proof_file: file.to_string(),
            size: 4,
        };

        let mut index = CacheIndex::default();
        assert!(index.insert(entry("a.proof")).is_none());
        let displaced = index.insert(entry("b.proof")).unwrap();

        assert_eq!(displaced.proof_file, "a.proof");
        assert_eq!(index.entries.len(), 1);
        assert_eq!(
            index.get(CircuitKind::Init, &test_case).unwrap().proof_file,
            "b.proof"
        );
        assert!(index.get(CircuitKind::Move, &test_case).is_none());
    }
}
