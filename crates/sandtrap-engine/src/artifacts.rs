//! Hypervisor artifact path matching
//!
//! Case-insensitive substring match, the same way path heuristics are
//! matched elsewhere in the sandbox: both sides lowercased, then
//! `contains`. Signatures are lowercased once at construction.

use alloc::string::String;
use alloc::vec::Vec;

#[derive(Debug, Clone, Default)]
pub struct ArtifactMatcher {
    signatures: Vec<String>,
}

impl ArtifactMatcher {
    pub fn new<I, S>(signatures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let signatures = signatures
            .into_iter()
            .map(|signature| signature.as_ref().to_lowercase())
            .filter(|signature| !signature.is_empty())
            .collect();
        Self { signatures }
    }

    /// First signature contained in `path`, if any
    pub fn find(&self, path: &str) -> Option<&str> {
        let path = path.to_lowercase();
        self.signatures
            .iter()
            .find(|signature| path.contains(signature.as_str()))
            .map(String::as_str)
    }

    pub fn is_artifact(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
