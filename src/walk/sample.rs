// src/walk/sample.rs
// =============================================================================
// Code samples and the bounded list that holds them.
//
// A SampleSet enforces three caps:
// - how many samples (the file budget)
// - how long one sample may be (truncated with a marker)
// - how many characters all samples may add up to
// =============================================================================

use super::policy::{WalkPolicy, TRUNCATION_MARKER};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One captured (possibly truncated) source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSample {
    pub path: String,
    /// Lowercase extension without the dot, empty when there is none
    pub extension: String,
    pub content: String,
    /// Length in characters of the content before truncation
    pub content_length: usize,
}

impl CodeSample {
    // Builds a sample, cutting the content at `max_chars` characters
    pub fn new(path: impl Into<String>, content: String, max_chars: Option<usize>) -> Self {
        let path = path.into();
        let extension = Path::new(&path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let content_length = content.chars().count();

        let content = match max_chars {
            Some(limit) if content_length > limit => {
                let mut cut: String = content.chars().take(limit).collect();
                cut.push_str(TRUNCATION_MARKER);
                cut
            }
            _ => content,
        };

        Self {
            path,
            extension,
            content,
            content_length,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.content
            .strip_suffix(TRUNCATION_MARKER)
            .is_some_and(|kept| kept.chars().count() < self.content_length)
    }
}

// Ordered, capped list of samples for one repository
#[derive(Debug)]
pub struct SampleSet {
    samples: Vec<CodeSample>,
    total_chars: usize,
    max_count: Option<usize>,
    max_total_chars: Option<usize>,
    max_chars: Option<usize>,
    exhausted: bool,
}

impl SampleSet {
    pub fn new(policy: &WalkPolicy) -> Self {
        Self {
            samples: Vec::new(),
            total_chars: 0,
            max_count: policy.file_budget,
            max_total_chars: policy.max_total_chars,
            max_chars: policy.max_chars,
            exhausted: false,
        }
    }

    /// No more samples will be accepted
    pub fn is_full(&self) -> bool {
        self.exhausted || self.max_count.is_some_and(|max| self.samples.len() >= max)
    }

    // Adds a file's content as a sample
    //
    // Returns: true if the sample was kept. A sample that would push the
    // running total past the aggregate cap is dropped and closes the set.
    pub fn push(&mut self, path: &str, content: String) -> bool {
        if self.is_full() {
            return false;
        }

        let sample = CodeSample::new(path, content, self.max_chars);
        let size = sample.content.chars().count();

        if let Some(max_total) = self.max_total_chars {
            if self.total_chars + size > max_total {
                self.exhausted = true;
                return false;
            }
        }

        self.total_chars += size;
        self.samples.push(sample);
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    pub fn into_samples(self) -> Vec<CodeSample> {
        self.samples
    }
}
