//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for the domain crates:
//! - `TestMilvus`: Milvus standalone container with automatic cleanup (feature: "milvus")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Features
//!
//! - `milvus` (default): Enables Milvus test infrastructure
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMilvus};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_milvus_test() {
//!     let milvus = TestMilvus::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_milvus_test");
//!
//!     let collection = builder.collection_name("main");
//!     let vector = builder.unit_vector(8, 3);
//! }
//! ```

#[cfg(feature = "milvus")]
mod milvus;

#[cfg(feature = "milvus")]
pub use milvus::TestMilvus;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_clear_collection");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique name for testing
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(12345);
    /// assert_eq!(builder.name("doc", "main"), "test-doc-12345-main");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Generate a collection name that Milvus accepts
    ///
    /// Milvus names may only hold letters, digits and underscores.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::new(7);
    /// assert_eq!(builder.collection_name("docs"), "test_7_docs");
    /// ```
    pub fn collection_name(&self, suffix: &str) -> String {
        let suffix: String = suffix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("test_{}_{}", self.seed, suffix)
    }

    /// A `dimension`-long vector with 1.0 at `axis` and zeros elsewhere
    pub fn unit_vector(&self, dimension: usize, axis: usize) -> Vec<f32> {
        let mut vector = vec![0.0; dimension];
        vector[axis % dimension] = 1.0;
        vector
    }

    /// `count` distinct texts tagged with the seed
    pub fn texts(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("document {} of test {}", i, self.seed))
            .collect()
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that two float slices are equal within `tolerance`
    pub fn assert_vectors_close(actual: &[f32], expected: &[f32], tolerance: f32, context: &str) {
        assert_eq!(
            actual.len(),
            expected.len(),
            "{}: expected {} components, got {}",
            context,
            expected.len(),
            actual.len()
        );
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() <= tolerance,
                "{}: component {} differs, expected {}, got {}",
                context,
                i,
                e,
                a
            );
        }
    }
}
