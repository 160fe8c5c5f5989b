//! Collection names used by the service, the loaders and the schema setup.

pub const PROBLEM: &str = "problem";
pub const UNIT: &str = "unit";
pub const CONCEPT: &str = "concept";

pub const CONCEPTS_DATASET: &str = "concepts";
pub const DIAGNOSTIC_TESTS_DATASET: &str = "diagnostic_tests";
pub const UNIT_TESTS_DATASET: &str = "unit_tests";

pub const EXPRESS_DIAGNOSTIC_RESULTS: &str = "express_diagnostic_results";
pub const LEARNING_PATHS: &str = "learning_paths";
