//! Scenario tests that exercise layout, scheduling, and mode control
//! together, the way a platform embedder would drive them.
