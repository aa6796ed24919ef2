//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (personas, canned model replies, etc.),
//! update only this file.

#![allow(dead_code)]

// ============================================================================
// Personas (from the built-in persona table)
// ============================================================================

/// Persona used by most tests
pub const PERSONA_ID: &str = "sunday-gardener";

/// Display name of [`PERSONA_ID`]
pub const PERSONA_NAME: &str = "The Sunday Gardener";

/// A favourite artist of [`PERSONA_ID`]
pub const PERSONA_ARTIST: &str = "Norah Jones";

/// Number of personas in the built-in table
pub const BUILTIN_PERSONA_COUNT: usize = 6;

// ============================================================================
// Canned model replies
// ============================================================================

/// A well-formed reply wrapped in prose and a json fence
pub const MODEL_REPLY_OK: &str = r#"Here are some songs for you!
```json
{"songs": [
  {"title": "Here Comes the Sun", "artist": "The Beatles", "reason": "Pure sunshine", "year": 1969, "genre": "rock"},
  {"title": "Walking on Sunshine", "artist": "Katrina and the Waves", "reason": "Upbeat", "year": "1985", "genre": "pop"}
]}
```
Enjoy!"#;

/// A reply where every song trips the content filter
pub const MODEL_REPLY_ALL_FILTERED: &str = r#"{"songs": [
  {"title": "Explicit Anthem", "artist": "Band A"},
  {"title": "Song", "artist": "Band B", "genre": "nsfw"}
]}"#;

/// A reply with no JSON at all
pub const MODEL_REPLY_NO_JSON: &str = "I'm sorry, I can't recommend anything right now.";

/// A reply that is JSON but not a song list
pub const MODEL_REPLY_WRONG_SHAPE: &str = r#"{"tracks": ["a", "b"]}"#;

/// Appended by the fake catalog to every title it matches
pub const CATALOG_TITLE_SUFFIX: &str = " - Remastered 2009";

/// Catalog id returned by the fake catalog for every lookup
pub const CATALOG_TRACK_ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

// ============================================================================
// Error messages
// ============================================================================

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";

pub const INVALID_ARGUMENTS_MESSAGE: &str =
    "Invalid arguments for song generation. Provide a mood, a persona, or both.";

pub const CONTENT_FILTERED_MESSAGE: &str =
    "Could not provide appropriate song recommendations. Try a different mood or persona.";

pub const NO_JSON_MESSAGE: &str = "AI response did not contain expected JSON format";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Rate limit applied by default in test servers
pub const TEST_RATE_LIMIT: u32 = 100;

/// Header used to identify clients in test servers
pub const CLIENT_ID_HEADER: &str = "x-client-id";
