//! Filesystem scenario tests
//!
//! Tests are organized by topic:
//! - `generator` - Generate, write and regenerate against the written file
//! - `persistence` - Round trips and protection of existing files

mod generator;
