//! Unit tests for profile domain types and the directory service.
