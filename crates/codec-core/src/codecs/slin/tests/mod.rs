//! Linear PCM Test Modules
