//! G.711 Test Modules
//!
//! Companding accuracy tests and transcoder contract tests.
