// Integration tests against a mocked Freebox, one module per API step.
mod common;
mod polling;
mod registration;
