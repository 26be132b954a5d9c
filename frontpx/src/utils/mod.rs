// Utilities module
//
// This module contains common utility functions:
// - path: URL path joining shared by the request directors
// - validation: Common validation helpers

pub mod path;
pub mod validation;
