// CLI module
//
// This module contains command-line interface functionality:
// - arguments: Flag and environment parsing into library settings

pub mod arguments;

pub use arguments::FrontpxArguments;
