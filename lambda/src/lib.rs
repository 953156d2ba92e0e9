pub mod config;
pub mod error;
pub mod expand;
pub mod geometry;
pub mod parser;
pub mod prelude;
pub mod prettify;
pub mod printer;
pub mod reducer;
pub mod registry;
pub mod term;
pub mod tree_layout;
pub mod tromp;

#[cfg(test)]
mod properties;
