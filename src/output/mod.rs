pub mod go;

pub use go::{render, write_merged};
