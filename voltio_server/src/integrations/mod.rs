mod bna;

pub use bna::{BnaClient, BnaError};
