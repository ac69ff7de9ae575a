pub mod fs;
pub mod policy;
