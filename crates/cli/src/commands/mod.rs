pub mod eval;
pub mod policy;
