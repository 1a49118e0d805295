pub mod compensation;
pub mod consolidation;
pub mod shift;
