pub mod demand;
pub mod interval;
pub mod optimizer;
pub mod plan;
pub mod point;
pub mod slot;
