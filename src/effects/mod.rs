pub mod feedback;
pub mod fx;
