pub mod analysis;
pub mod extraction;
pub mod recommendation;
pub mod research;
