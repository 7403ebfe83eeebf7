pub mod dag;

pub use dag::Dag;
