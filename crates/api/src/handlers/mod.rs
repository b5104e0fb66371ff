pub mod dashboard;
pub mod gallery;
pub mod generation;
pub mod session;
