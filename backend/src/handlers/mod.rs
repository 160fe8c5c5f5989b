pub mod data;
pub mod graph;
pub mod learning_path;
pub mod system;
pub mod tutor;
