// HTTP retrieval
pub mod fetch;

// Host collaborators
pub mod image;
pub mod render;
