pub mod error;

// Export post-processing module
pub mod export;
