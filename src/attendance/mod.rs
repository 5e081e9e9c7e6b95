pub mod engine;
pub mod reconciler;
