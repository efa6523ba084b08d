// Domain layer - ping samples and the time-series normalization pipeline
pub mod chart;
pub mod peaks;
pub mod ping;
pub mod timeline;
pub mod views;
