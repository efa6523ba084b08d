// Application layer - use cases over the repository seam
pub mod ping_chart_service;
pub mod ping_repository;
