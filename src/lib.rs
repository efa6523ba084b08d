// Ping chart normalization for the Komari monitor dashboard
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
