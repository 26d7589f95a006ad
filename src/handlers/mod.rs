// handlers/mod.rs - HTTP endpoints
//
// Public:    GET /, GET /health
// Protected: POST /api/pages (credentials resolved inside the page handler)

pub mod pages;
pub mod public;
