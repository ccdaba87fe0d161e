pub mod ollama_service;
pub mod vertex_service;
