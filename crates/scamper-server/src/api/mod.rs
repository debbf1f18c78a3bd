// ABOUTME: API module containing the JSON handler functions for the scamper server.
// ABOUTME: Currently a single chat endpoint; history travels with each request.

pub mod chat;
