// Aggregates all former standalone integration tests as modules.
mod gemini_client;
mod session_flow;
