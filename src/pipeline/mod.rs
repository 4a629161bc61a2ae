pub mod batch; // Sequential batches, bounded fan-out
pub mod conversations; // CSV loader + customer-only excerpt
pub mod sentiment; // Prompt, Ollama backend, retrying client, reply parser
