//! Transport adapters around the engine. The only one shipped here is the
//! JSON-lines batch interface used by the CLI; any request/response
//! transport preserving the operation semantics works equally well.

pub mod jsonl;
