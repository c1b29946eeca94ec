pub mod op_reader;
pub mod wallet_writer;
