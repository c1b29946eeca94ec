use crate::domain::currency::Currency;
use crate::domain::dispute::Resolution;
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};

/// One engine operation as it appears on a line of input.
///
/// Users are referenced by handle and wishes/disputes/requests by
/// client-chosen labels; the runner resolves labels to engine ids as the
/// stream creates them.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    RegisterUser {
        name: String,
        handle: String,
    },
    CreateWish {
        label: String,
        creator: String,
        title: String,
        #[serde(default)]
        description: String,
        currency: Currency,
    },
    AcceptWish {
        wish: String,
        actor: String,
    },
    CompleteWish {
        wish: String,
        actor: String,
    },
    OpenDispute {
        label: String,
        wish: String,
        disputer: String,
        comment: String,
        #[serde(default)]
        alternative_description: Option<String>,
    },
    ResolveDispute {
        dispute: String,
        resolver: String,
        action: Resolution,
        #[serde(default)]
        comment: Option<String>,
    },
    Convert {
        user: String,
        from: Currency,
        to: Currency,
        amount: u32,
    },
    Gift {
        sender: String,
        receiver: String,
        currency: Currency,
        amount: u32,
    },
    RequestFriend {
        label: String,
        from: String,
        to: String,
    },
    AcceptFriend {
        request: String,
        actor: String,
    },
    RejectFriend {
        request: String,
        actor: String,
    },
    Block {
        user: String,
        target: String,
    },
    Unblock {
        user: String,
        target: String,
    },
}

/// Reads operations from a JSON-lines source.
///
/// Wraps any `Read` and yields `Result<Op>` lazily, so large batches stream
/// without loading the whole file. Blank lines are skipped; a malformed line
/// yields an error without poisoning the rest of the stream.
pub struct OpReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> OpReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    pub fn ops(self) -> impl Iterator<Item = Result<Op>> {
        self.reader
            .lines()
            .map(|line| {
                let line = line.map_err(|e| EngineError::Storage(e.to_string()))?;
                Ok(line)
            })
            .filter(|line: &Result<String>| {
                !matches!(line, Ok(line) if line.trim().is_empty())
            })
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line)
                    .map_err(|e| EngineError::Validation(format!("malformed operation: {e}")))
            })
    }
}
