use crate::domain::wallet::BalanceSnapshot;
use std::io::Write;

/// Writes the final wallet table to any `Write` sink.
pub struct WalletWriter<W: Write> {
    writer: W,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_wallets(
        &mut self,
        wallets: impl IntoIterator<Item = (String, BalanceSnapshot)>,
    ) -> std::io::Result<()> {
        writeln!(self.writer, "handle,green,blue,red")?;
        for (handle, balance) in wallets {
            writeln!(
                self.writer,
                "{handle},{},{},{}",
                balance.green, balance.blue, balance.red
            )?;
        }
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let mut out = Vec::new();
        let mut writer = WalletWriter::new(&mut out);
        writer
            .write_wallets([(
                "alice".to_string(),
                BalanceSnapshot {
                    green: 4,
                    blue: 1,
                    red: 0,
                },
            )])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "handle,green,blue,red\nalice,4,1,0\n");
    }
}
