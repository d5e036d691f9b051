use crate::error::Result;
use crate::log_store::{EventLogStore, Subscription};
use crate::types::LogEntry;
use log::{debug, error};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

pub const DEFAULT_VIEW_LIMIT: usize = 6;

/// Console peek: shows the tail of the event log.
#[derive(Debug, Clone)]
pub struct LogViewer {
    limit: usize,
    json: bool,
}

impl LogViewer {
    pub fn new(limit: usize, json: bool) -> Self {
        Self {
            limit: limit.max(1),
            json,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn format_entry(&self, entry: &LogEntry) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string(entry)?);
        }
        Ok(format!(
            "{}  {:<9} {}",
            entry.timestamp,
            format!("[{}]", entry.kind),
            entry.message
        ))
    }

    /// The visible window, oldest first. Re-read from the store on every call.
    pub fn render(&self, store: &EventLogStore) -> Result<Vec<String>> {
        store
            .snapshot(Some(self.limit))
            .iter()
            .map(|entry| self.format_entry(entry))
            .collect()
    }

    /// Subscribes to the store and forwards new entries over a channel so the
    /// observer itself never blocks.
    pub fn attach(&self, store: &EventLogStore) -> (Subscription, mpsc::UnboundedReceiver<LogEntry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = store.subscribe(move |entry| {
            // Receiver gone means the viewer shut down
            let _ = tx.send(entry.clone());
        });
        (subscription, rx)
    }

    /// Writes every forwarded entry until the channel closes.
    pub async fn run<W>(self, mut rx: mpsc::UnboundedReceiver<LogEntry>, mut out: W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(entry) = rx.recv().await {
            let line = match self.format_entry(&entry) {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to format entry #{}: {}", entry.id, e);
                    continue;
                }
            };
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
        }
        
        debug!("Viewer channel closed");
        Ok(())
    }
}

impl Default for LogViewer {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_LIMIT, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    #[test]
    fn render_shows_last_six_oldest_first() {
        let store = EventLogStore::default();
        for i in 0..9 {
            store.record(format!("event {}", i)).unwrap();
        }

        let lines = LogViewer::default().render(&store).unwrap();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].ends_with("event 3"));
        assert!(lines[5].ends_with("event 8"));
        assert!(lines[5].contains("[action]"));
    }

    #[test]
    fn json_lines_carry_every_field() {
        let store = EventLogStore::default();
        let entry = store.append("Pipeline healthy", Kind::Info).unwrap();
        let line = LogViewer::new(6, true).format_entry(&entry).unwrap();

        let parsed: LogEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, entry);
    }

    #[tokio::test]
    async fn attached_viewer_writes_new_entries() {
        let store = EventLogStore::default();
        let viewer = LogViewer::default();
        let (subscription, rx) = viewer.attach(&store);

        store.record("Added Email to workflow").unwrap();
        store.append("All systems nominal", Kind::Info).unwrap();
        drop(subscription);

        let mut out = Vec::new();
        viewer.run(rx, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Added Email to workflow"));
        assert!(lines[1].contains("[info]"));
    }
}
