// Notebook URL discovery in the server log

use std::io::{self, BufRead};

/// How the server's advertised address is turned into a browser URL
#[derive(Debug, Clone)]
pub struct UrlScanner {
    /// Text immediately preceding the `<port>/?token=...` part
    pub marker: String,
    /// Host port the server is published on
    pub port: u16,
    /// Notebook to open instead of the tree view; empty for none
    pub notebook: String,
}

impl UrlScanner {
    pub fn new(marker: impl Into<String>, port: u16, notebook: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            port,
            notebook: notebook.into(),
        }
    }

    /// Localhost URL for a log line, if it carries the server address
    pub fn extract(&self, line: &str) -> Option<String> {
        let start = line.find(&self.marker)?;
        let line = line.trim_end();

        if self.notebook.is_empty() {
            let rest = line.get(start + self.marker.len()..).unwrap_or("");
            Some(format!("http://localhost:{}", rest))
        } else {
            let token = line.find("?token=").map(|i| &line[i..]).unwrap_or("");
            Some(format!(
                "http://localhost:{}/notebooks/{}{}",
                self.port, self.notebook, token
            ))
        }
    }

    /// Read lines until one yields a URL; `None` if the stream ends first
    pub fn scan<R: BufRead + ?Sized>(&self, reader: &mut R) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }
            // Server warnings may quote file names in any encoding
            let line = String::from_utf8_lossy(&buf);
            if let Some(url) = self.extract(&line) {
                tracing::debug!(%url, "found notebook URL");
                return Ok(Some(url));
            }
        }
    }
}
