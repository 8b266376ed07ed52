//! Dispatcher configuration.
//!
//! Every flag defaults to `false`, which is development friendly: pretty JSON,
//! no compression, no status route, faults hidden from clients. For production
//! you probably want `gzip = true` and `disable_json_indent = true`.
//!
//! `Config` deserializes from any serde format, so the host can keep it in the
//! same file as the rest of its settings:
//!
//! ```toml
//! [http]
//! gzip = true
//! disable_json_indent = true
//! status_service = true
//! ```

use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Compress response bodies when the client sends `Accept-Encoding: gzip`.
    pub gzip: bool,
    /// Write JSON on one line with no whitespace.
    pub disable_json_indent: bool,
    /// Serve aggregated request stats at `GET /.status`.
    pub status_service: bool,
    /// Put the fault message and trace in 500 bodies.
    pub verbose_faults: bool,
    /// Log one JSON object per response instead of a text line.
    pub json_logs: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_false() {
        let config: Config = serde_json::from_str(r#"{"gzip": true}"#).unwrap();
        assert_eq!(config, Config { gzip: true, ..Config::default() });
    }
}
