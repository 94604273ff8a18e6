/// Reproducibility logging system
///
/// Every operation performed on a spectrum is recorded with:
/// - Timestamp
/// - The structured operation and its parameters
/// - A description of what was done
/// - The equivalent NMRPipe command
/// - Sequential order
///
/// The log can be exported as:
/// - Human-readable text
/// - JSON
/// - Shell script (to reproduce the phasing with NMRPipe)

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use crate::pipeline::processing::ProcessingOp;

/// A single log entry representing one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Sequential operation number (1-based)
    pub sequence: usize,
    /// Timestamp when the operation was performed
    pub timestamp: DateTime<Local>,
    /// The operation with its parameters
    pub op: ProcessingOp,
    /// Detailed description of what was done
    pub description: String,
    /// The equivalent NMRPipe command
    pub nmrpipe_command: String,
}

impl LogEntry {
    /// Format as human-readable text line
    pub fn to_text(&self) -> String {
        format!(
            "[{:03}] {} | {} | {}\n      Command: {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.op,
            self.description,
            if self.nmrpipe_command.is_empty() {
                "(n/a)".to_string()
            } else {
                self.nmrpipe_command.clone()
            }
        )
    }

    /// Format as shell script line
    pub fn to_shell_line(&self) -> String {
        if self.nmrpipe_command.is_empty() || self.nmrpipe_command.starts_with('#') {
            format!("# Step {}: {} ({})", self.sequence, self.op, self.description)
        } else {
            format!(
                "# Step {}: {} ({})\n{}",
                self.sequence, self.op, self.description, self.nmrpipe_command
            )
        }
    }
}

/// The reproducibility log: all operations in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproLog {
    /// Session metadata
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub source_file: String,
    pub software_version: String,
    /// Ordered list of operations
    pub entries: Vec<LogEntry>,
}

impl ReproLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            source_file: String::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    /// Set the source file for this session
    pub fn set_source(&mut self, source: &str) {
        self.source_file = source.to_string();
    }

    /// Add an operation to the log
    pub fn add_entry(&mut self, op: ProcessingOp, description: &str, nmrpipe_command: &str) {
        let seq = self.entries.len() + 1;
        log::info!("[LOG {:03}] {}: {}", seq, op, description);
        self.entries.push(LogEntry {
            sequence: seq,
            timestamp: Local::now(),
            op,
            description: description.to_string(),
            nmrpipe_command: nmrpipe_command.to_string(),
        });
    }

    /// Get the number of operations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as human-readable text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str("  NMR Auto-Phase Reproducibility Log\n");
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("  Source:      {}\n", self.source_file));
        out.push_str(&format!("  Software:    nmr-autophase v{}\n", self.software_version));
        out.push_str(&format!("  Operations:  {}\n", self.entries.len()));
        out.push_str("───────────────────────────────────────────────────────────────\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push_str("\n\n");
        }
        out
    }

    /// Export as JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Export as shell script
    pub fn to_shell_script(&self) -> String {
        let mut out = String::new();
        out.push_str("#!/bin/bash\n");
        out.push_str("#\n");
        out.push_str(&format!("# Generated by nmr-autophase v{}\n", self.software_version));
        out.push_str(&format!(
            "# Session: {} ({})\n",
            self.session_id,
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!("# Source: {}\n", self.source_file));
        out.push_str("#\n");
        out.push_str("# Requirements: NMRPipe must be installed and in PATH.\n");
        out.push_str("#\n");
        out.push_str("set -euo pipefail\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_shell_line());
            out.push_str("\n\n");
        }
        out
    }

    /// Save log as text file
    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    /// Save log as JSON file
    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::from)?;
        std::fs::write(path, json)
    }

    /// Save log as shell script
    pub fn save_script(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_shell_script())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }
}

impl Default for ReproLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_op(ph0: f64) -> ProcessingOp {
        ProcessingOp::PhaseCorrection { ph0, ph1: 0.0 }
    }

    #[test]
    fn test_log_creation_and_entries() {
        let mut log = ReproLog::new();
        assert!(log.is_empty());

        log.add_entry(phase_op(10.0), "Did something", "nmrPipe -fn PS -p0 10.00 -p1 0.00 -di");
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries[0].sequence, 1);
        assert_eq!(log.entries[0].op, phase_op(10.0));

        log.add_entry(
            ProcessingOp::AutoPhase { min_reg_size: 16, regions: 3, ph0: 1.0, ph1: 2.0 },
            "Did more",
            "nmrPipe -fn PS -p0 1.00 -p1 2.00 -di",
        );
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries[1].sequence, 2);
    }

    #[test]
    fn test_text_export() {
        let mut log = ReproLog::new();
        log.set_source("spectrum.json");
        log.add_entry(
            ProcessingOp::FourierTransform { use_imaginary: true, size: 1024 },
            "FFT 1000 → 1024 points",
            "nmrPipe -fn FT -auto",
        );
        let text = log.to_text();
        assert!(text.contains("Fourier Transform (Complex, 1024 points)"));
        assert!(text.contains("nmrPipe -fn FT -auto"));
        assert!(text.contains("spectrum.json"));
    }

    #[test]
    fn test_json_roundtrip() {
        let mut log = ReproLog::new();
        log.add_entry(phase_op(-45.0), "test desc", "test cmd");
        let json = log.to_json().unwrap();
        let parsed: ReproLog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].op, phase_op(-45.0));
        assert_eq!(parsed.session_id, log.session_id);
    }

    #[test]
    fn test_shell_script_export() {
        let mut log = ReproLog::new();
        log.add_entry(phase_op(5.0), "manual", "nmrPipe -fn PS -p0 5.00 -p1 0.00 -di");
        log.add_entry(phase_op(6.0), "comment only", "# nothing to run");
        let script = log.to_shell_script();
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("\nnmrPipe -fn PS -p0 5.00 -p1 0.00 -di\n"));
        assert!(!script.contains("\n# nothing to run"));
    }
}
