// Line parser for the traffic tool's CSV report.
//
// Grammar, one record per line:
//   token "," name "." pid "," bytes_in "," bytes_out [ "," trailing ]
// The name may itself contain dots; the pid follows the last one.

use crate::error::SourceError;
use crate::models::ProcessRecord;
use tracing::trace;

fn skipped(line: &str, reason: &'static str) -> SourceError {
    SourceError::ParseSkipped {
        line: line.to_string(),
        reason,
    }
}

pub fn parse_line(line: &str) -> Result<ProcessRecord, SourceError> {
    let mut fields = line.split(',').map(str::trim);
    let (Some(_token), Some(process), Some(bytes_in), Some(bytes_out)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(skipped(line, "fewer than four fields"));
    };

    let (name, pid) = process
        .rsplit_once('.')
        .ok_or_else(|| skipped(line, "process field has no pid suffix"))?;
    if name.is_empty() {
        return Err(skipped(line, "empty process name"));
    }
    let pid: i32 = pid.parse().map_err(|_| skipped(line, "pid is not an integer"))?;
    let rx_bytes: u64 = bytes_in
        .parse()
        .map_err(|_| skipped(line, "bytes_in is not an integer"))?;
    let tx_bytes: u64 = bytes_out
        .parse()
        .map_err(|_| skipped(line, "bytes_out is not an integer"))?;

    Ok(ProcessRecord {
        pid,
        name: name.to_string(),
        rx_bytes,
        tx_bytes,
    })
}

/// Parse a whole report; bad lines (including the header) are dropped one by one.
pub fn parse_report(text: &str) -> Vec<ProcessRecord> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_line(line) {
            Ok(record) => Some(record),
            Err(e) => {
                trace!(error = %e, "accounting line skipped");
                None
            }
        })
        .collect()
}
