// macOS default-route lookup via `route -n get`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const ROUTE_TIMEOUT: Duration = Duration::from_millis(400);

/// Interface of the IPv4 default route, then the IPv6 one (macOS).
pub(super) fn default_route_interface() -> Option<String> {
    if !cfg!(target_os = "macos") {
        return None;
    }
    [
        &["-n", "get", "default"][..],
        &["-n", "get", "-inet6", "default"][..],
    ]
    .into_iter()
    .find_map(|args| {
        let mut cmd = Command::new("/sbin/route");
        cmd.args(args);
        parse_route_get(&run_bounded(cmd, ROUTE_TIMEOUT)?)
    })
}

/// Run `cmd` and return its stdout if it exits successfully within `limit`.
/// A child still running at the deadline is killed and reaped.
pub(super) fn run_bounded(mut cmd: Command, limit: Duration) -> Option<String> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return None;
                }
                let mut out = String::new();
                child.stdout.take()?.read_to_string(&mut out).ok()?;
                return Some(out);
            }
            Ok(None) if start.elapsed() >= limit => {
                tracing::debug!(timeout_ms = limit.as_millis() as u64, "route lookup timed out; killed");
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(5)),
            Err(_) => return None,
        }
    }
}

/// Extract the `interface:` value from `route -n get` output.
pub fn parse_route_get(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let value = line.trim().strip_prefix("interface:")?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
