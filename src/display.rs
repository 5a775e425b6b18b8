// Human-readable rates for the terminal consumer.

use serde::Deserialize;

const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

/// Binary-scaled rate: whole numbers up to KB/s, two decimals from MB/s.
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec.is_nan() || bytes_per_sec <= 0.0 {
        return "0 B/s".to_string();
    }
    let mut speed = bytes_per_sec;
    let mut index = 0;
    while speed >= 1024.0 && index < UNITS.len() - 1 {
        speed /= 1024.0;
        index += 1;
    }
    if index <= 1 {
        format!("{:.0}{}", speed, UNITS[index])
    } else {
        format!("{:.2}{}", speed, UNITS[index])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Both,
    UploadOnly,
    DownloadOnly,
    Total,
}

impl DisplayMode {
    /// (first, second) text slots; `Total` puts the summed rate in the first.
    pub fn render(&self, upload: f64, download: f64) -> (String, String) {
        match self {
            DisplayMode::Both => (format_speed(upload), format_speed(download)),
            DisplayMode::UploadOnly => (format_speed(upload), String::new()),
            DisplayMode::DownloadOnly => (String::new(), format_speed(download)),
            DisplayMode::Total => (format_speed(upload + download), String::new()),
        }
    }

    /// Arrow shown before each slot.
    pub fn icons(&self) -> (&'static str, &'static str) {
        match self {
            DisplayMode::Total => ("↓", "↓"),
            _ => ("↑", "↓"),
        }
    }

    /// One status line. Empty slots are left out, and with `show_icons` each
    /// remaining slot is prefixed by its arrow.
    pub fn line(&self, upload: f64, download: f64, show_icons: bool) -> String {
        let (first, second) = self.render(upload, download);
        let (first_icon, second_icon) = self.icons();
        [(first_icon, first), (second_icon, second)]
            .into_iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(icon, text)| if show_icons { format!("{icon}{text}") } else { text })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_speed_units() {
        assert_eq!(format_speed(0.0), "0 B/s");
        assert_eq!(format_speed(-3.0), "0 B/s");
        assert_eq!(format_speed(512.0), "512B/s");
        assert_eq!(format_speed(2048.0), "2KB/s");
        assert_eq!(format_speed(1.5 * 1024.0 * 1024.0), "1.50MB/s");
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0 * 1024.0), "3.00GB/s");
    }

    #[test]
    fn huge_rates_stay_in_gb() {
        assert_eq!(format_speed(2048.0 * 1024.0 * 1024.0 * 1024.0), "2048.00GB/s");
    }

    #[test]
    fn render_modes() {
        assert_eq!(
            DisplayMode::Both.render(1024.0, 0.0),
            ("1KB/s".to_string(), "0 B/s".to_string())
        );
        assert_eq!(DisplayMode::UploadOnly.render(1.0, 2.0).1, "");
        assert_eq!(DisplayMode::DownloadOnly.render(1.0, 2.0).0, "");
        assert_eq!(DisplayMode::Total.render(1000.0, 24.0).0, "1KB/s");
    }

    #[test]
    fn line_with_icons_skips_empty_slots() {
        assert_eq!(DisplayMode::Both.line(1024.0, 0.0, true), "↑1KB/s  ↓0 B/s");
        assert_eq!(DisplayMode::UploadOnly.line(1024.0, 9.0, true), "↑1KB/s");
        assert_eq!(DisplayMode::DownloadOnly.line(9.0, 2.0, true), "↓2B/s");
        assert_eq!(DisplayMode::Total.line(1000.0, 24.0, true), "↓1KB/s");
    }

    #[test]
    fn line_without_icons_is_text_only() {
        assert_eq!(DisplayMode::Both.line(1024.0, 0.0, false), "1KB/s  0 B/s");
        assert_eq!(DisplayMode::DownloadOnly.line(9.0, 2.0, false), "2B/s");
    }
}
