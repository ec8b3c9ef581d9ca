/// Format a number of seconds as a clock time.
///
/// Format: `01:01:01`, `HOURS:MM:SS`.
/// Every field is at least 2 digits wide.
/// Hours are not wrapped, so long durations grow the hours field instead.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / (60 * 60);
    let minutes = (seconds / 60) % 60;
    let seconds = seconds % 60;

    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
