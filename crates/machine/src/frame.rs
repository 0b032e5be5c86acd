//! Frame readouts shown next to each player's progress bar.

/// Formats `current` and `total` as two-digit `CC:TT`.
///
/// # Example
/// ```
/// use machine::format_frame;
///
/// assert_eq!(format_frame(7, 90), "07:90");
/// assert_eq!(format_frame(3, 0), "00:00");
/// ```
pub fn format_frame(current: u32, total: u32) -> String {
    if current == 0 || total == 0 {
        return String::from("00:00");
    }
    format!("{current:02}:{total:02}")
}

/// Share of the animation shown so far, in percent.
pub fn progress_percent(current: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = (f64::from(current) + 1.0) / f64::from(total) * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Frame under a click at `fraction` of the progress bar width.
pub fn frame_at_fraction(fraction: f64, total: u32) -> u32 {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    (fraction * f64::from(total)).round() as u32
}
