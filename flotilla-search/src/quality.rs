//! Quality label heuristics.
//!
//! Providers emit free-form quality strings; these helpers infer a label from
//! a link or title and rank labels for presentation ordering.

/// Infers a normalized quality label from a url, file name or title.
pub fn infer_quality(text: &str) -> Option<String> {
    let upper = text.to_uppercase();

    let label = if upper.contains("2160") || upper.contains("4K") || upper.contains("UHD") {
        "2160p"
    } else if upper.contains("1440") {
        "1440p"
    } else if upper.contains("1080") || upper.contains("FHD") {
        "1080p"
    } else if upper.contains("720") {
        "720p"
    } else if upper.contains("480") {
        "480p"
    } else if upper.contains("360") {
        "360p"
    } else if upper.contains("CAMRIP") || upper.contains("HDCAM") || upper.contains("TELESYNC") {
        "CAM"
    } else {
        return None;
    };

    Some(label.to_string())
}

/// Ranks a quality label; higher is better, unknown labels rank lowest.
pub fn quality_rank(label: Option<&str>) -> u32 {
    let Some(label) = label else {
        return 0;
    };

    match infer_quality(label).as_deref() {
        Some("2160p") => 7,
        Some("1440p") => 6,
        Some("1080p") => 5,
        Some("720p") => 4,
        Some("480p") => 3,
        Some("360p") => 2,
        Some("CAM") => 1,
        _ if label.eq_ignore_ascii_case("cam") || label.eq_ignore_ascii_case("ts") => 1,
        _ => 0,
    }
}
