//! Deterministic grouping colors for results sharing a source video.

/// Visually distinct palette used to outline results from the same source.
pub const GROUP_PALETTE: [&str; 6] = [
    "hsl(195, 80%, 55%)", // Sky Blue
    "hsl(145, 70%, 50%)", // Sea Green
    "hsl(25, 85%, 60%)",  // Bright Orange
    "hsl(265, 75%, 65%)", // Lavender
    "hsl(350, 80%, 65%)", // Pink
    "hsl(50, 90%, 60%)",  // Gold
];

/// Sentinel for ungrouped items; distinct from every palette entry.
pub const UNGROUPED_COLOR: &str = "transparent";

/// Polynomial rolling hash over the UTF-16 code units of the string:
/// `h = h * 31 + unit`, truncated to 32-bit signed at every step.
///
/// Must stay bit-for-bit stable across builds: grouping colors are expected
/// to match for the same source id in every session, including any state the
/// frontend has cached.
fn fold_hash(s: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    // unsigned_abs so that i32::MIN maps to 2147483648 rather than wrapping
    hash.unsigned_abs()
}

/// Maps a source video id to its grouping color.
///
/// Pure and total: the same id always yields the same palette entry, in this
/// process or any other. Absent or empty ids map to [`UNGROUPED_COLOR`],
/// which keeps ungrouped items distinguishable from a group that happens to
/// hash to palette index 0.
pub fn group_color(source_video_id: Option<&str>) -> &'static str {
    match source_video_id {
        None | Some("") => UNGROUPED_COLOR,
        Some(id) => {
            let index = (fold_hash(id) % GROUP_PALETTE.len() as u32) as usize;
            GROUP_PALETTE[index]
        }
    }
}
