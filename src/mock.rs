//! Synthetic result generation for offline mode and backend-failure
//! fallback. Plausible-looking data, never surfaced as an error.

use crate::models::{MediaType, ResultItem};
use rand::Rng;

/// Fixed size of the fallback result set.
pub const MOCK_RESULT_COUNT: usize = 100;

/// Each synthetic source video contributes this many consecutive results.
const MIN_GROUP_SIZE: usize = 3;
const MAX_GROUP_SIZE: usize = 7;

const IMAGE_PROBABILITY: f64 = 0.7;

const PREVIEW_VIDEO_URL: &str =
    "https://test-videos.co.uk/vids/bigbuckbunny/mp4/h264/1080/Big_Buck_Bunny_1080_10s_1MB.mp4";
const FULL_VIDEO_URL: &str =
    "https://test-videos.co.uk/vids/bigbuckbunny/mp4/h264/1080/Big_Buck_Bunny_1080_10s_1MB.mp4";
const PREVIEW_VIDEO_DURATION_SECS: f64 = 5.0;
const MIN_SEGMENT_SECS: f64 = 0.5;
const MAX_SEGMENT_SECS: f64 = 3.0;

/// Picks the next group size, clamped so the tail of the run never leaves a
/// group smaller than [`MIN_GROUP_SIZE`]. Counts below the minimum (only
/// possible for tiny requested totals) collapse into one undersized group.
fn pick_group_size<R: Rng>(rng: &mut R, remaining: usize) -> usize {
    let size = rng.random_range(MIN_GROUP_SIZE..=MAX_GROUP_SIZE);
    if size >= remaining {
        return remaining;
    }
    if remaining - size < MIN_GROUP_SIZE {
        // remaining is in 4..=9 here; absorb or split off a full tail group
        if remaining <= MAX_GROUP_SIZE {
            return remaining;
        }
        return remaining - MIN_GROUP_SIZE;
    }
    size
}

/// Generates `count` results with ranks exactly `1..=count` in order.
///
/// Consecutive items share a synthetic `source_video_id` in groups of 3 to 7,
/// roughly 70% are images and 30% videos, and every video carries a preview
/// segment of 0.5–3.0 s fitted inside the fixed preview asset.
pub fn generate_mock_results(count: usize) -> Vec<ResultItem> {
    let mut rng = rand::rng();
    let run = chrono::Utc::now().timestamp_millis();

    let mut results = Vec::with_capacity(count);
    let mut source_id = format!("source_video_{}", run);
    let mut items_in_group = 0usize;
    let mut group_size = pick_group_size(&mut rng, count);

    for i in 0..count {
        // Group exhausted: mint a fresh source id for the next run of items
        if items_in_group >= group_size {
            source_id = format!("source_video_{}_{}", run, i);
            items_in_group = 0;
            group_size = pick_group_size(&mut rng, count - i);
        }

        let media_type = if rng.random::<f64>() < IMAGE_PROBABILITY {
            MediaType::Image
        } else {
            MediaType::Video
        };
        let id = format!("result_{}_{}", run, i);
        let rank = (i + 1) as u32;
        let label = match media_type {
            MediaType::Image => "Image",
            MediaType::Video => "Video",
        };

        let mut item = ResultItem {
            id: id.clone(),
            rank,
            media_type,
            title: format!("{} Result #{}", label, rank),
            thumbnail_url: format!("https://picsum.photos/seed/{}/400/300", id),
            full_url: format!("https://picsum.photos/seed/{}/1280/720", id),
            video_preview_url: None,
            start_time: None,
            end_time: None,
            source_video_id: Some(source_id.clone()),
        };

        if media_type == MediaType::Video {
            // Relevant segment of variable length, fitted inside the asset
            let segment = rng.random_range(MIN_SEGMENT_SECS..MAX_SEGMENT_SECS);
            let start = rng.random_range(0.0..(PREVIEW_VIDEO_DURATION_SECS - segment));

            // Cache-buster keeps per-result <video> elements independent
            item.video_preview_url = Some(format!("{}?v={}", PREVIEW_VIDEO_URL, id));
            item.full_url = format!("{}?v={}", FULL_VIDEO_URL, id);
            item.start_time = Some(start);
            item.end_time = Some(start + segment);
        }

        results.push(item);
        items_in_group += 1;
    }

    log::debug!("Generated {} mock results", results.len());
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lengths of maximal runs of consecutive items sharing a source id.
    fn group_run_lengths(results: &[ResultItem]) -> Vec<usize> {
        let mut runs = Vec::new();
        let mut current: Option<(&str, usize)> = None;
        for item in results {
            let source = item.source_video_id.as_deref().unwrap();
            match current {
                Some((id, n)) if id == source => current = Some((id, n + 1)),
                Some((_, n)) => {
                    runs.push(n);
                    current = Some((source, 1));
                }
                None => current = Some((source, 1)),
            }
        }
        if let Some((_, n)) = current {
            runs.push(n);
        }
        runs
    }

    #[test]
    fn test_ranks_are_dense_and_ordered() {
        let results = generate_mock_results(100);
        assert_eq!(results.len(), 100);
        for (i, item) in results.iter().enumerate() {
            assert_eq!(item.rank, (i + 1) as u32);
        }
    }

    #[test]
    fn test_group_sizes_within_bounds() {
        // Including the tail group, which the generator must not truncate
        for count in [8, 9, 10, 25, 100] {
            let results = generate_mock_results(count);
            let runs = group_run_lengths(&results);
            assert_eq!(runs.iter().sum::<usize>(), count);
            for run in runs {
                assert!(
                    (MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&run),
                    "group of {} items for count {}",
                    run,
                    count
                );
            }
        }
    }

    #[test]
    fn test_media_split_roughly_70_30() {
        let results = generate_mock_results(100);
        let images = results
            .iter()
            .filter(|r| r.media_type == MediaType::Image)
            .count();
        // Binomial(100, 0.7) stays comfortably inside these bounds
        assert!((50..=90).contains(&images), "got {} images", images);
    }

    #[test]
    fn test_video_segments_well_formed() {
        let results = generate_mock_results(100);
        for item in &results {
            match item.media_type {
                MediaType::Image => {
                    assert!(item.video_preview_url.is_none());
                    assert!(item.start_time.is_none());
                    assert!(item.end_time.is_none());
                }
                MediaType::Video => {
                    let preview = item.video_preview_url.as_deref().unwrap();
                    assert!(preview.contains("?v="), "missing cache-buster: {}", preview);
                    assert!(item.full_url.contains("?v="));

                    let start = item.start_time.unwrap();
                    let end = item.end_time.unwrap();
                    assert!(start >= 0.0);
                    assert!(end <= PREVIEW_VIDEO_DURATION_SECS);
                    let duration = end - start;
                    assert!(
                        (MIN_SEGMENT_SECS..=MAX_SEGMENT_SECS).contains(&duration),
                        "segment of {}s",
                        duration
                    );
                }
            }
        }
    }

    #[test]
    fn test_ids_unique() {
        let results = generate_mock_results(100);
        let mut ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_zero_count() {
        assert!(generate_mock_results(0).is_empty());
    }
}
