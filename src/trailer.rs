use crate::models::Video;

fn is_youtube(v: &Video) -> bool {
    v.site == "YouTube"
}

fn is_youtube_trailer(v: &Video) -> bool {
    is_youtube(v) && v.video_type == "Trailer"
}

/// Picks the video to offer as "the" trailer, by descending preference:
/// official YouTube trailer, YouTube trailer named "official trailer",
/// any YouTube trailer, any YouTube video. Ties go to input order.
pub fn select_trailer(videos: &[Video]) -> Option<&Video> {
    videos
        .iter()
        .find(|v| is_youtube_trailer(v) && v.official)
        .or_else(|| {
            videos.iter().find(|v| {
                is_youtube_trailer(v) && v.name.to_lowercase().contains("official trailer")
            })
        })
        .or_else(|| videos.iter().find(|v| is_youtube_trailer(v)))
        .or_else(|| videos.iter().find(|v| is_youtube(v)))
}
