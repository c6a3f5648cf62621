//! Deterministic packet address construction.

use mvf_models::{FeatureModel, SourceType};

/// Build the remote locator for one packet.
///
/// A pure function of its inputs: the same (base, source, model, movie,
/// index) always yields the same address, which is what allows a
/// consumer to re-fetch an arbitrary packet on retry.
pub fn packet_address(
    base_url: &str,
    source: SourceType,
    model: FeatureModel,
    movie_id: u32,
    sequence_index: u32,
) -> String {
    format!(
        "{}/{}/{}/{}/packet{}.json",
        base_url.trim_end_matches('/'),
        source.as_path_part(),
        model.as_path_part(),
        movie_id,
        sequence_index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_layout() {
        let addr = packet_address(
            "https://example.com/feats",
            SourceType::MovieTrailers,
            FeatureModel::Incp3,
            6,
            1,
        );
        assert_eq!(addr, "https://example.com/feats/movie_trailers/incp3/6/packet1.json");
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let with = packet_address("http://s/", SourceType::FullMovies, FeatureModel::Vgg19, 1, 0);
        let without = packet_address("http://s", SourceType::FullMovies, FeatureModel::Vgg19, 1, 0);
        assert_eq!(with, without);
    }

    #[test]
    fn test_address_is_deterministic() {
        let a = packet_address("http://s", SourceType::MovieShots, FeatureModel::Incp3, 42, 7);
        let b = packet_address("http://s", SourceType::MovieShots, FeatureModel::Incp3, 42, 7);
        assert_eq!(a, b);
    }
}
