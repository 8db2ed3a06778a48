use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Palm detections below this score are dropped before landmark estimation.
pub const PALM_SCORE_THRESHOLD: f32 = 0.7;
/// Landmark-model confidence needed to treat a palm crop as a hand.
pub const HAND_PRESENCE_THRESHOLD: f32 = 0.5;
pub const FACE_SCORE_THRESHOLD: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum AssetSet {
    #[default]
    Meme,
    Classic,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Overlay image set to show for each gesture
    #[arg(long, value_enum, default_value_t = AssetSet::Meme)]
    pub assets: AssetSet,

    /// Directory holding the overlay images
    #[arg(long, default_value = "imgs")]
    pub asset_dir: PathBuf,

    /// Directory the detection models are stored in (and downloaded to)
    #[arg(long, default_value = "models")]
    pub model_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_meme_layout() {
        let args = Args::try_parse_from(["gesture-overlay"]).unwrap();
        assert_eq!(args.assets, AssetSet::Meme);
        assert_eq!(args.asset_dir, PathBuf::from("imgs"));
        assert_eq!(args.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn classic_set_and_dirs_can_be_chosen() {
        let args = Args::try_parse_from([
            "gesture-overlay",
            "--assets",
            "classic",
            "--asset-dir",
            "art",
            "--model-dir",
            "/tmp/models",
        ])
        .unwrap();
        assert_eq!(args.assets, AssetSet::Classic);
        assert_eq!(args.asset_dir, PathBuf::from("art"));
        assert_eq!(args.model_dir, PathBuf::from("/tmp/models"));
    }

    #[test]
    fn unknown_asset_set_is_rejected() {
        assert!(Args::try_parse_from(["gesture-overlay", "--assets", "vaporwave"]).is_err());
    }
}
