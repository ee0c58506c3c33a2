//! Transcode job descriptors.
//!
//! A job names one title (or one chapter of a title) on one disc image and the
//! episode file it becomes. Jobs are built by the plan builder and never
//! change afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// What part of a disc title a job extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "chapter", rename_all = "snake_case")]
pub enum Selection {
    /// The entire title is one episode.
    WholeTitle,
    /// A single chapter (1-based) is one episode.
    Chapter(u32),
}

impl Selection {
    pub fn chapter(&self) -> Option<u32> {
        match self {
            Selection::WholeTitle => None,
            Selection::Chapter(chapter) => Some(*chapter),
        }
    }
}

/// One HandBrakeCLI encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeJob {
    /// Disc image directory passed as the encode input
    pub source_directory: PathBuf,
    /// Directory the episode file is written into
    pub destination_directory: PathBuf,
    /// Series name used in the output file name
    pub series_title: String,
    pub season: u32,
    /// Disc title number to extract
    pub title_track: u32,
    pub episode: u32,
    pub selection: Selection,
}

impl TranscodeJob {
    /// Episode file name without directory, e.g. `Show - s01e03.mkv`
    pub fn output_file_name(&self, extension: &str) -> String {
        format!(
            "{} - s{:02}e{:02}.{}",
            self.series_title, self.season, self.episode, extension
        )
    }

    /// Full path of the episode file
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.destination_directory
            .join(self.output_file_name(extension))
    }
}

impl fmt::Display for TranscodeJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s{:02}e{:02} <- title {}",
            self.season, self.episode, self.title_track
        )?;
        if let Selection::Chapter(chapter) = self.selection {
            write!(f, " chapter {}", chapter)?;
        }
        write!(f, " of {}", self.source_directory.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn job(season: u32, episode: u32, selection: Selection) -> TranscodeJob {
        TranscodeJob {
            source_directory: PathBuf::from("/rips/Show/Season 1/DISC_1"),
            destination_directory: PathBuf::from("/media/Show"),
            series_title: "Show".to_string(),
            season,
            title_track: 4,
            episode,
            selection,
        }
    }

    #[test]
    fn test_output_file_name_zero_pads() {
        let job = job(1, 3, Selection::WholeTitle);
        assert_eq!(job.output_file_name("mkv"), "Show - s01e03.mkv");
        assert_eq!(
            job.output_path("mkv"),
            PathBuf::from("/media/Show/Show - s01e03.mkv")
        );
    }

    #[test]
    fn test_output_file_name_wide_numbers() {
        let job = job(12, 104, Selection::WholeTitle);
        assert_eq!(job.output_file_name("mp4"), "Show - s12e104.mp4");
    }

    #[test]
    fn test_selection_chapter() {
        assert_eq!(Selection::WholeTitle.chapter(), None);
        assert_eq!(Selection::Chapter(3).chapter(), Some(3));
    }

    #[test]
    fn test_display_mentions_chapter_only_when_split() {
        let whole = job(2, 5, Selection::WholeTitle).to_string();
        assert!(whole.starts_with("s02e05 <- title 4 of"));
        assert!(!whole.contains("chapter"));

        let split = job(2, 6, Selection::Chapter(2)).to_string();
        assert!(split.contains("title 4 chapter 2"));
    }

    #[test]
    fn test_job_serializes_selection_tag() {
        let value = serde_json::to_value(job(1, 1, Selection::Chapter(2))).unwrap();
        assert_eq!(value["selection"]["kind"], "chapter");
        assert_eq!(value["selection"]["chapter"], 2);

        let value = serde_json::to_value(job(1, 1, Selection::WholeTitle)).unwrap();
        assert_eq!(value["selection"]["kind"], "whole_title");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_file_name_embeds_season_and_episode(season in 1u32..100, episode in 1u32..100) {
            let name = job(season, episode, Selection::WholeTitle).output_file_name("mkv");
            let expected = format!("s{:02}e{:02}", season, episode);
            prop_assert!(name.contains(&expected));
            prop_assert!(name.starts_with("Show - "));
            prop_assert!(name.ends_with(".mkv"));
        }
    }
}
