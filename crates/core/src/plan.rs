//! Plan builder: turns per-disc scan results into numbered transcode jobs.
//!
//! Episode numbers are handed out per season, in disc order and then in the
//! order the scan reported titles. Nothing is numbered for a title that
//! produces no job, so a season's episodes are always contiguous.

use crate::jobs::{Selection, TranscodeJob};
use crate::scan::ScanResult;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scan outcome for one disc image directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscScan {
    pub directory: PathBuf,
    pub titles: ScanResult,
}

impl DiscScan {
    pub fn new(directory: impl Into<PathBuf>, titles: ScanResult) -> Self {
        Self {
            directory: directory.into(),
            titles,
        }
    }
}

/// Season-wide values copied into every job.
#[derive(Debug, Clone, Copy)]
pub struct SeasonContext<'a> {
    pub series_title: &'a str,
    pub season: u32,
    pub destination: &'a Path,
}

/// Jobs for one season plus the first episode number left unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonPlan {
    pub season: u32,
    pub jobs: Vec<TranscodeJob>,
    pub next_episode: u32,
}

/// Build the job queue for one season.
///
/// With `chapter_as_episode` every chapter `1..=chapter_count` of a title is
/// its own episode and titles without chapters produce nothing; otherwise
/// each title is one episode.
///
/// Numbering never wraps: once `u32::MAX` is handed out, remaining titles
/// are logged and left unplanned.
pub fn plan_season(
    ctx: SeasonContext<'_>,
    discs: &[DiscScan],
    start_episode: u32,
    chapter_as_episode: bool,
) -> SeasonPlan {
    let mut next = Some(start_episode);
    let mut jobs = Vec::new();

    for disc in discs {
        for entry in disc.titles.iter() {
            let selections: Vec<Selection> = if chapter_as_episode {
                (1..=entry.chapter_count).map(Selection::Chapter).collect()
            } else {
                vec![Selection::WholeTitle]
            };

            if selections.is_empty() {
                debug!(
                    title = entry.title,
                    disc = %disc.directory.display(),
                    "title has no chapters to split, no episodes queued"
                );
            }

            for selection in selections {
                let Some(episode) = next else {
                    warn!(
                        title = entry.title,
                        disc = %disc.directory.display(),
                        "episode numbers exhausted, title not queued"
                    );
                    break;
                };
                jobs.push(TranscodeJob {
                    source_directory: disc.directory.clone(),
                    destination_directory: ctx.destination.to_path_buf(),
                    series_title: ctx.series_title.to_string(),
                    season: ctx.season,
                    title_track: entry.title,
                    episode,
                    selection,
                });
                next = episode.checked_add(1);
            }
        }
    }

    SeasonPlan {
        season: ctx.season,
        jobs,
        next_episode: next.unwrap_or(u32::MAX),
    }
}

/// Decides where each season's episode numbering starts.
///
/// The starting season begins at the configured start episode; every other
/// season begins at 1. Without an explicit starting season, the first season
/// asked for is the starting one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeCursor {
    start_episode: u32,
    start_season: Option<u32>,
    first_claimed: bool,
}

impl EpisodeCursor {
    pub fn new(start_episode: u32, start_season: Option<u32>) -> Self {
        Self {
            start_episode,
            start_season,
            first_claimed: false,
        }
    }

    /// First episode number for `season`. Call once per resolved season, in
    /// processing order.
    pub fn begin_season(&mut self, season: u32) -> u32 {
        let is_start = match self.start_season {
            Some(start) => start == season,
            None => !self.first_claimed,
        };
        self.first_claimed = true;

        if is_start {
            self.start_episode
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx(season: u32) -> SeasonContext<'static> {
        SeasonContext {
            series_title: "Show",
            season,
            destination: Path::new("/media/Show"),
        }
    }

    fn disc(name: &str, titles: &[(u32, u32)]) -> DiscScan {
        DiscScan::new(
            format!("/rips/Show/Season 1/{}", name),
            titles.iter().copied().collect(),
        )
    }

    fn summary(plan: &SeasonPlan) -> Vec<(u32, u32, Option<u32>)> {
        plan.jobs
            .iter()
            .map(|j| (j.title_track, j.episode, j.selection.chapter()))
            .collect()
    }

    #[test]
    fn test_one_job_per_title_across_discs() {
        let discs = [disc("DISC_1", &[(1, 0)]), disc("DISC_2", &[(5, 2)])];
        let plan = plan_season(ctx(1), &discs, 1, false);

        assert_eq!(summary(&plan), vec![(1, 1, None), (5, 2, None)]);
        assert_eq!(plan.next_episode, 3);
        assert_eq!(plan.jobs[0].source_directory, discs[0].directory);
        assert_eq!(plan.jobs[1].source_directory, discs[1].directory);
    }

    #[test]
    fn test_chapter_mode_splits_titles() {
        let discs = [disc("DISC_1", &[(1, 0)]), disc("DISC_2", &[(5, 2)])];
        let plan = plan_season(ctx(1), &discs, 1, true);

        assert_eq!(summary(&plan), vec![(5, 1, Some(1)), (5, 2, Some(2))]);
        assert_eq!(plan.next_episode, 3);
    }

    #[test]
    fn test_chapter_mode_with_single_chapter_title_first() {
        let discs = [disc("DISC_1", &[(1, 1)]), disc("DISC_2", &[(5, 2)])];
        let plan = plan_season(ctx(1), &discs, 1, true);

        assert_eq!(
            summary(&plan),
            vec![(1, 1, Some(1)), (5, 2, Some(1)), (5, 3, Some(2))]
        );
    }

    #[test]
    fn test_empty_discs_do_not_consume_episodes() {
        let discs = [
            disc("DISC_1", &[(2, 3)]),
            disc("DISC_2", &[]),
            disc("DISC_3", &[(1, 3)]),
        ];
        let plan = plan_season(ctx(3), &discs, 7, false);

        assert_eq!(summary(&plan), vec![(2, 7, None), (1, 8, None)]);
        assert_eq!(plan.next_episode, 9);
    }

    #[test]
    fn test_titles_keep_scan_order() {
        let discs = [disc("DISC_1", &[(9, 0), (3, 0), (6, 0)])];
        let plan = plan_season(ctx(1), &discs, 1, false);
        let titles: Vec<u32> = plan.jobs.iter().map(|j| j.title_track).collect();
        assert_eq!(titles, vec![9, 3, 6]);
    }

    #[test]
    fn test_jobs_carry_season_context() {
        let plan = plan_season(ctx(4), &[disc("DISC_1", &[(1, 0)])], 1, false);
        let job = &plan.jobs[0];
        assert_eq!(plan.season, 4);
        assert_eq!(job.season, 4);
        assert_eq!(job.series_title, "Show");
        assert_eq!(job.destination_directory, PathBuf::from("/media/Show"));
    }

    #[test]
    fn test_no_discs_no_jobs() {
        let plan = plan_season(ctx(1), &[], 5, true);
        assert!(plan.jobs.is_empty());
        assert_eq!(plan.next_episode, 5);
    }

    #[test]
    fn test_numbering_stops_at_u32_max() {
        let discs = [disc("DISC_1", &[(1, 0), (2, 0)]), disc("DISC_2", &[(3, 0)])];
        let plan = plan_season(ctx(1), &discs, u32::MAX, false);

        assert_eq!(summary(&plan), vec![(1, u32::MAX, None)]);
        assert_eq!(plan.next_episode, u32::MAX);
    }

    #[test]
    fn test_chapter_numbering_stops_at_u32_max() {
        let discs = [disc("DISC_1", &[(4, 3)])];
        let plan = plan_season(ctx(1), &discs, u32::MAX - 1, true);

        assert_eq!(
            summary(&plan),
            vec![(4, u32::MAX - 1, Some(1)), (4, u32::MAX, Some(2))]
        );
        assert!(plan.jobs.iter().all(|j| j.episode >= 1));
    }

    #[test]
    fn test_cursor_first_season_gets_start_episode() {
        let mut cursor = EpisodeCursor::new(4, None);
        assert_eq!(cursor.begin_season(2), 4);
        assert_eq!(cursor.begin_season(3), 1);
        assert_eq!(cursor.begin_season(4), 1);
    }

    #[test]
    fn test_cursor_explicit_start_season() {
        let mut cursor = EpisodeCursor::new(10, Some(3));
        assert_eq!(cursor.begin_season(1), 1);
        assert_eq!(cursor.begin_season(2), 1);
        assert_eq!(cursor.begin_season(3), 10);
        assert_eq!(cursor.begin_season(4), 1);
    }

    fn discs_strategy() -> impl Strategy<Value = Vec<Vec<(u32, u32)>>> {
        prop::collection::vec(prop::collection::vec((1u32..40, 0u32..6), 0..5), 0..5)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_episodes_contiguous_from_start(
            discs in discs_strategy(),
            start in 1u32..30,
            chapter_mode in proptest::bool::ANY,
        ) {
            let discs: Vec<DiscScan> = discs
                .iter()
                .enumerate()
                .map(|(i, titles)| disc(&format!("DISC_{}", i + 1), titles))
                .collect();
            let plan = plan_season(ctx(1), &discs, start, chapter_mode);

            for (offset, job) in plan.jobs.iter().enumerate() {
                prop_assert_eq!(job.episode, start + offset as u32);
            }
            prop_assert_eq!(plan.next_episode, start + plan.jobs.len() as u32);
        }

        #[test]
        fn prop_job_count_matches_mode(
            discs in discs_strategy(),
            chapter_mode in proptest::bool::ANY,
        ) {
            let discs: Vec<DiscScan> = discs
                .iter()
                .enumerate()
                .map(|(i, titles)| disc(&format!("DISC_{}", i + 1), titles))
                .collect();
            let plan = plan_season(ctx(1), &discs, 1, chapter_mode);

            let expected: usize = discs
                .iter()
                .flat_map(|d| d.titles.iter())
                .map(|e| if chapter_mode { e.chapter_count as usize } else { 1 })
                .sum();
            prop_assert_eq!(plan.jobs.len(), expected);

            if !chapter_mode {
                prop_assert!(plan.jobs.iter().all(|j| j.selection == Selection::WholeTitle));
            }
        }

        #[test]
        fn prop_chapter_jobs_enumerate_one_to_count(chapters in 0u32..12) {
            let discs = [disc("DISC_1", &[(2, chapters)])];
            let plan = plan_season(ctx(1), &discs, 1, true);
            let got: Vec<Option<u32>> = plan.jobs.iter().map(|j| j.selection.chapter()).collect();
            let expected: Vec<Option<u32>> = (1..=chapters).map(Some).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
