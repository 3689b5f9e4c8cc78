//! Static statistic catalog.
//!
//! Three immutable tables describe every statistic the pipeline knows about:
//! - [`ALL_STATISTICS`]: the canonical display names, the set an orchestrated run covers
//! - [`LOCATORS`]: display name -> numeric id of the source ranking page
//! - [`LEGACY_ATTRIBUTES`]: legacy wide-format attribute name -> display name
//!
//! [`validate`] cross-checks the tables and is run before any orchestrated work.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::{OutrankError, Result};


/// Base URL of the team ranking pages.
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://www.ncaa.com/stats/football/fbs/current/team";

/// Highest page of a ranking table that carries relevant rows.
pub const MAX_SOURCE_PAGES: u32 = 3;

pub const ALL_STATISTICS: [&str; 47] = [
    "3rd Down Conversion Pct",
    "3rd Down Conversion Pct Defense",
    "4th Down Conversion Pct",
    "4th Down Conversion Pct Defense",
    "Blocked Kicks",
    "Blocked Kicks Allowed",
    "Blocked Punts",
    "Blocked Punts Allowed",
    "Completion Percentage",
    "Defensive TDs",
    "Fewest Penalties",
    "Fewest Penalties Per Game",
    "Fewest Penalty Yards",
    "Fewest Penalty Yards Per Game",
    "First Downs Defense",
    "First Downs Offense",
    "Fumbles Lost",
    "Fumbles Recovered",
    "Kickoff Return Defense",
    "Kickoff Returns",
    "Net Punting",
    "Passes Had Intercepted",
    "Passes Intercepted",
    "Passing Offense",
    "Passing Yards Allowed",
    "Passing Yards Per Completion",
    "Punt Return Defense",
    "Punt Returns",
    "Red Zone Defense",
    "Red Zone Offense",
    "Rushing Defense",
    "Rushing Offense",
    "Sacks Allowed",
    "Scoring Defense",
    "Scoring Offense",
    "Tackles For Loss Allowed",
    "Team Passing Efficiency",
    "Team Passing Efficiency Defense",
    "Team Sacks",
    "Team Tackles For Loss",
    "Time Of Possession",
    "Total Defense",
    "Total Offense",
    "Turnover Margin",
    "Turnovers Gained",
    "Turnovers Lost",
    "Winning Percentage",
];

pub const LOCATORS: &[(&str, u16)] = &[
    ("3rd Down Conversion Pct", 699),
    ("3rd Down Conversion Pct Defense", 701),
    ("4th Down Conversion Pct", 700),
    ("4th Down Conversion Pct Defense", 702),
    ("Blocked Kicks", 785),
    ("Blocked Kicks Allowed", 786),
    ("Blocked Punts", 790),
    ("Blocked Punts Allowed", 791),
    ("Completion Percentage", 756),
    ("Defensive TDs", 926),
    ("Fewest Penalties", 876),
    ("Fewest Penalties Per Game", 697),
    ("Fewest Penalty Yards", 877),
    ("Fewest Penalty Yards Per Game", 698),
    ("First Downs Defense", 694),
    ("First Downs Offense", 693),
    ("Fumbles Lost", 458),
    ("Fumbles Recovered", 456),
    ("Kickoff Return Defense", 463),
    ("Kickoff Returns", 96),
    ("Net Punting", 98),
    ("Passes Had Intercepted", 459),
    ("Passes Intercepted", 457),
    ("Passing Offense", 25),
    ("Passing Yards Allowed", 695),
    ("Passing Yards Per Completion", 741),
    ("Punt Return Defense", 462),
    ("Punt Returns", 97),
    ("Red Zone Defense", 704),
    ("Red Zone Offense", 703),
    ("Rushing Defense", 24),
    ("Rushing Offense", 23),
    ("Sacks Allowed", 468),
    ("Scoring Defense", 28),
    ("Scoring Offense", 27),
    ("Tackles For Loss Allowed", 696),
    ("Team Passing Efficiency", 465),
    ("Team Passing Efficiency Defense", 40),
    ("Team Sacks", 466),
    ("Team Tackles For Loss", 467),
    ("Time Of Possession", 705),
    ("Total Defense", 22),
    ("Total Offense", 21),
    ("Turnover Margin", 29),
    ("Turnovers Gained", 460),
    ("Turnovers Lost", 461),
    ("Winning Percentage", 742),
];

pub const LEGACY_ATTRIBUTES: &[(&str, &str)] = &[
    ("ThirdDownConversionPct", "3rd Down Conversion Pct"),
    ("ThirdDownConversionPctDefense", "3rd Down Conversion Pct Defense"),
    ("FourthDownConversionPct", "4th Down Conversion Pct"),
    ("FourthDownConversionPctDefense", "4th Down Conversion Pct Defense"),
    ("BlockedKicks", "Blocked Kicks"),
    ("BlockedKicksAllowed", "Blocked Kicks Allowed"),
    ("BlockedPunts", "Blocked Punts"),
    ("BlockedPuntsAllowed", "Blocked Punts Allowed"),
    ("CompletionPercentage", "Completion Percentage"),
    ("DefensiveTDs", "Defensive TDs"),
    ("FewestPenalties", "Fewest Penalties"),
    ("FewestPenaltiesPerGame", "Fewest Penalties Per Game"),
    ("FewestPenaltyYards", "Fewest Penalty Yards"),
    ("FewestPenaltyYardsPerGame", "Fewest Penalty Yards Per Game"),
    ("FirstDownsDefense", "First Downs Defense"),
    ("FirstDownsOffense", "First Downs Offense"),
    ("FumblesLost", "Fumbles Lost"),
    ("FumblesRecovered", "Fumbles Recovered"),
    ("KickoffReturnDefense", "Kickoff Return Defense"),
    ("KickoffReturns", "Kickoff Returns"),
    ("NetPunting", "Net Punting"),
    ("PassesHadIntercepted", "Passes Had Intercepted"),
    ("PassesIntercepted", "Passes Intercepted"),
    ("PassingOffense", "Passing Offense"),
    ("PassingYardsAllowed", "Passing Yards Allowed"),
    ("PassingYardsPerCompletion", "Passing Yards Per Completion"),
    ("PuntReturnDefense", "Punt Return Defense"),
    ("PuntReturns", "Punt Returns"),
    ("RedZoneDefense", "Red Zone Defense"),
    ("RedZoneOffense", "Red Zone Offense"),
    ("RushingDefense", "Rushing Defense"),
    ("RushingOffense", "Rushing Offense"),
    ("SacksAllowed", "Sacks Allowed"),
    ("ScoringDefense", "Scoring Defense"),
    ("ScoringOffense", "Scoring Offense"),
    ("TacklesForLossAllowed", "Tackles For Loss Allowed"),
    ("TeamPassingEfficiency", "Team Passing Efficiency"),
    ("TeamPassingEfficiencyDefense", "Team Passing Efficiency Defense"),
    ("TeamSacks", "Team Sacks"),
    ("TeamTacklesForLoss", "Team Tackles For Loss"),
    ("TimeOfPossession", "Time Of Possession"),
    ("TotalDefense", "Total Defense"),
    ("TotalOffense", "Total Offense"),
    ("TurnoverMargin", "Turnover Margin"),
    ("TurnoversGained", "Turnovers Gained"),
    ("TurnoversLost", "Turnovers Lost"),
    ("WinningPercentage", "Winning Percentage"),
];

/// Where a statistic's ranking table lives on the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLocator {
    pub id: u16,
}

impl SourceLocator {
    /// URL of one page of the ranking table. Page 1 is the bare locator,
    /// later pages append `/p{n}`.
    pub fn page_url(&self, base_url: &str, page: u32) -> String {
        let base = base_url.trim_end_matches('/');
        if page <= 1 {
            format!("{}/{}", base, self.id)
        } else {
            format!("{}/{}/p{}", base, self.id, page)
        }
    }
}

static LOCATOR_INDEX: LazyLock<HashMap<&'static str, SourceLocator>> = LazyLock::new(|| {
    LOCATORS
        .iter()
        .map(|(name, id)| (*name, SourceLocator { id: *id }))
        .collect()
});

static ATTRIBUTE_INDEX: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| LEGACY_ATTRIBUTES.iter().copied().collect());

/// Resolve a statistic to its source locator.
pub fn locator_for(statistic: &str) -> Result<SourceLocator> {
    LOCATOR_INDEX
        .get(statistic)
        .copied()
        .ok_or_else(|| OutrankError::UnknownStatistic {
            statistic: statistic.to_string(),
        })
}

/// Translate a legacy attribute name to its display name.
pub fn display_name_for_attribute(attribute: &str) -> Option<&'static str> {
    ATTRIBUTE_INDEX.get(attribute).copied()
}

/// Inverse of [`display_name_for_attribute`].
pub fn attribute_for_display_name(statistic: &str) -> Option<&'static str> {
    LEGACY_ATTRIBUTES
        .iter()
        .find(|(_, name)| *name == statistic)
        .map(|(attr, _)| *attr)
}

pub fn is_known_statistic(statistic: &str) -> bool {
    ALL_STATISTICS.contains(&statistic)
}

/// Check the tables against each other: every known statistic has exactly one
/// locator and one legacy attribute, nothing maps to an unknown statistic, and
/// neither locator ids nor attribute names repeat.
pub fn validate() -> Result<()> {
    check_tables(&ALL_STATISTICS, LOCATORS, LEGACY_ATTRIBUTES)
}

pub(crate) fn check_tables(
    statistics: &[&str],
    locators: &[(&str, u16)],
    attributes: &[(&str, &str)],
) -> Result<()> {
    let mut problems = Vec::new();
    let known: HashSet<&str> = statistics.iter().copied().collect();

    if known.len() != statistics.len() {
        problems.push("duplicate statistic names".to_string());
    }

    let mut located = HashSet::new();
    let mut ids = HashSet::new();
    for (name, id) in locators {
        if !known.contains(name) {
            problems.push(format!("locator registered for unknown statistic '{}'", name));
        }
        if !located.insert(*name) {
            problems.push(format!("statistic '{}' has more than one locator", name));
        }
        if !ids.insert(*id) {
            problems.push(format!("locator id {} is used twice", id));
        }
    }

    let mut translated = HashSet::new();
    let mut attribute_names = HashSet::new();
    for (attribute, name) in attributes {
        if !known.contains(name) {
            problems.push(format!(
                "attribute '{}' maps to unknown statistic '{}'",
                attribute, name
            ));
        }
        if !translated.insert(*name) {
            problems.push(format!("statistic '{}' has more than one attribute", name));
        }
        if !attribute_names.insert(*attribute) {
            problems.push(format!("attribute '{}' appears twice", attribute));
        }
    }

    for name in statistics {
        if !located.contains(name) {
            problems.push(format!("statistic '{}' has no locator", name));
        }
        if !translated.contains(name) {
            problems.push(format!("statistic '{}' has no legacy attribute", name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(OutrankError::CatalogInvalid { problems })
    }
}
