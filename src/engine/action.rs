//! Externally selectable actions
//!
//! The host selects an action by name, either the bare name
//! (`FILE_READ_MULTIPLE_GO`), the operation name (`fileReadMultipleGo`), or a
//! full intent action (`com.example.assetpack.action.FILE_READ_MULTIPLE_GO`).

use crate::error::{BenchError, Result};
use crate::strategy::StrategyKind;
use std::fmt;
use std::str::FromStr;

/// Prefix of intent actions sent by the host
pub const INTENT_ACTION_PREFIX: &str = "com.example.assetpack.action.";

/// Where an action reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Asset,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Init,
    AssetReadOneGo,
    AssetReadMultipleGo,
    OpenOneGo,
    OpenNoStatOneGo,
    FileReadOneGo,
    FileReadMultipleGo,
    StreamFileReadOneGo,
    StreamFileReadMultipleGo,
    FopenOneGo,
    MmapReadOneGo,
    MmapReadMultipleGo,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Self::Init,
        Self::AssetReadOneGo,
        Self::AssetReadMultipleGo,
        Self::OpenOneGo,
        Self::OpenNoStatOneGo,
        Self::FileReadOneGo,
        Self::FileReadMultipleGo,
        Self::StreamFileReadOneGo,
        Self::StreamFileReadMultipleGo,
        Self::FopenOneGo,
        Self::MmapReadOneGo,
        Self::MmapReadMultipleGo,
    ];

    /// Upper snake case name, as used in intent actions
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::AssetReadOneGo => "ASSET_READ_ONE_GO",
            Self::AssetReadMultipleGo => "ASSET_READ_MULTIPLE_GO",
            Self::OpenOneGo => "OPEN_ONE_GO",
            Self::OpenNoStatOneGo => "OPEN_NO_STAT_ONE_GO",
            Self::FileReadOneGo => "FILE_READ_ONE_GO",
            Self::FileReadMultipleGo => "FILE_READ_MULTIPLE_GO",
            Self::StreamFileReadOneGo => "STREAM_FILE_READ_ONE_GO",
            Self::StreamFileReadMultipleGo => "STREAM_FILE_READ_MULTIPLE_GO",
            Self::FopenOneGo => "FOPEN_ONE_GO",
            Self::MmapReadOneGo => "MMAP_READ_ONE_GO",
            Self::MmapReadMultipleGo => "MMAP_READ_MULTIPLE_GO",
        }
    }

    /// Strategy timed by this action; `None` for `Init`
    pub const fn strategy(self) -> Option<StrategyKind> {
        match self {
            Self::Init => None,
            Self::AssetReadOneGo | Self::FileReadOneGo => Some(StrategyKind::FullRead),
            Self::AssetReadMultipleGo | Self::FileReadMultipleGo => {
                Some(StrategyKind::ChunkedRead)
            }
            Self::OpenOneGo => Some(StrategyKind::OpenOnly),
            Self::OpenNoStatOneGo => Some(StrategyKind::OpenNoStat),
            Self::StreamFileReadOneGo => Some(StrategyKind::StreamedRead),
            Self::StreamFileReadMultipleGo => Some(StrategyKind::StreamedChunkedRead),
            Self::FopenOneGo => Some(StrategyKind::BufferedOpenRead),
            Self::MmapReadOneGo => Some(StrategyKind::MappedRead),
            Self::MmapReadMultipleGo => Some(StrategyKind::MappedChunkedRead),
        }
    }

    /// Source the action reads from; `None` for `Init`
    pub const fn target(self) -> Option<Target> {
        match self {
            Self::Init => None,
            Self::AssetReadOneGo | Self::AssetReadMultipleGo => Some(Target::Asset),
            _ => Some(Target::File),
        }
    }

    /// True if the action accepts a piece count
    pub const fn takes_pieces(self) -> bool {
        match self.strategy() {
            Some(kind) => kind.is_chunked(),
            None => false,
        }
    }

    /// Parses a full intent action string
    pub fn from_intent_action(action: &str) -> Result<Self> {
        let name = action.strip_prefix(INTENT_ACTION_PREFIX).ok_or_else(|| {
            BenchError::InvalidArgument(format!("unknown intent action: {}", action))
        })?;
        name.parse()
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for Action {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with(INTENT_ACTION_PREFIX) {
            return Self::from_intent_action(s);
        }
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|a| normalize(a.name()) == wanted)
            .ok_or_else(|| BenchError::InvalidArgument(format!("unknown action: {}", s)))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(
            "FILE_READ_MULTIPLE_GO".parse::<Action>().unwrap(),
            Action::FileReadMultipleGo
        );
        assert_eq!(
            "fileReadMultipleGo".parse::<Action>().unwrap(),
            Action::FileReadMultipleGo
        );
        assert_eq!(
            "open-no-stat-one-go".parse::<Action>().unwrap(),
            Action::OpenNoStatOneGo
        );
        assert_eq!(
            "com.example.assetpack.action.INIT".parse::<Action>().unwrap(),
            Action::Init
        );
        assert!("com.example.other.INIT".parse::<Action>().is_err());
        assert!("".parse::<Action>().is_err());
    }

    #[test]
    fn test_every_name_roundtrips() {
        for action in Action::ALL {
            assert_eq!(action.name().parse::<Action>().unwrap(), action);
            let intent = format!("{}{}", INTENT_ACTION_PREFIX, action);
            assert_eq!(Action::from_intent_action(&intent).unwrap(), action);
        }
    }

    #[test]
    fn test_mapping() {
        assert_eq!(Action::Init.strategy(), None);
        assert_eq!(Action::FopenOneGo.strategy(), Some(StrategyKind::BufferedOpenRead));
        assert_eq!(Action::AssetReadMultipleGo.target(), Some(Target::Asset));
        assert_eq!(Action::OpenOneGo.target(), Some(Target::File));

        let chunked: Vec<_> = Action::ALL.into_iter().filter(|a| a.takes_pieces()).collect();
        assert_eq!(
            chunked,
            vec![
                Action::AssetReadMultipleGo,
                Action::FileReadMultipleGo,
                Action::StreamFileReadMultipleGo,
                Action::MmapReadMultipleGo,
            ]
        );
    }
}
