//! Bridge tagging.

use bt_core::{NodeId, WayId};
use bt_dataset::{Dataset, Journal, Mutation, Tags};

use crate::chain::ChainMatcher;
use crate::{EditError, EditResult};

pub const BRIDGE_KEY: &str = "bridge";
pub const BRIDGE_VALUE: &str = "yes";

/// `bridge=yes`.
pub fn bridge_tags() -> Tags {
    Tags::from([(BRIDGE_KEY.to_owned(), BRIDGE_VALUE.to_owned())])
}

/// Result of [`BridgeTagger::tag_explicit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitOutcome {
    pub tagged:  Vec<WayId>,
    pub missing: Vec<WayId>,
}

/// Applies the bridge tag set to ways, through the journal.
///
/// Tagging is idempotent: a way that already carries every tag is left alone
/// and nothing is journaled for it.
#[derive(Debug, Clone)]
pub struct BridgeTagger {
    matcher: ChainMatcher,
    tags:    Tags,
}

impl Default for BridgeTagger {
    fn default() -> Self {
        Self::new(ChainMatcher::default(), bridge_tags())
    }
}

impl BridgeTagger {
    pub fn new(matcher: ChainMatcher, tags: Tags) -> Self {
        Self { matcher, tags }
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn matcher(&self) -> &ChainMatcher {
        &self.matcher
    }

    /// Tag the candidate whose node chain runs `start → end`.
    ///
    /// Candidates missing from `dataset` are skipped.  When several match,
    /// the first in `candidates` order wins and the rest are logged.
    ///
    /// # Errors
    ///
    /// [`EditError::AmbiguousBridge`] if no candidate matches.
    pub fn tag_bridge<D, J>(
        &self,
        dataset:    &mut D,
        journal:    &mut J,
        candidates: &[WayId],
        start:      NodeId,
        end:        NodeId,
    ) -> EditResult<WayId>
    where
        D: Dataset,
        J: Journal,
    {
        let matching: Vec<WayId> = candidates
            .iter()
            .filter_map(|&id| dataset.way(id))
            .filter(|w| self.matcher.matches(w, start, end))
            .map(|w| w.id)
            .collect();

        let Some(&bridge) = matching.first() else {
            return Err(EditError::AmbiguousBridge {
                start,
                end,
                candidates: candidates.len(),
            });
        };
        if matching.len() > 1 {
            log::warn!(
                "{} ways run from {start} to {end}; tagging the first ({bridge}), skipping {:?}",
                matching.len(),
                &matching[1..]
            );
        }

        self.apply(dataset, journal, bridge)?;
        Ok(bridge)
    }

    /// Tag every listed way that exists; report the ones that do not.
    pub fn tag_explicit<D, J>(&self, dataset: &mut D, journal: &mut J, ways: &[WayId]) -> ExplicitOutcome
    where
        D: Dataset,
        J: Journal,
    {
        let mut outcome = ExplicitOutcome::default();
        for &id in ways {
            match self.apply(dataset, journal, id) {
                Ok(_) => outcome.tagged.push(id),
                Err(_) => outcome.missing.push(id),
            }
        }
        outcome
    }

    /// Merge the tag set into `way`.  Returns `true` if anything changed.
    fn apply<D, J>(&self, dataset: &mut D, journal: &mut J, way: WayId) -> EditResult<bool>
    where
        D: Dataset,
        J: Journal,
    {
        let current = dataset.way(way).ok_or(EditError::MissingAdditionalWay(way))?;
        if current.has_tags(&self.tags) {
            log::debug!("way {way} already tagged");
            return Ok(false);
        }

        let mut tagged = current.clone();
        tagged
            .tags
            .extend(self.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        let before = dataset.replace_way(tagged.clone())?;
        journal.record(Mutation::ChangeWay { before, after: tagged });
        Ok(true)
    }
}
