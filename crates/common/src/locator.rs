//! Output Locator
//!
//! Picks the output carrying an oracle NFT out of the outputs held at a
//! network address. Outputs are scanned in the order the indexer returned
//! them; nothing is reordered.
//!
//! The feed output holds exactly one `OracleFeed` token and nothing else, so
//! it is matched exactly. The aggregate-state output also holds the reward
//! pool tokens, so it is matched as a superset.

use crate::constants::tokens::NFT_QUANTITY;
use crate::errors::{FeedError, FeedResult};
use crate::types::{AssetBundle, AssetFingerprint, ChainOutput, MatchMode, UniquenessPolicy};

/// Returns true if `output` holds `fingerprint` under `mode`
///
/// Lovelace is ignored under both modes.
pub fn matches(output: &ChainOutput, fingerprint: &AssetFingerprint, mode: MatchMode) -> bool {
    let wanted = AssetBundle::singleton(fingerprint, NFT_QUANTITY);
    match mode {
        MatchMode::Exact => output.assets == wanted,
        MatchMode::Superset => output.assets.contains(&wanted),
    }
}

/// Find the output holding `fingerprint`
///
/// Under `AssumeUnique` the first match wins; under `VerifyUnique` a second
/// match fails with `AmbiguousMatch` carrying the total match count.
pub fn locate<'a>(
    outputs: &'a [ChainOutput],
    fingerprint: &AssetFingerprint,
    mode: MatchMode,
    uniqueness: UniquenessPolicy,
) -> FeedResult<&'a ChainOutput> {
    let mut found = outputs.iter().filter(|o| matches(o, fingerprint, mode));

    let first = found.next().ok_or_else(|| FeedError::NotFound {
        fingerprint: fingerprint.clone(),
        mode,
    })?;

    if uniqueness == UniquenessPolicy::VerifyUnique {
        let extra = found.count();
        if extra > 0 {
            return Err(FeedError::AmbiguousMatch {
                fingerprint: fingerprint.clone(),
                mode,
                matches: extra + 1,
            });
        }
    }

    Ok(first)
}

/// Output carrying the published feed: exact match, must be unique
pub fn locate_feed_output<'a>(
    outputs: &'a [ChainOutput],
    fingerprint: &AssetFingerprint,
) -> FeedResult<&'a ChainOutput> {
    locate(outputs, fingerprint, MatchMode::Exact, UniquenessPolicy::VerifyUnique)
}

/// Output carrying the aggregation settings: superset match
pub fn locate_aggregate_output<'a>(
    outputs: &'a [ChainOutput],
    fingerprint: &AssetFingerprint,
    uniqueness: UniquenessPolicy,
) -> FeedResult<&'a ChainOutput> {
    locate(outputs, fingerprint, MatchMode::Superset, uniqueness)
}
