use crate::models::commit::Commit;
use chrono::{DateTime, Utc};

/// Find the commit whose author timestamp is closest to `target`.
///
/// Ties keep the first commit encountered in `history`. Returns `None` only
/// for an empty history.
pub fn resolve_nearest<I>(history: I, target: DateTime<Utc>) -> Option<Commit>
where
    I: IntoIterator<Item = Commit>,
{
    let mut closest: Option<(i64, Commit)> = None;

    for commit in history {
        let distance = commit
            .authored_at
            .signed_duration_since(target)
            .num_milliseconds()
            .saturating_abs();

        let is_closer = closest
            .as_ref()
            .map_or(true, |(best, _)| distance < *best);
        if is_closer {
            closest = Some((distance, commit));
        }
    }

    closest.map(|(_, commit)| commit)
}
