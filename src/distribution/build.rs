use super::SparseHistogram;
use crate::model::ContributionEvent;

/// Group contributions by ISO week. Only weeks with events get a bucket, and
/// dates inside a bucket keep the order they were given in.
pub fn build<'a, I>(events: I) -> SparseHistogram
where
    I: IntoIterator<Item = &'a ContributionEvent>,
{
    events
        .into_iter()
        .fold(SparseHistogram::default(), |mut histogram, event| {
            histogram.record(event.created_at);
            histogram
        })
}
