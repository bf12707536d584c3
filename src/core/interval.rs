use chrono::NaiveDate;

/// Inclusive date range covering every date folded into it.
///
/// Starts empty and only ever widens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval {
    bounds: Option<(NaiveDate, NaiveDate)>,
}

impl Interval {
    pub fn widen(&mut self, date: NaiveDate) {
        self.bounds = Some(match self.bounds {
            Some((start, end)) => (start.min(date), end.max(date)),
            None => (date, date),
        });
    }

    /// `(start, end)`, or `None` while nothing has been folded in.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.bounds
    }
}
