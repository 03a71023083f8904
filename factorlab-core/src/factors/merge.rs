//! Combine several per-symbol tables into one wide table.
//!
//! Dates are outer-joined; a table without a row for some date contributes
//! `NaN` cells there. Columns are labelled `"{var}/{symbol}"`.

use super::FactorError;
use crate::domain::Frame;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

pub fn merge(frames: &[(&str, &Frame)]) -> Result<Frame, FactorError> {
    let dates: Vec<NaiveDate> = frames
        .iter()
        .flat_map(|(_, f)| f.dates().iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let row_of: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();

    let columns: Vec<String> = frames
        .iter()
        .flat_map(|(var, f)| f.columns().iter().map(move |c| format!("{var}/{c}")))
        .collect();

    let mut merged = Frame::filled(dates, columns, f64::NAN)?;
    let mut offset = 0;
    for (_, frame) in frames {
        for (r, date) in frame.dates().iter().enumerate() {
            let target = row_of[date];
            for c in 0..frame.n_cols() {
                merged.set(target, offset + c, frame.get(r, c));
            }
        }
        offset += frame.n_cols();
    }
    Ok(merged)
}
