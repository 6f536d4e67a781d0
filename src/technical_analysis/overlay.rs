//! Named per-bar series drawn on top of the candles.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayLabel {
    Ema(usize),
    Vwap,
    CumSumPv,
    CumSumVol,
    Trend,
}

impl OverlayLabel {
    /// Auxiliary series are kept for inspection but not plotted.
    pub fn is_auxiliary(&self) -> bool {
        matches!(self, Self::CumSumPv | Self::CumSumVol)
    }
}

impl fmt::Display for OverlayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ema(span) => write!(f, "{} EMA", span),
            Self::Vwap => f.write_str("VWAP"),
            Self::CumSumPv => f.write_str("CumSumPV"),
            Self::CumSumVol => f.write_str("CumSumVol"),
            Self::Trend => f.write_str("trend"),
        }
    }
}

impl Serialize for OverlayLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overlay {
    pub label: OverlayLabel,
    pub values: Vec<f64>,
}

/// Overlays in insertion order, at most one per label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlays {
    entries: Vec<Overlay>,
}

impl Overlays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the values of `label`, keeping its first position.
    pub fn insert(&mut self, label: OverlayLabel, values: Vec<f64>) {
        match self.entries.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.values = values,
            None => self.entries.push(Overlay { label, values }),
        }
    }

    /// Merge `other` into `self`, only if every series has `expected_len`
    /// values. Nothing is merged otherwise.
    pub fn try_extend(&mut self, other: Overlays, expected_len: usize) -> Result<(), Error> {
        if let Some(entry) = other.iter().find(|entry| entry.values.len() != expected_len) {
            return Err(Error::InvalidParameter(format!(
                "overlay {} has {} values for {} candles",
                entry.label,
                entry.values.len(),
                expected_len
            )));
        }

        for entry in other.entries {
            self.insert(entry.label, entry.values);
        }
        Ok(())
    }

    pub fn get(&self, label: &OverlayLabel) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|entry| entry.label == *label)
            .map(|entry| entry.values.as_slice())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Overlay> {
        self.entries.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = OverlayLabel> + '_ {
        self.entries.iter().map(|entry| entry.label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Overlays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|entry| (entry.label, &entry.values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case::ema(OverlayLabel::Ema(9), "9 EMA")]
    #[case::vwap(OverlayLabel::Vwap, "VWAP")]
    #[case::cum_pv(OverlayLabel::CumSumPv, "CumSumPV")]
    #[case::cum_vol(OverlayLabel::CumSumVol, "CumSumVol")]
    #[case::trend(OverlayLabel::Trend, "trend")]
    fn test_label_display(#[case] label: OverlayLabel, #[case] expected: &'static str) {
        assert_eq!(label.to_string(), expected);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut overlays = Overlays::new();
        overlays.insert(OverlayLabel::Ema(9), vec![1.0]);
        overlays.insert(OverlayLabel::Vwap, vec![2.0]);
        overlays.insert(OverlayLabel::Ema(9), vec![3.0]);

        assert_eq!(
            overlays.labels().collect::<Vec<_>>(),
            vec![OverlayLabel::Ema(9), OverlayLabel::Vwap]
        );
        assert_eq!(overlays.get(&OverlayLabel::Ema(9)), Some(&[3.0][..]));
    }

    #[test]
    fn test_try_extend_rejects_misaligned() {
        let mut overlays = Overlays::new();
        overlays.insert(OverlayLabel::Trend, vec![1.0, 2.0]);

        let mut other = Overlays::new();
        other.insert(OverlayLabel::Vwap, vec![1.0, 2.0]);
        other.insert(OverlayLabel::Ema(3), vec![1.0]);

        assert!(matches!(
            overlays.try_extend(other, 2),
            Err(crate::error::Error::InvalidParameter(_))
        ));
        assert_eq!(overlays.len(), 1);
    }

    #[test]
    fn test_serialize_as_map() {
        let mut overlays = Overlays::new();
        overlays.insert(OverlayLabel::Ema(15), vec![1.5]);
        overlays.insert(OverlayLabel::Vwap, vec![2.5]);

        assert_eq!(
            serde_json::to_string(&overlays).unwrap(),
            r#"{"15 EMA":[1.5],"VWAP":[2.5]}"#
        );
    }
}
