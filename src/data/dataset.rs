use burn::data::dataset::Dataset;

use crate::domain::sample::CtrSample;

/// In-memory impressions served to Burn's DataLoader.
pub struct CtrDataset {
    samples: Vec<CtrSample>,
}

impl CtrDataset {
    pub fn new(samples: Vec<CtrSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Fraction of clicked samples.
    pub fn click_rate(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().filter(|s| s.is_click()).count() as f64 / self.samples.len() as f64
    }
}

impl Dataset<CtrSample> for CtrDataset {
    fn get(&self, index: usize) -> Option<CtrSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_click_rate() {
        let ds = CtrDataset::new(vec![CtrSample::new(1.0), CtrSample::new(0.0), CtrSample::new(0.0), CtrSample::new(1.0)]);
        assert_eq!(ds.len(), 4);
        assert!(ds.get(3).unwrap().is_click());
        assert!(ds.get(4).is_none());
        assert!((ds.click_rate() - 0.5).abs() < 1e-9);
        assert_eq!(CtrDataset::new(Vec::new()).click_rate(), 0.0);
    }
}
