//! Walker's alias method: O(|A|) precomputation, O(1) sampling. Used by the
//! softmax family to amortise repeated draws from the same distribution
//! across `alias_recompute_freq * |A|` backups (§4.D.2, design note 9).

use rand::Rng;

#[derive(Debug, Clone)]
pub struct AliasTable {
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl AliasTable {
    /// `weights` need not be normalized; must be non-empty and all >= 0.
    pub fn build(weights: &[f64]) -> Self {
        let n = weights.len();
        assert!(n > 0, "alias table requires a non-empty support");
        let total: f64 = weights.iter().sum();
        let scaled: Vec<f64> = if total > 0.0 {
            weights.iter().map(|w| w / total * n as f64).collect()
        } else {
            vec![1.0; n]
        };

        let mut prob = vec![0.0; n];
        let mut alias = vec![0usize; n];
        let mut small = Vec::new();
        let mut large = Vec::new();
        for (i, &p) in scaled.iter().enumerate() {
            if p < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        let mut scaled = scaled;
        while let (Some(s), Some(l)) = (small.pop(), large.pop()) {
            prob[s] = scaled[s];
            alias[s] = l;
            scaled[l] = scaled[l] + scaled[s] - 1.0;
            if scaled[l] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }
        for i in large {
            prob[i] = 1.0;
        }
        for i in small {
            prob[i] = 1.0;
        }

        Self { prob, alias }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> usize {
        let n = self.prob.len();
        let i = rng.gen_range(0..n);
        if rng.gen::<f64>() < self.prob[i] {
            i
        } else {
            self.alias[i]
        }
    }

    pub fn support_len(&self) -> usize {
        self.prob.len()
    }
}
