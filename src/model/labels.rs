use crate::error::InferenceError;

/// Ordered output vocabulary of a classifier. Index `i` of the model's score
/// vector corresponds to `names[i]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub index: usize,
    pub confidence: f32,
}

impl ClassLabels {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.names.iter().any(|n| n == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Pick the top-scoring class. `scores` are raw logits, one per label.
    pub fn decide(&self, scores: &[f32]) -> Result<Prediction, InferenceError> {
        if scores.len() != self.names.len() {
            return Err(InferenceError(format!(
                "model produced {} scores for {} labels",
                scores.len(),
                self.names.len()
            )));
        }
        if scores.iter().any(|s| s.is_nan()) {
            return Err(InferenceError("model produced NaN scores".to_string()));
        }

        let (index, best) = scores
            .iter()
            .copied()
            .enumerate()
            .fold(None, |acc: Option<(usize, f32)>, (i, s)| match acc {
                Some((_, b)) if b >= s => acc,
                _ => Some((i, s)),
            })
            .ok_or_else(|| InferenceError("empty label set".to_string()))?;

        // Softmax of the winner, shifted by the max for stability.
        let total: f32 = scores.iter().map(|s| (s - best).exp()).sum();

        Ok(Prediction {
            label: self.names[index].clone(),
            index,
            confidence: 1.0 / total,
        })
    }
}
