// ============================================================
// Layer 5 — Model Contract
// ============================================================
// The training loop is architecture-agnostic: it only needs
//   - forward(images) → per-class scores    (ImageClassifier)
//   - parameter snapshot / restore          (Module::into_record / load_record)
//   - train vs eval mode                    (AutodiffModule::valid)
//
// Burn's Module and AutodiffModule traits already cover the
// last two; ImageClassifier adds the forward pass.

use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Anything that maps a batch of images to class scores.
///
/// images: [batch, 3, 32, 32] → logits: [batch, num_classes]
pub trait ImageClassifier<B: Backend>: Module<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

/// Architectures selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    DenseNet,
    LeNet,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::DenseNet => write!(f, "densenet"),
            ModelKind::LeNet    => write!(f, "lenet"),
        }
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "densenet" => Ok(ModelKind::DenseNet),
            "lenet"    => Ok(ModelKind::LeNet),
            other      => Err(format!("unknown model '{other}' (expected densenet or lenet)")),
        }
    }
}

/// Number of predictions in `logits` whose argmax equals `targets`.
///
/// argmax(1) returns [batch, 1], so it is flattened to [batch]
/// before the comparison.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::TensorData};

    type TestBackend = NdArray;

    #[test]
    fn test_model_kind_round_trips_through_strings() {
        assert_eq!("DenseNet".parse::<ModelKind>().unwrap(), ModelKind::DenseNet);
        assert_eq!("lenet".parse::<ModelKind>().unwrap(), ModelKind::LeNet);
        assert_eq!(ModelKind::LeNet.to_string(), "lenet");
        assert!("resnet".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_count_correct_uses_argmax() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(
                vec![0.1f32, 2.0, 0.3,   // → 1
                     5.0,    0.0, 0.0,   // → 0
                     0.0,    0.1, 0.2],  // → 2
                [3, 3],
            ),
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_data(
            TensorData::new(vec![1i64, 2, 2], [3]),
            &device,
        );
        assert_eq!(count_correct(logits, targets), 2);
    }
}
