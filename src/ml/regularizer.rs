// ============================================================
// Layer 5: Parameter Regularization
// ============================================================
// Adds a penalty over every float parameter of a module to the
// training loss:
//
//   L1(λ)          λ · Σ|θ|
//   L2(λ)          λ · Σθ²
//   L1L2{l1, l2}   l1 · Σ|θ| + l2 · Σθ²
//
// Parameters are collected with a ModuleVisitor, so embeddings,
// attention projections and the model bias are all covered
// without the module having to list them.

use burn::{
    module::{Module, ModuleVisitor, ParamId},
    prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Regularizer {
    #[default]
    None,
    L1(f64),
    L2(f64),
    L1L2 { l1: f64, l2: f64 },
}

impl Regularizer {
    /// Short norm label used in summaries ("l1", "l2", ...).
    pub fn norm(&self) -> &'static str {
        match self {
            Regularizer::None        => "none",
            Regularizer::L1(_)       => "l1",
            Regularizer::L2(_)       => "l2",
            Regularizer::L1L2 { .. } => "l1l2",
        }
    }

    /// Coefficient(s) formatted for summaries.
    pub fn lambda(&self) -> String {
        match self {
            Regularizer::None            => "-".to_string(),
            Regularizer::L1(l)           => format!("{l}"),
            Regularizer::L2(l)           => format!("{l}"),
            Regularizer::L1L2 { l1, l2 } => format!("{l1}/{l2}"),
        }
    }

    /// Penalty of a single parameter tensor, shape [1].
    pub fn term<B: Backend, const D: usize>(&self, param: Tensor<B, D>) -> Option<Tensor<B, 1>> {
        match *self {
            Regularizer::None   => None,
            Regularizer::L1(l)  => Some(param.abs().sum().mul_scalar(l)),
            Regularizer::L2(l)  => Some(param.powf_scalar(2.0).sum().mul_scalar(l)),
            Regularizer::L1L2 { l1, l2 } => {
                let l1_term = param.clone().abs().sum().mul_scalar(l1);
                let l2_term = param.powf_scalar(2.0).sum().mul_scalar(l2);
                Some(l1_term + l2_term)
            }
        }
    }

    /// Total penalty over every float parameter of `module`.
    /// Returns None for `Regularizer::None` or a module without parameters.
    pub fn penalty<B: Backend, M: Module<B>>(&self, module: &M) -> Option<Tensor<B, 1>> {
        if *self == Regularizer::None {
            return None;
        }
        let mut visitor = PenaltyVisitor { regularizer: *self, total: None };
        module.visit(&mut visitor);
        visitor.total
    }
}

struct PenaltyVisitor<B: Backend> {
    regularizer: Regularizer,
    total:       Option<Tensor<B, 1>>,
}

impl<B: Backend> ModuleVisitor<B> for PenaltyVisitor<B> {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        if let Some(term) = self.regularizer.term(tensor.clone()) {
            self.total = Some(match self.total.take() {
                Some(total) => total + term,
                None        => term,
            });
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::module::Param;

    type TestBackend = NdArray;

    #[derive(Module, Debug)]
    struct TwoParams<B: Backend> {
        a: Param<Tensor<B, 1>>,
        b: Param<Tensor<B, 2>>,
    }

    fn module() -> TwoParams<TestBackend> {
        let device = Default::default();
        TwoParams {
            a: Param::from_tensor(Tensor::from_floats([1.0, -2.0], &device)),
            b: Param::from_tensor(Tensor::from_floats([[3.0], [-1.0]], &device)),
        }
    }

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar()
    }

    #[test]
    fn test_l1_sums_absolute_values() {
        // |1| + |-2| + |3| + |-1| = 7
        let p = Regularizer::L1(0.5).penalty(&module()).unwrap();
        assert!((scalar(p) - 3.5).abs() < 1e-5);
    }

    #[test]
    fn test_l2_sums_squares() {
        // 1 + 4 + 9 + 1 = 15
        let p = Regularizer::L2(0.1).penalty(&module()).unwrap();
        assert!((scalar(p) - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_l1l2_adds_both() {
        let p = Regularizer::L1L2 { l1: 1.0, l2: 1.0 }.penalty(&module()).unwrap();
        assert!((scalar(p) - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_none_has_no_penalty() {
        assert!(Regularizer::None.penalty(&module()).is_none());
    }

    #[test]
    fn test_summary_labels() {
        assert_eq!(Regularizer::L2(0.1).norm(), "l2");
        assert_eq!(Regularizer::L2(0.1).lambda(), "0.1");
        assert_eq!(Regularizer::None.lambda(), "-");
    }
}
