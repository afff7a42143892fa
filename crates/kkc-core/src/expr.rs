//! Dynamic candidates.
//!
//! A dictionary candidate whose text starts with `(` is an expression (for
//! example a date insertion) rendered by an external evaluator at display
//! time. The expression language itself lives outside this crate.

use std::borrow::Cow;

/// Marker that opens an expression candidate.
pub const EXPRESSION_OPEN: char = '(';

/// Candidate text, classified once when the lattice node is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Surface {
    Literal(String),
    Expression(String),
}

impl Surface {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with(EXPRESSION_OPEN) {
            Surface::Expression(text)
        } else {
            Surface::Literal(text)
        }
    }

    /// Stored text, without evaluating expressions.
    pub fn raw(&self) -> &str {
        match self {
            Surface::Literal(s) | Surface::Expression(s) => s,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Surface::Expression(_))
    }

    /// Display text. Expressions go through `evaluator`.
    pub fn render(&self, evaluator: &dyn DynamicEvaluator) -> Result<Cow<'_, str>, RenderError> {
        match self {
            Surface::Literal(s) => Ok(Cow::Borrowed(s)),
            Surface::Expression(expr) => {
                evaluator
                    .run(expr)
                    .map(Cow::Owned)
                    .map_err(|source| RenderError {
                        expression: expr.clone(),
                        source,
                    })
            }
        }
    }

    /// Display text, falling back to the stored text when evaluation fails.
    pub fn render_or_raw(&self, evaluator: &dyn DynamicEvaluator) -> Cow<'_, str> {
        self.render(evaluator).unwrap_or_else(|e| {
            tracing::warn!("{e}");
            Cow::Borrowed(self.raw())
        })
    }
}

/// Evaluates expression candidates. Shared between conversions.
pub trait DynamicEvaluator: Send + Sync {
    fn run(&self, expression: &str) -> Result<String, EvalError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("expressions are not supported")]
    Unsupported,
    #[error("evaluation failed: {0}")]
    Failed(String),
}

/// Rendering failure of a single candidate. Never fails a conversion.
#[derive(Debug, thiserror::Error)]
#[error("cannot render {expression:?}: {source}")]
pub struct RenderError {
    pub expression: String,
    #[source]
    pub source: EvalError,
}

/// Evaluator for setups without an expression engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvaluator;

impl DynamicEvaluator for NoEvaluator {
    fn run(&self, _expression: &str) -> Result<String, EvalError> {
        Err(EvalError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock;

    impl DynamicEvaluator for FixedClock {
        fn run(&self, expression: &str) -> Result<String, EvalError> {
            match expression {
                "(today)" => Ok("2024-01-02".to_string()),
                _ => Err(EvalError::Failed(format!("unknown form {expression}"))),
            }
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(Surface::new("私"), Surface::Literal("私".into()));
        assert_eq!(Surface::new("(today)"), Surface::Expression("(today)".into()));
        assert!(!Surface::new("").is_expression());
        // Only a leading marker makes an expression.
        assert!(!Surface::new("顔(笑)").is_expression());
    }

    #[test]
    fn test_render_literal_verbatim() {
        let s = Surface::new("名前");
        assert_eq!(s.render(&NoEvaluator).unwrap(), "名前");
    }

    #[test]
    fn test_render_expression() {
        let s = Surface::new("(today)");
        assert_eq!(s.render(&FixedClock).unwrap(), "2024-01-02");
    }

    #[test]
    fn test_render_failure_is_scoped() {
        let s = Surface::new("(tomorrow)");
        let err = s.render(&FixedClock).unwrap_err();
        assert_eq!(err.expression, "(tomorrow)");
        assert_eq!(s.render_or_raw(&FixedClock), "(tomorrow)");
    }

    #[test]
    fn test_no_evaluator_falls_back() {
        let s = Surface::new("(today)");
        assert!(matches!(
            s.render(&NoEvaluator),
            Err(RenderError {
                source: EvalError::Unsupported,
                ..
            })
        ));
        assert_eq!(s.render_or_raw(&NoEvaluator), "(today)");
    }
}
