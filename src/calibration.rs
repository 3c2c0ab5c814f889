//! Calibrations mapping raw sensor samples to stroke millimetres.
//!
//! A [`CalibrationMethod`] is a named expression over `sample`, the bounds
//! `MAX_STROKE` and `MAX_TRAVEL`, the method's declared inputs and its
//! intermediates. A [`Calibration`] supplies the input values and, once
//! prepared with the bounds of one suspension end, evaluates samples.

use crate::linkage::Linkage;
use evalexpr::{
    ContextWithMutableVariables, EvalexprError, HashMapContext, Node, Value, build_operator_tree,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const SAMPLE: &str = "sample";
pub const MAX_STROKE: &str = "MAX_STROKE";
pub const MAX_TRAVEL: &str = "MAX_TRAVEL";

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("calibration '{calibration}' does not supply input '{input}' of method '{method}'")]
    MissingInput {
        calibration: String,
        method: String,
        input: String,
    },

    #[error("cannot evaluate {role} '{expression}': {source}")]
    Expression {
        role: String,
        expression: String,
        #[source]
        source: EvalexprError,
    },

    #[error("calibration '{0}' has not been prepared")]
    NotPrepared(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CalibrationMethod {
    pub name: String,
    pub description: String,
    pub inputs: Vec<String>,
    /// Evaluated in key order; later entries may refer to earlier ones.
    pub intermediates: BTreeMap<String, String>,
    pub expression: String,
}

impl CalibrationMethod {
    /// Samples are a percentage of the maximum stroke.
    pub fn percentage() -> Self {
        Self {
            name: "percentage".to_string(),
            description: "Sample is a percentage of the maximum stroke".to_string(),
            inputs: Vec::new(),
            intermediates: BTreeMap::from([(
                "factor".to_string(),
                "MAX_STROKE / 100.0".to_string(),
            )]),
            expression: "sample * factor".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Prepared {
    context: HashMapContext,
    expression: Node,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Calibration {
    pub name: String,
    pub method: Arc<CalibrationMethod>,
    pub inputs: BTreeMap<String, f64>,
    pub max_stroke: f64,
    pub max_travel: f64,
    #[serde(skip)]
    prepared: Option<Prepared>,
}

impl Calibration {
    pub fn new(name: impl Into<String>, method: Arc<CalibrationMethod>) -> Self {
        Self {
            name: name.into(),
            method,
            inputs: BTreeMap::new(),
            max_stroke: 0.0,
            max_travel: 0.0,
            prepared: None,
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: f64) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    /// Binds the bounds, inputs and intermediates and checks that the method
    /// expression evaluates to a number.
    ///
    /// On error the calibration stays unprepared.
    pub fn prepare(&mut self, max_stroke: f64, max_travel: f64) -> Result<(), CalibrationError> {
        self.prepared = None;

        let mut context = HashMapContext::new();
        set_float(&mut context, MAX_STROKE, max_stroke)?;
        set_float(&mut context, MAX_TRAVEL, max_travel)?;
        set_float(&mut context, SAMPLE, 0.0)?;

        for input in &self.method.inputs {
            let value = self
                .inputs
                .get(input)
                .ok_or_else(|| CalibrationError::MissingInput {
                    calibration: self.name.clone(),
                    method: self.method.name.clone(),
                    input: input.clone(),
                })?;
            set_float(&mut context, input, *value)?;
        }

        for (name, expression) in &self.method.intermediates {
            let value = compile(&format!("intermediate '{name}'"), expression)?
                .eval_number_with_context(&context)
                .map_err(|source| CalibrationError::Expression {
                    role: format!("intermediate '{name}'"),
                    expression: expression.clone(),
                    source,
                })?;
            set_float(&mut context, name, value)?;
        }

        let expression = compile("expression", &self.method.expression)?;
        expression
            .eval_number_with_context(&context)
            .map_err(|source| CalibrationError::Expression {
                role: "expression".to_string(),
                expression: self.method.expression.clone(),
                source,
            })?;

        self.max_stroke = max_stroke;
        self.max_travel = max_travel;
        self.prepared = Some(Prepared {
            context,
            expression,
        });
        debug!(
            calibration = %self.name,
            method = %self.method.name,
            max_stroke,
            max_travel,
            "Calibration prepared"
        );
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Value bound to an intermediate by [`Calibration::prepare`].
    pub fn intermediate(&self, name: &str) -> Option<f64> {
        let prepared = self.prepared.as_ref()?;
        if !self.method.intermediates.contains_key(name) {
            return None;
        }
        match evalexpr::Context::get_value(&prepared.context, name)? {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns an evaluator for converting many samples.
    pub fn evaluator(&self) -> Result<Evaluator<'_>, CalibrationError> {
        let prepared = self
            .prepared
            .as_ref()
            .ok_or_else(|| CalibrationError::NotPrepared(self.name.clone()))?;
        Ok(Evaluator {
            context: prepared.context.clone(),
            expression: &prepared.expression,
            source: &self.method.expression,
        })
    }

    pub fn evaluate(&self, sample: f64) -> Result<f64, CalibrationError> {
        self.evaluator()?.evaluate(sample)
    }
}

/// Evaluates prepared calibration expressions with a private context.
pub struct Evaluator<'a> {
    context: HashMapContext,
    expression: &'a Node,
    source: &'a str,
}

impl Evaluator<'_> {
    pub fn evaluate(&mut self, sample: f64) -> Result<f64, CalibrationError> {
        set_float(&mut self.context, SAMPLE, sample)?;
        self.expression
            .eval_number_with_context(&self.context)
            .map_err(|source| CalibrationError::Expression {
                role: "expression".to_string(),
                expression: self.source.to_string(),
                source,
            })
    }
}

/// Builds the front and rear percentage calibrations for `linkage`.
///
/// Both share one [`CalibrationMethod`]. Either failing to prepare fails
/// the whole build.
pub fn create_calibrations(
    linkage: &Linkage,
) -> Result<(Calibration, Calibration), CalibrationError> {
    let method = Arc::new(CalibrationMethod::percentage());

    let mut front = Calibration::new("Percentage", Arc::clone(&method));
    front.prepare(linkage.max_front_stroke, linkage.max_front_travel)?;

    let mut rear = Calibration::new("Percentage", method);
    rear.prepare(linkage.max_rear_stroke, linkage.max_rear_travel)?;

    Ok((front, rear))
}

fn compile(role: &str, expression: &str) -> Result<Node, CalibrationError> {
    build_operator_tree(expression).map_err(|source| CalibrationError::Expression {
        role: role.to_string(),
        expression: expression.to_string(),
        source,
    })
}

fn set_float(context: &mut HashMapContext, name: &str, value: f64) -> Result<(), CalibrationError> {
    context
        .set_value(name.to_string(), Value::Float(value))
        .map_err(|source| CalibrationError::Expression {
            role: format!("binding '{name}'"),
            expression: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linkage(front_stroke: f64, rear_stroke: f64) -> Linkage {
        let mut linkage = Linkage::new("frame", 65.0, front_stroke, rear_stroke);
        linkage.max_front_travel = front_stroke * 0.9;
        linkage.max_rear_travel = rear_stroke * 2.5;
        linkage
    }

    #[test]
    fn test_factor_is_stroke_percent() {
        let (front, rear) = create_calibrations(&linkage(160.0, 55.0)).unwrap();

        assert_eq!(front.intermediate("factor"), Some(1.6));
        assert_eq!(rear.intermediate("factor"), Some(0.55));
        assert_eq!(front.max_stroke, 160.0);
        assert_eq!(front.max_travel, 144.0);
        assert_eq!(rear.max_stroke, 55.0);
        assert_eq!(rear.max_travel, 137.5);
    }

    #[test]
    fn test_calibrations_share_one_method() {
        let (front, rear) = create_calibrations(&linkage(160.0, 55.0)).unwrap();

        assert!(Arc::ptr_eq(&front.method, &rear.method));
        assert_eq!(front.method.name, "percentage");
        assert_eq!(front.name, "Percentage");
        assert!(front.method.inputs.is_empty());
    }

    #[test]
    fn test_evaluate_percentage_sample() {
        let (front, rear) = create_calibrations(&linkage(160.0, 50.0)).unwrap();

        assert!((front.evaluate(50.0).unwrap() - 80.0).abs() < 1e-9);
        assert!((rear.evaluate(100.0).unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(rear.evaluate(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_evaluator_reuses_context() {
        let (front, _) = create_calibrations(&linkage(200.0, 50.0)).unwrap();
        let mut evaluator = front.evaluator().unwrap();

        let values: Vec<f64> = [0.0, 25.0, 50.0]
            .iter()
            .map(|s| evaluator.evaluate(*s).unwrap())
            .collect();
        assert_eq!(values, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_missing_input_fails_prepare() {
        let method = CalibrationMethod {
            name: "offset".to_string(),
            inputs: vec!["offset".to_string()],
            expression: "sample + offset".to_string(),
            ..Default::default()
        };
        let mut calibration = Calibration::new("Offset", Arc::new(method));

        let err = calibration.prepare(100.0, 100.0).unwrap_err();

        assert!(matches!(
            err,
            CalibrationError::MissingInput { ref input, .. } if input == "offset"
        ));
        assert!(!calibration.is_prepared());
        assert!(matches!(
            calibration.evaluate(1.0),
            Err(CalibrationError::NotPrepared(_))
        ));
    }

    #[test]
    fn test_supplied_input_is_bound() {
        let method = CalibrationMethod {
            name: "offset".to_string(),
            inputs: vec!["offset".to_string()],
            intermediates: BTreeMap::from([
                ("a_scale".to_string(), "MAX_TRAVEL / MAX_STROKE".to_string()),
                ("b_shift".to_string(), "offset * a_scale".to_string()),
            ]),
            expression: "sample * a_scale + b_shift".to_string(),
            ..Default::default()
        };
        let mut calibration =
            Calibration::new("Offset", Arc::new(method)).with_input("offset", 2.0);

        calibration.prepare(50.0, 100.0).unwrap();

        assert_eq!(calibration.intermediate("a_scale"), Some(2.0));
        assert_eq!(calibration.intermediate("b_shift"), Some(4.0));
        assert_eq!(calibration.evaluate(10.0).unwrap(), 24.0);
        assert_eq!(calibration.intermediate(MAX_STROKE), None);
    }

    #[test]
    fn test_malformed_expression_fails_prepare() {
        let method = CalibrationMethod {
            name: "broken".to_string(),
            expression: "sample *".to_string(),
            ..Default::default()
        };
        let mut calibration = Calibration::new("Broken", Arc::new(method));

        assert!(matches!(
            calibration.prepare(100.0, 100.0),
            Err(CalibrationError::Expression { .. })
        ));
    }

    #[test]
    fn test_unknown_variable_fails_prepare() {
        let method = CalibrationMethod {
            name: "unknown".to_string(),
            expression: "sample * gain".to_string(),
            ..Default::default()
        };
        let mut calibration = Calibration::new("Unknown", Arc::new(method));

        assert!(calibration.prepare(100.0, 100.0).is_err());
    }
}
