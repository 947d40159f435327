//! Numeric presets, exposed to session code as the `num` module.

use rhai::{Array, Dynamic, EvalAltResult, Module};

use super::{array_to_f64, script_err, to_f64};

/// Build the `num` static module.
pub fn module() -> Module {
    let mut m = Module::new();

    m.set_var("PI", std::f64::consts::PI);
    m.set_var("E", std::f64::consts::E);

    m.set_native_fn(
        "linspace",
        |start: Dynamic, stop: Dynamic, count: i64| -> Result<Array, Box<EvalAltResult>> {
            if count < 2 {
                return Err(script_err("linspace: count must be at least 2"));
            }
            let a = to_f64(&start)?;
            let b = to_f64(&stop)?;
            let step = (b - a) / (count - 1) as f64;
            Ok((0..count)
                .map(|i| Dynamic::from_float(a + step * i as f64))
                .collect::<Array>())
        },
    );

    m.set_native_fn(
        "arange",
        |start: Dynamic, stop: Dynamic, step: Dynamic| -> Result<Array, Box<EvalAltResult>> {
            let a = to_f64(&start)?;
            let b = to_f64(&stop)?;
            let step = to_f64(&step)?;
            if step == 0.0 || !step.is_finite() {
                return Err(script_err("arange: step must be finite and non-zero"));
            }
            let mut values = Array::new();
            let mut v = a;
            while (step > 0.0 && v < b) || (step < 0.0 && v > b) {
                values.push(Dynamic::from_float(v));
                v += step;
            }
            Ok(values)
        },
    );

    m.set_native_fn("sum", |values: Array| -> Result<f64, Box<EvalAltResult>> {
        Ok(array_to_f64(&values)?.iter().sum::<f64>())
    });

    m.set_native_fn("mean", |values: Array| -> Result<f64, Box<EvalAltResult>> {
        if values.is_empty() {
            return Err(script_err("mean: empty array"));
        }
        let xs = array_to_f64(&values)?;
        Ok(xs.iter().sum::<f64>() / xs.len() as f64)
    });

    m.set_native_fn("min", |values: Array| -> Result<f64, Box<EvalAltResult>> {
        let xs = array_to_f64(&values)?;
        xs.iter()
            .copied()
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.min(v))))
            .ok_or_else(|| script_err("min: empty array"))
    });

    m.set_native_fn("max", |values: Array| -> Result<f64, Box<EvalAltResult>> {
        let xs = array_to_f64(&values)?;
        xs.iter()
            .copied()
            .fold(None::<f64>, |acc, v| Some(acc.map_or(v, |a| a.max(v))))
            .ok_or_else(|| script_err("max: empty array"))
    });

    m
}

#[cfg(test)]
mod tests {
    use crate::paths::WorkspaceDirs;
    use crate::script::build_engine;

    fn eval_f64(code: &str) -> f64 {
        let temp = tempfile::TempDir::new().unwrap();
        let dirs = WorkspaceDirs::from_root(temp.path()).unwrap();
        let (engine, _, _) = build_engine(&dirs);
        engine.eval::<f64>(code).expect("script should evaluate")
    }

    #[test]
    fn test_linspace_endpoints() {
        assert_eq!(eval_f64("let xs = num::linspace(0, 10, 5); xs[0]"), 0.0);
        assert_eq!(eval_f64("let xs = num::linspace(0, 10, 5); xs[4]"), 10.0);
    }

    #[test]
    fn test_mean_accepts_ints_and_floats() {
        assert_eq!(eval_f64("num::mean([1, 2.0, 3])"), 2.0);
    }

    #[test]
    fn test_arange_steps() {
        assert_eq!(
            eval_f64("let xs = num::arange(0, 1, 0.25); xs.len() * 1.0"),
            4.0
        );
    }
}
