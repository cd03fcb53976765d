//! Derivative-free minimisation (Nelder–Mead simplex)
//!
//! Objectives may return `f64::INFINITY` (or NaN, treated the same) to mark
//! points outside the feasible region; the simplex then contracts away from
//! them.

use crate::{MathError, Result};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Nelder–Mead simplex minimiser
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: usize,
    tolerance: f64,
    point_tolerance: f64,
    initial_step: f64,
}

/// Outcome of a minimisation
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the simplex collapsed within tolerance before the iteration cap
    pub converged: bool,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-10,
            point_tolerance: 1e-7,
            initial_step: 0.1,
        }
    }
}

impl NelderMead {
    /// Create a minimiser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap on simplex iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Minimise `objective` starting from `start`
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = objective(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };

        let n = start.len();
        let start_value = eval(start);
        if !start_value.is_finite() {
            return Err(MathError::CalculationError(
                "Objective is not finite at the starting point".to_string(),
            ));
        }
        if n == 0 {
            return Ok(Minimum {
                point: Vec::new(),
                value: start_value,
                iterations: 0,
                converged: true,
            });
        }

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(start.to_vec());
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] = if vertex[i] == 0.0 {
                self.initial_step
            } else {
                vertex[i] * 1.05
            };
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = std::iter::once(start_value)
            .chain(simplex[1..].iter().map(|v| eval(v)))
            .collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            order_simplex(&mut simplex, &mut values);

            let best = values[0];
            let worst = values[n];
            let spread = simplex[1..]
                .iter()
                .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
                .fold(0.0_f64, f64::max);
            if (worst - best).abs() <= self.tolerance * (1.0 + best.abs())
                && spread <= self.point_tolerance
            {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
                .collect();
            let towards = |from: &[f64], coefficient: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + coefficient * (x - c))
                    .collect()
            };

            let reflected = towards(&simplex[n], -REFLECTION);
            let f_reflected = eval(&reflected);

            if f_reflected < best {
                let expanded = towards(&reflected, EXPANSION);
                let f_expanded = eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            let (contracted, bound) = if f_reflected < worst {
                (towards(&reflected, CONTRACTION), f_reflected)
            } else {
                (towards(&simplex[n], CONTRACTION), worst)
            };
            let f_contracted = eval(&contracted);
            if f_contracted < bound {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            let anchor = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = anchor
                    .iter()
                    .zip(&simplex[i])
                    .map(|(a, x)| a + SHRINK * (x - a))
                    .collect();
                values[i] = eval(&simplex[i]);
            }
        }

        order_simplex(&mut simplex, &mut values);

        Ok(Minimum {
            point: simplex.swap_remove(0),
            value: values[0],
            iterations,
            converged,
        })
    }
}

fn order_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    *simplex = order.iter().map(|&i| simplex[i].clone()).collect();
    *values = order.iter().map(|&i| values[i]).collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_bowl() {
        let objective = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let result = NelderMead::new().minimize(objective, &[0.0, 0.0]).unwrap();

        assert!(result.converged);
        assert_relative_eq!(result.point[0], 3.0, epsilon = 1e-4);
        assert_relative_eq!(result.point[1], -1.0, epsilon = 1e-4);
        assert!(result.value < 1e-8);
    }

    #[test]
    fn test_rosenbrock() {
        let objective =
            |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let result = NelderMead::new()
            .with_max_iterations(5000)
            .minimize(objective, &[-1.2, 1.0])
            .unwrap();

        assert_relative_eq!(result.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(result.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_infeasible_region_is_avoided() {
        // Minimum of the unconstrained bowl sits outside |x| < 0.9
        let objective = |x: &[f64]| {
            if x[0].abs() >= 0.9 {
                f64::INFINITY
            } else {
                (x[0] - 2.0).powi(2)
            }
        };
        let result = NelderMead::new().minimize(objective, &[0.0]).unwrap();
        assert!(result.point[0] < 0.9);
        assert!(result.point[0] > 0.8);
    }

    #[test]
    fn test_zero_dimensional() {
        let result = NelderMead::new().minimize(|_| 4.0, &[]).unwrap();
        assert_eq!(result.value, 4.0);
        assert!(result.converged);
    }

    #[test]
    fn test_infinite_start_rejected() {
        let result = NelderMead::new().minimize(|_| f64::INFINITY, &[0.0]);
        assert!(result.is_err());
    }
}
