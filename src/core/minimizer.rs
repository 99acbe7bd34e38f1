//! Derivative-free bounded minimization.
//!
//! The engine only needs a point that beats its random starting schedule, so a plain
//! Nelder–Mead simplex with projection onto the feasible set is enough.

use std::cmp::Ordering;

use bon::Builder;

/// Feasible set: per-coordinate bounds and an optional cap on the coordinate sum.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    lower: Vec<f64>,
    upper: Vec<f64>,
    max_sum: Option<f64>,
}

impl Problem {
    /// Same bounds for every coordinate.
    #[must_use]
    pub fn uniform(dimension: usize, lower: f64, upper: f64) -> Self {
        debug_assert!(lower <= upper);
        Self { lower: vec![lower; dimension], upper: vec![upper; dimension], max_sum: None }
    }

    #[must_use]
    pub fn with_max_sum(mut self, max_sum: f64) -> Self {
        self.max_sum = Some(max_sum);
        self
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Map the point into the feasible set.
    ///
    /// Coordinates are clamped to their bounds first. If the sum still exceeds the cap,
    /// the excess over the lower bounds is scaled down proportionally.
    pub fn project(&self, point: &mut [f64]) {
        for ((x, lower), upper) in point.iter_mut().zip(&self.lower).zip(&self.upper) {
            *x = if x.is_nan() { *lower } else { x.clamp(*lower, *upper) };
        }
        let Some(max_sum) = self.max_sum else {
            return;
        };
        let sum: f64 = point.iter().sum();
        let lower_sum: f64 = self.lower.iter().sum();
        if sum > max_sum && sum > lower_sum {
            let factor = ((max_sum - lower_sum) / (sum - lower_sum)).max(0.0);
            for (x, lower) in point.iter_mut().zip(&self.lower) {
                *x = lower + (*x - lower) * factor;
            }
        }
    }

    fn is_degenerate(&self) -> bool {
        self.lower.iter().zip(&self.upper).all(|(lower, upper)| upper <= lower)
    }
}

/// Best point found by a minimization.
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub n_iterations: usize,
    pub n_evaluations: usize,

    /// Whether the tolerances were met before the iteration or evaluation budget ran out.
    ///
    /// The best point is returned either way.
    pub converged: bool,
}

#[derive(Copy, Clone, Debug, Builder)]
pub struct NelderMead {
    /// Defaults to `200` per dimension.
    max_iterations: Option<usize>,

    /// Defaults to `200` per dimension.
    max_evaluations: Option<usize>,

    /// Maximum coordinate spread of the simplex at convergence.
    #[builder(default = 1e-4)]
    x_tolerance: f64,

    /// Maximum objective spread of the simplex at convergence.
    #[builder(default = 1e-4)]
    f_tolerance: f64,

    /// Initial simplex edge as a fraction of each coordinate's range.
    #[builder(default = 0.05)]
    initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl NelderMead {
    const REFLECTION: f64 = 1.0;
    const EXPANSION: f64 = 2.0;
    const CONTRACTION: f64 = 0.5;
    const SHRINKAGE: f64 = 0.5;

    /// Minimize the objective starting from the initial point.
    ///
    /// Every trial point is projected onto the problem's feasible set before it is evaluated.
    /// An objective error aborts the minimization. `NaN` values are treated as infinite.
    pub fn minimize<F, E>(
        &self,
        objective: F,
        initial: &[f64],
        problem: &Problem,
    ) -> Result<Minimum, E>
    where
        F: FnMut(&[f64]) -> Result<f64, E>,
    {
        debug_assert_eq!(initial.len(), problem.dimension());
        let n = problem.dimension();
        let max_iterations = self.max_iterations.unwrap_or(200 * n);
        let max_evaluations = self.max_evaluations.unwrap_or(200 * n);
        let mut evaluator = Evaluator { objective, problem, n_evaluations: 0 };

        let origin = evaluator.evaluate(initial.to_vec())?;
        if n == 0 || problem.is_degenerate() {
            return Ok(Minimum {
                point: origin.point,
                value: origin.value,
                n_iterations: 0,
                n_evaluations: evaluator.n_evaluations,
                converged: true,
            });
        }

        let origin_point = origin.point.clone();
        let mut simplex = Vec::with_capacity(n + 1);
        simplex.push(origin);
        for i in 0..n {
            let mut point = origin_point.clone();
            let step = self.initial_step * (problem.upper[i] - problem.lower[i]);
            // Step inwards when the start sits on the upper bound:
            if point[i] + step > problem.upper[i] {
                point[i] -= step;
            } else {
                point[i] += step;
            }
            simplex.push(evaluator.evaluate(point)?);
        }

        let mut n_iterations = 0;
        let converged = loop {
            simplex.sort_by(Vertex::cmp_value);
            if self.has_converged(&simplex) {
                break true;
            }
            if n_iterations >= max_iterations || evaluator.n_evaluations >= max_evaluations {
                break false;
            }
            n_iterations += 1;

            let best = simplex[0].value;
            let second_worst = simplex[n - 1].value;
            let worst = simplex[n].clone();
            let centroid = centroid(&simplex[..n]);

            let reflected = evaluator.evaluate(towards(&centroid, &worst.point, -Self::REFLECTION))?;
            if reflected.value < best {
                let expanded =
                    evaluator.evaluate(towards(&centroid, &reflected.point, Self::EXPANSION))?;
                simplex[n] = if expanded.value < reflected.value { expanded } else { reflected };
            } else if reflected.value < second_worst {
                simplex[n] = reflected;
            } else {
                let (contracted, is_accepted) = if reflected.value < worst.value {
                    let contracted = evaluator
                        .evaluate(towards(&centroid, &reflected.point, Self::CONTRACTION))?;
                    let is_accepted = contracted.value <= reflected.value;
                    (contracted, is_accepted)
                } else {
                    let contracted =
                        evaluator.evaluate(towards(&centroid, &worst.point, Self::CONTRACTION))?;
                    let is_accepted = contracted.value < worst.value;
                    (contracted, is_accepted)
                };
                if is_accepted {
                    simplex[n] = contracted;
                } else {
                    let best = simplex[0].point.clone();
                    for vertex in &mut simplex[1..] {
                        *vertex = evaluator.evaluate(towards(&best, &vertex.point, Self::SHRINKAGE))?;
                    }
                }
            }
        };

        simplex.sort_by(Vertex::cmp_value);
        let best = simplex.swap_remove(0);
        Ok(Minimum {
            point: best.point,
            value: best.value,
            n_iterations,
            n_evaluations: evaluator.n_evaluations,
            converged,
        })
    }

    /// Both the values and the vertices must be close to the best vertex.
    fn has_converged(&self, sorted: &[Vertex]) -> bool {
        let best = &sorted[0];
        sorted[1..].iter().all(|vertex| {
            (vertex.value - best.value).abs() <= self.f_tolerance
                && vertex
                    .point
                    .iter()
                    .zip(&best.point)
                    .all(|(x, x_best)| (x - x_best).abs() <= self.x_tolerance)
        })
    }
}

#[derive(Clone, Debug)]
struct Vertex {
    point: Vec<f64>,
    value: f64,
}

impl Vertex {
    fn cmp_value(&self, other: &Self) -> Ordering {
        self.value.total_cmp(&other.value)
    }
}

struct Evaluator<'a, F> {
    objective: F,
    problem: &'a Problem,
    n_evaluations: usize,
}

impl<F, E> Evaluator<'_, F>
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    fn evaluate(&mut self, mut point: Vec<f64>) -> Result<Vertex, E> {
        self.problem.project(&mut point);
        self.n_evaluations += 1;
        let value = (self.objective)(&point)?;
        Ok(Vertex { point, value: if value.is_nan() { f64::INFINITY } else { value } })
    }
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    #[expect(clippy::cast_precision_loss)]
    let n_vertices = vertices.len() as f64;
    let mut centroid = vec![0.0; vertices[0].point.len()];
    for vertex in vertices {
        for (sum, x) in centroid.iter_mut().zip(&vertex.point) {
            *sum += x;
        }
    }
    for sum in &mut centroid {
        *sum /= n_vertices;
    }
    centroid
}

/// `origin + coefficient · (target − origin)`.
fn towards(origin: &[f64], target: &[f64], coefficient: f64) -> Vec<f64> {
    origin.iter().zip(target).map(|(o, t)| coefficient.mul_add(t - o, *o)).collect()
}
