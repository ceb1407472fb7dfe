use glam::DVec2;

/// Caller-supplied `f(x, y, t, nu)`.
///
/// Plays two roles in a run: Dirichlet value at boundary nodes (and the
/// initial field at `t = 0`), and closed-form reference solution for the
/// error fields. It is infallible by signature; a panic inside it unwinds
/// through the solver untouched.
pub trait BoundaryFn: Sync {
    fn eval(&self, x: f64, y: f64, t: f64, diffusivity: f64) -> f64;
}

impl<F> BoundaryFn for F
where
    F: Fn(f64, f64, f64, f64) -> f64 + Sync,
{
    #[inline]
    fn eval(&self, x: f64, y: f64, t: f64, diffusivity: f64) -> f64 {
        self(x, y, t, diffusivity)
    }
}

/// Fix the diffusivity, giving the `(p, t)` form the time stepper consumes.
pub fn at_diffusivity<B>(boundary: &B, diffusivity: f64) -> impl Fn(DVec2, f64) -> f64 + Sync + '_
where
    B: BoundaryFn + ?Sized,
{
    move |p, t| boundary.eval(p.x, p.y, t, diffusivity)
}

/// Constant Dirichlet value; also the trivial steady solution.
#[derive(Clone, Copy, Debug)]
pub struct Constant(pub f64);

impl BoundaryFn for Constant {
    fn eval(&self, _x: f64, _y: f64, _t: f64, _diffusivity: f64) -> f64 {
        self.0
    }
}
