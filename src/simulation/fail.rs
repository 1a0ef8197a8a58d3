//! Probabilistic failure injection.

/// Decide whether a request should be answered with a simulated failure.
///
/// `<= 0` (or NaN) never fails, `>= 1` always fails; otherwise one uniform
/// draw in `[0, 1)` fails when it is `<= probability`.
pub fn should_fail(probability: f64) -> bool {
    if !(probability > 0.0) {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    fastrand::f64() <= probability
}
