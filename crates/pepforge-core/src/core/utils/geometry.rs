use nalgebra::{Point3, Vector3};

pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    nalgebra::center(a, b)
}

/// Reflects `point` through `center`, giving the position directly opposite it.
pub fn reflect_through(point: &Point3<f64>, center: &Point3<f64>) -> Point3<f64> {
    center + (center - point)
}

/// Places a third hydrogen on an sp3 nitrogen that already carries two.
///
/// The new position is the reflection of the alpha carbon through the
/// nitrogen, shifted away from the midpoint of the two existing hydrogens:
/// `H3 = (N + (N - CA)) + (N - mid(H1, H2))`. It lands roughly symmetric to
/// H1/H2 about the N–CA axis; bond lengths and angles are left to a later
/// geometry optimization.
pub fn place_third_amine_hydrogen(
    n_pos: &Point3<f64>,
    ca_pos: &Point3<f64>,
    h1_pos: &Point3<f64>,
    h2_pos: &Point3<f64>,
) -> Point3<f64> {
    let opposite_ca = reflect_through(ca_pos, n_pos);
    let adjust: Vector3<f64> = n_pos - midpoint(h1_pos, h2_pos);
    opposite_ca + adjust
}

pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn midpoint_is_halfway() {
        let m = midpoint(&Point3::new(0.0, 0.0, 0.0), &Point3::new(2.0, -4.0, 6.0));
        assert!((m - Point3::new(1.0, -2.0, 3.0)).norm() < EPS);
    }

    #[test]
    fn reflect_through_mirrors_point() {
        let p = reflect_through(&Point3::new(1.0, 1.0, 0.0), &Point3::new(0.0, 0.0, 0.0));
        assert!((p - Point3::new(-1.0, -1.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn third_hydrogen_sits_opposite_alpha_carbon_for_symmetric_pair() {
        let n = Point3::new(0.0, 0.0, 0.0);
        let ca = Point3::new(1.5, 0.0, 0.0);
        let h1 = Point3::new(-0.3, 0.9, 0.0);
        let h2 = Point3::new(-0.3, -0.9, 0.0);

        let h3 = place_third_amine_hydrogen(&n, &ca, &h1, &h2);
        // P = (-1.5, 0, 0); M = (-0.3, 0, 0); N - M = (0.3, 0, 0)
        assert!((h3 - Point3::new(-1.2, 0.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn third_hydrogen_moves_away_from_existing_pair() {
        let n = Point3::new(0.0, 0.0, 0.0);
        let ca = Point3::new(0.0, 0.0, 1.5);
        let h1 = Point3::new(0.9, 0.3, -0.3);
        let h2 = Point3::new(0.9, -0.3, -0.3);

        let h3 = place_third_amine_hydrogen(&n, &ca, &h1, &h2);
        let mid = midpoint(&h1, &h2);
        assert!(distance(&h3, &mid) > distance(&n, &mid));
        assert!(h3.x < 0.0);
        assert!(h3.z < 0.0);
    }
}
